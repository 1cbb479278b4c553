//! Callback registries.
//!
//! A registry maps an opaque component identifier (`custom_id`) to a bound
//! handler. The process keeps one registry per interaction category for
//! stateless command-module handlers ([`CallbackRegistries`]); every view
//! type keeps one more as its dispatch table (see `session::ActionTable`).
//! Identifiers are only unique within a registry.

use std::sync::Arc;

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use keepsake_types::component::ComponentKind;
use keepsake_types::interaction::ComponentInteraction;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::session::SessionError;
use crate::session::lifecycle::SessionManager;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("custom_id must contain a valid value, not '{0}'")]
    EmptyId(String),
}

/// Identifier -> handler map for one interaction category.
pub struct CallbackRegistry<H> {
    name: &'static str,
    handlers: DashMap<String, H>,
}

impl<H: Clone> CallbackRegistry<H> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handlers: DashMap::new(),
        }
    }

    /// Build a registry from a fixed table of identifiers.
    pub fn from_entries(name: &'static str, entries: impl IntoIterator<Item = (&'static str, H)>) -> Self {
        let registry = Self::new(name);
        for (custom_id, handler) in entries {
            registry.handlers.insert(custom_id.to_string(), handler);
        }
        registry
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Bind `custom_id` to `handler`, replacing any previous binding.
    ///
    /// Replacing is expected when a module reloads in place; it is logged.
    pub fn register(&self, custom_id: &str, handler: H) -> Result<(), RegistryError> {
        if custom_id.trim().is_empty() {
            return Err(RegistryError::EmptyId(custom_id.to_string()));
        }

        if self.handlers.insert(custom_id.to_string(), handler).is_some() {
            warn!(registry = self.name, custom_id, "handler was overridden");
        } else {
            info!(registry = self.name, custom_id, "linked handler");
        }
        Ok(())
    }

    /// Remove the binding for `custom_id`.
    ///
    /// Returns `true` if a handler was bound.
    pub fn unregister(&self, custom_id: &str) -> Result<bool, RegistryError> {
        if custom_id.trim().is_empty() {
            return Err(RegistryError::EmptyId(custom_id.to_string()));
        }

        let removed = self.handlers.remove(custom_id).is_some();
        if removed {
            info!(registry = self.name, custom_id, "unlinked handler");
        } else {
            warn!(registry = self.name, custom_id, "no handler bound, nothing unlinked");
        }
        Ok(removed)
    }

    /// Look up the handler for `custom_id`.
    pub fn resolve(&self, custom_id: &str) -> Option<H> {
        let handler = self.handlers.get(custom_id).map(|entry| entry.value().clone());
        if handler.is_none() {
            debug!(registry = self.name, custom_id, "no handler bound");
        }
        handler
    }

    pub fn contains(&self, custom_id: &str) -> bool {
        self.handlers.contains_key(custom_id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Stateless handler owned by a command module.
pub type ModuleHandler = Arc<
    dyn Fn(ComponentInteraction, SessionManager) -> BoxFuture<'static, Result<(), SessionError>>
        + Send
        + Sync,
>;

/// The process-wide registries, one per interaction category.
pub struct CallbackRegistries {
    buttons: CallbackRegistry<ModuleHandler>,
    string_selects: CallbackRegistry<ModuleHandler>,
    user_selects: CallbackRegistry<ModuleHandler>,
    role_selects: CallbackRegistry<ModuleHandler>,
    mentionable_selects: CallbackRegistry<ModuleHandler>,
    text_inputs: CallbackRegistry<ModuleHandler>,
}

impl CallbackRegistries {
    pub fn new() -> Self {
        Self {
            buttons: CallbackRegistry::new("button"),
            string_selects: CallbackRegistry::new("string_select"),
            user_selects: CallbackRegistry::new("user_select"),
            role_selects: CallbackRegistry::new("role_select"),
            mentionable_selects: CallbackRegistry::new("mentionable_select"),
            text_inputs: CallbackRegistry::new("text_input"),
        }
    }

    /// The registry serving interactions from components of `kind`.
    pub fn for_kind(&self, kind: ComponentKind) -> &CallbackRegistry<ModuleHandler> {
        match kind {
            ComponentKind::Button => &self.buttons,
            ComponentKind::StringSelect => &self.string_selects,
            ComponentKind::UserSelect => &self.user_selects,
            ComponentKind::RoleSelect => &self.role_selects,
            ComponentKind::MentionableSelect => &self.mentionable_selects,
            ComponentKind::TextInput => &self.text_inputs,
        }
    }
}

impl Default for CallbackRegistries {
    fn default() -> Self {
        Self::new()
    }
}

/// A command module that owns stateless component handlers.
///
/// Modules register their identifiers when loaded and remove them when
/// unloaded; the registries outlive every module.
pub trait CommandModule: Send + Sync {
    fn name(&self) -> &'static str;

    fn on_load(&self, registries: &CallbackRegistries) -> Result<(), RegistryError>;

    fn on_unload(&self, registries: &CallbackRegistries) -> Result<(), RegistryError>;
}
