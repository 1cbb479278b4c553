//! Interaction routing and rehydration.
//!
//! Every component interaction ends up here. Resident sessions get the
//! interaction directly; for anything else the stored record is loaded, the
//! session rebuilt against the live message, activated, saved and only then
//! handed the interaction. Messages without a record fall through to the
//! stateless module handlers, and failing those get a polite reply.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use keepsake_types::error::{PlatformError, StoreError};
use keepsake_types::ids::MessageId;
use keepsake_types::interaction::{ComponentInteraction, Reply};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::{Session, SessionError, SessionHandle, SessionManager, factory};
use crate::registry::CallbackRegistries;

/// How an interaction was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The session was in memory.
    Resident,
    /// The session was rebuilt from its stored record.
    Rehydrated,
    /// A stateless command-module handler took it.
    Module,
    /// Nothing could serve it; the user was told.
    Expired,
}

/// Routes component interactions to sessions, rebuilding them on demand.
#[derive(Clone)]
pub struct InteractionRouter {
    manager: SessionManager,
    registries: Arc<CallbackRegistries>,
    /// Serializes rehydration per message.
    locks: Arc<DashMap<MessageId, Arc<Mutex<()>>>>,
}

impl InteractionRouter {
    pub fn new(manager: SessionManager, registries: Arc<CallbackRegistries>) -> Self {
        Self {
            manager,
            registries,
            locks: Arc::new(DashMap::new()),
        }
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    pub fn registries(&self) -> &CallbackRegistries {
        &self.registries
    }

    /// Serve one interaction.
    ///
    /// # Errors
    ///
    /// Store, platform, snapshot and lifecycle failures on the rehydration
    /// path, and whatever the invoked handler returns. A missing record is
    /// not an error.
    pub async fn handle(&self, interaction: &ComponentInteraction) -> Result<Outcome, SessionError> {
        let message_id = interaction.key.message_id;

        if let Some(handle) = self.manager.get(message_id) {
            if self.dispatch_resident(&handle, interaction).await? {
                return Ok(Outcome::Resident);
            }
        }

        let lock = self.locks.entry(message_id).or_default().clone();
        let result = {
            let _guard = lock.lock().await;
            self.rehydrate_and_dispatch(interaction).await
        };
        drop(lock);
        self.locks.remove_if(&message_id, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    /// Dispatch to a resident session. Returns `false` if the session was
    /// stopped while this call waited for it.
    async fn dispatch_resident(
        &self,
        handle: &SessionHandle,
        interaction: &ComponentInteraction,
    ) -> Result<bool, SessionError> {
        let mut session = handle.lock().await;
        if !session.core().is_active() {
            return Ok(false);
        }
        session.core().touch();
        debug!(
            kind = %session.kind(),
            custom_id = %interaction.custom_id,
            "dispatching to resident session"
        );
        self.dispatch(&mut **session, interaction).await?;
        Ok(true)
    }

    async fn rehydrate_and_dispatch(
        &self,
        interaction: &ComponentInteraction,
    ) -> Result<Outcome, SessionError> {
        let key = interaction.key;

        // Another caller may have rebuilt the session while we waited.
        if let Some(handle) = self.manager.get(key.message_id) {
            if self.dispatch_resident(&handle, interaction).await? {
                return Ok(Outcome::Resident);
            }
        }

        let record = match self.manager.store().load(key).await {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => return self.fallback(interaction).await,
            Err(err) => return Err(err.into()),
        };

        let live = self
            .manager
            .platform()
            .fetch_message(key)
            .await?
            .ok_or(PlatformError::MessageNotFound(key))?;

        let handle = wrap_boxed(factory::rehydrate(&record, &live)?);
        self.manager.activate(&handle).await?;

        let mut session = handle.lock().await;
        if let Some(record) = session.core_mut().record_mut() {
            record.last_loaded_at = Some(Utc::now());
        }
        self.manager.persist(&mut **session).await?;

        info!(
            kind = %record.kind,
            record_id = %record.id,
            %key,
            "rehydrated session"
        );

        self.dispatch(&mut **session, interaction).await?;
        Ok(Outcome::Rehydrated)
    }

    async fn dispatch(
        &self,
        session: &mut dyn Session,
        interaction: &ComponentInteraction,
    ) -> Result<(), SessionError> {
        match session.dispatch(interaction, &self.manager).await {
            Err(err @ SessionError::CallbackNotFound { .. }) => {
                error!(error = %err, "interaction has no callback");
                self.manager
                    .platform()
                    .reply(interaction, Reply::ephemeral("This interaction failed."))
                    .await?;
                Err(err)
            }
            other => other,
        }
    }

    async fn fallback(&self, interaction: &ComponentInteraction) -> Result<Outcome, SessionError> {
        let registry = self.registries.for_kind(interaction.component);
        if let Some(handler) = registry.resolve(&interaction.custom_id) {
            debug!(
                registry = registry.name(),
                custom_id = %interaction.custom_id,
                "handled by module"
            );
            handler(interaction.clone(), self.manager.clone()).await?;
            return Ok(Outcome::Module);
        }

        warn!(
            key = %interaction.key,
            custom_id = %interaction.custom_id,
            "no saved session and no module handler"
        );
        self.manager
            .platform()
            .reply(
                interaction,
                Reply::ephemeral(self.manager.config().expired_reply.clone()),
            )
            .await?;
        Ok(Outcome::Expired)
    }
}

fn wrap_boxed(session: Box<dyn Session>) -> SessionHandle {
    Arc::new(Mutex::new(session))
}
