//! Sessions: stateful UI widgets bound to one platform message.
//!
//! A session is split into the shared [`ViewCore`] (identity, lifecycle
//! flags, persisted record, idle timer) and a concrete [`View`] carrying the
//! widget's own fields. [`ViewSession`] glues the two together with the live
//! components rendered on the message; the object-safe [`Session`] trait is
//! what the lifecycle controller and the router hold.

pub mod error;
pub mod factory;
pub mod lifecycle;
pub mod rehydrate;
pub mod snapshot;

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use keepsake_types::component::{ComponentDescriptor, ComponentKind, LiveMessage};
use keepsake_types::error::SnapshotError;
use keepsake_types::ids::{ChannelId, GuildId, MessageId, MessageKey, UserId};
use keepsake_types::interaction::ComponentInteraction;
use keepsake_types::record::SessionRecord;
use keepsake_types::session::{SessionKind, SessionState};
use keepsake_types::snapshot::{AttributeSnapshot, QualifiedName};
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::codec::{self, Element, LiveComponent};
use crate::registry::CallbackRegistry;

pub use error::SessionError;
pub use lifecycle::SessionManager;
pub use rehydrate::{InteractionRouter, Outcome};
pub use snapshot::{Field, FieldTable};

/// A bound view method: the handler invoked for one component identifier.
pub type Action<V> = for<'a> fn(
    &'a mut ViewSession<V>,
    &'a ComponentInteraction,
    &'a SessionManager,
) -> BoxFuture<'a, Result<(), SessionError>>;

/// Per-view-type dispatch table, built once per type.
pub type ActionTable<V> = CallbackRegistry<Action<V>>;

/// Shared handle to a resident session.
pub type SessionHandle = Arc<Mutex<Box<dyn Session>>>;

/// A concrete widget type.
///
/// Implementors are plain data; behavior is attached through the static
/// [`ActionTable`], persisted state is declared through the static
/// [`FieldTable`].
pub trait View: Clone + Default + Send + Sync + 'static {
    const KIND: SessionKind;

    /// Store a record as soon as the view is launched instead of waiting
    /// for its first stop.
    const PERSIST_ON_LAUNCH: bool = false;

    fn fields() -> &'static FieldTable<Self>;

    fn actions() -> &'static ActionTable<Self>;

    /// Message text rendered above the components.
    fn content(_session: &ViewSession<Self>) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Default)]
struct IdleTimer {
    cancel: CancellationToken,
    touch: Arc<Notify>,
}

/// State every session carries regardless of its concrete type.
#[derive(Debug, Clone)]
pub struct ViewCore {
    guild_id: GuildId,
    channel_id: ChannelId,
    message_id: Option<MessageId>,
    kind: SessionKind,
    timeout: Option<Duration>,
    active: bool,
    stopped: bool,
    record: Option<SessionRecord>,
    declared: Vec<QualifiedName>,
    /// User who opened the view; persisted as `ViewCore.__invoker`.
    invoker: Option<UserId>,
    idle: IdleTimer,
}

impl ViewCore {
    fn new(guild_id: GuildId, channel_id: ChannelId, kind: SessionKind) -> Self {
        Self {
            guild_id,
            channel_id,
            message_id: None,
            kind,
            timeout: None,
            active: false,
            stopped: false,
            record: None,
            declared: Vec::new(),
            invoker: None,
            idle: IdleTimer::default(),
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    pub fn message_id(&self) -> Option<MessageId> {
        self.message_id
    }

    /// Bind the session to the message it was sent as. Must happen before
    /// activation.
    pub fn set_message_id(&mut self, message_id: MessageId) {
        self.message_id = Some(message_id);
    }

    /// Record key, once the message id is known.
    pub fn key(&self) -> Option<MessageKey> {
        self.message_id
            .map(|message_id| MessageKey::new(self.guild_id, self.channel_id, message_id))
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    /// Idle timeout; `None` means the configured default.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_flags(self.active, self.stopped)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn record(&self) -> Option<&SessionRecord> {
        self.record.as_ref()
    }

    pub fn record_mut(&mut self) -> Option<&mut SessionRecord> {
        self.record.as_mut()
    }

    /// Qualified names eligible for persistence.
    pub fn declared(&self) -> &[QualifiedName] {
        &self.declared
    }

    /// Narrow the persisted attributes to `names`.
    pub fn declare(&mut self, names: &[QualifiedName]) {
        self.declared = names.to_vec();
    }

    pub fn invoker(&self) -> Option<UserId> {
        self.invoker
    }

    pub fn set_invoker(&mut self, user_id: UserId) {
        self.invoker = Some(user_id);
    }

    /// Re-arm the idle timer.
    pub fn touch(&self) {
        self.idle.touch.notify_one();
    }
}

/// A concrete view together with its core state and live components.
#[derive(Clone)]
pub struct ViewSession<V> {
    pub core: ViewCore,
    pub view: V,
    components: Vec<LiveComponent<Action<V>>>,
}

impl<V: View> ViewSession<V> {
    pub fn new(guild_id: GuildId, channel_id: ChannelId, view: V) -> Self {
        let mut core = ViewCore::new(guild_id, channel_id, V::KIND);
        core.declared = V::fields().names();
        Self {
            core,
            view,
            components: Vec::new(),
        }
    }

    /// Rebuild a session from its stored record and the message as the
    /// platform currently renders it.
    ///
    /// Components are taken from `live`, not from the record: whatever was
    /// edited on the message since it was stored wins. Attributes are
    /// restored last; a failed restore leaves nothing half-applied.
    pub fn rehydrate(record: &SessionRecord, live: &LiveMessage) -> Result<Self, SessionError> {
        let mut session = Self::new(record.key.guild_id, record.key.channel_id, V::default());
        session.core.message_id = Some(record.key.message_id);
        session.core.timeout = Some(Duration::from_secs(record.timeout_secs.into()));
        session.core.record = Some(record.clone());
        session.rebuild_components(live);

        if let Some(data) = &record.data {
            snapshot::restore(&mut session, data)?;
        }
        Ok(session)
    }

    /// Attach a freshly built element, binding it through the dispatch table.
    ///
    /// Elements without a custom id (link buttons) are attached unbound.
    pub fn attach(&mut self, row: usize, descriptor: ComponentDescriptor) -> Result<(), SessionError> {
        let handler = match descriptor.custom_id() {
            Some(custom_id) => Some(V::actions().resolve(custom_id).ok_or_else(|| {
                SessionError::CallbackNotFound {
                    kind: V::KIND,
                    custom_id: custom_id.to_string(),
                    record_id: self.core.record.as_ref().map(|record| record.id),
                }
            })?),
            None => None,
        };
        self.components.push(codec::decode(descriptor, handler, row)?);
        Ok(())
    }

    /// Replace the live components with the ones rendered on `live`.
    ///
    /// Elements whose identifier has no handler, and elements of kinds the
    /// codec does not model, are logged and left out; their siblings are
    /// still rebuilt.
    pub fn rebuild_components(&mut self, live: &LiveMessage) {
        self.components.clear();
        let actions = V::actions();

        for (row, descriptors) in live.rows.iter().enumerate() {
            for descriptor in descriptors {
                let handler = match (descriptor.kind(), descriptor.custom_id()) {
                    (Some(_), Some(custom_id)) => match actions.resolve(custom_id) {
                        Some(action) => Some(action),
                        None => {
                            error!(
                                kind = %V::KIND,
                                custom_id,
                                "no callback bound to component, skipping it"
                            );
                            continue;
                        }
                    },
                    _ => None,
                };

                match codec::decode(descriptor.clone(), handler, row) {
                    Ok(component) => self.components.push(component),
                    Err(err) => warn!(kind = %V::KIND, error = %err, "component not rebuilt"),
                }
            }
        }
    }

    pub fn components(&self) -> &[LiveComponent<Action<V>>] {
        &self.components
    }

    /// The element bound to `custom_id`, for in-place edits before a redraw.
    pub fn element_mut(&mut self, custom_id: &str) -> Option<&mut Element> {
        self.components
            .iter_mut()
            .find(|component| component.custom_id() == Some(custom_id))
            .map(LiveComponent::element_mut)
    }

    fn resolve_action(&self, interaction: &ComponentInteraction) -> Option<Action<V>> {
        let bound = self
            .components
            .iter()
            .find(|component| component.custom_id() == Some(interaction.custom_id.as_str()))
            .and_then(|component| component.handler().copied());

        // Modal inputs are not rendered on the message itself.
        match bound {
            Some(action) => Some(action),
            None if interaction.component == ComponentKind::TextInput => {
                V::actions().resolve(&interaction.custom_id)
            }
            None => None,
        }
    }
}

/// Object-safe view of any session, as held by the active index.
pub trait Session: Send + Sync + 'static {
    fn kind(&self) -> SessionKind;

    fn core(&self) -> &ViewCore;

    fn core_mut(&mut self) -> &mut ViewCore;

    /// Snapshot of the declared attributes.
    fn capture(&self) -> Result<AttributeSnapshot, SnapshotError>;

    /// Apply a snapshot; all or nothing.
    fn restore(&mut self, snapshot: &AttributeSnapshot) -> Result<(), SnapshotError>;

    /// Content and components as they should appear on the message.
    fn render(&self) -> LiveMessage;

    /// Run the handler bound to the interaction's identifier.
    fn dispatch<'a>(
        &'a mut self,
        interaction: &'a ComponentInteraction,
        manager: &'a SessionManager,
    ) -> BoxFuture<'a, Result<(), SessionError>>;
}

impl<V: View> Session for ViewSession<V> {
    fn kind(&self) -> SessionKind {
        V::KIND
    }

    fn core(&self) -> &ViewCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ViewCore {
        &mut self.core
    }

    fn capture(&self) -> Result<AttributeSnapshot, SnapshotError> {
        snapshot::capture(self, &self.core.declared)
    }

    fn restore(&mut self, snapshot: &AttributeSnapshot) -> Result<(), SnapshotError> {
        snapshot::restore(self, snapshot)
    }

    fn render(&self) -> LiveMessage {
        LiveMessage {
            content: V::content(self),
            rows: codec::encode_rows(&self.components),
        }
    }

    fn dispatch<'a>(
        &'a mut self,
        interaction: &'a ComponentInteraction,
        manager: &'a SessionManager,
    ) -> BoxFuture<'a, Result<(), SessionError>> {
        match self.resolve_action(interaction) {
            Some(action) => action(self, interaction, manager),
            None => {
                let err = SessionError::CallbackNotFound {
                    kind: V::KIND,
                    custom_id: interaction.custom_id.clone(),
                    record_id: self.core.record.as_ref().map(|record| record.id),
                };
                Box::pin(async move { Err(err) })
            }
        }
    }
}

/// Put a session behind the shared handle the index and timers use.
pub fn wrap(session: impl Session) -> SessionHandle {
    Arc::new(Mutex::new(Box::new(session)))
}
