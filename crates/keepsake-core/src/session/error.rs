use keepsake_types::error::{
    ComponentError, LifecycleError, LifecycleViolation, PlatformError, SnapshotError, StoreError,
};
use keepsake_types::ids::RecordId;
use keepsake_types::session::SessionKind;
use thiserror::Error;

/// Everything that can go wrong while routing an interaction to a session
/// or running one of its handlers.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Component(#[from] ComponentError),

    /// The session has no handler bound to the triggering identifier.
    #[error("view '{kind}' has no callback for '{custom_id}' (record_id={})", display_record(.record_id))]
    CallbackNotFound {
        kind: SessionKind,
        custom_id: String,
        record_id: Option<RecordId>,
    },

    /// A handler body failed for a reason of its own.
    #[error("handler failed: {0}")]
    Handler(String),
}

fn display_record(id: &Option<RecordId>) -> String {
    id.map_or_else(|| "none".to_string(), |id| id.to_string())
}

impl SessionError {
    /// True for a lifecycle error with the given violation.
    pub fn is_violation(&self, violation: LifecycleViolation) -> bool {
        matches!(self, SessionError::Lifecycle(err) if err.violation == violation)
    }
}
