use thiserror::Error;

use std::fmt;

use crate::component::ComponentKind;
use crate::ids::{MessageKey, RecordId};
use crate::session::SessionKind;
use crate::snapshot::AttributeSnapshot;

/// Errors from session store operations (used by trait definitions in keepsake-core).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    /// No row exists for the key.
    #[error("no saved session found for {0}")]
    NotFound(MessageKey),

    /// A row for the key is already stored.
    #[error("a saved session already exists for {0}")]
    AlreadyExists(MessageKey),

    /// The handle was deleted earlier; writes through it are refused.
    #[error("saved session {id} ({key}) no longer exists")]
    NoLongerExists { id: RecordId, key: MessageKey },
}

/// Errors reported by the chat platform collaborator.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("message not found: {0}")]
    MessageNotFound(MessageKey),

    #[error("platform request failed: {0}")]
    Request(String),
}

/// Which lifecycle rule a transition broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleViolation {
    /// `activate` on an active session.
    AlreadyActive,
    /// `activate` on a stopped session.
    StoppedBefore,
    /// `deactivate` on a stopped session.
    AlreadyStopped,
    /// `deactivate` on a session that was never activated.
    NotActive,
    /// `activate` before the message id was set.
    MessageIdMissing,
    /// `activate` while another session already owns the message id.
    Occupied,
}

impl fmt::Display for LifecycleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleViolation::AlreadyActive => write!(f, "attempt to start a view that was started"),
            LifecycleViolation::StoppedBefore => {
                write!(f, "attempt to start a view that was stopped before")
            }
            LifecycleViolation::AlreadyStopped => write!(f, "attempt to stop a view that was stopped"),
            LifecycleViolation::NotActive => {
                write!(f, "attempt to stop a view that was never started")
            }
            LifecycleViolation::MessageIdMissing => {
                write!(f, "attempt to start a view that is not bound to a message")
            }
            LifecycleViolation::Occupied => {
                write!(f, "attempt to start a view on a message owned by another view")
            }
        }
    }
}

/// A lifecycle transition was refused.
///
/// Carries the diagnostics needed to tell a race from a data problem: the
/// view's type tag, its record id if it was ever persisted, and the values
/// of its persisted attributes at the time of the failure.
#[derive(Debug, Error)]
#[error("{violation} (view '{kind}', record_id={}, attributes {})", display_record(.record_id), .attributes.describe())]
pub struct LifecycleError {
    pub violation: LifecycleViolation,
    pub kind: SessionKind,
    pub record_id: Option<RecordId>,
    pub attributes: AttributeSnapshot,
}

fn display_record(id: &Option<RecordId>) -> String {
    id.map_or_else(|| "none".to_string(), |id| id.to_string())
}

/// Errors from capturing or restoring attribute snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Two field declarations would be stored under the same key.
    #[error("view '{kind}' declares attribute '{name}' more than once")]
    AttributeNameConflict { kind: SessionKind, name: String },

    /// The snapshot names a field the view does not declare.
    #[error("view '{kind}' has no attribute '{name}'")]
    AttributeNotFound { kind: SessionKind, name: String },

    /// The stored value does not fit the field's type.
    #[error("attribute '{name}' of view '{kind}' could not be converted: {reason}")]
    AttributeType {
        kind: SessionKind,
        name: String,
        reason: String,
    },
}

/// Errors from rebuilding a live component from its descriptor.
#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("unsupported component type {kind} (custom_id={custom_id:?})")]
    Unsupported { kind: u8, custom_id: Option<String> },

    #[error("row {row} is out of range for a {kind}")]
    RowOutOfRange { kind: ComponentKind, row: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ChannelId, GuildId, MessageId};

    #[test]
    fn test_store_error_display() {
        let key = MessageKey::new(GuildId(1), ChannelId(2), MessageId(3));
        let err = StoreError::NotFound(key);
        assert_eq!(
            err.to_string(),
            "no saved session found for guild_id=1, channel_id=2, message_id=3"
        );
    }

    #[test]
    fn test_lifecycle_error_display_without_record() {
        let err = LifecycleError {
            violation: LifecycleViolation::AlreadyActive,
            kind: SessionKind::RolePriority,
            record_id: None,
            attributes: [("RolePriorityView.page".to_string(), serde_json::json!(2))]
                .into_iter()
                .collect(),
        };
        let text = err.to_string();
        assert!(text.contains("was started"));
        assert!(text.contains("role_priority"));
        assert!(text.contains("record_id=none"));
        assert!(text.contains("RolePriorityView.page='2'"));
    }

    #[test]
    fn test_snapshot_error_display() {
        let err = SnapshotError::AttributeNotFound {
            kind: SessionKind::LevelingConfig,
            name: "LevelingConfigView.ghost".into(),
        };
        assert_eq!(
            err.to_string(),
            "view 'leveling_config' has no attribute 'LevelingConfigView.ghost'"
        );
    }
}
