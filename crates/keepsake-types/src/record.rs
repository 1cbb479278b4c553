//! Durable session record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{MessageKey, RecordId};
use crate::session::SessionKind;
use crate::snapshot::AttributeSnapshot;

/// Persisted state of one session, keyed uniquely by its message.
///
/// The record is an in-memory handle on a database row: `deleted` is set
/// once `delete` succeeded through this handle, after which every further
/// write through it fails with `NoLongerExists`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: RecordId,
    pub key: MessageKey,
    /// Attribute snapshot; `None` when the view declared nothing to persist.
    pub data: Option<AttributeSnapshot>,
    pub kind: SessionKind,
    pub timeout_secs: u32,
    pub created_at: DateTime<Utc>,
    pub last_loaded_at: Option<DateTime<Utc>>,
    pub last_updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted: bool,
}

impl SessionRecord {
    /// A fresh, not yet stored record.
    pub fn new(
        key: MessageKey,
        data: Option<AttributeSnapshot>,
        kind: SessionKind,
        timeout_secs: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::new(),
            key,
            data: data.filter(|snapshot| !snapshot.is_empty()),
            kind,
            timeout_secs,
            created_at: now,
            last_loaded_at: None,
            last_updated_at: now,
            deleted: false,
        }
    }

    /// Replace the stored snapshot, mapping an empty one to the no-data sentinel.
    pub fn set_data(&mut self, snapshot: AttributeSnapshot) {
        self.data = if snapshot.is_empty() {
            None
        } else {
            Some(snapshot)
        };
    }
}

/// Filter criteria for listing records.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub kind: Option<SessionKind>,
    pub guild_id: Option<crate::ids::GuildId>,
    pub limit: Option<i64>,
}
