//! In-memory store and recording platform for engine tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use keepsake_types::component::LiveMessage;
use keepsake_types::error::{PlatformError, StoreError};
use keepsake_types::ids::{ChannelId, GuildId, MessageId, MessageKey};
use keepsake_types::interaction::{ComponentInteraction, Reply};
use keepsake_types::record::{RecordFilter, SessionRecord};
use keepsake_types::session::SessionKind;
use keepsake_types::snapshot::AttributeSnapshot;

use crate::platform::Platform;
use crate::repository::SessionStore;

#[derive(Default)]
pub struct MockStore {
    rows: DashMap<MessageKey, SessionRecord>,
    loads: AtomicUsize,
    saves: AtomicUsize,
    read_delay: Option<Duration>,
    write_delay: Option<Duration>,
}

impl MockStore {
    /// Make `load` sleep for `delay` before answering.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Make `create` and `save` sleep for `delay` before writing.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    pub fn get(&self, key: MessageKey) -> Option<SessionRecord> {
        self.rows.get(&key).map(|row| row.value().clone())
    }

    pub fn insert(&self, record: SessionRecord) {
        self.rows.insert(record.key, record);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SessionStore for MockStore {
    async fn create(
        &self,
        key: MessageKey,
        data: Option<AttributeSnapshot>,
        kind: SessionKind,
        timeout_secs: u32,
    ) -> Result<SessionRecord, StoreError> {
        pause(self.write_delay).await;
        if self.rows.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key));
        }
        let record = SessionRecord::new(key, data, kind, timeout_secs);
        self.rows.insert(key, record.clone());
        Ok(record)
    }

    async fn load(&self, key: MessageKey) -> Result<SessionRecord, StoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        pause(self.read_delay).await;
        self.get(key).ok_or(StoreError::NotFound(key))
    }

    async fn save(&self, record: &mut SessionRecord) -> Result<(), StoreError> {
        pause(self.write_delay).await;
        if record.deleted {
            return Err(StoreError::NoLongerExists {
                id: record.id,
                key: record.key,
            });
        }
        if !self.rows.contains_key(&record.key) {
            return Err(StoreError::NotFound(record.key));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        record.last_updated_at = Utc::now();
        self.rows.insert(record.key, record.clone());
        Ok(())
    }

    async fn delete(&self, record: &mut SessionRecord) -> Result<(), StoreError> {
        if record.deleted {
            return Err(StoreError::NoLongerExists {
                id: record.id,
                key: record.key,
            });
        }
        self.rows
            .remove(&record.key)
            .ok_or(StoreError::NotFound(record.key))?;
        record.deleted = true;
        Ok(())
    }

    async fn delete_by_key(&self, key: MessageKey) -> Result<(), StoreError> {
        self.rows.remove(&key).map(|_| ()).ok_or(StoreError::NotFound(key))
    }

    async fn list(&self, filter: RecordFilter) -> Result<Vec<SessionRecord>, StoreError> {
        let mut records: Vec<_> = self
            .rows
            .iter()
            .map(|row| row.value().clone())
            .filter(|r| filter.kind.is_none_or(|kind| r.kind == kind))
            .filter(|r| filter.guild_id.is_none_or(|guild| r.key.guild_id == guild))
            .collect();
        records.sort_by(|a, b| b.last_updated_at.cmp(&a.last_updated_at));
        if let Some(limit) = filter.limit {
            records.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(records)
    }

    async fn prune(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let before = self.rows.len();
        self.rows.retain(|_, r| r.last_updated_at >= cutoff);
        Ok((before - self.rows.len()) as u64)
    }
}

async fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

/// Platform double that keeps messages in memory and records every call.
pub struct MockPlatform {
    messages: DashMap<MessageKey, LiveMessage>,
    next_id: AtomicU64,
    sent: Mutex<Vec<MessageKey>>,
    edited: Mutex<Vec<MessageKey>>,
    deleted: Mutex<Vec<MessageKey>>,
    replies: Mutex<Vec<Reply>>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self {
            messages: DashMap::new(),
            next_id: AtomicU64::new(1000),
            sent: Mutex::new(Vec::new()),
            edited: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            replies: Mutex::new(Vec::new()),
        }
    }
}

impl MockPlatform {
    /// Pretend `message` is rendered under `key`.
    pub fn put(&self, key: MessageKey, message: LiveMessage) {
        self.messages.insert(key, message);
    }

    pub fn message(&self, key: MessageKey) -> Option<LiveMessage> {
        self.messages.get(&key).map(|m| m.value().clone())
    }

    pub fn sent(&self) -> Vec<MessageKey> {
        self.sent.lock().unwrap().clone()
    }

    pub fn edited(&self) -> Vec<MessageKey> {
        self.edited.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<MessageKey> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn replies(&self) -> Vec<Reply> {
        self.replies.lock().unwrap().clone()
    }
}

impl Platform for MockPlatform {
    async fn fetch_message(&self, key: MessageKey) -> Result<Option<LiveMessage>, PlatformError> {
        Ok(self.message(key))
    }

    async fn send_message(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        message: LiveMessage,
    ) -> Result<MessageId, PlatformError> {
        let message_id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let key = MessageKey::new(guild_id, channel_id, message_id);
        self.messages.insert(key, message);
        self.sent.lock().unwrap().push(key);
        Ok(message_id)
    }

    async fn edit_message(&self, key: MessageKey, message: LiveMessage) -> Result<(), PlatformError> {
        if !self.messages.contains_key(&key) {
            return Err(PlatformError::MessageNotFound(key));
        }
        self.messages.insert(key, message);
        self.edited.lock().unwrap().push(key);
        Ok(())
    }

    async fn delete_message(&self, key: MessageKey) -> Result<(), PlatformError> {
        self.messages.remove(&key);
        self.deleted.lock().unwrap().push(key);
        Ok(())
    }

    async fn reply(&self, _interaction: &ComponentInteraction, reply: Reply) -> Result<(), PlatformError> {
        self.replies.lock().unwrap().push(reply);
        Ok(())
    }
}
