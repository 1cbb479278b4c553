//! SQLite session store implementation.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use keepsake_core::repository::SessionStore;
use keepsake_types::error::StoreError;
use keepsake_types::ids::{ChannelId, GuildId, MessageId, MessageKey, RecordId};
use keepsake_types::record::{RecordFilter, SessionRecord};
use keepsake_types::session::SessionKind;
use keepsake_types::snapshot::AttributeSnapshot;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::pool::DatabasePool;

const COLUMNS: &str = "id, guild_id, channel_id, message_id, data, kind, timeout_secs, \
                       created_at, last_loaded_at, last_updated_at";

/// SQLite-backed implementation of `SessionStore`.
pub struct SqliteSessionStore {
    pool: DatabasePool,
}

impl SqliteSessionStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Private row type for mapping SQLite rows to domain types.
struct SessionRow {
    id: String,
    guild_id: i64,
    channel_id: i64,
    message_id: i64,
    data: Option<String>,
    kind: String,
    timeout_secs: i64,
    created_at: String,
    last_loaded_at: Option<String>,
    last_updated_at: String,
}

impl SessionRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            guild_id: row.try_get("guild_id")?,
            channel_id: row.try_get("channel_id")?,
            message_id: row.try_get("message_id")?,
            data: row.try_get("data")?,
            kind: row.try_get("kind")?,
            timeout_secs: row.try_get("timeout_secs")?,
            created_at: row.try_get("created_at")?,
            last_loaded_at: row.try_get("last_loaded_at")?,
            last_updated_at: row.try_get("last_updated_at")?,
        })
    }

    fn into_record(self) -> Result<SessionRecord, StoreError> {
        let id = self
            .id
            .parse::<RecordId>()
            .map_err(|e| StoreError::Query(format!("invalid record id '{}': {e}", self.id)))?;
        let kind = self
            .kind
            .parse::<SessionKind>()
            .map_err(|e| StoreError::Query(format!("record {id}: {e}")))?;
        let data = self
            .data
            .as_deref()
            .map(serde_json::from_str::<AttributeSnapshot>)
            .transpose()
            .map_err(|e| StoreError::Query(format!("record {id}: invalid data: {e}")))?;
        let timeout_secs = u32::try_from(self.timeout_secs)
            .map_err(|e| StoreError::Query(format!("record {id}: invalid timeout: {e}")))?;

        Ok(SessionRecord {
            id,
            key: MessageKey::new(
                GuildId(from_sql_id(self.guild_id)),
                ChannelId(from_sql_id(self.channel_id)),
                MessageId(from_sql_id(self.message_id)),
            ),
            data,
            kind,
            timeout_secs,
            created_at: parse_datetime(&self.created_at)?,
            last_loaded_at: self
                .last_loaded_at
                .as_deref()
                .map(parse_datetime)
                .transpose()?,
            last_updated_at: parse_datetime(&self.last_updated_at)?,
            deleted: false,
        })
    }
}

/// Snowflakes are stored bit-for-bit in SQLite's signed INTEGER.
fn to_sql_id(id: u64) -> i64 {
    id as i64
}

fn from_sql_id(value: i64) -> u64 {
    value as u64
}

/// Fixed width so timestamps compare correctly as text.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Query(format!("invalid datetime '{s}': {e}")))
}

fn encode_data(data: &Option<AttributeSnapshot>) -> Result<Option<String>, StoreError> {
    data.as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| StoreError::Query(format!("failed to encode session data: {e}")))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE"))
}

impl SessionStore for SqliteSessionStore {
    async fn create(
        &self,
        key: MessageKey,
        data: Option<AttributeSnapshot>,
        kind: SessionKind,
        timeout_secs: u32,
    ) -> Result<SessionRecord, StoreError> {
        let mut record = SessionRecord::new(key, data, kind, timeout_secs);
        record.created_at = record.created_at.trunc_subsecs(6);
        record.last_updated_at = record.created_at;
        let data = encode_data(&record.data)?;

        let result = sqlx::query(
            "INSERT INTO saved_sessions (id, guild_id, channel_id, message_id, data, kind, \
             timeout_secs, created_at, last_loaded_at, last_updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(to_sql_id(key.guild_id.get()))
        .bind(to_sql_id(key.channel_id.get()))
        .bind(to_sql_id(key.message_id.get()))
        .bind(data)
        .bind(kind.as_str())
        .bind(i64::from(timeout_secs))
        .bind(format_datetime(&record.created_at))
        .bind(record.last_loaded_at.as_ref().map(format_datetime))
        .bind(format_datetime(&record.last_updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => {
                tracing::debug!(record_id = %record.id, %key, %kind, "created saved session");
                Ok(record)
            }
            Err(e) if is_unique_violation(&e) => Err(StoreError::AlreadyExists(key)),
            Err(e) => Err(StoreError::Query(e.to_string())),
        }
    }

    async fn load(&self, key: MessageKey) -> Result<SessionRecord, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM saved_sessions \
             WHERE guild_id = ? AND channel_id = ? AND message_id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(to_sql_id(key.guild_id.get()))
            .bind(to_sql_id(key.channel_id.get()))
            .bind(to_sql_id(key.message_id.get()))
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let session_row =
                    SessionRow::from_row(&row).map_err(|e| StoreError::Query(e.to_string()))?;
                session_row.into_record()
            }
            None => Err(StoreError::NotFound(key)),
        }
    }

    async fn save(&self, record: &mut SessionRecord) -> Result<(), StoreError> {
        if record.deleted {
            return Err(StoreError::NoLongerExists {
                id: record.id,
                key: record.key,
            });
        }

        let now = Utc::now().trunc_subsecs(6);
        let data = encode_data(&record.data)?;

        let result = sqlx::query(
            "UPDATE saved_sessions SET guild_id = ?, channel_id = ?, message_id = ?, data = ?, \
             kind = ?, timeout_secs = ?, last_loaded_at = ?, last_updated_at = ? WHERE id = ?",
        )
        .bind(to_sql_id(record.key.guild_id.get()))
        .bind(to_sql_id(record.key.channel_id.get()))
        .bind(to_sql_id(record.key.message_id.get()))
        .bind(data)
        .bind(record.kind.as_str())
        .bind(i64::from(record.timeout_secs))
        .bind(record.last_loaded_at.as_ref().map(format_datetime))
        .bind(format_datetime(&now))
        .bind(record.id.to_string())
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(StoreError::NotFound(record.key)),
            Ok(_) => {
                record.last_updated_at = now;
                Ok(())
            }
            Err(e) if is_unique_violation(&e) => Err(StoreError::AlreadyExists(record.key)),
            Err(e) => Err(StoreError::Query(e.to_string())),
        }
    }

    async fn delete(&self, record: &mut SessionRecord) -> Result<(), StoreError> {
        if record.deleted {
            return Err(StoreError::NoLongerExists {
                id: record.id,
                key: record.key,
            });
        }

        let result = sqlx::query("DELETE FROM saved_sessions WHERE id = ?")
            .bind(record.id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(record.key));
        }
        record.deleted = true;
        tracing::debug!(record_id = %record.id, key = %record.key, "deleted saved session");
        Ok(())
    }

    async fn delete_by_key(&self, key: MessageKey) -> Result<(), StoreError> {
        let result = sqlx::query(
            "DELETE FROM saved_sessions WHERE guild_id = ? AND channel_id = ? AND message_id = ?",
        )
        .bind(to_sql_id(key.guild_id.get()))
        .bind(to_sql_id(key.channel_id.get()))
        .bind(to_sql_id(key.message_id.get()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(key));
        }
        Ok(())
    }

    async fn list(&self, filter: RecordFilter) -> Result<Vec<SessionRecord>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM saved_sessions \
             WHERE (?1 IS NULL OR kind = ?1) AND (?2 IS NULL OR guild_id = ?2) \
             ORDER BY last_updated_at DESC LIMIT ?3"
        );
        let rows = sqlx::query(&sql)
            .bind(filter.kind.map(|k| k.as_str()))
            .bind(filter.guild_id.map(|g| to_sql_id(g.get())))
            // A negative limit means no limit in SQLite.
            .bind(filter.limit.unwrap_or(-1))
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                SessionRow::from_row(row)
                    .map_err(|e| StoreError::Query(e.to_string()))?
                    .into_record()
            })
            .collect()
    }

    async fn prune(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM saved_sessions WHERE last_updated_at < ?")
            .bind(format_datetime(&cutoff))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let removed = result.rows_affected();
        tracing::info!(removed, cutoff = %cutoff, "pruned saved sessions");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = DatabasePool::new(&url).await.unwrap();
        // Keep the tempdir alive for the test's duration
        std::mem::forget(dir);
        pool
    }

    fn key(message_id: u64) -> MessageKey {
        MessageKey::new(GuildId(1), ChannelId(2), MessageId(message_id))
    }

    fn snapshot(page: i64) -> AttributeSnapshot {
        [
            ("RolePriorityView.page".to_string(), serde_json::json!(page)),
            ("RolePriorityView.order".to_string(), serde_json::json!(["10", "11"])),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn test_create_and_load() {
        let store = SqliteSessionStore::new(test_pool().await);

        let created = store
            .create(key(3), Some(snapshot(1)), SessionKind::RolePriority, 180)
            .await
            .unwrap();
        let loaded = store.load(key(3)).await.unwrap();

        assert_eq!(loaded.id, created.id);
        assert_eq!(loaded.key, key(3));
        assert_eq!(loaded.kind, SessionKind::RolePriority);
        assert_eq!(loaded.timeout_secs, 180);
        assert_eq!(loaded.data, Some(snapshot(1)));
        assert!(loaded.last_loaded_at.is_none());
        assert!(!loaded.deleted);
    }

    #[tokio::test]
    async fn test_large_snowflakes_survive() {
        let store = SqliteSessionStore::new(test_pool().await);
        let key = MessageKey::new(GuildId(u64::MAX), ChannelId(1 << 63), MessageId(815_000_000_000_000_042));

        store.create(key, None, SessionKind::LevelingConfig, 60).await.unwrap();
        let loaded = store.load(key).await.unwrap();
        assert_eq!(loaded.key, key);
    }

    #[tokio::test]
    async fn test_create_duplicate_key() {
        let store = SqliteSessionStore::new(test_pool().await);
        store.create(key(3), None, SessionKind::RolePriority, 180).await.unwrap();

        let result = store.create(key(3), Some(snapshot(2)), SessionKind::RolePriority, 180).await;
        assert!(matches!(result, Err(StoreError::AlreadyExists(k)) if k == key(3)));

        // The first row is left untouched.
        assert!(store.load(key(3)).await.unwrap().data.is_none());
    }

    #[tokio::test]
    async fn test_load_missing() {
        let store = SqliteSessionStore::new(test_pool().await);
        let result = store.load(key(404)).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_data_is_stored_as_null() {
        let store = SqliteSessionStore::new(test_pool().await);
        store
            .create(key(3), Some(AttributeSnapshot::new()), SessionKind::RolePriority, 180)
            .await
            .unwrap();

        let (data,): (Option<String>,) =
            sqlx::query_as("SELECT data FROM saved_sessions WHERE message_id = 3")
                .fetch_one(&store.pool.reader)
                .await
                .unwrap();
        assert!(data.is_none());
        assert!(store.load(key(3)).await.unwrap().data.is_none());
    }

    #[tokio::test]
    async fn test_save_updates_data_and_timestamp() {
        let store = SqliteSessionStore::new(test_pool().await);
        let mut record = store.create(key(3), None, SessionKind::RolePriority, 180).await.unwrap();
        let before = record.last_updated_at;

        record.set_data(snapshot(4));
        record.last_loaded_at = Some(Utc::now());
        store.save(&mut record).await.unwrap();

        assert!(record.last_updated_at >= before);
        let loaded = store.load(key(3)).await.unwrap();
        assert_eq!(loaded.data, Some(snapshot(4)));
        assert!(loaded.last_loaded_at.is_some());
        assert_eq!(loaded.last_updated_at, record.last_updated_at);
        assert_eq!(loaded.created_at, record.created_at);
    }

    #[tokio::test]
    async fn test_save_row_gone() {
        let store = SqliteSessionStore::new(test_pool().await);
        let mut record = store.create(key(3), None, SessionKind::RolePriority, 180).await.unwrap();
        store.delete_by_key(key(3)).await.unwrap();

        let result = store.save(&mut record).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_save_onto_taken_key() {
        let store = SqliteSessionStore::new(test_pool().await);
        store.create(key(3), None, SessionKind::RolePriority, 180).await.unwrap();
        let mut other = store.create(key(4), None, SessionKind::RolePriority, 180).await.unwrap();

        other.key = key(3);
        let result = store.save(&mut other).await;
        assert!(matches!(result, Err(StoreError::AlreadyExists(k)) if k == key(3)));
    }

    #[tokio::test]
    async fn test_delete_then_write_through_handle() {
        let store = SqliteSessionStore::new(test_pool().await);
        let mut record = store.create(key(3), None, SessionKind::RolePriority, 180).await.unwrap();

        store.delete(&mut record).await.unwrap();
        assert!(record.deleted);
        assert!(matches!(store.load(key(3)).await, Err(StoreError::NotFound(_))));

        assert!(matches!(
            store.delete(&mut record).await,
            Err(StoreError::NoLongerExists { .. })
        ));
        assert!(matches!(
            store.save(&mut record).await,
            Err(StoreError::NoLongerExists { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_through_stale_handle() {
        let store = SqliteSessionStore::new(test_pool().await);
        let mut first = store.create(key(3), None, SessionKind::RolePriority, 180).await.unwrap();
        let mut second = store.load(key(3)).await.unwrap();

        store.delete(&mut first).await.unwrap();
        let result = store.delete(&mut second).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(!second.deleted);
    }

    #[tokio::test]
    async fn test_delete_by_key_missing() {
        let store = SqliteSessionStore::new(test_pool().await);
        let result = store.delete_by_key(key(3)).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_kind_is_query_error() {
        let store = SqliteSessionStore::new(test_pool().await);
        store.create(key(3), None, SessionKind::RolePriority, 180).await.unwrap();
        sqlx::query("UPDATE saved_sessions SET kind = 'retired_view'")
            .execute(&store.pool.writer)
            .await
            .unwrap();

        let result = store.load(key(3)).await;
        assert!(matches!(result, Err(StoreError::Query(msg)) if msg.contains("retired_view")));
    }

    #[tokio::test]
    async fn test_list_with_filters() {
        let store = SqliteSessionStore::new(test_pool().await);
        store.create(key(1), None, SessionKind::RolePriority, 180).await.unwrap();
        store.create(key(2), None, SessionKind::LevelingConfig, 180).await.unwrap();
        let mut newest = store.create(key(3), None, SessionKind::RolePriority, 180).await.unwrap();
        store.save(&mut newest).await.unwrap();
        store
            .create(
                MessageKey::new(GuildId(9), ChannelId(2), MessageId(4)),
                None,
                SessionKind::RolePriority,
                180,
            )
            .await
            .unwrap();

        let all = store.list(RecordFilter::default()).await.unwrap();
        assert_eq!(all.len(), 4);

        let priority = store
            .list(RecordFilter {
                kind: Some(SessionKind::RolePriority),
                guild_id: Some(GuildId(1)),
                limit: None,
            })
            .await
            .unwrap();
        assert_eq!(priority.len(), 2);
        assert_eq!(priority[0].key, key(3));

        let limited = store
            .list(RecordFilter {
                limit: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_prune() {
        let store = SqliteSessionStore::new(test_pool().await);
        store.create(key(1), None, SessionKind::RolePriority, 180).await.unwrap();
        store.create(key(2), None, SessionKind::RolePriority, 180).await.unwrap();
        sqlx::query("UPDATE saved_sessions SET last_updated_at = ? WHERE message_id = 1")
            .bind(format_datetime(&(Utc::now() - Duration::days(30))))
            .execute(&store.pool.writer)
            .await
            .unwrap();

        let removed = store.prune(Utc::now() - Duration::days(7)).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.load(key(1)).await.is_err());
        assert!(store.load(key(2)).await.is_ok());
    }
}
