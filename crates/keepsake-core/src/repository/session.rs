//! Session store trait definition.

use chrono::{DateTime, Utc};
use keepsake_types::error::StoreError;
use keepsake_types::ids::MessageKey;
use keepsake_types::record::{RecordFilter, SessionRecord};
use keepsake_types::session::SessionKind;
use keepsake_types::snapshot::AttributeSnapshot;

/// Repository trait for persisted session records.
///
/// Records are unique per (guild, channel, message). Implementations live
/// in keepsake-infra (e.g., SqliteSessionStore).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait SessionStore: Send + Sync {
    /// Store a new record. Fails with `AlreadyExists` if the key is taken;
    /// an existing row is never overwritten.
    fn create(
        &self,
        key: MessageKey,
        data: Option<AttributeSnapshot>,
        kind: SessionKind,
        timeout_secs: u32,
    ) -> impl std::future::Future<Output = Result<SessionRecord, StoreError>> + Send;

    /// Load the record for a message. Fails with `NotFound` if absent.
    fn load(
        &self,
        key: MessageKey,
    ) -> impl std::future::Future<Output = Result<SessionRecord, StoreError>> + Send;

    /// Write the record's current data and timestamps back.
    ///
    /// Refreshes `last_updated_at`. Fails with `NoLongerExists` if this
    /// handle was deleted, `AlreadyExists` on a uniqueness violation and
    /// `NotFound` if the row disappeared underneath the handle. Must not be
    /// called concurrently on one handle.
    fn save(
        &self,
        record: &mut SessionRecord,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Remove the record's row and mark the handle deleted.
    ///
    /// Fails with `NoLongerExists` on a second call through the same handle
    /// and `NotFound` if the row is already gone.
    fn delete(
        &self,
        record: &mut SessionRecord,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Remove the row for a message without holding its record.
    fn delete_by_key(
        &self,
        key: MessageKey,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// List records, newest first.
    fn list(
        &self,
        filter: RecordFilter,
    ) -> impl std::future::Future<Output = Result<Vec<SessionRecord>, StoreError>> + Send;

    /// Remove every record not updated since `cutoff`. Returns the number removed.
    fn prune(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<u64, StoreError>> + Send;
}
