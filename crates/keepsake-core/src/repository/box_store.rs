//! BoxSessionStore -- object-safe dynamic dispatch wrapper for SessionStore.
//!
//! 1. Define an object-safe `SessionStoreDyn` trait with boxed futures
//! 2. Blanket-impl `SessionStoreDyn` for all `T: SessionStore`
//! 3. `BoxSessionStore` wraps `Arc<dyn SessionStoreDyn>` and delegates

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use keepsake_types::error::StoreError;
use keepsake_types::ids::MessageKey;
use keepsake_types::record::{RecordFilter, SessionRecord};
use keepsake_types::session::SessionKind;
use keepsake_types::snapshot::AttributeSnapshot;

use super::session::SessionStore;

type BoxedFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Object-safe version of [`SessionStore`] with boxed futures.
///
/// A blanket implementation is provided for all types implementing `SessionStore`.
pub trait SessionStoreDyn: Send + Sync {
    fn create_boxed(
        &self,
        key: MessageKey,
        data: Option<AttributeSnapshot>,
        kind: SessionKind,
        timeout_secs: u32,
    ) -> BoxedFuture<'_, SessionRecord>;

    fn load_boxed(&self, key: MessageKey) -> BoxedFuture<'_, SessionRecord>;

    fn save_boxed<'a>(&'a self, record: &'a mut SessionRecord) -> BoxedFuture<'a, ()>;

    fn delete_boxed<'a>(&'a self, record: &'a mut SessionRecord) -> BoxedFuture<'a, ()>;

    fn delete_by_key_boxed(&self, key: MessageKey) -> BoxedFuture<'_, ()>;

    fn list_boxed(&self, filter: RecordFilter) -> BoxedFuture<'_, Vec<SessionRecord>>;

    fn prune_boxed(&self, cutoff: DateTime<Utc>) -> BoxedFuture<'_, u64>;
}

impl<T: SessionStore> SessionStoreDyn for T {
    fn create_boxed(
        &self,
        key: MessageKey,
        data: Option<AttributeSnapshot>,
        kind: SessionKind,
        timeout_secs: u32,
    ) -> BoxedFuture<'_, SessionRecord> {
        Box::pin(self.create(key, data, kind, timeout_secs))
    }

    fn load_boxed(&self, key: MessageKey) -> BoxedFuture<'_, SessionRecord> {
        Box::pin(self.load(key))
    }

    fn save_boxed<'a>(&'a self, record: &'a mut SessionRecord) -> BoxedFuture<'a, ()> {
        Box::pin(self.save(record))
    }

    fn delete_boxed<'a>(&'a self, record: &'a mut SessionRecord) -> BoxedFuture<'a, ()> {
        Box::pin(self.delete(record))
    }

    fn delete_by_key_boxed(&self, key: MessageKey) -> BoxedFuture<'_, ()> {
        Box::pin(self.delete_by_key(key))
    }

    fn list_boxed(&self, filter: RecordFilter) -> BoxedFuture<'_, Vec<SessionRecord>> {
        Box::pin(self.list(filter))
    }

    fn prune_boxed(&self, cutoff: DateTime<Utc>) -> BoxedFuture<'_, u64> {
        Box::pin(self.prune(cutoff))
    }
}

/// Type-erased session store, cheap to clone.
///
/// Since `SessionStore` uses RPITIT, it cannot be used as a trait object
/// directly. `BoxSessionStore` provides equivalent methods that delegate to
/// the inner `SessionStoreDyn` trait object.
#[derive(Clone)]
pub struct BoxSessionStore {
    inner: Arc<dyn SessionStoreDyn>,
}

impl BoxSessionStore {
    pub fn new<T: SessionStore + 'static>(store: T) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wrap a store that is shared with other owners.
    pub fn from_arc<T: SessionStore + 'static>(store: Arc<T>) -> Self {
        Self { inner: store }
    }

    pub async fn create(
        &self,
        key: MessageKey,
        data: Option<AttributeSnapshot>,
        kind: SessionKind,
        timeout_secs: u32,
    ) -> Result<SessionRecord, StoreError> {
        self.inner.create_boxed(key, data, kind, timeout_secs).await
    }

    pub async fn load(&self, key: MessageKey) -> Result<SessionRecord, StoreError> {
        self.inner.load_boxed(key).await
    }

    pub async fn save(&self, record: &mut SessionRecord) -> Result<(), StoreError> {
        self.inner.save_boxed(record).await
    }

    pub async fn delete(&self, record: &mut SessionRecord) -> Result<(), StoreError> {
        self.inner.delete_boxed(record).await
    }

    pub async fn delete_by_key(&self, key: MessageKey) -> Result<(), StoreError> {
        self.inner.delete_by_key_boxed(key).await
    }

    pub async fn list(&self, filter: RecordFilter) -> Result<Vec<SessionRecord>, StoreError> {
        self.inner.list_boxed(filter).await
    }

    pub async fn prune(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        self.inner.prune_boxed(cutoff).await
    }
}
