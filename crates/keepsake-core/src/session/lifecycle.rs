//! Session lifecycle controller.
//!
//! State machine per session:
//!
//! ```text
//! Created --activate--> Active --deactivate--> Stopped
//! ```
//!
//! Stopped is terminal. Activation inserts the session into the process-wide
//! active index (message id -> handle) and arms its idle timer;
//! deactivation removes it and cancels the timer. `stop` and the idle
//! timeout both persist the session's snapshot and then deactivate it, so
//! the session stays resident until its record is written.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use keepsake_types::config::BotConfig;
use keepsake_types::error::{LifecycleError, LifecycleViolation, StoreError};
use keepsake_types::ids::MessageId;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::{IdleTimer, Session, SessionError, SessionHandle, View, ViewSession, wrap};
use crate::platform::BoxPlatform;
use crate::repository::BoxSessionStore;

/// Owns the active index and drives lifecycle transitions.
///
/// Cheap to clone; every clone shares the same index.
#[derive(Clone)]
pub struct SessionManager {
    store: BoxSessionStore,
    platform: BoxPlatform,
    index: Arc<DashMap<MessageId, SessionHandle>>,
    config: Arc<BotConfig>,
}

impl SessionManager {
    pub fn new(store: BoxSessionStore, platform: BoxPlatform, config: BotConfig) -> Self {
        Self {
            store,
            platform,
            index: Arc::new(DashMap::new()),
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &BoxSessionStore {
        &self.store
    }

    pub fn platform(&self) -> &BoxPlatform {
        &self.platform
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// The resident session for `message_id`, if any.
    pub fn get(&self, message_id: MessageId) -> Option<SessionHandle> {
        self.index.get(&message_id).map(|entry| entry.value().clone())
    }

    pub fn active_count(&self) -> usize {
        self.index.len()
    }

    /// Idle timeout of a session, falling back to the configured default.
    pub fn timeout_for(&self, session: &dyn Session) -> Duration {
        session
            .core()
            .timeout()
            .unwrap_or_else(|| Duration::from_secs(self.config.default_timeout_secs.into()))
    }

    /// Created -> Active.
    ///
    /// # Errors
    ///
    /// `AlreadyActive`, `StoppedBefore`, `MessageIdMissing`, or `Occupied`
    /// when another session already owns the message id.
    pub async fn activate(&self, handle: &SessionHandle) -> Result<(), LifecycleError> {
        let mut session = handle.lock().await;
        let core = session.core();

        if core.active {
            return Err(violation(&**session, LifecycleViolation::AlreadyActive));
        }
        if core.stopped {
            return Err(violation(&**session, LifecycleViolation::StoppedBefore));
        }
        let Some(message_id) = core.message_id else {
            return Err(violation(&**session, LifecycleViolation::MessageIdMissing));
        };

        match self.index.entry(message_id) {
            Entry::Occupied(_) => {
                return Err(violation(&**session, LifecycleViolation::Occupied));
            }
            Entry::Vacant(slot) => {
                slot.insert(handle.clone());
            }
        }

        let timeout = self.timeout_for(&**session);
        let core = session.core_mut();
        core.active = true;
        core.idle = IdleTimer::default();
        let timer = core.idle.clone();

        info!(
            kind = %core.kind,
            message_id = %message_id,
            timeout_secs = timeout.as_secs(),
            "session activated"
        );

        tokio::spawn(self.clone().watch_idle(handle.clone(), timer, timeout));
        Ok(())
    }

    /// Active -> Stopped.
    ///
    /// # Errors
    ///
    /// `AlreadyStopped` or `NotActive`.
    pub fn deactivate(&self, session: &mut dyn Session) -> Result<(), LifecycleError> {
        ensure_active(session)?;

        let core = session.core_mut();
        if let Some(message_id) = core.message_id {
            self.index.remove(&message_id);
        }
        core.active = false;
        core.stopped = true;
        core.idle.cancel.cancel();

        info!(
            kind = %core.kind,
            message_id = ?core.message_id.map(|id| id.get()),
            "session deactivated"
        );
        Ok(())
    }

    /// Capture the session's snapshot and write it to the store, creating
    /// the record on first use.
    ///
    /// An empty snapshot is stored as the no-data sentinel.
    pub async fn persist(&self, session: &mut dyn Session) -> Result<(), SessionError> {
        let snapshot = session.capture()?;
        let Some(key) = session.core().key() else {
            return Err(violation(session, LifecycleViolation::MessageIdMissing).into());
        };
        let kind = session.kind();
        let timeout_secs = u32::try_from(self.timeout_for(session).as_secs()).unwrap_or(u32::MAX);

        let core = session.core_mut();
        match core.record.as_mut() {
            Some(record) => {
                record.set_data(snapshot);
                record.timeout_secs = timeout_secs;
                self.store.save(record).await?;
                debug!(%kind, record_id = %record.id, "saved session");
            }
            None => {
                let record = self.store.create(key, Some(snapshot), kind, timeout_secs).await?;
                debug!(%kind, record_id = %record.id, "stored new session");
                core.record = Some(record);
            }
        }
        Ok(())
    }

    /// Persist, then deactivate.
    ///
    /// The session leaves the active index only after its record is
    /// written. Interactions arriving meanwhile queue on the session lock,
    /// find it stopped and rehydrate from the fresh record. The session is
    /// deactivated even when the write fails; the write error is returned.
    pub async fn stop(&self, session: &mut dyn Session) -> Result<(), SessionError> {
        ensure_active(session)?;
        let stored = self.persist(session).await;
        self.deactivate(session)?;
        stored
    }

    /// Idle timer expiry: same as [`stop`](Self::stop).
    ///
    /// Losing the race against an explicit stop is expected and only logged.
    pub async fn on_idle_timeout(&self, handle: &SessionHandle) {
        let mut session = handle.lock().await;
        match self.stop(&mut **session).await {
            Ok(()) => info!(
                kind = %session.kind(),
                message_id = ?session.core().message_id().map(|id| id.get()),
                "session timed out and was stored"
            ),
            Err(err) if err.is_violation(LifecycleViolation::AlreadyStopped) => {
                warn!(error = %err, "idle timeout raced with stop");
            }
            Err(err) => error!(error = %err, "failed to store timed out session"),
        }
    }

    /// Stop every resident session so its state is stored. Returns how many
    /// were stored; failures are logged and skipped.
    pub async fn shutdown(&self) -> usize {
        let handles: Vec<SessionHandle> = self
            .index
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut stored = 0;
        for handle in handles {
            let mut session = handle.lock().await;
            if !session.core().active {
                continue;
            }
            match self.stop(&mut **session).await {
                Ok(()) => stored += 1,
                Err(err) => error!(kind = %session.kind(), error = %err, "failed to store session on shutdown"),
            }
        }
        info!(stored, "stored resident sessions");
        stored
    }

    /// Throw a session away: stop it without persisting, delete its record
    /// and its message.
    pub async fn discard(&self, session: &mut dyn Session) -> Result<(), SessionError> {
        if session.core().active {
            self.deactivate(session)?;
        }
        let key = session.core().key();

        match session.core_mut().record.as_mut() {
            Some(record) if !record.deleted => self.store.delete(record).await?,
            Some(_) => {}
            None => {
                if let Some(key) = key {
                    match self.store.delete_by_key(key).await {
                        Ok(()) | Err(StoreError::NotFound(_)) => {}
                        Err(err) => return Err(err.into()),
                    }
                }
            }
        }

        if let Some(key) = key {
            self.platform.delete_message(key).await?;
            info!(kind = %session.kind(), %key, "session discarded");
        }
        Ok(())
    }

    /// Push the session's current rendering to its message.
    pub async fn redraw(&self, session: &dyn Session) -> Result<(), SessionError> {
        let Some(key) = session.core().key() else {
            return Err(violation(session, LifecycleViolation::MessageIdMissing).into());
        };
        self.platform.edit_message(key, session.render()).await?;
        Ok(())
    }

    /// Bind a freshly sent view to its message and activate it.
    pub async fn launch<V: View>(
        &self,
        mut session: ViewSession<V>,
        message_id: MessageId,
    ) -> Result<SessionHandle, SessionError> {
        session.core.set_message_id(message_id);
        let handle = wrap(session);
        self.activate(&handle).await?;

        if V::PERSIST_ON_LAUNCH {
            let mut session = handle.lock().await;
            self.persist(&mut **session).await?;
        }
        Ok(handle)
    }

    /// Send a view as a new message in its channel, then launch it.
    pub async fn open<V: View>(&self, session: ViewSession<V>) -> Result<SessionHandle, SessionError> {
        let message_id = self
            .platform
            .send_message(session.core.guild_id(), session.core.channel_id(), session.render())
            .await?;
        self.launch(session, message_id).await
    }

    async fn watch_idle(self, handle: SessionHandle, timer: IdleTimer, timeout: Duration) {
        loop {
            tokio::select! {
                _ = timer.cancel.cancelled() => return,
                _ = timer.touch.notified() => continue,
                _ = sleep(timeout) => break,
            }
        }
        self.on_idle_timeout(&handle).await;
    }
}

/// `AlreadyStopped` or `NotActive` unless `session` is active.
fn ensure_active(session: &dyn Session) -> Result<(), LifecycleError> {
    let core = session.core();
    if core.stopped {
        return Err(violation(session, LifecycleViolation::AlreadyStopped));
    }
    if !core.active {
        return Err(violation(session, LifecycleViolation::NotActive));
    }
    Ok(())
}

/// Build a lifecycle error with the diagnostics of `session`.
fn violation(session: &dyn Session, violation: LifecycleViolation) -> LifecycleError {
    LifecycleError {
        violation,
        kind: session.kind(),
        record_id: session.core().record().map(|record| record.id),
        attributes: session.capture().unwrap_or_default(),
    }
}
