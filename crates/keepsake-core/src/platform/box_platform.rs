//! BoxPlatform -- object-safe dynamic dispatch wrapper for Platform.
//!
//! Same blanket-impl pattern as `BoxSessionStore`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use keepsake_types::component::LiveMessage;
use keepsake_types::error::PlatformError;
use keepsake_types::ids::{ChannelId, GuildId, MessageId, MessageKey};
use keepsake_types::interaction::{ComponentInteraction, Reply};

use super::Platform;

type BoxedFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PlatformError>> + Send + 'a>>;

/// Object-safe version of [`Platform`] with boxed futures.
pub trait PlatformDyn: Send + Sync {
    fn fetch_message_boxed(&self, key: MessageKey) -> BoxedFuture<'_, Option<LiveMessage>>;

    fn send_message_boxed(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        message: LiveMessage,
    ) -> BoxedFuture<'_, MessageId>;

    fn edit_message_boxed(&self, key: MessageKey, message: LiveMessage) -> BoxedFuture<'_, ()>;

    fn delete_message_boxed(&self, key: MessageKey) -> BoxedFuture<'_, ()>;

    fn reply_boxed<'a>(
        &'a self,
        interaction: &'a ComponentInteraction,
        reply: Reply,
    ) -> BoxedFuture<'a, ()>;
}

impl<T: Platform> PlatformDyn for T {
    fn fetch_message_boxed(&self, key: MessageKey) -> BoxedFuture<'_, Option<LiveMessage>> {
        Box::pin(self.fetch_message(key))
    }

    fn send_message_boxed(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        message: LiveMessage,
    ) -> BoxedFuture<'_, MessageId> {
        Box::pin(self.send_message(guild_id, channel_id, message))
    }

    fn edit_message_boxed(&self, key: MessageKey, message: LiveMessage) -> BoxedFuture<'_, ()> {
        Box::pin(self.edit_message(key, message))
    }

    fn delete_message_boxed(&self, key: MessageKey) -> BoxedFuture<'_, ()> {
        Box::pin(self.delete_message(key))
    }

    fn reply_boxed<'a>(
        &'a self,
        interaction: &'a ComponentInteraction,
        reply: Reply,
    ) -> BoxedFuture<'a, ()> {
        Box::pin(self.reply(interaction, reply))
    }
}

/// Type-erased platform handle, cheap to clone.
#[derive(Clone)]
pub struct BoxPlatform {
    inner: Arc<dyn PlatformDyn>,
}

impl BoxPlatform {
    pub fn new<T: Platform + 'static>(platform: T) -> Self {
        Self {
            inner: Arc::new(platform),
        }
    }

    /// Wrap a platform that is shared with other owners (e.g. a test
    /// inspecting what was sent).
    pub fn from_arc<T: Platform + 'static>(platform: Arc<T>) -> Self {
        Self { inner: platform }
    }

    pub async fn fetch_message(&self, key: MessageKey) -> Result<Option<LiveMessage>, PlatformError> {
        self.inner.fetch_message_boxed(key).await
    }

    pub async fn send_message(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        message: LiveMessage,
    ) -> Result<MessageId, PlatformError> {
        self.inner.send_message_boxed(guild_id, channel_id, message).await
    }

    pub async fn edit_message(&self, key: MessageKey, message: LiveMessage) -> Result<(), PlatformError> {
        self.inner.edit_message_boxed(key, message).await
    }

    pub async fn delete_message(&self, key: MessageKey) -> Result<(), PlatformError> {
        self.inner.delete_message_boxed(key).await
    }

    pub async fn reply(
        &self,
        interaction: &ComponentInteraction,
        reply: Reply,
    ) -> Result<(), PlatformError> {
        self.inner.reply_boxed(interaction, reply).await
    }
}
