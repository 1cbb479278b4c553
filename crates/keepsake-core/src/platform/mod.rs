//! Chat platform port.
//!
//! The engine talks to the chat platform through this narrow interface only:
//! read the components currently rendered on a message, send, edit and
//! delete messages, and answer interactions. The gateway connection itself
//! lives outside the engine.

pub mod box_platform;

use keepsake_types::error::PlatformError;
use keepsake_types::component::LiveMessage;
use keepsake_types::ids::{ChannelId, GuildId, MessageId, MessageKey};
use keepsake_types::interaction::{ComponentInteraction, Reply};

pub use box_platform::BoxPlatform;

/// Operations consumed from the hosting chat platform.
///
/// Uses RPITIT (native async fn in traits); see [`BoxPlatform`] for the
/// type-erased form the engine holds.
pub trait Platform: Send + Sync {
    /// Current rendering of a message, `None` if it no longer exists.
    fn fetch_message(
        &self,
        key: MessageKey,
    ) -> impl std::future::Future<Output = Result<Option<LiveMessage>, PlatformError>> + Send;

    /// Post a message and return the id the platform assigned.
    fn send_message(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        message: LiveMessage,
    ) -> impl std::future::Future<Output = Result<MessageId, PlatformError>> + Send;

    /// Replace a message's content and components.
    fn edit_message(
        &self,
        key: MessageKey,
        message: LiveMessage,
    ) -> impl std::future::Future<Output = Result<(), PlatformError>> + Send;

    fn delete_message(
        &self,
        key: MessageKey,
    ) -> impl std::future::Future<Output = Result<(), PlatformError>> + Send;

    /// Answer an interaction.
    fn reply(
        &self,
        interaction: &ComponentInteraction,
        reply: Reply,
    ) -> impl std::future::Future<Output = Result<(), PlatformError>> + Send;
}
