//! Console gateway: a `Platform` that renders to stdout.
//!
//! Every outgoing message, edit, deletion and reply is printed as one JSON
//! line. Rendered messages are kept in memory and, when a state file is
//! given, written back after every change so widgets posted before a restart
//! can still be fetched and rehydrated afterwards.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use keepsake_core::platform::Platform;
use keepsake_types::component::LiveMessage;
use keepsake_types::error::PlatformError;
use keepsake_types::ids::{ChannelId, GuildId, MessageId, MessageKey};
use keepsake_types::interaction::{ComponentInteraction, Reply};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// One line of console output.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConsoleEvent<'a> {
    MessageSent {
        key: MessageKey,
        message: &'a LiveMessage,
    },
    MessageEdited {
        key: MessageKey,
        message: &'a LiveMessage,
    },
    MessageDeleted {
        key: MessageKey,
    },
    Reply {
        interaction_id: String,
        key: MessageKey,
        reply: &'a Reply,
    },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredState {
    next_id: u64,
    messages: Vec<StoredMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredMessage {
    key: MessageKey,
    message: LiveMessage,
}

pub struct ConsolePlatform {
    state_path: Option<PathBuf>,
    messages: DashMap<MessageKey, LiveMessage>,
    next_id: AtomicU64,
    flush_lock: Mutex<()>,
}

impl ConsolePlatform {
    /// A platform whose messages vanish with the process.
    pub fn in_memory() -> Self {
        Self {
            state_path: None,
            messages: DashMap::new(),
            next_id: AtomicU64::new(1),
            flush_lock: Mutex::new(()),
        }
    }

    /// A platform backed by `path`, loading messages left by an earlier run.
    pub async fn open(path: PathBuf) -> Result<Self, PlatformError> {
        let state = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str::<StoredState>(&content).map_err(|e| {
                PlatformError::Request(format!("invalid console state {}: {e}", path.display()))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No console state at {}, starting empty", path.display());
                StoredState::default()
            }
            Err(err) => {
                return Err(PlatformError::Request(format!(
                    "failed to read {}: {err}",
                    path.display()
                )));
            }
        };

        let messages: DashMap<MessageKey, LiveMessage> = state
            .messages
            .into_iter()
            .map(|stored| (stored.key, stored.message))
            .collect();
        tracing::info!(count = messages.len(), path = %path.display(), "loaded console messages");

        Ok(Self {
            state_path: Some(path),
            messages,
            next_id: AtomicU64::new(state.next_id.max(1)),
            flush_lock: Mutex::new(()),
        })
    }

    /// Current rendering of a message.
    pub fn message(&self, key: MessageKey) -> Option<LiveMessage> {
        self.messages.get(&key).map(|m| m.clone())
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    fn emit(&self, event: &ConsoleEvent<'_>) -> Result<(), PlatformError> {
        let line = serde_json::to_string(event)
            .map_err(|e| PlatformError::Request(format!("failed to encode event: {e}")))?;
        println!("{line}");
        Ok(())
    }

    /// Write the message table to the state file, if any.
    async fn flush(&self) -> Result<(), PlatformError> {
        let Some(path) = &self.state_path else {
            return Ok(());
        };
        let _guard = self.flush_lock.lock().await;

        let state = StoredState {
            next_id: self.next_id.load(Ordering::SeqCst),
            messages: self
                .messages
                .iter()
                .map(|entry| StoredMessage {
                    key: *entry.key(),
                    message: entry.value().clone(),
                })
                .collect(),
        };
        let content = serde_json::to_string_pretty(&state)
            .map_err(|e| PlatformError::Request(format!("failed to encode console state: {e}")))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| PlatformError::Request(format!("failed to write {}: {e}", path.display())))
    }
}

impl Platform for ConsolePlatform {
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
        self.emit(&ConsoleEvent::MessageSent {
            key,
            message: &message,
        })?;
        self.messages.insert(key, message);
        self.flush().await?;
        Ok(message_id)
    }

    async fn edit_message(&self, key: MessageKey, message: LiveMessage) -> Result<(), PlatformError> {
        {
            let Some(mut current) = self.messages.get_mut(&key) else {
                return Err(PlatformError::MessageNotFound(key));
            };
            self.emit(&ConsoleEvent::MessageEdited {
                key,
                message: &message,
            })?;
            *current = message;
        }
        self.flush().await
    }

    async fn delete_message(&self, key: MessageKey) -> Result<(), PlatformError> {
        if self.messages.remove(&key).is_none() {
            return Err(PlatformError::MessageNotFound(key));
        }
        self.emit(&ConsoleEvent::MessageDeleted { key })?;
        self.flush().await
    }

    async fn reply(&self, interaction: &ComponentInteraction, reply: Reply) -> Result<(), PlatformError> {
        self.emit(&ConsoleEvent::Reply {
            interaction_id: interaction.id.to_string(),
            key: interaction.key,
            reply: &reply,
        })
    }
}
