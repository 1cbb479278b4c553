//! Incoming component interactions and outgoing replies.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::component::ComponentKind;
use crate::ids::{MessageKey, UserId};

/// A user clicked a button, picked from a select, or submitted a text input
/// on a message the bot sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInteraction {
    /// Platform interaction id, used to route the reply.
    #[serde(default = "Uuid::now_v7")]
    pub id: Uuid,
    pub key: MessageKey,
    pub user_id: UserId,
    pub custom_id: String,
    /// Component kind the platform reported; selects the callback registry.
    pub component: ComponentKind,
    /// Selected values (selects) or submitted text (text inputs).
    #[serde(default)]
    pub values: Vec<String>,
}

impl ComponentInteraction {
    pub fn new(
        key: MessageKey,
        user_id: UserId,
        component: ComponentKind,
        custom_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            key,
            user_id,
            custom_id: custom_id.into(),
            component,
            values: Vec::new(),
        }
    }

    pub fn with_values(mut self, values: Vec<String>) -> Self {
        self.values = values;
        self
    }
}

/// Response sent back for an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub content: String,
    /// Only visible to the interacting user.
    pub ephemeral: bool,
}

impl Reply {
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}
