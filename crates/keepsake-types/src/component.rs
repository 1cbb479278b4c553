//! Neutral descriptors for the UI elements rendered on a message.
//!
//! A descriptor is what the platform reports for one element of a message:
//! every visible property, but no behavior. The engine never stores
//! descriptors in the session record -- the live message is the source of
//! truth for its own components and is fetched again on rehydration.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::ids::{RoleId, UserId};

/// Maximum number of action rows a message can carry.
pub const MAX_ROWS: usize = 5;

/// Discriminant of a component descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Button,
    StringSelect,
    UserSelect,
    RoleSelect,
    MentionableSelect,
    TextInput,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Button => write!(f, "button"),
            ComponentKind::StringSelect => write!(f, "string_select"),
            ComponentKind::UserSelect => write!(f, "user_select"),
            ComponentKind::RoleSelect => write!(f, "role_select"),
            ComponentKind::MentionableSelect => write!(f, "mentionable_select"),
            ComponentKind::TextInput => write!(f, "text_input"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    #[default]
    Primary,
    Secondary,
    Success,
    Danger,
    Link,
    Premium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonDescriptor {
    pub style: ButtonStyle,
    pub label: Option<String>,
    pub emoji: Option<String>,
    pub custom_id: Option<String>,
    pub url: Option<String>,
    pub sku_id: Option<u64>,
    #[serde(default)]
    pub disabled: bool,
}

impl ButtonDescriptor {
    /// Interactive button with a custom id and a label.
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>, style: ButtonStyle) -> Self {
        Self {
            style,
            label: Some(label.into()),
            emoji: None,
            custom_id: Some(custom_id.into()),
            url: None,
            sku_id: None,
            disabled: false,
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// One choice of a string select menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    pub description: Option<String>,
    pub emoji: Option<String>,
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringSelectDescriptor {
    pub custom_id: String,
    pub placeholder: Option<String>,
    pub min_values: u8,
    pub max_values: u8,
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub disabled: bool,
}

/// Pre-selected entity of a user/role/mentionable select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum DefaultValue {
    User(UserId),
    Role(RoleId),
}

/// Shared field set of the entity selects (user, role, mentionable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySelectDescriptor {
    pub custom_id: String,
    pub placeholder: Option<String>,
    pub min_values: u8,
    pub max_values: u8,
    #[serde(default)]
    pub default_values: Vec<DefaultValue>,
    #[serde(default)]
    pub disabled: bool,
}

impl EntitySelectDescriptor {
    pub fn new(custom_id: impl Into<String>) -> Self {
        Self {
            custom_id: custom_id.into(),
            placeholder: None,
            min_values: 1,
            max_values: 1,
            default_values: Vec::new(),
            disabled: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextInputStyle {
    #[default]
    Short,
    Paragraph,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextInputDescriptor {
    pub custom_id: String,
    pub label: String,
    pub style: TextInputStyle,
    pub placeholder: Option<String>,
    pub value: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    pub min_length: Option<u16>,
    pub max_length: Option<u16>,
}

fn default_required() -> bool {
    true
}

/// Platform-neutral description of one rendered UI element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentDescriptor {
    Button(ButtonDescriptor),
    StringSelect(StringSelectDescriptor),
    UserSelect(EntitySelectDescriptor),
    RoleSelect(EntitySelectDescriptor),
    MentionableSelect(EntitySelectDescriptor),
    TextInput(TextInputDescriptor),
    /// An element of a kind this engine does not model (raw platform code).
    Unsupported { kind: u8, custom_id: Option<String> },
}

impl ComponentDescriptor {
    /// The custom id that routes interactions to a handler, if any.
    ///
    /// Link and premium buttons have none.
    pub fn custom_id(&self) -> Option<&str> {
        match self {
            ComponentDescriptor::Button(b) => b.custom_id.as_deref(),
            ComponentDescriptor::StringSelect(s) => Some(&s.custom_id),
            ComponentDescriptor::UserSelect(s)
            | ComponentDescriptor::RoleSelect(s)
            | ComponentDescriptor::MentionableSelect(s) => Some(&s.custom_id),
            ComponentDescriptor::TextInput(t) => Some(&t.custom_id),
            ComponentDescriptor::Unsupported { custom_id, .. } => custom_id.as_deref(),
        }
    }

    /// Kind of a supported descriptor, `None` for `Unsupported`.
    pub fn kind(&self) -> Option<ComponentKind> {
        match self {
            ComponentDescriptor::Button(_) => Some(ComponentKind::Button),
            ComponentDescriptor::StringSelect(_) => Some(ComponentKind::StringSelect),
            ComponentDescriptor::UserSelect(_) => Some(ComponentKind::UserSelect),
            ComponentDescriptor::RoleSelect(_) => Some(ComponentKind::RoleSelect),
            ComponentDescriptor::MentionableSelect(_) => Some(ComponentKind::MentionableSelect),
            ComponentDescriptor::TextInput(_) => Some(ComponentKind::TextInput),
            ComponentDescriptor::Unsupported { .. } => None,
        }
    }
}

/// A message as the platform currently renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LiveMessage {
    pub content: Option<String>,
    /// Action rows, top to bottom.
    pub rows: Vec<Vec<ComponentDescriptor>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_json_is_tagged() {
        let button = ComponentDescriptor::Button(ButtonDescriptor::new(
            "lvls.conf.save",
            "Save",
            ButtonStyle::Success,
        ));
        let json = serde_json::to_value(&button).unwrap();
        assert_eq!(json["type"], "button");
        assert_eq!(json["custom_id"], "lvls.conf.save");
        assert_eq!(json["style"], "success");
    }

    #[test]
    fn test_text_input_required_defaults_to_true() {
        let json = r#"{"type":"text_input","custom_id":"t","label":"Name","style":"short","placeholder":null,"value":null,"min_length":null,"max_length":null}"#;
        let parsed: ComponentDescriptor = serde_json::from_str(json).unwrap();
        match parsed {
            ComponentDescriptor::TextInput(t) => assert!(t.required),
            other => panic!("unexpected descriptor: {other:?}"),
        }
    }

    #[test]
    fn test_link_button_has_no_custom_id() {
        let link = ComponentDescriptor::Button(ButtonDescriptor {
            style: ButtonStyle::Link,
            label: Some("Docs".into()),
            emoji: None,
            custom_id: None,
            url: Some("https://example.com".into()),
            sku_id: None,
            disabled: false,
        });
        assert!(link.custom_id().is_none());
        assert_eq!(link.kind(), Some(ComponentKind::Button));
    }

    #[test]
    fn test_unsupported_has_no_kind() {
        let other = ComponentDescriptor::Unsupported {
            kind: 8,
            custom_id: Some("chan".into()),
        };
        assert_eq!(other.kind(), None);
        assert_eq!(other.custom_id(), Some("chan"));
    }
}
