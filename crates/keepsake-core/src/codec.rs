//! Component codec.
//!
//! Translates between the neutral [`ComponentDescriptor`] the platform
//! reports and a [`LiveComponent`]: the same element bound to a behavior
//! handle and placed on an action row. Every visible field is carried
//! verbatim; the handle is supplied by the caller and never serialized.

use std::fmt;

use keepsake_types::component::{
    ButtonDescriptor, ComponentDescriptor, ComponentKind, EntitySelectDescriptor, MAX_ROWS,
    StringSelectDescriptor, TextInputDescriptor,
};
use keepsake_types::error::ComponentError;

/// A supported UI element with all of its rendered properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Button(ButtonDescriptor),
    StringSelect(StringSelectDescriptor),
    UserSelect(EntitySelectDescriptor),
    RoleSelect(EntitySelectDescriptor),
    MentionableSelect(EntitySelectDescriptor),
    TextInput(TextInputDescriptor),
}

impl Element {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Element::Button(_) => ComponentKind::Button,
            Element::StringSelect(_) => ComponentKind::StringSelect,
            Element::UserSelect(_) => ComponentKind::UserSelect,
            Element::RoleSelect(_) => ComponentKind::RoleSelect,
            Element::MentionableSelect(_) => ComponentKind::MentionableSelect,
            Element::TextInput(_) => ComponentKind::TextInput,
        }
    }

    pub fn custom_id(&self) -> Option<&str> {
        match self {
            Element::Button(b) => b.custom_id.as_deref(),
            Element::StringSelect(s) => Some(&s.custom_id),
            Element::UserSelect(s) | Element::RoleSelect(s) | Element::MentionableSelect(s) => {
                Some(&s.custom_id)
            }
            Element::TextInput(t) => Some(&t.custom_id),
        }
    }

    /// Grey the element out. Text inputs cannot be disabled.
    pub fn set_disabled(&mut self, disabled: bool) {
        match self {
            Element::Button(b) => b.disabled = disabled,
            Element::StringSelect(s) => s.disabled = disabled,
            Element::UserSelect(s) | Element::RoleSelect(s) | Element::MentionableSelect(s) => {
                s.disabled = disabled
            }
            Element::TextInput(_) => {}
        }
    }
}

/// A UI element attached to a session, with its resolved handler.
///
/// Link buttons carry no custom id and therefore no handler.
#[derive(Clone)]
pub struct LiveComponent<H> {
    element: Element,
    row: usize,
    handler: Option<H>,
}

impl<H> LiveComponent<H> {
    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut Element {
        &mut self.element
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn handler(&self) -> Option<&H> {
        self.handler.as_ref()
    }

    pub fn custom_id(&self) -> Option<&str> {
        self.element.custom_id()
    }

    pub fn kind(&self) -> ComponentKind {
        self.element.kind()
    }
}

impl<H> fmt::Debug for LiveComponent<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveComponent")
            .field("element", &self.element)
            .field("row", &self.row)
            .field("bound", &self.handler.is_some())
            .finish()
    }
}

/// Neutral descriptor of a live element, handler dropped.
pub fn encode<H>(component: &LiveComponent<H>) -> ComponentDescriptor {
    match &component.element {
        Element::Button(b) => ComponentDescriptor::Button(b.clone()),
        Element::StringSelect(s) => ComponentDescriptor::StringSelect(s.clone()),
        Element::UserSelect(s) => ComponentDescriptor::UserSelect(s.clone()),
        Element::RoleSelect(s) => ComponentDescriptor::RoleSelect(s.clone()),
        Element::MentionableSelect(s) => ComponentDescriptor::MentionableSelect(s.clone()),
        Element::TextInput(t) => ComponentDescriptor::TextInput(t.clone()),
    }
}

/// Rebuild a live element from its descriptor, a resolved handler and the
/// action row it sits on.
///
/// # Errors
///
/// `Unsupported` for element kinds this engine does not model, and
/// `RowOutOfRange` when `row` exceeds the platform's row limit. Both are
/// fatal for this element only.
pub fn decode<H>(
    descriptor: ComponentDescriptor,
    handler: Option<H>,
    row: usize,
) -> Result<LiveComponent<H>, ComponentError> {
    let element = match descriptor {
        ComponentDescriptor::Button(b) => Element::Button(b),
        ComponentDescriptor::StringSelect(s) => Element::StringSelect(s),
        ComponentDescriptor::UserSelect(s) => Element::UserSelect(s),
        ComponentDescriptor::RoleSelect(s) => Element::RoleSelect(s),
        ComponentDescriptor::MentionableSelect(s) => Element::MentionableSelect(s),
        ComponentDescriptor::TextInput(t) => Element::TextInput(t),
        ComponentDescriptor::Unsupported { kind, custom_id } => {
            return Err(ComponentError::Unsupported { kind, custom_id });
        }
    };

    if row >= MAX_ROWS {
        return Err(ComponentError::RowOutOfRange {
            kind: element.kind(),
            row,
        });
    }

    Ok(LiveComponent {
        element,
        row,
        handler,
    })
}

/// Group live components back into the action rows the platform renders.
pub fn encode_rows<H>(components: &[LiveComponent<H>]) -> Vec<Vec<ComponentDescriptor>> {
    let row_count = components.iter().map(|c| c.row + 1).max().unwrap_or(0);
    let mut rows: Vec<Vec<ComponentDescriptor>> = vec![Vec::new(); row_count];
    for component in components {
        rows[component.row].push(encode(component));
    }
    rows.retain(|row| !row.is_empty());
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsake_types::component::{
        ButtonStyle, DefaultValue, SelectOption, TextInputStyle,
    };
    use keepsake_types::ids::{RoleId, UserId};

    type Handler = fn() -> &'static str;

    fn handler() -> &'static str {
        "bound"
    }

    fn entity_select(custom_id: &str) -> EntitySelectDescriptor {
        EntitySelectDescriptor {
            custom_id: custom_id.to_string(),
            placeholder: Some("Pick".into()),
            min_values: 0,
            max_values: 3,
            default_values: vec![DefaultValue::Role(RoleId(11)), DefaultValue::User(UserId(12))],
            disabled: true,
        }
    }

    fn every_kind() -> Vec<ComponentDescriptor> {
        vec![
            ComponentDescriptor::Button(ButtonDescriptor {
                style: ButtonStyle::Danger,
                label: Some("Discard".into()),
                emoji: Some("🗑".into()),
                custom_id: Some("lvls.conf.disc".into()),
                url: None,
                sku_id: None,
                disabled: false,
            }),
            ComponentDescriptor::Button(ButtonDescriptor {
                style: ButtonStyle::Link,
                label: Some("Docs".into()),
                emoji: None,
                custom_id: None,
                url: Some("https://example.com/docs".into()),
                sku_id: None,
                disabled: false,
            }),
            ComponentDescriptor::StringSelect(StringSelectDescriptor {
                custom_id: "lvls.conf.mult".into(),
                placeholder: None,
                min_values: 1,
                max_values: 1,
                options: vec![SelectOption {
                    label: "Double".into(),
                    value: "2".into(),
                    description: Some("x2".into()),
                    emoji: None,
                    default: true,
                }],
                disabled: false,
            }),
            ComponentDescriptor::UserSelect(entity_select("u")),
            ComponentDescriptor::RoleSelect(entity_select("r")),
            ComponentDescriptor::MentionableSelect(entity_select("m")),
            ComponentDescriptor::TextInput(TextInputDescriptor {
                custom_id: "lvls.conf.limits".into(),
                label: "Limits".into(),
                style: TextInputStyle::Paragraph,
                placeholder: Some("min,max".into()),
                value: Some("5,50".into()),
                required: false,
                min_length: Some(3),
                max_length: Some(20),
            }),
        ]
    }

    #[test]
    fn test_encode_decode_encode_is_idempotent() {
        for descriptor in every_kind() {
            let live = decode::<Handler>(descriptor.clone(), Some(handler), 2).unwrap();
            let first = encode(&live);
            assert_eq!(first, descriptor);

            let again = decode::<Handler>(first.clone(), Some(handler), 2).unwrap();
            assert_eq!(encode(&again), first);
            assert_eq!(again.row(), 2);
        }
    }

    #[test]
    fn test_decode_keeps_handler_out_of_descriptor() {
        let descriptor = every_kind().remove(0);
        let live = decode::<Handler>(descriptor, Some(handler), 0).unwrap();
        assert_eq!((live.handler().unwrap())(), "bound");
        assert_eq!(live.custom_id(), Some("lvls.conf.disc"));
        assert_eq!(live.kind(), ComponentKind::Button);
    }

    #[test]
    fn test_decode_unsupported_kind() {
        let err = decode::<Handler>(
            ComponentDescriptor::Unsupported {
                kind: 8,
                custom_id: Some("channels".into()),
            },
            None,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, ComponentError::Unsupported { kind: 8, .. }));
    }

    #[test]
    fn test_unsupported_does_not_stop_siblings() {
        let mut descriptors = every_kind();
        descriptors.insert(
            1,
            ComponentDescriptor::Unsupported {
                kind: 8,
                custom_id: None,
            },
        );

        let decoded: Vec<_> = descriptors
            .into_iter()
            .filter_map(|d| decode::<Handler>(d, None, 0).ok())
            .collect();
        assert_eq!(decoded.len(), every_kind().len());
    }

    #[test]
    fn test_decode_rejects_row_past_limit() {
        let err = decode::<Handler>(every_kind().remove(0), None, MAX_ROWS).unwrap_err();
        assert!(matches!(err, ComponentError::RowOutOfRange { row: 5, .. }));
    }

    #[test]
    fn test_encode_rows_groups_by_row() {
        let kinds = every_kind();
        let components = vec![
            decode::<Handler>(kinds[0].clone(), None, 0).unwrap(),
            decode::<Handler>(kinds[2].clone(), None, 2).unwrap(),
            decode::<Handler>(kinds[1].clone(), None, 0).unwrap(),
        ];
        let rows = encode_rows(&components);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![kinds[0].clone(), kinds[1].clone()]);
        assert_eq!(rows[1], vec![kinds[2].clone()]);
    }
}
