//! Attribute snapshot engine.
//!
//! Each view type declares its persisted fields in a static [`FieldTable`]:
//! the view's own fields first, the shared `ViewCore` fields last. Capture
//! walks the table and writes every declared field under its qualified
//! name; restore maps each stored key back to the field that owns it.

use std::collections::BTreeMap;

use keepsake_types::error::SnapshotError;
use keepsake_types::snapshot::{AttributeSnapshot, QualifiedName};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{View, ViewSession};

type Getter<V> = Box<dyn Fn(&ViewSession<V>) -> serde_json::Result<Value> + Send + Sync>;
type Setter<V> = Box<dyn Fn(&mut ViewSession<V>, Value) -> serde_json::Result<()> + Send + Sync>;

/// One persisted field: its qualified name and how to read and write it.
pub struct Field<V> {
    name: QualifiedName,
    get: Getter<V>,
    set: Setter<V>,
}

impl<V: 'static> Field<V> {
    pub fn new<T>(
        name: QualifiedName,
        get: fn(&ViewSession<V>) -> &T,
        get_mut: fn(&mut ViewSession<V>) -> &mut T,
    ) -> Self
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        Self {
            name,
            get: Box::new(move |session| serde_json::to_value(get(session))),
            set: Box::new(move |session, value| {
                *get_mut(session) = serde_json::from_value(value)?;
                Ok(())
            }),
        }
    }

    pub fn name(&self) -> QualifiedName {
        self.name
    }
}

/// Ordered field declarations of one view type.
pub struct FieldTable<V> {
    fields: Vec<Field<V>>,
}

impl<V: View> FieldTable<V> {
    /// Table of the view's own `fields`, followed by the `ViewCore` fields.
    pub fn new(fields: Vec<Field<V>>) -> Self {
        let mut fields = fields;
        fields.extend(core_fields::<V>());
        Self { fields }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field<V>> {
        self.fields.iter()
    }

    pub fn names(&self) -> Vec<QualifiedName> {
        self.fields.iter().map(|field| field.name).collect()
    }

    fn find(&self, key: &str) -> Option<&Field<V>> {
        self.fields.iter().find(|field| field.name.key() == key)
    }
}

fn core_fields<V: View>() -> Vec<Field<V>> {
    vec![Field::new(
        QualifiedName::private("ViewCore", "invoker"),
        |session| &session.core.invoker,
        |session| &mut session.core.invoker,
    )]
}

/// Snapshot of the fields of `session` whose qualified name is in `declared`.
///
/// # Errors
///
/// `AttributeNameConflict` if two table entries produce the same key,
/// `AttributeType` if a value does not serialize.
pub fn capture<V: View>(
    session: &ViewSession<V>,
    declared: &[QualifiedName],
) -> Result<AttributeSnapshot, SnapshotError> {
    let mut out = BTreeMap::new();

    for field in V::fields().iter() {
        if !declared.contains(&field.name) {
            continue;
        }

        let key = field.name.key();
        if out.contains_key(&key) {
            return Err(SnapshotError::AttributeNameConflict {
                kind: V::KIND,
                name: key,
            });
        }

        let value = (field.get)(session).map_err(|e| SnapshotError::AttributeType {
            kind: V::KIND,
            name: key.clone(),
            reason: e.to_string(),
        })?;
        out.insert(key, value);
    }

    Ok(AttributeSnapshot(out))
}

/// Apply `snapshot` to `session`.
///
/// Values are applied to a staged copy which replaces `session` only when
/// every entry was applied; on error `session` is untouched.
///
/// # Errors
///
/// `AttributeNotFound` for a key no field of the view owns,
/// `AttributeType` for a value that does not fit its field.
pub fn restore<V: View>(
    session: &mut ViewSession<V>,
    snapshot: &AttributeSnapshot,
) -> Result<(), SnapshotError> {
    let table = V::fields();
    let mut staged = session.clone();

    for (key, value) in snapshot.iter() {
        let field = table.find(key).ok_or_else(|| SnapshotError::AttributeNotFound {
            kind: V::KIND,
            name: key.clone(),
        })?;

        (field.set)(&mut staged, value.clone()).map_err(|e| SnapshotError::AttributeType {
            kind: V::KIND,
            name: key.clone(),
            reason: e.to_string(),
        })?;
    }

    *session = staged;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use keepsake_types::ids::{ChannelId, GuildId, UserId};
    use keepsake_types::session::SessionKind;
    use serde_json::json;

    use super::*;
    use crate::session::ActionTable;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Sample {
        page: u32,
        label: Option<String>,
        invoker: Vec<u64>,
    }

    impl View for Sample {
        const KIND: SessionKind = SessionKind::RolePriority;

        fn fields() -> &'static FieldTable<Self> {
            static FIELDS: OnceLock<FieldTable<Sample>> = OnceLock::new();
            FIELDS.get_or_init(|| {
                FieldTable::new(vec![
                    Field::new(
                        QualifiedName::public("Sample", "page"),
                        |s| &s.view.page,
                        |s| &mut s.view.page,
                    ),
                    Field::new(
                        QualifiedName::public("Sample", "label"),
                        |s| &s.view.label,
                        |s| &mut s.view.label,
                    ),
                    // Same field name as the core's private field.
                    Field::new(
                        QualifiedName::public("Sample", "invoker"),
                        |s| &s.view.invoker,
                        |s| &mut s.view.invoker,
                    ),
                ])
            })
        }

        fn actions() -> &'static ActionTable<Self> {
            static ACTIONS: OnceLock<ActionTable<Sample>> = OnceLock::new();
            ACTIONS.get_or_init(|| ActionTable::new("sample"))
        }
    }

    #[derive(Debug, Clone, Default)]
    struct Clash {
        a: u8,
        b: u8,
    }

    impl View for Clash {
        const KIND: SessionKind = SessionKind::LevelingConfig;

        fn fields() -> &'static FieldTable<Self> {
            static FIELDS: OnceLock<FieldTable<Clash>> = OnceLock::new();
            FIELDS.get_or_init(|| {
                FieldTable::new(vec![
                    Field::new(QualifiedName::public("Clash", "x"), |s| &s.view.a, |s| &mut s.view.a),
                    Field::new(QualifiedName::public("Clash", "x"), |s| &s.view.b, |s| &mut s.view.b),
                ])
            })
        }

        fn actions() -> &'static ActionTable<Self> {
            static ACTIONS: OnceLock<ActionTable<Clash>> = OnceLock::new();
            ACTIONS.get_or_init(|| ActionTable::new("clash"))
        }
    }

    fn sample() -> ViewSession<Sample> {
        let mut session = ViewSession::new(
            GuildId(1),
            ChannelId(2),
            Sample {
                page: 3,
                label: Some("ranks".into()),
                invoker: vec![7, 8],
            },
        );
        session.core.set_invoker(UserId(99));
        session
    }

    #[test]
    fn test_capture_uses_qualified_names() {
        let session = sample();
        let snapshot = capture(&session, session.core.declared()).unwrap();

        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot.get("Sample.page"), Some(&json!(3)));
        assert_eq!(snapshot.get("Sample.label"), Some(&json!("ranks")));
        assert_eq!(snapshot.get("Sample.invoker"), Some(&json!([7, 8])));
        assert_eq!(snapshot.get("ViewCore.__invoker"), Some(&json!(99)));
    }

    #[test]
    fn test_capture_only_declared() {
        let mut session = sample();
        session.core.declare(&[QualifiedName::public("Sample", "page")]);
        let snapshot = capture(&session, session.core.declared()).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains("Sample.page"));
    }

    #[test]
    fn test_capture_empty_when_nothing_declared() {
        let mut session = sample();
        session.core.declare(&[]);
        assert!(capture(&session, session.core.declared()).unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_onto_fresh_instance() {
        let session = sample();
        let snapshot = capture(&session, session.core.declared()).unwrap();

        let mut fresh = ViewSession::new(GuildId(1), ChannelId(2), Sample::default());
        restore(&mut fresh, &snapshot).unwrap();

        assert_eq!(fresh.view, session.view);
        assert_eq!(fresh.core.invoker(), Some(UserId(99)));
        assert_eq!(capture(&fresh, fresh.core.declared()).unwrap(), snapshot);
    }

    #[test]
    fn test_duplicate_qualified_name_conflicts() {
        let session = ViewSession::new(GuildId(1), ChannelId(2), Clash::default());
        let err = capture(&session, session.core.declared()).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::AttributeNameConflict { ref name, .. } if name == "Clash.x"
        ));
    }

    #[test]
    fn test_restore_unknown_key() {
        let mut session = sample();
        let snapshot: AttributeSnapshot = [("Sample.ghost".to_string(), json!(1))].into_iter().collect();
        let err = restore(&mut session, &snapshot).unwrap_err();
        assert!(matches!(err, SnapshotError::AttributeNotFound { ref name, .. } if name == "Sample.ghost"));
    }

    #[test]
    fn test_restore_is_all_or_nothing() {
        let mut session = sample();
        // "Sample.label" sorts before "Sample.page", so it is applied first.
        let snapshot: AttributeSnapshot = [
            ("Sample.label".to_string(), json!("changed")),
            ("Sample.page".to_string(), json!("not a number")),
        ]
        .into_iter()
        .collect();

        let err = restore(&mut session, &snapshot).unwrap_err();
        assert!(matches!(err, SnapshotError::AttributeType { ref name, .. } if name == "Sample.page"));
        assert_eq!(session.view.label.as_deref(), Some("ranks"));
        assert_eq!(session.view.page, 3);
    }
}
