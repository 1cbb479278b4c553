//! Type-tag factory: the closed set of views a stored record can rebuild.

use keepsake_types::component::LiveMessage;
use keepsake_types::record::SessionRecord;
use keepsake_types::session::SessionKind;

use super::{Session, SessionError, ViewSession};
use crate::views::leveling::LevelingConfigView;
use crate::views::role_priority::RolePriorityView;

/// Rebuild the session a record describes, bound to the live message.
pub fn rehydrate(record: &SessionRecord, live: &LiveMessage) -> Result<Box<dyn Session>, SessionError> {
    let session: Box<dyn Session> = match record.kind {
        SessionKind::LevelingConfig => {
            Box::new(ViewSession::<LevelingConfigView>::rehydrate(record, live)?)
        }
        SessionKind::RolePriority => Box::new(ViewSession::<RolePriorityView>::rehydrate(record, live)?),
    };
    Ok(session)
}

#[cfg(test)]
mod tests {
    use keepsake_types::ids::{ChannelId, GuildId, MessageId, MessageKey};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_every_kind_rebuilds_its_own_view() {
        let key = MessageKey::new(GuildId(1), ChannelId(2), MessageId(3));
        for kind in SessionKind::ALL {
            let record = SessionRecord::new(key, None, kind, 60);
            let session = rehydrate(&record, &LiveMessage::default()).unwrap();
            assert_eq!(session.kind(), kind);
            assert_eq!(session.core().key(), Some(key));
            assert_eq!(session.core().record().map(|r| r.id), Some(record.id));
        }
    }

    #[test]
    fn test_restores_stored_attributes() {
        let key = MessageKey::new(GuildId(1), ChannelId(2), MessageId(3));
        let data = [("RolePriorityView.page".to_string(), json!(4))].into_iter().collect();
        let record = SessionRecord::new(key, Some(data), SessionKind::RolePriority, 60);

        let session = rehydrate(&record, &LiveMessage::default()).unwrap();
        assert_eq!(session.capture().unwrap().get("RolePriorityView.page"), Some(&json!(4)));
    }

    #[test]
    fn test_foreign_attribute_is_rejected() {
        let key = MessageKey::new(GuildId(1), ChannelId(2), MessageId(3));
        let data = [("LevelingConfigView.multiplier".to_string(), json!(2.0))]
            .into_iter()
            .collect();
        let record = SessionRecord::new(key, Some(data), SessionKind::RolePriority, 60);

        let err = rehydrate(&record, &LiveMessage::default()).err().unwrap();
        assert!(matches!(err, SessionError::Snapshot(_)));
    }
}
