//! Events accepted by the console gateway, one JSON object per line.
//!
//! ```json
//! {"type":"post_main","guild_id":1,"channel_id":2}
//! {"type":"interaction","key":{"guild_id":1,"channel_id":2,"message_id":1},
//!  "user_id":7,"component":"button","custom_id":"lvls.main.conf"}
//! ```

use keepsake_types::ids::{ChannelId, GuildId};
use keepsake_types::interaction::ComponentInteraction;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// A user used a component on one of the bot's messages.
    Interaction(ComponentInteraction),
    /// Post the leveling module's main message to a channel.
    PostMain {
        guild_id: GuildId,
        channel_id: ChannelId,
    },
}

impl GatewayEvent {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsake_types::component::ComponentKind;
    use keepsake_types::ids::MessageId;

    #[test]
    fn test_parse_interaction() {
        let event = GatewayEvent::parse(
            r#"{"type":"interaction","key":{"guild_id":1,"channel_id":2,"message_id":3},"user_id":7,"component":"role_select","custom_id":"lvls.main.prio","values":["10","11"]}"#,
        )
        .unwrap();

        match event {
            GatewayEvent::Interaction(interaction) => {
                assert_eq!(interaction.key.message_id, MessageId(3));
                assert_eq!(interaction.component, ComponentKind::RoleSelect);
                assert_eq!(interaction.custom_id, "lvls.main.prio");
                assert_eq!(interaction.values, vec!["10", "11"]);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_interaction_values_default_to_empty() {
        let event = GatewayEvent::parse(
            r#"{"type":"interaction","key":{"guild_id":1,"channel_id":2,"message_id":3},"user_id":7,"component":"button","custom_id":"prio.next"}"#,
        )
        .unwrap();
        assert!(matches!(event, GatewayEvent::Interaction(i) if i.values.is_empty()));
    }

    #[test]
    fn test_parse_post_main() {
        let event = GatewayEvent::parse(r#"{"type":"post_main","guild_id":1,"channel_id":2}"#).unwrap();
        assert!(matches!(
            event,
            GatewayEvent::PostMain { guild_id: GuildId(1), channel_id: ChannelId(2) }
        ));
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(GatewayEvent::parse(r#"{"type":"typing"}"#).is_err());
        assert!(GatewayEvent::parse("not json").is_err());
    }
}
