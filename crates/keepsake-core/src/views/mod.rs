//! Built-in views and the command module that opens them.

pub mod leveling;
pub mod role_priority;

use keepsake_types::ids::RoleId;
use keepsake_types::interaction::{ComponentInteraction, Reply};

use crate::session::{SessionError, SessionManager, View, ViewSession};

/// Only the user who opened a view may drive it. Tells anyone else off and
/// returns `false`.
async fn ensure_invoker<V: View>(
    session: &ViewSession<V>,
    interaction: &ComponentInteraction,
    manager: &SessionManager,
) -> Result<bool, SessionError> {
    match session.core.invoker() {
        Some(invoker) if invoker != interaction.user_id => {
            manager
                .platform()
                .reply(
                    interaction,
                    Reply::ephemeral(format!("Only <@{invoker}> can use these controls.")),
                )
                .await?;
            Ok(false)
        }
        _ => Ok(true),
    }
}

/// Role ids picked in a role select.
fn parse_roles(values: &[String]) -> Result<Vec<RoleId>, SessionError> {
    values
        .iter()
        .map(|value| {
            value
                .parse::<RoleId>()
                .map_err(|e| SessionError::Handler(format!("invalid role id '{value}': {e}")))
        })
        .collect()
}

fn mention_roles(roles: &[RoleId]) -> String {
    if roles.is_empty() {
        return "none".to_string();
    }
    roles
        .iter()
        .map(|role| format!("<@&{role}>"))
        .collect::<Vec<_>>()
        .join(", ")
}
