//! Leveling configuration form and the module that opens it.
//!
//! The form collects an experience multiplier, the minimum/maximum
//! experience per message and the reward roles. Save stays disabled until
//! every value is set; saving or discarding throws the form away.

use std::sync::{Arc, OnceLock};

use futures_util::future::BoxFuture;
use keepsake_types::component::{
    ButtonDescriptor, ButtonStyle, ComponentDescriptor, ComponentKind, EntitySelectDescriptor,
    LiveMessage, SelectOption, StringSelectDescriptor,
};
use keepsake_types::ids::{ChannelId, GuildId, RoleId, UserId};
use keepsake_types::interaction::{ComponentInteraction, Reply};
use keepsake_types::session::SessionKind;
use keepsake_types::snapshot::QualifiedName;
use tracing::info;

use super::role_priority::RolePriorityView;
use super::{ensure_invoker, mention_roles, parse_roles};
use crate::registry::{CallbackRegistries, CommandModule, ModuleHandler, RegistryError};
use crate::session::{Action, ActionTable, Field, FieldTable, SessionError, SessionManager, View, ViewSession};

pub const SAVE: &str = "lvls.conf.save";
pub const DISCARD: &str = "lvls.conf.disc";
pub const ROLES: &str = "lvls.conf.roles";
pub const MULTIPLIER: &str = "lvls.conf.mult";
pub const LIMITS: &str = "lvls.conf.limits";

pub const MAIN_CONFIGURE: &str = "lvls.main.conf";
pub const MAIN_PRIORITY: &str = "lvls.main.prio";

const MULTIPLIERS: [(&str, &str); 4] = [("1x", "1"), ("1.5x", "1.5"), ("2x", "2"), ("3x", "3")];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelingConfigView {
    pub multiplier: Option<f64>,
    pub minimum_threshold: Option<u32>,
    pub maximum_experience: Option<u32>,
    pub reward_roles: Vec<RoleId>,
}

impl LevelingConfigView {
    /// An empty form for `invoker`, with its controls attached.
    pub fn build(
        guild_id: GuildId,
        channel_id: ChannelId,
        invoker: UserId,
    ) -> Result<ViewSession<Self>, SessionError> {
        let mut session = ViewSession::new(guild_id, channel_id, LevelingConfigView::default());
        session.core.set_invoker(invoker);

        let mut roles = EntitySelectDescriptor::new(ROLES);
        roles.placeholder = Some("Reward roles".into());
        roles.min_values = 0;
        roles.max_values = 5;
        session.attach(0, ComponentDescriptor::RoleSelect(roles))?;

        session.attach(
            1,
            ComponentDescriptor::StringSelect(StringSelectDescriptor {
                custom_id: MULTIPLIER.to_string(),
                placeholder: Some("Experience multiplier".into()),
                min_values: 1,
                max_values: 1,
                options: MULTIPLIERS
                    .iter()
                    .map(|(label, value)| SelectOption {
                        label: (*label).to_string(),
                        value: (*value).to_string(),
                        description: None,
                        emoji: None,
                        default: false,
                    })
                    .collect(),
                disabled: false,
            }),
        )?;

        session.attach(
            2,
            ComponentDescriptor::Button(
                ButtonDescriptor::new(SAVE, "Save", ButtonStyle::Success).disabled(true),
            ),
        )?;
        session.attach(
            2,
            ComponentDescriptor::Button(ButtonDescriptor::new(DISCARD, "Discard", ButtonStyle::Danger)),
        )?;
        Ok(session)
    }

    /// Every value the save needs is set.
    pub fn is_complete(&self) -> bool {
        self.multiplier.is_some() && self.minimum_threshold.is_some() && self.maximum_experience.is_some()
    }

    fn summary(&self) -> String {
        fn show<T: std::fmt::Display>(value: Option<T>) -> String {
            value.map_or_else(|| "not set".to_string(), |v| v.to_string())
        }
        format!(
            "Multiplier: {}\nMinimum threshold: {}\nMaximum experience: {}\nReward roles: {}",
            self.multiplier.map_or_else(|| "not set".to_string(), |m| format!("{m}x")),
            show(self.minimum_threshold),
            show(self.maximum_experience),
            mention_roles(&self.reward_roles),
        )
    }
}

/// Parse `min,max` as submitted in the limits text input.
fn parse_limits(raw: &str) -> Option<(u32, u32)> {
    let (min, max) = raw.split_once(',')?;
    let min: u32 = min.trim().parse().ok()?;
    let max: u32 = max.trim().parse().ok()?;
    (min <= max).then_some((min, max))
}

impl View for LevelingConfigView {
    const KIND: SessionKind = SessionKind::LevelingConfig;

    fn fields() -> &'static FieldTable<Self> {
        static FIELDS: OnceLock<FieldTable<LevelingConfigView>> = OnceLock::new();
        FIELDS.get_or_init(|| {
            FieldTable::new(vec![
                Field::new(
                    QualifiedName::public("LevelingConfigView", "multiplier"),
                    |s| &s.view.multiplier,
                    |s| &mut s.view.multiplier,
                ),
                Field::new(
                    QualifiedName::public("LevelingConfigView", "minimum_threshold"),
                    |s| &s.view.minimum_threshold,
                    |s| &mut s.view.minimum_threshold,
                ),
                Field::new(
                    QualifiedName::public("LevelingConfigView", "maximum_experience"),
                    |s| &s.view.maximum_experience,
                    |s| &mut s.view.maximum_experience,
                ),
                Field::new(
                    QualifiedName::public("LevelingConfigView", "reward_roles"),
                    |s| &s.view.reward_roles,
                    |s| &mut s.view.reward_roles,
                ),
            ])
        })
    }

    fn actions() -> &'static ActionTable<Self> {
        static ACTIONS: OnceLock<ActionTable<LevelingConfigView>> = OnceLock::new();
        ACTIONS.get_or_init(|| {
            ActionTable::from_entries(
                "LevelingConfigView",
                [
                    (SAVE, on_save as Action<Self>),
                    (DISCARD, on_discard as Action<Self>),
                    (ROLES, on_roles as Action<Self>),
                    (MULTIPLIER, on_multiplier as Action<Self>),
                    (LIMITS, on_limits as Action<Self>),
                ],
            )
        })
    }

    fn content(session: &ViewSession<Self>) -> Option<String> {
        Some(format!(
            "Leveling configuration\n{}\nSubmit limits as `min,max`.",
            session.view.summary()
        ))
    }
}

/// Enable save once the form is complete and push the new state.
async fn refresh(
    session: &mut ViewSession<LevelingConfigView>,
    manager: &SessionManager,
) -> Result<(), SessionError> {
    let complete = session.view.is_complete();
    if let Some(save) = session.element_mut(SAVE) {
        save.set_disabled(!complete);
    }
    manager.redraw(&*session).await
}

fn on_roles<'a>(
    session: &'a mut ViewSession<LevelingConfigView>,
    interaction: &'a ComponentInteraction,
    manager: &'a SessionManager,
) -> BoxFuture<'a, Result<(), SessionError>> {
    Box::pin(async move {
        if !ensure_invoker(session, interaction, manager).await? {
            return Ok(());
        }
        session.view.reward_roles = parse_roles(&interaction.values)?;
        refresh(session, manager).await
    })
}

fn on_multiplier<'a>(
    session: &'a mut ViewSession<LevelingConfigView>,
    interaction: &'a ComponentInteraction,
    manager: &'a SessionManager,
) -> BoxFuture<'a, Result<(), SessionError>> {
    Box::pin(async move {
        if !ensure_invoker(session, interaction, manager).await? {
            return Ok(());
        }
        let Some(value) = interaction.values.first() else {
            return Ok(());
        };
        let multiplier = value
            .parse::<f64>()
            .map_err(|e| SessionError::Handler(format!("invalid multiplier '{value}': {e}")))?;
        session.view.multiplier = Some(multiplier);
        refresh(session, manager).await
    })
}

fn on_limits<'a>(
    session: &'a mut ViewSession<LevelingConfigView>,
    interaction: &'a ComponentInteraction,
    manager: &'a SessionManager,
) -> BoxFuture<'a, Result<(), SessionError>> {
    Box::pin(async move {
        if !ensure_invoker(session, interaction, manager).await? {
            return Ok(());
        }
        let raw = interaction.values.first().map(String::as_str).unwrap_or_default();
        let Some((min, max)) = parse_limits(raw) else {
            manager
                .platform()
                .reply(
                    interaction,
                    Reply::ephemeral("Limits must look like `min,max` with min not above max."),
                )
                .await?;
            return Ok(());
        };
        session.view.minimum_threshold = Some(min);
        session.view.maximum_experience = Some(max);
        refresh(session, manager).await
    })
}

fn on_save<'a>(
    session: &'a mut ViewSession<LevelingConfigView>,
    interaction: &'a ComponentInteraction,
    manager: &'a SessionManager,
) -> BoxFuture<'a, Result<(), SessionError>> {
    Box::pin(async move {
        if !ensure_invoker(session, interaction, manager).await? {
            return Ok(());
        }
        if !session.view.is_complete() {
            manager
                .platform()
                .reply(
                    interaction,
                    Reply::ephemeral("Set the multiplier and both limits first."),
                )
                .await?;
            return Ok(());
        }

        manager
            .platform()
            .reply(
                interaction,
                Reply::public(format!("Leveling configuration saved.\n{}", session.view.summary())),
            )
            .await?;
        info!(guild_id = %session.core.guild_id(), "leveling configuration saved");
        manager.discard(session).await
    })
}

fn on_discard<'a>(
    session: &'a mut ViewSession<LevelingConfigView>,
    interaction: &'a ComponentInteraction,
    manager: &'a SessionManager,
) -> BoxFuture<'a, Result<(), SessionError>> {
    Box::pin(async move {
        if !ensure_invoker(session, interaction, manager).await? {
            return Ok(());
        }
        manager.discard(session).await?;
        manager
            .platform()
            .reply(interaction, Reply::ephemeral("Configuration discarded."))
            .await?;
        Ok(())
    })
}

/// Stateless entry points on the leveling main message.
pub struct LevelingModule;

impl LevelingModule {
    /// The message carrying this module's entry points.
    pub fn main_message() -> LiveMessage {
        let mut roles = EntitySelectDescriptor::new(MAIN_PRIORITY);
        roles.placeholder = Some("Order reward roles".into());
        roles.max_values = 25;

        LiveMessage {
            content: Some("Leveling".into()),
            rows: vec![
                vec![ComponentDescriptor::Button(ButtonDescriptor::new(
                    MAIN_CONFIGURE,
                    "Configure",
                    ButtonStyle::Primary,
                ))],
                vec![ComponentDescriptor::RoleSelect(roles)],
            ],
        }
    }
}

fn open_config(
    interaction: ComponentInteraction,
    manager: SessionManager,
) -> BoxFuture<'static, Result<(), SessionError>> {
    Box::pin(async move {
        let session = LevelingConfigView::build(
            interaction.key.guild_id,
            interaction.key.channel_id,
            interaction.user_id,
        )?;
        manager.open(session).await?;
        manager
            .platform()
            .reply(&interaction, Reply::ephemeral("Opened the leveling configuration."))
            .await?;
        Ok(())
    })
}

fn open_priority(
    interaction: ComponentInteraction,
    manager: SessionManager,
) -> BoxFuture<'static, Result<(), SessionError>> {
    Box::pin(async move {
        let roles = parse_roles(&interaction.values)?;
        let session = RolePriorityView::build(
            interaction.key.guild_id,
            interaction.key.channel_id,
            interaction.user_id,
            roles,
        )?;
        manager.open(session).await?;
        manager
            .platform()
            .reply(&interaction, Reply::ephemeral("Opened the role priority wizard."))
            .await?;
        Ok(())
    })
}

impl CommandModule for LevelingModule {
    fn name(&self) -> &'static str {
        "leveling"
    }

    fn on_load(&self, registries: &CallbackRegistries) -> Result<(), RegistryError> {
        let configure: ModuleHandler = Arc::new(open_config);
        let priority: ModuleHandler = Arc::new(open_priority);
        registries
            .for_kind(ComponentKind::Button)
            .register(MAIN_CONFIGURE, configure)?;
        registries
            .for_kind(ComponentKind::RoleSelect)
            .register(MAIN_PRIORITY, priority)?;
        Ok(())
    }

    fn on_unload(&self, registries: &CallbackRegistries) -> Result<(), RegistryError> {
        registries.for_kind(ComponentKind::Button).unregister(MAIN_CONFIGURE)?;
        registries.for_kind(ComponentKind::RoleSelect).unregister(MAIN_PRIORITY)?;
        Ok(())
    }
}
