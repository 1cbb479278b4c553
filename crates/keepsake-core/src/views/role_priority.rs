//! Paged wizard for ordering reward roles by priority.
//!
//! Shows five roles per page; picking a role in the select moves it one
//! place up. Stored eagerly on launch so the wizard survives a restart even
//! before its first idle timeout.

use std::sync::OnceLock;

use futures_util::future::BoxFuture;
use keepsake_types::component::{
    ButtonDescriptor, ButtonStyle, ComponentDescriptor, SelectOption, StringSelectDescriptor,
};
use keepsake_types::ids::{ChannelId, GuildId, RoleId, UserId};
use keepsake_types::interaction::{ComponentInteraction, Reply};
use keepsake_types::session::SessionKind;
use keepsake_types::snapshot::QualifiedName;

use super::{ensure_invoker, mention_roles};
use crate::codec::Element;
use crate::session::{Action, ActionTable, Field, FieldTable, SessionError, SessionManager, View, ViewSession};

pub const RAISE: &str = "prio.raise";
pub const PREV: &str = "prio.prev";
pub const NEXT: &str = "prio.next";
pub const DONE: &str = "prio.done";

const PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePriorityView {
    /// Zero-based page currently shown.
    pub page: u32,
    /// Roles, highest priority first.
    pub order: Vec<RoleId>,
}

impl RolePriorityView {
    /// A wizard over `roles` for `invoker`, with its controls attached.
    pub fn build(
        guild_id: GuildId,
        channel_id: ChannelId,
        invoker: UserId,
        roles: Vec<RoleId>,
    ) -> Result<ViewSession<Self>, SessionError> {
        let mut session = ViewSession::new(
            guild_id,
            channel_id,
            RolePriorityView {
                page: 0,
                order: roles,
            },
        );
        session.core.set_invoker(invoker);

        session.attach(
            0,
            ComponentDescriptor::StringSelect(StringSelectDescriptor {
                custom_id: RAISE.to_string(),
                placeholder: Some("Move a role up".into()),
                min_values: 1,
                max_values: 1,
                options: Vec::new(),
                disabled: false,
            }),
        )?;
        session.attach(
            1,
            ComponentDescriptor::Button(ButtonDescriptor::new(PREV, "Previous", ButtonStyle::Secondary)),
        )?;
        session.attach(
            1,
            ComponentDescriptor::Button(ButtonDescriptor::new(NEXT, "Next", ButtonStyle::Secondary)),
        )?;
        session.attach(
            1,
            ComponentDescriptor::Button(ButtonDescriptor::new(DONE, "Done", ButtonStyle::Success)),
        )?;
        refresh(&mut session);
        Ok(session)
    }

    pub fn page_count(&self) -> u32 {
        let pages = self.order.len().div_ceil(PAGE_SIZE).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// The page shown, clamped to the last one. A restored snapshot may
    /// carry any page number.
    pub fn current_page(&self) -> u32 {
        self.page.min(self.page_count() - 1)
    }

    /// Roles on the current page with their overall position.
    fn visible(&self) -> impl Iterator<Item = (usize, RoleId)> + '_ {
        let start = (self.current_page() as usize).saturating_mul(PAGE_SIZE);
        self.order
            .iter()
            .copied()
            .enumerate()
            .skip(start)
            .take(PAGE_SIZE)
    }

    /// Move `role` one place up. Returns `false` if it is unknown or first.
    fn raise(&mut self, role: RoleId) -> bool {
        match self.order.iter().position(|r| *r == role) {
            Some(index) if index > 0 => {
                self.order.swap(index - 1, index);
                true
            }
            _ => false,
        }
    }
}

impl View for RolePriorityView {
    const KIND: SessionKind = SessionKind::RolePriority;
    const PERSIST_ON_LAUNCH: bool = true;

    fn fields() -> &'static FieldTable<Self> {
        static FIELDS: OnceLock<FieldTable<RolePriorityView>> = OnceLock::new();
        FIELDS.get_or_init(|| {
            FieldTable::new(vec![
                Field::new(
                    QualifiedName::public("RolePriorityView", "page"),
                    |s| &s.view.page,
                    |s| &mut s.view.page,
                ),
                Field::new(
                    QualifiedName::public("RolePriorityView", "order"),
                    |s| &s.view.order,
                    |s| &mut s.view.order,
                ),
            ])
        })
    }

    fn actions() -> &'static ActionTable<Self> {
        static ACTIONS: OnceLock<ActionTable<RolePriorityView>> = OnceLock::new();
        ACTIONS.get_or_init(|| {
            ActionTable::from_entries(
                "RolePriorityView",
                [
                    (RAISE, on_raise as Action<Self>),
                    (PREV, on_prev as Action<Self>),
                    (NEXT, on_next as Action<Self>),
                    (DONE, on_done as Action<Self>),
                ],
            )
        })
    }

    fn content(session: &ViewSession<Self>) -> Option<String> {
        let view = &session.view;
        let mut lines = vec![format!(
            "Role priority (page {}/{})",
            view.current_page().saturating_add(1),
            view.page_count()
        )];
        lines.extend(
            view.visible()
                .map(|(index, role)| format!("{}. <@&{role}>", index + 1)),
        );
        Some(lines.join("\n"))
    }
}

/// Sync the controls with the current page.
fn refresh(session: &mut ViewSession<RolePriorityView>) {
    let page = session.view.current_page();
    let pages = session.view.page_count();
    let options: Vec<SelectOption> = session
        .view
        .visible()
        .map(|(index, role)| SelectOption {
            label: format!("{}. {role}", index + 1),
            value: role.to_string(),
            description: None,
            emoji: None,
            default: false,
        })
        .collect();
    let empty = options.is_empty();

    if let Some(Element::StringSelect(select)) = session.element_mut(RAISE) {
        select.options = options;
        select.disabled = empty;
    }
    if let Some(element) = session.element_mut(PREV) {
        element.set_disabled(page == 0);
    }
    if let Some(element) = session.element_mut(NEXT) {
        element.set_disabled(page.saturating_add(1) >= pages);
    }
}

fn on_raise<'a>(
    session: &'a mut ViewSession<RolePriorityView>,
    interaction: &'a ComponentInteraction,
    manager: &'a SessionManager,
) -> BoxFuture<'a, Result<(), SessionError>> {
    Box::pin(async move {
        if !ensure_invoker(session, interaction, manager).await? {
            return Ok(());
        }
        let Some(role) = interaction.values.first() else {
            return Ok(());
        };
        let role = role
            .parse::<RoleId>()
            .map_err(|e| SessionError::Handler(format!("invalid role id '{role}': {e}")))?;

        if session.view.raise(role) {
            refresh(session);
            manager.redraw(&*session).await?;
        }
        Ok(())
    })
}

fn on_prev<'a>(
    session: &'a mut ViewSession<RolePriorityView>,
    interaction: &'a ComponentInteraction,
    manager: &'a SessionManager,
) -> BoxFuture<'a, Result<(), SessionError>> {
    Box::pin(async move {
        if !ensure_invoker(session, interaction, manager).await? {
            return Ok(());
        }
        session.view.page = session.view.current_page().saturating_sub(1);
        refresh(session);
        manager.redraw(&*session).await
    })
}

fn on_next<'a>(
    session: &'a mut ViewSession<RolePriorityView>,
    interaction: &'a ComponentInteraction,
    manager: &'a SessionManager,
) -> BoxFuture<'a, Result<(), SessionError>> {
    Box::pin(async move {
        if !ensure_invoker(session, interaction, manager).await? {
            return Ok(());
        }
        let last = session.view.page_count() - 1;
        session.view.page = session.view.current_page().saturating_add(1).min(last);
        refresh(session);
        manager.redraw(&*session).await
    })
}

fn on_done<'a>(
    session: &'a mut ViewSession<RolePriorityView>,
    interaction: &'a ComponentInteraction,
    manager: &'a SessionManager,
) -> BoxFuture<'a, Result<(), SessionError>> {
    Box::pin(async move {
        if !ensure_invoker(session, interaction, manager).await? {
            return Ok(());
        }
        for custom_id in [RAISE, PREV, NEXT, DONE] {
            if let Some(element) = session.element_mut(custom_id) {
                element.set_disabled(true);
            }
        }
        manager.redraw(&*session).await?;
        manager
            .platform()
            .reply(
                interaction,
                Reply::public(format!(
                    "Role priority saved: {}",
                    mention_roles(&session.view.order)
                )),
            )
            .await?;
        manager.stop(session).await
    })
}
