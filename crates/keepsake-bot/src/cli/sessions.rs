//! Saved session admin commands: list, show, delete, prune.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use keepsake_core::repository::SessionStore;
use keepsake_types::ids::{GuildId, MessageKey};
use keepsake_types::record::{RecordFilter, SessionRecord};
use keepsake_types::session::SessionKind;

use crate::state::AppState;

/// List saved sessions, most recently updated first.
///
/// # Examples
///
/// ```bash
/// keepsake sessions list
/// keepsake sessions list --kind role_priority --guild 1 --json
/// ```
pub async fn list_sessions(
    state: &AppState,
    kind: Option<SessionKind>,
    guild_id: Option<GuildId>,
    limit: Option<i64>,
    json: bool,
) -> Result<()> {
    let records = state
        .store
        .list(RecordFilter {
            kind,
            guild_id,
            limit,
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!();
        println!("  {} No saved sessions.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Kind").fg(Color::White),
        Cell::new("Guild").fg(Color::White),
        Cell::new("Channel").fg(Color::White),
        Cell::new("Message").fg(Color::White),
        Cell::new("Fields").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
        Cell::new("Last loaded").fg(Color::White),
    ]);

    for record in &records {
        let fields = record.data.as_ref().map_or(0, |data| data.len());
        let loaded = record
            .last_loaded_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());

        table.add_row(vec![
            Cell::new(record.kind).fg(Color::Cyan),
            Cell::new(record.key.guild_id).fg(Color::White),
            Cell::new(record.key.channel_id).fg(Color::White),
            Cell::new(record.key.message_id).fg(Color::White),
            Cell::new(fields).fg(Color::White),
            Cell::new(record.last_updated_at.format("%Y-%m-%d %H:%M")).fg(Color::DarkGrey),
            Cell::new(loaded).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} saved session{}",
        style(records.len()).bold(),
        if records.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Show one saved session with its stored attributes.
pub async fn show_session(state: &AppState, key: MessageKey, json: bool) -> Result<()> {
    let record = state
        .store
        .load(key)
        .await
        .with_context(|| format!("No saved session for {key}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    print_record(&record);
    Ok(())
}

fn print_record(record: &SessionRecord) {
    println!();
    println!(
        "  {} {}",
        style(record.kind).cyan().bold(),
        style(record.id).dim()
    );
    println!();
    println!("  Message:      {}", record.key);
    println!("  Timeout:      {}s", record.timeout_secs);
    println!("  Created:      {}", record.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Updated:      {}", record.last_updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    match record.last_loaded_at {
        Some(at) => println!("  Last loaded:  {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("  Last loaded:  never"),
    }
    println!();

    let Some(data) = &record.data else {
        println!("  {}", style("No stored attributes.").dim());
        println!();
        return;
    };

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Attribute").fg(Color::White),
        Cell::new("Value").fg(Color::White),
    ]);
    for (name, value) in data.iter() {
        table.add_row(vec![
            Cell::new(name).fg(Color::Cyan),
            Cell::new(value.to_string()).fg(Color::White),
        ]);
    }
    println!("{table}");
    println!();
}

/// Delete a saved session with confirmation.
///
/// The widget's message is left alone; its next interaction gets the
/// expired reply.
pub async fn delete_session(state: &AppState, key: MessageKey, force: bool, json: bool) -> Result<()> {
    let mut record = state
        .store
        .load(key)
        .await
        .with_context(|| format!("No saved session for {key}"))?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete saved {} session for message {}?",
                style(record.kind).red().bold(),
                key.message_id
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.store.delete(&mut record).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "record_id": record.id.to_string()})
        );
    } else {
        println!("  {} Saved session deleted.", style("x").red().bold());
    }

    Ok(())
}

/// Delete every saved session not updated for `older_than_days`.
pub async fn prune_sessions(state: &AppState, older_than_days: u32, force: bool, json: bool) -> Result<()> {
    let cutoff = Utc::now() - Duration::days(older_than_days.into());

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete saved sessions not updated since {}?",
                style(cutoff.format("%Y-%m-%d %H:%M")).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let removed = state.store.prune(cutoff).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"removed": removed, "cutoff": cutoff.to_rfc3339()})
        );
    } else {
        println!(
            "  {} Removed {} saved session{}.",
            style("x").red().bold(),
            style(removed).bold(),
            if removed == 1 { "" } else { "s" }
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsake_types::config::BotConfig;
    use keepsake_types::ids::{ChannelId, MessageId};

    async fn state(dir: &std::path::Path) -> AppState {
        AppState::init(dir.to_path_buf(), BotConfig::default()).await.unwrap()
    }

    fn key(message_id: u64) -> MessageKey {
        MessageKey::new(GuildId(1), ChannelId(2), MessageId(message_id))
    }

    #[tokio::test]
    async fn test_delete_forced() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path()).await;
        state.store.create(key(3), None, SessionKind::RolePriority, 180).await.unwrap();

        delete_session(&state, key(3), true, true).await.unwrap();
        assert!(state.store.load(key(3)).await.is_err());
    }

    #[tokio::test]
    async fn test_show_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path()).await;
        let err = show_session(&state, key(3), true).await.unwrap_err();
        assert!(err.to_string().contains("No saved session"));
    }

    #[tokio::test]
    async fn test_list_and_prune_json() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path()).await;
        state.store.create(key(3), None, SessionKind::RolePriority, 180).await.unwrap();

        list_sessions(&state, Some(SessionKind::RolePriority), None, None, true).await.unwrap();
        prune_sessions(&state, 1, true, true).await.unwrap();
        assert!(state.store.load(key(3)).await.is_ok());
    }
}
