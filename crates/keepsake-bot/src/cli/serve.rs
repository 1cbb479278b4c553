//! The serve loop: feed console gateway events into the engine.
//!
//! Each event is handled on its own task so a slow handler never blocks the
//! next interaction. On EOF or a shutdown signal the loop drains in-flight
//! tasks and stores every resident session before returning.

use anyhow::Result;
use keepsake_core::platform::Platform;
use keepsake_core::views::leveling::LevelingModule;
use keepsake_types::ids::{ChannelId, GuildId, MessageKey};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::gateway::GatewayEvent;
use crate::state::AppState;

pub async fn serve(state: &AppState) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    info!(data_dir = %state.data_dir.display(), "reading gateway events from stdin");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match GatewayEvent::parse(line) {
                    Ok(event) => {
                        let state = state.clone();
                        tasks.spawn(async move { handle_event(&state, event).await });
                    }
                    Err(err) => warn!(error = %err, "ignoring malformed gateway event"),
                }
            }
            Some(done) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(err) = done {
                    error!(error = %err, "event task panicked");
                }
            }
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    while let Some(done) = tasks.join_next().await {
        if let Err(err) = done {
            error!(error = %err, "event task panicked");
        }
    }

    let stored = state.manager().shutdown().await;
    state.unload_modules();
    info!(stored, "serve loop finished");
    Ok(())
}

async fn handle_event(state: &AppState, event: GatewayEvent) {
    match event {
        GatewayEvent::Interaction(interaction) => {
            let span = info_span!(
                "interaction",
                custom_id = %interaction.custom_id,
                message_id = %interaction.key.message_id,
                user_id = %interaction.user_id,
            );
            match state.router.handle(&interaction).instrument(span).await {
                Ok(outcome) => debug!(?outcome, custom_id = %interaction.custom_id, "interaction served"),
                Err(err) => error!(error = %err, custom_id = %interaction.custom_id, "interaction failed"),
            }
        }
        GatewayEvent::PostMain {
            guild_id,
            channel_id,
        } => {
            if let Err(err) = post_main(state, guild_id, channel_id).await {
                error!(error = %err, %guild_id, %channel_id, "failed to post main message");
            }
        }
    }
}

/// Post the leveling main message. Its components are served by the
/// command module, so no session is created for it.
pub async fn post_main(
    state: &AppState,
    guild_id: GuildId,
    channel_id: ChannelId,
) -> Result<MessageKey> {
    let message_id = state
        .platform
        .send_message(guild_id, channel_id, LevelingModule::main_message())
        .await?;
    let key = MessageKey::new(guild_id, channel_id, message_id);
    info!(%key, "posted leveling main message");
    Ok(key)
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
