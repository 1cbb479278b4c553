//! Keepsake entry point.
//!
//! Binary name: `keepsake`
//!
//! Parses CLI arguments, loads configuration, sets up tracing and the
//! application state, then dispatches to the command handler.

mod cli;
mod gateway;
mod state;

use clap::Parser;
use clap_complete::generate;
use keepsake_infra::config::load_config;
use keepsake_infra::filesystem::{ensure_data_dir, resolve_data_dir};
use keepsake_observe::tracing_setup::{init_tracing, shutdown_tracing};
use keepsake_types::ids::MessageKey;

use cli::{Cli, Commands, SessionsCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "keepsake", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    ensure_data_dir(&data_dir).await?;
    let config = load_config(&data_dir).await;

    init_tracing(config.otel, cli.log_filter())
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli, AppState::init(data_dir, config).await?).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve => cli::serve::serve(&state).await?,

        Commands::Post {
            guild_id,
            channel_id,
        } => {
            let key = cli::serve::post_main(&state, guild_id, channel_id).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&key)?);
            }
        }

        Commands::Sessions { action } => match action {
            SessionsCommand::List { kind, guild, limit } => {
                cli::sessions::list_sessions(&state, kind, guild, limit, cli.json).await?;
            }
            SessionsCommand::Show {
                guild_id,
                channel_id,
                message_id,
            } => {
                let key = MessageKey::new(guild_id, channel_id, message_id);
                cli::sessions::show_session(&state, key, cli.json).await?;
            }
            SessionsCommand::Delete {
                guild_id,
                channel_id,
                message_id,
                force,
            } => {
                let key = MessageKey::new(guild_id, channel_id, message_id);
                cli::sessions::delete_session(&state, key, force, cli.json).await?;
            }
            SessionsCommand::Prune {
                older_than_days,
                force,
            } => {
                cli::sessions::prune_sessions(&state, older_than_days, force, cli.json).await?;
            }
        },

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
