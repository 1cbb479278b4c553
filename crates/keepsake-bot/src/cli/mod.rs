//! CLI command definitions for the `keepsake` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod serve;
pub mod sessions;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use keepsake_types::ids::{ChannelId, GuildId, MessageId};
use keepsake_types::session::SessionKind;

/// Run interactive widgets that survive restarts.
#[derive(Parser)]
#[command(name = "keepsake", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log filter used when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "info,sqlx=warn",
            1 => "debug,sqlx=warn",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve gateway events read from stdin, one JSON object per line.
    Serve,

    /// Post the leveling main message to a channel.
    Post {
        guild_id: GuildId,
        channel_id: ChannelId,
    },

    /// Inspect and maintain saved sessions.
    Sessions {
        #[command(subcommand)]
        action: SessionsCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SessionsCommand {
    /// List saved sessions, most recently updated first.
    #[command(alias = "ls")]
    List {
        /// Only sessions of this kind (leveling_config, role_priority).
        #[arg(long)]
        kind: Option<SessionKind>,

        /// Only sessions in this guild.
        #[arg(long)]
        guild: Option<GuildId>,

        /// Maximum number of sessions to show.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Show one saved session and its stored attributes.
    Show {
        guild_id: GuildId,
        channel_id: ChannelId,
        message_id: MessageId,
    },

    /// Delete a saved session.
    #[command(alias = "rm")]
    Delete {
        guild_id: GuildId,
        channel_id: ChannelId,
        message_id: MessageId,

        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Delete sessions not updated for a number of days.
    Prune {
        #[arg(long, default_value_t = 30)]
        older_than_days: u32,

        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}
