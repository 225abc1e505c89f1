use clap::{ArgAction, Parser, Subcommand};
use commands::{clear, config, progress, sync};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "plexmal")]
#[command(about = "plexmal - Add the anime in your Plex library to your MyAnimeList plan-to-watch list")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Write logs to this file (rotated daily) instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync library titles to the MyAnimeList plan-to-watch list (one pass)
    #[command(long_about = "Fetch every title in the given Plex library sections, look each one up on MyAnimeList and add exact matches to the plan-to-watch list. Titles added in earlier runs are skipped. Flags override values from the configuration file.")]
    Sync(sync::SyncArgs),

    /// Push watched first-season episode counts to MyAnimeList (one pass)
    #[command(long_about = "Count the watched first-season episodes of every show in the given Plex library sections and move the matching MyAnimeList entries forward. Shows not yet on the list are added as watching; fully watched series are marked completed. Nothing is ever moved back.")]
    Progress(sync::SyncArgs),

    /// Configure credentials and settings
    #[command(long_about = "Manage configuration and credentials for plexmal. Running without a subcommand shows the current configuration.")]
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },

    /// Clear the processed-title record or stored credentials
    #[command(long_about = "Clear per-user processed-title records or stored credentials. Clearing a user's record makes the next sync resubmit every library title for that user.")]
    Clear {
        /// Clear the processed-title record of this MyAnimeList user
        #[arg(long, value_name = "USER")]
        user: Option<String>,

        /// Clear stored credentials
        #[arg(long, action = ArgAction::SetTrue)]
        credentials: bool,

        /// Clear every processed-title record and stored credentials
        #[arg(long, action = ArgAction::SetTrue, conflicts_with_all = ["user", "credentials"])]
        all: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (masks sensitive data)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Configure the Plex server
    #[command(long_about = "Configure the Plex server address, the library sections to sync and the access token. The token is stored in the credentials file.")]
    Plex {
        /// Server address, `host:port` or a full URL
        #[arg(long)]
        server: Option<String>,

        /// Comma-separated library section keys, e.g. "2,5"
        #[arg(long)]
        sections: Option<String>,

        /// Plex access token (if not provided, will prompt)
        #[arg(long)]
        token: Option<String>,
    },

    /// Configure MyAnimeList credentials
    #[command(long_about = "Configure the MyAnimeList username and password. The password is stored in the credentials file.")]
    Mal {
        /// MyAnimeList username (if not provided, will prompt)
        #[arg(long)]
        username: Option<String>,

        /// API base URL
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Configure sync behaviour
    Sync {
        /// Only match titles, never add them or record them as processed
        #[arg(long)]
        dry_run: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging_with_file(cli.verbose, cli.quiet, cli.log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Sync(args) => sync::run_sync(args, &output).await,
        Commands::Progress(args) => progress::run_progress(args, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(cmd, &output).await
        }
        Commands::Clear {
            user,
            credentials,
            all,
        } => clear::run_clear(user, credentials, all, &output).await,
    }
}
