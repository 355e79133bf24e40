use clap::{ArgAction, Parser, Subcommand};
use commands::{audio, daemon, sync};
use profile_sync_config::PathManager;

mod commands;
mod lock;
mod logging;
mod output;
mod progress;

#[derive(Parser)]
#[command(name = "langarr")]
#[command(about = "Langarr - language-aware quality profiles for your media catalogs")]
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

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one profile-sync pass (one-time sync)
    #[command(long_about = "Process pending intake requests and reconcile the quality profile and marker tag of every item on every configured catalog instance, based on each title's original language.")]
    Sync {
        /// Preview changes without writing anything
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,

        /// Only process the named catalog instance
        #[arg(long, value_name = "NAME")]
        instance: Option<String>,

        /// Skip request-intake processing
        #[arg(long, action = ArgAction::SetTrue)]
        no_intake: bool,
    },
    /// Scan file audio tracks and maintain per-language tags
    #[command(long_about = "Read embedded audio-track metadata from each item's files and add/remove the configured per-language tags. Series are tagged only with languages present in every episode file.")]
    AudioScan {
        /// Preview changes without writing anything
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,

        /// Only process the named catalog instance
        #[arg(long, value_name = "NAME")]
        instance: Option<String>,
    },
    /// Run as daemon: periodic sync plus the webhook endpoint
    #[command(long_about = "Run langarr as a background daemon that repeats the sync on the configured interval and, if enabled, serves the intake webhook endpoint for real-time updates. An initial sync runs on startup unless --no-startup-sync is specified.")]
    Daemon {
        /// Override the sync interval in hours
        #[arg(long, value_name = "HOURS")]
        interval_hours: Option<u64>,

        /// Skip initial sync on startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_sync: bool,

        /// Run in foreground (don't daemonize)
        #[arg(long, action = ArgAction::SetTrue)]
        foreground: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // Background daemons lose their terminal, so their logs go to the
    // rotating daemon log file instead of stderr.
    let log_file = match &cli.command {
        Commands::Daemon { foreground: false, .. } => {
            Some(PathManager::default().daemon_log_file())
        }
        _ => None,
    };
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Sync { dry_run, instance, no_intake } => {
            sync::run_sync(dry_run, instance, no_intake, &output).await
        }
        Commands::AudioScan { dry_run, instance } => {
            audio::run_audio_scan(dry_run, instance, &output).await
        }
        Commands::Daemon { interval_hours, no_startup_sync, foreground } => {
            daemon::run_daemon(interval_hours, no_startup_sync, foreground, &output).await
        }
    }
}
