use clap::{Args, Parser, Subcommand, builder::styling};
use eyre::Result;
use logic_app_backup::cli::{self, BackupOptions, RestoreOptions};
use logic_app_backup::flow::{DEFAULT_REVISION_LIMIT, FlowOutcome};
use logic_app_backup::storage::SessionStore;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Logic App Backup: export and import Azure Logic App workflows from a portal session
#[derive(Parser)]
#[command(name = "lappbak", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source settings from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

/// The portal tab to act on
#[derive(Args)]
struct PageArgs {
    /// URL of the Logic App page in the Azure Portal
    #[arg(short, long)]
    url: String,

    /// JSON dump of the tab's sessionStorage (holds the management API token)
    #[arg(short, long)]
    storage: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the Logic App, token and icon state detected for a page
    #[command(alias = "status")]
    Inspect {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Back up the Logic App to a local file or to GitHub
    Backup {
        #[command(flatten)]
        page: PageArgs,

        /// Commit the backup to the configured GitHub repository
        #[arg(long)]
        store: bool,

        /// Directory to save the backup file to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Commit message, skips the prompt
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Restore the Logic App from a local file or from GitHub
    Restore {
        #[command(flatten)]
        page: PageArgs,

        /// Backup file to restore
        #[arg(short, long, conflicts_with = "store")]
        file: Option<PathBuf>,

        /// Pick a backup from the configured GitHub repository
        #[arg(long)]
        store: bool,

        /// Revision (commit SHA or prefix) to restore, skips the picker
        #[arg(short, long)]
        revision: Option<String>,

        /// How many recent backups to offer (GitHub lists at most 100)
        #[arg(short, long, default_value_t = DEFAULT_REVISION_LIMIT)]
        limit: usize,
    },

    /// Manage the GitHub repository used for versioned backups
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Test and save a GitHub token and owner/repo for this session
    Set {
        /// Personal access token with contents read/write access
        token: String,

        /// Repository as owner/repo
        repository: String,
    },

    /// Test the saved settings
    Test,

    /// Show the configured repository
    Show,

    /// Forget the saved settings
    Clear,
}

fn exit_code(outcome: &FlowOutcome) -> ExitCode {
    match outcome.is_failure() {
        true => ExitCode::FAILURE,
        false => ExitCode::SUCCESS,
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let env_loaded = dotenvy::from_filename(&cli.env).is_ok();

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    if !env_loaded {
        log::debug!("No dotenv file at {}", cli.env.bright_black());
    }

    let session = SessionStore::default_location();

    match cli.command {
        Commands::Inspect { page } => {
            let page = cli::load_page_context(&page.url, page.storage.as_deref())?;
            cli::inspect(&page)?;
        }
        Commands::Backup {
            page,
            store,
            output_dir,
            message,
        } => {
            log::info!(
                "Backing up to {}",
                match store {
                    true => "GitHub".to_string(),
                    false => output_dir.display().to_string(),
                }
                .bright_black()
            );
            let page = cli::load_page_context(&page.url, page.storage.as_deref())?;
            let options = BackupOptions {
                to_store: store,
                output_dir,
                message,
            };
            let outcome = cli::backup(&page, options, &session).await?;
            return Ok(exit_code(&outcome));
        }
        Commands::Restore {
            page,
            file,
            store,
            revision,
            limit,
        } => {
            let page = cli::load_page_context(&page.url, page.storage.as_deref())?;
            let options = RestoreOptions {
                file,
                from_store: store,
                revision,
                limit,
            };
            let outcome = cli::restore(&page, options, &session).await?;
            return Ok(exit_code(&outcome));
        }
        Commands::Config { command } => match command {
            ConfigCommands::Set { token, repository } => {
                cli::config_set(&session, &token, &repository).await?
            }
            ConfigCommands::Test => cli::config_test(&session).await?,
            ConfigCommands::Show => cli::config_show(&session)?,
            ConfigCommands::Clear => cli::config_clear(&session)?,
        },
    }

    Ok(ExitCode::SUCCESS)
}
