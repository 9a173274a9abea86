//! mailgate - command-line client for the mailgate email backend.
//!
//! Signs in, links Gmail and Outlook accounts through their OAuth consent
//! screens, and reads and sends mail through the backend.

mod app;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;

#[derive(Parser)]
#[command(name = "mailgate")]
#[command(version)]
#[command(about = "Email client for the mailgate backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        /// Account email (defaults to the last one used)
        #[arg(value_name = "EMAIL")]
        email: Option<String>,

        /// Remember the password in the OS keychain
        #[arg(long)]
        remember: bool,
    },

    /// Create a new account
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,
    },

    /// Sign out and discard the stored session
    Logout {
        /// Also forget the password remembered in the keychain
        #[arg(long)]
        forget: bool,
    },

    /// Show whether the stored session is still accepted
    Status,

    /// Start linking a Gmail or Outlook account
    Link {
        /// gmail or outlook
        #[arg(value_name = "PROVIDER")]
        provider: String,
    },

    /// Finish linking with the URL the provider redirected to
    Callback {
        #[arg(value_name = "REDIRECT_URL")]
        url: String,
    },

    /// Manage linked accounts
    Accounts {
        #[command(subcommand)]
        command: AccountCommands,
    },

    /// List received mail
    Inbox {
        /// Filter by subject or sender address
        #[arg(short, long)]
        search: Option<String>,

        /// Sort order: date (newest first) or sender
        #[arg(long, default_value = "date")]
        sort: String,

        /// Maximum number of messages to show
        #[arg(short = 'n', long, default_value_t = 50)]
        limit: usize,
    },

    /// Send an email from the primary account
    Send {
        #[arg(long)]
        to: String,

        #[arg(long)]
        subject: String,

        #[arg(long)]
        body: String,
    },
}

#[derive(clap::Subcommand)]
enum AccountCommands {
    /// List linked accounts
    List,
    /// Unlink an account
    Delete {
        #[arg(value_name = "EMAIL")]
        email: String,
    },
    /// Make an account the primary one
    Primary {
        #[arg(value_name = "EMAIL")]
        email: String,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` controls the level (default `warn`). The returned guard
/// flushes the file writer on drop and must live until exit.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_deref())?;
    info!("mailgate starting");

    let mut app = App::new()?;

    match cli.command {
        Commands::Login { email, remember } => app.login(email, remember).await,
        Commands::Register { name, email } => app.register(&name, &email).await,
        Commands::Logout { forget } => app.logout(forget),
        Commands::Status => app.status().await,
        Commands::Link { provider } => app.link(&provider).await,
        Commands::Callback { url } => app.callback(&url).await,
        Commands::Accounts { command } => match command {
            AccountCommands::List => app.list_accounts().await,
            AccountCommands::Delete { email } => app.delete_account(&email).await,
            AccountCommands::Primary { email } => app.set_primary(&email).await,
        },
        Commands::Inbox {
            search,
            sort,
            limit,
        } => app.inbox(search.as_deref(), &sort, limit).await,
        Commands::Send { to, subject, body } => app.send(to, subject, body).await,
    }
}
