//! TeamKB CLI — the main entry point.
//!
//! Commands:
//! - `serve`        — Start the HTTP API server
//! - `ask`          — Ask the assistant a single question
//! - `notes`        — List, add, and delete notes
//! - `config`       — Show, validate, or initialize configuration
//! - `doctor`       — Diagnose configuration, store, and backend
//! - `completions`  — Generate shell completions

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

mod commands;

#[derive(Parser)]
#[command(
    name = "teamkb",
    about = "TeamKB — answers questions from your team's notes",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
    },

    /// Ask the assistant a question
    Ask {
        /// The question
        query: String,

        /// Continuation cursor from a previous answer
        #[arg(short, long)]
        cursor: Option<String>,

        /// Earlier user messages, oldest first (repeatable)
        #[arg(long = "history")]
        history: Vec<String>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Manage notes
    Notes {
        #[command(subcommand)]
        action: NotesAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Diagnose system health
    Doctor,

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum NotesAction {
    /// List notes, newest first
    List,

    /// Add a note
    Add {
        /// Note title
        #[arg(short, long)]
        title: String,

        /// Note body
        #[arg(short, long)]
        content: Option<String>,
    },

    /// Delete a note by id
    Delete {
        id: i64,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (default)
    Show,

    /// Validate the configuration file
    Validate,

    /// Print the configuration file path
    Path,

    /// Write a default configuration file if none exists
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(port, host).await?,
        Commands::Ask {
            query,
            cursor,
            history,
            json,
        } => commands::ask::run(query, cursor, history, json).await?,
        Commands::Notes { action } => match action {
            NotesAction::List => commands::notes::list().await?,
            NotesAction::Add { title, content } => commands::notes::add(title, content).await?,
            NotesAction::Delete { id } => commands::notes::delete(id).await?,
        },
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Init => commands::config_cmd::init().await?,
        },
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "teamkb", &mut std::io::stdout());
        }
    }

    Ok(())
}
