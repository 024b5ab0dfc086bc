//! # Coursebot CLI (`coursebot`)
//!
//! Ask questions about a course catalog from the terminal.
//!
//! ## Usage
//!
//! ```bash
//! coursebot --config ./config/coursebot.toml [command]
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `coursebot chat` | Interactive question loop (default) |
//! | `coursebot ask "<question>"` | Answer one question and exit |
//! | `coursebot courses` | List the loaded catalog |
//!
//! ## Examples
//!
//! ```bash
//! # Look up a course by id
//! coursebot ask "What is course 4361 about?"
//!
//! # Semantic question against a hosted backend
//! coursebot ask "Which course covers graph algorithms?" --backend openai --strategy document
//!
//! # Chat with debug logging
//! coursebot --log-level debug
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing::warn;

use coursebot::config;
use coursebot::controller::Controller;
use coursebot::logging;
use coursebot::repl;

/// Coursebot: a question-answering assistant over a course catalog.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/coursebot.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "coursebot",
    about = "Coursebot: answer questions about a course catalog",
    version,
    long_about = "Coursebot answers questions about a course catalog. Questions naming a course \
    id or title are answered straight from the catalog; everything else is answered by a \
    language model using course descriptions retrieved by semantic search."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/coursebot.toml`. If the file does not exist,
    /// built-in defaults are used (local Ollama, `courses.jsonl`).
    #[arg(long, global = true, default_value = "./config/coursebot.toml")]
    config: PathBuf,

    /// Log level (`error`, `warn`, `info`, `debug`, `trace`).
    ///
    /// Overrides both `RUST_LOG` and `[logging] level` from the config.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session.
    ///
    /// Type a question and press Enter. `set strategy <name>` and
    /// `set backend <name>` switch retrieval strategy and answer backend
    /// without restarting; `exit` quits.
    Chat,

    /// Answer a single question and exit.
    Ask {
        /// The question to answer.
        question: String,

        /// Retrieval strategy: `top_n`, `window`, `document`, `hierarchical`.
        #[arg(long)]
        strategy: Option<String>,

        /// Answer backend: `ollama`, `openai`, `gemini`.
        #[arg(long)]
        backend: Option<String>,
    },

    /// List the courses in the catalog.
    Courses,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (cfg, found) = config::load_config_or_default(&cli.config)?;

    match &cli.log_level {
        Some(level) => {
            logging::parse_level(level)?;
            logging::init(level, true)?;
        }
        None => logging::init(&cfg.logging.level, false)?,
    }
    if !found {
        warn!(
            path = %cli.config.display(),
            "config file not found; using defaults"
        );
    }

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let controller = Controller::from_config(&cfg).await?;
            println!(
                "Coursebot ready: {} courses loaded. Type 'exit' to quit.",
                controller.catalog().len()
            );
            let stdin = BufReader::new(tokio::io::stdin());
            repl::run_repl(&controller, stdin, &mut std::io::stdout()).await?;
        }
        Commands::Ask {
            question,
            strategy,
            backend,
        } => {
            let controller = Controller::from_config(&cfg).await?;
            if let Some(name) = strategy {
                controller.set_strategy(&name)?;
            }
            if let Some(name) = backend {
                controller.set_backend(&name)?;
            }
            println!("{}", controller.ask(&question).await?);
        }
        Commands::Courses => {
            let catalog = coursebot::catalog::load_catalog(&cfg.catalog.path);
            if catalog.is_empty() {
                println!("No courses loaded from {}", cfg.catalog.path.display());
            }
            for course in catalog.courses() {
                println!("{}  {}", course.id, course.title);
            }
        }
    }

    Ok(())
}
