//! CLI command definitions and dispatch for the `draftfun` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a verb-noun
//! pattern (e.g., `draftfun generate`, `draftfun games list`).

pub mod games;
pub mod generate;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Generate and publish browser games from text prompts.
#[derive(Parser)]
#[command(name = "draftfun", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a game from a prompt and write the HTML to a file.
    Generate {
        /// What the game should be.
        prompt: String,

        /// Engine to use (classic, beta).
        #[arg(long, default_value = "classic")]
        engine: String,

        /// Output path for the generated HTML.
        #[arg(short, long, default_value = "game.html")]
        output: String,

        /// Show the model's reasoning stream while it thinks.
        #[arg(long)]
        show_reasoning: bool,

        /// Publish the result to the catalog after generating.
        #[arg(long)]
        publish: bool,

        /// Name to publish under (required with --publish).
        #[arg(long)]
        name: Option<String>,

        /// Short description for the published game.
        #[arg(long)]
        description: Option<String>,

        /// Author username for the published game.
        #[arg(long, default_value = "anonymous")]
        username: String,
    },

    /// Manage the published game catalog.
    Games {
        #[command(subcommand)]
        action: games::GamesCommand,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
