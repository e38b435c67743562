//! # Itihasa CLI Module
//!
//! ## Available Commands
//!
//! - `ask` - Run the full pipeline for a question and print the answer
//! - `plan` - Print the query plan for a question (planner debugging)
//! - `status` - Show graph artifact counts

mod commands;

use clap::{Parser, Subcommand};
use itihasa_core::ItihasaError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Itihasa - grounded question answering over an event-centric KG.
///
/// Deterministic, explainable, and honest: every answer carries the
/// events that support it and a trace of every decision, and questions
/// the graph cannot ground come back as NO_ANSWER rather than a guess.
#[derive(Parser, Debug)]
#[command(name = "itihasa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the entities artifact
    #[arg(long, global = true, default_value = "data/kg/entities.json")]
    pub entities: PathBuf,

    /// Path to the events artifact
    #[arg(long, global = true, default_value = "data/kg/events.json")]
    pub events: PathBuf,

    /// Path to the participation edges artifact
    #[arg(long, global = true, default_value = "data/kg/edges.json")]
    pub edges: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress the decision trace in text output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a natural-language question against the graph
    Ask {
        /// The question to answer
        question: String,

        /// Directory to write answer.json and trace.txt into
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the query plan for a question without executing it
    Plan {
        /// The question to plan
        question: String,
    },

    /// Show graph status (entity/event/edge counts)
    Status,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments, returning the process exit code.
#[must_use]
pub fn execute(cli: Cli) -> i32 {
    let paths = itihasa_core::GraphPaths {
        entities: cli.entities.clone(),
        events: cli.events.clone(),
        edges: cli.edges.clone(),
    };

    let outcome = match cli.command {
        Commands::Ask {
            ref question,
            ref output,
        } => cmd_ask(&paths, question, output.as_deref(), cli.json, cli.quiet),
        Commands::Plan { ref question } => cmd_plan(&paths, question, cli.json),
        Commands::Status => cmd_status(&paths, cli.json),
    };

    match outcome {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{e}");
            exit_code(&e)
        }
    }
}

/// Map errors to the contracted exit codes: load failures are 2,
/// anything else (internal invariant violations) is 1.
fn exit_code(error: &ItihasaError) -> i32 {
    match error {
        ItihasaError::InvariantViolation(_) => 1,
        _ => 2,
    }
}
