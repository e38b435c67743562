//! # Itihasa - Grounded KG Question Answering
//!
//! The CLI binary for the Itihasa deterministic query core.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                apps/itihasa (THE BINARY)             │
//! │                                                      │
//! │   CLI (clap) ── ask / plan / status                  │
//! │        │                                             │
//! │        ▼                                             │
//! │  ┌──────────────┐                                    │
//! │  │ itihasa-core │  planner → executor → resolver     │
//! │  │ (THE LOGIC)  │  over a load-once graph store      │
//! │  └──────────────┘                                    │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! itihasa ask "Who killed Karna?"
//! itihasa plan "Who benefited from Drona's death?"
//! itihasa status
//! ```
//!
//! Exit codes: 0 success (including NO_ANSWER), 2 load error,
//! 1 unexpected internal error.

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Initialize tracing — ITIHASA_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("ITIHASA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "itihasa=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();
    std::process::exit(cli::execute(cli));
}
