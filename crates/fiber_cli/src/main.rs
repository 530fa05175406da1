//! FiberForge CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Plan extraction failure
//! - 4: Server error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const PLAN_FAILURE: u8 = 3;
    pub const SERVER_ERROR: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(
            EnvFilter::from_default_env()
                .add_directive("fiber=info".parse().unwrap())
                .add_directive("warn".parse().unwrap()),
        )
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate(args) => commands::generate::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if let Some(core) = e.downcast_ref::<fiber_core::CoreError>() {
        return match core {
            fiber_core::CoreError::MissingDelimiters
            | fiber_core::CoreError::PlanParse(_)
            | fiber_core::CoreError::MissingDescription(_) => ExitCodes::PLAN_FAILURE,
            _ => ExitCodes::GENERAL_ERROR,
        };
    }
    if e.downcast_ref::<fiber_server::ServerError>().is_some() {
        return ExitCodes::SERVER_ERROR;
    }
    if let Some(llm) = e.downcast_ref::<fiber_llm::LlmError>() {
        return match llm {
            fiber_llm::LlmError::NotConfigured | fiber_llm::LlmError::UnknownProvider(_) => {
                ExitCodes::INVALID_ARGS
            }
            _ => ExitCodes::GENERAL_ERROR,
        };
    }
    ExitCodes::GENERAL_ERROR
}
