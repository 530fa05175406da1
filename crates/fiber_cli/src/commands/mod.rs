//! CLI command definitions.

use clap::{Parser, Subcommand};

pub mod generate;

/// FiberForge - prompt-to-app generator for React Three Fiber projects
#[derive(Parser)]
#[command(name = "fiberforge")]
#[command(version, about = "FiberForge - prompt-to-app generator for React Three Fiber projects")]
#[command(long_about = r#"
FiberForge turns a natural-language project description into a runnable
React Three Fiber application: it plans a file structure, generates each
file through a text-generation service, and launches the Vite dev server.

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Plan extraction failure
  4 - Server error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate an application from a prompt and serve it
    Generate(generate::GenerateArgs),
}
