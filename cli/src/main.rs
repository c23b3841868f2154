//! # docpipe CLI
//!
//! Command-line interface for docpipe - an LLM-driven document-to-report
//! pipeline.
//!
//! ## Usage
//!
//! - `docpipe run report.txt --modules "Performance, Risk"` - Analyze a
//!   document and produce a report
//! - `docpipe tools` - Discover and list available tools

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{run_command, tools_command};

/// docpipe - turn a document into an analysis report
#[derive(Parser)]
#[command(name = "docpipe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "LLM-driven document-to-report pipeline")]
#[command(long_about = None)]
struct Cli {
    /// Endpoint configuration file
    #[arg(short, long, default_value = "endpoints.json")]
    config: PathBuf,

    /// API key for the text-generation service
    #[arg(long, env = "DOCPIPE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "DOCPIPE_BASE_URL", default_value = "https://api.openai.com/v1")]
    base_url: String,

    /// Model name
    #[arg(long, env = "DOCPIPE_MODEL", default_value = "gpt-4o")]
    model: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a document and run the full report pipeline
    Run {
        /// Path to the document to analyze
        document: PathBuf,

        /// Comma-separated report modules to plan for
        #[arg(short, long, default_value = "Overview, Analysis, Conclusion")]
        modules: String,

        /// Write the final report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// How many times a mismatching step may be adjusted and retried
        #[arg(long, default_value_t = 1)]
        max_replans: u32,
    },

    /// Discover endpoints and list available tools
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    docpipe_core::init_tracing_with_debug(cli.verbose);

    match cli.command {
        Commands::Run {
            document,
            modules,
            output,
            max_replans,
        } => {
            run_command(
                &cli.config,
                cli.api_key.as_deref(),
                &cli.base_url,
                &cli.model,
                &document,
                &modules,
                output.as_deref(),
                max_replans,
            )
            .await
        }
        Commands::Tools => tools_command(&cli.config).await,
    }
}
