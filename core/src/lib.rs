//! Docpipe core: an LLM-driven document-to-report orchestration engine.
//!
//! A run analyzes a source document, compiles an executable analysis plan,
//! executes it one step at a time against local and remote tools, and
//! synthesizes the step reports into a final document.

pub mod config;
pub mod error;
pub mod executor;
pub mod llm;
pub mod pipeline;
pub mod plan;
pub mod tools;

pub use error::{Error, Result};
pub use executor::{ExecutorOptions, StepExecutor, TickOutcome};
pub use pipeline::{DocumentSource, PipelineResult, PipelineStage, ReportPipeline};
pub use plan::{CompiledPlan, PlanCompiler, PlanStep};
pub use tools::{ToolInvoker, ToolRegistry};

/// Initialize tracing with an env-filter, defaulting to warnings only
pub fn init_tracing() {
    init_tracing_with_debug(false);
}

/// Initialize tracing; debug mode lowers the default level for this crate
pub fn init_tracing_with_debug(debug: bool) {
    let default_filter = if debug { "warn,docpipe_core=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
