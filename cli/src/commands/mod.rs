//! CLI command implementations

mod run;
mod tools;

pub use run::run_command;
pub use tools::tools_command;
