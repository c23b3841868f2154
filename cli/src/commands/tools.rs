//! Tool discovery listing

use anyhow::Result;
use docpipe_core::config::load_endpoints;
use docpipe_core::tools::ToolRegistry;
use std::path::Path;

pub async fn tools_command(config: &Path) -> Result<()> {
    let endpoints = load_endpoints(config).await;
    println!("Probing {} endpoint(s)...\n", endpoints.len());

    let mut registry = ToolRegistry::new();
    let outcomes = registry.discover_all(&endpoints).await;

    for outcome in &outcomes {
        if outcome.success {
            println!(
                "  {} ({}) - {} tool(s)",
                outcome.endpoint, outcome.url, outcome.tool_count
            );
        } else {
            println!(
                "  {} ({}) - unreachable: {}",
                outcome.endpoint,
                outcome.url,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    for (original, renamed) in registry.renames() {
        println!("  note: '{}' also served elsewhere, registered as '{}'", original, renamed);
    }

    println!("\n{}", registry.describe_tools());
    Ok(())
}
