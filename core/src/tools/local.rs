//! Local tool trait
//!
//! Local tools declare their parameter metadata explicitly at registration;
//! nothing is inferred from signatures at runtime.

use crate::error::Result;
use crate::tools::descriptor::ParamSpec;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Trait for in-process tools
#[async_trait]
pub trait LocalTool: Send + Sync {
    /// Get the name of the tool
    fn name(&self) -> &str;

    /// Get the description of the tool
    fn description(&self) -> &str;

    /// Declared parameters
    fn parameters(&self) -> Vec<ParamSpec>;

    /// Execute the tool with already-filtered arguments
    async fn call(&self, args: Map<String, Value>) -> Result<String>;
}

/// Keep only arguments matching the tool's declared parameter names.
///
/// Extra keys are silently dropped, mirroring dispatch by declared
/// signature.
pub fn filter_args(tool: &dyn LocalTool, args: &Map<String, Value>) -> Map<String, Value> {
    let declared: Vec<String> = tool.parameters().into_iter().map(|p| p.name).collect();
    args.iter()
        .filter(|(key, _)| declared.iter().any(|name| name == *key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
