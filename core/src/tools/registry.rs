//! Tool registry
//!
//! Aggregates in-process tools and tools discovered from remote endpoints
//! into one flat, deterministically ordered namespace. Endpoints are probed
//! concurrently, but results merge sequentially in configuration order so
//! listings and collision renames come out the same on every run.

use crate::config::EndpointConfig;
use crate::error::{Result, ToolError};
use crate::tools::descriptor::{ToolDescriptor, ToolOrigin};
use crate::tools::local::LocalTool;
use crate::tools::remote::{params_from_schema, RemoteEndpoint, RemoteToolInfo};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// How a registered tool is dispatched
#[derive(Clone)]
pub enum ToolBinding {
    /// In-process implementation
    Local(Arc<dyn LocalTool>),

    /// Served by the named remote endpoint
    Remote {
        /// Identifier of the endpoint that reported the tool
        endpoint: String,
    },
}

/// One entry in the registry
#[derive(Clone)]
pub struct RegisteredTool {
    pub descriptor: ToolDescriptor,
    pub binding: ToolBinding,
}

/// Per-endpoint result of a discovery pass
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    pub endpoint: String,
    pub url: String,
    pub tool_count: usize,
    pub success: bool,
    pub error: Option<String>,
}

/// Unified catalog of local and remote tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
    endpoints: Vec<Arc<RemoteEndpoint>>,
    available: Vec<String>,
    renames: Vec<(String, String)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an in-process tool.
    ///
    /// Local names must be unique; a duplicate is a registration error
    /// rather than a rename.
    pub fn register_local(&mut self, tool: Arc<dyn LocalTool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ToolError::DuplicateLocal { name }.into());
        }

        let descriptor = ToolDescriptor {
            name: name.clone(),
            origin: ToolOrigin::Local,
            description: tool.description().to_string(),
            parameters: tool.parameters(),
        };

        self.index.insert(name, self.tools.len());
        self.tools.push(RegisteredTool {
            descriptor,
            binding: ToolBinding::Local(tool),
        });
        Ok(())
    }

    /// Probe one endpoint and merge its tools.
    ///
    /// An unreachable endpoint is reported in the outcome but never fails
    /// the registry; a registry holding only local tools is valid.
    pub async fn discover_remote(&mut self, config: &EndpointConfig) -> DiscoveryOutcome {
        let endpoint = Arc::new(RemoteEndpoint::new(config));
        let listing = endpoint.list_tools().await;
        self.absorb(endpoint, listing)
    }

    /// Probe all configured endpoints concurrently, then merge results
    /// sequentially in configuration order.
    pub async fn discover_all(&mut self, configs: &[EndpointConfig]) -> Vec<DiscoveryOutcome> {
        let probes = configs.iter().map(|config| {
            let endpoint = Arc::new(RemoteEndpoint::new(config));
            async move {
                let listing = endpoint.list_tools().await;
                (endpoint, listing)
            }
        });

        join_all(probes)
            .await
            .into_iter()
            .map(|(endpoint, listing)| self.absorb(endpoint, listing))
            .collect()
    }

    fn absorb(
        &mut self,
        endpoint: Arc<RemoteEndpoint>,
        listing: Result<Vec<RemoteToolInfo>>,
    ) -> DiscoveryOutcome {
        match listing {
            Ok(tools) => {
                info!(
                    endpoint = endpoint.id(),
                    tools = tools.len(),
                    "Discovered remote tools"
                );
                let count = tools.len();
                self.merge_remote(endpoint.as_ref(), tools);
                self.available.push(endpoint.id().to_string());
                let outcome = DiscoveryOutcome {
                    endpoint: endpoint.id().to_string(),
                    url: endpoint.url().to_string(),
                    tool_count: count,
                    success: true,
                    error: None,
                };
                self.endpoints.push(endpoint);
                outcome
            }
            Err(e) => {
                warn!(
                    endpoint = endpoint.id(),
                    error = %e,
                    "Endpoint unreachable during discovery"
                );
                DiscoveryOutcome {
                    endpoint: endpoint.id().to_string(),
                    url: endpoint.url().to_string(),
                    tool_count: 0,
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn merge_remote(&mut self, endpoint: &RemoteEndpoint, tools: Vec<RemoteToolInfo>) {
        for tool in tools {
            let mut name = tool.name.clone();
            if self.index.contains_key(&name) {
                let renamed = format!("{}@{}", name, endpoint.id());
                warn!(
                    original = %name,
                    renamed = %renamed,
                    "Tool name collision, registering under endpoint-qualified name"
                );
                self.renames.push((name.clone(), renamed.clone()));
                name = renamed;
            }

            let descriptor = ToolDescriptor {
                name: name.clone(),
                origin: ToolOrigin::Remote {
                    endpoint: endpoint.id().to_string(),
                },
                description: tool.description,
                parameters: params_from_schema(&tool.input_schema),
            };

            self.index.insert(name, self.tools.len());
            self.tools.push(RegisteredTool {
                descriptor,
                binding: ToolBinding::Remote {
                    endpoint: endpoint.id().to_string(),
                },
            });
        }
    }

    /// Look up a tool by its registry name
    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// All descriptors in registration order
    pub fn list_tools(&self) -> Vec<&ToolDescriptor> {
        self.tools.iter().map(|t| &t.descriptor).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Endpoints that answered discovery, in configuration order
    pub fn available_endpoints(&self) -> &[String] {
        &self.available
    }

    /// Client for an available endpoint
    pub fn endpoint(&self, id: &str) -> Option<&Arc<RemoteEndpoint>> {
        self.endpoints.iter().find(|e| e.id() == id)
    }

    /// Renames applied during discovery, as (original, registered) pairs
    pub fn renames(&self) -> &[(String, String)] {
        &self.renames
    }

    /// Render the whole catalog as a numbered listing for prompts
    pub fn describe_tools(&self) -> String {
        if self.tools.is_empty() {
            return "(no tools available)".to_string();
        }
        self.tools
            .iter()
            .enumerate()
            .map(|(i, t)| t.descriptor.render(i + 1))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
