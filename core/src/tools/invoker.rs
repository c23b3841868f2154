//! Failover-aware tool invocation
//!
//! Resolves a registry name to its binding, dispatches the call, and for
//! remote tools retries alternative endpoints sequentially when the bound
//! one fails. Successful raw remote output is condensed by the model before
//! it flows into step execution; a summarizer failure falls back to the raw
//! text, and failure descriptions are never summarized.

use crate::error::{Result, ToolError};
use crate::llm::{GenerateRequest, TextGenerator};
use crate::tools::local::filter_args;
use crate::tools::registry::{ToolBinding, ToolRegistry};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Strip an endpoint qualifier appended on collision, keeping everything
/// before the first `@`.
fn strip_endpoint_suffix(name: &str) -> &str {
    name.split('@').next().unwrap_or(name)
}

/// Dispatches tool calls through a registry
pub struct ToolInvoker {
    llm: Arc<dyn TextGenerator>,
}

impl ToolInvoker {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    /// Invoke a registered tool by name.
    ///
    /// Returns `Ok` with usable text whenever a result was produced, even
    /// if every endpoint failed; in that case the text describes the
    /// failure so the caller can validate and replan against it. Only an
    /// unknown name or a local execution error is an `Err`.
    pub async fn invoke(
        &self,
        registry: &ToolRegistry,
        tool_name: &str,
        parameters: &Map<String, Value>,
    ) -> Result<String> {
        let entry = registry.get(tool_name).ok_or_else(|| ToolError::NotFound {
            name: tool_name.to_string(),
        })?;

        match &entry.binding {
            ToolBinding::Local(tool) => {
                debug!(tool = tool_name, "Invoking local tool");
                let args = filter_args(tool.as_ref(), parameters);
                tool.call(args).await.map_err(|e| {
                    ToolError::ExecutionFailed {
                        name: tool_name.to_string(),
                        message: e.to_string(),
                    }
                    .into()
                })
            }
            ToolBinding::Remote { endpoint } => {
                self.invoke_remote(registry, tool_name, endpoint, parameters)
                    .await
            }
        }
    }

    async fn invoke_remote(
        &self,
        registry: &ToolRegistry,
        tool_name: &str,
        bound_endpoint: &str,
        parameters: &Map<String, Value>,
    ) -> Result<String> {
        let remote_name = strip_endpoint_suffix(tool_name);
        let arguments = Value::Object(parameters.clone());

        let endpoint = registry
            .endpoint(bound_endpoint)
            .ok_or_else(|| ToolError::Endpoint {
                endpoint: bound_endpoint.to_string(),
                message: "Bound endpoint is not available".to_string(),
            })?;

        debug!(tool = tool_name, endpoint = bound_endpoint, "Invoking remote tool");
        let original_error = match endpoint.call_tool(remote_name, &arguments).await {
            Ok(output) => return Ok(self.summarize(tool_name, &output).await),
            Err(e) => e.to_string(),
        };

        warn!(
            tool = tool_name,
            endpoint = bound_endpoint,
            error = %original_error,
            "Remote call failed, trying alternative endpoints"
        );

        // Alternatives in discovery order, skipping the endpoint that
        // already failed.
        let alternatives: Vec<&str> = registry
            .available_endpoints()
            .iter()
            .map(|s| s.as_str())
            .filter(|id| *id != bound_endpoint)
            .collect();

        let mut attempts = 1usize;
        for alt_id in &alternatives {
            let alt = match registry.endpoint(alt_id) {
                Some(alt) => alt,
                None => continue,
            };
            attempts += 1;
            match alt.call_tool(remote_name, &arguments).await {
                Ok(output) => {
                    // Summarize the raw result only; the annotation stays
                    // verbatim so the serving endpoint and the original
                    // error survive.
                    let summary = self.summarize(tool_name, &output).await;
                    return Ok(format!(
                        "[Served by alternative endpoint '{}' after '{}' failed: {}]\n{}",
                        alt_id, bound_endpoint, original_error, summary
                    ));
                }
                Err(e) => {
                    warn!(tool = tool_name, endpoint = alt_id, error = %e, "Alternative endpoint failed");
                }
            }
        }

        Ok(format!(
            "Tool '{}' failed on every available endpoint after {} attempts. Original error: {}",
            tool_name, attempts, original_error
        ))
    }

    /// Condense raw tool output into the facts a report step needs
    async fn summarize(&self, tool_name: &str, raw_output: &str) -> String {
        let prompt = format!(
            "The tool '{}' returned the raw output below. Summarize it into the \
             key facts and figures, preserving every concrete number, date and \
             identifier. Do not add commentary or interpretation.\n\n\
             Raw output:\n{}",
            tool_name, raw_output
        );

        match self.llm.generate(GenerateRequest::text(prompt)).await {
            Ok(summary) if !summary.trim().is_empty() => summary,
            Ok(_) => raw_output.to_string(),
            Err(e) => {
                warn!(tool = tool_name, error = %e, "Summarization failed, returning raw output");
                raw_output.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;
    use crate::llm::mock::MockTextGenerator;
    use crate::tools::descriptor::ParamSpec;
    use crate::tools::local::LocalTool;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_strip_endpoint_suffix() {
        assert_eq!(strip_endpoint_suffix("quote@beta"), "quote");
        assert_eq!(strip_endpoint_suffix("quote"), "quote");
        assert_eq!(strip_endpoint_suffix("a@b@c"), "a");
    }

    struct UpperTool;

    #[async_trait]
    impl LocalTool for UpperTool {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercase text"
        }

        fn parameters(&self) -> Vec<ParamSpec> {
            vec![ParamSpec::required("text", "string", "Input text")]
        }

        async fn call(&self, args: Map<String, Value>) -> crate::error::Result<String> {
            Ok(args
                .get("text")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_uppercase())
        }
    }

    async fn spawn_rpc_server(results: Vec<Value>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for result in results {
                let (mut stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                let mut buf = vec![0u8; 65536];
                let _ = stream.read(&mut buf).await;
                let body =
                    serde_json::to_string(&json!({ "jsonrpc": "2.0", "id": 1, "result": result }))
                        .unwrap();
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });

        format!("http://{}", addr)
    }

    fn listing(names: &[&str]) -> Value {
        json!({
            "tools": names
                .iter()
                .map(|n| json!({
                    "name": n,
                    "description": format!("{} tool", n),
                    "inputSchema": { "type": "object", "properties": {} }
                }))
                .collect::<Vec<_>>()
        })
    }

    fn call_result(text: &str) -> Value {
        json!({ "content": [{ "type": "text", "text": text }] })
    }

    #[tokio::test]
    async fn test_local_invocation_skips_summarization() {
        let mut registry = ToolRegistry::new();
        registry.register_local(Arc::new(UpperTool)).unwrap();

        // Mock has no scripted responses, so any generate call would fail.
        let invoker = ToolInvoker::new(Arc::new(MockTextGenerator::new(vec![])));

        let mut params = Map::new();
        params.insert("text".to_string(), json!("hi"));
        let output = invoker.invoke(&registry, "upper", &params).await.unwrap();
        assert_eq!(output, "HI");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error() {
        let registry = ToolRegistry::new();
        let invoker = ToolInvoker::new(Arc::new(MockTextGenerator::new(vec![])));

        let err = invoker
            .invoke(&registry, "missing", &Map::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[tokio::test]
    async fn test_remote_output_is_summarized() {
        // First connection answers tools/list, second answers tools/call.
        let url = spawn_rpc_server(vec![
            listing(&["fund_history"]),
            call_result("nav 1.234 on 2026-08-01"),
        ])
        .await;

        let mut registry = ToolRegistry::new();
        registry
            .discover_all(&[EndpointConfig {
                name: "market".to_string(),
                url,
            }])
            .await;

        let invoker = ToolInvoker::new(Arc::new(MockTextGenerator::new(vec![
            "NAV was 1.234 on 2026-08-01".to_string(),
        ])));

        let output = invoker
            .invoke(&registry, "fund_history", &Map::new())
            .await
            .unwrap();
        assert_eq!(output, "NAV was 1.234 on 2026-08-01");
    }

    #[tokio::test]
    async fn test_summarizer_failure_returns_raw_output() {
        let url = spawn_rpc_server(vec![listing(&["quote"]), call_result("raw quote data")]).await;

        let mut registry = ToolRegistry::new();
        registry
            .discover_all(&[EndpointConfig {
                name: "market".to_string(),
                url,
            }])
            .await;

        // Empty script: the summarization call errors out.
        let invoker = ToolInvoker::new(Arc::new(MockTextGenerator::new(vec![])));

        let output = invoker.invoke(&registry, "quote", &Map::new()).await.unwrap();
        assert_eq!(output, "raw quote data");
    }

    #[tokio::test]
    async fn test_failover_annotation_survives_summarization() {
        // Bound endpoint serves only the listing; its tools/call connection
        // is never accepted, so the call fails and fails over.
        let url_bound = spawn_rpc_server(vec![listing(&["quote"])]).await;
        let url_alt = spawn_rpc_server(vec![listing(&["other"]), call_result("alt data")]).await;

        let mut registry = ToolRegistry::new();
        registry
            .discover_all(&[
                EndpointConfig {
                    name: "primary".to_string(),
                    url: url_bound,
                },
                EndpointConfig {
                    name: "backup".to_string(),
                    url: url_alt,
                },
            ])
            .await;

        // The summarizer rewrites the raw result; the annotation must not
        // pass through it.
        let invoker = ToolInvoker::new(Arc::new(MockTextGenerator::new(vec![
            "condensed alt data".to_string(),
        ])));
        let output = invoker.invoke(&registry, "quote", &Map::new()).await.unwrap();

        assert!(output.contains("condensed alt data"));
        assert!(output.contains("alternative endpoint 'backup'"));
        assert!(output.contains("'primary' failed"));
    }

    #[tokio::test]
    async fn test_all_endpoints_failing_yields_composite_message() {
        let url = spawn_rpc_server(vec![listing(&["quote"])]).await;

        let mut registry = ToolRegistry::new();
        registry
            .discover_all(&[EndpointConfig {
                name: "primary".to_string(),
                url,
            }])
            .await;

        // A scripted summary that must never replace the failure text.
        let llm = Arc::new(MockTextGenerator::new(vec![
            "Summary: nothing notable.".to_string(),
        ]));
        let invoker = ToolInvoker::new(llm.clone());
        let output = invoker.invoke(&registry, "quote", &Map::new()).await.unwrap();

        assert!(output.contains("failed on every available endpoint"));
        assert!(output.contains("after 1 attempts"));
        assert!(output.contains("Original error"));
        assert!(!output.contains("nothing notable"));
        // The summarizer was never consulted for a failure.
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_composite_error_counts_all_alternate_attempts() {
        // Both endpoints answer discovery, then refuse every tools/call.
        let url_bound = spawn_rpc_server(vec![listing(&["quote"])]).await;
        let url_alt = spawn_rpc_server(vec![listing(&["other"])]).await;

        let mut registry = ToolRegistry::new();
        registry
            .discover_all(&[
                EndpointConfig {
                    name: "primary".to_string(),
                    url: url_bound,
                },
                EndpointConfig {
                    name: "backup".to_string(),
                    url: url_alt,
                },
            ])
            .await;

        let invoker = ToolInvoker::new(Arc::new(MockTextGenerator::new(vec![])));
        let output = invoker.invoke(&registry, "quote", &Map::new()).await.unwrap();

        assert!(output.contains("failed on every available endpoint"));
        assert!(output.contains("after 2 attempts"));
        assert!(output.contains("Original error"));
    }
}
