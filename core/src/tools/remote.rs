//! Remote tool endpoint client
//!
//! Endpoints speak JSON-RPC 2.0 over HTTP POST and expose two methods:
//! `tools/list` and `tools/call`. The tool-result envelope carries a
//! `content` array whose first text block is the raw output.

use crate::config::EndpointConfig;
use crate::error::{Result, ToolError};
use crate::tools::descriptor::ParamSpec;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// Tool metadata as reported by a remote endpoint
#[derive(Debug, Clone)]
pub struct RemoteToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Client bound to one remote endpoint
#[derive(Debug)]
pub struct RemoteEndpoint {
    id: String,
    url: String,
    client: reqwest::Client,
    request_id: AtomicU64,
}

impl RemoteEndpoint {
    pub fn new(config: &EndpointConfig) -> Self {
        Self {
            id: config.name.clone(),
            url: config.url.clone(),
            client: reqwest::Client::new(),
            request_id: AtomicU64::new(0),
        }
    }

    /// Endpoint identifier from configuration
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Configured URL
    pub fn url(&self) -> &str {
        &self.url
    }

    fn next_request_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn endpoint_error(&self, message: impl Into<String>) -> ToolError {
        ToolError::Endpoint {
            endpoint: self.id.clone(),
            message: message.into(),
        }
    }

    /// Send a JSON-RPC request and unwrap the result envelope
    async fn send_request(&self, method: &str, params: Value) -> Result<Value> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": self.next_request_id(),
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.endpoint_error(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(self
                .endpoint_error(format!("HTTP status {} from {}", status, self.url))
                .into());
        }

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| self.endpoint_error(format!("Invalid JSON-RPC response: {}", e)))?;

        if let Some(error) = envelope.get("error") {
            return Err(self.endpoint_error(format!("RPC error: {}", error)).into());
        }

        match envelope.get("result") {
            Some(result) => Ok(result.clone()),
            None => Err(self.endpoint_error("No result in RPC response").into()),
        }
    }

    /// List tools exposed by this endpoint. An empty list is not an error.
    pub async fn list_tools(&self) -> Result<Vec<RemoteToolInfo>> {
        let result = self.send_request("tools/list", json!({})).await?;

        let tools = result
            .get("tools")
            .and_then(|t| t.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(tools
            .iter()
            .filter_map(|tool| {
                let name = tool.get("name")?.as_str()?.to_string();
                let description = tool
                    .get("description")
                    .and_then(|d| d.as_str())
                    .unwrap_or("")
                    .trim()
                    .to_string();
                let input_schema = tool.get("inputSchema").cloned().unwrap_or(json!({}));
                Some(RemoteToolInfo {
                    name,
                    description,
                    input_schema,
                })
            })
            .collect())
    }

    /// Call a tool by its remote (unsuffixed) name, returning raw text
    pub async fn call_tool(&self, tool_name: &str, arguments: &Value) -> Result<String> {
        let result = self
            .send_request(
                "tools/call",
                json!({ "name": tool_name, "arguments": arguments }),
            )
            .await?;

        // Text of the first content block; anything else is serialized as-is.
        let text = result
            .get("content")
            .and_then(|c| c.as_array())
            .and_then(|blocks| blocks.first())
            .and_then(|block| block.get("text"))
            .and_then(|t| t.as_str())
            .map(|t| t.to_string());

        match text {
            Some(text) if !text.is_empty() => Ok(text),
            Some(_) => Ok(format!(
                "Tool '{}' executed successfully but returned no output",
                tool_name
            )),
            None => Ok(serde_json::to_string_pretty(&result).unwrap_or_default()),
        }
    }
}

/// Convert a JSON-Schema `inputSchema` into declared parameter specs
pub fn params_from_schema(schema: &Value) -> Vec<ParamSpec> {
    let properties = match schema.get("properties").and_then(|p| p.as_object()) {
        Some(properties) => properties,
        None => return Vec::new(),
    };

    let required: Vec<&str> = schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    properties
        .iter()
        .map(|(name, details)| {
            let param_type = details
                .get("type")
                .and_then(|t| t.as_str())
                .unwrap_or("unspecified")
                .to_string();
            let description = details
                .get("description")
                .and_then(|d| d.as_str())
                .unwrap_or("")
                .to_string();
            let mut spec = if required.contains(&name.as_str()) {
                ParamSpec::required(name, param_type, description)
            } else {
                ParamSpec::optional(name, param_type, description)
            };
            if let Some(default) = details.get("default") {
                spec = spec.with_default(default.clone());
            }
            spec
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_from_schema() {
        let schema = json!({
            "type": "object",
            "properties": {
                "symbol": { "type": "string", "description": "Ticker symbol" },
                "period": { "type": "string", "default": "1y" }
            },
            "required": ["symbol"]
        });

        let params = params_from_schema(&schema);
        assert_eq!(params.len(), 2);

        let symbol = params.iter().find(|p| p.name == "symbol").unwrap();
        assert!(symbol.required);
        assert_eq!(symbol.param_type, "string");

        let period = params.iter().find(|p| p.name == "period").unwrap();
        assert!(!period.required);
        assert_eq!(period.default, Some(json!("1y")));
    }

    #[test]
    fn test_params_from_empty_schema() {
        assert!(params_from_schema(&json!({})).is_empty());
    }
}
