//! Tool metadata structures
//!
//! Descriptors are created once, at registration for local tools and at
//! discovery for remote tools. They are immutable afterwards except for
//! the rename-on-collision performed by the registry.

use serde::{Deserialize, Serialize};

/// Where a tool lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolOrigin {
    /// Registered in-process
    Local,

    /// Discovered from a remote endpoint
    Remote {
        /// Identifier of the serving endpoint
        endpoint: String,
    },
}

/// Statically declared parameter metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,

    /// Type label, e.g. `string`, `array`, `integer`
    pub param_type: String,

    /// Whether the parameter must be supplied
    pub required: bool,

    /// Default value when not supplied
    pub default: Option<serde_json::Value>,

    /// Human-readable description
    pub description: String,
}

impl ParamSpec {
    /// A required parameter
    pub fn required(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            required: true,
            default: None,
            description: description.into(),
        }
    }

    /// An optional parameter
    pub fn optional(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            required: false,
            default: None,
            description: description.into(),
        }
    }

    /// Attach a default value
    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }

    fn default_label(&self) -> String {
        match &self.default {
            Some(value) => value.to_string(),
            None if self.required => "required".to_string(),
            None => "optional".to_string(),
        }
    }
}

/// Metadata describing one invocable capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Display name, unique within a registry after collision resolution
    pub name: String,

    /// Where the tool is served from
    pub origin: ToolOrigin,

    /// What the tool does
    pub description: String,

    /// Declared parameters
    pub parameters: Vec<ParamSpec>,
}

impl ToolDescriptor {
    /// Render this descriptor as one numbered entry of a tool listing
    pub fn render(&self, index: usize) -> String {
        let origin = match &self.origin {
            ToolOrigin::Local => "local tool".to_string(),
            ToolOrigin::Remote { endpoint } => format!("remote tool (endpoint '{}')", endpoint),
        };

        let mut lines = vec![
            format!("{}. Tool name: {}", index, self.name),
            format!("   Origin: {}", origin),
            format!("   Description: {}", self.description),
            "   Parameters:".to_string(),
        ];

        if self.parameters.is_empty() {
            lines.push("   - (none)".to_string());
        }
        for param in &self.parameters {
            lines.push(format!(
                "   - {} (type: {}, default: {}): {}",
                param.name,
                param.param_type,
                param.default_label(),
                param.description
            ));
        }

        lines.join("\n")
    }
}
