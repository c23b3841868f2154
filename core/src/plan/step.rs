//! Plan step model and the wire format produced by structured extraction
//!
//! The model returns a plan document of modules containing steps plus a
//! flat `execution_order` of qualified step ids. Flattening produces the
//! executable sequence; ids listed in `execution_order` come first in that
//! order, and steps the ordering forgot are appended in document order so
//! no work is silently dropped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One executable unit of a compiled plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    /// Module display name
    pub module: String,

    /// Module identifier, e.g. `M1`
    pub module_id: String,

    /// Step identifier within the module, e.g. `S2`
    pub step_id: String,

    /// Qualified id, `module_id.step_id`
    pub full_step_id: String,

    /// Short step name
    pub name: String,

    /// What the step should accomplish
    pub content: String,

    /// Whether the step calls a tool
    pub uses_tool: bool,

    /// Registry name of the tool, when `uses_tool`
    pub tool: Option<String>,

    /// Arguments for the tool call
    pub parameters: Map<String, Value>,

    /// What output the step is expected to yield
    pub expected_output: String,

    /// Qualified ids of steps this one depends on
    pub depends_on: Vec<String>,
}

/// Structured plan as emitted by the model
#[derive(Debug, Deserialize)]
pub struct PlanDocument {
    #[serde(default)]
    pub overall_goal: String,

    #[serde(default)]
    pub modules: Vec<PlanModule>,

    #[serde(default)]
    pub execution_order: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlanModule {
    pub module_id: String,

    #[serde(default)]
    pub module_name: String,

    #[serde(default)]
    pub steps: Vec<RawPlanStep>,
}

#[derive(Debug, Deserialize)]
pub struct RawPlanStep {
    pub step_id: String,

    #[serde(default)]
    pub step_name: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub uses_tool: bool,

    #[serde(default)]
    pub tool: Option<String>,

    #[serde(default)]
    pub parameters: Map<String, Value>,

    #[serde(default)]
    pub expected_output: String,

    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl PlanDocument {
    /// Flatten modules into an ordered step list
    pub fn into_steps(self) -> Vec<PlanStep> {
        let mut steps: Vec<PlanStep> = Vec::new();
        for module in self.modules {
            for raw in module.steps {
                let full_step_id = format!("{}.{}", module.module_id, raw.step_id);
                steps.push(PlanStep {
                    module: module.module_name.clone(),
                    module_id: module.module_id.clone(),
                    step_id: raw.step_id,
                    full_step_id,
                    name: raw.step_name,
                    content: raw.content,
                    uses_tool: raw.uses_tool,
                    tool: raw.tool,
                    parameters: raw.parameters,
                    expected_output: raw.expected_output,
                    depends_on: raw.depends_on,
                });
            }
        }

        if self.execution_order.is_empty() {
            return steps;
        }

        let mut ordered = Vec::with_capacity(steps.len());
        for id in &self.execution_order {
            if let Some(pos) = steps.iter().position(|s| &s.full_step_id == id) {
                ordered.push(steps.remove(pos));
            }
        }
        // Steps the ordering missed still run, after the ordered ones.
        ordered.append(&mut steps);
        ordered
    }
}

/// Remove a surrounding Markdown code fence, if present
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        return trimmed;
    };
    without_open
        .trim_start()
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(execution_order: Vec<&str>) -> PlanDocument {
        serde_json::from_value(json!({
            "overall_goal": "Analyze the fund",
            "modules": [
                {
                    "module_id": "M1",
                    "module_name": "Data collection",
                    "steps": [
                        { "step_id": "S1", "step_name": "Fetch history", "uses_tool": true,
                          "tool": "fund_history", "parameters": { "symbol": "110011" } },
                        { "step_id": "S2", "step_name": "Fetch holdings" }
                    ]
                },
                {
                    "module_id": "M2",
                    "module_name": "Analysis",
                    "steps": [
                        { "step_id": "S1", "step_name": "Compute returns",
                          "depends_on": ["M1.S1"] }
                    ]
                }
            ],
            "execution_order": execution_order
        }))
        .unwrap()
    }

    #[test]
    fn test_into_steps_follows_execution_order() {
        let steps = document(vec!["M2.S1", "M1.S1", "M1.S2"]).into_steps();
        let ids: Vec<&str> = steps.iter().map(|s| s.full_step_id.as_str()).collect();
        assert_eq!(ids, vec!["M2.S1", "M1.S1", "M1.S2"]);
    }

    #[test]
    fn test_into_steps_appends_missing_ids() {
        let steps = document(vec!["M2.S1"]).into_steps();
        let ids: Vec<&str> = steps.iter().map(|s| s.full_step_id.as_str()).collect();
        assert_eq!(ids, vec!["M2.S1", "M1.S1", "M1.S2"]);
    }

    #[test]
    fn test_into_steps_without_order_keeps_document_order() {
        let steps = document(vec![]).into_steps();
        let ids: Vec<&str> = steps.iter().map(|s| s.full_step_id.as_str()).collect();
        assert_eq!(ids, vec!["M1.S1", "M1.S2", "M2.S1"]);
        assert_eq!(steps[0].module, "Data collection");
        assert!(steps[0].uses_tool);
        assert_eq!(steps[0].parameters["symbol"], json!("110011"));
    }

    #[test]
    fn test_unknown_order_ids_are_ignored() {
        let steps = document(vec!["M9.S9", "M1.S2"]).into_steps();
        let ids: Vec<&str> = steps.iter().map(|s| s.full_step_id.as_str()).collect();
        assert_eq!(ids, vec!["M1.S2", "M1.S1", "M2.S1"]);
    }

    #[test]
    fn test_schema_round_trip_preserves_order_and_deps() {
        let order = vec!["M1.S1", "M1.S2", "M2.S1"];
        let original = document(order.clone()).into_steps();

        // Rebuild the wire document from the flattened steps and re-parse.
        let mut modules: Vec<Value> = Vec::new();
        for step in &original {
            if !modules.iter().any(|m| m["module_id"] == step.module_id) {
                modules.push(json!({
                    "module_id": step.module_id,
                    "module_name": step.module,
                    "steps": []
                }));
            }
            let module = modules
                .iter_mut()
                .find(|m| m["module_id"] == step.module_id)
                .unwrap();
            module["steps"].as_array_mut().unwrap().push(json!({
                "step_id": step.step_id,
                "step_name": step.name,
                "content": step.content,
                "uses_tool": step.uses_tool,
                "tool": step.tool,
                "parameters": step.parameters,
                "expected_output": step.expected_output,
                "depends_on": step.depends_on,
            }));
        }
        let wire = json!({
            "overall_goal": "Analyze the fund",
            "modules": modules,
            "execution_order": order,
        });

        let reparsed: PlanDocument = serde_json::from_value(wire).unwrap();
        let round_tripped = reparsed.into_steps();

        assert_eq!(round_tripped.len(), original.len());
        for (a, b) in original.iter().zip(&round_tripped) {
            assert_eq!(a.full_step_id, b.full_step_id);
            assert_eq!(a.depends_on, b.depends_on);
            assert_eq!(a.tool, b.tool);
        }
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }
}
