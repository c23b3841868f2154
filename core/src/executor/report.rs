//! Per-step execution records

use serde::{Deserialize, Serialize};

/// Terminal status of one executed step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Failed,
}

/// Verdict of judging tool output against a step's expectation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// Whether the output satisfies the expectation
    pub matches: bool,

    /// Short justification
    #[serde(default)]
    pub reason: String,

    /// What is missing when `matches` is false
    #[serde(default)]
    pub missing_info: Vec<String>,
}

/// Finalized record for one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// 1-based position in the execution sequence
    pub step: usize,

    /// Module display name
    pub module: String,

    /// Step name
    pub name: String,

    /// Narrative report for this step, or the failure description
    pub report: String,

    /// How the step ended
    pub status: StepStatus,

    /// Condensed tool output, when the step called a tool
    pub tool_output: Option<String>,

    /// Validation verdict, when the step called a tool
    pub validation: Option<ValidationVerdict>,
}
