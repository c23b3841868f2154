//! Step-at-a-time plan execution
//!
//! The executor owns the run state and advances exactly one step per tick,
//! so a host can interleave rendering, persistence or cancellation between
//! steps. A tool step is invoked, its output judged against the step's
//! expectation, and on a mismatch the step is adjusted and retried a
//! bounded number of times. Failures are isolated: a failed step is
//! recorded and the run moves on.

pub mod progress;
pub mod report;

pub use progress::{ProgressObserver, ProgressState};
pub use report::{ExecutionReport, StepStatus, ValidationVerdict};

use crate::llm::{GenerateRequest, TextGenerator};
use crate::plan::step::strip_code_fences;
use crate::plan::PlanStep;
use crate::tools::{ToolInvoker, ToolRegistry};
use std::sync::Arc;
use tracing::{info, warn};

/// Tuning knobs for a run
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// How many times a mismatching tool step may be adjusted and retried
    pub max_replan_attempts: u32,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            max_replan_attempts: 1,
        }
    }
}

/// What one step's execution produced, before finalization
struct StepRun {
    report: String,
    status: StepStatus,
    tool_output: Option<String>,
    validation: Option<ValidationVerdict>,
    /// The adjusted step, when a replan replaced the original in place
    replacement: Option<PlanStep>,
}

impl StepRun {
    fn completed(report: String) -> Self {
        Self {
            report,
            status: StepStatus::Completed,
            tool_output: None,
            validation: None,
            replacement: None,
        }
    }

    fn failed(report: String) -> Self {
        Self {
            report,
            status: StepStatus::Failed,
            tool_output: None,
            validation: None,
            replacement: None,
        }
    }
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// All steps have run
    Finished,

    /// One step ran
    Step { index: usize, status: StepStatus },
}

/// Drives a compiled plan one step at a time
pub struct StepExecutor<'a> {
    registry: &'a ToolRegistry,
    llm: Arc<dyn TextGenerator>,
    invoker: ToolInvoker,
    document_report: String,
    progress: ProgressState,
    options: ExecutorOptions,
}

impl<'a> StepExecutor<'a> {
    pub fn new(
        registry: &'a ToolRegistry,
        llm: Arc<dyn TextGenerator>,
        document_report: impl Into<String>,
        steps: Vec<PlanStep>,
        options: ExecutorOptions,
    ) -> Self {
        Self {
            registry,
            invoker: ToolInvoker::new(llm.clone()),
            llm,
            document_report: document_report.into(),
            progress: ProgressState::new(steps),
            options,
        }
    }

    /// Current run state
    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    /// Run the next pending step. Never fails the run as a whole; errors
    /// end up in the step's report with a `Failed` status.
    pub async fn tick(&mut self, observer: Option<&ProgressObserver>) -> TickOutcome {
        let index = self.progress.current_step();
        let total = self.progress.total_steps();
        let step = match self.progress.step(index) {
            Some(step) => step.clone(),
            None => return TickOutcome::Finished,
        };

        if let Some(observer) = observer {
            observer(&format!("Executing step: {}", step.name), index + 1, total);
        }
        info!(step = %step.full_step_id, name = %step.name, "Executing step");

        let run = self.run_step(&step).await;
        let status = run.status;

        if let Some(replacement) = run.replacement {
            self.progress.replace_step(index, replacement);
        }
        self.progress.finalize_step(
            index,
            ExecutionReport {
                step: index + 1,
                module: step.module.clone(),
                name: step.name.clone(),
                report: run.report,
                status,
                tool_output: run.tool_output,
                validation: run.validation,
            },
        );

        TickOutcome::Step { index, status }
    }

    async fn run_step(&self, step: &PlanStep) -> StepRun {
        let dep_context = self.dependency_context(step);

        if !step.uses_tool || step.tool.is_none() {
            return match self.narrate(step, None, &dep_context).await {
                Ok(text) => StepRun::completed(text),
                Err(e) => StepRun::failed(format!("Report generation failed: {}", e)),
            };
        }

        let tool_name = step.tool.clone().unwrap_or_default();
        let mut output = match self
            .invoker
            .invoke(self.registry, &tool_name, &step.parameters)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                warn!(step = %step.full_step_id, tool = %tool_name, error = %e, "Tool invocation failed");
                return StepRun::failed(format!(
                    "Tool '{}' invocation failed: {}",
                    tool_name, e
                ));
            }
        };

        let mut verdict = self.validate_output(step, &output).await;
        let mut attempts = 0u32;
        let mut replacement: Option<PlanStep> = None;
        while !verdict.matches && attempts < self.options.max_replan_attempts {
            attempts += 1;
            info!(step = %step.full_step_id, attempt = attempts, reason = %verdict.reason, "Adjusting step after mismatch");

            let prior = replacement.as_ref().unwrap_or(step);
            let adjusted = match self.replan_step(prior, &output, &verdict).await {
                Some(adjusted) => adjusted,
                None => break,
            };
            let adjusted_tool = match adjusted.tool.clone() {
                Some(tool) if adjusted.uses_tool => tool,
                _ => break,
            };
            match self
                .invoker
                .invoke(self.registry, &adjusted_tool, &adjusted.parameters)
                .await
            {
                Ok(new_output) => {
                    verdict = self.validate_output(&adjusted, &new_output).await;
                    output = new_output;
                    replacement = Some(adjusted);
                }
                Err(e) => {
                    // Keep the original output rather than losing the step.
                    warn!(step = %step.full_step_id, error = %e, "Adjusted invocation failed");
                    break;
                }
            }
        }

        let final_step = replacement.as_ref().unwrap_or(step);
        match self.narrate(final_step, Some(&output), &dep_context).await {
            Ok(text) => StepRun {
                report: text,
                status: StepStatus::Completed,
                tool_output: Some(output),
                validation: Some(verdict),
                replacement,
            },
            Err(e) => StepRun {
                report: format!("Report generation failed: {}", e),
                status: StepStatus::Failed,
                tool_output: Some(output),
                validation: Some(verdict),
                replacement,
            },
        }
    }

    /// Reports of the completed steps this one depends on
    fn dependency_context(&self, step: &PlanStep) -> String {
        if step.depends_on.is_empty() {
            return String::new();
        }

        let mut sections = Vec::new();
        for dep_id in &step.depends_on {
            let position = self
                .progress
                .steps()
                .iter()
                .position(|s| &s.full_step_id == dep_id);
            if let Some(position) = position {
                if let Some(report) = self.progress.reports().get(position) {
                    if report.status == StepStatus::Completed {
                        sections.push(format!("[{}] {}:\n{}", dep_id, report.name, report.report));
                    }
                }
            }
        }
        sections.join("\n\n")
    }

    async fn validate_output(&self, step: &PlanStep, output: &str) -> ValidationVerdict {
        let prompt = format!(
            "Judge whether the tool output below satisfies what the step \
             expected. Answer only with JSON of the form \
             {{\"matches\": true, \"reason\": \"...\", \"missing_info\": [\"...\"]}}.\n\n\
             Step: {}\n\
             Expected output: {}\n\n\
             Tool output:\n{}",
            step.content, step.expected_output, output
        );

        let response = match self.llm.generate(GenerateRequest::text(prompt)).await {
            Ok(response) => response,
            Err(e) => {
                return ValidationVerdict {
                    matches: false,
                    reason: format!("Validation call failed: {}", e),
                    missing_info: Vec::new(),
                }
            }
        };

        serde_json::from_str(strip_code_fences(&response)).unwrap_or_else(|e| ValidationVerdict {
            matches: false,
            reason: format!("Validation verdict was not valid JSON: {}", e),
            missing_info: Vec::new(),
        })
    }

    /// Ask the model for an adjusted version of a mismatching step.
    ///
    /// Identifiers are pinned to the original; the tool choice,
    /// parameters, content, expectation and dependencies may change.
    async fn replan_step(
        &self,
        step: &PlanStep,
        output: &str,
        verdict: &ValidationVerdict,
    ) -> Option<PlanStep> {
        let completed = self
            .progress
            .reports()
            .iter()
            .filter(|r| r.status == StepStatus::Completed)
            .map(|r| format!("Step {} ({}): {}", r.step, r.name, r.report))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "The step below ran a tool whose output did not meet the \
             expectation. Propose an adjusted step, changing the tool, its \
             parameters or the expectation as needed. Answer only with JSON \
             of the form {{\"step_name\": \"...\", \"content\": \"...\", \
             \"uses_tool\": true, \"tool\": \"...\", \"parameters\": {{}}, \
             \"expected_output\": \"...\", \"depends_on\": [\"...\"]}}.\n\n\
             Available tools:\n{}\n\n\
             Completed steps so far:\n{}\n\n\
             Step: {}\n\
             Expected output: {}\n\
             Mismatch reason: {}\n\
             Missing: {}\n\n\
             Tool output:\n{}",
            self.registry.describe_tools(),
            completed,
            step.content,
            step.expected_output,
            verdict.reason,
            verdict.missing_info.join("; "),
            output
        );

        let response = match self.llm.generate(GenerateRequest::text(prompt)).await {
            Ok(response) => response,
            Err(e) => {
                warn!(step = %step.full_step_id, error = %e, "Adjustment call failed");
                return None;
            }
        };

        #[derive(serde::Deserialize)]
        struct Adjusted {
            #[serde(default)]
            step_name: String,
            #[serde(default)]
            content: String,
            #[serde(default)]
            uses_tool: bool,
            #[serde(default)]
            tool: Option<String>,
            #[serde(default)]
            parameters: serde_json::Map<String, serde_json::Value>,
            #[serde(default)]
            expected_output: String,
            #[serde(default)]
            depends_on: Option<Vec<String>>,
        }

        let adjusted: Adjusted = match serde_json::from_str(strip_code_fences(&response)) {
            Ok(adjusted) => adjusted,
            Err(e) => {
                warn!(step = %step.full_step_id, error = %e, "Adjusted step was not valid JSON");
                return None;
            }
        };

        Some(PlanStep {
            module: step.module.clone(),
            module_id: step.module_id.clone(),
            step_id: step.step_id.clone(),
            full_step_id: step.full_step_id.clone(),
            name: if adjusted.step_name.is_empty() {
                step.name.clone()
            } else {
                adjusted.step_name
            },
            content: adjusted.content,
            uses_tool: adjusted.uses_tool,
            tool: adjusted.tool,
            parameters: adjusted.parameters,
            expected_output: adjusted.expected_output,
            depends_on: adjusted.depends_on.unwrap_or_else(|| step.depends_on.clone()),
        })
    }

    /// Write the narrative report section for one step
    async fn narrate(
        &self,
        step: &PlanStep,
        tool_output: Option<&str>,
        dep_context: &str,
    ) -> crate::error::Result<String> {
        let mut prompt = format!(
            "Write the report section for one analysis step. Be factual and \
             concise; use only the material provided.\n\n\
             Document analysis:\n{}\n\n\
             Step: {}\n\
             Goal of the step: {}",
            self.document_report, step.name, step.content
        );
        if !dep_context.is_empty() {
            prompt.push_str(&format!("\n\nResults of earlier steps:\n{}", dep_context));
        }
        if let Some(tool_output) = tool_output {
            prompt.push_str(&format!("\n\nTool output for this step:\n{}", tool_output));
        }

        self.llm.generate(GenerateRequest::text(prompt)).await
    }
}
