//! Two-phase plan compilation
//!
//! Phase one asks the model for a free-form analysis plan grounded on the
//! document report and the tool catalog. Phase two asks it to restate that
//! plan as a strict JSON document, which is parsed into executable steps.
//! A malformed document is a hard error; there is no repair loop, the
//! caller decides whether to compile again.

use crate::error::{PlanError, Result};
use crate::llm::{GenerateRequest, TextGenerator};
use crate::plan::step::{strip_code_fences, PlanDocument, PlanStep};
use std::sync::Arc;
use tracing::{debug, info};

/// A parsed, dependency-ordered plan
#[derive(Debug, Clone)]
pub struct CompiledPlan {
    /// The free-form plan text the steps were extracted from
    pub plan_text: String,

    /// One-sentence goal of the whole plan
    pub overall_goal: String,

    /// Steps in execution order
    pub steps: Vec<PlanStep>,
}

/// Turns a document report into an executable plan
pub struct PlanCompiler {
    llm: Arc<dyn TextGenerator>,
}

impl PlanCompiler {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    /// Generate the free-form plan text
    pub async fn generate_plan(
        &self,
        document_report: &str,
        modules: &str,
        tools_description: &str,
    ) -> Result<String> {
        let today = chrono::Local::now().format("%Y-%m-%d");
        let prompt = format!(
            "Today's date is {today}.\n\n\
             You are planning an analysis that produces a written report. \
             Based on the document analysis below, produce a step-by-step plan \
             organized into the requested modules. For any step that needs \
             external data, pick exactly one tool from the catalog and state \
             its parameters; steps that only reason over earlier results must \
             not name a tool. State the dependencies between steps.\n\n\
             Requested modules:\n{modules}\n\n\
             Available tools:\n{tools_description}\n\n\
             Document analysis:\n{document_report}"
        );

        let plan = self.llm.generate(GenerateRequest::text(prompt)).await?;
        info!(chars = plan.len(), "Generated analysis plan");
        Ok(plan)
    }

    /// Extract structured steps from free-form plan text.
    ///
    /// Returns the overall goal and the steps in execution order.
    pub async fn extract_steps(&self, plan_text: &str) -> Result<(String, Vec<PlanStep>)> {
        let prompt = format!(
            "Convert the analysis plan below into JSON with exactly this shape, \
             and output nothing but the JSON:\n\
             {{\n\
             \x20 \"overall_goal\": \"...\",\n\
             \x20 \"modules\": [\n\
             \x20   {{\n\
             \x20     \"module_id\": \"M1\",\n\
             \x20     \"module_name\": \"...\",\n\
             \x20     \"steps\": [\n\
             \x20       {{\n\
             \x20         \"step_id\": \"S1\",\n\
             \x20         \"step_name\": \"...\",\n\
             \x20         \"content\": \"what this step does\",\n\
             \x20         \"uses_tool\": true,\n\
             \x20         \"tool\": \"tool name or null\",\n\
             \x20         \"parameters\": {{}},\n\
             \x20         \"expected_output\": \"...\",\n\
             \x20         \"depends_on\": [\"M1.S1\"]\n\
             \x20       }}\n\
             \x20     ]\n\
             \x20   }}\n\
             \x20 ],\n\
             \x20 \"execution_order\": [\"M1.S1\", \"M1.S2\"]\n\
             }}\n\n\
             Rules: step ids restart at S1 inside each module; entries in \
             depends_on and execution_order use the qualified \
             \"module_id.step_id\" form; execution_order lists every step \
             and respects depends_on.\n\n\
             Plan:\n{plan_text}"
        );

        let response = self.llm.generate(GenerateRequest::text(prompt)).await?;
        let json_text = strip_code_fences(&response);
        debug!(chars = json_text.len(), "Parsing structured plan");

        let document: PlanDocument =
            serde_json::from_str(json_text).map_err(|e| PlanError::Parse {
                message: format!("Structured plan is not valid JSON: {}", e),
            })?;

        let overall_goal = document.overall_goal.clone();
        let steps = document.into_steps();
        if steps.is_empty() {
            return Err(PlanError::EmptyPlan.into());
        }

        info!(steps = steps.len(), "Extracted executable steps");
        Ok((overall_goal, steps))
    }

    /// Generate and extract in one pass
    pub async fn compile(
        &self,
        document_report: &str,
        modules: &str,
        tools_description: &str,
    ) -> Result<CompiledPlan> {
        let plan_text = self
            .generate_plan(document_report, modules, tools_description)
            .await?;
        let (overall_goal, steps) = self.extract_steps(&plan_text).await?;
        Ok(CompiledPlan {
            plan_text,
            overall_goal,
            steps,
        })
    }
}
