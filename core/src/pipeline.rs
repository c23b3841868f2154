//! End-to-end report pipeline
//!
//! Ties the stages together: document analysis, plan compilation, step
//! execution and the final synthesis report. The pipeline owns the tool
//! registry and tracks which stage a run is in.

use crate::error::Result;
use crate::executor::{
    ExecutionReport, ExecutorOptions, ProgressObserver, StepExecutor, TickOutcome,
};
use crate::llm::{GenerateRequest, ImageData, TextGenerator};
use crate::plan::PlanCompiler;
use crate::tools::ToolRegistry;
use std::sync::Arc;
use tracing::info;

/// Where a pipeline run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Initial,
    DocumentAnalysis,
    PlanGeneration,
    PlanExecution,
    FinalReport,
}

/// Source material for document analysis
pub enum DocumentSource {
    /// Plain document text
    Text(String),

    /// A scanned page or chart image
    Image(ImageData),
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub plan_text: String,
    pub overall_goal: String,
    pub reports: Vec<ExecutionReport>,
    pub final_report: String,
}

/// Orchestrates a full document-to-report run
pub struct ReportPipeline {
    run_id: uuid::Uuid,
    llm: Arc<dyn TextGenerator>,
    registry: ToolRegistry,
    options: ExecutorOptions,
    stage: PipelineStage,
}

impl ReportPipeline {
    pub fn new(llm: Arc<dyn TextGenerator>, registry: ToolRegistry, options: ExecutorOptions) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4(),
            llm,
            registry,
            options,
            stage: PipelineStage::Initial,
        }
    }

    /// Identifier of this run, stable across its stages
    pub fn run_id(&self) -> uuid::Uuid {
        self.run_id
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Produce the document report the rest of the pipeline reasons over
    pub async fn analyze_document(&mut self, source: DocumentSource) -> Result<String> {
        self.stage = PipelineStage::DocumentAnalysis;

        let instruction = "Analyze the document and write a structured report of \
             its contents: what it is about, the entities and identifiers it \
             names, every concrete figure and date, and any questions it \
             raises that need external data to answer.";

        let request = match source {
            DocumentSource::Text(text) => {
                GenerateRequest::text(format!("{}\n\nDocument:\n{}", instruction, text))
            }
            DocumentSource::Image(image) => {
                GenerateRequest::text(instruction.to_string()).with_image(image)
            }
        };

        let report = self.llm.generate(request).await?;
        info!(chars = report.len(), "Document analysis complete");
        Ok(report)
    }

    /// Compile a plan from the document report and run it to completion
    pub async fn run(
        &mut self,
        document_report: &str,
        modules: &str,
        observer: Option<&ProgressObserver>,
    ) -> Result<PipelineResult> {
        self.stage = PipelineStage::PlanGeneration;
        info!(run_id = %self.run_id, "Starting pipeline run");
        let compiler = PlanCompiler::new(self.llm.clone());
        let plan = compiler
            .compile(document_report, modules, &self.registry.describe_tools())
            .await?;

        self.stage = PipelineStage::PlanExecution;
        let mut executor = StepExecutor::new(
            &self.registry,
            self.llm.clone(),
            document_report,
            plan.steps,
            self.options.clone(),
        );
        while executor.tick(observer).await != TickOutcome::Finished {}
        let reports = executor.progress().reports().to_vec();

        self.stage = PipelineStage::FinalReport;
        let final_report = self
            .synthesize(&plan.overall_goal, document_report, &reports)
            .await?;

        Ok(PipelineResult {
            plan_text: plan.plan_text,
            overall_goal: plan.overall_goal,
            reports,
            final_report,
        })
    }

    /// Merge the step reports into one coherent final report
    async fn synthesize(
        &self,
        overall_goal: &str,
        document_report: &str,
        reports: &[ExecutionReport],
    ) -> Result<String> {
        let sections = reports
            .iter()
            .map(|r| format!("## Step {} ({}): {}\n{}", r.step, r.module, r.name, r.report))
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "Write the final report for this analysis. Merge the step reports \
             below into one coherent document with a short executive summary, \
             keeping every concrete figure. Note explicitly where a step \
             failed and its findings are missing.\n\n\
             Goal: {}\n\n\
             Document analysis:\n{}\n\n\
             Step reports:\n{}",
            overall_goal, document_report, sections
        );

        self.llm.generate(GenerateRequest::text(prompt)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockTextGenerator;
    use serde_json::json;

    fn plan_json() -> String {
        json!({
            "overall_goal": "Assess the fund",
            "modules": [{
                "module_id": "M1",
                "module_name": "Analysis",
                "steps": [
                    { "step_id": "S1", "step_name": "Reason", "content": "reason over the document" }
                ]
            }],
            "execution_order": ["M1.S1"]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_full_run_stages_and_result() {
        // Plan text, structured plan, one narrative, final synthesis.
        let llm = Arc::new(MockTextGenerator::new(vec![
            "Step 1: reason.".to_string(),
            plan_json(),
            "step section".to_string(),
            "final report".to_string(),
        ]));

        let mut pipeline =
            ReportPipeline::new(llm, ToolRegistry::new(), ExecutorOptions::default());
        assert_eq!(pipeline.stage(), PipelineStage::Initial);

        let result = pipeline.run("doc report", "Analysis", None).await.unwrap();
        assert_eq!(pipeline.stage(), PipelineStage::FinalReport);
        assert_eq!(result.overall_goal, "Assess the fund");
        assert_eq!(result.reports.len(), 1);
        assert_eq!(result.final_report, "final report");
        assert_eq!(result.plan_text, "Step 1: reason.");
    }

    #[tokio::test]
    async fn test_analyze_document_text() {
        let llm = Arc::new(MockTextGenerator::new(vec!["doc report".to_string()]));
        let mut pipeline = ReportPipeline::new(
            llm.clone(),
            ToolRegistry::new(),
            ExecutorOptions::default(),
        );

        let report = pipeline
            .analyze_document(DocumentSource::Text("annual statement".to_string()))
            .await
            .unwrap();
        assert_eq!(report, "doc report");
        assert_eq!(pipeline.stage(), PipelineStage::DocumentAnalysis);
        assert!(llm.prompts()[0].contains("annual statement"));
    }
}
