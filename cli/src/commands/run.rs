//! Full pipeline run: analyze a document, plan, execute, report

use anyhow::{Context, Result};
use docpipe_core::config::{load_endpoints, LlmConfig};
use docpipe_core::executor::ExecutorOptions;
use docpipe_core::llm::{ImageData, OpenAiCompatClient};
use docpipe_core::pipeline::{DocumentSource, ReportPipeline};
use docpipe_core::tools::ToolRegistry;
use std::path::Path;
use std::sync::Arc;

#[allow(clippy::too_many_arguments)]
pub async fn run_command(
    config: &Path,
    api_key: Option<&str>,
    base_url: &str,
    model: &str,
    document: &Path,
    modules: &str,
    output: Option<&Path>,
    max_replans: u32,
) -> Result<()> {
    let api_key =
        api_key.context("No API key provided; pass --api-key or set DOCPIPE_API_KEY")?;
    let llm_config = LlmConfig::new(base_url, api_key, model);
    llm_config.validate()?;
    let llm = Arc::new(OpenAiCompatClient::new(&llm_config)?);

    let endpoints = load_endpoints(config).await;
    let mut registry = ToolRegistry::new();
    let outcomes = registry.discover_all(&endpoints).await;
    for outcome in &outcomes {
        if outcome.success {
            println!(
                "Endpoint '{}': {} tool(s) available",
                outcome.endpoint, outcome.tool_count
            );
        } else {
            println!(
                "Endpoint '{}' unreachable: {}",
                outcome.endpoint,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    let source = load_document(document).await?;
    tracing::info!(
        document = %document.display(),
        tools = registry.len(),
        "Starting report run"
    );
    let mut pipeline = ReportPipeline::new(
        llm,
        registry,
        ExecutorOptions {
            max_replan_attempts: max_replans,
        },
    );

    println!("Analyzing document {}...", document.display());
    let document_report = pipeline.analyze_document(source).await?;

    let observer = |message: &str, current: usize, total: usize| {
        println!("[{}/{}] {}", current, total, message);
    };
    let result = pipeline.run(&document_report, modules, Some(&observer)).await?;

    match output {
        Some(path) => {
            tokio::fs::write(path, &result.final_report)
                .await
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => {
            println!("\n{}", result.final_report);
        }
    }

    Ok(())
}

/// Read the document, treating common image extensions as image input
async fn load_document(path: &Path) -> Result<DocumentSource> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let source = match extension.as_deref() {
        Some("png") | Some("jpg") | Some("jpeg") => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read document {}", path.display()))?;
            let mime = if extension.as_deref() == Some("png") {
                "image/png"
            } else {
                "image/jpeg"
            };
            DocumentSource::Image(ImageData::from_bytes(&bytes, mime))
        }
        _ => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read document {}", path.display()))?;
            DocumentSource::Text(text)
        }
    };
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_document_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.txt");
        tokio::fs::write(&path, "annual statement").await.unwrap();

        match load_document(&path).await.unwrap() {
            DocumentSource::Text(text) => assert_eq!(text, "annual statement"),
            DocumentSource::Image(_) => panic!("expected text source"),
        }
    }

    #[tokio::test]
    async fn test_load_document_image_by_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.PNG");
        tokio::fs::write(&path, b"not really a png").await.unwrap();

        match load_document(&path).await.unwrap() {
            DocumentSource::Image(image) => assert_eq!(image.mime_type, "image/png"),
            DocumentSource::Text(_) => panic!("expected image source"),
        }
    }

    #[tokio::test]
    async fn test_load_document_missing_file() {
        let dir = tempdir().unwrap();
        assert!(load_document(&dir.path().join("nope.txt")).await.is_err());
    }
}
