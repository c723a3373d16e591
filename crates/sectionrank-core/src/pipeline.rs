//! End-to-end run: corpus → intent ∥ scoring → selection → refinement → result.

use std::sync::Arc;

use chrono::Local;

use crate::assemble::{assemble, format_timestamp, RunResult};
use crate::config::Settings;
use crate::corpus::{build_corpus, DocumentPages};
use crate::embeddings::Encoder;
use crate::error::PipelineResult;
use crate::intent::{encode_intent, Query};
use crate::refine::refine_sections;
use crate::scoring::{embed_units, score_units};
use crate::selection::select_sections;

/// Everything one run needs besides the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub persona: String,
    pub task: String,
    /// Names reported in metadata, including documents that yielded no pages
    pub input_documents: Vec<String>,
    pub documents: Vec<DocumentPages>,
}

impl RunRequest {
    /// Request whose metadata lists exactly the given documents
    pub fn new(persona: impl Into<String>, task: impl Into<String>, documents: Vec<DocumentPages>) -> Self {
        Self {
            persona: persona.into(),
            task: task.into(),
            input_documents: documents.iter().map(|d| d.document_id.clone()).collect(),
            documents,
        }
    }
}

/// The ranking pipeline, holding the shared model handle
pub struct Pipeline {
    encoder: Arc<dyn Encoder>,
    settings: Settings,
}

impl Pipeline {
    /// Create a pipeline. Settings are validated here so a bad value fails
    /// before any document is touched.
    pub fn new(encoder: Arc<dyn Encoder>, settings: Settings) -> PipelineResult<Self> {
        let settings = settings.validate()?;
        Ok(Self { encoder, settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run and stamp the result with the current local time
    pub async fn run(&self, request: &RunRequest) -> PipelineResult<RunResult> {
        self.run_at(request, format_timestamp(&Local::now())).await
    }

    /// Run with a fixed timestamp. Identical inputs give identical results.
    pub async fn run_at(
        &self,
        request: &RunRequest,
        processing_timestamp: String,
    ) -> PipelineResult<RunResult> {
        let start = std::time::Instant::now();

        let units = build_corpus(&request.documents)?;
        let query = Query::new(request.persona.as_str(), request.task.as_str());

        tracing::info!(
            documents = request.documents.len(),
            pages = units.len(),
            "Ranking pages for query: {}",
            query.text()
        );

        let (query_vector, embeddings) = tokio::join!(
            encode_intent(self.encoder.clone(), &query),
            embed_units(self.encoder.clone(), &units, &self.settings),
        );
        let query_vector = query_vector?;

        let scored = score_units(&query_vector, units, embeddings);
        let selected = select_sections(scored, self.settings.pool_size, self.settings.top_n);
        let refined = refine_sections(selected);

        let result = assemble(
            request.input_documents.clone(),
            &request.persona,
            &request.task,
            processing_timestamp,
            &refined,
        );

        tracing::info!(
            sections = result.extracted_sections.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Run complete"
        );

        Ok(result)
    }
}
