//! Intent encoding: persona + task into a single query vector.

use std::sync::Arc;

use crate::embeddings::Encoder;
use crate::error::{PipelineError, PipelineResult};

/// The user's intent for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub persona: String,
    pub task: String,
    text: String,
}

impl Query {
    /// Build a query. Either field may be empty; the text never is.
    pub fn new(persona: impl Into<String>, task: impl Into<String>) -> Self {
        let persona = persona.into();
        let task = task.into();
        let text = query_text(persona.trim(), task.trim());
        Self {
            persona,
            task,
            text,
        }
    }

    /// Text that gets embedded
    pub fn text(&self) -> &str {
        &self.text
    }
}

fn query_text(persona: &str, task: &str) -> String {
    format!("As a {}, I want to {}.", persona, task)
}

/// Embed the query with the shared model.
///
/// Failure here is fatal for the run: without a query vector nothing can be
/// scored.
pub async fn encode_intent(encoder: Arc<dyn Encoder>, query: &Query) -> PipelineResult<Vec<f32>> {
    let text = query.text().to_string();
    let start = std::time::Instant::now();

    let vector = tokio::task::spawn_blocking(move || encoder.embed(&text))
        .await
        .map_err(|e| PipelineError::QueryEncoding(e.into()))?
        .map_err(|e| PipelineError::QueryEncoding(e.into()))?;

    tracing::debug!(
        dimension = vector.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "Encoded intent"
    );

    Ok(vector)
}
