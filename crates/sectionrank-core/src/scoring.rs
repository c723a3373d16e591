//! Relevance scoring: embed every page and compare it with the query.
//!
//! Pages are embedded in batches on blocking threads, with at most
//! `workers` batches in flight. A page that is blank, embeds to a zero
//! vector, or fails inference gets no score and ranks below every scored
//! page. Nothing in here aborts the run.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::config::Settings;
use crate::corpus::TextUnit;
use crate::embeddings::Encoder;

/// A page with its relevance to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredUnit {
    pub unit: TextUnit,
    /// Position in the corpus; the ranking tie-breaker
    pub position: usize,
    pub embedding: Option<Vec<f32>>,
    /// Cosine similarity to the query, `None` when undefined
    pub similarity_score: Option<f32>,
}

impl ScoredUnit {
    pub fn is_scored(&self) -> bool {
        self.similarity_score.is_some()
    }
}

/// Cosine similarity, or `None` if either vector has zero norm, the
/// lengths differ, or the result is not finite.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    score.is_finite().then_some(score)
}

/// Embed every non-blank unit. The result is index-aligned with `units`.
pub async fn embed_units(
    encoder: Arc<dyn Encoder>,
    units: &[TextUnit],
    settings: &Settings,
) -> Vec<Option<Vec<f32>>> {
    let start = std::time::Instant::now();

    let pending: Vec<(usize, String)> = units
        .iter()
        .enumerate()
        .filter(|(_, u)| !u.is_blank())
        .map(|(i, u)| (i, u.raw_text.clone()))
        .collect();

    let batches: Vec<Vec<(usize, String)>> = pending
        .chunks(settings.batch_size.max(1))
        .map(|c| c.to_vec())
        .collect();
    let batch_count = batches.len();

    let results: Vec<Vec<(usize, Option<Vec<f32>>)>> = stream::iter(batches)
        .map(|batch| {
            let encoder = encoder.clone();
            async move {
                let indices: Vec<usize> = batch.iter().map(|(i, _)| *i).collect();
                let outcome = tokio::task::spawn_blocking(move || embed_batch(encoder.as_ref(), batch))
                    .await;
                match outcome {
                    Ok(embedded) => embedded,
                    Err(e) => {
                        tracing::warn!(error = %e, "Embedding task failed, leaving batch unscored");
                        indices.into_iter().map(|i| (i, None)).collect()
                    }
                }
            }
        })
        .buffered(settings.workers.max(1))
        .collect()
        .await;

    let mut embeddings = vec![None; units.len()];
    for (index, vector) in results.into_iter().flatten() {
        embeddings[index] = vector;
    }

    tracing::info!(
        units = units.len(),
        embedded = pending.len(),
        batches = batch_count,
        elapsed_ms = start.elapsed().as_millis(),
        "Embedded pages"
    );

    embeddings
}

/// Embed one batch. If the whole batch fails, retry each text alone so
/// only the offending pages lose their score.
fn embed_batch(encoder: &dyn Encoder, batch: Vec<(usize, String)>) -> Vec<(usize, Option<Vec<f32>>)> {
    let texts: Vec<&str> = batch.iter().map(|(_, t)| t.as_str()).collect();

    match encoder.embed_batch(&texts) {
        Ok(vectors) if vectors.len() == batch.len() => batch
            .iter()
            .map(|(i, _)| *i)
            .zip(vectors.into_iter().map(Some))
            .collect(),
        Ok(vectors) => {
            tracing::warn!(
                expected = batch.len(),
                got = vectors.len(),
                "Encoder returned wrong number of vectors, retrying individually"
            );
            embed_individually(encoder, &batch)
        }
        Err(e) => {
            tracing::debug!(error = %e, size = batch.len(), "Batch failed, retrying individually");
            embed_individually(encoder, &batch)
        }
    }
}

fn embed_individually(encoder: &dyn Encoder, batch: &[(usize, String)]) -> Vec<(usize, Option<Vec<f32>>)> {
    batch
        .iter()
        .map(|(i, text)| match encoder.embed(text) {
            Ok(vector) => (*i, Some(vector)),
            Err(e) => {
                tracing::warn!(unit = i, error = %e, "Failed to embed page, ranking it last");
                (*i, None)
            }
        })
        .collect()
}

/// Pair units with their embeddings and score them against the query.
pub fn score_units(
    query: &[f32],
    units: Vec<TextUnit>,
    embeddings: Vec<Option<Vec<f32>>>,
) -> Vec<ScoredUnit> {
    units
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(position, (unit, embedding))| {
            let similarity_score = embedding
                .as_deref()
                .and_then(|e| cosine_similarity(query, e));
            ScoredUnit {
                unit,
                position,
                embedding,
                similarity_score,
            }
        })
        .collect()
}
