//! Sectionrank Core - offline persona-driven section ranking
//!
//! Given a persona, a task and a set of PDFs, this crate ranks pages by
//! semantic relevance and produces a short title and refined paragraph for
//! each of the best ones:
//! - PDF text extraction (lopdf)
//! - Sentence embeddings from a local model (candle)
//! - Cosine scoring, selection and refinement
//! - Collection directories in and result JSON out

pub mod assemble;
pub mod collection;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod error;
pub mod intent;
pub mod pdf;
pub mod pipeline;
pub mod refine;
pub mod scoring;
pub mod selection;

#[cfg(test)]
mod testing;

pub use assemble::RunResult;
pub use collection::Collection;
pub use config::{Config, Settings};
pub use corpus::{DocumentPages, PageText, TextUnit};
pub use embeddings::{Embedder, Encoder};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{Pipeline, RunRequest};
