use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use sectionrank_core::{collection, Collection, Config, Embedder, Pipeline, Settings};

/// Collections processed when none are given on the command line
pub const DEFAULT_COLLECTIONS: &[&str] = &["Collection 1", "Collection 2", "Collection 3"];

/// Rank and summarize the most relevant PDF pages for a persona and task
#[derive(Debug, Parser)]
#[command(name = "sectionrank", version, about)]
pub struct Args {
    /// Collection directories, each holding challenge1b_input.json and PDFs/
    pub collections: Vec<PathBuf>,

    /// Local embedding model directory
    #[arg(long, env = "SECTIONRANK_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Settings file (JSON)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Sections in each result
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Candidate pool before de-duplication
    #[arg(long)]
    pub pool_size: Option<usize>,

    /// Inference batches in flight
    #[arg(long)]
    pub workers: Option<usize>,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Collections to process, falling back to the default set
    pub fn collection_dirs(&self) -> Vec<PathBuf> {
        if self.collections.is_empty() {
            DEFAULT_COLLECTIONS.iter().map(PathBuf::from).collect()
        } else {
            self.collections.clone()
        }
    }

    /// Apply command line overrides on top of file settings
    pub fn apply_overrides(&self, mut settings: Settings) -> Settings {
        if let Some(top_n) = self.top_n {
            settings.top_n = top_n;
        }
        if let Some(pool_size) = self.pool_size {
            settings.pool_size = pool_size;
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        settings
    }
}

/// Outcome of a batch of collections
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub processed: usize,
    pub failed: usize,
}

/// Load the model once and process every collection
pub async fn run(args: Args) -> anyhow::Result<Summary> {
    let config = Config::load_or_default();
    let settings_file = args.settings.clone().unwrap_or(config.settings_file);
    let settings = args.apply_overrides(Settings::load(&settings_file));
    let model_dir = args.model_dir.clone().unwrap_or(config.model_dir);

    let max_tokens = settings.max_tokens;
    let embedder = tokio::task::spawn_blocking(move || Embedder::from_path(&model_dir, max_tokens))
        .await
        .context("Model loading task panicked")??;

    let pipeline = Pipeline::new(Arc::new(embedder), settings)?;
    process_collections(&pipeline, &args.collection_dirs()).await
}

/// Run the pipeline over each collection directory.
///
/// Unreadable collections are logged and counted; a model error stops the
/// batch.
pub async fn process_collections(
    pipeline: &Pipeline,
    dirs: &[PathBuf],
) -> anyhow::Result<Summary> {
    let mut summary = Summary::default();

    for dir in dirs {
        match process_collection(pipeline, dir).await? {
            Some(output) => {
                tracing::info!("Wrote {:?}", output);
                summary.processed += 1;
            }
            None => summary.failed += 1,
        }
    }

    tracing::info!(
        processed = summary.processed,
        failed = summary.failed,
        "All collections done"
    );
    Ok(summary)
}

async fn process_collection(pipeline: &Pipeline, dir: &Path) -> anyhow::Result<Option<PathBuf>> {
    let collection = Collection::new(dir);
    tracing::info!("Processing collection {:?}", dir);

    let request = match collection.load() {
        Ok(request) => request,
        Err(e) => {
            tracing::error!("Skipping collection {:?}: {:#}", dir, e);
            return Ok(None);
        }
    };

    let result = match pipeline.run(&request).await {
        Ok(result) => result,
        Err(e) if e.is_model_error() => return Err(e.into()),
        Err(e) => {
            tracing::error!("Run failed for {:?}: {}", dir, e);
            return Ok(None);
        }
    };

    match collection::write_result(&collection.output_path(), &result) {
        Ok(()) => Ok(Some(collection.output_path())),
        Err(e) => {
            tracing::error!("Failed to write result for {:?}: {:#}", dir, e);
            Ok(None)
        }
    }
}
