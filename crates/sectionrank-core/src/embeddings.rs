//! Sentence embedding with candle and a local BERT-style model
//!
//! The model is loaded once from a directory on disk and shared read-only
//! by the intent encoder and the relevance scorer. There is no download
//! path: a missing file is a startup error.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use tokenizers::{Tokenizer, TruncationParams};

use crate::error::{PipelineError, PipelineResult};

/// Files that must be present in the model directory
pub const REQUIRED_FILES: &[&str] = &["config.json", "tokenizer.json", "model.safetensors"];

/// Turns text into fixed-length vectors.
///
/// Implementations must be deterministic and safe to call from several
/// threads at once.
pub trait Encoder: Send + Sync {
    /// Length of every vector produced
    fn dimension(&self) -> usize;

    /// Embed several texts, one vector per input in the same order
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .context("Encoder returned no vector")
    }
}

/// Text embedder using a BERT-style model (e.g., all-MiniLM-L6-v2)
pub struct Embedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    hidden_size: usize,
    normalize: bool,
}

impl Embedder {
    /// Load an embedding model from a local directory.
    ///
    /// Checks for every required file first so the error names what is
    /// missing instead of failing deep inside the loader.
    pub fn from_path(model_dir: &Path, max_tokens: usize) -> PipelineResult<Self> {
        for &file in REQUIRED_FILES {
            if !model_dir.join(file).is_file() {
                return Err(PipelineError::ModelUnavailable {
                    path: model_dir.to_path_buf(),
                    file,
                });
            }
        }

        tracing::info!("Loading embedding model from {:?}", model_dir);
        let start = std::time::Instant::now();

        let embedder = Self::load(model_dir, max_tokens).map_err(|e| PipelineError::ModelLoad {
            path: PathBuf::from(model_dir),
            source: e.into(),
        })?;

        tracing::info!(
            dimension = embedder.hidden_size,
            elapsed_ms = start.elapsed().as_millis(),
            "Embedding model loaded"
        );

        Ok(embedder)
    }

    fn load(model_dir: &Path, max_tokens: usize) -> Result<Self> {
        let device = Device::Cpu;

        // Load config
        let config_path = model_dir.join("config.json");
        let config: Config = serde_json::from_str(
            &std::fs::read_to_string(&config_path).context("Failed to read config.json")?,
        )
        .context("Failed to parse config.json")?;

        // Load tokenizer, capped to what the position embeddings allow
        let tokenizer_path = model_dir.join("tokenizer.json");
        let mut tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| anyhow::anyhow!("{}", e))?;
        let max_length = max_tokens.clamp(1, config.max_position_embeddings);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Invalid truncation settings: {}", e))?;

        // Load model weights
        let weights_path = model_dir.join("model.safetensors");
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)
                .context("Failed to load model weights")?
        };

        let hidden_size = config.hidden_size;
        let model = BertModel::load(vb, &config).context("Failed to load BERT model")?;

        Ok(Self {
            model,
            tokenizer,
            device,
            hidden_size,
            normalize: true,
        })
    }

    fn batch_tensor(&self, rows: Vec<Vec<u32>>, batch_size: usize, max_len: usize) -> Result<Tensor> {
        let flat: Vec<u32> = rows.into_iter().flatten().collect();
        Ok(Tensor::new(flat, &self.device)?.reshape((batch_size, max_len))?)
    }
}

impl Encoder for Embedder {
    fn dimension(&self) -> usize {
        self.hidden_size
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        // Tokenize
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        // Find max length for padding
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .max(1);

        let mut input_ids = Vec::with_capacity(encodings.len());
        let mut attention_mask = Vec::with_capacity(encodings.len());
        let mut token_type_ids = Vec::with_capacity(encodings.len());

        for encoding in &encodings {
            let mut ids = encoding.get_ids().to_vec();
            let mut mask = encoding.get_attention_mask().to_vec();
            let mut type_ids = encoding.get_type_ids().to_vec();

            ids.resize(max_len, 0);
            mask.resize(max_len, 0);
            type_ids.resize(max_len, 0);

            input_ids.push(ids);
            attention_mask.push(mask);
            token_type_ids.push(type_ids);
        }

        let batch_size = texts.len();
        let input_ids = self.batch_tensor(input_ids, batch_size, max_len)?;
        let attention_mask = self.batch_tensor(attention_mask, batch_size, max_len)?;
        let token_type_ids = self.batch_tensor(token_type_ids, batch_size, max_len)?;

        // Run model
        let embeddings = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // Mean pooling over tokens (masked)
        let mask_expanded = attention_mask
            .unsqueeze(2)?
            .to_dtype(embeddings.dtype())?
            .broadcast_as(embeddings.shape())?;

        let sum_embeddings = (embeddings * &mask_expanded)?.sum(1)?;
        let sum_mask = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;
        let mean_embeddings = (sum_embeddings / sum_mask)?;

        let final_embeddings = if self.normalize {
            let norms = mean_embeddings
                .sqr()?
                .sum_keepdim(1)?
                .sqrt()?
                .clamp(1e-9, f64::MAX)?;
            let shape = mean_embeddings.shape().clone();
            (mean_embeddings / norms.broadcast_as(&shape)?)?
        } else {
            mean_embeddings
        };

        let final_embeddings = final_embeddings.to_dtype(DType::F32)?;
        let flat: Vec<f32> = final_embeddings.flatten_all()?.to_vec1()?;
        let dim = flat.len() / batch_size;

        Ok(flat.chunks(dim).map(|c| c.to_vec()).collect())
    }
}
