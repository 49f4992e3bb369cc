//! ragdb-embed
//!
//! Sentence embeddings for the vector store: a BGE-M3 (XLM-RoBERTa) model run
//! through candle, and a hashing embedder selected with
//! `APP_USE_FAKE_EMBEDDINGS=1` for fast deterministic runs.

pub mod device;
pub mod hash;
pub mod pool;
pub mod tokenize;

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;

use ragdb_core::traits::Embedder;

pub use hash::HashEmbedder;
pub use pool::masked_mean_l2;

pub const BGE_M3_DIM: usize = 1024;
const BGE_M3_MAX_LEN: usize = 256;

pub struct BgeM3Embedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl BgeM3Embedder {
    pub fn new() -> Result<Self> {
        Self::from_dir(&resolve_model_dir()?)
    }

    pub fn from_dir(model_dir: &Path) -> Result<Self> {
        let device = device::select_device();
        tracing::info!("loading BGE-M3 from {}", model_dir.display());
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("failed to load tokenizer from {}: {e}", tokenizer_path.display()))?;
        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig = serde_json::from_str(
            &std::fs::read_to_string(&config_path).with_context(|| format!("reading {}", config_path.display()))?,
        )?;
        let weights_path = model_dir.join("pytorch_model.bin");
        let weights = candle_core::pickle::read_all(&weights_path)
            .with_context(|| format!("reading weights {}", weights_path.display()))?;
        let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        tracing::info!("BGE-M3 ready");
        Ok(Self { model, tokenizer, device })
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize::tokenize_on_device(&self.tokenizer, text, BGE_M3_MAX_LEN, &self.device)?;
        let token_type_ids = Tensor::zeros((1, BGE_M3_MAX_LEN), DType::I64, &self.device)?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let emb: Vec<f32> = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        if emb.len() != BGE_M3_DIM {
            return Err(anyhow!("unexpected embedding width {} (want {BGE_M3_DIM})", emb.len()));
        }
        let elapsed = start.elapsed();
        if elapsed.as_millis() > 100 {
            tracing::debug!("slow embedding: {elapsed:?} for {} chars", text.len());
        }
        Ok(emb)
    }
}

impl Embedder for BgeM3Embedder {
    fn dim(&self) -> usize { BGE_M3_DIM }
    fn max_len(&self) -> usize { BGE_M3_MAX_LEN }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}

pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn get_default_embedder() -> Result<Box<dyn Embedder>> {
    if use_fake_embeddings() {
        tracing::info!("using HashEmbedder (APP_USE_FAKE_EMBEDDINGS)");
        return Ok(Box::new(HashEmbedder::new(BGE_M3_DIM)));
    }
    Ok(Box::new(BgeM3Embedder::new()?))
}

fn resolve_model_dir() -> Result<PathBuf> {
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = PathBuf::from(&dir);
            if p.exists() {
                return Ok(p);
            }
            tracing::warn!("{var}={dir} does not exist, ignoring");
        }
    }
    for candidate in ["../models/bge-m3", "models/bge-m3"] {
        let p = Path::new(candidate);
        if p.exists() {
            return Ok(p.to_path_buf());
        }
    }
    Err(anyhow!("could not locate BGE-M3 model directory (set APP_MODEL_DIR)"))
}
