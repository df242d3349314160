// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ONNX embedding adapter for local inference using all-MiniLM-L6-v2.
//!
//! Produces 384-dimensional L2-normalized embeddings on CPU with no
//! external API calls. The same text always maps to the same vector, so
//! the vector index can treat this as a pure function.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use ndarray::Array2;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;

use yui_core::YuiError;
use yui_core::traits::adapter::PluginAdapter;
use yui_core::traits::embedding::EmbeddingAdapter;
use yui_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};

/// Embedding dimensions for all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

fn infer_err(context: &str, e: impl std::fmt::Display) -> YuiError {
    YuiError::SemanticIndex {
        message: format!("{context}: {e}"),
        source: None,
    }
}

/// Local embedding encoder backed by an ONNX session.
///
/// Loads `model.onnx` and `tokenizer.json` from a model directory.
/// Inference runs single-threaded on CPU. Construction fails when the
/// model files are absent or unloadable -- the memory manager treats that
/// as "vector disabled", not as a crash.
pub struct OnnxEmbedder {
    /// ONNX Runtime session (not Sync; guarded by the mutex).
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
}

// Safety: the session is only touched while holding the Mutex, and the
// tokenizer is thread-safe for encoding.
unsafe impl Send for OnnxEmbedder {}
unsafe impl Sync for OnnxEmbedder {}

impl OnnxEmbedder {
    /// Creates an embedder from `model.onnx` and `tokenizer.json` in
    /// `model_dir`.
    pub fn new(model_dir: &Path) -> Result<Self, YuiError> {
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            infer_err(
                &format!("failed to load tokenizer from {}", tokenizer_path.display()),
                e,
            )
        })?;

        let model_path = model_dir.join("model.onnx");
        let session = Session::builder()
            .map_err(|e| infer_err("failed to create ONNX session builder", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| infer_err("failed to set optimization level", e))?
            .with_intra_threads(1)
            .map_err(|e| infer_err("failed to set thread count", e))?
            .commit_from_file(&model_path)
            .map_err(|e| {
                infer_err(
                    &format!("failed to load ONNX model from {}", model_path.display()),
                    e,
                )
            })?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    /// Embed a single text string into a 384-dim L2-normalized vector.
    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>, YuiError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| infer_err("tokenization failed", e))?;

        let ids: Vec<i64> = encoding.get_ids().iter().map(|&v| v as i64).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&v| v as i64)
            .collect();
        let type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&v| v as i64).collect();
        let seq_len = ids.len();

        let to_tensor = |name: &str, data: Vec<i64>| {
            Array2::from_shape_vec((1, seq_len), data)
                .map_err(|e| infer_err(&format!("failed to shape {name} tensor"), e))
        };
        let ids_array = to_tensor("input_ids", ids)?;
        let mask_array = to_tensor("attention_mask", mask.clone())?;
        let type_ids_array = to_tensor("token_type_ids", type_ids)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| infer_err("failed to lock ONNX session", e))?;

        let ids_tensor = TensorRef::from_array_view(&ids_array)
            .map_err(|e| infer_err("failed to build input_ids tensor", e))?;
        let mask_tensor = TensorRef::from_array_view(&mask_array)
            .map_err(|e| infer_err("failed to build attention_mask tensor", e))?;
        let type_ids_tensor = TensorRef::from_array_view(&type_ids_array)
            .map_err(|e| infer_err("failed to build token_type_ids tensor", e))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
                "token_type_ids" => type_ids_tensor
            ])
            .map_err(|e| infer_err("ONNX inference failed", e))?;

        // Output shape is [1, seq_len, hidden_size].
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| infer_err("failed to extract output tensor", e))?;
        let hidden_size = shape[shape.len() - 1] as usize;

        let pooled = masked_mean_pool(data, &mask, seq_len, hidden_size);
        Ok(l2_normalize(&pooled))
    }
}

/// Mean-pool token embeddings, skipping padding positions.
fn masked_mean_pool(
    token_embeddings: &[f32],
    attention_mask: &[i64],
    seq_len: usize,
    hidden_size: usize,
) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden_size];
    let mut real_tokens = 0.0f32;

    for (i, &mask) in attention_mask.iter().enumerate().take(seq_len) {
        if mask > 0 {
            let row = &token_embeddings[i * hidden_size..(i + 1) * hidden_size];
            for (acc, &v) in pooled.iter_mut().zip(row) {
                *acc += v;
            }
            real_tokens += 1.0;
        }
    }

    if real_tokens > 0.0 {
        for v in &mut pooled {
            *v /= real_tokens;
        }
    }
    pooled
}

/// Scale a vector to unit length. Zero vectors are returned unchanged.
fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vec.iter().map(|v| v / norm).collect()
    } else {
        vec.to_vec()
    }
}

#[async_trait]
impl PluginAdapter for OnnxEmbedder {
    fn name(&self) -> &str {
        "onnx-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, YuiError> {
        match self.session.lock() {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "session lock poisoned: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), YuiError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for OnnxEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, YuiError> {
        let mut embeddings = Vec::with_capacity(input.texts.len());
        for text in &input.texts {
            embeddings.push(self.embed_text(text)?);
        }
        Ok(EmbeddingOutput {
            embeddings,
            dimensions: EMBEDDING_DIM,
        })
    }
}
