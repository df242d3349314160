// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model download manager for first-run ONNX embedding model setup.
//!
//! Fetches the all-MiniLM-L6-v2 INT8 quantized model and its tokenizer
//! from HuggingFace and caches them in the data directory. Downloads run
//! over a client with a bounded timeout; a timeout is treated like any
//! other vector-init failure upstream.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use yui_core::YuiError;

const MODEL_URL: &str =
    "https://huggingface.co/onnx-community/all-MiniLM-L6-v2-ONNX/resolve/main/onnx/model_quantized.onnx";
const TOKENIZER_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/tokenizer.json";

fn download_err(context: String) -> YuiError {
    YuiError::SemanticIndex {
        message: context,
        source: None,
    }
}

/// Manages ONNX model download and path resolution.
pub struct ModelManager {
    data_dir: PathBuf,
    model_name: String,
    download_timeout: Duration,
}

impl ModelManager {
    /// Creates a new ModelManager rooted at the given data directory.
    pub fn new(data_dir: PathBuf, model_name: String, download_timeout: Duration) -> Self {
        Self {
            data_dir,
            model_name,
            download_timeout,
        }
    }

    /// Directory where the model files live.
    pub fn model_dir(&self) -> PathBuf {
        self.data_dir.join("models").join(&self.model_name)
    }

    /// Path to the ONNX model file.
    pub fn model_path(&self) -> PathBuf {
        self.model_dir().join("model.onnx")
    }

    /// Path to the tokenizer.json file.
    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir().join("tokenizer.json")
    }

    /// Returns true if both model and tokenizer files exist.
    pub fn is_model_available(&self) -> bool {
        self.model_path().exists() && self.tokenizer_path().exists()
    }

    /// Ensures the model files are on disk, downloading any that are missing.
    ///
    /// Returns the model directory. Partial downloads are cleaned up so a
    /// later retry starts fresh.
    pub async fn ensure_model(&self) -> Result<PathBuf, YuiError> {
        if self.is_model_available() {
            return Ok(self.model_dir());
        }

        info!(model = %self.model_name, "embedding model not found, downloading from HuggingFace");

        let model_dir = self.model_dir();
        tokio::fs::create_dir_all(&model_dir)
            .await
            .map_err(|e| download_err(format!("failed to create model directory: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(self.download_timeout)
            .build()
            .map_err(|e| download_err(format!("failed to build download client: {e}")))?;

        for (filename, url) in [("model.onnx", MODEL_URL), ("tokenizer.json", TOKENIZER_URL)] {
            let dest = model_dir.join(filename);
            if dest.exists() {
                continue;
            }

            info!(filename, "downloading model file");
            if let Err(e) = fetch_file(&client, url, &dest).await {
                let _ = tokio::fs::remove_file(&dest).await;
                return Err(e);
            }
        }

        info!(dir = %model_dir.display(), "embedding model ready");
        Ok(model_dir)
    }
}

async fn fetch_file(client: &reqwest::Client, url: &str, dest: &Path) -> Result<(), YuiError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| download_err(format!("failed to download {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(download_err(format!(
            "download of {url} failed with status {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| download_err(format!("failed to read response body from {url}: {e}")))?;

    tokio::fs::write(dest, &bytes)
        .await
        .map_err(|e| download_err(format!("failed to write {}: {e}", dest.display())))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_at(path: &str) -> ModelManager {
        ModelManager::new(
            PathBuf::from(path),
            "all-MiniLM-L6-v2".to_string(),
            Duration::from_secs(120),
        )
    }

    #[test]
    fn paths_are_rooted_in_data_dir() {
        let mgr = manager_at("/data/yui");
        assert_eq!(
            mgr.model_path(),
            PathBuf::from("/data/yui/models/all-MiniLM-L6-v2/model.onnx")
        );
        assert_eq!(
            mgr.tokenizer_path(),
            PathBuf::from("/data/yui/models/all-MiniLM-L6-v2/tokenizer.json")
        );
    }

    #[test]
    fn model_not_available_when_files_missing() {
        let mgr = manager_at("/nonexistent/path");
        assert!(!mgr.is_model_available());
    }

    #[tokio::test]
    async fn ensure_model_short_circuits_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = ModelManager::new(
            dir.path().to_path_buf(),
            "all-MiniLM-L6-v2".to_string(),
            Duration::from_secs(1),
        );
        std::fs::create_dir_all(mgr.model_dir()).unwrap();
        std::fs::write(mgr.model_path(), b"stub").unwrap();
        std::fs::write(mgr.tokenizer_path(), b"stub").unwrap();

        // No network access happens when both files already exist.
        let resolved = mgr.ensure_model().await.unwrap();
        assert_eq!(resolved, mgr.model_dir());
    }
}
