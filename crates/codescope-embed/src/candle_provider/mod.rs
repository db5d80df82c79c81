pub mod embed;

pub use candle_core::Device;

use std::sync::Arc;

use crate::error::EmbedError;
use crate::provider::EmbeddingProvider;

use self::embed::EmbedModel;

/// In-process BERT sentence embeddings.
#[derive(Debug, Clone)]
pub struct LocalEmbedder {
    model: Arc<EmbedModel>,
}

impl LocalEmbedder {
    /// Download (if needed) and load `repo_id` on a blocking thread.
    ///
    /// # Errors
    ///
    /// Returns `EmbedError::ModelLoad` or a candle error if the weights cannot be loaded.
    pub async fn load(repo_id: &str) -> Result<Self, EmbedError> {
        let owned = repo_id.to_owned();
        tracing::info!(model = %owned, "loading local embedding model");
        let model = tokio::task::spawn_blocking(move || {
            let device = select_device()?;
            EmbedModel::load(&owned, &device)
        })
        .await
        .map_err(|e| EmbedError::ModelLoad(format!("model loading task failed: {e}")))??;

        Ok(Self {
            model: Arc::new(model),
        })
    }
}

#[cfg(feature = "cuda")]
fn select_device() -> Result<Device, EmbedError> {
    Ok(Device::new_cuda(0)?)
}

#[cfg(all(feature = "metal", not(feature = "cuda")))]
fn select_device() -> Result<Device, EmbedError> {
    Ok(Device::new_metal(0)?)
}

#[cfg(not(any(feature = "cuda", feature = "metal")))]
#[allow(clippy::unnecessary_wraps)]
fn select_device() -> Result<Device, EmbedError> {
    Ok(Device::Cpu)
}

impl EmbeddingProvider for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let model = Arc::clone(&self.model);
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || model.embed_sync(&text))
            .await
            .map_err(|e| EmbedError::Inference(format!("local embedding task failed: {e}")))?
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
