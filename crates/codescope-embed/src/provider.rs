use std::future::Future;

use crate::error::EmbedError;

pub trait EmbeddingProvider: Send + Sync {
    /// Map `text` to a fixed-length vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable, rejects the request, or
    /// answers with an unusable payload.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, EmbedError>> + Send;

    fn name(&self) -> &'static str;
}
