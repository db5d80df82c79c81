//! Test-only deterministic embedding provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::EmbedError;
use crate::provider::EmbeddingProvider;

/// Hashes whitespace-separated tokens into buckets and L2-normalizes the counts, so equal
/// texts map to equal vectors and texts sharing words land close together.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    pub dimension: usize,
    /// Calls with a zero-based index at or past this value fail. The init probe is call 0.
    pub fail_after: Option<usize>,
    /// Any text containing this marker fails to embed.
    pub fail_on: Option<String>,
    /// Milliseconds to sleep before returning.
    pub delay_ms: u64,
    calls: Arc<AtomicUsize>,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(8)
    }
}

impl MockEmbedder {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail_after: None,
            fail_on: None,
            delay_ms: 0,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every call fails, including the init probe.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_after: Some(0),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_fail_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self
    }

    #[must_use]
    pub fn with_fail_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_on = Some(marker.into());
        self
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Number of `embed` calls made so far, shared across clones.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let dim = self.dimension.max(1);
        let mut v = vec![0.0f32; dim];
        for token in text.split_whitespace() {
            let mut h: u64 = 0xcbf2_9ce4_8422_2325;
            for b in token.bytes() {
                h ^= u64::from(b);
                h = h.wrapping_mul(0x0100_0000_01b3);
            }
            #[allow(clippy::cast_possible_truncation)]
            let bucket = (h % dim as u64) as usize;
            v[bucket] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm == 0.0 {
            v[0] = 1.0;
        } else {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.fail_after.is_some_and(|n| call >= n) {
            return Err(EmbedError::Other("mock embedding error".into()));
        }
        if let Some(marker) = &self.fail_on
            && text.contains(marker.as_str())
        {
            return Err(EmbedError::Other(format!("mock refused text containing {marker}")));
        }
        Ok(self.vector_for(text))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
