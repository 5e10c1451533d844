//! Embedding provider port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A dense vector for one text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    /// The vector components
    pub vector: Vec<f32>,
    /// Model that produced the vector
    pub model: String,
    /// Vector dimensionality
    pub dimensions: usize,
}

/// Semantic-embedding client interface.
///
/// Implementations surface quota/rate-limit rejections as
/// [`crate::error::Error::RateLimited`] and transport failures as
/// [`crate::error::Error::Embedding`]; the distinction is load-bearing for
/// callers deciding whether to back off. Rate-limited calls rely on the
/// client's own bounded retry; nothing here retries recursively.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one text.
    ///
    /// # Errors
    ///
    /// See trait-level taxonomy notes.
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let embeddings = self.embed_batch(&[text.to_owned()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| crate::error::Error::embedding("No embedding returned"))
    }

    /// Embed a batch of texts, preserving order.
    ///
    /// # Errors
    ///
    /// See trait-level taxonomy notes.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    /// Vector dimensionality of this provider/model.
    fn dimensions(&self) -> usize;

    /// Stable provider name for logs and diagnostics.
    fn provider_name(&self) -> &str;
}
