//! Embedding batcher.
//!
//! Embeds large text sets in fixed-size batches with an inter-batch delay so
//! upstream quota windows are respected. Rate-limit rejections surface with
//! their taxonomy intact; the provider's own bounded retry is the only retry
//! in play.

use std::sync::Arc;
use std::time::Duration;

use cgx_domain::constants::embedding as embedding_constants;
use cgx_domain::error::Result;
use cgx_domain::ports::embedding::{Embedding, EmbeddingProvider};
use tracing::{debug, warn};

/// Batching settings.
#[derive(Debug, Clone)]
pub struct BatcherConfig {
    /// Texts per upstream request
    pub batch_size: usize,
    /// Pause between consecutive batches
    pub inter_batch_delay: Duration,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: embedding_constants::BATCH_SIZE,
            inter_batch_delay: Duration::from_millis(embedding_constants::INTER_BATCH_DELAY_MS),
        }
    }
}

/// Batched embedding over one provider.
pub struct EmbeddingBatcher {
    provider: Arc<dyn EmbeddingProvider>,
    config: BatcherConfig,
}

impl EmbeddingBatcher {
    /// Create a batcher.
    #[must_use]
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: BatcherConfig) -> Self {
        Self { provider, config }
    }

    /// Embed every text, preserving order.
    ///
    /// # Errors
    ///
    /// Propagates provider failures as-is: rate limits stay
    /// [`cgx_domain::Error::RateLimited`], transport failures stay
    /// [`cgx_domain::Error::Embedding`].
    pub async fn embed_all(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        let batch_size = self.config.batch_size.max(1);
        let batches = texts.chunks(batch_size);
        let total = batches.len();

        for (index, batch) in batches.enumerate() {
            if index > 0 && !self.config.inter_batch_delay.is_zero() {
                tokio::time::sleep(self.config.inter_batch_delay).await;
            }
            let result = self.provider.embed_batch(batch).await;
            match result {
                Ok(mut batch_embeddings) => {
                    debug!(batch = index + 1, total, size = batch.len(), "Batch embedded");
                    embeddings.append(&mut batch_embeddings);
                }
                Err(e) => {
                    warn!(batch = index + 1, total, error = %e, transient = e.is_transient(), "Embedding batch failed");
                    return Err(e);
                }
            }
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cgx_domain::error::Error;
    use std::sync::Mutex;

    struct RecordingProvider {
        batch_sizes: Mutex<Vec<usize>>,
        rate_limit_at_batch: Option<usize>,
    }

    impl RecordingProvider {
        fn new(rate_limit_at_batch: Option<usize>) -> Self {
            Self {
                batch_sizes: Mutex::new(Vec::new()),
                rate_limit_at_batch,
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for RecordingProvider {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
            let mut sizes = self.batch_sizes.lock().unwrap_or_else(|e| e.into_inner());
            sizes.push(texts.len());
            if self.rate_limit_at_batch == Some(sizes.len()) {
                return Err(Error::rate_limited("429 from provider", Some(2000)));
            }
            Ok(texts
                .iter()
                .map(|_| Embedding {
                    vector: vec![0.0; 3],
                    model: "test-model".to_owned(),
                    dimensions: 3,
                })
                .collect())
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn provider_name(&self) -> &str {
            "recording"
        }
    }

    fn texts(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("text {i}")).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn batches_at_one_hundred_with_inter_batch_delay() {
        let provider = Arc::new(RecordingProvider::new(None));
        let batcher = EmbeddingBatcher::new(
            Arc::clone(&provider) as Arc<dyn EmbeddingProvider>,
            BatcherConfig::default(),
        );

        let embeddings = batcher.embed_all(&texts(250)).await.expect("embed");
        assert_eq!(embeddings.len(), 250);

        let sizes = provider.batch_sizes.lock().unwrap_or_else(|e| e.into_inner());
        assert_eq!(*sizes, vec![100, 100, 50]);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limits_propagate_with_taxonomy_intact() {
        let provider = Arc::new(RecordingProvider::new(Some(2)));
        let batcher = EmbeddingBatcher::new(
            Arc::clone(&provider) as Arc<dyn EmbeddingProvider>,
            BatcherConfig::default(),
        );

        let err = batcher.embed_all(&texts(150)).await.expect_err("must fail");
        assert!(matches!(err, Error::RateLimited { .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn empty_input_embeds_nothing() {
        let provider = Arc::new(RecordingProvider::new(None));
        let batcher = EmbeddingBatcher::new(
            Arc::clone(&provider) as Arc<dyn EmbeddingProvider>,
            BatcherConfig::default(),
        );
        let embeddings = batcher.embed_all(&[]).await.expect("embed");
        assert!(embeddings.is_empty());
    }
}
