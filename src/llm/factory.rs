

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::embeddings::{EmbeddingError, EmbeddingGenerator, EmbeddingModel};
use crate::core::config::{DocsimConfig, EmbeddingProviderKind};

const WARMUP_TEXT: &str = "warm-up";


/// Produces the shared embedding model. Called at most once per process by
/// the semantic comparator.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn EmbeddingModel>, EmbeddingError>;
}


pub struct EmbeddingProviderFactory {
    provider: EmbeddingProviderKind,
    url: String,
    model: String,
    api_key: Option<String>,
    timeout_secs: u64,
    cache_size: usize,
}

impl EmbeddingProviderFactory {

    #[must_use]
    pub fn from_config(config: &DocsimConfig) -> Self {
        Self {
            provider: config.embedding_provider,
            url: config.embedding_url.clone(),
            model: config.embedding_model.clone(),
            api_key: config.embedding_api_key.clone(),
            timeout_secs: config.embedding_timeout_secs,
            cache_size: config.embedding_cache_size,
        }
    }


    pub fn build(&self) -> Result<EmbeddingGenerator, EmbeddingError> {
        EmbeddingGenerator::new(
            self.provider,
            self.url.clone(),
            self.model.clone(),
            self.api_key.clone(),
            self.timeout_secs,
            self.cache_size,
        )
    }
}

#[async_trait]
impl ModelLoader for EmbeddingProviderFactory {
    async fn load(&self) -> Result<Arc<dyn EmbeddingModel>, EmbeddingError> {
        let generator = self.build()?;

        // A model that cannot embed the warm-up text is not worth keeping.
        let warmup = generator
            .generate(WARMUP_TEXT, false)
            .await
            .map_err(|e| EmbeddingError::Unavailable(e.to_string()))?;

        info!(
            "Embedding model ready: {} (dims={})",
            generator.model_name(),
            warmup.len()
        );
        Ok(Arc::new(generator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_reads_config() {
        let config = DocsimConfig {
            embedding_provider: EmbeddingProviderKind::Openai,
            embedding_url: "http://localhost:8080/v1".to_string(),
            embedding_model: "bge-small".to_string(),
            embedding_api_key: Some("key".to_string()),
            ..Default::default()
        };
        let generator = EmbeddingProviderFactory::from_config(&config).build().unwrap();
        assert_eq!(generator.model_name(), "bge-small");
        assert!(!generator.is_available());
    }

    #[tokio::test]
    async fn test_unreachable_provider_fails_to_load() {
        let config = DocsimConfig {
            embedding_url: "http://127.0.0.1:9".to_string(),
            embedding_timeout_secs: 1,
            ..Default::default()
        };
        let result = EmbeddingProviderFactory::from_config(&config).load().await;
        assert!(matches!(result, Err(EmbeddingError::Unavailable(_))));
    }
}
