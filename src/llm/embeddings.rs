use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::cache::{CacheStats, EmbeddingCache};
use crate::core::config::EmbeddingProviderKind;


#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty text")]
    EmptyText,

    #[error("Model unavailable: {0}")]
    Unavailable(String),
}


/// A loaded sentence-embedding model.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn is_available(&self) -> bool;

    fn model_name(&self) -> &str;
}


#[derive(Serialize)]
struct OllamaEmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct OpenAIEmbeddingRequest {
    model: String,
    input: String,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
}


/// HTTP embedding client for Ollama or OpenAI-compatible servers.
pub struct EmbeddingGenerator {
    provider: EmbeddingProviderKind,
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
    cache: EmbeddingCache,
    available: AtomicBool,
}

impl EmbeddingGenerator {

    pub fn new(
        provider: EmbeddingProviderKind,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
        cache_size: usize,
    ) -> Result<Self, EmbeddingError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let model = model.into();

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        info!(
            "EmbeddingGenerator initialized: provider={}, model={}, cache={}",
            <&'static str>::from(provider),
            model,
            cache_size
        );

        Ok(Self {
            provider,
            base_url,
            model,
            api_key,
            client,
            cache: EmbeddingCache::new(cache_size),
            available: AtomicBool::new(false),
        })
    }


    pub async fn generate(&self, text: &str, use_cache: bool) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyText);
        }

        if use_cache {
            if let Some(cached) = self.cache.get(text) {
                debug!("Cache HIT for: {}...", crate::safe_truncate(text, 50));
                return Ok(cached);
            }
        }

        let result = match self.provider {
            EmbeddingProviderKind::Ollama => self.generate_ollama(text).await,
            EmbeddingProviderKind::Openai => self.generate_openai(text).await,
        };

        match result {
            Ok(embedding) if embedding.is_empty() => {
                self.available.store(false, Ordering::SeqCst);
                Err(EmbeddingError::InvalidResponse("empty embedding".to_string()))
            }
            Ok(embedding) => {
                if use_cache {
                    self.cache.set(text, embedding.clone());
                }
                self.available.store(true, Ordering::SeqCst);
                Ok(embedding)
            }
            Err(e) => {
                self.available.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    async fn generate_ollama(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = OllamaEmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(EmbeddingError::Http)?
            .json::<OllamaEmbeddingResponse>()
            .await?;

        Ok(response.embedding)
    }

    async fn generate_openai(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EmbeddingError::InvalidResponse("API key required".to_string()))?;

        let request = OpenAIEmbeddingRequest {
            model: self.model.clone(),
            input: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(EmbeddingError::Http)?
            .json::<OpenAIEmbeddingResponse>()
            .await?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse("No embedding in response".to_string()))
    }


    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }


    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Embedding cache cleared");
    }
}

#[async_trait]
impl EmbeddingModel for EmbeddingGenerator {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.generate(text, true).await
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}


pub fn cosine_similarity(vec1: &[f32], vec2: &[f32]) -> f64 {
    if vec1.len() != vec2.len() || vec1.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = vec1.iter().zip(vec2.iter()).map(|(a, b)| a * b).sum();
    let mag1: f32 = vec1.iter().map(|a| a * a).sum::<f32>().sqrt();
    let mag2: f32 = vec2.iter().map(|b| b * b).sum::<f32>().sqrt();

    if mag1 == 0.0 || mag2 == 0.0 {
        return 0.0;
    }

    f64::from(dot_product / (mag1 * mag2))
}
