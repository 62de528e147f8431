use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use strum::IntoStaticStr;
use text_splitter::{Characters, TextSplitter};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{to_percent, DegradeReason, ScoreOutcome};
use crate::llm::embeddings::{cosine_similarity, EmbeddingModel};
use crate::llm::factory::ModelLoader;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModelState {
    Disabled,
    Uninitialized,
    Loading,
    Ready,
    Failed,
}


/// Embedding cosine similarity over a lazily loaded, shared model.
///
/// The model is loaded on first use, at most once; concurrent first callers
/// wait on the same load. A failed load is final for the life of the
/// comparator, so every later comparison degrades to 0 without retrying.
pub struct SemanticComparator {
    loader: Option<Arc<dyn ModelLoader>>,
    model: OnceCell<Option<Arc<dyn EmbeddingModel>>>,
    loading: AtomicBool,
    timeout: Duration,
    max_chars: usize,
    splitter: TextSplitter<Characters>,
}

impl SemanticComparator {

    pub fn new(loader: Arc<dyn ModelLoader>, timeout: Duration, max_chars: usize) -> Self {
        Self::build(Some(loader), timeout, max_chars)
    }


    pub fn disabled() -> Self {
        Self::build(None, Duration::from_secs(1), 1)
    }

    fn build(loader: Option<Arc<dyn ModelLoader>>, timeout: Duration, max_chars: usize) -> Self {
        let max_chars = max_chars.max(1);
        Self {
            loader,
            model: OnceCell::new(),
            loading: AtomicBool::new(false),
            timeout,
            max_chars,
            splitter: TextSplitter::new(max_chars),
        }
    }


    pub fn is_enabled(&self) -> bool {
        self.loader.is_some()
    }


    pub fn state(&self) -> ModelState {
        if self.loader.is_none() {
            return ModelState::Disabled;
        }
        match self.model.get() {
            Some(Some(_)) => ModelState::Ready,
            Some(None) => ModelState::Failed,
            None if self.loading.load(Ordering::SeqCst) => ModelState::Loading,
            None => ModelState::Uninitialized,
        }
    }


    pub fn is_available(&self) -> bool {
        matches!(self.model.get(), Some(Some(model)) if model.is_available())
    }

    async fn model(&self) -> Option<Arc<dyn EmbeddingModel>> {
        let loader = self.loader.as_ref()?;

        self.model
            .get_or_init(|| async {
                self.loading.store(true, Ordering::SeqCst);
                info!("Loading semantic model...");

                let model = match tokio::time::timeout(self.timeout, loader.load()).await {
                    Ok(Ok(model)) => {
                        info!("Semantic model loaded: {}", model.model_name());
                        Some(model)
                    }
                    Ok(Err(e)) => {
                        warn!("Semantic model failed to load, semantic scores disabled: {}", e);
                        None
                    }
                    Err(_) => {
                        warn!(
                            "Semantic model load timed out after {:?}, semantic scores disabled",
                            self.timeout
                        );
                        None
                    }
                };

                self.loading.store(false, Ordering::SeqCst);
                model
            })
            .await
            .clone()
    }

    /// Texts past `max_chars` keep only their first chunk.
    fn clip<'a>(&self, text: &'a str) -> &'a str {
        if text.chars().count() <= self.max_chars {
            return text;
        }
        self.splitter.chunks(text).next().unwrap_or(text)
    }


    pub async fn compare(&self, a: &str, b: &str) -> ScoreOutcome {
        if !self.is_enabled() {
            return ScoreOutcome::Degraded(DegradeReason::Disabled);
        }
        if a.trim().is_empty() || b.trim().is_empty() {
            return ScoreOutcome::Degraded(DegradeReason::EmptyInput);
        }

        let Some(model) = self.model().await else {
            return ScoreOutcome::Degraded(DegradeReason::ModelUnavailable);
        };

        let (a, b) = (self.clip(a), self.clip(b));
        let embeddings = tokio::time::timeout(
            self.timeout,
            futures::future::try_join(model.embed(a), model.embed(b)),
        )
        .await;

        match embeddings {
            Ok(Ok((vec_a, vec_b))) => {
                let cosine = cosine_similarity(&vec_a, &vec_b);
                debug!("Semantic cosine {:.4}", cosine);
                ScoreOutcome::Scored(to_percent(cosine))
            }
            Ok(Err(e)) => {
                warn!("Semantic inference failed: {}", e);
                ScoreOutcome::Degraded(DegradeReason::Inference(e.to_string()))
            }
            Err(_) => {
                warn!("Semantic inference timed out after {:?}", self.timeout);
                ScoreOutcome::Degraded(DegradeReason::Timeout)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::CountingLoader;
    use super::*;

    fn comparator(loader: Arc<CountingLoader>) -> SemanticComparator {
        SemanticComparator::new(loader, Duration::from_secs(2), 1000)
    }

    #[tokio::test]
    async fn test_disabled_yields_zero() {
        let semantic = SemanticComparator::disabled();
        assert_eq!(semantic.state(), ModelState::Disabled);
        assert_eq!(
            semantic.compare("a", "b").await,
            ScoreOutcome::Degraded(DegradeReason::Disabled)
        );
    }

    #[tokio::test]
    async fn test_cosine_scaled_to_percent() {
        let loader = Arc::new(CountingLoader::new(&[
            ("first", vec![1.0, 0.0]),
            ("second", vec![1.0, 1.0]),
        ]));
        let semantic = comparator(loader.clone());
        assert_eq!(semantic.state(), ModelState::Uninitialized);

        let score = semantic.compare("first", "second").await.value();
        assert!((score - 100.0 / 2f64.sqrt()).abs() < 1e-3);
        assert_eq!(semantic.state(), ModelState::Ready);
        assert!(semantic.is_available());
    }

    #[tokio::test]
    async fn test_negative_cosine_clamps_to_zero() {
        let loader = Arc::new(CountingLoader::new(&[
            ("up", vec![1.0, 0.0]),
            ("down", vec![-1.0, 0.0]),
        ]));
        let semantic = comparator(loader);
        assert_eq!(semantic.compare("up", "down").await, ScoreOutcome::Scored(0.0));
    }

    #[tokio::test]
    async fn test_model_loaded_once_under_concurrency() {
        let mut loader = CountingLoader::new(&[("x", vec![1.0]), ("y", vec![1.0])]);
        loader.delay = Duration::from_millis(50);
        let loader = Arc::new(loader);
        let semantic = Arc::new(comparator(loader.clone()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let semantic = Arc::clone(&semantic);
                tokio::spawn(async move { semantic.compare("x", "y").await })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().value(), 100.0);
        }

        assert_eq!(loader.loads(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_terminal() {
        let loader = Arc::new(CountingLoader::failing());
        let semantic = comparator(loader.clone());

        for _ in 0..3 {
            assert_eq!(
                semantic.compare("a", "b").await,
                ScoreOutcome::Degraded(DegradeReason::ModelUnavailable)
            );
        }
        assert_eq!(semantic.state(), ModelState::Failed);
        assert_eq!(loader.loads(), 1);
        assert!(!semantic.is_available());
    }

    #[tokio::test]
    async fn test_load_timeout_degrades() {
        let mut loader = CountingLoader::new(&[]);
        loader.delay = Duration::from_secs(5);
        let semantic = SemanticComparator::new(Arc::new(loader), Duration::from_millis(20), 100);

        assert_eq!(
            semantic.compare("a", "b").await,
            ScoreOutcome::Degraded(DegradeReason::ModelUnavailable)
        );
        assert_eq!(semantic.state(), ModelState::Failed);
    }

    #[tokio::test]
    async fn test_inference_failure_degrades_pair_only() {
        let loader = Arc::new(CountingLoader::new(&[("known", vec![1.0, 2.0])]));
        let semantic = comparator(loader);

        assert!(matches!(
            semantic.compare("known", "unknown").await,
            ScoreOutcome::Degraded(DegradeReason::Inference(_))
        ));
        assert!((semantic.compare("known", "known").await.value() - 100.0).abs() < 1e-3);
        assert_eq!(semantic.state(), ModelState::Ready);
    }

    #[test]
    fn test_clip_keeps_short_text() {
        let semantic = SemanticComparator::disabled();
        assert_eq!(semantic.clip("x"), "x");

        let semantic = SemanticComparator::build(None, Duration::from_secs(1), 20);
        let long = "First sentence here. Second sentence follows. Third one too.";
        let clipped = semantic.clip(long);
        assert!(clipped.chars().count() <= 20);
        assert!(long.starts_with(clipped));
    }
}
