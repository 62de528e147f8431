use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::aggregator::{rank, Aggregator};
use super::classifier::classify;
use super::models::AnalysisReport;
use crate::core::config::DocsimConfig;
use crate::core::error::{DocsimError, Result};
use crate::llm::factory::EmbeddingProviderFactory;
use crate::toolkit::corpus::{
    CorpusStore, DocumentHandle, Extraction, FileTextExtractor, FsCorpusStore, TextExtractor,
};
use crate::toolkit::similarity::{LexicalComparator, SemanticComparator};
use crate::toolkit::web::{search_provider_from_config, web_plausibility, SearchOptions, SearchProvider};
use crate::utils::preview;


/// Entry point of the scoring pipeline.
///
/// Cheap to share behind an `Arc`; analyses are independent and may run
/// concurrently. The semantic model, when enabled, is shared by all of them.
pub struct Analyzer {
    store: Arc<dyn CorpusStore>,
    extractor: Arc<dyn TextExtractor>,
    search: Arc<dyn SearchProvider>,
    search_options: SearchOptions,
    aggregator: Aggregator,
}

impl Analyzer {
    /// Wires the default collaborators: directory corpus, file extractor,
    /// configured search provider and, if enabled, the embedding provider.
    pub fn from_config(config: &DocsimConfig) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(FsCorpusStore::open(&config.corpus_dir, config.max_document_bytes)?);
        let search = search_provider_from_config(config)?;
        let semantic = if config.semantic_enabled {
            SemanticComparator::new(
                Arc::new(EmbeddingProviderFactory::from_config(config)),
                Duration::from_secs(config.embedding_timeout_secs),
                config.semantic_max_chars,
            )
        } else {
            SemanticComparator::disabled()
        };

        info!(
            "Analyzer ready (corpus={}, semantic={}, search={})",
            config.corpus_dir.display(),
            config.semantic_enabled,
            search.provider_name()
        );

        Ok(Self::from_parts(
            store,
            Arc::new(FileTextExtractor::new()),
            search,
            Arc::new(semantic),
            config,
        ))
    }


    pub fn from_parts(
        store: Arc<dyn CorpusStore>,
        extractor: Arc<dyn TextExtractor>,
        search: Arc<dyn SearchProvider>,
        semantic: Arc<SemanticComparator>,
        config: &DocsimConfig,
    ) -> Self {
        let lexical = LexicalComparator::new(Duration::from_millis(config.lexical_timeout_ms));
        Self {
            store,
            extractor: Arc::clone(&extractor),
            search,
            search_options: SearchOptions::from_config(config),
            aggregator: Aggregator::new(extractor, lexical, semantic),
        }
    }


    pub fn store(&self) -> &Arc<dyn CorpusStore> {
        &self.store
    }


    pub fn semantic(&self) -> &SemanticComparator {
        self.aggregator.semantic()
    }

    /// Analyzes against a fresh snapshot of the configured corpus. An
    /// unreadable corpus directory is treated as an empty corpus.
    pub async fn analyze(&self, handle: &DocumentHandle) -> Result<AnalysisReport> {
        let corpus = match self.store.list_documents() {
            Ok(corpus) => corpus,
            Err(e) => {
                warn!("Corpus listing failed, analyzing against an empty corpus: {}", e);
                Vec::new()
            }
        };
        self.analyze_against(handle, &corpus).await
    }

    /// Fails only when no text can be extracted from the submitted document.
    pub async fn analyze_against(
        &self,
        handle: &DocumentHandle,
        corpus: &[DocumentHandle],
    ) -> Result<AnalysisReport> {
        let submitted = self.extract_submitted(handle).await?;
        info!(
            "Analyzing '{}' ({} chars) against {} corpus documents",
            handle.id,
            submitted.chars().count(),
            corpus.len()
        );

        let results = self
            .aggregator
            .compare_to_corpus(Arc::clone(&submitted), corpus)
            .await;
        let ranked = rank(results);

        let web = web_plausibility(&submitted, self.search.as_ref(), &self.search_options).await;
        let verdict = classify(&ranked, web.score);

        info!(
            "Analysis of '{}': overall={:.2} {} (web query '{}')",
            handle.id,
            verdict.overall_score,
            verdict.classification.label(),
            preview(&web.query, 60)
        );

        Ok(AnalysisReport::new(
            handle.id.clone(),
            ranked,
            web,
            verdict,
            self.semantic().is_enabled(),
        ))
    }

    async fn extract_submitted(&self, handle: &DocumentHandle) -> Result<Arc<str>> {
        let extractor = Arc::clone(&self.extractor);
        let blocking_handle = handle.clone();
        let extraction = tokio::task::spawn_blocking(move || extractor.extract(&blocking_handle))
            .await
            .map_err(|e| DocsimError::Internal(format!("extraction task failed: {}", e)))?;

        match extraction {
            Extraction::Text(text) => Ok(Arc::from(text)),
            Extraction::Skipped(reason) => {
                warn!("Submitted document '{}' yielded no text: {:?}", handle.id, reason);
                Err(DocsimError::EmptySubmission(handle.id.clone()))
            }
        }
    }
}
