use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, warn};

use super::models::ComparisonResult;
use crate::toolkit::corpus::{DocumentHandle, Extraction, TextExtractor};
use crate::toolkit::similarity::{
    ComparatorKind, LexicalComparator, ScoreOutcome, SemanticComparator, StatisticalComparator,
};


/// Scores a submitted text against every document of a corpus snapshot.
pub struct Aggregator {
    extractor: Arc<dyn TextExtractor>,
    lexical: LexicalComparator,
    statistical: StatisticalComparator,
    semantic: Arc<SemanticComparator>,
}

impl Aggregator {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        lexical: LexicalComparator,
        semantic: Arc<SemanticComparator>,
    ) -> Self {
        Self {
            extractor,
            lexical,
            statistical: StatisticalComparator::new(),
            semantic,
        }
    }


    pub fn semantic(&self) -> &Arc<SemanticComparator> {
        &self.semantic
    }

    fn divisor(&self) -> f64 {
        if self.semantic.is_enabled() { 3.0 } else { 2.0 }
    }

    /// One result per corpus document that yielded text, in corpus order.
    ///
    /// Extraction and the two CPU-bound comparators run on the blocking pool;
    /// the semantic comparison is awaited afterwards. A document that cannot
    /// be read is skipped, a comparator that fails contributes 0.
    pub async fn compare_to_corpus(
        &self,
        submitted: Arc<str>,
        corpus: &[DocumentHandle],
    ) -> Vec<ComparisonResult> {
        let mut results = Vec::with_capacity(corpus.len());

        for handle in corpus {
            let extractor = Arc::clone(&self.extractor);
            let lexical = self.lexical;
            let statistical = self.statistical;
            let submitted_text = Arc::clone(&submitted);
            let blocking_handle = handle.clone();

            let scored = tokio::task::spawn_blocking(move || {
                let text = match extractor.extract(&blocking_handle) {
                    Extraction::Text(text) => text,
                    Extraction::Skipped(reason) => {
                        warn!("Skipping corpus document {}: {:?}", blocking_handle.id, reason);
                        return None;
                    }
                };
                let lexical = lexical.compare(&submitted_text, &text);
                let statistical = statistical.compare(&submitted_text, &text);
                Some((text, lexical, statistical))
            })
            .await;

            let (text, lexical, statistical) = match scored {
                Ok(Some(scored)) => scored,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Comparison task for {} failed: {}", handle.id, e);
                    continue;
                }
            };

            let semantic = self.semantic.compare(&submitted, &text).await;
            results.push(self.combine(&handle.id, lexical, statistical, semantic));
        }

        results
    }

    fn combine(
        &self,
        id: &str,
        lexical: ScoreOutcome,
        statistical: ScoreOutcome,
        semantic: ScoreOutcome,
    ) -> ComparisonResult {
        let degraded: Vec<ComparatorKind> = [
            (ComparatorKind::Lexical, &lexical),
            (ComparatorKind::Statistical, &statistical),
            (ComparatorKind::Semantic, &semantic),
        ]
        .into_iter()
        .filter(|(_, outcome)| outcome.is_failure())
        .map(|(kind, _)| kind)
        .collect();

        if !degraded.is_empty() {
            warn!("Degraded comparators for {}: {:?}", id, degraded);
        }

        let (lexical, statistical, semantic) = (lexical.value(), statistical.value(), semantic.value());
        let aggregate = (lexical + statistical + semantic) / self.divisor();
        debug!(
            "{}: lexical={:.2} statistical={:.2} semantic={:.2} aggregate={:.2}",
            id, lexical, statistical, semantic, aggregate
        );

        ComparisonResult {
            corpus_document_id: id.to_string(),
            lexical_score: lexical,
            statistical_score: statistical,
            semantic_score: semantic,
            aggregate_score: aggregate.clamp(0.0, 100.0),
            degraded,
        }
    }
}


/// Sorts by aggregate score, highest first. Stable: ties keep corpus order.
pub fn rank(mut results: Vec<ComparisonResult>) -> Vec<ComparisonResult> {
    results.sort_by(|a, b| {
        b.aggregate_score
            .partial_cmp(&a.aggregate_score)
            .unwrap_or(Ordering::Equal)
    });
    results
}
