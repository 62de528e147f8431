use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::{to_percent, DegradeReason, ScoreOutcome};

lazy_static! {
    /// Two or more word characters between word boundaries.
    static ref TOKEN_PATTERN: Regex = Regex::new(r"\b\w\w+\b").unwrap();
}

/// The vector space is built over exactly the two compared documents.
const PAIR_DOCUMENTS: f64 = 2.0;


pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn term_counts(text: &str) -> HashMap<String, f64> {
    let mut counts = HashMap::new();
    for token in tokenize(text) {
        *counts.entry(token).or_insert(0.0) += 1.0;
    }
    counts
}

/// Smoothed idf: `ln((1 + n) / (1 + df)) + 1`.
fn idf(document_frequency: f64) -> f64 {
    ((1.0 + PAIR_DOCUMENTS) / (1.0 + document_frequency)).ln() + 1.0
}

fn l2_normalize(vector: &mut HashMap<String, f64>) {
    let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for weight in vector.values_mut() {
            *weight /= norm;
        }
    }
}


/// TF-IDF cosine similarity with document frequencies local to the pair.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatisticalComparator;

impl StatisticalComparator {
    pub fn new() -> Self {
        Self
    }

    pub fn compare(&self, a: &str, b: &str) -> ScoreOutcome {
        let counts_a = term_counts(a);
        let counts_b = term_counts(b);

        if counts_a.is_empty() || counts_b.is_empty() {
            debug!("TF-IDF skipped: empty vocabulary");
            return ScoreOutcome::Degraded(DegradeReason::EmptyVocabulary);
        }

        let weigh = |own: &HashMap<String, f64>, other: &HashMap<String, f64>| {
            let mut weights: HashMap<String, f64> = own
                .iter()
                .map(|(term, tf)| {
                    let df = if other.contains_key(term) { 2.0 } else { 1.0 };
                    (term.clone(), tf * idf(df))
                })
                .collect();
            l2_normalize(&mut weights);
            weights
        };

        let vec_a = weigh(&counts_a, &counts_b);
        let vec_b = weigh(&counts_b, &counts_a);

        let (small, large) = if vec_a.len() <= vec_b.len() {
            (&vec_a, &vec_b)
        } else {
            (&vec_b, &vec_a)
        };
        let cosine: f64 = small
            .iter()
            .filter_map(|(term, w)| large.get(term).map(|other| w * other))
            .sum();

        debug!(
            "TF-IDF cosine {:.4} (vocab {} / {})",
            cosine,
            vec_a.len(),
            vec_b.len()
        );
        ScoreOutcome::Scored(to_percent(cosine))
    }
}
