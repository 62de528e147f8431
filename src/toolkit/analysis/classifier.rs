use super::models::{Classification, ComparisonResult, Verdict};


/// Folds the best corpus match and the web signal into the overall score.
/// `ranked` must already be sorted; only its first entry is read. With no
/// usable comparison the overall score is 0 regardless of the web signal.
pub fn classify(ranked: &[ComparisonResult], web_similarity_score: f64) -> Verdict {
    let overall_score = match ranked.first() {
        Some(top) => (top.aggregate_score + web_similarity_score) / 2.0,
        None => 0.0,
    };

    Verdict {
        overall_score,
        classification: Classification::from_score(overall_score),
    }
}
