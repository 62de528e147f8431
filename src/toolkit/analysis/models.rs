use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::toolkit::similarity::ComparatorKind;
use crate::toolkit::web::{WebHit, WebPlausibility};
use crate::utils::round2;


/// Scores of the submitted document against one corpus document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub corpus_document_id: String,
    pub lexical_score: f64,
    pub statistical_score: f64,
    pub semantic_score: f64,
    pub aggregate_score: f64,

    /// Comparators that failed for this pair and contributed 0.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub degraded: Vec<ComparatorKind>,
}

impl ComparisonResult {
    fn rounded(mut self) -> Self {
        self.lexical_score = round2(self.lexical_score);
        self.statistical_score = round2(self.statistical_score);
        self.semantic_score = round2(self.semantic_score);
        self.aggregate_score = round2(self.aggregate_score);
        self
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Plagiarism,
    HighSimilarity,
    PossibleAi,
    Original,
}

impl Classification {
    pub fn from_score(overall: f64) -> Self {
        if overall >= 80.0 {
            Self::Plagiarism
        } else if overall >= 50.0 {
            Self::HighSimilarity
        } else if overall >= 30.0 {
            Self::PossibleAi
        } else {
            Self::Original
        }
    }

    pub fn label(&self) -> &'static str {
        (*self).into()
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Plagiarism => "red",
            Self::HighSimilarity => "orange",
            Self::PossibleAi => "yellow",
            Self::Original => "green",
        }
    }
}


#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub overall_score: f64,
    pub classification: Classification,
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub analysis_id: String,
    pub document_id: String,
    pub analyzed_at: DateTime<Utc>,
    pub semantic_enabled: bool,

    /// Descending by aggregate score.
    pub results: Vec<ComparisonResult>,

    pub web_query: String,
    pub web_evidence: Vec<WebHit>,
    pub web_similarity_score: f64,

    pub overall_score: f64,
    pub classification_label: String,
    pub classification_color: String,
}

impl AnalysisReport {
    /// Assembles the report; this is the only place scores are rounded.
    pub fn new(
        document_id: impl Into<String>,
        ranked: Vec<ComparisonResult>,
        web: WebPlausibility,
        verdict: Verdict,
        semantic_enabled: bool,
    ) -> Self {
        Self {
            analysis_id: Uuid::new_v4().to_string(),
            document_id: document_id.into(),
            analyzed_at: Utc::now(),
            semantic_enabled,
            results: ranked.into_iter().map(ComparisonResult::rounded).collect(),
            web_query: web.query,
            web_evidence: web.evidence,
            web_similarity_score: round2(web.score),
            overall_score: round2(verdict.overall_score),
            classification_label: verdict.classification.label().to_string(),
            classification_color: verdict.classification.color().to_string(),
        }
    }

    pub fn top_match(&self) -> Option<&ComparisonResult> {
        self.results.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_thresholds_are_inclusive() {
        assert_eq!(Classification::from_score(80.0), Classification::Plagiarism);
        assert_eq!(Classification::from_score(79.99), Classification::HighSimilarity);
        assert_eq!(Classification::from_score(50.0), Classification::HighSimilarity);
        assert_eq!(Classification::from_score(30.0), Classification::PossibleAi);
        assert_eq!(Classification::from_score(29.99), Classification::Original);
    }

    #[test]
    fn test_label_round_trips_through_strum() {
        assert_eq!(Classification::HighSimilarity.label(), "HIGH_SIMILARITY");
        assert_eq!(Classification::from_str("POSSIBLE_AI").unwrap(), Classification::PossibleAi);
        assert_eq!(
            serde_json::to_value(Classification::Plagiarism).unwrap(),
            serde_json::json!("PLAGIARISM")
        );
    }

    #[test]
    fn test_report_rounds_only_for_presentation() {
        let ranked = vec![ComparisonResult {
            corpus_document_id: "a.txt".to_string(),
            lexical_score: 33.333_33,
            statistical_score: 66.666_66,
            semantic_score: 0.0,
            aggregate_score: 49.999_99,
            degraded: vec![],
        }];
        let verdict = Verdict {
            overall_score: 24.999_995,
            classification: Classification::Original,
        };
        let report = AnalysisReport::new("doc.txt", ranked, WebPlausibility::default(), verdict, false);

        let top = report.top_match().unwrap();
        assert_eq!(top.lexical_score, 33.33);
        assert_eq!(top.statistical_score, 66.67);
        assert_eq!(top.aggregate_score, 50.0);
        assert_eq!(report.overall_score, 25.0);
        assert_eq!(report.classification_label, "ORIGINAL");
        assert_eq!(report.classification_color, "green");
        assert!(Uuid::parse_str(&report.analysis_id).is_ok());
    }

    #[test]
    fn test_degraded_omitted_when_empty() {
        let result = ComparisonResult {
            corpus_document_id: "a.txt".to_string(),
            lexical_score: 1.0,
            statistical_score: 1.0,
            semantic_score: 0.0,
            aggregate_score: 1.0,
            degraded: vec![],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("degraded").is_none());
    }
}
