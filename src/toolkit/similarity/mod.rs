pub mod lexical;
pub mod semantic;
pub mod statistical;

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

pub use lexical::LexicalComparator;
pub use semantic::{ModelState, SemanticComparator};
pub use statistical::StatisticalComparator;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComparatorKind {
    Lexical,
    Statistical,
    Semantic,
}


#[derive(Debug, Clone, PartialEq)]
pub enum DegradeReason {
    EmptyInput,
    EmptyVocabulary,
    Disabled,
    ModelUnavailable,
    Timeout,
    Inference(String),
}


/// What a comparator produced for one pair. A degraded outcome contributes
/// 0 to the aggregate.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    Scored(f64),
    Degraded(DegradeReason),
}

impl ScoreOutcome {

    pub fn value(&self) -> f64 {
        match self {
            Self::Scored(score) => *score,
            Self::Degraded(_) => 0.0,
        }
    }

    /// Degraded for a reason other than being switched off.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Degraded(reason) if *reason != DegradeReason::Disabled)
    }
}


/// Scales a `[0, 1]` ratio to a percentage clamped into `[0, 100]`.
pub fn to_percent(ratio: f64) -> f64 {
    if ratio.is_nan() {
        return 0.0;
    }
    (ratio * 100.0).clamp(0.0, 100.0)
}
