pub mod aggregator;
pub mod analyzer;
pub mod classifier;
pub mod models;

pub use aggregator::{rank, Aggregator};
pub use analyzer::Analyzer;
pub use classifier::classify;
pub use models::{AnalysisReport, Classification, ComparisonResult, Verdict};
