pub mod analysis;
pub mod corpus;
pub mod similarity;
pub mod web;


pub use analysis::{AnalysisReport, Analyzer, Classification, ComparisonResult};
pub use corpus::{CorpusStore, DocumentHandle, Extraction, FsCorpusStore, TextExtractor};
pub use web::{SearchProvider, WebHit};
