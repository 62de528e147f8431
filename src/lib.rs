//! Document overlap scoring.
//!
//! A submitted document is compared with every document of a reference
//! corpus by three comparators (character alignment, pairwise TF-IDF and,
//! optionally, embedding cosine). The best per-document average is folded
//! with a web search signal into one classification.

pub mod core;
pub mod llm;
pub mod mcp;
pub mod toolkit;
pub mod utils;

pub use utils::{preview, round2, safe_truncate};


pub use self::core::config::DocsimConfig;
pub use self::core::error::{DocsimError, Result};
pub use toolkit::analysis::{AnalysisReport, Analyzer, Classification, ComparisonResult};
pub use toolkit::corpus::{CorpusStore, DocumentHandle, FsCorpusStore};


pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";


pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";


pub const DEFAULT_CACHE_SIZE: usize = 1000;
