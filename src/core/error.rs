

use thiserror::Error;


#[derive(Error, Debug)]
pub enum DocsimError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No text could be extracted from submitted document: {0}")]
    EmptySubmission(String),

    #[error("Corpus error: {0}")]
    Corpus(#[from] crate::toolkit::corpus::CorpusError),

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("Web search error: {0}")]
    Search(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::toolkit::web::SearchError> for DocsimError {
    fn from(err: crate::toolkit::web::SearchError) -> Self {
        Self::Search(err.to_string())
    }
}

impl From<crate::llm::embeddings::EmbeddingError> for DocsimError {
    fn from(err: crate::llm::embeddings::EmbeddingError) -> Self {
        Self::Embedding(err.to_string())
    }
}

impl From<config::ConfigError> for DocsimError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}


pub type Result<T> = std::result::Result<T, DocsimError>;
