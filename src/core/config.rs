

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};
use tracing::debug;

use super::error::{DocsimError, Result};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EmbeddingProviderKind {
    Ollama,
    Openai,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SearchProviderKind {
    Duckduckgo,
    Tavily,
    None,
}


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsimConfig {

    pub corpus_dir: PathBuf,
    pub max_document_bytes: usize,


    pub semantic_enabled: bool,
    pub embedding_provider: EmbeddingProviderKind,
    pub embedding_model: String,
    pub embedding_url: String,
    pub embedding_api_key: Option<String>,
    pub embedding_timeout_secs: u64,
    pub embedding_cache_size: usize,
    pub semantic_max_chars: usize,


    pub search_provider: SearchProviderKind,
    pub search_api_key: Option<String>,
    pub search_timeout_secs: u64,
    pub search_max_results: usize,
    pub excerpt_max_chars: usize,


    pub lexical_timeout_ms: u64,
}

impl Default for DocsimConfig {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("./corpus"),
            max_document_bytes: 10 * 1024 * 1024,

            semantic_enabled: false,
            embedding_provider: EmbeddingProviderKind::Ollama,
            embedding_model: crate::DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_url: crate::DEFAULT_OLLAMA_URL.to_string(),
            embedding_api_key: None,
            embedding_timeout_secs: 30,
            embedding_cache_size: crate::DEFAULT_CACHE_SIZE,
            semantic_max_chars: 2000,

            search_provider: SearchProviderKind::Duckduckgo,
            search_api_key: None,
            search_timeout_secs: 5,
            search_max_results: 3,
            excerpt_max_chars: 200,

            lexical_timeout_ms: 2000,
        }
    }
}

impl DocsimConfig {
    /// Layered load: defaults, then the optional file, then `DOCSIM_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            debug!("Loading config file {}", path.display());
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        let config: Self = builder
            .add_source(Environment::with_prefix("DOCSIM").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }


    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }


    pub fn validate(&self) -> Result<()> {
        if self.max_document_bytes == 0 {
            return Err(DocsimError::Config("max_document_bytes must be positive".into()));
        }
        if self.search_max_results == 0 || self.excerpt_max_chars == 0 {
            return Err(DocsimError::Config(
                "search_max_results and excerpt_max_chars must be positive".into(),
            ));
        }
        if self.search_timeout_secs == 0 || self.embedding_timeout_secs == 0 {
            return Err(DocsimError::Config("timeouts must be positive".into()));
        }
        if self.semantic_max_chars == 0 || self.embedding_cache_size == 0 {
            return Err(DocsimError::Config(
                "semantic_max_chars and embedding_cache_size must be positive".into(),
            ));
        }
        if self.semantic_enabled {
            url::Url::parse(&self.embedding_url).map_err(|e| {
                DocsimError::Config(format!("invalid embedding_url '{}': {}", self.embedding_url, e))
            })?;
        }
        if self.search_provider == SearchProviderKind::Tavily && self.search_api_key.is_none() {
            return Err(DocsimError::Config("tavily search requires search_api_key".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::str::FromStr;

    #[test]
    fn test_defaults_are_valid() {
        let config = DocsimConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.semantic_enabled);
        assert_eq!(config.search_max_results, 3);
        assert_eq!(config.excerpt_max_chars, 200);
        assert_eq!(config.search_timeout_secs, 5);
    }

    #[test]
    fn test_provider_kinds_parse() {
        assert_eq!(EmbeddingProviderKind::from_str("OpenAI").unwrap(), EmbeddingProviderKind::Openai);
        assert_eq!(SearchProviderKind::from_str("none").unwrap(), SearchProviderKind::None);
        assert!(SearchProviderKind::from_str("bing").is_err());
    }

    #[test]
    fn test_tavily_requires_key() {
        let config = DocsimConfig {
            search_provider: SearchProviderKind::Tavily,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DocsimError::Config(_))));
    }

    #[test]
    fn test_invalid_embedding_url_rejected_when_enabled() {
        let config = DocsimConfig {
            semantic_enabled: true,
            embedding_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "corpus_dir = \"/srv/reference\"\nsemantic_enabled = true\nsearch_provider = \"none\"\nlexical_timeout_ms = 500"
        )
        .unwrap();

        let config = DocsimConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.corpus_dir, PathBuf::from("/srv/reference"));
        assert!(config.semantic_enabled);
        assert_eq!(config.search_provider, SearchProviderKind::None);
        assert_eq!(config.lexical_timeout_ms, 500);
        assert_eq!(config.search_max_results, 3);
    }
}
