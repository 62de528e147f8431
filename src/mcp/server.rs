use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    service::RequestContext,
    tool, tool_handler, tool_router,
    transport::stdio,
    ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::config::DocsimConfig;
use crate::core::error::DocsimError;
use crate::toolkit::analysis::Analyzer;
use crate::toolkit::corpus::{CorpusError, DocumentHandle};
use crate::utils::preview;


#[derive(Debug, Deserialize, rmcp::schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct AnalyzeDocumentParams {
    #[schemars(description = "Path to a .txt, .pdf or .docx file to score against the corpus")]
    pub path: String,
}

#[derive(Debug, Deserialize, rmcp::schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct AnalyzeTextParams {
    #[schemars(description = "Plain text to score against the corpus")]
    pub text: String,
    #[schemars(description = "Optional name used as the document id in the report")]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, rmcp::schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct AddReferenceParams {
    #[schemars(description = "Corpus filename, e.g. 'thesis.pdf' (extension: txt, pdf, docx)")]
    pub filename: String,
    #[schemars(description = "Plain-text content for a .txt reference")]
    pub content: Option<String>,
    #[schemars(description = "Path of an existing file to copy into the corpus")]
    pub source_path: Option<String>,
}

#[derive(Debug, Deserialize, rmcp::schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct RemoveReferenceParams {
    #[schemars(description = "Corpus filename to remove")]
    pub filename: String,
}

#[derive(Debug, Serialize)]
struct RemoveReferenceResult {
    filename: String,
    removed: bool,
}


#[derive(Clone)]
pub struct DocsimMcpServer {
    analyzer: Arc<Analyzer>,
    config: Arc<DocsimConfig>,
    tool_router: ToolRouter<Self>,
}

impl DocsimMcpServer {

    pub fn new(analyzer: Analyzer, config: DocsimConfig) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            config: Arc::new(config),
            tool_router: Self::tool_router(),
        }
    }


    fn convert_error(err: DocsimError) -> McpError {
        match err {
            DocsimError::EmptySubmission(_) | DocsimError::Config(_) => {
                McpError::invalid_params(err.to_string(), None)
            }
            DocsimError::Corpus(CorpusError::Io(_)) => McpError::internal_error(err.to_string(), None),
            DocsimError::Corpus(_) => McpError::invalid_params(err.to_string(), None),
            other => McpError::internal_error(other.to_string(), None),
        }
    }


    fn result_to_json<T: Serialize>(result: T) -> Result<String, McpError> {
        serde_json::to_string_pretty(&result)
            .map_err(|e| McpError::internal_error(e.to_string(), None))
    }

    async fn read_source(&self, path: &str) -> Result<Vec<u8>, McpError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| McpError::invalid_params(format!("cannot read '{}': {}", path, e), None))?;
        if metadata.len() > self.config.max_document_bytes as u64 {
            return Err(Self::convert_error(DocsimError::Corpus(CorpusError::TooLarge {
                size: metadata.len() as usize,
                limit: self.config.max_document_bytes,
            })));
        }
        tokio::fs::read(path)
            .await
            .map_err(|e| McpError::invalid_params(format!("cannot read '{}': {}", path, e), None))
    }
}

#[tool_router]
impl DocsimMcpServer {

    #[tool(description = "Score a document file against the reference corpus. Returns the full report: {results: [{corpus_document_id, lexical_score, statistical_score, semantic_score, aggregate_score}], web_evidence, web_similarity_score, overall_score, classification_label, classification_color}")]
    async fn analyze_document(
        &self,
        Parameters(params): Parameters<AnalyzeDocumentParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("📄 Analyzing document: {}", params.path);

        let bytes = self.read_source(&params.path).await?;
        let filename = PathBuf::from(&params.path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| params.path.clone());

        let report = self
            .analyzer
            .analyze(&DocumentHandle::upload(filename, bytes))
            .await
            .map_err(Self::convert_error)?;

        info!(
            "✅ {} -> {} ({:.2})",
            report.document_id,
            report.classification_label,
            report.overall_score
        );

        let json = Self::result_to_json(&report)?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }


    #[tool(description = "Score raw text against the reference corpus. Same report shape as analyze_document.")]
    async fn analyze_text(
        &self,
        Parameters(params): Parameters<AnalyzeTextParams>,
    ) -> Result<CallToolResult, McpError> {
        let name = params.name.unwrap_or_else(|| "inline-text".to_string());
        info!("📝 Analyzing text '{}': '{}'", name, preview(&params.text, 50));

        let report = self
            .analyzer
            .analyze(&DocumentHandle::inline(name, params.text))
            .await
            .map_err(Self::convert_error)?;

        let json = Self::result_to_json(&report)?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }


    #[tool(description = "Add or replace a reference document in the corpus, from inline text (content) or a file on disk (source_path). Returns: {filename, size_bytes, modified_at}")]
    async fn add_reference(
        &self,
        Parameters(params): Parameters<AddReferenceParams>,
    ) -> Result<CallToolResult, McpError> {
        let bytes = match (params.content, params.source_path) {
            (Some(content), None) => content.into_bytes(),
            (None, Some(path)) => self.read_source(&path).await?,
            _ => {
                return Err(McpError::invalid_params(
                    "provide exactly one of 'content' or 'source_path'",
                    None,
                ));
            }
        };

        let entry = self
            .analyzer
            .store()
            .add(&params.filename, &bytes)
            .map_err(|e| Self::convert_error(e.into()))?;

        info!("📚 Reference added: {} ({} bytes)", entry.filename, entry.size_bytes);

        let json = Self::result_to_json(&entry)?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }


    #[tool(description = "Remove a reference document from the corpus. Returns: {filename, removed: bool}")]
    async fn remove_reference(
        &self,
        Parameters(params): Parameters<RemoveReferenceParams>,
    ) -> Result<CallToolResult, McpError> {
        let removed = self
            .analyzer
            .store()
            .remove(&params.filename)
            .map_err(|e| Self::convert_error(e.into()))?;

        if removed {
            info!("🗑️ Reference removed: {}", params.filename);
        } else {
            warn!("⚠️ Reference not found: {}", params.filename);
        }

        let json = Self::result_to_json(RemoveReferenceResult {
            filename: params.filename,
            removed,
        })?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }


    #[tool(description = "List the reference corpus. Returns: [{filename, size_bytes, modified_at}]")]
    async fn list_references(&self) -> Result<CallToolResult, McpError> {
        let entries = self
            .analyzer
            .store()
            .entries()
            .map_err(|e| Self::convert_error(e.into()))?;

        let json = Self::result_to_json(&entries)?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}


#[tool_handler]
impl ServerHandler for DocsimMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "docsim".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Document overlap scoring. Use add_reference to build the corpus, then \
                 analyze_document or analyze_text to score a submission. Reports combine \
                 lexical, TF-IDF and optional embedding similarity with a web search signal."
                    .to_string(),
            ),
        }
    }


    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _ctx: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult {
            resources: vec![
                RawResource::new("config://docsim", "docsim-config".to_string()).no_annotation(),
                RawResource::new("status://semantic", "semantic-model-status".to_string())
                    .no_annotation(),
            ],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri }: ReadResourceRequestParam,
        _ctx: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        match uri.as_str() {
            "config://docsim" => {
                let config = &self.config;
                let provider: &'static str = config.embedding_provider.into();
                let search: &'static str = config.search_provider.into();

                let content = Self::result_to_json(json!({
                    "version": env!("CARGO_PKG_VERSION"),
                    "corpus": {
                        "dir": config.corpus_dir.display().to_string(),
                        "max_document_bytes": config.max_document_bytes,
                    },
                    "semantic": {
                        "enabled": config.semantic_enabled,
                        "provider": provider,
                        "model": config.embedding_model,
                        "max_chars": config.semantic_max_chars,
                    },
                    "search": {
                        "provider": search,
                        "max_results": config.search_max_results,
                        "timeout_secs": config.search_timeout_secs,
                    },
                    "tools": [
                        "analyze_document",
                        "analyze_text",
                        "add_reference",
                        "remove_reference",
                        "list_references",
                    ],
                }))?;

                Ok(ReadResourceResult {
                    contents: vec![ResourceContents::text(content, uri)],
                })
            }
            "status://semantic" => {
                let semantic = self.analyzer.semantic();
                let state: &'static str = semantic.state().into();

                let content = Self::result_to_json(json!({
                    "enabled": semantic.is_enabled(),
                    "state": state,
                    "available": semantic.is_available(),
                }))?;

                Ok(ReadResourceResult {
                    contents: vec![ResourceContents::text(content, uri)],
                })
            }
            _ => Err(McpError::resource_not_found(
                format!("Unknown resource: {}", uri),
                Some(json!({ "uri": uri })),
            )),
        }
    }
}


pub async fn run_server() -> anyhow::Result<()> {
    info!("🚀 Initializing docsim MCP server...");

    let config = DocsimConfig::from_env()?;
    let analyzer = Analyzer::from_config(&config)?;

    info!("✅ docsim MCP server ready");
    info!("   📚 Corpus: {}", config.corpus_dir.display());
    info!(
        "   🧠 Semantic: {} ({})",
        if config.semantic_enabled { "enabled" } else { "disabled" },
        config.embedding_model
    );

    let server = DocsimMcpServer::new(analyzer, config);
    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    Ok(())
}
