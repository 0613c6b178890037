//! Deep research task types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::common::{impl_api_response, DeepResearchMode, DeepResearchStatus, SearchType};
use crate::errors::ValyuError;
use crate::validation;

/// Default number of tasks returned by a list call.
pub const DEFAULT_LIST_LIMIT: u32 = 10;

/// Search settings applied to a research task or a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepResearchSearchConfig {
    /// Corpora to search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_type: Option<SearchType>,
    /// Sources to restrict retrieval to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_sources: Vec<String>,
    /// Sources to leave out.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_sources: Vec<String>,
    /// Earliest publication date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Latest publication date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Category hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Country bias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

impl DeepResearchSearchConfig {
    /// Validates dates, sources and country code.
    pub fn validate(&self) -> Result<(), ValyuError> {
        validation::validate_date("start_date", self.start_date.as_deref())?;
        validation::validate_date("end_date", self.end_date.as_deref())?;
        validation::validate_sources("included_sources", &self.included_sources)?;
        validation::validate_sources("excluded_sources", &self.excluded_sources)?;
        validation::validate_country_code(self.country_code.as_deref())
    }
}

/// A file passed to the research agent, base64 encoded by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    /// Base64 data or a data URL.
    pub data: String,
    /// File name.
    pub filename: String,
    /// MIME type.
    #[serde(rename = "mediaType")]
    pub media_type: String,
    /// How the agent should use the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Authentication for an MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpAuth {
    /// `bearer`, `header` or `none`.
    #[serde(rename = "type")]
    pub auth_type: String,
    /// Bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Custom headers.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

/// An MCP server the research agent may call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpServerConfig {
    /// Server URL.
    pub url: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Prefix added to tool names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_prefix: Option<String>,
    /// Authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<McpAuth>,
    /// Tool allow-list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_tools: Vec<String>,
}

/// Request for `POST /deepresearch/tasks`.
#[derive(Debug, Clone, Serialize)]
pub struct DeepResearchCreateRequest {
    /// Research question (required).
    pub query: String,
    /// Research depth.
    pub mode: DeepResearchMode,
    /// Report formats (`markdown`, `pdf`, or a JSON schema).
    pub output_formats: Vec<serde_json::Value>,
    /// Free-text research strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// Search settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<DeepResearchSearchConfig>,
    /// URLs to read up front.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    /// Attached files.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileAttachment>,
    /// Extra deliverables (spreadsheets, documents).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deliverables: Vec<serde_json::Value>,
    /// MCP servers available to the agent.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mcp_servers: Vec<McpServerConfig>,
    /// Allow the agent to run code.
    pub code_execution: bool,
    /// Ids of earlier reports to build on.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub previous_reports: Vec<String>,
    /// Completion webhook.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// Branding for generated documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_collection_id: Option<String>,
    /// Caller metadata echoed back by the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl DeepResearchCreateRequest {
    /// Creates a request with mode `fast`, markdown output and code execution.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            mode: DeepResearchMode::default(),
            output_formats: vec![serde_json::Value::from("markdown")],
            strategy: None,
            search: None,
            urls: Vec::new(),
            files: Vec::new(),
            deliverables: Vec::new(),
            mcp_servers: Vec::new(),
            code_execution: true,
            previous_reports: Vec::new(),
            webhook_url: None,
            brand_collection_id: None,
            metadata: None,
        }
    }

    /// Sets the mode.
    pub fn mode(mut self, mode: DeepResearchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replaces the output formats.
    pub fn output_formats(mut self, formats: Vec<serde_json::Value>) -> Self {
        self.output_formats = formats;
        self
    }

    /// Sets the strategy.
    pub fn strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    /// Sets search settings.
    pub fn search(mut self, search: DeepResearchSearchConfig) -> Self {
        self.search = Some(search);
        self
    }

    /// Sets URLs to read.
    pub fn urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.urls = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches a file.
    pub fn file(mut self, file: FileAttachment) -> Self {
        self.files.push(file);
        self
    }

    /// Adds a deliverable.
    pub fn deliverable(mut self, deliverable: serde_json::Value) -> Self {
        self.deliverables.push(deliverable);
        self
    }

    /// Adds an MCP server.
    pub fn mcp_server(mut self, server: McpServerConfig) -> Self {
        self.mcp_servers.push(server);
        self
    }

    /// Enables or disables code execution.
    pub fn code_execution(mut self, enabled: bool) -> Self {
        self.code_execution = enabled;
        self
    }

    /// Sets earlier reports to build on.
    pub fn previous_reports<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.previous_reports = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the webhook.
    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    /// Sets the brand collection.
    pub fn brand_collection_id(mut self, id: impl Into<String>) -> Self {
        self.brand_collection_id = Some(id.into());
        self
    }

    /// Sets caller metadata.
    pub fn metadata(mut self, metadata: serde_json::Map<String, serde_json::Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Validates the request.
    pub fn validate(&self) -> Result<(), ValyuError> {
        if self.query.trim().is_empty() {
            return Err(ValyuError::validation_param(
                "query is required and cannot be empty",
                "query",
                None,
            ));
        }
        if let Some(search) = &self.search {
            search.validate()?;
        }
        Ok(())
    }
}

/// Step counters of a running task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Current step.
    #[serde(default)]
    pub current_step: u32,
    /// Planned steps.
    #[serde(default)]
    pub total_steps: u32,
}

/// A source cited in a report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeepResearchSource {
    /// Title.
    #[serde(default)]
    pub title: String,
    /// URL.
    #[serde(default)]
    pub url: String,
    /// Snippet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Source identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Price charged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Document id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// DOI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    /// Category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Cost breakdown of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepResearchUsage {
    /// Search cost.
    #[serde(default)]
    pub search_cost: f64,
    /// Contents cost.
    #[serde(default)]
    pub contents_cost: f64,
    /// Model cost.
    #[serde(default)]
    pub ai_cost: f64,
    /// Code execution cost.
    #[serde(default)]
    pub compute_cost: f64,
    /// Total.
    #[serde(default)]
    pub total_cost: f64,
}

/// A chart or image generated for a report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Image id.
    #[serde(default)]
    pub image_id: String,
    /// Image type.
    #[serde(default)]
    pub image_type: String,
    /// Owning task.
    #[serde(default)]
    pub deepresearch_id: String,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Download URL.
    #[serde(default)]
    pub image_url: String,
    /// Storage key.
    #[serde(default)]
    pub s3_key: String,
    /// Creation time, epoch milliseconds.
    #[serde(default)]
    pub created_at: i64,
    /// Chart type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,
}

/// A generated deliverable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliverableResult {
    /// Deliverable id.
    #[serde(default)]
    pub id: String,
    /// What was requested.
    #[serde(default)]
    pub request: String,
    /// File type.
    #[serde(default, rename = "type")]
    pub deliverable_type: String,
    /// Generation status.
    #[serde(default)]
    pub status: String,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Download URL.
    #[serde(default)]
    pub url: String,
    /// Storage key.
    #[serde(default)]
    pub s3_key: String,
    /// Rows, for tabular output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
    /// Columns, for tabular output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_count: Option<u64>,
    /// Generation error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Creation time, epoch milliseconds.
    #[serde(default)]
    pub created_at: i64,
}

/// Response to task creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeepResearchCreateResponse {
    /// Whether the task was accepted.
    #[serde(default)]
    pub success: bool,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Task id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deepresearch_id: Option<String>,
    /// Initial status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeepResearchStatus>,
    /// Mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<DeepResearchMode>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Echoed metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    /// Whether the report is public.
    #[serde(default)]
    pub public: bool,
    /// Secret for verifying webhook calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
    /// Server message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Status of a research task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeepResearchStatusResponse {
    /// Whether the status call succeeded.
    #[serde(default)]
    pub success: bool,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Task id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deepresearch_id: Option<String>,
    /// Current state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeepResearchStatus>,
    /// Research question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<DeepResearchMode>,
    /// Requested formats.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_formats: Vec<serde_json::Value>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Whether the report is public.
    #[serde(default)]
    pub public: bool,
    /// Step counters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    /// Agent messages so far, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<serde_json::Value>,
    /// Completion time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// Report, markdown text or structured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    /// Kind of `output`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
    /// PDF download URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    /// Generated images.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageMetadata>,
    /// Generated deliverables.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deliverables: Vec<DeliverableResult>,
    /// Cited sources.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<DeepResearchSource>,
    /// Total cost in dollars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// Cost breakdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<DeepResearchUsage>,
    /// Owning batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    /// Task id within the batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_task_id: Option<String>,
}

impl DeepResearchStatusResponse {
    /// Returns true once the task reached completed, failed or cancelled.
    pub fn is_terminal(&self) -> bool {
        self.status.is_some_and(|s| s.is_terminal())
    }
}

/// Entry of a task listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepResearchListItem {
    /// Task id.
    pub deepresearch_id: String,
    /// Research question.
    #[serde(default)]
    pub query: String,
    /// Current state.
    pub status: DeepResearchStatus,
    /// Creation time, epoch milliseconds.
    #[serde(default)]
    pub created_at: i64,
    /// Whether the report is public.
    #[serde(default)]
    pub public: bool,
}

/// Options for listing tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepResearchListOptions {
    /// API key whose tasks to list (required).
    pub api_key_id: String,
    /// Page size.
    pub limit: u32,
}

impl DeepResearchListOptions {
    /// Lists tasks created with the given API key.
    pub fn new(api_key_id: impl Into<String>) -> Self {
        Self {
            api_key_id: api_key_id.into(),
            limit: DEFAULT_LIST_LIMIT,
        }
    }

    /// Sets the page size.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// Task listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeepResearchListResponse {
    /// Whether the call succeeded.
    #[serde(default)]
    pub success: bool,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Tasks.
    #[serde(default)]
    pub data: Vec<DeepResearchListItem>,
}

/// Response to update, cancel, delete and visibility calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeepResearchTaskResponse {
    /// Whether the call succeeded.
    #[serde(default)]
    pub success: bool,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Server message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Task id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deepresearch_id: Option<String>,
    /// New visibility, for visibility changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

/// A downloaded report asset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeepResearchAssetsResponse {
    /// Whether the download succeeded.
    #[serde(default)]
    pub success: bool,
    /// Error message on failure.
    #[serde(default)]
    pub error: Option<String>,
    /// Raw bytes.
    #[serde(skip)]
    pub data: Vec<u8>,
    /// `Content-Type` of the asset.
    #[serde(skip)]
    pub content_type: Option<String>,
}

impl_api_response!(
    DeepResearchCreateResponse,
    DeepResearchStatusResponse,
    DeepResearchListResponse,
    DeepResearchTaskResponse,
    DeepResearchAssetsResponse,
);
