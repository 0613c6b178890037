//! Batch types.

use serde::{Deserialize, Serialize};

use super::common::{impl_api_response, BatchStatus, DeepResearchMode, DeepResearchStatus};
use super::deep_research::DeepResearchSearchConfig;
use crate::errors::ValyuError;
use crate::validation;

/// Per-state task counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    /// All tasks.
    #[serde(default)]
    pub total: u32,
    /// Waiting.
    #[serde(default)]
    pub queued: u32,
    /// In progress.
    #[serde(default)]
    pub running: u32,
    /// Succeeded.
    #[serde(default)]
    pub completed: u32,
    /// Failed.
    #[serde(default)]
    pub failed: u32,
    /// Cancelled.
    #[serde(default)]
    pub cancelled: u32,
}

impl BatchCounts {
    /// Tasks that reached a terminal state.
    pub fn finished(&self) -> u32 {
        self.completed + self.failed + self.cancelled
    }
}

/// A batch of research tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    /// Batch id.
    pub batch_id: String,
    /// Owning organisation.
    #[serde(default)]
    pub organisation_id: String,
    /// Creating API key.
    #[serde(default)]
    pub api_key_id: String,
    /// Credit line.
    #[serde(default)]
    pub credit_id: String,
    /// Current state.
    pub status: BatchStatus,
    /// Mode applied to every task.
    #[serde(default)]
    pub mode: DeepResearchMode,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Report formats.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_formats: Vec<serde_json::Value>,
    /// Search settings applied to every task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_params: Option<DeepResearchSearchConfig>,
    /// Creation time.
    #[serde(default)]
    pub created_at: String,
    /// Completion time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// Task counts.
    #[serde(default)]
    pub counts: BatchCounts,
    /// Cost so far in dollars.
    #[serde(default)]
    pub cost: f64,
    /// Secret for verifying webhook calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
    /// Caller metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Request for `POST /deepresearch/batches`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateBatchRequest {
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Mode applied to every task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<DeepResearchMode>,
    /// Report formats.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub output_formats: Vec<serde_json::Value>,
    /// Search settings applied to every task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<DeepResearchSearchConfig>,
    /// Completion webhook.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// Caller metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl CreateBatchRequest {
    /// Creates an empty batch request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the mode.
    pub fn mode(mut self, mode: DeepResearchMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Sets output formats.
    pub fn output_formats(mut self, formats: Vec<serde_json::Value>) -> Self {
        self.output_formats = formats;
        self
    }

    /// Sets search settings.
    pub fn search(mut self, search: DeepResearchSearchConfig) -> Self {
        self.search = Some(search);
        self
    }

    /// Sets the webhook.
    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    /// Sets caller metadata.
    pub fn metadata(mut self, metadata: serde_json::Map<String, serde_json::Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Validates the request.
    pub fn validate(&self) -> Result<(), ValyuError> {
        match &self.search {
            Some(search) => search.validate(),
            None => Ok(()),
        }
    }
}

/// One task to add to a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchTaskInput {
    /// Caller-chosen task id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Research question (required).
    pub query: String,
    /// Free-text strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// URLs to read up front.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    /// Caller metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl BatchTaskInput {
    /// Creates a task.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Sets the caller-chosen id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Body of `POST /deepresearch/batches/{id}/tasks`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AddBatchTasksRequest {
    /// Tasks, 1 to 100.
    pub tasks: Vec<BatchTaskInput>,
}

impl AddBatchTasksRequest {
    /// Wraps a task list.
    pub fn new(tasks: Vec<BatchTaskInput>) -> Self {
        Self { tasks }
    }

    /// Validates the request.
    pub fn validate(&self) -> Result<(), ValyuError> {
        if self.tasks.is_empty() {
            return Err(ValyuError::validation_param(
                "tasks array cannot be empty",
                "tasks",
                None,
            ));
        }
        if self.tasks.len() > validation::MAX_BATCH_TASKS {
            return Err(ValyuError::validation_param(
                format!(
                    "Maximum {} tasks allowed per request",
                    validation::MAX_BATCH_TASKS
                ),
                "tasks",
                Some(self.tasks.len().to_string()),
            ));
        }
        if self.tasks.iter().any(|t| t.query.trim().is_empty()) {
            return Err(ValyuError::validation_param(
                "Each task must have a 'query' field",
                "tasks",
                None,
            ));
        }
        Ok(())
    }
}

/// Filters for listing a batch's tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListBatchTasksOptions {
    /// Only tasks in this state.
    pub status: Option<DeepResearchStatus>,
    /// Page size.
    pub limit: Option<u32>,
    /// Pagination cursor from a previous page.
    pub last_key: Option<String>,
}

/// Response to batch creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBatchResponse {
    /// Whether the batch was created.
    #[serde(default)]
    pub success: bool,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Batch id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    /// Initial state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BatchStatus>,
    /// Mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<DeepResearchMode>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Report formats.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_formats: Vec<serde_json::Value>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Task counts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<BatchCounts>,
    /// Cost so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// Secret for verifying webhook calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
}

/// Batch status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStatusResponse {
    /// Whether the call succeeded.
    #[serde(default)]
    pub success: bool,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<Batch>,
}

impl BatchStatusResponse {
    /// Returns true once the batch can make no further progress.
    pub fn is_terminal(&self) -> bool {
        self.batch.as_ref().is_some_and(|b| b.status.is_terminal())
    }
}

/// A task created by an add-tasks call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchTaskCreated {
    /// Caller-chosen id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Research task id.
    #[serde(default)]
    pub deepresearch_id: String,
    /// Initial state.
    #[serde(default)]
    pub status: String,
}

/// Response to adding tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddBatchTasksResponse {
    /// Whether the tasks were added.
    #[serde(default)]
    pub success: bool,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Batch id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    /// Tasks added.
    #[serde(default)]
    pub added: u32,
    /// Created tasks.
    #[serde(default)]
    pub tasks: Vec<BatchTaskCreated>,
    /// Updated counts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<BatchCounts>,
}

/// Entry of a batch task listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchTaskListItem {
    /// Research task id.
    pub deepresearch_id: String,
    /// Caller-chosen id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Research question.
    #[serde(default)]
    pub query: String,
    /// Current state.
    pub status: DeepResearchStatus,
    /// Creation time.
    #[serde(default)]
    pub created_at: String,
    /// Completion time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

/// Pagination state of a task listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPagination {
    /// Items in this page.
    #[serde(default)]
    pub count: u32,
    /// Cursor for the next page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_key: Option<String>,
    /// Whether more pages exist.
    #[serde(default)]
    pub has_more: bool,
}

/// Batch task listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListBatchTasksResponse {
    /// Whether the call succeeded.
    #[serde(default)]
    pub success: bool,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Batch id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    /// Tasks.
    #[serde(default)]
    pub tasks: Vec<BatchTaskListItem>,
    /// Pagination state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<BatchPagination>,
}

/// Response to batch cancellation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelBatchResponse {
    /// Whether the batch was cancelled.
    #[serde(default)]
    pub success: bool,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Batch id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    /// New state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BatchStatus>,
    /// Tasks cancelled.
    #[serde(default)]
    pub cancelled_count: u32,
    /// Server message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Batch listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListBatchesResponse {
    /// Whether the call succeeded.
    #[serde(default)]
    pub success: bool,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Batches.
    #[serde(default)]
    pub batches: Vec<Batch>,
}

impl_api_response!(
    CreateBatchResponse,
    BatchStatusResponse,
    AddBatchTasksResponse,
    ListBatchTasksResponse,
    CancelBatchResponse,
    ListBatchesResponse,
);
