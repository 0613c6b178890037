//! Enumerations and helpers shared across the Valyu API.

use serde::{Deserialize, Serialize};

/// Which corpora a search or answer draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Web and proprietary sources.
    #[default]
    All,
    /// Web only.
    Web,
    /// Proprietary datasets only.
    Proprietary,
    /// News sources only.
    News,
}

/// Requested size of returned content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseLength {
    /// Short excerpts.
    Short,
    /// Medium excerpts.
    Medium,
    /// Large excerpts.
    Large,
    /// Full content.
    Max,
}

/// Extraction effort for the contents endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractEffort {
    /// Standard extraction.
    Normal,
    /// Slower, more thorough extraction.
    High,
    /// Let the service decide.
    Auto,
}

/// Deep research depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeepResearchMode {
    /// Quick research pass.
    #[default]
    Fast,
    /// Balanced research.
    Standard,
    /// Exhaustive research.
    Heavy,
}

/// Lifecycle state of a deep research task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeepResearchStatus {
    /// Accepted, not started.
    Queued,
    /// In progress.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Cancelled by the caller.
    Cancelled,
    /// A status this client does not know about.
    #[serde(other)]
    Unknown,
}

impl DeepResearchStatus {
    /// Returns true for completed, failed and cancelled.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DeepResearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Accepting tasks.
    Open,
    /// Tasks are running.
    Processing,
    /// All tasks completed.
    Completed,
    /// All tasks finished, some failed.
    CompletedWithErrors,
    /// Cancelled by the caller.
    Cancelled,
    /// A status this client does not know about.
    #[serde(other)]
    Unknown,
}

impl BatchStatus {
    /// Returns true once no further progress will happen.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::CompletedWithErrors | Self::Cancelled
        )
    }
}

/// Datasource catalog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasourceCategoryId {
    /// Academic research.
    Research,
    /// Healthcare and life sciences.
    Healthcare,
    /// Patent filings.
    Patents,
    /// Financial markets.
    Markets,
    /// Company data.
    Company,
    /// Economic indicators.
    Economic,
    /// Prediction markets.
    Predictions,
    /// Transportation.
    Transportation,
    /// Legal documents.
    Legal,
    /// Politics.
    Politics,
}

impl DatasourceCategoryId {
    /// Wire name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Healthcare => "healthcare",
            Self::Patents => "patents",
            Self::Markets => "markets",
            Self::Company => "company",
            Self::Economic => "economic",
            Self::Predictions => "predictions",
            Self::Transportation => "transportation",
            Self::Legal => "legal",
            Self::Politics => "politics",
        }
    }
}

/// Response types that carry an in-band `success`/`error` pair.
///
/// Validation failures and API failures on plain endpoints are reported by
/// constructing a failure value instead of returning an error.
pub trait ApiResponse: serde::de::DeserializeOwned + Send + 'static {
    /// Builds a `success: false` response with the given message.
    fn failure(message: impl Into<String>) -> Self;

    /// Whether the operation succeeded.
    fn is_success(&self) -> bool;

    /// The error message, if any.
    fn error_message(&self) -> Option<&str>;
}

/// Implements [`ApiResponse`] for structs with `success: bool`,
/// `error: Option<String>` and a `Default` impl.
macro_rules! impl_api_response {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::types::common::ApiResponse for $ty {
                fn failure(message: impl Into<String>) -> Self {
                    Self {
                        success: false,
                        error: Some(message.into()),
                        ..Default::default()
                    }
                }

                fn is_success(&self) -> bool {
                    self.success
                }

                fn error_message(&self) -> Option<&str> {
                    self.error.as_deref()
                }
            }
        )+
    };
}

pub(crate) use impl_api_response;
