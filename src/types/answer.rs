//! Answer types, including the streamed event model.

use serde::{Deserialize, Serialize};

use super::common::{impl_api_response, SearchType};
use super::search::SearchResult;
use crate::errors::ValyuError;
use crate::validation;

/// Answer request for `POST /answer`.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerRequest {
    /// Question to answer (required).
    pub query: String,

    /// Corpora to draw from.
    pub search_type: SearchType,

    /// JSON schema the answer must follow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_output: Option<serde_json::Value>,

    /// Extra instructions for the answering model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instructions: Option<String>,

    /// Maximum spend on data, in dollars.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_max_price: Option<f64>,

    /// Country bias.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,

    /// Sources to restrict retrieval to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub included_sources: Vec<String>,

    /// Sources to leave out.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excluded_sources: Vec<String>,

    /// Earliest publication date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// Latest publication date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    /// Trade depth for latency.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fast_mode: bool,
}

impl AnswerRequest {
    /// Creates an answer request. The query is trimmed.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into().trim().to_string(),
            search_type: SearchType::default(),
            structured_output: None,
            system_instructions: None,
            data_max_price: None,
            country_code: None,
            included_sources: Vec::new(),
            excluded_sources: Vec::new(),
            start_date: None,
            end_date: None,
            fast_mode: false,
        }
    }

    /// Sets the search type.
    pub fn search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    /// Requests structured output matching a JSON schema.
    pub fn structured_output(mut self, schema: serde_json::Value) -> Self {
        self.structured_output = Some(schema);
        self
    }

    /// Sets system instructions.
    pub fn system_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.system_instructions = Some(instructions.into());
        self
    }

    /// Sets the data price ceiling.
    pub fn data_max_price(mut self, price: f64) -> Self {
        self.data_max_price = Some(price);
        self
    }

    /// Sets the country code.
    pub fn country_code(mut self, code: impl Into<String>) -> Self {
        self.country_code = Some(code.into());
        self
    }

    /// Restricts retrieval to these sources.
    pub fn included_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.included_sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Excludes these sources.
    pub fn excluded_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the start date.
    pub fn start_date(mut self, date: impl Into<String>) -> Self {
        self.start_date = Some(date.into());
        self
    }

    /// Sets the end date.
    pub fn end_date(mut self, date: impl Into<String>) -> Self {
        self.end_date = Some(date.into());
        self
    }

    /// Enables fast mode.
    pub fn fast_mode(mut self, fast: bool) -> Self {
        self.fast_mode = fast;
        self
    }

    /// Validates the request.
    pub fn validate(&self) -> Result<(), ValyuError> {
        validation::validate_required("query", &self.query).map_err(|_| {
            ValyuError::validation_param(
                "Query is required and must be a non-empty string",
                "query",
                None,
            )
        })?;
        validation::validate_instructions(
            "system_instructions",
            self.system_instructions.as_deref(),
            validation::MAX_SYSTEM_INSTRUCTIONS_LEN,
        )?;
        validation::validate_non_negative("data_max_price", self.data_max_price)?;
        validation::validate_date("start_date", self.start_date.as_deref())?;
        validation::validate_date("end_date", self.end_date.as_deref())?;
        validation::validate_sources("included_sources", &self.included_sources)?;
        validation::validate_sources("excluded_sources", &self.excluded_sources)?;
        validation::validate_country_code(self.country_code.as_deref())?;
        Ok(())
    }

    /// Returns the wire form: instructions trimmed.
    pub(crate) fn normalized(mut self) -> Self {
        if let Some(instructions) = self.system_instructions.take() {
            self.system_instructions = Some(instructions.trim().to_string());
        }
        self
    }
}

/// Retrieval summary attached to an answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchMetadata {
    /// Transaction ids of the underlying searches.
    #[serde(default)]
    pub tx_ids: Vec<String>,
    /// Results retrieved.
    #[serde(default)]
    pub number_of_results: u32,
    /// Characters retrieved.
    #[serde(default)]
    pub total_characters: u64,
}

/// Model token usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiUsage {
    /// Prompt tokens.
    #[serde(default)]
    pub input_tokens: u64,
    /// Completion tokens.
    #[serde(default)]
    pub output_tokens: u64,
}

/// Cost breakdown in dollars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    /// Total charged.
    #[serde(default)]
    pub total_deduction_dollars: f64,
    /// Search portion.
    #[serde(default)]
    pub search_deduction_dollars: f64,
    /// Contents portion.
    #[serde(default)]
    pub contents_deduction_dollars: f64,
    /// Model portion.
    #[serde(default)]
    pub ai_deduction_dollars: f64,
}

/// Final answer, either returned directly or folded from a stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    /// Whether the answer succeeded.
    #[serde(default)]
    pub success: bool,

    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Transaction id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,

    /// Echo of the query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_query: Option<String>,

    /// Answer text, or a structured value when structured output was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<serde_json::Value>,

    /// `unstructured` or `structured`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,

    /// Sources the answer was built from.
    #[serde(default)]
    pub search_results: Vec<SearchResult>,

    /// Retrieval summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_metadata: Option<SearchMetadata>,

    /// Token usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_usage: Option<AiUsage>,

    /// Cost breakdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Cost>,
}

impl AnswerResponse {
    /// Answer text, when the contents are a plain string.
    pub fn text(&self) -> Option<&str> {
        self.contents.as_ref().and_then(serde_json::Value::as_str)
    }
}

impl_api_response!(AnswerResponse);

/// One decoded event of an answer stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A fragment of generated text.
    Content {
        /// Text fragment, possibly empty when only a finish reason arrived.
        text: String,
        /// Set on the final fragment.
        finish_reason: Option<String>,
    },

    /// A batch of results surfaced mid-stream.
    SearchResults {
        /// Results in arrival order.
        results: Vec<SearchResult>,
    },

    /// Summary metadata. Only the fields present in the frame are set.
    Metadata(Box<StreamMetadata>),

    /// End-of-stream sentinel.
    Done,

    /// Error reported inside the stream.
    Error {
        /// Error message.
        message: String,
    },
}

impl StreamEvent {
    /// Short name for logging and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Content { .. } => "content",
            StreamEvent::SearchResults { .. } => "search_results",
            StreamEvent::Metadata(_) => "metadata",
            StreamEvent::Done => "done",
            StreamEvent::Error { .. } => "error",
        }
    }
}

/// Fields of a `Metadata` stream event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StreamMetadata {
    /// Transaction id.
    #[serde(default)]
    pub tx_id: Option<String>,
    /// Echo of the query.
    #[serde(default)]
    pub original_query: Option<String>,
    /// `unstructured` or `structured`.
    #[serde(default)]
    pub data_type: Option<String>,
    /// Structured output, when requested.
    #[serde(default)]
    pub contents: Option<serde_json::Value>,
    /// Retrieval summary.
    #[serde(default)]
    pub search_metadata: Option<SearchMetadata>,
    /// Token usage.
    #[serde(default)]
    pub ai_usage: Option<AiUsage>,
    /// Cost breakdown.
    #[serde(default)]
    pub cost: Option<Cost>,
    /// Authoritative result list, replacing any mid-stream batches.
    #[serde(default)]
    pub search_results: Option<Vec<SearchResult>>,
}
