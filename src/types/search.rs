//! Search types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::common::{impl_api_response, ResponseLength, SearchType};
use crate::errors::ValyuError;
use crate::validation;

/// Default number of results per search.
pub const DEFAULT_MAX_NUM_RESULTS: u32 = 10;

/// Default relevance cut-off.
pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 0.5;

/// Search request for `POST /deepsearch`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    /// Search query (required).
    pub query: String,

    /// Corpora to search.
    pub search_type: SearchType,

    /// Number of results, 1 to 100.
    pub max_num_results: u32,

    /// Maximum price per thousand results, in dollars.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,

    /// Whether the query comes from an agent tool call.
    pub is_tool_call: bool,

    /// Minimum relevance score.
    pub relevance_threshold: f64,

    /// Sources to restrict the search to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub included_sources: Vec<String>,

    /// Sources to leave out.
    #[serde(rename = "exclude_sources", skip_serializing_if = "Vec::is_empty")]
    pub excluded_sources: Vec<String>,

    /// Category hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Earliest publication date, `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// Latest publication date, `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    /// Country bias, `ALL` or ISO 3166-1 alpha-2.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,

    /// Per-result content length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_length: Option<ResponseLength>,

    /// Trade depth for latency.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fast_mode: bool,

    /// Return URLs without content.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub url_only: bool,
}

impl SearchRequest {
    /// Creates a search request with the service defaults.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            search_type: SearchType::default(),
            max_num_results: DEFAULT_MAX_NUM_RESULTS,
            max_price: None,
            is_tool_call: true,
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            included_sources: Vec::new(),
            excluded_sources: Vec::new(),
            category: None,
            start_date: None,
            end_date: None,
            country_code: None,
            response_length: None,
            fast_mode: false,
            url_only: false,
        }
    }

    /// Sets the search type.
    pub fn search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    /// Sets the number of results.
    pub fn max_num_results(mut self, n: u32) -> Self {
        self.max_num_results = n;
        self
    }

    /// Sets the price ceiling.
    pub fn max_price(mut self, price: f64) -> Self {
        self.max_price = Some(price);
        self
    }

    /// Marks the query as a tool call or not.
    pub fn is_tool_call(mut self, is_tool_call: bool) -> Self {
        self.is_tool_call = is_tool_call;
        self
    }

    /// Sets the relevance threshold.
    pub fn relevance_threshold(mut self, threshold: f64) -> Self {
        self.relevance_threshold = threshold;
        self
    }

    /// Restricts the search to these sources.
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

    /// Sets the category hint.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
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

    /// Sets the country code.
    pub fn country_code(mut self, code: impl Into<String>) -> Self {
        self.country_code = Some(code.into());
        self
    }

    /// Sets the response length.
    pub fn response_length(mut self, length: ResponseLength) -> Self {
        self.response_length = Some(length);
        self
    }

    /// Enables fast mode.
    pub fn fast_mode(mut self, fast: bool) -> Self {
        self.fast_mode = fast;
        self
    }

    /// Only return URLs.
    pub fn url_only(mut self, url_only: bool) -> Self {
        self.url_only = url_only;
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
        validation::validate_date("start_date", self.start_date.as_deref())?;
        validation::validate_date("end_date", self.end_date.as_deref())?;
        validation::validate_range(
            "max_num_results",
            self.max_num_results,
            validation::MAX_NUM_RESULTS_RANGE,
        )?;
        validation::validate_sources("included_sources", &self.included_sources)?;
        validation::validate_sources("excluded_sources", &self.excluded_sources)?;
        validation::validate_non_negative("max_price", self.max_price)?;
        validation::validate_country_code(self.country_code.as_deref())?;
        Ok(())
    }
}

/// A single retrieved document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Title.
    #[serde(default)]
    pub title: String,

    /// Canonical URL.
    #[serde(default)]
    pub url: String,

    /// Body, text or structured data depending on the source.
    #[serde(default)]
    pub content: serde_json::Value,

    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Source identifier.
    #[serde(default)]
    pub source: String,

    /// Kind of source (web, paper, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,

    /// Data type (unstructured, structured).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,

    /// Date the document was indexed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Content length in characters.
    #[serde(default)]
    pub length: u64,

    /// Relevance score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,

    /// Publication date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,

    /// Document identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Image URLs keyed by role.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub image_url: HashMap<String, String>,
}

/// Result counts per corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsBySource {
    /// Web results.
    #[serde(default)]
    pub web: u32,
    /// Proprietary results.
    #[serde(default)]
    pub proprietary: u32,
}

/// Search response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Whether the search succeeded.
    #[serde(default)]
    pub success: bool,

    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Transaction id.
    #[serde(default)]
    pub tx_id: String,

    /// Echo of the query.
    #[serde(default)]
    pub query: String,

    /// Results in relevance order.
    #[serde(default)]
    pub results: Vec<SearchResult>,

    /// Result counts per corpus.
    #[serde(default)]
    pub results_by_source: ResultsBySource,

    /// Cost per thousand.
    #[serde(default)]
    pub total_deduction_pcm: f64,

    /// Total cost in dollars.
    #[serde(default)]
    pub total_deduction_dollars: f64,

    /// Characters returned.
    #[serde(default)]
    pub total_characters: u64,
}

impl_api_response!(SearchResponse);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_serialized() {
        let request = SearchRequest::new("quantum computing");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "query": "quantum computing",
                "search_type": "all",
                "max_num_results": 10,
                "is_tool_call": true,
                "relevance_threshold": 0.5,
            })
        );
    }

    #[test]
    fn test_excluded_sources_wire_name() {
        let request = SearchRequest::new("q")
            .excluded_sources(["example.com"])
            .fast_mode(true);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["exclude_sources"], serde_json::json!(["example.com"]));
        assert!(json.get("excluded_sources").is_none());
        assert_eq!(json["fast_mode"], true);
        assert!(json.get("url_only").is_none());
    }

    #[test]
    fn test_validate() {
        assert!(SearchRequest::new("q").validate().is_ok());
        assert!(SearchRequest::new("q").max_num_results(0).validate().is_err());
        assert!(SearchRequest::new("q").max_num_results(101).validate().is_err());
        assert!(SearchRequest::new("q")
            .start_date("2024/01/01")
            .validate()
            .is_err());

        let err = SearchRequest::new(" ").validate().unwrap_err();
        assert_eq!(
            err.message(),
            "Query is required and must be a non-empty string"
        );
    }

    #[test]
    fn test_result_tolerates_missing_fields() {
        let result: SearchResult =
            serde_json::from_str(r#"{"title":"A","url":"https://a.com","relevance_score":0.9}"#)
                .unwrap();
        assert_eq!(result.title, "A");
        assert_eq!(result.relevance_score, Some(0.9));
        assert!(result.content.is_null());
    }
}
