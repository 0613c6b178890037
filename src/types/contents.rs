//! Contents extraction types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::common::{impl_api_response, ExtractEffort, ResponseLength};
use crate::errors::ValyuError;
use crate::validation;

/// Contents request for `POST /contents`.
#[derive(Debug, Clone, Serialize)]
pub struct ContentsRequest {
    /// Pages to extract, 1 to 10.
    pub urls: Vec<String>,

    /// `true` for a default summary, a string prompt, or a JSON schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<serde_json::Value>,

    /// Extraction effort.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_effort: Option<ExtractEffort>,

    /// Per-page content length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_length: Option<ResponseLength>,

    /// Spend ceiling in dollars.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price_dollars: Option<f64>,

    /// Capture a screenshot of each page.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub screenshot: bool,
}

impl ContentsRequest {
    /// Creates a contents request.
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            summary: None,
            extract_effort: None,
            response_length: None,
            max_price_dollars: None,
            screenshot: false,
        }
    }

    /// Sets the summary option.
    pub fn summary(mut self, summary: serde_json::Value) -> Self {
        self.summary = Some(summary);
        self
    }

    /// Sets extraction effort.
    pub fn extract_effort(mut self, effort: ExtractEffort) -> Self {
        self.extract_effort = Some(effort);
        self
    }

    /// Sets response length.
    pub fn response_length(mut self, length: ResponseLength) -> Self {
        self.response_length = Some(length);
        self
    }

    /// Sets the price ceiling.
    pub fn max_price_dollars(mut self, price: f64) -> Self {
        self.max_price_dollars = Some(price);
        self
    }

    /// Requests screenshots.
    pub fn screenshot(mut self, screenshot: bool) -> Self {
        self.screenshot = screenshot;
        self
    }

    /// Validates the request.
    pub fn validate(&self) -> Result<(), ValyuError> {
        if self.urls.is_empty() {
            return Err(ValyuError::validation_param(
                "urls array cannot be empty",
                "urls",
                None,
            ));
        }
        if self.urls.len() > validation::MAX_CONTENTS_URLS {
            return Err(ValyuError::validation_param(
                format!(
                    "Maximum {} URLs allowed per request",
                    validation::MAX_CONTENTS_URLS
                ),
                "urls",
                Some(self.urls.len().to_string()),
            ));
        }
        validation::validate_non_negative("max_price_dollars", self.max_price_dollars)?;
        Ok(())
    }
}

/// Extracted page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentResult {
    /// Page URL.
    #[serde(default)]
    pub url: String,
    /// Page title.
    #[serde(default)]
    pub title: String,
    /// Extracted content.
    #[serde(default)]
    pub content: serde_json::Value,
    /// Content length.
    #[serde(default)]
    pub length: u64,
    /// Source identifier.
    #[serde(default)]
    pub source: String,
    /// Price charged for this page.
    #[serde(default)]
    pub price: f64,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Summary, text or structured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<serde_json::Value>,
    /// Whether summarization succeeded.
    #[serde(default)]
    pub summary_success: bool,
    /// Data type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// Image URLs keyed by role.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub image_url: HashMap<String, String>,
    /// Screenshot location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_url: Option<String>,
    /// Citation string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
}

/// Contents response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentsResponse {
    /// Whether extraction succeeded.
    #[serde(default)]
    pub success: bool,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Transaction id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,
    /// URLs in the request.
    #[serde(default)]
    pub urls_requested: u32,
    /// URLs extracted.
    #[serde(default)]
    pub urls_processed: u32,
    /// URLs that failed.
    #[serde(default)]
    pub urls_failed: u32,
    /// Extracted pages.
    #[serde(default)]
    pub results: Vec<ContentResult>,
    /// Total cost in dollars.
    #[serde(default)]
    pub total_cost_dollars: f64,
    /// Characters returned.
    #[serde(default)]
    pub total_characters: u64,
}

impl_api_response!(ContentsResponse);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_bounds() {
        let empty: Vec<String> = Vec::new();
        let err = ContentsRequest::new(empty).validate().unwrap_err();
        assert_eq!(err.message(), "urls array cannot be empty");

        let many: Vec<String> = (0..11).map(|i| format!("https://e.com/{i}")).collect();
        let err = ContentsRequest::new(many).validate().unwrap_err();
        assert_eq!(err.message(), "Maximum 10 URLs allowed per request");

        assert!(ContentsRequest::new(["https://e.com"]).validate().is_ok());
    }

    #[test]
    fn test_serialization() {
        let request = ContentsRequest::new(["https://e.com"])
            .summary(serde_json::json!(true))
            .extract_effort(ExtractEffort::High);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "urls": ["https://e.com"],
                "summary": true,
                "extract_effort": "high",
            })
        );
    }
}
