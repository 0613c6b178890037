//! Datasource catalog types.

use serde::{Deserialize, Serialize};

use super::common::{impl_api_response, DatasourceCategoryId};

/// Pricing of a datasource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasourcePricing {
    /// Cost per thousand results.
    #[serde(default)]
    pub cpm: f64,
}

/// Date coverage of a datasource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceCoverage {
    /// First covered date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Last covered date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// A searchable datasource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Datasource {
    /// Source identifier, usable in `included_sources`.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Category, kept as text so new categories still decode.
    #[serde(default)]
    pub category: String,
    /// Source type.
    #[serde(default, rename = "type")]
    pub source_type: String,
    /// Modalities (text, images, ...).
    #[serde(default)]
    pub modality: Vec<String>,
    /// Topics.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Languages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
    /// Upstream provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Sample queries.
    #[serde(default)]
    pub example_queries: Vec<String>,
    /// Pricing.
    #[serde(default)]
    pub pricing: DatasourcePricing,
    /// Schema of structured results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    /// Refresh cadence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_frequency: Option<String>,
    /// Number of documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Date coverage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<DatasourceCoverage>,
}

/// A datasource category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceCategory {
    /// Category id.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Datasources in the category.
    #[serde(default)]
    pub dataset_count: u32,
}

/// Filter for the datasource listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasourcesListOptions {
    /// Only this category.
    pub category: Option<DatasourceCategoryId>,
}

/// Datasource listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasourcesListResponse {
    /// Whether the call succeeded.
    #[serde(default)]
    pub success: bool,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Datasources.
    #[serde(default)]
    pub datasources: Vec<Datasource>,
}

/// Category listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasourcesCategoriesResponse {
    /// Whether the call succeeded.
    #[serde(default)]
    pub success: bool,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Categories.
    #[serde(default)]
    pub categories: Vec<DatasourceCategory>,
}

impl_api_response!(DatasourcesListResponse, DatasourcesCategoriesResponse);
