//! Valyu API client.

use std::sync::Arc;

use crate::auth::{ApiKeyAuth, AuthProvider};
use crate::config::{ValyuConfig, ValyuConfigBuilder};
use crate::errors::{ValyuError, ValyuResult};
use crate::observability::{DefaultMetricsCollector, MetricsCollector};
use crate::services::{
    AnswerService, BatchService, ContentsService, DatasourcesService, DeepResearchService,
    SearchService, ServiceContext,
};
use crate::transport::{HttpTransport, HttpTransportImpl};

/// The main Valyu client.
///
/// Cheap to clone; every clone shares one transport and one metrics
/// collector.
///
/// # Example
///
/// ```rust,no_run
/// use valyu_client::{SearchRequest, ValyuClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = ValyuClient::builder().api_key("vk_your_api_key").build()?;
///
///     let response = client
///         .search()
///         .search(SearchRequest::new("quantum error correction").max_num_results(5))
///         .await?;
///     for result in &response.results {
///         println!("{} - {}", result.title, result.url);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct ValyuClient {
    config: ValyuConfig,
    metrics: Arc<dyn MetricsCollector>,
    search: SearchService,
    answer: AnswerService,
    contents: ContentsService,
    deep_research: DeepResearchService,
    batch: BatchService,
    datasources: DatasourcesService,
}

impl ValyuClient {
    /// Creates a new client builder.
    pub fn builder() -> ValyuClientBuilder {
        ValyuClientBuilder::new()
    }

    /// Creates a client from environment variables.
    ///
    /// Reads `VALYU_API_KEY` and optionally `VALYU_BASE_URL` and
    /// `VALYU_TIMEOUT`.
    pub fn from_env() -> ValyuResult<Self> {
        let config = ValyuConfig::from_env()?;
        ValyuClientBuilder::from_config(config).build()
    }

    /// Creates a client from an API key.
    pub fn from_api_key(api_key: impl Into<String>) -> ValyuResult<Self> {
        ValyuClientBuilder::new().api_key(api_key).build()
    }

    /// Web and proprietary search.
    pub fn search(&self) -> &SearchService {
        &self.search
    }

    /// Streaming answers.
    pub fn answer(&self) -> &AnswerService {
        &self.answer
    }

    /// URL content extraction.
    pub fn contents(&self) -> &ContentsService {
        &self.contents
    }

    /// Deep research tasks.
    pub fn deep_research(&self) -> &DeepResearchService {
        &self.deep_research
    }

    /// Deep research batches.
    pub fn batch(&self) -> &BatchService {
        &self.batch
    }

    /// Datasource catalog.
    pub fn datasources(&self) -> &DatasourcesService {
        &self.datasources
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ValyuConfig {
        &self.config
    }

    /// Returns the metrics collector.
    pub fn metrics(&self) -> &Arc<dyn MetricsCollector> {
        &self.metrics
    }
}

impl std::fmt::Debug for ValyuClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValyuClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for the Valyu client.
pub struct ValyuClientBuilder {
    config_builder: ValyuConfigBuilder,
    transport: Option<Arc<dyn HttpTransport>>,
    auth: Option<Arc<dyn AuthProvider>>,
    metrics: Option<Arc<dyn MetricsCollector>>,
}

impl ValyuClientBuilder {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self {
            config_builder: ValyuConfigBuilder::new(),
            transport: None,
            auth: None,
            metrics: None,
        }
    }

    /// Creates a builder from an existing configuration.
    pub fn from_config(config: ValyuConfig) -> Self {
        let mut config_builder = ValyuConfigBuilder::new()
            .api_key(config.api_key())
            .base_url(&config.base_url)
            .timeout(config.timeout);
        for (name, value) in config.custom_headers {
            config_builder = config_builder.header(name, value);
        }

        Self {
            config_builder,
            ..Self::new()
        }
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.api_key(api_key);
        self
    }

    /// Sets the API key from an environment variable.
    pub fn api_key_from_env(mut self, var_name: &str) -> ValyuResult<Self> {
        self.config_builder = self.config_builder.api_key_from_env(var_name)?;
        Ok(self)
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.base_url(base_url);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config_builder = self.config_builder.timeout_secs(secs);
        self
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.header(name, value);
        self
    }

    /// Sets a custom transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets a custom auth provider.
    pub fn auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Sets a custom metrics collector.
    pub fn metrics(mut self, metrics: Arc<dyn MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Builds the client.
    pub fn build(self) -> ValyuResult<ValyuClient> {
        let config = self.config_builder.build()?;

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(t) => t,
            None => Arc::new(
                HttpTransportImpl::new(&config.base_url, config.timeout).map_err(|e| {
                    ValyuError::Configuration {
                        message: e.to_string(),
                    }
                })?,
            ),
        };

        let auth: Arc<dyn AuthProvider> = match self.auth {
            Some(a) => a,
            None => Arc::new(ApiKeyAuth::from_string(config.api_key())),
        };
        auth.validate()?;

        let metrics: Arc<dyn MetricsCollector> = self
            .metrics
            .unwrap_or_else(|| Arc::new(DefaultMetricsCollector::new()));

        let ctx = Arc::new(ServiceContext::new(
            transport,
            auth,
            config.custom_headers.clone(),
            Some(Arc::clone(&metrics)),
        ));

        Ok(ValyuClient {
            config,
            metrics,
            search: SearchService::new(Arc::clone(&ctx)),
            answer: AnswerService::new(Arc::clone(&ctx)),
            contents: ContentsService::new(Arc::clone(&ctx)),
            deep_research: DeepResearchService::new(Arc::clone(&ctx)),
            batch: BatchService::new(Arc::clone(&ctx)),
            datasources: DatasourcesService::new(ctx),
        })
    }
}

impl Default for ValyuClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{fixtures, MockTransport};
    use crate::types::SearchRequest;

    #[test]
    fn test_builder_requires_api_key() {
        let result = ValyuClientBuilder::new().build();
        assert!(matches!(result, Err(ValyuError::Configuration { .. })));
    }

    #[test]
    fn test_from_config_keeps_headers() {
        let config = ValyuConfig::builder()
            .api_key("vk_test_key_12345")
            .base_url("https://example.com/v1")
            .header("X-Team", "research")
            .build()
            .unwrap();

        let client = ValyuClientBuilder::from_config(config).build().unwrap();

        assert_eq!(client.config().base_url, "https://example.com/v1");
        assert_eq!(
            client.config().custom_headers,
            vec![("X-Team".to_string(), "research".to_string())]
        );
    }

    #[tokio::test]
    async fn test_services_share_transport_and_metrics() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(fixtures::search_response());

        let client = ValyuClient::builder()
            .api_key("vk_test_key_12345")
            .transport(transport.clone())
            .build()
            .unwrap();

        let response = client
            .search()
            .search(SearchRequest::new("quantum error correction"))
            .await
            .unwrap();

        assert!(response.success);
        let request = transport.last_request().unwrap();
        assert_eq!(request.headers.get("x-api-key").unwrap(), "vk_test_key_12345");

        let snapshot = client.metrics().snapshot();
        assert_eq!(snapshot.total_requests, 1);
        assert_eq!(snapshot.successful_requests, 1);
    }
}
