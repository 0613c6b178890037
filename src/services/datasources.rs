//! Datasource catalog service.

use std::sync::Arc;
use tracing::instrument;

use super::{with_query, ServiceContext};
use crate::errors::ValyuResult;
use crate::types::{DatasourcesCategoriesResponse, DatasourcesListOptions, DatasourcesListResponse};

/// Datasources service (`GET /datasources`).
#[derive(Debug, Clone)]
pub struct DatasourcesService {
    ctx: Arc<ServiceContext>,
}

impl DatasourcesService {
    /// Creates a new datasources service.
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Lists datasources, optionally within one category.
    #[instrument(skip(self))]
    pub async fn list(&self, options: DatasourcesListOptions) -> ValyuResult<DatasourcesListResponse> {
        let params = options
            .category
            .map(|category| ("category", category.as_str().to_string()));
        let path = with_query("datasources", params);
        self.ctx.execute("datasources.list", self.ctx.get(path)).await
    }

    /// Lists the categories with their dataset counts.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> ValyuResult<DatasourcesCategoriesResponse> {
        self.ctx
            .execute("datasources.categories", self.ctx.get("datasources/categories"))
            .await
    }
}
