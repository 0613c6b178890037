//! Batch service: many deep research tasks run as one unit.

use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::{encode_segment, with_query, ServiceContext};
use crate::errors::{ValyuError, ValyuResult};
use crate::polling::{poll_until_terminal, PollConfig};
use crate::types::{
    AddBatchTasksRequest, AddBatchTasksResponse, Batch, BatchStatusResponse,
    CancelBatchResponse, CreateBatchRequest, CreateBatchResponse, ListBatchTasksOptions,
    ListBatchTasksResponse, ListBatchesResponse,
};

/// Batch service (`/deepresearch/batches/...`).
#[derive(Debug, Clone)]
pub struct BatchService {
    ctx: Arc<ServiceContext>,
}

impl BatchService {
    /// Creates a new batch service.
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Creates an empty batch.
    #[instrument(skip(self, request))]
    pub async fn create(&self, request: CreateBatchRequest) -> ValyuResult<CreateBatchResponse> {
        if let Err(e) = request.validate() {
            return Ok(self.ctx.reject("batch.create", e));
        }

        let http_request = self.ctx.post("deepresearch/batches", &request)?;
        self.ctx.execute("batch.create", http_request).await
    }

    /// Fetches a batch with its task counts.
    #[instrument(skip(self))]
    pub async fn status(&self, batch_id: &str) -> ValyuResult<BatchStatusResponse> {
        let request = self.ctx.get(batch_path(batch_id));
        self.ctx.execute("batch.status", request).await
    }

    /// Adds up to 100 tasks to a batch.
    #[instrument(skip(self, request), fields(tasks = request.tasks.len()))]
    pub async fn add_tasks(
        &self,
        batch_id: &str,
        request: AddBatchTasksRequest,
    ) -> ValyuResult<AddBatchTasksResponse> {
        if let Err(e) = request.validate() {
            return Ok(self.ctx.reject("batch.add_tasks", e));
        }

        let http_request = self
            .ctx
            .post(format!("{}/tasks", batch_path(batch_id)), &request)?;
        self.ctx.execute("batch.add_tasks", http_request).await
    }

    /// Lists the tasks of a batch, one page at a time.
    #[instrument(skip(self, options))]
    pub async fn list_tasks(
        &self,
        batch_id: &str,
        options: ListBatchTasksOptions,
    ) -> ValyuResult<ListBatchTasksResponse> {
        let mut params = Vec::new();
        if let Some(status) = options.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(limit) = options.limit.filter(|l| *l > 0) {
            params.push(("limit", limit.to_string()));
        }
        if let Some(last_key) = options.last_key.filter(|k| !k.is_empty()) {
            params.push(("last_key", last_key));
        }

        let path = with_query(&format!("{}/tasks", batch_path(batch_id)), params);
        self.ctx.execute("batch.list_tasks", self.ctx.get(path)).await
    }

    /// Cancels every unfinished task of a batch.
    #[instrument(skip(self))]
    pub async fn cancel(&self, batch_id: &str) -> ValyuResult<CancelBatchResponse> {
        let request = self
            .ctx
            .post(format!("{}/cancel", batch_path(batch_id)), &json!({}))?;
        self.ctx.execute("batch.cancel", request).await
    }

    /// Lists batches.
    #[instrument(skip(self))]
    pub async fn list(&self, limit: Option<u32>) -> ValyuResult<ListBatchesResponse> {
        let params = limit
            .filter(|l| *l > 0)
            .map(|l| ("limit", l.to_string()));
        let path = with_query("deepresearch/batches", params);
        self.ctx.execute("batch.list", self.ctx.get(path)).await
    }

    /// Polls a batch until it is completed, completed with errors, or
    /// cancelled, and returns it.
    #[instrument(skip(self, cancel, on_progress), fields(interval = ?config.interval))]
    pub async fn wait_for_completion<P>(
        &self,
        batch_id: &str,
        config: PollConfig,
        cancel: &CancellationToken,
        mut on_progress: P,
    ) -> ValyuResult<Batch>
    where
        P: FnMut(&Batch),
    {
        let timer = self.ctx.timer("batch.wait_for_completion");
        let this = self;

        let result = poll_until_terminal(
            config,
            cancel,
            move || this.poll_status(batch_id),
            |status: &BatchStatusResponse| {
                if let Some(batch) = &status.batch {
                    on_progress(batch);
                }
            },
        )
        .await;

        match result.and_then(|status| status.batch.ok_or_else(missing_batch)) {
            Ok(batch) => {
                debug!(status = ?batch.status, finished = batch.counts.finished(), "Batch finished");
                timer.finish(true);
                Ok(batch)
            }
            Err(e) => {
                timer.fail(&e);
                Err(e)
            }
        }
    }

    /// Status fetch for the poller. A body without a batch is an error.
    async fn poll_status(&self, batch_id: &str) -> ValyuResult<BatchStatusResponse> {
        self.ctx.record_poll("batch.status");
        let status: BatchStatusResponse = self
            .ctx
            .execute_checked(self.ctx.get(batch_path(batch_id)))
            .await?;
        if status.success && status.batch.is_none() {
            return Err(missing_batch());
        }
        Ok(status)
    }
}

fn missing_batch() -> ValyuError {
    ValyuError::Serialization {
        message: "Batch status response has no batch".to_string(),
    }
}

fn batch_path(batch_id: &str) -> String {
    format!("deepresearch/batches/{}", encode_segment(batch_id))
}
