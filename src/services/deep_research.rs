//! Deep research service.
//!
//! Tasks are created asynchronously and tracked through their status
//! endpoint. [`DeepResearchService::wait`] and
//! [`DeepResearchService::follow`] drive the status poller.

use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::{encode_segment, with_query, ServiceContext};
use crate::errors::{ValyuError, ValyuResult};
use crate::polling::{poll_until_terminal, PollConfig};
use crate::types::{
    ApiResponse, DeepResearchAssetsResponse, DeepResearchCreateRequest,
    DeepResearchCreateResponse, DeepResearchListOptions, DeepResearchListResponse,
    DeepResearchStatus, DeepResearchStatusResponse, DeepResearchTaskResponse,
};
use crate::validation;

/// Receives updates while a task is followed.
///
/// Every method has an empty default, so implementors pick what they need.
pub trait ResearchObserver: Send {
    /// A message the task added since the previous status check.
    fn on_message(&mut self, _message: &Value) {}

    /// Step counters, reported on every status check that carries them.
    fn on_progress(&mut self, _current_step: u32, _total_steps: u32) {}

    /// The task completed.
    fn on_complete(&mut self, _status: &DeepResearchStatusResponse) {}

    /// Following ended with an error, including a failed or cancelled task.
    fn on_error(&mut self, _error: &ValyuError) {}
}

/// Deep research service (`/deepresearch/...`).
#[derive(Debug, Clone)]
pub struct DeepResearchService {
    ctx: Arc<ServiceContext>,
}

impl DeepResearchService {
    /// Creates a new deep research service.
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Starts a research task.
    #[instrument(skip(self, request), fields(mode = ?request.mode))]
    pub async fn create(
        &self,
        request: DeepResearchCreateRequest,
    ) -> ValyuResult<DeepResearchCreateResponse> {
        if let Err(e) = request.validate() {
            return Ok(self.ctx.reject("deep_research.create", e));
        }

        let http_request = self.ctx.post("deepresearch/tasks", &request)?;
        let response: DeepResearchCreateResponse =
            self.ctx.execute("deep_research.create", http_request).await?;
        if let Some(id) = &response.deepresearch_id {
            info!(task_id = %id, "Deep research task created");
        }
        Ok(response)
    }

    /// Fetches the current state of a task.
    #[instrument(skip(self))]
    pub async fn status(&self, task_id: &str) -> ValyuResult<DeepResearchStatusResponse> {
        if let Err(e) = validation::validate_required("task_id", task_id) {
            return Ok(self.ctx.reject("deep_research.status", e));
        }

        let request = self.ctx.get(task_path(task_id, "status"));
        self.ctx.execute("deep_research.status", request).await
    }

    /// Polls a task until it completes, fails or is cancelled.
    ///
    /// Returns the terminal status whatever it is. `on_progress` sees every
    /// status check, the terminal one included.
    #[instrument(skip(self, cancel, on_progress), fields(interval = ?config.interval))]
    pub async fn wait<P>(
        &self,
        task_id: &str,
        config: PollConfig,
        cancel: &CancellationToken,
        on_progress: P,
    ) -> ValyuResult<DeepResearchStatusResponse>
    where
        P: FnMut(&DeepResearchStatusResponse),
    {
        if let Err(e) = validation::validate_required("task_id", task_id) {
            return Ok(self.ctx.reject("deep_research.wait", e));
        }

        let timer = self.ctx.timer("deep_research.wait");
        let this = self;
        let result =
            poll_until_terminal(config, cancel, move || this.poll_status(task_id), on_progress)
                .await;

        match result {
            Ok(status) => {
                debug!(status = ?status.status, "Deep research task finished");
                timer.finish(true);
                Ok(status)
            }
            Err(e) => {
                timer.fail(&e);
                Err(e)
            }
        }
    }

    /// Polls a task and reports messages, progress and the outcome to
    /// `observer`.
    ///
    /// Messages are delivered once each, in order. A task that ends failed
    /// or cancelled yields [`ValyuError::TaskFailed`]. Every error is also
    /// passed to [`ResearchObserver::on_error`]. An empty `task_id` comes
    /// back as a failure response after `on_error`.
    #[instrument(skip(self, cancel, observer), fields(interval = ?config.interval))]
    pub async fn follow<O>(
        &self,
        task_id: &str,
        config: PollConfig,
        cancel: &CancellationToken,
        observer: &mut O,
    ) -> ValyuResult<DeepResearchStatusResponse>
    where
        O: ResearchObserver + ?Sized,
    {
        if let Err(e) = validation::validate_required("task_id", task_id) {
            observer.on_error(&e);
            return Ok(self.ctx.reject("deep_research.follow", e));
        }

        let result = self.follow_inner(task_id, config, cancel, observer).await;

        match &result {
            Ok(status) => observer.on_complete(status),
            Err(e) => {
                warn!(error = %e, "Following deep research task failed");
                observer.on_error(e);
            }
        }
        result
    }

    async fn follow_inner<O>(
        &self,
        task_id: &str,
        config: PollConfig,
        cancel: &CancellationToken,
        observer: &mut O,
    ) -> ValyuResult<DeepResearchStatusResponse>
    where
        O: ResearchObserver + ?Sized,
    {
        let this = self;
        let mut delivered = 0usize;
        let status = poll_until_terminal(
            config,
            cancel,
            move || this.poll_status(task_id),
            |status: &DeepResearchStatusResponse| {
                if let Some(progress) = &status.progress {
                    observer.on_progress(progress.current_step, progress.total_steps);
                }
                for message in status.messages.iter().skip(delivered) {
                    observer.on_message(message);
                }
                delivered = delivered.max(status.messages.len());
            },
        )
        .await?;

        match status.status {
            Some(DeepResearchStatus::Completed) => Ok(status),
            other => Err(ValyuError::TaskFailed {
                status: other.unwrap_or(DeepResearchStatus::Unknown).to_string(),
            }),
        }
    }

    /// Status fetch for the poller: error statuses are errors here.
    async fn poll_status(&self, task_id: &str) -> ValyuResult<DeepResearchStatusResponse> {
        self.ctx.record_poll("deep_research.status");
        let request = self.ctx.get(task_path(task_id, "status"));
        self.ctx.execute_checked(request).await
    }

    /// Lists tasks created with an API key.
    #[instrument(skip(self, options), fields(limit = options.limit))]
    pub async fn list(&self, options: DeepResearchListOptions) -> ValyuResult<DeepResearchListResponse> {
        if options.api_key_id.trim().is_empty() {
            return Ok(self.ctx.reject(
                "deep_research.list",
                ValyuError::validation_param("api_key_id is required", "api_key_id", None),
            ));
        }

        let path = with_query(
            "deepresearch/list",
            [
                ("api_key_id", options.api_key_id),
                ("limit", options.limit.to_string()),
            ],
        );
        self.ctx.execute("deep_research.list", self.ctx.get(path)).await
    }

    /// Sends a follow-up instruction to a running task.
    #[instrument(skip(self, instruction))]
    pub async fn update(&self, task_id: &str, instruction: &str) -> ValyuResult<DeepResearchTaskResponse> {
        if instruction.trim().is_empty() {
            return Ok(self.ctx.reject(
                "deep_research.update",
                ValyuError::validation_param(
                    "instruction is required and cannot be empty",
                    "instruction",
                    None,
                ),
            ));
        }

        let request = self
            .ctx
            .post(task_path(task_id, "update"), &json!({ "instruction": instruction }))?;
        self.ctx.execute("deep_research.update", request).await
    }

    /// Cancels a task.
    #[instrument(skip(self))]
    pub async fn cancel(&self, task_id: &str) -> ValyuResult<DeepResearchTaskResponse> {
        let request = self.ctx.post(task_path(task_id, "cancel"), &json!({}))?;
        self.ctx.execute("deep_research.cancel", request).await
    }

    /// Deletes a task.
    #[instrument(skip(self))]
    pub async fn delete(&self, task_id: &str) -> ValyuResult<DeepResearchTaskResponse> {
        let request = self.ctx.delete(task_path(task_id, "delete"));
        self.ctx.execute("deep_research.delete", request).await
    }

    /// Makes a report public or private.
    #[instrument(skip(self))]
    pub async fn toggle_public(&self, task_id: &str, public: bool) -> ValyuResult<DeepResearchTaskResponse> {
        let request = self
            .ctx
            .post(task_path(task_id, "public"), &json!({ "public": public }))?;
        self.ctx.execute("deep_research.toggle_public", request).await
    }

    /// Downloads a report asset.
    ///
    /// With a `token` the request carries the token as a query parameter
    /// and no API key.
    #[instrument(skip(self, token), fields(with_token = token.is_some()))]
    pub async fn get_assets(
        &self,
        task_id: &str,
        asset_id: &str,
        token: Option<&str>,
    ) -> ValyuResult<DeepResearchAssetsResponse> {
        const OPERATION: &str = "deep_research.get_assets";

        let base = format!(
            "deepresearch/tasks/{}/assets/{}",
            encode_segment(task_id),
            encode_segment(asset_id)
        );
        let request = match token.filter(|t| !t.is_empty()) {
            Some(token) => self
                .ctx
                .get_unauthenticated(with_query(&base, [("token", token.to_string())])),
            None => self.ctx.get(base),
        };

        let timer = self.ctx.timer(OPERATION);
        match self.ctx.send_checked(request).await {
            Ok(response) => {
                timer.finish(true);
                Ok(DeepResearchAssetsResponse {
                    success: true,
                    error: None,
                    content_type: response.header("content-type").map(str::to_string),
                    data: response.body,
                })
            }
            Err(e @ ValyuError::Api { .. }) => {
                let message = e.message();
                timer.fail(&e);
                Ok(DeepResearchAssetsResponse::failure(message))
            }
            Err(e) => {
                timer.fail(&e);
                Err(e)
            }
        }
    }
}

fn task_path(task_id: &str, action: &str) -> String {
    format!("deepresearch/tasks/{}/{}", encode_segment(task_id), action)
}
