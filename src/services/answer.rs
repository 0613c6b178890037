//! Answer service, streaming and aggregated.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::ServiceContext;
use crate::errors::{ApiErrorResponse, ValyuError, ValyuResult};
use crate::streaming::AnswerStream;
use crate::types::{AnswerRequest, AnswerResponse};

const OPERATION: &str = "answer";

/// Bytes of a rejected answer's error body that are kept.
pub const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// Answer service (`POST /answer`, server-sent events).
#[derive(Debug, Clone)]
pub struct AnswerService {
    ctx: Arc<ServiceContext>,
}

impl AnswerService {
    /// Creates a new answer service.
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Asks a question and waits for the whole answer.
    ///
    /// The event stream is folded into one response. Failures reported by
    /// the server, inside the stream or as an error status, end up in the
    /// response. Transport failures and cancellation are `Err`.
    #[instrument(skip(self, request, cancel), fields(search_type = ?request.search_type))]
    pub async fn answer(
        &self,
        request: AnswerRequest,
        cancel: &CancellationToken,
    ) -> ValyuResult<AnswerResponse> {
        if let Err(e) = request.validate() {
            return Ok(self.ctx.reject(OPERATION, e));
        }

        let timer = self.ctx.timer(OPERATION);
        let result = match self.open(request, cancel, None).await {
            Ok(stream) => stream.aggregate().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => {
                debug!(
                    success = response.success,
                    results = response.search_results.len(),
                    "Answer complete"
                );
                timer.finish(response.success);
                Ok(response)
            }
            Err(e) => {
                timer.fail(&e);
                Err(e)
            }
        }
    }

    /// Asks a question and returns the live event stream.
    ///
    /// A request that fails validation, or that the server rejects with an
    /// error status, yields a stream holding a single `Error` event. Transport
    /// failures while connecting are `Err`; later ones arrive in the stream.
    #[instrument(skip(self, request, cancel), fields(search_type = ?request.search_type))]
    pub async fn answer_stream(
        &self,
        request: AnswerRequest,
        cancel: &CancellationToken,
    ) -> ValyuResult<AnswerStream> {
        self.answer_stream_inner(request, cancel, None).await
    }

    /// Like [`answer_stream`](Self::answer_stream), but the stream fails
    /// with [`ValyuError::Timeout`] once `deadline` has passed.
    #[instrument(skip(self, request, cancel), fields(search_type = ?request.search_type))]
    pub async fn answer_stream_with_deadline(
        &self,
        request: AnswerRequest,
        cancel: &CancellationToken,
        deadline: Duration,
    ) -> ValyuResult<AnswerStream> {
        self.answer_stream_inner(request, cancel, Some(deadline)).await
    }

    async fn answer_stream_inner(
        &self,
        request: AnswerRequest,
        cancel: &CancellationToken,
        deadline: Option<Duration>,
    ) -> ValyuResult<AnswerStream> {
        if let Err(e) = request.validate() {
            self.ctx.record_error(&e);
            return Ok(AnswerStream::from_error(e.message()));
        }

        self.open(request, cancel, deadline).await.map_err(|e| {
            self.ctx.record_error(&e);
            e
        })
    }

    /// Sends the request and starts decoding the response body.
    async fn open(
        &self,
        request: AnswerRequest,
        cancel: &CancellationToken,
        deadline: Option<Duration>,
    ) -> ValyuResult<AnswerStream> {
        if cancel.is_cancelled() {
            return Err(ValyuError::Cancelled);
        }

        let http_request = self.ctx.post_streaming("answer", &request.normalized())?;

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ValyuError::Cancelled),
            response = self.ctx.open_stream(http_request) => response?,
        };

        if !response.is_success() {
            let status = response.status;
            let body = read_body(response.stream, cancel).await?;
            let message = ApiErrorResponse::message_from_body(status, &body);
            warn!(status, error = %message, "Answer request rejected");
            return Ok(AnswerStream::from_error(
                ValyuError::api(status, message).to_string(),
            ));
        }

        Ok(AnswerStream::spawn(response.stream, cancel, deadline).with_metrics(self.ctx.metrics()))
    }
}

/// Reads an error body, keeping at most [`MAX_ERROR_BODY_BYTES`]. A
/// broken body reads as whatever arrived before it broke.
async fn read_body(
    mut stream: crate::transport::ByteStream,
    cancel: &CancellationToken,
) -> ValyuResult<Vec<u8>> {
    use futures::StreamExt;

    let mut body = Vec::new();
    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ValyuError::Cancelled),
            chunk = stream.next() => chunk,
        };
        let Some(Ok(chunk)) = chunk else { break };

        let room = MAX_ERROR_BODY_BYTES - body.len();
        body.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if body.len() >= MAX_ERROR_BODY_BYTES {
            break;
        }
    }
    Ok(body)
}
