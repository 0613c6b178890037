//! Background decoding of an SSE body into a bounded event channel.

use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::aggregator::StreamAggregator;
use super::frame::classify_line;
use crate::errors::{ValyuError, ValyuResult};
use crate::observability::MetricsCollector;
use crate::transport::{ByteStream, LineBuffer};
use crate::types::{AnswerResponse, StreamEvent};

/// Events buffered between the decoder task and the consumer.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

type EventSender = mpsc::Sender<ValyuResult<StreamEvent>>;

/// Live sequence of answer events.
///
/// Items are yielded in arrival order. A transport failure or an expired
/// deadline arrives as a single `Err` and ends the sequence. Once the
/// cancellation token fires, no further items are yielded. Dropping the
/// stream stops the decoder and releases the connection.
pub struct AnswerStream {
    receiver: mpsc::Receiver<ValyuResult<StreamEvent>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    metrics: Option<Arc<dyn MetricsCollector>>,
}

impl AnswerStream {
    /// Starts decoding `body` on a background task.
    ///
    /// `cancel` is the caller's token; the stream owns a child of it so that
    /// dropping the stream does not cancel anything else.
    pub fn spawn(body: ByteStream, cancel: &CancellationToken, deadline: Option<Duration>) -> Self {
        let (tx, receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = cancel.child_token();
        let deadline = deadline.map(|d| Instant::now() + d);

        let task = tokio::spawn(run_decoder(body, tx, cancel.clone(), deadline));

        Self {
            receiver,
            cancel,
            task: Some(task),
            metrics: None,
        }
    }

    /// A finished stream carrying the given events and nothing else.
    pub fn from_events(events: Vec<StreamEvent>) -> Self {
        let (tx, receiver) = mpsc::channel(events.len().max(1));
        for event in events {
            // Capacity covers every event.
            let _ = tx.try_send(Ok(event));
        }

        Self {
            receiver,
            cancel: CancellationToken::new(),
            task: None,
            metrics: None,
        }
    }

    /// A stream holding a single `Error` event.
    pub fn from_error(message: impl Into<String>) -> Self {
        Self::from_events(vec![StreamEvent::Error {
            message: message.into(),
        }])
    }

    /// Counts every yielded event in `metrics`.
    pub(crate) fn with_metrics(mut self, metrics: Option<Arc<dyn MetricsCollector>>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Stops decoding. Events already buffered are discarded.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns true once the stream was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Consumes the remaining events and folds them into one response.
    ///
    /// Transport failures are returned as `Err`; everything reported inside
    /// the stream ends up in the response.
    pub async fn aggregate(mut self) -> ValyuResult<AnswerResponse> {
        let mut aggregator = StreamAggregator::new();
        while let Some(item) = self.next().await {
            aggregator.push(item?);
        }

        if self.is_cancelled() {
            return Err(ValyuError::Cancelled);
        }

        debug!(events = aggregator.event_count(), "Answer stream aggregated");
        Ok(aggregator.finish())
    }
}

impl Stream for AnswerStream {
    type Item = ValyuResult<StreamEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            self.receiver.close();
            return Poll::Ready(None);
        }

        let item = self.receiver.poll_recv(cx);
        if let (Poll::Ready(Some(Ok(event))), Some(metrics)) = (&item, &self.metrics) {
            metrics.record_stream_event(event.kind());
        }
        item
    }
}

impl Drop for AnswerStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for AnswerStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerStream")
            .field("cancelled", &self.cancel.is_cancelled())
            .field(
                "decoder_running",
                &self.task.as_ref().is_some_and(|t| !t.is_finished()),
            )
            .finish()
    }
}

async fn run_decoder(
    mut body: ByteStream,
    tx: EventSender,
    cancel: CancellationToken,
    deadline: Option<Instant>,
) {
    let mut lines = LineBuffer::new();
    let expiry = deadline_elapsed(deadline);
    tokio::pin!(expiry);

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Answer stream cancelled");
                return;
            }
            _ = &mut expiry => {
                warn!("Answer stream deadline exceeded");
                let err = ValyuError::Timeout {
                    message: "stream deadline exceeded".to_string(),
                };
                deliver(&tx, Err(err), &cancel).await;
                return;
            }
            chunk = body.next() => chunk,
        };

        match next {
            Some(Ok(chunk)) => {
                for line in lines.push(&chunk) {
                    if !emit(line, &tx, &cancel).await {
                        return;
                    }
                }
            }
            Some(Err(e)) => {
                warn!(error = %e, "Answer stream transport failure");
                deliver(&tx, Err(e.into()), &cancel).await;
                return;
            }
            None => {
                if let Some(line) = lines.finish() {
                    emit(line, &tx, &cancel).await;
                }
                trace!("Answer stream body finished");
                return;
            }
        }
    }
}

/// Classifies one line and forwards its event. Returns false once the
/// consumer is gone or the stream was cancelled.
async fn emit(line: Result<String, String>, tx: &EventSender, cancel: &CancellationToken) -> bool {
    let line = match line {
        Ok(line) => line,
        Err(lossy) => {
            debug!(line = %lossy, "Skipping SSE line with invalid UTF-8");
            return true;
        }
    };

    match classify_line(&line) {
        Some(event) => {
            trace!(kind = event.kind(), "Decoded stream event");
            deliver(tx, Ok(event), cancel).await
        }
        None => true,
    }
}

/// Sends one item, waiting for channel capacity unless cancelled.
async fn deliver(tx: &EventSender, item: ValyuResult<StreamEvent>, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = tx.send(item) => sent.is_ok(),
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use bytes::Bytes;
    use futures::stream;
    use pretty_assertions::assert_eq;

    fn body(chunks: &[&str]) -> ByteStream {
        let chunks: Vec<Result<Bytes, TransportError>> = chunks
            .iter()
            .map(|c| Ok(Bytes::from(c.to_string())))
            .collect();
        Box::pin(stream::iter(chunks))
    }

    fn open_body(chunks: &[&str]) -> ByteStream {
        let chunks: Vec<Result<Bytes, TransportError>> = chunks
            .iter()
            .map(|c| Ok(Bytes::from(c.to_string())))
            .collect();
        Box::pin(stream::iter(chunks).chain(stream::pending()))
    }

    async fn collect(stream: AnswerStream) -> Vec<ValyuResult<StreamEvent>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn test_malformed_frame_is_skipped() {
        let token = CancellationToken::new();
        let stream = AnswerStream::spawn(
            body(&[
                "data: {not json}\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"hi\"}}]}\n",
            ]),
            &token,
            None,
        );

        let events: Vec<StreamEvent> = collect(stream)
            .await
            .into_iter()
            .map(|e| e.unwrap())
            .collect();
        assert_eq!(
            events,
            vec![StreamEvent::Content {
                text: "hi".into(),
                finish_reason: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_done_does_not_stop_decoding() {
        let token = CancellationToken::new();
        let stream = AnswerStream::spawn(
            body(&[
                "data: [DONE]\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n",
            ]),
            &token,
            None,
        );

        let events: Vec<StreamEvent> = collect(stream)
            .await
            .into_iter()
            .map(|e| e.unwrap())
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], StreamEvent::Done);
        assert_eq!(events[1].kind(), "content");
    }

    #[tokio::test]
    async fn test_frames_split_across_chunks() {
        let token = CancellationToken::new();
        let stream = AnswerStream::spawn(
            body(&[
                "data: {\"choices\":[{\"del",
                "ta\":{\"content\":\"a\"}}]}\r\ndata: {\"choi",
                "ces\":[{\"delta\":{\"content\":\"b\"}}]}",
            ]),
            &token,
            None,
        );

        let response = stream.aggregate().await.unwrap();
        assert_eq!(response.text(), Some("ab"));
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let chunks: Vec<Result<Bytes, TransportError>> = vec![
            Ok(Bytes::from_static(
                b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n",
            )),
            Err(TransportError::Connection {
                message: "reset".into(),
            }),
            Ok(Bytes::from_static(
                b"data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n",
            )),
        ];
        let token = CancellationToken::new();
        let stream = AnswerStream::spawn(Box::pin(stream::iter(chunks)), &token, None);

        let items = collect(stream).await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(ValyuError::Network { .. })));
    }

    #[tokio::test]
    async fn test_cancellation_stops_decoder() {
        let token = CancellationToken::new();
        let mut stream = AnswerStream::spawn(
            open_body(&["data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n"]),
            &token,
            None,
        );

        let first = stream.next().await;
        assert!(matches!(first, Some(Ok(StreamEvent::Content { .. }))));

        token.cancel();
        assert!(stream.next().await.is_none());

        // The decoder drops its sender when it exits.
        let closed = tokio::time::timeout(Duration::from_secs(1), stream.receiver.recv()).await;
        assert!(matches!(closed, Ok(None)));
    }

    #[tokio::test]
    async fn test_aggregate_after_cancel_is_error() {
        let token = CancellationToken::new();
        let stream = AnswerStream::spawn(open_body(&[]), &token, None);
        token.cancel();

        assert!(matches!(
            stream.aggregate().await,
            Err(ValyuError::Cancelled)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_surfaces_timeout() {
        let token = CancellationToken::new();
        let stream = AnswerStream::spawn(open_body(&[]), &token, Some(Duration::from_secs(5)));

        let items = collect(stream).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(ValyuError::Timeout { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backpressure_stalls_decoder_until_drained() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let total = EVENT_CHANNEL_CAPACITY * 3;
        let read = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&read);
        let frames = stream::iter((0..total).map(|i| {
            Ok::<_, TransportError>(Bytes::from(format!(
                "data: {{\"choices\":[{{\"delta\":{{\"content\":\"{}\"}}}}]}}\n",
                i % 10
            )))
        }))
        .inspect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let token = CancellationToken::new();
        let mut stream = AnswerStream::spawn(Box::pin(frames), &token, None);

        // One frame per event: the decoder holds one event it cannot send.
        tokio::time::sleep(Duration::from_secs(1)).await;
        let stalled_at = read.load(Ordering::SeqCst);
        assert!(stalled_at <= EVENT_CHANNEL_CAPACITY + 1, "read {stalled_at} frames");

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(read.load(Ordering::SeqCst), stalled_at);

        assert!(stream.next().await.is_some());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(read.load(Ordering::SeqCst), stalled_at + 1);

        let rest = collect(stream).await;
        assert_eq!(rest.len(), total - 1);
        assert_eq!(read.load(Ordering::SeqCst), total);
    }

    #[tokio::test]
    async fn test_from_error() {
        let items = collect(AnswerStream::from_error("bad query")).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(
            &items[0],
            Ok(StreamEvent::Error { message }) if message == "bad query"
        ));
    }
}
