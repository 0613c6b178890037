//! Folding of stream events into a single [`AnswerResponse`].

use serde_json::Value;

use super::frame::UNKNOWN_ERROR;
use crate::types::{AiUsage, AnswerResponse, Cost, SearchMetadata, SearchResult, StreamEvent};

/// Accumulates stream events into a final answer.
///
/// The fold is pure: the same event sequence always produces the same
/// response.
#[derive(Debug, Default, Clone)]
pub struct StreamAggregator {
    text: String,
    search_results: Vec<SearchResult>,
    tx_id: Option<String>,
    original_query: Option<String>,
    data_type: Option<String>,
    structured: Option<Value>,
    search_metadata: Option<SearchMetadata>,
    ai_usage: Option<AiUsage>,
    cost: Option<Cost>,
    success: Option<bool>,
    error: Option<String>,
    events: usize,
}

impl StreamAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event.
    pub fn push(&mut self, event: StreamEvent) {
        self.events += 1;

        match event {
            StreamEvent::Content { text, .. } => self.text.push_str(&text),
            StreamEvent::SearchResults { results } => self.search_results.extend(results),
            StreamEvent::Metadata(meta) => {
                let meta = *meta;
                self.success = Some(true);
                overwrite(&mut self.tx_id, meta.tx_id);
                overwrite(&mut self.original_query, meta.original_query);
                overwrite(&mut self.data_type, meta.data_type);
                overwrite(&mut self.structured, meta.contents);
                overwrite(&mut self.search_metadata, meta.search_metadata);
                overwrite(&mut self.ai_usage, meta.ai_usage);
                overwrite(&mut self.cost, meta.cost);
                // The summary list is authoritative.
                if let Some(results) = meta.search_results {
                    self.search_results = results;
                }
            }
            StreamEvent::Error { message } => {
                self.success = Some(false);
                self.error = Some(message);
            }
            StreamEvent::Done => {}
        }
    }

    /// Text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Results accumulated so far.
    pub fn search_results(&self) -> &[SearchResult] {
        &self.search_results
    }

    /// Number of events applied.
    pub fn event_count(&self) -> usize {
        self.events
    }

    /// Settles the success flag and builds the response.
    pub fn finish(self) -> AnswerResponse {
        let success = self.success.unwrap_or(!self.text.is_empty());

        let error = if success {
            None
        } else {
            Some(self.error.unwrap_or_else(|| UNKNOWN_ERROR.to_string()))
        };

        let contents = match self.structured {
            Some(value) => Some(value),
            None if !self.text.is_empty() => Some(Value::String(self.text)),
            None => None,
        };

        AnswerResponse {
            success,
            error,
            tx_id: self.tx_id,
            original_query: self.original_query,
            contents,
            data_type: self.data_type,
            search_results: self.search_results,
            search_metadata: self.search_metadata,
            ai_usage: self.ai_usage,
            cost: self.cost,
        }
    }
}

fn overwrite<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Folds a complete event sequence.
pub fn aggregate<I>(events: I) -> AnswerResponse
where
    I: IntoIterator<Item = StreamEvent>,
{
    let mut aggregator = StreamAggregator::new();
    for event in events {
        aggregator.push(event);
    }
    aggregator.finish()
}
