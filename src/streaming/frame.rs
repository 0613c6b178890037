//! Classification of single SSE frames.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::types::{SearchResult, StreamEvent, StreamMetadata};

/// Prefix of every data line.
pub const DATA_PREFIX: &str = "data: ";

/// Payload marking the end of the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Message used when the server signals failure without saying why.
pub const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// Turns one line of the response body into at most one event.
///
/// Lines without the `data: ` prefix, payloads that are not JSON objects,
/// and objects of no known shape yield `None`.
pub fn classify_line(line: &str) -> Option<StreamEvent> {
    let payload = line.strip_prefix(DATA_PREFIX)?;

    if payload.trim() == DONE_SENTINEL {
        return Some(StreamEvent::Done);
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(object)) => classify_object(&object),
        Ok(_) => {
            debug!(payload = %payload, "Skipping non-object SSE payload");
            None
        }
        Err(e) => {
            debug!(error = %e, payload = %payload, "Skipping malformed SSE frame");
            None
        }
    }
}

/// Classifies a decoded payload. The first matching rule wins:
///
/// 1. `error` string with `success` absent or false: [`StreamEvent::Error`].
/// 2. `search_results` array without `success`: [`StreamEvent::SearchResults`].
/// 3. `choices[0]` with text or a finish reason: [`StreamEvent::Content`].
/// 4. boolean `success`: [`StreamEvent::Metadata`] when true, otherwise
///    [`StreamEvent::Error`].
pub fn classify_object(object: &Map<String, Value>) -> Option<StreamEvent> {
    let success = object.get("success");
    let error = object.get("error").and_then(Value::as_str);

    if let (Some(message), None | Some(Value::Bool(false))) = (error, success) {
        return Some(error_event(Some(message)));
    }

    if let (Some(Value::Array(entries)), None) = (object.get("search_results"), success) {
        return Some(StreamEvent::SearchResults {
            results: decode_results(entries),
        });
    }

    if let Some(event) = content_event(object) {
        return Some(event);
    }

    match success {
        Some(Value::Bool(true)) => Some(StreamEvent::Metadata(Box::new(metadata(object)))),
        Some(Value::Bool(false)) => Some(error_event(error)),
        _ => None,
    }
}

fn error_event(message: Option<&str>) -> StreamEvent {
    let message = match message {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => UNKNOWN_ERROR.to_string(),
    };
    StreamEvent::Error { message }
}

fn content_event(object: &Map<String, Value>) -> Option<StreamEvent> {
    let choice = object.get("choices")?.as_array()?.first()?;

    let text = choice
        .pointer("/delta/content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());
    let finish_reason = choice
        .get("finish_reason")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());

    if text.is_none() && finish_reason.is_none() {
        return None;
    }

    Some(StreamEvent::Content {
        text: text.unwrap_or_default().to_string(),
        finish_reason: finish_reason.map(str::to_string),
    })
}

fn metadata(object: &Map<String, Value>) -> StreamMetadata {
    StreamMetadata {
        tx_id: field(object, "tx_id"),
        original_query: field(object, "original_query"),
        data_type: field(object, "data_type"),
        contents: object.get("contents").filter(|v| !v.is_null()).cloned(),
        search_metadata: field(object, "search_metadata"),
        ai_usage: field(object, "ai_usage"),
        cost: field(object, "cost"),
        search_results: object
            .get("search_results")
            .and_then(Value::as_array)
            .map(|entries| decode_results(entries)),
    }
}

/// Decodes an optional field, treating a wrongly shaped value as absent.
fn field<T: DeserializeOwned>(object: &Map<String, Value>, key: &str) -> Option<T> {
    let value = object.get(key).filter(|v| !v.is_null())?;
    match T::deserialize(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            debug!(field = key, error = %e, "Ignoring undecodable metadata field");
            None
        }
    }
}

/// Decodes result entries one by one, dropping the ones that do not fit.
fn decode_results(entries: &[Value]) -> Vec<SearchResult> {
    entries
        .iter()
        .filter_map(|entry| SearchResult::deserialize(entry).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classify(line: &str) -> Option<StreamEvent> {
        classify_line(line)
    }

    #[test]
    fn test_non_data_lines_are_skipped() {
        assert_eq!(classify(""), None);
        assert_eq!(classify(": keep-alive"), None);
        assert_eq!(classify("event: message"), None);
        assert_eq!(classify("data:{\"success\":true}"), None);
    }

    #[test]
    fn test_done_sentinel() {
        assert_eq!(classify("data: [DONE]"), Some(StreamEvent::Done));
    }

    #[test]
    fn test_malformed_json_is_skipped() {
        assert_eq!(classify("data: {not json}"), None);
        assert_eq!(classify("data: [1, 2]"), None);
        assert_eq!(classify("data: \"text\""), None);
    }

    #[test]
    fn test_content_frame() {
        let event = classify(r#"data: {"choices":[{"delta":{"content":"hi"}}]}"#);
        assert_eq!(
            event,
            Some(StreamEvent::Content {
                text: "hi".into(),
                finish_reason: None,
            })
        );
    }

    #[test]
    fn test_finish_reason_only() {
        let event = classify(r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#);
        assert_eq!(
            event,
            Some(StreamEvent::Content {
                text: String::new(),
                finish_reason: Some("stop".into()),
            })
        );
    }

    #[test]
    fn test_empty_choice_yields_nothing() {
        assert_eq!(classify(r#"data: {"choices":[{"delta":{"content":""}}]}"#), None);
        assert_eq!(classify(r#"data: {"choices":[]}"#), None);
    }

    #[test]
    fn test_mid_stream_results() {
        let event = classify(
            r#"data: {"search_results":[{"title":"A","url":"https://a.com"},"junk",{"title":"B","url":"https://b.com"}]}"#,
        );
        match event {
            Some(StreamEvent::SearchResults { results }) => {
                let titles: Vec<_> = results.iter().map(|r| r.title.as_str()).collect();
                assert_eq!(titles, vec!["A", "B"]);
            }
            other => panic!("expected search results, got {:?}", other),
        }
    }

    #[test]
    fn test_error_frames() {
        assert_eq!(
            classify(r#"data: {"error":"rate limited"}"#),
            Some(StreamEvent::Error {
                message: "rate limited".into()
            })
        );
        assert_eq!(
            classify(r#"data: {"success":false,"error":"bad key"}"#),
            Some(StreamEvent::Error {
                message: "bad key".into()
            })
        );
        assert_eq!(
            classify(r#"data: {"success":false}"#),
            Some(StreamEvent::Error {
                message: UNKNOWN_ERROR.into()
            })
        );
    }

    #[test]
    fn test_success_with_error_field_is_metadata() {
        let event = classify(r#"data: {"success":true,"error":"ignored","tx_id":"tx"}"#);
        assert!(matches!(event, Some(StreamEvent::Metadata(_))));
    }

    #[test]
    fn test_metadata_takes_precedence_over_results() {
        let event = classify(
            r#"data: {"success":true,"tx_id":"tx_1","search_results":[{"title":"A","url":"u"}],"cost":{"total_deduction_dollars":0.02},"ai_usage":"garbage"}"#,
        );

        let Some(StreamEvent::Metadata(meta)) = event else {
            panic!("expected metadata");
        };
        assert_eq!(meta.tx_id.as_deref(), Some("tx_1"));
        assert_eq!(meta.search_results.as_ref().map(Vec::len), Some(1));
        assert_eq!(meta.cost.map(|c| c.total_deduction_dollars), Some(0.02));
        assert_eq!(meta.ai_usage, None);
        assert_eq!(meta.original_query, None);
    }

    #[test]
    fn test_unknown_shape_yields_nothing() {
        assert_eq!(classify(r#"data: {"type":"ping"}"#), None);
        assert_eq!(classify(r#"data: {"search_results":"not a list"}"#), None);
    }
}
