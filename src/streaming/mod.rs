//! Server-sent event decoding for the answer endpoint.
//!
//! A response body is split into lines, each `data: ` line is classified
//! into a [`StreamEvent`](crate::types::StreamEvent) by [`frame`], and the
//! [`decoder`] task hands events to the caller through a bounded channel.
//! [`aggregator`] folds a finished sequence into one
//! [`AnswerResponse`](crate::types::AnswerResponse).

pub mod aggregator;
pub mod decoder;
pub mod frame;

pub use aggregator::{aggregate, StreamAggregator};
pub use decoder::{AnswerStream, EVENT_CHANNEL_CAPACITY};
pub use frame::{classify_line, classify_object};
