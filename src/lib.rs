//! Valyu Client Library
//!
//! An async Rust client for the Valyu API: search over the web and
//! proprietary datasets, streamed AI answers grounded in search results,
//! URL content extraction, and long-running deep research tasks and
//! batches.
//!
//! # Features
//!
//! - **Search**: web, proprietary and news sources with date, source and
//!   relevance filters
//! - **Answers**: server-sent event streaming, or one aggregated response
//! - **Deep research**: create, poll and follow tasks; batches of up to
//!   100 tasks per call
//! - **Validation**: requests are checked locally and rejected with a
//!   failure response before any network call
//! - **Observability**: `tracing` spans and an in-process metrics collector
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use valyu_client::{SearchRequest, SearchType, ValyuClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ValyuClient::from_env()?;
//!
//!     let request = SearchRequest::new("latest advances in solid state batteries")
//!         .search_type(SearchType::All)
//!         .max_num_results(5);
//!
//!     let response = client.search().search(request).await?;
//!     if !response.success {
//!         eprintln!("search failed: {}", response.error.unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Streaming Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use tokio_util::sync::CancellationToken;
//! use valyu_client::{AnswerRequest, StreamEvent, ValyuClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ValyuClient::from_env()?;
//!     let cancel = CancellationToken::new();
//!
//!     let mut stream = client
//!         .answer()
//!         .answer_stream(AnswerRequest::new("What is retrieval-augmented generation?"), &cancel)
//!         .await?;
//!
//!     while let Some(event) = stream.next().await {
//!         match event? {
//!             StreamEvent::Content { text, .. } => print!("{}", text),
//!             StreamEvent::Error { message } => eprintln!("error: {}", message),
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod observability;
pub mod polling;
pub mod services;
pub mod streaming;
pub mod transport;
pub mod types;
pub mod validation;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

pub use client::{ValyuClient, ValyuClientBuilder};
pub use config::{ValyuConfig, ValyuConfigBuilder};
pub use errors::{ValyuError, ValyuResult};
pub use observability::{init_tracing, LogConfig, MetricsCollector, MetricsSnapshot};
pub use polling::PollConfig;
pub use services::ResearchObserver;
pub use streaming::AnswerStream;
pub use types::*;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::client::ValyuClient;
    pub use crate::errors::{ValyuError, ValyuResult};
    pub use crate::polling::PollConfig;
    pub use crate::types::{
        AnswerRequest, AnswerResponse, ContentsRequest, DeepResearchCreateRequest, SearchRequest,
        StreamEvent,
    };
}
