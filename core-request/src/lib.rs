//! # Request Pipeline
//!
//! Resilient request execution on top of a host [`HttpTransport`](bridge_traits::HttpTransport):
//!
//! - Per-call timeout and cancellation through a pending-request registry
//! - Outcome classification into typed [`RequestError`]s
//! - Retry with exponential backoff for transient failures
//! - [`FixtureTransport`], a canned-response transport used in mock mode
//!
//! ## Usage
//!
//! ```ignore
//! use core_request::{RequestConfig, RequestOptions, RequestPipeline};
//!
//! let pipeline = RequestPipeline::new(
//!     RequestConfig::new("https://tour.example.com/api"),
//!     transport,
//! );
//!
//! let response = pipeline
//!     .request_with_retry(RequestOptions::get("/styles"), 2)
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod fixtures;
pub mod options;
pub mod pipeline;
pub mod registry;
pub mod retry;

pub use config::RequestConfig;
pub use error::{NetworkErrorCode, RequestError, Result};
pub use fixtures::FixtureTransport;
pub use options::{ApiResponse, RequestOptions};
pub use pipeline::RequestPipeline;
pub use registry::{PendingGuard, PendingRequest, RequestRegistry};
pub use retry::RetryPolicy;
