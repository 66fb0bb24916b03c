//! REST API client module for the taskflow backend.
//!
//! `RequestPipeline` is the single path to the API: it attaches the bearer
//! token and, when the server rejects it, renews the access token once and
//! replays the request. `ApiClient` layers the typed task operations on top.

pub mod client;
pub mod error;
pub mod pipeline;

pub use client::ApiClient;
pub use error::ApiError;
pub use pipeline::{join_url, ApiRequest, ApiResponse, RequestPipeline};
