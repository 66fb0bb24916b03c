//! Core library for taskflow.
//!
//! Provides the authenticated REST client used by the taskflow front ends:
//!
//! - `auth`: session persistence and the login/logout lifecycle
//! - `api`: the request pipeline with transparent token refresh, and the
//!   typed task operations built on top of it
//! - `models`: task, statistics and pagination types
//! - `config`: on-disk configuration and directory layout
//! - `utils`: display formatting helpers

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, ApiRequest, ApiResponse, RequestPipeline};
pub use auth::{AuthError, AuthManager, Session, SessionStore, User};
pub use config::Config;
