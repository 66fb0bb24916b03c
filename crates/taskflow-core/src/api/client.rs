//! API client for the taskflow REST backend.
//!
//! `ApiClient` bundles the auth lifecycle with typed task operations. Every
//! data call is routed through the `RequestPipeline`, so an expired access
//! token is renewed transparently.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use super::{ApiError, ApiRequest, ApiResponse, RequestPipeline};
use crate::auth::{AuthError, AuthManager, Session, SessionStore};
use crate::config::Config;
use crate::models::{
    CompletedTask, Listing, Page, Task, TaskPayload, TaskQuery, TaskStatistics,
};

// ============================================================================
// Constants
// ============================================================================

const TASKS_PATH: &str = "/api/tasks/";
const COMPLETED_TASKS_PATH: &str = "/api/completed-tasks/";

/// Window for the "recently completed" view.
pub const DEFAULT_RECENT_DAYS: u32 = 7;

/// Window for the completion report.
pub const DEFAULT_REPORT_DAYS: u32 = 30;

/// API client for taskflow.
/// Clone is cheap - the HTTP connection pool and the session are shared.
#[derive(Clone)]
pub struct ApiClient {
    pipeline: RequestPipeline,
}

impl ApiClient {
    /// Create a client from configuration with the given session store.
    pub fn new(config: &Config, store: Box<dyn SessionStore>) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.request_timeout()).build()?;
        let base_url = config.api_base_url();
        debug!(base_url = %base_url, "Creating API client");
        Ok(Self::with_auth(AuthManager::new(http, base_url, store)))
    }

    /// Build on an existing auth manager, sharing its session.
    pub fn with_auth(auth: AuthManager) -> Self {
        Self {
            pipeline: RequestPipeline::new(auth),
        }
    }

    pub fn auth(&self) -> &AuthManager {
        self.pipeline.auth()
    }

    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    // ===== Session =====

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        self.auth().login(username, password).await
    }

    pub fn logout(&self) {
        self.auth().logout();
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth().is_authenticated()
    }

    /// Send an arbitrary request through the refresh-aware pipeline.
    pub async fn issue(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.pipeline.issue(request).await
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.issue(request).await?.json()
    }

    // ===== Tasks =====

    pub async fn list_tasks(&self, query: &TaskQuery) -> Result<Page<Task>, ApiError> {
        self.fetch(ApiRequest::get(TASKS_PATH).query_pairs(query.to_query_pairs()))
            .await
    }

    pub async fn get_task(&self, id: i64) -> Result<Task, ApiError> {
        self.fetch(ApiRequest::get(task_path(id))).await
    }

    pub async fn create_task(&self, payload: &TaskPayload) -> Result<Task, ApiError> {
        self.fetch(ApiRequest::post(TASKS_PATH).json(payload)?).await
    }

    /// Partial update: only the fields set on `payload` change.
    pub async fn update_task(&self, id: i64, payload: &TaskPayload) -> Result<Task, ApiError> {
        self.fetch(ApiRequest::patch(task_path(id)).json(payload)?)
            .await
    }

    pub async fn delete_task(&self, id: i64) -> Result<(), ApiError> {
        self.issue(ApiRequest::delete(task_path(id))).await?;
        Ok(())
    }

    pub async fn complete_task(&self, id: i64) -> Result<Task, ApiError> {
        self.fetch(ApiRequest::post(format!("{}{}/complete/", TASKS_PATH, id)))
            .await
    }

    pub async fn statistics(&self) -> Result<TaskStatistics, ApiError> {
        self.fetch(ApiRequest::get(format!("{}statistics/", TASKS_PATH)))
            .await
    }

    pub async fn overdue_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let listing: Listing<Task> = self
            .fetch(ApiRequest::get(format!("{}overdue/", TASKS_PATH)))
            .await?;
        Ok(listing.into_items())
    }

    pub async fn bulk_assign(&self, task_ids: &[i64], assigned_to_id: i64) -> Result<Value, ApiError> {
        let body = json!({
            "task_ids": task_ids,
            "assigned_to_id": assigned_to_id,
        });
        self.fetch(ApiRequest::post(format!("{}bulk_assign/", TASKS_PATH)).json(&body)?)
            .await
    }

    // ===== Completed Tasks =====

    pub async fn completed_tasks(&self) -> Result<Vec<CompletedTask>, ApiError> {
        let listing: Listing<CompletedTask> =
            self.fetch(ApiRequest::get(COMPLETED_TASKS_PATH)).await?;
        Ok(listing.into_items())
    }

    /// Tasks completed in the last `days` days (default 7).
    pub async fn recent_completed(&self, days: Option<u32>) -> Result<Vec<CompletedTask>, ApiError> {
        let days = days.unwrap_or(DEFAULT_RECENT_DAYS);
        let listing: Listing<CompletedTask> = self
            .fetch(ApiRequest::get(format!("{}recent/", COMPLETED_TASKS_PATH)).query("days", days))
            .await?;
        Ok(listing.into_items())
    }

    /// The report's shape is owned by the backend; it is passed through as JSON.
    pub async fn completion_report(&self, days: Option<u32>) -> Result<Value, ApiError> {
        let days = days.unwrap_or(DEFAULT_REPORT_DAYS);
        self.fetch(ApiRequest::get(format!("{}report/", COMPLETED_TASKS_PATH)).query("days", days))
            .await
    }
}

fn task_path(id: i64) -> String {
    format!("{}{}/", TASKS_PATH, id)
}
