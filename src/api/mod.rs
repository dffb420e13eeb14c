//! Access to the remote task service.
//!
//! [`RequestClient`] is the single gateway for HTTP traffic, [`HttpTaskApi`]
//! maps each endpoint onto it, and [`TaskApi`] is the seam the command layer,
//! the CLI and the TUI talk through.

pub mod http;
pub mod request;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{PageResponse, SuggestionResponse, Task, TaskDto, TaskId, TaskQuery};
use crate::stats::CompletionStats;

pub use http::HttpTaskApi;
pub use request::{ApiEnvelope, Method, PageData, RequestClient, RequestOptions, convert_page_data, order_by};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Request to {path} failed: {message}")]
    Transport { path: String, message: String },

    #[error("Server answered {status} for {path}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("Malformed response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("{0}")]
    Reported(String),
}

impl ApiError {
    /// Whether the request never produced a usable HTTP answer
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. } | ApiError::Client(_))
    }
}

/// How read endpoints treat failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadPolicy {
    /// Log the failure and show an empty result
    #[default]
    BestEffort,
    /// Surface the failure to the caller
    Strict,
}

#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self, query: &TaskQuery) -> Result<PageResponse<Task>, ApiError>;

    async fn list_today_tasks(&self, query: &TaskQuery) -> Result<PageResponse<Task>, ApiError>;

    async fn get_task(&self, id: TaskId) -> Result<Task, ApiError>;

    /// Returns the id of the created task
    async fn create_task(&self, task: &TaskDto) -> Result<TaskId, ApiError>;

    async fn update_task(&self, task: &TaskDto) -> Result<TaskId, ApiError>;

    /// Returns how many tasks were deleted
    async fn delete_tasks(&self, ids: &[TaskId]) -> Result<u64, ApiError>;

    async fn set_today_task(&self, id: TaskId, is_today_task: bool) -> Result<(), ApiError>;

    async fn delete_completed(&self) -> Result<u64, ApiError>;

    async fn completion_stats(&self) -> Result<CompletionStats, ApiError>;

    /// Transport problems are `Err`; a reported failure is `Ok` with `success = false`
    async fn suggest(&self, prompt: &str) -> Result<SuggestionResponse, ApiError>;
}
