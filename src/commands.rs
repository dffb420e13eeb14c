use std::sync::Arc;

use futures_util::future::join_all;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, PageData, TaskApi, convert_page_data};
use crate::models::{Task, TaskDto, TaskId, TaskQuery};
use crate::stats::CompletionStats;
use crate::table::ListScope;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("{action} failed: {source}")]
    Api {
        action: &'static str,
        #[source]
        source: ApiError,
    },
}

impl CommandError {
    fn api(action: &'static str) -> impl FnOnce(ApiError) -> Self {
        move |source| {
            warn!(action, error = %source, "task command failed");
            CommandError::Api { action, source }
        }
    }

    /// Form field an error belongs to, if any
    pub fn field(&self) -> Option<&'static str> {
        match self {
            CommandError::Validation { field, .. } => Some(field),
            CommandError::Api { .. } => None,
        }
    }
}

/// Result of a successful command together with the notice to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub value: T,
    pub message: String,
}

impl<T> Outcome<T> {
    fn new(value: T, message: impl Into<String>) -> Self {
        Self {
            value,
            message: message.into(),
        }
    }
}

/// Mutations and reads used by both the TUI and the CLI
#[derive(Clone)]
pub struct TaskCommands {
    api: Arc<dyn TaskApi>,
}

impl TaskCommands {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> Arc<dyn TaskApi> {
        Arc::clone(&self.api)
    }

    pub async fn load_page(&self, scope: ListScope, query: &TaskQuery) -> Result<PageData<Task>, CommandError> {
        let page = match scope {
            ListScope::All => self.api.list_tasks(query).await,
            ListScope::Today => self.api.list_today_tasks(query).await,
        }
        .map_err(CommandError::api("Loading tasks"))?;
        Ok(convert_page_data(Some(page)))
    }

    pub async fn get(&self, id: TaskId) -> Result<Task, CommandError> {
        self.api.get_task(id).await.map_err(CommandError::api("Loading task"))
    }

    pub async fn create(&self, dto: TaskDto) -> Result<Outcome<TaskId>, CommandError> {
        let dto = validate(dto, true)?;
        let id = self
            .api
            .create_task(&dto)
            .await
            .map_err(CommandError::api("Adding task"))?;
        info!(id, "task created");
        Ok(Outcome::new(id, "Task added"))
    }

    pub async fn update(&self, dto: TaskDto) -> Result<Outcome<TaskId>, CommandError> {
        if dto.id.is_none() {
            return Err(CommandError::Validation {
                field: "id",
                message: "An id is required to update a task".to_string(),
            });
        }
        let dto = validate(dto, false)?;
        let id = self
            .api
            .update_task(&dto)
            .await
            .map_err(CommandError::api("Updating task"))?;
        info!(id, "task updated");
        Ok(Outcome::new(id, "Task updated"))
    }

    /// Flip completion with a partial update carrying only id and status
    pub async fn toggle_status(&self, task: &Task) -> Result<Outcome<TaskId>, CommandError> {
        let id = task.id.ok_or(CommandError::Validation {
            field: "id",
            message: "Task has no id".to_string(),
        })?;
        let status = task.status.toggled();
        self.api
            .update_task(&TaskDto::status_only(id, status))
            .await
            .map_err(CommandError::api("Updating status"))?;
        let message = if status.is_completed() {
            "Task marked as completed"
        } else {
            "Task marked as not completed"
        };
        Ok(Outcome::new(id, message))
    }

    pub async fn bulk_delete(&self, ids: &[TaskId]) -> Result<Outcome<u64>, CommandError> {
        if ids.is_empty() {
            return Ok(Outcome::new(0, "No tasks selected"));
        }
        let deleted = self
            .api
            .delete_tasks(ids)
            .await
            .map_err(CommandError::api("Deleting tasks"))?;
        info!(deleted, requested = ids.len(), "tasks deleted");
        Ok(Outcome::new(deleted, format!("Deleted {} task(s)", deleted)))
    }

    pub async fn set_today_flag(&self, id: TaskId, flag: bool) -> Result<Outcome<TaskId>, CommandError> {
        self.api
            .set_today_task(id, flag)
            .await
            .map_err(CommandError::api("Updating today list"))?;
        Ok(Outcome::new(id, today_message(flag, 1)))
    }

    /// Flag every id concurrently, wait for all, and report once.
    /// Members that succeeded before a failure are not rolled back.
    pub async fn set_today_batch(&self, ids: &[TaskId], flag: bool) -> Result<Outcome<usize>, CommandError> {
        if ids.is_empty() {
            return Ok(Outcome::new(0, "No tasks selected"));
        }
        let results = join_all(ids.iter().map(|&id| self.api.set_today_task(id, flag))).await;
        let failures: Vec<ApiError> = results.into_iter().filter_map(Result::err).collect();
        if let Some(first) = failures.into_iter().next() {
            return Err(CommandError::api("Updating today list")(first));
        }
        Ok(Outcome::new(ids.len(), today_message(flag, ids.len())))
    }

    pub async fn delete_completed(&self) -> Result<Outcome<u64>, CommandError> {
        let deleted = self
            .api
            .delete_completed()
            .await
            .map_err(CommandError::api("Deleting completed tasks"))?;
        let message = if deleted == 0 {
            "No completed tasks to delete".to_string()
        } else {
            format!("Deleted {} completed task(s)", deleted)
        };
        Ok(Outcome::new(deleted, message))
    }

    pub async fn completion_stats(&self) -> Result<CompletionStats, CommandError> {
        self.api
            .completion_stats()
            .await
            .map_err(CommandError::api("Loading statistics"))
    }
}

fn today_message(flag: bool, count: usize) -> String {
    match (flag, count) {
        (true, 1) => "Added to today's tasks".to_string(),
        (false, 1) => "Removed from today's tasks".to_string(),
        (true, n) => format!("Added {} task(s) to today's tasks", n),
        (false, n) => format!("Removed {} task(s) from today's tasks", n),
    }
}

/// Client-side checks run before any request is sent
fn validate(mut dto: TaskDto, creating: bool) -> Result<TaskDto, CommandError> {
    match dto.title.as_deref().map(str::trim) {
        Some("") => {
            return Err(CommandError::Validation {
                field: "title",
                message: "Title is required".to_string(),
            });
        }
        Some(title) => dto.title = Some(title.to_string()),
        None if creating => {
            return Err(CommandError::Validation {
                field: "title",
                message: "Title is required".to_string(),
            });
        }
        None => {}
    }
    if creating && dto.category.is_none() {
        return Err(CommandError::Validation {
            field: "category",
            message: "Category is required".to_string(),
        });
    }
    Ok(dto)
}
