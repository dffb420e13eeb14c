use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::info;

use super::request::{RequestClient, RequestOptions};
use super::{ApiError, ReadPolicy, TaskApi};
use crate::models::{PageResponse, SuggestionRequest, SuggestionResponse, Task, TaskDto, TaskId, TaskQuery};
use crate::stats::CompletionStats;

const LIST_TASKS: &str = "tasks/listTasks";
const LIST_TODAY_TASKS: &str = "tasks/listTodayTasks";
const GET_TASK: &str = "tasks/getTasks";
const ADD_TASKS: &str = "tasks/addTasks";
const UPDATE_TASKS: &str = "tasks/updateTasks";
const DELETE_TASKS: &str = "tasks/deleteTasks";
const SET_TODAY_TASK: &str = "tasks/setTodayTask";
const DELETE_COMPLETED: &str = "tasks/deleteCompleted";
const COMPLETION_STATS: &str = "tasks/stats/completion";
const AI_SUGGEST: &str = "ai/suggest";

/// [`TaskApi`] over HTTP
pub struct HttpTaskApi {
    client: RequestClient,
    read_policy: ReadPolicy,
}

impl HttpTaskApi {
    pub fn new(base_url: &str, timeout: Duration, read_policy: ReadPolicy) -> Result<Self, ApiError> {
        let client = RequestClient::new(base_url, timeout)?;
        info!(base_url = client.base_url(), ?read_policy, "task service client ready");
        Ok(Self { client, read_policy })
    }

    /// Reads honour the configured policy; a missing payload becomes the default value
    async fn read<T: DeserializeOwned + Default>(&self, path: &str, options: RequestOptions) -> Result<T, ApiError> {
        let data = match self.read_policy {
            ReadPolicy::Strict => self.client.fetch(path, options).await?,
            ReadPolicy::BestEffort => self.client.try_fetch(path, options).await,
        };
        Ok(data.unwrap_or_default())
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self, query: &TaskQuery) -> Result<PageResponse<Task>, ApiError> {
        self.read(LIST_TASKS, RequestOptions::post_json(query)?).await
    }

    async fn list_today_tasks(&self, query: &TaskQuery) -> Result<PageResponse<Task>, ApiError> {
        self.read(LIST_TODAY_TASKS, RequestOptions::post_json(query)?).await
    }

    async fn get_task(&self, id: TaskId) -> Result<Task, ApiError> {
        let options = RequestOptions::get().with_query("id", id);
        self.client
            .fetch::<Task>(GET_TASK, options)
            .await?
            .ok_or_else(|| ApiError::Reported(format!("Task {} not found", id)))
    }

    async fn create_task(&self, task: &TaskDto) -> Result<TaskId, ApiError> {
        self.client
            .fetch::<TaskId>(ADD_TASKS, RequestOptions::post_json(task)?)
            .await?
            .ok_or_else(|| ApiError::Decode {
                path: ADD_TASKS.to_string(),
                message: "response did not contain the new task id".to_string(),
            })
    }

    async fn update_task(&self, task: &TaskDto) -> Result<TaskId, ApiError> {
        let id = self
            .client
            .fetch::<TaskId>(UPDATE_TASKS, RequestOptions::post_json(task)?)
            .await?;
        id.or(task.id).ok_or_else(|| ApiError::Decode {
            path: UPDATE_TASKS.to_string(),
            message: "response did not contain the task id".to_string(),
        })
    }

    async fn delete_tasks(&self, ids: &[TaskId]) -> Result<u64, ApiError> {
        let deleted = self
            .client
            .fetch::<u64>(DELETE_TASKS, RequestOptions::post_json(ids)?)
            .await?;
        Ok(deleted.unwrap_or(ids.len() as u64))
    }

    async fn set_today_task(&self, id: TaskId, is_today_task: bool) -> Result<(), ApiError> {
        let body = json!({ "id": id, "isTodayTask": is_today_task });
        self.client
            .fetch::<Value>(SET_TODAY_TASK, RequestOptions::post_json(&body)?)
            .await?;
        Ok(())
    }

    async fn delete_completed(&self) -> Result<u64, ApiError> {
        let deleted = self
            .client
            .fetch::<u64>(DELETE_COMPLETED, RequestOptions::post())
            .await?;
        Ok(deleted.unwrap_or(0))
    }

    async fn completion_stats(&self) -> Result<CompletionStats, ApiError> {
        self.read(COMPLETION_STATS, RequestOptions::get()).await
    }

    async fn suggest(&self, prompt: &str) -> Result<SuggestionResponse, ApiError> {
        let body = SuggestionRequest {
            prompt: prompt.to_string(),
        };
        let envelope = self
            .client
            .send::<String>(AI_SUGGEST, RequestOptions::post_json(&body)?)
            .await?;
        Ok(SuggestionResponse {
            success: envelope.success,
            message: envelope.message,
            data: envelope.data,
        })
    }
}
