//! In-memory [`TaskApi`] used by unit tests

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ApiError, TaskApi};
use crate::models::{PageResponse, SuggestionResponse, Task, TaskDto, TaskId, TaskQuery, TaskStatus};
use crate::stats::CompletionStats;
use crate::utils::start_of_day;

#[derive(Default)]
struct State {
    tasks: Vec<Task>,
    next_id: TaskId,
    calls: Vec<String>,
    failing: HashSet<&'static str>,
    failing_ids: HashSet<TaskId>,
    suggestions: VecDeque<Result<SuggestionResponse, ApiError>>,
}

#[derive(Default)]
pub struct FakeTaskApi {
    state: Mutex<State>,
}

impl FakeTaskApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let next_id = tasks.iter().filter_map(|t| t.id).max().unwrap_or(0);
        let api = Self::default();
        {
            let mut state = api.state.lock().unwrap();
            state.tasks = tasks;
            state.next_id = next_id;
        }
        api
    }

    /// Make every call of the named operation fail
    pub fn fail(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.insert(operation);
    }

    /// Make `set_today_task` fail for one id
    pub fn fail_for(&self, id: TaskId) {
        self.state.lock().unwrap().failing_ids.insert(id);
    }

    pub fn push_suggestion(&self, response: Result<SuggestionResponse, ApiError>) {
        self.state.lock().unwrap().suggestions.push_back(response);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().unwrap().tasks.clone()
    }

    fn enter(&self, operation: &'static str) -> Result<std::sync::MutexGuard<'_, State>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(operation.to_string());
        if state.failing.contains(operation) {
            return Err(ApiError::Reported(format!("{} failed", operation)));
        }
        Ok(state)
    }
}

pub fn task(id: TaskId, title: &str) -> Task {
    let mut task = Task::new(title.to_string());
    task.id = Some(id);
    task
}

fn page(tasks: Vec<Task>, query: &TaskQuery) -> PageResponse<Task> {
    let size = query.page_size.max(1) as usize;
    let current = query.current.max(1);
    let total = tasks.len() as u64;
    let list = tasks
        .into_iter()
        .skip((current as usize - 1) * size)
        .take(size)
        .collect();
    PageResponse {
        current: Some(current),
        page_size: Some(query.page_size),
        total: Some(total),
        list: Some(list),
    }
}

#[async_trait]
impl TaskApi for FakeTaskApi {
    async fn list_tasks(&self, query: &TaskQuery) -> Result<PageResponse<Task>, ApiError> {
        let state = self.enter("list_tasks")?;
        let tasks = state
            .tasks
            .iter()
            .filter(|t| query.task_name.as_ref().is_none_or(|name| t.title.contains(name.as_str())))
            .filter(|t| query.category.is_none_or(|c| t.category == Some(c)))
            .filter(|t| query.status.is_none_or(|s| t.status == s))
            .cloned()
            .collect();
        Ok(page(tasks, query))
    }

    async fn list_today_tasks(&self, query: &TaskQuery) -> Result<PageResponse<Task>, ApiError> {
        let state = self.enter("list_today_tasks")?;
        let tasks = state.tasks.iter().filter(|t| t.is_today_task).cloned().collect();
        Ok(page(tasks, query))
    }

    async fn get_task(&self, id: TaskId) -> Result<Task, ApiError> {
        let state = self.enter("get_task")?;
        state
            .tasks
            .iter()
            .find(|t| t.id == Some(id))
            .cloned()
            .ok_or_else(|| ApiError::Reported(format!("Task {} not found", id)))
    }

    async fn create_task(&self, dto: &TaskDto) -> Result<TaskId, ApiError> {
        let mut state = self.enter("create_task")?;
        state.next_id += 1;
        let id = state.next_id;
        let mut task = Task::new(dto.title.clone().unwrap_or_default());
        task.id = Some(id);
        task.description = dto.description.clone();
        task.category = dto.category;
        task.status = dto.status.unwrap_or_default();
        task.due_date = dto.due_date.flatten().map(start_of_day);
        task.is_today_task = dto.is_today_task.unwrap_or(false);
        state.tasks.push(task);
        Ok(id)
    }

    async fn update_task(&self, dto: &TaskDto) -> Result<TaskId, ApiError> {
        let mut state = self.enter("update_task")?;
        let id = dto.id.ok_or_else(|| ApiError::Reported("missing id".to_string()))?;
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == Some(id))
            .ok_or_else(|| ApiError::Reported(format!("Task {} not found", id)))?;
        if let Some(ref title) = dto.title {
            task.title = title.clone();
        }
        if dto.description.is_some() {
            task.description = dto.description.clone();
        }
        if dto.category.is_some() {
            task.category = dto.category;
        }
        if let Some(status) = dto.status {
            task.status = status;
        }
        if let Some(due) = dto.due_date {
            task.due_date = due.map(start_of_day);
        }
        if let Some(flag) = dto.is_today_task {
            task.is_today_task = flag;
        }
        Ok(id)
    }

    async fn delete_tasks(&self, ids: &[TaskId]) -> Result<u64, ApiError> {
        let mut state = self.enter("delete_tasks")?;
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id.is_none_or(|id| !ids.contains(&id)));
        Ok((before - state.tasks.len()) as u64)
    }

    async fn set_today_task(&self, id: TaskId, is_today_task: bool) -> Result<(), ApiError> {
        let mut state = self.enter("set_today_task")?;
        if state.failing_ids.contains(&id) {
            return Err(ApiError::Reported(format!("cannot flag task {}", id)));
        }
        if let Some(task) = state.tasks.iter_mut().find(|t| t.id == Some(id)) {
            task.is_today_task = is_today_task;
        }
        Ok(())
    }

    async fn delete_completed(&self) -> Result<u64, ApiError> {
        let mut state = self.enter("delete_completed")?;
        let before = state.tasks.len();
        state.tasks.retain(|t| !t.is_completed());
        Ok((before - state.tasks.len()) as u64)
    }

    async fn completion_stats(&self) -> Result<CompletionStats, ApiError> {
        let state = self.enter("completion_stats")?;
        let completed = state.tasks.iter().filter(|t| t.status == TaskStatus::Completed).count() as u64;
        Ok(CompletionStats {
            completed,
            uncompleted: state.tasks.len() as u64 - completed,
        })
    }

    async fn suggest(&self, _prompt: &str) -> Result<SuggestionResponse, ApiError> {
        let mut state = self.enter("suggest")?;
        state.suggestions.pop_front().unwrap_or_else(|| {
            Ok(SuggestionResponse {
                success: true,
                data: Some("1. Priority analysis".to_string()),
                message: None,
            })
        })
    }
}
