use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned task identifier
pub type TaskId = i64;

/// Fixed set of task categories.
/// The task service stores the Chinese labels, so those are the wire values;
/// English labels are accepted on input and used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "工作", alias = "Work")]
    Work,
    #[serde(rename = "学习", alias = "Study")]
    Study,
    #[serde(rename = "生活", alias = "Life")]
    Life,
    #[serde(rename = "其他", alias = "Other")]
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Work, Category::Study, Category::Life, Category::Other];

    /// Category preselected when creating a new task
    pub const DEFAULT: Category = Category::Study;

    pub fn label(&self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Study => "Study",
            Category::Life => "Life",
            Category::Other => "Other",
        }
    }

    pub fn wire_value(&self) -> &'static str {
        match self {
            Category::Work => "工作",
            Category::Study => "学习",
            Category::Life => "生活",
            Category::Other => "其他",
        }
    }

    /// Parse either the English label (case-insensitive) or the wire value
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|category| {
            category.label().eq_ignore_ascii_case(value) || category.wire_value() == value
        })
    }

    /// Next category in display order, wrapping around
    pub fn next(&self) -> Self {
        let index = Self::ALL.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        let index = Self::ALL.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL[(index + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Completion flag. The service encodes it as the strings "true" / "false".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "true")]
    Completed,
    #[serde(rename = "false")]
    #[default]
    NotCompleted,
}

impl TaskStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    pub fn toggled(&self) -> Self {
        match self {
            TaskStatus::Completed => TaskStatus::NotCompleted,
            TaskStatus::NotCompleted => TaskStatus::Completed,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Completed => "Completed",
            TaskStatus::NotCompleted => "Not completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "done" | "completed" => Some(TaskStatus::Completed),
            "false" | "todo" | "open" | "not-completed" => Some(TaskStatus::NotCompleted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: Option<TaskId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "wire::category")]
    pub category: Option<Category>,
    #[serde(default, deserialize_with = "wire::status")]
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "wire::timestamp")]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "wire::flag")]
    pub is_today_task: bool,
    #[serde(default, deserialize_with = "wire::timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "wire::timestamp")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Task {
    pub fn new(title: String) -> Self {
        Self {
            id: None,
            title,
            description: None,
            category: Some(Category::DEFAULT),
            status: TaskStatus::NotCompleted,
            due_date: None,
            is_today_task: false,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// Calendar day of the due instant, for display and the form
    pub fn due_day(&self) -> Option<NaiveDate> {
        self.due_date.map(|due| due.date())
    }

    /// Display-only overdue flag: the due instant lies strictly before `now`
    /// and the task is not completed. Date-only due values count from midnight.
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        match self.due_date {
            Some(due) => due < now && !self.is_completed(),
            None => false,
        }
    }
}

/// Create/update payload. Absent fields are not serialized, which gives
/// partial-update semantics on `updateTasks`. `due_date: Some(None)` is sent
/// as an explicit `null` so an edit can clear the date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<TaskId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_today_task: Option<bool>,
}

impl TaskDto {
    /// Update that only flips the completion flag
    pub fn status_only(id: TaskId, status: TaskStatus) -> Self {
        Self {
            id: Some(id),
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Sortable table columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    DueDate,
    CreatedAt,
}

impl SortField {
    /// Column name understood by the service's order clause
    pub fn column(&self) -> &'static str {
        match self {
            SortField::DueDate => "dueDate",
            SortField::CreatedAt => "created_at",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortField::DueDate => "Due date",
            SortField::CreatedAt => "Created",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn token(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

/// Filter fields of the task list search form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilters {
    pub title: Option<String>,
    pub category: Option<Category>,
    pub status: Option<TaskStatus>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
}

impl TaskFilters {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// One-line description for the filters box
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ref title) = self.title {
            parts.push(format!("Title ~ \"{}\"", title));
        }
        if let Some(category) = self.category {
            parts.push(format!("Category: {}", category));
        }
        if let Some(status) = self.status {
            parts.push(format!("Status: {}", status.label()));
        }
        match (self.due_from, self.due_to) {
            (Some(from), Some(to)) => parts.push(format!("Due: {} .. {}", from, to)),
            (Some(from), None) => parts.push(format!("Due from {}", from)),
            (None, Some(to)) => parts.push(format!("Due until {}", to)),
            (None, None) => {}
        }
        if parts.is_empty() {
            "No filters".to_string()
        } else {
            parts.join(" | ")
        }
    }
}

/// Body of `listTasks` / `listTodayTasks`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub current: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
}

impl TaskQuery {
    pub fn page(current: u32, page_size: u32) -> Self {
        Self {
            current: current.max(1),
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    pub fn with_filters(mut self, filters: &TaskFilters) -> Self {
        self.task_name = filters.title.clone();
        self.category = filters.category;
        self.status = filters.status;
        self.start_date = filters.due_from;
        self.end_date = filters.due_to;
        self
    }
}

/// Raw page as returned by the service; every field may be missing
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    #[serde(default)]
    pub current: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
    pub list: Option<Vec<T>>,
}

impl<T> Default for PageResponse<T> {
    fn default() -> Self {
        Self {
            current: None,
            page_size: None,
            total: None,
            list: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionRequest {
    pub prompt: String,
}

/// Reply of the suggestion endpoint. `success = false` is a reported failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SuggestionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Lenient decoders for the service's JSON. Dates arrive as `YYYY-MM-DD`,
/// ISO timestamps, `YYYY-MM-DD HH:MM:SS` or epoch milliseconds.
pub mod wire {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTime {
        Millis(i64),
        Text(String),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFlag {
        Bool(bool),
        Number(i64),
        Text(String),
    }

    /// Parse any of the timestamp shapes the service emits, in local time
    pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.with_timezone(&Local).naive_local());
        }
        if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z") {
            return Some(dt.with_timezone(&Local).naive_local());
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
                return Some(dt);
            }
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    }

    pub fn from_millis(millis: i64) -> Option<NaiveDateTime> {
        DateTime::from_timestamp_millis(millis).map(|dt| dt.with_timezone(&Local).naive_local())
    }

    pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<RawTime>::deserialize(deserializer)?;
        Ok(match raw {
            Some(RawTime::Millis(millis)) => from_millis(millis),
            Some(RawTime::Text(text)) => parse_timestamp(&text),
            None => None,
        })
    }

    /// Unknown categories degrade to `None` instead of failing the whole page
    pub fn category<'de, D>(deserializer: D) -> Result<Option<Category>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(Category::parse))
    }

    pub fn status<'de, D>(deserializer: D) -> Result<TaskStatus, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<RawFlag>::deserialize(deserializer)?;
        Ok(match raw {
            Some(RawFlag::Bool(true)) => TaskStatus::Completed,
            Some(RawFlag::Number(n)) if n != 0 => TaskStatus::Completed,
            Some(RawFlag::Text(text)) => TaskStatus::parse(&text).unwrap_or_default(),
            _ => TaskStatus::NotCompleted,
        })
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<RawFlag>::deserialize(deserializer)?;
        Ok(match raw {
            Some(RawFlag::Bool(value)) => value,
            Some(RawFlag::Number(n)) => n != 0,
            Some(RawFlag::Text(text)) => matches!(text.trim(), "true" | "1"),
            None => false,
        })
    }
}
