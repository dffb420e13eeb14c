use chrono::NaiveDate;

use crate::models::{Category, Task, TaskDto, TaskFilters, TaskId, TaskStatus};
use crate::tui::widgets::editor::Editor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Description,
    Category,
    Status,
    DueDate,
    Today,
}

impl TaskField {
    pub const ORDER: [TaskField; 6] = [
        TaskField::Title,
        TaskField::Description,
        TaskField::Category,
        TaskField::Status,
        TaskField::DueDate,
        TaskField::Today,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TaskField::Title => "Title",
            TaskField::Description => "Description",
            TaskField::Category => "Category",
            TaskField::Status => "Status",
            TaskField::DueDate => "Due date (YYYY-MM-DD)",
            TaskField::Today => "Today's task",
        }
    }

    /// Field name used by command-layer validation errors
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(TaskField::Title),
            "description" => Some(TaskField::Description),
            "category" => Some(TaskField::Category),
            "status" => Some(TaskField::Status),
            "dueDate" => Some(TaskField::DueDate),
            "isTodayTask" => Some(TaskField::Today),
            _ => None,
        }
    }

    /// Fields edited as text; the others cycle through fixed choices
    pub fn is_text(&self) -> bool {
        matches!(self, TaskField::Title | TaskField::Description | TaskField::DueDate)
    }
}

/// Create/edit dialog state
#[derive(Debug, Clone)]
pub struct TaskForm {
    /// `None` while creating
    pub editing_id: Option<TaskId>,
    pub current_field: TaskField,
    pub title: Editor,
    pub description: Editor,
    pub due_date: Editor,
    pub category: Option<Category>,
    pub status: TaskStatus,
    pub is_today_task: bool,
    pub errors: Vec<(TaskField, String)>,
    /// Server-side failure of the last submit
    pub submit_error: Option<String>,
    pub submitting: bool,
}

impl TaskForm {
    pub fn create() -> Self {
        Self {
            editing_id: None,
            current_field: TaskField::Title,
            title: Editor::new(),
            description: Editor::new(),
            due_date: Editor::new(),
            category: Some(Category::DEFAULT),
            status: TaskStatus::NotCompleted,
            is_today_task: false,
            errors: Vec::new(),
            submit_error: None,
            submitting: false,
        }
    }

    pub fn edit(task: &Task) -> Self {
        let due = task
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        Self {
            editing_id: task.id,
            title: Editor::from_string(&task.title),
            description: Editor::from_string(task.description.as_deref().unwrap_or_default()),
            due_date: Editor::from_string(&due),
            category: task.category,
            status: task.status,
            is_today_task: task.is_today_task,
            ..Self::create()
        }
    }

    pub fn is_edit(&self) -> bool {
        self.editing_id.is_some()
    }

    pub fn title_text(&self) -> &'static str {
        if self.is_edit() { "Edit Task" } else { "New Task" }
    }

    pub fn next_field(&mut self) {
        let index = self.field_index();
        self.current_field = TaskField::ORDER[(index + 1) % TaskField::ORDER.len()];
    }

    pub fn prev_field(&mut self) {
        let index = self.field_index();
        let len = TaskField::ORDER.len();
        self.current_field = TaskField::ORDER[(index + len - 1) % len];
    }

    fn field_index(&self) -> usize {
        TaskField::ORDER
            .iter()
            .position(|f| *f == self.current_field)
            .unwrap_or(0)
    }

    pub fn current_editor_mut(&mut self) -> Option<&mut Editor> {
        self.editor_mut(self.current_field)
    }

    /// Editor behind a text field; `None` for choice fields
    pub fn editor_mut(&mut self, field: TaskField) -> Option<&mut Editor> {
        match field {
            TaskField::Title => Some(&mut self.title),
            TaskField::Description => Some(&mut self.description),
            TaskField::DueDate => Some(&mut self.due_date),
            _ => None,
        }
    }

    /// Step a choice field forward or backward
    pub fn cycle_choice(&mut self, forward: bool) {
        match self.current_field {
            TaskField::Category => {
                self.category = Some(match (self.category, forward) {
                    (None, _) => Category::DEFAULT,
                    (Some(c), true) => c.next(),
                    (Some(c), false) => c.previous(),
                });
            }
            TaskField::Status => self.status = self.status.toggled(),
            TaskField::Today => self.is_today_task = !self.is_today_task,
            _ => {}
        }
        self.clear_error(self.current_field);
    }

    /// Display value of a choice field
    pub fn choice_text(&self, field: TaskField) -> String {
        match field {
            TaskField::Category => self
                .category
                .map(|c| c.label().to_string())
                .unwrap_or_else(|| "(choose)".to_string()),
            TaskField::Status => self.status.label().to_string(),
            TaskField::Today => if self.is_today_task { "Yes" } else { "No" }.to_string(),
            _ => String::new(),
        }
    }

    pub fn error_for(&self, field: TaskField) -> Option<&str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn set_error(&mut self, field: TaskField, message: impl Into<String>) {
        self.clear_error(field);
        self.errors.push((field, message.into()));
    }

    pub fn clear_error(&mut self, field: TaskField) {
        self.errors.retain(|(f, _)| *f != field);
    }

    /// Validate and build the request body. On failure every offending field
    /// is annotated and the first one, returned, receives focus.
    pub fn to_dto(&mut self) -> Result<TaskDto, TaskField> {
        self.errors.clear();

        let title = self.title.value();
        if title.is_none() {
            self.set_error(TaskField::Title, "Title is required");
        }
        if self.category.is_none() {
            self.set_error(TaskField::Category, "Category is required");
        }
        // an emptied due date must reach the server on edit as null
        let due_date = match self.due_date.value() {
            None if self.is_edit() => Some(None),
            None => None,
            Some(text) => match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
                Ok(date) => Some(Some(date)),
                Err(_) => {
                    self.set_error(TaskField::DueDate, "Use YYYY-MM-DD");
                    None
                }
            },
        };

        if let Some(field) = TaskField::ORDER
            .into_iter()
            .find(|f| self.error_for(*f).is_some())
        {
            self.current_field = field;
            return Err(field);
        }

        // an emptied description must reach the server on edit
        let description = match (self.description.value(), self.is_edit()) {
            (Some(text), _) => Some(text),
            (None, true) => Some(String::new()),
            (None, false) => None,
        };

        Ok(TaskDto {
            id: self.editing_id,
            title,
            description,
            category: self.category,
            status: Some(self.status),
            due_date,
            is_today_task: Some(self.is_today_task),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Title,
    Category,
    Status,
    DueFrom,
    DueTo,
    Apply,
    Clear,
    Cancel,
}

impl FilterField {
    pub const ORDER: [FilterField; 8] = [
        FilterField::Title,
        FilterField::Category,
        FilterField::Status,
        FilterField::DueFrom,
        FilterField::DueTo,
        FilterField::Apply,
        FilterField::Clear,
        FilterField::Cancel,
    ];
}

/// What the filter modal asks the app to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    Apply(TaskFilters),
    Clear,
    Cancel,
}

/// Filter modal state, seeded from the table's active filters
#[derive(Debug, Clone)]
pub struct FilterForm {
    pub current_field: FilterField,
    pub title: Editor,
    /// `None` = any category
    pub category: Option<Category>,
    /// `None` = any status
    pub status: Option<TaskStatus>,
    pub due_from: Editor,
    pub due_to: Editor,
    pub error: Option<String>,
}

impl FilterForm {
    pub fn from_filters(filters: &TaskFilters) -> Self {
        let date = |d: Option<NaiveDate>| {
            Editor::from_string(&d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default())
        };
        Self {
            current_field: FilterField::Title,
            title: Editor::from_string(filters.title.as_deref().unwrap_or_default()),
            category: filters.category,
            status: filters.status,
            due_from: date(filters.due_from),
            due_to: date(filters.due_to),
            error: None,
        }
    }

    pub fn next_field(&mut self) {
        let index = self.field_index();
        self.current_field = FilterField::ORDER[(index + 1) % FilterField::ORDER.len()];
    }

    pub fn prev_field(&mut self) {
        let index = self.field_index();
        let len = FilterField::ORDER.len();
        self.current_field = FilterField::ORDER[(index + len - 1) % len];
    }

    fn field_index(&self) -> usize {
        FilterField::ORDER
            .iter()
            .position(|f| *f == self.current_field)
            .unwrap_or(0)
    }

    pub fn current_editor_mut(&mut self) -> Option<&mut Editor> {
        match self.current_field {
            FilterField::Title => Some(&mut self.title),
            FilterField::DueFrom => Some(&mut self.due_from),
            FilterField::DueTo => Some(&mut self.due_to),
            _ => None,
        }
    }

    /// Cycle category: any → Work → … → Other → any
    pub fn cycle_choice(&mut self, forward: bool) {
        match self.current_field {
            FilterField::Category => {
                let mut options = vec![None];
                options.extend(Category::ALL.into_iter().map(Some));
                self.category = step(&options, self.category, forward);
            }
            FilterField::Status => {
                let options = [None, Some(TaskStatus::NotCompleted), Some(TaskStatus::Completed)];
                self.status = step(&options, self.status, forward);
            }
            _ => {}
        }
    }

    pub fn category_text(&self) -> &'static str {
        self.category.map(|c| c.label()).unwrap_or("Any")
    }

    pub fn status_text(&self) -> &'static str {
        self.status.map(|s| s.label()).unwrap_or("Any")
    }

    /// Enter on the current field
    pub fn activate(&mut self) -> Option<FilterOutcome> {
        match self.current_field {
            FilterField::Clear => Some(FilterOutcome::Clear),
            FilterField::Cancel => Some(FilterOutcome::Cancel),
            _ => match self.to_filters() {
                Ok(filters) => Some(FilterOutcome::Apply(filters)),
                Err(message) => {
                    self.error = Some(message);
                    None
                }
            },
        }
    }

    pub fn to_filters(&self) -> Result<TaskFilters, String> {
        let parse = |editor: &Editor, label: &str| -> Result<Option<NaiveDate>, String> {
            editor
                .value()
                .map(|text| {
                    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                        .map_err(|_| format!("{}: use YYYY-MM-DD", label))
                })
                .transpose()
        };
        let due_from = parse(&self.due_from, "Due from")?;
        let due_to = parse(&self.due_to, "Due to")?;
        if let (Some(from), Some(to)) = (due_from, due_to) {
            if from > to {
                return Err("Due range is reversed".to_string());
            }
        }
        Ok(TaskFilters {
            title: self.title.value(),
            category: self.category,
            status: self.status,
            due_from,
            due_to,
        })
    }
}

fn step<T: Copy + PartialEq>(options: &[T], current: T, forward: bool) -> T {
    let index = options.iter().position(|o| *o == current).unwrap_or(0);
    let len = options.len();
    let next = if forward { (index + 1) % len } else { (index + len - 1) % len };
    options[next]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::start_of_day;

    fn typed(text: &str) -> Editor {
        Editor::from_string(text)
    }

    #[test]
    fn create_form_uses_defaults() {
        let mut form = TaskForm::create();
        form.title = typed("Read chapter 3");
        let dto = form.to_dto().unwrap();
        assert_eq!(dto.id, None);
        assert_eq!(dto.category, Some(Category::Study));
        assert_eq!(dto.status, Some(TaskStatus::NotCompleted));
        assert_eq!(dto.is_today_task, Some(false));
        assert_eq!(dto.description, None);
        assert_eq!(dto.due_date, None);
    }

    #[test]
    fn edit_form_prefills_every_field() {
        let mut task = Task::new("Write report".to_string());
        task.id = Some(7);
        task.description = Some("quarterly".to_string());
        task.category = Some(Category::Work);
        task.status = TaskStatus::Completed;
        task.due_date = NaiveDate::from_ymd_opt(2025, 3, 1).map(start_of_day);
        task.is_today_task = true;

        let mut form = TaskForm::edit(&task);
        assert_eq!(form.title_text(), "Edit Task");
        assert_eq!(form.due_date.to_string(), "2025-03-01");

        let dto = form.to_dto().unwrap();
        assert_eq!(dto.id, Some(7));
        assert_eq!(dto.title.as_deref(), Some("Write report"));
        assert_eq!(dto.description.as_deref(), Some("quarterly"));
        assert_eq!(dto.category, Some(Category::Work));
        assert_eq!(dto.status, Some(TaskStatus::Completed));
        assert_eq!(dto.due_date, Some(NaiveDate::from_ymd_opt(2025, 3, 1)));
        assert_eq!(dto.is_today_task, Some(true));
    }

    #[test]
    fn clearing_description_on_edit_sends_empty_text() {
        let mut task = Task::new("x".to_string());
        task.id = Some(1);
        task.description = Some("old".to_string());
        let mut form = TaskForm::edit(&task);
        form.description = Editor::new();
        assert_eq!(form.to_dto().unwrap().description.as_deref(), Some(""));
    }

    #[test]
    fn clearing_due_date_on_edit_sends_null() {
        let mut task = Task::new("Ship".to_string());
        task.id = Some(4);
        task.due_date = NaiveDate::from_ymd_opt(2025, 3, 1).map(start_of_day);
        let mut form = TaskForm::edit(&task);
        form.due_date = Editor::new();

        let dto = form.to_dto().unwrap();
        assert_eq!(dto.due_date, Some(None));
        let value = serde_json::to_value(&dto).unwrap();
        assert_eq!(value["dueDate"], serde_json::Value::Null);
        assert!(value.as_object().unwrap().contains_key("dueDate"));
    }

    #[test]
    fn validation_errors_attach_to_fields() {
        let mut form = TaskForm::create();
        form.category = None;
        form.due_date = typed("2025/01/01");
        form.current_field = TaskField::Today;

        assert_eq!(form.to_dto().unwrap_err(), TaskField::Title);
        assert_eq!(form.error_for(TaskField::Title), Some("Title is required"));
        assert_eq!(form.error_for(TaskField::Category), Some("Category is required"));
        assert_eq!(form.error_for(TaskField::DueDate), Some("Use YYYY-MM-DD"));
        assert_eq!(form.current_field, TaskField::Title);

        form.title = typed("ok");
        form.current_field = TaskField::Category;
        form.cycle_choice(true);
        assert_eq!(form.error_for(TaskField::Category), None);
        form.due_date = typed("2025-01-01");
        assert!(form.to_dto().is_ok());
        assert!(form.errors.is_empty());
    }

    #[test]
    fn field_navigation_wraps() {
        let mut form = TaskForm::create();
        form.prev_field();
        assert_eq!(form.current_field, TaskField::Today);
        form.next_field();
        assert_eq!(form.current_field, TaskField::Title);
        form.current_field = TaskField::Today;
        form.cycle_choice(true);
        assert!(form.is_today_task);
        assert!(form.current_editor_mut().is_none());
    }

    #[test]
    fn filter_form_round_trips_active_filters() {
        let filters = TaskFilters {
            title: Some("milk".to_string()),
            category: Some(Category::Life),
            status: None,
            due_from: NaiveDate::from_ymd_opt(2025, 1, 1),
            due_to: None,
        };
        let mut form = FilterForm::from_filters(&filters);
        assert_eq!(form.activate(), Some(FilterOutcome::Apply(filters)));
    }

    #[test]
    fn filter_form_cycles_and_validates() {
        let mut form = FilterForm::from_filters(&TaskFilters::default());
        form.current_field = FilterField::Category;
        form.cycle_choice(true);
        assert_eq!(form.category_text(), "Work");
        form.cycle_choice(false);
        form.cycle_choice(false);
        assert_eq!(form.category_text(), "Other");

        form.current_field = FilterField::Status;
        form.cycle_choice(true);
        assert_eq!(form.status, Some(TaskStatus::NotCompleted));

        form.due_from = typed("2025-02-01");
        form.due_to = typed("2025-01-01");
        form.current_field = FilterField::Apply;
        assert_eq!(form.activate(), None);
        assert_eq!(form.error.as_deref(), Some("Due range is reversed"));

        form.current_field = FilterField::Clear;
        assert_eq!(form.activate(), Some(FilterOutcome::Clear));
    }
}
