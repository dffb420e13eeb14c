use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui::widgets::TableState;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::Config;
use crate::api::PageData;
use crate::assistant::{self, RetryPolicy};
use crate::commands::{CommandError, TaskCommands};
use crate::models::{SortField, SortOrder, Task};
use crate::stats::CompletionStats;
use crate::table::{BulkAction, ListScope, PendingBulk, TaskTable};
use crate::timer::{FocusSession, Phase, TickOutcome, TickSchedule};
use crate::tui::forms::{FilterForm, FilterOutcome, TaskField, TaskForm};

const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 3;
const TIMER_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Tasks,
    Today,
    Stats,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Tasks, Tab::Today, Tab::Stats];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Tasks => "Tasks",
            Tab::Today => "Today",
            Tab::Stats => "Stats",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Tasks => 0,
            Tab::Today => 1,
            Tab::Stats => 2,
        }
    }

    /// Task list shown on this tab
    pub fn scope(&self) -> Option<ListScope> {
        match self {
            Tab::Tasks => Some(ListScope::All),
            Tab::Today => Some(ListScope::Today),
            Tab::Stats => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Help,
    Filter,
    Edit,
    Confirm,
    Focus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmTarget {
    /// The pending bulk action of a table
    Bulk(ListScope),
    CloseFocus,
}

#[derive(Debug, Clone)]
pub struct ConfirmState {
    pub target: ConfirmTarget,
    pub prompt: String,
    /// 0 = confirm, 1 = cancel
    pub selection: usize,
    return_mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoticeLevel {
    #[default]
    Info,
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub level: NoticeLevel,
    pub message_time: Option<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct AssistantState {
    pub suggestion: Option<String>,
    pub generating: bool,
    /// Attempt that just failed while a retry is pending
    pub retry: Option<u32>,
    pub error: Option<String>,
    pub scroll: u16,
}

#[derive(Debug, Clone, Default)]
pub struct StatsState {
    pub data: Option<CompletionStats>,
    pub loading: bool,
    pub error: Option<String>,
    /// Fetch again next time the Stats tab is shown
    pub stale: bool,
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub current_tab: Tab,
    pub mode: Mode,
    pub tasks_view: TableState,
    pub today_view: TableState,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            current_tab: Tab::Tasks,
            mode: Mode::View,
            tasks_view: TableState::default(),
            today_view: TableState::default(),
        }
    }
}

/// Results of background work, drained by the event loop every frame
#[derive(Debug)]
pub enum AppEvent {
    PageLoaded {
        scope: ListScope,
        seq: u64,
        result: Result<PageData<Task>, String>,
    },
    FormSaved(Result<String, CommandError>),
    /// A row or bulk mutation finished
    ActionFinished {
        origin: ListScope,
        bulk: bool,
        result: Result<String, String>,
    },
    StatsLoaded(Result<CompletionStats, String>),
    SuggestionRetrying(u32),
    SuggestionFinished(Result<String, String>),
    TimerTick(u64),
}

pub struct App {
    pub config: Config,
    config_path: Option<PathBuf>,
    commands: TaskCommands,
    runtime: Handle,
    events_tx: UnboundedSender<AppEvent>,
    events_rx: UnboundedReceiver<AppEvent>,

    pub tasks: TaskTable,
    pub today: TaskTable,

    pub ui: UiState,
    pub task_form: Option<TaskForm>,
    pub filter_form: Option<FilterForm>,
    pub confirm: Option<ConfirmState>,
    pub focus: Option<FocusSession>,
    pub assistant: AssistantState,
    pub stats: StatsState,
    pub status: StatusState,
}

impl App {
    pub fn new(config: Config, commands: TaskCommands, runtime: Handle) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let page_size = config.page_size;
        Self {
            config,
            config_path: None,
            commands,
            runtime,
            events_tx,
            events_rx,
            tasks: TaskTable::new(ListScope::All, page_size),
            today: TaskTable::new(ListScope::Today, page_size),
            ui: UiState::default(),
            task_form: None,
            filter_form: None,
            confirm: None,
            focus: None,
            assistant: AssistantState::default(),
            stats: StatsState {
                stale: true,
                ..StatsState::default()
            },
            status: StatusState::default(),
        }
    }

    /// Where theme changes are persisted
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    pub fn table(&self, scope: ListScope) -> &TaskTable {
        match scope {
            ListScope::All => &self.tasks,
            ListScope::Today => &self.today,
        }
    }

    pub fn table_mut(&mut self, scope: ListScope) -> &mut TaskTable {
        match scope {
            ListScope::All => &mut self.tasks,
            ListScope::Today => &mut self.today,
        }
    }

    pub fn active_scope(&self) -> Option<ListScope> {
        self.ui.current_tab.scope()
    }

    pub fn active_table(&self) -> Option<&TaskTable> {
        self.active_scope().map(|scope| self.table(scope))
    }

    /// Row under the cursor on the active tab
    pub fn current_row(&self) -> Option<&Task> {
        self.active_table().and_then(TaskTable::selected_row)
    }

    /// Per-frame housekeeping: apply finished work, expire the notice and
    /// start the reloads that were asked for.
    pub fn update(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_app_event(event);
        }
        self.check_status_message_timeout();

        for scope in [ListScope::All, ListScope::Today] {
            if self.table_mut(scope).take_reload() {
                self.start_load(scope);
            }
        }
        if self.ui.current_tab == Tab::Stats && self.stats.stale && !self.stats.loading {
            self.load_stats();
        }
    }

    fn spawn<F>(&self, work: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            // the receiver only goes away on shutdown
            let _ = tx.send(work.await);
        });
    }

    fn start_load(&mut self, scope: ListScope) {
        let (seq, query) = self.table_mut(scope).begin_load();
        debug!(?scope, seq, page = query.current, "loading tasks");
        let commands = self.commands.clone();
        self.spawn(async move {
            let result = commands
                .load_page(scope, &query)
                .await
                .map_err(|e| e.to_string());
            AppEvent::PageLoaded { scope, seq, result }
        });
    }

    fn load_stats(&mut self) {
        self.stats.loading = true;
        self.stats.stale = false;
        let commands = self.commands.clone();
        self.spawn(async move {
            AppEvent::StatsLoaded(commands.completion_stats().await.map_err(|e| e.to_string()))
        });
    }

    /// Every mutation may change both lists and the counts
    fn invalidate_all(&mut self) {
        self.tasks.invalidate();
        self.today.invalidate();
        self.stats.stale = true;
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::PageLoaded { scope, seq, result } => {
                let failure = result.as_ref().err().cloned();
                if !self.table_mut(scope).finish_load(seq, result) {
                    debug!(?scope, seq, "ignoring stale page");
                    return;
                }
                if let Some(message) = failure {
                    self.set_error_message(message);
                }
            }
            AppEvent::FormSaved(result) => self.finish_form(result),
            AppEvent::ActionFinished { origin, bulk, result } => {
                let success = result.is_ok();
                match result {
                    Ok(message) => {
                        self.set_status_message(message);
                        self.invalidate_all();
                    }
                    Err(message) => self.set_error_message(message),
                }
                if bulk {
                    self.table_mut(origin).complete_bulk(success);
                }
            }
            AppEvent::StatsLoaded(result) => {
                self.stats.loading = false;
                match result {
                    Ok(data) => {
                        self.stats.data = Some(data);
                        self.stats.error = None;
                    }
                    Err(message) => self.stats.error = Some(message),
                }
            }
            AppEvent::SuggestionRetrying(attempt) => self.assistant.retry = Some(attempt),
            AppEvent::SuggestionFinished(result) => {
                self.assistant.generating = false;
                self.assistant.retry = None;
                match result {
                    Ok(text) => {
                        self.assistant.suggestion = Some(text);
                        self.assistant.error = None;
                        self.assistant.scroll = 0;
                    }
                    Err(message) => self.assistant.error = Some(message),
                }
            }
            AppEvent::TimerTick(generation) => self.on_timer_tick(generation),
        }
    }

    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status.message = Some(message.into());
        self.status.level = NoticeLevel::Info;
        self.status.message_time = Some(Instant::now());
    }

    pub fn set_error_message(&mut self, message: impl Into<String>) {
        self.set_status_message(message);
        self.status.level = NoticeLevel::Error;
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    /// Auto-clear the notice after 3 seconds
    pub fn check_status_message_timeout(&mut self) {
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.clear_status_message();
            }
        }
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.ui.current_tab = tab;
        if tab == Tab::Stats {
            self.stats.stale = true;
        }
    }

    pub fn next_tab(&mut self) {
        let next = Tab::ALL[(self.ui.current_tab.index() + 1) % Tab::ALL.len()];
        self.switch_tab(next);
    }

    pub fn prev_tab(&mut self) {
        let len = Tab::ALL.len();
        let prev = Tab::ALL[(self.ui.current_tab.index() + len - 1) % len];
        self.switch_tab(prev);
    }

    pub fn reload(&mut self) {
        match self.active_scope() {
            Some(scope) => self.table_mut(scope).invalidate(),
            None => self.stats.stale = true,
        }
    }

    pub fn move_up(&mut self) {
        if let Some(scope) = self.active_scope() {
            self.table_mut(scope).move_up();
        }
    }

    pub fn move_down(&mut self) {
        if let Some(scope) = self.active_scope() {
            self.table_mut(scope).move_down();
        }
    }

    pub fn toggle_selection(&mut self) {
        if let Some(scope) = self.active_scope() {
            self.table_mut(scope).toggle_selection();
        }
    }

    pub fn clear_selection(&mut self) {
        if let Some(scope) = self.active_scope() {
            self.table_mut(scope).clear_selection();
        }
    }

    pub fn next_page(&mut self) {
        if let Some(scope) = self.active_scope() {
            if !self.table_mut(scope).next_page() {
                self.set_status_message("Already on the last page");
            }
        }
    }

    pub fn prev_page(&mut self) {
        if let Some(scope) = self.active_scope() {
            if !self.table_mut(scope).prev_page() {
                self.set_status_message("Already on the first page");
            }
        }
    }

    /// Sorting applies to the full task list only
    pub fn sort_by(&mut self, field: SortField) {
        if self.ui.current_tab != Tab::Tasks {
            return;
        }
        self.tasks.sort_by(field);
        if let Some(sort) = self.tasks.sort {
            let direction = match sort.order {
                SortOrder::Asc => "ascending",
                SortOrder::Desc => "descending",
            };
            self.set_status_message(format!("Sorted by {} {}", sort.field.label().to_lowercase(), direction));
        }
    }

    pub fn open_create_form(&mut self) {
        self.task_form = Some(TaskForm::create());
        self.ui.mode = Mode::Edit;
    }

    pub fn open_edit_form(&mut self) {
        match self.current_row() {
            Some(task) => {
                self.task_form = Some(TaskForm::edit(task));
                self.ui.mode = Mode::Edit;
            }
            None => self.set_status_message("No task selected"),
        }
    }

    pub fn cancel_form(&mut self) {
        self.task_form = None;
        self.ui.mode = Mode::View;
    }

    /// Validate locally, then create or update in the background
    pub fn submit_form(&mut self) {
        let Some(form) = self.task_form.as_mut() else {
            return;
        };
        if form.submitting {
            return;
        }
        let Ok(dto) = form.to_dto() else {
            return;
        };
        form.submitting = true;
        form.submit_error = None;
        let editing = form.is_edit();

        let commands = self.commands.clone();
        self.spawn(async move {
            let result = if editing {
                commands.update(dto).await
            } else {
                commands.create(dto).await
            };
            AppEvent::FormSaved(result.map(|outcome| outcome.message))
        });
    }

    fn finish_form(&mut self, result: Result<String, CommandError>) {
        match result {
            Ok(message) => {
                if self.ui.mode == Mode::Edit {
                    self.ui.mode = Mode::View;
                }
                self.task_form = None;
                self.set_status_message(message);
                self.invalidate_all();
            }
            Err(error) => {
                let Some(form) = self.task_form.as_mut() else {
                    self.set_error_message(error.to_string());
                    return;
                };
                form.submitting = false;
                match &error {
                    CommandError::Validation { field, message } => match TaskField::from_name(field) {
                        Some(field) => {
                            form.set_error(field, message.clone());
                            form.current_field = field;
                        }
                        None => form.submit_error = Some(message.clone()),
                    },
                    CommandError::Api { .. } => form.submit_error = Some(error.to_string()),
                }
            }
        }
    }

    pub fn toggle_status(&mut self) {
        let (Some(origin), Some(task)) = (self.active_scope(), self.current_row().cloned()) else {
            return;
        };
        let commands = self.commands.clone();
        self.spawn(async move {
            let result = commands
                .toggle_status(&task)
                .await
                .map(|outcome| outcome.message)
                .map_err(|e| e.to_string());
            AppEvent::ActionFinished {
                origin,
                bulk: false,
                result,
            }
        });
    }

    /// Flip the today flag of the row under the cursor
    pub fn toggle_today(&mut self) {
        let Some(origin) = self.active_scope() else {
            return;
        };
        let Some((id, flag)) = self
            .current_row()
            .and_then(|task| task.id.map(|id| (id, !task.is_today_task)))
        else {
            return;
        };
        let commands = self.commands.clone();
        self.spawn(async move {
            let result = commands
                .set_today_flag(id, flag)
                .await
                .map(|outcome| outcome.message)
                .map_err(|e| e.to_string());
            AppEvent::ActionFinished {
                origin,
                bulk: false,
                result,
            }
        });
    }

    /// Delete the selection, or the row under the cursor when nothing is selected
    pub fn request_delete(&mut self) {
        let Some(scope) = self.active_scope() else {
            return;
        };
        let table = self.table_mut(scope);
        let pending = if table.selection_len() > 0 {
            table.request_bulk(BulkAction::Delete).cloned()
        } else {
            match table.selected_row().and_then(|task| task.id) {
                Some(id) => table.request_action(BulkAction::Delete, vec![id]).cloned(),
                None => None,
            }
        };
        match pending {
            Some(pending) => self.open_confirm(
                ConfirmTarget::Bulk(scope),
                BulkAction::Delete.prompt(pending.ids.len()),
            ),
            None => self.set_status_message("No task selected"),
        }
    }

    pub fn request_bulk(&mut self, action: BulkAction) {
        let Some(scope) = self.active_scope() else {
            return;
        };
        match self.table_mut(scope).request_bulk(action).cloned() {
            Some(pending) => self.open_confirm(ConfirmTarget::Bulk(scope), action.prompt(pending.ids.len())),
            None => self.set_status_message("Select tasks first"),
        }
    }

    fn open_confirm(&mut self, target: ConfirmTarget, prompt: String) {
        self.confirm = Some(ConfirmState {
            target,
            prompt,
            selection: 0,
            return_mode: self.ui.mode,
        });
        self.ui.mode = Mode::Confirm;
    }

    pub fn confirm_toggle_selection(&mut self) {
        if let Some(confirm) = self.confirm.as_mut() {
            confirm.selection = 1 - confirm.selection.min(1);
        }
    }

    /// Run the highlighted choice of the confirmation dialog
    pub fn confirm_accept(&mut self) {
        let Some(confirm) = self.confirm.take() else {
            return;
        };
        self.ui.mode = confirm.return_mode;
        if confirm.selection != 0 {
            self.abandon(confirm.target);
            return;
        }
        match confirm.target {
            ConfirmTarget::Bulk(scope) => {
                if let Some(pending) = self.table_mut(scope).confirm_bulk() {
                    self.run_bulk(scope, pending);
                }
            }
            ConfirmTarget::CloseFocus => self.close_focus(),
        }
    }

    pub fn confirm_cancel(&mut self) {
        if let Some(confirm) = self.confirm.take() {
            self.ui.mode = confirm.return_mode;
            self.abandon(confirm.target);
        }
    }

    fn abandon(&mut self, target: ConfirmTarget) {
        if let ConfirmTarget::Bulk(scope) = target {
            self.table_mut(scope).cancel_bulk();
        }
    }

    fn run_bulk(&mut self, origin: ListScope, pending: PendingBulk) {
        info!(action = ?pending.action, count = pending.ids.len(), "running bulk action");
        let commands = self.commands.clone();
        self.spawn(async move {
            let ids = &pending.ids;
            let result = match pending.action {
                BulkAction::Delete => commands.bulk_delete(ids).await.map(|o| o.message),
                BulkAction::AddToToday => commands.set_today_batch(ids, true).await.map(|o| o.message),
                BulkAction::RemoveFromToday => commands.set_today_batch(ids, false).await.map(|o| o.message),
                BulkAction::DeleteCompleted => commands.delete_completed().await.map(|o| o.message),
            };
            AppEvent::ActionFinished {
                origin,
                bulk: true,
                result: result.map_err(|e| e.to_string()),
            }
        });
    }

    pub fn open_filter(&mut self) {
        if self.ui.current_tab != Tab::Tasks {
            return;
        }
        self.filter_form = Some(FilterForm::from_filters(&self.tasks.filters));
        self.ui.mode = Mode::Filter;
    }

    pub fn finish_filter(&mut self, outcome: FilterOutcome) {
        match outcome {
            FilterOutcome::Apply(filters) => {
                self.tasks.set_filters(filters);
                self.set_status_message("Filters applied");
            }
            FilterOutcome::Clear => {
                self.tasks.clear_filters();
                self.set_status_message("Filters cleared");
            }
            FilterOutcome::Cancel => {}
        }
        self.filter_form = None;
        self.ui.mode = Mode::View;
    }

    /// Open the focus timer for the row under the cursor
    pub fn open_focus(&mut self) {
        let Some(title) = self.current_row().map(|task| task.title.clone()) else {
            self.set_status_message("No task selected");
            return;
        };
        self.focus = Some(FocusSession::new(title, self.config.timer));
        self.ui.mode = Mode::Focus;
    }

    pub fn toggle_focus(&mut self) {
        let runtime = self.runtime.clone();
        let tx = self.events_tx.clone();
        if let Some(session) = self.focus.as_mut() {
            session.toggle(|generation| {
                TickSchedule::spawn(&runtime, TIMER_TICK, move || {
                    let _ = tx.send(AppEvent::TimerTick(generation));
                })
            });
        }
    }

    pub fn reset_focus(&mut self) {
        if let Some(session) = self.focus.as_mut() {
            session.reset();
        }
    }

    /// Close the timer, asking first while it runs
    pub fn request_close_focus(&mut self) {
        let running = self
            .focus
            .as_ref()
            .is_some_and(FocusSession::needs_close_confirmation);
        if running {
            self.open_confirm(
                ConfirmTarget::CloseFocus,
                "The timer is still running. Stop it and close?".to_string(),
            );
        } else {
            self.close_focus();
        }
    }

    /// Drop the session along with its tick schedule
    pub fn close_focus(&mut self) {
        self.focus = None;
        self.ui.mode = Mode::View;
    }

    fn on_timer_tick(&mut self, generation: u64) {
        let Some(session) = self.focus.as_mut() else {
            return;
        };
        if let TickOutcome::PhaseChanged(phase) = session.on_tick(generation) {
            info!(phase = phase.label(), cycles = session.timer.completed_cycles(), "timer phase changed");
            let message = match phase {
                Phase::Work => "Break is over, ready for the next session",
                Phase::ShortBreak => "Session complete, take a short break",
                Phase::LongBreak => "Four sessions done, take a long break",
            };
            self.set_status_message(message);
        }
    }

    /// Ask the assistant to plan the current today list
    pub fn generate_suggestion(&mut self) {
        if self.assistant.generating {
            return;
        }
        if self.today.rows.is_empty() {
            self.set_status_message("Add tasks to today before asking for a plan");
            return;
        }
        let prompt = assistant::build_prompt(&self.today.rows);
        self.assistant.generating = true;
        self.assistant.retry = None;
        self.assistant.error = None;

        let api = self.commands.api();
        let policy = RetryPolicy::from(&self.config.assistant);
        let retry_tx = self.events_tx.clone();
        self.spawn(async move {
            let result = assistant::request_suggestion(api.as_ref(), &prompt, policy, move |attempt| {
                let _ = retry_tx.send(AppEvent::SuggestionRetrying(attempt));
            })
            .await;
            AppEvent::SuggestionFinished(result.map_err(|e| e.to_string()))
        });
    }

    pub fn copy_suggestion(&mut self) {
        let Some(text) = self.assistant.suggestion.clone() else {
            self.set_status_message("Nothing to copy yet");
            return;
        };
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
            Ok(()) => self.set_status_message("Suggestion copied to clipboard"),
            Err(e) => {
                warn!(error = %e, "clipboard unavailable");
                self.set_error_message(format!("Clipboard unavailable: {}", e));
            }
        }
    }

    pub fn scroll_suggestion(&mut self, down: bool) {
        self.assistant.scroll = if down {
            self.assistant.scroll.saturating_add(1)
        } else {
            self.assistant.scroll.saturating_sub(1)
        };
    }

    /// Switch to the next theme and persist the choice
    pub fn cycle_theme(&mut self) {
        let name = self.config.next_theme();
        if let Some(path) = self.config_path.clone() {
            if let Err(e) = self.config.save_to(&path) {
                warn!(error = %e, "failed to save theme");
                self.set_error_message(format!("Theme {} not saved: {}", name, e));
                return;
            }
        }
        self.set_status_message(format!("Theme: {}", name));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::TaskApi;
    use crate::api::testing::{FakeTaskApi, task};
    use crate::models::{SuggestionResponse, TaskStatus};
    use crate::table::LoadState;
    use crate::tui::widgets::editor::Editor;

    fn app_with(api: &Arc<FakeTaskApi>) -> App {
        let mut config = Config::default();
        config.assistant.retry_backoff_ms = 5;
        let commands = TaskCommands::new(Arc::clone(api) as Arc<dyn TaskApi>);
        App::new(config, commands, Handle::current())
    }

    fn sample() -> Vec<Task> {
        let mut milk = task(1, "Buy milk");
        milk.is_today_task = true;
        let mut report = task(2, "Write report");
        report.status = TaskStatus::Completed;
        vec![milk, report, task(3, "Call bank")]
    }

    /// Let spawned work finish and feed its results back
    async fn settle(app: &mut App) {
        for _ in 0..20 {
            app.update();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        app.update();
    }

    #[tokio::test(start_paused = true)]
    async fn first_frames_load_both_tables() {
        let api = Arc::new(FakeTaskApi::with_tasks(sample()));
        let mut app = app_with(&api);
        settle(&mut app).await;

        assert_eq!(app.tasks.load, LoadState::Loaded);
        assert_eq!(app.tasks.rows.len(), 3);
        assert_eq!(app.today.rows.len(), 1);
        assert_eq!(app.today.rows[0].title, "Buy milk");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_load_keeps_rows_and_reports() {
        let api = Arc::new(FakeTaskApi::with_tasks(sample()));
        let mut app = app_with(&api);
        settle(&mut app).await;

        api.fail("list_tasks");
        app.reload();
        settle(&mut app).await;
        assert!(matches!(app.tasks.load, LoadState::Failed(_)));
        assert_eq!(app.tasks.rows.len(), 3);
        assert_eq!(app.status.level, NoticeLevel::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_today_reloads_after_server_confirms() {
        let api = Arc::new(FakeTaskApi::with_tasks(sample()));
        let mut app = app_with(&api);
        settle(&mut app).await;

        app.move_down();
        app.move_down();
        app.toggle_today();
        // nothing changes until the response arrives
        assert!(!app.tasks.rows[2].is_today_task);
        settle(&mut app).await;

        assert_eq!(app.status.message.as_deref(), Some("Added to today's tasks"));
        assert_eq!(app.today.rows.len(), 2);
        assert!(app.tasks.rows[2].is_today_task);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_needs_confirmation() {
        let api = Arc::new(FakeTaskApi::with_tasks(sample()));
        let mut app = app_with(&api);
        settle(&mut app).await;

        app.request_delete();
        assert_eq!(app.ui.mode, Mode::Confirm);
        app.confirm_cancel();
        assert_eq!(app.ui.mode, Mode::View);
        assert!(app.tasks.pending().is_none());
        settle(&mut app).await;
        assert_eq!(api.tasks().len(), 3);

        app.request_delete();
        app.confirm_accept();
        settle(&mut app).await;
        assert_eq!(api.tasks().len(), 2);
        assert_eq!(app.status.message.as_deref(), Some("Deleted 1 task(s)"));
    }

    #[tokio::test(start_paused = true)]
    async fn bulk_add_to_today_uses_the_selection() {
        let api = Arc::new(FakeTaskApi::with_tasks(sample()));
        let mut app = app_with(&api);
        settle(&mut app).await;

        app.request_bulk(BulkAction::AddToToday);
        assert_eq!(app.status.message.as_deref(), Some("Select tasks first"));
        assert_eq!(app.ui.mode, Mode::View);

        app.move_down();
        app.toggle_selection();
        app.move_down();
        app.toggle_selection();
        app.request_bulk(BulkAction::AddToToday);
        app.confirm_accept();
        settle(&mut app).await;

        assert_eq!(app.today.rows.len(), 3);
        assert_eq!(app.tasks.selection_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_bulk_keeps_the_selection() {
        let api = Arc::new(FakeTaskApi::with_tasks(sample()));
        let mut app = app_with(&api);
        settle(&mut app).await;

        api.fail("delete_tasks");
        app.toggle_selection();
        app.request_bulk(BulkAction::Delete);
        app.confirm_accept();
        settle(&mut app).await;

        assert_eq!(app.tasks.selection_len(), 1);
        assert_eq!(app.status.level, NoticeLevel::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn form_submit_creates_and_closes() {
        let api = Arc::new(FakeTaskApi::with_tasks(sample()));
        let mut app = app_with(&api);
        settle(&mut app).await;

        app.open_create_form();
        app.submit_form();
        let form = app.task_form.as_ref().unwrap();
        assert_eq!(form.error_for(TaskField::Title), Some("Title is required"));
        assert!(!form.submitting);

        if let Some(form) = app.task_form.as_mut() {
            form.title = Editor::from_string("Plan trip");
        }
        app.submit_form();
        settle(&mut app).await;

        assert!(app.task_form.is_none());
        assert_eq!(app.ui.mode, Mode::View);
        assert_eq!(app.status.message.as_deref(), Some("Task added"));
        assert_eq!(app.tasks.rows.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn form_stays_open_when_the_server_fails() {
        let api = Arc::new(FakeTaskApi::with_tasks(sample()));
        let mut app = app_with(&api);
        settle(&mut app).await;

        api.fail("update_task");
        app.open_edit_form();
        app.submit_form();
        settle(&mut app).await;

        let form = app.task_form.as_ref().unwrap();
        assert!(form.submit_error.as_deref().unwrap().contains("update_task failed"));
        assert_eq!(app.ui.mode, Mode::Edit);
    }

    #[tokio::test(start_paused = true)]
    async fn filters_reset_to_first_page() {
        let api = Arc::new(FakeTaskApi::with_tasks(sample()));
        let mut app = app_with(&api);
        settle(&mut app).await;

        app.open_filter();
        let mut form = app.filter_form.take().unwrap();
        form.title = Editor::from_string("milk");
        app.finish_filter(form.activate().unwrap());
        settle(&mut app).await;

        assert_eq!(app.ui.mode, Mode::View);
        assert_eq!(app.tasks.current, 1);
        assert_eq!(app.tasks.rows.len(), 1);
        assert_eq!(app.tasks.filters.title.as_deref(), Some("milk"));
    }

    #[tokio::test(start_paused = true)]
    async fn focus_timer_ticks_and_confirms_close() {
        let api = Arc::new(FakeTaskApi::with_tasks(sample()));
        let mut app = app_with(&api);
        settle(&mut app).await;

        app.open_focus();
        assert_eq!(app.ui.mode, Mode::Focus);
        app.toggle_focus();
        tokio::time::sleep(Duration::from_millis(3500)).await;
        app.update();
        let session = app.focus.as_ref().unwrap();
        assert_eq!(session.task_title, "Buy milk");
        assert_eq!(session.timer.remaining(), 1500 - 3);

        app.request_close_focus();
        assert_eq!(app.ui.mode, Mode::Confirm);
        app.confirm_cancel();
        assert_eq!(app.ui.mode, Mode::Focus);

        app.request_close_focus();
        app.confirm_accept();
        assert!(app.focus.is_none());
        assert_eq!(app.ui.mode, Mode::View);
    }

    #[tokio::test(start_paused = true)]
    async fn suggestion_retries_then_shows_the_text() {
        let api = Arc::new(FakeTaskApi::with_tasks(sample()));
        api.push_suggestion(Ok(SuggestionResponse {
            success: false,
            data: None,
            message: Some("busy".to_string()),
        }));
        let mut app = app_with(&api);
        settle(&mut app).await;

        app.switch_tab(Tab::Today);
        app.generate_suggestion();
        assert!(app.assistant.generating);
        settle(&mut app).await;

        assert!(!app.assistant.generating);
        assert_eq!(app.assistant.suggestion.as_deref(), Some("1. Priority analysis"));
        assert_eq!(api.calls().iter().filter(|c| *c == "suggest").count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn suggestion_needs_today_tasks() {
        let api = Arc::new(FakeTaskApi::with_tasks(vec![task(1, "Someday")]));
        let mut app = app_with(&api);
        settle(&mut app).await;

        app.switch_tab(Tab::Today);
        app.generate_suggestion();
        assert!(!app.assistant.generating);
        assert_eq!(
            app.status.message.as_deref(),
            Some("Add tasks to today before asking for a plan")
        );
        settle(&mut app).await;
        assert!(!api.calls().iter().any(|c| c == "suggest"));
    }

    #[tokio::test(start_paused = true)]
    async fn stats_load_when_the_tab_opens() {
        let api = Arc::new(FakeTaskApi::with_tasks(sample()));
        let mut app = app_with(&api);
        settle(&mut app).await;
        assert!(app.stats.data.is_none());

        app.switch_tab(Tab::Stats);
        settle(&mut app).await;
        let stats = app.stats.data.unwrap();
        assert_eq!((stats.completed, stats.uncompleted), (1, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn status_messages_expire() {
        let api = Arc::new(FakeTaskApi::new());
        let mut app = app_with(&api);
        app.set_status_message("hello");
        app.status.message_time = Instant::now().checked_sub(Duration::from_secs(4));
        app.check_status_message_timeout();
        assert!(app.status.message.is_none());
    }
}
