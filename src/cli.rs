use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::assistant::{self, RetryPolicy, SuggestionError};
use crate::commands::{CommandError, TaskCommands};
use crate::models::{Category, Sort, SortField, SortOrder, Task, TaskDto, TaskFilters, TaskId, TaskQuery, TaskStatus};
use crate::table::ListScope;
use crate::utils::{format_date, format_timestamp, now, parse_date};

#[derive(Parser)]
#[command(name = "taskfocus")]
#[command(about = "Task lists, today focus, pomodoro timer and AI planning for a task service")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use development mode (separate config and log directory)
    #[arg(long)]
    pub dev: bool,

    /// Task service base URL, overrides config and TASKFOCUS_SERVER_URL
    #[arg(long)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Add a new task
    Add {
        /// Task title
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Work, Study, Life or Other
        #[arg(long, value_parser = parse_category, default_value = "Study")]
        category: Category,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Put the task on today's list
        #[arg(long)]
        today: bool,
    },
    /// List tasks
    List {
        /// Only today's tasks
        #[arg(long)]
        today: bool,
        /// Title substring
        #[arg(long)]
        title: Option<String>,
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        /// Due on or after (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Due on or before (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Show one task in full
    Show { id: TaskId },
    /// Toggle a task between completed and not completed
    Done { id: TaskId },
    /// Add tasks to today's list, or remove them with --remove
    Today {
        #[arg(required = true)]
        ids: Vec<TaskId>,
        #[arg(long)]
        remove: bool,
    },
    /// Delete tasks by id
    Delete {
        #[arg(required = true)]
        ids: Vec<TaskId>,
    },
    /// Delete every completed task
    PurgeCompleted,
    /// Completed vs. uncompleted counts
    Stats,
    /// Ask the assistant to plan today's tasks
    Suggest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Done,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Due,
    Created,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Suggestion(#[from] SuggestionError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

fn parse_category(value: &str) -> Result<Category, String> {
    Category::parse(value).ok_or_else(|| format!("unknown category '{}' (expected Work, Study, Life or Other)", value))
}

fn parse_optional_date(value: Option<String>) -> Result<Option<chrono::NaiveDate>, CliError> {
    value
        .map(|text| {
            parse_date(&text).map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", text, e)))
        })
        .transpose()
}

/// Handle the add command
pub async fn handle_add(
    commands: &TaskCommands,
    title: String,
    description: Option<String>,
    category: Category,
    due: Option<String>,
    today: bool,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let dto = TaskDto {
        title: Some(title),
        description,
        category: Some(category),
        status: Some(TaskStatus::NotCompleted),
        due_date: parse_optional_date(due)?.map(Some),
        is_today_task: Some(today),
        ..TaskDto::default()
    };
    let outcome = commands.create(dto).await?;
    writeln!(out, "{} (ID: {})", outcome.message, outcome.value)?;
    Ok(())
}

/// Filters, sort and paging of the list command
pub struct ListArgs {
    pub today: bool,
    pub filters: TaskFilters,
    pub sort: Option<Sort>,
    pub page: u32,
    pub page_size: u32,
}

impl ListArgs {
    #[allow(clippy::too_many_arguments)]
    pub fn from_flags(
        today: bool,
        title: Option<String>,
        category: Option<Category>,
        status: Option<StatusArg>,
        from: Option<String>,
        to: Option<String>,
        sort: Option<SortArg>,
        desc: bool,
        page: u32,
        page_size: u32,
    ) -> Result<Self, CliError> {
        let filters = TaskFilters {
            title: title.filter(|t| !t.trim().is_empty()),
            category,
            status: status.map(|s| match s {
                StatusArg::Done => TaskStatus::Completed,
                StatusArg::Open => TaskStatus::NotCompleted,
            }),
            due_from: parse_optional_date(from)?,
            due_to: parse_optional_date(to)?,
        };
        let sort = sort.map(|field| Sort {
            field: match field {
                SortArg::Due => SortField::DueDate,
                SortArg::Created => SortField::CreatedAt,
            },
            order: if desc { SortOrder::Desc } else { SortOrder::Asc },
        });
        Ok(Self {
            today,
            filters,
            sort,
            page,
            page_size,
        })
    }

    fn query(&self) -> TaskQuery {
        let query = TaskQuery::page(self.page, self.page_size);
        if self.today {
            return query;
        }
        TaskQuery {
            order_by: crate::api::order_by(self.sort.as_ref()),
            ..query.with_filters(&self.filters)
        }
    }
}

/// Handle the list command
pub async fn handle_list(commands: &TaskCommands, args: ListArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let scope = if args.today { ListScope::Today } else { ListScope::All };
    let page = commands.load_page(scope, &args.query()).await?;

    if page.list.is_empty() {
        writeln!(out, "No tasks found")?;
        return Ok(());
    }

    let current_time = now();
    writeln!(out, "{:>6}  {:<32} {:<6} {:<14} {:<10} {}", "ID", "TITLE", "CAT", "STATUS", "DUE", "TODAY")?;
    for task in &page.list {
        writeln!(out, "{}", format_row(task, current_time))?;
    }
    let pages = page.total.div_ceil(page.page_size.max(1) as u64).max(1);
    writeln!(out, "page {} of {} ({} task(s))", page.current, pages, page.total)?;
    Ok(())
}

fn format_row(task: &Task, now: chrono::NaiveDateTime) -> String {
    let mut title: String = task.title.chars().take(32).collect();
    if task.is_overdue(now) {
        title = format!("{} !", title.chars().take(30).collect::<String>());
    }
    format!(
        "{:>6}  {:<32} {:<6} {:<14} {:<10} {}",
        task.id.map(|id| id.to_string()).unwrap_or_default(),
        title,
        task.category.map(|c| c.label()).unwrap_or("-"),
        task.status.label(),
        format_date(task.due_day()),
        if task.is_today_task { "yes" } else { "" },
    )
}

/// Handle the show command
pub async fn handle_show(commands: &TaskCommands, id: TaskId, out: &mut dyn Write) -> Result<(), CliError> {
    let task = commands.get(id).await?;
    writeln!(out, "ID:          {}", id)?;
    writeln!(out, "Title:       {}", task.title)?;
    writeln!(out, "Description: {}", task.description.as_deref().unwrap_or(""))?;
    writeln!(out, "Category:    {}", task.category.map(|c| c.label()).unwrap_or("-"))?;
    writeln!(out, "Status:      {}", task.status.label())?;
    writeln!(out, "Due:         {}", format_date(task.due_day()))?;
    writeln!(out, "Today:       {}", if task.is_today_task { "yes" } else { "no" })?;
    writeln!(out, "Created:     {}", format_timestamp(task.created_at))?;
    writeln!(out, "Updated:     {}", format_timestamp(task.updated_at))?;
    if task.is_overdue(now()) {
        writeln!(out, "This task is overdue")?;
    }
    Ok(())
}

/// Handle the done command
pub async fn handle_done(commands: &TaskCommands, id: TaskId, out: &mut dyn Write) -> Result<(), CliError> {
    let task = commands.get(id).await?;
    let outcome = commands.toggle_status(&task).await?;
    writeln!(out, "{}", outcome.message)?;
    Ok(())
}

/// Handle the today command
pub async fn handle_today(
    commands: &TaskCommands,
    ids: &[TaskId],
    remove: bool,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let outcome = commands.set_today_batch(ids, !remove).await?;
    writeln!(out, "{}", outcome.message)?;
    Ok(())
}

/// Handle the delete command
pub async fn handle_delete(commands: &TaskCommands, ids: &[TaskId], out: &mut dyn Write) -> Result<(), CliError> {
    let outcome = commands.bulk_delete(ids).await?;
    writeln!(out, "{}", outcome.message)?;
    Ok(())
}

/// Handle the purge-completed command
pub async fn handle_purge_completed(commands: &TaskCommands, out: &mut dyn Write) -> Result<(), CliError> {
    let outcome = commands.delete_completed().await?;
    writeln!(out, "{}", outcome.message)?;
    Ok(())
}

/// Handle the stats command
pub async fn handle_stats(commands: &TaskCommands, out: &mut dyn Write) -> Result<(), CliError> {
    let stats = commands.completion_stats().await?;
    for slice in stats.slices() {
        writeln!(out, "{:<12} {:>5}  {:>5.1}%", slice.label, slice.value, slice.percent)?;
    }
    writeln!(out, "{:<12} {:>5}", "Total", stats.total())?;
    Ok(())
}

/// Largest page requested when planning today's tasks
const SUGGEST_PAGE_SIZE: u32 = 100;

/// Handle the suggest command
pub async fn handle_suggest(commands: &TaskCommands, policy: RetryPolicy, out: &mut dyn Write) -> Result<(), CliError> {
    let page = commands
        .load_page(ListScope::Today, &TaskQuery::page(1, SUGGEST_PAGE_SIZE))
        .await?;
    if page.list.is_empty() {
        writeln!(out, "No tasks planned for today; add some before asking for a plan")?;
        return Ok(());
    }
    let prompt = assistant::build_prompt(&page.list);
    let api = commands.api();
    let text = assistant::request_suggestion(api.as_ref(), &prompt, policy, |attempt| {
        eprintln!("Suggestion attempt {} failed, retrying...", attempt);
    })
    .await?;
    writeln!(out, "{}", text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TaskApi;
    use crate::api::testing::{FakeTaskApi, task};
    use std::sync::Arc;

    fn setup(tasks: Vec<Task>) -> (Arc<FakeTaskApi>, TaskCommands) {
        let api = Arc::new(FakeTaskApi::with_tasks(tasks));
        let commands = TaskCommands::new(Arc::clone(&api) as Arc<dyn TaskApi>);
        (api, commands)
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn cli_parses_list_flags() {
        let cli = Cli::try_parse_from([
            "taskfocus", "--server", "http://h:1", "list", "--category", "work", "--status", "open", "--sort", "due",
            "--desc",
        ])
        .unwrap();
        assert_eq!(cli.server.as_deref(), Some("http://h:1"));
        match cli.command {
            Some(Commands::List {
                category, status, sort, desc, ..
            }) => {
                assert_eq!(category, Some(Category::Work));
                assert_eq!(status, Some(StatusArg::Open));
                assert_eq!(sort, Some(SortArg::Due));
                assert!(desc);
            }
            _ => panic!("expected list command"),
        }
    }

    #[test]
    fn cli_rejects_unknown_category() {
        assert!(Cli::try_parse_from(["taskfocus", "add", "x", "--category", "hobby"]).is_err());
    }

    #[test]
    fn list_args_build_query() {
        let args = ListArgs::from_flags(
            false,
            Some("milk".to_string()),
            None,
            Some(StatusArg::Done),
            Some("2025-01-01".to_string()),
            None,
            Some(SortArg::Created),
            true,
            2,
            5,
        )
        .unwrap();
        let query = args.query();
        assert_eq!(query.task_name.as_deref(), Some("milk"));
        assert_eq!(query.status, Some(TaskStatus::Completed));
        assert_eq!(query.order_by.as_deref(), Some("created_at DESC"));
        assert_eq!((query.current, query.page_size), (2, 5));

        let bad = ListArgs::from_flags(false, None, None, None, Some("tomorrow".to_string()), None, None, false, 1, 5);
        assert!(matches!(bad, Err(CliError::DateParseError(_))));
    }

    #[tokio::test]
    async fn add_then_list() {
        let (_api, commands) = setup(vec![]);
        let mut out = Vec::new();
        handle_add(&commands, "Buy milk".to_string(), None, Category::Life, Some("2030-01-02".to_string()), false, &mut out)
            .await
            .unwrap();
        assert_eq!(output(out), "Task added (ID: 1)\n");

        let mut out = Vec::new();
        let args = ListArgs::from_flags(false, None, None, None, None, None, None, false, 1, 10).unwrap();
        handle_list(&commands, args, &mut out).await.unwrap();
        let text = output(out);
        assert!(text.contains("Buy milk"));
        assert!(text.contains("2030-01-02"));
        assert!(text.contains("page 1 of 1 (1 task(s))"));
    }

    #[tokio::test]
    async fn done_toggles_and_stats_count() {
        let (api, commands) = setup(vec![task(1, "a"), task(2, "b")]);
        let mut out = Vec::new();
        handle_done(&commands, 1, &mut out).await.unwrap();
        assert!(api.tasks()[0].is_completed());

        let mut out = Vec::new();
        handle_stats(&commands, &mut out).await.unwrap();
        let text = output(out);
        assert!(text.contains("Completed        1   50.0%"));
        assert!(text.contains("Total            2"));
    }

    #[tokio::test]
    async fn today_and_purge() {
        let mut done = task(2, "b");
        done.status = TaskStatus::Completed;
        let (api, commands) = setup(vec![task(1, "a"), done]);

        let mut out = Vec::new();
        handle_today(&commands, &[1], false, &mut out).await.unwrap();
        assert_eq!(output(out), "Added to today's tasks\n");
        assert!(api.tasks()[0].is_today_task);

        let mut out = Vec::new();
        handle_purge_completed(&commands, &mut out).await.unwrap();
        assert_eq!(output(out), "Deleted 1 completed task(s)\n");
        assert_eq!(api.tasks().len(), 1);
    }

    #[tokio::test]
    async fn show_reports_missing_task() {
        let (_api, commands) = setup(vec![]);
        let mut out = Vec::new();
        assert!(handle_show(&commands, 42, &mut out).await.is_err());
    }

    #[tokio::test]
    async fn suggest_skips_the_assistant_without_today_tasks() {
        let (api, commands) = setup(vec![task(1, "a")]);
        let mut out = Vec::new();
        handle_suggest(&commands, RetryPolicy::default(), &mut out).await.unwrap();
        assert!(output(out).starts_with("No tasks planned for today"));
        assert!(!api.calls().iter().any(|c| c == "suggest"));
    }
}
