use std::fmt::Write as _;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, TaskApi};
use crate::config::AssistantConfig;
use crate::models::Task;

pub const DEFAULT_FAILURE_MESSAGE: &str = "Failed to generate suggestions, please try again later";

static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.").expect("valid heading pattern"));

#[derive(Debug, Error)]
pub enum SuggestionError {
    /// The service answered but reported failure on every attempt
    #[error("{message}")]
    Reported { message: String, attempts: u32 },

    #[error("AI service unavailable: {0}")]
    Transport(#[from] ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_secs(1),
        }
    }
}

impl From<&AssistantConfig> for RetryPolicy {
    fn from(config: &AssistantConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

/// Planning prompt for the given tasks
pub fn build_prompt(tasks: &[Task]) -> String {
    let (completed, open): (Vec<&Task>, Vec<&Task>) = tasks.iter().partition(|t| t.is_completed());

    let mut prompt = String::from(
        "As a professional task management assistant, please analyse and plan the following tasks for me:\n\n",
    );

    prompt.push_str("Tasks to do:\n");
    if open.is_empty() {
        prompt.push_str("- (none)\n");
    }
    for task in &open {
        match task.due_date {
            Some(due) => {
                let _ = writeln!(prompt, "- {} (due: {})", task.title, due.format("%Y-%m-%d"));
            }
            None => {
                let _ = writeln!(prompt, "- {}", task.title);
            }
        }
    }

    if !completed.is_empty() {
        prompt.push_str("\nCompleted tasks:\n");
        for task in &completed {
            let _ = writeln!(prompt, "- {}", task.title);
        }
    }

    prompt.push_str(
        "\nPlease give advice on the following aspects:\n\n\
         1. Priority analysis\n\
         - Urgency based on due dates\n\
         - Importance of each task\n\
         - Key tasks and their dependencies\n\n\
         2. Time planning\n\
         - A sensible order of execution\n\
         - Estimated time for each task\n\
         - How to divide the available time\n\n\
         3. Execution strategy\n\
         - Concrete steps using the pomodoro technique\n\
         - Reasonable breaks\n\
         - Risks and points of attention\n\n\
         4. Efficiency tips\n\
         - Breaking tasks down and setting milestones\n\
         - Staying focused\n\
         - Tracking progress\n\n\
         Please keep the advice concrete and actionable so I can finish these tasks efficiently.",
    );
    prompt
}

/// Ask for a suggestion, retrying reported failures with a fixed backoff.
/// Transport errors are returned at once. `on_retry` receives the attempt
/// number that just failed.
pub async fn request_suggestion<F>(
    api: &dyn TaskApi,
    prompt: &str,
    policy: RetryPolicy,
    mut on_retry: F,
) -> Result<String, SuggestionError>
where
    F: FnMut(u32) + Send,
{
    let mut attempt = 1;
    loop {
        let response = api.suggest(prompt).await?;
        if response.success {
            info!(attempt, "suggestion received");
            return Ok(response.data.unwrap_or_default());
        }

        if attempt > policy.max_retries {
            let message = response
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
            warn!(attempts = attempt, %message, "suggestion failed");
            return Err(SuggestionError::Reported {
                message,
                attempts: attempt,
            });
        }

        warn!(attempt, "suggestion reported failure, retrying");
        on_retry(attempt);
        tokio::time::sleep(policy.backoff).await;
        attempt += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionLine {
    Heading(String),
    SubItem(String),
    Paragraph(String),
    Blank,
}

/// Classify each line of a suggestion for display
pub fn format_suggestion(text: &str) -> Vec<SuggestionLine> {
    // markers only count at the start of the line; indented ones are prose
    text.lines()
        .map(|line| {
            let line = line.trim_end();
            if line.trim_start().is_empty() {
                SuggestionLine::Blank
            } else if HEADING.is_match(line) {
                SuggestionLine::Heading(line.to_string())
            } else if line.starts_with('-') {
                SuggestionLine::SubItem(line.to_string())
            } else {
                SuggestionLine::Paragraph(line.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{FakeTaskApi, task};
    use crate::models::{SuggestionResponse, TaskStatus};
    use crate::utils::start_of_day;
    use chrono::NaiveDate;

    fn reported(message: Option<&str>) -> Result<SuggestionResponse, ApiError> {
        Ok(SuggestionResponse {
            success: false,
            data: None,
            message: message.map(str::to_string),
        })
    }

    #[test]
    fn prompt_lists_open_and_completed_tasks() {
        let mut milk = task(1, "Buy milk");
        milk.due_date = NaiveDate::from_ymd_opt(2025, 4, 1).map(start_of_day);
        let mut report = task(2, "Write report");
        report.status = TaskStatus::Completed;

        let prompt = build_prompt(&[milk, report]);
        let open_at = prompt.find("- Buy milk (due: 2025-04-01)").unwrap();
        let completed_at = prompt.find("Completed tasks:").unwrap();
        let report_at = prompt.find("- Write report").unwrap();
        assert!(open_at < completed_at && completed_at < report_at);
        for header in ["1. Priority analysis", "2. Time planning", "3. Execution strategy", "4. Efficiency tips"] {
            assert!(prompt.contains(header), "missing {header}");
        }
    }

    #[test]
    fn prompt_omits_empty_completed_section() {
        let prompt = build_prompt(&[task(1, "Buy milk")]);
        assert!(prompt.contains("- Buy milk\n"));
        assert!(!prompt.contains("Completed tasks:"));
    }

    #[tokio::test(start_paused = true)]
    async fn reported_failure_is_retried_twice() {
        let api = FakeTaskApi::new();
        for _ in 0..3 {
            api.push_suggestion(reported(Some("model busy")));
        }
        let mut retries = Vec::new();
        let err = request_suggestion(&api, "p", RetryPolicy::default(), |n| retries.push(n))
            .await
            .unwrap_err();

        assert_eq!(api.calls().len(), 3);
        assert_eq!(retries, vec![1, 2]);
        match err {
            SuggestionError::Reported { message, attempts } => {
                assert_eq!(message, "model busy");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retry_can_recover() {
        let api = FakeTaskApi::new();
        api.push_suggestion(reported(None));
        api.push_suggestion(Ok(SuggestionResponse {
            success: true,
            data: Some("1. Do it".to_string()),
            message: None,
        }));
        let text = request_suggestion(&api, "p", RetryPolicy::default(), |_| {}).await.unwrap();
        assert_eq!(text, "1. Do it");
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_fall_back_to_default_message() {
        let api = FakeTaskApi::new();
        for _ in 0..3 {
            api.push_suggestion(reported(Some("")));
        }
        let err = request_suggestion(&api, "p", RetryPolicy::default(), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), DEFAULT_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn transport_error_is_not_retried() {
        let api = FakeTaskApi::new();
        api.push_suggestion(Err(ApiError::Transport {
            path: "ai/suggest".to_string(),
            message: "connection refused".to_string(),
        }));
        let err = request_suggestion(&api, "p", RetryPolicy::default(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, SuggestionError::Transport(_)));
        assert_eq!(api.calls().len(), 1);
    }

    #[test]
    fn suggestion_lines_are_classified() {
        let lines = format_suggestion("1. Priority analysis\n- finish the report\n\nStart early.");
        assert_eq!(
            lines,
            vec![
                SuggestionLine::Heading("1. Priority analysis".to_string()),
                SuggestionLine::SubItem("- finish the report".to_string()),
                SuggestionLine::Blank,
                SuggestionLine::Paragraph("Start early.".to_string()),
            ]
        );
    }

    #[test]
    fn indented_markers_stay_paragraphs() {
        let lines = format_suggestion("   - x\n  1. y\n-z\n2.w");
        assert_eq!(
            lines,
            vec![
                SuggestionLine::Paragraph("   - x".to_string()),
                SuggestionLine::Paragraph("  1. y".to_string()),
                SuggestionLine::SubItem("-z".to_string()),
                SuggestionLine::Heading("2.w".to_string()),
            ]
        );
    }
}
