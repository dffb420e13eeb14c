use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::api::ReadPolicy;
use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Environment variable overriding `server_url`
pub const SERVER_URL_ENV: &str = "TASKFOCUS_SERVER_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub read_policy: ReadPolicy,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default = "default_current_theme")]
    pub current_theme: String,
    #[serde(default)]
    pub themes: HashMap<String, Theme>,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

/// Focus timer phase lengths in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_secs")]
    pub work_secs: u32,
    #[serde(default = "default_short_break_secs")]
    pub short_break_secs: u32,
    #[serde(default = "default_long_break_secs")]
    pub long_break_secs: u32,
}

/// Retry behaviour of the suggestion request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_help")]
    pub help: String,
    #[serde(default = "default_new")]
    pub new: String,
    #[serde(default = "default_edit")]
    pub edit: String,
    #[serde(default = "default_save")]
    pub save: String,
    #[serde(default = "default_delete")]
    pub delete: String,
    #[serde(default = "default_toggle_task_status")]
    pub toggle_task_status: String,
    #[serde(default = "default_select")]
    pub select: String,
    #[serde(default = "default_clear_selection")]
    pub clear_selection: String,
    #[serde(default = "default_toggle_today")]
    pub toggle_today: String,
    #[serde(default = "default_add_to_today")]
    pub add_to_today: String,
    #[serde(default = "default_remove_from_today")]
    pub remove_from_today: String,
    #[serde(default = "default_delete_completed")]
    pub delete_completed: String,
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default = "default_sort_due")]
    pub sort_due: String,
    #[serde(default = "default_sort_created")]
    pub sort_created: String,
    #[serde(default = "default_next_page")]
    pub next_page: String,
    #[serde(default = "default_prev_page")]
    pub prev_page: String,
    #[serde(default = "default_focus_timer")]
    pub focus_timer: String,
    #[serde(default = "default_timer_reset")]
    pub timer_reset: String,
    #[serde(default = "default_generate_suggestion")]
    pub generate_suggestion: String,
    #[serde(default = "default_copy_suggestion")]
    pub copy_suggestion: String,
    #[serde(default = "default_reload")]
    pub reload: String,
    #[serde(default = "default_cycle_theme")]
    pub cycle_theme: String,
    #[serde(default = "default_list_up")]
    pub list_up: String,
    #[serde(default = "default_list_down")]
    pub list_down: String,
    #[serde(default = "default_tab_left")]
    pub tab_left: String,
    #[serde(default = "default_tab_right")]
    pub tab_right: String,
    #[serde(default = "default_tab_1")]
    pub tab_1: String,
    #[serde(default = "default_tab_2")]
    pub tab_2: String,
    #[serde(default = "default_tab_3")]
    pub tab_3: String,
    #[serde(default = "default_word_left")]
    pub word_left: String,
    #[serde(default = "default_word_right")]
    pub word_right: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_fg")]
    pub fg: String,
    #[serde(default = "default_bg")]
    pub bg: String,
    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,
    #[serde(default = "default_highlight_fg")]
    pub highlight_fg: String,
    #[serde(default = "default_tab_bg")]
    pub tab_bg: String,
    /// Headings, completed counts and the timer gauge
    #[serde(default = "default_accent")]
    pub accent: String,
    /// Overdue rows and error notices
    #[serde(default = "default_warning")]
    pub warning: String,
}

impl Default for Config {
    fn default() -> Self {
        let mut themes = HashMap::new();

        // Example custom theme showing how to define one
        themes.insert(
            "lightblue".to_string(),
            Theme {
                fg: "cyan".to_string(),
                bg: "black".to_string(),
                highlight_bg: "blue".to_string(),
                highlight_fg: "white".to_string(),
                tab_bg: "gray".to_string(),
                accent: "lightcyan".to_string(),
                warning: "lightred".to_string(),
            },
        );

        Self {
            server_url: default_server_url(),
            request_timeout_secs: default_request_timeout_secs(),
            read_policy: ReadPolicy::default(),
            page_size: default_page_size(),
            log_level: default_log_level(),
            timer: TimerConfig::default(),
            assistant: AssistantConfig::default(),
            key_bindings: KeyBindings::default(),
            current_theme: default_current_theme(),
            themes,
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_secs: default_work_secs(),
            short_break_secs: default_short_break_secs(),
            long_break_secs: default_long_break_secs(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            help: default_help(),
            new: default_new(),
            edit: default_edit(),
            save: default_save(),
            delete: default_delete(),
            toggle_task_status: default_toggle_task_status(),
            select: default_select(),
            clear_selection: default_clear_selection(),
            toggle_today: default_toggle_today(),
            add_to_today: default_add_to_today(),
            remove_from_today: default_remove_from_today(),
            delete_completed: default_delete_completed(),
            filter: default_filter(),
            sort_due: default_sort_due(),
            sort_created: default_sort_created(),
            next_page: default_next_page(),
            prev_page: default_prev_page(),
            focus_timer: default_focus_timer(),
            timer_reset: default_timer_reset(),
            generate_suggestion: default_generate_suggestion(),
            copy_suggestion: default_copy_suggestion(),
            reload: default_reload(),
            cycle_theme: default_cycle_theme(),
            list_up: default_list_up(),
            list_down: default_list_down(),
            tab_left: default_tab_left(),
            tab_right: default_tab_right(),
            tab_1: default_tab_1(),
            tab_2: default_tab_2(),
            tab_3: default_tab_3(),
            word_left: default_word_left(),
            word_right: default_word_right(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: default_fg(),
            bg: default_bg(),
            highlight_bg: default_highlight_bg(),
            highlight_fg: default_highlight_fg(),
            tab_bg: default_tab_bg(),
            accent: default_accent(),
            warning: default_warning(),
        }
    }
}

impl Theme {
    fn preset(fg: &str, bg: &str, highlight_bg: &str, highlight_fg: &str, accent: &str) -> Self {
        Self {
            fg: fg.to_string(),
            bg: bg.to_string(),
            highlight_bg: highlight_bg.to_string(),
            highlight_fg: highlight_fg.to_string(),
            tab_bg: default_tab_bg(),
            accent: accent.to_string(),
            warning: default_warning(),
        }
    }

    /// Preset themes that are always available
    pub fn get_preset_themes() -> HashMap<String, Theme> {
        let mut themes = HashMap::new();
        themes.insert("default".to_string(), Theme::default());
        themes.insert("dark".to_string(), Theme::preset("white", "black", "cyan", "black", "cyan"));
        themes.insert("light".to_string(), Theme::preset("black", "white", "blue", "white", "blue"));
        themes.insert("green".to_string(), Theme::preset("green", "black", "yellow", "black", "lightgreen"));
        themes.insert(
            "monochrome".to_string(),
            Theme::preset("white", "black", "white", "black", "white"),
        );
        themes
    }
}

// Default value functions
fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_page_size() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_work_secs() -> u32 {
    25 * 60
}

fn default_short_break_secs() -> u32 {
    5 * 60
}

fn default_long_break_secs() -> u32 {
    15 * 60
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_help() -> String {
    "F1".to_string()
}

fn default_new() -> String {
    "n".to_string()
}

fn default_edit() -> String {
    "e".to_string()
}

fn default_save() -> String {
    "Ctrl+s".to_string()
}

fn default_delete() -> String {
    "d".to_string()
}

fn default_toggle_task_status() -> String {
    "Space".to_string()
}

fn default_select() -> String {
    "v".to_string()
}

fn default_clear_selection() -> String {
    "u".to_string()
}

fn default_toggle_today() -> String {
    "t".to_string()
}

fn default_add_to_today() -> String {
    "a".to_string()
}

fn default_remove_from_today() -> String {
    "r".to_string()
}

fn default_delete_completed() -> String {
    "D".to_string()
}

fn default_filter() -> String {
    "f".to_string()
}

fn default_sort_due() -> String {
    "s".to_string()
}

fn default_sort_created() -> String {
    "c".to_string()
}

fn default_next_page() -> String {
    "]".to_string()
}

fn default_prev_page() -> String {
    "[".to_string()
}

fn default_focus_timer() -> String {
    "p".to_string()
}

fn default_timer_reset() -> String {
    "r".to_string()
}

fn default_generate_suggestion() -> String {
    "g".to_string()
}

fn default_copy_suggestion() -> String {
    "y".to_string()
}

fn default_reload() -> String {
    "F5".to_string()
}

fn default_cycle_theme() -> String {
    "F2".to_string()
}

fn default_list_up() -> String {
    "k".to_string()
}

fn default_list_down() -> String {
    "j".to_string()
}

fn default_tab_left() -> String {
    "Left".to_string()
}

fn default_tab_right() -> String {
    "Right".to_string()
}

fn default_tab_1() -> String {
    "1".to_string()
}

fn default_tab_2() -> String {
    "2".to_string()
}

fn default_tab_3() -> String {
    "3".to_string()
}

fn default_word_left() -> String {
    "Ctrl+Left".to_string()
}

fn default_word_right() -> String {
    "Ctrl+Right".to_string()
}

fn default_current_theme() -> String {
    "default".to_string()
}

fn default_fg() -> String {
    "white".to_string()
}

fn default_bg() -> String {
    "black".to_string()
}

fn default_highlight_bg() -> String {
    "blue".to_string()
}

fn default_highlight_fg() -> String {
    "white".to_string()
}

fn default_tab_bg() -> String {
    "gray".to_string()
}

fn default_accent() -> String {
    "green".to_string()
}

fn default_warning() -> String {
    "red".to_string()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("Theme not found: {0}")]
    ThemeNotFound(String),
}

impl Config {
    /// Load configuration for a profile, or from `path_override` when given.
    /// A missing file is created with defaults.
    pub fn load(profile: utils::Profile, path_override: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = Self::resolve_path(profile, path_override)?;

        let config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            let mut config = Config::default();
            config.save_to(&config_path)?;
            config
        };
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file without creating it
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Apply `TASKFOCUS_SERVER_URL` and then the CLI `--server` flag, which wins
    pub fn apply_overrides(&mut self, env_server: Option<String>, cli_server: Option<String>) {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty(cli_server).or_else(|| non_empty(env_server)) {
            self.server_url = url.trim().to_string();
        }
    }

    /// Reject values the client cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &'static str, reason: &str| ConfigError::Invalid {
            key,
            reason: reason.to_string(),
        };
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(invalid("server_url", "must start with http:// or https://"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "must be positive"));
        }
        if self.page_size == 0 {
            return Err(invalid("page_size", "must be positive"));
        }
        if self.timer.work_secs == 0 || self.timer.short_break_secs == 0 || self.timer.long_break_secs == 0 {
            return Err(invalid("timer", "durations must be positive"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn save_to(&mut self, path: &Path) -> Result<(), ConfigError> {
        // Ensure config version is set before saving
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// The file `load` reads and theme changes are saved to
    pub fn resolve_path(profile: utils::Profile, path_override: Option<&Path>) -> Result<PathBuf, ConfigError> {
        match path_override {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::get_config_path(profile),
        }
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| ConfigError::ConfigDirError("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("config.toml"))
    }

    /// The active theme: user-defined first, then presets, then the default
    pub fn get_active_theme(&self) -> Theme {
        self.themes
            .get(&self.current_theme)
            .cloned()
            .or_else(|| Theme::get_preset_themes().remove(&self.current_theme))
            .unwrap_or_default()
    }

    /// Set the active theme by name
    pub fn set_theme(&mut self, name: &str) -> Result<(), ConfigError> {
        if !self.themes.contains_key(name) && !Theme::get_preset_themes().contains_key(name) {
            return Err(ConfigError::ThemeNotFound(name.to_string()));
        }
        self.current_theme = name.to_string();
        Ok(())
    }

    /// All theme names (presets + user-defined), sorted
    pub fn get_available_themes(&self) -> Vec<String> {
        let mut themes: Vec<String> = Theme::get_preset_themes().into_keys().collect();
        for name in self.themes.keys() {
            if !themes.contains(name) {
                themes.push(name.clone());
            }
        }
        themes.sort();
        themes
    }

    /// Switch to the theme after the current one in sorted order
    pub fn next_theme(&mut self) -> String {
        let themes = self.get_available_themes();
        let index = themes.iter().position(|t| *t == self.current_theme);
        let next = match index {
            Some(i) => themes[(i + 1) % themes.len()].clone(),
            None => default_current_theme(),
        };
        self.current_theme = next.clone();
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server_url, "http://localhost:8080");
        assert_eq!(config.request_timeout_secs, 20);
        assert_eq!(config.read_policy, ReadPolicy::BestEffort);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.timer, TimerConfig::default());
        assert_eq!(config.timer.work_secs, 1500);
        assert_eq!(config.assistant.max_retries, 2);
        assert_eq!(config.key_bindings.quit, "q");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            read_policy = "strict"
            [timer]
            work_secs = 60
            [key_bindings]
            quit = "x"
            "#,
        )
        .unwrap();
        assert_eq!(config.read_policy, ReadPolicy::Strict);
        assert_eq!(config.timer.work_secs, 60);
        assert_eq!(config.timer.short_break_secs, 300);
        assert_eq!(config.key_bindings.quit, "x");
        assert_eq!(config.key_bindings.help, "F1");
    }

    #[test]
    fn cli_server_wins_over_env() {
        let mut config = Config::default();
        config.apply_overrides(Some("http://env:1".to_string()), None);
        assert_eq!(config.server_url, "http://env:1");
        config.apply_overrides(Some("http://env:1".to_string()), Some("http://cli:2".to_string()));
        assert_eq!(config.server_url, "http://cli:2");
        config.apply_overrides(Some("  ".to_string()), None);
        assert_eq!(config.server_url, "http://cli:2");
    }

    #[test]
    fn validation_rejects_zero_values() {
        let mut config = Config::default();
        config.page_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { key: "page_size", .. })));

        let mut config = Config::default();
        config.timer.long_break_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server_url = "localhost".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load(utils::Profile::Dev, Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(config.config_version, Some(CURRENT_CONFIG_VERSION));

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.server_url, config.server_url);
        assert!(reloaded.themes.contains_key("lightblue"));
    }

    #[test]
    fn themes_resolve_and_cycle() {
        let mut config = Config::default();
        assert_eq!(config.get_active_theme(), Theme::default());
        assert!(config.set_theme("nope").is_err());
        config.set_theme("lightblue").unwrap();
        assert_eq!(config.get_active_theme().fg, "cyan");

        let available = config.get_available_themes();
        assert!(available.contains(&"dark".to_string()));
        let next = config.next_theme();
        assert_eq!(config.current_theme, next);
        assert_ne!(next, "lightblue");
    }
}
