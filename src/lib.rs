pub mod api;
pub mod assistant;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod models;
pub mod stats;
pub mod table;
pub mod timer;
pub mod tui;
pub mod utils;

pub use config::Config;
pub use models::{Task, TaskDto};
pub use utils::Profile;
