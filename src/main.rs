use std::io;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use taskfocus::api::{HttpTaskApi, TaskApi};
use taskfocus::assistant::RetryPolicy;
use taskfocus::cli::{self, Cli, Commands, ListArgs};
use taskfocus::commands::TaskCommands;
use taskfocus::config::SERVER_URL_ENV;
use taskfocus::{Config, Profile, logging, utils};
use tracing::info;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config_path = Config::resolve_path(profile, cli.config.as_deref())?;
    let mut config = Config::load(profile, cli.config.as_deref())?;
    config.apply_overrides(std::env::var(SERVER_URL_ENV).ok(), cli.server.clone());
    config.validate()?;

    let log_dir = utils::get_data_dir(profile).ok_or_else(|| eyre!("Could not determine data directory"))?;
    let _log_guard = logging::init(&log_dir, &config.log_level)?;
    info!(?profile, server_url = %config.server_url, "starting");

    // one worker is plenty: the UI thread only hands requests over
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;

    let api: Arc<dyn TaskApi> = Arc::new(HttpTaskApi::new(
        &config.server_url,
        config.request_timeout(),
        config.read_policy,
    )?);
    let commands = TaskCommands::new(api);

    let mut out = io::stdout();
    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let _enter = runtime.enter();
            let app = taskfocus::tui::App::new(config, commands, runtime.handle().clone()).with_config_path(config_path);
            taskfocus::tui::run_event_loop(app)?;
        }
        Commands::Add {
            title,
            description,
            category,
            due,
            today,
        } => {
            runtime.block_on(cli::handle_add(&commands, title, description, category, due, today, &mut out))?;
        }
        Commands::List {
            today,
            title,
            category,
            status,
            from,
            to,
            sort,
            desc,
            page,
            page_size,
        } => {
            let args = ListArgs::from_flags(
                today,
                title,
                category,
                status,
                from,
                to,
                sort,
                desc,
                page,
                page_size.unwrap_or(config.page_size),
            )?;
            runtime.block_on(cli::handle_list(&commands, args, &mut out))?;
        }
        Commands::Show { id } => runtime.block_on(cli::handle_show(&commands, id, &mut out))?,
        Commands::Done { id } => runtime.block_on(cli::handle_done(&commands, id, &mut out))?,
        Commands::Today { ids, remove } => {
            runtime.block_on(cli::handle_today(&commands, &ids, remove, &mut out))?;
        }
        Commands::Delete { ids } => runtime.block_on(cli::handle_delete(&commands, &ids, &mut out))?,
        Commands::PurgeCompleted => runtime.block_on(cli::handle_purge_completed(&commands, &mut out))?,
        Commands::Stats => runtime.block_on(cli::handle_stats(&commands, &mut out))?,
        Commands::Suggest => {
            let policy = RetryPolicy::from(&config.assistant);
            runtime.block_on(cli::handle_suggest(&commands, policy, &mut out))?;
        }
    }

    Ok(())
}
