// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Pandora — personal show list
//
//  Storage:  JSON file standing in for origin-scoped local storage
//  Logging:  in-memory history, mirrored to tracing in development
//  Errors:   everything ends at the global error handler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

mod ui;

use clap::{Parser, Subcommand};
use pandora_core::config::PandoraConfig;
use pandora_core::{PandoraError, Show};
use pandora_observability::console::render;
use pandora_observability::{
    ClientError, GlobalErrorHandler, HttpLoggingInterceptor, HttpRequest, Logger, ReqwestHandler,
};
use pandora_store::{FileStore, ShowRepository};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "pandora", version, about = "Pandora — keep track of the shows you watch")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "pandora.yaml")]
    config: PathBuf,

    /// Log level (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,

    /// Path to the JSON state file holding the show list
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Keep log entries in memory only, never mirror them to the console
    #[arg(long)]
    production: bool,

    /// Print the session's log history as JSON lines before exiting
    #[arg(long)]
    history: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every saved show
    List,
    /// Add a show to the end of the list
    Add { name: String },
    /// Remove the first show with this name
    Delete { name: String },
    /// Replace the first show with this name
    Update { name: String, new_name: String },
    /// GET a path under the configured API URL
    Fetch {
        path: String,
        /// Query parameter as key=value (repeatable)
        #[arg(long = "param", value_parser = ui::parse_param)]
        params: Vec<(String, String)>,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::List => "list",
            Command::Add { .. } => "add",
            Command::Delete { .. } => "delete",
            Command::Update { .. } => "update",
            Command::Fetch { .. } => "fetch",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Config ──
    // A missing file still picks up PANDORA_* environment overrides
    let mut config = match PandoraConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("pandora: {}: {e}", cli.config.display());
            return ExitCode::from(exit_status(&e));
        }
    };
    if cli.production {
        config.environment.production = true;
    }
    if let Some(path) = &cli.state_file {
        config.storage.state_file = path.clone();
    }

    // ── Tracing ──
    let level = cli.log_level.clone().unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_target(false)
        .init();

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        production = config.environment.production,
        state_file = %config.storage.state_file.display(),
        "pandora starting"
    );

    // ── Composition root ──
    let logger = Arc::new(Logger::from_config(&config.environment));
    let handler = Arc::new(GlobalErrorHandler::new(Arc::clone(&logger)));
    GlobalErrorHandler::install_panic_hook(Arc::clone(&handler));

    let command = cli.command.name();
    logger.start_performance_log(command);
    let outcome = run(&cli.command, &config, &logger);
    logger.stop_performance_log(command);

    let code = match outcome {
        Ok(()) => 0,
        Err(e) => {
            let code = exit_code(&e);
            handler.handle(&ClientError::from(e));
            code
        }
    };

    if cli.history {
        for entry in logger.history() {
            println!("{}", entry.to_json_line());
        }
    }

    ExitCode::from(code)
}

fn run(command: &Command, config: &PandoraConfig, logger: &Arc<Logger>) -> anyhow::Result<()> {
    let store = FileStore::open(&config.storage.state_file)?;
    let shows = ShowRepository::with_key(store, config.storage.shows_key.as_str())?;

    match command {
        Command::List => {
            logger.log("Getting new shows!", None);
            println!("{}", ui::render_show_list(&shows.list()?));
        }
        Command::Add { name } => {
            let name = ui::validate_new_show(name)?;
            shows.add(&name)?;
            logger.log(format!("Added show {name}"), None);
            println!("{}", ui::render_show_list(&shows.list()?));
        }
        Command::Delete { name } => {
            let name = name.trim();
            shows.delete(name)?;
            logger.log(format!("Deleted show {name}"), None);
            println!("{}", ui::render_show_list(&shows.list()?));
        }
        Command::Update { name, new_name } => {
            let name = name.trim();
            let replacement = Show::new(ui::validate_new_show(new_name)?)?;
            let changed = shows.update(name, replacement)?;
            if !changed {
                logger.warn(format!("No show named {name} to update"), None);
            }
            println!("{}", ui::render_update(name, new_name.trim(), changed));
        }
        Command::Fetch { path, params } => {
            let url = config.environment.api_endpoint(path);
            let request = params
                .iter()
                .fold(HttpRequest::get(url), |req, (k, v)| req.with_param(k, v));

            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let interceptor = HttpLoggingInterceptor::new(Arc::clone(logger));
            let response = rt.block_on(interceptor.intercept(request, &ReqwestHandler::new()))?;

            info!(status = %response.status, "fetch complete");
            println!("{}", render(&response.body));
        }
    }
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<PandoraError>().map_or(1, exit_status)
}

fn exit_status(err: &PandoraError) -> u8 {
    u8::try_from(err.exit_code()).unwrap_or(1)
}
