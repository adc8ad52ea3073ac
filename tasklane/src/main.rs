//! `tasklane`: interactive task list.
//!
//! Reads commands from stdin, forwards them to the state store as intents,
//! and prints the state after every change.
//!
//! ```bash
//! # In-memory session
//! cargo run --bin tasklane
//!
//! # Keep tasks between runs
//! cargo run --bin tasklane -- --snapshot ~/.local/share/tasklane/tasks.bin
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing_appender::non_blocking::WorkerGuard;

use tasklane::config::{AppConfig, CliArgs};
use tasklane::driver::{self, Command, render};
use tasklane::repository::InMemoryTaskRepository;
use tasklane::store::{self, TaskIntent, TaskState, TaskStore};

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    let config = match AppConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            AppConfig::default()
        }
    };

    // Logs go to a file; stdout belongs to the driver.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("tasklane starting");

    let repository = match &config.snapshot_path {
        Some(path) => match InMemoryTaskRepository::open(path) {
            Ok(repo) => repo,
            Err(e) => {
                eprintln!("Error: cannot open snapshot {}: {e}", path.display());
                return Err(io::Error::other(e));
            }
        },
        None => InMemoryTaskRepository::new(),
    };

    let store = TaskStore::new(Arc::new(repository), config.to_store_config());
    let result = run(store, &config).await;

    tracing::info!("tasklane exiting");
    result
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown so buffered
/// entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("tasklane.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Read commands until `quit` or end of input.
async fn run(store: TaskStore<InMemoryTaskRepository>, config: &AppConfig) -> io::Result<()> {
    let (intent_tx, intent_rx) = mpsc::channel(config.intent_buffer);
    let intent_loop = store::spawn_intent_loop(store.clone(), intent_rx);
    let printer = tokio::spawn(print_states(
        store.subscribe(),
        config.timestamp_format.clone(),
    ));

    println!("{}", render::HELP);
    if intent_tx.send(TaskIntent::LoadTasks).await.is_err() {
        return Err(io::Error::other("intent loop stopped"));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match driver::parse_command(&line) {
            Ok(Command::Intent(intent)) => {
                if intent_tx.send(intent).await.is_err() {
                    tracing::warn!("intent loop stopped, exiting");
                    break;
                }
            }
            Ok(Command::Show(id)) => match store.get_task(id).await {
                Ok(Some(task)) => {
                    println!("{}", render::format_task_details(&task, &config.timestamp_format));
                }
                Ok(None) => println!("no task #{id}"),
                Err(e) => println!("!! {e}"),
            },
            Ok(Command::ClearError) => store.clear_error(),
            Ok(Command::Help) => println!("{}", render::HELP),
            Ok(Command::Quit) => break,
            Err(driver::CommandError::Empty) => {}
            Err(e) => println!("?? {e}"),
        }
    }

    drop(intent_tx);
    let _ = intent_loop.await;
    printer.abort();
    Ok(())
}

/// Print the state every time it changes.
async fn print_states(mut states: watch::Receiver<TaskState>, timestamp_format: String) {
    while states.changed().await.is_ok() {
        let state = states.borrow_and_update().clone();
        // Skip the intermediate frame between a reload and its first emission.
        if state.is_loading {
            continue;
        }
        println!("{}", render::format_state(&state, &timestamp_format));
    }
}
