use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use iocraft::prelude::*;

use partition_matrix::app::App;
use partition_matrix::color::ColorDepth;
use partition_matrix::config::keybindings::MergedBindings;
use partition_matrix::config::loader;
use partition_matrix::config::types::AppConfig;
use partition_matrix::engine::{DagsterEngine, Engine, EngineHandle, StubEngine};
use partition_matrix::theme::{Background, ResolvedTheme};
use partition_matrix::view_state::{ViewState, ViewStateStore};

#[derive(Parser)]
#[command(
    name = "partition-matrix",
    version,
    about = "Step-by-partition run matrix for Dagster pipelines"
)]
struct Cli {
    /// Path to config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging to debug.log.
    #[arg(long)]
    debug: bool,

    /// Serve pipeline and partitions from a JSON fixture instead of Dagster.
    #[arg(long, value_name = "JSON")]
    fixture: Option<PathBuf>,

    /// Open with a shared view (a query string printed by `print-view`).
    #[arg(long, value_name = "QUERY")]
    view: Option<String>,

    /// Pipeline name, overriding `[dagster] pipeline_name`.
    #[arg(long)]
    pipeline: Option<String>,

    /// Partition set name, overriding `[dagster] partition_set_name`.
    #[arg(long)]
    partition_set: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the saved view state as a shareable query string.
    PrintView,
}

/// State file for the configured pipeline and partition set, if a state
/// directory is available.
fn view_store(config: &AppConfig) -> Option<ViewStateStore> {
    let key = format!(
        "{}-{}",
        config.dagster.pipeline_name, config.dagster.partition_set_name
    );
    match ViewStateStore::for_key(&key) {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!("view state will not be saved: {e}");
            None
        }
    }
}

fn main() -> Result<()> {
    // Install a panic hook that writes to a file, since the fullscreen TUI
    // swallows stderr.
    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        let msg = format!("{info}\n\n{backtrace}");
        let _ = std::fs::write("panic.log", &msg);
        eprintln!("{msg}");
    }));

    let cli = Cli::parse();

    // Set up tracing.
    if cli.debug {
        let file = std::fs::File::create("debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(file)
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
    }

    // Load config; CLI flags override the selector.
    let mut config = loader::load_config(cli.config.as_deref())?;
    if let Some(pipeline) = cli.pipeline {
        config.dagster.pipeline_name = pipeline;
    }
    if let Some(partition_set) = cli.partition_set {
        config.dagster.partition_set_name = partition_set;
    }
    if cli.fixture.is_none()
        && (config.dagster.pipeline_name.is_empty() || config.dagster.partition_set_name.is_empty())
    {
        bail!(
            "no pipeline selected: set [dagster] pipeline_name and partition_set_name \
             or pass --pipeline and --partition-set"
        );
    }

    let store = view_store(&config);

    if let Some(Commands::PrintView) = cli.command {
        let state = store.as_ref().map(ViewStateStore::load).unwrap_or_default();
        println!("{}", state.to_query_string());
        return Ok(());
    }

    // A shared view replaces the saved one.
    let initial_state = match cli.view.as_deref() {
        Some(query) => {
            let state = ViewState::from_query_string(query.trim_start_matches('?'));
            if let Some(ref store) = store
                && let Err(e) = store.save(&state)
            {
                tracing::warn!("{e:#}");
            }
            state
        }
        None => store.as_ref().map(ViewStateStore::load).unwrap_or_default(),
    };

    // Detect terminal capabilities.
    let color_depth = ColorDepth::detect();
    let background = Background::detect();
    let theme = ResolvedTheme::resolve(&config.theme, background);
    let keybindings = MergedBindings::from_config(&config.keybindings);

    // The engine owns its own thread. Dropping `engine_handle` at the end of
    // `main` closes the sender channel, signalling the engine to shut down.
    let engine_handle: EngineHandle = if let Some(ref path) = cli.fixture {
        StubEngine::from_fixture(path)?.start()
    } else {
        // Install the rustls CryptoProvider before any TLS client is constructed.
        if rustls::crypto::aws_lc_rs::default_provider()
            .install_default()
            .is_err()
        {
            tracing::debug!("rustls crypto provider already installed");
        }
        DagsterEngine::new(config.clone()).start()
    };

    tracing::info!(
        pipeline = %config.dagster.pipeline_name,
        partition_set = %config.dagster.partition_set_name,
        "partition-matrix starting"
    );

    // Enter fullscreen TUI (iocraft uses smol internally).
    smol::block_on(
        element! {
            App(
                config: &config,
                engine: &engine_handle,
                theme: &theme,
                keybindings: &keybindings,
                color_depth,
                initial_state: &initial_state,
                view_store: store.as_ref(),
            )
        }
        .fullscreen(),
    )?;

    Ok(())
}
