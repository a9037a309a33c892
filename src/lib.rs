// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod supervisor;
pub mod types;
pub mod watch;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{resolve_settings, Settings};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::supervisor::{ManagedProcess, Supervisor, TokioLauncher};
use crate::types::RebuildSignal;
use crate::watch::spawn_watcher;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings resolution (CLI flags, optional config file, defaults)
/// - the file watcher and its debounced signal channel
/// - the startup rebuild
/// - the supervisor loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let cwd = std::env::current_dir()?;
    let settings = resolve_settings(&args, fs.as_ref(), &cwd)?;

    if args.dry_run {
        print_dry_run(&settings);
        return Ok(());
    }

    // One slot: the watcher waits for the supervisor once a signal is pending.
    let (signal_tx, signal_rx) = mpsc::channel::<RebuildSignal>(1);

    let watcher = spawn_watcher(&settings.watch, Arc::clone(&fs), signal_tx.clone())?;

    // Initial build/run cycle. Sent from its own task so it can never block
    // the supervisor from starting, whatever the watcher has queued.
    tokio::spawn(async move {
        if signal_tx.send(RebuildSignal).await.is_err() {
            debug!("supervisor gone before the initial rebuild");
        }
    });

    let supervisor = Supervisor::new(
        settings.build.clone(),
        settings.run.clone(),
        Arc::new(TokioLauncher),
    );
    let managed = supervisor.managed();

    tokio::select! {
        () = supervisor.run(signal_rx) => {}
        () = wait_for_ctrl_c() => {
            info!("shutdown requested; stopping application");
            watcher.abort();
            shutdown(&managed).await;
        }
    }

    Ok(())
}

async fn wait_for_ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

async fn shutdown(managed: &ManagedProcess) {
    managed.kill().await;
    info!("autobuild exiting");
}

/// Print the resolved settings without running anything.
fn print_dry_run(settings: &Settings) {
    let watch = &settings.watch;
    println!("autobuild dry-run");
    println!("  watch: {}", watch.root);
    println!(
        "  include: {}",
        watch.matcher.include_pattern().unwrap_or("<none>")
    );
    println!(
        "  exclude: {}",
        watch.matcher.exclude_pattern().unwrap_or("<none>")
    );
    println!(
        "  debounce: {}ms ({})",
        watch.debounce.delay.as_millis(),
        watch.debounce.policy
    );
    println!("  build: {}", settings.build);
    println!("  run: {}", settings.run);

    debug!("dry-run complete (no execution)");
}
