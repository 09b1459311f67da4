mod access_log;
mod background;
mod config;
mod handlers;
mod openapi;
mod state;

use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use blkstat_core::collector::RealFs;
use blkstat_core::storage::SnapshotStore;

use background::{SamplerTasks, start_samplers, supervise};
use config::{Args, Settings};
use state::SharedStore;

// ============================================================
// Main
// ============================================================

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let settings = match Settings::from_args(&args) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            process::exit(1);
        }
    };

    let code = runtime.block_on(async_main(settings));
    drop(runtime);
    if code != 0 {
        process::exit(code);
    }
}

/// Runs samplers and the HTTP server until a signal or a fatal sampler error.
/// Returns the process exit code.
async fn async_main(settings: Settings) -> i32 {
    info!(
        version = blkstat_core::VERSION,
        interval_ms = settings.interval.as_millis() as u64,
        listen = %settings.listen,
        devices = ?settings.registry.iter().collect::<Vec<_>>(),
        sys_path = %settings.sys_path.display(),
        on_error = %settings.policy,
        "starting"
    );

    let store: SharedStore = Arc::new(SnapshotStore::new(&settings.registry));
    let cancel = CancellationToken::new();
    let mut tasks = SamplerTasks::new();

    match start_samplers(
        &RealFs::new(),
        &settings.registry,
        &settings.sys_path,
        settings.interval,
        settings.policy,
        &store,
        &cancel,
        &mut tasks,
    ) {
        Ok(0) => {
            error!("no device could be opened, nothing to sample");
            return 1;
        }
        Ok(started) => info!(started, "samplers running"),
        Err(e) => {
            error!(device = e.device().unwrap_or("-"), error = %e, "failed to start sampler");
            return 1;
        }
    }

    let listener = match tokio::net::TcpListener::bind(settings.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %settings.listen_addr, error = %e, "failed to bind");
            return 1;
        }
    };
    info!(addr = %settings.listen_addr, "listening");

    let app = handlers::router(store).into_make_service_with_connect_info::<SocketAddr>();
    let server_cancel = cancel.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_cancel.cancelled().await })
            .await
    });

    tokio::spawn(shutdown_signal(cancel.clone()));

    let code = tokio::select! {
        result = supervise(&mut tasks, &cancel) => match result {
            Ok(()) => 0,
            Err(e) => {
                error!(
                    device = e.device().unwrap_or("-"),
                    error = %e,
                    "sampler failed, shutting down"
                );
                1
            }
        },
        result = &mut server => match result {
            Ok(Ok(())) => 0,
            Ok(Err(e)) => {
                error!(error = %e, "server error");
                1
            }
            Err(e) => {
                error!(error = %e, "server task failed");
                1
            }
        },
    };

    cancel.cancel();
    tasks.shutdown().await;
    if !server.is_finished() {
        if let Ok(Err(e)) = server.await {
            error!(error = %e, "server error during shutdown");
        }
    }
    info!(code, "stopped");
    code
}

/// Cancels `cancel` on Ctrl-C or SIGTERM.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = cancel.cancelled() => return,
    }

    info!("received shutdown signal, stopping");
    cancel.cancel();
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    // RUST_LOG wins when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("blkstat_web={level},blkstat_core={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
