use ember_core::config::AppConfig;
use ember_core::runtime::EmberRuntime;
use server::{admin, logging};
use std::process::ExitCode;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("configuration error: {error}");
            return ExitCode::FAILURE;
        }
    };
    logging::init_logging(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "starting ember");

    let mut runtime = match EmberRuntime::builder().with_config(config).build() {
        Ok(runtime) => runtime,
        Err(error) => {
            error!(%error, "runtime construction failed");
            return ExitCode::FAILURE;
        }
    };

    let addr = match runtime.config().socket_addr() {
        Ok(addr) => addr,
        Err(error) => {
            error!(%error, "invalid bind address");
            return ExitCode::FAILURE;
        }
    };

    let admin_state = admin::AdminState::from_runtime(&runtime);
    let app = admin::create_admin_router(admin_state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(error) => {
            error!(%error, address = %addr, "failed to bind admin listener");
            return ExitCode::FAILURE;
        }
    };
    info!(address = %addr, "admin server listening");

    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(error) = serve_result {
        error!(%error, "admin server error");
    }

    runtime.shutdown().await;
    info!("server shutdown complete");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            error!(%error, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                error!(%error, "failed to install signal handler");
                () = std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, starting graceful shutdown");
}
