use std::path::PathBuf;
use std::process::ExitCode;

use parley_server::{app, build_auth_state, load_config, observability};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env if present; absence is not an error.
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: failed to load .env file: {e}");
        }
    }

    observability::init_tracing();

    let config_path = std::env::var("PARLEY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("parley.toml"));

    // Missing secrets abort here, before anything binds.
    let config = match load_config(Some(config_path.as_path())) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let auth_state = match build_auth_state(&config.auth) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Startup error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let addr = config.server.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {addr}: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(%addr, issuer = %config.auth.issuer, "parley-server listening");

    if let Err(e) = axum::serve(listener, app(auth_state)).await {
        eprintln!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
