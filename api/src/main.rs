use api::auth::middleware::log_request;
use api::routes::routes;
use axum::{
    Router,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    middleware::from_fn,
};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tracing_appender::rolling;
use util::{config, state::AppState};

#[tokio::main]
async fn main() {
    let _log_guard = init_logging(&config::log_file());

    // Resolve the persistence layer once. A missing database does not stop
    // the server: it boots in degraded mode with the sentinel credential.
    let app_state = match db::connect().await {
        Ok(conn) => AppState::with_db(conn),
        Err(e) => {
            tracing::error!(error = %e, "Database unreachable, starting in degraded mode");
            AppState::unavailable()
        }
    };

    let cors = CorsLayer::very_permissive().expose_headers([CONTENT_DISPOSITION, CONTENT_TYPE]);

    let app = Router::new()
        .nest("/api", routes(app_state))
        .layer(from_fn(log_request))
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config::host(), config::port())
        .parse()
        .expect("Invalid address");

    println!(
        "{} listening on http://{}",
        config::project_name(),
        addr
    );

    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server crashed");
}

/// File logging via a daily-rolling appender under `logs/`, plus an optional
/// ANSI stdout layer. The returned guard must stay alive for the lifetime of
/// the process or buffered lines are lost.
fn init_logging(log_file: &str) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    std::fs::create_dir_all("logs").ok();

    let (file_writer, guard) = tracing_appender::non_blocking(rolling::daily("logs", log_file));
    let filter =
        EnvFilter::try_new(config::log_level()).unwrap_or_else(|_| EnvFilter::new("api=info"));

    let registry = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_target(true),
    );

    if config::log_to_stdout() {
        registry.with(fmt::layer().with_writer(std::io::stdout)).init();
    } else {
        registry.init();
    }

    guard
}
