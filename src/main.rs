use clap::Parser;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use devsearch::config::ServerConfig;
use devsearch::db::schema::ensure_schema;
use devsearch::web::{create_axum_router, templates::load_templates};

/// DevSearch web server.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Optional TOML file; environment variables take precedence over it.
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,
}

/// JSON lines into a daily rotated file under `log_dir`, plain text on stdout.
fn init_logging(log_dir: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    let json_file = fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(rolling::daily(log_dir, "devsearch.log"));
    let console = fmt::layer().with_target(false).with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_file)
        .with(console)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal.");
        return;
    }
    info!("Shutdown signal received.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    // Logging is not up yet, so a config error goes straight to stderr.
    let server_config = ServerConfig::load(args.config.as_deref())
        .map(Arc::new)
        .inspect_err(|e| eprintln!("Failed to load server configuration: {e}"))?;

    init_logging(&server_config.log_dir);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting DevSearch.");

    // --- Database ---
    let mut opt = ConnectOptions::new(server_config.database_url.to_owned());
    opt.max_connections(10);
    let db_pool: DatabaseConnection = Database::connect(opt).await.map_err(|e| {
        error!(error = %e, "Failed to create database connection.");
        e
    })?;
    ensure_schema(&db_pool).await?;

    // --- Templates ---
    let templates = Arc::new(load_templates()?);

    // --- HTTP Server ---
    let app = create_axum_router(db_pool, templates, server_config.clone());
    let addr: SocketAddr = server_config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening.");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}
