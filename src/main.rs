/// Lightchat Server
///
/// Main server entry point. Handles:
/// - Command-line / environment configuration
/// - Database initialization
/// - Optional background message sweep
/// - HTTP server startup
use actix_web::web;
use anyhow::Context;
use lightchat_server::auth::AdminGate;
use lightchat_server::config::Config;
use lightchat_server::handlers::AppState;
use lightchat_server::{db, retention, server};
use std::fs;
use std::process;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .init();

    let config = Config::from_args();

    log::info!("Starting Lightchat Server");
    log::info!("Database: {:?}", config.database);
    log::info!("Bind address: {}", config.bind_addr());
    log::info!("Ban key: {}", config.ban_key.as_str());
    log::info!("Message retention: {}h", config.retention_hours);

    // Write PID file if specified
    if let Some(pidfile) = &config.pidfile {
        fs::write(pidfile, process::id().to_string())
            .with_context(|| format!("Failed to write PID file {:?}", pidfile))?;
        log::info!("PID file written to: {:?}", pidfile);
    }

    let db_path = config
        .database
        .to_str()
        .context("Database path is not valid UTF-8")?;
    let pool = db::create_pool(db_path).context("Failed to create database pool")?;

    log::info!("Database initialized");

    let admins = AdminGate::new(config.admins.clone());
    if admins.is_empty() {
        log::warn!("No admins configured; every admin request will be rejected");
    } else {
        log::info!("{} admin account(s) configured", admins.len());
    }

    let retention = config.retention();
    if let Some(every) = config.sweep_interval() {
        log::info!("Background sweep every {}s", every.as_secs());
        tokio::spawn(retention::run_sweep_loop(pool.clone(), retention, every));
    }

    let state = web::Data::new(AppState::new(pool, config.ban_key, admins, retention));

    log::info!("Starting HTTP server on {}", config.bind_addr());
    let http_server = server::create_http_server(state, &config.bind_addr())?;
    http_server.await?;

    Ok(())
}
