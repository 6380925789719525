/// HTTP server factory and configuration.
/// Provides a reusable route table and server constructor
/// for use in both the main binary and tests.

use actix_web::{middleware, web, App, HttpServer};
use crate::config::BanKeyKind;
use crate::handlers::{
    add_friend, admin_login, all_messages, ban, conversation, health, json_config, list_bans,
    list_users, login, send_message, signup, unban, update_profile, AppState,
};

/// Admin ban routes are named after the key this deployment bans by
fn ban_routes(kind: BanKeyKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        BanKeyKind::Device => (
            "/api/admin/ban_device",
            "/api/admin/unban_device",
            "/api/admin/banned_devices",
        ),
        BanKeyKind::Ip => (
            "/api/admin/ban_ip",
            "/api/admin/unban_ip",
            "/api/admin/banned_ips",
        ),
    }
}

/// Register every endpoint on an app
pub fn configure(cfg: &mut web::ServiceConfig, ban_kind: BanKeyKind) {
    let (ban_path, unban_path, list_bans_path) = ban_routes(ban_kind);

    cfg.app_data(json_config())
        .route("/health", web::get().to(health))
        // Accounts
        .route("/api/signup", web::post().to(signup))
        .route("/api/login", web::post().to(login))
        .route("/api/update_profile", web::post().to(update_profile))
        // Friends and messages
        .route("/api/add_friend", web::post().to(add_friend))
        .route("/api/send_message", web::post().to(send_message))
        .route("/api/messages", web::post().to(conversation))
        // Admin
        .route("/api/admin/login", web::post().to(admin_login))
        .route("/api/admin/users", web::get().to(list_users))
        .route("/api/admin/all_messages", web::get().to(all_messages))
        .route(ban_path, web::post().to(ban))
        .route(unban_path, web::post().to(unban))
        .route(list_bans_path, web::get().to(list_bans));
}

/// Create a configured HTTP server
///
/// Takes the shared application state and bind address, then returns a
/// fully configured server ready to be awaited.
///
/// # Example
/// ```ignore
/// let state = web::Data::new(AppState::new(pool, BanKeyKind::Device, admins, retention));
/// let server = server::create_http_server(state, "127.0.0.1:5000")?;
/// server.await?;
/// ```
pub fn create_http_server(
    state: web::Data<AppState>,
    bind_addr: &str,
) -> std::io::Result<actix_web::dev::Server> {
    let ban_kind = state.bans.kind();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(|cfg| configure(cfg, ban_kind))
    })
    .bind(bind_addr)?
    .run();

    Ok(server)
}

/// Create a test HTTP server over an in-memory database
///
/// Binds to a random available port, bans by device id and has no admins.
///
/// # Returns
/// A tuple of (server, bind_address) where bind_address can be used to make requests
#[cfg(any(test, feature = "test_utils"))]
pub fn create_test_http_server() -> std::io::Result<(actix_web::dev::Server, String)> {
    let state = web::Data::new(AppState::new(
        crate::db::create_test_pool(),
        BanKeyKind::Device,
        crate::auth::AdminGate::default(),
        crate::retention::RetentionPolicy::default(),
    ));
    let ban_kind = state.bans.kind();

    // Bind to 127.0.0.1:0 to get a random available port
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(|cfg| configure(cfg, ban_kind))
    })
    .bind("127.0.0.1:0")?;

    // Get the actual bind address (including the assigned port)
    let addr_str = server
        .addrs()
        .first()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "No bind address found"))?
        .to_string();

    Ok((server.run(), addr_str))
}
