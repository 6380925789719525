/// Admin panel endpoints.
///
/// There is no admin session: every call carries the admin username and
/// password (JSON body for POST, query string for GET) and is checked against
/// the configured allow-list.

use super::{present, AppState};
use crate::config::BanKeyKind;
use crate::db::models::*;
use crate::db::Database;
use crate::error::ApiError;
use actix_web::{web, HttpResponse};
use chrono::Utc;

fn authorize(state: &AppState, credentials: &AdminCredentials) -> Result<(), ApiError> {
    state
        .admins
        .authorize(credentials.username.as_deref(), credentials.password.as_deref())
}

fn missing_key(kind: BanKeyKind) -> ApiError {
    match kind {
        BanKeyKind::Device => ApiError::MissingFields("Device ID required"),
        BanKeyKind::Ip => ApiError::MissingFields("IP address required"),
    }
}

/// POST /api/admin/login
pub async fn admin_login(
    state: web::Data<AppState>,
    req: web::Json<AdminCredentials>,
) -> Result<HttpResponse, ApiError> {
    authorize(&state, &req)?;
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

/// GET /api/admin/users
pub async fn list_users(
    state: web::Data<AppState>,
    query: web::Query<AdminCredentials>,
) -> Result<HttpResponse, ApiError> {
    authorize(&state, &query)?;
    let users = Database::list_users(&state.pool).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// GET /api/admin/all_messages
pub async fn all_messages(
    state: web::Data<AppState>,
    query: web::Query<AdminCredentials>,
) -> Result<HttpResponse, ApiError> {
    authorize(&state, &query)?;

    state.retention.enforce(&state.pool).await?;
    let since = state.retention.cutoff(Utc::now());
    let messages = Database::all_messages(&state.pool, since).await?;

    Ok(HttpResponse::Ok().json(messages))
}

/// POST /api/admin/ban_device or /api/admin/ban_ip
pub async fn ban(
    state: web::Data<AppState>,
    req: web::Json<BanRequest>,
) -> Result<HttpResponse, ApiError> {
    authorize(&state, &req.credentials)?;
    let kind = state.bans.kind();
    let Some(key) = present(req.key(kind)) else {
        return Err(missing_key(kind));
    };

    let reason = req.reason.as_deref().unwrap_or("");
    if Database::ban(&state.pool, key, kind.as_str(), reason).await? {
        log::info!("Banned {} {}", kind.as_str(), key);
    } else {
        log::info!("{} {} was already banned", kind.as_str(), key);
    }

    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

/// POST /api/admin/unban_device or /api/admin/unban_ip
pub async fn unban(
    state: web::Data<AppState>,
    req: web::Json<UnbanRequest>,
) -> Result<HttpResponse, ApiError> {
    authorize(&state, &req.credentials)?;
    let kind = state.bans.kind();
    let Some(key) = present(req.key(kind)) else {
        return Err(missing_key(kind));
    };

    if !Database::unban(&state.pool, key, kind.as_str()).await? {
        return Err(ApiError::NotFound("Ban not found"));
    }
    log::info!("Unbanned {} {}", kind.as_str(), key);

    Ok(HttpResponse::Ok().json(UnbanResponse {
        success: true,
        key: key.to_string(),
    }))
}

/// GET /api/admin/banned_devices or /api/admin/banned_ips
pub async fn list_bans(
    state: web::Data<AppState>,
    query: web::Query<AdminCredentials>,
) -> Result<HttpResponse, ApiError> {
    authorize(&state, &query)?;
    let bans = Database::list_bans(&state.pool, state.bans.kind().as_str()).await?;
    Ok(HttpResponse::Ok().json(bans))
}
