/// Account endpoints: signup, login and profile updates.
///
/// Signup and login consult the ban gate before anything else.

use super::{peer_ip, present, AppState};
use crate::config::BanKeyKind;
use crate::db::models::*;
use crate::db::{Database, NewUser};
use crate::error::ApiError;
use actix_web::{web, HttpRequest, HttpResponse};

/// Create an account
/// POST /api/signup
pub async fn signup(
    state: web::Data<AppState>,
    http: HttpRequest,
    req: web::Json<SignupRequest>,
) -> Result<HttpResponse, ApiError> {
    let peer = peer_ip(&http);
    let ban_key = state.bans.key_for(req.device_id.as_deref(), peer.as_deref());
    state.bans.check(&state.pool, ban_key).await?;

    let device_id = present(&req.device_id);
    let (Some(username), Some(password)) = (present(&req.username), present(&req.password)) else {
        return Err(missing_credentials(state.bans.kind()));
    };
    if state.bans.kind() == BanKeyKind::Device && device_id.is_none() {
        return Err(missing_credentials(BanKeyKind::Device));
    }

    let user = Database::create_user(
        &state.pool,
        &NewUser {
            username,
            password,
            device_id,
            ip_address: peer.as_deref(),
            profile_image: req.profile_image.as_deref().unwrap_or(""),
            about: req.about.as_deref().unwrap_or(""),
        },
    )
    .await?;

    log::info!("Signed up {} as {}", user.username, user.user_id);

    Ok(HttpResponse::Ok().json(SignupResponse {
        success: true,
        user_id: user.user_id,
    }))
}

/// Log in with username and password
/// POST /api/login
pub async fn login(
    state: web::Data<AppState>,
    http: HttpRequest,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let peer = peer_ip(&http);
    let ban_key = state.bans.key_for(req.device_id.as_deref(), peer.as_deref());
    state.bans.check(&state.pool, ban_key).await?;

    let (Some(username), Some(password)) = (present(&req.username), present(&req.password)) else {
        return Err(missing_login_fields(state.bans.kind()));
    };
    // Without a device id the ban gate has nothing to check
    if state.bans.kind() == BanKeyKind::Device && present(&req.device_id).is_none() {
        return Err(missing_login_fields(BanKeyKind::Device));
    }

    let user = Database::find_users_by_username(&state.pool, username)
        .await?
        .into_iter()
        .find(|user| state.verifier.verify(password, &user.password))
        .ok_or(ApiError::InvalidCredentials)?;

    // The last device a user logged in from replaces the one on record
    if let Some(device_id) = present(&req.device_id) {
        if user.device_id.as_deref() != Some(device_id) {
            Database::update_device(&state.pool, &user.user_id, device_id).await?;
        }
    }

    Ok(HttpResponse::Ok().json(LoginResponse {
        success: true,
        user_id: user.user_id,
        profile_image: user.profile_image,
        about: user.about,
    }))
}

/// Change profile image and/or bio
/// POST /api/update_profile
pub async fn update_profile(
    state: web::Data<AppState>,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    let Some(user_id) = present(&req.user_id) else {
        return Err(ApiError::MissingFields("User ID required"));
    };

    let matched = Database::update_profile(
        &state.pool,
        user_id,
        req.profile_image.as_deref(),
        req.about.as_deref(),
    )
    .await?;
    if !matched {
        log::warn!("Profile update for unknown user {}", user_id);
    }

    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

fn missing_login_fields(kind: BanKeyKind) -> ApiError {
    match kind {
        BanKeyKind::Device => ApiError::MissingFields("Missing username, password, or device ID"),
        BanKeyKind::Ip => ApiError::MissingFields("Missing username or password"),
    }
}

fn missing_credentials(kind: BanKeyKind) -> ApiError {
    match kind {
        BanKeyKind::Device => ApiError::MissingFields("Username, password, and device ID required"),
        BanKeyKind::Ip => ApiError::MissingFields("Username and password required"),
    }
}
