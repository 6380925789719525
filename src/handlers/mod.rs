/// HTTP handlers module
/// Provides the account, messaging and admin endpoints plus shared request state.

pub mod account;
pub mod admin;
pub mod messaging;

pub use account::{login, signup, update_profile};
pub use admin::{admin_login, all_messages, ban, list_bans, list_users, unban};
pub use messaging::{add_friend, conversation, send_message};

use crate::auth::{AdminGate, BanGate, CredentialVerifier, PlaintextVerifier};
use crate::config::BanKeyKind;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::retention::RetentionPolicy;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

/// Everything a handler needs besides the request itself
pub struct AppState {
    pub pool: DbPool,
    pub bans: BanGate,
    pub admins: AdminGate,
    pub retention: RetentionPolicy,
    pub verifier: Box<dyn CredentialVerifier>,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        ban_kind: BanKeyKind,
        admins: AdminGate,
        retention: RetentionPolicy,
    ) -> Self {
        AppState {
            pool,
            bans: BanGate::new(ban_kind),
            admins,
            retention,
            verifier: Box::new(PlaintextVerifier),
        }
    }

    /// Swap the password check, e.g. for a hashing scheme
    pub fn with_verifier(mut self, verifier: Box<dyn CredentialVerifier>) -> Self {
        self.verifier = verifier;
        self
    }
}

/// JSON extractor config that reports bad bodies in the common error shape
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::MalformedBody(err.to_string()).into())
}

/// A field counts as supplied only when it is present and non-empty
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

pub(crate) fn peer_ip(req: &HttpRequest) -> Option<String> {
    req.peer_addr().map(|addr| addr.ip().to_string())
}

/// Health check endpoint
/// GET /health
pub async fn health() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok"
    })))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::db::create_test_pool;

    pub const ADMIN: (&str, &str) = ("root", "pw");

    pub fn state(kind: BanKeyKind) -> web::Data<AppState> {
        web::Data::new(AppState::new(
            create_test_pool(),
            kind,
            AdminGate::new(vec![format!("{}:{}", ADMIN.0, ADMIN.1)
                .parse()
                .expect("Failed to parse admin")]),
            RetentionPolicy::default(),
        ))
    }
}
