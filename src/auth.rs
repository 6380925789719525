/// Credential checks: user password verification, the ban gate and the admin gate.

use crate::config::{AdminCredential, BanKeyKind};
use crate::db::{Database, DbPool};
use crate::error::ApiError;

/// Compares a supplied password against the stored one.
///
/// Call sites only go through this trait so a hashing scheme can replace
/// [`PlaintextVerifier`] without touching them.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, supplied: &str, stored: &str) -> bool;
}

/// Stored passwords are the raw strings the user signed up with.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextVerifier;

impl CredentialVerifier for PlaintextVerifier {
    fn verify(&self, supplied: &str, stored: &str) -> bool {
        supplied == stored
    }
}

/// Blocks signup and login for banned keys
#[derive(Debug, Clone, Copy)]
pub struct BanGate {
    kind: BanKeyKind,
}

impl BanGate {
    pub fn new(kind: BanKeyKind) -> Self {
        BanGate { kind }
    }

    pub fn kind(&self) -> BanKeyKind {
        self.kind
    }

    /// Pick the key this deployment bans by. Empty device ids count as absent.
    pub fn key_for<'a>(&self, device_id: Option<&'a str>, peer_ip: Option<&'a str>) -> Option<&'a str> {
        match self.kind {
            BanKeyKind::Device => device_id.filter(|d| !d.is_empty()),
            BanKeyKind::Ip => peer_ip,
        }
    }

    /// Fail with [`ApiError::Banned`] when `key` is on the ban list
    pub async fn check(&self, pool: &DbPool, key: Option<&str>) -> Result<(), ApiError> {
        let Some(key) = key else {
            return Ok(());
        };

        if let Some(ban) = Database::find_ban(pool, key, self.kind.as_str()).await? {
            log::warn!(
                "Rejected banned {} {} (reason: {:?}, since {})",
                self.kind.as_str(),
                key,
                ban.reason,
                ban.banned_at
            );
            return Err(ApiError::Banned(self.kind.label()));
        }
        Ok(())
    }
}

/// Static allow-list of admin accounts, checked on every admin call
#[derive(Debug, Clone, Default)]
pub struct AdminGate {
    admins: Vec<AdminCredential>,
}

impl AdminGate {
    pub fn new(admins: Vec<AdminCredential>) -> Self {
        AdminGate { admins }
    }

    pub fn len(&self) -> usize {
        self.admins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }

    pub fn authorize(&self, username: Option<&str>, password: Option<&str>) -> Result<(), ApiError> {
        let (Some(username), Some(password)) = (username, password) else {
            return Err(ApiError::InvalidCredentials);
        };

        let allowed = self
            .admins
            .iter()
            .any(|admin| admin.username == username && admin.password == password);

        if allowed {
            Ok(())
        } else {
            log::warn!("Rejected admin credentials for {}", username);
            Err(ApiError::InvalidCredentials)
        }
    }
}
