/// Data models for database operations.
/// Represents users, messages and ban entries, plus the HTTP request/response DTOs.
use serde::{Deserialize, Serialize};

use crate::config::BanKeyKind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub user_id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub device_id: Option<String>,
    pub ip_address: Option<String>,
    pub profile_image: String,
    pub about: String,
    pub created: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: i64,
    pub sender_id: String,
    pub receiver_id: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BanEntry {
    pub key: String,
    pub kind: String,
    pub reason: String,
    pub banned_at: String,
}

// Request DTOs. Every field is optional so that absent values surface as a
// 400 with our own error body instead of a deserializer failure.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub device_id: Option<String>,
    pub profile_image: Option<String>,
    pub about: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub device_id: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub user_id: Option<String>,
    pub profile_image: Option<String>,
    pub about: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AddFriendRequest {
    pub user_id: Option<String>,
    pub friend_id: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub sender_id: Option<String>,
    pub receiver_id: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConversationRequest {
    pub user_id: Option<String>,
    pub friend_id: Option<String>,
}

/// Admin credentials, resent on every admin call (JSON body or query string).
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Ban request. Only the field named after the deployment's ban key is read;
/// the other one is ignored.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BanRequest {
    #[serde(flatten)]
    pub credentials: AdminCredentials,
    pub device_id: Option<String>,
    pub ip: Option<String>,
    pub reason: Option<String>,
}

impl BanRequest {
    pub fn key(&self, kind: BanKeyKind) -> &Option<String> {
        match kind {
            BanKeyKind::Device => &self.device_id,
            BanKeyKind::Ip => &self.ip,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UnbanRequest {
    #[serde(flatten)]
    pub credentials: AdminCredentials,
    pub device_id: Option<String>,
    pub ip: Option<String>,
}

impl UnbanRequest {
    pub fn key(&self, kind: BanKeyKind) -> &Option<String> {
        match kind {
            BanKeyKind::Device => &self.device_id,
            BanKeyKind::Ip => &self.ip,
        }
    }
}

// Response DTOs
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        SuccessResponse { success: true }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub success: bool,
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user_id: String,
    pub profile_image: String,
    pub about: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnbanResponse {
    pub success: bool,
    pub key: String,
}

/// A message as seen by one of the two participants
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageView {
    pub sender: String,
    pub receiver: String,
    pub message: String,
    pub timestamp: String,
}

impl From<Message> for MessageView {
    fn from(message: Message) -> Self {
        MessageView {
            sender: message.sender_id,
            receiver: message.receiver_id,
            message: message.message,
            timestamp: message.timestamp,
        }
    }
}
