/// Lightchat Server - friend-gated direct messaging with an admin ban panel
///
/// Library root shared by the binary and the integration tests.
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod retention;
pub mod server;
