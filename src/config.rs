/// Configuration management for the chat server.
/// Handles command-line and environment parsing; nothing secret lives in source.
use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::retention::RetentionPolicy;

/// Which identifier signup and login are banned by. Exactly one per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BanKeyKind {
    /// Client-supplied device identifier
    Device,
    /// Peer IP address of the HTTP connection
    Ip,
}

impl BanKeyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BanKeyKind::Device => "device",
            BanKeyKind::Ip => "ip",
        }
    }

    /// Human-facing name used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            BanKeyKind::Device => "device",
            BanKeyKind::Ip => "IP",
        }
    }
}

/// One entry of the admin allow-list, written as `username:password`
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredential {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredential")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl FromStr for AdminCredential {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (username, password) = s
            .split_once(':')
            .ok_or_else(|| "admin must be written as username:password".to_string())?;
        if username.is_empty() {
            return Err("admin username must not be empty".to_string());
        }
        Ok(AdminCredential {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

#[derive(Parser, Debug)]
#[command(name = "Lightchat Server")]
#[command(about = "Minimal friend-gated chat backend", long_about = None)]
pub struct Config {
    /// Address to bind (default: 127.0.0.1)
    #[arg(long, env = "CHAT_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port (default: 5000)
    #[arg(long, env = "PORT", default_value = "5000")]
    pub port: u16,

    /// SQLite database file path (default: chat.db)
    #[arg(long, env = "DATABASE_PATH", default_value = "chat.db")]
    pub database: PathBuf,

    /// PID file path (optional) - write server PID to this file on startup
    #[arg(long)]
    pub pidfile: Option<PathBuf>,

    /// Identifier used to ban signups and logins
    #[arg(long, env = "CHAT_BAN_KEY", value_enum, default_value = "device")]
    pub ban_key: BanKeyKind,

    /// Admin allow-list entry as username:password (repeatable or comma separated)
    #[arg(long = "admin", env = "CHAT_ADMINS", value_delimiter = ',')]
    pub admins: Vec<AdminCredential>,

    /// Hours a message is kept before it is purged
    #[arg(long, env = "CHAT_RETENTION_HOURS", default_value = "24")]
    pub retention_hours: u64,

    /// Run a background purge every N seconds (0 disables it)
    #[arg(long, env = "CHAT_SWEEP_INTERVAL_SECS", default_value = "0")]
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Parse command-line arguments into Config
    pub fn from_args() -> Self {
        Config::parse()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy::new(Duration::from_secs(self.retention_hours.saturating_mul(60 * 60)))
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["lightchat-server"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).expect("Failed to parse")
    }

    #[test]
    fn test_admin_credential_parsing() {
        let admin: AdminCredential = "root:s3cret".parse().expect("Failed to parse");
        assert_eq!(admin.username, "root");
        assert_eq!(admin.password, "s3cret");

        let with_colon: AdminCredential = "root:a:b".parse().expect("Failed to parse");
        assert_eq!(with_colon.password, "a:b");

        assert!("rootonly".parse::<AdminCredential>().is_err());
        assert!(":pw".parse::<AdminCredential>().is_err());
    }

    #[test]
    fn test_admin_debug_hides_password() {
        let admin: AdminCredential = "root:s3cret".parse().expect("Failed to parse");
        let printed = format!("{:?}", admin);
        assert!(!printed.contains("s3cret"));
    }

    #[test]
    fn test_custom_port_and_database() {
        let config = parse(&["--port", "8080", "--database", "/tmp/custom.db"]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.database.to_str().unwrap(), "/tmp/custom.db");
        assert_eq!(config.bind_addr(), format!("{}:8080", config.host));
    }

    #[test]
    fn test_ban_key_and_admins() {
        let config = parse(&[
            "--ban-key",
            "ip",
            "--admin",
            "a:1,b:2",
            "--admin",
            "c:3",
        ]);
        assert_eq!(config.ban_key, BanKeyKind::Ip);
        let names: Vec<&str> = config.admins.iter().map(|a| a.username.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_retention_and_sweep() {
        let config = parse(&["--retention-hours", "2", "--sweep-interval-secs", "30"]);
        assert_eq!(config.retention().window(), Duration::from_secs(2 * 60 * 60));
        assert_eq!(config.sweep_interval(), Some(Duration::from_secs(30)));

        let config = parse(&["--sweep-interval-secs", "0"]);
        assert_eq!(config.sweep_interval(), None);
    }
}
