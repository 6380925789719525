/// Database layer for persistent storage.
/// Handles all database operations for users, friendships, messages and bans.

pub mod init;
pub mod models;

use chrono::{DateTime, SecondsFormat, Utc};
use models::{BanEntry, Message, User};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Result as SqliteResult, Row};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub type DbPool = Arc<Mutex<Connection>>;

/// Collisions on the short user id are retried with a fresh id this many times
const USER_ID_ATTEMPTS: usize = 5;

/// Create a connection pool (simplified for single-threaded SQLite)
pub fn create_pool(db_path: &str) -> SqliteResult<DbPool> {
    let conn = Connection::open(db_path)?;
    init::initialize_database(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Create an in-memory database for testing
#[cfg(any(test, feature = "test_utils"))]
pub fn create_test_pool() -> DbPool {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory DB");
    init::initialize_database(&conn).expect("Failed to initialize DB");
    Arc::new(Mutex::new(conn))
}

/// Render a timestamp as fixed-width RFC 3339 UTC text.
///
/// Every stored timestamp goes through here so that string comparison in SQL
/// orders the same way as time does.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Eight lowercase hex characters drawn from a v4 UUID
fn generate_user_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

const USER_COLUMNS: &str =
    "user_id, username, password, device_id, ip_address, profile_image, about, created";

fn user_from_row(row: &Row<'_>) -> SqliteResult<User> {
    Ok(User {
        user_id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        device_id: row.get(3)?,
        ip_address: row.get(4)?,
        profile_image: row.get(5)?,
        about: row.get(6)?,
        created: row.get(7)?,
    })
}

fn message_from_row(row: &Row<'_>) -> SqliteResult<Message> {
    Ok(Message {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        message: row.get(3)?,
        timestamp: row.get(4)?,
    })
}

fn ban_from_row(row: &Row<'_>) -> SqliteResult<BanEntry> {
    Ok(BanEntry {
        key: row.get(0)?,
        kind: row.get(1)?,
        reason: row.get(2)?,
        banned_at: row.get(3)?,
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Fields supplied at signup
#[derive(Debug, Default, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub device_id: Option<&'a str>,
    pub ip_address: Option<&'a str>,
    pub profile_image: &'a str,
    pub about: &'a str,
}

/// Database operations
pub struct Database;

impl Database {
    // -- Accounts --

    /// Create a user with a freshly generated id
    pub async fn create_user(pool: &DbPool, new_user: &NewUser<'_>) -> SqliteResult<User> {
        let conn = pool.lock().await;
        let created = format_timestamp(Utc::now());

        let mut attempt = 0;
        loop {
            attempt += 1;
            let user_id = generate_user_id();
            let inserted = conn.execute(
                "INSERT INTO users (user_id, username, password, device_id, ip_address, profile_image, about, created)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    &user_id,
                    new_user.username,
                    new_user.password,
                    new_user.device_id,
                    new_user.ip_address,
                    new_user.profile_image,
                    new_user.about,
                    &created,
                ],
            );

            match inserted {
                Ok(_) => {
                    return Ok(User {
                        user_id,
                        username: new_user.username.to_string(),
                        password: new_user.password.to_string(),
                        device_id: new_user.device_id.map(str::to_string),
                        ip_address: new_user.ip_address.map(str::to_string),
                        profile_image: new_user.profile_image.to_string(),
                        about: new_user.about.to_string(),
                        created,
                    });
                }
                Err(e) if is_constraint_violation(&e) && attempt < USER_ID_ATTEMPTS => {
                    log::warn!("User id collision on {}, retrying", user_id);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// All users registered under a username, oldest first
    pub async fn find_users_by_username(pool: &DbPool, username: &str) -> SqliteResult<Vec<User>> {
        let conn = pool.lock().await;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users WHERE username = ?1 ORDER BY id ASC",
            USER_COLUMNS
        ))?;

        let users = stmt
            .query_map(params![username], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Get user by generated id
    pub async fn get_user(pool: &DbPool, user_id: &str) -> SqliteResult<Option<User>> {
        let conn = pool.lock().await;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users WHERE user_id = ?1",
            USER_COLUMNS
        ))?;

        let user = stmt.query_row(params![user_id], user_from_row).optional()?;

        Ok(user)
    }

    /// Record the device a user last logged in from
    pub async fn update_device(pool: &DbPool, user_id: &str, device_id: &str) -> SqliteResult<()> {
        let conn = pool.lock().await;
        conn.execute(
            "UPDATE users SET device_id = ?2 WHERE user_id = ?1",
            params![user_id, device_id],
        )?;
        Ok(())
    }

    /// Update profile fields; `None` leaves a field untouched.
    /// Returns whether a user matched.
    pub async fn update_profile(
        pool: &DbPool,
        user_id: &str,
        profile_image: Option<&str>,
        about: Option<&str>,
    ) -> SqliteResult<bool> {
        let conn = pool.lock().await;
        let updated = conn.execute(
            "UPDATE users
             SET profile_image = COALESCE(?2, profile_image), about = COALESCE(?3, about)
             WHERE user_id = ?1",
            params![user_id, profile_image, about],
        )?;
        Ok(updated > 0)
    }

    /// Every user, in signup order
    pub async fn list_users(pool: &DbPool) -> SqliteResult<Vec<User>> {
        let conn = pool.lock().await;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY id ASC",
            USER_COLUMNS
        ))?;

        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    // -- Friends --

    /// Link two users in both directions. Re-adding an existing pair is a no-op.
    pub async fn add_friend(pool: &DbPool, user_id: &str, friend_id: &str) -> SqliteResult<()> {
        let mut conn = pool.lock().await;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT OR IGNORE INTO friends (user_id, friend_id) VALUES (?1, ?2)",
            params![user_id, friend_id],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO friends (user_id, friend_id) VALUES (?1, ?2)",
            params![friend_id, user_id],
        )?;

        tx.commit()
    }

    /// Whether the directed edge user_id -> friend_id exists
    pub async fn are_friends(pool: &DbPool, user_id: &str, friend_id: &str) -> SqliteResult<bool> {
        let conn = pool.lock().await;

        let found = conn
            .query_row(
                "SELECT 1 FROM friends WHERE user_id = ?1 AND friend_id = ?2",
                params![user_id, friend_id],
                |_| Ok(()),
            )
            .optional()?;

        Ok(found.is_some())
    }

    /// Ids of everyone linked from user_id
    pub async fn list_friends(pool: &DbPool, user_id: &str) -> SqliteResult<Vec<String>> {
        let conn = pool.lock().await;

        let mut stmt =
            conn.prepare("SELECT friend_id FROM friends WHERE user_id = ?1 ORDER BY id ASC")?;

        let friends = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(friends)
    }

    // -- Messages --

    /// Delete every message stamped before `cutoff`. Returns the number removed.
    pub async fn purge_expired(pool: &DbPool, cutoff: DateTime<Utc>) -> SqliteResult<usize> {
        let conn = pool.lock().await;
        let deleted = conn.execute(
            "DELETE FROM messages WHERE timestamp < ?1",
            params![format_timestamp(cutoff)],
        )?;
        Ok(deleted)
    }

    /// Store a message stamped with the current time
    pub async fn store_message(
        pool: &DbPool,
        sender_id: &str,
        receiver_id: &str,
        body: &str,
    ) -> SqliteResult<Message> {
        Self::store_message_at(pool, sender_id, receiver_id, body, Utc::now()).await
    }

    /// Store a message with an explicit timestamp
    pub async fn store_message_at(
        pool: &DbPool,
        sender_id: &str,
        receiver_id: &str,
        body: &str,
        timestamp: DateTime<Utc>,
    ) -> SqliteResult<Message> {
        let conn = pool.lock().await;
        let timestamp = format_timestamp(timestamp);

        conn.execute(
            "INSERT INTO messages (sender_id, receiver_id, message, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![sender_id, receiver_id, body, &timestamp],
        )?;

        Ok(Message {
            id: conn.last_insert_rowid(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            message: body.to_string(),
            timestamp,
        })
    }

    /// Messages exchanged between two users in either direction, oldest first
    pub async fn conversation(
        pool: &DbPool,
        user_id: &str,
        friend_id: &str,
        since: DateTime<Utc>,
    ) -> SqliteResult<Vec<Message>> {
        let conn = pool.lock().await;

        let mut stmt = conn.prepare(
            "SELECT id, sender_id, receiver_id, message, timestamp FROM messages
             WHERE ((sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1))
               AND timestamp >= ?3
             ORDER BY timestamp ASC, id ASC",
        )?;

        let messages = stmt
            .query_map(
                params![user_id, friend_id, format_timestamp(since)],
                message_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    /// Every stored message newer than `since`, oldest first
    pub async fn all_messages(pool: &DbPool, since: DateTime<Utc>) -> SqliteResult<Vec<Message>> {
        let conn = pool.lock().await;

        let mut stmt = conn.prepare(
            "SELECT id, sender_id, receiver_id, message, timestamp FROM messages
             WHERE timestamp >= ?1
             ORDER BY timestamp ASC, id ASC",
        )?;

        let messages = stmt
            .query_map(params![format_timestamp(since)], message_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    // -- Bans --

    /// Ban a key. A key that is already banned keeps its original reason and time.
    /// Returns whether a new entry was created.
    pub async fn ban(pool: &DbPool, key: &str, kind: &str, reason: &str) -> SqliteResult<bool> {
        let conn = pool.lock().await;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO bans (ban_key, kind, reason, banned_at) VALUES (?1, ?2, ?3, ?4)",
            params![key, kind, reason, format_timestamp(Utc::now())],
        )?;
        Ok(inserted > 0)
    }

    /// Lift a ban. Returns whether an entry was removed.
    pub async fn unban(pool: &DbPool, key: &str, kind: &str) -> SqliteResult<bool> {
        let conn = pool.lock().await;
        let removed = conn.execute(
            "DELETE FROM bans WHERE ban_key = ?1 AND kind = ?2",
            params![key, kind],
        )?;
        Ok(removed > 0)
    }

    /// Ban entry for `key`, only among bans of the given kind
    pub async fn find_ban(pool: &DbPool, key: &str, kind: &str) -> SqliteResult<Option<BanEntry>> {
        let conn = pool.lock().await;

        let ban = conn
            .query_row(
                "SELECT ban_key, kind, reason, banned_at FROM bans WHERE ban_key = ?1 AND kind = ?2",
                params![key, kind],
                ban_from_row,
            )
            .optional()?;

        Ok(ban)
    }

    pub async fn list_bans(pool: &DbPool, kind: &str) -> SqliteResult<Vec<BanEntry>> {
        let conn = pool.lock().await;

        let mut stmt = conn.prepare(
            "SELECT ban_key, kind, reason, banned_at FROM bans WHERE kind = ?1 ORDER BY id ASC",
        )?;

        let bans = stmt
            .query_map(params![kind], ban_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(bans)
    }
}
