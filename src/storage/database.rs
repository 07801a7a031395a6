//! # Database
//!
//! SQLite database wrapper for MapMoments data.
//!
//! ## Database Operations
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      DATABASE OPERATIONS                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │    Services     │  users / friends / pins / events / messaging      │
//! │  └────────┬────────┘                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                   │
//! │  │    Database     │  High-level API                                   │
//! │  │   (this file)   │  - Row-shaped records in/out                      │
//! │  │                 │  - Transactional friendship accept                │
//! │  │                 │  - Cascading pin deletion                         │
//! │  └────────┬────────┘                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                   │
//! │  │    rusqlite     │  SQLite wrapper                                   │
//! │  └────────┬────────┘                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                   │
//! │  │   SQLite DB     │  - In-memory for tests                            │
//! │  │                 │  - File for production                            │
//! │  └─────────────────┘                                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Authorization and visibility decisions live in the services; this layer
//! only answers queries and keeps multi-row writes atomic.

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::sync::Arc;

use super::schema;
use crate::error::{Error, Result};

/// Database configuration
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    /// Path to the database file
    pub path: Option<String>,
}

/// The main database handle
///
/// This wraps a SQLite connection and provides high-level methods for
/// storing and retrieving MapMoments data.
pub struct Database {
    /// The underlying SQLite connection
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create a database
    ///
    /// If path is None, creates an in-memory database (useful for testing).
    pub async fn open(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(p) => Connection::open(p)
                .map_err(|e| Error::Storage(format!("Failed to open database: {}", e)))?,
            None => Connection::open_in_memory()
                .map_err(|e| Error::Storage(format!("Failed to create in-memory database: {}", e)))?,
        };

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        // Initialize schema
        db.init_schema()?;

        Ok(db)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        // Check current schema version
        let version: Option<i32> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .ok();

        match version {
            None => {
                // Fresh database, create all tables
                conn.execute_batch(schema::CREATE_TABLES)
                    .map_err(|e| Error::Storage(format!("Failed to create tables: {}", e)))?;

                // Set schema version
                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?)",
                    params![schema::SCHEMA_VERSION],
                )
                .map_err(|e| Error::Storage(format!("Failed to set schema version: {}", e)))?;

                tracing::info!("Database schema created (version {})", schema::SCHEMA_VERSION);
            }
            Some(v) if v < schema::SCHEMA_VERSION => {
                tracing::info!(
                    "Database schema version {} is older than current {}, running migrations",
                    v,
                    schema::SCHEMA_VERSION
                );

                if v < 2 {
                    tracing::info!("Running migration v1 → v2 (events, messaging)");
                    conn.execute_batch(schema::MIGRATE_V1_TO_V2)
                        .map_err(|e| Error::Storage(format!("Migration v1→v2 failed: {}", e)))?;
                }

                tracing::info!(
                    "All migrations complete (now at version {})",
                    schema::SCHEMA_VERSION
                );
            }
            Some(v) => {
                tracing::debug!("Database schema version: {}", v);
            }
        }

        Ok(())
    }

    /// Drop and recreate every table (for testing/reset)
    pub fn reset(&self) -> Result<()> {
        {
            let conn = self.conn.lock();
            conn.execute_batch(schema::DROP_TABLES)
                .map_err(|e| Error::Storage(format!("Failed to drop tables: {}", e)))?;
        }
        self.init_schema()
    }

    // ========================================================================
    // USER OPERATIONS
    // ========================================================================

    /// Insert a new user row
    pub fn insert_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<()> {
        let conn = self.conn.lock();
        let now = crate::time::now_timestamp();

        conn.execute(
            "INSERT INTO users (id, username, email, password_hash, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![id, username, email, password_hash, now],
        )
        .map_err(|e| Error::Storage(format!("Failed to insert user: {}", e)))?;

        Ok(())
    }

    /// Get a user by id
    pub fn get_user(&self, id: &str) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT id, username, email, password_hash, created_at
             FROM users WHERE id = ?",
            params![id],
            Self::map_user_row,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::Storage(format!("Failed to get user: {}", e))),
        }
    }

    /// Get a user by login email
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT id, username, email, password_hash, created_at
             FROM users WHERE email = ?",
            params![email],
            Self::map_user_row,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::Storage(format!("Failed to get user by email: {}", e))),
        }
    }

    /// Check whether a username or email is already taken
    pub fn user_exists(&self, username: &str, email: &str) -> Result<bool> {
        let conn = self.conn.lock();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE username = ? OR email = ?",
                params![username, email],
                |row| row.get(0),
            )
            .map_err(|e| Error::Storage(format!("Failed to check user existence: {}", e)))?;

        Ok(count > 0)
    }

    /// Substring search over usernames and emails, excluding the viewer
    pub fn search_users(&self, viewer_id: &str, query: &str, limit: usize) -> Result<Vec<UserRecord>> {
        let conn = self.conn.lock();
        let pattern = format!("%{}%", query);

        let mut stmt = conn
            .prepare(
                "SELECT id, username, email, password_hash, created_at
                 FROM users
                 WHERE (username LIKE ?1 OR email LIKE ?1) AND id != ?2
                 ORDER BY username
                 LIMIT ?3",
            )
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![pattern, viewer_id, limit as i64], Self::map_user_row)
            .map_err(|e| Error::Storage(format!("Failed to search users: {}", e)))?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row.map_err(|e| Error::Storage(e.to_string()))?);
        }
        Ok(users)
    }

    /// Set (or replace) a user's profile photo
    pub fn set_profile_photo(&self, user_id: &str, payload: &[u8]) -> Result<bool> {
        let conn = self.conn.lock();

        let updated = conn
            .execute(
                "UPDATE users SET profile_photo = ? WHERE id = ?",
                params![payload, user_id],
            )
            .map_err(|e| Error::Storage(format!("Failed to set profile photo: {}", e)))?;

        Ok(updated > 0)
    }

    /// Get a user's profile photo, if one was set
    pub fn get_profile_photo(&self, user_id: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT profile_photo FROM users WHERE id = ?",
            params![user_id],
            |row| row.get::<_, Option<Vec<u8>>>(0),
        );

        match result {
            Ok(photo) => Ok(photo),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::Storage(format!("Failed to get profile photo: {}", e))),
        }
    }

    /// Load the users behind a list of ids, preserving input order
    pub fn get_users_by_ids(&self, ids: &[String]) -> Result<Vec<UserRecord>> {
        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(user) = self.get_user(id)? {
                users.push(user);
            }
        }
        Ok(users)
    }

    fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
        Ok(UserRecord {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    // ========================================================================
    // PIN OPERATIONS
    // ========================================================================

    /// Insert a new pin row
    #[allow(clippy::too_many_arguments)]
    pub fn insert_pin(
        &self,
        id: &str,
        owner_id: &str,
        title: &str,
        description: &str,
        latitude: f64,
        longitude: f64,
        privacy: &str,
    ) -> Result<()> {
        let conn = self.conn.lock();
        let now = crate::time::now_timestamp();

        conn.execute(
            "INSERT INTO pins (id, owner_id, title, description, latitude, longitude, privacy, media_count, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)",
            params![id, owner_id, title, description, latitude, longitude, privacy, now],
        )
        .map_err(|e| Error::Storage(format!("Failed to insert pin: {}", e)))?;

        Ok(())
    }

    /// Columns selected for every pin query, with engagement counts attached
    const PIN_COLUMNS: &'static str =
        "p.id, p.owner_id, p.title, p.description, p.latitude, p.longitude, p.privacy, p.media_count,
         (SELECT COUNT(*) FROM pin_likes l WHERE l.pin_id = p.id),
         (SELECT COUNT(*) FROM comments c WHERE c.pin_id = p.id),
         p.created_at";

    /// Get a pin by id
    pub fn get_pin(&self, id: &str) -> Result<Option<PinRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            &format!("SELECT {} FROM pins p WHERE p.id = ?", Self::PIN_COLUMNS),
            params![id],
            Self::map_pin_row,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::Storage(format!("Failed to get pin: {}", e))),
        }
    }

    /// Get every pin, newest first
    pub fn get_all_pins(&self) -> Result<Vec<PinRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM pins p ORDER BY p.created_at DESC, p.rowid DESC",
                Self::PIN_COLUMNS
            ))
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], Self::map_pin_row)
            .map_err(|e| Error::Storage(format!("Failed to query pins: {}", e)))?;

        let mut pins = Vec::new();
        for row in rows {
            pins.push(row.map_err(|e| Error::Storage(e.to_string()))?);
        }
        Ok(pins)
    }

    /// Get one owner's pins, newest first
    pub fn get_pins_by_owner(&self, owner_id: &str) -> Result<Vec<PinRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM pins p WHERE p.owner_id = ? ORDER BY p.created_at DESC, p.rowid DESC",
                Self::PIN_COLUMNS
            ))
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![owner_id], Self::map_pin_row)
            .map_err(|e| Error::Storage(format!("Failed to query pins: {}", e)))?;

        let mut pins = Vec::new();
        for row in rows {
            pins.push(row.map_err(|e| Error::Storage(e.to_string()))?);
        }
        Ok(pins)
    }

    /// Substring search over public pins, newest first
    pub fn search_public_pins(&self, query: &str, limit: usize) -> Result<Vec<PinRecord>> {
        let conn = self.conn.lock();
        let pattern = format!("%{}%", query);

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM pins p
                 WHERE p.privacy = 'public' AND (p.title LIKE ?1 OR p.description LIKE ?1)
                 ORDER BY p.created_at DESC, p.rowid DESC
                 LIMIT ?2",
                Self::PIN_COLUMNS
            ))
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![pattern, limit as i64], Self::map_pin_row)
            .map_err(|e| Error::Storage(format!("Failed to search pins: {}", e)))?;

        let mut pins = Vec::new();
        for row in rows {
            pins.push(row.map_err(|e| Error::Storage(e.to_string()))?);
        }
        Ok(pins)
    }

    /// Delete a pin and everything hanging off it
    ///
    /// Media, likes, and comments go in the same transaction as the pin
    /// row, so a reader can never observe an orphaned attachment.
    pub fn delete_pin(&self, pin_id: &str) -> Result<bool> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Storage(format!("Failed to start transaction: {}", e)))?;

        tx.execute("DELETE FROM media WHERE pin_id = ?", params![pin_id])
            .map_err(|e| Error::Storage(format!("Failed to delete pin media: {}", e)))?;
        tx.execute("DELETE FROM pin_likes WHERE pin_id = ?", params![pin_id])
            .map_err(|e| Error::Storage(format!("Failed to delete pin likes: {}", e)))?;
        tx.execute("DELETE FROM comments WHERE pin_id = ?", params![pin_id])
            .map_err(|e| Error::Storage(format!("Failed to delete pin comments: {}", e)))?;
        let deleted = tx
            .execute("DELETE FROM pins WHERE id = ?", params![pin_id])
            .map_err(|e| Error::Storage(format!("Failed to delete pin: {}", e)))?;

        tx.commit()
            .map_err(|e| Error::Storage(format!("Failed to commit pin deletion: {}", e)))?;

        Ok(deleted > 0)
    }

    /// Backdate a pin, for exercising age-sensitive ranking
    #[cfg(test)]
    pub fn set_pin_created_at(&self, pin_id: &str, created_at: i64) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "UPDATE pins SET created_at = ? WHERE id = ?",
            params![created_at, pin_id],
        )
        .map_err(|e| Error::Storage(format!("Failed to backdate pin: {}", e)))?;

        Ok(())
    }

    fn map_pin_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PinRecord> {
        Ok(PinRecord {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            latitude: row.get(4)?,
            longitude: row.get(5)?,
            privacy: row.get(6)?,
            media_count: row.get(7)?,
            like_count: row.get(8)?,
            comment_count: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    // ========================================================================
    // LIKE OPERATIONS
    // ========================================================================

    /// Add a like; returns false if the user already liked the pin
    pub fn add_like(&self, pin_id: &str, user_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let now = crate::time::now_timestamp();

        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO pin_likes (pin_id, user_id, created_at) VALUES (?, ?, ?)",
                params![pin_id, user_id, now],
            )
            .map_err(|e| Error::Storage(format!("Failed to add like: {}", e)))?;

        Ok(inserted > 0)
    }

    /// Remove a like; returns false if there was none
    pub fn remove_like(&self, pin_id: &str, user_id: &str) -> Result<bool> {
        let conn = self.conn.lock();

        let removed = conn
            .execute(
                "DELETE FROM pin_likes WHERE pin_id = ? AND user_id = ?",
                params![pin_id, user_id],
            )
            .map_err(|e| Error::Storage(format!("Failed to remove like: {}", e)))?;

        Ok(removed > 0)
    }

    /// Ids of everyone who liked a pin, in like order
    pub fn get_likes(&self, pin_id: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT user_id FROM pin_likes WHERE pin_id = ? ORDER BY created_at, rowid")
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![pin_id], |row| row.get::<_, String>(0))
            .map_err(|e| Error::Storage(format!("Failed to query likes: {}", e)))?;

        let mut likes = Vec::new();
        for row in rows {
            likes.push(row.map_err(|e| Error::Storage(e.to_string()))?);
        }
        Ok(likes)
    }

    /// Number of likes on a pin
    pub fn count_likes(&self, pin_id: &str) -> Result<i64> {
        let conn = self.conn.lock();

        conn.query_row(
            "SELECT COUNT(*) FROM pin_likes WHERE pin_id = ?",
            params![pin_id],
            |row| row.get(0),
        )
        .map_err(|e| Error::Storage(format!("Failed to count likes: {}", e)))
    }

    // ========================================================================
    // COMMENT OPERATIONS
    // ========================================================================

    /// Append a comment to a pin
    pub fn insert_comment(
        &self,
        id: &str,
        pin_id: &str,
        author_id: &str,
        author_username: &str,
        text: &str,
    ) -> Result<()> {
        let conn = self.conn.lock();
        let now = crate::time::now_timestamp();

        conn.execute(
            "INSERT INTO comments (id, pin_id, author_id, author_username, text, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![id, pin_id, author_id, author_username, text, now],
        )
        .map_err(|e| Error::Storage(format!("Failed to insert comment: {}", e)))?;

        Ok(())
    }

    /// Get a comment by id
    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT id, pin_id, author_id, author_username, text, created_at
             FROM comments WHERE id = ?",
            params![id],
            |row| {
                Ok(CommentRecord {
                    id: row.get(0)?,
                    pin_id: row.get(1)?,
                    author_id: row.get(2)?,
                    author_username: row.get(3)?,
                    text: row.get(4)?,
                    created_at: row.get(5)?,
                })
            },
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::Storage(format!("Failed to get comment: {}", e))),
        }
    }

    /// A pin's comments in insertion order
    pub fn get_comments(&self, pin_id: &str) -> Result<Vec<CommentRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                "SELECT id, pin_id, author_id, author_username, text, created_at
                 FROM comments WHERE pin_id = ? ORDER BY created_at, rowid",
            )
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![pin_id], |row| {
                Ok(CommentRecord {
                    id: row.get(0)?,
                    pin_id: row.get(1)?,
                    author_id: row.get(2)?,
                    author_username: row.get(3)?,
                    text: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })
            .map_err(|e| Error::Storage(format!("Failed to query comments: {}", e)))?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(row.map_err(|e| Error::Storage(e.to_string()))?);
        }
        Ok(comments)
    }

    /// Number of comments on a pin
    pub fn count_comments(&self, pin_id: &str) -> Result<i64> {
        let conn = self.conn.lock();

        conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE pin_id = ?",
            params![pin_id],
            |row| row.get(0),
        )
        .map_err(|e| Error::Storage(format!("Failed to count comments: {}", e)))
    }

    // ========================================================================
    // MEDIA OPERATIONS
    // ========================================================================

    /// Insert a media attachment and bump the pin's media count
    pub fn insert_media(
        &self,
        id: &str,
        pin_id: &str,
        owner_id: &str,
        media_type: &str,
        caption: Option<&str>,
        payload: &[u8],
    ) -> Result<()> {
        let mut conn = self.conn.lock();
        let now = crate::time::now_timestamp();

        let tx = conn
            .transaction()
            .map_err(|e| Error::Storage(format!("Failed to start transaction: {}", e)))?;

        tx.execute(
            "INSERT INTO media (id, pin_id, owner_id, media_type, caption, payload, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![id, pin_id, owner_id, media_type, caption, payload, now],
        )
        .map_err(|e| Error::Storage(format!("Failed to insert media: {}", e)))?;

        tx.execute(
            "UPDATE pins SET media_count = media_count + 1 WHERE id = ?",
            params![pin_id],
        )
        .map_err(|e| Error::Storage(format!("Failed to update media count: {}", e)))?;

        tx.commit()
            .map_err(|e| Error::Storage(format!("Failed to commit media insert: {}", e)))?;

        Ok(())
    }

    /// Get media metadata by id (payload excluded; see [`Self::get_media_payload`])
    pub fn get_media(&self, id: &str) -> Result<Option<MediaRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT id, pin_id, owner_id, media_type, caption, length(payload), created_at
             FROM media WHERE id = ?",
            params![id],
            Self::map_media_row,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::Storage(format!("Failed to get media: {}", e))),
        }
    }

    /// Get the raw payload bytes of one media attachment
    pub fn get_media_payload(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT payload FROM media WHERE id = ?",
            params![id],
            |row| row.get::<_, Vec<u8>>(0),
        );

        match result {
            Ok(payload) => Ok(Some(payload)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::Storage(format!("Failed to get media payload: {}", e))),
        }
    }

    /// Metadata for all of a pin's attachments, oldest first
    pub fn get_media_for_pin(&self, pin_id: &str) -> Result<Vec<MediaRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                "SELECT id, pin_id, owner_id, media_type, caption, length(payload), created_at
                 FROM media WHERE pin_id = ? ORDER BY created_at, rowid",
            )
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![pin_id], Self::map_media_row)
            .map_err(|e| Error::Storage(format!("Failed to query media: {}", e)))?;

        let mut media = Vec::new();
        for row in rows {
            media.push(row.map_err(|e| Error::Storage(e.to_string()))?);
        }
        Ok(media)
    }

    /// Delete one media attachment and drop the pin's media count
    pub fn delete_media(&self, id: &str, pin_id: &str) -> Result<bool> {
        let mut conn = self.conn.lock();

        let tx = conn
            .transaction()
            .map_err(|e| Error::Storage(format!("Failed to start transaction: {}", e)))?;

        let deleted = tx
            .execute("DELETE FROM media WHERE id = ?", params![id])
            .map_err(|e| Error::Storage(format!("Failed to delete media: {}", e)))?;

        if deleted == 0 {
            return Ok(false);
        }

        tx.execute(
            "UPDATE pins SET media_count = media_count - 1 WHERE id = ? AND media_count > 0",
            params![pin_id],
        )
        .map_err(|e| Error::Storage(format!("Failed to update media count: {}", e)))?;

        tx.commit()
            .map_err(|e| Error::Storage(format!("Failed to commit media deletion: {}", e)))?;

        Ok(true)
    }

    fn map_media_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MediaRecord> {
        Ok(MediaRecord {
            id: row.get(0)?,
            pin_id: row.get(1)?,
            owner_id: row.get(2)?,
            media_type: row.get(3)?,
            caption: row.get(4)?,
            size_bytes: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    // ========================================================================
    // FRIEND REQUEST OPERATIONS
    // ========================================================================

    /// Record a new pending friend request
    pub fn insert_friend_request(&self, id: &str, requester_id: &str, target_id: &str) -> Result<()> {
        let conn = self.conn.lock();
        let now = crate::time::now_timestamp();

        conn.execute(
            "INSERT INTO friend_requests (id, requester_id, target_id, status, created_at)
             VALUES (?, ?, ?, 'pending', ?)",
            params![id, requester_id, target_id, now],
        )
        .map_err(|e| Error::Storage(format!("Failed to insert friend request: {}", e)))?;

        Ok(())
    }

    /// The pending request from one user to another, if any (directional)
    pub fn get_pending_request(
        &self,
        requester_id: &str,
        target_id: &str,
    ) -> Result<Option<FriendRequestRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT id, requester_id, target_id, status, created_at, responded_at
             FROM friend_requests
             WHERE requester_id = ? AND target_id = ? AND status = 'pending'",
            params![requester_id, target_id],
            Self::map_request_row,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::Storage(format!("Failed to get friend request: {}", e))),
        }
    }

    /// Whether a pending request exists between two users, in either direction
    pub fn has_pending_request_between(&self, a: &str, b: &str) -> Result<bool> {
        let conn = self.conn.lock();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM friend_requests
                 WHERE status = 'pending'
                   AND ((requester_id = ?1 AND target_id = ?2) OR (requester_id = ?2 AND target_id = ?1))",
                params![a, b],
                |row| row.get(0),
            )
            .map_err(|e| Error::Storage(format!("Failed to check pending requests: {}", e)))?;

        Ok(count > 0)
    }

    /// Accept a pending friend request
    ///
    /// One transaction flips the request row to 'accepted' and inserts the
    /// two mirrored friendship edges. The status guard in the UPDATE makes
    /// concurrent double-accept resolve to exactly one winner; the loser
    /// sees `Ok(false)` and no partial state.
    pub fn accept_friend_request(&self, requester_id: &str, accepter_id: &str) -> Result<bool> {
        let mut conn = self.conn.lock();
        let now = crate::time::now_timestamp();

        let tx = conn
            .transaction()
            .map_err(|e| Error::Storage(format!("Failed to start transaction: {}", e)))?;

        let updated = tx
            .execute(
                "UPDATE friend_requests SET status = 'accepted', responded_at = ?
                 WHERE requester_id = ? AND target_id = ? AND status = 'pending'",
                params![now, requester_id, accepter_id],
            )
            .map_err(|e| Error::Storage(format!("Failed to update friend request: {}", e)))?;

        if updated == 0 {
            // Nothing pending; dropping the transaction rolls back
            return Ok(false);
        }

        tx.execute(
            "INSERT OR IGNORE INTO friendships (user_id, friend_id, created_at) VALUES (?, ?, ?)",
            params![requester_id, accepter_id, now],
        )
        .map_err(|e| Error::Storage(format!("Failed to insert friendship edge: {}", e)))?;

        tx.execute(
            "INSERT OR IGNORE INTO friendships (user_id, friend_id, created_at) VALUES (?, ?, ?)",
            params![accepter_id, requester_id, now],
        )
        .map_err(|e| Error::Storage(format!("Failed to insert friendship edge: {}", e)))?;

        tx.commit()
            .map_err(|e| Error::Storage(format!("Failed to commit accept: {}", e)))?;

        Ok(true)
    }

    /// Pending requests addressed to a user (incoming)
    pub fn get_pending_requests_for(&self, target_id: &str) -> Result<Vec<FriendRequestRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                "SELECT id, requester_id, target_id, status, created_at, responded_at
                 FROM friend_requests
                 WHERE target_id = ? AND status = 'pending'
                 ORDER BY created_at, rowid",
            )
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![target_id], Self::map_request_row)
            .map_err(|e| Error::Storage(format!("Failed to query friend requests: {}", e)))?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row.map_err(|e| Error::Storage(e.to_string()))?);
        }
        Ok(requests)
    }

    /// Pending requests a user has sent (outgoing)
    pub fn get_pending_requests_from(&self, requester_id: &str) -> Result<Vec<FriendRequestRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                "SELECT id, requester_id, target_id, status, created_at, responded_at
                 FROM friend_requests
                 WHERE requester_id = ? AND status = 'pending'
                 ORDER BY created_at, rowid",
            )
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![requester_id], Self::map_request_row)
            .map_err(|e| Error::Storage(format!("Failed to query friend requests: {}", e)))?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row.map_err(|e| Error::Storage(e.to_string()))?);
        }
        Ok(requests)
    }

    fn map_request_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FriendRequestRecord> {
        Ok(FriendRequestRecord {
            id: row.get(0)?,
            requester_id: row.get(1)?,
            target_id: row.get(2)?,
            status: row.get(3)?,
            created_at: row.get(4)?,
            responded_at: row.get(5)?,
        })
    }

    // ========================================================================
    // FRIENDSHIP OPERATIONS
    // ========================================================================

    /// Whether a friendship edge exists from one user to another
    ///
    /// Edges are mirrored, so one direction answers for the pair.
    pub fn friendship_exists(&self, user_id: &str, friend_id: &str) -> Result<bool> {
        let conn = self.conn.lock();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM friendships WHERE user_id = ? AND friend_id = ?",
                params![user_id, friend_id],
                |row| row.get(0),
            )
            .map_err(|e| Error::Storage(format!("Failed to check friendship: {}", e)))?;

        Ok(count > 0)
    }

    /// Ids of all of a user's friends, oldest friendship first
    pub fn get_friend_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT friend_id FROM friendships WHERE user_id = ? ORDER BY created_at, rowid")
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![user_id], |row| row.get::<_, String>(0))
            .map_err(|e| Error::Storage(format!("Failed to query friendships: {}", e)))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row.map_err(|e| Error::Storage(e.to_string()))?);
        }
        Ok(ids)
    }

    // ========================================================================
    // EVENT OPERATIONS
    // ========================================================================

    /// Insert a new event row
    #[allow(clippy::too_many_arguments)]
    pub fn insert_event(
        &self,
        id: &str,
        owner_id: &str,
        title: &str,
        description: &str,
        event_date: i64,
        latitude: f64,
        longitude: f64,
        location_name: &str,
        privacy: &str,
    ) -> Result<()> {
        let conn = self.conn.lock();
        let now = crate::time::now_timestamp();

        conn.execute(
            "INSERT INTO events (id, owner_id, title, description, event_date, latitude, longitude, location_name, privacy, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![id, owner_id, title, description, event_date, latitude, longitude, location_name, privacy, now],
        )
        .map_err(|e| Error::Storage(format!("Failed to insert event: {}", e)))?;

        Ok(())
    }

    /// Columns selected for every event query, with the attendee count attached
    const EVENT_COLUMNS: &'static str =
        "e.id, e.owner_id, e.title, e.description, e.event_date, e.latitude, e.longitude, e.location_name, e.privacy,
         (SELECT COUNT(*) FROM event_attendees a WHERE a.event_id = e.id),
         e.created_at";

    /// Get an event by id
    pub fn get_event(&self, id: &str) -> Result<Option<EventRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            &format!("SELECT {} FROM events e WHERE e.id = ?", Self::EVENT_COLUMNS),
            params![id],
            Self::map_event_row,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::Storage(format!("Failed to get event: {}", e))),
        }
    }

    /// Every event, soonest event date first
    pub fn get_all_events(&self) -> Result<Vec<EventRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM events e ORDER BY e.event_date, e.rowid",
                Self::EVENT_COLUMNS
            ))
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], Self::map_event_row)
            .map_err(|e| Error::Storage(format!("Failed to query events: {}", e)))?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row.map_err(|e| Error::Storage(e.to_string()))?);
        }
        Ok(events)
    }

    /// Substring search over public events, soonest first
    pub fn search_public_events(&self, query: &str, limit: usize) -> Result<Vec<EventRecord>> {
        let conn = self.conn.lock();
        let pattern = format!("%{}%", query);

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM events e
                 WHERE e.privacy = 'public'
                   AND (e.title LIKE ?1 OR e.description LIKE ?1 OR e.location_name LIKE ?1)
                 ORDER BY e.event_date, e.rowid
                 LIMIT ?2",
                Self::EVENT_COLUMNS
            ))
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![pattern, limit as i64], Self::map_event_row)
            .map_err(|e| Error::Storage(format!("Failed to search events: {}", e)))?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row.map_err(|e| Error::Storage(e.to_string()))?);
        }
        Ok(events)
    }

    /// Add an attendee; returns false if already attending
    pub fn add_attendee(&self, event_id: &str, user_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let now = crate::time::now_timestamp();

        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO event_attendees (event_id, user_id, created_at) VALUES (?, ?, ?)",
                params![event_id, user_id, now],
            )
            .map_err(|e| Error::Storage(format!("Failed to add attendee: {}", e)))?;

        Ok(inserted > 0)
    }

    /// Remove an attendee; returns false if they were not attending
    pub fn remove_attendee(&self, event_id: &str, user_id: &str) -> Result<bool> {
        let conn = self.conn.lock();

        let removed = conn
            .execute(
                "DELETE FROM event_attendees WHERE event_id = ? AND user_id = ?",
                params![event_id, user_id],
            )
            .map_err(|e| Error::Storage(format!("Failed to remove attendee: {}", e)))?;

        Ok(removed > 0)
    }

    /// Ids of everyone attending an event, in join order
    pub fn get_attendees(&self, event_id: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                "SELECT user_id FROM event_attendees WHERE event_id = ? ORDER BY created_at, rowid",
            )
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![event_id], |row| row.get::<_, String>(0))
            .map_err(|e| Error::Storage(format!("Failed to query attendees: {}", e)))?;

        let mut attendees = Vec::new();
        for row in rows {
            attendees.push(row.map_err(|e| Error::Storage(e.to_string()))?);
        }
        Ok(attendees)
    }

    /// Count attendees for an event
    pub fn count_attendees(&self, event_id: &str) -> Result<i64> {
        let conn = self.conn.lock();

        conn.query_row(
            "SELECT COUNT(*) FROM event_attendees WHERE event_id = ?",
            params![event_id],
            |row| row.get(0),
        )
        .map_err(|e| Error::Storage(format!("Failed to count attendees: {}", e)))
    }

    fn map_event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRecord> {
        Ok(EventRecord {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            event_date: row.get(4)?,
            latitude: row.get(5)?,
            longitude: row.get(6)?,
            location_name: row.get(7)?,
            privacy: row.get(8)?,
            attendee_count: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    // ========================================================================
    // MESSAGE OPERATIONS
    // ========================================================================

    /// Store a direct message
    pub fn insert_message(
        &self,
        id: &str,
        sender_id: &str,
        recipient_id: &str,
        content: &str,
    ) -> Result<()> {
        let conn = self.conn.lock();
        let now = crate::time::now_timestamp();

        conn.execute(
            "INSERT INTO messages (id, sender_id, recipient_id, content, read, created_at)
             VALUES (?, ?, ?, ?, 0, ?)",
            params![id, sender_id, recipient_id, content, now],
        )
        .map_err(|e| Error::Storage(format!("Failed to insert message: {}", e)))?;

        Ok(())
    }

    /// Get a message by id
    pub fn get_message(&self, id: &str) -> Result<Option<MessageRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT id, sender_id, recipient_id, content, read, created_at
             FROM messages WHERE id = ?",
            params![id],
            Self::map_message_row,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::Storage(format!("Failed to get message: {}", e))),
        }
    }

    /// Both directions of a two-user thread, chronological
    pub fn get_messages_between(&self, a: &str, b: &str) -> Result<Vec<MessageRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                "SELECT id, sender_id, recipient_id, content, read, created_at
                 FROM messages
                 WHERE (sender_id = ?1 AND recipient_id = ?2) OR (sender_id = ?2 AND recipient_id = ?1)
                 ORDER BY created_at, rowid",
            )
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![a, b], Self::map_message_row)
            .map_err(|e| Error::Storage(format!("Failed to query messages: {}", e)))?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row.map_err(|e| Error::Storage(e.to_string()))?);
        }
        Ok(messages)
    }

    /// Every message a user sent or received, newest first
    pub fn get_messages_involving(&self, user_id: &str) -> Result<Vec<MessageRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                "SELECT id, sender_id, recipient_id, content, read, created_at
                 FROM messages
                 WHERE sender_id = ?1 OR recipient_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )
            .map_err(|e| Error::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![user_id], Self::map_message_row)
            .map_err(|e| Error::Storage(format!("Failed to query messages: {}", e)))?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row.map_err(|e| Error::Storage(e.to_string()))?);
        }
        Ok(messages)
    }

    /// Unread messages a partner has sent to the viewer
    pub fn count_unread_from(&self, viewer_id: &str, partner_id: &str) -> Result<i64> {
        let conn = self.conn.lock();

        conn.query_row(
            "SELECT COUNT(*) FROM messages
             WHERE recipient_id = ? AND sender_id = ? AND read = 0",
            params![viewer_id, partner_id],
            |row| row.get(0),
        )
        .map_err(|e| Error::Storage(format!("Failed to count unread messages: {}", e)))
    }

    /// Mark a partner's messages to the viewer as read; returns how many flipped
    pub fn mark_messages_read(&self, viewer_id: &str, partner_id: &str) -> Result<usize> {
        let conn = self.conn.lock();

        let updated = conn
            .execute(
                "UPDATE messages SET read = 1
                 WHERE recipient_id = ? AND sender_id = ? AND read = 0",
                params![viewer_id, partner_id],
            )
            .map_err(|e| Error::Storage(format!("Failed to mark messages read: {}", e)))?;

        Ok(updated)
    }

    fn map_message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRecord> {
        Ok(MessageRecord {
            id: row.get(0)?,
            sender_id: row.get(1)?,
            recipient_id: row.get(2)?,
            content: row.get(3)?,
            read: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

// ============================================================================
// RECORD TYPES
// ============================================================================

/// A user row from the database
///
/// Carries the password hash; services strip it before anything leaves
/// the crate.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// User ID (uuid v4)
    pub id: String,
    /// Unique handle
    pub username: String,
    /// Unique login address
    pub email: String,
    /// bcrypt hash
    pub password_hash: String,
    /// Registration timestamp
    pub created_at: i64,
}

/// A pin row from the database
#[derive(Debug, Clone)]
pub struct PinRecord {
    /// Pin ID (uuid v4)
    pub id: String,
    /// The creator
    pub owner_id: String,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// 'public', 'friends', or 'private'
    pub privacy: String,
    /// Number of attached media rows
    pub media_count: i64,
    /// Likes on this pin (computed at query time)
    pub like_count: i64,
    /// Comments on this pin (computed at query time)
    pub comment_count: i64,
    /// Creation timestamp
    pub created_at: i64,
}

/// A comment row from the database
#[derive(Debug, Clone)]
pub struct CommentRecord {
    /// Comment ID (uuid v4)
    pub id: String,
    /// Parent pin
    pub pin_id: String,
    /// Who wrote it
    pub author_id: String,
    /// Denormalized display handle
    pub author_username: String,
    /// Comment body
    pub text: String,
    /// Creation timestamp
    pub created_at: i64,
}

/// A media metadata row (payload fetched separately)
#[derive(Debug, Clone)]
pub struct MediaRecord {
    /// Media ID (uuid v4)
    pub id: String,
    /// Parent pin
    pub pin_id: String,
    /// Who uploaded it
    pub owner_id: String,
    /// 'photo' or 'video'
    pub media_type: String,
    /// Optional caption
    pub caption: Option<String>,
    /// Payload size in bytes
    pub size_bytes: i64,
    /// Upload timestamp
    pub created_at: i64,
}

/// A friend request row from the database
#[derive(Debug, Clone)]
pub struct FriendRequestRecord {
    /// Request ID (uuid v4)
    pub id: String,
    /// Who asked
    pub requester_id: String,
    /// Who was asked
    pub target_id: String,
    /// 'pending' or 'accepted'
    pub status: String,
    /// When the request was sent
    pub created_at: i64,
    /// When it was answered, if it has been
    pub responded_at: Option<i64>,
}

/// An event row from the database
#[derive(Debug, Clone)]
pub struct EventRecord {
    /// Event ID (uuid v4)
    pub id: String,
    /// The organizer
    pub owner_id: String,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// When the event takes place (Unix seconds)
    pub event_date: i64,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Human-readable venue name
    pub location_name: String,
    /// 'public', 'friends', or 'private'
    pub privacy: String,
    /// Attendee count (computed at query time)
    pub attendee_count: i64,
    /// Creation timestamp
    pub created_at: i64,
}

/// A direct message row from the database
#[derive(Debug, Clone)]
pub struct MessageRecord {
    /// Message ID (uuid v4)
    pub id: String,
    /// Who sent it
    pub sender_id: String,
    /// Who it was sent to
    pub recipient_id: String,
    /// Message body
    pub content: String,
    /// Whether the recipient has read it
    pub read: bool,
    /// Send timestamp
    pub created_at: i64,
}

// ============================================================================
// TESTS
// ============================================================================
