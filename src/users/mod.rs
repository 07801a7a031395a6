//! # Users Module
//!
//! Account registration, credential verification, lookup, and profile photos.
//!
//! ## Account Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ACCOUNT LIFECYCLE                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  register(username, email, password)                                   │
//! │      │                                                                  │
//! │      ├── validate: non-empty username/password, email shape            │
//! │      ├── reject taken username or email                                │
//! │      └── store bcrypt hash, never the password                         │
//! │                                                                         │
//! │  authenticate(email, password)                                         │
//! │      │                                                                  │
//! │      └── bcrypt verify ──► User (hash stripped)                        │
//! │                                                                         │
//! │  Session/token issuance happens in the calling service layer; this     │
//! │  module only answers "are these credentials right".                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::{Database, UserRecord};

/// Maximum number of results returned by user search
pub const SEARCH_LIMIT: usize = 20;

/// Maximum accepted profile photo size (5 MiB)
pub const MAX_PROFILE_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// A user account, safe to hand outside the crate
///
/// The stored bcrypt hash never leaves the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique ID (uuid v4)
    pub id: String,
    /// Unique handle
    pub username: String,
    /// Unique login address
    pub email: String,
    /// When the account was created (Unix timestamp)
    pub created_at: i64,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email,
            created_at: record.created_at,
        }
    }
}

/// Service for managing user accounts
pub struct UserService {
    /// Database for persistence
    database: Arc<Database>,
}

impl UserService {
    /// Create a new user service
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Register a new account
    pub fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let username = username.trim();
        let email = email.trim().to_lowercase();

        if username.is_empty() {
            return Err(Error::Validation("Username must not be empty".into()));
        }
        if !is_plausible_email(&email) {
            return Err(Error::Validation(format!("Invalid email address: {}", email)));
        }
        if password.is_empty() {
            return Err(Error::Validation("Password must not be empty".into()));
        }

        if self.database.user_exists(username, &email)? {
            return Err(Error::UserExists);
        }

        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| Error::Storage(format!("Failed to hash password: {}", e)))?;

        let id = Uuid::new_v4().to_string();
        self.database.insert_user(&id, username, &email, &hash)?;

        tracing::info!("New user registered: {}", username);

        let record = self
            .database
            .get_user(&id)?
            .ok_or(Error::NotFound("User"))?;
        Ok(User::from(record))
    }

    /// Verify login credentials
    ///
    /// Unknown email and wrong password return the same error, so callers
    /// cannot probe which addresses have accounts.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim().to_lowercase();

        let record = self
            .database
            .get_user_by_email(&email)?
            .ok_or(Error::InvalidCredentials)?;

        let valid = bcrypt::verify(password, &record.password_hash)
            .map_err(|e| Error::Storage(format!("Failed to verify password: {}", e)))?;
        if !valid {
            return Err(Error::InvalidCredentials);
        }

        Ok(User::from(record))
    }

    /// Get a user by id
    pub fn get(&self, user_id: &str) -> Result<User> {
        let record = self
            .database
            .get_user(user_id)?
            .ok_or(Error::NotFound("User"))?;
        Ok(User::from(record))
    }

    /// Search users by username or email substring, excluding the viewer
    pub fn search(&self, viewer_id: &str, query: &str) -> Result<Vec<User>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let records = self.database.search_users(viewer_id, query, SEARCH_LIMIT)?;
        Ok(records.into_iter().map(User::from).collect())
    }

    /// Store a profile photo for a user
    pub fn set_profile_photo(&self, user_id: &str, payload: &[u8]) -> Result<()> {
        if payload.is_empty() {
            return Err(Error::Validation("Profile photo payload is empty".into()));
        }
        if payload.len() > MAX_PROFILE_PHOTO_BYTES {
            return Err(Error::Validation(format!(
                "Profile photo too large: {} bytes (max {})",
                payload.len(),
                MAX_PROFILE_PHOTO_BYTES
            )));
        }

        if !self.database.set_profile_photo(user_id, payload)? {
            return Err(Error::NotFound("User"));
        }

        tracing::info!("Profile photo updated for {}", user_id);
        Ok(())
    }

    /// Get a user's profile photo, if they have set one
    pub fn profile_photo(&self, user_id: &str) -> Result<Option<Vec<u8>>> {
        if self.database.get_user(user_id)?.is_none() {
            return Err(Error::NotFound("User"));
        }
        self.database.get_profile_photo(user_id)
    }
}

/// Minimal email shape check: something before and after a single '@',
/// and a dot in the domain part
fn is_plausible_email(email: &str) -> bool {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

// ============================================================================
// TESTS
// ============================================================================
