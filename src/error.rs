//! # Error Handling
//!
//! This module provides the error types for MapMoments Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Input Errors                                                      │
//! │  │   └── Validation            - Malformed input, caller's fault       │
//! │  │                                                                      │
//! │  ├── Authorization Errors                                              │
//! │  │   ├── Forbidden             - Acting user may not do this           │
//! │  │   └── InvalidCredentials    - Email/password mismatch               │
//! │  │                                                                      │
//! │  ├── Lookup Errors                                                     │
//! │  │   └── NotFound              - Referenced entity absent              │
//! │  │                                                                      │
//! │  ├── Friend Graph Errors                                               │
//! │  │   ├── InvalidTarget         - Request aimed at yourself             │
//! │  │   ├── DuplicateRequest      - Pending request already exists        │
//! │  │   ├── AlreadyFriends        - Friendship already accepted           │
//! │  │   └── NoSuchRequest         - Nothing pending to accept             │
//! │  │                                                                      │
//! │  ├── Account Errors                                                    │
//! │  │   └── UserExists            - Username or email taken               │
//! │  │                                                                      │
//! │  └── Storage Errors                                                    │
//! │      ├── Storage               - Repository failure, surfaced as-is    │
//! │      └── Serialization         - Encoding/decoding failure             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Boundary Mapping
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       ERROR HANDLING FLOW                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Core (Rust)                 Service Layer              Wire (HTTP)    │
//! │  ──────────────────────────────────────────────────────────────────     │
//! │                                                                         │
//! │  Result<T, Error>  ──────►  status_code() + message  ──────►  response │
//! │                              (u16 hint + string)                        │
//! │                                                                         │
//! │  Example:                                                              │
//! │  Err(Error::NotFound("Pin"))  →  { status: 404, message: "..." }       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error is local to a single operation. The core never retries
//! internally and never swallows an error; callers decide presentation.

use thiserror::Error;

/// Result type alias for MapMoments Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for MapMoments Core
///
/// All errors are categorized by domain to make error handling clearer
/// and to give the service layer an unambiguous HTTP mapping.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Input Errors (422)
    // ========================================================================

    /// Malformed input. The caller's fault; never retried.
    #[error("Validation failed: {0}")]
    Validation(String),

    // ========================================================================
    // Authorization Errors (401/403)
    // ========================================================================

    /// The acting user is not allowed to perform this operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Email/password pair did not match any account
    #[error("Invalid email or password.")]
    InvalidCredentials,

    // ========================================================================
    // Lookup Errors (404)
    // ========================================================================

    /// Referenced entity does not exist (or is hidden from the viewer)
    #[error("{0} not found.")]
    NotFound(&'static str),

    // ========================================================================
    // Friend Graph Errors (400)
    // ========================================================================

    /// Cannot send a friend request to yourself
    #[error("Cannot send a friend request to yourself.")]
    InvalidTarget,

    /// A pending request already exists between these users
    #[error("A friend request between these users is already pending.")]
    DuplicateRequest,

    /// The two users are already friends
    #[error("Already friends with this user.")]
    AlreadyFriends,

    /// No pending request to accept
    #[error("No pending friend request from this user.")]
    NoSuchRequest,

    // ========================================================================
    // Account Errors (400)
    // ========================================================================

    /// Username or email is already taken
    #[error("A user with this username or email already exists.")]
    UserExists,

    // ========================================================================
    // Storage Errors (500)
    // ========================================================================

    /// Repository failure, surfaced as-is and never masked
    #[error("Storage error: {0}")]
    Storage(String),

    /// Encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// HTTP status hint for the service layer.
    ///
    /// Status codes by category:
    /// - 422: Validation
    /// - 401: InvalidCredentials
    /// - 403: Forbidden
    /// - 404: NotFound
    /// - 400: Friend graph conflicts, UserExists
    /// - 500: Storage, Serialization
    pub fn status_code(&self) -> u16 {
        match self {
            // Input (422)
            Error::Validation(_) => 422,

            // Authorization (401/403)
            Error::Forbidden(_) => 403,
            Error::InvalidCredentials => 401,

            // Lookup (404)
            Error::NotFound(_) => 404,

            // Friend graph (400)
            Error::InvalidTarget => 400,
            Error::DuplicateRequest => 400,
            Error::AlreadyFriends => 400,
            Error::NoSuchRequest => 400,

            // Account (400)
            Error::UserExists => 400,

            // Storage (500)
            Error::Storage(_) => 500,
            Error::Serialization(_) => 500,
        }
    }

    /// Check if a caller could sensibly retry this operation.
    ///
    /// Only repository failures qualify; everything else is terminal for
    /// the request that produced it. The core itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
