//! # Storage Module
//!
//! SQLite-backed local storage for MapMoments data.
//!
//! ## Storage Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         STORAGE SYSTEM                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SQLite Database                                                │   │
//! │  │  ───────────────                                                 │   │
//! │  │                                                                 │   │
//! │  │  Tables:                                                       │   │
//! │  │  • users - Accounts, bcrypt password hashes, profile photos   │   │
//! │  │  • pins - Mapped moments with coordinates and privacy         │   │
//! │  │  • pin_likes / comments / media - Pin engagement              │   │
//! │  │  • friend_requests - Pending and accepted requests            │   │
//! │  │  • friendships - Mirrored directed edges                      │   │
//! │  │  • events / event_attendees - Planned gatherings              │   │
//! │  │  • messages - Direct messages with read flags                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  One connection behind a mutex. Multi-row writes (friendship           │
//! │  accept, pin deletion) run inside SQLite transactions so readers       │
//! │  never observe half-applied state.                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod database;
mod schema;

pub use database::{
    Database, DatabaseConfig, UserRecord, PinRecord, CommentRecord, MediaRecord,
    FriendRequestRecord, EventRecord, MessageRecord,
};

use crate::error::Result;

/// Storage configuration
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// Path to the database file (None for in-memory)
    pub database_path: Option<String>,
}

/// Initialize the storage system
pub async fn init(config: StorageConfig) -> Result<Database> {
    Database::open(config.database_path.as_deref()).await
}
