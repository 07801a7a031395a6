//! # MapMoments Core
//!
//! A social map library: users drop pins at real-world coordinates, share
//! them with friends under per-pin privacy tiers, and find each other's
//! moments through trending and proximity discovery.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       MAPMOMENTS CORE MODULES                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │    Users    │  │   Friends   │  │    Pins     │  │    Events    │   │
//! │  │             │  │             │  │             │  │              │   │
//! │  │ - Register  │  │ - Requests  │  │ - Create    │  │ - Create     │   │
//! │  │ - Login     │  │ - Accept    │  │ - Likes     │  │ - Attend     │   │
//! │  │ - Profiles  │  │ - Symmetry  │  │ - Media     │  │ - Search     │   │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └──────┬───────┘   │
//! │         │                │                │                │           │
//! │         └────────────────┴────────────────┴────────────────┘           │
//! │                                   │                                     │
//! │  ┌─────────────┐  ┌─────────────┐ │ ┌─────────────────────────────────┐│
//! │  │  Discovery  │  │  Messaging  │ │ │           Storage               ││
//! │  │             │  │             │ │ │                                 ││
//! │  │ - Trending  │  │ - Threads   │◄┘ │ - SQLite (bundled)             ││
//! │  │ - Nearby    │  │ - Unread    │   │ - Schema versioning            ││
//! │  │ - Haversine │  │ - Friends   │   │ - Transactional cascades       ││
//! │  └─────────────┘  └─────────────┘   └─────────────────────────────────┘│
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`geo`] - Coordinate validation and haversine distance
//! - [`time`] - Timestamp helpers shared by services
//! - [`storage`] - SQLite persistence (rows in, rows out)
//! - [`users`] - Accounts, credentials, profile photos
//! - [`friends`] - Friend requests and the symmetric friendship graph
//! - [`pins`] - Pins with privacy tiers, likes, comments, media
//! - [`events`] - Scheduled gatherings with attendance
//! - [`messaging`] - Direct messages between friends
//! - [`discovery`] - Trending and nearby ranking over visible pins
//!
//! ## Visibility Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         VISIBILITY TIERS                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  public    visible to any authenticated user                            │
//! │  friends   visible to the owner and accepted friends only               │
//! │  private   visible to the owner only                                    │
//! │                                                                         │
//! │  One predicate governs everything: a pin, its likes, comments, and      │
//! │  media, and events all answer to the same three-tier rule. Hidden       │
//! │  content looks exactly like missing content from the outside.           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod discovery;
pub mod error;
pub mod events;
pub mod friends;
pub mod geo;
pub mod messaging;
pub mod pins;
pub mod storage;
pub mod time;
pub mod users;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use discovery::{DiscoveryService, NearbyPin};
pub use error::{Error, Result};
pub use events::{Event, EventService};
pub use friends::{FriendRequest, FriendsService, RequestStatus};
pub use messaging::{Conversation, Message, MessageService};
pub use pins::{Media, Pin, PinService, Privacy};
pub use storage::Database;
pub use users::{User, UserService};

// ============================================================================
// CORE HANDLE
// ============================================================================

use std::sync::Arc;

/// Configuration for opening a MapMoments core
#[derive(Debug, Clone, Default)]
pub struct CoreConfig {
    /// Database file path; `None` opens an in-memory database
    pub database_path: Option<String>,
}

/// The main handle wiring every service to one shared database
///
/// ## Lifecycle
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                      MAPMOMENTS CORE LIFECYCLE                          │
/// ├─────────────────────────────────────────────────────────────────────────┤
/// │                                                                         │
/// │  1. Open                                                                │
/// │     MapMomentsCore::open(config)                                        │
/// │       └─► open SQLite, create or migrate the schema                     │
/// │                                                                         │
/// │  2. Accounts                                                            │
/// │     core.users().register(...) / authenticate(...)                      │
/// │                                                                         │
/// │  3. Operations                                                          │
/// │     core.pins(), core.friends(), core.events(),                         │
/// │     core.messaging(), core.discovery()                                  │
/// │       └─► cheap handles over the shared database, one per call          │
/// │                                                                         │
/// │  4. Drop                                                                │
/// │     the connection closes with the last handle                          │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub struct MapMomentsCore {
    /// Shared database every service hangs off
    database: Arc<Database>,
}

impl MapMomentsCore {
    /// Open the core, creating or migrating the database as needed
    pub async fn open(config: CoreConfig) -> Result<Self> {
        tracing::info!("Opening MapMoments core v{}", env!("CARGO_PKG_VERSION"));

        let database = storage::init(storage::StorageConfig {
            database_path: config.database_path,
        })
        .await?;

        Ok(Self {
            database: Arc::new(database),
        })
    }

    /// The shared database handle
    pub fn database(&self) -> Arc<Database> {
        self.database.clone()
    }

    /// Account management
    pub fn users(&self) -> UserService {
        UserService::new(self.database.clone())
    }

    /// Friend requests and the friendship graph
    pub fn friends(&self) -> FriendsService {
        FriendsService::new(self.database.clone())
    }

    /// Pins, likes, comments, and media
    pub fn pins(&self) -> PinService {
        PinService::new(self.database.clone())
    }

    /// Events and attendance
    pub fn events(&self) -> EventService {
        EventService::new(self.database.clone())
    }

    /// Direct messages between friends
    pub fn messaging(&self) -> MessageService {
        MessageService::new(self.database.clone())
    }

    /// Trending and nearby ranking
    pub fn discovery(&self) -> DiscoveryService {
        DiscoveryService::new(self.database.clone())
    }
}

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of MapMoments Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================
