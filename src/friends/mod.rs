//! # Friends Module
//!
//! The friendship graph: requests, acceptance, and symmetric friendship state.
//!
//! ## Friend Request Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      FRIEND REQUEST FLOW                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Alice (Requester)                           Bob (Target)              │
//! │  ─────────────────────────────────────────────────────────────         │
//! │                                                                         │
//! │  send_request(alice, bob)                                              │
//! │  ┌─────────────────────┐                                               │
//! │  │ Checks:             │                                               │
//! │  │ • not self          │                                               │
//! │  │ • target exists     │  ──────────────────────►  pending request    │
//! │  │ • not already       │                           appears in Bob's   │
//! │  │   friends           │                           incoming list      │
//! │  │ • no pending req    │                                               │
//! │  │   either direction  │                                               │
//! │  └─────────────────────┘                                               │
//! │                                                   accept_request(bob,  │
//! │                                                       alice)           │
//! │                                                   ┌──────────────────┐ │
//! │                         ◄──────────────────────── │ ONE transaction: │ │
//! │                                                   │ • request row →  │ │
//! │                                                   │   'accepted'     │ │
//! │                                                   │ • edge a → b     │ │
//! │                                                   │ • edge b → a     │ │
//! │                                                   └──────────────────┘ │
//! │                                                                         │
//! │  State machine per pair: none ──► pending ──► accepted                 │
//! │  (no reject / cancel / unfriend transitions)                           │
//! │                                                                         │
//! │  Friendship is one logical fact held as two mirrored directed rows;    │
//! │  are_friends(a, b) == are_friends(b, a) always.                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::{Database, FriendRequestRecord};
use crate::users::User;

/// Status of a friend request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Waiting for the target to respond
    Pending,
    /// Request was accepted; the pair are friends
    Accepted,
}

impl RequestStatus {
    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "accepted" => Some(RequestStatus::Accepted),
            _ => None,
        }
    }
}

/// A friend request between two users
///
/// Directional while pending; once accepted the resulting friendship is
/// symmetric and the request row only remains as history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequest {
    /// Unique ID (uuid v4)
    pub id: String,
    /// Who sent the request
    pub requester_id: String,
    /// Who it is addressed to
    pub target_id: String,
    /// Current status
    pub status: RequestStatus,
    /// When it was sent (Unix timestamp)
    pub created_at: i64,
    /// When it was accepted, if it has been
    pub responded_at: Option<i64>,
}

impl TryFrom<FriendRequestRecord> for FriendRequest {
    type Error = Error;

    fn try_from(record: FriendRequestRecord) -> Result<Self> {
        let status = RequestStatus::parse(&record.status)
            .ok_or_else(|| Error::Storage(format!("Unknown request status: {}", record.status)))?;
        Ok(Self {
            id: record.id,
            requester_id: record.requester_id,
            target_id: record.target_id,
            status,
            created_at: record.created_at,
            responded_at: record.responded_at,
        })
    }
}

/// Service for managing the friendship graph
pub struct FriendsService {
    /// Database for persistence
    database: Arc<Database>,
}

impl FriendsService {
    /// Create a new friends service
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Send a friend request
    pub fn send_request(&self, requester_id: &str, target_id: &str) -> Result<FriendRequest> {
        if requester_id == target_id {
            return Err(Error::InvalidTarget);
        }

        if self.database.get_user(target_id)?.is_none() {
            return Err(Error::NotFound("User"));
        }

        if self.database.friendship_exists(requester_id, target_id)? {
            return Err(Error::AlreadyFriends);
        }

        // A pending request in either direction blocks a new one
        if self
            .database
            .has_pending_request_between(requester_id, target_id)?
        {
            return Err(Error::DuplicateRequest);
        }

        let id = Uuid::new_v4().to_string();
        self.database
            .insert_friend_request(&id, requester_id, target_id)?;

        tracing::info!("Friend request sent: {} -> {}", requester_id, target_id);

        let record = self
            .database
            .get_pending_request(requester_id, target_id)?
            .ok_or(Error::NoSuchRequest)?;
        FriendRequest::try_from(record)
    }

    /// Accept a pending friend request addressed to `accepter_id`
    ///
    /// The request flip and both mirrored friendship edges commit in one
    /// transaction. If two callers race to accept the same request, exactly
    /// one wins; the other gets [`Error::NoSuchRequest`].
    pub fn accept_request(&self, accepter_id: &str, requester_id: &str) -> Result<()> {
        let accepted = self
            .database
            .accept_friend_request(requester_id, accepter_id)?;

        if !accepted {
            return Err(Error::NoSuchRequest);
        }

        tracing::info!(
            "Friend request accepted: {} and {} are now friends",
            requester_id,
            accepter_id
        );
        Ok(())
    }

    /// Whether two users are friends
    ///
    /// Symmetric: the answer is the same with the arguments swapped.
    pub fn are_friends(&self, a: &str, b: &str) -> Result<bool> {
        self.database.friendship_exists(a, b)
    }

    /// Ids of all of a user's friends
    ///
    /// Bulk form used by visibility filtering, so listing N pins costs one
    /// graph query instead of N point lookups.
    pub fn friend_ids(&self, user_id: &str) -> Result<Vec<String>> {
        self.database.get_friend_ids(user_id)
    }

    /// A user's friends as full user profiles
    pub fn list_friends(&self, user_id: &str) -> Result<Vec<User>> {
        let ids = self.database.get_friend_ids(user_id)?;
        let records = self.database.get_users_by_ids(&ids)?;
        Ok(records.into_iter().map(User::from).collect())
    }

    /// Users with a pending request addressed to `user_id`
    pub fn list_pending_incoming(&self, user_id: &str) -> Result<Vec<User>> {
        let requests = self.database.get_pending_requests_for(user_id)?;
        let ids: Vec<String> = requests.into_iter().map(|r| r.requester_id).collect();
        let records = self.database.get_users_by_ids(&ids)?;
        Ok(records.into_iter().map(User::from).collect())
    }

    /// Users `user_id` has sent a still-pending request to
    pub fn list_pending_outgoing(&self, user_id: &str) -> Result<Vec<User>> {
        let requests = self.database.get_pending_requests_from(user_id)?;
        let ids: Vec<String> = requests.into_iter().map(|r| r.target_id).collect();
        let records = self.database.get_users_by_ids(&ids)?;
        Ok(records.into_iter().map(User::from).collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> (Arc<Database>, FriendsService) {
        let database = Arc::new(Database::open(None).await.unwrap());
        let service = FriendsService::new(database.clone());
        (database, service)
    }

    fn add_user(database: &Database, id: &str) {
        let email = format!("{}@example.com", id);
        database.insert_user(id, id, &email, "hash").unwrap();
    }

    #[tokio::test]
    async fn test_send_request_to_self() {
        let (database, friends) = setup().await;
        add_user(&database, "alice");

        let result = friends.send_request("alice", "alice");
        assert!(matches!(result, Err(Error::InvalidTarget)));
        assert_eq!(result.unwrap_err().status_code(), 400);
    }

    #[tokio::test]
    async fn test_send_request_to_unknown_user() {
        let (database, friends) = setup().await;
        add_user(&database, "alice");

        let result = friends.send_request("alice", "nobody");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_request_and_accept_flow() {
        let (database, friends) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "bob");

        let request = friends.send_request("alice", "bob").unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.requester_id, "alice");
        assert!(request.responded_at.is_none());

        let incoming = friends.list_pending_incoming("bob").unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].username, "alice");

        let outgoing = friends.list_pending_outgoing("alice").unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].username, "bob");

        friends.accept_request("bob", "alice").unwrap();

        // Symmetric in both directions
        assert!(friends.are_friends("alice", "bob").unwrap());
        assert!(friends.are_friends("bob", "alice").unwrap());

        assert!(friends.list_pending_incoming("bob").unwrap().is_empty());
        assert!(friends.list_pending_outgoing("alice").unwrap().is_empty());

        let alices_friends = friends.list_friends("alice").unwrap();
        assert_eq!(alices_friends.len(), 1);
        assert_eq!(alices_friends[0].username, "bob");
    }

    #[tokio::test]
    async fn test_duplicate_request_blocked_in_both_directions() {
        let (database, friends) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "bob");

        friends.send_request("alice", "bob").unwrap();

        let same_direction = friends.send_request("alice", "bob");
        assert!(matches!(same_direction, Err(Error::DuplicateRequest)));

        let reverse_direction = friends.send_request("bob", "alice");
        assert!(matches!(reverse_direction, Err(Error::DuplicateRequest)));
    }

    #[tokio::test]
    async fn test_request_to_existing_friend() {
        let (database, friends) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "bob");

        friends.send_request("alice", "bob").unwrap();
        friends.accept_request("bob", "alice").unwrap();

        let again = friends.send_request("alice", "bob");
        assert!(matches!(again, Err(Error::AlreadyFriends)));

        let reverse = friends.send_request("bob", "alice");
        assert!(matches!(reverse, Err(Error::AlreadyFriends)));
    }

    #[tokio::test]
    async fn test_accept_without_pending_request() {
        let (database, friends) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "bob");

        let nothing_pending = friends.accept_request("bob", "alice");
        assert!(matches!(nothing_pending, Err(Error::NoSuchRequest)));

        // A pending request only accepts in its own direction
        friends.send_request("alice", "bob").unwrap();
        let wrong_direction = friends.accept_request("alice", "bob");
        assert!(matches!(wrong_direction, Err(Error::NoSuchRequest)));

        // The real direction still works afterwards
        friends.accept_request("bob", "alice").unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_double_accept_has_one_winner() {
        let (database, friends) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "bob");

        friends.send_request("alice", "bob").unwrap();

        let service = Arc::new(friends);
        let first = {
            let service = service.clone();
            tokio::spawn(async move { service.accept_request("bob", "alice") })
        };
        let second = {
            let service = service.clone();
            tokio::spawn(async move { service.accept_request("bob", "alice") })
        };

        let results = [first.await.unwrap(), second.await.unwrap()];
        let winners = results.iter().filter(|r| r.is_ok()).count();
        let losers = results
            .iter()
            .filter(|r| matches!(r, Err(Error::NoSuchRequest)))
            .count();

        assert_eq!(winners, 1);
        assert_eq!(losers, 1);
        assert!(service.are_friends("alice", "bob").unwrap());
    }

    #[tokio::test]
    async fn test_friend_ids_bulk_fetch() {
        let (database, friends) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "bob");
        add_user(&database, "carol");

        friends.send_request("alice", "bob").unwrap();
        friends.accept_request("bob", "alice").unwrap();
        friends.send_request("carol", "alice").unwrap();
        friends.accept_request("alice", "carol").unwrap();

        let mut ids = friends.friend_ids("alice").unwrap();
        ids.sort();
        assert_eq!(ids, vec!["bob".to_string(), "carol".to_string()]);

        assert_eq!(friends.friend_ids("bob").unwrap(), vec!["alice".to_string()]);
        assert!(friends.friend_ids("dave").unwrap().is_empty());
    }

    #[test]
    fn test_request_status_strings() {
        assert_eq!(RequestStatus::Pending.as_str(), "pending");
        assert_eq!(RequestStatus::Accepted.as_str(), "accepted");
        assert_eq!(RequestStatus::parse("pending"), Some(RequestStatus::Pending));
        assert_eq!(RequestStatus::parse("rejected"), None);
    }
}
