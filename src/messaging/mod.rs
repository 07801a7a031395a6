//! # Messaging Module
//!
//! Direct messages between friends.
//!
//! ## Conversation Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CONVERSATION MODEL                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  send(alice, bob, "hi")                                                 │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ┌─────────────────────┐   not friends? ──► Forbidden                   │
//! │  │  friendship gate    │                                                │
//! │  └─────────┬───────────┘                                                │
//! │            ▼                                                            │
//! │  message row (sender, recipient, content, read = 0)                     │
//! │                                                                         │
//! │  thread(alice, bob)          both directions, oldest first              │
//! │  conversations(alice)        one entry per partner, newest first,       │
//! │                              with that partner's unread count           │
//! │  mark_thread_read(alice, bob) flips bob ──► alice messages to read      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every surface here is friends-only. There is no way to message, or read a
//! thread with, a user who is not an accepted friend.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::friends::FriendsService;
use crate::storage::{Database, MessageRecord};
use crate::users::User;

/// Maximum message content size (64KB)
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// A direct message between two friends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique ID (uuid v4)
    pub id: String,
    /// Who sent it
    pub sender_id: String,
    /// Who it was sent to
    pub recipient_id: String,
    /// Message text
    pub content: String,
    /// Whether the recipient has read it
    pub read: bool,
    /// Creation timestamp (Unix seconds)
    pub created_at: i64,
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.id,
            sender_id: record.sender_id,
            recipient_id: record.recipient_id,
            content: record.content,
            read: record.read,
            created_at: record.created_at,
        }
    }
}

/// One entry in a user's conversation list
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    /// The other participant
    pub partner: User,
    /// The most recent message in either direction
    pub latest: Message,
    /// How many of the partner's messages the viewer has not read
    pub unread_count: i64,
}

/// Service for sending and reading direct messages
pub struct MessageService {
    /// Database for persistence
    database: Arc<Database>,
    /// Friendship graph; every messaging surface is gated on it
    friends: FriendsService,
}

impl MessageService {
    /// Create a new message service
    pub fn new(database: Arc<Database>) -> Self {
        let friends = FriendsService::new(database.clone());
        Self { database, friends }
    }

    /// Send a direct message to a friend
    pub fn send(&self, sender_id: &str, recipient_id: &str, content: &str) -> Result<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::Validation("Message content must not be empty".into()));
        }
        if content.len() > MAX_MESSAGE_SIZE {
            return Err(Error::Validation(format!(
                "Message exceeds maximum size of {} bytes",
                MAX_MESSAGE_SIZE
            )));
        }

        if self.database.get_user(recipient_id)?.is_none() {
            return Err(Error::NotFound("User"));
        }
        if !self.friends.are_friends(sender_id, recipient_id)? {
            return Err(Error::Forbidden("Can only message friends".into()));
        }

        let id = Uuid::new_v4().to_string();
        self.database
            .insert_message(&id, sender_id, recipient_id, content)?;

        tracing::info!("Message sent: {} -> {}", sender_id, recipient_id);

        let record = self
            .database
            .get_message(&id)?
            .ok_or(Error::NotFound("Message"))?;
        Ok(Message::from(record))
    }

    /// The full two-person thread, oldest first
    pub fn thread(&self, viewer_id: &str, friend_id: &str) -> Result<Vec<Message>> {
        if !self.friends.are_friends(viewer_id, friend_id)? {
            return Err(Error::Forbidden("Can only message friends".into()));
        }

        let records = self.database.get_messages_between(viewer_id, friend_id)?;
        Ok(records.into_iter().map(Message::from).collect())
    }

    /// The viewer's conversation list, most recently active first
    ///
    /// One entry per partner, carrying the latest message in either
    /// direction and how many of that partner's messages are still unread.
    pub fn conversations(&self, viewer_id: &str) -> Result<Vec<Conversation>> {
        let records = self.database.get_messages_involving(viewer_id)?;

        // Records arrive newest first, so the first message seen for a
        // partner is that conversation's latest.
        let mut partner_order: Vec<String> = Vec::new();
        let mut latest: HashMap<String, MessageRecord> = HashMap::new();
        for record in records {
            let partner_id = if record.sender_id == viewer_id {
                record.recipient_id.clone()
            } else {
                record.sender_id.clone()
            };
            if !latest.contains_key(&partner_id) {
                partner_order.push(partner_id.clone());
                latest.insert(partner_id, record);
            }
        }

        let users = self.database.get_users_by_ids(&partner_order)?;
        let mut users_by_id: HashMap<String, User> = users
            .into_iter()
            .map(|record| (record.id.clone(), User::from(record)))
            .collect();

        let mut conversations = Vec::new();
        for partner_id in partner_order {
            let partner = match users_by_id.remove(&partner_id) {
                Some(user) => user,
                None => {
                    tracing::warn!("Skipping conversation with missing user {}", partner_id);
                    continue;
                }
            };
            let record = match latest.remove(&partner_id) {
                Some(record) => record,
                None => continue,
            };
            let unread_count = self.database.count_unread_from(viewer_id, &partner_id)?;
            conversations.push(Conversation {
                partner,
                latest: Message::from(record),
                unread_count,
            });
        }
        Ok(conversations)
    }

    /// Mark a friend's messages to the viewer as read
    ///
    /// Returns how many messages flipped from unread to read.
    pub fn mark_thread_read(&self, viewer_id: &str, friend_id: &str) -> Result<usize> {
        if !self.friends.are_friends(viewer_id, friend_id)? {
            return Err(Error::Forbidden("Can only message friends".into()));
        }

        self.database.mark_messages_read(viewer_id, friend_id)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> (Arc<Database>, MessageService) {
        let database = Arc::new(Database::open(None).await.unwrap());
        let service = MessageService::new(database.clone());
        (database, service)
    }

    fn add_user(database: &Database, id: &str) {
        let email = format!("{}@example.com", id);
        database.insert_user(id, id, &email, "hash").unwrap();
    }

    fn befriend(database: &Arc<Database>, a: &str, b: &str) {
        let friends = FriendsService::new(database.clone());
        friends.send_request(a, b).unwrap();
        friends.accept_request(b, a).unwrap();
    }

    #[tokio::test]
    async fn test_send_requires_friendship() {
        let (database, messages) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "bob");

        let stranger = messages.send("alice", "bob", "hi");
        assert!(matches!(stranger, Err(Error::Forbidden(_))));

        befriend(&database, "alice", "bob");
        let sent = messages.send("alice", "bob", "hi").unwrap();
        assert_eq!(sent.sender_id, "alice");
        assert_eq!(sent.recipient_id, "bob");
        assert_eq!(sent.content, "hi");
        assert!(!sent.read);
    }

    #[tokio::test]
    async fn test_send_to_unknown_recipient() {
        let (database, messages) = setup().await;
        add_user(&database, "alice");

        let missing = messages.send("alice", "ghost", "hi");
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_send_validation() {
        let (database, messages) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "bob");
        befriend(&database, "alice", "bob");

        let empty = messages.send("alice", "bob", "   ");
        assert!(matches!(empty, Err(Error::Validation(_))));

        let oversized = "x".repeat(MAX_MESSAGE_SIZE + 1);
        let too_big = messages.send("alice", "bob", &oversized);
        assert!(matches!(too_big, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_thread_is_chronological_and_gated() {
        let (database, messages) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "bob");
        add_user(&database, "carol");
        befriend(&database, "alice", "bob");

        messages.send("alice", "bob", "one").unwrap();
        messages.send("bob", "alice", "two").unwrap();
        messages.send("alice", "bob", "three").unwrap();

        let thread: Vec<String> = messages
            .thread("alice", "bob")
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(thread, vec!["one", "two", "three"]);

        // The same thread from the other side
        let mirrored: Vec<String> = messages
            .thread("bob", "alice")
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(mirrored, vec!["one", "two", "three"]);

        let outsider = messages.thread("carol", "alice");
        assert!(matches!(outsider, Err(Error::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_conversations_newest_first_with_unread_counts() {
        let (database, messages) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "bob");
        add_user(&database, "carol");
        befriend(&database, "alice", "bob");
        befriend(&database, "alice", "carol");

        messages.send("bob", "alice", "first from bob").unwrap();
        messages.send("carol", "alice", "hello from carol").unwrap();
        messages.send("bob", "alice", "second from bob").unwrap();

        let conversations = messages.conversations("alice").unwrap();
        assert_eq!(conversations.len(), 2);

        // Bob's thread was active most recently
        assert_eq!(conversations[0].partner.id, "bob");
        assert_eq!(conversations[0].latest.content, "second from bob");
        assert_eq!(conversations[0].unread_count, 2);

        assert_eq!(conversations[1].partner.id, "carol");
        assert_eq!(conversations[1].unread_count, 1);

        // The viewer's own replies never count as unread
        messages.send("alice", "bob", "a reply").unwrap();
        let after_reply = messages.conversations("alice").unwrap();
        assert_eq!(after_reply[0].partner.id, "bob");
        assert_eq!(after_reply[0].latest.content, "a reply");
        assert_eq!(after_reply[0].unread_count, 2);
    }

    #[tokio::test]
    async fn test_mark_thread_read() {
        let (database, messages) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "bob");
        befriend(&database, "alice", "bob");

        messages.send("bob", "alice", "one").unwrap();
        messages.send("bob", "alice", "two").unwrap();

        assert_eq!(messages.mark_thread_read("alice", "bob").unwrap(), 2);
        // Nothing left to flip
        assert_eq!(messages.mark_thread_read("alice", "bob").unwrap(), 0);

        let thread = messages.thread("alice", "bob").unwrap();
        assert!(thread.iter().all(|m| m.read));

        let conversations = messages.conversations("alice").unwrap();
        assert_eq!(conversations[0].unread_count, 0);
    }
}
