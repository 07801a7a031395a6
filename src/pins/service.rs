//! # Pin Service
//!
//! Core pin operations and the shared visibility rule.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::friends::FriendsService;
use crate::storage::{Database, PinRecord};

/// Maximum number of results returned by pin search
pub const SEARCH_LIMIT: usize = 50;

/// Privacy tier of a pin or event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    /// Visible to any authenticated user
    Public,
    /// Visible to the owner and accepted friends
    Friends,
    /// Visible only to the owner
    Private,
}

impl Privacy {
    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            Privacy::Public => "public",
            Privacy::Friends => "friends",
            Privacy::Private => "private",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Privacy::Public),
            "friends" => Some(Privacy::Friends),
            "private" => Some(Privacy::Private),
            _ => None,
        }
    }

    /// The three-tier visibility rule
    ///
    /// Owners always see their own content. `friends` requires a symmetric
    /// accepted friendship; `private` admits nobody else. The same rule
    /// governs a pin's media, likes, and comments, and events.
    pub fn visible(self, is_owner: bool, is_friend: bool) -> bool {
        if is_owner {
            return true;
        }
        match self {
            Privacy::Public => true,
            Privacy::Friends => is_friend,
            Privacy::Private => false,
        }
    }
}

/// A mapped moment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    /// Unique ID (uuid v4)
    pub id: String,
    /// The creator; only they can delete the pin or attach media
    pub owner_id: String,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Latitude in degrees, [-90, 90]
    pub latitude: f64,
    /// Longitude in degrees, [-180, 180]
    pub longitude: f64,
    /// Who may see this pin
    pub privacy: Privacy,
    /// Number of likes
    pub like_count: i64,
    /// Number of comments
    pub comment_count: i64,
    /// Number of media attachments
    pub media_count: i64,
    /// Creation timestamp (Unix seconds)
    pub created_at: i64,
}

impl TryFrom<PinRecord> for Pin {
    type Error = Error;

    fn try_from(record: PinRecord) -> Result<Self> {
        let privacy = Privacy::parse(&record.privacy)
            .ok_or_else(|| Error::Storage(format!("Unknown privacy tier: {}", record.privacy)))?;
        Ok(Self {
            id: record.id,
            owner_id: record.owner_id,
            title: record.title,
            description: record.description,
            latitude: record.latitude,
            longitude: record.longitude,
            privacy,
            like_count: record.like_count,
            comment_count: record.comment_count,
            media_count: record.media_count,
            created_at: record.created_at,
        })
    }
}

/// Service for creating, viewing, and deleting pins
pub struct PinService {
    /// Database for persistence
    database: Arc<Database>,
    /// Friendship graph, consulted for the visibility rule
    friends: FriendsService,
}

impl PinService {
    /// Create a new pin service
    pub fn new(database: Arc<Database>) -> Self {
        let friends = FriendsService::new(database.clone());
        Self { database, friends }
    }

    /// Get a reference to the underlying database
    pub(crate) fn db(&self) -> &Database {
        &self.database
    }

    /// Get a reference to the friendship graph
    pub(crate) fn friends(&self) -> &FriendsService {
        &self.friends
    }

    /// Create a new pin
    pub fn create_pin(
        &self,
        owner_id: &str,
        latitude: f64,
        longitude: f64,
        title: &str,
        description: &str,
        privacy: Privacy,
    ) -> Result<Pin> {
        let title = title.trim();
        let description = description.trim();

        if title.is_empty() {
            return Err(Error::Validation("Pin title must not be empty".into()));
        }
        if description.is_empty() {
            return Err(Error::Validation("Pin description must not be empty".into()));
        }
        crate::geo::validate_coordinates(latitude, longitude)?;

        let id = Uuid::new_v4().to_string();
        self.database.insert_pin(
            &id,
            owner_id,
            title,
            description,
            latitude,
            longitude,
            privacy.as_str(),
        )?;

        tracing::info!("Pin created: {} by {}", id, owner_id);

        let record = self.database.get_pin(&id)?.ok_or(Error::NotFound("Pin"))?;
        Pin::try_from(record)
    }

    /// Get one pin
    ///
    /// Hidden pins answer `NotFound` rather than `Forbidden`, so probing
    /// with ids does not reveal whether a pin exists.
    pub fn get_pin(&self, pin_id: &str, viewer_id: &str) -> Result<Pin> {
        let record = self.database.get_pin(pin_id)?.ok_or(Error::NotFound("Pin"))?;
        if !self.record_visible(&record, viewer_id)? {
            return Err(Error::NotFound("Pin"));
        }
        Pin::try_from(record)
    }

    /// Every pin the viewer may see, newest first
    pub fn list_visible(&self, viewer_id: &str) -> Result<Vec<Pin>> {
        let records = self.visible_records(viewer_id)?;
        records.into_iter().map(Pin::try_from).collect()
    }

    /// A user's own pin list, newest first
    pub fn list_for_owner(&self, owner_id: &str, viewer_id: &str) -> Result<Vec<Pin>> {
        if owner_id != viewer_id {
            return Err(Error::Forbidden(
                "Cannot view another user's pin list".into(),
            ));
        }
        let records = self.database.get_pins_by_owner(owner_id)?;
        records.into_iter().map(Pin::try_from).collect()
    }

    /// Substring search over public pins, newest first
    pub fn search(&self, _viewer_id: &str, query: &str) -> Result<Vec<Pin>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let records = self.database.search_public_pins(query, SEARCH_LIMIT)?;
        records.into_iter().map(Pin::try_from).collect()
    }

    /// Delete a pin and everything attached to it (owner only)
    pub fn delete_pin(&self, pin_id: &str, requester_id: &str) -> Result<()> {
        let record = self.database.get_pin(pin_id)?.ok_or(Error::NotFound("Pin"))?;
        if record.owner_id != requester_id {
            return Err(Error::Forbidden("Only the owner can delete a pin".into()));
        }

        self.database.delete_pin(pin_id)?;

        tracing::info!(
            "Pin deleted: {} ({} media attachments removed)",
            pin_id,
            record.media_count
        );
        Ok(())
    }

    // ========================================================================
    // VISIBILITY
    // ========================================================================

    /// All pin records the viewer may see, preserving storage order
    ///
    /// The viewer's friend set is fetched once, so filtering N pins costs
    /// one graph query.
    pub(crate) fn visible_records(&self, viewer_id: &str) -> Result<Vec<PinRecord>> {
        let friend_ids: HashSet<String> =
            self.friends.friend_ids(viewer_id)?.into_iter().collect();

        let mut visible = Vec::new();
        for record in self.database.get_all_pins()? {
            let privacy = match Privacy::parse(&record.privacy) {
                Some(p) => p,
                None => {
                    tracing::warn!("Skipping pin {} with unknown privacy tier", record.id);
                    continue;
                }
            };
            let is_owner = record.owner_id == viewer_id;
            if privacy.visible(is_owner, friend_ids.contains(&record.owner_id)) {
                visible.push(record);
            }
        }
        Ok(visible)
    }

    /// Whether a single pin record is visible to the viewer
    pub(crate) fn record_visible(&self, record: &PinRecord, viewer_id: &str) -> Result<bool> {
        let privacy = Privacy::parse(&record.privacy)
            .ok_or_else(|| Error::Storage(format!("Unknown privacy tier: {}", record.privacy)))?;

        let is_owner = record.owner_id == viewer_id;
        // Only hit the friendship table when the tier depends on it
        let is_friend = match privacy {
            Privacy::Friends if !is_owner => {
                self.friends.are_friends(viewer_id, &record.owner_id)?
            }
            _ => false,
        };
        Ok(privacy.visible(is_owner, is_friend))
    }

    /// Load a pin the viewer must be able to see
    ///
    /// Absent pins are `NotFound`; existing but hidden pins are `Forbidden`.
    /// Engagement and media surfaces use this gate.
    pub(crate) fn visible_record(&self, pin_id: &str, viewer_id: &str) -> Result<PinRecord> {
        let record = self.database.get_pin(pin_id)?.ok_or(Error::NotFound("Pin"))?;
        if !self.record_visible(&record, viewer_id)? {
            return Err(Error::Forbidden("Pin is not visible to this user".into()));
        }
        Ok(record)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> (Arc<Database>, PinService) {
        let database = Arc::new(Database::open(None).await.unwrap());
        let service = PinService::new(database.clone());
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
    async fn test_create_pin_roundtrip() {
        let (database, pins) = setup().await;
        add_user(&database, "alice");

        let pin = pins
            .create_pin("alice", 37.77, -122.42, "  Sunset spot  ", "Golden hour", Privacy::Public)
            .unwrap();

        assert_eq!(pin.owner_id, "alice");
        assert_eq!(pin.title, "Sunset spot");
        assert_eq!(pin.privacy, Privacy::Public);
        assert_eq!(pin.like_count, 0);
        assert_eq!(pin.comment_count, 0);
        assert_eq!(pin.media_count, 0);
    }

    #[tokio::test]
    async fn test_create_pin_validation() {
        let (database, pins) = setup().await;
        add_user(&database, "alice");

        let no_title = pins.create_pin("alice", 0.0, 0.0, "  ", "desc", Privacy::Public);
        assert!(matches!(no_title, Err(Error::Validation(_))));

        let no_description = pins.create_pin("alice", 0.0, 0.0, "title", "", Privacy::Public);
        assert!(matches!(no_description, Err(Error::Validation(_))));

        let bad_latitude = pins.create_pin("alice", 91.0, 0.0, "t", "d", Privacy::Public);
        assert!(matches!(bad_latitude, Err(Error::Validation(_))));

        let bad_longitude = pins.create_pin("alice", 0.0, -200.0, "t", "d", Privacy::Public);
        assert!(matches!(bad_longitude, Err(Error::Validation(_))));

        let nan = pins.create_pin("alice", f64::NAN, 0.0, "t", "d", Privacy::Public);
        assert!(matches!(nan, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_visibility_tiers() {
        let (database, pins) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "bob");
        add_user(&database, "carol");
        befriend(&database, "alice", "bob");

        pins.create_pin("alice", 1.0, 1.0, "Open", "d", Privacy::Public).unwrap();
        pins.create_pin("alice", 2.0, 2.0, "Close circle", "d", Privacy::Friends).unwrap();
        pins.create_pin("alice", 3.0, 3.0, "Just me", "d", Privacy::Private).unwrap();

        // Owner sees all three
        assert_eq!(pins.list_visible("alice").unwrap().len(), 3);

        // Friend sees public + friends
        let bobs_view: Vec<String> = pins
            .list_visible("bob")
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(bobs_view.len(), 2);
        assert!(bobs_view.contains(&"Open".to_string()));
        assert!(bobs_view.contains(&"Close circle".to_string()));

        // Stranger sees only public
        let carols_view = pins.list_visible("carol").unwrap();
        assert_eq!(carols_view.len(), 1);
        assert_eq!(carols_view[0].title, "Open");
    }

    #[tokio::test]
    async fn test_friends_pin_scenario() {
        // A sends B a friend request, B accepts, A posts a friends-only
        // pin. B must see it; stranger C must not.
        let (database, pins) = setup().await;
        add_user(&database, "a");
        add_user(&database, "b");
        add_user(&database, "c");

        let friends = FriendsService::new(database.clone());
        friends.send_request("a", "b").unwrap();
        friends.accept_request("b", "a").unwrap();

        let pin = pins
            .create_pin("a", 10.0, 20.0, "Weekend hike", "Trailhead", Privacy::Friends)
            .unwrap();

        let b_sees: Vec<String> = pins
            .list_visible("b")
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert!(b_sees.contains(&pin.id));

        let c_sees: Vec<String> = pins
            .list_visible("c")
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert!(!c_sees.contains(&pin.id));
    }

    #[tokio::test]
    async fn test_get_pin_does_not_leak_hidden_pins() {
        let (database, pins) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "carol");

        let pin = pins
            .create_pin("alice", 0.0, 0.0, "Secret", "d", Privacy::Private)
            .unwrap();

        // Owner can fetch it
        assert_eq!(pins.get_pin(&pin.id, "alice").unwrap().id, pin.id);

        // Stranger gets the same answer as for a nonexistent id
        let hidden = pins.get_pin(&pin.id, "carol");
        assert!(matches!(hidden, Err(Error::NotFound(_))));
        let missing = pins.get_pin("no-such-pin", "carol");
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_for_owner_is_self_only() {
        let (database, pins) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "bob");

        pins.create_pin("alice", 0.0, 0.0, "One", "d", Privacy::Private).unwrap();
        pins.create_pin("alice", 0.0, 0.0, "Two", "d", Privacy::Public).unwrap();

        assert_eq!(pins.list_for_owner("alice", "alice").unwrap().len(), 2);

        let other = pins.list_for_owner("alice", "bob");
        assert!(matches!(other, Err(Error::Forbidden(_))));
        assert_eq!(other.unwrap_err().status_code(), 403);
    }

    #[tokio::test]
    async fn test_search_is_public_only_and_case_insensitive() {
        let (database, pins) = setup().await;
        add_user(&database, "alice");

        pins.create_pin("alice", 0.0, 0.0, "Sunset Cliffs", "d", Privacy::Public).unwrap();
        pins.create_pin("alice", 0.0, 0.0, "Sunset Hideout", "d", Privacy::Private).unwrap();

        let hits = pins.search("alice", "sunset").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Sunset Cliffs");

        assert!(pins.search("alice", "  ").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_pin_owner_only_and_cascades() {
        let (database, pins) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "bob");

        let pin = pins
            .create_pin("alice", 0.0, 0.0, "Doomed", "d", Privacy::Public)
            .unwrap();
        database
            .insert_media("m1", &pin.id, "alice", "photo", None, &[1, 2, 3])
            .unwrap();
        database.add_like(&pin.id, "bob").unwrap();
        database
            .insert_comment("c1", &pin.id, "bob", "bob", "nice")
            .unwrap();

        let not_owner = pins.delete_pin(&pin.id, "bob");
        assert!(matches!(not_owner, Err(Error::Forbidden(_))));

        pins.delete_pin(&pin.id, "alice").unwrap();

        assert!(database.get_pin(&pin.id).unwrap().is_none());
        assert!(database.get_media("m1").unwrap().is_none());
        assert_eq!(database.count_likes(&pin.id).unwrap(), 0);
        assert!(database.get_comments(&pin.id).unwrap().is_empty());

        let gone = pins.delete_pin(&pin.id, "alice");
        assert!(matches!(gone, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_privacy_strings() {
        assert_eq!(Privacy::Public.as_str(), "public");
        assert_eq!(Privacy::parse("friends"), Some(Privacy::Friends));
        assert_eq!(Privacy::parse("secret"), None);
    }

    #[test]
    fn test_visibility_rule_table() {
        // (tier, is_owner, is_friend) -> visible
        assert!(Privacy::Public.visible(false, false));
        assert!(Privacy::Friends.visible(false, true));
        assert!(!Privacy::Friends.visible(false, false));
        assert!(!Privacy::Private.visible(false, true));
        // Owners always see their own content
        assert!(Privacy::Private.visible(true, false));
        assert!(Privacy::Friends.visible(true, false));
    }
}
