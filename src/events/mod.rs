//! # Events Module
//!
//! Scheduled gatherings placed on the map, with attendance tracking.
//!
//! ## Event Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         EVENT LIFECYCLE                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  create_event ──► stored with coordinates, date, and a privacy tier     │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  listings / search ──► soonest event date first                         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  attend / unattend ──► set-add / set-remove on the attendee set         │
//! │                        (repeat calls are no-ops, never toggles)         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Events share the pin privacy tiers: `public` events appear for everyone,
//! `friends` events only for the owner's accepted friends, `private` events
//! only for the owner. Attendance is gated on the same rule, so nobody can
//! join an event they cannot see.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::friends::FriendsService;
use crate::pins::Privacy;
use crate::storage::{Database, EventRecord};
use crate::users::User;

/// Maximum number of results returned by event search
pub const SEARCH_LIMIT: usize = 50;

/// A scheduled gathering on the map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique ID (uuid v4)
    pub id: String,
    /// The creator
    pub owner_id: String,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// When the event takes place (Unix seconds)
    pub event_date: i64,
    /// Latitude in degrees, [-90, 90]
    pub latitude: f64,
    /// Longitude in degrees, [-180, 180]
    pub longitude: f64,
    /// Human-readable venue name
    pub location_name: String,
    /// Who may see (and join) this event
    pub privacy: Privacy,
    /// Number of attendees
    pub attendee_count: i64,
    /// Creation timestamp (Unix seconds)
    pub created_at: i64,
}

impl TryFrom<EventRecord> for Event {
    type Error = Error;

    fn try_from(record: EventRecord) -> Result<Self> {
        let privacy = Privacy::parse(&record.privacy)
            .ok_or_else(|| Error::Storage(format!("Unknown privacy tier: {}", record.privacy)))?;
        Ok(Self {
            id: record.id,
            owner_id: record.owner_id,
            title: record.title,
            description: record.description,
            event_date: record.event_date,
            latitude: record.latitude,
            longitude: record.longitude,
            location_name: record.location_name,
            privacy,
            attendee_count: record.attendee_count,
            created_at: record.created_at,
        })
    }
}

/// Service for creating, finding, and attending events
pub struct EventService {
    /// Database for persistence
    database: Arc<Database>,
    /// Friendship graph, consulted for the visibility rule
    friends: FriendsService,
}

impl EventService {
    /// Create a new event service
    pub fn new(database: Arc<Database>) -> Self {
        let friends = FriendsService::new(database.clone());
        Self { database, friends }
    }

    /// Create a new event
    #[allow(clippy::too_many_arguments)]
    pub fn create_event(
        &self,
        owner_id: &str,
        title: &str,
        description: &str,
        event_date: i64,
        latitude: f64,
        longitude: f64,
        location_name: &str,
        privacy: Privacy,
    ) -> Result<Event> {
        let title = title.trim();
        let description = description.trim();
        let location_name = location_name.trim();

        if title.is_empty() {
            return Err(Error::Validation("Event title must not be empty".into()));
        }
        if description.is_empty() {
            return Err(Error::Validation(
                "Event description must not be empty".into(),
            ));
        }
        if location_name.is_empty() {
            return Err(Error::Validation(
                "Event location name must not be empty".into(),
            ));
        }
        crate::geo::validate_coordinates(latitude, longitude)?;

        let id = Uuid::new_v4().to_string();
        self.database.insert_event(
            &id,
            owner_id,
            title,
            description,
            event_date,
            latitude,
            longitude,
            location_name,
            privacy.as_str(),
        )?;

        tracing::info!("Event created: {} by {}", id, owner_id);

        let record = self
            .database
            .get_event(&id)?
            .ok_or(Error::NotFound("Event"))?;
        Event::try_from(record)
    }

    /// Get one event
    ///
    /// Hidden events answer `NotFound` rather than `Forbidden`, the same
    /// no-leak answer pins give.
    pub fn get(&self, event_id: &str, viewer_id: &str) -> Result<Event> {
        let record = self
            .database
            .get_event(event_id)?
            .ok_or(Error::NotFound("Event"))?;
        if !self.record_visible(&record, viewer_id)? {
            return Err(Error::NotFound("Event"));
        }
        Event::try_from(record)
    }

    /// Every event the viewer may see, soonest first
    pub fn list_visible(&self, viewer_id: &str) -> Result<Vec<Event>> {
        let friend_ids: HashSet<String> =
            self.friends.friend_ids(viewer_id)?.into_iter().collect();

        let mut visible = Vec::new();
        for record in self.database.get_all_events()? {
            let privacy = match Privacy::parse(&record.privacy) {
                Some(p) => p,
                None => {
                    tracing::warn!("Skipping event {} with unknown privacy tier", record.id);
                    continue;
                }
            };
            let is_owner = record.owner_id == viewer_id;
            if privacy.visible(is_owner, friend_ids.contains(&record.owner_id)) {
                visible.push(Event::try_from(record)?);
            }
        }
        Ok(visible)
    }

    /// Substring search over public events, soonest first
    ///
    /// Matches against title, description, and location name.
    pub fn search(&self, _viewer_id: &str, query: &str) -> Result<Vec<Event>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let records = self.database.search_public_events(query, SEARCH_LIMIT)?;
        records.into_iter().map(Event::try_from).collect()
    }

    /// Join an event's attendee set, returning the attendee count
    ///
    /// Joining twice is a no-op; the count simply comes back unchanged.
    pub fn attend(&self, event_id: &str, user_id: &str) -> Result<i64> {
        self.visible_record(event_id, user_id)?;

        let newly_added = self.database.add_attendee(event_id, user_id)?;
        if newly_added {
            tracing::info!("User {} attending event {}", user_id, event_id);
        }
        self.database.count_attendees(event_id)
    }

    /// Leave an event's attendee set, returning the attendee count
    pub fn unattend(&self, event_id: &str, user_id: &str) -> Result<i64> {
        self.visible_record(event_id, user_id)?;

        self.database.remove_attendee(event_id, user_id)?;
        self.database.count_attendees(event_id)
    }

    /// Who is attending, in join order
    pub fn attendees(&self, event_id: &str, viewer_id: &str) -> Result<Vec<User>> {
        self.visible_record(event_id, viewer_id)?;

        let ids = self.database.get_attendees(event_id)?;
        let users = self.database.get_users_by_ids(&ids)?;
        Ok(users.into_iter().map(User::from).collect())
    }

    /// Whether a single event record is visible to the viewer
    fn record_visible(&self, record: &EventRecord, viewer_id: &str) -> Result<bool> {
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

    /// Load an event the viewer must be able to see
    ///
    /// Absent events are `NotFound`; existing but hidden events are
    /// `Forbidden`. Attendance uses this gate.
    fn visible_record(&self, event_id: &str, viewer_id: &str) -> Result<EventRecord> {
        let record = self
            .database
            .get_event(event_id)?
            .ok_or(Error::NotFound("Event"))?;
        if !self.record_visible(&record, viewer_id)? {
            return Err(Error::Forbidden("Event is not visible to this user".into()));
        }
        Ok(record)
    }
}

// ============================================================================
// TESTS
// ============================================================================
