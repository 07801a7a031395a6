//! # Discovery Module
//!
//! Surfacing pins a user did not go looking for.
//!
//! ## Ranking Modes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        DISCOVERY MODES                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  1. Trending                                                           │
//! │  ───────────                                                            │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │                                                             │       │
//! │  │            likes × 2  +  comments × 3                       │       │
//! │  │  score = ────────────────────────────                       │       │
//! │  │             1  +  age_hours / 24                            │       │
//! │  │                                                             │       │
//! │  │  Highest score first; the newer pin wins a tied score.     │       │
//! │  │  The score itself is never exposed.                        │       │
//! │  │                                                             │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  2. Nearby                                                             │
//! │  ─────────                                                              │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │                                                             │       │
//! │  │  Haversine distance from the caller's origin point.        │       │
//! │  │  Keep pins within the radius, closest first, with the      │       │
//! │  │  distance (km, 2 decimals) attached to each result.        │       │
//! │  │                                                             │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both modes rank only pins the viewer may see, return at most
//! [`RESULT_LIMIT`] results, and skip stored rows whose coordinates are
//! malformed instead of failing the whole query.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::geo;
use crate::pins::{Pin, PinService};
use crate::storage::Database;

/// Maximum number of results either discovery mode returns
pub const RESULT_LIMIT: usize = 50;

/// A pin annotated with its distance from the search origin
#[derive(Debug, Clone, Serialize)]
pub struct NearbyPin {
    /// The pin itself
    pub pin: Pin,
    /// Great-circle distance from the origin, km, rounded to 2 decimals
    pub distance_km: f64,
}

/// Service ranking visible pins by engagement or proximity
pub struct DiscoveryService {
    /// Pin access, already filtered by the visibility rule
    pins: PinService,
}

impl DiscoveryService {
    /// Create a new discovery service
    pub fn new(database: Arc<Database>) -> Self {
        Self {
            pins: PinService::new(database),
        }
    }

    /// Pins the viewer may see, hottest first
    ///
    /// Engagement is weighted (a comment is worth more than a like) and
    /// decays with age: a day-old pin needs twice the engagement of a
    /// brand-new one to score the same.
    pub fn trending(&self, viewer_id: &str) -> Result<Vec<Pin>> {
        let mut scored: Vec<(f64, Pin)> = Vec::new();
        for record in self.pins.visible_records(viewer_id)? {
            if !geo::coordinates_in_range(record.latitude, record.longitude) {
                tracing::warn!("Skipping pin {} with malformed coordinates", record.id);
                continue;
            }
            let engagement = (record.like_count * 2 + record.comment_count * 3) as f64;
            let age_hours = crate::time::hours_since(record.created_at);
            let score = engagement / (1.0 + age_hours / 24.0);
            scored.push((score, Pin::try_from(record)?));
        }

        scored.sort_by(|(score_a, pin_a), (score_b, pin_b)| {
            score_b
                .partial_cmp(score_a)
                .unwrap_or(Ordering::Equal)
                .then_with(|| pin_b.created_at.cmp(&pin_a.created_at))
        });
        scored.truncate(RESULT_LIMIT);

        Ok(scored.into_iter().map(|(_, pin)| pin).collect())
    }

    /// Pins the viewer may see within `radius_km` of an origin, closest first
    ///
    /// The origin must be a valid coordinate pair and the radius a positive
    /// finite number of kilometers.
    pub fn nearby(
        &self,
        viewer_id: &str,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> Result<Vec<NearbyPin>> {
        geo::validate_coordinates(latitude, longitude)?;
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(Error::Validation(format!(
                "Search radius must be a positive number of kilometers, got {}",
                radius_km
            )));
        }

        let mut results: Vec<NearbyPin> = Vec::new();
        for record in self.pins.visible_records(viewer_id)? {
            if !geo::coordinates_in_range(record.latitude, record.longitude) {
                tracing::warn!("Skipping pin {} with malformed coordinates", record.id);
                continue;
            }
            let distance =
                geo::haversine_km(latitude, longitude, record.latitude, record.longitude);
            if distance > radius_km {
                continue;
            }
            results.push(NearbyPin {
                pin: Pin::try_from(record)?,
                distance_km: (distance * 100.0).round() / 100.0,
            });
        }

        // Stable sort: pins at the same distance keep their newest-first order
        results.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(Ordering::Equal)
        });
        results.truncate(RESULT_LIMIT);

        Ok(results)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::friends::FriendsService;

    async fn setup() -> (Arc<Database>, DiscoveryService) {
        let database = Arc::new(Database::open(None).await.unwrap());
        let service = DiscoveryService::new(database.clone());
        (database, service)
    }

    fn add_user(database: &Database, id: &str) {
        let email = format!("{}@example.com", id);
        database.insert_user(id, id, &email, "hash").unwrap();
    }

    fn add_pin(database: &Database, id: &str, owner: &str, lat: f64, lng: f64, privacy: &str) {
        database
            .insert_pin(id, owner, id, "d", lat, lng, privacy)
            .unwrap();
    }

    fn like(database: &Database, pin_id: &str, n: usize) {
        for i in 0..n {
            database.add_like(pin_id, &format!("liker-{}", i)).unwrap();
        }
    }

    fn comment(database: &Database, pin_id: &str, n: usize) {
        for i in 0..n {
            let id = format!("{}-comment-{}", pin_id, i);
            database
                .insert_comment(&id, pin_id, "someone", "someone", "!")
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_trending_weights_comments_over_likes() {
        let (database, discovery) = setup().await;
        add_user(&database, "alice");

        // All fresh, so ordering is pure engagement:
        // chatty = 1*2 + 2*3 = 8, popular = 3*2 = 6, quiet = 0
        add_pin(&database, "popular", "alice", 0.0, 0.0, "public");
        add_pin(&database, "chatty", "alice", 0.0, 0.0, "public");
        add_pin(&database, "quiet", "alice", 0.0, 0.0, "public");
        like(&database, "popular", 3);
        like(&database, "chatty", 1);
        comment(&database, "chatty", 2);

        let ids: Vec<String> = discovery
            .trending("alice")
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["chatty", "popular", "quiet"]);
    }

    #[tokio::test]
    async fn test_trending_decays_with_age() {
        let (database, discovery) = setup().await;
        add_user(&database, "alice");

        // The old pin has double the engagement, but at 48h its score is
        // 4 / (1 + 2) = 1.33 against the fresh pin's 2.0.
        add_pin(&database, "old", "alice", 0.0, 0.0, "public");
        add_pin(&database, "fresh", "alice", 0.0, 0.0, "public");
        like(&database, "old", 2);
        like(&database, "fresh", 1);

        let two_days_ago = crate::time::now_timestamp() - 48 * 3600;
        database.set_pin_created_at("old", two_days_ago).unwrap();

        let ids: Vec<String> = discovery
            .trending("alice")
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["fresh", "old"]);
    }

    #[tokio::test]
    async fn test_trending_breaks_ties_by_recency() {
        let (database, discovery) = setup().await;
        add_user(&database, "alice");

        // Both score zero; the newer pin must come first.
        add_pin(&database, "older", "alice", 0.0, 0.0, "public");
        add_pin(&database, "newer", "alice", 0.0, 0.0, "public");
        let now = crate::time::now_timestamp();
        database.set_pin_created_at("older", now - 7200).unwrap();

        let ids: Vec<String> = discovery
            .trending("alice")
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_trending_skips_malformed_coordinates() {
        let (database, discovery) = setup().await;
        add_user(&database, "alice");

        add_pin(&database, "good", "alice", 10.0, 10.0, "public");
        // Row predating coordinate validation
        add_pin(&database, "bad", "alice", 200.0, 0.0, "public");
        like(&database, "bad", 5);

        let ids: Vec<String> = discovery
            .trending("alice")
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["good"]);
    }

    #[tokio::test]
    async fn test_trending_respects_visibility() {
        let (database, discovery) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "bob");
        add_user(&database, "carol");

        let friends = FriendsService::new(database.clone());
        friends.send_request("alice", "bob").unwrap();
        friends.accept_request("bob", "alice").unwrap();

        add_pin(&database, "circle", "alice", 0.0, 0.0, "friends");
        like(&database, "circle", 10);

        let bob_sees: Vec<String> = discovery
            .trending("bob")
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(bob_sees, vec!["circle"]);

        assert!(discovery.trending("carol").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trending_caps_results() {
        let (database, discovery) = setup().await;
        add_user(&database, "alice");

        for i in 0..(RESULT_LIMIT + 5) {
            add_pin(&database, &format!("pin-{}", i), "alice", 0.0, 0.0, "public");
        }

        assert_eq!(discovery.trending("alice").unwrap().len(), RESULT_LIMIT);
    }

    #[tokio::test]
    async fn test_nearby_filters_sorts_and_annotates() {
        let (database, discovery) = setup().await;
        add_user(&database, "alice");

        // Origin: downtown San Francisco
        add_pin(&database, "oakland", "alice", 37.8044, -122.2712, "public");
        add_pin(&database, "berkeley", "alice", 37.8716, -122.2727, "public");
        add_pin(&database, "san-jose", "alice", 37.3382, -121.8863, "public");
        add_pin(&database, "los-angeles", "alice", 34.0522, -118.2437, "public");

        let results = discovery
            .nearby("alice", 37.7749, -122.4194, 50.0)
            .unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.pin.id.as_str()).collect();
        assert_eq!(ids, vec!["oakland", "berkeley"]);

        for result in &results {
            assert!(result.distance_km <= 50.0);
            // Rounded to two decimals
            let scaled = result.distance_km * 100.0;
            assert!((scaled - scaled.round()).abs() < 1e-9);
        }
        assert!(results[0].distance_km < results[1].distance_km);
    }

    #[tokio::test]
    async fn test_nearby_validates_origin_and_radius() {
        let (_database, discovery) = setup().await;

        let bad_origin = discovery.nearby("alice", 91.0, 0.0, 10.0);
        assert!(matches!(bad_origin, Err(Error::Validation(_))));

        let zero_radius = discovery.nearby("alice", 0.0, 0.0, 0.0);
        assert!(matches!(zero_radius, Err(Error::Validation(_))));

        let negative_radius = discovery.nearby("alice", 0.0, 0.0, -5.0);
        assert!(matches!(negative_radius, Err(Error::Validation(_))));

        let nan_radius = discovery.nearby("alice", 0.0, 0.0, f64::NAN);
        assert!(matches!(nan_radius, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_nearby_skips_malformed_coordinates() {
        let (database, discovery) = setup().await;
        add_user(&database, "alice");

        add_pin(&database, "good", "alice", 37.7749, -122.4194, "public");
        // Row predating coordinate validation
        add_pin(&database, "bad", "alice", 37.7749, 200.0, "public");

        let results = discovery
            .nearby("alice", 37.7749, -122.4194, 10.0)
            .unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.pin.id.as_str()).collect();
        assert_eq!(ids, vec!["good"]);
    }

    #[tokio::test]
    async fn test_nearby_respects_visibility() {
        let (database, discovery) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "carol");

        add_pin(&database, "secret-spot", "alice", 37.7749, -122.4194, "private");

        let alice_sees = discovery
            .nearby("alice", 37.7749, -122.4194, 10.0)
            .unwrap();
        assert_eq!(alice_sees.len(), 1);
        assert_eq!(alice_sees[0].distance_km, 0.0);

        assert!(discovery
            .nearby("carol", 37.7749, -122.4194, 10.0)
            .unwrap()
            .is_empty());
    }
}
