//! # Pin Media
//!
//! Binary attachments bound to a pin's lifecycle.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::MediaRecord;

/// Kind of a media attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Still image
    Photo,
    /// Video clip
    Video,
}

impl MediaType {
    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Photo => "photo",
            MediaType::Video => "video",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(MediaType::Photo),
            "video" => Some(MediaType::Video),
            _ => None,
        }
    }
}

/// Metadata for one media attachment
///
/// The payload travels separately through [`super::PinService::media_payload`];
/// listings stay light.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    /// Unique ID (uuid v4)
    pub id: String,
    /// The pin this attachment belongs to
    pub pin_id: String,
    /// Who uploaded it
    pub owner_id: String,
    /// Photo or video
    pub media_type: MediaType,
    /// Optional caption
    pub caption: Option<String>,
    /// Payload size in bytes
    pub size_bytes: i64,
    /// Upload timestamp (Unix seconds)
    pub created_at: i64,
}

impl TryFrom<MediaRecord> for Media {
    type Error = Error;

    fn try_from(record: MediaRecord) -> Result<Self> {
        let media_type = MediaType::parse(&record.media_type)
            .ok_or_else(|| Error::Storage(format!("Unknown media type: {}", record.media_type)))?;
        Ok(Self {
            id: record.id,
            pin_id: record.pin_id,
            owner_id: record.owner_id,
            media_type,
            caption: record.caption,
            size_bytes: record.size_bytes,
            created_at: record.created_at,
        })
    }
}

impl super::PinService {
    /// Attach media to a pin (pin owner only)
    pub fn attach_media(
        &self,
        pin_id: &str,
        requester_id: &str,
        payload: &[u8],
        media_type: MediaType,
        caption: Option<&str>,
    ) -> Result<Media> {
        let record = self.db().get_pin(pin_id)?.ok_or(Error::NotFound("Pin"))?;
        if record.owner_id != requester_id {
            return Err(Error::Forbidden(
                "Only the pin owner can attach media".into(),
            ));
        }
        if payload.is_empty() {
            return Err(Error::Validation("Media payload is empty".into()));
        }

        let id = Uuid::new_v4().to_string();
        self.db()
            .insert_media(&id, pin_id, requester_id, media_type.as_str(), caption, payload)?;

        tracing::info!(
            "Media {} attached to pin {} ({} bytes)",
            id,
            pin_id,
            payload.len()
        );

        let record = self.db().get_media(&id)?.ok_or(Error::NotFound("Media"))?;
        Media::try_from(record)
    }

    /// Metadata for a pin's attachments, oldest first (visibility-gated)
    pub fn list_media(&self, pin_id: &str, viewer_id: &str) -> Result<Vec<Media>> {
        self.visible_record(pin_id, viewer_id)?;
        let records = self.db().get_media_for_pin(pin_id)?;
        records.into_iter().map(Media::try_from).collect()
    }

    /// One attachment's metadata and raw bytes (visibility-gated)
    pub fn media_payload(&self, media_id: &str, viewer_id: &str) -> Result<(Media, Vec<u8>)> {
        let record = self
            .db()
            .get_media(media_id)?
            .ok_or(Error::NotFound("Media"))?;

        // The attachment inherits its pin's visibility
        self.visible_record(&record.pin_id, viewer_id)?;

        let payload = self
            .db()
            .get_media_payload(media_id)?
            .ok_or(Error::NotFound("Media"))?;
        let media = Media::try_from(record)?;
        Ok((media, payload))
    }

    /// Remove one attachment (media owner only)
    pub fn remove_media(&self, media_id: &str, requester_id: &str) -> Result<()> {
        let record = self
            .db()
            .get_media(media_id)?
            .ok_or(Error::NotFound("Media"))?;
        if record.owner_id != requester_id {
            return Err(Error::Forbidden(
                "Only the media owner can remove it".into(),
            ));
        }

        self.db().delete_media(media_id, &record.pin_id)?;

        tracing::info!("Media {} removed from pin {}", media_id, record.pin_id);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::error::Error;
    use crate::pins::{MediaType, PinService, Privacy};
    use crate::storage::Database;

    async fn setup() -> (Arc<Database>, PinService) {
        let database = Arc::new(Database::open(None).await.unwrap());
        let service = PinService::new(database.clone());
        (database, service)
    }

    fn add_user(database: &Database, id: &str) {
        let email = format!("{}@example.com", id);
        database.insert_user(id, id, &email, "hash").unwrap();
    }

    #[tokio::test]
    async fn test_attach_media_owner_only() {
        let (database, pins) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "bob");

        let pin = pins
            .create_pin("alice", 0.0, 0.0, "T", "d", Privacy::Public)
            .unwrap();

        let media = pins
            .attach_media(&pin.id, "alice", &[0xFF, 0xD8, 0xFF], MediaType::Photo, Some("golden hour"))
            .unwrap();
        assert_eq!(media.media_type, MediaType::Photo);
        assert_eq!(media.size_bytes, 3);
        assert_eq!(media.caption.as_deref(), Some("golden hour"));

        assert_eq!(pins.get_pin(&pin.id, "alice").unwrap().media_count, 1);

        let not_owner = pins.attach_media(&pin.id, "bob", &[1], MediaType::Photo, None);
        assert!(matches!(not_owner, Err(Error::Forbidden(_))));

        let empty = pins.attach_media(&pin.id, "alice", &[], MediaType::Photo, None);
        assert!(matches!(empty, Err(Error::Validation(_))));

        let no_pin = pins.attach_media("missing", "alice", &[1], MediaType::Video, None);
        assert!(matches!(no_pin, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_media_payload_roundtrip() {
        let (database, pins) = setup().await;
        add_user(&database, "alice");

        let pin = pins
            .create_pin("alice", 0.0, 0.0, "T", "d", Privacy::Public)
            .unwrap();
        let media = pins
            .attach_media(&pin.id, "alice", &[1, 2, 3, 4], MediaType::Video, None)
            .unwrap();

        let (meta, payload) = pins.media_payload(&media.id, "alice").unwrap();
        assert_eq!(meta.id, media.id);
        assert_eq!(payload, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_media_inherits_pin_visibility() {
        let (database, pins) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "carol");

        let pin = pins
            .create_pin("alice", 0.0, 0.0, "Hidden", "d", Privacy::Private)
            .unwrap();
        let media = pins
            .attach_media(&pin.id, "alice", &[1], MediaType::Photo, None)
            .unwrap();

        assert!(matches!(
            pins.list_media(&pin.id, "carol"),
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            pins.media_payload(&media.id, "carol"),
            Err(Error::Forbidden(_))
        ));

        // Owner is unaffected
        assert_eq!(pins.list_media(&pin.id, "alice").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_media_updates_count() {
        let (database, pins) = setup().await;
        add_user(&database, "alice");
        add_user(&database, "bob");

        let pin = pins
            .create_pin("alice", 0.0, 0.0, "T", "d", Privacy::Public)
            .unwrap();
        let media = pins
            .attach_media(&pin.id, "alice", &[1], MediaType::Photo, None)
            .unwrap();

        let not_owner = pins.remove_media(&media.id, "bob");
        assert!(matches!(not_owner, Err(Error::Forbidden(_))));

        pins.remove_media(&media.id, "alice").unwrap();
        assert_eq!(pins.get_pin(&pin.id, "alice").unwrap().media_count, 0);

        let gone = pins.remove_media(&media.id, "alice");
        assert!(matches!(gone, Err(Error::NotFound(_))));
    }
}
