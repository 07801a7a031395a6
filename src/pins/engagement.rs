//! # Pin Engagement
//!
//! Likes and comments, gated on pin visibility.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::CommentRecord;

/// A comment on a pin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique ID (uuid v4)
    pub id: String,
    /// The pin this comment belongs to
    pub pin_id: String,
    /// Who wrote it
    pub author_id: String,
    /// Author handle at the time of writing
    pub author_username: String,
    /// Comment body
    pub text: String,
    /// Creation timestamp (Unix seconds)
    pub created_at: i64,
}

impl From<CommentRecord> for Comment {
    fn from(record: CommentRecord) -> Self {
        Self {
            id: record.id,
            pin_id: record.pin_id,
            author_id: record.author_id,
            author_username: record.author_username,
            text: record.text,
            created_at: record.created_at,
        }
    }
}

impl super::PinService {
    /// Like a pin
    ///
    /// Likes are a set: liking twice is the same as liking once. Returns
    /// the pin's like count after the operation.
    pub fn like_pin(&self, pin_id: &str, viewer_id: &str) -> Result<i64> {
        self.visible_record(pin_id, viewer_id)?;

        let newly_added = self.db().add_like(pin_id, viewer_id)?;
        if newly_added {
            tracing::info!("Pin {} liked by {}", pin_id, viewer_id);
        }

        self.db().count_likes(pin_id)
    }

    /// Remove a like
    ///
    /// Idempotent like its counterpart. Returns the remaining like count.
    pub fn unlike_pin(&self, pin_id: &str, viewer_id: &str) -> Result<i64> {
        self.visible_record(pin_id, viewer_id)?;

        let removed = self.db().remove_like(pin_id, viewer_id)?;
        if removed {
            tracing::info!("Pin {} unliked by {}", pin_id, viewer_id);
        }

        self.db().count_likes(pin_id)
    }

    /// Ids of everyone who liked a pin, in like order
    pub fn likes(&self, pin_id: &str, viewer_id: &str) -> Result<Vec<String>> {
        self.visible_record(pin_id, viewer_id)?;
        self.db().get_likes(pin_id)
    }

    /// Append a comment to a pin
    pub fn comment_on_pin(&self, pin_id: &str, author_id: &str, text: &str) -> Result<Comment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Validation("Comment text must not be empty".into()));
        }

        self.visible_record(pin_id, author_id)?;

        // Handle is denormalized into the comment for display
        let author = self
            .db()
            .get_user(author_id)?
            .ok_or(Error::NotFound("User"))?;

        let id = Uuid::new_v4().to_string();
        self.db()
            .insert_comment(&id, pin_id, author_id, &author.username, text)?;

        tracing::info!("Comment added to pin {} by {}", pin_id, author_id);

        let record = self
            .db()
            .get_comment(&id)?
            .ok_or(Error::NotFound("Comment"))?;
        Ok(Comment::from(record))
    }

    /// A pin's comments in insertion order
    ///
    /// Comments are append-only; the order never changes.
    pub fn comments(&self, pin_id: &str, viewer_id: &str) -> Result<Vec<Comment>> {
        self.visible_record(pin_id, viewer_id)?;
        let records = self.db().get_comments(pin_id)?;
        Ok(records.into_iter().map(Comment::from).collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================
