//! # Pins Module
//!
//! Pins are mapped moments: a titled location on the map with a privacy
//! tier, likes, comments, and media attachments.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           PINS MODULE                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐      ┌──────────────┐      ┌──────────────┐           │
//! │  │  Service    │      │  Engagement  │      │    Media     │           │
//! │  │             │      │              │      │              │           │
//! │  │ - Create    │      │ - Like       │      │ - Attach     │           │
//! │  │ - Get/List  │      │ - Unlike     │      │ - List       │           │
//! │  │ - Search    │      │ - Comment    │      │ - Payload    │           │
//! │  │ - Delete    │      │ - Listings   │      │ - Remove     │           │
//! │  └──────┬──────┘      └──────┬───────┘      └──────┬───────┘           │
//! │         │                   │                     │                   │
//! │         └───────────────────┼─────────────────────┘                   │
//! │                             ▼                                          │
//! │              ┌──────────────────────────────┐                          │
//! │              │   Visibility rule            │                          │
//! │              │   public  → everyone         │                          │
//! │              │   friends → owner + friends  │                          │
//! │              │   private → owner only       │                          │
//! │              └──────────────────────────────┘                          │
//! │                                                                         │
//! │  Deleting a pin cascades to its media, likes, and comments in one     │
//! │  transaction. Likes are a set (idempotent), comments append-only.      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod service;
mod engagement;
mod media;

pub use service::{Pin, PinService, Privacy, SEARCH_LIMIT};
pub use engagement::Comment;
pub use media::{Media, MediaType};
