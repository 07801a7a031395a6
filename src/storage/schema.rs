//! # Database Schema
//!
//! SQL schema definitions for the MapMoments database.
//!
//! ## Schema Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         DATABASE SCHEMA                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐    ┌─────────────────┐      ┌─────────────────┐    │
//! │  │     users       │    │      pins       │      │     media       │    │
//! │  ├─────────────────┤    ├─────────────────┤      ├─────────────────┤    │
//! │  │ id              │◄───│ owner_id        │  ┌──►│ pin_id          │    │
//! │  │ username        │    │ title           │  │   │ owner_id        │    │
//! │  │ email           │    │ description     │  │   │ media_type      │    │
//! │  │ password_hash   │    │ latitude        │  │   │ caption         │    │
//! │  │ profile_photo   │    │ longitude       │  │   │ payload         │    │
//! │  │ created_at      │    │ privacy         │──┘   │ created_at      │    │
//! │  └─────────────────┘    │ media_count     │      └─────────────────┘    │
//! │                         │ created_at      │                             │
//! │                         └─────────────────┘                             │
//! │                            ▲           ▲                                │
//! │  ┌─────────────────┐       │           │       ┌─────────────────┐      │
//! │  │   pin_likes     │───────┘           └───────│    comments     │      │
//! │  ├─────────────────┤                           ├─────────────────┤      │
//! │  │ pin_id, user_id │                           │ pin_id          │      │
//! │  └─────────────────┘                           │ author_id, text │      │
//! │                                                └─────────────────┘      │
//! │                                                                         │
//! │  ┌─────────────────┐    ┌─────────────────┐      ┌─────────────────┐    │
//! │  │ friend_requests │    │   friendships   │      │     events      │    │
//! │  ├─────────────────┤    ├─────────────────┤      ├─────────────────┤    │
//! │  │ requester_id    │    │ user_id         │      │ owner_id        │    │
//! │  │ target_id       │    │ friend_id       │      │ event_date      │    │
//! │  │ status          │    │ (two mirrored   │      │ lat/lng/name    │    │
//! │  │ created_at      │    │  rows per pair) │      │ privacy         │    │
//! │  └─────────────────┘    └─────────────────┘      └─────────────────┘    │
//! │                                                                         │
//! │  ┌─────────────────┐    ┌─────────────────┐                             │
//! │  │    messages     │    │ event_attendees │                             │
//! │  ├─────────────────┤    ├─────────────────┤                             │
//! │  │ sender_id       │    │ event_id        │                             │
//! │  │ recipient_id    │    │ user_id         │                             │
//! │  │ content, read   │    └─────────────────┘                             │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL to create all tables
pub const CREATE_TABLES: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Users table
-- Accounts are created at registration and never hard-deleted
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    -- Unique handle shown on pins and comments
    username TEXT NOT NULL UNIQUE,
    -- Unique login address
    email TEXT NOT NULL UNIQUE,
    -- bcrypt hash; never leaves the storage layer
    password_hash TEXT NOT NULL,
    -- Optional profile photo payload
    profile_photo BLOB,
    -- When the account was registered
    created_at INTEGER NOT NULL
);

-- Pins table
-- A geotagged post; privacy gates who may see it
CREATE TABLE IF NOT EXISTS pins (
    id TEXT PRIMARY KEY,
    -- The creator; the only user who may delete the pin
    owner_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    -- WGS84 degrees, validated on the way in
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    -- Visibility tier
    privacy TEXT NOT NULL DEFAULT 'public' CHECK (privacy IN ('public', 'friends', 'private')),
    -- Maintained by media attach/remove
    media_count INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    FOREIGN KEY (owner_id) REFERENCES users(id)
);
CREATE INDEX IF NOT EXISTS idx_pins_owner ON pins(owner_id);
CREATE INDEX IF NOT EXISTS idx_pins_created ON pins(created_at DESC);

-- Pin likes table
-- Set semantics: at most one row per (pin, user)
CREATE TABLE IF NOT EXISTS pin_likes (
    pin_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (pin_id, user_id),
    FOREIGN KEY (pin_id) REFERENCES pins(id) ON DELETE CASCADE
);

-- Comments table
-- Append-only; rows are never updated or deleted while the pin lives
CREATE TABLE IF NOT EXISTS comments (
    id TEXT PRIMARY KEY,
    pin_id TEXT NOT NULL,
    author_id TEXT NOT NULL,
    -- Denormalized for display without a join
    author_username TEXT NOT NULL,
    text TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    FOREIGN KEY (pin_id) REFERENCES pins(id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS idx_comments_pin ON comments(pin_id, created_at);

-- Media table
-- Binary attachments; lifecycle bound to the parent pin
CREATE TABLE IF NOT EXISTS media (
    id TEXT PRIMARY KEY,
    pin_id TEXT NOT NULL,
    owner_id TEXT NOT NULL,
    -- 'photo' or 'video'
    media_type TEXT NOT NULL CHECK (media_type IN ('photo', 'video')),
    caption TEXT,
    payload BLOB NOT NULL,
    created_at INTEGER NOT NULL,
    FOREIGN KEY (pin_id) REFERENCES pins(id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS idx_media_pin ON media(pin_id, created_at);

-- Friend requests table
-- One row per request; 'none' is the absence of a row
CREATE TABLE IF NOT EXISTS friend_requests (
    id TEXT PRIMARY KEY,
    -- Who sent the request
    requester_id TEXT NOT NULL,
    -- Who the request is for
    target_id TEXT NOT NULL,
    -- Accepting flips the status; rows are kept for history
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'accepted')),
    created_at INTEGER NOT NULL,
    responded_at INTEGER
);
CREATE INDEX IF NOT EXISTS idx_friend_requests_target ON friend_requests(target_id, status);
CREATE INDEX IF NOT EXISTS idx_friend_requests_requester ON friend_requests(requester_id, status);
-- At most one live pending request per direction
CREATE UNIQUE INDEX IF NOT EXISTS idx_friend_requests_pending
    ON friend_requests(requester_id, target_id) WHERE status = 'pending';

-- Friendships table
-- Two mirrored rows per accepted pair, written in one transaction
CREATE TABLE IF NOT EXISTS friendships (
    user_id TEXT NOT NULL,
    friend_id TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, friend_id)
);

-- Events table
-- Scheduled gatherings; same privacy tiers as pins
CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    -- When the event takes place (Unix seconds)
    event_date INTEGER NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    location_name TEXT NOT NULL,
    privacy TEXT NOT NULL DEFAULT 'public' CHECK (privacy IN ('public', 'friends', 'private')),
    created_at INTEGER NOT NULL,
    FOREIGN KEY (owner_id) REFERENCES users(id)
);
CREATE INDEX IF NOT EXISTS idx_events_date ON events(event_date);

-- Event attendees table
-- Set semantics, like pin_likes
CREATE TABLE IF NOT EXISTS event_attendees (
    event_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (event_id, user_id),
    FOREIGN KEY (event_id) REFERENCES events(id) ON DELETE CASCADE
);

-- Messages table
-- Direct messages between friends
CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    sender_id TEXT NOT NULL,
    recipient_id TEXT NOT NULL,
    content TEXT NOT NULL,
    -- Has the recipient read this message?
    read INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender_id, created_at);
CREATE INDEX IF NOT EXISTS idx_messages_recipient ON messages(recipient_id, created_at);
"#;

/// Migration SQL from schema version 1 → 2
///
/// Adds events with attendance and direct messaging.
pub const MIGRATE_V1_TO_V2: &str = r#"
-- Events table
CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    event_date INTEGER NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    location_name TEXT NOT NULL,
    privacy TEXT NOT NULL DEFAULT 'public' CHECK (privacy IN ('public', 'friends', 'private')),
    created_at INTEGER NOT NULL,
    FOREIGN KEY (owner_id) REFERENCES users(id)
);
CREATE INDEX IF NOT EXISTS idx_events_date ON events(event_date);

-- Event attendees table
CREATE TABLE IF NOT EXISTS event_attendees (
    event_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (event_id, user_id),
    FOREIGN KEY (event_id) REFERENCES events(id) ON DELETE CASCADE
);

-- Messages table
CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    sender_id TEXT NOT NULL,
    recipient_id TEXT NOT NULL,
    content TEXT NOT NULL,
    read INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender_id, created_at);
CREATE INDEX IF NOT EXISTS idx_messages_recipient ON messages(recipient_id, created_at);

-- Update schema version
UPDATE schema_version SET version = 2;
"#;

/// SQL to drop all tables (for testing/reset)
pub const DROP_TABLES: &str = r#"
DROP TABLE IF EXISTS messages;
DROP TABLE IF EXISTS event_attendees;
DROP TABLE IF EXISTS events;
DROP TABLE IF EXISTS friendships;
DROP TABLE IF EXISTS friend_requests;
DROP TABLE IF EXISTS media;
DROP TABLE IF EXISTS comments;
DROP TABLE IF EXISTS pin_likes;
DROP TABLE IF EXISTS pins;
DROP TABLE IF EXISTS users;
DROP TABLE IF EXISTS schema_version;
"#;
