// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Records exchanged with the chat server.
//!
//! Field names follow the Mattermost v4 wire format so the same types can be
//! deserialized straight from the REST API and from the `/check` endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub channel_id: String,
    #[serde(default)]
    pub message: String,
    /// Creation time (milliseconds since the epoch on the wire)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub create_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        channel_id: impl Into<String>,
        message: impl Into<String>,
        create_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            channel_id: channel_id.into(),
            message: message.into(),
            create_at,
        }
    }
}

/// A channel, reduced to what the limiter needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub team_id: String,
}

/// Membership of a user in a channel of a team.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelMembership {
    #[serde(default)]
    pub team_id: String,
    pub channel_id: String,
    pub user_id: String,
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
    /// Preferred locale; empty means the server default
    #[serde(default)]
    pub locale: String,
}

/// One page of channel history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPage {
    /// Posts in the order the server returned them
    pub posts: Vec<Post>,
    /// More posts are available after this page
    pub has_next: bool,
    /// Post id to continue after
    pub next_cursor: Option<String>,
}

impl PostPage {
    /// A page with nothing after it.
    pub fn last(posts: Vec<Post>) -> Self {
        Self {
            posts,
            has_next: false,
            next_cursor: None,
        }
    }
}
