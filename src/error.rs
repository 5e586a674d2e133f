// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the mention rate limiter.

use thiserror::Error;

/// Failure reported by a [`MessageStore`](crate::store::MessageStore).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Failure while walking channel history.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("Failed to fetch history of channel {channel_id}: {source}")]
    Since {
        channel_id: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to fetch history of channel {channel_id} after {cursor}: {source}")]
    After {
        channel_id: String,
        cursor: String,
        #[source]
        source: StoreError,
    },

    #[error("Channel {channel_id} reported more history without a cursor")]
    MissingCursor { channel_id: String },
}

/// Failure of a single mention limit evaluation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LimiterError {
    #[error("Channel lookup failed for {channel_id}: {source}")]
    ChannelLookup {
        channel_id: String,
        #[source]
        source: StoreError,
    },

    #[error("Membership lookup failed for user {user_id} in team {team_id}: {source}")]
    MembershipLookup {
        team_id: String,
        user_id: String,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    HistoryFetch(#[from] HistoryError),

    #[error("User lookup failed for {user_id}: {source}")]
    UserLookup {
        user_id: String,
        #[source]
        source: StoreError,
    },

    #[error("Notice delivery failed for user {user_id}: {source}")]
    NoticeDelivery {
        user_id: String,
        #[source]
        source: StoreError,
    },
}

impl LimiterError {
    /// Rejection text safe to show the author. Names the failed step only.
    pub fn public_reason(&self) -> &'static str {
        match self {
            Self::ChannelLookup { .. } => {
                "Unable to check channel-wide mention limits: channel lookup failed"
            }
            Self::MembershipLookup { .. } => {
                "Unable to check channel-wide mention limits: channel membership lookup failed"
            }
            Self::HistoryFetch(_) => {
                "Unable to check channel-wide mention limits: message history lookup failed"
            }
            Self::UserLookup { .. } => {
                "Unable to check channel-wide mention limits: user lookup failed"
            }
            Self::NoticeDelivery { .. } => {
                "Unable to deliver the channel-wide mention limit notice"
            }
        }
    }
}
