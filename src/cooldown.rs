// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Cooldown arithmetic.
//!
//! A user who went over the threshold has to wait until their most recent
//! channel-wide mention is `timeout` old.

use crate::models::Post;
use chrono::{DateTime, Duration, Utc};
use std::borrow::Borrow;

/// Longest timeout honoured (about a century).
pub const MAX_TIMEOUT_SECS: u64 = 3_155_760_000;

/// Convert a configured timeout into a signed duration.
pub fn timeout_duration(timeout_secs: u64) -> Duration {
    Duration::seconds(timeout_secs.min(MAX_TIMEOUT_SECS) as i64)
}

/// Sort posts newest first. Posts created at the same instant keep their
/// relative order.
pub fn sort_posts_by_creation_date<P: Borrow<Post>>(posts: &mut [P]) {
    posts.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}

fn created_at<P: Borrow<Post>>(post: &P) -> DateTime<Utc> {
    <P as Borrow<Post>>::borrow(post).create_at
}

/// When a user may mention the channel again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    /// Creation time of the most recent qualifying mention
    pub last_mention_at: DateTime<Utc>,
    /// End of the cooldown window
    pub expires_at: DateTime<Utc>,
    /// `expires_at - now`; zero or negative once the window has passed
    pub remaining: Duration,
}

impl Cooldown {
    /// The window has already passed.
    pub fn is_lapsed(&self) -> bool {
        self.remaining <= Duration::zero()
    }

    /// Remaining wait, if any.
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        if self.is_lapsed() {
            return None;
        }
        self.remaining.to_std().ok()
    }
}

/// Derive the cooldown from the qualifying mentions. `None` when there are none.
pub fn compute_cooldown<P: Borrow<Post> + Clone>(
    qualifying: &[P],
    timeout: Duration,
    now: DateTime<Utc>,
) -> Option<Cooldown> {
    let mut sorted = qualifying.to_vec();
    sort_posts_by_creation_date(&mut sorted);
    let last_mention_at = created_at(sorted.first()?);

    let expires_at = last_mention_at
        .checked_add_signed(timeout)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    Some(Cooldown {
        last_mention_at,
        expires_at,
        remaining: expires_at.signed_duration_since(now),
    })
}
