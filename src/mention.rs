// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Channel-wide mention detection and counting.

use crate::models::Post;

/// Tokens that notify every member of a channel.
pub const BROADCAST_MENTIONS: [&str; 3] = ["@channel", "@all", "@here"];

/// Check whether a message notifies the whole channel.
///
/// Plain case-sensitive substring match, so `@channel` inside a longer word
/// (for example a username like `@channelbot`) counts as well.
pub fn is_broadcast_mention(text: &str) -> bool {
    BROADCAST_MENTIONS.iter().any(|token| text.contains(token))
}

/// Posts written by `user_id` that mention the whole channel, in input order.
pub fn filter_user_channel_mentions<'a>(posts: &'a [Post], user_id: &str) -> Vec<&'a Post> {
    posts
        .iter()
        .filter(|p| p.user_id == user_id && is_broadcast_mention(&p.message))
        .collect()
}

/// A user may post while their count is at most the threshold.
pub fn exceeds_threshold(count: usize, threshold: u64) -> bool {
    count as u64 > threshold
}
