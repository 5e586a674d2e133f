// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Post fixtures.

use chrono::{DateTime, Duration, TimeZone, Utc};
use mention_rate_limiter::Post;

/// 2023-05-23 at the given UTC time.
pub fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 5, 23, h, m, s).unwrap()
}

/// Four posts by user "1234": two channel-wide mentions, two plain messages.
pub fn mixed_posts() -> Vec<Post> {
    vec![
        Post::new("1234", "1234", "town-square", "@channel lala", at(5, 0, 30)),
        Post::new("1235", "1234", "town-square", "random message", at(5, 30, 30)),
        Post::new("1236", "1234", "town-square", "random message #2", at(5, 15, 0)),
        Post::new(
            "1237",
            "1234",
            "town-square",
            "@here please ignore this message",
            at(4, 45, 0) + Duration::nanoseconds(40),
        ),
    ]
}

/// `count` posts in `channel_id` by `user_id`, one minute apart from `start`.
pub fn posts(
    channel_id: &str,
    user_id: &str,
    message: &str,
    start: DateTime<Utc>,
    count: usize,
) -> Vec<Post> {
    (0..count)
        .map(|i| {
            Post::new(
                format!("{}-{}-{}", channel_id, user_id, i),
                user_id,
                channel_id,
                message,
                start + Duration::minutes(i as i64),
            )
        })
        .collect()
}
