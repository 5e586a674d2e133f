// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Recent history across a user's channels.
//!
//! Each channel is walked page by page by a [`ChannelHistory`]. The
//! [`HistoryAggregator`] drains them one channel after another and gives up
//! on the first failed page, so callers never see a partial history.

use crate::error::HistoryError;
use crate::models::Post;
use crate::store::MessageStore;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Posts requested per follow-up page.
pub const HISTORY_PAGE_SIZE: usize = 1000;

/// The channels to scan and how far back to look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryWindow {
    pub since: DateTime<Utc>,
    pub channel_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Start,
    After(String),
    Done,
}

/// Lazy page-by-page walk over one channel's history since an instant.
pub struct ChannelHistory<'a> {
    store: &'a dyn MessageStore,
    channel_id: String,
    since: DateTime<Utc>,
    cursor: Cursor,
}

impl<'a> ChannelHistory<'a> {
    pub fn new(store: &'a dyn MessageStore, channel_id: impl Into<String>, since: DateTime<Utc>) -> Self {
        Self {
            store,
            channel_id: channel_id.into(),
            since,
            cursor: Cursor::Start,
        }
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Fetch the next page. `Ok(None)` once the channel is exhausted.
    ///
    /// A failed fetch leaves the position unchanged, so calling again
    /// retries the same page.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Post>>, HistoryError> {
        let page = match &self.cursor {
            Cursor::Done => return Ok(None),
            Cursor::Start => self
                .store
                .get_posts_since(&self.channel_id, self.since)
                .await
                .map_err(|source| HistoryError::Since {
                    channel_id: self.channel_id.clone(),
                    source,
                })?,
            Cursor::After(cursor) => self
                .store
                .get_posts_after(&self.channel_id, cursor, 0, HISTORY_PAGE_SIZE)
                .await
                .map_err(|source| HistoryError::After {
                    channel_id: self.channel_id.clone(),
                    cursor: cursor.clone(),
                    source,
                })?,
        };

        self.cursor = if page.has_next {
            let next = page
                .next_cursor
                .clone()
                .or_else(|| page.posts.last().map(|p| p.id.clone()))
                .ok_or_else(|| HistoryError::MissingCursor {
                    channel_id: self.channel_id.clone(),
                })?;
            Cursor::After(next)
        } else {
            Cursor::Done
        };

        Ok(Some(page.posts))
    }

    /// Start over from the first page.
    pub fn restart(&mut self) {
        self.cursor = Cursor::Start;
    }
}

/// Collects history across channels.
pub struct HistoryAggregator<'a> {
    store: &'a dyn MessageStore,
}

impl<'a> HistoryAggregator<'a> {
    pub fn new(store: &'a dyn MessageStore) -> Self {
        Self { store }
    }

    /// All posts in the window, in retrieval order (channel by channel,
    /// server order within a channel).
    pub async fn collect(&self, window: &HistoryWindow) -> Result<Vec<Post>, HistoryError> {
        let mut posts = Vec::new();

        for channel_id in &window.channel_ids {
            let mut history = ChannelHistory::new(self.store, channel_id.as_str(), window.since);
            let mut pages = 0usize;
            while let Some(page) = history.next_page().await? {
                pages += 1;
                posts.extend(page);
            }
            debug!(channel_id = %channel_id, pages, "Channel history collected");
        }

        Ok(posts)
    }
}
