// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Chat server access.
//!
//! The limiter never talks to a chat server directly. It consumes the
//! [`MessageStore`] capability, which [`RestStore`](crate::rest::RestStore)
//! implements over the Mattermost REST API and [`MemoryStore`] implements
//! in memory.

use crate::error::StoreError;
use crate::models::{Channel, ChannelMembership, Post, PostPage, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Lookups and notice delivery the limiter needs from the chat server.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Look up a channel.
    async fn get_channel(&self, channel_id: &str) -> Result<Channel, StoreError>;

    /// List one page of the channels a user belongs to within a team.
    async fn get_channel_members_for_user(
        &self,
        team_id: &str,
        user_id: &str,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<ChannelMembership>, StoreError>;

    /// First page of posts created in a channel since an instant.
    async fn get_posts_since(
        &self,
        channel_id: &str,
        since: DateTime<Utc>,
    ) -> Result<PostPage, StoreError>;

    /// Posts following `cursor` (a post id) in a channel.
    async fn get_posts_after(
        &self,
        channel_id: &str,
        cursor: &str,
        page: usize,
        per_page: usize,
    ) -> Result<PostPage, StoreError>;

    /// Look up a user.
    async fn get_user(&self, user_id: &str) -> Result<User, StoreError>;

    /// Show a message to a single user in a channel without posting it.
    async fn send_ephemeral_post(
        &self,
        user_id: &str,
        channel_id: &str,
        message: &str,
    ) -> Result<(), StoreError>;
}

/// Store operations, used to inject failures into a [`MemoryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GetChannel,
    GetChannelMembers,
    GetPostsSince,
    GetPostsAfter,
    GetUser,
    SendEphemeralPost,
}

/// An ephemeral notice recorded by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EphemeralNotice {
    pub user_id: String,
    pub channel_id: String,
    pub message: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    channels: HashMap<String, Channel>,
    memberships: Vec<ChannelMembership>,
    users: HashMap<String, User>,
    /// Per channel, oldest first
    posts: HashMap<String, Vec<Post>>,
    notices: Vec<EphemeralNotice>,
    failing: HashSet<StoreOp>,
}

/// In-memory chat server.
///
/// Pages history the same way the REST API does: the first page after
/// `since` holds at most `page_size` posts and reports a cursor when more
/// follow.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    page_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_page_size(crate::history::HISTORY_PAGE_SIZE)
    }

    /// Create a store whose first history page holds at most `page_size` posts.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState::default())),
            page_size: page_size.max(1),
        }
    }

    pub async fn add_channel(&self, channel_id: &str, team_id: &str) {
        let mut state = self.state.write().await;
        state.channels.insert(
            channel_id.to_string(),
            Channel {
                id: channel_id.to_string(),
                team_id: team_id.to_string(),
            },
        );
    }

    pub async fn add_member(&self, team_id: &str, channel_id: &str, user_id: &str) {
        let membership = ChannelMembership {
            team_id: team_id.to_string(),
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
        };
        let mut state = self.state.write().await;
        if !state.memberships.contains(&membership) {
            state.memberships.push(membership);
        }
    }

    pub async fn add_user(&self, user_id: &str, username: &str, locale: &str) {
        let mut state = self.state.write().await;
        state.users.insert(
            user_id.to_string(),
            User {
                id: user_id.to_string(),
                username: username.to_string(),
                locale: locale.to_string(),
            },
        );
    }

    /// Store a post, keeping its channel's history in creation order.
    pub async fn add_post(&self, post: Post) {
        let mut state = self.state.write().await;
        let history = state.posts.entry(post.channel_id.clone()).or_default();
        let at = history.partition_point(|p| p.create_at <= post.create_at);
        history.insert(at, post);
    }

    /// Make every later call of `op` fail with a transport error.
    pub async fn fail_on(&self, op: StoreOp) {
        self.state.write().await.failing.insert(op);
    }

    /// Ephemeral notices delivered so far.
    pub async fn notices(&self) -> Vec<EphemeralNotice> {
        self.state.read().await.notices.clone()
    }

    fn check(state: &MemoryState, op: StoreOp) -> Result<(), StoreError> {
        if state.failing.contains(&op) {
            return Err(StoreError::Transport(format!("{:?} unavailable", op)));
        }
        Ok(())
    }

    fn page_from(posts: &[Post], per_page: usize) -> PostPage {
        let has_next = posts.len() > per_page;
        let posts: Vec<Post> = posts.iter().take(per_page).cloned().collect();
        let next_cursor = if has_next {
            posts.last().map(|p| p.id.clone())
        } else {
            None
        };
        PostPage {
            posts,
            has_next,
            next_cursor,
        }
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn get_channel(&self, channel_id: &str) -> Result<Channel, StoreError> {
        let state = self.state.read().await;
        Self::check(&state, StoreOp::GetChannel)?;
        state
            .channels
            .get(channel_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("channel {}", channel_id)))
    }

    async fn get_channel_members_for_user(
        &self,
        team_id: &str,
        user_id: &str,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<ChannelMembership>, StoreError> {
        let state = self.state.read().await;
        Self::check(&state, StoreOp::GetChannelMembers)?;
        Ok(state
            .memberships
            .iter()
            .filter(|m| m.team_id == team_id && m.user_id == user_id)
            .skip(page * per_page)
            .take(per_page)
            .cloned()
            .collect())
    }

    async fn get_posts_since(
        &self,
        channel_id: &str,
        since: DateTime<Utc>,
    ) -> Result<PostPage, StoreError> {
        let state = self.state.read().await;
        Self::check(&state, StoreOp::GetPostsSince)?;
        let history = state.posts.get(channel_id).map(Vec::as_slice).unwrap_or(&[]);
        let start = history.partition_point(|p| p.create_at < since);
        Ok(Self::page_from(&history[start..], self.page_size))
    }

    async fn get_posts_after(
        &self,
        channel_id: &str,
        cursor: &str,
        page: usize,
        per_page: usize,
    ) -> Result<PostPage, StoreError> {
        let state = self.state.read().await;
        Self::check(&state, StoreOp::GetPostsAfter)?;
        let history = state.posts.get(channel_id).map(Vec::as_slice).unwrap_or(&[]);
        let anchor = history
            .iter()
            .position(|p| p.id == cursor)
            .ok_or_else(|| StoreError::NotFound(format!("post {}", cursor)))?;
        let rest = &history[anchor + 1..];
        let skip = (page * per_page).min(rest.len());
        Ok(Self::page_from(&rest[skip..], per_page.max(1)))
    }

    async fn get_user(&self, user_id: &str) -> Result<User, StoreError> {
        let state = self.state.read().await;
        Self::check(&state, StoreOp::GetUser)?;
        state
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))
    }

    async fn send_ephemeral_post(
        &self,
        user_id: &str,
        channel_id: &str,
        message: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        Self::check(&state, StoreOp::SendEphemeralPost)?;
        state.notices.push(EphemeralNotice {
            user_id: user_id.to_string(),
            channel_id: channel_id.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}
