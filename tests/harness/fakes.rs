// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Scripted chat server.
//!
//! Every history page is set up explicitly, keyed by channel and cursor,
//! and every call is logged so tests can assert on the fetch sequence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mention_rate_limiter::{
    Channel, ChannelMembership, MessageStore, PostPage, StoreError, User,
};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct ScriptedStore {
    channels: HashMap<String, Channel>,
    memberships: Vec<ChannelMembership>,
    users: HashMap<String, User>,
    /// (channel, cursor) -> page; cursor `None` is the first page
    pages: HashMap<(String, Option<String>), Result<PostPage, StoreError>>,
    members_error: Option<StoreError>,
    notice_error: Option<StoreError>,
    calls: Mutex<Vec<String>>,
    notices: Mutex<Vec<(String, String, String)>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(mut self, channel_id: &str, team_id: &str) -> Self {
        self.channels.insert(
            channel_id.to_string(),
            Channel {
                id: channel_id.to_string(),
                team_id: team_id.to_string(),
            },
        );
        self
    }

    pub fn member(mut self, team_id: &str, channel_id: &str, user_id: &str) -> Self {
        self.memberships.push(ChannelMembership {
            team_id: team_id.to_string(),
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
        });
        self
    }

    pub fn user(mut self, user_id: &str, locale: &str) -> Self {
        self.users.insert(
            user_id.to_string(),
            User {
                id: user_id.to_string(),
                username: user_id.to_string(),
                locale: locale.to_string(),
            },
        );
        self
    }

    pub fn page(mut self, channel_id: &str, cursor: Option<&str>, page: PostPage) -> Self {
        self.pages.insert(
            (channel_id.to_string(), cursor.map(str::to_string)),
            Ok(page),
        );
        self
    }

    pub fn page_error(mut self, channel_id: &str, cursor: Option<&str>, err: StoreError) -> Self {
        self.pages
            .insert((channel_id.to_string(), cursor.map(str::to_string)), Err(err));
        self
    }

    pub fn members_error(mut self, err: StoreError) -> Self {
        self.members_error = Some(err);
        self
    }

    pub fn failing_notices(mut self, err: StoreError) -> Self {
        self.notice_error = Some(err);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Delivered notices as (user, channel, message).
    pub fn notices(&self) -> Vec<(String, String, String)> {
        self.notices.lock().unwrap().clone()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn scripted_page(&self, channel_id: &str, cursor: Option<&str>) -> Result<PostPage, StoreError> {
        self.pages
            .get(&(channel_id.to_string(), cursor.map(str::to_string)))
            .cloned()
            .unwrap_or_else(|| Ok(PostPage::default()))
    }
}

#[async_trait]
impl MessageStore for ScriptedStore {
    async fn get_channel(&self, channel_id: &str) -> Result<Channel, StoreError> {
        self.log(format!("channel {}", channel_id));
        self.channels
            .get(channel_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(channel_id.to_string()))
    }

    async fn get_channel_members_for_user(
        &self,
        team_id: &str,
        user_id: &str,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<ChannelMembership>, StoreError> {
        self.log(format!("members {} {} page {}", team_id, user_id, page));
        if let Some(err) = &self.members_error {
            return Err(err.clone());
        }
        Ok(self
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
        self.log(format!("since {} {}", channel_id, since.timestamp()));
        self.scripted_page(channel_id, None)
    }

    async fn get_posts_after(
        &self,
        channel_id: &str,
        cursor: &str,
        page: usize,
        per_page: usize,
    ) -> Result<PostPage, StoreError> {
        self.log(format!("after {} {} page {} per_page {}", channel_id, cursor, page, per_page));
        self.scripted_page(channel_id, Some(cursor))
    }

    async fn get_user(&self, user_id: &str) -> Result<User, StoreError> {
        self.log(format!("user {}", user_id));
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))
    }

    async fn send_ephemeral_post(
        &self,
        user_id: &str,
        channel_id: &str,
        message: &str,
    ) -> Result<(), StoreError> {
        self.log(format!("notice {} {}", user_id, channel_id));
        if let Some(err) = &self.notice_error {
            return Err(err.clone());
        }
        self.notices.lock().unwrap().push((
            user_id.to_string(),
            channel_id.to_string(),
            message.to_string(),
        ));
        Ok(())
    }
}
