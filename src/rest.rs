// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! [`MessageStore`] over the Mattermost v4 REST API.

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::{Channel, ChannelMembership, Post, PostPage, User};
use crate::store::MessageStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// Post list as returned by the posts endpoints.
#[derive(Debug, Default, Deserialize)]
struct PostList {
    /// Post ids, newest first
    #[serde(default)]
    order: Vec<String>,
    #[serde(default)]
    posts: HashMap<String, Post>,
    #[serde(default)]
    has_next: Option<bool>,
    #[serde(default)]
    next_post_id: String,
}

impl PostList {
    fn into_page(mut self) -> PostPage {
        let posts: Vec<Post> = self
            .order
            .iter()
            .filter_map(|id| self.posts.remove(id))
            .collect();
        let has_next = self.has_next.unwrap_or(false);
        // Servers without `next_post_id` continue after the newest post.
        let next_cursor = if !has_next {
            None
        } else if !self.next_post_id.is_empty() {
            Some(self.next_post_id)
        } else {
            self.order.first().cloned()
        };
        PostPage {
            posts,
            has_next,
            next_cursor,
        }
    }
}

/// Chat server reached over HTTP with a bearer token.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: Url,
    token: String,
}

impl RestStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| StoreError::Transport(format!("invalid base URL {}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Transport(format!(
                "invalid base URL {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport("base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .extend(["api", "v4"])
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, StoreError> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        check_status(response)
            .await?
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Err(StoreError::NotFound(message));
    }
    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl MessageStore for RestStore {
    async fn get_channel(&self, channel_id: &str) -> Result<Channel, StoreError> {
        let url = self.endpoint(&["channels", channel_id])?;
        self.get_json(url).await
    }

    async fn get_channel_members_for_user(
        &self,
        team_id: &str,
        user_id: &str,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<ChannelMembership>, StoreError> {
        let mut url = self.endpoint(&[
            "users", user_id, "teams", team_id, "channels", "members",
        ])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &per_page.to_string());
        self.get_json(url).await
    }

    async fn get_posts_since(
        &self,
        channel_id: &str,
        since: DateTime<Utc>,
    ) -> Result<PostPage, StoreError> {
        let mut url = self.endpoint(&["channels", channel_id, "posts"])?;
        url.query_pairs_mut()
            .append_pair("since", &since.timestamp_millis().to_string());
        let list: PostList = self.get_json(url).await?;
        Ok(list.into_page())
    }

    async fn get_posts_after(
        &self,
        channel_id: &str,
        cursor: &str,
        page: usize,
        per_page: usize,
    ) -> Result<PostPage, StoreError> {
        let mut url = self.endpoint(&["channels", channel_id, "posts"])?;
        url.query_pairs_mut()
            .append_pair("after", cursor)
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &per_page.to_string());
        let list: PostList = self.get_json(url).await?;
        Ok(list.into_page())
    }

    async fn get_user(&self, user_id: &str) -> Result<User, StoreError> {
        let url = self.endpoint(&["users", user_id])?;
        self.get_json(url).await
    }

    async fn send_ephemeral_post(
        &self,
        user_id: &str,
        channel_id: &str,
        message: &str,
    ) -> Result<(), StoreError> {
        let url = self.endpoint(&["posts", "ephemeral"])?;
        let body = serde_json::json!({
            "user_id": user_id,
            "post": {
                "channel_id": channel_id,
                "user_id": user_id,
                "message": message,
            },
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        check_status(response).await?;
        Ok(())
    }
}
