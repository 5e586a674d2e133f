// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Channel-wide mention rate limiter.
//!
//! Every post that mentions the whole channel is checked against the
//! author's recent history across all channels of the team:
//!
//! 1. Collect the team's channels the author belongs to
//! 2. Collect their posts since `now - timeout`
//! 3. Count the author's own channel-wide mentions
//! 4. Over the threshold and still inside the cooldown: block, and tell the
//!    author privately when they may mention the channel again
//!
//! Nothing is remembered between posts. Lookup failures reject the post.

use crate::config::ConfigHandle;
use crate::cooldown::{compute_cooldown, timeout_duration, Cooldown};
use crate::error::LimiterError;
use crate::history::{HistoryAggregator, HistoryWindow};
use crate::i18n::{Translator, BLOCKED_NOTICE};
use crate::mention::{exceeds_threshold, filter_user_channel_mentions, is_broadcast_mention};
use crate::metrics::{Metrics, OUTCOME_ALLOWED, OUTCOME_BLOCKED, OUTCOME_FAILED};
use crate::models::Post;
use crate::store::MessageStore;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Channel memberships requested per page.
pub const MEMBERSHIP_PAGE_SIZE: usize = 200;

/// How the cooldown end is shown in notices.
pub const EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Outcome of a mention limit check.
#[derive(Debug, Clone, PartialEq)]
pub enum RateLimitDecision {
    /// Post may go through unchanged
    Allowed,
    /// Post is rejected
    Blocked {
        /// Time until the author may mention the channel again
        retry_after: Duration,
        /// End of the cooldown window
        expires_at: DateTime<Utc>,
        /// Channel-wide mentions the author made inside the window
        mention_count: usize,
        /// Configured threshold
        threshold: u64,
        /// Rejection text for the author
        reason: String,
    },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Rejection text; empty when allowed.
    pub fn reason(&self) -> &str {
        match self {
            Self::Allowed => "",
            Self::Blocked { reason, .. } => reason,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Allowed => None,
            Self::Blocked { retry_after, .. } => Some(*retry_after),
        }
    }
}

/// Rejection text: further mentions allowed and the remaining wait.
pub fn block_reason(threshold: u64, remaining: chrono::Duration) -> String {
    let wait_secs = remaining.num_milliseconds() as f64 / 1000.0;
    format!(
        "Too many channel-wide mentions: only {} more allowed per cooldown period. \
         Please wait {:.2} seconds before mentioning the channel again.",
        threshold.saturating_sub(1),
        wait_secs
    )
}

/// Thread-safe mention limiter. Cheap to clone.
#[derive(Clone)]
pub struct MentionLimiter {
    store: Arc<dyn MessageStore>,
    translator: Arc<dyn Translator>,
    config: ConfigHandle,
    metrics: Option<Metrics>,
    default_locale: String,
}

impl MentionLimiter {
    pub fn new(
        store: Arc<dyn MessageStore>,
        translator: Arc<dyn Translator>,
        config: ConfigHandle,
    ) -> Self {
        Self {
            store,
            translator,
            config,
            metrics: None,
            default_locale: "en".to_string(),
        }
    }

    /// Count decisions in `metrics`.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Locale for users who have not picked one.
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    /// Decide whether a new post may go through.
    pub async fn check(&self, post: &Post) -> Result<RateLimitDecision, LimiterError> {
        self.check_at(post, Utc::now()).await
    }

    /// Decide as of `now`.
    pub async fn check_at(
        &self,
        post: &Post,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, LimiterError> {
        let result = self.decide(post, now).await;

        let outcome = match &result {
            Ok(RateLimitDecision::Allowed) => OUTCOME_ALLOWED,
            Ok(RateLimitDecision::Blocked {
                mention_count,
                threshold,
                retry_after,
                ..
            }) => {
                info!(
                    user_id = %post.user_id,
                    channel_id = %post.channel_id,
                    mention_count,
                    threshold,
                    retry_after_secs = retry_after.as_secs_f64(),
                    "Post blocked: channel-wide mention limit exceeded"
                );
                OUTCOME_BLOCKED
            }
            Err(err) => {
                warn!(
                    user_id = %post.user_id,
                    channel_id = %post.channel_id,
                    error = %err,
                    "Mention limit check failed, rejecting post"
                );
                OUTCOME_FAILED
            }
        };
        if let Some(metrics) = &self.metrics {
            metrics.record_decision(outcome);
        }

        result
    }

    /// Host hook: the post to publish (unchanged) or a rejection reason.
    ///
    /// Failed checks reject the post.
    pub async fn message_will_be_posted(&self, post: Post) -> (Option<Post>, String) {
        match self.check(&post).await {
            Ok(RateLimitDecision::Allowed) => (Some(post), String::new()),
            Ok(RateLimitDecision::Blocked { reason, .. }) => (None, reason),
            Err(err) => (None, err.public_reason().to_string()),
        }
    }

    async fn decide(
        &self,
        post: &Post,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, LimiterError> {
        if !is_broadcast_mention(&post.message) {
            return Ok(RateLimitDecision::Allowed);
        }

        let config = self.config.snapshot().await;
        if !config.is_active() {
            debug!(post_id = %post.id, "Mention limiter inactive");
            return Ok(RateLimitDecision::Allowed);
        }
        let threshold = config.channel_mentions_threshold;
        let timeout = timeout_duration(config.user_timeout_in_seconds);

        let since = now
            .checked_sub_signed(timeout)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let window = self.history_window(post, since).await?;
        let history = HistoryAggregator::new(self.store.as_ref())
            .collect(&window)
            .await?;

        let qualifying = filter_user_channel_mentions(&history, &post.user_id);
        debug!(
            user_id = %post.user_id,
            channels = window.channel_ids.len(),
            scanned = history.len(),
            mentions = qualifying.len(),
            threshold,
            "Channel-wide mentions counted"
        );
        if !exceeds_threshold(qualifying.len(), threshold) {
            return Ok(RateLimitDecision::Allowed);
        }

        let Some(cooldown) = compute_cooldown(&qualifying, timeout, now) else {
            return Ok(RateLimitDecision::Allowed);
        };
        let Some(retry_after) = cooldown.retry_after() else {
            debug!(
                user_id = %post.user_id,
                expires_at = %cooldown.expires_at,
                "Cooldown already over, allowing post"
            );
            return Ok(RateLimitDecision::Allowed);
        };

        self.notify(post, threshold, &cooldown).await?;

        Ok(RateLimitDecision::Blocked {
            retry_after,
            expires_at: cooldown.expires_at,
            mention_count: qualifying.len(),
            threshold,
            reason: block_reason(threshold, cooldown.remaining),
        })
    }

    /// Channels to scan: the author's channels in the post's team, or just
    /// the post's channel for direct and group messages.
    async fn history_window(
        &self,
        post: &Post,
        since: DateTime<Utc>,
    ) -> Result<HistoryWindow, LimiterError> {
        let channel = self
            .store
            .get_channel(&post.channel_id)
            .await
            .map_err(|source| LimiterError::ChannelLookup {
                channel_id: post.channel_id.clone(),
                source,
            })?;

        if channel.team_id.is_empty() {
            return Ok(HistoryWindow {
                since,
                channel_ids: vec![channel.id],
            });
        }

        let mut seen = HashSet::new();
        let mut channel_ids = Vec::new();
        let mut page = 0;
        loop {
            let members = self
                .store
                .get_channel_members_for_user(
                    &channel.team_id,
                    &post.user_id,
                    page,
                    MEMBERSHIP_PAGE_SIZE,
                )
                .await
                .map_err(|source| LimiterError::MembershipLookup {
                    team_id: channel.team_id.clone(),
                    user_id: post.user_id.clone(),
                    source,
                })?;

            let fetched = members.len();
            for member in members {
                if seen.insert(member.channel_id.clone()) {
                    channel_ids.push(member.channel_id);
                }
            }
            if fetched < MEMBERSHIP_PAGE_SIZE {
                break;
            }
            page += 1;
        }

        Ok(HistoryWindow { since, channel_ids })
    }

    /// Tell the author privately why the post was rejected. Delivery
    /// failures are logged; the post stays rejected.
    async fn notify(
        &self,
        post: &Post,
        threshold: u64,
        cooldown: &Cooldown,
    ) -> Result<(), LimiterError> {
        let user = self
            .store
            .get_user(&post.user_id)
            .await
            .map_err(|source| LimiterError::UserLookup {
                user_id: post.user_id.clone(),
                source,
            })?;

        let locale = if user.locale.is_empty() {
            self.default_locale.as_str()
        } else {
            user.locale.as_str()
        };
        let text = self.translator.translate(
            locale,
            BLOCKED_NOTICE,
            &[
                ("threshold", threshold.to_string()),
                (
                    "expires_at",
                    cooldown.expires_at.format(EXPIRY_FORMAT).to_string(),
                ),
            ],
        );

        if let Err(source) = self
            .store
            .send_ephemeral_post(&post.user_id, &post.channel_id, &text)
            .await
        {
            let err = LimiterError::NoticeDelivery {
                user_id: post.user_id.clone(),
                source,
            };
            warn!(error = %err, "Blocked post notice not delivered");
            if let Some(metrics) = &self.metrics {
                metrics.record_notice_failure();
            }
        }

        Ok(())
    }
}
