// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the mention rate limiter.
//!
//! The limiter settings can be replaced at runtime through
//! [`ConfigHandle::reload`]; everything else is read once at startup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

/// Configuration for the mention rate limiter service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Mention limit settings (hot-reloadable)
    #[serde(default)]
    pub limits: MentionLimitConfig,

    /// Chat server connection
    #[serde(default)]
    pub store: StoreConfig,

    /// Notice translations
    #[serde(default)]
    pub i18n: I18nConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Channel-wide mention limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionLimitConfig {
    /// Let every post through (default: false)
    #[serde(default)]
    pub disabled: bool,

    /// Cooldown after the last channel-wide mention, in seconds; 0 disables
    /// the limiter (default: 600)
    #[serde(
        default = "default_user_timeout",
        alias = "userTimeoutInSeconds",
        alias = "UserTimeoutInSeconds"
    )]
    pub user_timeout_in_seconds: u64,

    /// Channel-wide mentions allowed within the cooldown window (default: 3)
    #[serde(
        default = "default_mentions_threshold",
        alias = "channelMentionsThreshold",
        alias = "ChannelMentionsThreshold"
    )]
    pub channel_mentions_threshold: u64,
}

/// Chat server REST API connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Server base URL (default: http://localhost:8065)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bot or personal access token
    #[serde(default, skip_serializing)]
    pub token: String,

    /// Per-request timeout in seconds (default: 10)
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

/// Translation catalog location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct I18nConfig {
    /// Directory holding `<locale>.json` bundles; built-in English only when unset
    #[serde(default)]
    pub locale_dir: Option<PathBuf>,

    /// Locale used when a user has none (default: en)
    #[serde(default = "default_locale")]
    pub default_locale: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_user_timeout() -> u64 {
    600
}

fn default_mentions_threshold() -> u64 {
    3
}

fn default_base_url() -> String {
    "http://localhost:8065".to_string()
}

fn default_store_timeout() -> u64 {
    10
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            limits: MentionLimitConfig::default(),
            store: StoreConfig::default(),
            i18n: I18nConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for MentionLimitConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            user_timeout_in_seconds: default_user_timeout(),
            channel_mentions_threshold: default_mentions_threshold(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: String::new(),
            timeout_secs: default_store_timeout(),
        }
    }
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            locale_dir: None,
            default_locale: default_locale(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl MentionLimitConfig {
    /// Whether posts should be checked at all.
    pub fn is_active(&self) -> bool {
        !self.disabled && self.user_timeout_in_seconds > 0
    }
}

impl StoreConfig {
    /// Get the request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Shared, swappable mention limit settings.
///
/// Readers clone the current snapshot and release the lock straight away;
/// a reload swaps in a new snapshot without touching the old one.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    current: Arc<RwLock<Arc<MentionLimitConfig>>>,
}

impl ConfigHandle {
    pub fn new(config: MentionLimitConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// The settings in effect right now.
    pub async fn snapshot(&self) -> Arc<MentionLimitConfig> {
        self.current.read().await.clone()
    }

    /// Replace the settings wholesale.
    pub async fn reload(&self, config: MentionLimitConfig) {
        let next = Arc::new(config);
        info!(
            disabled = next.disabled,
            user_timeout_in_seconds = next.user_timeout_in_seconds,
            channel_mentions_threshold = next.channel_mentions_threshold,
            "Mention limit configuration reloaded"
        );
        *self.current.write().await = next;
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(MentionLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_setting_names() {
        let config: MentionLimitConfig = serde_json::from_str(
            r#"{"disabled": true, "userTimeoutInSeconds": 30, "channelMentionsThreshold": 1}"#,
        )
        .unwrap();

        assert!(config.disabled);
        assert_eq!(config.user_timeout_in_seconds, 30);
        assert_eq!(config.channel_mentions_threshold, 1);
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: Config = serde_json::from_str(r#"{"limits": {"disabled": true}}"#).unwrap();

        assert!(config.limits.disabled);
        assert_eq!(config.limits.user_timeout_in_seconds, 600);
        assert_eq!(config.limits.channel_mentions_threshold, 3);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.metrics.path, "/metrics");
        assert_eq!(config.store.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_negative_values_rejected() {
        let result: Result<MentionLimitConfig, _> =
            serde_json::from_str(r#"{"userTimeoutInSeconds": -5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_is_active() {
        assert!(MentionLimitConfig::default().is_active());

        let disabled = MentionLimitConfig {
            disabled: true,
            ..Default::default()
        };
        assert!(!disabled.is_active());

        let no_timeout = MentionLimitConfig {
            user_timeout_in_seconds: 0,
            ..Default::default()
        };
        assert!(!no_timeout.is_active());
    }

    #[test]
    fn test_token_not_serialized() {
        let store = StoreConfig {
            token: "secret".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&store).unwrap();
        assert!(!json.contains("secret"));
    }

    #[tokio::test]
    async fn test_reload_swaps_snapshot() {
        let handle = ConfigHandle::default();
        let before = handle.snapshot().await;

        handle
            .reload(MentionLimitConfig {
                channel_mentions_threshold: 10,
                ..Default::default()
            })
            .await;

        let after = handle.snapshot().await;
        assert_eq!(before.channel_mentions_threshold, 3);
        assert_eq!(after.channel_mentions_threshold, 10);
    }
}
