// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Channel Mention Rate Limiter Service
//!
//! The chat server calls `/check` with every new post before publishing it.
//! Posts mentioning the whole channel are rejected while their author is
//! over the configured number of channel-wide mentions.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `MATTERMOST_URL`: Chat server base URL (default: http://localhost:8065)
//! - `MATTERMOST_TOKEN`: Access token for the chat server API
//! - `STORE_TIMEOUT_SECS`: Per-request timeout towards the chat server (default: 10)
//! - `MENTION_LIMIT_DISABLED`: Let every post through (default: false)
//! - `USER_TIMEOUT_IN_SECONDS`: Cooldown after the last mention (default: 600)
//! - `CHANNEL_MENTIONS_THRESHOLD`: Mentions allowed per cooldown (default: 3)
//! - `LOCALE_DIR`: Directory of `<locale>.json` notice translations
//! - `DEFAULT_LOCALE`: Locale for users without one (default: en)
//! - `METRICS_ENABLED`: Serve Prometheus metrics on /metrics (default: true)
//!
//! Limits can be changed at runtime with `PUT /config`.

use anyhow::Context;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mention_rate_limiter::{
    config::{Config, ConfigHandle, I18nConfig, MentionLimitConfig, MetricsConfig, StoreConfig},
    handlers::{router, AppState},
    i18n::Catalog,
    limiter::MentionLimiter,
    metrics::Metrics,
    rest::RestStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = load_config();
    info!(
        bind_addr = %config.bind_addr,
        chat_server = %config.store.base_url,
        disabled = config.limits.disabled,
        user_timeout_in_seconds = config.limits.user_timeout_in_seconds,
        channel_mentions_threshold = config.limits.channel_mentions_threshold,
        "Starting channel mention rate limiter"
    );

    // Create application state
    let store = RestStore::new(&config.store).context("Invalid chat server configuration")?;
    let catalog = match &config.i18n.locale_dir {
        Some(dir) => Catalog::load(dir, &config.i18n.default_locale)
            .with_context(|| format!("Failed to load translations from {}", dir.display()))?,
        None => Catalog::builtin(),
    };
    info!(locales = ?catalog.locales(), "Translations loaded");

    let metrics = if config.metrics.enabled {
        Some(Metrics::new()?)
    } else {
        None
    };

    let mut limiter = MentionLimiter::new(
        Arc::new(store),
        Arc::new(catalog),
        ConfigHandle::new(config.limits.clone()),
    )
    .with_default_locale(config.i18n.default_locale.clone());
    if let Some(metrics) = &metrics {
        limiter = limiter.with_metrics(metrics.clone());
    }

    let addr: SocketAddr = config.bind_addr.parse()?;
    let state = Arc::new(AppState {
        limiter,
        metrics,
        config,
    });

    // Start server
    let app = router(state);
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    let Ok(raw) = std::env::var(key) else {
        return default;
    };
    match raw.parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(key = %key, value = %raw, "Ignoring malformed environment variable, using default");
            default
        }
    }
}

/// Load configuration from environment variables.
fn load_config() -> Config {
    let defaults = Config::default();
    Config {
        bind_addr: env_or("BIND_ADDR", defaults.bind_addr),
        limits: MentionLimitConfig {
            disabled: env_or("MENTION_LIMIT_DISABLED", defaults.limits.disabled),
            user_timeout_in_seconds: env_or(
                "USER_TIMEOUT_IN_SECONDS",
                defaults.limits.user_timeout_in_seconds,
            ),
            channel_mentions_threshold: env_or(
                "CHANNEL_MENTIONS_THRESHOLD",
                defaults.limits.channel_mentions_threshold,
            ),
        },
        store: StoreConfig {
            base_url: env_or("MATTERMOST_URL", defaults.store.base_url),
            token: env_or("MATTERMOST_TOKEN", defaults.store.token),
            timeout_secs: env_or("STORE_TIMEOUT_SECS", defaults.store.timeout_secs),
        },
        i18n: I18nConfig {
            locale_dir: std::env::var("LOCALE_DIR").ok().map(PathBuf::from),
            default_locale: env_or("DEFAULT_LOCALE", defaults.i18n.default_locale),
        },
        metrics: MetricsConfig {
            enabled: env_or("METRICS_ENABLED", defaults.metrics.enabled),
            ..defaults.metrics
        },
    }
}
