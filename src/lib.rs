// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Channel Mention Rate Limiter
//!
//! This crate decides whether a new chat post may go through when it
//! mentions the whole channel (`@channel`, `@all`, `@here`):
//!
//! - Counts the author's channel-wide mentions across their team channels
//! - Blocks once the count exceeds the configured threshold
//! - Keeps blocking until the cooldown after the latest mention has passed
//! - Tells the author privately, in their locale, when they may try again
//! - Rejects the post when the chat server cannot be queried
//!
//! No state is kept between posts; every check is recomputed from history.

pub mod config;
pub mod cooldown;
pub mod error;
pub mod handlers;
pub mod history;
pub mod i18n;
pub mod limiter;
pub mod mention;
pub mod metrics;
pub mod models;
pub mod rest;
pub mod store;

pub use config::{Config, ConfigHandle, MentionLimitConfig};
pub use error::{HistoryError, LimiterError, StoreError};
pub use i18n::{Catalog, Translator};
pub use limiter::{MentionLimiter, RateLimitDecision};
pub use models::{Channel, ChannelMembership, Post, PostPage, User};
pub use rest::RestStore;
pub use store::{MemoryStore, MessageStore};
