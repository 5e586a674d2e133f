// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for limiter decisions.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Decision outcome label values.
pub const OUTCOME_ALLOWED: &str = "allowed";
pub const OUTCOME_BLOCKED: &str = "blocked";
pub const OUTCOME_FAILED: &str = "failed";

/// Limiter metrics and the registry they are exported from.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    decisions: IntCounterVec,
    notice_failures: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let decisions = IntCounterVec::new(
            Opts::new(
                "mention_limiter_decisions_total",
                "Channel-wide mention posts checked, by outcome",
            ),
            &["outcome"],
        )?;
        let notice_failures = IntCounter::new(
            "mention_limiter_notice_failures_total",
            "Blocked-post notices that could not be delivered",
        )?;

        registry.register(Box::new(decisions.clone()))?;
        registry.register(Box::new(notice_failures.clone()))?;

        Ok(Self {
            registry,
            decisions,
            notice_failures,
        })
    }

    pub fn record_decision(&self, outcome: &str) {
        self.decisions.with_label_values(&[outcome]).inc();
    }

    pub fn record_notice_failure(&self) {
        self.notice_failures.inc();
    }

    pub fn decisions(&self, outcome: &str) -> u64 {
        self.decisions.with_label_values(&[outcome]).get()
    }

    pub fn notice_failures(&self) -> u64 {
        self.notice_failures.get()
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
