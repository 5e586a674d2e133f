// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for the mention rate limiter.
//!
//! Scripted chat servers and post fixtures shared by the integration tests.

#![allow(dead_code)]

pub mod fakes;
pub mod generators;
