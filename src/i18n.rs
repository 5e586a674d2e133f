// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Localized notice text.
//!
//! Bundles are flat JSON objects mapping message ids to templates with
//! `{name}` placeholders, one file per locale (`en.json`, `pt-BR.json`, ...).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, warn};

/// Notice shown to a user whose post was blocked.
pub const BLOCKED_NOTICE: &str = "mention_limit.blocked";

const FALLBACK_LOCALE: &str = "en";
const BUILTIN_EN: &str = include_str!("../assets/i18n/en.json");

/// Looks up message templates by locale and id.
pub trait Translator: Send + Sync {
    fn translate(&self, locale: &str, key: &str, params: &[(&str, String)]) -> String;
}

/// Catalog loading errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid bundle {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// In-memory translation bundles.
#[derive(Debug, Clone)]
pub struct Catalog {
    bundles: HashMap<String, HashMap<String, String>>,
    default_locale: String,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// English only.
    pub fn builtin() -> Self {
        let mut bundles = HashMap::new();
        match serde_json::from_str(BUILTIN_EN) {
            Ok(en) => {
                bundles.insert(FALLBACK_LOCALE.to_string(), en);
            }
            Err(e) => error!(error = %e, "Built-in English bundle is invalid"),
        }
        Self {
            bundles,
            default_locale: FALLBACK_LOCALE.to_string(),
        }
    }

    /// Built-in English plus every `*.json` bundle in `dir`.
    pub fn load(dir: &Path, default_locale: &str) -> Result<Self, CatalogError> {
        let mut catalog = Self::builtin();
        catalog.default_locale = default_locale.to_string();

        let entries = std::fs::read_dir(dir).map_err(|source| CatalogError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        for entry in entries {
            let path = entry
                .map_err(|source| CatalogError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(locale) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
            else {
                continue;
            };

            let raw = std::fs::read_to_string(&path).map_err(|source| CatalogError::Io {
                path: path.clone(),
                source,
            })?;
            let bundle: HashMap<String, String> = serde_json::from_str(&raw)
                .map_err(|source| CatalogError::Parse {
                    path: path.clone(),
                    source,
                })?;

            debug!(locale = %locale, messages = bundle.len(), "Loaded translation bundle");
            catalog.insert(&locale, bundle);
        }

        Ok(catalog)
    }

    /// Add or extend a locale's bundle.
    pub fn insert(&mut self, locale: &str, messages: HashMap<String, String>) {
        self.bundles
            .entry(locale.to_string())
            .or_default()
            .extend(messages);
    }

    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.bundles.keys().map(String::as_str).collect();
        locales.sort_unstable();
        locales
    }

    fn lookup(&self, locale: &str, key: &str) -> Option<&str> {
        let base = locale.split(['-', '_']).next().unwrap_or(locale);
        [locale, base, self.default_locale.as_str(), FALLBACK_LOCALE]
            .into_iter()
            .filter(|l| !l.is_empty())
            .find_map(|l| self.bundles.get(l).and_then(|b| b.get(key)))
            .map(String::as_str)
    }
}

impl Translator for Catalog {
    fn translate(&self, locale: &str, key: &str, params: &[(&str, String)]) -> String {
        let Some(template) = self.lookup(locale, key) else {
            warn!(locale = %locale, key = %key, "Missing translation");
            return key.to_string();
        };
        render(template, params)
    }
}

fn render(template: &str, params: &[(&str, String)]) -> String {
    params.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{}}}", name), value)
    })
}
