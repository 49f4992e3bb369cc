//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Typed sections (`search`, `store`) fall back to their defaults when absent.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    /// Wraps an already assembled figment, e.g. `Toml::string` in tests.
    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn search_settings(&self) -> anyhow::Result<SearchSettings> {
        self.section_or_default("search")
    }

    pub fn store_settings(&self) -> anyhow::Result<StoreSettings> {
        self.section_or_default("store")
    }

    fn section_or_default<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        if self.figment.contains(key) { self.get(key) } else { Ok(T::default()) }
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.search_settings()?.validate()?;
        self.store_settings()?.validate()?;
        Ok(())
    }
}

/// Tuning knobs of the hybrid search engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Weight of semantic relevance in default weighted fusion.
    pub semantic_weight: f32,
    /// Weight of exact-match relevance in default weighted fusion.
    pub exact_weight: f32,
    /// Weights used when a section-number query falls back to fusion.
    pub section_semantic_weight: f32,
    pub section_exact_weight: f32,
    /// Maximum accepted vector distance for strict semantic search.
    pub distance_threshold: f32,
    /// Distance ceiling for expansion queries and the single default retry.
    pub relaxed_threshold: f32,
    /// Fusion fetches `overfetch * count` candidates per signal.
    pub overfetch: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            semantic_weight: 0.7,
            exact_weight: 0.3,
            section_semantic_weight: 0.3,
            section_exact_weight: 0.7,
            distance_threshold: 0.8,
            relaxed_threshold: 0.9,
            overfetch: 2,
        }
    }
}

impl SearchSettings {
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("semantic_weight", self.semantic_weight),
            ("exact_weight", self.exact_weight),
            ("section_semantic_weight", self.section_semantic_weight),
            ("section_exact_weight", self.section_exact_weight),
        ];
        for (name, w) in weights {
            if !(0.0..=1.0).contains(&w) {
                return Err(Error::InvalidConfig(format!("search.{name} must be within [0, 1], got {w}")));
            }
        }
        if !(self.distance_threshold >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "search.distance_threshold must be non-negative, got {}",
                self.distance_threshold
            )));
        }
        if !(self.relaxed_threshold >= self.distance_threshold) {
            return Err(Error::InvalidConfig(format!(
                "search.relaxed_threshold ({}) must not be below distance_threshold ({})",
                self.relaxed_threshold, self.distance_threshold
            )));
        }
        if self.overfetch == 0 {
            return Err(Error::InvalidConfig("search.overfetch must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Location and access limits of the persistent vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub db_path: String,
    pub table: String,
    pub meta_table: String,
    pub timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            db_path: "data/lancedb".to_string(),
            table: "chunks".to_string(),
            meta_table: "ragdb_meta".to_string(),
            timeout_secs: 10,
        }
    }
}

impl StoreSettings {
    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(Error::InvalidConfig("store.table must not be empty".to_string()));
        }
        if self.table == self.meta_table {
            return Err(Error::InvalidConfig("store.meta_table must differ from store.table".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::InvalidConfig("store.timeout_secs must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `db_path` after `~`/env expansion, resolved against `base` when relative.
    pub fn resolved_db_path(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.db_path)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
