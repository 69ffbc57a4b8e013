//! Loading, environment overrides and validation.
//!
//! Load order:
//!
//! 1. Parse TOML from a string or file (`from_toml_str`, `from_file`).
//! 2. Apply `SIFT_*` environment overrides (`apply_env`). Tests inject a
//!    lookup function through `apply_env_with` instead of touching the
//!    process environment.
//! 3. `validate()` before the first stage runs. Every problem found here is
//!    `SiftError::FatalConfig` and aborts the run.

use std::path::Path;
use std::str::FromStr;

use tracing::{debug, warn};

use sift_contracts::error::{SiftError, SiftResult};

use crate::settings::{ProviderKind, SiftConfig};

/// Environment variables understood by `apply_env`.
pub const ENV_VARS: &[&str] = &[
    "SIFT_SPEED_MODE",
    "SIFT_LANGUAGE",
    "SIFT_USE_WEB",
    "SIFT_DEADLINE_MS",
    "SIFT_QUERY_EXPANSION",
    "SIFT_TOP_K",
    "SIFT_MAX_RESULTS",
    "SIFT_MAX_PER_DOMAIN",
    "SIFT_MIN_FOREIGN_SOURCES",
    "SIFT_CACHE_TTL_SECS",
    "SIFT_CACHE_CAPACITY",
    "SIFT_EXECUTOR_CONCURRENCY",
    "SIFT_PROVIDER",
    "SIFT_PROVIDER_ENDPOINT",
    "SIFT_GENERATION_API_KEY",
    "SIFT_SEARCH_API_KEY",
];

fn fatal(reason: impl Into<String>) -> SiftError {
    SiftError::FatalConfig {
        reason: reason.into(),
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> SiftResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| fatal(format!("invalid value '{raw}' for {name}: {e}")))
}

fn parse_bool(name: &str, raw: &str) -> SiftResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(fatal(format!("invalid boolean '{raw}' for {name}"))),
    }
}

impl SiftConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `SiftError::FatalConfig` if the TOML is malformed or does not
    /// match the `SiftConfig` schema.
    pub fn from_toml_str(s: &str) -> SiftResult<Self> {
        toml::from_str(s).map_err(|e| fatal(format!("failed to parse config TOML: {e}")))
    }

    /// Read the file at `path` and parse it as TOML.
    pub fn from_file(path: &Path) -> SiftResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| fatal(format!("failed to read config file '{}': {e}", path.display())))?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&contents)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> SiftResult<()> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Apply overrides using `lookup` to read variables.
    ///
    /// Empty values are ignored. Unparseable values are `FatalConfig`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> SiftResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        for &name in ENV_VARS {
            let Some(raw) = lookup(name).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            debug!(variable = name, "applying environment override");

            match name {
                "SIFT_SPEED_MODE" => self.run.speed_mode = raw.parse()?,
                "SIFT_LANGUAGE" => self.run.language = raw.trim().to_string(),
                "SIFT_USE_WEB" => self.run.use_web = parse_bool(name, &raw)?,
                "SIFT_DEADLINE_MS" => self.run.deadline_ms = parse_var(name, &raw)?,
                "SIFT_QUERY_EXPANSION" => self.run.query_expansion = parse_bool(name, &raw)?,
                "SIFT_TOP_K" => self.retrieval.top_k = parse_var(name, &raw)?,
                "SIFT_MAX_RESULTS" => self.retrieval.max_results = parse_var(name, &raw)?,
                "SIFT_MAX_PER_DOMAIN" => self.retrieval.max_per_domain = parse_var(name, &raw)?,
                "SIFT_MIN_FOREIGN_SOURCES" => {
                    self.retrieval.min_foreign_sources = parse_var(name, &raw)?
                }
                "SIFT_CACHE_TTL_SECS" => self.cache.ttl_secs = parse_var(name, &raw)?,
                "SIFT_CACHE_CAPACITY" => self.cache.capacity = parse_var(name, &raw)?,
                "SIFT_EXECUTOR_CONCURRENCY" => self.executor.concurrency = parse_var(name, &raw)?,
                "SIFT_PROVIDER" => {
                    self.provider.kind = match raw.trim().to_ascii_lowercase().as_str() {
                        "offline" => ProviderKind::Offline,
                        "remote" => ProviderKind::Remote,
                        other => return Err(fatal(format!("unknown provider '{other}'"))),
                    }
                }
                "SIFT_PROVIDER_ENDPOINT" => self.provider.endpoint = Some(raw.trim().to_string()),
                "SIFT_GENERATION_API_KEY" => self.provider.generation_api_key = Some(raw),
                "SIFT_SEARCH_API_KEY" => self.provider.search_api_key = Some(raw),
                _ => {}
            }
        }
        Ok(())
    }

    /// Check ranges and credentials.
    ///
    /// # Errors
    ///
    /// `FatalConfig` naming the first offending field.
    pub fn validate(&self) -> SiftResult<()> {
        let r = &self.retrieval;

        if self.run.language.trim().is_empty() {
            return Err(fatal("run.language must not be empty"));
        }
        if self.run.deadline_ms != 0 && self.run.deadline_ms < 100 {
            return Err(fatal(format!(
                "run.deadline_ms must be 0 (no deadline) or at least 100, got {}",
                self.run.deadline_ms
            )));
        }
        if !(1..=50).contains(&r.top_k) {
            return Err(fatal(format!("retrieval.top_k must be in 1..=50, got {}", r.top_k)));
        }
        if !(1..=50).contains(&r.max_results) {
            return Err(fatal(format!(
                "retrieval.max_results must be in 1..=50, got {}",
                r.max_results
            )));
        }
        if r.max_per_domain == 0 {
            return Err(fatal("retrieval.max_per_domain must be at least 1"));
        }
        if self.cache.ttl_secs == 0 || self.cache.capacity == 0 {
            return Err(fatal("cache.ttl_secs and cache.capacity must be positive"));
        }
        if !(1..=64).contains(&self.executor.concurrency) {
            return Err(fatal(format!(
                "executor.concurrency must be in 1..=64, got {}",
                self.executor.concurrency
            )));
        }
        if self.executor.batch_size == 0 {
            return Err(fatal("executor.batch_size must be at least 1"));
        }

        let has_key = |key: &Option<String>| key.as_deref().is_some_and(|k| !k.trim().is_empty());
        if self.provider.kind == ProviderKind::Remote {
            if !has_key(&self.provider.generation_api_key) {
                return Err(fatal(
                    "provider.generation_api_key is required for the remote provider",
                ));
            }
            if self.run.use_web && !has_key(&self.provider.search_api_key) {
                warn!("no search API key configured; web search will return no results");
            }
        }

        Ok(())
    }

    /// `from_file` (or defaults when `path` is `None`), then `apply_env`,
    /// then `validate`.
    pub fn load(path: Option<&Path>) -> SiftResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }
}
