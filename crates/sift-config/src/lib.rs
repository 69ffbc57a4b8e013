//! # sift-config
//!
//! TOML and environment configuration for the sift research pipeline.
//!
//! ## Overview
//!
//! [`SiftConfig`] is read from a TOML document, overridden by `SIFT_*`
//! environment variables, and validated before any stage runs. Validation
//! failures are `SiftError::FatalConfig`, one of the two errors that abort
//! a run.
//!
//! [`ModePreset`] holds what each speed mode decides: stage budgets, whether
//! verify and critique run, and the critique safety margin.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use sift_config::{ModePreset, SiftConfig};
//!
//! let config = SiftConfig::load(Some(Path::new("config/sift.toml")))?;
//! let preset = ModePreset::for_mode(config.run.speed_mode);
//! ```

pub mod loader;
pub mod preset;
pub mod settings;

pub use loader::ENV_VARS;
pub use preset::ModePreset;
pub use settings::{
    CacheSection, ExecutorSection, ProviderKind, ProviderSection, RunSection, SiftConfig,
};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use sift_contracts::{
        error::SiftError,
        stage::{SpeedMode, StageKind},
    };

    use crate::{ModePreset, ProviderKind, SiftConfig};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn assert_fatal(result: Result<(), SiftError>, needle: &str) {
        match result {
            Err(SiftError::FatalConfig { reason }) => {
                assert!(reason.contains(needle), "expected '{needle}' in reason, got: {reason}")
            }
            other => panic!("expected FatalConfig, got {:?}", other),
        }
    }

    // ── 1. parsing ────────────────────────────────────────────────────────────

    /// An empty document is the default offline configuration and is valid.
    #[test]
    fn test_empty_document_uses_defaults() {
        let config = SiftConfig::from_toml_str("").unwrap();
        assert_eq!(config, SiftConfig::default());
        assert_eq!(config.provider.kind, ProviderKind::Offline);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let toml = r#"
            [run]
            speed_mode = "fast"
            deadline_ms = 0

            [retrieval]
            max_per_domain = 3
        "#;

        let config = SiftConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.run.speed_mode, SpeedMode::Fast);
        assert_eq!(config.run.language, "en");
        assert_eq!(config.retrieval.max_per_domain, 3);
        assert_eq!(config.retrieval.top_k, 6);

        let run = config.run_config();
        assert_eq!(run.deadline_ms, None, "0 disables the deadline");
        assert_eq!(run.retrieval.max_per_domain, 3);
    }

    #[test]
    fn test_malformed_toml_is_fatal() {
        let err = SiftConfig::from_toml_str("[run\nspeed_mode = ").unwrap_err();
        assert!(matches!(err, SiftError::FatalConfig { .. }));

        let err = SiftConfig::from_toml_str("[run]\nspeed_mode = \"warp\"").unwrap_err();
        assert!(matches!(err, SiftError::FatalConfig { .. }));
    }

    /// The shipped example file parses and validates.
    #[test]
    fn test_shipped_config_is_valid() {
        let config = SiftConfig::from_toml_str(include_str!("../../../config/sift.toml")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.run.speed_mode, SpeedMode::Balanced);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[run]\nlanguage = \"zh\"\n[cache]\ncapacity = 8").unwrap();

        let config = SiftConfig::from_file(file.path()).unwrap();
        assert_eq!(config.run.language, "zh");
        assert_eq!(config.cache.capacity, 8);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = SiftConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, SiftError::FatalConfig { .. }));
    }

    // ── 2. environment overrides ──────────────────────────────────────────────

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = SiftConfig::from_toml_str("[run]\nspeed_mode = \"thorough\"").unwrap();
        config
            .apply_env_with(env(&[
                ("SIFT_SPEED_MODE", "fast"),
                ("SIFT_USE_WEB", "false"),
                ("SIFT_DEADLINE_MS", "15000"),
                ("SIFT_MAX_PER_DOMAIN", "1"),
                ("SIFT_PROVIDER", "remote"),
                ("SIFT_GENERATION_API_KEY", "k-123"),
                ("SIFT_LANGUAGE", ""),
            ]))
            .unwrap();

        assert_eq!(config.run.speed_mode, SpeedMode::Fast);
        assert!(!config.run.use_web);
        assert_eq!(config.run.deadline_ms, 15_000);
        assert_eq!(config.retrieval.max_per_domain, 1);
        assert_eq!(config.provider.kind, ProviderKind::Remote);
        assert_eq!(config.run.language, "en", "empty values are ignored");
        config.validate().unwrap();
    }

    #[test]
    fn test_bad_env_value_is_fatal() {
        let mut config = SiftConfig::default();
        assert_fatal(
            config.apply_env_with(env(&[("SIFT_TOP_K", "many")])),
            "SIFT_TOP_K",
        );
        assert_fatal(
            config.apply_env_with(env(&[("SIFT_USE_WEB", "maybe")])),
            "SIFT_USE_WEB",
        );
    }

    // ── 3. validation ─────────────────────────────────────────────────────────

    /// A remote provider without a generation key cannot run.
    #[test]
    fn test_missing_credential_is_fatal() {
        let config = SiftConfig::from_toml_str("[provider]\nkind = \"remote\"").unwrap();
        assert_fatal(config.validate(), "generation_api_key");

        let config = SiftConfig::from_toml_str(
            "[provider]\nkind = \"remote\"\ngeneration_api_key = \"  \"",
        )
        .unwrap();
        assert_fatal(config.validate(), "generation_api_key");
    }

    #[test]
    fn test_out_of_range_values_are_fatal() {
        let mut config = SiftConfig::default();
        config.retrieval.top_k = 0;
        assert_fatal(config.validate(), "top_k");

        let mut config = SiftConfig::default();
        config.executor.concurrency = 100;
        assert_fatal(config.validate(), "concurrency");

        let mut config = SiftConfig::default();
        config.run.deadline_ms = 50;
        assert_fatal(config.validate(), "deadline_ms");

        let mut config = SiftConfig::default();
        config.retrieval.max_per_domain = 0;
        assert_fatal(config.validate(), "max_per_domain");
    }

    // ── 4. presets ────────────────────────────────────────────────────────────

    #[test]
    fn test_presets_gate_optional_stages() {
        let fast = ModePreset::for_mode(SpeedMode::Fast);
        assert!(!fast.verifies());
        assert_eq!(fast.budget(StageKind::Critique), None);
        assert_eq!(fast.max_iterations, 1);

        let balanced = ModePreset::for_mode(SpeedMode::Balanced);
        assert!(balanced.verifies());
        assert_eq!(balanced.max_iterations, 2);

        let thorough = ModePreset::for_mode(SpeedMode::Thorough);
        assert_eq!(thorough.max_iterations, 3);
        assert!(thorough.write.min_ms > balanced.write.min_ms);
    }

    #[test]
    fn test_with_min_ms_overrides_every_stage() {
        let preset = ModePreset::BALANCED.with_min_ms(800);
        for stage in StageKind::ALL {
            let budget = preset.budget(stage).unwrap();
            assert_eq!(budget.min_ms, 800, "stage {stage}");
        }
        assert_eq!(preset.plan.ratio, ModePreset::BALANCED.plan.ratio);
    }
}
