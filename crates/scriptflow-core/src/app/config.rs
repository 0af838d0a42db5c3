//! EngineConfig - JSON から読むエンジン設定
//!
//! ```json
//! {
//!   "default_language": "rhai",
//!   "language_aliases": { "js-like": "rhai" },
//!   "expected_languages": ["rhai", "js-like"],
//!   "limits": { "max_operations": 100000 },
//!   "max_steps": 1000
//! }
//! ```
//!
//! 全フィールド省略可。`SCRIPTFLOW_DEFAULT_LANGUAGE` で
//! `default_language` を上書きします。

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::impls::ScriptLimits;

pub const DEFAULT_LANGUAGE_ENV: &str = "SCRIPTFLOW_DEFAULT_LANGUAGE";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Language used by script tasks that do not name one.
    pub default_language: String,

    /// Extra language names, each mapped to a registered language.
    pub language_aliases: BTreeMap<String, String>,

    /// Languages that must be available once the engine is built.
    pub expected_languages: Vec<String>,

    pub limits: ScriptLimits,

    /// Upper bound on activities executed by one process run.
    pub max_steps: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_language: "rhai".to_string(),
            language_aliases: BTreeMap::new(),
            expected_languages: Vec::new(),
            limits: ScriptLimits::default(),
            max_steps: 10_000,
        }
    }
}

impl EngineConfig {
    /// Read, apply environment overrides, validate.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(raw)?;
        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(language) = lookup(DEFAULT_LANGUAGE_ENV).filter(|v| !v.trim().is_empty()) {
            self.default_language = language;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_language.trim().is_empty() {
            return Err(ConfigError::Invalid("default_language must not be empty".into()));
        }
        for (alias, target) in &self.language_aliases {
            if alias.trim().is_empty() || target.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language alias `{alias}` -> `{target}` has an empty name"
                )));
            }
        }
        if self.max_steps == 0 {
            return Err(ConfigError::Invalid("max_steps must be at least 1".into()));
        }
        Ok(())
    }
}
