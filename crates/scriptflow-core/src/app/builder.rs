//! EngineBuilder - エンジンの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: `expect_languages()` と設定の
//!   `expected_languages` に挙げた言語は `build()` 時点で登録済みであること
//! - 開発体験の改善（足りない言語を一覧で返す）

use std::sync::Arc;

use crate::app::config::EngineConfig;
use crate::app::runtime::ProcessEngine;
use crate::impls::{BoundaryErrorPropagation, RegistryError, RhaiScriptEngine, ScriptingEngines};
use crate::ports::{ErrorPropagation, IdGenerator, ScriptEngine, SystemClock, UlidGenerator};

/// [`EngineBuilder::with_rhai`] が Rhai エンジンを登録する名前
pub const RHAI: &str = "rhai";

/// # 使用例
/// ```ignore
/// let engine = EngineBuilder::new()
///     .with_config(config)
///     .with_rhai()
///     .expect_languages(&["rhai", "js-like"])
///     .build()?;
/// ```
pub struct EngineBuilder {
    config: EngineConfig,
    engines: ScriptingEngines,
    with_rhai: bool,
    expected_languages: Vec<String>,
    error_propagation: Option<Arc<dyn ErrorPropagation>>,
    id_generator: Option<Arc<dyn IdGenerator>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing script languages: {0:?}. These languages were expected but not registered.")]
    MissingLanguages(Vec<String>),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            engines: ScriptingEngines::new(),
            with_rhai: false,
            expected_languages: Vec::new(),
            error_propagation: None,
            id_generator: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// `build()` 時に設定の limits で [`RhaiScriptEngine`] を `rhai` として登録
    pub fn with_rhai(mut self) -> Self {
        self.with_rhai = true;
        self
    }

    pub fn register_engine(
        mut self,
        language: &str,
        engine: Arc<dyn ScriptEngine>,
    ) -> Result<Self, RegistryError> {
        self.engines.register(language, engine)?;
        Ok(self)
    }

    pub fn expect_languages(mut self, languages: &[&str]) -> Self {
        self.expected_languages
            .extend(languages.iter().map(|language| language.to_string()));
        self
    }

    /// 省略時は [`BoundaryErrorPropagation`]
    pub fn with_error_propagation(mut self, propagation: Arc<dyn ErrorPropagation>) -> Self {
        self.error_propagation = Some(propagation);
        self
    }

    /// 省略時は SystemClock 上の ULID 生成器
    pub fn with_id_generator(mut self, generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = Some(generator);
        self
    }

    pub fn build(mut self) -> Result<ProcessEngine, BuildError> {
        if self.with_rhai {
            self.engines
                .register(RHAI, Arc::new(RhaiScriptEngine::new(&self.config.limits)))?;
        }
        for (alias, target) in &self.config.language_aliases {
            self.engines.alias(alias.clone(), target)?;
        }

        let registered = self.engines.registered_languages();
        let mut missing: Vec<String> = self
            .expected_languages
            .iter()
            .chain(&self.config.expected_languages)
            .filter(|language| !registered.contains(*language))
            .cloned()
            .collect();
        missing.sort();
        missing.dedup();
        if !missing.is_empty() {
            return Err(BuildError::MissingLanguages(missing));
        }

        let error_propagation: Arc<dyn ErrorPropagation> = match self.error_propagation {
            Some(propagation) => propagation,
            None => Arc::new(BoundaryErrorPropagation::new()),
        };
        let id_generator: Arc<dyn IdGenerator> = match self.id_generator {
            Some(generator) => generator,
            None => Arc::new(UlidGenerator::new(SystemClock)),
        };

        Ok(ProcessEngine::new(
            Arc::new(self.engines),
            error_propagation,
            id_generator,
            self.config.default_language,
            self.config.max_steps,
        ))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
