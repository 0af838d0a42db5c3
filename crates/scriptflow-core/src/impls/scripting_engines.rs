//! ScriptingEngines - 言語名からエンジンへのレジストリ
//!
//! 起動時に可変で組み立て、その後は `Arc` の裏で読み取り専用に共有します。
//! 複数の名前（エイリアス）が同じエンジンを指せます。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::domain::{Execution, InfrastructureError, ScriptError};
use crate::ports::{ScriptEngine, ScriptEvaluator};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("a script engine is already registered for language `{0}`")]
    AlreadyRegistered(String),

    #[error("cannot alias `{alias}`: language `{target}` is not registered")]
    UnknownAliasTarget { alias: String, target: String },

    #[error("language name must not be empty")]
    EmptyName,
}

#[derive(Default)]
pub struct ScriptingEngines {
    engines: HashMap<String, Arc<dyn ScriptEngine>>,
}

impl ScriptingEngines {
    pub fn new() -> Self {
        Self {
            engines: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        language: impl Into<String>,
        engine: Arc<dyn ScriptEngine>,
    ) -> Result<(), RegistryError> {
        let language = language.into();
        if language.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.engines.contains_key(&language) {
            return Err(RegistryError::AlreadyRegistered(language));
        }
        self.engines.insert(language, engine);
        Ok(())
    }

    /// Make `alias` resolve to the engine registered under `target`.
    pub fn alias(
        &mut self,
        alias: impl Into<String>,
        target: &str,
    ) -> Result<(), RegistryError> {
        let alias = alias.into();
        let engine = self
            .engines
            .get(target)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownAliasTarget {
                alias: alias.clone(),
                target: target.to_string(),
            })?;
        self.register(alias, engine)
    }

    pub fn get(&self, language: &str) -> Option<Arc<dyn ScriptEngine>> {
        self.engines.get(language).cloned()
    }

    /// 登録済みの名前（ソート済み）
    pub fn registered_languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self.engines.keys().cloned().collect();
        languages.sort();
        languages
    }
}

#[async_trait]
impl ScriptEvaluator for ScriptingEngines {
    async fn evaluate(
        &self,
        script: &str,
        language: &str,
        execution: &mut Execution,
        store_script_variables: bool,
    ) -> Result<Value, ScriptError> {
        let engine = self
            .get(language)
            .ok_or_else(|| InfrastructureError::UnknownLanguage(language.to_string()))?;
        debug!(
            language,
            engine = engine.name(),
            execution = %execution.id(),
            "evaluating script"
        );
        engine.evaluate(script, execution, store_script_variables)
    }
}
