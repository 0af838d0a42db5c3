//! Impls - ports の実装
//!
//! このモジュールには ports のデフォルト実装を含めます。
//! `EngineBuilder` は何も指定されなければこれらを組み込みます。
//!
//! # 含まれる実装
//! - **ScriptingEngines**: 言語レジストリ、デフォルトの `ScriptEvaluator`
//! - **RhaiScriptEngine**: Rhai による `ScriptEngine`
//! - **BoundaryErrorPropagation**: 境界エラーイベントによる `ErrorPropagation`
//!
//! # 追加の言語
//! 別の言語は `ScriptEngine` を実装して
//! `EngineBuilder::register_engine` で登録します。

pub mod boundary_propagation;
pub mod rhai_engine;
pub mod scripting_engines;

pub use self::boundary_propagation::BoundaryErrorPropagation;
pub use self::rhai_engine::{RhaiScriptEngine, ScriptLimits};
pub use self::scripting_engines::{RegistryError, ScriptingEngines};
