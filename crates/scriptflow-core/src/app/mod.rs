//! App - アプリケーション層
//!
//! このモジュールは、ports と behavior を組み合わせて実行可能なエンジンにします。
//!
//! # 主要コンポーネント
//! - **EngineBuilder**: ワイヤリングと起動時検証（Fail-fast）
//! - **ProcessEngine / ProcessRunner**: 定義に沿ってトークンを進める
//! - **EngineConfig**: JSON 設定と環境変数による上書き
//! - **LoggingConfig**: `tracing-subscriber` の初期化
//! - **ProcessRun**: 実行結果のレポート

pub mod builder;
pub mod config;
pub mod logging;
pub mod runtime;
pub mod status;

pub use self::builder::{BuildError, EngineBuilder, RHAI};
pub use self::config::{ConfigError, EngineConfig};
pub use self::logging::LoggingConfig;
pub use self::runtime::{ProcessEngine, ProcessRunner};
pub use self::status::ProcessRun;
