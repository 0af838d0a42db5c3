//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! Script Task のコアが必要とするが所有しない協調者への境界です。
//!
//! # 設計原則
//! - 振る舞いは `Arc<dyn ...>` を構築時に受け取る（グローバル設定から引かない）
//! - 失敗は `ScriptError` で業務エラーとインフラエラーにタグ付けして返す
//! - 時刻と ID 生成は差し替え可能（テストでは FixedClock で固定）

pub mod clock;
pub mod error_propagation;
pub mod id_generator;
pub mod scripting;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::error_propagation::ErrorPropagation;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::scripting::{ScriptEngine, ScriptEvaluator};
