//! scriptflow-core
//!
//! プロセスエンジン向けの Script Task 実行コア。
//! 実行の変数に対してスクリプトを評価し、結果を変数に束縛し、
//! スクリプトが投げた業務エラーを境界エラーイベントへ流します。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, variables, definition, execution, state, outcome, errors）
//! - **ports**: 抽象化レイヤー（ScriptEvaluator, ErrorPropagation, IdGenerator, Clock）
//! - **impls**: ports の実装（ScriptingEngines, RhaiScriptEngine, BoundaryErrorPropagation）
//! - **behavior**: アクティビティの振る舞い（Script Task, 開始・終了イベント）
//! - **app**: アプリケーション層（builder, runtime, config, logging, status）

pub mod app;
pub mod behavior;
pub mod domain;
pub mod impls;
pub mod ports;
