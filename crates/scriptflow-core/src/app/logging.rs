//! Logging - `tracing-subscriber` の初期化
//!
//! 環境変数:
//! - `RUST_LOG`: 標準のフィルタ指定、設定されていれば優先
//! - `SCRIPTFLOW_DEBUG`: このクレートを debug に上げ、target/file/line も出力

use std::env;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const DEBUG_ENV: &str = "SCRIPTFLOW_DEBUG";

pub struct LoggingConfig;

impl LoggingConfig {
    /// Install the global subscriber. A second call is a no-op.
    pub fn init() {
        let is_debug = Self::is_debug();

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Self::default_directives(is_debug)));

        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(is_debug)
            .with_file(is_debug)
            .with_line_number(is_debug);

        let installed = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_ok();

        if installed && is_debug {
            tracing::debug!("debug logging enabled");
        }
    }

    pub fn is_debug() -> bool {
        env::var(DEBUG_ENV).is_ok()
    }

    fn default_directives(is_debug: bool) -> &'static str {
        if is_debug {
            "scriptflow=debug,scriptflow_core=debug,info"
        } else {
            "scriptflow=info,scriptflow_core=info,warn"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_switch_raises_crate_level() {
        assert!(LoggingConfig::default_directives(true).contains("scriptflow_core=debug"));
        assert!(LoggingConfig::default_directives(false).starts_with("scriptflow=info"));
    }

    #[test]
    fn init_twice_does_not_panic() {
        LoggingConfig::init();
        LoggingConfig::init();
    }
}
