use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::error;

use scriptflow_core::app::{EngineBuilder, EngineConfig, LoggingConfig, ProcessEngine};
use scriptflow_core::domain::{ProcessDefinition, ScriptError, VariableScope};

#[derive(Parser)]
#[command(name = "scriptflow", version, about = "Run script-task processes", author)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a process definition and print the final variables and history.
    Run {
        definition: PathBuf,
        /// Initial variables as a JSON object.
        #[arg(long)]
        vars: Option<String>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate a process definition.
    Check { definition: PathBuf },
    /// Evaluate a single script.
    Eval {
        language: String,
        script: String,
        #[arg(long)]
        vars: Option<String>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    LoggingConfig::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            definition,
            vars,
            config,
        } => handle_run(&definition, vars.as_deref(), config.as_deref()).await,
        Command::Check { definition } => handle_check(&definition),
        Command::Eval {
            language,
            script,
            vars,
            config,
        } => handle_eval(&language, &script, vars.as_deref(), config.as_deref()).await,
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => Ok(EngineConfig::from_path(path)?),
        None => Ok(EngineConfig::default().with_env_overrides()),
    }
}

fn build_engine(config: EngineConfig) -> anyhow::Result<ProcessEngine> {
    let engine = EngineBuilder::new()
        .with_config(config)
        .with_rhai()
        .build()?;
    Ok(engine)
}

fn load_definition(path: &Path) -> anyhow::Result<ProcessDefinition> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("cannot read definition `{}`", path.display()))?;
    let definition = ProcessDefinition::from_json(&raw)
        .with_context(|| format!("invalid definition `{}`", path.display()))?;
    Ok(definition)
}

fn parse_vars(vars: Option<&str>) -> anyhow::Result<VariableScope> {
    let Some(raw) = vars else {
        return Ok(VariableScope::new());
    };
    let value: Value = serde_json::from_str(raw).context("--vars is not valid JSON")?;
    Ok(VariableScope::try_from(value)?)
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn handle_run(
    definition: &Path,
    vars: Option<&str>,
    config: Option<&Path>,
) -> anyhow::Result<ExitCode> {
    let engine = build_engine(load_config(config)?)?;
    let definition = Arc::new(load_definition(definition)?);
    let variables = parse_vars(vars)?;

    let mut runner = engine.start(definition, variables)?;
    match runner.run_to_end().await {
        Ok(()) => {
            print_json(&serde_json::to_value(runner.into_run())?)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(kind = ?err.kind(), "process failed: {err}");
            print_json(&json!({
                "error": err.to_string(),
                "kind": err.kind(),
                "history": runner.history(),
                "variables": runner.execution().variables(),
            }))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn handle_check(definition: &Path) -> anyhow::Result<ExitCode> {
    let definition = load_definition(definition)?;
    println!(
        "definition `{}` is valid ({} activities, start `{}`)",
        definition.id,
        definition.activities.len(),
        definition.start
    );
    Ok(ExitCode::SUCCESS)
}

async fn handle_eval(
    language: &str,
    script: &str,
    vars: Option<&str>,
    config: Option<&Path>,
) -> anyhow::Result<ExitCode> {
    let engine = build_engine(load_config(config)?)?;
    let variables = parse_vars(vars)?;

    match engine.evaluate(language, script, variables).await {
        Ok((value, variables)) => {
            print_json(&json!({ "result": value, "variables": variables }))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(ScriptError::Business(business)) => {
            print_json(&json!({ "business_error": business }))?;
            Ok(ExitCode::from(2))
        }
        Err(ScriptError::Infrastructure(err)) => {
            error!("script failed: {err}");
            Err(err.into())
        }
    }
}
