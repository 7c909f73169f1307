//! cms-bench - CMS publish/removal latency measurement tool

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use cms_bench_core::{EngineBuilder, EngineConfig, EngineSnapshot};
use cms_bench_operators::{HttpCheckConfig, HttpContentCheck, RestOperator, RestOperatorConfig};

mod cli;

/// Top-level configuration file format
#[derive(Debug, Deserialize)]
struct FileConfig {
    /// Engine settings (interval, operations limit, root url, node pool)
    #[serde(flatten)]
    engine: EngineConfig,

    /// Content API settings for the REST operator
    operators: RestOperatorConfig,

    /// Live-site fetch settings
    #[serde(default)]
    check: HttpCheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.into()),
        )
        .init();

    match cli.command {
        cli::Commands::Run { config, timeout } => run(&config, timeout).await,
        cli::Commands::Validate { config } => validate(&config),
    }
}

fn load(path: &str) -> Result<FileConfig> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("reading config file {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing config file {path}"))
}

fn validate(path: &str) -> Result<()> {
    let config = load(path)?;
    config.engine.validate()?;
    println!("{path}: ok");
    Ok(())
}

async fn run(path: &str, timeout: Option<Duration>) -> Result<()> {
    let config = load(path)?;
    config.engine.validate()?;

    let operators = Arc::new(RestOperator::new(config.operators)?);
    let checker = Arc::new(HttpContentCheck::new(config.check)?);

    let engine = EngineBuilder::new()
        .config(config.engine)
        .operators(operators)
        .checker(checker)
        .on_transition(Box::new(|snapshot: &EngineSnapshot| {
            tracing::info!(
                state = %snapshot.state,
                operations = snapshot.operations.len(),
                nodes = snapshot.nodes.len(),
                "engine transition"
            );
        }))
        .build()?;

    let stats = match timeout {
        Some(timeout) => engine.run_with_timeout(timeout).await?,
        None => engine.run_with_signal_handling().await?,
    };

    println!("{stats}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "interval": "500ms",
        "operations_limit": 4,
        "root_url": "http://localhost:4503",
        "operators": { "api_url": "http://localhost:4502/api" }
    }"#;

    #[test]
    fn test_config_file_parses() {
        let config: FileConfig = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(config.engine.operations_limit, 4);
        assert_eq!(config.engine.interval, Duration::from_millis(500));
        assert!(config.engine.validate().is_ok());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = load(path.to_str().unwrap()).unwrap();
        assert!(config.engine.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(load("/nonexistent/config.json").is_err());
    }
}
