use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::prelude::*;

use quire_notify::FailureKind;
use quire_params::TaskParameters;
use quire_service::{
  ExecutionAdapter, ExecutionMode, ExecutionReport, ServiceConfig, TaskError, TaskExecutionService,
};
use quire_task::{PlainTextBackend, TaskRegistry};

/// Quire - document operations through one execution service
#[derive(Parser)]
#[command(name = "quire")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Log more detail (overridden by RUST_LOG)
  #[arg(long, short, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Execute one or more parameter files
  Run {
    /// Parameter files (JSON)
    #[arg(required = true)]
    params: Vec<PathBuf>,

    /// Run all executions at once, each with its own notification scope
    #[arg(long)]
    concurrent: bool,

    /// Service configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
  },
}

/// One line of the run summary.
#[derive(Debug, Serialize)]
struct Outcome {
  params: PathBuf,
  status: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  execution_id: Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  outputs: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  kind: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<String>,
}

impl Outcome {
  fn new(params: PathBuf, result: Result<ExecutionReport, TaskError>) -> Self {
    match result {
      Ok(report) => Self {
        params,
        status: "completed",
        execution_id: Some(report.execution_id),
        outputs: report.outputs,
        kind: None,
        error: None,
      },
      Err(e) => Self {
        params,
        status: "failed",
        execution_id: None,
        outputs: Vec::new(),
        kind: Some(e.kind().to_string()),
        error: Some(e.to_string()),
      },
    }
  }

  /// The spawned execution never reported back.
  fn aborted(params: PathBuf, err: tokio::task::JoinError) -> Self {
    Self {
      params,
      status: "failed",
      execution_id: None,
      outputs: Vec::new(),
      kind: Some(FailureKind::Execution.to_string()),
      error: Some(format!("execution aborted: {}", err)),
    }
  }

  fn failed(&self) -> bool {
    self.error.is_some()
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let log_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("quire={},warn", log_level).into()),
    )
    .with(
      tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr),
    )
    .init();

  match cli.command {
    Some(Commands::Run {
      params,
      concurrent,
      config,
    }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run(params, concurrent, config))?;
    }
    None => {
      println!("quire - use --help to see available commands");
    }
  }

  Ok(())
}

async fn run(
  param_files: Vec<PathBuf>,
  concurrent: bool,
  config_file: Option<PathBuf>,
) -> Result<()> {
  let mut config = match config_file {
    Some(path) => load_config(&path).await?,
    None => ServiceConfig::default(),
  };
  if concurrent {
    config.mode = ExecutionMode::Concurrent;
  }

  let mut requests = Vec::with_capacity(param_files.len());
  for path in param_files {
    let params = load_params(&path).await?;
    requests.push((path, params));
  }

  let registry = TaskRegistry::standard(Arc::new(PlainTextBackend::new()));
  let service = TaskExecutionService::new(config, Arc::new(registry))
    .context("failed to create execution service")?;
  let adapter = Arc::new(ExecutionAdapter::new(Arc::new(service)));

  let outcomes = match adapter.service().config().mode {
    ExecutionMode::Sequential => {
      let mut outcomes = Vec::with_capacity(requests.len());
      for (path, params) in requests {
        let result = adapter.execute(&params).await;
        outcomes.push(Outcome::new(path, result));
      }
      outcomes
    }
    ExecutionMode::Concurrent => {
      let (paths, handles): (Vec<_>, Vec<_>) = requests
        .into_iter()
        .map(|(path, params)| {
          let adapter = Arc::clone(&adapter);
          let handle = tokio::spawn(async move { adapter.execute(&params).await });
          (path, handle)
        })
        .unzip();
      futures::future::join_all(handles)
        .await
        .into_iter()
        .zip(paths)
        .map(|(joined, path)| match joined {
          Ok(result) => Outcome::new(path, result),
          Err(e) => Outcome::aborted(path, e),
        })
        .collect()
    }
  };

  println!("{}", serde_json::to_string_pretty(&outcomes)?);

  let failed = outcomes.iter().filter(|o| o.failed()).count();
  if failed > 0 {
    anyhow::bail!("{} of {} executions failed", failed, outcomes.len());
  }
  Ok(())
}

async fn load_config(path: &Path) -> Result<ServiceConfig> {
  let content = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read config file: {}", path.display()))?;
  ServiceConfig::from_json(&content)
    .with_context(|| format!("failed to parse config file: {}", path.display()))
}

async fn load_params(path: &Path) -> Result<TaskParameters> {
  let content = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read parameter file: {}", path.display()))?;
  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse parameter file: {}", path.display()))
}
