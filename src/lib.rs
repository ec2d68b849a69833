// src/lib.rs

pub mod cli;
pub mod cluster;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod split;
pub mod types;
pub mod worker;

use std::future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command, RunArgs, SplitArgs, WorkerArgs};
use crate::cluster::NodePool;
use crate::config::resolve_settings;
use crate::dag::{GraphBuilder, MarkerClassifier, TaskGraph};
use crate::engine::{RunOutcome, Scheduler};
use crate::errors::{DistmakeError, Result};
use crate::exec::Dispatcher;
use crate::fs::{FileSystem, RealFileSystem};
use crate::worker::WorkerServer;

/// How a successful invocation ended, as far as the process exit code is
/// concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// The run completed but some task failed or was blocked.
    TasksFailed,
}

impl RunStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Success => 0,
            RunStatus::TasksFailed => 2,
        }
    }
}

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<RunStatus> {
    match args.command {
        Command::Run(run_args) => run_graph(run_args).await,
        Command::Worker(worker_args) => run_worker(worker_args).await,
        Command::Split(split_args) => run_split(split_args),
    }
}

/// Build pool and graph, then drive the graph to completion.
///
/// Configuration and parse errors surface here before anything runs.
async fn run_graph(args: RunArgs) -> Result<RunStatus> {
    let fs = RealFileSystem;
    let settings = resolve_settings(&fs, args.settings.as_deref())?;

    let pool = Arc::new(NodePool::from_spec(&args.nodes, &settings.pool)?);

    let classifier = MarkerClassifier::from_settings(&settings.classifier)?;
    let mut builder = GraphBuilder::new().with_classifier(classifier);
    builder.load(&fs, &args.makefile)?;
    let graph = builder.build()?;

    if args.dry_run {
        print_dry_run(&pool, &graph);
        return Ok(RunStatus::Success);
    }

    let dispatcher = Arc::new(Dispatcher::from_settings(pool, settings.dispatch.clone()));
    let scheduler = Scheduler::new(graph, dispatcher, settings.scheduler);
    let report = scheduler.run_until(shutdown_signal()).await?;

    println!("{report}");

    match report.outcome {
        RunOutcome::TimedOut => Err(DistmakeError::SchedulingTimeout(
            settings.scheduler.run_timeout,
        )),
        RunOutcome::Cancelled => Err(DistmakeError::SchedulingError(
            "run interrupted".to_string(),
        )),
        RunOutcome::Completed if report.is_success() => Ok(RunStatus::Success),
        RunOutcome::Completed => Ok(RunStatus::TasksFailed),
    }
}

async fn run_worker(args: WorkerArgs) -> Result<RunStatus> {
    let server = WorkerServer::bind((args.host.as_str(), args.port)).await?;
    server.serve(shutdown_signal()).await?;
    info!("worker stopped");
    Ok(RunStatus::Success)
}

fn run_split(args: SplitArgs) -> Result<RunStatus> {
    let fs = RealFileSystem;
    let parts = split::split_evenly(&fs, &args.input, args.parts, &args.prefix, &args.out_dir)?;
    for path in &parts {
        println!("{}", path.display());
    }

    if let Some(path) = args.emit_makefile {
        let text = split::render_makefile(args.parts, &args.prefix);
        fs.write(&path, text.as_bytes())?;
        info!(makefile = %path.display(), "wrote word-count makefile");
    }
    Ok(RunStatus::Success)
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        future::pending::<()>().await;
    }
    info!("Ctrl+C received");
}

/// Dry-run output: pool, then tasks with dependencies and routing.
fn print_dry_run(pool: &NodePool, graph: &TaskGraph) {
    println!("distmake dry-run");
    println!();

    println!("nodes ({}):", pool.len());
    for (idx, node) in pool.nodes().iter().enumerate() {
        let role = if idx == 0 { " (master)" } else { "" };
        println!("  - {node}{role}");
    }
    println!();

    println!("tasks ({}):", graph.len());
    for task in graph.tasks() {
        if task.is_artifact() {
            println!("  - {} [artifact]", task.name());
        } else {
            println!(
                "  - {} [{}, {} command(s)]",
                task.name(),
                task.site(),
                task.commands().len()
            );
        }
        let deps = graph.dependency_names(task.id());
        if !deps.is_empty() {
            println!("      after: {}", deps.join(" "));
        }
    }

    debug!("dry-run complete (no execution)");
}
