// tests/word_count_end_to_end.rs

mod common;
use crate::common::{fast_settings, init_tracing, pool_of};

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::oneshot;
use tokio::time::{timeout, Duration};

use distmake::cli::CliArgs;
use distmake::cluster::NodePool;
use distmake::dag::GraphBuilder;
use distmake::engine::Scheduler;
use distmake::errors::DispatchError;
use distmake::exec::{Dispatcher, TaskOutcome};
use distmake::fs::RealFileSystem;
use distmake::split::{render_makefile, split_evenly};
use distmake::types::TransferMode;
use distmake::worker::WorkerServer;
use distmake::RunStatus;

type TestResult = Result<(), Box<dyn Error>>;

/// 10 lines of 3 words.
const INPUT: &str = "one two three\nfour five six\nseven eight nine\nten eleven twelve\n\
a b c\nd e f\ng h i\nj k l\nm n o\np q r\n";

async fn start_worker() -> Result<(u16, oneshot::Sender<()>), Box<dyn Error>> {
    let server = WorkerServer::bind("127.0.0.1:0").await?;
    let port = server.local_addr()?.port();
    let (stop, stopped) = oneshot::channel::<()>();
    tokio::spawn(server.serve(async move {
        let _ = stopped.await;
    }));
    Ok((port, stop))
}

#[tokio::test]
async fn split_count_and_sum_over_a_real_worker() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let input = dir.path().join("input.txt");
    std::fs::write(&input, INPUT)?;

    let fs = RealFileSystem;
    let parts = split_evenly(&fs, &input, 3, "part", dir.path())?;
    assert_eq!(parts.len(), 3);
    assert_eq!(std::fs::read_to_string(&parts[0])?.lines().count(), 4);

    let mut builder = GraphBuilder::new();
    builder.parse(&render_makefile(3, "part"))?;
    let graph = builder.build()?;

    let (port, stop) = start_worker().await?;
    let mut settings = fast_settings();
    settings.dispatch.transfer_mode = TransferMode::Shared;
    settings.dispatch.shared_dir = Some(dir.path().to_path_buf());

    let pool = Arc::new(NodePool::from_spec(
        &format!("[127.0.0.1:{port}]"),
        &settings.pool,
    )?);
    let dispatcher = Arc::new(Dispatcher::from_settings(pool, settings.dispatch.clone()));
    let scheduler = Scheduler::new(graph, dispatcher, settings.scheduler);

    let report = timeout(Duration::from_secs(10), scheduler.run()).await??;
    assert!(report.is_success(), "report:\n{report}");

    let total = std::fs::read_to_string(dir.path().join("total.txt"))?;
    assert_eq!(total.trim(), "30");

    let stats = scheduler.dispatcher().stats().snapshot();
    assert_eq!(stats.remote_commands, 3);
    assert_eq!(stats.local_commands, 1);
    assert_eq!(stats.transfers, 0);

    let _ = stop.send(());
    Ok(())
}

#[tokio::test]
async fn failing_local_aggregation_reports_its_exit_code() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let mut settings = fast_settings();
    settings.dispatch.transfer_mode = TransferMode::Shared;
    settings.dispatch.shared_dir = Some(dir.path().to_path_buf());

    let mut builder = GraphBuilder::new();
    builder.parse("total.txt: count1.txt\n\tcat count1.txt > total.txt\n\techo never > after.txt\n")?;
    let graph = builder.build()?;
    let dispatcher = Dispatcher::from_settings(pool_of("[localhost]"), settings.dispatch.clone());

    let task = graph.task("total.txt").ok_or("total.txt missing")?;
    assert!(task.begin());
    let outcome = dispatcher.execute(task).await;

    assert_eq!(
        outcome,
        TaskOutcome::Failed(DispatchError::LocalExecutionFailure { exit_code: 1 })
    );
    assert!(!dir.path().join("after.txt").exists());
    assert_eq!(dispatcher.stats().snapshot().local_commands, 1);
    Ok(())
}

#[tokio::test]
async fn artifact_task_finishes_without_running_anything() -> TestResult {
    let mut builder = GraphBuilder::new();
    builder.parse("part1.txt:\n")?;
    let graph = builder.build()?;
    let dispatcher = Dispatcher::from_settings(pool_of("[localhost]"), fast_settings().dispatch);

    let task = graph.task("part1.txt").ok_or("part1.txt missing")?;
    assert_eq!(dispatcher.execute(task).await, TaskOutcome::Finished);
    assert_eq!(dispatcher.stats().snapshot(), Default::default());
    Ok(())
}

fn write_settings(dir: &Path) -> Result<std::path::PathBuf, Box<dyn Error>> {
    let path = dir.join("Distmake.toml");
    let body = format!(
        "[scheduler]\npoll_interval_ms = 10\nrun_timeout_secs = 20\n\n\
         [dispatch]\nretry_base_ms = 5\nretry_jitter_ms = 5\n\n\
         [transfer]\nmode = \"shared\"\nshared_dir = {:?}\n",
        dir.display().to_string()
    );
    std::fs::write(&path, body)?;
    Ok(path)
}

#[tokio::test]
async fn command_line_split_then_run() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let input = dir.path().join("input.txt");
    std::fs::write(&input, INPUT)?;
    let makefile = dir.path().join("Makefile");

    let split = CliArgs::try_parse_from([
        "distmake".to_string(),
        "split".to_string(),
        input.display().to_string(),
        "--parts".to_string(),
        "2".to_string(),
        "--out-dir".to_string(),
        dir.path().display().to_string(),
        "--emit-makefile".to_string(),
        makefile.display().to_string(),
    ])?;
    assert_eq!(distmake::run(split).await?, RunStatus::Success);
    assert!(dir.path().join("part2.txt").exists());

    let (port, stop) = start_worker().await?;
    let settings = write_settings(dir.path())?;
    let run = CliArgs::try_parse_from([
        "distmake".to_string(),
        "run".to_string(),
        "--nodes".to_string(),
        format!("[127.0.0.1:{port}]"),
        "--makefile".to_string(),
        makefile.display().to_string(),
        "--settings".to_string(),
        settings.display().to_string(),
    ])?;

    let status = timeout(Duration::from_secs(10), distmake::run(run)).await??;
    assert_eq!(status, RunStatus::Success);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("total.txt"))?.trim(),
        "30"
    );

    let _ = stop.send(());
    Ok(())
}

#[tokio::test]
async fn command_line_run_with_a_failing_task_exits_with_two() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let makefile = dir.path().join("Makefile");
    std::fs::write(
        &makefile,
        "total.txt: count1.txt\n\tcat count1.txt > total.txt\ncount1.txt:\n\texit 4\n",
    )?;

    let (port, stop) = start_worker().await?;
    let settings = write_settings(dir.path())?;
    let run = CliArgs::try_parse_from([
        "distmake".to_string(),
        "run".to_string(),
        "--nodes".to_string(),
        format!("[127.0.0.1:{port}]"),
        "--makefile".to_string(),
        makefile.display().to_string(),
        "--settings".to_string(),
        settings.display().to_string(),
    ])?;

    let status = timeout(Duration::from_secs(10), distmake::run(run)).await??;
    assert_eq!(status, RunStatus::TasksFailed);
    assert_eq!(status.exit_code(), 2);

    let _ = stop.send(());
    Ok(())
}
