// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::TransferMode;

/// Named defaults for every tunable. Nothing here is discovered at runtime.
pub mod defaults {
    pub const POLL_INTERVAL_MS: u64 = 500;
    pub const RUN_TIMEOUT_SECS: u64 = 60 * 60;

    pub const RETRY_BASE_MS: u64 = 100;
    pub const RETRY_JITTER_MS: u64 = 100;
    pub const MAX_ACQUIRE_RETRIES: u32 = 100;
    pub const CONTENTION_LOG_EVERY: u32 = 10;
    pub const CONNECT_TIMEOUT_MS: u64 = 5_000;

    pub const MIN_NODES: usize = 1;
    pub const MAX_NODES: usize = 1000;
    pub const DEFAULT_PORT: u16 = 3000;
    pub const MIN_PORT: u16 = 1024;

    pub const AGGREGATE_TARGET: &str = "total.txt";
    pub const AGGREGATE_MARKERS: [&str; 3] = ["cat", "count", "awk"];

    pub const REMOTE_DIR: &str = "~";
}

/// Settings file as read from TOML, before validation.
///
/// ```toml
/// [scheduler]
/// poll_interval_ms = 500
/// run_timeout_secs = 3600
///
/// [dispatch]
/// retry_base_ms = 100
/// retry_jitter_ms = 100
/// max_acquire_retries = 100
///
/// [cluster]
/// min_nodes = 1
/// max_nodes = 1000
/// default_port = 3000
///
/// [graph]
/// aggregate_targets = ["total.txt"]
///
/// [transfer]
/// mode = "copy"
/// ```
///
/// All sections are optional and have the defaults from [`defaults`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSettings {
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub dispatch: DispatchSection,
    #[serde(default)]
    pub cluster: ClusterSection,
    #[serde(default)]
    pub graph: GraphSection,
    #[serde(default)]
    pub transfer: TransferSection,
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Upper bound for the whole run, including the final wait.
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
}

fn default_poll_interval_ms() -> u64 {
    defaults::POLL_INTERVAL_MS
}

fn default_run_timeout_secs() -> u64 {
    defaults::RUN_TIMEOUT_SECS
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            run_timeout_secs: default_run_timeout_secs(),
        }
    }
}

/// `[dispatch]` section: node acquisition backoff and worker connections.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSection {
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
    /// Upper bound (inclusive) of the uniform jitter added to every backoff.
    #[serde(default = "default_retry_jitter_ms")]
    pub retry_jitter_ms: u64,
    #[serde(default = "default_max_acquire_retries")]
    pub max_acquire_retries: u32,
    #[serde(default = "default_contention_log_every")]
    pub contention_log_every: u32,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_retry_base_ms() -> u64 {
    defaults::RETRY_BASE_MS
}

fn default_retry_jitter_ms() -> u64 {
    defaults::RETRY_JITTER_MS
}

fn default_max_acquire_retries() -> u32 {
    defaults::MAX_ACQUIRE_RETRIES
}

fn default_contention_log_every() -> u32 {
    defaults::CONTENTION_LOG_EVERY
}

fn default_connect_timeout_ms() -> u64 {
    defaults::CONNECT_TIMEOUT_MS
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            retry_base_ms: default_retry_base_ms(),
            retry_jitter_ms: default_retry_jitter_ms(),
            max_acquire_retries: default_max_acquire_retries(),
            contention_log_every: default_contention_log_every(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// `[cluster]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterSection {
    #[serde(default = "default_min_nodes")]
    pub min_nodes: usize,
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    /// Port used for node-list entries written as a bare `host`.
    #[serde(default = "default_port")]
    pub default_port: u16,
}

fn default_min_nodes() -> usize {
    defaults::MIN_NODES
}

fn default_max_nodes() -> usize {
    defaults::MAX_NODES
}

fn default_port() -> u16 {
    defaults::DEFAULT_PORT
}

impl Default for ClusterSection {
    fn default() -> Self {
        Self {
            min_nodes: default_min_nodes(),
            max_nodes: default_max_nodes(),
            default_port: default_port(),
        }
    }
}

/// `[graph]` section: how tasks are classified as local aggregations.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphSection {
    /// Target names that always run on the coordinator.
    #[serde(default = "default_aggregate_targets")]
    pub aggregate_targets: Vec<String>,
    /// A command containing *all* of these substrings marks its task as an
    /// aggregation. An empty list disables command-based detection.
    #[serde(default = "default_aggregate_markers")]
    pub aggregate_markers: Vec<String>,
    /// Optional regex; a command matching it marks its task as an
    /// aggregation, in addition to the marker rule.
    #[serde(default)]
    pub aggregate_pattern: Option<String>,
}

fn default_aggregate_targets() -> Vec<String> {
    vec![defaults::AGGREGATE_TARGET.to_string()]
}

fn default_aggregate_markers() -> Vec<String> {
    defaults::AGGREGATE_MARKERS
        .iter()
        .map(|m| m.to_string())
        .collect()
}

impl Default for GraphSection {
    fn default() -> Self {
        Self {
            aggregate_targets: default_aggregate_targets(),
            aggregate_markers: default_aggregate_markers(),
            aggregate_pattern: None,
        }
    }
}

/// `[transfer]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferSection {
    #[serde(default)]
    pub mode: TransferMode,
    /// Directory on the worker that results are fetched from (`copy` mode).
    #[serde(default = "default_remote_dir")]
    pub remote_dir: String,
    /// Directory visible to every node (`shared` mode).
    #[serde(default)]
    pub shared_dir: Option<PathBuf>,
}

fn default_remote_dir() -> String {
    defaults::REMOTE_DIR.to_string()
}

impl Default for TransferSection {
    fn default() -> Self {
        Self {
            mode: TransferMode::default(),
            remote_dir: default_remote_dir(),
            shared_dir: None,
        }
    }
}

/// Validated settings, split into the immutable values each component takes
/// at construction. Built from [`RawSettings`] in `validate.rs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub scheduler: SchedulerOptions,
    pub dispatch: DispatchSettings,
    pub pool: PoolLimits,
    pub classifier: ClassifierSettings,
}

impl Settings {
    pub(crate) fn new_unchecked(
        scheduler: SchedulerOptions,
        dispatch: DispatchSettings,
        pool: PoolLimits,
        classifier: ClassifierSettings,
    ) -> Self {
        Self {
            scheduler,
            dispatch,
            pool,
            classifier,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scheduler: SchedulerOptions::default(),
            dispatch: DispatchSettings::default(),
            pool: PoolLimits::default(),
            classifier: ClassifierSettings::default(),
        }
    }
}

/// Poll loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    pub poll_interval: Duration,
    pub run_timeout: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(defaults::POLL_INTERVAL_MS),
            run_timeout: Duration::from_secs(defaults::RUN_TIMEOUT_SECS),
        }
    }
}

/// Everything the dispatcher needs besides the pool and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    pub retry_base: Duration,
    pub retry_jitter: Duration,
    pub max_acquire_retries: u32,
    pub contention_log_every: u32,
    pub connect_timeout: Duration,
    pub transfer_mode: TransferMode,
    pub remote_dir: String,
    /// Working directory for commands in `shared` mode.
    pub shared_dir: Option<PathBuf>,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            retry_base: Duration::from_millis(defaults::RETRY_BASE_MS),
            retry_jitter: Duration::from_millis(defaults::RETRY_JITTER_MS),
            max_acquire_retries: defaults::MAX_ACQUIRE_RETRIES,
            contention_log_every: defaults::CONTENTION_LOG_EVERY,
            connect_timeout: Duration::from_millis(defaults::CONNECT_TIMEOUT_MS),
            transfer_mode: TransferMode::Copy,
            remote_dir: defaults::REMOTE_DIR.to_string(),
            shared_dir: None,
        }
    }
}

/// Bounds applied when a node pool is built from a node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLimits {
    pub min_nodes: usize,
    pub max_nodes: usize,
    pub default_port: u16,
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self {
            min_nodes: defaults::MIN_NODES,
            max_nodes: defaults::MAX_NODES,
            default_port: defaults::DEFAULT_PORT,
        }
    }
}

/// Inputs of the default aggregation classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierSettings {
    pub aggregate_targets: Vec<String>,
    pub aggregate_markers: Vec<String>,
    pub aggregate_pattern: Option<String>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            aggregate_targets: default_aggregate_targets(),
            aggregate_markers: default_aggregate_markers(),
            aggregate_pattern: None,
        }
    }
}
