// src/config/validate.rs

use std::time::Duration;

use regex::Regex;

use crate::config::model::{
    defaults, ClassifierSettings, DispatchSettings, PoolLimits, RawSettings, SchedulerOptions,
    Settings,
};
use crate::errors::{DistmakeError, Result};
use crate::types::TransferMode;

impl TryFrom<RawSettings> for Settings {
    type Error = DistmakeError;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        validate_raw_settings(&raw)?;

        let scheduler = SchedulerOptions {
            poll_interval: Duration::from_millis(raw.scheduler.poll_interval_ms),
            run_timeout: Duration::from_secs(raw.scheduler.run_timeout_secs),
        };

        let dispatch = DispatchSettings {
            retry_base: Duration::from_millis(raw.dispatch.retry_base_ms),
            retry_jitter: Duration::from_millis(raw.dispatch.retry_jitter_ms),
            max_acquire_retries: raw.dispatch.max_acquire_retries,
            contention_log_every: raw.dispatch.contention_log_every,
            connect_timeout: Duration::from_millis(raw.dispatch.connect_timeout_ms),
            transfer_mode: raw.transfer.mode,
            remote_dir: raw.transfer.remote_dir,
            shared_dir: raw.transfer.shared_dir,
        };

        let pool = PoolLimits {
            min_nodes: raw.cluster.min_nodes,
            max_nodes: raw.cluster.max_nodes,
            default_port: raw.cluster.default_port,
        };

        let classifier = ClassifierSettings {
            aggregate_targets: raw.graph.aggregate_targets,
            aggregate_markers: raw.graph.aggregate_markers,
            aggregate_pattern: raw.graph.aggregate_pattern,
        };

        Ok(Settings::new_unchecked(scheduler, dispatch, pool, classifier))
    }
}

fn validate_raw_settings(raw: &RawSettings) -> Result<()> {
    validate_scheduler(raw)?;
    validate_dispatch(raw)?;
    validate_cluster(raw)?;
    validate_transfer(raw)?;
    validate_graph(raw)?;
    Ok(())
}

fn validate_scheduler(raw: &RawSettings) -> Result<()> {
    if raw.scheduler.poll_interval_ms == 0 {
        return Err(DistmakeError::InvalidConfig(
            "[scheduler].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if raw.scheduler.run_timeout_secs == 0 {
        return Err(DistmakeError::InvalidConfig(
            "[scheduler].run_timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_dispatch(raw: &RawSettings) -> Result<()> {
    if raw.dispatch.max_acquire_retries == 0 {
        return Err(DistmakeError::InvalidConfig(
            "[dispatch].max_acquire_retries must be >= 1 (got 0)".to_string(),
        ));
    }
    if raw.dispatch.contention_log_every == 0 {
        return Err(DistmakeError::InvalidConfig(
            "[dispatch].contention_log_every must be >= 1 (got 0)".to_string(),
        ));
    }
    if raw.dispatch.connect_timeout_ms == 0 {
        return Err(DistmakeError::InvalidConfig(
            "[dispatch].connect_timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_cluster(raw: &RawSettings) -> Result<()> {
    let cluster = &raw.cluster;
    if cluster.min_nodes == 0 {
        return Err(DistmakeError::InvalidConfig(
            "[cluster].min_nodes must be >= 1 (got 0)".to_string(),
        ));
    }
    if cluster.min_nodes > cluster.max_nodes {
        return Err(DistmakeError::InvalidConfig(format!(
            "[cluster].min_nodes ({}) is greater than max_nodes ({})",
            cluster.min_nodes, cluster.max_nodes
        )));
    }
    if cluster.default_port < defaults::MIN_PORT {
        return Err(DistmakeError::InvalidConfig(format!(
            "[cluster].default_port must be in [{}, 65535] (got {})",
            defaults::MIN_PORT,
            cluster.default_port
        )));
    }
    Ok(())
}

fn validate_transfer(raw: &RawSettings) -> Result<()> {
    if raw.transfer.mode == TransferMode::Shared && raw.transfer.shared_dir.is_none() {
        return Err(DistmakeError::InvalidConfig(
            "[transfer].mode = \"shared\" requires [transfer].shared_dir".to_string(),
        ));
    }
    if raw.transfer.remote_dir.trim().is_empty() {
        return Err(DistmakeError::InvalidConfig(
            "[transfer].remote_dir cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_graph(raw: &RawSettings) -> Result<()> {
    if let Some(pattern) = &raw.graph.aggregate_pattern {
        Regex::new(pattern).map_err(|e| {
            DistmakeError::InvalidConfig(format!(
                "[graph].aggregate_pattern is not a valid regex: {e}"
            ))
        })?;
    }
    Ok(())
}
