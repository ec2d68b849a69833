// src/exec/stats.rs

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the dispatcher while a run is in progress.
#[derive(Debug, Default)]
pub struct DispatchStats {
    acquisitions: AtomicU64,
    acquire_retries: AtomicU64,
    remote_commands: AtomicU64,
    local_commands: AtomicU64,
    transfers: AtomicU64,
    transfer_failures: AtomicU64,
}

/// Plain copy of [`DispatchStats`] at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub acquisitions: u64,
    pub acquire_retries: u64,
    pub remote_commands: u64,
    pub local_commands: u64,
    pub transfers: u64,
    pub transfer_failures: u64,
}

impl DispatchStats {
    pub(crate) fn record_acquisition(&self) {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry(&self) {
        self.acquire_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_remote_command(&self) {
        self.remote_commands.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_local_command(&self) {
        self.local_commands.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transfer(&self, ok: bool) {
        self.transfers.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.transfer_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn acquire_retries(&self) -> u64 {
        self.acquire_retries.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            acquire_retries: self.acquire_retries.load(Ordering::Relaxed),
            remote_commands: self.remote_commands.load(Ordering::Relaxed),
            local_commands: self.local_commands.load(Ordering::Relaxed),
            transfers: self.transfers.load(Ordering::Relaxed),
            transfer_failures: self.transfer_failures.load(Ordering::Relaxed),
        }
    }
}
