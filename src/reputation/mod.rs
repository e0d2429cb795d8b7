// SPDX-License-Identifier: Apache-2.0

//! Reputation Ledger
//!
//! Records security events against client IPs and answers whether an IP has
//! accumulated enough points to be refused service. Scores are never cached
//! in process: every question is answered by the backing store, which is
//! shared by all gateways of the process.
//!
//! There is no decay, expiry or reset. Once an IP crosses the threshold it
//! stays blocked.

mod memory;

pub use memory::MemoryLedgerStore;

use std::sync::Arc;

use gate_core::{EventCode, LedgerStore, SecurityEvent, StorageResult};
use tracing::{debug, warn};

use crate::config::DEFAULT_ERROR_POINTS_THRESHOLD;

pub struct ReputationLedger {
    store: Arc<dyn LedgerStore>,
    threshold: i64,
}

impl ReputationLedger {
    pub fn new(store: Arc<dyn LedgerStore>, threshold: i64) -> Self {
        Self { store, threshold }
    }

    /// Ledger on a fresh in-memory store with the default threshold
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryLedgerStore::new()),
            DEFAULT_ERROR_POINTS_THRESHOLD,
        )
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    /// True when the summed points for `ip_address` reach the threshold.
    pub fn is_blocked(&self, ip_address: &str) -> StorageResult<bool> {
        let score = self.store.total_points(ip_address)?;
        let blocked = score >= self.threshold;
        if blocked {
            warn!(ip = ip_address, score, threshold = self.threshold, "IP is blocked");
        }
        Ok(blocked)
    }

    pub fn score(&self, ip_address: &str) -> StorageResult<i64> {
        self.store.total_points(ip_address)
    }

    /// Appends an event stamped now. Points come from the catalog; codes
    /// outside it weigh nothing.
    pub fn record(
        &self,
        code: EventCode,
        user_id: &str,
        ip_address: &str,
        host_name: &str,
        message: &str,
    ) -> StorageResult<SecurityEvent> {
        let event = SecurityEvent::new(code, user_id, ip_address, host_name, message);
        self.store.append(&event)?;
        debug!(
            ip = ip_address,
            code = %event.event_code,
            points = event.points,
            "Security event recorded"
        );
        Ok(event)
    }

    /// Every event recorded for `ip_address`, oldest first
    pub fn events(&self, ip_address: &str) -> StorageResult<Vec<SecurityEvent>> {
        self.store.events_for(ip_address)
    }
}

impl std::fmt::Debug for ReputationLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReputationLedger")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}
