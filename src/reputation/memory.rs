// SPDX-License-Identifier: Apache-2.0

use gate_core::{LedgerStore, SecurityEvent, StorageResult};
use parking_lot::Mutex;

/// Process-local ledger store
///
/// Holds every event in memory; nothing survives the process. Suitable for
/// embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    events: Mutex<Vec<SecurityEvent>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn append(&self, event: &SecurityEvent) -> StorageResult<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }

    fn total_points(&self, ip_address: &str) -> StorageResult<i64> {
        Ok(self
            .events
            .lock()
            .iter()
            .filter(|e| e.ip_address == ip_address)
            .map(|e| e.points)
            .sum())
    }

    fn events_for(&self, ip_address: &str) -> StorageResult<Vec<SecurityEvent>> {
        Ok(self
            .events
            .lock()
            .iter()
            .filter(|e| e.ip_address == ip_address)
            .cloned()
            .collect())
    }
}
