//! Downstream consumers of newly recorded winning records (notifications,
//! ledger). Called once per record that a write actually inserted; never on a
//! no-op re-application.

use std::sync::Mutex;

use lp_core::WinningRecord;

pub trait WinningRecordSink: Send + Sync {
    fn on_record(&self, record: &WinningRecord);
}

/// Drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl WinningRecordSink for NoopSink {
    fn on_record(&self, _record: &WinningRecord) {}
}

impl<F> WinningRecordSink for F
where
    F: Fn(&WinningRecord) + Send + Sync,
{
    fn on_record(&self, record: &WinningRecord) {
        self(record)
    }
}

/// Keeps every record it is handed, in arrival order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Mutex<Vec<WinningRecord>>,
}

impl CollectingSink {
    pub fn new() -> Self { Self::default() }

    pub fn records(&self) -> Vec<WinningRecord> {
        match self.records.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl WinningRecordSink for CollectingSink {
    fn on_record(&self, record: &WinningRecord) {
        let mut g = match self.records.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        g.push(record.clone());
    }
}
