//! Per-variation "already reported" markers.
//!
//! A ledger outlives individual engine instances so a re-entered attempt
//! (reload, back navigation) can see that its completion was already sent.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::types::VariationId;

#[derive(Debug, Clone, Default)]
pub struct ReportLedger {
    reported: Arc<Mutex<HashSet<VariationId>>>,
}

impl ReportLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<VariationId>> {
        self.reported.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A fresh load starts a new attempt and clears any previous marker.
    pub fn begin_attempt(&self, variation_id: VariationId) {
        self.lock().remove(&variation_id);
    }

    /// Mark the attempt as reported. Returns `false` if it already was.
    pub fn try_mark(&self, variation_id: VariationId) -> bool {
        self.lock().insert(variation_id)
    }

    /// Drop a marker after the report itself failed.
    pub fn release(&self, variation_id: VariationId) {
        self.lock().remove(&variation_id);
    }

    pub fn is_reported(&self, variation_id: VariationId) -> bool {
        self.lock().contains(&variation_id)
    }
}
