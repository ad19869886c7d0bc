use hydrowatch_core::SensorReading;
use parking_lot::RwLock;
use std::sync::Arc;

/// Single slot holding the most recently accepted reading.
///
/// Writers swap in a complete snapshot, so readers see either the old or
/// the new reading but never a mix of both.
#[derive(Debug, Default)]
pub struct LatestReadingCache {
    slot: RwLock<Option<Arc<SensorReading>>>,
}

impl LatestReadingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, reading: SensorReading) {
        let snapshot = Arc::new(reading);
        *self.slot.write() = Some(snapshot);
    }

    /// `None` until the first reading got accepted
    pub fn get(&self) -> Option<SensorReading> {
        self.slot.read().as_deref().copied()
    }
}
