use super::AlertDispatcher;
use crate::error::NotificationError;
use hydrowatch_core::Violation;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Records every dispatch call
#[derive(Default)]
pub struct RecordingDispatcher {
    calls: Mutex<Vec<Vec<Violation>>>,
    fail: AtomicBool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let dispatcher = Self::default();
        dispatcher.fail.store(true, Ordering::SeqCst);
        dispatcher
    }

    pub fn calls(&self) -> Vec<Vec<Violation>> {
        self.calls.lock().clone()
    }
}

impl AlertDispatcher for RecordingDispatcher {
    async fn dispatch(&self, violations: &[Violation]) -> Result<(), NotificationError> {
        self.calls.lock().push(violations.to_vec());
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotificationError::Timeout(0));
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "recording"
    }
}
