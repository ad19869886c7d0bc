use super::{ReadingStore, StoredPrediction, StoredReading};
use crate::error::DBError;
use chrono::{Duration, Utc};
use hydrowatch_core::{NutrientPrediction, SensorReading};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory store with switchable failures
#[derive(Default)]
pub struct MockStore {
    readings: Mutex<Vec<StoredReading>>,
    predictions: Mutex<Vec<StoredPrediction>>,
    fail_readings: AtomicBool,
    fail_predictions: AtomicBool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_readings(&self, fail: bool) {
        self.fail_readings.store(fail, Ordering::SeqCst);
    }

    pub fn fail_predictions(&self, fail: bool) {
        self.fail_predictions.store(fail, Ordering::SeqCst);
    }

    pub fn readings(&self) -> Vec<StoredReading> {
        self.readings.lock().clone()
    }

    pub fn predictions(&self) -> Vec<StoredPrediction> {
        self.predictions.lock().clone()
    }

    fn unavailable() -> DBError {
        DBError::SQLError(sqlx::Error::PoolTimedOut)
    }
}

impl ReadingStore for MockStore {
    async fn insert_reading(&self, reading: &SensorReading) -> Result<StoredReading, DBError> {
        if self.fail_readings.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        let mut readings = self.readings.lock();
        let stored = StoredReading {
            id: readings.len() as i64 + 1,
            timestamp: Utc::now() + Duration::milliseconds(readings.len() as i64),
            reading: *reading,
        };
        readings.push(stored.clone());
        Ok(stored)
    }

    async fn insert_prediction(
        &self,
        prediction: &NutrientPrediction,
    ) -> Result<StoredPrediction, DBError> {
        if self.fail_predictions.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        let mut predictions = self.predictions.lock();
        let stored = StoredPrediction {
            id: predictions.len() as i64 + 1,
            timestamp: Utc::now() + Duration::milliseconds(predictions.len() as i64),
            prediction: *prediction,
        };
        predictions.push(stored.clone());
        Ok(stored)
    }

    async fn latest_readings(&self, limit: i64) -> Result<Vec<StoredReading>, DBError> {
        let readings = self.readings.lock();
        Ok(readings.iter().rev().take(limit as usize).cloned().collect())
    }

    async fn latest_predictions(&self, limit: i64) -> Result<Vec<StoredPrediction>, DBError> {
        let predictions = self.predictions.lock();
        Ok(predictions
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn reading_count(&self) -> Result<i64, DBError> {
        Ok(self.readings.lock().len() as i64)
    }

    async fn prediction_count(&self) -> Result<i64, DBError> {
        Ok(self.predictions.lock().len() as i64)
    }

    async fn check(&self) -> Result<(), DBError> {
        if self.fail_readings.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(())
    }
}
