use crate::alert::AlertDispatcher;
use crate::cache::LatestReadingCache;
use crate::error::IngestError;
use crate::models::{ReadingStore, StoredPrediction, StoredReading};
use hydrowatch_core::{
    evaluate, FeatureNormalizer, NutrientPrediction, Predictor, SensorReading, ThresholdTable,
    Violation,
};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, error, info, warn};


/// Result of one ingestion.
///
/// `prediction` is `None` if the prediction stage failed, `warnings` lists
/// every stage that degraded without failing the request.
#[derive(Debug)]
pub struct IngestOutcome {
    pub reading: StoredReading,
    pub prediction: Option<NutrientPrediction>,
    pub violations: Vec<Violation>,
    pub warnings: Vec<String>,
}

/// Violations of the current state, see `IngestionService::status`
#[derive(Debug)]
pub struct StatusReport {
    pub reading: Option<SensorReading>,
    pub sensor_violations: Vec<Violation>,
    pub prediction: Option<StoredPrediction>,
    pub nutrient_violations: Vec<Violation>,
}

/// Orchestrates validation, caching, persistence, prediction and alerting.
///
/// Shared between all request handlers, the only mutable state is the
/// latest-reading cache and the store behind `S`.
pub struct IngestionService<S, D> {
    store: S,
    dispatcher: D,
    cache: LatestReadingCache,
    normalizer: FeatureNormalizer,
    predictor: Box<dyn Predictor>,
    sensor_thresholds: ThresholdTable,
    nutrient_thresholds: ThresholdTable,
}

impl<S, D> Debug for IngestionService<S, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionService").finish()
    }
}

impl<S: ReadingStore, D: AlertDispatcher> IngestionService<S, D> {
    pub fn new(
        store: S,
        dispatcher: D,
        normalizer: FeatureNormalizer,
        predictor: Box<dyn Predictor>,
        sensor_thresholds: ThresholdTable,
        nutrient_thresholds: ThresholdTable,
    ) -> Arc<Self> {
        Arc::new(IngestionService {
            store,
            dispatcher,
            cache: LatestReadingCache::new(),
            normalizer,
            predictor,
            sensor_thresholds,
            nutrient_thresholds,
        })
    }

    /// Full pipeline for one sensor payload.
    ///
    /// Validation failures return before any side effect. A failed reading
    /// insert aborts the rest, but keeps the cache update. Later stages only
    /// degrade the outcome.
    #[tracing::instrument(skip(self, payload), fields(request_id = %uuid::Uuid::new_v4()))]
    pub async fn ingest(&self, payload: &Value) -> Result<IngestOutcome, IngestError> {
        let reading = SensorReading::from_payload(payload)?;
        self.cache.set(reading);

        let stored = self.store.insert_reading(&reading).await.map_err(|e| {
            error!("Failed persisting sensor reading: {}", e);
            e
        })?;
        debug!(reading_id = stored.id, "Stored sensor reading");

        let mut warnings = Vec::new();
        let prediction = match self.predict_reading(&reading) {
            Ok(prediction) => prediction,
            Err(e) => {
                error!(reading_id = stored.id, "Prediction failed: {}", e);
                warnings.push(e.to_string());
                return Ok(IngestOutcome {
                    reading: stored,
                    prediction: None,
                    violations: Vec::new(),
                    warnings,
                });
            }
        };

        if let Err(e) = self.persist_prediction(&prediction).await {
            warnings.push(e.public_message());
        }
        let violations = self.alert(&prediction).await;

        info!(
            reading_id = stored.id,
            violations = violations.len(),
            "Ingested sensor reading"
        );
        Ok(IngestOutcome {
            reading: stored,
            prediction: Some(prediction),
            violations,
            warnings,
        })
    }

    /// Prediction only entry, the cache and the reading log stay untouched.
    /// Unlike `ingest`, a failed prediction insert fails the request, after
    /// alerting already happened.
    #[tracing::instrument(skip(self, payload), fields(request_id = %uuid::Uuid::new_v4()))]
    pub async fn predict(&self, payload: &Value) -> Result<NutrientPrediction, IngestError> {
        let reading = SensorReading::from_payload(payload)?;
        let prediction = self.predict_reading(&reading).map_err(|e| {
            error!("Prediction failed: {}", e);
            e
        })?;

        let persisted = self.persist_prediction(&prediction).await;
        self.alert(&prediction).await;
        persisted?;
        Ok(prediction)
    }

    pub fn latest(&self) -> Option<SensorReading> {
        self.cache.get()
    }

    /// Checks the cached reading against the sensor bands and the newest
    /// stored prediction against the nutrient bands. Never alerts.
    pub async fn status(&self) -> Result<StatusReport, IngestError> {
        let reading = self.cache.get();
        let sensor_violations = reading
            .map(|r| evaluate(&r.metrics(), &self.sensor_thresholds))
            .unwrap_or_default();

        let prediction = self.store.latest_predictions(1).await?.pop();
        let nutrient_violations = prediction
            .as_ref()
            .map(|p| evaluate(&p.prediction.metrics(), &self.nutrient_thresholds))
            .unwrap_or_default();

        Ok(StatusReport {
            reading,
            sensor_violations,
            prediction,
            nutrient_violations,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    fn predict_reading(&self, reading: &SensorReading) -> Result<NutrientPrediction, IngestError> {
        let features = self.normalizer.normalize(reading)?;
        Ok(self.predictor.predict(&features)?)
    }

    async fn persist_prediction(
        &self,
        prediction: &NutrientPrediction,
    ) -> Result<StoredPrediction, IngestError> {
        match self.store.insert_prediction(prediction).await {
            Ok(stored) => {
                debug!(prediction_id = stored.id, "Stored nutrient prediction");
                Ok(stored)
            }
            Err(e) => {
                error!("Failed persisting nutrient prediction: {}", e);
                Err(e.into())
            }
        }
    }

    /// Evaluates the nutrient bands and notifies once for all violations.
    /// Dispatch failures end here.
    async fn alert(&self, prediction: &NutrientPrediction) -> Vec<Violation> {
        let violations = evaluate(&prediction.metrics(), &self.nutrient_thresholds);
        if violations.is_empty() {
            return violations;
        }

        warn!(violations = violations.len(), "Nutrient levels out of range");
        if let Err(e) = self.dispatcher.dispatch(&violations).await {
            error!(sink = self.dispatcher.kind(), "Failed dispatching alert: {}", e);
        }
        violations
    }
}
