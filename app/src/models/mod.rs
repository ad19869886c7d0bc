use crate::error::DBError;
use chrono::{DateTime, Utc};
use hydrowatch_core::{NutrientPrediction, SensorReading};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use utoipa::ToSchema;

macro_rules! sql_stmnt {
    ($ret:ident, $stmt:expr) => {
        sqlx::query_as::<_ ,$ret>($stmt)
    };
    ($stmt:expr) => {
        sqlx::query($stmt)
    };
    ($ret:ident, $stmt:expr, $($bind:expr),*) => {
        sqlx::query_as::<_ ,$ret>($stmt)$(.bind($bind))*
    };
    ($stmt:expr, $($bind:expr),*) => {
        sqlx::query($stmt)$(.bind($bind))*
    };
}

pub mod nutrient_prediction;
pub mod sensor_reading;

#[cfg(test)]
pub mod mock;

pub async fn establish_db_connection(
    database_url: &str,
    timeout_ms: u64,
) -> Result<sqlx::PgPool, DBError> {
    Ok(sqlx::postgres::PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(timeout_ms))
        .connect(database_url)
        .await?)
}

pub async fn migrate(conn: &sqlx::PgPool) -> Result<(), DBError> {
    sqlx::migrate!("./migrations").run(conn).await?;
    Ok(())
}

#[derive(sqlx::FromRow)]
pub(crate) struct CountRecord {
    pub count: Option<i64>,
}

impl CountRecord {
    pub fn count(self) -> i64 {
        self.count.unwrap_or(0)
    }
}

/// A reading as persisted, with its row id and write time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoredReading {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub reading: SensorReading,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoredPrediction {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub prediction: NutrientPrediction,
}

/// Append-only log of readings and predictions.
///
/// The two logs are independent, a prediction carries no reference to the
/// reading it was derived from. Appends stamp the write time, which never
/// decreases within one log.
pub trait ReadingStore: Send + Sync + 'static {
    fn insert_reading(
        &self,
        reading: &SensorReading,
    ) -> impl Future<Output = Result<StoredReading, DBError>> + Send;

    fn insert_prediction(
        &self,
        prediction: &NutrientPrediction,
    ) -> impl Future<Output = Result<StoredPrediction, DBError>> + Send;

    /// Newest first
    fn latest_readings(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<StoredReading>, DBError>> + Send;

    /// Newest first
    fn latest_predictions(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<StoredPrediction>, DBError>> + Send;

    fn reading_count(&self) -> impl Future<Output = Result<i64, DBError>> + Send;

    fn prediction_count(&self) -> impl Future<Output = Result<i64, DBError>> + Send;

    fn check(&self) -> impl Future<Output = Result<(), DBError>> + Send;
}

/// PostgreSQL backed store, every call bounded by `timeout_ms`
pub struct PgStore {
    conn: sqlx::PgPool,
    timeout_ms: u64,
}

impl PgStore {
    pub fn new(conn: sqlx::PgPool, timeout_ms: u64) -> Self {
        PgStore { conn, timeout_ms }
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, DBError>
    where
        F: Future<Output = Result<T, DBError>>,
    {
        tokio::time::timeout(Duration::from_millis(self.timeout_ms), fut)
            .await
            .map_err(|_| DBError::Timeout(self.timeout_ms))?
    }
}

impl ReadingStore for PgStore {
    async fn insert_reading(&self, reading: &SensorReading) -> Result<StoredReading, DBError> {
        let dao = self
            .bounded(sensor_reading::insert(&self.conn, reading))
            .await?;
        Ok(dao.into())
    }

    async fn insert_prediction(
        &self,
        prediction: &NutrientPrediction,
    ) -> Result<StoredPrediction, DBError> {
        let dao = self
            .bounded(nutrient_prediction::insert(&self.conn, prediction))
            .await?;
        Ok(dao.into())
    }

    async fn latest_readings(&self, limit: i64) -> Result<Vec<StoredReading>, DBError> {
        let mut daos = self
            .bounded(sensor_reading::get_latest(&self.conn, limit))
            .await?;
        Ok(daos.drain(..).map(StoredReading::from).collect())
    }

    async fn latest_predictions(&self, limit: i64) -> Result<Vec<StoredPrediction>, DBError> {
        let mut daos = self
            .bounded(nutrient_prediction::get_latest(&self.conn, limit))
            .await?;
        Ok(daos.drain(..).map(StoredPrediction::from).collect())
    }

    async fn reading_count(&self) -> Result<i64, DBError> {
        self.bounded(sensor_reading::count(&self.conn)).await
    }

    async fn prediction_count(&self) -> Result<i64, DBError> {
        self.bounded(nutrient_prediction::count(&self.conn)).await
    }

    async fn check(&self) -> Result<(), DBError> {
        self.bounded(async {
            sql_stmnt!("SELECT 1").execute(&self.conn).await?;
            Ok(())
        })
        .await
    }
}
