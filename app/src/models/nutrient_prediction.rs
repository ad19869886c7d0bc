use super::{CountRecord, StoredPrediction};
use crate::error::DBError;
use chrono::{DateTime, Utc};
use hydrowatch_core::NutrientPrediction;

#[derive(sqlx::FromRow)]
pub struct NutrientPredictionDao {
    pub(crate) id: i64,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) nitrogen: f64,
    pub(crate) phosphorus: f64,
    pub(crate) potassium: f64,
    pub(crate) calcium: f64,
    pub(crate) magnesium: f64,
    pub(crate) sulfur: f64,
}

impl From<NutrientPredictionDao> for StoredPrediction {
    fn from(val: NutrientPredictionDao) -> Self {
        StoredPrediction {
            id: val.id,
            timestamp: val.timestamp,
            prediction: NutrientPrediction {
                nitrogen: val.nitrogen,
                phosphorus: val.phosphorus,
                potassium: val.potassium,
                calcium: val.calcium,
                magnesium: val.magnesium,
                sulfur: val.sulfur,
            },
        }
    }
}

/// Appends a prediction, see `sensor_reading::insert` for the locking
pub async fn insert(
    conn: &sqlx::PgPool,
    prediction: &NutrientPrediction,
) -> Result<NutrientPredictionDao, DBError> {
    let mut tx = conn.begin().await?;
    sql_stmnt!("LOCK TABLE nutrient_predictions IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await?;

    let dao = sql_stmnt!(
        NutrientPredictionDao,
        r#"INSERT INTO nutrient_predictions
            (nitrogen, phosphorus, potassium, calcium, magnesium, sulfur, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, GREATEST(
                clock_timestamp(),
                (SELECT COALESCE(MAX(timestamp), '-infinity'::timestamptz) FROM nutrient_predictions)
            ))
            RETURNING id, timestamp, nitrogen, phosphorus, potassium, calcium, magnesium, sulfur"#,
        prediction.nitrogen,
        prediction.phosphorus,
        prediction.potassium,
        prediction.calcium,
        prediction.magnesium,
        prediction.sulfur
    )
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(dao)
}

// READ nutrient_predictions
pub async fn get_latest(
    conn: &sqlx::PgPool,
    limit: i64,
) -> Result<Vec<NutrientPredictionDao>, DBError> {
    Ok(sql_stmnt!(
        NutrientPredictionDao,
        r#"SELECT id, timestamp, nitrogen, phosphorus, potassium, calcium, magnesium, sulfur
            FROM nutrient_predictions
            ORDER BY id DESC
            LIMIT $1"#,
        limit
    )
    .fetch_all(conn)
    .await?)
}

pub async fn count(conn: &sqlx::PgPool) -> Result<i64, DBError> {
    let record = sql_stmnt!(CountRecord, "SELECT count(*) as count FROM nutrient_predictions")
        .fetch_one(conn)
        .await?;
    Ok(record.count())
}
