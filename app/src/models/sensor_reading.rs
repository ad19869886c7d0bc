use super::{CountRecord, StoredReading};
use crate::error::DBError;
use chrono::{DateTime, Utc};
use hydrowatch_core::SensorReading;

#[derive(sqlx::FromRow)]
pub struct SensorReadingDao {
    pub(crate) id: i64,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) ph: f64,
    pub(crate) tds: f64,
    pub(crate) turbidity: f64,
    pub(crate) temperature: f64,
    pub(crate) humidity: f64,
    pub(crate) light_intensity: f64,
}

impl From<SensorReadingDao> for StoredReading {
    fn from(val: SensorReadingDao) -> Self {
        StoredReading {
            id: val.id,
            timestamp: val.timestamp,
            reading: SensorReading {
                ph: val.ph,
                tds: val.tds,
                turbidity: val.turbidity,
                temperature: val.temperature,
                humidity: val.humidity,
                light_intensity: val.light_intensity,
            },
        }
    }
}

/// Appends a reading.
///
/// The table lock serializes concurrent appends, so the stamped time is
/// never older than any previously stored row, even across processes.
/// Plain readers are not blocked by this lock mode.
pub async fn insert(conn: &sqlx::PgPool, reading: &SensorReading) -> Result<SensorReadingDao, DBError> {
    let mut tx = conn.begin().await?;
    sql_stmnt!("LOCK TABLE sensor_readings IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await?;

    let dao = sql_stmnt!(
        SensorReadingDao,
        r#"INSERT INTO sensor_readings
            (ph, tds, turbidity, temperature, humidity, light_intensity, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, GREATEST(
                clock_timestamp(),
                (SELECT COALESCE(MAX(timestamp), '-infinity'::timestamptz) FROM sensor_readings)
            ))
            RETURNING id, timestamp, ph, tds, turbidity, temperature, humidity, light_intensity"#,
        reading.ph,
        reading.tds,
        reading.turbidity,
        reading.temperature,
        reading.humidity,
        reading.light_intensity
    )
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(dao)
}

// READ sensor_readings
pub async fn get_latest(conn: &sqlx::PgPool, limit: i64) -> Result<Vec<SensorReadingDao>, DBError> {
    Ok(sql_stmnt!(
        SensorReadingDao,
        r#"SELECT id, timestamp, ph, tds, turbidity, temperature, humidity, light_intensity
            FROM sensor_readings
            ORDER BY id DESC
            LIMIT $1"#,
        limit
    )
    .fetch_all(conn)
    .await?)
}

pub async fn count(conn: &sqlx::PgPool) -> Result<i64, DBError> {
    let record = sql_stmnt!(CountRecord, "SELECT count(*) as count FROM sensor_readings")
        .fetch_one(conn)
        .await?;
    Ok(record.count())
}
