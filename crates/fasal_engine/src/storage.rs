use rusqlite::{Connection, OptionalExtension, params};
use std::sync::Mutex;

use crate::features::ForecastWindow;
use crate::types::{
    AdvisoryLogEntry, FeedbackRecord, PerformanceAggregate, RecommendationRecord, Season, SoilType,
};

/// SQLite-backed persistence for recommendations, feedback, performance
/// aggregates, model bundles and the advisory event log.
pub struct AdvisoryStorage {
    conn: Mutex<Connection>,
}

/// One joined (recommendation, feedback) pair used to build training sets.
pub struct TrainingRow {
    pub recommendation: RecommendationRecord,
    pub feedback: FeedbackRecord,
}

impl AdvisoryStorage {
    /// Open (or create) an advisory database at the given file path.
    pub fn open(path: &str) -> Result<Self, String> {
        let conn = Connection::open(path).map_err(|e| format!("Failed to open database: {e}"))?;
        Self::init_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory advisory database (useful for tests).
    pub fn in_memory() -> Result<Self, String> {
        let conn = Connection::open_in_memory()
            .map_err(|e| format!("Failed to open in-memory db: {e}"))?;
        Self::init_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_tables(conn: &Connection) -> Result<(), String> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS recommendations (
                id TEXT PRIMARY KEY,
                location TEXT NOT NULL,
                latitude REAL,
                longitude REAL,
                season TEXT NOT NULL,
                soil_type TEXT NOT NULL,
                temperature_c REAL NOT NULL,
                humidity_pct REAL NOT NULL,
                rainfall_mm REAL NOT NULL,
                condition TEXT NOT NULL DEFAULT '',
                fc_temp_avg REAL,
                fc_temp_min REAL,
                fc_temp_max REAL,
                fc_rain_total REAL,
                crops_offered TEXT NOT NULL DEFAULT '[]',
                timestamp TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS feedback (
                id TEXT PRIMARY KEY,
                recommendation_id TEXT NOT NULL,
                crop TEXT NOT NULL,
                yield_achieved REAL NOT NULL DEFAULT 0.0,
                profit_realized REAL NOT NULL DEFAULT 0.0,
                satisfaction INTEGER NOT NULL DEFAULT 3,
                success INTEGER NOT NULL DEFAULT 0,
                timestamp TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS crop_performance (
                location TEXT NOT NULL,
                crop TEXT NOT NULL,
                season TEXT NOT NULL,
                attempts INTEGER NOT NULL DEFAULT 0,
                successes INTEGER NOT NULL DEFAULT 0,
                yield_sum REAL NOT NULL DEFAULT 0.0,
                profit_sum REAL NOT NULL DEFAULT 0.0,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (location, crop, season)
            );

            CREATE TABLE IF NOT EXISTS model_bundles (
                version INTEGER PRIMARY KEY AUTOINCREMENT,
                artifact TEXT NOT NULL,
                sample_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS advisory_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type TEXT NOT NULL,
                description TEXT NOT NULL,
                details TEXT NOT NULL DEFAULT '',
                timestamp TEXT NOT NULL
            );
            ",
        )
        .map_err(|e| format!("Failed to initialize tables: {e}"))?;
        Ok(())
    }

    // ── recommendations ──────────────────────────────────────────────

    /// Insert an issued recommendation. The record's `id` and `timestamp`
    /// must already be filled by the caller.
    pub fn insert_recommendation(&self, record: &RecommendationRecord) -> Result<(), String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let crops_json = serde_json::to_string(&record.crops_offered)
            .map_err(|e| format!("Failed to serialize crop list: {e}"))?;
        conn.execute(
            "INSERT INTO recommendations
                (id, location, latitude, longitude, season, soil_type,
                 temperature_c, humidity_pct, rainfall_mm, condition,
                 fc_temp_avg, fc_temp_min, fc_temp_max, fc_rain_total,
                 crops_offered, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                record.id,
                record.location,
                record.latitude,
                record.longitude,
                record.season.as_str(),
                record.soil_type.as_str(),
                record.weather.temperature_c,
                record.weather.humidity_pct,
                record.weather.rainfall_mm,
                record.weather.condition,
                record.forecast.map(|w| w.temp_avg_c),
                record.forecast.map(|w| w.temp_min_c),
                record.forecast.map(|w| w.temp_max_c),
                record.forecast.map(|w| w.rain_total_mm),
                crops_json,
                record.timestamp,
            ],
        )
        .map_err(|e| format!("Failed to insert recommendation: {e}"))?;
        Ok(())
    }

    /// Fetch a single recommendation by id.
    pub fn get_recommendation(&self, id: &str) -> Result<Option<RecommendationRecord>, String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        Self::lookup_recommendation(&conn, id)
    }

    fn lookup_recommendation(
        conn: &Connection,
        id: &str,
    ) -> Result<Option<RecommendationRecord>, String> {
        conn.query_row(
            "SELECT id, location, latitude, longitude, season, soil_type,
                    temperature_c, humidity_pct, rainfall_mm, condition,
                    fc_temp_avg, fc_temp_min, fc_temp_max, fc_rain_total,
                    crops_offered, timestamp
             FROM recommendations WHERE id = ?1",
            params![id],
            Self::row_to_recommendation,
        )
        .optional()
        .map_err(|e| format!("Failed to query recommendation: {e}"))
    }

    fn row_to_recommendation(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecommendationRecord> {
        let season_str: String = row.get(4)?;
        let soil_str: String = row.get(5)?;
        let crops_json: String = row.get(14)?;
        let forecast = match (
            row.get::<_, Option<f64>>(10)?,
            row.get::<_, Option<f64>>(11)?,
            row.get::<_, Option<f64>>(12)?,
            row.get::<_, Option<f64>>(13)?,
        ) {
            (Some(avg), Some(min), Some(max), Some(rain)) => Some(ForecastWindow {
                temp_avg_c: avg,
                temp_min_c: min,
                temp_max_c: max,
                rain_total_mm: rain,
            }),
            _ => None,
        };
        Ok(RecommendationRecord {
            id: row.get(0)?,
            location: row.get(1)?,
            latitude: row.get(2)?,
            longitude: row.get(3)?,
            season: Season::parse_or_month(Some(&season_str), 1),
            soil_type: SoilType::parse(&soil_str),
            weather: fasal_gateway::types::WeatherSnapshot {
                temperature_c: row.get(6)?,
                humidity_pct: row.get(7)?,
                rainfall_mm: row.get(8)?,
                condition: row.get(9)?,
            },
            forecast,
            crops_offered: serde_json::from_str(&crops_json).unwrap_or_default(),
            timestamp: row.get(15)?,
        })
    }

    // ── feedback and aggregates ──────────────────────────────────────

    /// Insert a feedback record and fold it into the matching performance
    /// aggregate in a single transaction, so a reader never observes the
    /// feedback without its aggregate update. Returns the (location, season)
    /// the aggregate was keyed under.
    pub fn insert_feedback_with_aggregate(
        &self,
        record: &FeedbackRecord,
    ) -> Result<(String, Season), String> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let tx = conn
            .transaction()
            .map_err(|e| format!("Failed to begin transaction: {e}"))?;

        // Resolve the aggregate key from the referenced recommendation.
        // Dangling references still count, under a sentinel location.
        let (location, season) = match Self::lookup_recommendation(&tx, &record.recommendation_id)?
        {
            Some(rec) => (rec.location, rec.season),
            None => ("unknown".to_string(), Season::current()),
        };

        tx.execute(
            "INSERT INTO feedback
                (id, recommendation_id, crop, yield_achieved, profit_realized,
                 satisfaction, success, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id,
                record.recommendation_id,
                record.crop,
                record.yield_achieved,
                record.profit_realized,
                i64::from(record.satisfaction),
                record.success as i64,
                record.timestamp,
            ],
        )
        .map_err(|e| format!("Failed to insert feedback: {e}"))?;

        tx.execute(
            "INSERT INTO crop_performance
                (location, crop, season, attempts, successes, yield_sum, profit_sum, updated_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?5, ?6, ?7)
             ON CONFLICT(location, crop, season) DO UPDATE SET
                attempts = attempts + 1,
                successes = successes + excluded.successes,
                yield_sum = yield_sum + excluded.yield_sum,
                profit_sum = profit_sum + excluded.profit_sum,
                updated_at = excluded.updated_at",
            params![
                location,
                record.crop.to_lowercase(),
                season.as_str(),
                record.success as i64,
                record.yield_achieved,
                record.profit_realized,
                record.timestamp,
            ],
        )
        .map_err(|e| format!("Failed to update performance aggregate: {e}"))?;

        tx.commit()
            .map_err(|e| format!("Failed to commit feedback: {e}"))?;
        Ok((location, season))
    }

    /// Fetch the performance aggregate for one (location, crop, season) key.
    pub fn get_aggregate(
        &self,
        location: &str,
        crop: &str,
        season: Season,
    ) -> Result<Option<PerformanceAggregate>, String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        conn.query_row(
            "SELECT location, crop, season, attempts, successes, yield_sum, profit_sum
             FROM crop_performance
             WHERE location = ?1 AND crop = ?2 AND season = ?3",
            params![location, crop.to_lowercase(), season.as_str()],
            |row| {
                let season_str: String = row.get(2)?;
                Ok(PerformanceAggregate {
                    location: row.get(0)?,
                    crop: row.get(1)?,
                    season: Season::parse_or_month(Some(&season_str), 1),
                    attempts: row.get::<_, i64>(3)? as u32,
                    successes: row.get::<_, i64>(4)? as u32,
                    yield_sum: row.get(5)?,
                    profit_sum: row.get(6)?,
                })
            },
        )
        .optional()
        .map_err(|e| format!("Failed to query aggregate: {e}"))
    }

    /// Per-crop success rates for a location, across all seasons.
    pub fn location_success_rates(
        &self,
        location: &str,
    ) -> Result<Vec<(String, f64)>, String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let mut stmt = conn
            .prepare(
                "SELECT crop, SUM(attempts), SUM(successes)
                 FROM crop_performance
                 WHERE location = ?1
                 GROUP BY crop",
            )
            .map_err(|e| format!("Failed to prepare query: {e}"))?;
        let rows = stmt
            .query_map(params![location], |row| {
                let crop: String = row.get(0)?;
                let attempts: i64 = row.get(1)?;
                let successes: i64 = row.get(2)?;
                let rate = if attempts > 0 {
                    (successes as f64 / attempts as f64).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                Ok((crop, rate))
            })
            .map_err(|e| format!("Failed to query success rates: {e}"))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| format!("Failed to read rate row: {e}"))?);
        }
        Ok(results)
    }

    /// Count of stored feedback records.
    pub fn feedback_count(&self) -> Result<u64, String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM feedback", [], |row| row.get(0))
            .map_err(|e| format!("Failed to count feedback: {e}"))?;
        Ok(count as u64)
    }

    /// Join feedback back to the recommendations that produced it. Feedback
    /// whose recommendation id no longer resolves is skipped by the join.
    pub fn training_rows(&self) -> Result<Vec<TrainingRow>, String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let mut stmt = conn
            .prepare(
                "SELECT r.id, r.location, r.latitude, r.longitude, r.season, r.soil_type,
                        r.temperature_c, r.humidity_pct, r.rainfall_mm, r.condition,
                        r.fc_temp_avg, r.fc_temp_min, r.fc_temp_max, r.fc_rain_total,
                        r.crops_offered, r.timestamp,
                        f.id, f.recommendation_id, f.crop, f.yield_achieved,
                        f.profit_realized, f.satisfaction, f.success, f.timestamp
                 FROM feedback f
                 INNER JOIN recommendations r ON r.id = f.recommendation_id
                 ORDER BY f.timestamp ASC",
            )
            .map_err(|e| format!("Failed to prepare training query: {e}"))?;

        let rows = stmt
            .query_map([], |row| {
                let recommendation = Self::row_to_recommendation(row)?;
                let feedback = FeedbackRecord {
                    id: row.get(16)?,
                    recommendation_id: row.get(17)?,
                    crop: row.get(18)?,
                    yield_achieved: row.get(19)?,
                    profit_realized: row.get(20)?,
                    satisfaction: row.get::<_, i64>(21)? as u8,
                    success: row.get::<_, i64>(22)? != 0,
                    timestamp: row.get(23)?,
                };
                Ok(TrainingRow {
                    recommendation,
                    feedback,
                })
            })
            .map_err(|e| format!("Failed to query training rows: {e}"))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| format!("Failed to read training row: {e}"))?);
        }
        Ok(results)
    }

    // ── model bundles ────────────────────────────────────────────────

    /// Persist a serialized model bundle. Returns the assigned version.
    pub fn save_model_bundle(&self, artifact: &str, sample_count: u64) -> Result<i64, String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        conn.execute(
            "INSERT INTO model_bundles (artifact, sample_count, created_at)
             VALUES (?1, ?2, ?3)",
            params![
                artifact,
                sample_count as i64,
                chrono::Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| format!("Failed to save model bundle: {e}"))?;
        Ok(conn.last_insert_rowid())
    }

    /// Fetch the newest persisted model bundle, if any.
    pub fn load_latest_model_bundle(&self) -> Result<Option<(i64, String)>, String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        conn.query_row(
            "SELECT version, artifact FROM model_bundles
             ORDER BY version DESC LIMIT 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|e| format!("Failed to load model bundle: {e}"))
    }

    // ── advisory log ─────────────────────────────────────────────────

    /// Append an entry to the advisory event log.
    pub fn log_event(
        &self,
        event_type: &str,
        description: &str,
        details: &str,
    ) -> Result<(), String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        conn.execute(
            "INSERT INTO advisory_log (event_type, description, details, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                event_type,
                description,
                details,
                chrono::Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| format!("Failed to log event: {e}"))?;
        Ok(())
    }

    /// Read the most recent advisory log entries, newest first.
    pub fn get_log(&self, limit: usize) -> Result<Vec<AdvisoryLogEntry>, String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let mut stmt = conn
            .prepare(
                "SELECT id, event_type, description, details, timestamp
                 FROM advisory_log
                 ORDER BY id DESC
                 LIMIT ?1",
            )
            .map_err(|e| format!("Failed to prepare query: {e}"))?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(AdvisoryLogEntry {
                    id: row.get(0)?,
                    event_type: row.get(1)?,
                    description: row.get(2)?,
                    details: row.get(3)?,
                    timestamp: row.get(4)?,
                })
            })
            .map_err(|e| format!("Failed to query log: {e}"))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| format!("Failed to read log row: {e}"))?);
        }
        Ok(results)
    }
}
