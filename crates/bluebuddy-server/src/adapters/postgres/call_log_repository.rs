//! PostgreSQL implementation of CallLogRepository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bluebuddy::{
    CallLog, CallLogRepository, CallStatus, DomainError, MedicationStatus, MedicationUpdate,
    NewCallLog,
};

/// PostgreSQL implementation of CallLogRepository
pub struct PgCallLogRepository {
    pool: PgPool,
}

impl PgCallLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct CallLogRow {
    id: i64,
    patient_id: i64,
    call_time: DateTime<Utc>,
    call_status: String,
    transcription: String,
    summary: String,
    alert: String,
    follow_up: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct MedicationRow {
    call_log_id: i64,
    medication: String,
    status: String,
}

impl CallLogRow {
    fn into_call_log(
        self,
        medication_updates: Vec<MedicationUpdate>,
    ) -> Result<CallLog, DomainError> {
        let call_status = self
            .call_status
            .parse::<CallStatus>()
            .map_err(DomainError::Repository)?;
        Ok(CallLog {
            id: self.id,
            patient_id: self.patient_id,
            call_time: self.call_time,
            call_status,
            transcription: self.transcription,
            summary: self.summary,
            alert: self.alert,
            follow_up: self.follow_up,
            medication_updates,
            created_at: self.created_at,
        })
    }
}

impl TryFrom<MedicationRow> for MedicationUpdate {
    type Error = DomainError;

    fn try_from(row: MedicationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            medication: row.medication,
            status: row
                .status
                .parse::<MedicationStatus>()
                .map_err(DomainError::Repository)?,
        })
    }
}

fn repository_error(e: sqlx::Error) -> DomainError {
    DomainError::Repository(e.to_string())
}

#[async_trait]
impl CallLogRepository for PgCallLogRepository {
    async fn create(&self, log: &NewCallLog) -> Result<CallLog, DomainError> {
        let mut tx = self.pool.begin().await.map_err(repository_error)?;

        let row = sqlx::query_as::<_, CallLogRow>(
            r#"
            INSERT INTO call_logs
                (patient_id, call_time, call_status, transcription, summary, alert, follow_up)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(log.patient_id)
        .bind(log.call_time)
        .bind(log.call_status.to_string())
        .bind(&log.transcription)
        .bind(&log.summary)
        .bind(&log.alert)
        .bind(&log.follow_up)
        .fetch_one(&mut *tx)
        .await
        .map_err(repository_error)?;

        for update in &log.medication_updates {
            sqlx::query(
                r#"
                INSERT INTO medication_logs (call_log_id, patient_id, medication, status)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(row.id)
            .bind(log.patient_id)
            .bind(&update.medication)
            .bind(update.status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(repository_error)?;
        }

        tx.commit().await.map_err(repository_error)?;

        tracing::info!(
            call_log_id = row.id,
            patient_id = log.patient_id,
            medications = log.medication_updates.len(),
            "Stored call log"
        );

        row.into_call_log(log.medication_updates.clone())
    }

    async fn find_by_patient(
        &self,
        patient_id: i64,
        limit: i64,
    ) -> Result<Vec<CallLog>, DomainError> {
        let rows = sqlx::query_as::<_, CallLogRow>(
            r#"
            SELECT * FROM call_logs
            WHERE patient_id = $1
            ORDER BY call_time DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(patient_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(repository_error)?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let medication_rows = sqlx::query_as::<_, MedicationRow>(
            r#"
            SELECT call_log_id, medication, status FROM medication_logs
            WHERE call_log_id = ANY($1)
            ORDER BY medication
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(repository_error)?;

        let mut by_log: HashMap<i64, Vec<MedicationUpdate>> = HashMap::new();
        for row in medication_rows {
            let call_log_id = row.call_log_id;
            by_log.entry(call_log_id).or_default().push(row.try_into()?);
        }

        rows.into_iter()
            .map(|row| {
                let updates = by_log.remove(&row.id).unwrap_or_default();
                row.into_call_log(updates)
            })
            .collect()
    }
}
