//! CallLog Repository Port
//!
//! Abstract interface for call log persistence operations.

use async_trait::async_trait;

use crate::domain::{errors::DomainError, CallLog, NewCallLog};

/// Repository interface for call logs
#[async_trait]
pub trait CallLogRepository: Send + Sync {
    /// Store a finished call's log together with its medication updates
    async fn create(&self, log: &NewCallLog) -> Result<CallLog, DomainError>;

    /// Most recent logs for a patient, newest first
    async fn find_by_patient(&self, patient_id: i64, limit: i64)
        -> Result<Vec<CallLog>, DomainError>;

    /// Latest log for a patient, used to carry follow-up topics forward
    async fn latest_for_patient(&self, patient_id: i64) -> Result<Option<CallLog>, DomainError> {
        Ok(self.find_by_patient(patient_id, 1).await?.into_iter().next())
    }
}
