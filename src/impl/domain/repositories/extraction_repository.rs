use async_trait::async_trait;
use chrono::NaiveDate;

use crate::entities::ExtractionResult;

#[async_trait]
pub trait ExtractionRepository: Send + Sync {
    /// Never fails: oracle and parsing failures are folded into the result.
    async fn extract(&self, text: &str, reference_date: NaiveDate) -> ExtractionResult;
}
