use crate::model::{CompareError, ComparisonResult};

/// Anything that can answer a two-term comparison query.
#[async_trait::async_trait]
pub trait AnalyticsSource: Send + Sync {
    async fn fetch(&self, term1: &str, term2: &str) -> Result<ComparisonResult, CompareError>;
}
