// Comparison fetching: the source seam and its HTTP implementation.

pub mod http;
pub mod traits;

pub use http::HttpAnalyticsSource;
pub use traits::AnalyticsSource;

use crate::model::CompareError;

/// Trims both terms and rejects empty ones.
pub fn validate_terms<'a>(term1: &'a str, term2: &'a str) -> Result<(&'a str, &'a str), CompareError> {
    let (t1, t2) = (term1.trim(), term2.trim());
    if t1.is_empty() || t2.is_empty() {
        return Err(CompareError::Validation(
            "both search terms must be non-empty".into(),
        ));
    }
    Ok((t1, t2))
}
