// Core structs: SearchTermAnalytics, ComparisonResult, AlignedPoint
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One video release sample reported by the analytics source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularityPoint {
    /// ISO-8601 date or timestamp, exactly as the source sent it.
    pub release_date: String,
    pub view_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTermAnalytics {
    pub search_term: String,
    pub total_results: u64,
    pub videos_analyzed: u64,
    pub total_view_count: u64,
    pub average_view_count: f64,
    pub total_like_count: u64,
    pub average_like_count: f64,
    pub popularity_over_time: Vec<PopularityPoint>,
}

/// Response body of the comparison endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    #[serde(rename = "search_term_1")]
    pub term_a: SearchTermAnalytics,
    #[serde(rename = "search_term_2")]
    pub term_b: SearchTermAnalytics,
}

impl SearchTermAnalytics {
    /// Rejects values serde accepts but the data model does not.
    pub fn validate(&self) -> Result<(), CompareError> {
        if self.search_term.trim().is_empty() {
            return Err(CompareError::Schema("search_term is empty".into()));
        }
        for (name, value) in [
            ("average_view_count", self.average_view_count),
            ("average_like_count", self.average_like_count),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CompareError::Schema(format!(
                    "'{}' has invalid {}: {}",
                    self.search_term, name, value
                )));
            }
        }
        Ok(())
    }
}

impl ComparisonResult {
    pub fn validate(&self) -> Result<(), CompareError> {
        self.term_a.validate()?;
        self.term_b.validate()
    }
}

/// A single row of the unified date axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedPoint {
    pub date: NaiveDate,
    /// Display form, e.g. "Jan 5, 2024".
    pub label: String,
    /// First raw `release_date` seen for this calendar date.
    pub release_date: String,
    pub term1_value: u64,
    pub term2_value: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Transport,
    Upstream,
    Schema,
    Parse,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompareError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("API error ({status}): {message}")]
    Upstream { status: u16, message: String },
    #[error("unexpected response shape: {0}")]
    Schema(String),
    #[error("parse error: {0}")]
    Parse(String),
}

impl CompareError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompareError::Validation(_) => ErrorKind::Validation,
            CompareError::Transport(_) => ErrorKind::Transport,
            CompareError::Upstream { .. } => ErrorKind::Upstream,
            CompareError::Schema(_) => ErrorKind::Schema,
            CompareError::Parse(_) => ErrorKind::Parse,
        }
    }

    /// The bare message without the kind prefix, for rendering to a user.
    pub fn message(&self) -> &str {
        match self {
            CompareError::Validation(m)
            | CompareError::Transport(m)
            | CompareError::Schema(m)
            | CompareError::Parse(m) => m,
            CompareError::Upstream { message, .. } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "search_term_1": {
            "search_term": "cats",
            "total_results": 120,
            "videos_analyzed": 2,
            "total_view_count": 3000,
            "average_view_count": 1500.0,
            "total_like_count": 40,
            "average_like_count": 20.0,
            "popularity_over_time": [
                { "release_date": "2024-01-01T10:00:00Z", "view_count": 1000 },
                { "release_date": "2024-01-02T10:00:00Z", "view_count": 2000 }
            ]
        },
        "search_term_2": {
            "search_term": "dogs",
            "total_results": 95,
            "videos_analyzed": 0,
            "total_view_count": 0,
            "average_view_count": 0,
            "total_like_count": 0,
            "average_like_count": 0,
            "popularity_over_time": []
        }
    }"#;

    #[test]
    fn deserializes_wire_field_names() {
        let result: ComparisonResult = serde_json::from_str(BODY).unwrap();
        assert_eq!(result.term_a.search_term, "cats");
        assert_eq!(result.term_b.total_results, 95);
        assert_eq!(result.term_a.popularity_over_time.len(), 2);
        assert!(result.validate().is_ok());
    }

    #[test]
    fn negative_counts_are_rejected_by_serde() {
        let body = BODY.replace("\"total_results\": 95", "\"total_results\": -1");
        assert!(serde_json::from_str::<ComparisonResult>(&body).is_err());
    }

    #[test]
    fn negative_average_fails_validation() {
        let mut result: ComparisonResult = serde_json::from_str(BODY).unwrap();
        result.term_b.average_like_count = -2.5;
        let err = result.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn blank_search_term_fails_validation() {
        let mut result: ComparisonResult = serde_json::from_str(BODY).unwrap();
        result.term_a.search_term = "  ".into();
        let err = result.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn message_strips_kind_prefix() {
        let err = CompareError::Upstream {
            status: 429,
            message: "quota exceeded".into(),
        };
        assert_eq!(err.message(), "quota exceeded");
        assert_eq!(err.to_string(), "API error (429): quota exceeded");
    }
}
