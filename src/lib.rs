pub mod aligner;
pub mod cache;
pub mod config;
pub mod fetcher;
pub mod format;
pub mod model;
pub mod report;
pub mod session;

pub use aligner::{align_series, AlignedSeries, Side};
pub use cache::{CacheKey, CacheSnapshot, CacheStatus, ComparisonCache, FetchMode, RequestOutcome, StatusChange};
pub use fetcher::{AnalyticsSource, HttpAnalyticsSource};
pub use format::{format_date, format_magnitude};
pub use model::{AlignedPoint, CompareError, ComparisonResult, ErrorKind, PopularityPoint, SearchTermAnalytics};
pub use report::ComparisonReport;
pub use session::{ComparisonSession, SubmitState};
