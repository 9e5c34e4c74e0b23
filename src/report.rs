// Presentation-ready summary of one comparison.
use crate::aligner::{align_series, AlignedSeries};
use crate::format::format_magnitude;
use crate::model::{CompareError, ComparisonResult, SearchTermAnalytics};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricValue {
    pub raw: f64,
    pub display: String,
}

impl MetricValue {
    fn new(raw: f64) -> Result<Self, CompareError> {
        Ok(Self {
            raw,
            display: format_magnitude(raw)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub title: &'static str,
    pub icon: &'static str,
    pub term1: MetricValue,
    pub term2: MetricValue,
}

impl MetricRow {
    fn build(
        title: &'static str,
        icon: &'static str,
        result: &ComparisonResult,
        pick: impl Fn(&SearchTermAnalytics) -> f64,
    ) -> Result<Self, CompareError> {
        Ok(Self {
            title,
            icon,
            term1: MetricValue::new(pick(&result.term_a))?,
            term2: MetricValue::new(pick(&result.term_b))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    pub term1: String,
    pub term2: String,
    /// "Total Videos" per term, shown unabbreviated.
    pub total_videos: (u64, u64),
    pub metrics: Vec<MetricRow>,
    pub timeline: AlignedSeries,
}

impl ComparisonReport {
    pub fn build(result: &ComparisonResult) -> Result<Self, CompareError> {
        let metrics = vec![
            MetricRow::build("Total Views", "👀", result, |a| a.total_view_count as f64)?,
            MetricRow::build("Average Views", "", result, |a| a.average_view_count)?,
            MetricRow::build("Total Likes", "👍", result, |a| a.total_like_count as f64)?,
            MetricRow::build("Average Likes", "", result, |a| a.average_like_count)?,
        ];

        Ok(Self {
            term1: result.term_a.search_term.clone(),
            term2: result.term_b.search_term.clone(),
            total_videos: (result.term_a.total_results, result.term_b.total_results),
            metrics,
            timeline: align_series(&result.term_a, &result.term_b)?,
        })
    }

    pub fn headline(&self) -> String {
        format!("Comparing {} vs {}", self.term1, self.term2)
    }

    pub fn metric(&self, title: &str) -> Option<&MetricRow> {
        self.metrics.iter().find(|m| m.title == title)
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analytics Comparison: {}", self.headline())?;
        writeln!(
            f,
            "📹 Total Videos: {} {} | {} {}",
            self.term1, self.total_videos.0, self.term2, self.total_videos.1
        )?;
        for row in &self.metrics {
            let icon = if row.icon.is_empty() { "•" } else { row.icon };
            writeln!(
                f,
                "{} {}: {} {} | {} {}",
                icon, row.title, self.term1, row.term1.display, self.term2, row.term2.display
            )?;
        }
        write!(f, "📈 Popularity Over Time ({} dates)", self.timeline.len())?;
        for point in &self.timeline.points {
            // Values here come from u64 counts, always in contract.
            let v1 = format_magnitude(point.term1_value as f64).map_err(|_| fmt::Error)?;
            let v2 = format_magnitude(point.term2_value as f64).map_err(|_| fmt::Error)?;
            write!(f, "\n  {}: {} | {}", point.label, v1, v2)?;
        }
        Ok(())
    }
}
