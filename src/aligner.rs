// Merges two per-term popularity series onto one shared date axis.
use crate::format::{format_calendar_date, parse_date};
use crate::model::{AlignedPoint, CompareError, PopularityPoint, SearchTermAnalytics};
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Term1,
    Term2,
}

/// Aligned rows plus the labels they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedSeries {
    pub term1: String,
    pub term2: String,
    pub points: Vec<AlignedPoint>,
}

impl AlignedSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Values of one side in date order.
    pub fn series_for(&self, side: Side) -> Vec<u64> {
        self.points
            .iter()
            .map(|p| match side {
                Side::Term1 => p.term1_value,
                Side::Term2 => p.term2_value,
            })
            .collect()
    }

    /// Same alignment with the two terms exchanged.
    pub fn swap(self) -> Self {
        AlignedSeries {
            term1: self.term2,
            term2: self.term1,
            points: self
                .points
                .into_iter()
                .map(|p| AlignedPoint {
                    term1_value: p.term2_value,
                    term2_value: p.term1_value,
                    ..p
                })
                .collect(),
        }
    }
}

#[derive(Default)]
struct Slot {
    release_date: String,
    term1: Option<u64>,
    term2: Option<u64>,
}

/// Builds the union of calendar dates from both terms, ascending.
///
/// Repeated dates within one term keep the last value in source order.
/// A date missing for a term yields 0 for that term.
pub fn align_series(
    term1: &SearchTermAnalytics,
    term2: &SearchTermAnalytics,
) -> Result<AlignedSeries, CompareError> {
    let mut slots: BTreeMap<NaiveDate, Slot> = BTreeMap::new();

    fill(&mut slots, &term1.popularity_over_time, Side::Term1)?;
    fill(&mut slots, &term2.popularity_over_time, Side::Term2)?;

    let points = slots
        .into_iter()
        .map(|(date, slot)| AlignedPoint {
            date,
            label: format_calendar_date(date),
            release_date: slot.release_date,
            term1_value: slot.term1.unwrap_or(0),
            term2_value: slot.term2.unwrap_or(0),
        })
        .collect();

    Ok(AlignedSeries {
        term1: term1.search_term.clone(),
        term2: term2.search_term.clone(),
        points,
    })
}

fn fill(
    slots: &mut BTreeMap<NaiveDate, Slot>,
    series: &[PopularityPoint],
    side: Side,
) -> Result<(), CompareError> {
    for point in series {
        let date = parse_date(&point.release_date)?;
        let slot = slots.entry(date).or_insert_with(|| Slot {
            release_date: point.release_date.clone(),
            ..Slot::default()
        });
        match side {
            Side::Term1 => slot.term1 = Some(point.view_count),
            Side::Term2 => slot.term2 = Some(point.view_count),
        }
    }
    Ok(())
}
