//! Per-period event counts and averages

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::stats::median;
use crate::{AnalysisWindow, AverageDivisor, EventStore, MonthKey};

/// Event counts keyed by (year, month), zero-filled for every bucket the
/// window implies
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PeriodCounts {
    counts: BTreeMap<MonthKey, u32>,
}

impl PeriodCounts {
    pub fn get(&self, key: MonthKey) -> Option<u32> {
        self.counts.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MonthKey, u32)> + '_ {
        self.counts.iter().map(|(k, v)| (*k, *v))
    }

    /// Buckets of a single year in month order
    pub fn for_year(&self, year: i32) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.counts
            .range(MonthKey { year, month: 1 }..=MonthKey { year, month: 12 })
            .map(|(k, v)| (k.month, *v))
    }

    pub fn total(&self) -> u64 {
        self.counts.values().map(|v| u64::from(*v)).sum()
    }
}

/// Count events per (year, month).
///
/// Every bucket from [`AnalysisWindow::month_keys`] starts at zero. Events
/// outside the window are not filtered out; they land in their own bucket.
pub fn count_by_month(store: &EventStore) -> PeriodCounts {
    let window = store.window();
    let mut counts: BTreeMap<MonthKey, u32> = window.month_keys().map(|k| (k, 0)).collect();

    for event in store.iter() {
        *counts.entry(MonthKey::of(event)).or_insert(0) += 1;
    }

    PeriodCounts { counts }
}

/// Mean monthly count per year.
///
/// Only buckets inside the window contribute to the sum. With
/// [`AverageDivisor::Constant`] the divisor stays 12 for a truncated final
/// year, which pulls that year's average down.
pub fn yearly_average(
    window: &AnalysisWindow,
    counts: &PeriodCounts,
    divisor: AverageDivisor,
) -> BTreeMap<i32, f64> {
    window
        .years()
        .map(|year| {
            let (sum, present) = window
                .month_keys()
                .filter(|k| k.year == year)
                .filter_map(|k| counts.get(k))
                .fold((0u64, 0u32), |(sum, n), c| (sum + u64::from(c), n + 1));

            let denominator = match divisor {
                AverageDivisor::Constant => 12.0,
                AverageDivisor::PresentMonths => f64::from(present.max(1)),
            };
            (year, sum as f64 / denominator)
        })
        .collect()
}

/// Events per calendar year; only years with events appear
pub fn count_by_year(store: &EventStore) -> BTreeMap<i32, u32> {
    let mut years = BTreeMap::new();
    for event in store.iter() {
        *years.entry(event.year()).or_insert(0) += 1;
    }
    years
}

/// Events per month within one year; only months with events appear
pub fn count_by_month_in_year(store: &EventStore, year: i32) -> BTreeMap<u32, u32> {
    let mut months = BTreeMap::new();
    for event in store.iter().filter(|e| e.year() == year) {
        *months.entry(event.month()).or_insert(0) += 1;
    }
    months
}

/// Events per day of week, 0 = Monday
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayTally {
    pub counts: [u32; 7],
    /// Mean over the weekdays that have at least one event
    pub average: f64,
}

pub fn count_by_weekday(store: &EventStore) -> WeekdayTally {
    let mut counts = [0u32; 7];
    for event in store.iter() {
        counts[event.weekday().num_days_from_monday() as usize] += 1;
    }

    let seen: Vec<u32> = counts.iter().copied().filter(|c| *c > 0).collect();
    let average = if seen.is_empty() {
        0.0
    } else {
        seen.iter().map(|c| f64::from(*c)).sum::<f64>() / seen.len() as f64
    };

    WeekdayTally { counts, average }
}

/// Latest year with enough data to treat as complete.
///
/// A window ending before October does not count its final year.
pub fn most_recent_full_year(window: &AnalysisWindow) -> i32 {
    let end: NaiveDate = window.end();
    if end.month() < 10 {
        end.year() - 1
    } else {
        end.year()
    }
}

/// Headline figures for the report cover page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_events: usize,
    pub months_observed: usize,
    pub mean_per_month: f64,
    pub median_per_month: f64,
    pub mean_per_year: f64,
    pub most_recent_full_year: i32,
}

pub fn summary_stats(store: &EventStore, counts: &PeriodCounts) -> SummaryStats {
    let window = store.window();
    let in_window: Vec<f64> = window
        .month_keys()
        .filter_map(|k| counts.get(k))
        .map(f64::from)
        .collect();

    let months_observed = in_window.len();
    let mean_per_month = if months_observed == 0 {
        0.0
    } else {
        in_window.iter().sum::<f64>() / months_observed as f64
    };
    let years = window.years().count().max(1);

    SummaryStats {
        total_events: store.count(),
        months_observed,
        mean_per_month,
        median_per_month: median(&in_window).unwrap_or(0.0),
        mean_per_year: store.count() as f64 / years as f64,
        most_recent_full_year: most_recent_full_year(&window),
    }
}
