//! Above/below labelling of periods and days

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::stats::median;
use crate::{
    AnalysisWindow, CoreError, CoreResult, DailyObservation, EventStore, MonthKey, PeriodCounts,
    WeatherField,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Above,
    Below,
}

/// Comparison used to decide whether a value is above its reference.
///
/// The two operators put ties in different buckets and are not
/// interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// `value >= reference` is above
    AtLeast,
    /// `value > reference` is above
    Exceeds,
}

impl Comparator {
    pub fn classify(self, value: f64, reference: f64) -> Level {
        let above = match self {
            Comparator::AtLeast => value >= reference,
            Comparator::Exceeds => value > reference,
        };
        if above {
            Level::Above
        } else {
            Level::Below
        }
    }
}

/// Number of years a month landed above / below its yearly average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LevelTally {
    pub above: u64,
    pub below: u64,
}

impl LevelTally {
    pub fn total(&self) -> u64 {
        self.above + self.below
    }
}

/// Tally one calendar month across every year of the window.
///
/// Years are walked in order; the first year whose month lies past the
/// window's end, or has no bucket or no average, ends the walk. Events
/// recorded after the window therefore never add a year to the tally.
pub fn tally_month(
    window: &AnalysisWindow,
    counts: &PeriodCounts,
    averages: &BTreeMap<i32, f64>,
    month: u32,
    comparator: Comparator,
) -> LevelTally {
    let mut tally = LevelTally::default();
    let last = MonthKey::of(window.end());

    for year in window.years() {
        let key = MonthKey { year, month };
        // Buckets past the window end only hold stray events
        if key > last {
            debug!(%key, "month lies past the window end, stopping month tally");
            break;
        }
        let (Some(count), Some(average)) = (counts.get(key), averages.get(&year)) else {
            debug!(%key, "no bucket or average, stopping month tally");
            break;
        };

        match comparator.classify(f64::from(count), *average) {
            Level::Above => tally.above += 1,
            Level::Below => tally.below += 1,
        }
    }

    tally
}

/// A classified day crossed with whether an event happened on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayLabel {
    pub date: NaiveDate,
    pub level: Level,
    pub event: bool,
}

/// How weather days are split into above/below
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum ThresholdRule {
    /// Value strictly above the median of the field over the window
    Median,
    /// Absolute day-over-day change strictly above `delta`
    DayOverDayDelta { delta: f64 },
}

/// Days labelled against the field's median.
///
/// Days missing the field are skipped. Returns the median alongside the
/// labels.
pub fn classify_by_median(
    observations: &[DailyObservation],
    field: WeatherField,
    store: &EventStore,
) -> CoreResult<(f64, Vec<DayLabel>)> {
    let values: Vec<f64> = observations.iter().filter_map(|o| o.value(field)).collect();
    let threshold = median(&values).ok_or_else(|| CoreError::MissingField(field.to_string()))?;

    let labels = observations
        .iter()
        .filter_map(|o| {
            o.value(field).map(|value| DayLabel {
                date: o.date,
                level: Comparator::Exceeds.classify(value, threshold),
                event: store.occurred_on(o.date),
            })
        })
        .collect();

    Ok((threshold, labels))
}

/// Days labelled by the size of the change from the previous day.
///
/// The first day has nothing to compare against and is skipped. A day
/// missing the field is skipped and also leaves the following day without a
/// previous value.
pub fn classify_by_delta(
    observations: &[DailyObservation],
    field: WeatherField,
    delta: f64,
    store: &EventStore,
) -> Vec<DayLabel> {
    let mut ordered: Vec<&DailyObservation> = observations.iter().collect();
    ordered.sort_by_key(|o| o.date);

    let mut labels = Vec::with_capacity(ordered.len());
    let mut previous: Option<f64> = None;

    for obs in ordered {
        let current = obs.value(field);
        if let (Some(prev), Some(value)) = (previous, current) {
            labels.push(DayLabel {
                date: obs.date,
                level: Comparator::Exceeds.classify((value - prev).abs(), delta),
                event: store.occurred_on(obs.date),
            });
        }
        previous = current;
    }

    labels
}
