//! Owned, immutable collection of logged events

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::{AnalysisWindow, ParsedLog};

/// Dated events plus the window they were logged over.
///
/// Duplicate dates are kept as separate events. Day matching against weather
/// data only needs to know whether a day had at least one event, so a day
/// set is built once at construction.
#[derive(Debug, Clone)]
pub struct EventStore {
    patient_name: String,
    window: AnalysisWindow,
    events: Vec<NaiveDate>,
    days: BTreeSet<NaiveDate>,
}

impl EventStore {
    pub fn new(window: AnalysisWindow, events: Vec<NaiveDate>) -> Self {
        let days = events.iter().copied().collect();
        Self {
            patient_name: String::new(),
            window,
            events,
            days,
        }
    }

    pub fn with_patient_name(mut self, name: impl Into<String>) -> Self {
        self.patient_name = name.into();
        self
    }

    pub fn patient_name(&self) -> &str {
        &self.patient_name
    }

    pub fn window(&self) -> AnalysisWindow {
        self.window
    }

    /// Total number of events, duplicates included
    pub fn count(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.events.iter().copied()
    }

    /// Whether at least one event was logged on `date`
    pub fn occurred_on(&self, date: NaiveDate) -> bool {
        self.days.contains(&date)
    }

    /// Number of distinct days with at least one event
    pub fn distinct_days(&self) -> usize {
        self.days.len()
    }
}

impl From<ParsedLog> for EventStore {
    fn from(log: ParsedLog) -> Self {
        EventStore::new(log.window, log.events).with_patient_name(log.patient_name)
    }
}
