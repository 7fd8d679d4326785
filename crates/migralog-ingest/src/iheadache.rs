//! Parser for iHeadache diary text exports

use chrono::NaiveDate;
use migralog_core::{AnalysisWindow, LogParser, ParsedLog};
use tracing::{debug, info};

use crate::{IngestError, IngestResult};

pub const DATE_FORMAT: &str = "%m/%d/%Y";

const NAME_MARKER: &str = "Patient name : ";
const START_MARKER: &str = "Start date: ";
const STOP_MARKER: &str = "Stop date: ";

/// Reads the patient header and one event per line whose first
/// space-separated token is an `MM/DD/YYYY` date. Anything else is skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct IHeadacheParser;

impl IHeadacheParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_str(&self, input: &str) -> IngestResult<ParsedLog> {
        let mut name = None;
        let mut start = None;
        let mut stop = None;
        let mut events = Vec::new();
        let mut skipped = 0usize;

        for (line_no, raw) in input.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(rest) = after_marker(line, NAME_MARKER) {
                name = Some(rest.trim().to_string());
            }
            if let Some(rest) = after_marker(line, START_MARKER) {
                start = Some(parse_date(rest.trim())?);
            }
            if let Some(rest) = after_marker(line, STOP_MARKER) {
                stop = Some(parse_date(rest.trim())?);
            }

            let token = line.split(' ').next().unwrap_or_default();
            match NaiveDate::parse_from_str(token, DATE_FORMAT) {
                Ok(date) => events.push(date),
                Err(_) => {
                    skipped += 1;
                    debug!(line = line_no + 1, "skipping line without a leading date");
                }
            }
        }

        let patient_name = name.ok_or(IngestError::MissingHeader("Patient name"))?;
        let start = start.ok_or(IngestError::MissingHeader("Start date"))?;
        let stop = stop.ok_or(IngestError::MissingHeader("Stop date"))?;
        let window = AnalysisWindow::new(start, stop)?;

        info!(
            events = events.len(),
            skipped,
            %start,
            %stop,
            "parsed iHeadache export"
        );

        Ok(ParsedLog {
            patient_name,
            window,
            events,
        })
    }
}

impl LogParser for IHeadacheParser {
    fn parse(&self, input: &str) -> anyhow::Result<ParsedLog> {
        Ok(self.parse_str(input)?)
    }
}

fn after_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.find(marker).map(|i| &line[i + marker.len()..])
}

fn parse_date(value: &str) -> IngestResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|source| IngestError::InvalidDate {
        value: value.to_string(),
        source,
    })
}
