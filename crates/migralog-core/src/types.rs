//! Core data types for symptom logs and daily weather

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

use crate::{CoreError, CoreResult};

/// Inclusive date range the analysis covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl AnalysisWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> CoreResult<Self> {
        if start > end {
            return Err(CoreError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Calendar years touched by the window
    pub fn years(&self) -> RangeInclusive<i32> {
        self.start.year()..=self.end.year()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every (year, month) bucket the monthly statistics cover.
    ///
    /// All twelve months of each year are included except in the final
    /// year, which stops at the window's end month. Months before the start
    /// month in the first year are kept, so early buckets count as zero.
    pub fn month_keys(&self) -> impl Iterator<Item = MonthKey> + '_ {
        self.years().flat_map(move |year| {
            let last = if year == self.end.year() {
                self.end.month()
            } else {
                12
            };
            (1..=last).map(move |month| MonthKey { year, month })
        })
    }
}

/// A (year, month) bucket identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// English month name for 1..=12
pub fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    month
        .checked_sub(1)
        .and_then(|i| NAMES.get(i as usize))
        .copied()
        .unwrap_or("Unknown")
}

/// English weekday name, 0 = Monday
pub fn weekday_name(index: usize) -> &'static str {
    const NAMES: [&str; 7] = [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ];
    NAMES.get(index).copied().unwrap_or("Unknown")
}

/// Daily weather columns supplied by the weather provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherField {
    Tavg,
    Tmin,
    Tmax,
    Prcp,
    Snow,
    Wdir,
    Wspd,
    Wpgt,
    Pres,
    Tsun,
}

impl WeatherField {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherField::Tavg => "tavg",
            WeatherField::Tmin => "tmin",
            WeatherField::Tmax => "tmax",
            WeatherField::Prcp => "prcp",
            WeatherField::Snow => "snow",
            WeatherField::Wdir => "wdir",
            WeatherField::Wspd => "wspd",
            WeatherField::Wpgt => "wpgt",
            WeatherField::Pres => "pres",
            WeatherField::Tsun => "tsun",
        }
    }

    /// Human label used in report text
    pub fn label(&self) -> &'static str {
        match self {
            WeatherField::Tavg => "average temperature",
            WeatherField::Tmin => "minimum temperature",
            WeatherField::Tmax => "maximum temperature",
            WeatherField::Prcp => "precipitation",
            WeatherField::Snow => "snow depth",
            WeatherField::Wdir => "wind direction",
            WeatherField::Wspd => "wind speed",
            WeatherField::Wpgt => "peak wind gust",
            WeatherField::Pres => "air pressure",
            WeatherField::Tsun => "sunshine duration",
        }
    }
}

impl fmt::Display for WeatherField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One day of weather at the analysis location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    #[serde(alias = "time")]
    pub date: NaiveDate,
    #[serde(default)]
    pub tavg: Option<f64>,
    #[serde(default)]
    pub tmin: Option<f64>,
    #[serde(default)]
    pub tmax: Option<f64>,
    #[serde(default)]
    pub prcp: Option<f64>,
    #[serde(default)]
    pub snow: Option<f64>,
    #[serde(default)]
    pub wdir: Option<f64>,
    #[serde(default)]
    pub wspd: Option<f64>,
    #[serde(default)]
    pub wpgt: Option<f64>,
    #[serde(default)]
    pub pres: Option<f64>,
    #[serde(default)]
    pub tsun: Option<f64>,
}

impl DailyObservation {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            tavg: None,
            tmin: None,
            tmax: None,
            prcp: None,
            snow: None,
            wdir: None,
            wspd: None,
            wpgt: None,
            pres: None,
            tsun: None,
        }
    }

    pub fn value(&self, field: WeatherField) -> Option<f64> {
        let value = match field {
            WeatherField::Tavg => self.tavg,
            WeatherField::Tmin => self.tmin,
            WeatherField::Tmax => self.tmax,
            WeatherField::Prcp => self.prcp,
            WeatherField::Snow => self.snow,
            WeatherField::Wdir => self.wdir,
            WeatherField::Wspd => self.wspd,
            WeatherField::Wpgt => self.wpgt,
            WeatherField::Pres => self.pres,
            WeatherField::Tsun => self.tsun,
        };
        value.filter(|v| v.is_finite())
    }

    pub fn with(mut self, field: WeatherField, value: f64) -> Self {
        let slot = match field {
            WeatherField::Tavg => &mut self.tavg,
            WeatherField::Tmin => &mut self.tmin,
            WeatherField::Tmax => &mut self.tmax,
            WeatherField::Prcp => &mut self.prcp,
            WeatherField::Snow => &mut self.snow,
            WeatherField::Wdir => &mut self.wdir,
            WeatherField::Wspd => &mut self.wspd,
            WeatherField::Wpgt => &mut self.wpgt,
            WeatherField::Pres => &mut self.pres,
            WeatherField::Tsun => &mut self.tsun,
        };
        *slot = Some(value);
        self
    }
}

/// Geographic point handed to the weather provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
}

/// Output of a log parser
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLog {
    pub patient_name: String,
    pub window: AnalysisWindow,
    pub events: Vec<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_rejects_inverted_bounds() {
        let err = AnalysisWindow::new(date(2021, 1, 2), date(2021, 1, 1)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidWindow { .. }));
        assert!(AnalysisWindow::new(date(2021, 1, 1), date(2021, 1, 1)).is_ok());
    }

    #[test]
    fn test_month_keys_truncate_final_year() {
        let window = AnalysisWindow::new(date(2019, 11, 15), date(2020, 3, 2)).unwrap();
        let keys: Vec<_> = window.month_keys().collect();

        // 2019 is a full year of buckets, 2020 stops at March
        assert_eq!(keys.len(), 12 + 3);
        assert_eq!(keys.first(), Some(&MonthKey { year: 2019, month: 1 }));
        assert_eq!(keys.last(), Some(&MonthKey { year: 2020, month: 3 }));
    }

    #[test]
    fn test_observation_value_ignores_nan() {
        let obs = DailyObservation::new(date(2020, 1, 1))
            .with(WeatherField::Tavg, 4.5)
            .with(WeatherField::Pres, f64::NAN);
        assert_eq!(obs.value(WeatherField::Tavg), Some(4.5));
        assert_eq!(obs.value(WeatherField::Pres), None);
        assert_eq!(obs.value(WeatherField::Prcp), None);
    }

    #[test]
    fn test_observation_serde_lowercase_fields() {
        let json = r#"{"date":"2020-05-01","tavg":12.3,"prcp":null}"#;
        let obs: DailyObservation = serde_json::from_str(json).unwrap();
        assert_eq!(obs.date, date(2020, 5, 1));
        assert_eq!(obs.tavg, Some(12.3));
        assert_eq!(obs.prcp, None);
        assert_eq!(obs.wspd, None);
    }

    #[test]
    fn test_names() {
        assert_eq!(month_name(11), "November");
        assert_eq!(month_name(0), "Unknown");
        assert_eq!(weekday_name(6), "Sunday");
        assert_eq!(WeatherField::Wspd.to_string(), "wspd");
    }
}
