//! Runs every analysis dimension and collects the findings for rendering

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, instrument, warn};

use crate::{
    association_test, build_from_labels, classify_by_delta, classify_by_median, count_by_month,
    count_by_month_in_year, count_by_weekday, count_by_year, exact_test, month_name,
    summary_stats, tally_month, yearly_average, AnalysisConfig, AnalysisWindow, Chart,
    Comparator, ContingencyTable, CoreError, CoreResult, DailyObservation, EventStore, Level,
    SummaryStats, TestResult, ThresholdRule, WeatherField, WeekdayTally,
};

/// An independent slice of the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dimension {
    Months,
    Temperature,
    Precipitation,
    WindSpeed,
    Pressure,
}

impl Dimension {
    pub const WEATHER: [Dimension; 4] = [
        Dimension::Temperature,
        Dimension::Precipitation,
        Dimension::WindSpeed,
        Dimension::Pressure,
    ];

    /// Weather column a weather dimension reads
    pub fn field(&self) -> Option<WeatherField> {
        match self {
            Dimension::Months => None,
            Dimension::Temperature => Some(WeatherField::Tavg),
            Dimension::Precipitation => Some(WeatherField::Prcp),
            Dimension::WindSpeed => Some(WeatherField::Wspd),
            Dimension::Pressure => Some(WeatherField::Pres),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::Months => "months",
            Dimension::Temperature => "temperature",
            Dimension::Precipitation => "precipitation",
            Dimension::WindSpeed => "wind-speed",
            Dimension::Pressure => "pressure",
        };
        f.write_str(name)
    }
}

/// One calendar month compared with the baseline month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthFinding {
    pub month: u32,
    pub name: &'static str,
    pub baseline_month: u32,
    pub table: ContingencyTable,
    /// `odds_ratio` is the target month's odds of an above-average year
    /// over the baseline month's, `(b * c) / (a * d)` on `table`
    pub test: TestResult,
}

/// Association between one weather field and event days
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherFinding {
    pub dimension: Dimension,
    pub field: WeatherField,
    pub rule: ThresholdRule,
    /// Median value, or the day-over-day delta for the pressure rule
    pub threshold: f64,
    pub table: ContingencyTable,
    pub test: TestResult,
    /// Share of matched event days that fell above the threshold
    pub effect_fraction: Option<f64>,
}

/// A dimension left out of the report and why
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OmittedDimension {
    pub dimension: Dimension,
    pub reason: String,
}

/// Everything the document renderer needs; never holds raw events
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportFindings {
    pub patient_name: String,
    pub window: AnalysisWindow,
    pub summary: SummaryStats,
    pub months: Vec<MonthFinding>,
    pub weather: Vec<WeatherFinding>,
    pub omitted: Vec<OmittedDimension>,
}

impl ReportFindings {
    /// Months with significantly elevated risk, in calendar order
    pub fn significant_months(&self) -> impl Iterator<Item = &MonthFinding> {
        self.months.iter().filter(|m| m.test.significant)
    }

    pub fn weather_for(&self, dimension: Dimension) -> Option<&WeatherFinding> {
        self.weather.iter().find(|w| w.dimension == dimension)
    }
}

/// Pre-aggregated series for the chart renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub per_year: BTreeMap<i32, u32>,
    /// Sparse month tallies for every year of the window
    pub per_month: BTreeMap<i32, BTreeMap<u32, u32>>,
    pub weekday: WeekdayTally,
}

impl ChartData {
    pub fn charts(&self) -> Vec<Chart> {
        let mut charts = Vec::with_capacity(self.per_month.len() + 2);

        charts.push(Chart {
            name: "most_common_day".to_string(),
            title: "All time most common day of the week".to_string(),
            x_label: "Day of the week".to_string(),
            y_label: "Event count".to_string(),
            bars: self
                .weekday
                .counts
                .iter()
                .enumerate()
                .filter(|(_, c)| **c > 0)
                .map(|(i, c)| (crate::weekday_name(i).to_string(), f64::from(*c)))
                .collect(),
            overlay: Some(self.weekday.average),
        });

        charts.push(Chart {
            name: "events_per_year".to_string(),
            title: "Events per year".to_string(),
            x_label: "Year".to_string(),
            y_label: "Event count".to_string(),
            bars: self
                .per_year
                .iter()
                .map(|(y, c)| (y.to_string(), f64::from(*c)))
                .collect(),
            overlay: None,
        });

        for (year, months) in &self.per_month {
            charts.push(Chart {
                name: format!("{year}_events_per_month"),
                title: format!("Events per month in {year}"),
                x_label: "Month".to_string(),
                y_label: "Event count".to_string(),
                bars: months
                    .iter()
                    .map(|(m, c)| (month_name(*m).to_string(), f64::from(*c)))
                    .collect(),
                overlay: None,
            });
        }

        charts
    }
}

/// Runs the statistical pipeline for each dimension
#[derive(Debug, Clone, Default)]
pub struct ReportDataAssembler {
    config: AnalysisConfig,
}

impl ReportDataAssembler {
    pub fn new(config: AnalysisConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Compare every month against the configured baseline month.
    ///
    /// The target month uses the inclusive comparator and the baseline the
    /// exclusive one.
    pub fn month_findings(&self, store: &EventStore) -> Vec<MonthFinding> {
        let window = store.window();
        let counts = count_by_month(store);
        let averages = yearly_average(&window, &counts, self.config.average_divisor);
        let baseline_month = self.config.baseline_month;
        let baseline = tally_month(
            &window,
            &counts,
            &averages,
            baseline_month,
            Comparator::Exceeds,
        );

        (1..=12)
            .map(|month| {
                let target = tally_month(&window, &counts, &averages, month, Comparator::AtLeast);
                let table = ContingencyTable::from_tallies(baseline, target);
                let mut test = exact_test(&table, self.config.exact_method, self.config.alpha);
                test.odds_ratio = table.swap_rows().odds_ratio();
                MonthFinding {
                    month,
                    name: month_name(month),
                    baseline_month,
                    table,
                    test,
                }
            })
            .collect()
    }

    /// Test one weather dimension against event days
    pub fn weather_finding(
        &self,
        store: &EventStore,
        observations: &[DailyObservation],
        dimension: Dimension,
    ) -> CoreResult<WeatherFinding> {
        let field = dimension
            .field()
            .ok_or_else(|| CoreError::NotWeatherDimension(dimension.to_string()))?;

        let (rule, threshold, labels) = match dimension {
            Dimension::Pressure => {
                let delta = self.config.pressure_delta;
                let labels = classify_by_delta(observations, field, delta, store);
                (ThresholdRule::DayOverDayDelta { delta }, delta, labels)
            }
            _ => {
                let (median, labels) = classify_by_median(observations, field, store)?;
                (ThresholdRule::Median, median, labels)
            }
        };

        let table = build_from_labels(&labels);
        let test = association_test(&table, &self.config)?;

        let event_days = labels.iter().filter(|l| l.event).count();
        let above_with_event = labels
            .iter()
            .filter(|l| l.event && l.level == Level::Above)
            .count();
        let effect_fraction =
            (event_days > 0).then(|| above_with_event as f64 / event_days as f64);

        Ok(WeatherFinding {
            dimension,
            field,
            rule,
            threshold,
            table,
            test,
            effect_fraction,
        })
    }

    /// Run every dimension. A failing dimension is recorded in `omitted`
    /// and does not stop the others.
    #[instrument(skip_all, fields(events = store.count(), days = observations.len()))]
    pub fn assemble(&self, store: &EventStore, observations: &[DailyObservation]) -> ReportFindings {
        let counts = count_by_month(store);
        let summary = summary_stats(store, &counts);
        let months = self.month_findings(store);
        info!(
            significant = months.iter().filter(|m| m.test.significant).count(),
            "month comparison complete"
        );

        let mut weather = Vec::new();
        let mut omitted = Vec::new();
        for dimension in Dimension::WEATHER {
            if observations.is_empty() {
                omitted.push(OmittedDimension {
                    dimension,
                    reason: "no weather observations supplied".to_string(),
                });
                continue;
            }

            match self.weather_finding(store, observations, dimension) {
                Ok(finding) => {
                    info!(
                        %dimension,
                        p_value = finding.test.p_value,
                        significant = finding.test.significant,
                        "weather dimension complete"
                    );
                    weather.push(finding);
                }
                Err(e) => {
                    warn!(%dimension, error = %e, "omitting dimension from report");
                    omitted.push(OmittedDimension {
                        dimension,
                        reason: e.to_string(),
                    });
                }
            }
        }

        ReportFindings {
            patient_name: store.patient_name().to_string(),
            window: store.window(),
            summary,
            months,
            weather,
            omitted,
        }
    }

    /// Series for the chart renderer
    pub fn chart_data(store: &EventStore) -> ChartData {
        let per_month = store
            .window()
            .years()
            .map(|year| (year, count_by_month_in_year(store, year)))
            .collect();

        ChartData {
            per_year: count_by_year(store),
            per_month,
            weekday: count_by_weekday(store),
        }
    }
}
