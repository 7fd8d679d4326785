use chrono::{Duration, NaiveDate};
use migralog_core::{
    count_by_month, yearly_average, AnalysisConfig, AnalysisWindow, AverageDivisor,
    DailyObservation, Dimension, EventStore, ReportDataAssembler, ThresholdRule, WeatherField,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Two years of synthetic weather where events cluster on warm days
fn synthetic() -> (EventStore, Vec<DailyObservation>) {
    let start = date(2020, 1, 1);
    let end = date(2021, 12, 31);
    let days = (end - start).num_days();

    let mut observations = Vec::new();
    let mut events = Vec::new();
    for i in 0..=days {
        let day = start + Duration::days(i);
        let warmth = (i % 30) as f64;
        let pressure = if i % 5 == 0 { 1015.0 } else { 1000.0 };

        observations.push(
            DailyObservation::new(day)
                .with(WeatherField::Tavg, warmth)
                .with(WeatherField::Prcp, (i % 7) as f64)
                .with(WeatherField::Wspd, (i % 11) as f64)
                .with(WeatherField::Pres, pressure),
        );

        if (warmth >= 20.0 && i % 2 == 0) || warmth == 3.0 {
            events.push(day);
        }
    }

    let window = AnalysisWindow::new(start, end).unwrap();
    (
        EventStore::new(window, events).with_patient_name("Test Patient"),
        observations,
    )
}

#[test]
fn half_year_scenario_counts() {
    let window = AnalysisWindow::new(date(2020, 1, 1), date(2020, 6, 30)).unwrap();
    let store = EventStore::new(
        window,
        vec![date(2020, 1, 5), date(2020, 1, 20), date(2020, 6, 1)],
    );

    let counts = count_by_month(&store);
    let by_month: Vec<_> = counts.for_year(2020).collect();
    insta::assert_snapshot!(format!("{by_month:?}"), @"[(1, 2), (2, 0), (3, 0), (4, 0), (5, 0), (6, 1)]");

    let averages = yearly_average(&window, &counts, AverageDivisor::Constant);
    assert_eq!(averages[&2020], 0.25);
}

#[test]
fn warm_days_are_associated_with_events() {
    let (store, observations) = synthetic();
    let findings = ReportDataAssembler::default().assemble(&store, &observations);

    let temperature = findings
        .weather_for(Dimension::Temperature)
        .expect("temperature finding");
    assert_eq!(temperature.rule, ThresholdRule::Median);
    assert!(temperature.test.significant);
    assert!(temperature.test.odds_ratio.unwrap() > 1.0);
    assert!(temperature.effect_fraction.unwrap() > 0.5);
    assert_eq!(temperature.table.total(), observations.len() as u64);

    let pressure = findings
        .weather_for(Dimension::Pressure)
        .expect("pressure finding");
    assert_eq!(pressure.threshold, 10.0);
    // First day has no previous value
    assert_eq!(pressure.table.total(), observations.len() as u64 - 1);

    assert!(findings.weather_for(Dimension::Precipitation).is_some());
    assert!(findings.weather_for(Dimension::WindSpeed).is_some());
    assert!(findings.omitted.is_empty());
    assert_eq!(findings.patient_name, "Test Patient");
    assert_eq!(findings.summary.total_events, store.count());
}

#[test]
fn month_tables_cover_every_year() {
    let (store, _) = synthetic();
    let findings = ReportDataAssembler::default().assemble(&store, &[]);

    assert_eq!(findings.months.len(), 12);
    for month in &findings.months {
        assert_eq!(month.baseline_month, 11);
        assert_eq!(month.table.row_totals(), [2, 2]);
        assert!((0.0..=1.0).contains(&month.test.p_value));
    }
}

#[test]
fn baseline_month_is_configurable() {
    let (store, _) = synthetic();
    let config = AnalysisConfig {
        baseline_month: 1,
        ..Default::default()
    };
    let findings = ReportDataAssembler::new(config).unwrap().assemble(&store, &[]);
    assert!(findings.months.iter().all(|m| m.baseline_month == 1));
}

#[test]
fn pipeline_is_deterministic() {
    let (store, observations) = synthetic();
    let assembler = ReportDataAssembler::default();

    let first = serde_json::to_string(&assembler.assemble(&store, &observations)).unwrap();
    let second = serde_json::to_string(&assembler.assemble(&store, &observations)).unwrap();
    assert_eq!(first, second);
}
