use chrono::{Duration, NaiveDate};
use migralog_cli::{run_report, run_summary, ReportArgs};
use migralog_config::AppConfig;
use std::fmt::Write as _;
use std::path::Path;

/// Two years of daily weather with events clustered on warm days
fn write_inputs(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2022, 12, 31).unwrap();

    let mut log = String::from(
        "iHeadache Report\nPatient name : Casey Test\nStart date: 01/01/2021\nStop date: 12/31/2022\n\n",
    );
    let mut weather = String::from("date,tavg,tmin,tmax,prcp,snow,wdir,wspd,wpgt,pres,tsun\n");

    for i in 0..=(end - start).num_days() {
        let day = start + Duration::days(i);
        let warmth = (i % 20) as f64;
        writeln!(
            weather,
            "{},{warmth},,,{},,,{},,{},",
            day.format("%Y-%m-%d"),
            i % 4,
            i % 9,
            1000 + (i % 3) * 12
        )
        .unwrap();
        if (warmth >= 12.0 && i % 3 != 0) || (warmth < 12.0 && i % 7 == 0) {
            writeln!(log, "{} 08:00 AM Moderate", day.format("%m/%d/%Y")).unwrap();
        }
    }

    let log_path = dir.join("export.txt");
    let weather_path = dir.join("weather.csv");
    std::fs::write(&log_path, log).unwrap();
    std::fs::write(&weather_path, weather).unwrap();
    (log_path, weather_path)
}

#[tokio::test]
async fn report_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let (log, weather_csv) = write_inputs(tmp.path());
    let out = tmp.path().join("out");

    let cfg = AppConfig::from_toml_str("[location]\nlatitude = 35.1\nlongitude = -80.7\n").unwrap();
    let args = ReportArgs {
        log,
        postal_code: None,
        weather_csv: Some(weather_csv),
        meteostat_key: None,
        output: Some(out.clone()),
    };

    let path = run_report(&cfg, &args).await.unwrap();
    assert_eq!(path, out.join("report.md"));

    let md = std::fs::read_to_string(&path).unwrap();
    assert!(md.contains("# Migraine Report for Casey Test"));
    assert!(md.contains("### Temperature"));
    assert!(md.contains("average temperature has an effect"));

    for chart in [
        "most_common_day.svg",
        "events_per_year.svg",
        "2021_events_per_month.svg",
        "2022_events_per_month.svg",
    ] {
        assert!(out.join(chart).exists(), "missing {chart}");
    }

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(out.join("findings.json")).unwrap()).unwrap();
    let weather = json["findings"]["weather"].as_array().unwrap();
    assert!(weather.iter().any(|w| w["dimension"] == "temperature"));
}

#[tokio::test]
async fn report_without_weather_still_renders() {
    let tmp = tempfile::tempdir().unwrap();
    let (log, _) = write_inputs(tmp.path());
    let out = tmp.path().join("plain");

    let args = ReportArgs {
        log,
        output: Some(out.clone()),
        ..Default::default()
    };
    let path = run_report(&AppConfig::default(), &args).await.unwrap();

    let md = std::fs::read_to_string(path).unwrap();
    assert!(md.contains("no weather observations supplied"));
    assert!(md.contains("### Months"));
}

#[tokio::test]
async fn summary_of_log() {
    let tmp = tempfile::tempdir().unwrap();
    let (log, _) = write_inputs(tmp.path());

    let text = run_summary(&log).await.unwrap();
    assert!(text.starts_with("Patient: Casey Test\n"));
    assert!(text.contains("  2021: "));
    assert!(text.contains("  2022: "));
}

#[tokio::test]
async fn unreadable_log_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = run_summary(&tmp.path().join("missing.txt")).await.unwrap_err();
    assert!(err.to_string().contains("failed to read log"));
}
