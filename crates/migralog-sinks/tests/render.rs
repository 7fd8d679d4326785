use chrono::NaiveDate;
use migralog_core::{
    AnalysisWindow, ChartRenderer, DailyObservation, DocumentRenderer, EventStore,
    ReportDataAssembler, WeatherField,
};
use migralog_sinks::{
    ArtifactDir, MarkdownReportRenderer, SvgChartRenderer, FINDINGS_FILE, PAGE_BREAK,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn store() -> EventStore {
    let window = AnalysisWindow::new(date(2021, 1, 1), date(2022, 12, 31)).unwrap();
    let events = vec![
        date(2021, 3, 1),
        date(2021, 3, 8),
        date(2021, 7, 4),
        date(2022, 3, 15),
        date(2022, 11, 2),
    ];
    EventStore::new(window, events).with_patient_name("Sam Sample")
}

#[test]
fn renders_charts_and_report() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = ArtifactDir::new(tmp.path().join("report")).unwrap();
    let store = store();

    let observations: Vec<_> = (1..=28)
        .map(|d| DailyObservation::new(date(2021, 2, d)).with(WeatherField::Tavg, f64::from(d)))
        .collect();
    let findings = ReportDataAssembler::default().assemble(&store, &observations);

    let mut charts = SvgChartRenderer::new(dir.clone());
    let artifacts: Vec<_> = ReportDataAssembler::chart_data(&store)
        .charts()
        .iter()
        .map(|c| charts.render(c).unwrap())
        .collect();
    // weekday, yearly, and one monthly chart per year
    assert_eq!(artifacts.len(), 4);
    assert!(artifacts.iter().all(|a| a.path.exists()));

    let mut document = MarkdownReportRenderer::new(dir.clone(), date(2023, 1, 15));
    let path = document.render(&findings, &artifacts).unwrap();
    let md = std::fs::read_to_string(&path).unwrap();

    assert!(md.starts_with("# Migraine Report for Sam Sample"));
    assert!(md.contains("Generated on: 01/15/2023"));
    assert!(md.contains("Total headache count: 5"));
    assert!(md.contains("![Events per year](events_per_year.svg)"));
    assert!(md.contains("The red line is the average"));
    assert!(md.contains("### Not analysed"));
    assert!(md.contains("## Appendix: Statistical Methods"));
    assert_eq!(md.matches("| March |").count(), 1);
    assert_eq!(md.matches(PAGE_BREAK).count(), 4);

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(tmp.path().join("report").join(FINDINGS_FILE)).unwrap())
            .unwrap();
    assert_eq!(json["findings"]["patient_name"], "Sam Sample");
    assert_eq!(json["findings"]["months"].as_array().unwrap().len(), 12);
    assert_eq!(json["charts"].as_array().unwrap().len(), 4);
    assert_eq!(json["generated_on"], "2023-01-15");
}
