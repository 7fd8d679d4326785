//! Multi-page Markdown report plus a JSON dump of the findings

use chrono::NaiveDate;
use migralog_core::{
    month_name, ChartArtifact, Dimension, DocumentRenderer, ReportFindings, ThresholdRule,
    WeatherField, WeatherFinding,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::{info, instrument};

use crate::{ArtifactDir, SinkResult};

/// Forces a new page when the Markdown is printed or converted to PDF
pub const PAGE_BREAK: &str = "<div style=\"page-break-after: always\"></div>";

pub const REPORT_FILE: &str = "report.md";
pub const FINDINGS_FILE: &str = "findings.json";

const DATE_FORMAT: &str = "%m/%d/%Y";

fn unit(field: WeatherField) -> &'static str {
    match field {
        WeatherField::Tavg | WeatherField::Tmin | WeatherField::Tmax => "°C",
        WeatherField::Prcp | WeatherField::Snow => "mm",
        WeatherField::Wspd | WeatherField::Wpgt => "km/h",
        WeatherField::Pres => "hPa",
        WeatherField::Wdir => "°",
        WeatherField::Tsun => "min",
    }
}

fn heading(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Months => "Months",
        Dimension::Temperature => "Temperature",
        Dimension::Precipitation => "Precipitation",
        Dimension::WindSpeed => "Wind speed",
        Dimension::Pressure => "Barometric pressure",
    }
}

fn format_p(p: f64) -> String {
    if p < 1e-4 {
        "p < 0.0001".to_string()
    } else {
        format!("p = {p:.4}")
    }
}

/// Plain-language summary of one weather finding
pub fn weather_paragraph(finding: &WeatherFinding) -> String {
    let label = finding.field.label();
    let unit = unit(finding.field);
    let threshold = finding.threshold;

    if !finding.test.significant {
        return format!(
            "The data does not show an effect of {label} on your migraines ({}).",
            format_p(finding.test.p_value)
        );
    }

    let mut text = format!(
        "Based on the data, {label} has an effect on your migraines ({}).",
        format_p(finding.test.p_value)
    );

    let (condition, contrast) = match finding.rule {
        ThresholdRule::Median => (
            format!("{label} above {threshold:.1} {unit}"),
            "at or below it",
        ),
        ThresholdRule::DayOverDayDelta { .. } => (
            format!("{label} changing by more than {threshold:.1} {unit} from the previous day"),
            "with a smaller change",
        ),
    };

    match finding.test.odds_ratio {
        Some(ratio) => {
            let change = (ratio - 1.0) * 100.0;
            let direction = if change >= 0.0 { "higher" } else { "lower" };
            text.push_str(&format!(
                " The odds of a migraine on a day with {condition} are {:.2}% {direction} than on a day {contrast}.",
                change.abs()
            ));
        }
        None => text.push_str(
            " The odds ratio is undefined because one of the compared groups has no days.",
        ),
    }

    if let Some(fraction) = finding.effect_fraction {
        text.push_str(&format!(
            " {:.2}% of your migraines fell on days with {condition}.",
            fraction * 100.0
        ));
    }

    if finding.test.low_confidence {
        text.push_str(" Some groups are small, so treat this result with caution.");
    }
    text
}

fn chart_link(chart: &ChartArtifact) -> String {
    let target = chart
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| chart.path.display().to_string());
    format!("![{}]({})", chart.title, target)
}

/// Only the weekday chart carries an average line
fn is_weekday_chart(chart: &ChartArtifact) -> bool {
    chart
        .path
        .file_stem()
        .is_some_and(|s| s == "most_common_day")
}

/// Lay out the full report
pub fn render_markdown(
    findings: &ReportFindings,
    charts: &[ChartArtifact],
    generated_on: NaiveDate,
) -> SinkResult<String> {
    let mut md = String::new();
    let summary = &findings.summary;

    // Cover page
    writeln!(md, "# Migraine Report for {}", findings.patient_name)?;
    writeln!(md)?;
    writeln!(md, "Generated on: {}  ", generated_on.format(DATE_FORMAT))?;
    writeln!(md, "Total headache count: {}  ", summary.total_events)?;
    writeln!(md, "Start date: {}  ", findings.window.start().format(DATE_FORMAT))?;
    writeln!(md, "End date: {}", findings.window.end().format(DATE_FORMAT))?;
    writeln!(md)?;
    writeln!(md, "## Purpose of this report")?;
    writeln!(md)?;
    writeln!(
        md,
        "This report helps you and your doctor understand when your migraines happen and which \
         factors go along with them. It shows how your migraines are spread over time and tests \
         whether certain months or weather conditions come with more migraines than you would \
         expect by chance."
    )?;
    writeln!(md)?;
    writeln!(md, "| Measure | Value |")?;
    writeln!(md, "| --- | --- |")?;
    writeln!(md, "| Average migraines per month | {:.2} |", summary.mean_per_month)?;
    writeln!(md, "| Median migraines per month | {:.1} |", summary.median_per_month)?;
    writeln!(md, "| Average migraines per year | {:.2} |", summary.mean_per_year)?;
    writeln!(md, "| Months observed | {} |", summary.months_observed)?;
    writeln!(md, "| Most recent full year | {} |", summary.most_recent_full_year)?;
    writeln!(md)?;
    writeln!(md, "{PAGE_BREAK}")?;
    writeln!(md)?;

    // Charts, two per page
    writeln!(md, "## Your Migraines Over Time")?;
    writeln!(md)?;
    if charts.is_empty() {
        writeln!(md, "No charts were produced for this report.")?;
        writeln!(md)?;
    }
    for (i, chart) in charts.iter().enumerate() {
        if i > 0 && i % 2 == 0 {
            writeln!(md, "{PAGE_BREAK}")?;
            writeln!(md)?;
            writeln!(md, "## Your Migraines Over Time, Continued")?;
            writeln!(md)?;
        }
        writeln!(md, "{}", chart_link(chart))?;
        writeln!(md)?;
        if is_weekday_chart(chart) {
            writeln!(
                md,
                "The red line is the average number of migraines per day of the week."
            )?;
            writeln!(md)?;
        }
    }
    writeln!(md, "{PAGE_BREAK}")?;
    writeln!(md)?;

    // Findings
    writeln!(md, "## Migraine Statistics")?;
    writeln!(md)?;
    writeln!(md, "### {}", heading(Dimension::Months))?;
    writeln!(md)?;
    let baseline = findings
        .months
        .first()
        .map(|m| month_name(m.baseline_month))
        .unwrap_or("the baseline month");
    let significant: Vec<_> = findings.significant_months().collect();
    if significant.is_empty() {
        writeln!(
            md,
            "No month has a significantly higher number of migraines than {baseline}."
        )?;
    } else {
        writeln!(
            md,
            "Compared with {baseline}, these months more often had an above-average number of \
             migraines:"
        )?;
        writeln!(md)?;
        for month in significant {
            writeln!(md, "- {} ({})", month.name, format_p(month.test.p_value))?;
        }
        writeln!(md)?;
        writeln!(
            md,
            "Look for triggers during these months, such as seasonal changes, stress or routine \
             changes."
        )?;
    }
    writeln!(md)?;

    for finding in &findings.weather {
        writeln!(md, "### {}", heading(finding.dimension))?;
        writeln!(md)?;
        writeln!(md, "{}", weather_paragraph(finding))?;
        writeln!(md)?;
    }

    if !findings.omitted.is_empty() {
        writeln!(md, "### Not analysed")?;
        writeln!(md)?;
        for omitted in &findings.omitted {
            writeln!(md, "- {}: {}", heading(omitted.dimension), omitted.reason)?;
        }
        writeln!(md)?;
    }
    writeln!(md, "{PAGE_BREAK}")?;
    writeln!(md)?;

    // Appendix
    writeln!(md, "## Appendix: Statistical Methods")?;
    writeln!(md)?;
    writeln!(
        md,
        "Months: for every year, a month counts as above average when its migraine count reaches \
         the average monthly count of that year. Each month is compared with {baseline} using a \
         one-sided exact test on the resulting 2x2 table."
    )?;
    writeln!(md)?;
    writeln!(
        md,
        "Weather: each day is labelled above or below a threshold and cross-tabulated against \
         whether a migraine happened that day. The tables are tested with a chi-square test; the \
         odds ratio compares the odds of a migraine above and below the threshold."
    )?;
    writeln!(md)?;
    writeln!(
        md,
        "| Month | Baseline above | Baseline below | Month above | Month below | p-value |"
    )?;
    writeln!(md, "| --- | --- | --- | --- | --- | --- |")?;
    for month in &findings.months {
        let t = &month.table;
        writeln!(
            md,
            "| {} | {} | {} | {} | {} | {:.4} |",
            month.name,
            t.a(),
            t.b(),
            t.c(),
            t.d(),
            month.test.p_value
        )?;
    }

    Ok(md)
}

#[derive(Serialize)]
struct FindingsDocument<'a> {
    generated_on: NaiveDate,
    findings: &'a ReportFindings,
    charts: &'a [ChartArtifact],
}

/// Writes `report.md` and `findings.json` into the artifact directory
#[derive(Debug, Clone)]
pub struct MarkdownReportRenderer {
    dir: ArtifactDir,
    generated_on: NaiveDate,
}

impl MarkdownReportRenderer {
    pub fn new(dir: ArtifactDir, generated_on: NaiveDate) -> Self {
        Self { dir, generated_on }
    }
}

impl DocumentRenderer for MarkdownReportRenderer {
    #[instrument(skip_all, fields(dir = %self.dir.path().display()))]
    fn render(
        &mut self,
        findings: &ReportFindings,
        charts: &[ChartArtifact],
    ) -> anyhow::Result<PathBuf> {
        let document = FindingsDocument {
            generated_on: self.generated_on,
            findings,
            charts,
        };
        self.dir
            .write(FINDINGS_FILE, &serde_json::to_vec_pretty(&document)?)?;

        let markdown = render_markdown(findings, charts, self.generated_on)?;
        let path = self.dir.write(REPORT_FILE, markdown.as_bytes())?;
        info!(path = %path.display(), charts = charts.len(), "report written");
        Ok(path)
    }
}
