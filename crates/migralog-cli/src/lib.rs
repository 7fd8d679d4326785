//! Wiring for the `migralog` binary

pub mod cli;

pub use cli::{Cli, Commands, ReportArgs};

use anyhow::{bail, Context, Result};
use migralog_config::AppConfig;
use migralog_core::{
    count_by_month, count_by_weekday, count_by_year, summary_stats, weekday_name, AnalysisWindow,
    ChartRenderer, DailyObservation, DocumentRenderer, EventStore, Geocoder, Location, LogParser,
    ReportDataAssembler, WeatherProvider,
};
use migralog_ingest::{CsvWeatherProvider, GazetteerGeocoder, IHeadacheParser, StaticGeocoder};
use migralog_sinks::{ArtifactDir, MarkdownReportRenderer, SvgChartRenderer};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Read and parse a log export into an event store
pub async fn load_log(path: &Path) -> Result<EventStore> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read log {}", path.display()))?;
    let parsed = IHeadacheParser::new()
        .parse(&text)
        .with_context(|| format!("failed to parse log {}", path.display()))?;
    Ok(EventStore::from(parsed))
}

/// Geocoders to try in order: the config's postal code table, then the
/// gazetteer file
pub fn geocoders(cfg: &AppConfig) -> Vec<Box<dyn Geocoder>> {
    let mut chain: Vec<Box<dyn Geocoder>> = Vec::new();
    if let Some(loc) = &cfg.location {
        if !loc.postal_codes.is_empty() {
            chain.push(Box::new(StaticGeocoder::new(loc.postal_codes.clone())));
        }
        if let Some(path) = &loc.gazetteer {
            let gazetteer = GazetteerGeocoder::new(path);
            chain.push(match &loc.country {
                Some(country) => Box::new(gazetteer.with_country(country.clone())),
                None => Box::new(gazetteer),
            });
        }
    }
    chain
}

/// Coordinates pinned in the config win; otherwise the postal code is
/// resolved through [`geocoders`]
pub async fn resolve_location(cfg: &AppConfig, postal_code: Option<&str>) -> Result<Location> {
    if let Some(location) = cfg.fixed_location() {
        debug!("using coordinates from config");
        return Ok(location);
    }

    let Some(code) = postal_code.or(cfg.postal_code()) else {
        bail!("no postal code or coordinates configured");
    };

    let chain = geocoders(cfg);
    if chain.is_empty() {
        bail!("no geocoder configured for postal code {code}");
    }
    for geocoder in &chain {
        match geocoder.locate(code).await {
            Ok(location) => return Ok(location),
            Err(e) => debug!(error = %e, "geocoder could not resolve postal code"),
        }
    }
    bail!("could not resolve postal code {code}")
}

/// Pick the weather source: an explicit CSV, the configured CSV, then the
/// Meteostat API when a key is available
pub fn weather_provider(
    cfg: &AppConfig,
    args: &ReportArgs,
) -> Result<Option<Box<dyn WeatherProvider>>> {
    if let Some(path) = args.weather_csv.as_deref().or(cfg.weather_csv()) {
        return Ok(Some(Box::new(CsvWeatherProvider::new(path))));
    }
    meteostat_provider(cfg, args)
}

#[cfg(feature = "meteostat")]
fn meteostat_provider(
    cfg: &AppConfig,
    args: &ReportArgs,
) -> Result<Option<Box<dyn WeatherProvider>>> {
    let settings = cfg.meteostat().cloned().unwrap_or_default();
    let Some(key) = args.meteostat_key.clone().or(settings.api_key.clone()) else {
        return Ok(None);
    };
    let provider = migralog_ingest::MeteostatProvider::new(settings.base_url().to_string(), key)?
        .with_timeout(settings.timeout())
        .with_retries(settings.retries());
    Ok(Some(Box::new(provider)))
}

#[cfg(not(feature = "meteostat"))]
fn meteostat_provider(
    _cfg: &AppConfig,
    _args: &ReportArgs,
) -> Result<Option<Box<dyn WeatherProvider>>> {
    Ok(None)
}

/// Daily weather for the window. Any failure leaves the weather
/// dimensions out of the report instead of aborting it.
pub async fn load_weather(
    cfg: &AppConfig,
    args: &ReportArgs,
    window: &AnalysisWindow,
) -> Vec<DailyObservation> {
    let provider = match weather_provider(cfg, args) {
        Ok(Some(provider)) => provider,
        Ok(None) => {
            warn!("no weather source configured, skipping weather analysis");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "weather source unavailable, skipping weather analysis");
            return Vec::new();
        }
    };

    let location = match resolve_location(cfg, args.postal_code.as_deref()).await {
        Ok(location) => location,
        Err(e) => {
            warn!(error = %e, "location unknown, skipping weather analysis");
            return Vec::new();
        }
    };

    match provider.daily(&location, window).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "failed to load weather, skipping weather analysis");
            Vec::new()
        }
    }
}

/// Run the whole pipeline and return the path of the rendered report
#[instrument(skip_all, fields(log = %args.log.display()))]
pub async fn run_report(cfg: &AppConfig, args: &ReportArgs) -> Result<PathBuf> {
    let store = load_log(&args.log).await?;
    info!(events = store.count(), "log loaded");

    let observations = load_weather(cfg, args, &store.window()).await;
    let assembler = ReportDataAssembler::new(cfg.analysis.clone())?;
    let findings = assembler.assemble(&store, &observations);

    let out_dir = args.output.clone().unwrap_or_else(|| cfg.output_dir());
    let dir = ArtifactDir::new(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut charts = SvgChartRenderer::new(dir.clone());
    let artifacts = ReportDataAssembler::chart_data(&store)
        .charts()
        .iter()
        .map(|chart| charts.render(chart))
        .collect::<Result<Vec<_>>>()?;

    let generated_on = chrono::Local::now().date_naive();
    let mut document = MarkdownReportRenderer::new(dir, generated_on);
    document.render(&findings, &artifacts)
}

/// Plain-text aggregate counts for `migralog summary`
pub fn summary_text(store: &EventStore) -> Result<String> {
    let window = store.window();
    let counts = count_by_month(store);
    let stats = summary_stats(store, &counts);

    let mut out = String::new();
    if !store.patient_name().is_empty() {
        writeln!(out, "Patient: {}", store.patient_name())?;
    }
    writeln!(out, "Window: {} to {}", window.start(), window.end())?;
    writeln!(out, "Total events: {}", stats.total_events)?;
    writeln!(out, "Mean per month: {:.2}", stats.mean_per_month)?;
    writeln!(out, "Median per month: {:.1}", stats.median_per_month)?;
    writeln!(out, "Mean per year: {:.2}", stats.mean_per_year)?;
    writeln!(out)?;
    writeln!(out, "Events per year:")?;
    for (year, count) in count_by_year(store) {
        writeln!(out, "  {year}: {count}")?;
    }
    writeln!(out)?;
    writeln!(out, "Events per weekday:")?;
    let weekdays = count_by_weekday(store);
    for (i, count) in weekdays.counts.iter().enumerate() {
        writeln!(out, "  {}: {count}", weekday_name(i))?;
    }
    Ok(out)
}

pub async fn run_summary(log: &Path) -> Result<String> {
    let store = load_log(log).await?;
    summary_text(&store)
}
