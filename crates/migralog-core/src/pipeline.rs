//! Collaborator seams around the statistical core

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::{AnalysisWindow, DailyObservation, Location, ParsedLog, ReportFindings};

/// Turns a vendor log export into events
pub trait LogParser: Send + Sync {
    fn parse(&self, input: &str) -> Result<ParsedLog>;
}

#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    async fn locate(&self, postal_code: &str) -> Result<Location>;
}

/// Supplies one observation per calendar day of the window
#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn daily(
        &self,
        location: &Location,
        window: &AnalysisWindow,
    ) -> Result<Vec<DailyObservation>>;
}

/// A bar chart ready to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    /// File stem for the rendered artifact
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<(String, f64)>,
    /// Horizontal reference line, e.g. the average
    pub overlay: Option<f64>,
}

/// A rendered chart on disk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartArtifact {
    pub title: String,
    pub path: PathBuf,
}

pub trait ChartRenderer {
    fn render(&mut self, chart: &Chart) -> Result<ChartArtifact>;
}

pub trait DocumentRenderer {
    fn render(&mut self, findings: &ReportFindings, charts: &[ChartArtifact]) -> Result<PathBuf>;
}
