//! Daily weather from a Meteostat-style CSV export

use migralog_core::{AnalysisWindow, DailyObservation, Location, WeatherProvider};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::IngestResult;

/// Read daily rows with a `date` (or `time`) column plus any of the
/// Meteostat value columns. Empty cells are missing values. Rows outside
/// the window are dropped and the rest are returned in date order.
pub fn read_daily_csv<R: Read>(
    reader: R,
    window: &AnalysisWindow,
) -> IngestResult<Vec<DailyObservation>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut rows = Vec::new();
    let mut outside = 0usize;
    for record in rdr.deserialize::<DailyObservation>() {
        let obs = record?;
        if window.contains(obs.date) {
            rows.push(obs);
        } else {
            outside += 1;
        }
    }

    rows.sort_by_key(|o| o.date);
    debug!(rows = rows.len(), outside, "read daily weather rows");
    Ok(rows)
}

/// Weather provider backed by a CSV file already downloaded for the
/// analysis location
#[derive(Debug, Clone)]
pub struct CsvWeatherProvider {
    path: PathBuf,
}

impl CsvWeatherProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl WeatherProvider for CsvWeatherProvider {
    #[instrument(skip(self, _location), fields(path = %self.path.display()))]
    async fn daily(
        &self,
        _location: &Location,
        window: &AnalysisWindow,
    ) -> anyhow::Result<Vec<DailyObservation>> {
        let bytes = tokio::fs::read(&self.path).await?;
        let rows = read_daily_csv(bytes.as_slice(), window)?;
        info!(rows = rows.len(), "loaded weather from CSV");
        Ok(rows)
    }
}
