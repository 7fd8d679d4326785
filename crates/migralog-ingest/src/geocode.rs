//! Postal code to coordinate lookup

use migralog_core::{Geocoder, Location};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use crate::{IngestError, IngestResult};

const COUNTRY_COL: usize = 0;
const POSTAL_CODE_COL: usize = 1;
const LATITUDE_COL: usize = 9;
const LONGITUDE_COL: usize = 10;

/// Fixed table of postal codes, typically from the config file
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    entries: HashMap<String, Location>,
}

impl StaticGeocoder {
    pub fn new(entries: HashMap<String, Location>) -> Self {
        Self { entries }
    }

    /// Every postal code resolves to the same place
    pub fn fixed(location: Location) -> FixedGeocoder {
        FixedGeocoder(location)
    }

    pub fn lookup(&self, postal_code: &str) -> IngestResult<Location> {
        self.entries
            .get(postal_code.trim())
            .copied()
            .ok_or_else(|| IngestError::UnknownPostalCode(postal_code.to_string()))
    }
}

#[async_trait::async_trait]
impl Geocoder for StaticGeocoder {
    async fn locate(&self, postal_code: &str) -> anyhow::Result<Location> {
        Ok(self.lookup(postal_code)?)
    }
}

#[derive(Debug, Clone)]
pub struct FixedGeocoder(Location);

#[async_trait::async_trait]
impl Geocoder for FixedGeocoder {
    async fn locate(&self, _postal_code: &str) -> anyhow::Result<Location> {
        Ok(self.0)
    }
}

/// Scan a GeoNames postal code dump (tab separated, no header) for the
/// first row matching `postal_code` and, when given, `country`.
pub fn find_in_gazetteer<R: Read>(
    reader: R,
    postal_code: &str,
    country: Option<&str>,
) -> IngestResult<Location> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let wanted = postal_code.trim();
    for record in rdr.records() {
        let record = record?;
        if record.get(POSTAL_CODE_COL).map(str::trim) != Some(wanted) {
            continue;
        }
        if let Some(country) = country {
            let row_country = record.get(COUNTRY_COL).unwrap_or_default();
            if !row_country.eq_ignore_ascii_case(country) {
                continue;
            }
        }

        let latitude = coordinate(&record, LATITUDE_COL)?;
        let longitude = coordinate(&record, LONGITUDE_COL)?;
        return Ok(Location {
            latitude,
            longitude,
            elevation: None,
        });
    }

    Err(IngestError::UnknownPostalCode(postal_code.to_string()))
}

fn coordinate(record: &csv::StringRecord, col: usize) -> IngestResult<f64> {
    let raw = record.get(col).unwrap_or_default().trim();
    raw.parse::<f64>()
        .map_err(|_| IngestError::InvalidResponse(format!("bad coordinate {raw:?} in gazetteer")))
}

/// Geocoder reading a GeoNames gazetteer file on each lookup
#[derive(Debug, Clone)]
pub struct GazetteerGeocoder {
    path: PathBuf,
    country: Option<String>,
}

impl GazetteerGeocoder {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            country: None,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }
}

#[async_trait::async_trait]
impl Geocoder for GazetteerGeocoder {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn locate(&self, postal_code: &str) -> anyhow::Result<Location> {
        let bytes = tokio::fs::read(&self.path).await?;
        let location = find_in_gazetteer(bytes.as_slice(), postal_code, self.country.as_deref())?;
        debug!(
            latitude = location.latitude,
            longitude = location.longitude,
            "resolved postal code"
        );
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAZETTEER: &str = "\
US\t28105\tMatthews\tNorth Carolina\tNC\tMecklenburg\t119\t\t\t35.1168\t-80.7080\t4
DE\t28105\tSomewhere\tBremen\tHB\t\t\t\t\t53.0793\t8.8017\t4
US\t10001\tNew York\tNew York\tNY\tNew York\t061\t\t\t40.7484\t-73.9967\t4
US\t99999\tBroken\t\t\t\t\t\t\tnorth\t-1.0\t1
";

    fn here() -> Location {
        Location {
            latitude: 1.0,
            longitude: 2.0,
            elevation: Some(3.0),
        }
    }

    #[test]
    fn test_gazetteer_lookup() {
        let loc = find_in_gazetteer(GAZETTEER.as_bytes(), "10001", None).unwrap();
        assert_eq!(loc.latitude, 40.7484);
        assert_eq!(loc.longitude, -73.9967);
    }

    #[test]
    fn test_gazetteer_country_filter() {
        let us = find_in_gazetteer(GAZETTEER.as_bytes(), "28105", Some("us")).unwrap();
        assert_eq!(us.latitude, 35.1168);

        let de = find_in_gazetteer(GAZETTEER.as_bytes(), "28105", Some("DE")).unwrap();
        assert_eq!(de.longitude, 8.8017);
    }

    #[test]
    fn test_gazetteer_unknown_and_malformed() {
        assert!(matches!(
            find_in_gazetteer(GAZETTEER.as_bytes(), "00000", None),
            Err(IngestError::UnknownPostalCode(_))
        ));
        assert!(matches!(
            find_in_gazetteer(GAZETTEER.as_bytes(), "99999", None),
            Err(IngestError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_static_geocoder() {
        let mut entries = HashMap::new();
        entries.insert("28105".to_string(), here());
        let geocoder = StaticGeocoder::new(entries);

        assert_eq!(geocoder.locate(" 28105 ").await.unwrap(), here());
        assert!(geocoder.locate("10001").await.is_err());
    }

    #[tokio::test]
    async fn test_fixed_geocoder_ignores_code() {
        let geocoder = StaticGeocoder::fixed(here());
        assert_eq!(geocoder.locate("anything").await.unwrap(), here());
    }

    #[tokio::test]
    async fn test_gazetteer_geocoder_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("US.txt");
        std::fs::write(&path, GAZETTEER).unwrap();

        let geocoder = GazetteerGeocoder::new(&path).with_country("US");
        let loc = geocoder.locate("28105").await.unwrap();
        assert_eq!(loc.latitude, 35.1168);
    }
}
