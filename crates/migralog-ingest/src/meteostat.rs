//! Meteostat JSON API client

use chrono::{Duration as DateSpan, NaiveDate};
use migralog_core::{AnalysisWindow, DailyObservation, Location, WeatherProvider};
use reqwest::Client;
use serde::Deserialize;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::{IngestError, IngestResult};

/// Longest range the daily point endpoint serves in one request
const MAX_DAYS_PER_REQUEST: i64 = 370;
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(default)]
    data: Vec<DailyObservation>,
}

/// Parse a `point/daily` response body
pub fn parse_daily_response(body: &str) -> IngestResult<Vec<DailyObservation>> {
    let response: DailyResponse =
        serde_json::from_str(body).map_err(|e| IngestError::InvalidResponse(e.to_string()))?;
    Ok(response.data)
}

/// Split a window into consecutive request ranges
pub fn request_ranges(window: &AnalysisWindow) -> Vec<(NaiveDate, NaiveDate)> {
    let mut ranges = Vec::new();
    let mut start = window.start();
    while start <= window.end() {
        let end = (start + DateSpan::days(MAX_DAYS_PER_REQUEST - 1)).min(window.end());
        ranges.push((start, end));
        start = end + DateSpan::days(1);
    }
    ranges
}

pub struct MeteostatProvider {
    client: Client,
    base_url: String,
    api_key: String,
    request_timeout: Duration,
    retries: u32,
}

impl MeteostatProvider {
    pub fn new(base_url: String, api_key: String) -> IngestResult<Self> {
        if base_url.is_empty() || api_key.is_empty() {
            return Err(IngestError::CommunicationError(
                "invalid meteostat configuration".into(),
            ));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| IngestError::CommunicationError(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            api_key,
            request_timeout: Duration::from_secs(30),
            retries: 2,
        })
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    fn daily_url(
        &self,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> IngestResult<Url> {
        let mut params = vec![
            ("lat", location.latitude.to_string()),
            ("lon", location.longitude.to_string()),
            ("start", start.format("%Y-%m-%d").to_string()),
            ("end", end.format("%Y-%m-%d").to_string()),
        ];
        if let Some(alt) = location.elevation {
            params.push(("alt", format!("{alt:.0}")));
        }
        let base = format!("{}/point/daily", self.base_url.trim_end_matches('/'));
        Url::parse_with_params(&base, &params)
            .map_err(|e| IngestError::CommunicationError(e.to_string()))
    }

    async fn fetch_range(&self, url: Url) -> IngestResult<Vec<DailyObservation>> {
        let resp = self
            .client
            .get(url)
            .header("x-rapidapi-key", &self.api_key)
            .send()
            .await
            .map_err(|e| IngestError::CommunicationError(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(IngestError::CommunicationError(format!(
                "meteostat request failed: {} {}",
                status, text
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| IngestError::CommunicationError(e.to_string()))?;
        parse_daily_response(&body)
    }

    /// One range with a per-attempt timeout and bounded retries
    async fn fetch_with_retry(&self, url: Url) -> IngestResult<Vec<DailyObservation>> {
        let mut last_error = IngestError::Timeout;
        for attempt in 0..=self.retries {
            if attempt > 0 {
                sleep(RETRY_BACKOFF * attempt).await;
            }
            match timeout(self.request_timeout, self.fetch_range(url.clone())).await {
                Ok(Ok(rows)) => return Ok(rows),
                Ok(Err(e)) => {
                    warn!(attempt, error = %e, "meteostat request failed");
                    last_error = e;
                }
                Err(_) => {
                    warn!(attempt, "meteostat request timed out");
                    last_error = IngestError::Timeout;
                }
            }
        }
        Err(last_error)
    }
}

#[async_trait::async_trait]
impl WeatherProvider for MeteostatProvider {
    #[instrument(skip(self))]
    async fn daily(
        &self,
        location: &Location,
        window: &AnalysisWindow,
    ) -> anyhow::Result<Vec<DailyObservation>> {
        let mut rows = Vec::new();
        for (start, end) in request_ranges(window) {
            let url = self.daily_url(location, start, end)?;
            debug!(%start, %end, "requesting daily weather");
            rows.extend(self.fetch_with_retry(url).await?);
        }

        rows.retain(|o| window.contains(o.date));
        rows.sort_by_key(|o| o.date);
        info!(rows = rows.len(), "fetched weather from meteostat");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_daily_response() {
        let body = r#"{
            "meta": {"generated": "2024-01-01 00:00:00"},
            "data": [
                {"date": "2020-01-01", "tavg": 3.5, "prcp": 0.0, "pres": 1018.2, "snow": null},
                {"date": "2020-01-02", "tavg": null, "wspd": 12.1}
            ]
        }"#;
        let rows = parse_daily_response(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].pres, Some(1018.2));
        assert_eq!(rows[1].tavg, None);
        assert_eq!(rows[1].wspd, Some(12.1));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_daily_response("<html>"),
            Err(IngestError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_request_ranges_split_long_windows() {
        let window = AnalysisWindow::new(date(2020, 1, 1), date(2021, 12, 31)).unwrap();
        let ranges = request_ranges(&window);

        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0], (date(2020, 1, 1), date(2021, 1, 4)));
        assert_eq!(ranges[1], (date(2021, 1, 5), date(2021, 12, 31)));
    }

    #[test]
    fn test_daily_url() {
        let provider =
            MeteostatProvider::new("https://example.test/".into(), "key".into()).unwrap();
        let location = Location {
            latitude: 35.5,
            longitude: -80.25,
            elevation: Some(70.0),
        };
        let url = provider
            .daily_url(&location, date(2020, 1, 1), date(2020, 1, 31))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/point/daily?lat=35.5&lon=-80.25&start=2020-01-01&end=2020-01-31&alt=70"
        );
    }

    #[test]
    fn test_rejects_empty_key() {
        assert!(MeteostatProvider::new("https://example.test".into(), String::new()).is_err());
    }
}
