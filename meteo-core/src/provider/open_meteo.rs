use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::{
    Config,
    error::LookupError,
    model::{DayForecast, ForecastData, GeoResult},
};

use super::WeatherSource;

const USER_AGENT: &str = concat!("meteo/", env!("CARGO_PKG_VERSION"));
const DAILY_FIELDS: &str = "weathercode,temperature_2m_max,temperature_2m_min";

/// Timezone sent when the geocoding match carries none.
const FALLBACK_TIMEZONE: &str = "auto";

/// Open-Meteo geocoding + forecast endpoints. No API key required.
#[derive(Debug, Clone)]
pub struct OpenMeteo {
    http: Client,
    geocoding_url: String,
    forecast_url: String,
    forecast_days: Option<u8>,
}

impl OpenMeteo {
    pub fn new(config: &Config) -> Result<Self, LookupError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            geocoding_url: config.geocoding_url.clone(),
            forecast_url: config.forecast_url.clone(),
            forecast_days: config.forecast_days,
        })
    }

    /// Send `request` and return the body of a successful response, or
    /// [`LookupError::Cancelled`] as soon as `token` fires.
    async fn fetch_body(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
        token: &CancellationToken,
    ) -> Result<String, LookupError> {
        let exchange = async {
            let res = request.send().await?;

            let status = res.status();
            let body = res.text().await?;

            if !status.is_success() {
                return Err(LookupError::Status {
                    endpoint,
                    status,
                    body: truncate_body(&body),
                });
            }

            Ok::<_, LookupError>(body)
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!(endpoint, "request cancelled");
                Err(LookupError::Cancelled)
            }
            result = exchange => result,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OmPlace {
    name: String,
    latitude: f64,
    longitude: f64,
    timezone: Option<String>,
    country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmGeocodingResponse {
    /// Absent entirely when nothing matched.
    #[serde(default)]
    results: Vec<OmPlace>,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<NaiveDate>,
    #[serde(alias = "weather_code")]
    weathercode: Vec<i32>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    daily: Option<OmDaily>,
}

impl OmDaily {
    /// Zip the index-aligned series into daily records.
    fn into_forecast(self) -> Result<ForecastData, LookupError> {
        let len = self.time.len();
        if self.weathercode.len() != len
            || self.temperature_2m_max.len() != len
            || self.temperature_2m_min.len() != len
        {
            return Err(LookupError::Parse(format!(
                "daily series lengths differ: time={}, weathercode={}, max={}, min={}",
                len,
                self.weathercode.len(),
                self.temperature_2m_max.len(),
                self.temperature_2m_min.len(),
            )));
        }

        let days = self
            .time
            .into_iter()
            .zip(self.weathercode)
            .zip(self.temperature_2m_max.into_iter().zip(self.temperature_2m_min))
            .map(|((date, weather_code), (temp_max, temp_min))| DayForecast {
                date,
                weather_code,
                temp_max,
                temp_min,
            })
            .collect();

        Ok(days)
    }
}

#[async_trait]
impl WeatherSource for OpenMeteo {
    async fn geocode(
        &self,
        name: &str,
        token: &CancellationToken,
    ) -> Result<GeoResult, LookupError> {
        let request = self.http.get(&self.geocoding_url).query(&[("name", name)]);
        let body = self.fetch_body("geocoding", request, token).await?;

        let parsed: OmGeocodingResponse = serde_json::from_str(&body)?;
        tracing::debug!(query = name, matches = parsed.results.len(), "geocoding response");

        let first = parsed
            .results
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::NotFound(name.to_string()))?;

        Ok(GeoResult {
            latitude: first.latitude,
            longitude: first.longitude,
            timezone: first.timezone,
            place_name: first.name,
            country_code: first.country_code,
        })
    }

    async fn forecast(
        &self,
        place: &GeoResult,
        token: &CancellationToken,
    ) -> Result<ForecastData, LookupError> {
        let mut params = vec![
            ("latitude", place.latitude.to_string()),
            ("longitude", place.longitude.to_string()),
            (
                "timezone",
                place
                    .timezone
                    .clone()
                    .unwrap_or_else(|| FALLBACK_TIMEZONE.to_string()),
            ),
            ("daily", DAILY_FIELDS.to_string()),
        ];
        if let Some(days) = self.forecast_days {
            params.push(("forecast_days", days.to_string()));
        }

        let request = self.http.get(&self.forecast_url).query(&params);
        let body = self.fetch_body("forecast", request, token).await?;

        let parsed: OmForecastResponse = serde_json::from_str(&body)?;
        let daily = parsed
            .daily
            .ok_or_else(|| LookupError::Parse("forecast response has no daily block".into()))?;

        daily.into_forecast()
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
