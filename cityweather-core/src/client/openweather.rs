use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt, time::Duration};
use tracing::{debug, instrument, warn};

use crate::{
    error::FetchError,
    model::{Condition, Coordinates, Sun, Temperature, UnitSystem, WeatherRecord, Wind},
};

use super::{WeatherClient, validate_city};

/// Client for the OpenWeather "current weather by city name" endpoint.
#[derive(Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/weather", self.base_url)
    }
}

impl fmt::Debug for OpenWeatherClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenWeatherClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    #[instrument(skip(self))]
    async fn fetch(&self, city_name: &str, units: UnitSystem) -> Result<WeatherRecord, FetchError> {
        let city = validate_city(city_name)?;

        debug!(city, "Requesting current weather");

        let res = self
            .http
            .get(self.endpoint())
            .query(&[("q", city), ("units", units.as_str()), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(transport_error)?;

        let status = res.status();

        if !status.is_success() {
            // The status is the failure; an unreadable body only loses the message.
            let message = res.text().await.ok().as_deref().and_then(provider_message);
            warn!(status = status.as_u16(), message = ?message, "OpenWeather request failed");
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        let body = res.text().await.map_err(transport_error)?;
        let record = decode_current(&body)?;
        debug!(location = %record.location_name, "Decoded current weather");
        Ok(record)
    }
}

/// Decode a 2xx body into a record. Any missing or mistyped field fails the whole decode.
pub fn decode_current(body: &str) -> Result<WeatherRecord, FetchError> {
    let parsed: OwCurrentResponse = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, body = %truncate_body(body), "Failed to parse OpenWeather current JSON");
        FetchError::Decode(e.to_string())
    })?;

    WeatherRecord::try_from(parsed)
}

fn transport_error(err: reqwest::Error) -> FetchError {
    // The request URL carries the API key in its query string.
    let err = err.without_url();
    warn!(error = %err, timeout = err.is_timeout(), "OpenWeather transport failure");
    FetchError::Transport {
        timed_out: err.is_timeout(),
        message: err.to_string(),
    }
}

fn provider_message(body: &str) -> Option<String> {
    serde_json::from_str::<OwErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lon: f64,
    lat: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: u32,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: u16,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    coord: OwCoord,
    weather: Vec<OwWeather>,
    main: OwMain,
    wind: OwWind,
    sys: OwSys,
    name: String,
}

impl TryFrom<OwCurrentResponse> for WeatherRecord {
    type Error = FetchError;

    fn try_from(parsed: OwCurrentResponse) -> Result<Self, Self::Error> {
        if parsed.weather.is_empty() {
            return Err(FetchError::Decode(
                "OpenWeather response contained no weather conditions".to_string(),
            ));
        }

        Ok(WeatherRecord {
            location_name: parsed.name,
            coordinates: Coordinates {
                longitude: parsed.coord.lon,
                latitude: parsed.coord.lat,
            },
            conditions: parsed
                .weather
                .into_iter()
                .map(|w| Condition {
                    description: w.description,
                    icon_id: w.icon,
                })
                .collect(),
            temperature: Temperature {
                current: parsed.main.temp,
                feels_like: parsed.main.feels_like,
                min: parsed.main.temp_min,
                max: parsed.main.temp_max,
                pressure_hpa: parsed.main.pressure,
                humidity_pct: parsed.main.humidity,
            },
            wind: Wind {
                speed: parsed.wind.speed,
                direction_deg: parsed.wind.deg,
            },
            sun: Sun {
                country_code: parsed.sys.country,
                sunrise_epoch_s: parsed.sys.sunrise,
                sunset_epoch_s: parsed.sys.sunset,
            },
        })
    }
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
