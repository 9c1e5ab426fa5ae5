use async_trait::async_trait;
use std::fmt::Debug;

use crate::{Config, FetchError, UnitSystem, WeatherRecord};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Fetches the current weather for a city.
///
/// Implementations perform at most one outbound request per call and never retry.
#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    async fn fetch(&self, city_name: &str, units: UnitSystem) -> Result<WeatherRecord, FetchError>;
}

/// Trim `city_name`, rejecting names that are empty after trimming.
pub fn validate_city(city_name: &str) -> Result<&str, FetchError> {
    let trimmed = city_name.trim();
    if trimmed.is_empty() {
        return Err(FetchError::Validation("city name is empty".to_string()));
    }
    Ok(trimmed)
}

/// Construct the OpenWeather client from config.
pub fn client_from_config(config: &Config) -> anyhow::Result<OpenWeatherClient> {
    config.validate()?;
    let api_key = config.api_key()?;
    OpenWeatherClient::new(api_key.to_owned(), config.base_url.clone(), config.timeout())
}
