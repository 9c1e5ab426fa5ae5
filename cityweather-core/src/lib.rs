//! Core library for the `cityweather` app.
//!
//! This crate defines:
//! - The weather record decoded from OpenWeather's current-weather endpoint
//! - The client that fetches it by city name
//! - The controller that publishes the latest result to observers
//! - Configuration & credentials handling
//!
//! It is used by `cityweather-cli`, but any front end can drive the controller.

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;

pub use client::{OpenWeatherClient, WeatherClient, client_from_config};
pub use config::Config;
pub use controller::{Phase, ResponsePolicy, Status, WeatherController, WeatherState};
pub use error::{ErrorKind, FetchError};
pub use model::{Condition, Coordinates, Sun, Temperature, UnitSystem, WeatherRecord, Wind};
