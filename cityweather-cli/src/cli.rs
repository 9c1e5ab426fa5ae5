use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use cityweather_core::{Config, UnitSystem, WeatherController, client_from_config};
use inquire::{InquireError, Password, PasswordDisplayMode, Select, Text};
use std::{path::PathBuf, sync::Arc};
use tracing::debug;

use crate::render::{render_record, render_state};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Current weather by city name")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Defaults to `interactive`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and preferred unit system.
    Configure,

    /// Show current weather for one city and exit.
    Show {
        /// City name, e.g. "London" or "Paris,FR".
        city: String,

        /// Unit system: metric, imperial or standard.
        #[arg(long, value_parser = parse_units)]
        units: Option<UnitSystem>,
    },

    /// Prompt for city names until Esc or Ctrl-C.
    Interactive,
}

fn parse_units(value: &str) -> Result<UnitSystem, String> {
    UnitSystem::try_from(value).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command.unwrap_or(Command::Interactive) {
            Command::Configure => configure(self.config),
            Command::Show { city, units } => {
                let mut config = load_config(self.config.as_ref())?;
                if let Some(units) = units {
                    config.units = units;
                }
                show(&config, &city).await
            }
            Command::Interactive => {
                let config = load_config(self.config.as_ref())?;
                interactive(&config).await
            }
        }
    }
}

fn config_path(explicit: Option<&PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.clone()),
        None => Config::config_file_path(),
    }
}

fn load_config(explicit: Option<&PathBuf>) -> Result<Config> {
    let path = config_path(explicit)?;
    debug!(path = %path.display(), "Loading config");
    Config::load_from(&path)?.with_env_overrides()
}

fn controller(config: &Config) -> Result<WeatherController> {
    let client = client_from_config(config)?;
    Ok(WeatherController::from_config(Arc::new(client), config))
}

fn configure(explicit: Option<PathBuf>) -> Result<()> {
    let path = config_path(explicit.as_ref())?;
    // Env overrides stay out of the saved file.
    let mut config = Config::load_from(&path)?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key);
    config.api_key()?;

    let choices = UnitSystem::all().to_vec();
    let current = choices.iter().position(|u| *u == config.units).unwrap_or(0);
    config.units = Select::new("Unit system:", choices)
        .with_starting_cursor(current)
        .prompt()
        .context("Failed to read unit system")?;

    config.save_to(&path)?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

async fn show(config: &Config, city: &str) -> Result<()> {
    let controller = controller(config)?;

    match controller.refresh(city).await {
        Ok(record) => {
            print!("{}", render_record(&record, controller.units(), &Local));
            Ok(())
        }
        Err(err) => Err(anyhow::anyhow!("{}: {err}", err.user_message())),
    }
}

async fn interactive(config: &Config) -> Result<()> {
    let controller = controller(config)?;
    let mut states = controller.subscribe();

    loop {
        let prompt = tokio::task::spawn_blocking(|| {
            Text::new("City:").with_help_message("Esc to quit").prompt()
        })
        .await
        .context("Prompt task failed")?;

        let city = match prompt {
            Ok(city) => city,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e).context("Failed to read city name"),
        };

        let task = controller.trigger(city);
        let state = states
            .wait_for(|s| !s.is_loading())
            .await
            .context("Weather controller stopped")?
            .clone();

        task.await.context("Weather fetch task failed")?;

        print!("{}", render_state(&state, controller.units(), &Local));
    }

    Ok(())
}
