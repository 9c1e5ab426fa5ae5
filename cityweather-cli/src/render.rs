use chrono::TimeZone;
use cityweather_core::{Status, UnitSystem, WeatherRecord, WeatherState};
use std::fmt::{Display, Write};

/// One labelled field of the weather screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub title: &'static str,
    pub value: String,
}

impl Card {
    fn new(title: &'static str, value: impl Into<String>) -> Self {
        Self { title, value: value.into() }
    }
}

/// Cards in screen order. Sun times are shown in `tz`.
pub fn cards<Tz>(record: &WeatherRecord, units: UnitSystem, tz: &Tz) -> Vec<Card>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let temp = units.temperature_suffix();
    let t = &record.temperature;

    let weather = match record.primary_condition() {
        Some(c) => format!("{} ({})", c.description, c.icon_url()),
        None => "unknown".to_string(),
    };

    vec![
        Card::new("City", record.location_name.as_str()),
        Card::new("Temperature", format!("{} {temp}", t.current)),
        Card::new("Feels Like", format!("{} {temp}", t.feels_like)),
        Card::new("Weather", weather),
        Card::new("Wind Speed", format!("{} {}", record.wind.speed, units.speed_suffix())),
        Card::new("Humidity", format!("{}%", t.humidity_pct)),
        Card::new("Pressure", format!("{} hPa", t.pressure_hpa)),
        Card::new("Sunrise", record.sun.sunrise_clock(tz).unwrap_or_else(|| "-".to_string())),
        Card::new("Sunset", record.sun.sunset_clock(tz).unwrap_or_else(|| "-".to_string())),
    ]
}

pub fn render_record<Tz>(record: &WeatherRecord, units: UnitSystem, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let cards = cards(record, units, tz);
    let width = cards.iter().map(|c| c.title.len()).max().unwrap_or(0);

    let mut out = String::new();
    for card in &cards {
        let _ = writeln!(out, "  {:<width$}  {}", card.title, card.value);
    }

    let temp = units.temperature_suffix();
    let _ = writeln!(
        out,
        "  (min {} {temp}, max {} {temp}, {}, lat {} lon {})",
        record.temperature.min,
        record.temperature.max,
        record.sun.country_code,
        record.coordinates.latitude,
        record.coordinates.longitude,
    );
    out
}

/// Error line (if any) followed by the cards of the last loaded record (if any).
pub fn render_state<Tz>(state: &WeatherState, units: UnitSystem, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();

    match state.status() {
        Status::Loading => out.push_str("Loading...\n"),
        Status::Failed => {
            if let Some(err) = state.last_error() {
                let _ = writeln!(out, "! {}", err.user_message());
            }
        }
        Status::Empty | Status::Loaded => {}
    }

    if let Some(record) = state.record() {
        out.push_str(&render_record(record, units, tz));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cityweather_core::{Condition, Coordinates, Sun, Temperature, Wind};

    fn london() -> WeatherRecord {
        WeatherRecord {
            location_name: "London".to_string(),
            coordinates: Coordinates {
                longitude: -0.1257,
                latitude: 51.5085,
            },
            conditions: vec![Condition {
                description: "clear sky".to_string(),
                icon_id: "01d".to_string(),
            }],
            temperature: Temperature {
                current: 15.3,
                feels_like: 14.62,
                min: 13.9,
                max: 16.71,
                pressure_hpa: 1012,
                humidity_pct: 72,
            },
            wind: Wind {
                speed: 3.1,
                direction_deg: 240,
            },
            sun: Sun {
                country_code: "GB".to_string(),
                sunrise_epoch_s: 1_700_000_000,
                sunset_epoch_s: 1_700_033_400,
            },
        }
    }

    fn value<'a>(cards: &'a [Card], title: &str) -> &'a str {
        cards
            .iter()
            .find(|c| c.title == title)
            .map(|c| c.value.as_str())
            .unwrap_or_else(|| panic!("missing card {title}"))
    }

    #[test]
    fn cards_follow_screen_order() {
        let titles: Vec<_> = cards(&london(), UnitSystem::Metric, &Utc)
            .into_iter()
            .map(|c| c.title)
            .collect();

        assert_eq!(
            titles,
            [
                "City", "Temperature", "Feels Like", "Weather", "Wind Speed", "Humidity",
                "Pressure", "Sunrise", "Sunset"
            ]
        );
    }

    #[test]
    fn metric_values() {
        let cards = cards(&london(), UnitSystem::Metric, &Utc);

        assert_eq!(value(&cards, "City"), "London");
        assert_eq!(value(&cards, "Temperature"), "15.3 °C");
        assert_eq!(value(&cards, "Feels Like"), "14.62 °C");
        assert_eq!(
            value(&cards, "Weather"),
            "clear sky (https://openweathermap.org/img/wn/01d@2x.png)"
        );
        assert_eq!(value(&cards, "Wind Speed"), "3.1 m/s");
        assert_eq!(value(&cards, "Humidity"), "72%");
        assert_eq!(value(&cards, "Pressure"), "1012 hPa");
        assert_eq!(value(&cards, "Sunrise"), "10:13 PM");
        assert_eq!(value(&cards, "Sunset"), "07:30 AM");
    }

    #[test]
    fn imperial_suffixes() {
        let cards = cards(&london(), UnitSystem::Imperial, &Utc);

        assert_eq!(value(&cards, "Temperature"), "15.3 °F");
        assert_eq!(value(&cards, "Wind Speed"), "3.1 mph");
    }

    #[test]
    fn empty_state_renders_nothing() {
        assert_eq!(render_state(&WeatherState::default(), UnitSystem::Metric, &Utc), "");
    }

    #[test]
    fn record_rendering_includes_extra_line() {
        let out = render_record(&london(), UnitSystem::Metric, &Utc);

        assert!(out.contains("City"));
        assert!(out.contains("London"));
        assert!(out.contains("min 13.9 °C, max 16.71 °C, GB"));
    }
}
