use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Unit system requested from the provider; decides the units of every measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
            UnitSystem::Standard => "standard",
        }
    }

    pub const fn all() -> &'static [UnitSystem] {
        &[UnitSystem::Metric, UnitSystem::Imperial, UnitSystem::Standard]
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "°C",
            UnitSystem::Imperial => "°F",
            UnitSystem::Standard => "K",
        }
    }

    pub fn speed_suffix(&self) -> &'static str {
        match self {
            UnitSystem::Metric | UnitSystem::Standard => "m/s",
            UnitSystem::Imperial => "mph",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        match lower.as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            "standard" => Ok(UnitSystem::Standard),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported unit systems: metric, imperial, standard."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub description: String,
    pub icon_id: String,
}

impl Condition {
    /// URL of the provider's 2x glyph for this condition.
    pub fn icon_url(&self) -> String {
        format!("{ICON_BASE_URL}/{}@2x.png", self.icon_id)
    }
}

/// Temperatures are in the units of the unit system the record was fetched with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub current: f64,
    pub feels_like: f64,
    pub min: f64,
    pub max: f64,
    pub pressure_hpa: u32,
    pub humidity_pct: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// m/s for metric and standard, mph for imperial.
    pub speed: f64,
    pub direction_deg: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sun {
    pub country_code: String,
    pub sunrise_epoch_s: i64,
    pub sunset_epoch_s: i64,
}

impl Sun {
    pub fn sunrise(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.sunrise_epoch_s, 0)
    }

    pub fn sunset(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.sunset_epoch_s, 0)
    }

    /// Sunrise as a 12-hour clock reading in `tz`, e.g. `07:42 AM`.
    pub fn sunrise_clock<Tz>(&self, tz: &Tz) -> Option<String>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.sunrise().map(|t| clock(&t.with_timezone(tz)))
    }

    /// Sunset as a 12-hour clock reading in `tz`.
    pub fn sunset_clock<Tz>(&self, tz: &Tz) -> Option<String>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.sunset().map(|t| clock(&t.with_timezone(tz)))
    }
}

fn clock<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    time.format("%I:%M %p").to_string()
}

/// One successful "current weather" fetch.
///
/// Records decoded from a provider response always carry at least one condition.
/// Fields are public, so a hand-built or deserialized record may not; the derived
/// accessors return `None` in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub location_name: String,
    pub coordinates: Coordinates,
    pub conditions: Vec<Condition>,
    pub temperature: Temperature,
    pub wind: Wind,
    pub sun: Sun,
}

impl WeatherRecord {
    pub fn primary_condition(&self) -> Option<&Condition> {
        self.conditions.first()
    }

    pub fn icon_url(&self) -> Option<String> {
        self.primary_condition().map(Condition::icon_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn sample_sun() -> Sun {
        Sun {
            country_code: "GB".to_string(),
            // 2023-11-14 22:13:20 UTC
            sunrise_epoch_s: 1_700_000_000,
            // 2023-11-15 07:30:00 UTC
            sunset_epoch_s: 1_700_033_400,
        }
    }

    #[test]
    fn unit_system_as_str_roundtrip() {
        for units in UnitSystem::all() {
            let parsed = UnitSystem::try_from(units.as_str()).expect("roundtrip should succeed");
            assert_eq!(*units, parsed);
        }
    }

    #[test]
    fn unit_system_parse_is_case_insensitive() {
        assert_eq!(UnitSystem::try_from(" Imperial ").unwrap(), UnitSystem::Imperial);
    }

    #[test]
    fn unknown_unit_system_error() {
        let err = UnitSystem::try_from("kelvinish").unwrap_err();
        assert!(err.to_string().contains("Unknown unit system"));
    }

    #[test]
    fn unit_suffixes() {
        assert_eq!(UnitSystem::Metric.temperature_suffix(), "°C");
        assert_eq!(UnitSystem::Imperial.temperature_suffix(), "°F");
        assert_eq!(UnitSystem::Standard.temperature_suffix(), "K");
        assert_eq!(UnitSystem::Imperial.speed_suffix(), "mph");
        assert_eq!(UnitSystem::Standard.speed_suffix(), "m/s");
    }

    #[test]
    fn icon_url_uses_icon_id() {
        let condition = Condition {
            description: "clear sky".to_string(),
            icon_id: "01d".to_string(),
        };
        assert_eq!(condition.icon_url(), "https://openweathermap.org/img/wn/01d@2x.png");
    }

    #[test]
    fn sun_times_in_utc() {
        let sun = sample_sun();
        assert_eq!(sun.sunrise().unwrap().timestamp(), 1_700_000_000);
        assert_eq!(sun.sunrise_clock(&Utc).unwrap(), "10:13 PM");
        assert_eq!(sun.sunset_clock(&Utc).unwrap(), "07:30 AM");
    }

    #[test]
    fn sun_times_follow_time_zone() {
        let sun = sample_sun();
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(sun.sunrise_clock(&plus_two).unwrap(), "12:13 AM");
        assert_eq!(sun.sunset_clock(&plus_two).unwrap(), "09:30 AM");
    }

    #[test]
    fn record_without_conditions_has_no_icon() {
        let record = WeatherRecord {
            location_name: "Nowhere".to_string(),
            coordinates: Coordinates {
                longitude: 0.0,
                latitude: 0.0,
            },
            conditions: Vec::new(),
            temperature: Temperature {
                current: 0.0,
                feels_like: 0.0,
                min: 0.0,
                max: 0.0,
                pressure_hpa: 1000,
                humidity_pct: 50,
            },
            wind: Wind {
                speed: 0.0,
                direction_deg: 0,
            },
            sun: sample_sun(),
        };

        assert!(record.primary_condition().is_none());
        assert!(record.icon_url().is_none());

        let json = serde_json::to_string(&record).unwrap();
        let back: WeatherRecord = serde_json::from_str(&json).unwrap();
        assert!(back.icon_url().is_none());
    }

    #[test]
    fn out_of_range_timestamp_has_no_clock() {
        let sun = Sun {
            country_code: String::new(),
            sunrise_epoch_s: i64::MAX,
            sunset_epoch_s: 0,
        };
        assert!(sun.sunrise_clock(&Utc).is_none());
        assert_eq!(sun.sunset_clock(&Utc).unwrap(), "12:00 AM");
    }
}
