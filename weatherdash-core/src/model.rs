use serde::{Deserialize, Serialize};

/// Normalized weather category used to pick a display icon.
///
/// Upstream category strings never survive past the normalizer; every record
/// carries one of these seven tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionTag {
    #[default]
    Sunny,
    Clear,
    PartlyCloudy,
    PartlySunny,
    Cloudy,
    Rainy,
    Snowy,
}

impl ConditionTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionTag::Sunny => "sunny",
            ConditionTag::Clear => "clear",
            ConditionTag::PartlyCloudy => "partly-cloudy",
            ConditionTag::PartlySunny => "partly-sunny",
            ConditionTag::Cloudy => "cloudy",
            ConditionTag::Rainy => "rainy",
            ConditionTag::Snowy => "snowy",
        }
    }

    pub const fn all() -> &'static [ConditionTag] {
        &[
            ConditionTag::Sunny,
            ConditionTag::Clear,
            ConditionTag::PartlyCloudy,
            ConditionTag::PartlySunny,
            ConditionTag::Cloudy,
            ConditionTag::Rainy,
            ConditionTag::Snowy,
        ]
    }
}

impl std::fmt::Display for ConditionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current conditions card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location: String,
    /// Local clock reading, `HH:MM`.
    pub time: String,
    /// Local date label, e.g. `Thursday, 31 Aug`.
    pub date: String,
    pub temp: i32,
    pub feels_like: i32,
    pub condition: ConditionTag,
    pub humidity: u8,
    /// km/h
    pub wind_speed: i32,
    /// hPa
    pub pressure: i32,
    pub uv: u8,
    pub sunrise: String,
    pub sunset: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyEntry {
    pub time: String,
    pub temp: i32,
    pub condition: ConditionTag,
    pub wind_speed: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub date: String,
    pub day: String,
    pub temp: i32,
    pub condition: ConditionTag,
}

/// Everything the dashboard displays. Replaced wholesale on each successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherData {
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyEntry>,
    pub daily: Vec<DailyEntry>,
}

impl WeatherData {
    /// Value shown before the first fetch completes.
    pub fn placeholder() -> Self {
        let hourly = [
            ("12:00", 26, ConditionTag::Sunny, 3),
            ("15:00", 27, ConditionTag::Sunny, 2),
            ("18:00", 27, ConditionTag::PartlyCloudy, 2),
            ("21:00", 25, ConditionTag::PartlyCloudy, 3),
            ("00:00", 22, ConditionTag::Clear, 3),
        ]
        .into_iter()
        .map(|(time, temp, condition, wind_speed)| HourlyEntry {
            time: time.to_string(),
            temp,
            condition,
            wind_speed,
        })
        .collect();

        let daily = [
            ("Friday, 1 Sep", "Fri", 20, ConditionTag::PartlyCloudy),
            ("Saturday, 2 Sep", "Sat", 22, ConditionTag::PartlySunny),
            ("Sunday, 3 Sep", "Sun", 27, ConditionTag::Sunny),
            ("Monday, 4 Sep", "Mon", 18, ConditionTag::Cloudy),
            ("Tuesday, 5 Sep", "Tue", 16, ConditionTag::Rainy),
        ]
        .into_iter()
        .map(|(date, day, temp, condition)| DailyEntry {
            date: date.to_string(),
            day: day.to_string(),
            temp,
            condition,
        })
        .collect();

        Self {
            current: CurrentConditions {
                location: "Athens".to_string(),
                time: "09:03".to_string(),
                date: "Thursday, 31 Aug".to_string(),
                temp: 24,
                feels_like: 22,
                condition: ConditionTag::Sunny,
                humidity: 41,
                wind_speed: 2,
                pressure: 997,
                uv: 8,
                sunrise: "06:37 AM".to_string(),
                sunset: "08:37 PM".to_string(),
            },
            hourly,
            daily,
        }
    }
}

impl Default for WeatherData {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// A point on the globe, as produced by a geolocator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}
