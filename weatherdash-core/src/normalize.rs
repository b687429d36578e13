//! Upstream payload → [`WeatherData`].
//!
//! Everything here is pure: the caller supplies the time zone used for
//! labels and the clock reading stamped into the current record.

use std::collections::HashSet;
use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};

use crate::{
    DashboardError,
    model::{ConditionTag, CurrentConditions, DailyEntry, HourlyEntry, WeatherData},
    provider::openweather::{OwCurrentResponse, OwForecastEntry, OwForecastResponse, OwWeather},
};

/// Maximum number of hourly and daily entries kept.
pub const MAX_ENTRIES: usize = 5;

/// The upstream free tier has no UV index.
pub const UV_PLACEHOLDER: u8 = 8;

const TIME_FORMAT: &str = "%H:%M";
const DATE_LABEL_FORMAT: &str = "%A, %-d %b";
const DAY_LABEL_FORMAT: &str = "%a";
const SUN_FORMAT: &str = "%I:%M %p";

/// Map an upstream category (`Clear`, `Clouds`, ...) to a condition tag.
/// Unknown categories fall back to `Sunny`.
pub fn normalize_condition(raw: &str) -> ConditionTag {
    match raw.to_lowercase().as_str() {
        "clear" => ConditionTag::Sunny,
        "clouds" => ConditionTag::PartlyCloudy,
        "rain" | "drizzle" | "thunderstorm" => ConditionTag::Rainy,
        "snow" => ConditionTag::Snowy,
        "mist" | "fog" | "haze" => ConditionTag::Cloudy,
        _ => ConditionTag::Sunny,
    }
}

/// m/s → km/h, rounded.
pub fn mps_to_kmh(mps: f64) -> i32 {
    (mps * 3.6).round() as i32
}

pub fn round_temp(celsius: f64) -> i32 {
    celsius.round() as i32
}

/// `HH:MM` for the given instant in `tz`.
pub fn clock_label<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    now.format(TIME_FORMAT).to_string()
}

/// `Thursday, 31 Aug` for the given instant in `tz`.
pub fn date_label<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    now.format(DATE_LABEL_FORMAT).to_string()
}

/// First `MAX_ENTRIES` samples in provider order.
pub fn build_hourly<Tz>(
    list: &[OwForecastEntry],
    tz: &Tz,
) -> Result<Vec<HourlyEntry>, DashboardError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    list.iter()
        .take(MAX_ENTRIES)
        .map(|entry| {
            let at = local_time(entry.dt, tz)?;
            Ok(HourlyEntry {
                time: at.format(TIME_FORMAT).to_string(),
                temp: round_temp(entry.main.temp),
                condition: normalize_condition(&first_weather(&entry.weather)?.main),
                wind_speed: mps_to_kmh(entry.wind.speed),
            })
        })
        .collect()
}

/// One entry per local calendar day; the first sample seen for a day
/// determines that day's values.
pub fn build_daily<Tz>(list: &[OwForecastEntry], tz: &Tz) -> Result<Vec<DailyEntry>, DashboardError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut seen = HashSet::new();
    let mut daily = Vec::with_capacity(MAX_ENTRIES);

    for entry in list {
        if daily.len() == MAX_ENTRIES {
            break;
        }

        let at = local_time(entry.dt, tz)?;
        if !seen.insert(at.date_naive()) {
            continue;
        }

        daily.push(DailyEntry {
            date: at.format(DATE_LABEL_FORMAT).to_string(),
            day: at.format(DAY_LABEL_FORMAT).to_string(),
            temp: round_temp(entry.main.temp),
            condition: normalize_condition(&first_weather(&entry.weather)?.main),
        });
    }

    Ok(daily)
}

/// Current card; `time`/`date` come from `now`, not from the payload.
pub fn build_current<Tz>(
    payload: &OwCurrentResponse,
    now: &DateTime<Tz>,
) -> Result<CurrentConditions, DashboardError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let tz = now.timezone();
    let sunrise = local_time(payload.sys.sunrise, &tz)?;
    let sunset = local_time(payload.sys.sunset, &tz)?;

    Ok(CurrentConditions {
        location: payload.name.clone(),
        time: clock_label(now),
        date: date_label(now),
        temp: round_temp(payload.main.temp),
        feels_like: round_temp(payload.main.feels_like),
        condition: normalize_condition(&first_weather(&payload.weather)?.main),
        humidity: payload.main.humidity,
        wind_speed: mps_to_kmh(payload.wind.speed),
        pressure: payload.main.pressure,
        uv: UV_PLACEHOLDER,
        sunrise: sunrise.format(SUN_FORMAT).to_string(),
        sunset: sunset.format(SUN_FORMAT).to_string(),
    })
}

/// Combine both payloads of one fetch sequence into a fresh record.
pub fn normalize<Tz>(
    current: &OwCurrentResponse,
    forecast: &OwForecastResponse,
    now: &DateTime<Tz>,
) -> Result<WeatherData, DashboardError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let tz = now.timezone();
    Ok(WeatherData {
        current: build_current(current, now)?,
        hourly: build_hourly(&forecast.list, &tz)?,
        daily: build_daily(&forecast.list, &tz)?,
    })
}

fn local_time<Tz: TimeZone>(epoch_secs: i64, tz: &Tz) -> Result<DateTime<Tz>, DashboardError> {
    DateTime::<Utc>::from_timestamp(epoch_secs, 0)
        .map(|utc| utc.with_timezone(tz))
        .ok_or_else(|| {
            DashboardError::NetworkOrParseFailure(format!("timestamp out of range: {epoch_secs}"))
        })
}

fn first_weather(weather: &[OwWeather]) -> Result<&OwWeather, DashboardError> {
    weather
        .first()
        .ok_or_else(|| DashboardError::NetworkOrParseFailure("empty `weather` array".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::openweather::{OwMain, OwSampleMain, OwSys, OwWind};
    use chrono::FixedOffset;

    fn sample(dt: i64, temp: f64, category: &str, wind: f64) -> OwForecastEntry {
        OwForecastEntry {
            dt,
            main: OwSampleMain { temp },
            weather: vec![OwWeather {
                main: category.to_string(),
            }],
            wind: OwWind { speed: wind },
        }
    }

    fn athens_current() -> OwCurrentResponse {
        OwCurrentResponse {
            name: "Athens".to_string(),
            main: OwMain {
                temp: 24.4,
                feels_like: 22.1,
                humidity: 41,
                pressure: 997,
            },
            weather: vec![OwWeather {
                main: "Clear".to_string(),
            }],
            wind: OwWind { speed: 5.0 },
            // 2023-08-31 03:37 UTC and 17:37 UTC
            sys: OwSys {
                sunrise: 1_693_453_020,
                sunset: 1_693_503_420,
            },
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).expect("valid offset")
    }

    // 2023-08-31 00:00:00 UTC, a Thursday
    const AUG_31: i64 = 1_693_440_000;
    const HOUR: i64 = 3600;

    #[test]
    fn condition_table() {
        let cases = [
            ("Clear", ConditionTag::Sunny),
            ("clouds", ConditionTag::PartlyCloudy),
            ("Rain", ConditionTag::Rainy),
            ("DRIZZLE", ConditionTag::Rainy),
            ("Thunderstorm", ConditionTag::Rainy),
            ("Snow", ConditionTag::Snowy),
            ("Mist", ConditionTag::Cloudy),
            ("Fog", ConditionTag::Cloudy),
            ("Haze", ConditionTag::Cloudy),
        ];
        for (raw, expected) in cases {
            assert_eq!(normalize_condition(raw), expected, "raw = {raw}");
        }
    }

    #[test]
    fn unknown_condition_defaults_to_sunny() {
        assert_eq!(normalize_condition("tornado"), ConditionTag::Sunny);
        assert_eq!(normalize_condition(""), ConditionTag::Sunny);
        assert!(ConditionTag::all().contains(&normalize_condition("Squall")));
    }

    #[test]
    fn wind_conversion_rounds() {
        assert_eq!(mps_to_kmh(5.0), 18);
        assert_eq!(mps_to_kmh(0.6), 2);
        assert_eq!(mps_to_kmh(0.0), 0);
        assert_eq!(round_temp(24.4), 24);
        assert_eq!(round_temp(22.5), 23);
        assert_eq!(round_temp(-3.6), -4);
    }

    #[test]
    fn hourly_takes_first_five_in_order() {
        let list: Vec<_> = (0..8)
            .map(|i| sample(AUG_31 + i * 3 * HOUR, 20.0 + i as f64, "Clouds", 1.0))
            .collect();

        let hourly = build_hourly(&list, &utc()).expect("valid samples");
        assert_eq!(hourly.len(), 5);
        let times: Vec<_> = hourly.iter().map(|h| h.time.as_str()).collect();
        assert_eq!(times, ["00:00", "03:00", "06:00", "09:00", "12:00"]);
        assert_eq!(hourly[4].temp, 24);
        assert_eq!(hourly[0].wind_speed, 4);
        assert_eq!(hourly[0].condition, ConditionTag::PartlyCloudy);
    }

    #[test]
    fn hourly_with_short_list() {
        let list = vec![
            sample(AUG_31, 10.0, "Rain", 2.0),
            sample(AUG_31 + HOUR, 11.0, "Snow", 2.0),
        ];
        let hourly = build_hourly(&list, &utc()).expect("valid samples");
        assert_eq!(hourly.len(), 2);
        assert!(build_hourly(&[], &utc()).expect("empty list").is_empty());
    }

    #[test]
    fn hourly_uses_local_time_zone() {
        let athens = FixedOffset::east_opt(3 * 3600).expect("valid offset");
        let list = vec![sample(AUG_31 + 21 * HOUR, 20.0, "Clear", 1.0)];
        let hourly = build_hourly(&list, &athens).expect("valid samples");
        assert_eq!(hourly[0].time, "00:00");
    }

    #[test]
    fn daily_first_sample_of_each_day_wins() {
        // Eight samples a day for seven days.
        let list: Vec<_> = (0..56)
            .map(|i| {
                let category = if i % 8 == 0 { "Rain" } else { "Clear" };
                sample(AUG_31 + i * 3 * HOUR, i as f64, category, 1.0)
            })
            .collect();

        let daily = build_daily(&list, &utc()).expect("valid samples");
        assert_eq!(daily.len(), 5);

        let dates: HashSet<_> = daily.iter().map(|d| d.date.clone()).collect();
        assert_eq!(dates.len(), 5);

        assert_eq!(daily[0].date, "Thursday, 31 Aug");
        assert_eq!(daily[0].day, "Thu");
        assert_eq!(daily[1].date, "Friday, 1 Sep");
        assert_eq!(daily[1].temp, 8);
        for day in &daily {
            assert_eq!(day.condition, ConditionTag::Rainy);
        }
    }

    #[test]
    fn daily_buckets_by_local_calendar_date() {
        // 22:00 and 23:00 UTC on Aug 31 fall on Sep 1 at UTC+3.
        let list = vec![
            sample(AUG_31 + 20 * HOUR, 1.0, "Clear", 1.0),
            sample(AUG_31 + 22 * HOUR, 2.0, "Clear", 1.0),
            sample(AUG_31 + 23 * HOUR, 3.0, "Clear", 1.0),
        ];

        let in_utc = build_daily(&list, &utc()).expect("valid samples");
        assert_eq!(in_utc.len(), 1);

        let athens = FixedOffset::east_opt(3 * 3600).expect("valid offset");
        let in_athens = build_daily(&list, &athens).expect("valid samples");
        assert_eq!(in_athens.len(), 2);
        assert_eq!(in_athens[1].temp, 2);
    }

    #[test]
    fn current_maps_athens_fixture() {
        let now = utc().timestamp_opt(AUG_31 + 9 * HOUR + 3 * 60, 0).unwrap();
        let current = build_current(&athens_current(), &now).expect("valid payload");

        assert_eq!(current.location, "Athens");
        assert_eq!(current.temp, 24);
        assert_eq!(current.feels_like, 22);
        assert_eq!(current.condition, ConditionTag::Sunny);
        assert_eq!(current.wind_speed, 18);
        assert_eq!(current.humidity, 41);
        assert_eq!(current.pressure, 997);
        assert_eq!(current.uv, UV_PLACEHOLDER);
        assert_eq!(current.time, "09:03");
        assert_eq!(current.date, "Thursday, 31 Aug");
        assert_eq!(current.sunrise, "03:37 AM");
        assert_eq!(current.sunset, "05:37 PM");
    }

    #[test]
    fn empty_weather_array_is_a_parse_failure() {
        let mut payload = athens_current();
        payload.weather.clear();
        let now = utc().timestamp_opt(AUG_31, 0).unwrap();

        let err = build_current(&payload, &now).unwrap_err();
        assert!(matches!(err, DashboardError::NetworkOrParseFailure(_)));
    }

    #[test]
    fn normalize_combines_payloads() {
        let forecast = OwForecastResponse {
            list: (0..16).map(|i| sample(AUG_31 + i * 3 * HOUR, 18.0, "Mist", 3.0)).collect(),
        };
        let now = utc().timestamp_opt(AUG_31, 0).unwrap();

        let data = normalize(&athens_current(), &forecast, &now).expect("valid payloads");
        assert_eq!(data.hourly.len(), 5);
        assert_eq!(data.daily.len(), 2);
        assert_eq!(data.daily[0].condition, ConditionTag::Cloudy);
        assert_eq!(data.hourly[0].wind_speed, 11);
    }
}
