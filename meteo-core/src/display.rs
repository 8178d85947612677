//! Pure formatting for day cards: icons, weekday labels, temperature ranges.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{DayForecast, ForecastData};

/// Marker for a weather code outside every known group.
pub const ICON_NOT_FOUND: &str = "NOT FOUND";

pub const TODAY_LABEL: &str = "Today";

/// WMO weather code groups, checked in order.
/// See: https://open-meteo.com/en/docs#weathervariables
const ICONS: &[(&[i32], &str)] = &[
    (&[0], "☀️"),
    (&[1], "🌤"),
    (&[2], "⛅️"),
    (&[3], "☁️"),
    (&[45, 48], "🌫"),
    (&[51, 56, 61, 66, 80], "🌦"),
    (&[53, 55, 63, 65, 57, 67, 81, 82], "🌧"),
    (&[71, 73, 75, 77, 85, 86], "🌨"),
    (&[95], "🌩"),
    (&[96, 99], "⛈"),
];

pub fn weather_icon(code: i32) -> &'static str {
    ICONS
        .iter()
        .find(|(codes, _)| codes.contains(&code))
        .map_or(ICON_NOT_FOUND, |(_, icon)| *icon)
}

/// Short English weekday, e.g. "Mon".
pub fn format_day(date: NaiveDate) -> String {
    date.format("%a").to_string()
}

/// Label for the card at `index`; the first card is always "Today".
pub fn day_label(index: usize, date: NaiveDate) -> String {
    if index == 0 {
        TODAY_LABEL.to_string()
    } else {
        format_day(date)
    }
}

/// "{floor(min)}° — {ceil(max)}°"
pub fn temperature_range(min: f64, max: f64) -> String {
    // `+ 0.0` turns a negative zero into "0".
    format!("{}° — {}°", min.floor() + 0.0, max.ceil() + 0.0)
}

/// Everything needed to draw one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCard {
    pub icon: &'static str,
    pub label: String,
    pub range: String,
}

impl DayCard {
    fn new(index: usize, day: &DayForecast) -> Self {
        Self {
            icon: weather_icon(day.weather_code),
            label: day_label(index, day.date),
            range: temperature_range(day.temp_min, day.temp_max),
        }
    }
}

pub fn day_cards(forecast: &ForecastData) -> Vec<DayCard> {
    forecast
        .iter()
        .enumerate()
        .map(|(index, day)| DayCard::new(index, day))
        .collect()
}
