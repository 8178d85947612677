use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// First match returned by the geocoding endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoResult {
    pub latitude: f64,
    pub longitude: f64,
    /// IANA timezone name, e.g. "Europe/Paris". Some results carry none.
    pub timezone: Option<String>,
    pub place_name: String,
    pub country_code: Option<String>,
}

/// One day of the forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub date: NaiveDate,
    pub weather_code: i32,
    pub temp_max: f64,
    pub temp_min: f64,
}

/// Daily records in the order the forecast endpoint returned them.
pub type ForecastData = Vec<DayForecast>;

/// View state owned by the [`SearchController`](crate::SearchController).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchState {
    pub query_text: String,
    pub is_loading: bool,
    pub resolved_place_name: String,
    pub error_text: Option<String>,
    pub forecast: Option<ForecastData>,
}

impl SearchState {
    /// Fresh state seeded with a previously saved query.
    pub fn with_query(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            ..Self::default()
        }
    }

    /// True when a non-empty forecast is available for rendering.
    pub fn has_forecast(&self) -> bool {
        self.forecast.as_ref().is_some_and(|days| !days.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_query_leaves_everything_else_empty() {
        let state = SearchState::with_query("Paris");

        assert_eq!(state.query_text, "Paris");
        assert!(!state.is_loading);
        assert!(state.resolved_place_name.is_empty());
        assert!(state.error_text.is_none());
        assert!(state.forecast.is_none());
    }

    #[test]
    fn empty_forecast_is_not_renderable() {
        let mut state = SearchState::default();
        state.forecast = Some(Vec::new());
        assert!(!state.has_forecast());

        state.forecast = Some(vec![DayForecast {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"),
            weather_code: 0,
            temp_max: 20.0,
            temp_min: 10.0,
        }]);
        assert!(state.has_forecast());
    }
}
