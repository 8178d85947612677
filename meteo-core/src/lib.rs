//! Core library for the `meteo` CLI.
//!
//! This crate defines:
//! - Configuration and the saved-query store
//! - The weather source abstraction and its Open-Meteo implementation
//! - The search controller: cancellable two-step lookups and view state
//! - Pure formatting helpers for day cards
//!
//! It is used by `meteo-cli`, but can also be reused by other front-ends.

pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod focus;
pub mod model;
pub mod provider;
pub mod storage;

pub use config::Config;
pub use controller::{Lookup, SearchController};
pub use display::{DayCard, day_cards, day_label, format_day, weather_icon};
pub use error::{LOCATION_NOT_FOUND, LookupError};
pub use focus::{Focus, FocusState, Key};
pub use model::{DayForecast, ForecastData, GeoResult, SearchState};
pub use provider::{WeatherSource, open_meteo::OpenMeteo, source_from_config};
pub use storage::{FileStore, KeyValueStore, LAST_QUERY_KEY, MemoryStore};

pub use tokio_util::sync::CancellationToken;
