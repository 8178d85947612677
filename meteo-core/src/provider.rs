use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};
use tokio_util::sync::CancellationToken;

use crate::{
    Config,
    error::LookupError,
    model::{ForecastData, GeoResult},
    provider::open_meteo::OpenMeteo,
};

pub mod open_meteo;

/// The two lookups a search performs, in order.
///
/// Implementations must return [`LookupError::Cancelled`] promptly once
/// `token` fires, without waiting for the in-flight request to finish.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    /// Resolve a place name to its first geocoding match.
    async fn geocode(
        &self,
        name: &str,
        token: &CancellationToken,
    ) -> Result<GeoResult, LookupError>;

    /// Daily forecast for a resolved place.
    async fn forecast(
        &self,
        place: &GeoResult,
        token: &CancellationToken,
    ) -> Result<ForecastData, LookupError>;
}

/// Construct the Open-Meteo source described by `config`.
pub fn source_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherSource>> {
    config.validate()?;
    let source = OpenMeteo::new(config)?;
    Ok(Arc::new(source))
}
