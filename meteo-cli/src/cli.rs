use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Text};
use meteo_core::{
    Config, FileStore, MemoryStore, SearchController, SearchState, config::project_dirs,
    controller::MIN_QUERY_CHARS, day_cards, source_from_config,
};
use std::sync::Arc;

use crate::{logging, tui};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteo", version, about = "Location search and daily weather forecast")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive search (the default when no command is given).
    Tui,

    /// Show the forecast for a location and exit.
    Show {
        /// Location name, e.g. "Paris".
        location: String,

        /// Print the resolved state as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Edit endpoints and forecast options interactively.
    Configure,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command.unwrap_or(Command::Tui) {
            Command::Tui => {
                logging::init_file(&project_dirs()?.data_dir().join("meteo.log"))?;
                let config = Config::load()?;
                let store = FileStore::open_default()?;
                let controller = SearchController::new(source_from_config(&config)?, Arc::new(store));
                tui::run(controller).await
            }
            Command::Show { location, json } => {
                logging::init_stderr();
                let config = Config::load()?;
                show(&config, &location, json).await
            }
            Command::Configure => {
                logging::init_stderr();
                configure()
            }
        }
    }
}

async fn show(config: &Config, location: &str, json: bool) -> Result<()> {
    if location.trim().chars().count() < MIN_QUERY_CHARS {
        bail!("Location must be at least {MIN_QUERY_CHARS} characters long");
    }

    // One-shot lookups must not replace the query saved by the interactive UI.
    let controller = SearchController::new(source_from_config(config)?, Arc::new(MemoryStore::new()));
    controller.resolve_and_fetch(location.trim()).await;

    let state = controller.state();
    if let Some(error) = &state.error_text {
        bail!("{error}");
    }

    if json {
        print_json(&state)
    } else {
        print_cards(&state);
        Ok(())
    }
}

fn print_cards(state: &SearchState) {
    println!("Weather {}", state.resolved_place_name);

    if let Some(forecast) = &state.forecast {
        for card in day_cards(forecast) {
            println!("  {}  {:<6} {}", card.icon, card.label, card.range);
        }
    }
}

fn print_json(state: &SearchState) -> Result<()> {
    let cards = state.forecast.as_ref().map(day_cards).unwrap_or_default();
    let output = serde_json::json!({
        "place": state.resolved_place_name,
        "cards": cards,
        "forecast": state.forecast,
    });

    let rendered =
        serde_json::to_string_pretty(&output).context("Failed to serialize forecast as JSON")?;
    println!("{rendered}");
    Ok(())
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    config.geocoding_url = Text::new("Geocoding endpoint:")
        .with_default(&config.geocoding_url)
        .prompt()?;

    config.forecast_url = Text::new("Forecast endpoint:")
        .with_default(&config.forecast_url)
        .prompt()?;

    let current_days = config.forecast_days.map(|d| d.to_string()).unwrap_or_default();
    let days = Text::new("Forecast days (leave empty for the endpoint default):")
        .with_default(&current_days)
        .prompt()?;
    config.forecast_days = parse_forecast_days(&days)?;

    config.request_timeout_secs = CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(config.request_timeout_secs)
        .with_error_message("Please enter a whole number of seconds")
        .prompt()?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

fn parse_forecast_days(input: &str) -> Result<Option<u8>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let days = input
        .parse::<u8>()
        .with_context(|| format!("'{input}' is not a valid number of days"))?;
    Ok(Some(days))
}
