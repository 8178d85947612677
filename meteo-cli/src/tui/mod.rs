//! Interactive terminal front-end for the search controller.

mod app;
mod events;
mod ui;

use anyhow::Result;
use meteo_core::SearchController;

pub use app::App;

pub async fn run(controller: SearchController) -> Result<()> {
    let mut terminal = ratatui::init();
    let result = App::new(controller).run(&mut terminal).await;
    ratatui::restore();
    result
}
