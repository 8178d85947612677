use meteo_core::{SearchState, day_cards};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

use crate::tui::App;

pub fn draw(frame: &mut Frame, app: &App, state: &SearchState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(3), // Search bar
            Constraint::Length(1), // Loading
            Constraint::Min(3),    // Forecast
            Constraint::Length(1), // Help
        ])
        .split(frame.area());

    frame.render_widget(
        Paragraph::new("Weather").style(Style::default().add_modifier(Modifier::BOLD)),
        chunks[0],
    );
    draw_search_bar(frame, app, chunks[1]);

    if state.is_loading {
        frame.render_widget(
            Paragraph::new("Loading ...").style(Style::default().fg(Color::Yellow)),
            chunks[2],
        );
    }

    draw_forecast(frame, app, state, chunks[3]);
    draw_help(frame, app, chunks[4]);
}

fn draw_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus.is_search_focused();
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(" Search ");

    let (text, style) = if app.input.is_empty() {
        ("Search from location...", Style::default().fg(Color::DarkGray))
    } else {
        (app.input.as_str(), Style::default().fg(Color::White))
    };

    frame.render_widget(Paragraph::new(text).block(block).style(style), area);

    if focused {
        frame.set_cursor_position((cursor_x(area, &app.input), area.y + 1));
    }
}

/// Column just past the typed text, kept inside the bar's borders.
fn cursor_x(area: Rect, input: &str) -> u16 {
    let typed = u16::try_from(input.chars().count()).unwrap_or(u16::MAX);
    area.x
        .saturating_add(1)
        .saturating_add(typed)
        .min(area.right().saturating_sub(2))
}

fn draw_forecast(frame: &mut Frame, app: &App, state: &SearchState, area: Rect) {
    if let Some(error) = &state.error_text {
        frame.render_widget(
            Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red)),
            area,
        );
        return;
    }

    let Some(forecast) = state.forecast.as_ref().filter(|days| !days.is_empty()) else {
        return;
    };

    let border_style = if app.focus.is_search_focused() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };

    let items: Vec<ListItem> = day_cards(forecast)
        .into_iter()
        .map(|card| ListItem::new(format!(" {}  {:<6} {}", card.icon, card.label, card.range)))
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(format!(" Weather {} ", state.resolved_place_name)),
    );

    frame.render_widget(list, area);
}

fn draw_help(frame: &mut Frame, app: &App, area: Rect) {
    let help = if app.focus.is_search_focused() {
        " Type to search | Tab: forecast | Esc: cancel | Ctrl-C: quit"
    } else {
        " Enter: search | Tab: search | q/Esc: quit"
    };

    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_follows_typed_characters() {
        let area = Rect::new(2, 0, 40, 3);
        assert_eq!(cursor_x(area, ""), 3);
        assert_eq!(cursor_x(area, "Zürich"), 9);
    }

    #[test]
    fn cursor_stays_inside_bar_for_long_input() {
        let area = Rect::new(10, 0, 20, 3);
        assert_eq!(cursor_x(area, &"x".repeat(100)), 28);

        let huge = "x".repeat(usize::from(u16::MAX) + 10);
        assert_eq!(cursor_x(Rect::new(u16::MAX - 5, 0, 5, 3), &huge), u16::MAX - 2);
    }
}
