use crate::core::ConversionState;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Label,
    Value,
    Error,
    Warning,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Label => style(text).bold(),
        StyleType::Value => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Warning => style(text).yellow().bold(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Creates a spinner shown while a quote is loading.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Renders a snapshot as the lines a converter screen would show.
pub fn render_state(state: &ConversionState) -> String {
    let mut lines = vec![
        format!(
            "{}  {} {}",
            style_text("Sending from", StyleType::Label),
            style_text(&state.amount_from, StyleType::Value),
            state.from_currency
        ),
        format!(
            "{}  {} {}",
            style_text("Receiver gets", StyleType::Label),
            style_text(&state.amount_to, StyleType::Value),
            state.to_currency
        ),
    ];
    if state.loading {
        lines.push(style_text("Fetching rate...", StyleType::Subtle));
    } else if !state.rate_text.is_empty() {
        lines.push(style_text(&state.rate_text, StyleType::Subtle));
    }
    if let Some(error) = &state.error {
        lines.push(style_text(error, StyleType::Error));
    }
    if state.show_no_network_banner {
        lines.push(style_text(
            "No internet connection. Type `dismiss` to hide this message.",
            StyleType::Warning,
        ));
    }
    lines.join("\n")
}
