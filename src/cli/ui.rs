use crate::core::table::{SortColumn, SortDirection};
use crate::core::ConverterSession;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Label,
    Value,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Label => style(text).bold(),
        StyleType::Value => style(text).green().bold(),
        StyleType::Error => style(text).red(),
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

/// Right aligned rate with enough precision for currencies like JPY and BTC.
pub fn rate_cell(rate: f64) -> Cell {
    Cell::new(format!("{rate:.4}")).set_alignment(CellAlignment::Right)
}

/// Arrow shown next to the header of the sorted column.
fn sort_marker(column: SortColumn, active: SortColumn, direction: SortDirection) -> &'static str {
    if column != active {
        return "";
    }
    match direction {
        SortDirection::Ascending => " ▲",
        SortDirection::Descending => " ▼",
        SortDirection::None => "",
    }
}

/// Renders the session's rate table in the current sort order.
pub fn rates_table(session: &ConverterSession) -> String {
    let Some(table_data) = session.table() else {
        return style_text("No rates loaded", StyleType::Subtle);
    };
    let sort = session.sort();

    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell(&format!(
            "Currency{}",
            sort_marker(SortColumn::Code, sort.column, sort.direction)
        )),
        header_cell(&format!(
            "Rate (1 {}){}",
            table_data.base(),
            sort_marker(SortColumn::Value, sort.column, sort.direction)
        )),
    ]);

    for row in session.rows() {
        let code = if row.code == session.target() {
            Cell::new(&row.code).add_attribute(Attribute::Bold)
        } else {
            Cell::new(&row.code)
        };
        table.add_row(vec![code, rate_cell(row.value)]);
    }

    format!(
        "Rates of {}\n{}",
        style_text(&table_data.date().to_string(), StyleType::Label),
        table
    )
}

/// One line summary such as `10.00 EUR = 10.92 USD`.
pub fn conversion_line(session: &ConverterSession) -> String {
    let converted = session
        .target_amount()
        .map_or_else(
            || style_text("N/A", StyleType::Error),
            |v| style_text(&format!("{v:.2}"), StyleType::Value),
        );
    let date = session
        .date()
        .map_or("no rates loaded".to_string(), |d| format!("rates of {d}"));

    format!(
        "{:.2} {} = {} {} {}",
        session.amount(),
        style_text(session.source(), StyleType::Label),
        converted,
        style_text(session.target(), StyleType::Label),
        style_text(&format!("({date})"), StyleType::Subtle)
    )
}

/// Formats a recoverable problem shown to the user without stopping.
pub fn notice(message: &str) -> String {
    format!("{} {}", style_text("!", StyleType::Error), message)
}

/// Creates a spinner shown while a request is in flight.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_marker_only_on_active_column() {
        assert_eq!(
            sort_marker(SortColumn::Value, SortColumn::Value, SortDirection::Ascending),
            " ▲"
        );
        assert_eq!(
            sort_marker(SortColumn::Code, SortColumn::Value, SortDirection::Ascending),
            ""
        );
        assert_eq!(
            sort_marker(SortColumn::Code, SortColumn::Code, SortDirection::None),
            ""
        );
    }

    #[test]
    fn test_empty_session_renders_placeholders() {
        let session = ConverterSession::new("EUR", "USD", 2.0).unwrap();
        assert!(rates_table(&session).contains("No rates loaded"));

        let line = conversion_line(&session);
        assert!(line.contains("2.00"));
        assert!(line.contains("N/A"));
    }
}
