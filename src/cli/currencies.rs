use super::ui;
use crate::core::CurrencyRegistry;
use comfy_table::{Cell, CellAlignment, Table};

/// Builds the table listing every supported currency.
pub fn currency_table(registry: &'static CurrencyRegistry) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Currency"),
        ui::header_cell("Country"),
        ui::header_cell("Max send"),
    ]);
    for code in registry.iter() {
        let currency = code.currency();
        table.add_row(vec![
            Cell::new(currency.code),
            Cell::new(currency.name),
            Cell::new(currency.country),
            Cell::new(format!("{:.2}", currency.max_send_amount))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn run() {
    println!(
        "\n{}",
        ui::style_text("Supported currencies", ui::StyleType::Title)
    );
    println!("{}", currency_table(CurrencyRegistry::builtin()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_table_lists_registry() {
        let rendered = currency_table(CurrencyRegistry::builtin()).to_string();
        for expected in ["PLN", "Polish zloty", "Great Britain", "50000.00", "Hrivna"] {
            assert!(rendered.contains(expected), "missing {expected}");
        }
    }
}
