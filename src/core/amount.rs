//! Amount text handling: input cleaning, parsing and display formatting

/// Keeps ASCII digits and the first `.` or `,` separator, dropping everything else.
///
/// Character order is preserved and no normalisation happens, so `"1,5"`
/// stays `"1,5"`. The result is always safe to store as field text.
pub fn sanitize_amount(raw: &str) -> String {
    let mut separator_seen = false;
    raw.chars()
        .filter(|c| match c {
            '0'..='9' => true,
            '.' | ',' if !separator_seen => {
                separator_seen = true;
                true
            }
            _ => false,
        })
        .collect()
}

/// Parses field text into a sendable amount.
///
/// `,` is accepted as the decimal separator. Returns `None` for text that is
/// not a number or not strictly positive.
pub fn parse_amount(text: &str) -> Option<f64> {
    let amount = text.replace(',', ".").parse::<f64>().ok()?;
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

/// Formats an amount with two decimal places.
pub fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}
