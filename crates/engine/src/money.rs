//! Money parsing and formatting. All prices are i64 minor units (cents);
//! floats never touch an amount.

/// Parse a plain decimal amount string to i64 minor units.
/// Handles "1234.56", "1234.5", "1234", "-1234.56".
pub fn parse_money_string(s: &str) -> Result<i64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty amount".into());
    }
    let negative = s.starts_with('-');
    let s = s.trim_start_matches('-');
    let (units, cents) = if let Some(dot) = s.find('.') {
        let u: i64 = s[..dot]
            .parse()
            .map_err(|e| format!("bad units: {e}"))?;
        let frac = &s[dot + 1..];
        let c: i64 = match frac.len() {
            0 => 0,
            1 => {
                frac.parse::<i64>()
                    .map_err(|e| format!("bad cents: {e}"))?
                    * 10
            }
            2 => frac.parse().map_err(|e| format!("bad cents: {e}"))?,
            _ => return Err(format!("too many decimal places: {s}")),
        };
        (u, c)
    } else {
        (s.parse().map_err(|e| format!("bad amount: {e}"))?, 0)
    };
    let minor = units * 100 + cents;
    Ok(if negative { -minor } else { minor })
}

/// Parse scraped price text into minor units. Marketplace listing pages
/// render prices with currency symbols, non-breaking spaces, and locale
/// decimal commas ("€13,00", "13.00 €", "1 299,00").
pub fn parse_scraped_price(s: &str) -> Result<i64, String> {
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, '€' | '$' | '£') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(format!("no amount in price text {s:?}"));
    }

    // When both separators appear, the last one is the decimal separator
    // and the other is a thousands separator.
    let normalized = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => {
            let no_groups: String = cleaned.chars().filter(|c| *c != '.').collect();
            no_groups.replace(',', ".")
        }
        (Some(_), Some(_)) => cleaned.chars().filter(|c| *c != ',').collect(),
        (None, Some(_)) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    parse_money_string(&normalized)
}

/// Format minor units as a plain decimal string: 5500 -> "55.00".
pub fn format_minor(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
