//! Quantity normalization and display formatting
//!
//! The default for a missing quantity depends on who asks: a raw id -> qty map
//! reports `0.0`, a display list never shows "0 of this part" and uses `1.0`.

/// Call context selecting the quantity default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QtyContext {
    /// Raw id -> qty maps: clamp to `>= 0`, absent becomes `0.0`
    RawMap,
    /// Display lists: absent or non-positive becomes `1.0`
    Display,
}

/// Normalize a stored quantity for the given context
pub fn normalize(raw: Option<f64>, context: QtyContext) -> f64 {
    let clamped = match raw {
        Some(value) if value.is_finite() => value.max(0.0),
        _ => match context {
            QtyContext::RawMap => 0.0,
            QtyContext::Display => 1.0,
        },
    };

    match context {
        QtyContext::Display if clamped <= 0.0 => 1.0,
        _ => clamped,
    }
}

/// Format a quantity with up to three decimals and a comma separator,
/// trimming trailing zeros (`2.5` -> `2,5`, `3.0` -> `3`)
pub fn format_qty(qty: f64) -> String {
    let fixed = format!("{:.3}", qty).replace('.', ",");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches(',');
    if trimmed.is_empty() || trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
