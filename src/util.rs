use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Format a decimal amount with thousand separators and 2 decimal places.
/// e.g. `1234567.89` → `"1,234,567.89"`
pub(crate) fn format_amount(val: Decimal) -> String {
    let abs = val.abs();
    let formatted = format!("{abs:.2}");
    let mut parts = formatted.split('.');
    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next().unwrap_or("00");

    let with_commas: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    if val < Decimal::ZERO {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// Percentage rounded half-up to one decimal place, trailing zeros dropped.
/// e.g. `85.25` → `"85.3%"`, `75.0` → `"75%"`
pub(crate) fn format_percent(val: Decimal) -> String {
    let rounded = val
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    format!("{rounded}%")
}

/// Truncate a string to `max` visible characters, appending "…" if truncated.
/// Safe for multi-byte UTF-8 characters.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let char_count = s.chars().count();
    if char_count <= max {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{truncated}…")
}

/// Text progress bar, clamped to `width` cells.
pub(crate) fn progress_bar(percentage: Decimal, width: usize) -> String {
    let ratio = (percentage / Decimal::ONE_HUNDRED).clamp(Decimal::ZERO, Decimal::ONE);
    let filled = (ratio * Decimal::from(width))
        .round()
        .to_usize()
        .unwrap_or(0)
        .min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

#[cfg(test)]
#[path = "util_tests.rs"]
mod tests;
