//! Derived total weight
//!
//! Pure functions; nothing here touches the store.

/// Lenient numeric read of a form field
///
/// Leading whitespace is skipped and the longest numeric prefix is used
/// (`"50kg"` reads as 50). Empty, non-numeric or non-finite input reads as 0.
pub fn numeric_or_zero(raw: &str) -> f64 {
    let text = raw.trim_start();
    let end = numeric_prefix_len(text);
    if end == 0 {
        return 0.0;
    }

    match text[..end].parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// bags * bag weight, each read leniently
pub fn total_weight(bags: &str, bag_weight: &str) -> f64 {
    numeric_or_zero(bags) * numeric_or_zero(bag_weight)
}

/// Byte length of `[+-]?digits[.digits][(e|E)[+-]?digits]` at the start of `text`
fn numeric_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if digits > 0 || j > frac_start {
            digits += j - frac_start;
            i = j;
        }
    }

    if digits == 0 {
        return 0;
    }

    // Exponent only counts when followed by at least one digit
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    i
}
