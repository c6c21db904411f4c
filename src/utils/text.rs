use crate::error::{AppError, AppResult};

pub const NAME_MAX: usize = 250;
pub const BODY_MAX: usize = 3500;

/// Trim `value` and require it to be non-empty and at most `max` characters.
pub fn required_text(field: &str, value: &str, max: usize) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max {
        return Err(AppError::validation(format!(
            "{field} must not exceed {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Costs travel as decimal amounts and are stored as integer cents.
pub fn cents_from_amount(amount: f64) -> AppResult<i64> {
    // decimal(10,2) upper bound
    const MAX_AMOUNT: f64 = 99_999_999.99;
    if !amount.is_finite() || amount < 0.0 || amount > MAX_AMOUNT {
        return Err(AppError::validation(
            "Cost must be a non-negative amount below 100000000",
        ));
    }
    Ok((amount * 100.0).round() as i64)
}

pub fn amount_from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_accepts() {
        assert_eq!(required_text("Name", "  Laptop Repair ", NAME_MAX).unwrap(), "Laptop Repair");
    }

    #[test]
    fn rejects_blank() {
        let err = required_text("Name", "   ", NAME_MAX).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Name is required");
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let cyrillic = "з".repeat(NAME_MAX);
        assert!(required_text("Name", &cyrillic, NAME_MAX).is_ok());
        let too_long = "a".repeat(NAME_MAX + 1);
        assert!(required_text("Name", &too_long, NAME_MAX).is_err());
    }

    #[test]
    fn cost_conversion() {
        assert_eq!(cents_from_amount(123.45).unwrap(), 12345);
        assert_eq!(cents_from_amount(0.1 + 0.2).unwrap(), 30);
        assert_eq!(amount_from_cents(1999), 19.99);
    }

    #[test]
    fn rejects_negative_or_nan_cost() {
        assert!(cents_from_amount(-1.0).is_err());
        assert!(cents_from_amount(f64::NAN).is_err());
        assert!(cents_from_amount(1e12).is_err());
    }
}
