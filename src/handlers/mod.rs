pub mod auth;
pub mod health;
pub mod order;
pub mod report;
pub mod service_request;
pub mod support_request;
pub mod user;

use crate::error::{AppError, AppResult};
use crate::utils::cents_from_amount;
use std::str::FromStr;

/// Parse an optional enum name; blank counts as absent, anything unknown is a 400.
pub(crate) fn parse_optional<T>(raw: Option<&str>) -> AppResult<Option<T>>
where
    T: FromStr<Err = String>,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => name.parse().map(Some).map_err(AppError::Validation),
    }
}

pub(crate) fn optional_cents(amount: Option<f64>) -> AppResult<Option<i64>> {
    amount.map(cents_from_amount).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderStatus, Priority};

    #[test]
    fn blank_enum_is_absent() {
        assert_eq!(parse_optional::<Priority>(None).unwrap(), None);
        assert_eq!(parse_optional::<Priority>(Some("  ")).unwrap(), None);
    }

    #[test]
    fn known_enum_parses_and_unknown_is_rejected() {
        assert_eq!(
            parse_optional::<OrderStatus>(Some("completed")).unwrap(),
            Some(OrderStatus::Completed)
        );
        assert!(matches!(
            parse_optional::<OrderStatus>(Some("Finished")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn optional_cost() {
        assert_eq!(optional_cents(Some(12.5)).unwrap(), Some(1250));
        assert_eq!(optional_cents(None).unwrap(), None);
        assert!(optional_cents(Some(-3.0)).is_err());
    }
}
