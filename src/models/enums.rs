//! Closed value sets stored as short strings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Role {
    #[sea_orm(string_value = "User")]
    User,
    #[sea_orm(string_value = "Manager")]
    Manager,
    #[sea_orm(string_value = "Admin")]
    Admin,
}

impl Role {
    /// Managers and admins work the queue; plain users are clients.
    pub fn is_staff(self) -> bool {
        match self {
            Role::Manager | Role::Admin => true,
            Role::User => false,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum OrderStatus {
    #[sea_orm(string_value = "New")]
    New,
    #[sea_orm(string_value = "Processing")]
    Processing,
    #[sea_orm(string_value = "Completed")]
    Completed,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub fn is_closed(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum RequestStatus {
    #[sea_orm(string_value = "New")]
    New,
    #[sea_orm(string_value = "Processing")]
    Processing,
    #[sea_orm(string_value = "Completed")]
    Completed,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl RequestStatus {
    pub fn is_open(self) -> bool {
        matches!(self, RequestStatus::New | RequestStatus::Processing)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Priority {
    #[sea_orm(string_value = "Low")]
    Low,
    #[default]
    #[sea_orm(string_value = "Medium")]
    Medium,
    #[sea_orm(string_value = "High")]
    High,
}

/// Case-insensitive parse over the variant names, shared by every enum above.
macro_rules! name_parsing {
    ($ty:ident, $label:literal, [$($variant:ident),+ $(,)?]) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => stringify!($variant),)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case(stringify!($variant)) {
                        return Ok($ty::$variant);
                    }
                )+
                Err(format!(
                    "Invalid {} '{}'. Must be one of: {}",
                    $label,
                    s,
                    [$(stringify!($variant)),+].join(", ")
                ))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

name_parsing!(Role, "role", [User, Manager, Admin]);
name_parsing!(OrderStatus, "status", [New, Processing, Completed, Cancelled]);
name_parsing!(RequestStatus, "status", [New, Processing, Completed, Cancelled]);
name_parsing!(Priority, "priority", [Low, Medium, High]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("completed".parse::<OrderStatus>(), Ok(OrderStatus::Completed));
        assert_eq!(" HIGH ".parse::<Priority>(), Ok(Priority::High));
        assert_eq!("manager".parse::<Role>(), Ok(Role::Manager));
        assert_eq!("Cancelled".parse::<RequestStatus>(), Ok(RequestStatus::Cancelled));
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "Done".parse::<OrderStatus>().unwrap_err();
        assert!(err.contains("New, Processing, Completed, Cancelled"));
        assert!("".parse::<Priority>().is_err());
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn display_matches_stored_value() {
        assert_eq!(Role::Admin.to_string(), "Admin");
        assert_eq!(OrderStatus::Processing.to_value(), "Processing");
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn staff_roles() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Manager.is_staff());
        assert!(!Role::User.is_staff());
    }
}
