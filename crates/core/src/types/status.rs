//! Roles and status lifecycles.
//!
//! Checkout and payment statuses are small state machines. Every status
//! change goes through `can_transition_to`, so the HTTP layer, the CLI and the
//! stores all agree on which moves are legal.

use serde::{Deserialize, Serialize};

/// Error returned when a role or status string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

impl ParseStatusError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Lifecycle of a checkout.
///
/// ```text
/// Pending ──► Completed
///    │
///    └──────► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "checkout_status"))]
pub enum CheckoutStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl CheckoutStatus {
    /// Whether moving from `self` to `next` is allowed.
    ///
    /// Terminal states accept nothing, and a status never transitions to
    /// itself.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed | Self::Cancelled)
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for CheckoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CheckoutStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(ParseStatusError::new("checkout status", other)),
        }
    }
}

/// Review state of an uploaded payment proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "payment_status"))]
pub enum PaymentStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

impl PaymentStatus {
    /// Whether moving from `self` to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!((self, next), (Self::Pending, Self::Verified | Self::Rejected))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Verified => "Verified",
            Self::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Pending" => Ok(Self::Pending),
            "Verified" => Ok(Self::Verified),
            "Rejected" => Ok(Self::Rejected),
            other => Err(ParseStatusError::new("payment status", other)),
        }
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Shops, owns a cart, places checkouts.
    #[default]
    Customer,
    /// Manages the catalog and reviews checkouts and payments.
    Admin,
}

impl UserRole {
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseStatusError::new("user role", s)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_transitions() {
        use CheckoutStatus::{Cancelled, Completed, Pending};

        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Cancelled));
    }

    #[test]
    fn test_payment_transitions() {
        use PaymentStatus::{Pending, Rejected, Verified};

        assert!(Pending.can_transition_to(Verified));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Verified.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Verified));
        assert!(!Verified.can_transition_to(Verified));
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(
            " Completed ".parse::<CheckoutStatus>().unwrap(),
            CheckoutStatus::Completed
        );
        assert!("completed".parse::<CheckoutStatus>().is_err());
        assert!("Shipped".parse::<CheckoutStatus>().is_err());
        assert_eq!(
            "Verified".parse::<PaymentStatus>().unwrap(),
            PaymentStatus::Verified
        );
        let err = "Lost".parse::<PaymentStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid payment status: Lost");
    }

    #[test]
    fn test_role_round_trips_through_strings() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(UserRole::Customer.to_string(), "customer");
        assert_eq!(
            serde_json::to_string(&UserRole::Admin).unwrap(),
            "\"admin\""
        );
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_status_serializes_capitalized() {
        assert_eq!(
            serde_json::to_string(&CheckoutStatus::Pending).unwrap(),
            "\"Pending\""
        );
    }
}
