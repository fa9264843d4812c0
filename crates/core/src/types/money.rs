//! Decimal money amounts.
//!
//! The store prices everything in a single currency, so [`Money`] is a thin
//! wrapper over [`Decimal`] that keeps arithmetic exact and serializes as a
//! string (`"150000.00"`) to avoid float rounding in JSON clients.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when validating a [`Money`] amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is zero or negative where a positive value is required.
    #[error("amount must be greater than zero")]
    NonPositive,
    /// The amount could not be parsed as a decimal.
    #[error("invalid amount: {0}")]
    Invalid(String),
    /// More than [`Money::SCALE`] decimal places.
    #[error("amount must have at most 2 decimal places")]
    TooPrecise,
    /// At or above [`Money::LIMIT`].
    #[error("amount must be less than 1000000000000")]
    TooLarge,
    /// A total does not fit in a decimal.
    #[error("amount overflowed")]
    Overflow,
}

/// An exact monetary amount.
///
/// ```
/// use rust_decimal::Decimal;
/// use stepup_core::Money;
///
/// let price = Money::positive(Decimal::new(125_000, 0)).unwrap();
/// assert_eq!(price.times(2).unwrap(), Money::new(Decimal::new(250_000, 0)));
/// assert!(Money::positive(Decimal::ZERO).is_err());
/// assert!(Money::positive(Decimal::new(1, 3)).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Decimal places a price may carry, matching `NUMERIC(14, 2)`.
    pub const SCALE: u32 = 2;

    /// Exclusive upper bound for a price, matching `NUMERIC(14, 2)`.
    pub const LIMIT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

    /// Wrap a decimal without validation.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The zero amount.
    #[must_use]
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Wrap a decimal that must be strictly positive.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::NonPositive`] for zero or negative amounts,
    /// [`MoneyError::TooPrecise`] for fractions of a cent and
    /// [`MoneyError::TooLarge`] at or above [`Money::LIMIT`].
    pub fn positive(amount: Decimal) -> Result<Self, MoneyError> {
        if amount <= Decimal::ZERO {
            return Err(MoneyError::NonPositive);
        }
        if amount.normalize().scale() > Self::SCALE {
            return Err(MoneyError::TooPrecise);
        }
        if amount >= Self::LIMIT {
            return Err(MoneyError::TooLarge);
        }
        Ok(Self(amount))
    }

    /// Parse a positive amount from a string such as `"99.90"`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Invalid`] when the string is not a decimal and
    /// [`MoneyError::NonPositive`] when it is not greater than zero.
    pub fn parse_positive(s: &str) -> Result<Self, MoneyError> {
        let amount: Decimal = s
            .trim()
            .parse()
            .map_err(|_| MoneyError::Invalid(s.to_owned()))?;
        Self::positive(amount)
    }

    /// The underlying decimal.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply by a line-item quantity.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the product does not fit.
    pub fn times(self, quantity: u32) -> Result<Self, MoneyError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the sum does not fit.
    pub fn checked_add(self, rhs: Self) -> Result<Self, MoneyError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// Sum amounts, failing instead of wrapping or panicking.
    ///
    /// # Errors
    ///
    /// Returns the first error in `amounts`, or [`MoneyError::Overflow`].
    pub fn try_sum<I>(amounts: I) -> Result<Self, MoneyError>
    where
        I: IntoIterator<Item = Result<Self, MoneyError>>,
    {
        amounts
            .into_iter()
            .try_fold(Self::zero(), |total, amount| total.checked_add(amount?))
    }

    /// Whether the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

// NUMERIC columns
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_rejects_zero_and_negative() {
        assert_eq!(Money::positive(Decimal::ZERO), Err(MoneyError::NonPositive));
        assert_eq!(
            Money::positive(Decimal::new(-1, 0)),
            Err(MoneyError::NonPositive)
        );
        assert!(Money::positive(Decimal::new(1, 2)).is_ok());
    }

    #[test]
    fn test_positive_matches_column_bounds() {
        assert_eq!(
            Money::positive(Decimal::new(1, 3)),
            Err(MoneyError::TooPrecise)
        );
        // Trailing zeros are not extra precision.
        assert!(Money::positive(Decimal::new(12_500, 4)).is_ok());

        assert_eq!(Money::LIMIT, Decimal::new(1_000_000_000_000, 0));
        assert_eq!(Money::positive(Money::LIMIT), Err(MoneyError::TooLarge));
        assert_eq!(Money::positive(Decimal::MAX), Err(MoneyError::TooLarge));
        assert!(Money::positive(Decimal::new(99_999_999_999_999, 2)).is_ok());
    }

    #[test]
    fn test_arithmetic_overflow_is_an_error() {
        let huge = Money::new(Decimal::MAX);
        assert_eq!(huge.times(2), Err(MoneyError::Overflow));
        assert_eq!(huge.checked_add(huge), Err(MoneyError::Overflow));
        assert_eq!(
            Money::try_sum([Ok(huge), Ok(huge)]),
            Err(MoneyError::Overflow)
        );
    }

    #[test]
    fn test_parse_positive() {
        let m = Money::parse_positive(" 99.90 ").unwrap();
        assert_eq!(m.amount(), Decimal::new(9990, 2));
        assert!(matches!(
            Money::parse_positive("abc"),
            Err(MoneyError::Invalid(_))
        ));
    }

    #[test]
    fn test_line_totals_sum_exactly() {
        let lines = [
            Money::new(Decimal::new(1999, 2)).times(3),
            Money::new(Decimal::new(1, 2)).times(1),
        ];
        let total = Money::try_sum(lines).unwrap();
        assert_eq!(total.amount(), Decimal::new(5998, 2));
        assert_eq!(total.to_string(), "59.98");
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&Money::new(Decimal::new(15000, 2))).unwrap();
        assert_eq!(json, "\"150.00\"");
        let back: Money = serde_json::from_str("\"150.00\"").unwrap();
        assert_eq!(back.amount(), Decimal::new(15000, 2));
    }
}
