//! Exact scaling between the caller's display unit and a rule table's native unit.
//!
//! A rule table authored in "ten-thousand" units has a unit factor of 10000:
//! one native unit is worth 10000 display units.
//!
//! Factors are limited to [`MIN_UNIT_FACTOR`, `MAX_UNIT_FACTOR`]. Together with
//! the amount ceilings on rule tables and requests this keeps every scaled
//! figure well inside `Decimal`'s range. The round trip is exact as long as the
//! scaled amount fits in 28 significant digits, which holds for every request
//! amount of up to 20 significant digits under a power-of-ten factor.

use crate::error::ViolationKind;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Serialize, Serializer};
use std::fmt;

pub const MIN_UNIT_FACTOR: Decimal = dec!(0.000001);
pub const MAX_UNIT_FACTOR: Decimal = dec!(1000000);

/// Positive scale factor whose reciprocal is an exact decimal, so that
/// `to_display(to_native(x)) == x` holds without drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitFactor {
    factor: Decimal,
    reciprocal: Decimal,
}

impl UnitFactor {
    pub const ONE: UnitFactor = UnitFactor {
        factor: Decimal::ONE,
        reciprocal: Decimal::ONE,
    };

    pub fn new(factor: Decimal) -> Result<Self, ViolationKind> {
        if factor <= Decimal::ZERO {
            return Err(ViolationKind::NonPositiveUnitFactor(factor));
        }
        if factor < MIN_UNIT_FACTOR || factor > MAX_UNIT_FACTOR {
            return Err(ViolationKind::UnitFactorOutOfRange {
                factor,
                min: MIN_UNIT_FACTOR,
                max: MAX_UNIT_FACTOR,
            });
        }
        let reciprocal = Decimal::ONE
            .checked_div(factor)
            .ok_or(ViolationKind::InexactUnitFactor(factor))?;
        match reciprocal.checked_mul(factor) {
            Some(product) if product == Decimal::ONE => Ok(UnitFactor {
                factor,
                reciprocal: reciprocal.normalize(),
            }),
            _ => Err(ViolationKind::InexactUnitFactor(factor)),
        }
    }

    pub fn value(&self) -> Decimal {
        self.factor
    }

    /// Display unit -> native unit.
    pub fn to_native(&self, amount: Decimal) -> Decimal {
        amount * self.reciprocal
    }

    /// Native unit -> display unit, without trailing zeros.
    pub fn to_display(&self, amount: Decimal) -> Decimal {
        (amount * self.factor).normalize()
    }
}

impl fmt::Display for UnitFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.factor)
    }
}

impl Serialize for UnitFactor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&self.factor, serializer)
    }
}

/// Round half-up to `decimal_places`. Amounts handled here are never negative,
/// so midpoint-away-from-zero is half-up.
pub fn round_display(amount: Decimal, decimal_places: u32) -> Decimal {
    amount
        .round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}
