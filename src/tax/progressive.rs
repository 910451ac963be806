use crate::rules::{Bracket, UpperBound};
use rust_decimal::Decimal;
use serde::Serialize;

/// The part of a taxable base that falls inside one bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BracketSlice {
    pub lower: Decimal,
    pub upper: UpperBound,
    pub rate: Decimal,
    /// Amount of the base taxed at `rate`.
    pub amount: Decimal,
    pub tax: Decimal,
}

impl BracketSlice {
    pub fn scale(&self, f: impl Fn(Decimal) -> Decimal) -> BracketSlice {
        BracketSlice {
            lower: f(self.lower),
            upper: self.upper.map(&f),
            rate: self.rate,
            amount: f(self.amount),
            tax: f(self.tax),
        }
    }
}

/// Walk an ordered, open-ended schedule and split `base` into taxed slices.
/// Bases of zero or less produce no slices.
pub fn bracket_slices(base: Decimal, brackets: &[Bracket]) -> Vec<BracketSlice> {
    let mut slices = Vec::new();
    let mut lower = Decimal::ZERO;
    for bracket in brackets {
        if base <= lower {
            break;
        }
        let amount = bracket.upper.cap(base) - lower;
        let tax = amount * bracket.rate;
        log::debug!(
            "Bracket {}..{} @ {}: {} taxed -> {}",
            lower,
            bracket.upper,
            bracket.rate,
            amount,
            tax
        );
        slices.push(BracketSlice {
            lower,
            upper: bracket.upper,
            rate: bracket.rate,
            amount,
            tax,
        });
        match bracket.upper {
            UpperBound::Bounded(bound) => lower = bound,
            UpperBound::Unbounded => break,
        }
    }
    slices
}

/// Progressive tax on `base`; zero when `base <= 0`.
pub fn compute_tax(base: Decimal, brackets: &[Bracket]) -> Decimal {
    bracket_slices(base, brackets)
        .iter()
        .map(|slice| slice.tax)
        .sum()
}
