use crate::error::{RuleViolation, ViolationKind};
use crate::units::UnitFactor;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Serialize, Serializer};
use std::fmt;

/// Largest amount or bracket bound a rule table may hold, in its native unit.
pub const MAX_RULE_AMOUNT: Decimal = dec!(1000000000000000000);
pub const MIN_DEFAULT_BUFFER: Decimal = Decimal::ONE;
pub const MAX_DEFAULT_BUFFER: Decimal = dec!(10);

/// Upper edge of a progressive bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpperBound {
    Bounded(Decimal),
    Unbounded,
}

impl UpperBound {
    /// The portion of `base` that falls at or below this bound.
    pub fn cap(&self, base: Decimal) -> Decimal {
        match self {
            UpperBound::Bounded(bound) => base.min(*bound),
            UpperBound::Unbounded => base,
        }
    }

    pub fn map(self, f: impl FnOnce(Decimal) -> Decimal) -> UpperBound {
        match self {
            UpperBound::Bounded(bound) => UpperBound::Bounded(f(bound)),
            UpperBound::Unbounded => UpperBound::Unbounded,
        }
    }
}

impl fmt::Display for UpperBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpperBound::Bounded(bound) => write!(f, "{}", bound),
            UpperBound::Unbounded => write!(f, "∞"),
        }
    }
}

impl Serialize for UpperBound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            UpperBound::Bounded(bound) => Serialize::serialize(bound, serializer),
            UpperBound::Unbounded => serializer.serialize_str("inf"),
        }
    }
}

/// Marginal `rate` applied to the slice of the base between the previous
/// bracket's bound and `upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bracket {
    pub upper: UpperBound,
    pub rate: Decimal,
}

impl Bracket {
    pub fn new(upper: UpperBound, rate: Decimal) -> Self {
        Bracket { upper, rate }
    }
}

/// Annual gift exemption plus its own bracket schedule, in native units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GiftRules {
    pub annual_exemption: Decimal,
    pub brackets: Vec<Bracket>,
}

/// One dated, immutable rule set. Amounts are in the table's native unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxRuleVersion {
    pub version_id: String,
    pub effective_from: NaiveDate,
    pub unit_factor: UnitFactor,
    pub exempt_amount: Decimal,
    pub funeral_expense: Decimal,
    pub spouse_deduction: Decimal,
    pub adult_child_deduction: Decimal,
    pub parent_deduction: Decimal,
    pub disabled_dependent_deduction: Decimal,
    pub other_dependent_deduction: Decimal,
    pub brackets: Vec<Bracket>,
    pub default_buffer_multiplier: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gift: Option<GiftRules>,
}

impl TaxRuleVersion {
    /// Collect every invariant violation in this version.
    pub fn violations(&self) -> Vec<RuleViolation> {
        let mut kinds = Vec::new();

        if self.version_id.trim().is_empty() {
            kinds.push(ViolationKind::EmptyVersionId);
        }

        let amounts = [
            ("exempt_amount", self.exempt_amount),
            ("funeral_expense", self.funeral_expense),
            ("spouse_deduction", self.spouse_deduction),
            ("adult_child_deduction", self.adult_child_deduction),
            ("parent_deduction", self.parent_deduction),
            ("disabled_dependent_deduction", self.disabled_dependent_deduction),
            ("other_dependent_deduction", self.other_dependent_deduction),
        ];
        for (field, value) in amounts {
            kinds.extend(amount_violation(field, value));
        }

        let buffer = self.default_buffer_multiplier;
        if buffer < MIN_DEFAULT_BUFFER || buffer > MAX_DEFAULT_BUFFER {
            kinds.push(ViolationKind::DefaultBufferOutOfRange {
                value: buffer,
                min: MIN_DEFAULT_BUFFER,
                max: MAX_DEFAULT_BUFFER,
            });
        }

        kinds.extend(schedule_violations("estate", &self.brackets));

        if let Some(gift) = &self.gift {
            kinds.extend(amount_violation("gift.annual_exemption", gift.annual_exemption));
            kinds.extend(schedule_violations("gift", &gift.brackets));
        }

        kinds
            .into_iter()
            .map(|kind| RuleViolation::in_version(&self.version_id, kind))
            .collect()
    }
}

fn amount_violation(field: &'static str, value: Decimal) -> Option<ViolationKind> {
    if value < Decimal::ZERO {
        Some(ViolationKind::NegativeAmount { field, value })
    } else if value > MAX_RULE_AMOUNT {
        Some(ViolationKind::AmountTooLarge {
            field,
            value,
            max: MAX_RULE_AMOUNT,
        })
    } else {
        None
    }
}

/// Strictly increasing positive bounds, rates in [0, 1], open-ended final bracket.
pub fn schedule_violations(schedule: &'static str, brackets: &[Bracket]) -> Vec<ViolationKind> {
    let mut kinds = Vec::new();
    if brackets.is_empty() {
        kinds.push(ViolationKind::NoBrackets { schedule });
        return kinds;
    }

    let last = brackets.len() - 1;
    let mut previous: Option<Decimal> = None;
    for (index, bracket) in brackets.iter().enumerate() {
        if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
            kinds.push(ViolationKind::RateOutOfRange {
                schedule,
                index,
                rate: bracket.rate,
            });
        }
        match bracket.upper {
            UpperBound::Bounded(bound) => {
                if bound <= Decimal::ZERO {
                    kinds.push(ViolationKind::NonPositiveBound {
                        schedule,
                        index,
                        bound,
                    });
                }
                if bound > MAX_RULE_AMOUNT {
                    kinds.push(ViolationKind::BoundTooLarge {
                        schedule,
                        index,
                        bound,
                        max: MAX_RULE_AMOUNT,
                    });
                }
                if let Some(previous) = previous {
                    if bound <= previous {
                        kinds.push(ViolationKind::UnsortedBound {
                            schedule,
                            index,
                            bound,
                            previous,
                        });
                    }
                }
                previous = Some(bound);
            }
            UpperBound::Unbounded if index != last => {
                kinds.push(ViolationKind::UnboundedBeforeLast { schedule, index });
            }
            UpperBound::Unbounded => {}
        }
    }

    if brackets[last].upper != UpperBound::Unbounded {
        kinds.push(ViolationKind::MissingOpenEndedBracket { schedule });
    }
    kinds
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use rust_decimal_macros::dec;

    /// Illustrative rule set with a unit factor of 1.
    pub fn version(id: &str, effective_from: &str) -> TaxRuleVersion {
        TaxRuleVersion {
            version_id: id.to_string(),
            effective_from: NaiveDate::parse_from_str(effective_from, "%Y-%m-%d").unwrap(),
            unit_factor: UnitFactor::ONE,
            exempt_amount: dec!(1333),
            funeral_expense: dec!(138),
            spouse_deduction: dec!(553),
            adult_child_deduction: dec!(56),
            parent_deduction: dec!(138),
            disabled_dependent_deduction: dec!(693),
            other_dependent_deduction: dec!(56),
            brackets: brackets(),
            default_buffer_multiplier: dec!(1.10),
            gift: Some(GiftRules {
                annual_exemption: dec!(244),
                brackets: vec![
                    Bracket::new(UpperBound::Bounded(dec!(2500)), dec!(0.10)),
                    Bracket::new(UpperBound::Bounded(dec!(5000)), dec!(0.15)),
                    Bracket::new(UpperBound::Unbounded, dec!(0.20)),
                ],
            }),
        }
    }

    pub fn brackets() -> Vec<Bracket> {
        vec![
            Bracket::new(UpperBound::Bounded(dec!(5621)), dec!(0.10)),
            Bracket::new(UpperBound::Bounded(dec!(11242)), dec!(0.15)),
            Bracket::new(UpperBound::Unbounded, dec!(0.20)),
        ]
    }
}
