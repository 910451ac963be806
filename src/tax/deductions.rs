use crate::error::ValidationError;
use crate::rules::TaxRuleVersion;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest number of members accepted in any one dependent category.
pub const MAX_DEPENDENT_COUNT: i64 = 1000;

/// Household members that drive deductions. Counts arrive as signed integers
/// from callers and are validated before use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdComposition {
    pub has_spouse: bool,
    pub adult_children: i64,
    pub parents: i64,
    pub disabled_dependents: i64,
    pub other_dependents: i64,
}

impl HouseholdComposition {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let counts = [
            ("adult_children", self.adult_children),
            ("parents", self.parents),
            ("disabled_dependents", self.disabled_dependents),
            ("other_dependents", self.other_dependents),
        ];
        for (field, value) in counts {
            if value < 0 {
                return Err(ValidationError::NegativeCount { field, value });
            }
            if value > MAX_DEPENDENT_COUNT {
                return Err(ValidationError::CountTooLarge {
                    field,
                    value,
                    max: MAX_DEPENDENT_COUNT,
                });
            }
        }
        Ok(())
    }
}

/// Per-category deduction amounts in the rule table's native unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeductionBreakdown {
    pub funeral: Decimal,
    pub spouse: Decimal,
    pub adult_children: Decimal,
    pub parents: Decimal,
    pub disabled_dependents: Decimal,
    pub other_dependents: Decimal,
}

impl DeductionBreakdown {
    /// Portion driven by dependent counts (excludes the flat funeral and spouse terms).
    pub fn dependents(&self) -> Decimal {
        self.adult_children + self.parents + self.disabled_dependents + self.other_dependents
    }

    pub fn total(&self) -> Decimal {
        self.funeral + self.spouse + self.dependents()
    }

    pub fn map(&self, f: impl Fn(Decimal) -> Decimal) -> DeductionBreakdown {
        DeductionBreakdown {
            funeral: f(self.funeral),
            spouse: f(self.spouse),
            adult_children: f(self.adult_children),
            parents: f(self.parents),
            disabled_dependents: f(self.disabled_dependents),
            other_dependents: f(self.other_dependents),
        }
    }
}

/// Deductions a household is entitled to under `version`.
pub fn compute_deductions(
    household: &HouseholdComposition,
    version: &TaxRuleVersion,
) -> Result<DeductionBreakdown, ValidationError> {
    household.validate()?;

    let breakdown = DeductionBreakdown {
        funeral: version.funeral_expense,
        spouse: if household.has_spouse {
            version.spouse_deduction
        } else {
            Decimal::ZERO
        },
        adult_children: Decimal::from(household.adult_children) * version.adult_child_deduction,
        parents: Decimal::from(household.parents) * version.parent_deduction,
        disabled_dependents: Decimal::from(household.disabled_dependents)
            * version.disabled_dependent_deduction,
        other_dependents: Decimal::from(household.other_dependents)
            * version.other_dependent_deduction,
    };
    log::debug!(
        "Deductions under {}: {:?} total={}",
        version.version_id,
        breakdown,
        breakdown.total()
    );
    Ok(breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::version::fixtures::version;
    use rust_decimal_macros::dec;

    fn household(spouse: bool, children: i64, parents: i64, disabled: i64, other: i64) -> HouseholdComposition {
        HouseholdComposition {
            has_spouse: spouse,
            adult_children: children,
            parents,
            disabled_dependents: disabled,
            other_dependents: other,
        }
    }

    #[test]
    fn spouse_and_two_children() {
        let v = version("v1", "2024-01-01");
        let deductions = compute_deductions(&household(true, 2, 0, 0, 0), &v).unwrap();
        assert_eq!(deductions.total(), dec!(803));
        assert_eq!(deductions.spouse, dec!(553));
        assert_eq!(deductions.adult_children, dec!(112));
    }

    #[test]
    fn funeral_expense_always_applies() {
        let v = version("v1", "2024-01-01");
        let deductions = compute_deductions(&HouseholdComposition::default(), &v).unwrap();
        assert_eq!(deductions.total(), dec!(138));
        assert_eq!(deductions.dependents(), Decimal::ZERO);
    }

    #[test]
    fn every_category_is_counted() {
        let v = version("v1", "2024-01-01");
        let deductions = compute_deductions(&household(false, 1, 2, 1, 3), &v).unwrap();
        assert_eq!(deductions.parents, dec!(276));
        assert_eq!(deductions.disabled_dependents, dec!(693));
        assert_eq!(deductions.other_dependents, dec!(168));
        assert_eq!(deductions.total(), dec!(138) + dec!(56) + dec!(276) + dec!(693) + dec!(168));
    }

    #[test]
    fn doubling_counts_doubles_dependent_portion_only() {
        let v = version("v1", "2024-01-01");
        let single = compute_deductions(&household(true, 1, 2, 1, 3), &v).unwrap();
        let double = compute_deductions(&household(true, 2, 4, 2, 6), &v).unwrap();
        assert_eq!(double.dependents(), single.dependents() * dec!(2));
        assert_eq!(double.funeral, single.funeral);
        assert_eq!(double.spouse, single.spouse);
    }

    #[test]
    fn category_order_does_not_matter() {
        let v = version("v1", "2024-01-01");
        let parts = [
            compute_deductions(&household(false, 3, 0, 0, 0), &v).unwrap().dependents(),
            compute_deductions(&household(false, 0, 2, 0, 0), &v).unwrap().dependents(),
            compute_deductions(&household(false, 0, 0, 1, 0), &v).unwrap().dependents(),
            compute_deductions(&household(false, 0, 0, 0, 4), &v).unwrap().dependents(),
        ];
        let combined = compute_deductions(&household(false, 3, 2, 1, 4), &v).unwrap();
        assert_eq!(combined.dependents(), parts.iter().rev().copied().sum::<Decimal>());
    }

    #[test]
    fn negative_count_is_rejected() {
        let v = version("v1", "2024-01-01");
        assert_eq!(
            compute_deductions(&household(true, -1, 0, 0, 0), &v),
            Err(ValidationError::NegativeCount {
                field: "adult_children",
                value: -1
            })
        );
        assert_eq!(
            compute_deductions(&household(false, 0, 0, 0, -3), &v),
            Err(ValidationError::NegativeCount {
                field: "other_dependents",
                value: -3
            })
        );
    }

    #[test]
    fn oversized_count_is_rejected() {
        let v = version("v1", "2024-01-01");
        assert!(compute_deductions(&household(false, 0, MAX_DEPENDENT_COUNT, 0, 0), &v).is_ok());
        assert_eq!(
            compute_deductions(&household(false, 0, 0, i64::MAX, 0), &v),
            Err(ValidationError::CountTooLarge {
                field: "disabled_dependents",
                value: i64::MAX,
                max: MAX_DEPENDENT_COUNT
            })
        );
    }
}
