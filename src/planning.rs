//! Rule-based planning notes that accompany a diagnostic.

use crate::diagnostic::DiagnosticResult;
use crate::tax::HouseholdComposition;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

const HIGH_TAX_RATIO: Decimal = dec!(0.15);
const REAL_ESTATE_HEAVY: Decimal = dec!(0.5);
const BUSINESS_HEAVY: Decimal = dec!(0.3);
const MAX_NOTES: usize = 5;

/// Composition of the estate by asset type, display unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMix {
    pub financial: Decimal,
    pub real_estate: Decimal,
    pub business: Decimal,
}

impl AssetMix {
    fn total(&self) -> Decimal {
        self.financial.max(Decimal::ZERO)
            + self.real_estate.max(Decimal::ZERO)
            + self.business.max(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum PlanningNote {
    /// Reserve pool sized as a percentage range of the estimated tax.
    ReservePool { min_pct: u32, max_pct: u32 },
    /// Spouse provided for first, remaining assets passed on to children over time.
    LayeredBeneficiaries,
    /// Several heirs: fix beneficiary ratios and oversight up front.
    BeneficiaryRatios,
    RealEstateHeavy,
    BusinessHeavy,
    DocumentSet,
}

impl fmt::Display for PlanningNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanningNote::ReservePool { min_pct, max_pct } => write!(
                f,
                "Set aside a dedicated tax reserve covering {min_pct}%-{max_pct}% of the estimated tax so assets need not be sold under time pressure."
            ),
            PlanningNote::LayeredBeneficiaries => write!(
                f,
                "Layer beneficiaries: secure near-term cash flow for the spouse and transfer long-term assets to the children gradually."
            ),
            PlanningNote::BeneficiaryRatios => write!(
                f,
                "Several beneficiaries: agree allocation ratios and an oversight mechanism early to avoid disputes."
            ),
            PlanningNote::RealEstateHeavy => write!(
                f,
                "Real estate dominates the estate: fund the tax from a trust or insurance reserve to avoid forced short-term sales."
            ),
            PlanningNote::BusinessHeavy => write!(
                f,
                "Significant company holdings: pair the plan with a shareholder agreement and family governance charter."
            ),
            PlanningNote::DocumentSet => write!(
                f,
                "Keep a complete document set: will, healthcare directive, beneficiary designations and trust terms."
            ),
        }
    }
}

pub fn planning_notes(
    result: &DiagnosticResult,
    household: &HouseholdComposition,
    assets: Option<&AssetMix>,
) -> Vec<PlanningNote> {
    let mut notes = Vec::new();

    if result.tax_amount > Decimal::ZERO {
        let ratio = if result.net_assets > Decimal::ZERO {
            result.tax_amount / result.net_assets
        } else {
            Decimal::ZERO
        };
        notes.push(if ratio >= HIGH_TAX_RATIO {
            PlanningNote::ReservePool {
                min_pct: 100,
                max_pct: 120,
            }
        } else {
            PlanningNote::ReservePool {
                min_pct: 80,
                max_pct: 100,
            }
        });
    }

    if household.has_spouse && household.adult_children >= 1 {
        notes.push(PlanningNote::LayeredBeneficiaries);
    } else if household.adult_children >= 2 {
        notes.push(PlanningNote::BeneficiaryRatios);
    }

    if let Some(mix) = assets {
        let total = mix.total();
        if total > Decimal::ZERO {
            if mix.real_estate / total >= REAL_ESTATE_HEAVY {
                notes.push(PlanningNote::RealEstateHeavy);
            }
            if mix.business / total >= BUSINESS_HEAVY {
                notes.push(PlanningNote::BusinessHeavy);
            }
        }
    }

    notes.push(PlanningNote::DocumentSet);
    notes.truncate(MAX_NOTES);
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{DiagnosticRequest, LiquidityDiagnostic};
    use crate::rules::version::fixtures::version;
    use crate::rules::{RuleSelector, TaxRuleCatalog};

    fn diagnose(net: Decimal, household: HouseholdComposition) -> DiagnosticResult {
        let catalog = TaxRuleCatalog::new(vec![version("v1", "2024-01-01")]).unwrap();
        LiquidityDiagnostic::new(&catalog)
            .diagnose(&DiagnosticRequest {
                gross_assets: net,
                liabilities: Decimal::ZERO,
                household,
                rules: RuleSelector::Version("v1".to_string()),
                buffer_override: None,
            })
            .unwrap()
    }

    fn family(spouse: bool, children: i64) -> HouseholdComposition {
        HouseholdComposition {
            has_spouse: spouse,
            adult_children: children,
            ..Default::default()
        }
    }

    #[test]
    fn no_tax_means_no_reserve_note() {
        let household = family(false, 0);
        let notes = planning_notes(&diagnose(dec!(500), household), &household, None);
        assert_eq!(notes, vec![PlanningNote::DocumentSet]);
    }

    #[test]
    fn modest_tax_ratio_gets_lower_coverage_band() {
        // tax 898.55 on 10000 net is under 15%
        let household = family(true, 2);
        let notes = planning_notes(&diagnose(dec!(10000), household), &household, None);
        assert_eq!(
            notes,
            vec![
                PlanningNote::ReservePool {
                    min_pct: 80,
                    max_pct: 100
                },
                PlanningNote::LayeredBeneficiaries,
                PlanningNote::DocumentSet,
            ]
        );
    }

    #[test]
    fn heavy_tax_ratio_gets_full_coverage_band() {
        let household = family(false, 0);
        let result = diagnose(dec!(1000000), household);
        let notes = planning_notes(&result, &household, None);
        assert_eq!(
            notes[0],
            PlanningNote::ReservePool {
                min_pct: 100,
                max_pct: 120
            }
        );
    }

    #[test]
    fn several_children_without_spouse() {
        let household = family(false, 3);
        let notes = planning_notes(&diagnose(dec!(500), household), &household, None);
        assert!(notes.contains(&PlanningNote::BeneficiaryRatios));
        assert!(!notes.contains(&PlanningNote::LayeredBeneficiaries));
    }

    #[test]
    fn asset_mix_notes_and_cap() {
        let household = family(true, 1);
        let mix = AssetMix {
            financial: dec!(100),
            real_estate: dec!(600),
            business: dec!(300),
        };
        let notes = planning_notes(&diagnose(dec!(1000000), household), &household, Some(&mix));
        assert_eq!(notes.len(), 5);
        assert!(notes.contains(&PlanningNote::RealEstateHeavy));
        assert!(notes.contains(&PlanningNote::BusinessHeavy));
        assert_eq!(notes[4], PlanningNote::DocumentSet);
    }

    #[test]
    fn notes_render_as_text() {
        let note = PlanningNote::ReservePool {
            min_pct: 80,
            max_pct: 100,
        };
        assert!(note.to_string().contains("80%-100%"));
    }
}
