//! Liquidity diagnostic: from household and net assets to a recommended cash
//! reserve covering the estimated estate tax.

use crate::error::{EngineResult, ValidationError};
use crate::rules::{RuleSelector, TaxRuleCatalog};
use crate::tax::{
    bracket_slices, compute_deductions, compute_gift_tax, compute_tax, BracketSlice,
    DeductionBreakdown, HouseholdComposition,
};
use crate::units::{round_display, UnitFactor};
use crate::warnings::Warning;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

pub const MIN_BUFFER_OVERRIDE: Decimal = Decimal::ONE;
pub const MAX_BUFFER_OVERRIDE: Decimal = dec!(1.5);
/// Largest gross asset, liability or gift figure accepted, in display units.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000000);
/// Reserves are rounded to cents unless configured otherwise.
pub const DEFAULT_DISPLAY_PRECISION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRequest {
    /// Display unit.
    pub gross_assets: Decimal,
    /// Display unit.
    pub liabilities: Decimal,
    pub household: HouseholdComposition,
    pub rules: RuleSelector,
    /// Must lie within [1.0, 1.5] when given.
    pub buffer_override: Option<Decimal>,
}

/// Outcome of one diagnostic. Every amount is in the caller's display unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticResult {
    pub version_id: String,
    pub effective_from: NaiveDate,
    pub unit_factor: UnitFactor,
    pub net_assets: Decimal,
    pub exempt_amount: Decimal,
    pub deductions: DeductionBreakdown,
    pub deductions_total: Decimal,
    pub taxable_base: Decimal,
    pub tax_amount: Decimal,
    /// Tax over net assets, 6 decimal places; zero when there are no net assets.
    pub effective_rate: Decimal,
    pub buffer_multiplier_used: Decimal,
    pub recommended_reserve: Decimal,
    pub slices: Vec<BracketSlice>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftRequest {
    /// Display unit.
    pub amount: Decimal,
    pub rules: RuleSelector,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GiftResult {
    pub version_id: String,
    pub gifts: Decimal,
    pub annual_exemption: Decimal,
    pub taxable: Decimal,
    pub tax_amount: Decimal,
    pub slices: Vec<BracketSlice>,
    pub warnings: Vec<Warning>,
}

/// Runs diagnostics against one catalog snapshot.
#[derive(Debug, Clone, Copy)]
pub struct LiquidityDiagnostic<'a> {
    catalog: &'a TaxRuleCatalog,
    display_precision: u32,
}

impl<'a> LiquidityDiagnostic<'a> {
    pub fn new(catalog: &'a TaxRuleCatalog) -> Self {
        LiquidityDiagnostic {
            catalog,
            display_precision: DEFAULT_DISPLAY_PRECISION,
        }
    }

    /// Decimal places of the smallest display unit the reserve is rounded to.
    pub fn with_display_precision(mut self, decimal_places: u32) -> Self {
        self.display_precision = decimal_places;
        self
    }

    pub fn diagnose(&self, request: &DiagnosticRequest) -> EngineResult<DiagnosticResult> {
        check_amount("gross_assets", request.gross_assets)?;
        check_amount("liabilities", request.liabilities)?;
        request.household.validate()?;
        if let Some(buffer) = request.buffer_override {
            check_buffer(buffer)?;
        }

        let selection = self.catalog.select(&request.rules)?;
        let version = selection.version;
        let unit = version.unit_factor;

        let net_assets = (request.gross_assets - request.liabilities).max(Decimal::ZERO);
        let net_native = unit.to_native(net_assets);
        let deductions = compute_deductions(&request.household, version)?;
        let taxable_base =
            (net_native - version.exempt_amount - deductions.total()).max(Decimal::ZERO);
        let tax_amount = unit.to_display(compute_tax(taxable_base, &version.brackets));

        let buffer = request
            .buffer_override
            .unwrap_or(version.default_buffer_multiplier);
        let recommended_reserve = round_display(tax_amount * buffer, self.display_precision);

        let effective_rate = if net_assets.is_zero() {
            Decimal::ZERO
        } else {
            (tax_amount / net_assets).round_dp(6)
        };

        log::debug!(
            "Diagnostic under {}: net={} base(native)={} tax={} buffer={} reserve={}",
            version.version_id,
            net_assets,
            taxable_base,
            tax_amount,
            buffer,
            recommended_reserve
        );

        let deductions = deductions.map(|amount| unit.to_display(amount));
        Ok(DiagnosticResult {
            version_id: version.version_id.clone(),
            effective_from: version.effective_from,
            unit_factor: unit,
            net_assets,
            exempt_amount: unit.to_display(version.exempt_amount),
            deductions_total: deductions.total(),
            deductions,
            taxable_base: unit.to_display(taxable_base),
            tax_amount,
            effective_rate,
            buffer_multiplier_used: buffer,
            recommended_reserve,
            slices: bracket_slices(taxable_base, &version.brackets)
                .iter()
                .map(|slice| slice.scale(|amount| unit.to_display(amount)))
                .collect(),
            warnings: selection.warning.into_iter().collect(),
        })
    }

    pub fn gift(&self, request: &GiftRequest) -> EngineResult<GiftResult> {
        check_amount("gifts", request.amount)?;

        let selection = self.catalog.select(&request.rules)?;
        let version = selection.version;
        let unit = version.unit_factor;
        let gift = compute_gift_tax(unit.to_native(request.amount), version)?;

        Ok(GiftResult {
            version_id: version.version_id.clone(),
            gifts: request.amount,
            annual_exemption: unit.to_display(gift.annual_exemption),
            taxable: unit.to_display(gift.taxable),
            tax_amount: unit.to_display(gift.tax),
            slices: gift
                .slices
                .iter()
                .map(|slice| slice.scale(|amount| unit.to_display(amount)))
                .collect(),
            warnings: selection.warning.into_iter().collect(),
        })
    }
}

fn check_amount(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount { field, value });
    }
    if value > MAX_AMOUNT {
        return Err(ValidationError::AmountTooLarge {
            field,
            value,
            max: MAX_AMOUNT,
        });
    }
    Ok(())
}

fn check_buffer(value: Decimal) -> Result<(), ValidationError> {
    if value < MIN_BUFFER_OVERRIDE || value > MAX_BUFFER_OVERRIDE {
        return Err(ValidationError::BufferOutOfRange {
            value,
            min: MIN_BUFFER_OVERRIDE,
            max: MAX_BUFFER_OVERRIDE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::rules::version::fixtures::version;
    use crate::rules::version::MAX_DEFAULT_BUFFER;
    use crate::rules::{Bracket, UpperBound, MAX_RULE_AMOUNT};
    use crate::tax::MAX_DEPENDENT_COUNT;
    use crate::units::{MAX_UNIT_FACTOR, MIN_UNIT_FACTOR};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn catalog() -> TaxRuleCatalog {
        TaxRuleCatalog::new(vec![version("2020", "2020-01-01"), version("2024", "2024-01-01")])
            .unwrap()
    }

    fn wan_catalog() -> TaxRuleCatalog {
        let mut v = version("wan", "2024-01-01");
        v.unit_factor = UnitFactor::new(dec!(10000)).unwrap();
        TaxRuleCatalog::new(vec![v]).unwrap()
    }

    fn request(net: Decimal) -> DiagnosticRequest {
        DiagnosticRequest {
            gross_assets: net,
            liabilities: Decimal::ZERO,
            household: HouseholdComposition {
                has_spouse: true,
                adult_children: 2,
                ..Default::default()
            },
            rules: RuleSelector::AsOf(date("2024-06-30")),
            buffer_override: None,
        }
    }

    #[test]
    fn spouse_and_two_children_with_ten_thousand_net() {
        let catalog = catalog();
        let result = LiquidityDiagnostic::new(&catalog)
            .diagnose(&request(dec!(10000)))
            .unwrap();
        assert_eq!(result.version_id, "2024");
        assert_eq!(result.deductions_total, dec!(803));
        assert_eq!(result.taxable_base, dec!(7864));
        assert_eq!(result.tax_amount, dec!(898.55));
        assert_eq!(result.buffer_multiplier_used, dec!(1.10));
        // 898.55 * 1.10 = 988.405
        assert_eq!(result.recommended_reserve, dec!(988.41));
        assert!(result.warnings.is_empty());
        assert_eq!(result.slices.len(), 2);
    }

    #[test]
    fn zero_net_assets_owe_nothing() {
        let catalog = catalog();
        let result = LiquidityDiagnostic::new(&catalog)
            .diagnose(&request(Decimal::ZERO))
            .unwrap();
        assert_eq!(result.deductions_total, dec!(803));
        assert_eq!(result.taxable_base, Decimal::ZERO);
        assert_eq!(result.tax_amount, Decimal::ZERO);
        assert_eq!(result.recommended_reserve, Decimal::ZERO);
        assert_eq!(result.effective_rate, Decimal::ZERO);
        assert!(result.slices.is_empty());
    }

    #[test]
    fn buffer_override_is_applied_and_rounded() {
        let catalog = catalog();
        let mut req = request(dec!(10000));
        req.buffer_override = Some(dec!(1.2));
        let result = LiquidityDiagnostic::new(&catalog).diagnose(&req).unwrap();
        assert_eq!(result.buffer_multiplier_used, dec!(1.2));
        assert_eq!(result.recommended_reserve, dec!(1078.26));

        let whole = LiquidityDiagnostic::new(&catalog)
            .with_display_precision(0)
            .diagnose(&req)
            .unwrap();
        assert_eq!(whole.recommended_reserve, dec!(1078));
    }

    #[test]
    fn buffer_override_bounds_are_inclusive() {
        let catalog = catalog();
        let diagnostic = LiquidityDiagnostic::new(&catalog);
        for buffer in [dec!(1.0), dec!(1.5)] {
            let mut req = request(dec!(10000));
            req.buffer_override = Some(buffer);
            assert!(diagnostic.diagnose(&req).is_ok());
        }
        for buffer in [dec!(0.99), dec!(1.51), dec!(2)] {
            let mut req = request(dec!(10000));
            req.buffer_override = Some(buffer);
            assert_eq!(
                diagnostic.diagnose(&req),
                Err(EngineError::Validation(ValidationError::BufferOutOfRange {
                    value: buffer,
                    min: MIN_BUFFER_OVERRIDE,
                    max: MAX_BUFFER_OVERRIDE,
                }))
            );
        }
    }

    #[test]
    fn negative_inputs_are_rejected() {
        let catalog = catalog();
        let diagnostic = LiquidityDiagnostic::new(&catalog);

        let mut req = request(dec!(10000));
        req.household.adult_children = -1;
        assert_eq!(
            diagnostic.diagnose(&req),
            Err(EngineError::Validation(ValidationError::NegativeCount {
                field: "adult_children",
                value: -1
            }))
        );

        let mut req = request(dec!(10000));
        req.liabilities = dec!(-5);
        assert_eq!(
            diagnostic.diagnose(&req),
            Err(EngineError::Validation(ValidationError::NegativeAmount {
                field: "liabilities",
                value: dec!(-5)
            }))
        );
    }

    #[test]
    fn oversized_amount_is_rejected() {
        let catalog = catalog();
        let mut req = request(MAX_AMOUNT + Decimal::ONE);
        req.household = HouseholdComposition::default();
        assert!(matches!(
            LiquidityDiagnostic::new(&catalog).diagnose(&req),
            Err(EngineError::Validation(ValidationError::AmountTooLarge { .. }))
        ));
    }

    /// A table at the edge of what validation accepts. `ceiling` puts every
    /// deduction at its maximum, otherwise only the bracket bound is large.
    fn edge_catalog(factor: Decimal, ceiling: bool) -> TaxRuleCatalog {
        let deduction = if ceiling { MAX_RULE_AMOUNT } else { Decimal::ZERO };
        let schedule = vec![
            Bracket::new(UpperBound::Bounded(MAX_RULE_AMOUNT), Decimal::ONE),
            Bracket::new(UpperBound::Unbounded, Decimal::ONE),
        ];
        let mut v = version("edge", "2024-01-01");
        v.unit_factor = UnitFactor::new(factor).unwrap();
        v.exempt_amount = deduction;
        v.funeral_expense = deduction;
        v.spouse_deduction = deduction;
        v.adult_child_deduction = deduction;
        v.parent_deduction = deduction;
        v.disabled_dependent_deduction = deduction;
        v.other_dependent_deduction = deduction;
        v.brackets = schedule.clone();
        v.default_buffer_multiplier = MAX_DEFAULT_BUFFER;
        if let Some(gift) = v.gift.as_mut() {
            gift.annual_exemption = deduction;
            gift.brackets = schedule;
        }
        TaxRuleCatalog::new(vec![v]).unwrap()
    }

    #[test]
    fn accepted_tables_never_overflow() {
        let full_house = HouseholdComposition {
            has_spouse: true,
            adult_children: MAX_DEPENDENT_COUNT,
            parents: MAX_DEPENDENT_COUNT,
            disabled_dependents: MAX_DEPENDENT_COUNT,
            other_dependents: MAX_DEPENDENT_COUNT,
        };
        for factor in [MIN_UNIT_FACTOR, Decimal::ONE, MAX_UNIT_FACTOR] {
            for ceiling in [false, true] {
                let catalog = edge_catalog(factor, ceiling);
                let diagnostic = LiquidityDiagnostic::new(&catalog);
                for gross in [Decimal::ZERO, dec!(0.01), MAX_AMOUNT] {
                    for household in [HouseholdComposition::default(), full_house] {
                        let mut req = request(gross);
                        req.household = household;
                        let result = diagnostic.diagnose(&req).unwrap();
                        assert!(result.tax_amount <= result.net_assets);
                        assert!(result.recommended_reserve >= result.tax_amount);
                    }
                    let gift = diagnostic
                        .gift(&GiftRequest {
                            amount: gross,
                            rules: RuleSelector::AsOf(date("2024-06-30")),
                        })
                        .unwrap();
                    assert!(gift.tax_amount <= gross);
                }
            }
        }
    }

    #[test]
    fn liabilities_reduce_net_assets_but_not_below_zero() {
        let catalog = catalog();
        let diagnostic = LiquidityDiagnostic::new(&catalog);

        let mut req = request(dec!(12000));
        req.liabilities = dec!(2000);
        assert_eq!(diagnostic.diagnose(&req).unwrap().tax_amount, dec!(898.55));

        req.liabilities = dec!(20000);
        let result = diagnostic.diagnose(&req).unwrap();
        assert_eq!(result.net_assets, Decimal::ZERO);
        assert_eq!(result.tax_amount, Decimal::ZERO);
    }

    #[test]
    fn ten_thousand_unit_table_reports_display_units() {
        let catalog = wan_catalog();
        let result = LiquidityDiagnostic::new(&catalog)
            .diagnose(&request(dec!(100000000)))
            .unwrap();
        assert_eq!(result.deductions_total, dec!(8030000));
        assert_eq!(result.exempt_amount, dec!(13330000));
        assert_eq!(result.taxable_base, dec!(78640000));
        assert_eq!(result.tax_amount, dec!(8985500));
        assert_eq!(result.recommended_reserve, dec!(9884050));
        assert_eq!(result.slices[0].upper, UpperBound::Bounded(dec!(56210000)));
    }

    #[test]
    fn unknown_version_id_is_not_substituted() {
        let catalog = catalog();
        let mut req = request(dec!(10000));
        req.rules = RuleSelector::Version("1999".to_string());
        assert_eq!(
            LiquidityDiagnostic::new(&catalog).diagnose(&req),
            Err(EngineError::RuleVersionNotFound("1999".to_string()))
        );
    }

    #[test]
    fn stale_date_is_flagged_in_result() {
        let catalog = catalog();
        let mut req = request(dec!(10000));
        req.rules = RuleSelector::AsOf(date("2010-01-01"));
        let result = LiquidityDiagnostic::new(&catalog).diagnose(&req).unwrap();
        assert_eq!(result.version_id, "2020");
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn gift_estimate_in_display_units() {
        let catalog = wan_catalog();
        let result = LiquidityDiagnostic::new(&catalog)
            .gift(&GiftRequest {
                amount: dec!(32440000),
                rules: RuleSelector::Version("wan".to_string()),
            })
            .unwrap();
        assert_eq!(result.annual_exemption, dec!(2440000));
        assert_eq!(result.taxable, dec!(30000000));
        assert_eq!(result.tax_amount, dec!(3250000));
    }
}
