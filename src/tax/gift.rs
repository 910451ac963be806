use crate::error::{EngineError, EngineResult};
use crate::rules::TaxRuleVersion;
use crate::tax::progressive::{bracket_slices, BracketSlice};
use rust_decimal::Decimal;

/// Gift tax on one year's gifts, in the rule table's native unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftTax {
    pub annual_exemption: Decimal,
    pub taxable: Decimal,
    pub tax: Decimal,
    pub slices: Vec<BracketSlice>,
}

pub fn compute_gift_tax(gifts: Decimal, version: &TaxRuleVersion) -> EngineResult<GiftTax> {
    let rules = version
        .gift
        .as_ref()
        .ok_or_else(|| EngineError::GiftRulesMissing(version.version_id.clone()))?;

    let taxable = (gifts - rules.annual_exemption).max(Decimal::ZERO);
    let slices = bracket_slices(taxable, &rules.brackets);
    let tax = slices.iter().map(|s| s.tax).sum();
    Ok(GiftTax {
        annual_exemption: rules.annual_exemption,
        taxable,
        tax,
        slices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::version::fixtures::version;
    use rust_decimal_macros::dec;

    #[test]
    fn gifts_under_exemption_are_free() {
        let v = version("v1", "2024-01-01");
        let gift = compute_gift_tax(dec!(200), &v).unwrap();
        assert_eq!(gift.taxable, Decimal::ZERO);
        assert_eq!(gift.tax, Decimal::ZERO);
        assert!(gift.slices.is_empty());
    }

    #[test]
    fn gifts_above_exemption_are_progressive() {
        let v = version("v1", "2024-01-01");
        // taxable 3000: 2500 * 0.10 + 500 * 0.15
        let gift = compute_gift_tax(dec!(3244), &v).unwrap();
        assert_eq!(gift.taxable, dec!(3000));
        assert_eq!(gift.tax, dec!(325));
        assert_eq!(gift.slices.len(), 2);
    }

    #[test]
    fn version_without_gift_rules() {
        let mut v = version("plain", "2024-01-01");
        v.gift = None;
        assert_eq!(
            compute_gift_tax(dec!(1000), &v),
            Err(EngineError::GiftRulesMissing("plain".to_string()))
        );
    }
}
