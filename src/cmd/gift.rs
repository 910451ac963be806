//! Gift command - gift tax on one year's lifetime gifts

use crate::cmd::{check_strict, rule_selector};
use chrono::NaiveDate;
use clap::Args;
use estatec::diagnostic::{GiftRequest, LiquidityDiagnostic};
use estatec::TaxRuleCatalog;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct GiftCommand {
    /// Total gifts made in the year
    #[arg(short, long, allow_negative_numbers = true)]
    amount: Decimal,

    /// Apply the rules in force on this date (YYYY-MM-DD, default today)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Apply this rule version, ignoring --as-of
    #[arg(short = 'r', long)]
    rule_version: Option<String>,

    /// Exit with an error if the result carries warnings
    #[arg(long)]
    strict: bool,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

impl GiftCommand {
    pub fn exec(&self, catalog: &TaxRuleCatalog) -> anyhow::Result<()> {
        let result = LiquidityDiagnostic::new(catalog).gift(&GiftRequest {
            amount: self.amount,
            rules: rule_selector(self.rule_version.as_deref(), self.as_of),
        })?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!();
            println!("GIFT TAX (rules {})", result.version_id);
            println!();
            println!(
                "  Gifts: {} | Annual exemption: {} | Taxable: {}",
                result.gifts, result.annual_exemption, result.taxable
            );
            println!("  Gift tax: {}", result.tax_amount);
            for slice in &result.slices {
                println!(
                    "    {} - {} @ {}: {} -> {}",
                    slice.lower, slice.upper, slice.rate, slice.amount, slice.tax
                );
            }
            for warning in &result.warnings {
                println!("  \u{26A0} {}", warning);
            }
        }

        check_strict(self.strict, &result.warnings)
    }
}
