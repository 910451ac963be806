//! Diagnose command - estimated estate tax and recommended liquidity reserve

use crate::cmd::{check_strict, rule_selector};
use chrono::NaiveDate;
use clap::Args;
use estatec::diagnostic::{DiagnosticRequest, DiagnosticResult, LiquidityDiagnostic};
use estatec::planning::{planning_notes, AssetMix, PlanningNote};
use estatec::tax::{BracketSlice, HouseholdComposition};
use estatec::TaxRuleCatalog;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct DiagnoseCommand {
    /// Gross assets of the estate
    #[arg(short, long)]
    gross_assets: Decimal,

    /// Outstanding liabilities
    #[arg(short, long, default_value_t = Decimal::ZERO)]
    liabilities: Decimal,

    /// A surviving spouse exists
    #[arg(short, long)]
    spouse: bool,

    /// Number of adult children
    #[arg(short = 'c', long, default_value_t = 0, allow_negative_numbers = true)]
    children: i64,

    /// Number of parents or grandparents
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    parents: i64,

    /// Number of severely disabled dependents
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    disabled: i64,

    /// Number of other dependents
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    other_dependents: i64,

    /// Apply the rules in force on this date (YYYY-MM-DD, default today)
    #[arg(short, long)]
    as_of: Option<NaiveDate>,

    /// Apply this rule version, ignoring --as-of
    #[arg(short = 'r', long)]
    rule_version: Option<String>,

    /// Buffer multiplier override within [1.0, 1.5]
    #[arg(short, long)]
    buffer: Option<Decimal>,

    /// Decimal places the reserve is rounded to
    #[arg(long, default_value_t = estatec::diagnostic::DEFAULT_DISPLAY_PRECISION)]
    precision: u32,

    /// Financial assets, for planning notes
    #[arg(long)]
    financial: Option<Decimal>,

    /// Real estate, for planning notes
    #[arg(long)]
    real_estate: Option<Decimal>,

    /// Company holdings, for planning notes
    #[arg(long)]
    business: Option<Decimal>,

    /// Exit with an error if the result carries warnings
    #[arg(long)]
    strict: bool,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct DiagnoseOutput<'a> {
    #[serde(flatten)]
    result: &'a DiagnosticResult,
    planning_notes: Vec<String>,
}

#[derive(Debug, Tabled)]
struct SliceRow {
    #[tabled(rename = "Bracket")]
    bracket: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Taxed")]
    amount: String,
    #[tabled(rename = "Tax")]
    tax: String,
}

impl From<&BracketSlice> for SliceRow {
    fn from(slice: &BracketSlice) -> Self {
        SliceRow {
            bracket: format!("{} - {}", slice.lower, slice.upper),
            rate: format_pct(slice.rate),
            amount: slice.amount.to_string(),
            tax: slice.tax.to_string(),
        }
    }
}

impl DiagnoseCommand {
    pub fn exec(&self, catalog: &TaxRuleCatalog) -> anyhow::Result<()> {
        let household = HouseholdComposition {
            has_spouse: self.spouse,
            adult_children: self.children,
            parents: self.parents,
            disabled_dependents: self.disabled,
            other_dependents: self.other_dependents,
        };
        let request = DiagnosticRequest {
            gross_assets: self.gross_assets,
            liabilities: self.liabilities,
            household,
            rules: rule_selector(self.rule_version.as_deref(), self.as_of),
            buffer_override: self.buffer,
        };

        let result = LiquidityDiagnostic::new(catalog)
            .with_display_precision(self.precision)
            .diagnose(&request)?;
        let notes = planning_notes(&result, &household, self.asset_mix().as_ref());

        if self.json {
            let output = DiagnoseOutput {
                result: &result,
                planning_notes: notes.iter().map(ToString::to_string).collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_text(&result, &notes);
        }

        check_strict(self.strict, &result.warnings)
    }

    fn asset_mix(&self) -> Option<AssetMix> {
        if self.financial.is_none() && self.real_estate.is_none() && self.business.is_none() {
            return None;
        }
        Some(AssetMix {
            financial: self.financial.unwrap_or_default(),
            real_estate: self.real_estate.unwrap_or_default(),
            business: self.business.unwrap_or_default(),
        })
    }
}

fn print_text(result: &DiagnosticResult, notes: &[PlanningNote]) {
    println!();
    println!(
        "ESTATE TAX DIAGNOSTIC (rules {}, effective {})",
        result.version_id, result.effective_from
    );
    println!();
    println!(
        "  Net assets: {} | Exempt: {} | Deductions: {}",
        result.net_assets, result.exempt_amount, result.deductions_total
    );
    println!("  Taxable base: {}", result.taxable_base);
    println!(
        "  Estimated tax: {} (effective rate {})",
        result.tax_amount,
        format_pct(result.effective_rate)
    );
    println!(
        "  Buffer: {} | Recommended reserve: {}",
        result.buffer_multiplier_used, result.recommended_reserve
    );
    println!();

    let d = &result.deductions;
    println!("DEDUCTIONS");
    println!("  Funeral: {} | Spouse: {}", d.funeral, d.spouse);
    println!(
        "  Adult children: {} | Parents: {} | Disabled: {} | Other: {}",
        d.adult_children, d.parents, d.disabled_dependents, d.other_dependents
    );
    println!();

    if !result.slices.is_empty() {
        let rows: Vec<SliceRow> = result.slices.iter().map(SliceRow::from).collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        println!();
    }

    if !result.warnings.is_empty() {
        println!("\u{26A0} WARNINGS");
        for warning in &result.warnings {
            println!("  {}", warning);
        }
        println!();
    }

    println!("PLANNING NOTES");
    for (i, note) in notes.iter().enumerate() {
        println!("  {}. {}", i + 1, note);
    }
}

fn format_pct(rate: Decimal) -> String {
    format!("{}%", (rate * dec!(100)).round_dp(2).normalize())
}
