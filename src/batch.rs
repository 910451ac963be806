//! CSV batch diagnostics: one household per input row, one result per output row.
//! A row that fails validation is reported in the `error` column and the batch
//! carries on.

use crate::diagnostic::{DiagnosticRequest, DiagnosticResult, LiquidityDiagnostic};
use crate::error::EngineResult;
use crate::rules::RuleSelector;
use crate::tax::HouseholdComposition;
use chrono::NaiveDate;
use estatec_derive::CsvColumns;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Column description generated by `#[derive(CsvColumns)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvColumn {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// One household in a batch input file
#[derive(Debug, Clone, Serialize, Deserialize, CsvColumns)]
pub struct HouseholdRecord {
    /// Caller's identifier, echoed in the output
    pub id: String,
    /// Gross assets in the display unit
    #[serde(with = "rust_decimal::serde::str")]
    pub gross_assets: Decimal,
    /// Liabilities in the display unit (empty = 0)
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub liabilities: Option<Decimal>,
    /// true if a surviving spouse exists (empty = false)
    pub has_spouse: Option<bool>,
    /// Number of adult children (empty = 0)
    pub adult_children: Option<i64>,
    /// Number of parents or grandparents (empty = 0)
    pub parents: Option<i64>,
    /// Number of severely disabled dependents (empty = 0)
    pub disabled_dependents: Option<i64>,
    /// Number of other dependents (empty = 0)
    pub other_dependents: Option<i64>,
    /// Diagnostic date YYYY-MM-DD (empty = batch date)
    pub as_of: Option<NaiveDate>,
    /// Explicit rule version id, takes precedence over as_of
    pub rule_version: Option<String>,
    /// Buffer multiplier override within [1.0, 1.5]
    #[serde(rename = "buffer", default, with = "rust_decimal::serde::str_option")]
    pub buffer_override: Option<Decimal>,
}

impl HouseholdRecord {
    pub fn to_request(&self, default_as_of: NaiveDate) -> DiagnosticRequest {
        let rules = match &self.rule_version {
            Some(id) if !id.trim().is_empty() => RuleSelector::Version(id.trim().to_string()),
            _ => RuleSelector::AsOf(self.as_of.unwrap_or(default_as_of)),
        };
        DiagnosticRequest {
            gross_assets: self.gross_assets,
            liabilities: self.liabilities.unwrap_or_default(),
            household: HouseholdComposition {
                has_spouse: self.has_spouse.unwrap_or_default(),
                adult_children: self.adult_children.unwrap_or_default(),
                parents: self.parents.unwrap_or_default(),
                disabled_dependents: self.disabled_dependents.unwrap_or_default(),
                other_dependents: self.other_dependents.unwrap_or_default(),
            },
            rules,
            buffer_override: self.buffer_override,
        }
    }
}

/// Output row; failed rows only carry `id` and `error`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchRow {
    pub id: String,
    pub version_id: String,
    pub net_assets: String,
    pub deductions_total: String,
    pub taxable_base: String,
    pub tax_amount: String,
    pub buffer_multiplier: String,
    pub recommended_reserve: String,
    pub warnings: String,
    pub error: String,
}

impl BatchRow {
    fn from_outcome(id: String, outcome: EngineResult<DiagnosticResult>) -> Self {
        match outcome {
            Ok(result) => BatchRow {
                id,
                version_id: result.version_id,
                net_assets: result.net_assets.to_string(),
                deductions_total: result.deductions_total.to_string(),
                taxable_base: result.taxable_base.to_string(),
                tax_amount: result.tax_amount.to_string(),
                buffer_multiplier: result.buffer_multiplier_used.to_string(),
                recommended_reserve: result.recommended_reserve.to_string(),
                warnings: result
                    .warnings
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
                error: String::new(),
            },
            Err(err) => BatchRow {
                id,
                error: err.to_string(),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub rows: usize,
    pub failed: usize,
    pub stale: usize,
}

/// Diagnose every record in `reader`, writing one CSV row per record.
pub fn run_batch<R: Read, W: Write>(
    diagnostic: &LiquidityDiagnostic<'_>,
    reader: R,
    writer: W,
    default_as_of: NaiveDate,
) -> csv::Result<BatchSummary> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut wtr = csv::Writer::from_writer(writer);
    let mut summary = BatchSummary::default();

    for (line, record) in rdr.deserialize::<HouseholdRecord>().enumerate() {
        summary.rows += 1;
        let row = match record {
            Ok(record) => {
                let outcome = diagnostic.diagnose(&record.to_request(default_as_of));
                match &outcome {
                    Ok(result) if !result.warnings.is_empty() => summary.stale += 1,
                    Ok(_) => {}
                    Err(err) => {
                        summary.failed += 1;
                        log::warn!("Household {} rejected: {}", record.id, err);
                    }
                }
                BatchRow::from_outcome(record.id, outcome)
            }
            Err(err) => {
                summary.failed += 1;
                log::warn!("Batch row {} unreadable: {}", line + 1, err);
                BatchRow {
                    id: format!("row {}", line + 1),
                    error: err.to_string(),
                    ..Default::default()
                }
            }
        };
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    log::info!(
        "Batch complete: {} row(s), {} failed, {} on stale rules",
        summary.rows,
        summary.failed,
        summary.stale
    );
    Ok(summary)
}
