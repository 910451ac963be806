//! Batch command - diagnose every household in a CSV file

use crate::cmd::today;
use chrono::NaiveDate;
use clap::Args;
use estatec::batch::run_batch;
use estatec::diagnostic::LiquidityDiagnostic;
use estatec::TaxRuleCatalog;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct BatchCommand {
    /// CSV file of households, one per row (or "-" for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Write results here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Date for rows without as_of or rule_version (default today)
    #[arg(short, long)]
    as_of: Option<NaiveDate>,

    /// Decimal places the reserve is rounded to
    #[arg(long, default_value_t = estatec::diagnostic::DEFAULT_DISPLAY_PRECISION)]
    precision: u32,

    /// Exit with an error if any row failed or used stale rules
    #[arg(long)]
    strict: bool,
}

impl BatchCommand {
    pub fn exec(&self, catalog: &TaxRuleCatalog) -> anyhow::Result<()> {
        let diagnostic = LiquidityDiagnostic::new(catalog).with_display_precision(self.precision);
        let as_of = self.as_of.unwrap_or_else(today);

        let reader: Box<dyn io::Read> = if self.input.as_os_str() == "-" {
            Box::new(io::stdin().lock())
        } else {
            Box::new(BufReader::new(File::open(&self.input)?))
        };
        let summary = match &self.output {
            Some(path) => run_batch(&diagnostic, reader, File::create(path)?, as_of)?,
            None => run_batch(&diagnostic, reader, io::stdout().lock(), as_of)?,
        };

        if summary.failed > 0 {
            eprintln!("{} of {} row(s) failed", summary.failed, summary.rows);
        }
        if self.strict && (summary.failed > 0 || summary.stale > 0) {
            anyhow::bail!(
                "strict mode: {} failed and {} stale row(s)",
                summary.failed,
                summary.stale
            );
        }
        Ok(())
    }
}
