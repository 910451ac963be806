//! Rules command - list the versions in the active rule catalog

use clap::Args;
use estatec::rules::UpperBound;
use estatec::{TaxRuleCatalog, TaxRuleVersion};
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct RulesCommand {
    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct RulesOutput<'a> {
    digest: Option<&'a str>,
    versions: &'a [TaxRuleVersion],
}

#[derive(Debug, Tabled)]
struct VersionRow {
    #[tabled(rename = "Version")]
    version_id: String,
    #[tabled(rename = "Effective From")]
    effective_from: String,
    #[tabled(rename = "Unit")]
    unit_factor: String,
    #[tabled(rename = "Exempt")]
    exempt_amount: String,
    #[tabled(rename = "Brackets")]
    brackets: String,
    #[tabled(rename = "Top Rate")]
    top_rate: String,
    #[tabled(rename = "Buffer")]
    buffer: String,
    #[tabled(rename = "Gift Exemption")]
    gift_exemption: String,
}

impl From<&TaxRuleVersion> for VersionRow {
    fn from(v: &TaxRuleVersion) -> Self {
        let top_rate = v
            .brackets
            .iter()
            .find(|b| b.upper == UpperBound::Unbounded)
            .map(|b| b.rate.to_string())
            .unwrap_or_default();
        VersionRow {
            version_id: v.version_id.clone(),
            effective_from: v.effective_from.to_string(),
            unit_factor: v.unit_factor.to_string(),
            exempt_amount: v.exempt_amount.to_string(),
            brackets: v.brackets.len().to_string(),
            top_rate,
            buffer: v.default_buffer_multiplier.to_string(),
            gift_exemption: v
                .gift
                .as_ref()
                .map(|g| g.annual_exemption.to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

impl RulesCommand {
    pub fn exec(&self, catalog: &TaxRuleCatalog) -> anyhow::Result<()> {
        if self.json {
            let output = RulesOutput {
                digest: catalog.digest(),
                versions: catalog.versions(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        let rows: Vec<VersionRow> = catalog.versions().iter().map(VersionRow::from).collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        if let Some(digest) = catalog.digest() {
            println!("Digest: {}", digest);
        }
        Ok(())
    }
}
