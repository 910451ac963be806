//! Schema command - print expected input formats

use clap::Args;
use estatec::batch::HouseholdRecord;
use estatec::rules::RuleConfig;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format: json-schema, csv-header or csv-fields
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for rule config files
    JsonSchema,
    /// CSV header row for batch input
    CsvHeader,
    /// Batch CSV column descriptions
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => {
                let schema = schema_for!(RuleConfig);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
            SchemaFormat::CsvHeader => {
                println!("{}", HouseholdRecord::csv_header().join(","));
            }
            SchemaFormat::CsvFields => {
                println!("Batch CSV Input Format");
                println!("======================");
                println!();
                for column in HouseholdRecord::csv_columns() {
                    let req = if column.required { "required" } else { "optional" };
                    println!("{:20} ({:8})  {}", column.name, req, column.description);
                }
                println!();
                println!("Amounts are in the display unit; rule tables convert via their unit_factor.");
            }
        }
        Ok(())
    }
}
