mod cmd;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "estatec", version, about = "Estate Tax and Liquidity Reserve Calculator")]
struct Cli {
    /// JSON rule config to use instead of the built-in table
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Estimate estate tax and the recommended liquidity reserve
    Diagnose(cmd::diagnose::DiagnoseCommand),
    /// Estimate gift tax on one year's gifts
    Gift(cmd::gift::GiftCommand),
    /// Diagnose every household in a CSV file
    Batch(cmd::batch::BatchCommand),
    /// List the versions in the rule catalog
    Rules(cmd::rules::RulesCommand),
    /// Check a rule config file and report every problem
    Validate(cmd::validate::ValidateCommand),
    /// Print input formats (JSON schema, CSV columns)
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let rules = cli.rules.as_deref();

    match cli.command {
        Command::Diagnose(diagnose) => diagnose.exec(&cmd::load_catalog(rules)?),
        Command::Gift(gift) => gift.exec(&cmd::load_catalog(rules)?),
        Command::Batch(batch) => batch.exec(&cmd::load_catalog(rules)?),
        Command::Rules(list) => list.exec(&cmd::load_catalog(rules)?),
        Command::Validate(validate) => validate.exec(),
        Command::Schema(schema) => schema.exec(),
    }
}
