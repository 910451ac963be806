pub mod batch;
pub mod diagnose;
pub mod gift;
pub mod rules;
pub mod schema;
pub mod validate;

use chrono::{Local, NaiveDate};
use estatec::rules::{builtin_catalog, catalog_from_path, RuleSelector, TaxRuleCatalog};
use std::path::Path;

/// Load the rule catalog from `path`, or the built-in table when none is given.
pub fn load_catalog(path: Option<&Path>) -> anyhow::Result<TaxRuleCatalog> {
    let catalog = match path {
        Some(path) => catalog_from_path(path)?,
        None => builtin_catalog()?,
    };
    Ok(catalog)
}

/// An explicit version id wins over a date; the date defaults to today.
pub fn rule_selector(version: Option<&str>, as_of: Option<NaiveDate>) -> RuleSelector {
    match version {
        Some(id) => RuleSelector::Version(id.to_string()),
        None => RuleSelector::AsOf(as_of.unwrap_or_else(today)),
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Fail when warnings were produced and the caller asked for strict mode.
pub fn check_strict(strict: bool, warnings: &[estatec::Warning]) -> anyhow::Result<()> {
    if strict && !warnings.is_empty() {
        anyhow::bail!(
            "{} warning(s) in strict mode: {}",
            warnings.len(),
            warnings
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        );
    }
    Ok(())
}
