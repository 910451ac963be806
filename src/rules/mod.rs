pub mod catalog;
pub mod config;
pub mod handle;
pub mod version;

pub use catalog::{RuleSelection, RuleSelector, TaxRuleCatalog};
pub use config::{builtin_catalog, catalog_from_path, catalog_from_slice, LoadError, RuleConfig};
pub use handle::CatalogHandle;
pub use version::{Bracket, GiftRules, TaxRuleVersion, UpperBound, MAX_RULE_AMOUNT};
