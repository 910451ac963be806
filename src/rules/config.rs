//! JSON rule tables.
//!
//! ```json
//! { "versions": [ { "version": "2024", "effective_from": "2024-01-01",
//!                   "brackets": [[5621, 0.10], [11242, 0.15], ["inf", 0.20]], ... } ] }
//! ```
//!
//! Numbers are read with their full decimal precision, and any amount may also
//! be written as a string (`"5621.50"`).

use crate::error::{EngineError, RuleViolation, ViolationKind};
use crate::rules::catalog::{uniqueness_violations, TaxRuleCatalog};
use crate::rules::version::{Bracket, GiftRules, TaxRuleVersion, UpperBound};
use crate::units::UnitFactor;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

const BUILTIN_RULES: &str = include_str!("default.json");

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read rule config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse rule config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] EngineError),
}

/// Root of a rule config file
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RuleConfig {
    pub versions: Vec<VersionConfig>,
}

/// One dated rule version, amounts in the table's native unit
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VersionConfig {
    /// Unique version identifier
    pub version: String,
    /// First day (inclusive) this version governs, YYYY-MM-DD
    pub effective_from: NaiveDate,
    /// Display units per native unit (10000 for tables authored in ten-thousands)
    #[serde(default = "default_unit_factor")]
    #[schemars(with = "f64")]
    pub unit_factor: Decimal,
    #[serde(alias = "exempt_amount_wan")]
    #[schemars(with = "f64")]
    pub exempt_amount: Decimal,
    #[serde(alias = "funeral_expense_wan")]
    #[schemars(with = "f64")]
    pub funeral_expense: Decimal,
    #[serde(alias = "spouse_deduction_wan")]
    #[schemars(with = "f64")]
    pub spouse_deduction: Decimal,
    /// Per adult child
    #[serde(alias = "adult_child_deduction_wan")]
    #[schemars(with = "f64")]
    pub adult_child_deduction: Decimal,
    /// Per parent or grandparent
    #[serde(alias = "parents_deduction_wan")]
    #[schemars(with = "f64")]
    pub parents_deduction: Decimal,
    /// Per severely disabled dependent
    #[serde(alias = "disabled_deduction_wan")]
    #[schemars(with = "f64")]
    pub disabled_deduction: Decimal,
    /// Per other dependent
    #[serde(alias = "other_dependents_deduction_wan")]
    #[schemars(with = "f64")]
    pub other_dependents_deduction: Decimal,
    /// `[upper_bound, rate]` pairs; the last upper bound must be "inf"
    #[serde(alias = "brackets_wan")]
    pub brackets: Vec<BracketConfig>,
    #[serde(default = "default_buffer_multiplier")]
    #[schemars(with = "f64")]
    pub buffer_multiplier: Decimal,
    #[serde(default)]
    pub gift: Option<GiftConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GiftConfig {
    #[serde(alias = "annual_exemption_wan")]
    #[schemars(with = "f64")]
    pub annual_exemption: Decimal,
    #[serde(alias = "brackets_wan")]
    pub brackets: Vec<BracketConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BracketConfig(
    pub BoundConfig,
    #[schemars(with = "f64")] pub Decimal,
);

/// A numeric bound, or "inf" / "infinite" / "∞" for the open-ended bracket
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum BoundConfig {
    Amount(#[schemars(with = "f64")] Decimal),
    Keyword(String),
}

fn default_unit_factor() -> Decimal {
    dec!(10000)
}

fn default_buffer_multiplier() -> Decimal {
    dec!(1.10)
}

impl BoundConfig {
    fn resolve(&self) -> Result<UpperBound, ViolationKind> {
        match self {
            BoundConfig::Amount(amount) => Ok(UpperBound::Bounded(*amount)),
            BoundConfig::Keyword(word) => match word.trim().to_lowercase().as_str() {
                "inf" | "infinite" | "infinity" | "∞" => Ok(UpperBound::Unbounded),
                _ => Err(ViolationKind::InvalidBound(word.clone())),
            },
        }
    }
}

fn resolve_brackets(
    configs: &[BracketConfig],
    violations: &mut Vec<ViolationKind>,
) -> Vec<Bracket> {
    configs
        .iter()
        .filter_map(|BracketConfig(bound, rate)| match bound.resolve() {
            Ok(upper) => Some(Bracket::new(upper, *rate)),
            Err(kind) => {
                violations.push(kind);
                None
            }
        })
        .collect()
}

impl VersionConfig {
    fn into_version(self) -> Result<TaxRuleVersion, Vec<RuleViolation>> {
        let mut kinds = Vec::new();

        let unit_factor = UnitFactor::new(self.unit_factor).map_err(|kind| kinds.push(kind));
        let brackets = resolve_brackets(&self.brackets, &mut kinds);
        let gift = self.gift.map(|gift| GiftRules {
            annual_exemption: gift.annual_exemption,
            brackets: resolve_brackets(&gift.brackets, &mut kinds),
        });

        let version = TaxRuleVersion {
            version_id: self.version,
            effective_from: self.effective_from,
            unit_factor: unit_factor.unwrap_or(UnitFactor::ONE),
            exempt_amount: self.exempt_amount,
            funeral_expense: self.funeral_expense,
            spouse_deduction: self.spouse_deduction,
            adult_child_deduction: self.adult_child_deduction,
            parent_deduction: self.parents_deduction,
            disabled_dependent_deduction: self.disabled_deduction,
            other_dependent_deduction: self.other_dependents_deduction,
            brackets,
            default_buffer_multiplier: self.buffer_multiplier,
            gift,
        };
        if kinds.is_empty() {
            return Ok(version);
        }

        // Keep checking the rest of the version so one pass reports everything.
        let mut found: Vec<RuleViolation> = kinds
            .into_iter()
            .map(|kind| RuleViolation::in_version(&version.version_id, kind))
            .collect();
        found.extend(version.violations());
        Err(found)
    }
}

impl RuleConfig {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Build a validated catalog. Reports conversion problems and catalog
    /// invariant violations together.
    pub fn into_catalog(self) -> Result<TaxRuleCatalog, EngineError> {
        let identities: Vec<(String, NaiveDate)> = self
            .versions
            .iter()
            .map(|config| (config.version.clone(), config.effective_from))
            .collect();

        let mut violations = Vec::new();
        let mut versions = Vec::new();
        for config in self.versions {
            match config.into_version() {
                Ok(version) => versions.push(version),
                Err(found) => violations.extend(found),
            }
        }
        if violations.is_empty() {
            return TaxRuleCatalog::new(versions);
        }

        // Some versions were dropped, so catalog-wide checks run over every
        // configured version instead of the survivors.
        match TaxRuleCatalog::new(versions) {
            Ok(_) => {}
            Err(EngineError::Configuration(found)) => {
                violations.extend(found.into_iter().filter(|v| v.version_id.is_some()))
            }
            Err(other) => return Err(other),
        }
        violations.extend(uniqueness_violations(
            identities.iter().map(|(id, date)| (id.as_str(), *date)),
        ));
        Err(EngineError::Configuration(violations))
    }
}

/// Hex SHA-256 of raw configuration bytes.
pub fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Parse, validate and fingerprint a rule table.
pub fn catalog_from_slice(bytes: &[u8]) -> Result<TaxRuleCatalog, LoadError> {
    let catalog = RuleConfig::from_slice(bytes)?
        .into_catalog()?
        .with_digest(digest(bytes));
    log::info!(
        "Loaded {} rule version(s), digest {}",
        catalog.len(),
        catalog.digest().unwrap_or_default()
    );
    Ok(catalog)
}

pub fn catalog_from_path(path: &Path) -> Result<TaxRuleCatalog, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    catalog_from_slice(&bytes)
}

/// The rule table compiled into the crate.
pub fn builtin_catalog() -> Result<TaxRuleCatalog, LoadError> {
    catalog_from_slice(BUILTIN_RULES.as_bytes())
}
