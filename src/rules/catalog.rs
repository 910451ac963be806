use crate::error::{EngineError, EngineResult, RuleViolation, ViolationKind};
use crate::rules::version::TaxRuleVersion;
use crate::warnings::Warning;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

/// Ordered, validated set of rule versions. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxRuleCatalog {
    /// Sorted by `effective_from`, ascending.
    versions: Vec<TaxRuleVersion>,
    digest: Option<String>,
}

/// Outcome of a rule lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSelection<'a> {
    pub version: &'a TaxRuleVersion,
    pub warning: Option<Warning>,
}

/// How a caller picks the governing rule version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSelector {
    AsOf(NaiveDate),
    Version(String),
}

impl TaxRuleCatalog {
    /// Validate and order `versions`. Fails with every violation found.
    pub fn new(mut versions: Vec<TaxRuleVersion>) -> EngineResult<Self> {
        let mut violations: Vec<RuleViolation> = Vec::new();

        if versions.is_empty() {
            violations.push(RuleViolation::catalog(ViolationKind::EmptyCatalog));
        }

        for version in &versions {
            violations.extend(version.violations());
        }
        violations.extend(uniqueness_violations(
            versions
                .iter()
                .map(|v| (v.version_id.as_str(), v.effective_from)),
        ));

        if !violations.is_empty() {
            return Err(EngineError::Configuration(violations));
        }

        versions.sort_by_key(|v| v.effective_from);
        Ok(TaxRuleCatalog {
            versions,
            digest: None,
        })
    }

    /// Attach the digest of the configuration this catalog was built from.
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    pub fn versions(&self) -> &[TaxRuleVersion] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// The version with the greatest `effective_from <= date`. When every
    /// version starts after `date`, the earliest one is returned with a
    /// `StaleRuleVersion` warning.
    pub fn select_by_date(&self, date: NaiveDate) -> RuleSelection<'_> {
        let effective = self.versions.partition_point(|v| v.effective_from <= date);
        if effective > 0 {
            return RuleSelection {
                version: &self.versions[effective - 1],
                warning: None,
            };
        }

        // Non-empty by construction.
        let earliest = &self.versions[0];
        log::warn!(
            "No rule version effective on {}; falling back to '{}' (effective from {})",
            date,
            earliest.version_id,
            earliest.effective_from
        );
        RuleSelection {
            version: earliest,
            warning: Some(Warning::StaleRuleVersion {
                requested: date,
                applied_version: earliest.version_id.clone(),
                effective_from: earliest.effective_from,
            }),
        }
    }

    pub fn select_by_id(&self, version_id: &str) -> EngineResult<&TaxRuleVersion> {
        self.versions
            .iter()
            .find(|v| v.version_id == version_id)
            .ok_or_else(|| EngineError::RuleVersionNotFound(version_id.to_string()))
    }

    pub fn select(&self, selector: &RuleSelector) -> EngineResult<RuleSelection<'_>> {
        match selector {
            RuleSelector::AsOf(date) => Ok(self.select_by_date(*date)),
            RuleSelector::Version(id) => Ok(RuleSelection {
                version: self.select_by_id(id)?,
                warning: None,
            }),
        }
    }
}

/// Repeated version ids and effective dates, in input order.
pub(crate) fn uniqueness_violations<'a>(
    identities: impl IntoIterator<Item = (&'a str, NaiveDate)>,
) -> Vec<RuleViolation> {
    let mut violations = Vec::new();
    let mut seen_ids = HashSet::new();
    let mut seen_dates: HashMap<NaiveDate, &str> = HashMap::new();
    for (version_id, effective_from) in identities {
        if !seen_ids.insert(version_id) {
            violations.push(RuleViolation::catalog(ViolationKind::DuplicateVersionId(
                version_id.to_string(),
            )));
        }
        if let Some(first) = seen_dates.insert(effective_from, version_id) {
            violations.push(RuleViolation::catalog(ViolationKind::DuplicateEffectiveDate {
                date: effective_from,
                first: first.to_string(),
                second: version_id.to_string(),
            }));
        }
    }
    violations
}
