use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-fatal conditions attached to a computation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Warning {
    /// No rule version was effective on the requested date, so the earliest
    /// version in the catalog was applied instead.
    StaleRuleVersion {
        requested: NaiveDate,
        applied_version: String,
        effective_from: NaiveDate,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::StaleRuleVersion {
                requested,
                applied_version,
                effective_from,
            } => write!(
                f,
                "no rule version effective on {requested}; applied '{applied_version}' (effective from {effective_from})"
            ),
        }
    }
}
