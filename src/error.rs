use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;

/// Errors surfaced at the engine boundary.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid rule catalog ({} violation(s)): {}", .0.len(), join_violations(.0))]
    Configuration(Vec<RuleViolation>),
    #[error("rule version not found: {0}")]
    RuleVersionNotFound(String),
    #[error("rule version {0} has no gift tax rules")]
    GiftRulesMissing(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Request input rejected before any computation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must not be negative (got {value})")]
    NegativeCount { field: &'static str, value: i64 },
    #[error("{field} exceeds the supported maximum of {max} (got {value})")]
    CountTooLarge {
        field: &'static str,
        value: i64,
        max: i64,
    },
    #[error("{field} must not be negative (got {value})")]
    NegativeAmount { field: &'static str, value: Decimal },
    #[error("{field} exceeds the supported maximum of {max} (got {value})")]
    AmountTooLarge {
        field: &'static str,
        value: Decimal,
        max: Decimal,
    },
    #[error("buffer multiplier must be within [{min}, {max}] (got {value})")]
    BufferOutOfRange {
        value: Decimal,
        min: Decimal,
        max: Decimal,
    },
}

/// A single problem found while validating a rule catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    /// `None` for catalog-wide problems.
    pub version_id: Option<String>,
    pub kind: ViolationKind,
}

impl RuleViolation {
    pub fn in_version(version_id: &str, kind: ViolationKind) -> Self {
        RuleViolation {
            version_id: Some(version_id.to_string()),
            kind,
        }
    }

    pub fn catalog(kind: ViolationKind) -> Self {
        RuleViolation {
            version_id: None,
            kind,
        }
    }
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version_id {
            Some(id) => write!(f, "[{}] {}", id, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViolationKind {
    #[error("catalog contains no rule versions")]
    EmptyCatalog,
    #[error("duplicate version id '{0}'")]
    DuplicateVersionId(String),
    #[error("versions '{first}' and '{second}' share effective date {date}")]
    DuplicateEffectiveDate {
        date: NaiveDate,
        first: String,
        second: String,
    },
    #[error("version id must not be empty")]
    EmptyVersionId,
    #[error("unit factor must be positive (got {0})")]
    NonPositiveUnitFactor(Decimal),
    #[error("unit factor {0} has no exact decimal reciprocal")]
    InexactUnitFactor(Decimal),
    #[error("unit factor must be within [{min}, {max}] (got {factor})")]
    UnitFactorOutOfRange {
        factor: Decimal,
        min: Decimal,
        max: Decimal,
    },
    #[error("{field} must not be negative (got {value})")]
    NegativeAmount { field: &'static str, value: Decimal },
    #[error("{field} exceeds the supported maximum of {max} (got {value})")]
    AmountTooLarge {
        field: &'static str,
        value: Decimal,
        max: Decimal,
    },
    #[error("default buffer multiplier must be within [{min}, {max}] (got {value})")]
    DefaultBufferOutOfRange {
        value: Decimal,
        min: Decimal,
        max: Decimal,
    },
    #[error("{schedule} bracket schedule is empty")]
    NoBrackets { schedule: &'static str },
    #[error("{schedule} bracket {index}: upper bound must be positive (got {bound})")]
    NonPositiveBound {
        schedule: &'static str,
        index: usize,
        bound: Decimal,
    },
    #[error("{schedule} bracket {index}: upper bound exceeds the supported maximum of {max} (got {bound})")]
    BoundTooLarge {
        schedule: &'static str,
        index: usize,
        bound: Decimal,
        max: Decimal,
    },
    #[error("{schedule} bracket {index}: upper bound {bound} does not exceed previous bound {previous}")]
    UnsortedBound {
        schedule: &'static str,
        index: usize,
        bound: Decimal,
        previous: Decimal,
    },
    #[error("{schedule} bracket {index}: rate must be within [0, 1] (got {rate})")]
    RateOutOfRange {
        schedule: &'static str,
        index: usize,
        rate: Decimal,
    },
    #[error("{schedule} bracket {index}: only the final bracket may be open-ended")]
    UnboundedBeforeLast { schedule: &'static str, index: usize },
    #[error("{schedule} bracket schedule must end with an open-ended bracket")]
    MissingOpenEndedBracket { schedule: &'static str },
    #[error("invalid upper bound '{0}'")]
    InvalidBound(String),
}

fn join_violations(violations: &[RuleViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn configuration_error_lists_every_violation() {
        let err = EngineError::Configuration(vec![
            RuleViolation::in_version(
                "v1",
                ViolationKind::RateOutOfRange {
                    schedule: "estate",
                    index: 0,
                    rate: dec!(1.5),
                },
            ),
            RuleViolation::catalog(ViolationKind::DuplicateVersionId("v1".to_string())),
        ]);
        let message = err.to_string();
        assert!(message.starts_with("invalid rule catalog (2 violation(s))"));
        assert!(message.contains("[v1] estate bracket 0: rate must be within [0, 1] (got 1.5)"));
        assert!(message.contains("duplicate version id 'v1'"));
    }

    #[test]
    fn validation_error_converts_into_engine_error() {
        let err: EngineError = ValidationError::NegativeCount {
            field: "adult_children",
            value: -1,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "adult_children must not be negative (got -1)"
        );
    }
}
