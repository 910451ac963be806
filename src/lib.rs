//! Versioned progressive estate tax estimation with a liquidity reserve
//! recommendation.

pub mod batch;
pub mod diagnostic;
pub mod error;
pub mod planning;
pub mod rules;
pub mod tax;
pub mod units;
pub mod warnings;

pub use diagnostic::{
    DiagnosticRequest, DiagnosticResult, GiftRequest, GiftResult, LiquidityDiagnostic,
};
pub use error::{EngineError, EngineResult, RuleViolation, ValidationError, ViolationKind};
pub use rules::{CatalogHandle, RuleSelector, TaxRuleCatalog, TaxRuleVersion};
pub use tax::HouseholdComposition;
pub use units::UnitFactor;
pub use warnings::Warning;
