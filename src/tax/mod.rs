pub mod deductions;
pub mod gift;
pub mod progressive;

pub use deductions::{
    compute_deductions, DeductionBreakdown, HouseholdComposition, MAX_DEPENDENT_COUNT,
};
pub use gift::{compute_gift_tax, GiftTax};
pub use progressive::{bracket_slices, compute_tax, BracketSlice};
