//! Investor consent domain module.
//!
//! Decides whether a locked unit's allocation state may change, based on
//! investor assignments and recorded consent. Pure domain logic: the caller
//! supplies the assignments and consent records it loaded.

pub mod assignment;
pub mod gate;

pub use assignment::{AssignmentStatus, ConsentRecord, InvestorAssignment};
pub use gate::{evaluate, ConsentDecision};
