//! Parties domain module (customers and investors).
//!
//! Customer and investor lifecycle management live outside this core; the
//! reservation engine only needs existence and tenant-ownership checks, so
//! these are thin reference records.

pub mod party;

pub use party::{ContactInfo, Customer, Investor, PartyStatus};
