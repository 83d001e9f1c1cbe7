//! Ownership-transfer domain module.
//!
//! A transfer reassigns an existing booking's customer through a
//! Pending → Approved/Rejected → Completed state machine with immutable
//! terminal states. Pure domain logic (no IO, no HTTP, no storage).

pub mod transfer;

pub use transfer::{default_fee, Transfer, TransferDraft, TransferStatus};
