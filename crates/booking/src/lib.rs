//! Booking domain module.
//!
//! A booking is the confirmed commitment of a unit to a customer. This crate
//! contains the entity, its cancellation rules and reference-code generation,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage).

pub mod booking;
pub mod reference;

pub use booking::{Booking, BookingDraft, BookingStatus, BookingType, Cancellation};
pub use reference::booking_reference;
