//! Infrastructure layer: the persistence seam for the reservation engine.
//!
//! All state lives behind the [`store::Repository`] trait; operations that
//! read-then-write commit through a single atomic [`store::UnitOfWork`]. The
//! in-memory implementation is the reference backend for tests and dev; a
//! relational backend would implement the same trait with row-level locking.

pub mod store;

pub use store::{InMemoryStore, Repository, StoreError, UnitOfWork};
