//! `plotbook-auth` — actor context and the per-operation capability policy.
//!
//! This crate is intentionally decoupled from HTTP and storage: the caller has
//! already authenticated the actor and resolved their tenant/investor scope.

pub mod actor;
pub mod capability;
pub mod policy;

pub use actor::{ActorContext, Role};
pub use capability::Capability;
pub use policy::{authorize, ensure_tenant, grants};
