pub mod memory;
pub mod repository;

pub use memory::InMemoryStore;
pub use repository::{Repository, StoreError, UnitOfWork};
