//! The store boundary and the in-memory reference store.
//!
//! Repositories talk to a database only through [`DocumentStore`] (blocking)
//! or [`AsyncDocumentStore`] (async). Both expose collection scoped
//! inserts, updates, bulk writes, deletes, finds, counts and aggregations
//! over [`Document`](crate::collection::Document)s.
//!
//! [`memory::MemoryStore`] implements both traits in process and is what the
//! tests run against.

mod document_store;
pub mod memory;

pub use document_store::*;
