//! # docrepo - Typed Repositories over Document Stores
//!
//! docrepo maps Rust structs to the documents of a document database and
//! back, and pages through query results with opaque, resumable cursors.
//! Queries stay in the store's own query language: the repository forwards
//! them unchanged apart from renaming the model's identifier attribute.
//!
//! ## Key Features
//!
//! - **Schema Driven Mapping**: `#[derive(Entity, Convertible)]` describes a
//!   model once; identifiers of the model and of embedded entities are
//!   translated to the store's native `ObjectId`
//! - **Save Semantics**: insert without identifier, upsert with one, and
//!   batched saves that write assigned identifiers back in input order
//! - **Cursor Pagination**: stable, order preserving pages over any sort
//! - **Blocking and Async**: [`repository::Repository`] and
//!   [`repository::AsyncRepository`] share one synchronous core
//! - **In-Memory Store**: [`store::memory::MemoryStore`] implements both
//!   store traits in process
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docrepo::collection::ObjectId;
//! use docrepo::pagination::PageRequest;
//! use docrepo::repository::Repository;
//! use docrepo::repository_config::RepositoryConfig;
//! use docrepo::store::memory::MemoryStore;
//! use docrepo::doc;
//! use docrepo_derive::{Convertible, Entity};
//!
//! #[derive(Entity, Convertible, Debug, Clone, PartialEq)]
//! pub struct Spam {
//!     pub id: Option<ObjectId>,
//!     pub name: String,
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = Repository::<Spam, _>::new(MemoryStore::new(), RepositoryConfig::new("spams"))?;
//!
//! let mut spam = Spam { id: None, name: "spam".to_string() };
//! repository.save(&mut spam)?;
//!
//! let found = repository.find_one_by(&doc! { name: "spam" })?;
//! assert_eq!(found, Some(spam));
//!
//! let page = repository.paginate(&PageRequest::new(10))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`collection`] - Documents, identifiers, options and write results
//! - [`common`] - Values, conversion, schemas, sorting and constants
//! - [`errors`] - Error types and result definitions
//! - [`pagination`] - Cursors, page requests and edges
//! - [`repository`] - Typed repositories and model mapping
//! - [`repository_config`] - Repository configuration
//! - [`store`] - Store traits and the in-memory store

extern crate self as docrepo;

pub mod collection;
pub mod common;
pub mod errors;
pub mod pagination;
pub mod repository;
pub mod repository_config;
pub mod store;

#[cfg(test)]
#[ctor::ctor]
fn init() {
    colog::init();
}
