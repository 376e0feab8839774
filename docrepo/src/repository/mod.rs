//! Typed repositories over a document store.
//!
//! A repository maps models (Rust structs deriving `Entity` and
//! `Convertible`) to documents and back, and forwards queries to a
//! [store](crate::store) unchanged apart from identifier renaming.
//!
//! # Models
//!
//! ```rust,ignore
//! use docrepo::collection::ObjectId;
//! use docrepo_derive::{Convertible, Entity};
//!
//! #[derive(Entity, Convertible, Debug, Clone, PartialEq)]
//! pub struct Spam {
//!     pub id: Option<ObjectId>,
//!     pub name: String,
//! }
//! ```
//!
//! The identifier attribute (`id` unless another field is marked
//! `#[entity(id)]`) is stored under the identity key `_id` in native form.
//! It may be held as an `ObjectId` or as its hex `String`, optionally in an
//! `Option` for models that are created before they are saved.
//!
//! # Calling Conventions
//!
//! - [`Repository`] blocks on a [`DocumentStore`](crate::store::DocumentStore)
//! - [`AsyncRepository`] awaits an [`AsyncDocumentStore`](crate::store::AsyncDocumentStore)
//!
//! Both share the same mapping and pagination logic.

mod async_repository;
mod cursor;
mod entity;
mod mapper;
mod repository;
mod repository_core;

pub use async_repository::*;
pub use cursor::*;
pub use entity::*;
pub use mapper::ModelMapper;
pub use repository::*;
pub use repository_core::SaveResult;
