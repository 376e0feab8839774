//! Documents, identifiers and the option and result types of store
//! operations.
//!
//! # Documents
//!
//! A `Document` is a key-value map where keys are strings and values are
//! `Value`s. Path accessors reach into nested documents and arrays with `.`
//! separated keys.
//!
//! ```rust,ignore
//! use docrepo::collection::Document;
//!
//! let mut doc = Document::new();
//! doc.put("name", "Alice")?;
//! doc.put("address.city", "New York")?;
//! ```
//!
//! # Identifiers
//!
//! Documents are keyed by an `ObjectId` under `_id`. `IdentifierCodec`
//! translates between the native identifier and its 24 character hex form.

mod document;
mod find_options;
mod identifier_codec;
mod object_id;
mod update_options;
mod write_result;

pub use document::*;
pub use find_options::*;
pub use identifier_codec::*;
pub use object_id::ObjectId;
pub use update_options::*;
pub use write_result::*;
