//! Common types shared by every layer of the crate.
//!
//! - [`Value`] - the untyped value held by a [`Document`](crate::collection::Document)
//! - [`Convertible`] - conversion of Rust types to and from [`Value`]
//! - [`Schema`] - descriptor of a mapped type's fields and identifier
//! - [`SortOrder`] and [`SortSpec`] - sort specifications
//! - constants for reserved keys and query operators

mod constants;
mod convertible;
mod schema;
mod sort_order;
mod value;

pub use constants::*;
pub use convertible::*;
pub use schema::*;
pub use sort_order::*;
pub use value::*;
