#![recursion_limit = "128"]
//! # docrepo Derive Macros
//!
//! Procedural macros deriving the mapping traits of the `docrepo` crate.
//!
//! ## Macros
//!
//! ### `Convertible`
//!
//! Derives `docrepo::common::Convertible` for structs with named fields and
//! for enums. A struct converts to a document with one key per field; an
//! enum of unit variants converts to the variant name, any other enum to a
//! `{variant, value}` document.
//!
//! - **Field attribute**: `#[converter(ignored)]` skips a field, which is
//!   filled with `Default::default()` when reading
//! - **Field attribute**: `#[converter(default)]` reads a missing or null
//!   value as `Default::default()`
//!
//! A derived struct is an embedded entity when it appears inside another
//! model, so it must derive `Entity` as well.
//!
//! ### `Entity`
//!
//! Derives `docrepo::repository::Entity`, building the type's `Schema` once,
//! and `docrepo::repository::Model` when the struct has an identifier
//! attribute: a field named `id`, a field marked `#[entity(id)]`, or the
//! field named by `#[entity(id(field = "..."))]`. The identifier field must
//! be an `ObjectId`, a `String` or an `Option` of either.
//!
//! - **Struct attribute**: `#[entity(name = "...")]` names the schema
//!
//! # Examples
//!
//! ```rust,ignore
//! use docrepo::collection::ObjectId;
//! use docrepo_derive::{Convertible, Entity};
//!
//! #[derive(Entity, Convertible)]
//! pub struct Bar {
//!     pub apple: String,
//!     #[converter(default)]
//!     pub banana: String,
//! }
//!
//! #[derive(Entity, Convertible)]
//! #[entity(name = "spams")]
//! pub struct Spam {
//!     pub id: Option<ObjectId>,
//!     pub bars: Vec<Bar>,
//! }
//!
//! #[derive(Convertible)]
//! pub enum Status {
//!     Active,
//!     Inactive,
//! }
//! ```

extern crate proc_macro;
mod convertible;
mod entity;

use crate::convertible::{generate_convertible_for_enum, generate_convertible_for_struct};
use crate::entity::generate_entity_for_struct;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

/// Derives the `Convertible` trait.
///
/// # Errors
///
/// Returns a compile error for unions, tuple structs and unit structs, and
/// for unknown `converter` attributes.
#[proc_macro_derive(Convertible, attributes(converter))]
pub fn derive_convert(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    let result = match ast.data {
        Data::Struct(ref data) => generate_convertible_for_struct(&ast, data),
        Data::Enum(ref data) => generate_convertible_for_enum(&ast, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &ast,
            "Cannot derive Convertible for unions",
        )),
    };

    match result {
        Ok(token_stream) => token_stream,
        Err(e) => e.to_compile_error().into(),
    }
}

/// Derives the `Entity` trait, and `Model` for types with an identifier.
///
/// # Errors
///
/// Returns a compile error for enums, unions, generic types and structs
/// without named fields, when the named identifier field does not exist,
/// or when it is marked `#[converter(ignored)]`.
#[proc_macro_derive(Entity, attributes(entity, converter))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    let result = match ast.data {
        Data::Struct(ref data) => generate_entity_for_struct(&ast, data),
        _ => Err(syn::Error::new_spanned(
            &ast,
            format!(
                "Cannot derive Entity for '{}': only structs with named fields are supported",
                ast.ident
            ),
        )),
    };

    match result {
        Ok(token_stream) => token_stream,
        Err(e) => e.to_compile_error().into(),
    }
}
