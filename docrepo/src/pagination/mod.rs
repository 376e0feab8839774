//! Cursor based pagination.
//!
//! A page is a list of [`Edge`]s, each pairing a model with an opaque cursor
//! built from the values of the page's sort fields in the model's document.
//! Passing the last cursor of a page as `after` resumes strictly after it,
//! so consecutive pages neither overlap nor skip documents while the
//! underlying data is unchanged.
//!
//! Cursors carry no server side state. They record the sort they were
//! issued under, and a cursor used with a different sort is rejected with
//! [`ErrorKind::InvalidCursor`](crate::errors::ErrorKind::InvalidCursor).
//!
//! A page holds at most `limit` edges and the paginator does not look
//! ahead: a full page does not mean another page exists.

mod paginator;
mod token;

pub use paginator::*;
pub use token::*;
