mod collection;
mod config;
mod filter;
mod pipeline;
mod store;
mod update;

pub use config::*;
pub use store::*;
