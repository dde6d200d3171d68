//! Catalog configuration types.

pub mod schema;

pub use schema::*;
