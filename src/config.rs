//! Configuration loader and schema types.
//!
//! Settings come from struct defaults, an optional TOML file and `NOVA__`
//! environment variables, in increasing precedence.

mod load;
mod schema;

pub use schema::*;
