//! Track supply: scanning a directory into [`Track`] values.

mod display;
mod model;
mod scan;

pub use display::describe;
pub use model::{Track, TrackId};
pub use scan::scan;

#[cfg(test)]
mod tests;
