//! DigDown tile world: a large tile grid, procedural generation, and a small
//! pool of render slots that scrolls over the grid by wrap-around indexing.

pub mod error;
pub mod render;
pub mod tiles;
pub mod world;

pub use error::{MapError, Result};
