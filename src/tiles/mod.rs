pub mod constants;
pub mod grid;
pub mod registry;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use grid::{DamageOutcome, TileGrid};
pub use registry::{TileCatalog, TileType};
pub use types::{Overlay, SpriteId, TileId, TileInstance, TileKind, Underlay};
