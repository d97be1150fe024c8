pub mod slot;
pub mod systems;
pub mod window;

// Re-export commonly used items
pub use slot::{RenderContext, SpriteLookup, TileSlot, TileVisual};
pub use systems::{DigMap, SlotEntities, TileSprites};
pub use window::ViewportWindow;
