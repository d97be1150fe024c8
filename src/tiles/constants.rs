use super::types::SpriteId;

/// World-space size of each tile (width and height), in pixels
pub const TILE_SIZE: f32 = 8.0;

/// Display scale applied to tile sprites (8x8 art drawn at 1:1)
pub const TILE_DISPLAY_SIZE: f32 = TILE_SIZE;

/// The map origin sits this many tiles left of the requested position.
pub const MAP_ORIGIN_BIAS_TILES: f32 = 1.0;

// Default map dimensions (tiles)
pub const DEFAULT_MAP_WIDTH: u32 = 120;
pub const DEFAULT_MAP_HEIGHT: u32 = 120;

/// Extra tiles kept around the visible area so scrolling never shows a gap
pub const VIEWPORT_MARGIN_TILES: u32 = 2;

// Default render window (tiles): a 320x176 px view of 8px tiles plus the
// margin. The host refits it to the real window on its first frame.
pub const DEFAULT_RENDER_WIDTH: u32 = 320 / 8 + VIEWPORT_MARGIN_TILES;
pub const DEFAULT_RENDER_HEIGHT: u32 = 176 / 8 + VIEWPORT_MARGIN_TILES;

/// Consecutive rejections tolerated while scattering one rule
pub const DEFAULT_RETRY_BUDGET: u32 = 100;

// Layer configuration
/// Number of sprite layers drawn per tile
pub const NUM_LAYERS: usize = 3;

/// Layer indices
pub const LAYER_UNDERLAY: usize = 0; // Background behind the tile
pub const LAYER_BASE: usize = 1; // The tile itself
pub const LAYER_OVERLAY: usize = 2; // Ore veins, clouds

/// Z-positions for each layer in world space
pub const LAYER_Z_UNDERLAY: f32 = -0.1;
pub const LAYER_Z_BASE: f32 = 0.0;
pub const LAYER_Z_OVERLAY: f32 = 0.1;

/// Helper to get Z position for a layer index
pub const fn layer_z_position(layer: usize) -> f32 {
    match layer {
        LAYER_UNDERLAY => LAYER_Z_UNDERLAY,
        LAYER_BASE => LAYER_Z_BASE,
        LAYER_OVERLAY => LAYER_Z_OVERLAY,
        _ => LAYER_Z_BASE,
    }
}

// Sprite ids. Base tiles use 1..=12, overlays 20.., underlays 40..
pub const SPRITE_GRASS: SpriteId = 1;
pub const SPRITE_DIRT: SpriteId = 2;
pub const SPRITE_DIRT_STONE: SpriteId = 3;
pub const SPRITE_STONE: SpriteId = 4;
pub const SPRITE_STONE_SLATE: SpriteId = 5;
pub const SPRITE_SLATE: SpriteId = 6;
pub const SPRITE_SLATE_BASALT: SpriteId = 7;
pub const SPRITE_BASALT: SpriteId = 8;
pub const SPRITE_BASALT_MAGMA: SpriteId = 9;
pub const SPRITE_MAGMA: SpriteId = 10;
pub const SPRITE_MAGMA_BEDROCK: SpriteId = 11;
pub const SPRITE_BEDROCK: SpriteId = 12;

pub const SPRITE_ORE_COPPER: SpriteId = 20;
pub const SPRITE_ORE_IRON: SpriteId = 21;
pub const SPRITE_ORE_GOLD: SpriteId = 22;
pub const SPRITE_ORE_DIAMOND: SpriteId = 23;
pub const SPRITE_CLOUD: SpriteId = 24;

pub const SPRITE_UNDERLAY_SKY: SpriteId = 40;
pub const SPRITE_UNDERLAY_DIRT: SpriteId = 41;
pub const SPRITE_UNDERLAY_STONE: SpriteId = 42;
pub const SPRITE_UNDERLAY_SLATE: SpriteId = 43;
pub const SPRITE_UNDERLAY_BASALT: SpriteId = 44;
pub const SPRITE_UNDERLAY_LAVA: SpriteId = 45;
