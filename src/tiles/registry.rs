use bevy::prelude::*;

use super::constants::*;
use super::types::{SpriteId, TileId, TileInstance, TileKind, Underlay};
use crate::error::{MapError, Result};

/// Fixed attributes shared by every tile of one kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileType {
    pub kind: TileKind,
    /// Base sprite; air draws nothing
    pub sprite_id: Option<SpriteId>,
    pub durability_max: u8,
    /// Incoming damage is divided by this; `INFINITY` never breaks
    pub durability_hardness: f32,
    pub is_solid: bool,
}

impl TileType {
    const fn solid(kind: TileKind, sprite_id: SpriteId, durability_max: u8, hardness: f32) -> Self {
        Self {
            kind,
            sprite_id: Some(sprite_id),
            durability_max,
            durability_hardness: hardness,
            is_solid: true,
        }
    }
}

/// Tile catalog mapping every [`TileKind`] to its [`TileType`].
///
/// Built once at startup and only read afterwards. Passed explicitly to
/// whatever needs it instead of living in a global.
#[derive(Resource, Debug, Clone)]
pub struct TileCatalog {
    types: Vec<TileType>,
}

impl TileCatalog {
    /// The standard DigDown table, indexed by tile id
    pub fn standard() -> Self {
        use TileKind::*;

        let types = vec![
            TileType {
                kind: Air,
                sprite_id: None,
                durability_max: 0,
                durability_hardness: 1.0,
                is_solid: false,
            },
            TileType::solid(Grass, SPRITE_GRASS, 4, 1.0),
            TileType::solid(Dirt, SPRITE_DIRT, 6, 1.0),
            TileType::solid(DirtStone, SPRITE_DIRT_STONE, 8, 1.25),
            TileType::solid(Stone, SPRITE_STONE, 12, 1.5),
            TileType::solid(StoneSlate, SPRITE_STONE_SLATE, 14, 1.75),
            TileType::solid(Slate, SPRITE_SLATE, 16, 2.0),
            TileType::solid(SlateBasalt, SPRITE_SLATE_BASALT, 18, 2.5),
            TileType::solid(Basalt, SPRITE_BASALT, 20, 3.0),
            TileType::solid(BasaltMagma, SPRITE_BASALT_MAGMA, 22, 3.5),
            TileType::solid(Magma, SPRITE_MAGMA, 24, 4.0),
            TileType::solid(MagmaBedrock, SPRITE_MAGMA_BEDROCK, 32, 6.0),
            TileType::solid(Bedrock, SPRITE_BEDROCK, u8::MAX, f32::INFINITY),
        ];
        debug_assert!(types
            .iter()
            .enumerate()
            .all(|(id, tile)| tile.kind.id() as usize == id));

        Self { types }
    }

    /// Look up a tile type by raw id
    pub fn lookup(&self, type_id: TileId) -> Result<&TileType> {
        self.types
            .get(type_id as usize)
            .ok_or(MapError::UnknownTileType(type_id))
    }

    /// Look up a tile type by kind
    pub fn get(&self, kind: TileKind) -> &TileType {
        &self.types[kind.id() as usize]
    }

    /// A fresh cell of `kind` with full durability
    pub fn instance(&self, kind: TileKind, underlay: Underlay) -> TileInstance {
        let tile_type = self.get(kind);
        TileInstance {
            kind,
            overlay: Default::default(),
            underlay,
            is_solid: tile_type.is_solid,
            durability: tile_type.durability_max,
        }
    }

    /// Number of registered tile types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TileCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
