use serde::{Deserialize, Serialize};

use super::constants::*;
use crate::error::MapError;

/// Type alias for tile type ids (u16 allows 0-65,535 kinds)
pub type TileId = u16;

/// Type alias for sprite ids handed to the sprite service
pub type SpriteId = u16;

/// Every kind of terrain tile.
///
/// Even ids are the primary tile of a depth band, odd ids the transition
/// row between band `n` and band `n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u16)]
pub enum TileKind {
    #[default]
    Air = 0,
    Grass = 1,
    Dirt = 2,
    DirtStone = 3,
    Stone = 4,
    StoneSlate = 5,
    Slate = 6,
    SlateBasalt = 7,
    Basalt = 8,
    BasaltMagma = 9,
    Magma = 10,
    MagmaBedrock = 11,
    Bedrock = 12,
}

impl TileKind {
    pub const ALL: [TileKind; 13] = [
        TileKind::Air,
        TileKind::Grass,
        TileKind::Dirt,
        TileKind::DirtStone,
        TileKind::Stone,
        TileKind::StoneSlate,
        TileKind::Slate,
        TileKind::SlateBasalt,
        TileKind::Basalt,
        TileKind::BasaltMagma,
        TileKind::Magma,
        TileKind::MagmaBedrock,
        TileKind::Bedrock,
    ];

    pub const fn id(self) -> TileId {
        self as TileId
    }

    /// Single character used by debug previews
    pub const fn glyph(self) -> char {
        match self {
            TileKind::Air => ' ',
            TileKind::Grass => '"',
            TileKind::Dirt => '.',
            TileKind::DirtStone => ':',
            TileKind::Stone => '#',
            TileKind::StoneSlate => '=',
            TileKind::Slate => '%',
            TileKind::SlateBasalt => '&',
            TileKind::Basalt => 'B',
            TileKind::BasaltMagma => 'b',
            TileKind::Magma => '~',
            TileKind::MagmaBedrock => '^',
            TileKind::Bedrock => '@',
        }
    }
}

impl TryFrom<TileId> for TileKind {
    type Error = MapError;

    fn try_from(id: TileId) -> Result<Self, Self::Error> {
        TileKind::ALL
            .get(id as usize)
            .copied()
            .ok_or(MapError::UnknownTileType(id))
    }
}

/// Decorative layer drawn above the base tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Overlay {
    #[default]
    None,
    Copper,
    Iron,
    Gold,
    Diamond,
    Cloud,
}

impl Overlay {
    pub const fn sprite_id(self) -> Option<SpriteId> {
        match self {
            Overlay::None => None,
            Overlay::Copper => Some(SPRITE_ORE_COPPER),
            Overlay::Iron => Some(SPRITE_ORE_IRON),
            Overlay::Gold => Some(SPRITE_ORE_GOLD),
            Overlay::Diamond => Some(SPRITE_ORE_DIAMOND),
            Overlay::Cloud => Some(SPRITE_CLOUD),
        }
    }

    pub const fn is_ore(self) -> bool {
        matches!(
            self,
            Overlay::Copper | Overlay::Iron | Overlay::Gold | Overlay::Diamond
        )
    }
}

/// Background layer drawn below the base tile; one per depth band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Underlay {
    #[default]
    Sky,
    Dirt,
    Stone,
    Slate,
    Basalt,
    Lava,
}

impl Underlay {
    pub const ALL: [Underlay; 6] = [
        Underlay::Sky,
        Underlay::Dirt,
        Underlay::Stone,
        Underlay::Slate,
        Underlay::Basalt,
        Underlay::Lava,
    ];

    /// Underlay for a depth band index
    pub fn from_band(band: usize) -> Option<Underlay> {
        Underlay::ALL.get(band).copied()
    }

    pub const fn sprite_id(self) -> SpriteId {
        match self {
            Underlay::Sky => SPRITE_UNDERLAY_SKY,
            Underlay::Dirt => SPRITE_UNDERLAY_DIRT,
            Underlay::Stone => SPRITE_UNDERLAY_STONE,
            Underlay::Slate => SPRITE_UNDERLAY_SLATE,
            Underlay::Basalt => SPRITE_UNDERLAY_BASALT,
            Underlay::Lava => SPRITE_UNDERLAY_LAVA,
        }
    }
}

/// State of one grid cell.
///
/// `overlay` and `underlay` are independent of `kind`: an iron vein is a
/// stone tile with an iron overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileInstance {
    pub kind: TileKind,
    pub overlay: Overlay,
    pub underlay: Underlay,
    /// Cached from the tile type when the kind is assigned
    pub is_solid: bool,
    /// Remaining durability; zero for air
    pub durability: u8,
}

impl TileInstance {
    /// Air over the given background
    pub const fn air(underlay: Underlay) -> Self {
        Self {
            kind: TileKind::Air,
            overlay: Overlay::None,
            underlay,
            is_solid: false,
            durability: 0,
        }
    }

    pub fn is_air(&self) -> bool {
        self.kind == TileKind::Air
    }

    pub fn with_overlay(mut self, overlay: Overlay) -> Self {
        self.overlay = overlay;
        self
    }
}
