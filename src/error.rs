use bevy::prelude::UVec2;

use crate::tiles::SpriteId;

/// Errors raised by the tile world.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum MapError {
    /// Coordinate outside the grid or render pool.
    #[error("tile ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    /// Tile type id outside the catalog's enumeration.
    #[error("unknown tile type id {0}")]
    UnknownTileType(u16),

    /// Sprite id not registered with the sprite service.
    #[error("sprite {0} is not registered")]
    SpriteNotFound(SpriteId),

    /// Render window larger than the grid it windows.
    #[error("render window {window} exceeds map {map}")]
    WindowExceedsMap { window: UVec2, map: UVec2 },

    /// Generation parameters that cannot be satisfied.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Scattering gave up after too many consecutive rejections.
    #[error("{rule}: placed {placed} of {requested} before the retry budget ran out")]
    RetryBudgetExhausted {
        rule: String,
        placed: u32,
        requested: u32,
    },

    /// A configuration document could not be parsed.
    #[error("invalid configuration document: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, MapError>;

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::InvalidConfig(err.to_string())
    }
}
