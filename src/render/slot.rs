use bevy::prelude::*;

use crate::error::Result;
use crate::tiles::{SpriteId, TileCatalog, TileGrid};
use crate::world::coords::CoordinateMapper;

/// Resolves sprite ids to whatever the host draws with.
pub trait SpriteLookup {
    type Sprite: Clone;

    /// Fails with `SpriteNotFound` for ids the host never registered
    fn sprite(&self, id: SpriteId) -> Result<Self::Sprite>;
}

/// One reusable on-screen tile.
pub trait TileSlot<Sp> {
    /// Show `visual`, replacing whatever the slot showed before
    fn configure(&mut self, visual: &TileVisual<Sp>);
}

/// Everything a slot needs to draw one grid cell
#[derive(Debug, Clone, PartialEq)]
pub struct TileVisual<Sp> {
    pub cell: UVec2,
    /// World position of the cell's origin
    pub position: Vec2,
    /// Tile sprite; `None` for air
    pub base: Option<Sp>,
    pub overlay: Option<Sp>,
    pub underlay: Sp,
    pub is_solid: bool,
}

/// Borrowed view of the map used while (re)binding slots
pub struct RenderContext<'a, L> {
    pub grid: &'a TileGrid,
    pub catalog: &'a TileCatalog,
    pub sprites: &'a L,
    pub mapper: &'a CoordinateMapper,
    pub offset: Vec2,
}

impl<L: SpriteLookup> RenderContext<'_, L> {
    /// Read `cell` from the grid and resolve its three layers
    pub fn visual(&self, cell: UVec2) -> Result<TileVisual<L::Sprite>> {
        let tile = self.grid.get(cell.x, cell.y)?;
        let tile_type = self.catalog.lookup(tile.kind.id())?;

        let base = tile_type
            .sprite_id
            .map(|id| self.sprites.sprite(id))
            .transpose()?;
        let overlay = tile
            .overlay
            .sprite_id()
            .map(|id| self.sprites.sprite(id))
            .transpose()?;
        let underlay = self.sprites.sprite(tile.underlay.sprite_id())?;

        Ok(TileVisual {
            cell,
            position: self.mapper.grid_to_world(cell, self.offset),
            base,
            overlay,
            underlay,
            is_solid: tile.is_solid,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::MapError;
    use std::collections::HashSet;

    /// Sprite service whose sprites are the ids themselves
    pub struct IdSprites;

    impl SpriteLookup for IdSprites {
        type Sprite = SpriteId;

        fn sprite(&self, id: SpriteId) -> Result<SpriteId> {
            Ok(id)
        }
    }

    /// Sprite service that only knows some ids
    pub struct PartialSprites(pub HashSet<SpriteId>);

    impl SpriteLookup for PartialSprites {
        type Sprite = SpriteId;

        fn sprite(&self, id: SpriteId) -> Result<SpriteId> {
            if self.0.contains(&id) {
                Ok(id)
            } else {
                Err(MapError::SpriteNotFound(id))
            }
        }
    }

    /// Slot that remembers what it was told to show
    #[derive(Debug, Default)]
    pub struct RecordingSlot {
        /// Creation order, for identity checks
        pub serial: u32,
        pub visual: Option<TileVisual<SpriteId>>,
        pub configured: u32,
    }

    impl TileSlot<SpriteId> for RecordingSlot {
        fn configure(&mut self, visual: &TileVisual<SpriteId>) {
            self.visual = Some(visual.clone());
            self.configured += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::error::MapError;
    use crate::tiles::*;

    fn context_parts() -> (TileGrid, TileCatalog, CoordinateMapper) {
        let catalog = TileCatalog::standard();
        let mut grid = TileGrid::new(UVec2::new(4, 4));
        let gold = catalog
            .instance(TileKind::Slate, Underlay::Basalt)
            .with_overlay(Overlay::Gold);
        grid.set(1, 2, gold).unwrap();
        grid.set_overlay(3, 3, Overlay::Cloud).unwrap();
        let mapper = CoordinateMapper::new(TILE_SIZE, grid.size());
        (grid, catalog, mapper)
    }

    #[test]
    fn test_visual_resolves_layers() {
        let (grid, catalog, mapper) = context_parts();
        let ctx = RenderContext {
            grid: &grid,
            catalog: &catalog,
            sprites: &IdSprites,
            mapper: &mapper,
            offset: Vec2::new(-8.0, 16.0),
        };

        let visual = ctx.visual(UVec2::new(1, 2)).unwrap();
        assert_eq!(visual.base, Some(SPRITE_SLATE));
        assert_eq!(visual.overlay, Some(SPRITE_ORE_GOLD));
        assert_eq!(visual.underlay, SPRITE_UNDERLAY_BASALT);
        assert_eq!(visual.position, Vec2::new(0.0, 32.0));
        assert!(visual.is_solid);

        let cloud = ctx.visual(UVec2::new(3, 3)).unwrap();
        assert_eq!(cloud.base, None);
        assert_eq!(cloud.overlay, Some(SPRITE_CLOUD));
        assert_eq!(cloud.underlay, SPRITE_UNDERLAY_SKY);
        assert!(!cloud.is_solid);
    }

    #[test]
    fn test_visual_errors() {
        let (grid, catalog, mapper) = context_parts();
        let sprites = PartialSprites([SPRITE_UNDERLAY_SKY].into_iter().collect());
        let ctx = RenderContext {
            grid: &grid,
            catalog: &catalog,
            sprites: &sprites,
            mapper: &mapper,
            offset: Vec2::ZERO,
        };

        assert!(ctx.visual(UVec2::new(0, 0)).is_ok());
        assert_eq!(
            ctx.visual(UVec2::new(1, 2)),
            Err(MapError::SpriteNotFound(SPRITE_SLATE))
        );
        assert!(matches!(
            ctx.visual(UVec2::new(4, 0)),
            Err(MapError::OutOfBounds { .. })
        ));
    }
}
