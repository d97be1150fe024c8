use bevy::prelude::*;
use std::collections::HashSet;

use super::config::GenerationConfig;
use super::coords::CoordinateMapper;
use super::generator::{GenerationReport, WorldGenerator};
use crate::error::Result;
use crate::render::{RenderContext, SpriteLookup, TileSlot, ViewportWindow};
use crate::tiles::{
    DamageOutcome, Overlay, TileCatalog, TileGrid, TileInstance, Underlay, MAP_ORIGIN_BIAS_TILES,
};

/// Grid-side state the window renders from
#[derive(Debug, Clone)]
pub struct Terrain {
    pub catalog: TileCatalog,
    pub grid: TileGrid,
    pub mapper: CoordinateMapper,
    /// World position of grid cell `(0, 0)`
    pub offset: Vec2,
}

impl Terrain {
    pub fn context<'a, L>(&'a self, sprites: &'a L) -> RenderContext<'a, L> {
        RenderContext {
            grid: &self.grid,
            catalog: &self.catalog,
            sprites,
            mapper: &self.mapper,
            offset: self.offset,
        }
    }
}

/// Owner of the tile world: catalog, grid, map offset and the render window.
///
/// Gameplay edits go through the mutators here so the changed cells can be
/// redrawn with [`WorldMap::flush_changes`].
pub struct WorldMap<S> {
    terrain: Terrain,
    window: ViewportWindow<S>,
    /// Cells edited since the last flush
    changed: HashSet<UVec2>,
}

impl<S> WorldMap<S> {
    pub fn new(catalog: TileCatalog, grid: TileGrid, tile_size: f32) -> Self {
        let size = grid.size();
        Self {
            terrain: Terrain {
                catalog,
                grid,
                mapper: CoordinateMapper::new(tile_size, size),
                offset: Vec2::ZERO,
            },
            window: ViewportWindow::new(size),
            changed: HashSet::new(),
        }
    }

    /// Generate a fresh grid from `config` and wrap it
    pub fn generate(
        config: GenerationConfig,
        catalog: TileCatalog,
        tile_size: f32,
    ) -> (Self, GenerationReport) {
        let world = WorldGenerator::new(config).generate(&catalog);
        (Self::new(catalog, world.grid, tile_size), world.report)
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn grid(&self) -> &TileGrid {
        &self.terrain.grid
    }

    pub fn catalog(&self) -> &TileCatalog {
        &self.terrain.catalog
    }

    pub fn offset(&self) -> Vec2 {
        self.terrain.offset
    }

    pub fn window(&self) -> &ViewportWindow<S> {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut ViewportWindow<S> {
        &mut self.window
    }

    /// Place the map so that it starts `MAP_ORIGIN_BIAS_TILES` tiles left of
    /// `position`. Bound slots keep their old positions until re-rendered.
    pub fn move_map(&mut self, position: Vec2) {
        let bias = MAP_ORIGIN_BIAS_TILES * self.terrain.mapper.tile_size;
        self.terrain.offset = position - Vec2::new(bias, 0.0);
        debug!("Map offset moved to {}", self.terrain.offset);
    }

    pub fn world_to_grid(&self, position: Vec2) -> UVec2 {
        self.terrain
            .mapper
            .world_to_grid(position, self.terrain.offset)
    }

    pub fn grid_to_world(&self, cell: UVec2) -> Vec2 {
        self.terrain.mapper.grid_to_world(cell, self.terrain.offset)
    }

    /// Resize the render pool; see [`ViewportWindow::configure_pool`]
    pub fn configure_viewport(
        &mut self,
        size: UVec2,
        factory: impl FnMut(UVec2) -> S,
    ) -> Result<Vec<S>> {
        self.window.configure_pool(size, factory)
    }

    pub fn set_corner<L>(&mut self, corner: UVec2, sprites: &L) -> Result<UVec2>
    where
        L: SpriteLookup,
        S: TileSlot<L::Sprite>,
    {
        self.window
            .set_corner(corner, &self.terrain.context(sprites))
    }

    pub fn move_corner<L>(&mut self, delta: IVec2, sprites: &L) -> Result<UVec2>
    where
        L: SpriteLookup,
        S: TileSlot<L::Sprite>,
    {
        self.window.move_corner(delta, &self.terrain.context(sprites))
    }

    /// Centre the window on `world_center`, clamped at the map edges
    pub fn focus_on<L>(&mut self, world_center: Vec2, sprites: &L) -> Result<UVec2>
    where
        L: SpriteLookup,
        S: TileSlot<L::Sprite>,
    {
        let center = self.world_to_grid(world_center);
        let corner = center.saturating_sub(self.window.size() / 2);
        self.set_corner(corner, sprites)
    }

    pub fn rerender_all<L>(&mut self, sprites: &L) -> Result<()>
    where
        L: SpriteLookup,
        S: TileSlot<L::Sprite>,
    {
        self.changed.clear();
        self.window.rerender_all(&self.terrain.context(sprites))
    }

    pub fn is_air(&self, cell: UVec2) -> bool {
        self.terrain.grid.is_air(cell.x, cell.y)
    }

    pub fn set_tile(&mut self, cell: UVec2, tile: TileInstance) -> Result<()> {
        self.terrain.grid.set(cell.x, cell.y, tile)?;
        self.changed.insert(cell);
        Ok(())
    }

    pub fn set_overlay(&mut self, cell: UVec2, overlay: Overlay) -> Result<()> {
        self.terrain.grid.set_overlay(cell.x, cell.y, overlay)?;
        self.changed.insert(cell);
        Ok(())
    }

    pub fn set_underlay(&mut self, cell: UVec2, underlay: Underlay) -> Result<()> {
        self.terrain.grid.set_underlay(cell.x, cell.y, underlay)?;
        self.changed.insert(cell);
        Ok(())
    }

    /// Break the tile at `cell`, returning what was there
    pub fn break_tile(&mut self, cell: UVec2) -> Result<TileInstance> {
        let previous = self.terrain.grid.break_tile(cell.x, cell.y)?;
        if !previous.is_air() {
            self.changed.insert(cell);
        }
        Ok(previous)
    }

    pub fn damage_tile(&mut self, cell: UVec2, damage: u8) -> Result<DamageOutcome> {
        let Terrain { grid, catalog, .. } = &mut self.terrain;
        let outcome = grid.damage_tile(cell.x, cell.y, damage, catalog)?;
        if outcome != DamageOutcome::Unaffected {
            self.changed.insert(cell);
        }
        Ok(outcome)
    }

    /// Number of edited cells waiting for a flush
    pub fn pending_changes(&self) -> usize {
        self.changed.len()
    }

    /// Redraw every edited cell that is on screen and forget the rest.
    /// Returns how many slots were refreshed.
    pub fn flush_changes<L>(&mut self, sprites: &L) -> Result<usize>
    where
        L: SpriteLookup,
        S: TileSlot<L::Sprite>,
    {
        let ctx = self.terrain.context(sprites);
        let mut refreshed = 0;
        let mut first_error = None;
        for cell in self.changed.drain() {
            match self.window.refresh_cell(cell, &ctx) {
                Ok(true) => refreshed += 1,
                Ok(false) => {}
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(refreshed),
        }
    }

    /// Get statistics about the map state
    pub fn stats(&self) -> MapStats {
        MapStats {
            map_size: self.terrain.grid.size(),
            window_size: self.window.size(),
            corner: self.window.corner(),
            bound_slots: self.window.bound_cells().count(),
            pending_changes: self.changed.len(),
        }
    }

    /// ASCII picture of the cells inside the window, top row first
    pub fn window_preview(&self) -> String {
        let corner = self.window.corner();
        let size = self.window.size();

        let mut preview = String::new();
        preview.push_str(&format!("+{}+\n", "-".repeat(size.x as usize)));
        for y in (corner.y..corner.y + size.y).rev() {
            preview.push('|');
            for x in corner.x..corner.x + size.x {
                let glyph = match self.terrain.grid.get(x, y) {
                    Ok(tile) if tile.overlay.is_ore() => '$',
                    Ok(tile) if tile.overlay == Overlay::Cloud => 'o',
                    Ok(tile) => tile.kind.glyph(),
                    Err(_) => '?',
                };
                preview.push(glyph);
            }
            preview.push_str("|\n");
        }
        preview.push_str(&format!("+{}+\n", "-".repeat(size.x as usize)));
        preview.push_str(&format!("Corner: {} | Size: {}\n", corner, size));
        preview
    }
}

/// Statistics about the current map state
#[derive(Debug, Clone, PartialEq)]
pub struct MapStats {
    pub map_size: UVec2,
    pub window_size: UVec2,
    pub corner: UVec2,
    pub bound_slots: usize,
    pub pending_changes: usize,
}

impl std::fmt::Display for MapStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Map: {}, Window: {} at {}, Bound: {}, Pending: {}",
            self.map_size, self.window_size, self.corner, self.bound_slots, self.pending_changes
        )
    }
}
