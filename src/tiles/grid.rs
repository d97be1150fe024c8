use bevy::prelude::*;

use super::registry::TileCatalog;
use super::types::{Overlay, TileInstance, TileKind, Underlay};
use crate::error::{MapError, Result};

/// Result of hitting a tile with a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Air, or the hit was absorbed entirely by the tile's hardness
    Unaffected,
    /// Durability dropped but the tile still stands
    Damaged { remaining: u8 },
    /// Durability ran out; carries the tile that was removed
    Broken(TileInstance),
}

/// The logical tile grid for the whole map.
///
/// Row-major storage addressed `[y][x]`; `y = 0` is the bottom row and
/// `y = height - 1` the surface. Every accessor is bounds checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<TileInstance>,
}

impl TileGrid {
    /// Create a grid of `size` filled with air over sky
    pub fn new(size: UVec2) -> Self {
        let mut grid = Self::default();
        grid.configure(size.x, size.y);
        grid
    }

    /// Reallocate to `width x height`, discarding any previous content
    pub fn configure(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.tiles = vec![TileInstance::default(); width as usize * height as usize];
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    fn index(&self, x: u32, y: u32) -> Result<usize> {
        if !self.contains(x, y) {
            return Err(MapError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y as usize * self.width as usize + x as usize)
    }

    /// Get the tile at `(x, y)`
    pub fn get(&self, x: u32, y: u32) -> Result<TileInstance> {
        let index = self.index(x, y)?;
        Ok(self.tiles[index])
    }

    /// Replace the tile at `(x, y)`
    pub fn set(&mut self, x: u32, y: u32, value: TileInstance) -> Result<()> {
        let index = self.index(x, y)?;
        self.tiles[index] = value;
        Ok(())
    }

    /// Change only the overlay of the tile at `(x, y)`
    pub fn set_overlay(&mut self, x: u32, y: u32, overlay: Overlay) -> Result<()> {
        let index = self.index(x, y)?;
        self.tiles[index].overlay = overlay;
        Ok(())
    }

    /// Change only the underlay of the tile at `(x, y)`
    pub fn set_underlay(&mut self, x: u32, y: u32, underlay: Underlay) -> Result<()> {
        let index = self.index(x, y)?;
        self.tiles[index].underlay = underlay;
        Ok(())
    }

    /// Whether `(x, y)` is air. Out-of-range lookups log and answer `false`.
    pub fn is_air(&self, x: u32, y: u32) -> bool {
        match self.get(x, y) {
            Ok(tile) => tile.is_air(),
            Err(e) => {
                warn!("is_air lookup failed: {}", e);
                false
            }
        }
    }

    /// Break the tile at `(x, y)` and return what was there.
    ///
    /// Air is left untouched. Anything else becomes air over the same
    /// underlay; the caller is responsible for particles, sound and loot.
    pub fn break_tile(&mut self, x: u32, y: u32) -> Result<TileInstance> {
        let index = self.index(x, y)?;
        let previous = self.tiles[index];
        if !previous.is_air() {
            self.tiles[index] = TileInstance::air(previous.underlay);
        }
        Ok(previous)
    }

    /// Deal `damage` to the tile at `(x, y)`, breaking it when its durability
    /// runs out. Damage is divided by the type's hardness and rounded down.
    pub fn damage_tile(
        &mut self,
        x: u32,
        y: u32,
        damage: u8,
        catalog: &TileCatalog,
    ) -> Result<DamageOutcome> {
        let index = self.index(x, y)?;
        let tile = self.tiles[index];
        if tile.is_air() {
            return Ok(DamageOutcome::Unaffected);
        }

        let hardness = catalog.lookup(tile.kind.id())?.durability_hardness;
        let effective = (damage as f32 / hardness).floor();
        if effective < 1.0 {
            return Ok(DamageOutcome::Unaffected);
        }

        let effective = effective.min(u8::MAX as f32) as u8;
        if effective >= tile.durability {
            self.tiles[index] = TileInstance::air(tile.underlay);
            return Ok(DamageOutcome::Broken(tile));
        }

        let remaining = tile.durability - effective;
        self.tiles[index].durability = remaining;
        Ok(DamageOutcome::Damaged { remaining })
    }

    /// Fill one whole row with copies of `value`
    pub fn fill_row(&mut self, y: u32, value: TileInstance) -> Result<()> {
        let start = self.index(0, y)?;
        let end = start + self.width as usize;
        self.tiles[start..end].fill(value);
        Ok(())
    }

    /// Iterate over every cell as `(position, tile)`, bottom row first
    pub fn iter(&self) -> impl Iterator<Item = (UVec2, &TileInstance)> + '_ {
        let width = self.width.max(1);
        self.tiles.iter().enumerate().map(move |(i, tile)| {
            let i = i as u32;
            (UVec2::new(i % width, i / width), tile)
        })
    }

    /// Count the cells matching `predicate`
    pub fn count(&self, predicate: impl Fn(&TileInstance) -> bool) -> usize {
        self.tiles.iter().filter(|tile| predicate(tile)).count()
    }

    pub fn count_kind(&self, kind: TileKind) -> usize {
        self.count(|tile| tile.kind == kind)
    }

    /// CRC32 over every cell, for comparing generated maps
    pub fn checksum(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.width.to_le_bytes());
        hasher.update(&self.height.to_le_bytes());
        for tile in &self.tiles {
            hasher.update(&tile.kind.id().to_le_bytes());
            hasher.update(&[
                tile.overlay as u8,
                tile.underlay as u8,
                tile.is_solid as u8,
                tile.durability,
            ]);
        }
        hasher.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stone_grid(catalog: &TileCatalog) -> TileGrid {
        let mut grid = TileGrid::new(UVec2::new(8, 6));
        let stone = catalog.instance(TileKind::Stone, Underlay::Stone);
        for y in 0..grid.height() {
            grid.fill_row(y, stone).unwrap();
        }
        grid
    }

    #[test]
    fn test_configure_resets_contents() {
        let catalog = TileCatalog::standard();
        let mut grid = stone_grid(&catalog);
        assert_eq!(grid.count_kind(TileKind::Stone), 48);

        grid.configure(3, 2);
        assert_eq!(grid.size(), UVec2::new(3, 2));
        assert_eq!(grid.count_kind(TileKind::Air), 6);
        assert!(grid.get(3, 0).is_err());
    }

    #[test]
    fn test_get_set_round_trip() {
        let catalog = TileCatalog::standard();
        let mut grid = TileGrid::new(UVec2::new(5, 4));
        let gold = catalog
            .instance(TileKind::Slate, Underlay::Basalt)
            .with_overlay(Overlay::Gold);

        for y in 0..4 {
            for x in 0..5 {
                grid.set(x, y, gold).unwrap();
                assert_eq!(grid.get(x, y), Ok(gold));
            }
        }
    }

    #[test]
    fn test_out_of_bounds() {
        let mut grid = TileGrid::new(UVec2::new(5, 4));
        let expected = MapError::OutOfBounds {
            x: 5,
            y: 0,
            width: 5,
            height: 4,
        };
        assert_eq!(grid.get(5, 0), Err(expected.clone()));
        assert_eq!(grid.set(5, 0, TileInstance::default()), Err(expected));
        assert!(grid.set_overlay(0, 4, Overlay::Iron).is_err());
        assert!(grid.set_underlay(9, 9, Underlay::Lava).is_err());
        assert!(grid.break_tile(0, 4).is_err());
    }

    #[test]
    fn test_is_air_out_of_range_is_false() {
        let grid = TileGrid::new(UVec2::new(2, 2));
        assert!(grid.is_air(1, 1));
        assert!(!grid.is_air(2, 1));
        assert!(!grid.is_air(u32::MAX, 0));
    }

    #[test]
    fn test_layer_setters_are_independent() {
        let catalog = TileCatalog::standard();
        let mut grid = stone_grid(&catalog);

        grid.set_overlay(2, 3, Overlay::Iron).unwrap();
        let tile = grid.get(2, 3).unwrap();
        assert_eq!(tile.kind, TileKind::Stone);
        assert_eq!(tile.underlay, Underlay::Stone);
        assert_eq!(tile.overlay, Overlay::Iron);

        grid.set_underlay(2, 3, Underlay::Lava).unwrap();
        let tile = grid.get(2, 3).unwrap();
        assert_eq!(tile.kind, TileKind::Stone);
        assert_eq!(tile.overlay, Overlay::Iron);
        assert_eq!(tile.underlay, Underlay::Lava);
        assert!(tile.is_solid);
    }

    #[test]
    fn test_break_tile_is_idempotent() {
        let catalog = TileCatalog::standard();
        let mut grid = stone_grid(&catalog);
        grid.set_overlay(1, 1, Overlay::Copper).unwrap();

        let first = grid.break_tile(1, 1).unwrap();
        assert_eq!(first.kind, TileKind::Stone);
        assert_eq!(first.overlay, Overlay::Copper);
        let after_first = grid.get(1, 1).unwrap();
        assert_eq!(after_first, TileInstance::air(Underlay::Stone));

        let second = grid.break_tile(1, 1).unwrap();
        assert_eq!(second, after_first);
        assert_eq!(grid.get(1, 1).unwrap(), after_first);
    }

    #[test]
    fn test_damage_tile() {
        let catalog = TileCatalog::standard();
        let mut grid = stone_grid(&catalog);

        // stone: 12 durability, hardness 1.5
        assert_eq!(
            grid.damage_tile(0, 0, 6, &catalog),
            Ok(DamageOutcome::Damaged { remaining: 8 })
        );
        assert_eq!(grid.damage_tile(0, 0, 1, &catalog), Ok(DamageOutcome::Unaffected));
        match grid.damage_tile(0, 0, 200, &catalog) {
            Ok(DamageOutcome::Broken(tile)) => assert_eq!(tile.durability, 8),
            other => panic!("expected broken tile, got {:?}", other),
        }
        assert!(grid.is_air(0, 0));
        assert_eq!(grid.damage_tile(0, 0, 200, &catalog), Ok(DamageOutcome::Unaffected));
    }

    #[test]
    fn test_bedrock_is_unbreakable() {
        let catalog = TileCatalog::standard();
        let mut grid = TileGrid::new(UVec2::new(1, 1));
        grid.set(0, 0, catalog.instance(TileKind::Bedrock, Underlay::Lava))
            .unwrap();
        assert_eq!(grid.damage_tile(0, 0, u8::MAX, &catalog), Ok(DamageOutcome::Unaffected));
        assert_eq!(grid.get(0, 0).unwrap().kind, TileKind::Bedrock);
    }

    #[test]
    fn test_iter_positions() {
        let grid = TileGrid::new(UVec2::new(3, 2));
        let positions: Vec<UVec2> = grid.iter().map(|(pos, _)| pos).collect();
        assert_eq!(positions.len(), 6);
        assert_eq!(positions[0], UVec2::new(0, 0));
        assert_eq!(positions[2], UVec2::new(2, 0));
        assert_eq!(positions[3], UVec2::new(0, 1));
    }

    #[test]
    fn test_checksum_tracks_content() {
        let catalog = TileCatalog::standard();
        let a = stone_grid(&catalog);
        let mut b = stone_grid(&catalog);
        assert_eq!(a.checksum(), b.checksum());

        b.set_overlay(4, 4, Overlay::Diamond).unwrap();
        assert_ne!(a.checksum(), b.checksum());
    }
}
