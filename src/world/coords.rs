use bevy::prelude::*;

/// Converts between world-space positions and grid cells.
///
/// Cell `(0, 0)` sits at the map offset; cells grow right and up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    pub tile_size: f32,
    pub map_size: UVec2,
}

impl CoordinateMapper {
    pub fn new(tile_size: f32, map_size: UVec2) -> Self {
        Self {
            tile_size,
            map_size,
        }
    }

    /// Grid cell under `position`.
    ///
    /// Truncates toward zero and clamps into the grid, so positions off the
    /// map land on the nearest edge tile.
    pub fn world_to_grid(&self, position: Vec2, map_offset: Vec2) -> UVec2 {
        let local = (position - map_offset) / self.tile_size;
        UVec2::new(
            clamp_axis(local.x, self.map_size.x),
            clamp_axis(local.y, self.map_size.y),
        )
    }

    /// World position of `cell`; the exact inverse of the unclamped mapping
    pub fn grid_to_world(&self, cell: UVec2, map_offset: Vec2) -> Vec2 {
        map_offset + cell.as_vec2() * self.tile_size
    }
}

fn clamp_axis(value: f32, dim: u32) -> u32 {
    if dim == 0 {
        return 0;
    }
    // `as` saturates: NaN and negatives become 0
    (value.trunc() as i64).clamp(0, dim as i64 - 1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new(8.0, UVec2::new(30, 120))
    }

    #[test]
    fn test_world_to_grid() {
        let m = mapper();
        let offset = Vec2::new(-8.0, 0.0);

        assert_eq!(m.world_to_grid(Vec2::new(-8.0, 0.0), offset), UVec2::new(0, 0));
        assert_eq!(m.world_to_grid(Vec2::new(12.0, 17.0), offset), UVec2::new(2, 2));
        assert_eq!(m.world_to_grid(Vec2::new(15.9, 23.9), offset), UVec2::new(2, 2));
    }

    #[test]
    fn test_world_to_grid_clamps_to_edges() {
        let m = mapper();

        assert_eq!(m.world_to_grid(Vec2::new(-100.0, -3.0), Vec2::ZERO), UVec2::new(0, 0));
        assert_eq!(m.world_to_grid(Vec2::new(1.0e6, 1.0e6), Vec2::ZERO), UVec2::new(29, 119));
        assert_eq!(m.world_to_grid(Vec2::new(f32::NAN, 16.0), Vec2::ZERO), UVec2::new(0, 2));
    }

    #[test]
    fn test_grid_to_world_inverse() {
        let m = mapper();
        let offset = Vec2::new(40.0, -24.0);

        for cell in [UVec2::new(0, 0), UVec2::new(7, 3), UVec2::new(29, 119)] {
            let world = m.grid_to_world(cell, offset);
            assert_eq!(world, offset + cell.as_vec2() * 8.0);
            assert_eq!(m.world_to_grid(world, offset), cell);
        }
    }

    #[test]
    fn test_empty_map() {
        let m = CoordinateMapper::new(8.0, UVec2::ZERO);
        assert_eq!(m.world_to_grid(Vec2::new(50.0, 50.0), Vec2::ZERO), UVec2::ZERO);
    }
}
