use bevy::prelude::*;

use super::slot::{RenderContext, SpriteLookup, TileSlot};
use crate::error::{MapError, Result};

struct SlotCell<S> {
    slot: S,
    bound: Option<UVec2>,
}

/// A fixed pool of render slots scrolled over the grid.
///
/// Slot `(row, col)` always shows the one cell of the visible rectangle
/// whose coordinates are congruent to `(col, row)` modulo the pool size, so
/// scrolling by one tile only rebinds the row or column that fell off the
/// edge. The corner is the bottom-left cell shown and is clamped so the
/// window never leaves the map.
pub struct ViewportWindow<S> {
    map_size: UVec2,
    size: UVec2,
    corner: UVec2,
    /// `rows[row][col]`
    rows: Vec<Vec<SlotCell<S>>>,
}

impl<S> ViewportWindow<S> {
    /// An empty window over a map of `map_size`
    pub fn new(map_size: UVec2) -> Self {
        Self {
            map_size,
            size: UVec2::ZERO,
            corner: UVec2::ZERO,
            rows: Vec::new(),
        }
    }

    pub fn map_size(&self) -> UVec2 {
        self.map_size
    }

    /// Pool size as `(width, height)` in tiles
    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn corner(&self) -> UVec2 {
        self.corner
    }

    /// Resize the pool to `size`.
    ///
    /// Slots whose `(row, col)` exists in both sizes are kept as they are;
    /// missing ones come from `factory`, which receives `(col, row)`. Slots
    /// that no longer fit are handed back so their resources can be freed.
    /// Every binding is cleared; call `rerender_all` afterwards.
    pub fn configure_pool(
        &mut self,
        size: UVec2,
        mut factory: impl FnMut(UVec2) -> S,
    ) -> Result<Vec<S>> {
        if size.x > self.map_size.x || size.y > self.map_size.y {
            return Err(MapError::WindowExceedsMap {
                window: size,
                map: self.map_size,
            });
        }

        let mut retired = Vec::new();
        let mut old_rows = std::mem::take(&mut self.rows).into_iter();
        for row in 0..size.y {
            let mut cells = old_rows.next().unwrap_or_default();
            if cells.len() > size.x as usize {
                retired.extend(cells.drain(size.x as usize..).map(|cell| cell.slot));
            }
            for cell in cells.iter_mut() {
                cell.bound = None;
            }
            for col in cells.len() as u32..size.x {
                cells.push(SlotCell {
                    slot: factory(UVec2::new(col, row)),
                    bound: None,
                });
            }
            self.rows.push(cells);
        }
        retired.extend(old_rows.flatten().map(|cell| cell.slot));

        self.size = size;
        self.corner = self.clamp_corner(self.corner);
        debug!(
            "Render pool resized to {}x{}, {} slots retired",
            size.x,
            size.y,
            retired.len()
        );
        Ok(retired)
    }

    /// Grid cell currently shown by slot `(row, col)`, if any
    pub fn binding(&self, row: u32, col: u32) -> Option<UVec2> {
        self.cell(row, col).and_then(|cell| cell.bound)
    }

    pub fn slot(&self, row: u32, col: u32) -> Option<&S> {
        self.cell(row, col).map(|cell| &cell.slot)
    }

    pub fn slot_mut(&mut self, row: u32, col: u32) -> Option<&mut S> {
        self.rows
            .get_mut(row as usize)
            .and_then(|cells| cells.get_mut(col as usize))
            .map(|cell| &mut cell.slot)
    }

    /// Every slot with its `(col, row)` pool position
    pub fn slots(&self) -> impl Iterator<Item = (UVec2, &S)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .map(move |(col, cell)| (UVec2::new(col as u32, row as u32), &cell.slot))
        })
    }

    /// Mutable access to every slot, for hosts that apply visuals lazily
    pub fn slots_mut(&mut self) -> impl Iterator<Item = &mut S> + '_ {
        self.rows
            .iter_mut()
            .flat_map(|cells| cells.iter_mut().map(|cell| &mut cell.slot))
    }

    /// Every bound grid cell
    pub fn bound_cells(&self) -> impl Iterator<Item = UVec2> + '_ {
        self.rows
            .iter()
            .flat_map(|cells| cells.iter().filter_map(|cell| cell.bound))
    }

    /// Whether `cell` lies inside the visible rectangle
    pub fn contains_cell(&self, cell: UVec2) -> bool {
        cell.cmpge(self.corner).all() && cell.cmplt(self.corner + self.size).all()
    }

    fn cell(&self, row: u32, col: u32) -> Option<&SlotCell<S>> {
        self.rows.get(row as usize)?.get(col as usize)
    }

    fn clamp_corner(&self, corner: UVec2) -> UVec2 {
        corner.min(self.map_size.saturating_sub(self.size))
    }

    /// Move the corner to `new_corner` (clamped) and rebind the rows and
    /// columns that scrolled into view. Returns the committed corner.
    ///
    /// A slot whose visual cannot be built is left unbound; the first such
    /// error is returned after the corner has been committed.
    pub fn set_corner<L, Sp>(
        &mut self,
        new_corner: UVec2,
        ctx: &RenderContext<'_, L>,
    ) -> Result<UVec2>
    where
        L: SpriteLookup<Sprite = Sp>,
        S: TileSlot<Sp>,
    {
        let new_corner = self.clamp_corner(new_corner);
        let cols = marked_indices(self.corner.x, new_corner.x, self.size.x);
        let rows = marked_indices(self.corner.y, new_corner.y, self.size.y);

        let mut first_error = None;
        if cols.iter().any(|&m| m) || rows.iter().any(|&m| m) {
            debug!("Window corner {} -> {}", self.corner, new_corner);
            for row in 0..self.size.y {
                for col in 0..self.size.x {
                    if rows[row as usize] || cols[col as usize] {
                        if let Err(e) = self.bind(row, col, new_corner, ctx) {
                            first_error.get_or_insert(e);
                        }
                    }
                }
            }
        }

        self.corner = new_corner;
        match first_error {
            Some(e) => Err(e),
            None => Ok(new_corner),
        }
    }

    /// Move the corner by `delta` tiles, stopping at the map edges
    pub fn move_corner<L, Sp>(&mut self, delta: IVec2, ctx: &RenderContext<'_, L>) -> Result<UVec2>
    where
        L: SpriteLookup<Sprite = Sp>,
        S: TileSlot<Sp>,
    {
        let target = (self.corner.as_ivec2() + delta).max(IVec2::ZERO).as_uvec2();
        self.set_corner(target, ctx)
    }

    /// Rebind every slot for the current corner
    pub fn rerender_all<L, Sp>(&mut self, ctx: &RenderContext<'_, L>) -> Result<()>
    where
        L: SpriteLookup<Sprite = Sp>,
        S: TileSlot<Sp>,
    {
        let mut first_error = None;
        for row in 0..self.size.y {
            for col in 0..self.size.x {
                if let Err(e) = self.bind(row, col, self.corner, ctx) {
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Redraw the slot showing `cell`. `Ok(false)` if it is off screen.
    pub fn refresh_cell<L, Sp>(&mut self, cell: UVec2, ctx: &RenderContext<'_, L>) -> Result<bool>
    where
        L: SpriteLookup<Sprite = Sp>,
        S: TileSlot<Sp>,
    {
        if !self.contains_cell(cell) {
            return Ok(false);
        }
        let (row, col) = (cell.y % self.size.y, cell.x % self.size.x);
        self.bind(row, col, self.corner, ctx)?;
        Ok(true)
    }

    fn bind<L, Sp>(
        &mut self,
        row: u32,
        col: u32,
        corner: UVec2,
        ctx: &RenderContext<'_, L>,
    ) -> Result<()>
    where
        L: SpriteLookup<Sprite = Sp>,
        S: TileSlot<Sp>,
    {
        let target = UVec2::new(
            wrapped_cell(corner.x, col, self.size.x),
            wrapped_cell(corner.y, row, self.size.y),
        );
        let cell = &mut self.rows[row as usize][col as usize];
        match ctx.visual(target) {
            Ok(visual) => {
                cell.slot.configure(&visual);
                cell.bound = Some(target);
                Ok(())
            }
            Err(e) => {
                warn!("Slot ({}, {}) cannot show {}: {}", col, row, target, e);
                cell.bound = None;
                Err(e)
            }
        }
    }
}

/// Grid coordinate shown at pool `index` along one axis: the smallest
/// `chunk * size + index` that is not left of `corner`.
fn wrapped_cell(corner: u32, index: u32, size: u32) -> u32 {
    let chunk = if corner > index {
        (corner - index).div_ceil(size)
    } else {
        0
    };
    chunk * size + index
}

/// Pool indices along one axis that must rebind when the corner moves from
/// `old` to `new`
fn marked_indices(old: u32, new: u32, size: u32) -> Vec<bool> {
    let mut marked = vec![false; size as usize];
    if size == 0 {
        return marked;
    }
    let delta = new as i64 - old as i64;
    let steps = delta.unsigned_abs().min(size as u64) as i64;
    for i in 0..steps {
        let index = if delta > 0 {
            old as i64 + i
        } else {
            old as i64 - 1 - i
        };
        marked[index.rem_euclid(size as i64) as usize] = true;
    }
    marked
}
