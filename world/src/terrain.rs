use vanguard_core::{CellCoord, Point};

const BUILDABLE: u8 = 0b0001;
const PATHABLE: u8 = 0b0010;
const CREEP: u8 = 0b0100;
const EXPLORED: u8 = 0b1000;

/// Dense per-cell terrain flags reported by the game.
///
/// Cells outside the grid are neither buildable nor pathable.
#[derive(Clone, Debug)]
pub struct TerrainGrid {
    width: u32,
    height: u32,
    cells: Vec<u8>,
}

impl TerrainGrid {
    /// Creates a grid where every cell is buildable, pathable, explored and free of creep.
    #[must_use]
    pub fn open(width: u32, height: u32) -> Self {
        let capacity = u64::from(width) * u64::from(height);
        let capacity = usize::try_from(capacity).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![BUILDABLE | PATHABLE | EXPLORED; capacity],
        }
    }

    /// Width of the grid measured in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the grid measured in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Marks a rectangle of cells as unbuildable and unpathable, such as cliffs.
    pub fn block(&mut self, origin: CellCoord, width: i32, height: i32) {
        self.update(origin, width, height, |flags| {
            *flags &= !(BUILDABLE | PATHABLE);
        });
    }

    /// Marks a rectangle of cells as pathable but not buildable, such as ramps.
    pub fn forbid_building(&mut self, origin: CellCoord, width: i32, height: i32) {
        self.update(origin, width, height, |flags| *flags &= !BUILDABLE);
    }

    /// Covers a rectangle of cells with creep.
    pub fn spread_creep(&mut self, origin: CellCoord, width: i32, height: i32) {
        self.update(origin, width, height, |flags| *flags |= CREEP);
    }

    /// Marks a rectangle of cells as never seen.
    pub fn hide(&mut self, origin: CellCoord, width: i32, height: i32) {
        self.update(origin, width, height, |flags| *flags &= !EXPLORED);
    }

    fn update<F>(&mut self, origin: CellCoord, width: i32, height: i32, mut apply: F)
    where
        F: FnMut(&mut u8),
    {
        for y in origin.y()..origin.y() + height {
            for x in origin.x()..origin.x() + width {
                if let Some(index) = self.index(CellCoord::new(x, y)) {
                    if let Some(flags) = self.cells.get_mut(index) {
                        apply(flags);
                    }
                }
            }
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let x = u32::try_from(cell.x()).ok()?;
        let y = u32::try_from(cell.y()).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        let row = usize::try_from(y).ok()?;
        let column = usize::try_from(x).ok()?;
        let width = usize::try_from(self.width).ok()?;
        Some(row * width + column)
    }

    fn flags(&self, cell: CellCoord) -> u8 {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(0)
    }

    /// Whether structures may be placed on the cell.
    #[must_use]
    pub fn is_buildable(&self, cell: CellCoord) -> bool {
        self.flags(cell) & BUILDABLE != 0
    }

    /// Whether ground units may walk over the cell.
    #[must_use]
    pub fn is_pathable(&self, cell: CellCoord) -> bool {
        self.flags(cell) & PATHABLE != 0
    }

    /// Whether the cell is covered with creep.
    #[must_use]
    pub fn has_creep(&self, cell: CellCoord) -> bool {
        self.flags(cell) & CREEP != 0
    }

    /// Whether the agent has ever seen the cell containing `point`.
    #[must_use]
    pub fn is_explored(&self, point: Point) -> bool {
        self.flags(point.cell()) & EXPLORED != 0
    }

    /// Whether every cell is buildable, pathable and free of creep.
    #[must_use]
    pub fn is_clear(&self, cells: &[CellCoord]) -> bool {
        cells.iter().all(|cell| {
            let flags = self.flags(*cell);
            flags & BUILDABLE != 0 && flags & PATHABLE != 0 && flags & CREEP == 0
        })
    }
}
