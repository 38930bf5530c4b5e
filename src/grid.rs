use crate::door::Door;
use crate::geometry::LineCollider;

/// Offsets of the eight neighbor cells, indexed by `NeighborMask` bit number:
/// 0 N, 1 S, 2 W, 3 E, 4 NW, 5 NE, 6 SW, 7 SE. Y grows downward.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

/// Occupancy bitboard of a cell's eight neighbors. A set bit means that
/// neighbor cannot be entered (nonzero material, closed door, or off-map).
///
/// Bit order is part of the public contract — consumers scan neighbors in
/// this order and tests pin it:
/// bit 0 N, bit 1 S, bit 2 W, bit 3 E, bit 4 NW, bit 5 NE, bit 6 SW, bit 7 SE.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NeighborMask(pub u8);

impl NeighborMask {
    pub const N: u8 = 1 << 0;
    pub const S: u8 = 1 << 1;
    pub const W: u8 = 1 << 2;
    pub const E: u8 = 1 << 3;
    pub const NW: u8 = 1 << 4;
    pub const NE: u8 = 1 << 5;
    pub const SW: u8 = 1 << 6;
    pub const SE: u8 = 1 << 7;

    /// All neighbors occupied (also the fail-closed answer for off-map cells)
    pub const FULL: NeighborMask = NeighborMask(0xFF);

    /// True if any of the given bits is set
    pub fn contains(&self, bits: u8) -> bool {
        self.0 & bits != 0
    }

    /// True if every neighbor is free
    pub fn is_clear(&self) -> bool {
        self.0 == 0
    }
}

/// Which half of a diagonal cell is solid. Named after the occupied triangle;
/// UpperRight/LowerLeft share the '\' edge, UpperLeft/LowerRight the '/' edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagonalOrientation {
    UpperRight,
    UpperLeft,
    LowerRight,
    LowerLeft,
}

impl DiagonalOrientation {
    /// Endpoints of the diagonal edge of cell (x, y) in world coordinates.
    /// The '\' edge runs top-left to bottom-right, the '/' edge bottom-left
    /// to top-right; the edge parameter used for texturing follows that
    /// direction.
    pub fn edge(&self, x: i32, y: i32) -> ((f32, f32), (f32, f32)) {
        let (x0, y0) = (x as f32, y as f32);
        let (x1, y1) = (x0 + 1.0, y0 + 1.0);
        match self {
            DiagonalOrientation::UpperRight | DiagonalOrientation::LowerLeft => {
                ((x0, y0), (x1, y1))
            }
            DiagonalOrientation::UpperLeft | DiagonalOrientation::LowerRight => {
                ((x0, y1), (x1, y0))
            }
        }
    }
}

/// Tile map plus everything derived from it: material layers, door panels,
/// and the per-cell neighbor occupancy masks.
///
/// Cell values: 0 = passable, > 0 = wall material, < 0 = diagonal wall
/// material (half the cell is solid). Door cells keep material 0; their
/// passability comes from the panel extent.
///
/// Fields are public for tests and loaders, but mutation at runtime should
/// go through `set_cell` / `toggle_door` / `update` so the masks and the
/// revision counter stay consistent.
#[derive(Clone)]
pub struct Grid {
    pub rows: i32,
    pub cols: i32,
    /// Wall materials, row-major (`id = x + y * cols`)
    pub cells: Vec<i32>,
    /// Floor materials per cell
    pub floors: Vec<i32>,
    /// Ceiling materials per cell
    pub ceilings: Vec<i32>,
    /// Light level per cell, 0.0 dark to 1.0 full
    pub light: Vec<f32>,
    pub doors: Vec<Door>,
    /// Cached neighbor occupancy, rebuilt around every passability change
    pub masks: Vec<NeighborMask>,
    /// Revision number - incremented whenever passability changes
    pub revision: u64,
}

impl Grid {
    /// Create a new grid with all cells passable, default floor/ceiling
    /// materials and full light.
    pub fn new(rows: i32, cols: i32) -> Self {
        let count = (rows * cols) as usize;
        let mut grid = Grid {
            rows,
            cols,
            cells: vec![0; count],
            floors: vec![1; count],
            ceilings: vec![2; count],
            light: vec![1.0; count],
            doors: Vec::new(),
            masks: vec![NeighborMask::default(); count],
            revision: 0,
        };
        grid.recompute_masks();
        grid
    }

    /// Create a grid with specific cells set to wall material 1
    pub fn with_blocked(rows: i32, cols: i32, blocked: &[i32]) -> Self {
        let mut grid = Self::new(rows, cols);
        for &cell_id in blocked {
            if cell_id >= 0 && cell_id < (rows * cols) {
                grid.cells[cell_id as usize] = 1;
            }
        }
        grid.recompute_masks();
        grid
    }

    /// Convert (x, y) coordinates to cell ID
    pub fn get_id(&self, x: i32, y: i32) -> i32 {
        x + y * self.cols
    }

    /// Convert cell ID to (x, y) coordinates
    pub fn get_coords(&self, id: i32) -> (i32, i32) {
        (id % self.cols, id / self.cols)
    }

    /// Whether (x, y) lies on the map
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.cols && y >= 0 && y < self.rows
    }

    /// Whether an agent may stand in cell (x, y). Off-map cells are not
    /// passable, nor is any nonzero material; a door cell is passable only
    /// while its panel is retracted.
    pub fn is_passable(&self, x: i32, y: i32) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        if self.cells[self.get_id(x, y) as usize] != 0 {
            return false;
        }
        match self.door_at(x, y) {
            Some(door) => door.is_open(),
            None => true,
        }
    }

    /// `is_passable` by cell ID
    pub fn is_passable_id(&self, id: i32) -> bool {
        if id < 0 || id >= self.rows * self.cols {
            return false;
        }
        let (x, y) = self.get_coords(id);
        self.is_passable(x, y)
    }

    /// Get wall material at (x, y); out of bounds reads as material 1
    pub fn get_cell(&self, x: i32, y: i32) -> i32 {
        if !self.in_bounds(x, y) {
            return 1;
        }
        self.cells[self.get_id(x, y) as usize]
    }

    /// Set wall material at (x, y), keeping masks and revision current
    pub fn set_cell(&mut self, x: i32, y: i32, value: i32) {
        if self.in_bounds(x, y) {
            let id = self.get_id(x, y) as usize;
            if self.cells[id] != value {
                self.cells[id] = value;
                self.recompute_masks_around(x, y);
                self.revision += 1;
            }
        }
    }

    /// Floor material at (x, y); 0 off-map
    pub fn get_floor(&self, x: i32, y: i32) -> i32 {
        if !self.in_bounds(x, y) {
            return 0;
        }
        self.floors[self.get_id(x, y) as usize]
    }

    /// Ceiling material at (x, y); 0 off-map
    pub fn get_ceiling(&self, x: i32, y: i32) -> i32 {
        if !self.in_bounds(x, y) {
            return 0;
        }
        self.ceilings[self.get_id(x, y) as usize]
    }

    /// Light level at (x, y); 0.0 off-map
    pub fn get_light(&self, x: i32, y: i32) -> f32 {
        if !self.in_bounds(x, y) {
            return 0.0;
        }
        self.light[self.get_id(x, y) as usize]
    }

    /// Get current grid revision number
    pub fn get_revision(&self) -> u64 {
        self.revision
    }

    /// Precomputed neighbor occupancy of (x, y); off-map cells answer FULL
    pub fn neighbors(&self, x: i32, y: i32) -> NeighborMask {
        if !self.in_bounds(x, y) {
            return NeighborMask::FULL;
        }
        self.masks[self.get_id(x, y) as usize]
    }

    fn compute_mask(&self, x: i32, y: i32) -> NeighborMask {
        let mut bits = 0u8;
        for (i, (dx, dy)) in NEIGHBOR_OFFSETS.iter().enumerate() {
            if !self.is_passable(x + dx, y + dy) {
                bits |= 1 << i;
            }
        }
        NeighborMask(bits)
    }

    /// Rebuild every cell's neighbor mask. Loaders call this once after
    /// filling the layers directly.
    pub fn recompute_masks(&mut self) {
        for y in 0..self.rows {
            for x in 0..self.cols {
                let id = self.get_id(x, y) as usize;
                self.masks[id] = self.compute_mask(x, y);
            }
        }
    }

    /// Rebuild the masks of the 3x3 block around a cell whose occupancy
    /// changed. Only the surrounding cells reference it, so this is enough.
    fn recompute_masks_around(&mut self, x: i32, y: i32) {
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (x + dx, y + dy);
                if self.in_bounds(nx, ny) {
                    let id = self.get_id(nx, ny) as usize;
                    self.masks[id] = self.compute_mask(nx, ny);
                }
            }
        }
    }

    /// The door occupying cell (x, y), if any
    pub fn door_at(&self, x: i32, y: i32) -> Option<&Door> {
        self.doors.iter().find(|d| d.cell_x == x && d.cell_y == y)
    }

    /// Install a door. Its cell keeps material 0; the panel decides
    /// passability from here on.
    pub fn add_door(&mut self, door: Door) {
        let (x, y) = (door.cell_x, door.cell_y);
        self.doors.push(door);
        self.recompute_masks_around(x, y);
        self.revision += 1;
    }

    /// Flip the target extent of the door under a world position. Returns
    /// false when the containing tile has no door. The panel itself moves in
    /// `update`; passability changes only when it crosses its threshold.
    pub fn toggle_door(&mut self, pos: (f32, f32)) -> bool {
        let (x, y) = (pos.0.floor() as i32, pos.1.floor() as i32);
        match self
            .doors
            .iter_mut()
            .find(|d| d.cell_x == x && d.cell_y == y)
        {
            Some(door) => {
                door.toggle();
                true
            }
            None => false,
        }
    }

    /// Advance every door panel. Cells whose door crossed its open/closed
    /// threshold get their neighborhood masks rebuilt and bump the revision;
    /// the crossed cells are returned so callers can react (logging, audio).
    pub fn update(&mut self, delta_time: f32) -> Vec<(i32, i32)> {
        let mut crossed = Vec::new();
        for door in &mut self.doors {
            if door.update(delta_time) {
                crossed.push((door.cell_x, door.cell_y));
            }
        }
        for &(x, y) in &crossed {
            self.recompute_masks_around(x, y);
            self.revision += 1;
        }
        crossed
    }

    /// Which half of diagonal cell (x, y) is solid. Derived from wall
    /// materials only, scanning orthogonal neighbor pairs in fixed priority:
    /// (N,E) upper-right, (N,W) upper-left, (S,E) lower-right, (S,W)
    /// lower-left; the first pair with material on both sides wins, and an
    /// ambiguous cell falls back to upper-right. Door state never enters
    /// here, so the answer is stable at runtime.
    pub fn diagonal_orientation(&self, x: i32, y: i32) -> DiagonalOrientation {
        let n = self.get_cell(x, y - 1) != 0;
        let s = self.get_cell(x, y + 1) != 0;
        let w = self.get_cell(x - 1, y) != 0;
        let e = self.get_cell(x + 1, y) != 0;
        if n && e {
            DiagonalOrientation::UpperRight
        } else if n && w {
            DiagonalOrientation::UpperLeft
        } else if s && e {
            DiagonalOrientation::LowerRight
        } else if s && w {
            DiagonalOrientation::LowerLeft
        } else {
            DiagonalOrientation::UpperRight
        }
    }

    /// Collect the collision segments an agent standing in cell (x, y) can
    /// touch, for `geometry::segment_push`. Clears `out` first.
    ///
    /// Material neighbors contribute cell edges from the neighbor mask:
    /// occupied cardinals the shared edge, occupied diagonals the two corner
    /// faces they expose, each only when the cardinal cell that face borders
    /// is free (a face between two solid cells is interior and must not
    /// snag bodies sliding along the wall). Door cells never contribute
    /// edges; nearby panels are pushed at their live extent instead, so a
    /// sliding panel blocks exactly where it currently is. Standing inside a
    /// diagonal cell adds its hypotenuse.
    pub fn wall_colliders(&self, x: i32, y: i32, out: &mut Vec<LineCollider>) {
        out.clear();
        let mask = self.neighbors(x, y);
        let (x0, y0) = (x as f32, y as f32);
        let (x1, y1) = (x0 + 1.0, y0 + 1.0);

        let n = mask.contains(NeighborMask::N);
        let s = mask.contains(NeighborMask::S);
        let w = mask.contains(NeighborMask::W);
        let e = mask.contains(NeighborMask::E);

        let mut edge = |nx: i32, ny: i32, a: (f32, f32), b: (f32, f32)| {
            if self.door_at(nx, ny).is_none() {
                out.push(LineCollider::from_points(a, b));
            }
        };

        if n {
            edge(x, y - 1, (x0, y0), (x1, y0));
        }
        if s {
            edge(x, y + 1, (x0, y1), (x1, y1));
        }
        if w {
            edge(x - 1, y, (x0, y0), (x0, y1));
        }
        if e {
            edge(x + 1, y, (x1, y0), (x1, y1));
        }

        if mask.contains(NeighborMask::NW) {
            if !w {
                edge(x - 1, y - 1, (x0 - 1.0, y0), (x0, y0));
            }
            if !n {
                edge(x - 1, y - 1, (x0, y0 - 1.0), (x0, y0));
            }
        }
        if mask.contains(NeighborMask::NE) {
            if !e {
                edge(x + 1, y - 1, (x1, y0), (x1 + 1.0, y0));
            }
            if !n {
                edge(x + 1, y - 1, (x1, y0 - 1.0), (x1, y0));
            }
        }
        if mask.contains(NeighborMask::SW) {
            if !w {
                edge(x - 1, y + 1, (x0 - 1.0, y1), (x0, y1));
            }
            if !s {
                edge(x - 1, y + 1, (x0, y1), (x0, y1 + 1.0));
            }
        }
        if mask.contains(NeighborMask::SE) {
            if !e {
                edge(x + 1, y + 1, (x1, y1), (x1 + 1.0, y1));
            }
            if !s {
                edge(x + 1, y + 1, (x1, y1), (x1, y1 + 1.0));
            }
        }

        if self.get_cell(x, y) < 0 {
            let (a, b) = self.diagonal_orientation(x, y).edge(x, y);
            out.push(LineCollider::from_points(a, b));
        }

        for door in &self.doors {
            if (door.cell_x - x).abs() <= 1 && (door.cell_y - y).abs() <= 1 && door.extent > 0.0 {
                out.push(door.collider());
            }
        }
    }

    /// Render the map as ASCII rows for debugging: '.' passable, '#'
    /// material 1, digits for higher materials, '/' and '\' for diagonal
    /// cells, 'D' closed door, 'd' open door.
    pub fn to_ascii(&self) -> String {
        let mut text = String::with_capacity(((self.cols + 1) * self.rows) as usize);
        for y in 0..self.rows {
            for x in 0..self.cols {
                let material = self.cells[self.get_id(x, y) as usize];
                let ch = if let Some(door) = self.door_at(x, y) {
                    if door.is_open() {
                        'd'
                    } else {
                        'D'
                    }
                } else if material < 0 {
                    match self.diagonal_orientation(x, y) {
                        DiagonalOrientation::UpperRight | DiagonalOrientation::LowerLeft => '\\',
                        DiagonalOrientation::UpperLeft | DiagonalOrientation::LowerRight => '/',
                    }
                } else {
                    match material {
                        0 => '.',
                        1 => '#',
                        2..=9 => (b'0' + material as u8) as char,
                        _ => '?',
                    }
                };
                text.push(ch);
            }
            text.push('\n');
        }
        text
    }
}
