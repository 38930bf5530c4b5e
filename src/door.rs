use crate::geometry::LineCollider;
use serde::{Deserialize, Serialize};

/// Extent below which a door counts as fully retracted and therefore passable.
pub const DOOR_EPSILON: f32 = 0.01;

/// Default panel slide speed in cells per second.
pub const DOOR_SLIDE_SPEED: f32 = 1.5;

/// Which way a door panel spans its cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorAxis {
    /// Panel spans the cell left-to-right (blocks a north-south passage)
    Horizontal,
    /// Panel spans the cell top-to-bottom (blocks an east-west passage)
    Vertical,
}

/// A sliding door panel anchored to one grid cell.
///
/// The panel is a segment growing out of the cell jamb; `extent` is its
/// current length. Fully retracted the cell is passable; any longer extent
/// blocks movement and sight. A toggle only flips the target extent — the
/// panel reaches it over subsequent `update` calls.
#[derive(Clone, Debug)]
pub struct Door {
    /// Cell holding the panel
    pub cell_x: i32,
    pub cell_y: i32,
    pub axis: DoorAxis,
    /// Current extended length, 0.0 (open) to `length` (closed)
    pub extent: f32,
    /// Extent the panel is animating toward
    pub target: f32,
    /// Full panel length
    pub length: f32,
    /// Slide speed in cells per second
    pub speed: f32,
}

impl Door {
    /// Create a closed door filling its cell.
    pub fn new(cell_x: i32, cell_y: i32, axis: DoorAxis) -> Self {
        Door {
            cell_x,
            cell_y,
            axis,
            extent: 1.0,
            target: 1.0,
            length: 1.0,
            speed: DOOR_SLIDE_SPEED,
        }
    }

    /// Whether the panel is retracted far enough to pass through.
    pub fn is_open(&self) -> bool {
        self.extent < DOOR_EPSILON
    }

    /// Flip the animation target between fully open and fully closed.
    pub fn toggle(&mut self) {
        self.target = if self.target < self.length * 0.5 {
            self.length
        } else {
            0.0
        };
    }

    /// Advance the panel toward its target extent.
    ///
    /// Returns true when this step crossed the open/closed threshold — the
    /// only moment the owning grid needs to refresh passability caches.
    pub fn update(&mut self, delta_time: f32) -> bool {
        if self.extent == self.target {
            return false;
        }
        let was_open = self.is_open();

        let step = self.speed * delta_time;
        let gap = self.target - self.extent;
        if gap.abs() <= step {
            self.extent = self.target;
        } else if gap > 0.0 {
            self.extent += step;
        } else {
            self.extent -= step;
        }

        was_open != self.is_open()
    }

    /// The panel as a collision/occlusion segment at its current extent.
    /// A retracted panel yields a degenerate collider that nothing hits.
    pub fn collider(&self) -> LineCollider {
        let (origin, dir) = match self.axis {
            DoorAxis::Horizontal => (
                (self.cell_x as f32, self.cell_y as f32 + 0.5),
                (1.0, 0.0),
            ),
            DoorAxis::Vertical => (
                (self.cell_x as f32 + 0.5, self.cell_y as f32),
                (0.0, 1.0),
            ),
        };
        LineCollider::new(origin, dir, self.extent)
    }
}
