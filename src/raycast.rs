use crate::geometry::{segment_intersection, GEOM_EPSILON};
use crate::grid::Grid;

/// Light-level difference between adjacent cells above which a floor run is
/// cut, so the renderer can restart shading and avoid visible banding.
pub const LIGHT_BAND_LIMIT: f32 = 0.25;

/// Guard value standing in for an infinite per-axis step distance
const NO_STEP: f32 = 1e8;

/// Which boundary a cast terminated on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitSide {
    /// Crossed a vertical gridline (west/east cell face)
    AxisX,
    /// Crossed a horizontal gridline (north/south cell face)
    AxisY,
    /// Struck the hypotenuse of a diagonal cell
    Diagonal,
    /// Left the map without striking material
    OffMap,
    /// Floor run stopped by the caller's distance cap
    Capped,
}

/// Result of a wall cast
#[derive(Clone, Copy, Debug)]
pub struct HitInfo {
    /// Euclidean distance from the origin along the normalized ray, so
    /// `origin + dir * distance` is the hit point exactly
    pub distance: f32,
    pub side: HitSide,
    /// Material of the struck cell; 0 when nothing was hit
    pub material: i32,
    /// Fractional position across the struck face in 0..1: world-Y fraction
    /// for AxisX hits, world-X fraction for AxisY hits, the edge parameter
    /// for diagonal hits
    pub texture_coord: f32,
    pub world_x: f32,
    pub world_y: f32,
}

/// Result of a floor/ceiling run cast
#[derive(Clone, Copy, Debug)]
pub struct FloorHit {
    pub distance: f32,
    pub side: HitSide,
    /// Materials of the run the cast traveled through, not of the cell that
    /// ended it — the renderer draws the span it just crossed
    pub floor_material: i32,
    pub ceiling_material: i32,
    pub world_x: f32,
    pub world_y: f32,
}

fn miss(origin: (f32, f32)) -> HitInfo {
    HitInfo {
        distance: 0.0,
        side: HitSide::OffMap,
        material: 0,
        texture_coord: 0.0,
        world_x: origin.0,
        world_y: origin.1,
    }
}

/// Cast a ray until it strikes wall material, walking the grid cell-by-cell
/// along whichever axis has the smaller accumulated side distance (DDA).
///
/// The direction is normalized internally; a zero direction is a miss. The
/// origin's own cell can never produce an axis hit — only its diagonal edge
/// can, since a ray may start inside the solid half of a diagonal cell.
/// Rays pass straight through door cells; renderers draw panels from their
/// segment and sight checks go through `line_of_sight`.
pub fn cast_wall(grid: &Grid, origin: (f32, f32), dir: (f32, f32)) -> HitInfo {
    let mag = (dir.0 * dir.0 + dir.1 * dir.1).sqrt();
    if mag < GEOM_EPSILON {
        return miss(origin);
    }
    let dir_x = dir.0 / mag;
    let dir_y = dir.1 / mag;

    let mut map_x = origin.0.floor() as i32;
    let mut map_y = origin.1.floor() as i32;

    let delta_dist_x = if dir_x.abs() < GEOM_EPSILON {
        NO_STEP
    } else {
        (1.0 / dir_x).abs()
    };
    let delta_dist_y = if dir_y.abs() < GEOM_EPSILON {
        NO_STEP
    } else {
        (1.0 / dir_y).abs()
    };

    let (step_x, mut side_dist_x) = if dir_x < 0.0 {
        (-1, (origin.0 - map_x as f32) * delta_dist_x)
    } else {
        (1, (map_x as f32 + 1.0 - origin.0) * delta_dist_x)
    };
    let (step_y, mut side_dist_y) = if dir_y < 0.0 {
        (-1, (origin.1 - map_y as f32) * delta_dist_y)
    } else {
        (1, (map_y as f32 + 1.0 - origin.1) * delta_dist_y)
    };

    loop {
        // A diagonal cell's solid half can only be entered across its edge,
        // and the origin may already sit inside that half, so the edge is
        // probed before the step that would leave the cell.
        if grid.in_bounds(map_x, map_y) && grid.get_cell(map_x, map_y) < 0 {
            let (a, b) = grid.diagonal_orientation(map_x, map_y).edge(map_x, map_y);
            let ahead = (origin.0 + dir_x, origin.1 + dir_y);
            if let Some((hx, hy)) = segment_intersection(a, b, origin, ahead, true) {
                let distance = (hx - origin.0) * dir_x + (hy - origin.1) * dir_y;
                return HitInfo {
                    distance,
                    side: HitSide::Diagonal,
                    material: grid.get_cell(map_x, map_y),
                    texture_coord: hx - map_x as f32,
                    world_x: hx,
                    world_y: hy,
                };
            }
        }

        let (distance, side) = if side_dist_x < side_dist_y {
            let d = side_dist_x;
            side_dist_x += delta_dist_x;
            map_x += step_x;
            (d, HitSide::AxisX)
        } else {
            let d = side_dist_y;
            side_dist_y += delta_dist_y;
            map_y += step_y;
            (d, HitSide::AxisY)
        };

        if !grid.in_bounds(map_x, map_y) {
            return HitInfo {
                distance,
                side: HitSide::OffMap,
                material: 0,
                texture_coord: 0.0,
                world_x: origin.0 + dir_x * distance,
                world_y: origin.1 + dir_y * distance,
            };
        }

        let material = grid.get_cell(map_x, map_y);
        if material > 0 {
            let world_x = origin.0 + dir_x * distance;
            let world_y = origin.1 + dir_y * distance;
            let texture_coord = match side {
                HitSide::AxisX => world_y - world_y.floor(),
                _ => world_x - world_x.floor(),
            };
            return HitInfo {
                distance,
                side,
                material,
                texture_coord,
                world_x,
                world_y,
            };
        }
    }
}

/// March a run of constant floor (or ceiling) material from the origin.
///
/// The run ends at the first cell whose watched material differs, at the
/// map edge (`OffMap`, with the exact boundary-crossing distance), at
/// `max_distance` (`Capped`), or where the light level jumps by more than
/// `LIGHT_BAND_LIMIT` between adjacent cells. Wall material never stops a
/// floor run — callers bound it with the wall cast's distance instead.
pub fn cast_floor(
    grid: &Grid,
    is_ceiling: bool,
    origin: (f32, f32),
    dir: (f32, f32),
    max_distance: f32,
) -> FloorHit {
    let mut map_x = origin.0.floor() as i32;
    let mut map_y = origin.1.floor() as i32;

    let floor_material = grid.get_floor(map_x, map_y);
    let ceiling_material = grid.get_ceiling(map_x, map_y);
    let watched = if is_ceiling {
        ceiling_material
    } else {
        floor_material
    };
    let mut prev_light = grid.get_light(map_x, map_y);

    let mag = (dir.0 * dir.0 + dir.1 * dir.1).sqrt();
    if mag < GEOM_EPSILON || !grid.in_bounds(map_x, map_y) {
        return FloorHit {
            distance: 0.0,
            side: HitSide::OffMap,
            floor_material,
            ceiling_material,
            world_x: origin.0,
            world_y: origin.1,
        };
    }
    let dir_x = dir.0 / mag;
    let dir_y = dir.1 / mag;

    let delta_dist_x = if dir_x.abs() < GEOM_EPSILON {
        NO_STEP
    } else {
        (1.0 / dir_x).abs()
    };
    let delta_dist_y = if dir_y.abs() < GEOM_EPSILON {
        NO_STEP
    } else {
        (1.0 / dir_y).abs()
    };

    let (step_x, mut side_dist_x) = if dir_x < 0.0 {
        (-1, (origin.0 - map_x as f32) * delta_dist_x)
    } else {
        (1, (map_x as f32 + 1.0 - origin.0) * delta_dist_x)
    };
    let (step_y, mut side_dist_y) = if dir_y < 0.0 {
        (-1, (origin.1 - map_y as f32) * delta_dist_y)
    } else {
        (1, (map_y as f32 + 1.0 - origin.1) * delta_dist_y)
    };

    loop {
        let (crossing, side) = if side_dist_x < side_dist_y {
            let d = side_dist_x;
            side_dist_x += delta_dist_x;
            map_x += step_x;
            (d, HitSide::AxisX)
        } else {
            let d = side_dist_y;
            side_dist_y += delta_dist_y;
            map_y += step_y;
            (d, HitSide::AxisY)
        };

        if crossing >= max_distance {
            return FloorHit {
                distance: max_distance,
                side: HitSide::Capped,
                floor_material,
                ceiling_material,
                world_x: origin.0 + dir_x * max_distance,
                world_y: origin.1 + dir_y * max_distance,
            };
        }

        if !grid.in_bounds(map_x, map_y) {
            return FloorHit {
                distance: crossing,
                side: HitSide::OffMap,
                floor_material,
                ceiling_material,
                world_x: origin.0 + dir_x * crossing,
                world_y: origin.1 + dir_y * crossing,
            };
        }

        let next_watched = if is_ceiling {
            grid.get_ceiling(map_x, map_y)
        } else {
            grid.get_floor(map_x, map_y)
        };
        let light = grid.get_light(map_x, map_y);
        if next_watched != watched || (light - prev_light).abs() > LIGHT_BAND_LIMIT {
            return FloorHit {
                distance: crossing,
                side,
                floor_material,
                ceiling_material,
                world_x: origin.0 + dir_x * crossing,
                world_y: origin.1 + dir_y * crossing,
            };
        }
        prev_light = light;
    }
}

/// Whether cell `b` can be seen from cell `a` across passable cells.
///
/// Walks max(|dx|, |dy|) interpolated steps; the starting cell itself is
/// never checked, every later cell (including `b`) must be passable. Cells
/// outside the map are not passable, so a walk that leaves the grid fails.
/// A cell always sees itself.
pub fn line_of_sight(grid: &Grid, a: (i32, i32), b: (i32, i32)) -> bool {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let n = dx.abs().max(dy.abs());
    if n == 0 {
        return true;
    }
    for i in 1..=n {
        let t = i as f32 / n as f32;
        let x = (a.0 as f32 + dx as f32 * t).round() as i32;
        let y = (a.1 as f32 + dy as f32 * t).round() as i32;
        if !grid.is_passable(x, y) {
            return false;
        }
    }
    true
}
