/// Stateless 2D segment primitives.
///
/// One segment record serves every obstacle kind in the engine: wall edges,
/// door panels and ad-hoc attack sweeps all become a `LineCollider`, and the
/// same `segment_push` resolves a circular body against any mix of them.

/// Tolerance below which directions and denominators count as degenerate.
pub const GEOM_EPSILON: f32 = 1e-6;

/// An immutable directed line segment with a precomputed unit normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineCollider {
    /// Anchor point
    pub origin_x: f32,
    pub origin_y: f32,
    /// Unit direction from the anchor toward the far end
    pub dir_x: f32,
    pub dir_y: f32,
    /// Length in world units (one cell = 1.0)
    pub length: f32,
    /// Unit normal, the left perpendicular of the direction
    pub normal_x: f32,
    pub normal_y: f32,
}

impl LineCollider {
    /// Build a collider from an anchor, a direction and a length.
    /// The direction is normalized here; a degenerate direction or length
    /// produces a zero-length collider that no query interacts with.
    pub fn new(origin: (f32, f32), dir: (f32, f32), length: f32) -> Self {
        let mag = (dir.0 * dir.0 + dir.1 * dir.1).sqrt();
        if mag < GEOM_EPSILON || length < GEOM_EPSILON {
            return LineCollider {
                origin_x: origin.0,
                origin_y: origin.1,
                dir_x: 0.0,
                dir_y: 0.0,
                length: 0.0,
                normal_x: 0.0,
                normal_y: 0.0,
            };
        }
        let dx = dir.0 / mag;
        let dy = dir.1 / mag;
        LineCollider {
            origin_x: origin.0,
            origin_y: origin.1,
            dir_x: dx,
            dir_y: dy,
            length,
            normal_x: -dy,
            normal_y: dx,
        }
    }

    /// Build a collider spanning two points.
    pub fn from_points(a: (f32, f32), b: (f32, f32)) -> Self {
        let dir = (b.0 - a.0, b.1 - a.1);
        let length = (dir.0 * dir.0 + dir.1 * dir.1).sqrt();
        Self::new(a, dir, length)
    }

    /// Far endpoint of the segment.
    pub fn end(&self) -> (f32, f32) {
        (
            self.origin_x + self.dir_x * self.length,
            self.origin_y + self.dir_y * self.length,
        )
    }
}

/// Intersect segment p1→p2 with segment p3→p4.
///
/// Parametric form via 2D cross products. Returns `None` when the segments
/// are parallel/collinear (near-zero denominator) or when the crossing falls
/// outside either extent. With `half_line` set, p3→p4 is treated as an
/// infinite ray anchored at p3 (its parameter keeps the lower bound but loses
/// the upper one) — used when probing a diagonal wall edge with a view ray.
pub fn segment_intersection(
    p1: (f32, f32),
    p2: (f32, f32),
    p3: (f32, f32),
    p4: (f32, f32),
    half_line: bool,
) -> Option<(f32, f32)> {
    let rx = p2.0 - p1.0;
    let ry = p2.1 - p1.1;
    let sx = p4.0 - p3.0;
    let sy = p4.1 - p3.1;

    let denom = rx * sy - ry * sx;
    if denom.abs() < GEOM_EPSILON {
        return None;
    }

    let qx = p3.0 - p1.0;
    let qy = p3.1 - p1.1;

    // t runs along p1→p2, u along p3→p4.
    let t = (qx * sy - qy * sx) / denom;
    let u = (qx * ry - qy * rx) / denom;

    if t < 0.0 || t > 1.0 {
        return None;
    }
    if u < 0.0 || (!half_line && u > 1.0) {
        return None;
    }

    Some((p1.0 + t * rx, p1.1 + t * ry))
}

/// Accumulated push-out displacement for a point near a set of segments.
///
/// For each segment the point is projected onto the segment's infinite line
/// and the projection parameter clamped to the extent widened by half the
/// thickness at both ends. A segment closer than `thickness` contributes a
/// push of magnitude `thickness - distance` along its normal, signed by which
/// side of the segment the point sits on. Contributions from every
/// overlapping segment are summed, which is what lets one call resolve a body
/// wedged into a concave wall corner.
pub fn segment_push(point: (f32, f32), segments: &[LineCollider], thickness: f32) -> (f32, f32) {
    let mut push_x = 0.0;
    let mut push_y = 0.0;
    let half = thickness * 0.5;

    for seg in segments {
        if seg.length < GEOM_EPSILON {
            continue;
        }
        let rel_x = point.0 - seg.origin_x;
        let rel_y = point.1 - seg.origin_y;

        let t = (rel_x * seg.dir_x + rel_y * seg.dir_y).clamp(-half, seg.length + half);
        let near_x = seg.origin_x + seg.dir_x * t;
        let near_y = seg.origin_y + seg.dir_y * t;

        let dx = point.0 - near_x;
        let dy = point.1 - near_y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist >= thickness {
            continue;
        }

        // Which side of the directed segment the point sits on; a point
        // exactly on the line is pushed along the stored (left) normal.
        let cross = seg.dir_x * rel_y - seg.dir_y * rel_x;
        let side = if cross >= 0.0 { 1.0 } else { -1.0 };

        let magnitude = thickness - dist;
        push_x += seg.normal_x * side * magnitude;
        push_y += seg.normal_y * side * magnitude;
    }

    (push_x, push_y)
}

/// True when `point` lies inside the band `segment_push` resolves against.
/// Attack sweeps use this with `thickness` set to the attack reach.
pub fn segment_hits(point: (f32, f32), segment: &LineCollider, thickness: f32) -> bool {
    let (px, py) = segment_push(point, std::slice::from_ref(segment), thickness);
    px != 0.0 || py != 0.0
}
