mod common;

use common::{arena_grid, grid_from};
use gridcast::{Actor, ActorIndex};

/// Deterministic direction stream for soak walks
struct Lcg(u64);

impl Lcg {
    fn angle(&mut self) -> f32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) % 360) as f32 * std::f32::consts::PI / 180.0
    }
}

#[test]
fn test_random_walk_stays_in_sealed_room() {
    let grid = arena_grid();
    let mut actor = Actor::new(0, 2.5, 2.5, 0.3, 3.0);
    let mut scratch = Vec::new();
    let mut rng = Lcg(0x9e37_79b9_7f4a_7c15);

    for step in 0..1500 {
        let a = rng.angle();
        actor.advance((a.cos(), a.sin()), 0.05);
        actor.resolve_collisions(&grid, &mut scratch);

        let (cx, cy) = actor.cell();
        assert_eq!(
            grid.get_cell(cx, cy),
            0,
            "step {}: body center inside material at ({}, {})",
            step,
            actor.x,
            actor.y
        );
        // Room walls hold the body at its radius; the door cell lets it dip
        // as far as the closed panel at y = 4.5
        assert!((1.25..=4.75).contains(&actor.x), "step {}: x {}", step, actor.x);
        assert!((1.25..=4.3).contains(&actor.y), "step {}: y {}", step, actor.y);
    }
}

#[test]
fn test_hypotenuse_holds_body_in_free_half() {
    let grid = grid_from(
        "\
####
#P##
#.\\#
#..#
####",
    );
    // The '\' cell (2, 2) is solid toward its upper-right corner; the body
    // starts in the free lower-left half and presses into the edge
    let mut actor = Actor::new(0, 2.4, 2.9, 0.3, 2.0);
    let mut scratch = Vec::new();
    let inv_sqrt2 = std::f32::consts::FRAC_1_SQRT_2;

    for _ in 0..50 {
        actor.advance((inv_sqrt2, -inv_sqrt2), 0.05);
        actor.resolve_collisions(&grid, &mut scratch);
        let edge_distance = (actor.y - actor.x) * inv_sqrt2;
        assert!(
            edge_distance >= 0.3 - 1e-3,
            "pressed through the edge to ({}, {})",
            actor.x,
            actor.y
        );
    }
    assert_eq!(actor.cell(), (2, 2), "stayed in its cell");
    let edge_distance = (actor.y - actor.x) * inv_sqrt2;
    assert!(
        (edge_distance - 0.3).abs() < 0.06,
        "settled at the contact distance, got {}",
        edge_distance
    );
}

#[test]
fn test_door_corridor_blocks_until_open() {
    let mut grid = grid_from("#####\nP.D..\n#####");
    let mut actor = Actor::new(0, 0.5, 1.5, 0.25, 2.0);
    let mut scratch = Vec::new();

    let mut press_east = |actor: &mut Actor, grid: &gridcast::Grid, n: usize| {
        for _ in 0..n {
            actor.advance((1.0, 0.0), 0.05);
            actor.resolve_collisions(grid, &mut scratch);
        }
    };

    // Closed: the panel at x = 2.5 stops the body a radius short
    press_east(&mut actor, &grid, 100);
    assert!((2.2..=2.32).contains(&actor.x), "closed door, x {}", actor.x);
    assert!((actor.y - 1.5).abs() < 1e-4);

    // Half retracted: the stub still spans the walking line
    assert!(grid.toggle_door((2.5, 1.5)));
    grid.update(1.0 / 3.0);
    let door = grid.door_at(2, 1).expect("door fixture");
    assert!((door.extent - 0.5).abs() < 1e-3, "extent {}", door.extent);
    assert!(!grid.is_passable(2, 1));
    press_east(&mut actor, &grid, 100);
    assert!((2.2..=2.32).contains(&actor.x), "sliding door, x {}", actor.x);

    // Fully open: the corridor is clear to the east wall
    let crossed = grid.update(10.0);
    assert_eq!(crossed, vec![(2, 1)]);
    assert!(grid.is_passable(2, 1));
    press_east(&mut actor, &grid, 200);
    assert!(actor.x > 4.0, "open door, x {}", actor.x);
}

#[test]
fn test_index_tracks_wandering_bodies() {
    let grid = arena_grid();
    let mut actors = vec![
        Actor::new(0, 6.5, 1.5, 0.3, 2.5),
        Actor::new(1, 7.5, 3.5, 0.3, 2.5),
        Actor::new(2, 6.5, 5.5, 0.3, 2.5),
    ];
    let mut index = ActorIndex::new(grid.rows, grid.cols);
    let positions: Vec<_> = actors.iter().map(|a| a.pos()).collect();
    index.build(&positions);

    let mut scratch = Vec::new();
    let mut rng = Lcg(0x2545_f491_4f6c_dd1d);

    for tick in 0..200 {
        for actor in &mut actors {
            let a = rng.angle();
            let old = actor.pos();
            actor.advance((a.cos(), a.sin()), 0.05);
            actor.resolve_collisions(&grid, &mut scratch);
            index.move_actor(actor.id, old, actor.pos());
        }
        for actor in &actors {
            let (cx, cy) = actor.cell();
            assert!(
                index.query(cx, cy).contains(&actor.id),
                "tick {}: actor {} missing from bucket ({}, {})",
                tick,
                actor.id,
                cx,
                cy
            );
        }
    }

    let mut total = 0;
    for y in 0..grid.rows {
        for x in 0..grid.cols {
            total += index.query(x, y).len();
        }
    }
    assert_eq!(total, actors.len(), "no duplicate or lost bucket entries");
}
