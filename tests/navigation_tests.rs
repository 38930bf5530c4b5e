mod common;

use common::{arena_grid, route_ascii, settle_door};
use gridcast::pathfinding::{next_step, ApproachMap, Position, UNREACHED};
use gridcast::{Actor, ActorIndex};

#[test]
fn test_walk_arena_with_doors_open() {
    let mut grid = arena_grid();
    settle_door(&mut grid, 5, 2);
    settle_door(&mut grid, 2, 4);

    let goal = Position::new(1, 1);
    let mut pos = Position::new(8, 6);
    let mut route = vec![(pos.x, pos.y)];
    for _ in 0..30 {
        if pos == goal {
            break;
        }
        pos = next_step(&grid, pos, goal).expect("open doors connect the rooms");
        assert!(
            grid.is_passable(pos.x, pos.y),
            "stepped into a blocked cell\n{}",
            route_ascii(&grid, &route)
        );
        route.push((pos.x, pos.y));
    }
    assert_eq!(pos, goal, "never arrived:\n{}", route_ascii(&grid, &route));
    assert!(
        route.len() <= 16,
        "took {} cells:\n{}",
        route.len(),
        route_ascii(&grid, &route)
    );
    println!("{}", route_ascii(&grid, &route));
}

#[test]
fn test_walk_blocked_by_closed_doors() {
    let grid = arena_grid();
    assert_eq!(
        next_step(&grid, Position::new(8, 6), Position::new(1, 1)),
        None,
        "both doors closed seal the spawn room"
    );
}

#[test]
fn test_wall_goal_retargets_to_open_neighbor() {
    let grid = arena_grid();
    // Goal is the wall cell (5, 3). Its north neighbor is the closed door
    // cell, south is wall, so the retarget lands on the west neighbor.
    let step = next_step(&grid, Position::new(4, 2), Position::new(5, 3));
    assert_eq!(step, Some(Position::new(4, 3)));
}

#[test]
fn test_field_seals_and_opens_with_doors() {
    let mut grid = arena_grid();
    let mut field = ApproachMap::new(grid.rows, grid.cols);
    let spawn = [(1.5f32, 1.5f32)];

    assert!(field.refresh(&grid, &spawn));
    assert_eq!(field.value((4, 3)), 3);
    assert_eq!(field.value((8, 6)), UNREACHED, "east wing sealed");
    assert_eq!(field.value((1, 6)), UNREACHED, "south room sealed");

    settle_door(&mut grid, 5, 2);
    assert!(field.refresh(&grid, &spawn), "door crossing dirties the field");
    assert_eq!(field.value((6, 2)), 5);
    assert_eq!(field.value((8, 6)), 8);
    assert_eq!(field.value((1, 6)), UNREACHED, "south door still shut");

    settle_door(&mut grid, 2, 4);
    assert!(field.refresh(&grid, &spawn));
    assert_eq!(field.value((1, 6)), 5);
}

#[test]
fn test_walks_follow_field_distances() {
    let mut grid = arena_grid();
    settle_door(&mut grid, 5, 2);
    settle_door(&mut grid, 2, 4);

    let goal = Position::new(1, 1);
    let mut field = ApproachMap::new(grid.rows, grid.cols);
    field.rebuild(&grid, &[(1.5, 1.5)]);

    for start in [(8, 6), (6, 1), (1, 6), (4, 3)] {
        let v = field.value(start);
        assert_ne!(v, UNREACHED);
        let mut pos = Position::new(start.0, start.1);
        let mut steps = 0;
        while pos != goal {
            pos = next_step(&grid, pos, goal).expect("reachable start");
            steps += 1;
            assert!(steps <= 3 * v, "walk from {:?} is not converging", start);
        }
    }
}

#[test]
fn test_steer_drives_agent_across_the_map() {
    let mut grid = arena_grid();
    settle_door(&mut grid, 5, 2);
    settle_door(&mut grid, 2, 4);

    let target = (1.5f32, 1.5f32);
    let mut agent = Actor::new(0, 8.5, 6.5, 0.3, 2.0);
    let mut index = ActorIndex::new(grid.rows, grid.cols);
    index.build(&[agent.pos()]);
    let mut field = ApproachMap::new(grid.rows, grid.cols);
    let mut scratch = Vec::new();

    let dt = 0.05;
    for _ in 0..600 {
        field.refresh(&grid, &[target]);
        let dir = field.steer(&grid, &index, agent.id, agent.pos(), target);
        let old = agent.pos();
        agent.advance(dir, dt);
        agent.resolve_collisions(&grid, &mut scratch);
        index.move_actor(agent.id, old, agent.pos());

        assert!(agent.x > 0.0 && agent.x < grid.cols as f32);
        assert!(agent.y > 0.0 && agent.y < grid.rows as f32);
    }

    let dx = agent.x - target.0;
    let dy = agent.y - target.1;
    let dist = (dx * dx + dy * dy).sqrt();
    assert!(
        dist < 1.0,
        "agent stalled at ({}, {}), {} from target",
        agent.x,
        agent.y,
        dist
    );
}
