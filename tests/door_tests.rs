mod common;

use common::arena_grid;
use gridcast::action_log::{Action, ActionLog, ActionPhase};

#[test]
fn test_open_lifecycle_fires_once() {
    let mut grid = arena_grid();
    let revision = grid.get_revision();
    assert!(!grid.is_passable(5, 2));
    assert!(grid.toggle_door((5.5, 2.5)));

    let mut crossings = Vec::new();
    let mut passable_frames = Vec::new();
    for frame in 0..12 {
        let crossed = grid.update(0.1);
        crossings.extend(crossed);
        if grid.is_passable(5, 2) {
            passable_frames.push(frame);
        }
    }

    assert_eq!(crossings, vec![(5, 2)], "one crossing for one full slide");
    let first_open = passable_frames.first().copied().expect("door opened");
    // Passability flips at the crossing frame and stays flipped
    assert_eq!(passable_frames.len(), 12 - first_open);
    assert_eq!(grid.get_revision(), revision + 1);
}

#[test]
fn test_cancel_mid_slide_never_crosses() {
    let mut grid = arena_grid();
    let revision = grid.get_revision();
    assert!(grid.toggle_door((5.5, 2.5)));

    let mut crossings = Vec::new();
    for _ in 0..3 {
        crossings.extend(grid.update(0.1));
        assert!(!grid.is_passable(5, 2));
    }
    let extent = grid.door_at(5, 2).expect("arena door").extent;
    assert!((extent - 0.55).abs() < 1e-3, "partway open, got {}", extent);

    // Order it shut again before the panel ever clears the threshold
    assert!(grid.toggle_door((5.5, 2.5)));
    crossings.extend(grid.update(10.0));

    assert!(crossings.is_empty(), "no threshold was crossed");
    assert!(!grid.is_passable(5, 2));
    assert_eq!(grid.door_at(5, 2).expect("arena door").extent, 1.0);
    assert_eq!(grid.get_revision(), revision, "passability never changed");
}

#[test]
fn test_collider_tracks_extent_through_slide() {
    let mut grid = arena_grid();
    assert!(grid.toggle_door((2.5, 4.5)));

    loop {
        grid.update(0.1);
        let door = grid.door_at(2, 4).expect("arena door");
        let panel = door.collider();
        assert!(
            (panel.length - door.extent).abs() < 1e-6,
            "panel length {} at extent {}",
            panel.length,
            door.extent
        );
        if door.extent > 0.0 {
            // Horizontal panels hang from the cell's midline
            assert_eq!((panel.origin_x, panel.origin_y), (2.0, 4.5));
            assert_eq!((panel.dir_x, panel.dir_y), (1.0, 0.0));
        }
        if door.is_open() {
            break;
        }
    }
}

#[test]
fn test_log_pairs_toggle_with_crossing() {
    let mut grid = arena_grid();
    let mut log = ActionLog::new();

    log.log_start(Action::ToggleDoor { x: 5, y: 2 });
    assert!(grid.toggle_door((5.5, 2.5)));
    for _ in 0..12 {
        for (x, y) in grid.update(0.1) {
            log.log_finish(Action::ToggleDoor { x, y });
        }
    }

    let actions = log.get_actions();
    assert_eq!(actions.len(), 2);
    assert!(matches!(actions[0].phase, ActionPhase::Start));
    assert!(matches!(actions[1].phase, ActionPhase::Finish));
    assert!(actions[1].timestamp_ms >= actions[0].timestamp_ms);
    assert!(log.summary().contains("Doors: 1 completed toggles"));

    let path = std::env::temp_dir().join("gridcast_action_log_test.json");
    let path = path.to_string_lossy().to_string();
    log.save_to_file(&path).expect("write log");
    let replay = ActionLog::load_from_file(&path).expect("load log");
    let _ = std::fs::remove_file(&path);

    assert_eq!(replay.get_actions().len(), 2);
    assert!(matches!(
        replay.get_actions()[1].action,
        Action::ToggleDoor { x: 5, y: 2 }
    ));
    let lines = replay.timeline();
    assert!(lines[0].contains("start"));
    assert!(lines[0].contains("door (5, 2)"));
    assert!(
        lines[1].contains("after"),
        "paired finish shows its duration: {}",
        lines[1]
    );
}
