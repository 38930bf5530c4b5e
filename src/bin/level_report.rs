/// Reachability report for a level file
///
/// Loads a level (JSON or ASCII), floods the walkable space from the player
/// spawn and prints which cells, doors and agent spawns can be reached.
/// Given a second path it then replays a saved action log, with the time
/// each door slide and level load took.
use gridcast::action_log::ActionLog;
use gridcast::level::Level;
use gridcast::pathfinding::{next_step, next_step_with, ApproachMap, Position, UNREACHED};
use gridcast::DoorAxis;
use std::env;
use std::fs;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <level.json|level.txt> [session.json]", args[0]);
        eprintln!("Prints a reachability and door report for a level file and");
        eprintln!("replays a saved action log when one is given");
        process::exit(1);
    }

    let path = &args[1];
    if let Err(e) = report(path) {
        eprintln!("{}", e);
        process::exit(1);
    }
    if let Some(log_path) = args.get(2) {
        if let Err(e) = replay(log_path) {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn load_level(path: &str) -> Result<Level, String> {
    if path.ends_with(".json") {
        Level::load_from_file(path)
    } else {
        let text =
            fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
        Level::from_ascii(&text)
    }
}

fn report(path: &str) -> Result<(), String> {
    let level = load_level(path)?;
    let grid = level.to_grid()?;

    println!("=== Level Report: {} ===", path);
    println!(
        "Size: {}x{}  Doors: {}  Agent spawns: {}",
        grid.cols,
        grid.rows,
        grid.doors.len(),
        level.agent_spawns.len()
    );
    println!();
    print!("{}", grid.to_ascii());
    println!();

    // Flood from the player spawn with doors as they start (closed)
    let mut field = ApproachMap::new(grid.rows, grid.cols);
    field.rebuild(&grid, &[level.player_spawn]);

    let mut passable = 0;
    let mut reached = 0;
    let mut sealed = Vec::new();
    for y in 0..grid.rows {
        for x in 0..grid.cols {
            if !grid.is_passable(x, y) {
                continue;
            }
            passable += 1;
            if field.value((x, y)) == UNREACHED {
                sealed.push((x, y));
            } else {
                reached += 1;
            }
        }
    }
    println!(
        "Walkable cells: {} ({} reachable from spawn while doors are closed)",
        passable, reached
    );
    if !sealed.is_empty() {
        let shown: Vec<_> = sealed.iter().take(10).collect();
        println!(
            "Sealed behind doors or walls: {} cells, first {:?}",
            sealed.len(),
            shown
        );
    }
    println!();

    for door in &grid.doors {
        let (a, b) = match door.axis {
            DoorAxis::Horizontal => ((door.cell_x, door.cell_y - 1), (door.cell_x, door.cell_y + 1)),
            DoorAxis::Vertical => ((door.cell_x - 1, door.cell_y), (door.cell_x + 1, door.cell_y)),
        };
        println!(
            "Door ({}, {}) {:?}: sides at {} / {} steps from spawn",
            door.cell_x,
            door.cell_y,
            door.axis,
            fmt_steps(field.value(a)),
            fmt_steps(field.value(b))
        );
    }
    println!();

    // Where each agent's first step would take it, doors closed and open
    let player_cell = Position::new(
        level.player_spawn.0.floor() as i32,
        level.player_spawn.1.floor() as i32,
    );
    let doors_open =
        |x: i32, y: i32| grid.in_bounds(x, y) && grid.get_cell(x, y) == 0;
    for &(sx, sy) in &level.agent_spawns {
        let start = Position::new(sx.floor() as i32, sy.floor() as i32);
        let closed_step = next_step(&grid, start, player_cell);
        let open_step = next_step_with(doors_open, start, player_cell);
        println!(
            "Spawn ({:.1}, {:.1}): doors closed -> {}, doors open -> {}",
            sx,
            sy,
            fmt_step(closed_step),
            fmt_step(open_step)
        );
    }

    Ok(())
}

fn replay(path: &str) -> Result<(), String> {
    let log =
        ActionLog::load_from_file(path).map_err(|e| format!("Failed to load {}: {}", path, e))?;
    println!(
        "=== Session Replay: {} ({} events) ===",
        path,
        log.get_actions().len()
    );
    for line in log.timeline() {
        println!("{}", line);
    }
    println!();
    println!("{}", log.summary());
    Ok(())
}

fn fmt_steps(value: i32) -> String {
    if value == UNREACHED {
        "sealed".to_string()
    } else {
        value.to_string()
    }
}

fn fmt_step(step: Option<Position>) -> String {
    match step {
        Some(p) => format!("({}, {})", p.x, p.y),
        None => "no path".to_string(),
    }
}
