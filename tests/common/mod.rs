use gridcast::level::Level;
use gridcast::Grid;

/// Shared arena fixture: two rooms joined through a vertical door at (5, 2),
/// a lower room behind a horizontal door at (2, 4), and a diagonal corner
/// cell at (8, 1). With both doors closed the player room is sealed.
pub const ARENA: &str = "\
##########
#P...#..\\#
#....D..E#
#....#...#
##D###...#
#....#...#
#E...#..E#
##########";

pub fn arena_level() -> Level {
    Level::from_ascii(ARENA).expect("arena fixture parses")
}

pub fn arena_grid() -> Grid {
    arena_level().to_grid().expect("arena fixture builds")
}

pub fn grid_from(text: &str) -> Grid {
    Level::from_ascii(text)
        .expect("fixture parses")
        .to_grid()
        .expect("fixture builds")
}

/// Toggle the door in cell (x, y) and run the panel to rest.
pub fn settle_door(grid: &mut Grid, x: i32, y: i32) {
    assert!(
        grid.toggle_door((x as f32 + 0.5, y as f32 + 0.5)),
        "no door at ({}, {})",
        x,
        y
    );
    grid.update(10.0);
}

/// Render the map with a walked route marked, for failure output.
pub fn route_ascii(grid: &Grid, route: &[(i32, i32)]) -> String {
    let mut text = String::new();
    for y in 0..grid.rows {
        for x in 0..grid.cols {
            if route.contains(&(x, y)) {
                text.push('*');
            } else if grid.is_passable(x, y) {
                text.push('.');
            } else {
                text.push('#');
            }
        }
        text.push('\n');
    }
    text
}
