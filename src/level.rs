use crate::door::{Door, DoorAxis};
use crate::grid::Grid;
use serde::{Deserialize, Serialize};
use std::fs;

/// Serializable map description: every layer the runtime grid carries plus
/// the spawn points the simulation needs to boot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub rows: i32,
    pub cols: i32,
    /// Wall materials, row-major; negative values mark diagonal cells
    pub cells: Vec<i32>,
    pub floors: Vec<i32>,
    pub ceilings: Vec<i32>,
    pub light: Vec<f32>,
    pub doors: Vec<DoorSpawn>,
    /// World position the player starts at
    pub player_spawn: (f32, f32),
    /// World positions agents start at
    pub agent_spawns: Vec<(f32, f32)>,
}

/// Door placement record; panels always start closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorSpawn {
    pub cell_x: i32,
    pub cell_y: i32,
    pub axis: DoorAxis,
}

impl Level {
    /// Parse a map from ASCII art, one character per cell:
    ///
    /// `.` or space empty, `#` wall material 1, `2`-`9` higher materials,
    /// `/` or `\` diagonal cell (the solid half is derived from neighboring
    /// walls at runtime), `D` door, `P` player spawn, `E` agent spawn.
    ///
    /// Ragged rows and unknown characters are rejected. Exactly one `P` is
    /// required. Floors, ceilings and light get their defaults; edit the
    /// serialized form for anything fancier.
    pub fn from_ascii(text: &str) -> Result<Level, String> {
        let lines: Vec<&str> = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();
        if lines.is_empty() {
            return Err("level text is empty".to_string());
        }

        let rows = lines.len() as i32;
        let cols = lines[0].chars().count() as i32;
        let mut cells = vec![0; (rows * cols) as usize];
        let mut doors = Vec::new();
        let mut player_spawn = None;
        let mut agent_spawns = Vec::new();

        for (y, line) in lines.iter().enumerate() {
            let width = line.chars().count() as i32;
            if width != cols {
                return Err(format!(
                    "row {} is {} cells wide, expected {}",
                    y, width, cols
                ));
            }
            for (x, ch) in line.chars().enumerate() {
                let id = x as i32 + y as i32 * cols;
                let center = (x as f32 + 0.5, y as f32 + 0.5);
                match ch {
                    '.' | ' ' => {}
                    '#' => cells[id as usize] = 1,
                    '2'..='9' => cells[id as usize] = ch as i32 - '0' as i32,
                    '/' | '\\' => cells[id as usize] = -1,
                    'D' => doors.push((x as i32, y as i32)),
                    'P' => {
                        if player_spawn.is_some() {
                            return Err(format!("second player spawn at row {}", y));
                        }
                        player_spawn = Some(center);
                    }
                    'E' => agent_spawns.push(center),
                    other => {
                        return Err(format!("unknown character {:?} at row {}", other, y));
                    }
                }
            }
        }

        let player_spawn = match player_spawn {
            Some(spawn) => spawn,
            None => return Err("no player spawn (P) in level".to_string()),
        };

        // Panel orientation follows the passage the door sits in: solid
        // north and south means east-west travel, so the panel spans
        // top-to-bottom; otherwise it spans left-to-right.
        let doors = doors
            .into_iter()
            .map(|(x, y)| {
                let id = |cx: i32, cy: i32| -> i32 {
                    if cx < 0 || cx >= cols || cy < 0 || cy >= rows {
                        1
                    } else {
                        cells[(cx + cy * cols) as usize]
                    }
                };
                let axis = if id(x, y - 1) != 0 && id(x, y + 1) != 0 {
                    DoorAxis::Vertical
                } else {
                    DoorAxis::Horizontal
                };
                DoorSpawn {
                    cell_x: x,
                    cell_y: y,
                    axis,
                }
            })
            .collect();

        Ok(Level {
            rows,
            cols,
            cells,
            floors: vec![1; (rows * cols) as usize],
            ceilings: vec![2; (rows * cols) as usize],
            light: vec![1.0; (rows * cols) as usize],
            doors,
            player_spawn,
            agent_spawns,
        })
    }

    /// Capture a live grid back into level form.
    pub fn from_grid(grid: &Grid, player_spawn: (f32, f32), agent_spawns: Vec<(f32, f32)>) -> Level {
        Level {
            rows: grid.rows,
            cols: grid.cols,
            cells: grid.cells.clone(),
            floors: grid.floors.clone(),
            ceilings: grid.ceilings.clone(),
            light: grid.light.clone(),
            doors: grid
                .doors
                .iter()
                .map(|d| DoorSpawn {
                    cell_x: d.cell_x,
                    cell_y: d.cell_y,
                    axis: d.axis,
                })
                .collect(),
            player_spawn,
            agent_spawns,
        }
    }

    /// Build the runtime grid: layers copied in, doors installed closed,
    /// neighbor masks baked.
    pub fn to_grid(&self) -> Result<Grid, String> {
        let expected = (self.rows * self.cols) as usize;
        if self.cells.len() != expected {
            return Err(format!(
                "cell layer holds {} entries, expected {}",
                self.cells.len(),
                expected
            ));
        }

        let mut grid = Grid::new(self.rows, self.cols);
        grid.cells = self.cells.clone();
        if self.floors.len() == expected {
            grid.floors = self.floors.clone();
        }
        if self.ceilings.len() == expected {
            grid.ceilings = self.ceilings.clone();
        }
        if self.light.len() == expected {
            grid.light = self.light.clone();
        }
        grid.recompute_masks();
        for spawn in &self.doors {
            if !grid.in_bounds(spawn.cell_x, spawn.cell_y) {
                return Err(format!(
                    "door at ({}, {}) is outside the {}x{} grid",
                    spawn.cell_x, spawn.cell_y, self.cols, self.rows
                ));
            }
            grid.add_door(Door::new(spawn.cell_x, spawn.cell_y, spawn.axis));
        }
        Ok(grid)
    }

    /// Save to file as pretty JSON
    pub fn save_to_file(&self, path: &str) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize level: {}", e))?;

        fs::write(path, json).map_err(|e| format!("Failed to write level file: {}", e))?;

        Ok(())
    }

    /// Load from file
    pub fn load_from_file(path: &str) -> Result<Level, String> {
        let json =
            fs::read_to_string(path).map_err(|e| format!("Failed to read level file: {}", e))?;

        let level: Level =
            serde_json::from_str(&json).map_err(|e| format!("Failed to parse level file: {}", e))?;

        Ok(level)
    }
}
