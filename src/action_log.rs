use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Action phase - whether the action is starting or finishing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ActionPhase {
    Start,
    Finish,
}

/// Simulation events worth replaying later
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Action {
    /// Door toggle at cell (x, y). Starts when commanded, finishes when the
    /// panel crosses its open/closed threshold.
    ToggleDoor { x: i32, y: i32 },
    /// Agent spawned at world position (x, y)
    SpawnAgent { x: f32, y: f32 },
    /// Agent reached its terminal state
    AgentDied { id: usize },
    /// Steering target moved to world position (x, y)
    SetTarget { x: f32, y: f32 },
    /// Level file loaded
    LoadLevel { path: String, rows: i32, cols: i32 },
}

/// Logged action with timestamp and phase
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggedAction {
    /// Milliseconds since start
    pub timestamp_ms: u64,
    /// The action
    pub action: Action,
    /// Whether this is the start or finish of the action
    pub phase: ActionPhase,
}

/// Action logger
pub struct ActionLog {
    start_time: Instant,
    actions: Vec<LoggedAction>,
}

impl ActionLog {
    pub fn new() -> Self {
        ActionLog {
            start_time: Instant::now(),
            actions: Vec::new(),
        }
    }

    /// Log an action with current timestamp and phase
    pub fn log(&mut self, action: Action, phase: ActionPhase) {
        let elapsed = self.start_time.elapsed();
        let timestamp_ms = elapsed.as_millis() as u64;

        self.actions.push(LoggedAction {
            timestamp_ms,
            action,
            phase,
        });
    }

    /// Log the start of an action
    pub fn log_start(&mut self, action: Action) {
        self.log(action, ActionPhase::Start);
    }

    /// Log the finish of an action
    pub fn log_finish(&mut self, action: Action) {
        self.log(action, ActionPhase::Finish);
    }

    /// Get all logged actions
    pub fn get_actions(&self) -> &Vec<LoggedAction> {
        &self.actions
    }

    /// Save log to JSON file
    pub fn save_to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(&self.actions)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a log saved by `save_to_file`
    pub fn load_from_file(path: &str) -> Result<ActionLog, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)?;
        let actions: Vec<LoggedAction> = serde_json::from_str(&json)?;
        Ok(ActionLog {
            start_time: Instant::now(),
            actions,
        })
    }

    /// Render one line per event, oldest first. Start/finish pairs are
    /// matched by their description, so a finish line carries the time the
    /// action took: a door's slide, a level's load.
    pub fn timeline(&self) -> Vec<String> {
        use std::collections::HashMap;

        let mut open_starts: HashMap<String, u64> = HashMap::new();
        let mut lines = Vec::with_capacity(self.actions.len());
        for logged in &self.actions {
            let label = describe(&logged.action);
            match logged.phase {
                ActionPhase::Start => {
                    open_starts.insert(label.clone(), logged.timestamp_ms);
                    lines.push(format!("[{:6}ms] start  {}", logged.timestamp_ms, label));
                }
                ActionPhase::Finish => match open_starts.remove(&label) {
                    Some(started_ms) => lines.push(format!(
                        "[{:6}ms] finish {} after {}ms",
                        logged.timestamp_ms,
                        label,
                        logged.timestamp_ms - started_ms
                    )),
                    None => {
                        lines.push(format!("[{:6}ms] finish {}", logged.timestamp_ms, label))
                    }
                },
            }
        }
        lines
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        let mut door_toggles = 0;
        let mut agent_spawns = 0;
        let mut agent_deaths = 0;
        let mut target_moves = 0;
        let mut levels_loaded = 0;

        // Only count finish events to get actual completed action counts
        for logged in &self.actions {
            if matches!(logged.phase, ActionPhase::Finish) {
                match &logged.action {
                    Action::ToggleDoor { .. } => door_toggles += 1,
                    Action::SpawnAgent { .. } => agent_spawns += 1,
                    Action::AgentDied { .. } => agent_deaths += 1,
                    Action::SetTarget { .. } => target_moves += 1,
                    Action::LoadLevel { .. } => levels_loaded += 1,
                }
            }
        }

        let duration = if let Some(last) = self.actions.last() {
            last.timestamp_ms
        } else {
            0
        };

        format!(
            "Session Duration: {}ms\n\
             Total Events: {}\n\
             Levels Loaded: {}\n\
             Doors: {} completed toggles\n\
             Agents: {} spawned, {} died\n\
             Target Moves: {}",
            duration,
            self.actions.len(),
            levels_loaded,
            door_toggles,
            agent_spawns,
            agent_deaths,
            target_moves
        )
    }
}

fn describe(action: &Action) -> String {
    match action {
        Action::ToggleDoor { x, y } => format!("door ({}, {})", x, y),
        Action::SpawnAgent { x, y } => format!("agent spawn ({:.1}, {:.1})", x, y),
        Action::AgentDied { id } => format!("agent #{} death", id),
        Action::SetTarget { x, y } => format!("rally ({:.1}, {:.1})", x, y),
        Action::LoadLevel { path, rows, cols } => format!("level {} ({}x{})", path, cols, rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped(ms: u64, action: Action, phase: ActionPhase) -> LoggedAction {
        LoggedAction {
            timestamp_ms: ms,
            action,
            phase,
        }
    }

    #[test]
    fn test_timeline_carries_door_slide_duration() {
        let mut log = ActionLog::new();
        log.actions = vec![
            stamped(0, Action::ToggleDoor { x: 5, y: 2 }, ActionPhase::Start),
            stamped(120, Action::SpawnAgent { x: 8.5, y: 6.5 }, ActionPhase::Start),
            stamped(120, Action::SpawnAgent { x: 8.5, y: 6.5 }, ActionPhase::Finish),
            stamped(667, Action::ToggleDoor { x: 5, y: 2 }, ActionPhase::Finish),
        ];

        let lines = log.timeline();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("start"));
        assert!(lines[0].contains("door (5, 2)"));
        assert!(lines[2].contains("after 0ms"), "got: {}", lines[2]);
        assert!(lines[3].contains("after 667ms"), "got: {}", lines[3]);
    }

    #[test]
    fn test_timeline_finish_without_start_has_no_duration() {
        let mut log = ActionLog::new();
        log.actions = vec![stamped(
            50,
            Action::ToggleDoor { x: 1, y: 1 },
            ActionPhase::Finish,
        )];

        let lines = log.timeline();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("finish door (1, 1)"));
        assert!(!lines[0].contains("after"), "got: {}", lines[0]);
    }

    #[test]
    fn test_timeline_repeated_toggle_pairs_in_order() {
        // Open and close the same door: each finish pairs with its own start
        let mut log = ActionLog::new();
        log.actions = vec![
            stamped(0, Action::ToggleDoor { x: 2, y: 4 }, ActionPhase::Start),
            stamped(667, Action::ToggleDoor { x: 2, y: 4 }, ActionPhase::Finish),
            stamped(900, Action::ToggleDoor { x: 2, y: 4 }, ActionPhase::Start),
            stamped(1567, Action::ToggleDoor { x: 2, y: 4 }, ActionPhase::Finish),
        ];

        let lines = log.timeline();
        assert!(lines[1].contains("after 667ms"), "got: {}", lines[1]);
        assert!(lines[3].contains("after 667ms"), "got: {}", lines[3]);
    }
}
