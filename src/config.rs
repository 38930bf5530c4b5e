use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub level: LevelConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub doors: DoorsConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct LevelConfig {
    #[serde(default = "default_level_path")]
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_fov_degrees")]
    pub fov_degrees: f32,
    #[serde(default = "default_floor_max_distance")]
    pub floor_max_distance: f32,
    #[serde(default = "default_show_minimap")]
    pub show_minimap: bool,
    #[serde(default = "default_minimap_cell")]
    pub minimap_cell: f32,
}

#[derive(Debug, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,
    #[serde(default = "default_turn_speed")]
    pub turn_speed: f32,
    #[serde(default = "default_player_radius")]
    pub radius: f32,
}

#[derive(Debug, Deserialize)]
pub struct DoorsConfig {
    #[serde(default = "default_slide_speed")]
    pub slide_speed: f32,
}

#[derive(Debug, Deserialize)]
pub struct AgentsConfig {
    #[serde(default = "default_agent_speed")]
    pub speed: f32,
    #[serde(default = "default_agent_radius")]
    pub radius: f32,
    #[serde(default = "default_attack_reach")]
    pub attack_reach: f32,
    #[serde(default = "default_occupancy_span")]
    pub occupancy_span: i32,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_enable_action_log")]
    pub enable_action_log: bool,
    #[serde(default = "default_action_log_path")]
    pub action_log_path: String,
}

// Default values
fn default_level_path() -> String { "levels/arena.json".to_string() }
fn default_fov_degrees() -> f32 { 66.0 }
fn default_floor_max_distance() -> f32 { 20.0 }
fn default_show_minimap() -> bool { true }
fn default_minimap_cell() -> f32 { 10.0 }
fn default_move_speed() -> f32 { 3.0 }
fn default_turn_speed() -> f32 { 2.5 }
fn default_player_radius() -> f32 { 0.25 }
fn default_slide_speed() -> f32 { 1.5 }
fn default_agent_speed() -> f32 { 2.0 }
fn default_agent_radius() -> f32 { 0.3 }
fn default_attack_reach() -> f32 { 1.2 }
fn default_occupancy_span() -> i32 { 4 }
fn default_enable_action_log() -> bool { true }
fn default_action_log_path() -> String { "action_log.json".to_string() }

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            path: default_level_path(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fov_degrees: default_fov_degrees(),
            floor_max_distance: default_floor_max_distance(),
            show_minimap: default_show_minimap(),
            minimap_cell: default_minimap_cell(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_speed: default_move_speed(),
            turn_speed: default_turn_speed(),
            radius: default_player_radius(),
        }
    }
}

impl Default for DoorsConfig {
    fn default() -> Self {
        Self {
            slide_speed: default_slide_speed(),
        }
    }
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            speed: default_agent_speed(),
            radius: default_agent_radius(),
            attack_reach: default_attack_reach(),
            occupancy_span: default_occupancy_span(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_action_log: default_enable_action_log(),
            action_log_path: default_action_log_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: LevelConfig::default(),
            render: RenderConfig::default(),
            player: PlayerConfig::default(),
            doors: DoorsConfig::default(),
            agents: AgentsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Self {
        match fs::read_to_string("gridcast.toml") {
            Ok(contents) => {
                match toml::from_str(&contents) {
                    Ok(config) => {
                        println!("Loaded configuration from gridcast.toml");
                        config
                    }
                    Err(e) => {
                        eprintln!("Warning: Failed to parse gridcast.toml: {}", e);
                        eprintln!("Using default configuration");
                        Config::default()
                    }
                }
            }
            Err(_) => {
                println!("No gridcast.toml found, using default configuration");
                Config::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: Config = toml::from_str("").expect("empty input is valid");
        assert_eq!(config.render.fov_degrees, 66.0);
        assert_eq!(config.agents.occupancy_span, 4);
        assert!(config.logging.enable_action_log);
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let config: Config = toml::from_str(
            "[agents]\nspeed = 3.5\n\n[render]\nfov_degrees = 90.0\n",
        )
        .expect("valid input");
        assert_eq!(config.agents.speed, 3.5);
        assert_eq!(config.agents.radius, 0.3, "untouched field keeps default");
        assert_eq!(config.render.fov_degrees, 90.0);
        assert_eq!(config.render.floor_max_distance, 20.0);
    }
}
