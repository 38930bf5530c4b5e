pub mod action_log;
pub mod actor;
pub mod config;
pub mod door;
pub mod geometry;
pub mod grid;
pub mod level;
pub mod pathfinding;
pub mod raycast;
pub mod spatial;

pub use actor::{Actor, AgentEvent, AgentState};
pub use door::{Door, DoorAxis};
pub use geometry::LineCollider;
pub use grid::{Grid, NeighborMask};
pub use level::Level;
pub use pathfinding::{next_step, ApproachMap, Position};
pub use raycast::{cast_floor, cast_wall, line_of_sight, HitInfo};
pub use spatial::ActorIndex;
