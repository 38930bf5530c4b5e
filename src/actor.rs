use crate::geometry::{segment_push, LineCollider};
use crate::grid::Grid;

/// Behavioral state of an agent. `Dead` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Pathfind,
    Attack,
    Dead,
}

/// Stimuli the simulation feeds into the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentEvent {
    TargetEnteredRange,
    TargetLeftRange,
    HealthDepleted,
}

/// The complete transition table: (from, event, to). Pairs without a row
/// keep the current state, which is also what makes `Dead` absorbing.
pub const TRANSITIONS: [(AgentState, AgentEvent, AgentState); 4] = [
    (
        AgentState::Pathfind,
        AgentEvent::TargetEnteredRange,
        AgentState::Attack,
    ),
    (
        AgentState::Attack,
        AgentEvent::TargetLeftRange,
        AgentState::Pathfind,
    ),
    (
        AgentState::Pathfind,
        AgentEvent::HealthDepleted,
        AgentState::Dead,
    ),
    (
        AgentState::Attack,
        AgentEvent::HealthDepleted,
        AgentState::Dead,
    ),
];

/// Look up the state an event leads to
pub fn next_state(state: AgentState, event: AgentEvent) -> AgentState {
    for &(from, ev, to) in TRANSITIONS.iter() {
        if from == state && ev == event {
            return to;
        }
    }
    state
}

/// A moving body on the grid with continuous position
#[derive(Clone, Debug)]
pub struct Actor {
    /// Index into the simulation's actor list, also its spatial-index id
    pub id: usize,

    /// Position in cell units (center of the body)
    pub x: f32,
    pub y: f32,

    /// Body radius in cell units; must stay below half a cell so the
    /// surrounding 3x3 colliders cover every possible contact
    pub radius: f32,

    /// Cells per second
    pub speed: f32,

    pub state: AgentState,
}

impl Actor {
    pub fn new(id: usize, x: f32, y: f32, radius: f32, speed: f32) -> Self {
        Actor {
            id,
            x,
            y,
            radius,
            speed,
            state: AgentState::Pathfind,
        }
    }

    pub fn pos(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// The cell the body center is in
    pub fn cell(&self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }

    /// Move along `dir` for one frame. Callers pass unit steering vectors;
    /// the zero vector stands still.
    pub fn advance(&mut self, dir: (f32, f32), delta_time: f32) {
        self.x += dir.0 * self.speed * delta_time;
        self.y += dir.1 * self.speed * delta_time;
    }

    /// Push the body out of nearby walls and door panels. Colliders are
    /// collected into `scratch` so per-frame resolution does not allocate.
    /// Returns the applied displacement.
    pub fn resolve_collisions(&mut self, grid: &Grid, scratch: &mut Vec<LineCollider>) -> (f32, f32) {
        let (cx, cy) = self.cell();
        grid.wall_colliders(cx, cy, scratch);
        let (push_x, push_y) = segment_push((self.x, self.y), scratch, self.radius);
        self.x += push_x;
        self.y += push_y;
        (push_x, push_y)
    }

    /// Ad-hoc damage-area segment from the body center along `facing`.
    /// Test points against it with `segment_hits` and thickness = reach.
    pub fn attack_collider(&self, facing: (f32, f32), reach: f32) -> LineCollider {
        LineCollider::new((self.x, self.y), facing, reach)
    }

    /// Feed an event through the transition table. Returns whether the
    /// state changed.
    pub fn handle(&mut self, event: AgentEvent) -> bool {
        let next = next_state(self.state, event);
        let changed = next != self.state;
        self.state = next;
        changed
    }

    pub fn is_dead(&self) -> bool {
        self.state == AgentState::Dead
    }
}
