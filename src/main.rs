use arboard::Clipboard;
use gridcast::action_log::{Action, ActionLog};
use gridcast::actor::{Actor, AgentEvent, AgentState};
use gridcast::config::Config;
use gridcast::geometry::{segment_intersection, segment_push, LineCollider};
use gridcast::grid::Grid;
use gridcast::level::Level;
use gridcast::pathfinding::ApproachMap;
use gridcast::raycast::{cast_floor, cast_wall, line_of_sight, HitInfo, HitSide};
use gridcast::spatial::ActorIndex;
use macroquad::prelude::*;

/// Screen pixels per rendered wall sliver
const COLUMN_WIDTH: f32 = 2.0;
/// Distance at which wall shading bottoms out
const FADE_DISTANCE: f32 = 12.0;
/// Hysteresis factor before an agent drops back out of attack range
const LEAVE_RANGE_FACTOR: f32 = 1.5;

/// Map used when the configured level file cannot be loaded
const FALLBACK_MAP: &str = "\
################
#P.....#.......#
#......D...E...#
#\\.....#.......#
####D###....E..#
#......#.......#
#...E..#####D###
#..............#
#....2222..E...#
#....2..2......#
#....2..D......#
#....2222......#
#..............#
################";

struct Player {
    x: f32,
    y: f32,
    angle: f32,
    radius: f32,
}

struct Demo {
    config: Config,
    grid: Grid,
    player: Player,
    agents: Vec<Actor>,
    index: ActorIndex,
    approach: ApproachMap,
    /// Override steering target set from the minimap; agents chase the
    /// player while it is unset
    rally: Option<(f32, f32)>,
    show_minimap: bool,
    log: Option<ActionLog>,
    scratch: Vec<LineCollider>,
}

impl Demo {
    fn new(config: Config) -> Result<Self, String> {
        let (level, source) = match Level::load_from_file(&config.level.path) {
            Ok(level) => (level, config.level.path.clone()),
            Err(e) => {
                eprintln!("Warning: {}", e);
                eprintln!("Using built-in map");
                (Level::from_ascii(FALLBACK_MAP)?, "built-in".to_string())
            }
        };

        let mut grid = level.to_grid()?;
        for door in &mut grid.doors {
            door.speed = config.doors.slide_speed;
        }

        let player = Player {
            x: level.player_spawn.0,
            y: level.player_spawn.1,
            angle: 0.0,
            radius: config.player.radius,
        };

        let agents: Vec<Actor> = level
            .agent_spawns
            .iter()
            .enumerate()
            .map(|(id, &(x, y))| Actor::new(id, x, y, config.agents.radius, config.agents.speed))
            .collect();

        let mut index = ActorIndex::new(grid.rows, grid.cols);
        let positions: Vec<(f32, f32)> = agents.iter().map(|a| a.pos()).collect();
        index.build(&positions);

        let mut approach = ApproachMap::new(grid.rows, grid.cols);
        approach.occupancy_span = config.agents.occupancy_span;

        let mut log = if config.logging.enable_action_log {
            Some(ActionLog::new())
        } else {
            None
        };
        if let Some(log) = log.as_mut() {
            let action = Action::LoadLevel {
                path: source,
                rows: grid.rows,
                cols: grid.cols,
            };
            log.log_start(action.clone());
            log.log_finish(action);
        }

        Ok(Demo {
            config,
            grid,
            player,
            agents,
            index,
            approach,
            rally: None,
            show_minimap: true,
            log,
            scratch: Vec::new(),
        })
    }

    fn facing(&self) -> (f32, f32) {
        (self.player.angle.cos(), self.player.angle.sin())
    }

    fn handle_input(&mut self, delta_time: f32) {
        if is_key_down(KeyCode::Left) {
            self.player.angle -= self.config.player.turn_speed * delta_time;
        }
        if is_key_down(KeyCode::Right) {
            self.player.angle += self.config.player.turn_speed * delta_time;
        }

        let (fx, fy) = self.facing();
        let mut mx = 0.0;
        let mut my = 0.0;
        if is_key_down(KeyCode::W) {
            mx += fx;
            my += fy;
        }
        if is_key_down(KeyCode::S) {
            mx -= fx;
            my -= fy;
        }
        if is_key_down(KeyCode::A) {
            mx += fy;
            my -= fx;
        }
        if is_key_down(KeyCode::D) {
            mx -= fy;
            my += fx;
        }
        let mag = (mx * mx + my * my).sqrt();
        if mag > 1e-6 {
            let step = self.config.player.move_speed * delta_time;
            self.player.x += mx / mag * step;
            self.player.y += my / mag * step;
        }
        // Walls and door panels shove the player back out
        let cell = (self.player.x.floor() as i32, self.player.y.floor() as i32);
        self.grid.wall_colliders(cell.0, cell.1, &mut self.scratch);
        let (px, py) = segment_push(
            (self.player.x, self.player.y),
            &self.scratch,
            self.player.radius,
        );
        self.player.x += px;
        self.player.y += py;

        if is_key_pressed(KeyCode::E) {
            let probe = (self.player.x + fx, self.player.y + fy);
            if self.grid.toggle_door(probe) {
                if let Some(log) = self.log.as_mut() {
                    log.log_start(Action::ToggleDoor {
                        x: probe.0.floor() as i32,
                        y: probe.1.floor() as i32,
                    });
                }
            }
        }

        if is_key_pressed(KeyCode::Space) {
            let spawn = (self.player.x + fx * 2.0, self.player.y + fy * 2.0);
            self.spawn_agent(spawn);
        }

        if is_key_pressed(KeyCode::K) {
            self.kill_nearest_agent();
        }

        if is_key_pressed(KeyCode::M) {
            self.show_minimap = !self.show_minimap;
        }

        if is_key_pressed(KeyCode::C) {
            copy_to_clipboard(&self.grid.to_ascii());
        }

        if self.show_minimap
            && (is_mouse_button_pressed(MouseButton::Left)
                || is_mouse_button_pressed(MouseButton::Right))
        {
            let (mouse_x, mouse_y) = mouse_position();
            self.handle_minimap_click(mouse_x, mouse_y);
        }
    }

    fn handle_minimap_click(&mut self, mouse_x: f32, mouse_y: f32) {
        let cell_px = self.config.render.minimap_cell;
        let gx = ((mouse_x - MINIMAP_ORIGIN.0) / cell_px).floor() as i32;
        let gy = ((mouse_y - MINIMAP_ORIGIN.1) / cell_px).floor() as i32;
        if !self.grid.in_bounds(gx, gy) {
            return;
        }

        if is_mouse_button_pressed(MouseButton::Left) {
            let center = (gx as f32 + 0.5, gy as f32 + 0.5);
            if self.grid.door_at(gx, gy).is_some() {
                if self.grid.toggle_door(center) {
                    if let Some(log) = self.log.as_mut() {
                        log.log_start(Action::ToggleDoor { x: gx, y: gy });
                    }
                }
            } else {
                // Sculpt walls live; masks and revision follow automatically
                let current = self.grid.get_cell(gx, gy);
                self.grid.set_cell(gx, gy, if current == 0 { 1 } else { 0 });
            }
        } else if is_mouse_button_pressed(MouseButton::Right) {
            let target = (gx as f32 + 0.5, gy as f32 + 0.5);
            self.rally = Some(target);
            if let Some(log) = self.log.as_mut() {
                let action = Action::SetTarget {
                    x: target.0,
                    y: target.1,
                };
                log.log_start(action.clone());
                log.log_finish(action);
            }
        }
    }

    fn spawn_agent(&mut self, pos: (f32, f32)) {
        let cell = (pos.0.floor() as i32, pos.1.floor() as i32);
        if !self.grid.is_passable(cell.0, cell.1) {
            return;
        }
        let id = self.agents.len();
        self.agents.push(Actor::new(
            id,
            pos.0,
            pos.1,
            self.config.agents.radius,
            self.config.agents.speed,
        ));
        self.index.insert_actor(id, pos);
        if let Some(log) = self.log.as_mut() {
            let action = Action::SpawnAgent { x: pos.0, y: pos.1 };
            log.log_start(action.clone());
            log.log_finish(action);
        }
    }

    fn kill_nearest_agent(&mut self) {
        let player = (self.player.x, self.player.y);
        let victim = self
            .agents
            .iter()
            .filter(|a| !a.is_dead())
            .min_by(|a, b| {
                let da = dist2(a.pos(), player);
                let db = dist2(b.pos(), player);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|a| a.id);
        if let Some(id) = victim {
            if self.agents[id].handle(AgentEvent::HealthDepleted) {
                // Corpses neither block nor repel: the body leaves the index
                // so steering stops counting it, matching the separation pass
                self.index.remove_actor(id, self.agents[id].pos());
                if let Some(log) = self.log.as_mut() {
                    let action = Action::AgentDied { id };
                    log.log_start(action.clone());
                    log.log_finish(action);
                }
            }
        }
    }

    fn tick(&mut self, delta_time: f32) {
        let crossed = self.grid.update(delta_time);
        if let Some(log) = self.log.as_mut() {
            for (x, y) in crossed {
                log.log_finish(Action::ToggleDoor { x, y });
            }
        }

        let player = (self.player.x, self.player.y);
        let target = self.rally.unwrap_or(player);
        self.approach.refresh(&self.grid, &[target]);

        // Steering and separation both read the pre-move frame state
        let mut dirs = vec![(0.0, 0.0); self.agents.len()];
        for (i, agent) in self.agents.iter().enumerate() {
            if agent.state == AgentState::Pathfind {
                dirs[i] = self
                    .approach
                    .steer(&self.grid, &self.index, i, agent.pos(), target);
            }
        }
        let pushes = self.separation_pushes();

        let reach = self.config.agents.attack_reach;
        let leave = reach * LEAVE_RANGE_FACTOR;
        for i in 0..self.agents.len() {
            if self.agents[i].is_dead() {
                continue;
            }
            let old = self.agents[i].pos();
            self.agents[i].advance(dirs[i], delta_time);
            self.agents[i].x += pushes[i].0;
            self.agents[i].y += pushes[i].1;
            self.agents[i].resolve_collisions(&self.grid, &mut self.scratch);
            let new = self.agents[i].pos();
            self.index.move_actor(i, old, new);

            let d2 = dist2(new, player);
            if d2 < reach * reach {
                self.agents[i].handle(AgentEvent::TargetEnteredRange);
            } else if d2 > leave * leave {
                self.agents[i].handle(AgentEvent::TargetLeftRange);
            }
        }
    }

    /// Body separation between agents, gathered through row windows of the
    /// spatial index around each body
    fn separation_pushes(&self) -> Vec<(f32, f32)> {
        let mut pushes = vec![(0.0, 0.0); self.agents.len()];
        for agent in &self.agents {
            if agent.is_dead() {
                continue;
            }
            let (cx, cy) = agent.cell();
            let mut push = (0.0, 0.0);
            for dy in -1..=1 {
                for &other in self.index.query_row(cx, cy + dy, 1) {
                    if other == agent.id || self.agents[other].is_dead() {
                        continue;
                    }
                    let o = &self.agents[other];
                    let dx = agent.x - o.x;
                    let dyw = agent.y - o.y;
                    let min_dist = agent.radius + o.radius;
                    let d2 = dx * dx + dyw * dyw;
                    if d2 >= min_dist * min_dist {
                        continue;
                    }
                    let d = d2.sqrt();
                    if d < 1e-4 {
                        // Stacked bodies break the tie by id
                        let sign = if agent.id < other { 1.0 } else { -1.0 };
                        push.0 += sign * min_dist * 0.5;
                    } else {
                        let overlap = (min_dist - d) * 0.5;
                        push.0 += dx / d * overlap;
                        push.1 += dyw / d * overlap;
                    }
                }
            }
            pushes[agent.id] = push;
        }
        pushes
    }

    fn draw(&self) {
        clear_background(Color::from_rgba(30, 30, 30, 255));
        self.draw_first_person();
        if self.show_minimap {
            self.draw_minimap();
        }
        self.draw_hud();
    }

    fn draw_first_person(&self) {
        let screen_w = screen_width();
        let screen_h = screen_height();
        let origin = (self.player.x, self.player.y);
        let dir = self.facing();
        let plane_len = (self.config.render.fov_degrees.to_radians() * 0.5).tan();
        let plane = (-dir.1 * plane_len, dir.0 * plane_len);

        let mut x = 0.0;
        while x < screen_w {
            let cam = 2.0 * (x + COLUMN_WIDTH * 0.5) / screen_w - 1.0;
            let ray = (dir.0 + plane.0 * cam, dir.1 + plane.1 * cam);
            let ray_len = (ray.0 * ray.0 + ray.1 * ray.1).sqrt();
            let unit = (ray.0 / ray_len, ray.1 / ray_len);
            // cos of the angle to the view axis, for fisheye correction
            let cos = (unit.0 * dir.0 + unit.1 * dir.1).max(1e-3);

            let hit = cast_wall(&self.grid, origin, ray);
            let mut depth = hit.distance;
            let mut color = match hit.side {
                HitSide::OffMap => None,
                _ => Some(wall_color(&self.grid, &hit, unit)),
            };

            // A door panel in front of the wall wins the sliver
            for door in &self.grid.doors {
                if door.extent <= 0.0 {
                    continue;
                }
                let panel = door.collider();
                let far = (origin.0 + unit.0, origin.1 + unit.1);
                if let Some((ix, iy)) = segment_intersection(
                    (panel.origin_x, panel.origin_y),
                    panel.end(),
                    origin,
                    far,
                    true,
                ) {
                    let d = (ix - origin.0) * unit.0 + (iy - origin.1) * unit.1;
                    if d > 0.01 && d < depth {
                        depth = d;
                        color = Some(Color::from_rgba(170, 120, 60, 255));
                    }
                }
            }

            let perp = (depth * cos).max(0.05);
            let half = (screen_h / perp) * 0.5;
            let mid = screen_h * 0.5;
            let top = (mid - half).max(0.0);
            let bottom = (mid + half).min(screen_h);

            let floor_hit = cast_floor(
                &self.grid,
                false,
                origin,
                ray,
                self.config.render.floor_max_distance,
            );
            let ceiling = shade(
                ceiling_color(floor_hit.ceiling_material),
                1.0 - (floor_hit.distance / FADE_DISTANCE).min(0.6),
            );
            let floor = shade(
                floor_color(floor_hit.floor_material),
                1.0 - (floor_hit.distance / FADE_DISTANCE).min(0.6),
            );
            draw_rectangle(x, 0.0, COLUMN_WIDTH, top, ceiling);
            draw_rectangle(x, bottom, COLUMN_WIDTH, screen_h - bottom, floor);

            if let Some(base) = color {
                let fade = 1.0 - (perp / FADE_DISTANCE).min(0.75);
                draw_rectangle(x, top, COLUMN_WIDTH, bottom - top, shade(base, fade));
            }

            x += COLUMN_WIDTH;
        }
    }

    fn draw_minimap(&self) {
        let cell_px = self.config.render.minimap_cell;
        let (ox, oy) = MINIMAP_ORIGIN;

        for y in 0..self.grid.rows {
            for x in 0..self.grid.cols {
                let material = self.grid.get_cell(x, y);
                let color = if let Some(door) = self.grid.door_at(x, y) {
                    if door.is_open() {
                        Color::from_rgba(80, 140, 180, 255)
                    } else {
                        Color::from_rgba(40, 90, 140, 255)
                    }
                } else if material < 0 {
                    Color::from_rgba(150, 110, 60, 255)
                } else if material > 0 {
                    Color::from_rgba(120, 40, 40, 255)
                } else {
                    Color::from_rgba(55, 55, 55, 255)
                };
                draw_rectangle(
                    ox + x as f32 * cell_px,
                    oy + y as f32 * cell_px,
                    cell_px - 1.0,
                    cell_px - 1.0,
                    color,
                );
            }
        }

        let to_px = |wx: f32, wy: f32| (ox + wx * cell_px, oy + wy * cell_px);

        if let Some((rx, ry)) = self.rally {
            let (px, py) = to_px(rx, ry);
            draw_circle(px, py, cell_px * 0.3, GOLD);
        }

        let player_cell = (self.player.x.floor() as i32, self.player.y.floor() as i32);
        for agent in &self.agents {
            let (px, py) = to_px(agent.x, agent.y);
            let color = match agent.state {
                AgentState::Dead => Color::from_rgba(70, 70, 70, 255),
                AgentState::Attack => RED,
                AgentState::Pathfind => {
                    if line_of_sight(&self.grid, agent.cell(), player_cell) {
                        ORANGE
                    } else {
                        Color::from_rgba(200, 160, 60, 255)
                    }
                }
            };
            draw_circle(px, py, agent.radius * cell_px, color);

            if agent.state == AgentState::Attack {
                let facing = (self.player.x - agent.x, self.player.y - agent.y);
                let sweep = agent.attack_collider(facing, self.config.agents.attack_reach);
                let (ex, ey) = sweep.end();
                let (ax, ay) = to_px(sweep.origin_x, sweep.origin_y);
                let (bx, by) = to_px(ex, ey);
                draw_line(ax, ay, bx, by, 2.0, RED);
            }
        }

        let (px, py) = to_px(self.player.x, self.player.y);
        draw_circle(px, py, self.player.radius * cell_px, SKYBLUE);
        let (fx, fy) = self.facing();
        draw_line(px, py, px + fx * cell_px, py + fy * cell_px, 2.0, SKYBLUE);
    }

    fn draw_hud(&self) {
        let alive = self.agents.iter().filter(|a| !a.is_dead()).count();
        draw_text(
            "WASD move, arrows turn, E door, Space spawn, K kill, M map, C copy, Esc quit",
            10.0,
            screen_height() - 30.0,
            18.0,
            WHITE,
        );
        let stats = format!(
            "Agents: {} alive / {} total | Doors: {} | Revision: {} | FPS: {}",
            alive,
            self.agents.len(),
            self.grid.doors.len(),
            self.grid.get_revision(),
            get_fps()
        );
        draw_text(&stats, 10.0, screen_height() - 10.0, 18.0, WHITE);
    }

    fn finish(self) {
        if let Some(log) = self.log {
            println!("{}", log.summary());
            if let Err(e) = log.save_to_file(&self.config.logging.action_log_path) {
                eprintln!("Failed to save action log: {}", e);
            } else {
                println!("Action log saved to {}", self.config.logging.action_log_path);
            }
        }
    }
}

/// Minimap top-left corner in screen pixels
const MINIMAP_ORIGIN: (f32, f32) = (10.0, 10.0);

fn dist2(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    dx * dx + dy * dy
}

fn shade(color: Color, factor: f32) -> Color {
    let f = factor.clamp(0.15, 1.0);
    Color::new(color.r * f, color.g * f, color.b * f, 1.0)
}

fn wall_color(grid: &Grid, hit: &HitInfo, unit: (f32, f32)) -> Color {
    let base = match hit.material {
        1 => Color::from_rgba(170, 170, 170, 255),
        2 => Color::from_rgba(170, 120, 120, 255),
        3 => Color::from_rgba(120, 170, 120, 255),
        4 => Color::from_rgba(120, 120, 170, 255),
        _ => Color::from_rgba(150, 150, 110, 255),
    };
    // Simple procedural banding from the texture coordinate
    let band = ((hit.texture_coord * 8.0) as i32) % 2 == 0;
    let mut factor = if band { 0.85 } else { 1.0 };
    if hit.side == HitSide::AxisY {
        factor *= 0.75;
    }
    if hit.side == HitSide::Diagonal {
        factor *= 0.9;
    }
    // Ambient light of the air cell just in front of the hit point
    let lx = (hit.world_x - unit.0 * 0.01).floor() as i32;
    let ly = (hit.world_y - unit.1 * 0.01).floor() as i32;
    factor *= grid.get_light(lx, ly).clamp(0.3, 1.0);
    shade(base, factor)
}

fn floor_color(material: i32) -> Color {
    match material {
        1 => Color::from_rgba(90, 80, 70, 255),
        2 => Color::from_rgba(70, 90, 70, 255),
        _ => Color::from_rgba(80, 80, 85, 255),
    }
}

fn ceiling_color(material: i32) -> Color {
    match material {
        2 => Color::from_rgba(45, 45, 60, 255),
        _ => Color::from_rgba(40, 40, 45, 255),
    }
}

fn copy_to_clipboard(text: &str) {
    match Clipboard::new() {
        Ok(mut clipboard) => {
            if let Err(e) = clipboard.set_text(text) {
                println!("Failed to copy to clipboard: {}", e);
            } else {
                println!("Map copied to clipboard!");
                // Keep clipboard alive for a moment to ensure clipboard managers can capture it
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
        }
        Err(e) => {
            println!("Failed to access clipboard: {}", e);
        }
    }
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Gridcast Demo".to_string(),
        window_width: 1024,
        window_height: 640,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let config = Config::load();
    let mut demo = match Demo::new(config) {
        Ok(demo) => demo,
        Err(e) => {
            eprintln!("Failed to start: {}", e);
            return;
        }
    };

    loop {
        let delta_time = get_frame_time();
        if is_key_pressed(KeyCode::Escape) {
            break;
        }
        demo.handle_input(delta_time);
        demo.tick(delta_time);
        demo.draw();
        next_frame().await
    }

    demo.finish();
}
