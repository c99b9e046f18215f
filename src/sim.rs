//! Per-frame simulation state and the tick that drives it.

use glam::{IVec2, Vec3};
use thiserror::Error;

use crate::actor::Actor;
use crate::anim::{AnimError, AnimationController, Emote, State};
use crate::assets::ActorModel;
use crate::camera::FollowCamera;
use crate::command::Command;
use crate::face::{Expressions, FaceError};
use crate::input::{InputKey, InputState};
use crate::movement::{MovementConfig, MovementController};
use crate::terrain::{Terrain, TerrainQuery};

/// Ticks between diagnostic log lines.
const LOG_EVERY: u64 = 60;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Anim(#[from] AnimError),
    #[error(transparent)]
    Face(#[from] FaceError),
    #[error("actor left the valid range at {0}")]
    Diverged(Vec3),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub tick: u64,
    pub position: Vec3,
    pub yaw: f32,
    pub state: State,
    pub overlay: Option<Emote>,
    pub active: String,
    pub tile_centre: Option<IVec2>,
}

/// Everything one simulation owns: actor, input, terrain, animation, camera.
pub struct SimulationContext {
    tick: u64,
    input: InputState,
    camera: FollowCamera,
    terrain: Terrain,
    movement: MovementController,
    actor: Option<Actor>,
    anim: Option<AnimationController>,
    face: Option<Expressions>,
    commands: Vec<Command>,
}

impl SimulationContext {
    pub fn new(terrain: Terrain, movement: MovementConfig, camera: FollowCamera) -> Self {
        Self {
            tick: 0,
            input: InputState::default(),
            camera,
            terrain,
            movement: MovementController::new(movement),
            actor: None,
            anim: None,
            face: None,
            commands: Vec::new(),
        }
    }

    /// Places the loaded model on the ground at the origin and wakes the simulation.
    pub fn attach_actor(&mut self, model: &ActorModel) -> Result<(), AnimError> {
        let fade = self.movement.config().fade_duration;
        let anim = AnimationController::new(model, fade)?;

        let ground = self.terrain.height_at(0.0, 0.0);
        let actor = Actor::new(Vec3::new(0.0, ground, 0.0));
        self.camera.target = actor.position;
        if let Some(tiles) = self.terrain.tiles_mut() {
            tiles.recenter(actor.position);
        }

        log::info!(
            "SIM: actor '{}' attached with {} clips, {} morph targets",
            model.name,
            model.clips.len(),
            model.morph_targets.len()
        );
        self.face = Some(Expressions::new(&model.morph_targets));
        self.anim = Some(anim);
        self.actor = Some(actor);
        Ok(())
    }

    pub fn on_key_down(&mut self, key: InputKey) {
        self.input.on_key_down(key);
    }

    pub fn on_key_up(&mut self, key: InputKey) {
        self.input.on_key_up(key);
    }

    pub fn queue(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    #[cfg(test)]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn camera(&self) -> &FollowCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut FollowCamera {
        &mut self.camera
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    pub fn animation(&self) -> Option<&AnimationController> {
        self.anim.as_ref()
    }

    pub fn expressions(&self) -> Option<&Expressions> {
        self.face.as_ref()
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        let actor = self.actor.as_ref()?;
        let anim = self.anim.as_ref()?;
        Some(Snapshot {
            tick: self.tick,
            position: actor.position,
            yaw: actor.yaw(),
            state: anim.state(),
            overlay: anim.overlay(),
            active: anim.active().to_string(),
            tile_centre: self.terrain.tiles().map(|t| t.centre()),
        })
    }

    /// One frame. Does nothing until an actor is attached.
    pub fn tick(&mut self, dt: f32) -> Result<(), FrameError> {
        self.tick += 1;

        let (Some(actor), Some(anim), Some(face)) =
            (self.actor.as_mut(), self.anim.as_mut(), self.face.as_mut())
        else {
            self.input.clear_one_shots();
            if !self.commands.is_empty() {
                log::debug!("SIM: dropping {} commands, no actor yet", self.commands.len());
                self.commands.clear();
            }
            return Ok(());
        };

        // every queued command and the action key get applied even if one fails
        let fade = self.movement.config().fade_duration;
        let mut failed = None;
        for cmd in self.commands.drain(..) {
            log::debug!("CMD {:?}", cmd);
            let applied = match cmd {
                Command::SetState(state) => anim.set_state(state, fade).map_err(FrameError::from),
                Command::Emote(emote) => anim.play_emote(emote, fade).map_err(FrameError::from),
                Command::SetExpression { name, value } => {
                    face.set(&name, value).map_err(FrameError::from)
                }
            };
            if let Err(e) = applied {
                keep_first(&mut failed, e);
            }
        }

        if self.input.action {
            self.input.clear_one_shots();
            if let Err(e) = anim.play_emote(Emote::Jump, fade) {
                keep_first(&mut failed, e.into());
            }
        }

        if let Some(e) = failed {
            return Err(e);
        }

        let delta = self.movement.tick(
            actor,
            &self.input,
            &self.camera,
            &mut self.terrain,
            anim,
            dt,
        )?;
        self.camera.follow(delta);

        anim.update(dt)?;

        if !actor.position.is_finite() {
            return Err(FrameError::Diverged(actor.position));
        }

        if self.tick % LOG_EVERY == 0 {
            if let Some(snap) = self.snapshot() {
                log::debug!(
                    "TICK {} POS x={:.2} y={:.2} z={:.2} yaw={:.2} state={} active={} tiles={:?}",
                    snap.tick,
                    snap.position.x,
                    snap.position.y,
                    snap.position.z,
                    snap.yaw,
                    snap.state.name(),
                    snap.active,
                    snap.tile_centre
                );
            }
        }
        Ok(())
    }
}

fn keep_first(slot: &mut Option<FrameError>, err: FrameError) {
    if slot.is_some() {
        log::warn!("SIM: {err}");
    } else {
        *slot = Some(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets;
    use crate::movement::{Steering, Timestep};
    use crate::terrain::WaveTerrain;
    use crate::tiles::{TerrainTileManager, TileGridConfig};
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn flat() -> Terrain {
        Terrain::Wave(WaveTerrain {
            amplitude: 0.0,
            ..WaveTerrain::default()
        })
    }

    fn world_axes(base_speed: f32) -> MovementConfig {
        MovementConfig {
            base_speed,
            steering: Steering::WorldAxes,
            timestep: Timestep::PerSecond,
            ..MovementConfig::default()
        }
    }

    fn loaded(terrain: Terrain, movement: MovementConfig) -> SimulationContext {
        let mut sim = SimulationContext::new(terrain, movement, FollowCamera::default());
        let model = assets::load_actor(assets::ROBOT).expect("robot");
        sim.attach_actor(&model).expect("attach");
        sim
    }

    fn run(sim: &mut SimulationContext, ticks: usize) {
        for _ in 0..ticks {
            sim.tick(DT).expect("tick");
        }
    }

    #[test]
    fn walking_forward_for_one_second() {
        let mut sim = loaded(flat(), world_axes(0.1));
        sim.on_key_down(InputKey::Forward);
        run(&mut sim, 60);

        let snap = sim.snapshot().expect("snapshot");
        assert_relative_eq!(snap.position.x, 0.0);
        assert_relative_eq!(snap.position.z, -0.1, epsilon = 1e-5);
        assert_relative_eq!(snap.position.y, 0.0);
        assert_eq!(snap.state, State::Walking);
        assert_eq!(snap.active, "Walking");
    }

    #[test]
    fn sprinting_doubles_displacement() {
        let mut sim = loaded(flat(), world_axes(0.1));
        sim.on_key_down(InputKey::Forward);
        sim.on_key_down(InputKey::Sprint);
        run(&mut sim, 60);

        let snap = sim.snapshot().expect("snapshot");
        assert_relative_eq!(snap.position.z, -0.2, epsilon = 1e-5);
        assert_eq!(snap.state, State::Running);
    }

    #[test]
    fn per_tick_speed_ignores_dt() {
        let movement = MovementConfig {
            timestep: Timestep::PerTick,
            ..world_axes(0.1)
        };
        let mut sim = loaded(flat(), movement);
        sim.on_key_down(InputKey::Forward);
        run(&mut sim, 60);
        assert_relative_eq!(sim.snapshot().expect("snapshot").position.z, -6.0, epsilon = 1e-4);
    }

    #[test]
    fn opposing_keys_match_no_keys() {
        let mut idle = loaded(flat(), world_axes(0.1));
        run(&mut idle, 30);

        let mut cancelled = loaded(flat(), world_axes(0.1));
        cancelled.on_key_down(InputKey::Forward);
        cancelled.on_key_down(InputKey::Back);
        run(&mut cancelled, 30);

        let a = idle.snapshot().expect("idle");
        let b = cancelled.snapshot().expect("cancelled");
        assert_eq!(a.position, b.position);
        assert_eq!(a.state, State::Idle);
        assert_eq!(a.state, b.state);
        assert_eq!(a.active, b.active);
    }

    #[test]
    fn releasing_keys_returns_to_idle() {
        let mut sim = loaded(flat(), world_axes(1.0));
        sim.on_key_down(InputKey::Right);
        run(&mut sim, 10);
        sim.on_key_up(InputKey::Right);
        run(&mut sim, 1);
        assert_eq!(sim.snapshot().expect("snapshot").state, State::Idle);
    }

    #[test]
    fn dormant_until_actor_attached() {
        let mut sim = SimulationContext::new(flat(), world_axes(1.0), FollowCamera::default());
        sim.on_key_down(InputKey::Forward);
        sim.queue(Command::Emote(Emote::Wave));
        sim.tick(DT).expect("tick");
        assert!(sim.actor().is_none());
        assert!(sim.snapshot().is_none());

        // commands queued before load do not replay later
        let model = assets::load_actor(assets::ROBOT).expect("robot");
        sim.attach_actor(&model).expect("attach");
        sim.on_key_up(InputKey::Forward);
        sim.tick(DT).expect("tick");
        assert_eq!(sim.snapshot().expect("snapshot").overlay, None);
    }

    #[test]
    fn action_key_plays_jump_then_restores() {
        let mut sim = loaded(flat(), world_axes(1.0));
        sim.on_key_down(InputKey::Action);
        sim.on_key_up(InputKey::Action);
        sim.tick(DT).expect("tick");
        assert_eq!(sim.snapshot().expect("snapshot").overlay, Some(Emote::Jump));
        assert!(!sim.input().action);

        run(&mut sim, 90);
        let snap = sim.snapshot().expect("snapshot");
        assert_eq!(snap.overlay, None);
        assert_eq!(snap.active, "Idle");
    }

    #[test]
    fn panel_commands_apply_on_next_tick() {
        let mut sim = loaded(flat(), world_axes(1.0));
        sim.queue(Command::SetState(State::Dance));
        sim.queue(Command::SetExpression {
            name: "Sad".to_string(),
            value: 0.75,
        });
        sim.tick(DT).expect("tick");

        assert_eq!(sim.snapshot().expect("snapshot").active, "Dance");
        assert_eq!(sim.expressions().expect("face").get("Sad"), Ok(0.75));

        // standing still keeps the selected state
        run(&mut sim, 10);
        assert_eq!(sim.snapshot().expect("snapshot").active, "Dance");
    }

    #[test]
    fn missing_morph_target_fails_the_frame_only() {
        let mut sim = loaded(flat(), world_axes(1.0));
        sim.queue(Command::SetExpression {
            name: "Bored".to_string(),
            value: 1.0,
        });
        assert!(matches!(sim.tick(DT), Err(FrameError::Face(_))));
        sim.tick(DT).expect("next frame runs");
    }

    #[test]
    fn failed_command_keeps_the_rest_of_the_queue() {
        let mut sim = loaded(flat(), world_axes(1.0));
        sim.queue(Command::SetExpression {
            name: "Bored".to_string(),
            value: 1.0,
        });
        sim.queue(Command::Emote(Emote::Wave));
        sim.queue(Command::SetExpression {
            name: "Angry".to_string(),
            value: 0.5,
        });
        assert!(matches!(sim.tick(DT), Err(FrameError::Face(_))));

        assert_eq!(sim.snapshot().expect("snapshot").overlay, Some(Emote::Wave));
        assert_eq!(sim.expressions().expect("face").get("Angry"), Ok(0.5));
        sim.tick(DT).expect("next frame runs");
        assert_eq!(sim.snapshot().expect("snapshot").overlay, Some(Emote::Wave));
    }

    #[test]
    fn action_press_survives_a_failed_frame() {
        let mut sim = loaded(flat(), world_axes(1.0));
        sim.on_key_down(InputKey::Action);
        sim.on_key_up(InputKey::Action);
        sim.queue(Command::SetExpression {
            name: "Bored".to_string(),
            value: 1.0,
        });
        assert!(sim.tick(DT).is_err());

        assert_eq!(sim.snapshot().expect("snapshot").overlay, Some(Emote::Jump));
        assert!(!sim.input().action);
        run(&mut sim, 90);
        assert_eq!(sim.snapshot().expect("snapshot").active, "Idle");
    }

    #[test]
    fn camera_follows_actor() {
        let mut sim = loaded(flat(), world_axes(1.0));
        let before = sim.camera().eye();
        sim.on_key_down(InputKey::Left);
        run(&mut sim, 60);
        let moved = sim.camera().eye() - before;
        assert_relative_eq!(moved.x, -1.0, epsilon = 1e-4);
        assert_relative_eq!(sim.camera().target.x, sim.actor().expect("actor").position.x);
    }

    #[test]
    fn tiled_terrain_keeps_actor_on_ground() {
        let prefab = assets::load_terrain_tile(20.0, 16).expect("tile");
        let config = TileGridConfig {
            grid: 3,
            tile_size: 20.0,
            overlap: 0.1,
        };
        let tiles = TerrainTileManager::new(prefab, config).expect("grid");
        let mut sim = loaded(Terrain::Tiled(tiles), world_axes(12.0));
        sim.on_key_down(InputKey::Forward);
        sim.on_key_down(InputKey::Sprint);
        run(&mut sim, 300);

        let snap = sim.snapshot().expect("snapshot");
        assert!(snap.position.z < -100.0);
        assert_eq!(snap.tile_centre.expect("tiles").y, (snap.position.z / 19.9).round() as i32);
        let ground = sim.terrain().height_at(snap.position.x, snap.position.z);
        assert_relative_eq!(snap.position.y, ground, epsilon = 1e-4);
        assert!(sim.terrain().surface_sample(snap.position.x, snap.position.z).tile.is_some());
    }
}
