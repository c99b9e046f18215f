use glam::{Quat, Vec3};

use crate::actor::{Actor, Locomotion};
use crate::anim::{AnimError, AnimationController};
use crate::camera::FollowCamera;
use crate::input::InputState;
use crate::terrain::{Terrain, TerrainQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steering {
    /// Keys map to fixed world axes (forward = -Z); facing snaps to the heading.
    WorldAxes,
    /// Keys follow the camera's ground-plane axes; facing turns smoothly.
    CameraRelative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestep {
    /// `base_speed` is units per second, scaled by dt.
    PerSecond,
    /// `base_speed` is units per tick regardless of dt.
    PerTick,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementConfig {
    pub base_speed: f32,
    pub sprint_multiplier: f32,
    pub steering: Steering,
    pub timestep: Timestep,
    /// Slerp factor per tick toward the target facing (camera-relative steering).
    pub turn_blend: f32,
    pub fade_duration: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            base_speed: 4.0,
            sprint_multiplier: 2.0,
            steering: Steering::CameraRelative,
            timestep: Timestep::PerSecond,
            turn_blend: 0.2,
            fade_duration: 0.5,
        }
    }
}

pub struct MovementController {
    config: MovementConfig,
}

impl MovementController {
    pub fn new(config: MovementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// Unit ground-plane heading from held keys, or None when they cancel out.
    pub fn direction(&self, input: &InputState, camera: &FollowCamera) -> Option<Vec3> {
        if !input.any_direction() {
            return None;
        }

        let (forward, right) = match self.config.steering {
            Steering::WorldAxes => (Vec3::NEG_Z, Vec3::X),
            Steering::CameraRelative => (camera.flat_forward(), camera.flat_right()),
        };

        let mut dir = Vec3::ZERO;
        if input.forward {
            dir += forward;
        }
        if input.back {
            dir -= forward;
        }
        if input.right {
            dir += right;
        }
        if input.left {
            dir -= right;
        }

        // opposing keys cancel: same as nothing held
        let dir = dir.normalize_or_zero();
        (dir != Vec3::ZERO).then_some(dir)
    }

    fn step_length(&self, sprint: bool, dt: f32) -> f32 {
        let speed = if sprint {
            self.config.base_speed * self.config.sprint_multiplier
        } else {
            self.config.base_speed
        };
        match self.config.timestep {
            Timestep::PerSecond => speed * dt,
            Timestep::PerTick => speed,
        }
    }

    /// Moves the actor for one tick. Returns the world-space displacement.
    pub fn tick(
        &self,
        actor: &mut Actor,
        input: &InputState,
        camera: &FollowCamera,
        terrain: &mut Terrain,
        anim: &mut AnimationController,
        dt: f32,
    ) -> Result<Vec3, AnimError> {
        let heading = self.direction(input, camera);

        let mut delta = Vec3::ZERO;
        if let Some(dir) = heading {
            let step = self.step_length(input.sprint, dt);
            let mut next = actor.position + dir * step;
            // height is never integrated, always taken from the ground
            next.y = terrain.height_at(next.x, next.z);
            delta = next - actor.position;
            actor.position = next;

            let target = Quat::from_rotation_y(dir.x.atan2(dir.z));
            actor.facing = match self.config.steering {
                Steering::WorldAxes => target,
                Steering::CameraRelative => actor.facing.slerp(target, self.config.turn_blend),
            };
        }

        let locomotion = match heading {
            None => Locomotion::Idle,
            Some(_) if input.sprint => Locomotion::Running,
            Some(_) => Locomotion::Walking,
        };
        if locomotion != actor.locomotion {
            anim.set_state(locomotion.state(), self.config.fade_duration)?;
            actor.locomotion = locomotion;
        }

        if let Some(tiles) = terrain.tiles_mut() {
            tiles.recenter(actor.position);
        }

        Ok(delta)
    }
}
