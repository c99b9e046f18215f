use glam::{Quat, Vec3};

use crate::anim::State;

/// Locomotion states the movement controller drives on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locomotion {
    Idle,
    Walking,
    Running,
}

impl Locomotion {
    pub fn state(self) -> State {
        match self {
            Locomotion::Idle => State::Idle,
            Locomotion::Walking => State::Walking,
            Locomotion::Running => State::Running,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub position: Vec3,
    /// Rotation about +Y; identity faces +Z.
    pub facing: Quat,
    pub locomotion: Locomotion,
}

impl Actor {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            facing: Quat::IDENTITY,
            locomotion: Locomotion::Idle,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.facing * Vec3::Z
    }

    pub fn yaw(&self) -> f32 {
        let f = self.forward();
        f.x.atan2(f.z)
    }
}
