use glam::{Mat4, Vec3};

const PITCH_LIMIT: f32 = 1.45; // ~83°, never look from straight above

/// Orbit camera that trails the actor.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowCamera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub fov_y: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.35,
            distance: 8.0,
            fov_y: 45.0_f32.to_radians(),
            z_near: 0.1,
            z_far: 300.0,
        }
    }
}

impl FollowCamera {
    pub fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + Vec3::new(sy * cp, sp, cy * cp) * self.distance
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye()).normalize_or_zero()
    }

    /// Forward projected onto the ground plane; -Z when looking straight down.
    pub fn flat_forward(&self) -> Vec3 {
        let f = self.forward();
        let flat = Vec3::new(f.x, 0.0, f.z).normalize_or_zero();
        if flat == Vec3::ZERO {
            Vec3::NEG_Z
        } else {
            flat
        }
    }

    pub fn flat_right(&self) -> Vec3 {
        self.flat_forward().cross(Vec3::Y)
    }

    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Carries the camera along with the actor so the framing stays put.
    pub fn follow(&mut self, delta: Vec3) {
        self.target += delta;
    }

    pub fn view_proj(&self, width: u32, height: u32) -> Mat4 {
        let aspect = (width.max(1) as f32) / (height.max(1) as f32);
        let view = Mat4::look_at_rh(self.eye(), self.target, Vec3::Y);
        let proj = Mat4::perspective_rh(self.fov_y, aspect, self.z_near, self.z_far);
        proj * view
    }
}
