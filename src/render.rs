//! Turns simulation state into one flat-colored triangle list for the GPU.

use glam::{Mat4, Quat, Vec3};

use crate::anim::State;
use crate::mesh::{TriMesh, Vertex};
use crate::sim::SimulationContext;
use crate::terrain::{Terrain, TerrainQuery};

/// Side length of the wave-terrain patch drawn around the actor.
const WAVE_PATCH: f32 = 120.0;
const WAVE_RES: u32 = 96;

#[derive(Debug, Default)]
pub struct SceneMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl SceneMesh {
    fn push_mesh(&mut self, mesh: &TriMesh, transform: Mat4, color: impl Fn(Vec3) -> [f32; 3]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(mesh.positions.iter().map(|p| {
            let world = transform.transform_point3(*p);
            Vertex {
                pos: world.to_array(),
                color: color(world),
            }
        }));
        self.indices.extend(mesh.indices.iter().map(|i| i + base));
    }
}

fn ground_color(height: f32, tint: f32) -> [f32; 3] {
    let t = ((height + 3.0) / 6.0).clamp(0.0, 1.0);
    [
        0.20 + 0.25 * t + tint,
        0.35 + 0.30 * t + tint,
        0.18 + 0.10 * t,
    ]
}

fn state_color(state: State, emoting: bool) -> [f32; 3] {
    if emoting {
        return [1.0, 0.85, 0.2];
    }
    match state {
        State::Idle => [0.6, 0.6, 0.65],
        State::Walking => [0.3, 0.6, 1.0],
        State::Running => [1.0, 0.35, 0.3],
        State::Dance => [0.8, 0.3, 0.9],
        State::Death => [0.2, 0.2, 0.2],
        State::Sitting | State::Standing => [0.4, 0.8, 0.6],
    }
}

fn cube_mesh() -> TriMesh {
    let positions = vec![
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(-1.0, 1.0, 1.0),
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(1.0, 1.0, -1.0),
        Vec3::new(-1.0, 1.0, -1.0),
    ];

    let indices = vec![
        0, 1, 2, 0, 2, 3, // front
        1, 5, 6, 1, 6, 2, // right
        5, 4, 7, 5, 7, 6, // back
        4, 0, 3, 4, 3, 7, // left
        3, 2, 6, 3, 6, 7, // top
        4, 5, 1, 4, 1, 0, // bottom
    ];

    TriMesh::new(positions, indices)
}

pub fn build_scene(sim: &SimulationContext) -> SceneMesh {
    let mut scene = SceneMesh::default();

    match sim.terrain() {
        Terrain::Tiled(tiles) => {
            for tile in tiles.tiles() {
                // checker tint so tile borders stay visible
                let tint = if (tile.slot.x + tile.slot.y + tiles.centre().x + tiles.centre().y)
                    .rem_euclid(2)
                    == 0
                {
                    0.0
                } else {
                    0.05
                };
                scene.push_mesh(
                    tiles.prefab(),
                    Mat4::from_translation(tile.position),
                    |p| ground_color(p.y, tint),
                );
            }
        }
        Terrain::Wave(wave) => {
            // snap the patch to whole quads so it does not swim under the actor
            let step = WAVE_PATCH / WAVE_RES as f32;
            let focus = sim.camera().target;
            let ox = (focus.x / step).round() * step;
            let oz = (focus.z / step).round() * step;
            let patch = TriMesh::heightfield(WAVE_PATCH, WAVE_RES, |x, z| {
                wave.height_at(x + ox, z + oz)
            });
            scene.push_mesh(
                &patch,
                Mat4::from_translation(Vec3::new(ox, 0.0, oz)),
                |p| ground_color(p.y, 0.0),
            );
        }
    }

    let (Some(actor), Some(anim)) = (sim.actor(), sim.animation()) else {
        return scene;
    };

    let color = state_color(anim.state(), anim.overlay().is_some());
    let cube = cube_mesh();
    let body = Mat4::from_scale_rotation_translation(
        Vec3::new(0.35, 0.9, 0.25),
        actor.facing,
        actor.position + Vec3::Y * 0.9,
    );
    scene.push_mesh(&cube, body, |_| color);

    let nose = Mat4::from_scale_rotation_translation(
        Vec3::splat(0.12),
        Quat::IDENTITY,
        actor.position + Vec3::Y * 1.5 + actor.forward() * 0.35,
    );
    scene.push_mesh(&cube, nose, |_| [1.0, 1.0, 1.0]);

    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets;
    use crate::camera::FollowCamera;
    use crate::movement::MovementConfig;
    use crate::terrain::WaveTerrain;
    use crate::tiles::{TerrainTileManager, TileGridConfig};

    #[test]
    fn dormant_scene_has_terrain_only() {
        let sim = SimulationContext::new(
            Terrain::Wave(WaveTerrain::default()),
            MovementConfig::default(),
            FollowCamera::default(),
        );
        let scene = build_scene(&sim);
        let quads = (WAVE_RES * WAVE_RES) as usize;
        assert_eq!(scene.indices.len(), quads * 6);
    }

    #[test]
    fn tiled_scene_draws_every_tile_and_actor() {
        let prefab = assets::load_terrain_tile(10.0, 4).expect("tile");
        let tiles = TerrainTileManager::new(prefab, TileGridConfig::default()).expect("grid");
        let mut sim = SimulationContext::new(
            Terrain::Tiled(tiles),
            MovementConfig::default(),
            FollowCamera::default(),
        );
        sim.attach_actor(&assets::load_actor(assets::ROBOT).expect("robot"))
            .expect("attach");

        let scene = build_scene(&sim);
        let tile_tris = 9 * 4 * 4 * 2;
        let actor_tris = 2 * 12;
        assert_eq!(scene.indices.len(), (tile_tris + actor_tris) * 3);
        assert!(scene
            .indices
            .iter()
            .all(|&i| (i as usize) < scene.vertices.len()));
    }
}
