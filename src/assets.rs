//! Asset descriptions the simulation consumes.
//!
//! The demo ships its assets built in: a humanoid rig description (clip
//! names, durations, morph targets) and a procedurally generated terrain
//! tile that the tile window clones.

use std::f32::consts::TAU;

use thiserror::Error;

use crate::mesh::TriMesh;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("unknown asset '{0}'")]
    NotFound(String),
    #[error("asset '{asset}' is invalid: {reason}")]
    Invalid { asset: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipInfo {
    pub name: String,
    pub duration: f32,
}

/// Everything the core needs to know about a loaded actor model.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorModel {
    pub name: String,
    pub clips: Vec<ClipInfo>,
    pub morph_targets: Vec<String>,
}

impl ActorModel {
    #[cfg(test)]
    pub fn clip(&self, name: &str) -> Option<&ClipInfo> {
        self.clips.iter().find(|c| c.name == name)
    }
}

pub const ROBOT: &str = "robot";

pub fn load_actor(name: &str) -> Result<ActorModel, AssetError> {
    if name != ROBOT {
        return Err(AssetError::NotFound(name.to_string()));
    }

    let clips = [
        ("Idle", 2.0),
        ("Walking", 1.0),
        ("Running", 0.7),
        ("Dance", 4.0),
        ("Death", 1.5),
        ("Sitting", 1.2),
        ("Standing", 1.2),
        ("Jump", 0.9),
        ("Yes", 1.1),
        ("No", 1.1),
        ("Wave", 1.6),
        ("Punch", 0.8),
        ("ThumbsUp", 1.4),
    ]
    .into_iter()
    .map(|(name, duration)| ClipInfo {
        name: name.to_string(),
        duration,
    })
    .collect();

    let model = ActorModel {
        name: name.to_string(),
        clips,
        morph_targets: ["Angry", "Surprised", "Sad"]
            .into_iter()
            .map(String::from)
            .collect(),
    };
    validate_actor(&model)?;
    Ok(model)
}

fn validate_actor(model: &ActorModel) -> Result<(), AssetError> {
    if let Some(clip) = model
        .clips
        .iter()
        .find(|c| !(c.duration.is_finite() && c.duration > 0.0))
    {
        return Err(AssetError::Invalid {
            asset: model.name.clone(),
            reason: format!("clip '{}' has no playable duration", clip.name),
        });
    }
    Ok(())
}

/// Terrain tile prefab: a heightfield whose edges wrap, so clones line up.
pub fn load_terrain_tile(size: f32, resolution: u32) -> Result<TriMesh, AssetError> {
    if !(size.is_finite() && size > 0.0) || resolution == 0 {
        return Err(AssetError::Invalid {
            asset: "terrain tile".to_string(),
            reason: format!("size {size} / resolution {resolution}"),
        });
    }

    let k = TAU / size;
    let mesh = TriMesh::heightfield(size, resolution, |x, z| {
        let hills = (x * k).sin() * (z * k).cos() * 1.2;
        let ripples = (x * 2.0 * k).cos() * (z * 3.0 * k).sin() * 0.3;
        hills + ripples
    });
    log::info!(
        "ASSET: terrain tile {size}x{size}, {} triangles",
        mesh.triangle_count()
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn robot_has_locomotion_and_emote_clips() {
        let model = load_actor(ROBOT).expect("robot");
        for name in ["Idle", "Walking", "Running", "Jump", "Wave"] {
            assert!(model.clip(name).is_some(), "missing {name}");
        }
        assert_eq!(model.morph_targets.len(), 3);
    }

    #[test]
    fn unknown_actor_is_an_error() {
        assert!(matches!(load_actor("dragon"), Err(AssetError::NotFound(_))));
    }

    #[test]
    fn invalid_tile_is_rejected() {
        assert!(load_terrain_tile(0.0, 8).is_err());
        assert!(load_terrain_tile(10.0, 0).is_err());
    }

    #[test]
    fn tile_edges_wrap() {
        let size = 20.0;
        let res = 10;
        let mesh = load_terrain_tile(size, res).expect("tile");
        let row = (res + 1) as usize;
        for iz in 0..row {
            let left = mesh.positions[iz * row];
            let right = mesh.positions[iz * row + row - 1];
            assert!((left.y - right.y).abs() < 1e-4);
        }
    }
}
