use glam::Vec3;

use crate::tiles::{TerrainTileManager, TileId};

/// Height returned when a ground query hits nothing.
pub const DEFAULT_GROUND_HEIGHT: f32 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainSample {
    pub height: f32,
    pub normal: Option<Vec3>,
    /// Tile hit by the ground ray (tiled terrain only).
    pub tile: Option<TileId>,
}

impl TerrainSample {
    pub fn fallback() -> Self {
        Self {
            height: DEFAULT_GROUND_HEIGHT,
            normal: None,
            tile: None,
        }
    }
}

pub trait TerrainQuery {
    fn surface_sample(&self, x: f32, z: f32) -> TerrainSample;

    fn height_at(&self, x: f32, z: f32) -> f32 {
        self.surface_sample(x, z).height
    }
}

/// Closed-form rolling hills: two crossed sine terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveTerrain {
    pub primary_freq: f32,
    pub secondary_freq: f32,
    pub amplitude: f32,
}

impl Default for WaveTerrain {
    fn default() -> Self {
        Self {
            primary_freq: 0.1,
            secondary_freq: 0.05,
            amplitude: 2.0,
        }
    }
}

impl WaveTerrain {
    fn gradient(&self, x: f32, z: f32) -> (f32, f32) {
        let f1 = self.primary_freq;
        let f2 = self.secondary_freq;
        let a = self.amplitude;
        let cross = 0.5 * a * f2 * ((x + z) * f2).cos();
        let ddx = a * f1 * (x * f1).cos() * (z * f1).cos() + cross;
        let ddz = -a * f1 * (x * f1).sin() * (z * f1).sin() + cross;
        (ddx, ddz)
    }
}

impl TerrainQuery for WaveTerrain {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        let primary =
            (x * self.primary_freq).sin() * (z * self.primary_freq).cos() * self.amplitude;
        let secondary = ((x + z) * self.secondary_freq).sin() * self.amplitude * 0.5;
        primary + secondary
    }

    fn surface_sample(&self, x: f32, z: f32) -> TerrainSample {
        let (ddx, ddz) = self.gradient(x, z);
        TerrainSample {
            height: self.height_at(x, z),
            normal: Some(Vec3::new(-ddx, 1.0, -ddz).normalize()),
            tile: None,
        }
    }
}

/// The ground the actor walks on: either analytic or a window of mesh tiles.
#[derive(Debug, Clone)]
pub enum Terrain {
    Wave(WaveTerrain),
    Tiled(TerrainTileManager),
}

impl Terrain {
    pub fn tiles(&self) -> Option<&TerrainTileManager> {
        match self {
            Terrain::Tiled(tiles) => Some(tiles),
            Terrain::Wave(_) => None,
        }
    }

    pub fn tiles_mut(&mut self) -> Option<&mut TerrainTileManager> {
        match self {
            Terrain::Tiled(tiles) => Some(tiles),
            Terrain::Wave(_) => None,
        }
    }
}

impl TerrainQuery for Terrain {
    fn surface_sample(&self, x: f32, z: f32) -> TerrainSample {
        match self {
            Terrain::Wave(wave) => wave.surface_sample(x, z),
            Terrain::Tiled(tiles) => tiles.surface_sample(x, z),
        }
    }

    fn height_at(&self, x: f32, z: f32) -> f32 {
        match self {
            Terrain::Wave(wave) => wave.height_at(x, z),
            Terrain::Tiled(tiles) => tiles.height_at(x, z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(13.7, -4.25)]
    #[case(-250.0, 999.5)]
    #[case(1e-3, 2.5)]
    fn wave_height_is_bit_identical(#[case] x: f32, #[case] z: f32) {
        let terrain = WaveTerrain::default();
        let first = terrain.height_at(x, z);
        // interleave another query so call order cannot matter
        let _ = terrain.height_at(z, x);
        let second = terrain.height_at(x, z);
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn wave_height_matches_closed_form() {
        let terrain = WaveTerrain::default();
        let (x, z) = (5.0_f32, 2.0_f32);
        let expected = (x * 0.1).sin() * (z * 0.1).cos() * 2.0 + ((x + z) * 0.05).sin();
        assert_relative_eq!(terrain.height_at(x, z), expected);
    }

    #[test]
    fn wave_origin_is_flat_ground_level() {
        assert_relative_eq!(WaveTerrain::default().height_at(0.0, 0.0), 0.0);
    }

    #[test]
    fn wave_normal_points_up_and_is_unit() {
        let sample = WaveTerrain::default().surface_sample(7.0, -3.0);
        let n = sample.normal.expect("normal");
        assert!(n.y > 0.0);
        assert_relative_eq!(n.length(), 1.0, epsilon = 1e-5);
        assert!(sample.tile.is_none());
    }

    #[test]
    fn wave_normal_tilts_against_slope() {
        let terrain = WaveTerrain::default();
        // height rises with x near the origin
        assert!(terrain.height_at(0.5, 0.0) > terrain.height_at(0.0, 0.0));
        let n = terrain.surface_sample(0.0, 0.0).normal.expect("normal");
        assert!(n.x < 0.0);
    }

    #[test]
    fn fallback_sample_uses_default_height() {
        let sample = TerrainSample::fallback();
        assert_eq!(sample.height, DEFAULT_GROUND_HEIGHT);
        assert!(!sample.height.is_nan());
    }
}
