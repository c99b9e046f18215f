use std::sync::Arc;

use glam::{IVec2, Vec3};
use thiserror::Error;

use crate::mesh::TriMesh;
use crate::terrain::{TerrainQuery, TerrainSample};

/// Ground rays start this high above the query point.
const RAY_START_HEIGHT: f32 = 1000.0;

/// Index of a tile within the fixed grid (0..N×N).
pub type TileId = usize;

#[derive(Debug, Error, PartialEq)]
pub enum TileError {
    #[error("tile size {tile_size} leaves no spacing after overlap {overlap}")]
    NoSpacing { tile_size: f32, overlap: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGridConfig {
    /// Tiles per side; forced odd so the actor's cell sits in the middle.
    pub grid: u32,
    pub tile_size: f32,
    /// How far neighbouring tiles overlap to hide seams.
    pub overlap: f32,
}

impl Default for TileGridConfig {
    fn default() -> Self {
        Self {
            grid: 3,
            tile_size: 40.0,
            overlap: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TerrainTile {
    pub id: TileId,
    /// Grid offset relative to the centre cell.
    pub slot: IVec2,
    pub position: Vec3,
}

/// Fixed N×N window of cloned terrain tiles that follows the actor.
#[derive(Debug, Clone)]
pub struct TerrainTileManager {
    prefab: Arc<TriMesh>,
    tiles: Vec<TerrainTile>,
    spacing: f32,
    centre: IVec2,
}

impl TerrainTileManager {
    pub fn new(prefab: TriMesh, config: TileGridConfig) -> Result<Self, TileError> {
        let spacing = config.tile_size - config.overlap;
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(TileError::NoSpacing {
                tile_size: config.tile_size,
                overlap: config.overlap,
            });
        }

        let grid = if config.grid % 2 == 0 {
            config.grid + 1
        } else {
            config.grid
        };
        let half = (grid / 2) as i32;

        // fixed slot order: row-major over z then x
        let tiles = (0..grid * grid)
            .map(|i| {
                let slot = IVec2::new((i % grid) as i32 - half, (i / grid) as i32 - half);
                TerrainTile {
                    id: i as TileId,
                    slot,
                    position: Vec3::ZERO,
                }
            })
            .collect();

        let mut manager = Self {
            prefab: Arc::new(prefab),
            tiles,
            spacing,
            centre: IVec2::ZERO,
        };
        manager.place_tiles();
        Ok(manager)
    }

    pub fn tiles(&self) -> &[TerrainTile] {
        &self.tiles
    }

    pub fn prefab(&self) -> &TriMesh {
        &self.prefab
    }

    #[cfg(test)]
    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn centre(&self) -> IVec2 {
        self.centre
    }

    pub fn cell_of(&self, pos: Vec3) -> IVec2 {
        IVec2::new(
            (pos.x / self.spacing).round() as i32,
            (pos.z / self.spacing).round() as i32,
        )
    }

    /// Moves the window so the actor's cell is the centre tile.
    /// Returns true when the window shifted.
    pub fn recenter(&mut self, actor_pos: Vec3) -> bool {
        let cell = self.cell_of(actor_pos);
        if cell == self.centre {
            return false;
        }
        log::debug!(
            "TILES: recenter ({},{}) -> ({},{})",
            self.centre.x,
            self.centre.y,
            cell.x,
            cell.y
        );
        self.centre = cell;
        self.place_tiles();
        true
    }

    fn place_tiles(&mut self) {
        let spacing = self.spacing;
        let centre = self.centre;
        for tile in &mut self.tiles {
            let cell = centre.wrapping_add(tile.slot);
            tile.position = Vec3::new(cell.x as f32 * spacing, 0.0, cell.y as f32 * spacing);
        }
    }
}

impl TerrainQuery for TerrainTileManager {
    // Cost grows with tile count times prefab triangles; a spatial index
    // over the tiles is the next step if the grid gets large.
    fn surface_sample(&self, x: f32, z: f32) -> TerrainSample {
        let origin = Vec3::new(x, RAY_START_HEIGHT, z);

        // every tile is tested: overlapping edges can yield several hits
        let closest = self
            .tiles
            .iter()
            .filter_map(|tile| {
                self.prefab
                    .raycast(origin - tile.position, Vec3::NEG_Y)
                    .map(|t| (t, tile.id))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0));

        match closest {
            Some((t, id)) => TerrainSample {
                height: origin.y - t,
                normal: None,
                tile: Some(id),
            },
            None => TerrainSample::fallback(),
        }
    }
}
