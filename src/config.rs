use clap::{Parser, ValueEnum};

use crate::movement::{MovementConfig, Steering, Timestep};
use crate::tiles::TileGridConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TerrainKind {
    /// Analytic rolling hills.
    Wave,
    /// Window of cloned mesh tiles queried by ray casts.
    Tiled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SteeringArg {
    World,
    Camera,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimestepArg {
    PerSecond,
    PerTick,
}

/// Walk a character across endless terrain
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = TerrainKind::Tiled)]
    pub terrain: TerrainKind,

    #[arg(long, value_enum, default_value_t = SteeringArg::Camera)]
    pub steering: SteeringArg,

    #[arg(long, value_enum, default_value_t = TimestepArg::PerSecond)]
    pub timestep: TimestepArg,

    /// Walking speed (units per second, or per tick with --timestep per-tick)
    #[arg(long, default_value_t = 4.0)]
    pub speed: f32,

    #[arg(long, default_value_t = 2.0)]
    pub sprint_multiplier: f32,

    /// Tiles per side of the terrain window (odd)
    #[arg(long, default_value_t = 3)]
    pub grid: u32,

    #[arg(long, default_value_t = 40.0)]
    pub tile_size: f32,

    #[arg(long, default_value_t = 0.1)]
    pub tile_overlap: f32,

    /// Grid quads per tile side
    #[arg(long, default_value_t = 32)]
    pub tile_resolution: u32,

    /// Crossfade duration between animation states, in seconds
    #[arg(long, default_value_t = 0.5)]
    pub fade: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub verbose: bool,
    pub terrain: TerrainKind,
    pub movement: MovementConfig,
    pub tiles: TileGridConfig,
    pub tile_resolution: u32,
    pub actor: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            terrain: TerrainKind::Tiled,
            movement: MovementConfig::default(),
            tiles: TileGridConfig::default(),
            tile_resolution: 32,
            actor: crate::assets::ROBOT.to_string(),
        }
    }
}

impl From<Args> for DemoConfig {
    fn from(args: Args) -> Self {
        let defaults = DemoConfig::default();
        Self {
            verbose: args.verbose,
            terrain: args.terrain,
            movement: MovementConfig {
                base_speed: args.speed,
                sprint_multiplier: args.sprint_multiplier,
                steering: match args.steering {
                    SteeringArg::World => Steering::WorldAxes,
                    SteeringArg::Camera => Steering::CameraRelative,
                },
                timestep: match args.timestep {
                    TimestepArg::PerSecond => Timestep::PerSecond,
                    TimestepArg::PerTick => Timestep::PerTick,
                },
                fade_duration: args.fade.max(0.0),
                ..defaults.movement
            },
            tiles: TileGridConfig {
                grid: args.grid.max(1),
                tile_size: args.tile_size,
                overlap: args.tile_overlap,
            },
            tile_resolution: args.tile_resolution,
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_to_default_config() {
        let args = Args::try_parse_from(["terrain_walker"]).expect("args");
        assert_eq!(DemoConfig::from(args), DemoConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "terrain_walker",
            "--terrain",
            "wave",
            "--steering",
            "world",
            "--timestep",
            "per-tick",
            "--speed",
            "0.1",
            "--grid",
            "5",
            "-v",
        ])
        .expect("args");
        let config = DemoConfig::from(args);
        assert!(config.verbose);
        assert_eq!(config.terrain, TerrainKind::Wave);
        assert_eq!(config.movement.steering, Steering::WorldAxes);
        assert_eq!(config.movement.timestep, Timestep::PerTick);
        assert_eq!(config.movement.base_speed, 0.1);
        assert_eq!(config.tiles.grid, 5);
    }

    #[test]
    fn unknown_terrain_is_rejected() {
        assert!(Args::try_parse_from(["terrain_walker", "--terrain", "lava"]).is_err());
    }
}
