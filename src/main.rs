mod actor;
mod anim;
mod assets;
mod camera;
mod command;
mod config;
mod face;
mod gfx;
mod input;
mod logging;
mod mesh;
mod movement;
mod panel;
mod render;
mod sim;
mod terrain;
mod tiles;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;

use camera::FollowCamera;
use config::{Args, DemoConfig, TerrainKind};
use gfx::Gfx;
use input::InputKey;
use panel::DebugPanel;
use sim::SimulationContext;
use terrain::{Terrain, WaveTerrain};
use tiles::TerrainTileManager;

use winit::{
    event::{ElementState, Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

const ORBIT_STEP: f32 = 0.08;

fn input_key(code: KeyCode) -> Option<InputKey> {
    match code {
        KeyCode::KeyW => Some(InputKey::Forward),
        KeyCode::KeyS => Some(InputKey::Back),
        KeyCode::KeyA => Some(InputKey::Left),
        KeyCode::KeyD => Some(InputKey::Right),
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(InputKey::Sprint),
        KeyCode::Space => Some(InputKey::Action),
        _ => None,
    }
}

fn panel_command(panel: &mut DebugPanel, code: KeyCode) -> Option<command::Command> {
    match code {
        KeyCode::Digit1 => panel.select_state(0),
        KeyCode::Digit2 => panel.select_state(1),
        KeyCode::Digit3 => panel.select_state(2),
        KeyCode::Digit4 => panel.select_state(3),
        KeyCode::Digit5 => panel.select_state(4),
        KeyCode::Digit6 => panel.select_state(5),
        KeyCode::Digit7 => panel.select_state(6),
        KeyCode::F1 => panel.press_emote(0),
        KeyCode::F2 => panel.press_emote(1),
        KeyCode::F3 => panel.press_emote(2),
        KeyCode::F4 => panel.press_emote(3),
        KeyCode::F5 => panel.press_emote(4),
        KeyCode::F6 => panel.press_emote(5),
        KeyCode::KeyZ => panel.nudge_slider(0),
        KeyCode::KeyX => panel.nudge_slider(1),
        KeyCode::KeyC => panel.nudge_slider(2),
        _ => None,
    }
}

/// Builds the simulation; load failures leave it dormant instead of aborting.
fn build_simulation(config: &DemoConfig) -> (SimulationContext, DebugPanel) {
    let (terrain, terrain_ok) = match config.terrain {
        TerrainKind::Wave => (Terrain::Wave(WaveTerrain::default()), true),
        TerrainKind::Tiled => {
            let tiles = assets::load_terrain_tile(config.tiles.tile_size, config.tile_resolution)
                .map_err(anyhow::Error::from)
                .and_then(|prefab| Ok(TerrainTileManager::new(prefab, config.tiles)?));
            match tiles {
                Ok(tiles) => (Terrain::Tiled(tiles), true),
                Err(e) => {
                    log::error!("ASSET: terrain failed to load: {e}");
                    (Terrain::Wave(WaveTerrain::default()), false)
                }
            }
        }
    };

    let mut sim = SimulationContext::new(terrain, config.movement, FollowCamera::default());

    let model = match assets::load_actor(&config.actor) {
        Ok(model) => Some(model),
        Err(e) => {
            log::error!("ASSET: actor failed to load: {e}");
            None
        }
    };

    let mut panel = DebugPanel::new(std::iter::empty());
    if let (Some(model), true) = (model, terrain_ok) {
        match sim.attach_actor(&model) {
            Ok(()) => {
                if let Some(face) = sim.expressions() {
                    panel = DebugPanel::new(face.names());
                }
            }
            Err(e) => log::error!("SIM: actor does not match the animation set: {e}"),
        }
    }
    (sim, panel)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);
    let config = DemoConfig::from(args);
    log::info!(
        "terrain={:?} steering={:?} timestep={:?}",
        config.terrain,
        config.movement.steering,
        config.movement.timestep
    );

    let event_loop = EventLoop::new().context("create event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Terrain Walker")
            .build(&event_loop)
            .context("create window")?,
    );
    let window_for_loop = window.clone();

    let mut gfx = pollster::block_on(Gfx::new(window)).context("init renderer")?;
    let (mut sim, mut panel) = build_simulation(&config);

    log::info!(
        "panel: 1-7 {:?}, F1-F6 {:?}, Z/X/C {:?}",
        panel.state_options().iter().map(|s| s.name()).collect::<Vec<_>>(),
        panel.emote_buttons().iter().map(|e| e.name()).collect::<Vec<_>>(),
        panel.sliders().iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>()
    );

    let tick_dt = Duration::from_micros(16_667); // 60 TPS
    let dt = tick_dt.as_secs_f32();
    let mut next_tick = Instant::now() + tick_dt;

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::WaitUntil(next_tick));

            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => elwt.exit(),

                    WindowEvent::Resized(size) => gfx.resize(size),

                    WindowEvent::ScaleFactorChanged { .. } => {
                        gfx.resize(window_for_loop.inner_size());
                    }

                    WindowEvent::RedrawRequested => {
                        let scene = render::build_scene(&sim);
                        gfx.set_mesh(&scene.vertices, &scene.indices);
                        gfx.set_camera(sim.camera().view_proj(gfx.size.width, gfx.size.height));
                        match gfx.render() {
                            Ok(()) => {}
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                gfx.resize(gfx.size);
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("GFX: out of memory");
                                elwt.exit();
                            }
                            Err(e) => log::warn!("GFX: frame dropped: {e}"),
                        }
                    }

                    WindowEvent::KeyboardInput { event, .. } => {
                        let PhysicalKey::Code(code) = event.physical_key else {
                            return;
                        };
                        if event.repeat {
                            return;
                        }
                        let down = event.state == ElementState::Pressed;

                        if let Some(key) = input_key(code) {
                            if down {
                                sim.on_key_down(key);
                            } else {
                                sim.on_key_up(key);
                            }
                            return;
                        }
                        if !down {
                            return;
                        }
                        match code {
                            KeyCode::Escape => elwt.exit(),
                            KeyCode::ArrowLeft => sim.camera_mut().orbit(-ORBIT_STEP, 0.0),
                            KeyCode::ArrowRight => sim.camera_mut().orbit(ORBIT_STEP, 0.0),
                            KeyCode::ArrowUp => sim.camera_mut().orbit(0.0, ORBIT_STEP),
                            KeyCode::ArrowDown => sim.camera_mut().orbit(0.0, -ORBIT_STEP),
                            _ => {
                                if let Some(cmd) = panel_command(&mut panel, code) {
                                    sim.queue(cmd);
                                }
                            }
                        }
                    }

                    _ => {}
                },

                Event::AboutToWait => {
                    let now = Instant::now();
                    if now >= next_tick {
                        // a failed frame is skipped, the loop keeps running
                        if let Err(e) = sim.tick(dt) {
                            log::warn!("SIM: frame skipped: {e}");
                        }

                        window_for_loop.request_redraw();

                        next_tick += tick_dt;
                        if next_tick < now {
                            next_tick = now + tick_dt;
                        }
                    }
                }

                _ => {}
            }
        })
        .context("run event loop")?;

    Ok(())
}
