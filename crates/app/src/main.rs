//! Orrery - Main Entry Point
//!
//! Builds the solar system scene and steps it headlessly for a configured
//! number of frames, submitting every frame to a backend that only records
//! what it would draw.

use std::f32::consts::FRAC_PI_4;

use anyhow::{Context, Result};
use glam::{Vec2, Vec3};
use tracing::{debug, info, trace};

use orrery_core::{Config, Timer};
use orrery_scene::{
    CameraUniforms, CelestialBody, DrawCall, FpsCamera, GeometryHandle, NodeId, OrbitConfig,
    ProgramHandle, RenderBackend, RingConfig, SceneGraph, Simulation, SimulationConfig, SpinConfig,
    TextureHandle, submit,
};

const SPHERE: GeometryHandle = GeometryHandle(0);
const SPHERE_VERTICES: usize = 66 * 66;
const SPHERE_INDICES: usize = 65 * 65 * 6;
const RING: GeometryHandle = GeometryHandle(1);
const RING_VERTICES: usize = 80 * 8;
const RING_INDICES: usize = 79 * 7 * 6;

const CELESTIAL_PROGRAM: ProgramHandle = ProgramHandle(0);
const RING_PROGRAM: ProgramHandle = ProgramHandle(1);

const LOG_EVERY: u32 = 60;

/// Static description of one body. Angles in degrees, periods in seconds;
/// a negative period turns the other way.
struct BodyDesc {
    name: &'static str,
    scale: f32,
    axial_tilt: f32,
    spin_period: f32,
    /// `(radius, inclination, period)`; `None` for the sun.
    orbit: Option<(f32, f32, f32)>,
    texture: u32,
}

const SUN: BodyDesc = BodyDesc {
    name: "sun",
    scale: 1.0,
    axial_tilt: 0.0,
    spin_period: 6.0,
    orbit: None,
    texture: 0,
};

/// Body orbiting its parent; `orbit` is `(radius, inclination, period)`.
const fn orbiting(
    name: &'static str,
    scale: f32,
    axial_tilt: f32,
    spin_period: f32,
    orbit: (f32, f32, f32),
    texture: u32,
) -> BodyDesc {
    BodyDesc {
        name,
        scale,
        axial_tilt,
        spin_period,
        orbit: Some(orbit),
        texture,
    }
}

const PLANETS: [BodyDesc; 8] = [
    orbiting("mercury", 0.02, 0.0, 180.0, (2.0, -3.4, 4.0), 1),
    orbiting("venus", 0.05, -2.6, -600.0, (3.0, -3.9, 12.0), 2),
    orbiting("earth", 0.05, -23.0, 3.0, (4.0, -7.2, 20.0), 3),
    orbiting("mars", 0.03, -25.0, 3.0, (5.0, -5.7, 36.0), 4),
    orbiting("jupiter", 0.5, -3.1, 1.0, (13.0, -6.1, 220.0), 5),
    orbiting("saturn", 0.4, -27.0, 1.2, (16.0, -5.5, 400.0), 6),
    orbiting("uranus", 0.2, -82.0, -2.0, (18.0, -6.5, 1680.0), 7),
    orbiting("neptune", 0.2, -28.0, 2.0, (19.0, -6.4, 3200.0), 8),
];

const MOON: BodyDesc = orbiting("moon", 0.01, -6.7, 90.0, (0.2, 29.0, 1.3), 9);

const SATURN_RING_TEXTURE: u32 = 10;
const SATURN_RING_SCALE: Vec2 = Vec2::new(1.0, 1.25);

struct SolarSystem {
    graph: SceneGraph,
    simulation: Simulation,
    root: NodeId,
}

/// Create a textured sphere node under `parent` and the body driving it.
fn add_body(graph: &mut SceneGraph, parent: NodeId, desc: &BodyDesc) -> Result<CelestialBody> {
    let node = graph.create_node(desc.name);
    {
        let node = graph.get_mut(node)?;
        node.set_geometry(SPHERE, SPHERE_VERTICES, SPHERE_INDICES);
        node.add_texture("diffuse_texture", TextureHandle(desc.texture));
    }
    graph.attach(parent, node)?;

    let mut body = CelestialBody::new(node);
    body.set_uniform_scale(desc.scale)?;
    body.set_spin(SpinConfig::from_period(desc.axial_tilt.to_radians(), desc.spin_period)?)?;
    if let Some((radius, inclination, period)) = desc.orbit {
        body.set_orbit(OrbitConfig::from_period(radius, inclination.to_radians(), period)?)?;
    }
    Ok(body)
}

fn build_solar_system(config: SimulationConfig) -> Result<SolarSystem> {
    let mut graph = SceneGraph::new();
    let mut simulation = Simulation::with_config(config)?;

    let root = graph.create_node("solar system");
    graph.get_mut(root)?.set_program(Some(CELESTIAL_PROGRAM));

    let sun = add_body(&mut graph, root, &SUN)?;
    simulation.add_body(sun);

    for desc in &PLANETS {
        let mut planet = add_body(&mut graph, root, desc)?;

        match desc.name {
            "earth" => {
                let anchor = graph.create_node("earth frame");
                graph.attach(root, anchor)?;
                planet.set_satellite_anchor(Some(anchor));
                let moon = add_body(&mut graph, anchor, &MOON)?;
                simulation.add_body(moon);
            }
            "saturn" => {
                let ring = graph.create_node("saturn ring");
                {
                    let node = graph.get_mut(ring)?;
                    node.set_geometry(RING, RING_VERTICES, RING_INDICES);
                    node.set_program(Some(RING_PROGRAM));
                    node.add_texture("diffuse_texture", TextureHandle(SATURN_RING_TEXTURE));
                }
                graph.attach(root, ring)?;
                planet.set_ring(RingConfig {
                    node: ring,
                    scale: SATURN_RING_SCALE,
                })?;
            }
            _ => {}
        }

        simulation.add_body(planet);
    }

    // Place every node before the first frame
    simulation.apply(&mut graph);

    info!(nodes = graph.len(), bodies = simulation.len(), "Solar system built");
    Ok(SolarSystem {
        graph,
        simulation,
        root,
    })
}

/// Backend without a GPU: counts what it is asked to draw.
#[derive(Default)]
struct RecordingBackend {
    draws: usize,
    program_switches: usize,
    camera_position: Vec3,
}

impl RenderBackend for RecordingBackend {
    fn set_camera(&mut self, camera: &CameraUniforms) {
        self.camera_position = camera.camera_position;
    }

    fn select_program(&mut self, program: ProgramHandle) {
        trace!(program = program.0, "select program");
        self.program_switches += 1;
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        trace!(
            node = %call.node,
            geometry = call.geometry.0,
            indices = call.indices_nb,
            textures = call.textures.len(),
            "draw"
        );
        self.draws += 1;
    }
}

fn main() -> Result<()> {
    // Initialize logging
    orrery_core::init_logging();
    info!("Starting Orrery");

    let config = Config::from_env().context("failed to read configuration")?;
    debug!(?config, "Loaded configuration");

    let mut system = build_solar_system(SimulationConfig {
        time_scale: config.time_scale,
        paused: config.paused,
    })?;

    let mut camera = FpsCamera::new(FRAC_PI_4, 16.0 / 9.0, 0.01, 1000.0)?;
    camera.world.set_translation(Vec3::new(0.0, 0.0, 6.0))?;
    camera.world.look_at(Vec3::ZERO, Vec3::Y)?;

    let mut backend = RecordingBackend::default();
    let mut timer = Timer::new();

    for frame in 0..config.frames {
        let dt = match config.fixed_step {
            Some(step) => step,
            None => timer.tick(),
        };

        let tick = system.simulation.advance(&mut system.graph, dt);
        let stats = submit(&system.graph, system.root, &camera, &mut backend)?;

        if frame % LOG_EVERY == 0 {
            info!(
                frame,
                simulated = ?system.simulation.elapsed(),
                dt = tick.dt,
                updated = tick.updated,
                skipped = tick.skipped,
                drawn = stats.drawn,
                switches = stats.program_switches,
                "Frame"
            );
        }
    }

    info!(
        frames = config.frames,
        wall = ?timer.elapsed(),
        simulated = ?system.simulation.elapsed(),
        draws = backend.draws,
        switches = backend.program_switches,
        camera = ?backend.camera_position,
        "Run complete"
    );
    Ok(())
}
