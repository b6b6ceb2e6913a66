//! Integration tests driving a small solar system end to end.

use std::f32::consts::TAU;
use std::time::Duration;

use approx::assert_abs_diff_eq;
use glam::{Mat4, Quat, Vec2, Vec3};
use orrery_scene::{
    BodyId, CelestialBody, DrawCall, FpsCamera, GeometryHandle, NodeId, OrbitConfig, ProgramHandle,
    RenderBackend, RingConfig, SceneError, SceneGraph, Simulation, SpinConfig, submit,
};

const SPHERE: GeometryHandle = GeometryHandle(0);
const RING: GeometryHandle = GeometryHandle(1);
const CELESTIAL: ProgramHandle = ProgramHandle(0);
const RING_PROGRAM: ProgramHandle = ProgramHandle(1);

struct System {
    graph: SceneGraph,
    simulation: Simulation,
    world: NodeId,
    sun: BodyId,
    earth: BodyId,
    earth_anchor: NodeId,
    moon: BodyId,
    saturn: BodyId,
    saturn_ring: NodeId,
}

fn sphere(graph: &mut SceneGraph, parent: NodeId, name: &str) -> NodeId {
    let id = graph.create_node(name);
    graph.get_mut(id).unwrap().set_geometry(SPHERE, 1000, 5400);
    graph.attach(parent, id).unwrap();
    id
}

fn build() -> System {
    let mut graph = SceneGraph::new();
    let mut simulation = Simulation::new();

    let world = graph.create_node("world");
    graph.get_mut(world).unwrap().set_program(Some(CELESTIAL));

    let sun_node = sphere(&mut graph, world, "sun");
    let mut sun = CelestialBody::new(sun_node);
    sun.set_spin(SpinConfig::from_period(0.0, 6.0).unwrap()).unwrap();
    let sun = simulation.add_body(sun);

    let earth_node = sphere(&mut graph, world, "earth");
    let earth_anchor = graph.create_node("earth frame");
    graph.attach(world, earth_anchor).unwrap();
    let mut earth = CelestialBody::new(earth_node);
    earth
        .set_orbit(OrbitConfig::from_period(4.0, 0.0, 20.0).unwrap())
        .unwrap();
    earth
        .set_spin(SpinConfig::from_period((-23.0_f32).to_radians(), 3.0).unwrap())
        .unwrap();
    earth.set_uniform_scale(0.5).unwrap();
    earth.set_satellite_anchor(Some(earth_anchor));
    let earth = simulation.add_body(earth);

    let moon_node = sphere(&mut graph, earth_anchor, "moon");
    let mut moon = CelestialBody::new(moon_node);
    moon.set_orbit(OrbitConfig::from_period(1.5, 0.0, 5.0).unwrap())
        .unwrap();
    moon.set_uniform_scale(0.2).unwrap();
    let moon = simulation.add_body(moon);

    let saturn_node = sphere(&mut graph, world, "saturn");
    let saturn_ring = graph.create_node("saturn ring");
    {
        let ring = graph.get_mut(saturn_ring).unwrap();
        ring.set_geometry(RING, 80, 0);
        ring.set_program(Some(RING_PROGRAM));
    }
    graph.attach(world, saturn_ring).unwrap();
    let mut saturn = CelestialBody::new(saturn_node);
    saturn
        .set_orbit(OrbitConfig::from_period(10.0, 0.1, 60.0).unwrap())
        .unwrap();
    saturn
        .set_spin(SpinConfig::from_period((-27.0_f32).to_radians(), 2.0).unwrap())
        .unwrap();
    saturn
        .set_ring(RingConfig {
            node: saturn_ring,
            scale: Vec2::new(1.0, 1.25),
        })
        .unwrap();
    let saturn = simulation.add_body(saturn);

    System {
        graph,
        simulation,
        world,
        sun,
        earth,
        earth_anchor,
        moon,
        saturn,
        saturn_ring,
    }
}

fn world_position(graph: &SceneGraph, id: NodeId) -> Vec3 {
    graph.world_matrix(id).unwrap().transform_point3(Vec3::ZERO)
}

#[test]
fn test_moon_follows_earth_without_inheriting_spin_or_scale() {
    let mut system = build();
    for _ in 0..37 {
        let report = system
            .simulation
            .advance(&mut system.graph, Duration::from_millis(16));
        assert_eq!(report.skipped, 0);
    }

    let earth = system.simulation.body(system.earth).unwrap();
    let moon = system.simulation.body(system.moon).unwrap();
    let tilt = Quat::from_rotation_z((-23.0_f32).to_radians());

    let expected = earth.position() + tilt * moon.position();
    assert_abs_diff_eq!(
        world_position(&system.graph, moon.node()),
        expected,
        epsilon = 1e-4
    );

    // The moon keeps its own size: the earth's 0.5 scale is not applied
    let moon_world = system.graph.world_matrix(moon.node()).unwrap();
    let (scale, _, _) = moon_world.to_scale_rotation_translation();
    assert_abs_diff_eq!(scale, Vec3::splat(0.2), epsilon = 1e-5);

    // The anchor carries exactly the earth's position
    assert_abs_diff_eq!(
        world_position(&system.graph, system.earth_anchor),
        earth.position(),
        epsilon = 1e-5
    );
}

#[test]
fn test_ring_does_not_spin() {
    let mut system = build();
    system
        .simulation
        .advance(&mut system.graph, Duration::from_millis(700));

    let saturn = system.simulation.body(system.saturn).unwrap();
    assert!(saturn.spin_phase() > 0.0);

    let expected = Mat4::from_scale_rotation_translation(
        Vec3::new(1.0, 1.0, 1.25),
        Quat::from_rotation_z((-27.0_f32).to_radians()),
        saturn.position(),
    );
    let ring_world = system.graph.world_matrix(system.saturn_ring).unwrap();
    assert_abs_diff_eq!(ring_world, expected, epsilon = 1e-5);
}

#[test]
fn test_full_period_returns_to_start() {
    let mut system = build();
    let earth_node = system.simulation.body(system.earth).unwrap().node();
    let start = world_position(&system.graph, earth_node);
    system.simulation.apply(&mut system.graph);
    let start_applied = world_position(&system.graph, earth_node);
    assert_abs_diff_eq!(start_applied, Vec3::new(4.0, 0.0, 0.0), epsilon = 1e-6);
    assert_eq!(start, Vec3::ZERO);

    // One 20 s orbital period in 20 ms steps
    for _ in 0..1000 {
        system
            .simulation
            .advance(&mut system.graph, Duration::from_millis(20));
    }
    let earth = system.simulation.body(system.earth).unwrap();
    let phase = earth.orbit_phase();
    assert!(phase < 1e-3 || TAU - phase < 1e-3, "phase drifted to {phase}");
    assert_abs_diff_eq!(
        world_position(&system.graph, earth_node),
        start_applied,
        epsilon = 1e-2
    );
}

#[test]
fn test_zero_tick_changes_nothing() {
    let mut system = build();
    system
        .simulation
        .advance(&mut system.graph, Duration::from_millis(1234));
    let before: Vec<_> = system
        .graph
        .traverse(system.world)
        .unwrap()
        .map(|visit| visit.world)
        .collect();

    system.simulation.advance(&mut system.graph, Duration::ZERO);
    let after: Vec<_> = system
        .graph
        .traverse(system.world)
        .unwrap()
        .map(|visit| visit.world)
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_cycle_rejected_and_tree_unchanged() {
    let mut system = build();
    let moon = system.simulation.body(system.moon).unwrap().node();
    let order = |graph: &SceneGraph, root| -> Vec<NodeId> {
        graph.traverse(root).unwrap().map(|visit| visit.id).collect()
    };
    let before = order(&system.graph, system.world);

    let err = system.graph.attach(moon, system.world).unwrap_err();
    assert_eq!(
        err,
        SceneError::CycleDetected {
            parent: moon,
            child: system.world
        }
    );
    assert_eq!(order(&system.graph, system.world), before);
    assert_eq!(system.graph.parent(system.world).unwrap(), None);
}

#[test]
fn test_removed_satellite_is_skipped_but_planet_moves() {
    let mut system = build();
    // Removing the anchor removes the moon with it
    let removed = system.graph.remove(system.earth_anchor).unwrap();
    assert_eq!(removed, 2);

    let moon = system.simulation.body(system.moon).unwrap().node();
    assert_eq!(
        system.graph.get(moon).unwrap_err(),
        SceneError::NodeNotFound(moon)
    );

    let earth = system.simulation.body(system.earth).unwrap().node();
    system
        .simulation
        .advance(&mut system.graph, Duration::from_millis(100));
    let before = world_position(&system.graph, earth);

    let report = system
        .simulation
        .advance(&mut system.graph, Duration::from_millis(500));
    // Only the moon lost its node; earth keeps moving without its anchor
    assert_eq!(report.skipped, 1);
    assert_eq!(report.updated, 3);

    let after = world_position(&system.graph, earth);
    assert_ne!(before, after);
    assert_abs_diff_eq!(
        after,
        system.simulation.body(system.earth).unwrap().position(),
        epsilon = 1e-6
    );
}

#[derive(Default)]
struct Counter {
    selects: Vec<ProgramHandle>,
    draws: Vec<(NodeId, ProgramHandle)>,
}

impl RenderBackend for Counter {
    fn select_program(&mut self, program: ProgramHandle) {
        self.selects.push(program);
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        self.draws.push((call.node, call.program));
    }
}

#[test]
fn test_submit_after_tick() {
    let mut system = build();
    system
        .simulation
        .advance(&mut system.graph, Duration::from_millis(16));

    let mut camera = FpsCamera::default();
    camera.world.set_translation(Vec3::new(0.0, 0.0, 6.0)).unwrap();
    camera.world.look_at(Vec3::ZERO, Vec3::Y).unwrap();

    let mut backend = Counter::default();
    let stats = submit(&system.graph, system.world, &camera, &mut backend).unwrap();

    // sun, earth, moon, saturn and the ring; world and the anchor have no geometry
    assert_eq!(stats.drawn, 5);
    assert_eq!(stats.skipped, 2);
    assert_eq!(backend.selects, [CELESTIAL, RING_PROGRAM]);
    assert_eq!(stats.program_switches, 2);

    let sun = system.simulation.body(system.sun).unwrap().node();
    assert_eq!(backend.draws[0], (sun, CELESTIAL));
    assert_eq!(backend.draws.last(), Some(&(system.saturn_ring, RING_PROGRAM)));
}
