//! Celestial bodies: orbital and spin state driving scene nodes.
//!
//! A [`CelestialBody`] does not own geometry; it holds the [`NodeId`] of
//! the node it drives and, every tick, writes
//!
//! ```text
//! position    = Rz(inclination) * radius * (cos θo, 0, sin θo)
//! orientation = Rz(axial_tilt) * Ry(θs)
//! transform   = T(position) * R(orientation) * S(scale)
//! ```
//!
//! into that node. The phases θo and θs are kept in `[0, 2π)` so they do
//! not lose precision over long sessions. Changing a rate never resets a
//! phase, so retuning a body mid-run does not make it jump.
//!
//! Two optional companion nodes are driven as well:
//! - a **ring** node gets the body's position and axial tilt but no spin,
//!   scaled by the body scale times `(ring.x, 1, ring.y)`;
//! - a **satellite anchor** gets the position and tilt only. Moons attached
//!   beneath it follow the planet without inheriting its spin or size.

use std::f64::consts::TAU;
use std::time::Duration;

use glam::{Quat, Vec2, Vec3};
use tracing::warn;

use crate::error::{
    SceneError, SceneResult, ensure_finite, ensure_positive, ensure_positive_vec2,
    ensure_positive_vec3,
};
use crate::graph::{NodeId, SceneGraph};
use crate::transform::Transform;

/// Orbit parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitConfig {
    /// Distance between the orbit centre and the body centre. Must be > 0.
    pub radius: f32,
    /// Tilt of the orbital plane about the parent Z axis, in radians.
    pub inclination: f32,
    /// Angular speed along the orbit in radians per second; negative is
    /// retrograde.
    pub rate: f32,
}

impl OrbitConfig {
    /// Orbit in the parent's XZ plane.
    pub fn new(radius: f32, rate: f32) -> Self {
        Self {
            radius,
            inclination: 0.0,
            rate,
        }
    }

    /// Orbit completing one revolution every `period` seconds.
    ///
    /// A negative period gives a retrograde orbit.
    pub fn from_period(radius: f32, inclination: f32, period: f32) -> SceneResult<Self> {
        if !period.is_finite() || period == 0.0 {
            return Err(SceneError::invalid("orbital period", period));
        }
        Ok(Self {
            radius,
            inclination,
            rate: std::f32::consts::TAU / period,
        })
    }

    fn validate(&self) -> SceneResult<()> {
        ensure_positive("orbit radius", self.radius)?;
        ensure_finite("orbit inclination", self.inclination)?;
        ensure_finite("orbit rate", self.rate)?;
        Ok(())
    }
}

/// Spin parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpinConfig {
    /// Angle between the spin axis and the orbital axis, in radians.
    pub axial_tilt: f32,
    /// Spin speed in radians per second; negative spins backwards.
    pub rate: f32,
}

impl SpinConfig {
    /// Spin once every `period` seconds.
    pub fn from_period(axial_tilt: f32, period: f32) -> SceneResult<Self> {
        if !period.is_finite() || period == 0.0 {
            return Err(SceneError::invalid("spin period", period));
        }
        Ok(Self {
            axial_tilt,
            rate: std::f32::consts::TAU / period,
        })
    }

    fn validate(&self) -> SceneResult<()> {
        ensure_finite("axial tilt", self.axial_tilt)?;
        ensure_finite("spin rate", self.rate)?;
        Ok(())
    }
}

/// Ring parameters. Only rendering reads these; the dynamics ignore them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingConfig {
    /// Node holding the ring geometry and program.
    pub node: NodeId,
    /// Ring extent along its two in-plane axes, relative to the body scale.
    pub scale: Vec2,
}

/// A body that orbits its parent and spins about its own axis.
#[derive(Clone, Debug)]
pub struct CelestialBody {
    node: NodeId,
    orbit: Option<OrbitConfig>,
    orbit_phase: f32,
    spin: SpinConfig,
    spin_phase: f32,
    scale: Vec3,
    ring: Option<RingConfig>,
    satellite_anchor: Option<NodeId>,
}

impl CelestialBody {
    /// Create a body driving `node`. It starts without an orbit (resting at
    /// its parent's origin), without spin and with unit scale.
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            orbit: None,
            orbit_phase: 0.0,
            spin: SpinConfig::default(),
            spin_phase: 0.0,
            scale: Vec3::ONE,
            ring: None,
            satellite_anchor: None,
        }
    }

    /// Node whose transform this body writes.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Orbit parameters, if the body orbits.
    pub fn orbit(&self) -> Option<OrbitConfig> {
        self.orbit
    }

    /// Spin parameters.
    pub fn spin(&self) -> SpinConfig {
        self.spin
    }

    /// Per-axis scale of the body.
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Ring parameters, if any.
    pub fn ring(&self) -> Option<RingConfig> {
        self.ring
    }

    /// Node receiving the orbit frame, if any.
    pub fn satellite_anchor(&self) -> Option<NodeId> {
        self.satellite_anchor
    }

    /// Orbital phase in `[0, 2π)`.
    pub fn orbit_phase(&self) -> f32 {
        self.orbit_phase
    }

    /// Spin phase in `[0, 2π)`.
    pub fn spin_phase(&self) -> f32 {
        self.spin_phase
    }

    /// Set all orbit parameters. The orbital phase is kept.
    pub fn set_orbit(&mut self, orbit: OrbitConfig) -> SceneResult<()> {
        orbit.validate()?;
        self.orbit = Some(orbit);
        Ok(())
    }

    /// Set radius and rate, keeping the inclination and the phase.
    pub fn set_orbit_radius_rate(&mut self, radius: f32, rate: f32) -> SceneResult<()> {
        let inclination = self.orbit.map_or(0.0, |o| o.inclination);
        self.set_orbit(OrbitConfig {
            radius,
            inclination,
            rate,
        })
    }

    /// Stop orbiting; the body rests at its parent's origin.
    pub fn clear_orbit(&mut self) {
        self.orbit = None;
    }

    /// Set the spin parameters. The spin phase is kept.
    pub fn set_spin(&mut self, spin: SpinConfig) -> SceneResult<()> {
        spin.validate()?;
        self.spin = spin;
        Ok(())
    }

    /// Set a per-axis scale; every component must be positive.
    pub fn set_scale(&mut self, scale: Vec3) -> SceneResult<()> {
        self.scale = ensure_positive_vec3("body scale", scale)?;
        Ok(())
    }

    /// Set the same scale on all axes.
    pub fn set_uniform_scale(&mut self, scale: f32) -> SceneResult<()> {
        self.set_scale(Vec3::splat(ensure_positive("body scale", scale)?))
    }

    /// Attach ring parameters.
    pub fn set_ring(&mut self, ring: RingConfig) -> SceneResult<()> {
        ensure_positive_vec2("ring scale", ring.scale)?;
        self.ring = Some(ring);
        Ok(())
    }

    /// Remove the ring. The ring node itself is left in the graph.
    pub fn clear_ring(&mut self) {
        self.ring = None;
    }

    /// Set or clear the node receiving the orbit frame.
    pub fn set_satellite_anchor(&mut self, anchor: Option<NodeId>) {
        self.satellite_anchor = anchor;
    }

    /// Jump to the given phases (normalized into `[0, 2π)`).
    pub fn set_phases(&mut self, orbit_phase: f32, spin_phase: f32) -> SceneResult<()> {
        let orbit_phase = ensure_finite("orbit phase", orbit_phase)?;
        let spin_phase = ensure_finite("spin phase", spin_phase)?;
        self.orbit_phase = wrap_phase(f64::from(orbit_phase));
        self.spin_phase = wrap_phase(f64::from(spin_phase));
        Ok(())
    }

    /// Advance both phases by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.advance_secs(dt.as_secs_f64());
    }

    /// `dt` must be finite; callers pass validated, scaled frame time.
    pub(crate) fn advance_secs(&mut self, dt: f64) {
        if let Some(orbit) = self.orbit {
            self.orbit_phase = wrap_phase(f64::from(self.orbit_phase) + f64::from(orbit.rate) * dt);
        }
        self.spin_phase = wrap_phase(f64::from(self.spin_phase) + f64::from(self.spin.rate) * dt);
    }

    /// Position relative to the parent, from the current orbital phase.
    pub fn position(&self) -> Vec3 {
        let Some(orbit) = self.orbit else {
            return Vec3::ZERO;
        };
        let (sin, cos) = self.orbit_phase.sin_cos();
        Quat::from_rotation_z(orbit.inclination) * (orbit.radius * Vec3::new(cos, 0.0, sin))
    }

    /// Orientation from the axial tilt and the current spin phase.
    pub fn orientation(&self) -> Quat {
        self.tilt() * Quat::from_rotation_y(self.spin_phase)
    }

    /// Local transform written to the body's node.
    pub fn transform(&self) -> Transform {
        Transform::from_trs(self.position(), self.orientation(), self.scale)
    }

    /// Orbit frame written to the satellite anchor: position and tilt only.
    pub fn frame_transform(&self) -> Transform {
        Transform::from_trs(self.position(), self.tilt(), Vec3::ONE)
    }

    /// Transform written to the ring node, if a ring is set.
    pub fn ring_transform(&self) -> Option<Transform> {
        self.ring.map(|ring| {
            let scale = self.scale * Vec3::new(ring.scale.x, 1.0, ring.scale.y);
            Transform::from_trs(self.position(), self.tilt(), scale)
        })
    }

    /// Write the current transforms into the driven nodes.
    ///
    /// Fails with [`SceneError::NodeNotFound`], writing nothing, if the
    /// body's own node is missing. A missing ring node or satellite anchor
    /// is logged and skipped; the body itself is still written.
    pub fn apply(&self, graph: &mut SceneGraph) -> SceneResult<()> {
        graph.get_mut(self.node)?.set_transform(self.transform());

        if let Some(anchor) = self.satellite_anchor {
            match graph.get_mut(anchor) {
                Ok(node) => node.set_transform(self.frame_transform()),
                Err(error) => warn!(body = %self.node, %error, "satellite anchor missing"),
            }
        }
        if let (Some(ring), Some(transform)) = (self.ring, self.ring_transform()) {
            match graph.get_mut(ring.node) {
                Ok(node) => node.set_transform(transform),
                Err(error) => warn!(body = %self.node, %error, "ring node missing"),
            }
        }
        Ok(())
    }

    fn tilt(&self) -> Quat {
        Quat::from_rotation_z(self.spin.axial_tilt)
    }
}

/// Reduce an angle into `[0, 2π)`.
fn wrap_phase(angle: f64) -> f32 {
    let wrapped = angle.rem_euclid(TAU) as f32;
    // Rounding to f32 can land exactly on 2π
    if wrapped >= std::f32::consts::TAU {
        0.0
    } else {
        wrapped
    }
}
