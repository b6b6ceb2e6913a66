//! Frame-stepped simulation of all celestial bodies.
//!
//! A tick runs in two strictly separate passes: every body first advances
//! its phases by the same scaled delta time, and only then are transforms
//! written into the scene graph. No body ever observes a half-advanced
//! sibling, and traversal for rendering happens after the tick returns.

use std::fmt;
use std::time::Duration;

use tracing::{trace, warn};

use crate::arena::{Arena, Index};
use crate::celestial::CelestialBody;
use crate::error::{SceneError, SceneResult};
use crate::graph::SceneGraph;

/// Stable handle to a body in a [`Simulation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(Index);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Time control settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Multiplier on every frame delta; `0` freezes time.
    pub time_scale: f32,
    /// While paused, ticks advance nothing.
    pub paused: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            paused: false,
        }
    }
}

/// What a single [`Simulation::advance`] call did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Simulated seconds applied to every body.
    pub dt: f64,
    /// Bodies whose transforms were written.
    pub updated: usize,
    /// Bodies skipped because one of their nodes is gone.
    pub skipped: usize,
}

/// Owner of all celestial bodies.
#[derive(Debug, Default)]
pub struct Simulation {
    bodies: Arena<CelestialBody>,
    config: SimulationConfig,
    elapsed: f64,
}

impl Simulation {
    /// Create an empty simulation running at normal speed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty simulation with the given time settings.
    pub fn with_config(config: SimulationConfig) -> SceneResult<Self> {
        let mut simulation = Self::new();
        simulation.set_time_scale(config.time_scale)?;
        simulation.set_paused(config.paused);
        Ok(simulation)
    }

    /// Add a body and return its id.
    pub fn add_body(&mut self, body: CelestialBody) -> BodyId {
        let node = body.node();
        let id = BodyId(self.bodies.insert(body));
        trace!(body = %id, %node, "added body");
        id
    }

    /// Remove a body. The nodes it drove stay in the graph.
    pub fn remove_body(&mut self, id: BodyId) -> SceneResult<CelestialBody> {
        self.bodies.remove(id.0).ok_or(SceneError::BodyNotFound(id))
    }

    /// Borrow a body.
    pub fn body(&self, id: BodyId) -> SceneResult<&CelestialBody> {
        self.bodies.get(id.0).ok_or(SceneError::BodyNotFound(id))
    }

    /// Mutably borrow a body, e.g. to retune its orbit mid-run.
    pub fn body_mut(&mut self, id: BodyId) -> SceneResult<&mut CelestialBody> {
        self.bodies.get_mut(id.0).ok_or(SceneError::BodyNotFound(id))
    }

    /// All bodies with their ids.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &CelestialBody)> {
        self.bodies.iter().map(|(index, body)| (BodyId(index), body))
    }

    /// Number of bodies.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether there are no bodies.
    pub fn is_empty(&self) -> bool {
        self.bodies.len() == 0
    }

    /// Current time settings.
    pub fn config(&self) -> SimulationConfig {
        self.config
    }

    /// Set the time scale; must be finite and non-negative.
    pub fn set_time_scale(&mut self, time_scale: f32) -> SceneResult<()> {
        if !time_scale.is_finite() || time_scale < 0.0 {
            return Err(SceneError::invalid("time scale", time_scale));
        }
        self.config.time_scale = time_scale;
        Ok(())
    }

    /// Pause or resume.
    pub fn set_paused(&mut self, paused: bool) {
        self.config.paused = paused;
    }

    /// Total simulated time, saturating at [`Duration::MAX`].
    pub fn elapsed(&self) -> Duration {
        Duration::try_from_secs_f64(self.elapsed).unwrap_or(Duration::MAX)
    }

    /// Run one tick: advance every body by `dt` (scaled, or zero while
    /// paused), then write all transforms into `graph`.
    ///
    /// Cannot fail. A body whose node has been removed from the graph keeps
    /// advancing but is not written, and is counted in
    /// [`TickReport::skipped`].
    pub fn advance(&mut self, graph: &mut SceneGraph, dt: Duration) -> TickReport {
        let dt = if self.config.paused {
            0.0
        } else {
            dt.as_secs_f64() * f64::from(self.config.time_scale)
        };

        for (_, body) in self.bodies.iter_mut() {
            body.advance_secs(dt);
        }
        self.elapsed += dt;

        let (updated, skipped) = self.apply(graph);
        TickReport {
            dt,
            updated,
            skipped,
        }
    }

    /// Write every body's current transforms without advancing time.
    ///
    /// Returns `(updated, skipped)` counts.
    pub fn apply(&self, graph: &mut SceneGraph) -> (usize, usize) {
        let mut updated = 0;
        let mut skipped = 0;
        for (id, body) in self.bodies() {
            match body.apply(graph) {
                Ok(()) => updated += 1,
                Err(error) => {
                    warn!(body = %id, %error, "skipping body");
                    skipped += 1;
                }
            }
        }
        (updated, skipped)
    }
}
