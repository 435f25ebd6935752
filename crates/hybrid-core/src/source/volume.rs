// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Volume Sources
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Sources that inject inside the domain volume.
//!
//! [`VolumeSource`] turns a requested density increase into particles cell
//! by cell. The deficit each cell still owes (in physical particles) is
//! kept between steps, so the injected density follows the request to
//! within one macroparticle per cell.

use super::{MacroparticleQuota, Source, SourceStats};
use crate::material::MaterialKind;
use crate::world::World;
use hybrid_math::field::FieldCollection2D;
use hybrid_math::sampling::{sample_maxwellian_3d, thermal_velocity};
use hybrid_types::config::{
    ActivityWindow, PreloadSourceConfig, VolumeMaxwellianConfig, VolumeShape,
};
use hybrid_types::error::{HybridError, HybridResult};
use hybrid_types::state::{MaterialId, Particle, StepContext};
use ndarray::Array2;
use rand::{Rng, RngCore};
use std::f64::consts::PI;

/// Lowest temperature used when sampling thermal velocities (K).
pub const MIN_SOURCE_TEMPERATURE_K: f64 = 50.0;

/// Cell currently being drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub mesh: usize,
    pub i: usize,
    pub j: usize,
}

/// Density-deficit driven source.
///
/// Producers add to [`VolumeSource::dn_mut`] (#/m³ on nodes). At regeneration
/// the request is moved into a per-cell deficit; cells are then scanned
/// row-major and every cell whose deficit plus a random fraction of a
/// macroparticle reaches one weight is drained.
#[derive(Debug, Clone)]
pub struct VolumeSource {
    name: String,
    material: MaterialId,
    mass: f64,
    spwt0: f64,
    dn: FieldCollection2D,
    temperature: FieldCollection2D,
    /// Physical particles owed per cell, may dip below zero by less than
    /// one weight after an overshoot.
    deficit: Vec<Array2<f64>>,
    cursor: Option<Cursor>,
    /// Macroparticles left to emit from the cursor cell.
    pending: usize,
    stats: SourceStats,
}

impl VolumeSource {
    pub fn new(name: &str, material: MaterialId, world: &World) -> HybridResult<Self> {
        let mat = world.materials.get(material);
        let spwt0 = match &mat.kind {
            MaterialKind::Kinetic(k) => k.spwt0,
            MaterialKind::Fluid => 1.0,
            MaterialKind::Solid => {
                return Err(HybridError::MaterialKind {
                    name: mat.name.clone(),
                    expected: "kinetic or fluid",
                })
            }
        };
        let deficit = world
            .domain
            .meshes()
            .iter()
            .map(|m| Array2::zeros((m.ni - 1, m.nj - 1)))
            .collect();
        Ok(VolumeSource {
            name: name.to_string(),
            material,
            mass: mat.mass,
            spwt0,
            dn: FieldCollection2D::new(&world.domain),
            temperature: FieldCollection2D::new(&world.domain),
            deficit,
            cursor: None,
            pending: 0,
            stats: SourceStats::default(),
        })
    }

    /// Requested density increase (#/m³).
    pub fn dn(&self) -> &FieldCollection2D {
        &self.dn
    }

    pub fn dn_mut(&mut self) -> &mut FieldCollection2D {
        &mut self.dn
    }

    /// Temperature of injected particles (K).
    pub fn temperature_mut(&mut self) -> &mut FieldCollection2D {
        &mut self.temperature
    }

    /// Outstanding deficit of a cell (physical particles).
    pub fn deficit(&self, mesh: usize, i: usize, j: usize) -> f64 {
        self.deficit[mesh][[i, j]]
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    /// Move the node request into the per-cell deficits.
    fn absorb_request(&mut self, world: &World) {
        for (m, mesh) in world.domain.meshes().iter().enumerate() {
            let dn = self.dn.field(m);
            for i in 0..mesh.ni - 1 {
                for j in 0..mesh.nj - 1 {
                    self.deficit[m][[i, j]] += dn.cell_average(i, j) * mesh.cell_volume(i, j);
                }
            }
        }
        self.dn.clear();
    }

    /// Advance to the first cell at or after `from` with something to emit.
    fn find_next_cell(&mut self, from: Cursor, rng: &mut dyn RngCore) {
        let (mut m, mut i, mut j) = (from.mesh, from.i, from.j);
        while m < self.deficit.len() {
            let (ci, cj) = self.deficit[m].dim();
            while i < ci {
                while j < cj {
                    let owed = self.deficit[m][[i, j]];
                    let budget = owed + rng.gen::<f64>() * self.spwt0;
                    if budget >= self.spwt0 {
                        let count = (budget / self.spwt0).floor();
                        self.deficit[m][[i, j]] = owed - count * self.spwt0;
                        self.pending = count as usize;
                        self.cursor = Some(Cursor { mesh: m, i, j });
                        return;
                    }
                    j += 1;
                }
                j = 0;
                i += 1;
            }
            i = 0;
            m += 1;
        }
        self.cursor = None;
        self.pending = 0;
    }

    fn next_after(cursor: Cursor) -> Cursor {
        Cursor {
            j: cursor.j + 1,
            ..cursor
        }
    }
}

impl Source for VolumeSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn material(&self) -> MaterialId {
        self.material
    }

    fn regenerate(&mut self, world: &World, _ctx: &StepContext, rng: &mut dyn RngCore) {
        if !world.materials.get(self.material).is_kinetic() {
            return;
        }
        self.absorb_request(world);
        self.find_next_cell(Cursor { mesh: 0, i: 0, j: 0 }, rng);
    }

    fn has_particles(&self) -> bool {
        self.pending > 0
    }

    fn sample_particle(&mut self, world: &World, rng: &mut dyn RngCore) -> Option<Particle> {
        let Some(cell) = self.cursor else {
            log::warn!("{}: particle requested with no deficit left", self.name);
            return None;
        };
        if self.pending == 0 {
            return None;
        }
        self.pending -= 1;

        let mesh = world.domain.mesh(cell.mesh);
        let lc = [
            cell.i as f64 + rng.gen::<f64>(),
            cell.j as f64 + rng.gen::<f64>(),
        ];
        let x = mesh.pos(lc);
        let temp = self
            .temperature
            .field(cell.mesh)
            .gather(lc)
            .max(MIN_SOURCE_TEMPERATURE_K);
        let vel = sample_maxwellian_3d(thermal_velocity(temp, self.mass), rng);

        if self.pending == 0 {
            self.find_next_cell(Self::next_after(cell), rng);
        }
        if mesh.is_internal(x) {
            return None;
        }
        let theta = if mesh.domain_type.is_axisymmetric() {
            2.0 * PI * rng.gen::<f64>()
        } else {
            0.0
        };
        Some(Particle::new([x[0], x[1], theta], vel, self.spwt0, self.mass))
    }

    fn sample_fluid(&mut self, world: &mut World) {
        let mat = world.materials.get_mut(self.material);
        let mut added = 0.0;
        for (m, mesh) in world.domain.meshes().iter().enumerate() {
            let dn = self.dn.field(m);
            let den = mat.den.field_mut(m);
            for i in 0..mesh.ni {
                for j in 0..mesh.nj {
                    den.add(i, j, dn.at(i, j));
                    added += dn.at(i, j) * mesh.node_volume(i, j);
                }
            }
        }
        self.dn.clear();
        let mass = added * self.mass;
        self.stats.mass_generated_inst = mass;
        self.stats.mass_generated += mass;
    }

    fn stats(&self) -> &SourceStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut SourceStats {
        &mut self.stats
    }
}

/// Fills the domain once with a uniform density.
#[derive(Debug, Clone)]
pub struct PreloadSource {
    inner: VolumeSource,
    den: f64,
    temperature: f64,
    loaded: bool,
}

impl PreloadSource {
    pub fn new(cfg: &PreloadSourceConfig, world: &World) -> HybridResult<Self> {
        if !cfg.den.is_finite() || cfg.den < 0.0 {
            return Err(HybridError::PhysicsViolation(format!(
                "{}.den must be finite and >= 0",
                cfg.name
            )));
        }
        let material = world.materials.id(&cfg.material)?;
        Ok(PreloadSource {
            inner: VolumeSource::new(&cfg.name, material, world)?,
            den: cfg.den,
            temperature: cfg.temperature,
            loaded: false,
        })
    }
}

impl Source for PreloadSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn material(&self) -> MaterialId {
        self.inner.material()
    }

    fn regenerate(&mut self, world: &World, ctx: &StepContext, rng: &mut dyn RngCore) {
        if !self.loaded {
            self.inner.dn_mut().fill(self.den);
            self.inner.temperature_mut().fill(self.temperature);
            self.loaded = true;
        }
        self.inner.regenerate(world, ctx, rng);
    }

    fn has_particles(&self) -> bool {
        self.inner.has_particles()
    }

    fn sample_particle(&mut self, world: &World, rng: &mut dyn RngCore) -> Option<Particle> {
        self.inner.sample_particle(world, rng)
    }

    fn sample_fluid(&mut self, world: &mut World) {
        if !self.loaded {
            self.inner.dn_mut().fill(self.den);
            self.loaded = true;
        }
        self.inner.sample_fluid(world);
    }

    fn stats(&self) -> &SourceStats {
        self.inner.stats()
    }

    fn stats_mut(&mut self) -> &mut SourceStats {
        self.inner.stats_mut()
    }
}

/// Mass-flow driven Maxwellian source over a rectangle or circle.
#[derive(Debug, Clone)]
pub struct VolumeMaxwellianSource {
    name: String,
    material: MaterialId,
    window: ActivityWindow,
    quota: MacroparticleQuota,
    stats: SourceStats,
    mass: f64,
    spwt0: f64,
    mdot: f64,
    v_th: f64,
    v_drift: [f64; 2],
    shape: VolumeShape,
    x0: [f64; 2],
    x1: [f64; 2],
    radius: f64,
}

impl VolumeMaxwellianSource {
    pub fn new(cfg: &VolumeMaxwellianConfig, world: &World) -> HybridResult<Self> {
        cfg.validate()?;
        let material = world.materials.id(&cfg.material)?;
        let mat = world.materials.get(material);
        let spwt0 = mat.require_kinetic()?.spwt0;
        Ok(VolumeMaxwellianSource {
            name: cfg.name.clone(),
            material,
            window: cfg.window,
            quota: MacroparticleQuota::default(),
            stats: SourceStats::default(),
            mass: mat.mass,
            spwt0,
            mdot: cfg.mdot,
            v_th: thermal_velocity(cfg.temperature, mat.mass),
            v_drift: cfg.v_drift,
            shape: cfg.shape,
            x0: cfg.x0,
            x1: cfg.x1.unwrap_or(cfg.x0),
            radius: cfg.radius.unwrap_or(0.0),
        })
    }

    fn sample_position(&self, rng: &mut dyn RngCore) -> [f64; 2] {
        match self.shape {
            VolumeShape::Rect => [
                self.x0[0] + rng.gen::<f64>() * (self.x1[0] - self.x0[0]),
                self.x0[1] + rng.gen::<f64>() * (self.x1[1] - self.x0[1]),
            ],
            VolumeShape::Circle => {
                let r = self.radius * rng.gen::<f64>().sqrt();
                let phi = 2.0 * PI * rng.gen::<f64>();
                [self.x0[0] + r * phi.cos(), self.x0[1] + r * phi.sin()]
            }
        }
    }
}

impl Source for VolumeMaxwellianSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn material(&self) -> MaterialId {
        self.material
    }

    fn window(&self) -> ActivityWindow {
        self.window
    }

    fn regenerate(&mut self, _world: &World, ctx: &StepContext, _rng: &mut dyn RngCore) {
        self.quota
            .regenerate(self.mdot, ctx.dt, self.mass, self.spwt0);
    }

    fn has_particles(&self) -> bool {
        self.quota.has_particles()
    }

    fn sample_particle(&mut self, world: &World, rng: &mut dyn RngCore) -> Option<Particle> {
        if !self.quota.take() {
            return None;
        }
        let x = self.sample_position(rng);
        if world.domain.is_internal(x) {
            return None;
        }
        let th = sample_maxwellian_3d(self.v_th, rng);
        let vel = [th[0] + self.v_drift[0], th[1] + self.v_drift[1], th[2]];
        Some(Particle::new([x[0], x[1], 0.0], vel, self.spwt0, self.mass))
    }

    fn stats(&self) -> &SourceStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut SourceStats {
        &mut self.stats
    }
}
