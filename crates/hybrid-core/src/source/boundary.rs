// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Boundary Sources
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Sources attached to a boundary: thermal (drifting Maxwellian) inlets,
//! mono-energetic beams and ambient reservoirs that top up the cells the
//! boundary crosses.

use super::{MacroparticleQuota, Source, SourceStats};
use crate::world::World;
use hybrid_math::boundary::{Boundary, Segment};
use hybrid_math::sampling::{
    dot3, lambertian_direction, sample_maxwellian_3d, scale3, thermal_velocity,
};
use hybrid_types::config::{
    ActivityWindow, AmbientDensitySourceConfig, AmbientSourceConfig, BeamSourceConfig,
    MaxwellianSourceConfig,
};
use hybrid_types::constants::K_BOLTZMANN;
use hybrid_types::error::{HybridError, HybridResult};
use hybrid_types::state::{MaterialId, Particle, StepContext};
use rand::{Rng, RngCore};
use std::f64::consts::PI;

/// Rejection draws before an inward velocity is forced by reflection.
const MAX_INWARD_DRAWS: usize = 1000;

/// Parameter step used to find the cells a boundary passes through.
const AMBIENT_T_STEP: f64 = 0.01;

/// State shared by all boundary-attached sources.
#[derive(Debug, Clone)]
struct Emitter {
    name: String,
    material: MaterialId,
    boundary: usize,
    window: ActivityWindow,
    quota: MacroparticleQuota,
    stats: SourceStats,
    mass: f64,
    spwt0: f64,
    /// Mass flow rate (kg/s).
    mdot: f64,
    dt: f64,
    axisymmetric: bool,
}

impl Emitter {
    fn new(
        name: &str,
        material: &str,
        boundary: &str,
        window: ActivityWindow,
        world: &World,
    ) -> HybridResult<Self> {
        let id = world.materials.id(material)?;
        let mat = world.materials.get(id);
        let spwt0 = mat.require_kinetic()?.spwt0;
        Ok(Emitter {
            name: name.to_string(),
            material: id,
            boundary: world.boundary_index(boundary)?,
            window,
            quota: MacroparticleQuota::default(),
            stats: SourceStats::default(),
            mass: mat.mass,
            spwt0,
            mdot: 0.0,
            dt: 0.0,
            axisymmetric: world.domain.domain_type.is_axisymmetric(),
        })
    }

    fn regenerate(&mut self, ctx: &StepContext) {
        self.dt = ctx.dt;
        self.quota
            .regenerate(self.mdot, ctx.dt, self.mass, self.spwt0);
    }

    fn boundary<'w>(&self, world: &'w World) -> &'w Boundary {
        &world.boundaries[self.boundary]
    }

    fn place(&self, boundary: &Boundary, t: f64, vel: [f64; 3], rng: &mut dyn RngCore) -> Particle {
        let x = boundary.pos(t);
        let theta = if self.axisymmetric {
            2.0 * PI * rng.gen::<f64>()
        } else {
            0.0
        };
        let mut part = Particle::new([x[0], x[1], theta], vel, self.spwt0, self.mass);
        part.dt = rng.gen::<f64>() * self.dt;
        part
    }
}

/// Drifting Maxwellian inlet.
///
/// The flow is given as a mass flow rate, a current or an injection density.
#[derive(Debug, Clone)]
pub struct MaxwellianSource {
    emitter: Emitter,
    v_drift: f64,
    v_az: f64,
    v_th: f64,
}

impl MaxwellianSource {
    pub fn new(cfg: &MaxwellianSourceConfig, world: &World) -> HybridResult<Self> {
        cfg.validate()?;
        let mut emitter = Emitter::new(&cfg.name, &cfg.material, &cfg.boundary, cfg.window, world)?;
        let mat = world.materials.get(emitter.material);
        let area = emitter.boundary(world).area();
        emitter.mdot = match (cfg.mdot, cfg.current, cfg.den) {
            (Some(mdot), _, _) => mdot,
            (_, Some(current), _) => {
                if mat.charge == 0.0 {
                    return Err(HybridError::ConfigError(format!(
                        "Source {}: current given for neutral material {}",
                        cfg.name, mat.name
                    )));
                }
                (current / mat.charge * mat.mass).abs()
            }
            (_, _, Some(den)) => den * area * cfg.v_drift * mat.mass,
            _ => 0.0,
        };
        Ok(MaxwellianSource {
            v_th: thermal_velocity(cfg.temperature, mat.mass),
            v_drift: cfg.v_drift,
            v_az: cfg.v_az,
            emitter,
        })
    }

    /// Mass flow rate (kg/s).
    pub fn mdot(&self) -> f64 {
        self.emitter.mdot
    }

    /// Equivalent density of the injected beam (#/m³).
    pub fn injection_density(&self, world: &World) -> Option<f64> {
        let area = self.emitter.boundary(world).area();
        (self.v_drift > 0.0).then(|| self.emitter.mdot / (area * self.v_drift * self.emitter.mass))
    }
}

impl Source for MaxwellianSource {
    fn name(&self) -> &str {
        &self.emitter.name
    }

    fn material(&self) -> MaterialId {
        self.emitter.material
    }

    fn window(&self) -> ActivityWindow {
        self.emitter.window
    }

    fn regenerate(&mut self, _world: &World, ctx: &StepContext, _rng: &mut dyn RngCore) {
        self.emitter.regenerate(ctx);
    }

    fn has_particles(&self) -> bool {
        self.emitter.quota.has_particles()
    }

    fn sample_particle(&mut self, world: &World, rng: &mut dyn RngCore) -> Option<Particle> {
        if !self.emitter.quota.take() {
            return None;
        }
        let boundary = self.emitter.boundary(world);
        let t = boundary.random_t(rng);
        let n = boundary.normal(t);
        let mut vel = [0.0; 3];
        for _ in 0..MAX_INWARD_DRAWS {
            let th = sample_maxwellian_3d(self.v_th, rng);
            vel = [
                th[0] + n[0] * self.v_drift,
                th[1] + n[1] * self.v_drift,
                th[2] + n[2] * self.v_drift + self.v_az,
            ];
            if dot3(n, vel) > 0.0 {
                break;
            }
        }
        let vn = dot3(n, vel);
        if vn <= 0.0 {
            vel = [
                vel[0] - 2.0 * vn * n[0],
                vel[1] - 2.0 * vn * n[1],
                vel[2] - 2.0 * vn * n[2],
            ];
        }
        Some(self.emitter.place(boundary, t, vel, rng))
    }

    fn stats(&self) -> &SourceStats {
        &self.emitter.stats
    }

    fn stats_mut(&mut self) -> &mut SourceStats {
        &mut self.emitter.stats
    }
}

/// Direction law of a mono-energetic beam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeamEmission {
    /// Along the boundary normal (UNIFORM, COLD_BEAM).
    Normal,
    /// Cosine law about the normal.
    Cosine,
}

/// Mono-energetic boundary beam with speed `v_drift`.
#[derive(Debug, Clone)]
pub struct BeamSource {
    emitter: Emitter,
    emission: BeamEmission,
    v_drift: f64,
}

impl BeamSource {
    pub fn new(cfg: &BeamSourceConfig, emission: BeamEmission, world: &World) -> HybridResult<Self> {
        cfg.validate()?;
        let mut emitter = Emitter::new(&cfg.name, &cfg.material, &cfg.boundary, cfg.window, world)?;
        emitter.mdot = cfg.mdot;
        Ok(BeamSource {
            emitter,
            emission,
            v_drift: cfg.v_drift,
        })
    }
}

impl Source for BeamSource {
    fn name(&self) -> &str {
        &self.emitter.name
    }

    fn material(&self) -> MaterialId {
        self.emitter.material
    }

    fn window(&self) -> ActivityWindow {
        self.emitter.window
    }

    fn regenerate(&mut self, _world: &World, ctx: &StepContext, _rng: &mut dyn RngCore) {
        self.emitter.regenerate(ctx);
    }

    fn has_particles(&self) -> bool {
        self.emitter.quota.has_particles()
    }

    fn sample_particle(&mut self, world: &World, rng: &mut dyn RngCore) -> Option<Particle> {
        if !self.emitter.quota.take() {
            return None;
        }
        let boundary = self.emitter.boundary(world);
        let t = boundary.random_t(rng);
        let n = boundary.normal(t);
        let dir = match self.emission {
            BeamEmission::Normal => n,
            BeamEmission::Cosine => lambertian_direction(n, boundary.tangent(t), rng),
        };
        Some(self.emitter.place(boundary, t, scale3(dir, self.v_drift), rng))
    }

    fn stats(&self) -> &SourceStats {
        &self.emitter.stats
    }

    fn stats_mut(&mut self) -> &mut SourceStats {
        &mut self.emitter.stats
    }
}

/// Level an ambient source restores along its boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AmbientTarget {
    /// Share `partial / total` of the pressure missing below `total` (Pa).
    Pressure { partial: f64, total: f64 },
    /// Own number density (#/m³).
    Density(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AmbientCell {
    mesh: usize,
    i: usize,
    j: usize,
    /// Fractional macroparticle carried to the next step.
    rem: f64,
    pending: usize,
}

/// Reservoir that refills the cells crossed by a boundary (AMBIENT,
/// AMBIENT_DENSITY).
///
/// Each step every cell gets the particles it is missing relative to the
/// target, evaluated at the cell centre. Cells already above the target are
/// left alone; no particles are removed.
#[derive(Debug, Clone)]
pub struct AmbientSource {
    emitter: Emitter,
    target: AmbientTarget,
    temperature: f64,
    drift: [f64; 3],
    v_th: f64,
    cells: Vec<AmbientCell>,
    current: usize,
}

impl AmbientSource {
    pub fn from_pressure(cfg: &AmbientSourceConfig, world: &World) -> HybridResult<Self> {
        cfg.validate()?;
        let target = AmbientTarget::Pressure {
            partial: cfg.partial_pressure,
            total: cfg.total_pressure,
        };
        let emitter = Emitter::new(&cfg.name, &cfg.material, &cfg.boundary, cfg.window, world)?;
        Ok(Self::with_target(emitter, target, cfg.temperature, cfg.drift_velocity))
    }

    pub fn from_density(cfg: &AmbientDensitySourceConfig, world: &World) -> HybridResult<Self> {
        cfg.validate()?;
        let emitter = Emitter::new(&cfg.name, &cfg.material, &cfg.boundary, cfg.window, world)?;
        Ok(Self::with_target(
            emitter,
            AmbientTarget::Density(cfg.density),
            cfg.temperature,
            cfg.drift_velocity,
        ))
    }

    fn with_target(
        emitter: Emitter,
        target: AmbientTarget,
        temperature: f64,
        drift: [f64; 3],
    ) -> Self {
        AmbientSource {
            v_th: thermal_velocity(temperature, emitter.mass),
            emitter,
            target,
            temperature,
            drift,
            cells: Vec::new(),
            current: 0,
        }
    }

    pub fn target(&self) -> AmbientTarget {
        self.target
    }

    /// Cells `(mesh, i, j)` refilled by this source, in boundary order.
    pub fn cells(&self) -> Vec<(usize, usize, usize)> {
        self.cells.iter().map(|c| (c.mesh, c.i, c.j)).collect()
    }

    /// Physical particles missing from a cell.
    fn deficit(&self, world: &World, mesh: usize, lc: [f64; 2]) -> f64 {
        match self.target {
            AmbientTarget::Pressure { partial, total } => {
                let p_ave = total_pressure(world, mesh, lc);
                if p_ave > total {
                    return 0.0;
                }
                (total - p_ave) * (partial / total) / (K_BOLTZMANN * self.temperature)
            }
            AmbientTarget::Density(den) => {
                let den_ave = world
                    .materials
                    .get(self.emitter.material)
                    .den
                    .field(mesh)
                    .gather(lc);
                (den - den_ave).max(0.0)
            }
        }
    }
}

/// Sum of `n·k·T` over all materials at a logical coordinate (Pa).
pub fn total_pressure(world: &World, mesh: usize, lc: [f64; 2]) -> f64 {
    world
        .materials
        .iter()
        .map(|(_, mat)| {
            mat.den.field(mesh).gather(lc) * K_BOLTZMANN * mat.temp.field(mesh).gather(lc)
        })
        .sum()
}

impl Source for AmbientSource {
    fn name(&self) -> &str {
        &self.emitter.name
    }

    fn material(&self) -> MaterialId {
        self.emitter.material
    }

    fn window(&self) -> ActivityWindow {
        self.emitter.window
    }

    fn start(&mut self, world: &World) -> HybridResult<()> {
        let boundary = self.emitter.boundary(world);
        let steps = (boundary.num_segments() as f64 / AMBIENT_T_STEP).round() as usize;
        self.cells.clear();
        for k in 0..=steps {
            let x = boundary.pos(k as f64 * AMBIENT_T_STEP);
            let Some((m, lc)) = world.domain.locate(x) else {
                continue;
            };
            let (i, j) = world.domain.mesh(m).cell_of(lc);
            if !self.cells.iter().any(|c| c.mesh == m && c.i == i && c.j == j) {
                self.cells.push(AmbientCell {
                    mesh: m,
                    i,
                    j,
                    rem: 0.0,
                    pending: 0,
                });
            }
        }
        if self.cells.is_empty() {
            return Err(HybridError::ConfigError(format!(
                "Source {}: boundary {} does not cross the domain",
                self.emitter.name, boundary.name
            )));
        }
        log::info!(
            "Source '{}' refills {} cells along '{}'",
            self.emitter.name,
            self.cells.len(),
            boundary.name
        );
        Ok(())
    }

    fn regenerate(&mut self, world: &World, ctx: &StepContext, _rng: &mut dyn RngCore) {
        self.emitter.dt = ctx.dt;
        let mut total = 0;
        for c in 0..self.cells.len() {
            let AmbientCell { mesh, i, j, rem, .. } = self.cells[c];
            let lc = [i as f64 + 0.5, j as f64 + 0.5];
            let volume = world.domain.mesh(mesh).cell_volume(i, j);
            let mp = self.deficit(world, mesh, lc) * volume / self.emitter.spwt0 + rem;
            let whole = mp.floor();
            let cell = &mut self.cells[c];
            cell.pending = whole as usize;
            cell.rem = mp - whole;
            total += cell.pending;
        }
        self.emitter.quota.num_mp = total;
        self.current = 0;
    }

    fn has_particles(&self) -> bool {
        self.emitter.quota.has_particles()
    }

    fn sample_particle(&mut self, world: &World, rng: &mut dyn RngCore) -> Option<Particle> {
        if !self.emitter.quota.take() {
            return None;
        }
        while self.cells.get(self.current)?.pending == 0 {
            self.current += 1;
        }
        let cell = &mut self.cells[self.current];
        cell.pending -= 1;
        let (m, i, j) = (cell.mesh, cell.i, cell.j);

        let mesh = world.domain.mesh(m);
        let x = mesh.pos([i as f64 + rng.gen::<f64>(), j as f64 + rng.gen::<f64>()]);
        let th = sample_maxwellian_3d(self.v_th, rng);
        let vel = [
            th[0] + self.drift[0],
            th[1] + self.drift[1],
            th[2] + self.drift[2],
        ];
        if mesh.is_internal(x) {
            return None;
        }
        let theta = if self.emitter.axisymmetric {
            2.0 * PI * rng.gen::<f64>()
        } else {
            0.0
        };
        let mut part = Particle::new(
            [x[0], x[1], theta],
            vel,
            self.emitter.spwt0,
            self.emitter.mass,
        );
        part.dt = rng.gen::<f64>() * self.emitter.dt;
        Some(part)
    }

    fn stats(&self) -> &SourceStats {
        &self.emitter.stats
    }

    fn stats_mut(&mut self) -> &mut SourceStats {
        &mut self.emitter.stats
    }
}
