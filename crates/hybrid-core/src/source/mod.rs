// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Sources
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Particle and fluid-mass sources.
//!
//! Each step a source converts its mass-flow target into an integer
//! macroparticle quota. The fractional part is carried into the next step,
//! so the injected mass tracks `∫ mdot dt` to within one macroparticle.

pub mod boundary;
pub mod list;
pub mod volume;

use crate::material::MaterialKind;
use crate::world::World;
use boundary::{AmbientSource, BeamEmission, BeamSource, MaxwellianSource};
use hybrid_types::config::{
    ActivityWindow, AmbientDensitySourceConfig, AmbientSourceConfig, BeamSourceConfig,
    ConfigEntry, MaxwellianSourceConfig, PreloadSourceConfig, SimulationConfig,
    VolumeMaxwellianConfig,
};
use hybrid_types::error::{HybridError, HybridResult};
use hybrid_types::state::{MaterialId, Particle, StepContext};
use list::ParticleListSource;
use rand::RngCore;
use std::collections::BTreeMap;
use volume::{PreloadSource, VolumeMaxwellianSource, VolumeSource};

/// Injected mass bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SourceStats {
    /// Cumulative injected mass (kg).
    pub mass_generated: f64,
    /// Mass injected during the last sampling pass (kg).
    pub mass_generated_inst: f64,
    pub particles_generated: usize,
}

/// Integer macroparticle quota with fractional carry-over.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MacroparticleQuota {
    pub num_mp: usize,
    pub mp_rem: f64,
}

impl MacroparticleQuota {
    /// Convert `mdot·dt` into whole macroparticles of weight `spwt`.
    pub fn regenerate(&mut self, mdot: f64, dt: f64, mass: f64, spwt: f64) {
        if !(mdot > 0.0) || !(dt > 0.0) || !(mass > 0.0) || !(spwt > 0.0) {
            self.num_mp = 0;
            return;
        }
        let mp = mdot * dt / (mass * spwt) + self.mp_rem;
        let whole = mp.floor();
        self.num_mp = whole as usize;
        self.mp_rem = mp - whole;
    }

    pub fn has_particles(&self) -> bool {
        self.num_mp > 0
    }

    /// Consume one macroparticle; false when the quota is exhausted.
    pub fn take(&mut self) -> bool {
        if self.num_mp == 0 {
            return false;
        }
        self.num_mp -= 1;
        true
    }
}

/// A producer of macroparticles or fluid density for one material.
pub trait Source {
    fn name(&self) -> &str;

    fn material(&self) -> MaterialId;

    /// Iterations during which the source is sampled.
    fn window(&self) -> ActivityWindow {
        ActivityWindow::default()
    }

    /// Called once after all sources are configured.
    fn start(&mut self, _world: &World) -> HybridResult<()> {
        Ok(())
    }

    /// Recompute the mass-flow target for this step.
    fn update(&mut self, _world: &World, _ctx: &StepContext) {}

    /// Turn the current target into this step's macroparticle quota.
    fn regenerate(&mut self, world: &World, ctx: &StepContext, rng: &mut dyn RngCore);

    fn has_particles(&self) -> bool;

    /// Draw one particle and consume one unit of quota. `None` when the
    /// candidate was discarded, e.g. it landed inside solid geometry.
    fn sample_particle(&mut self, world: &World, rng: &mut dyn RngCore) -> Option<Particle>;

    /// Deposit density into a fluid material.
    fn sample_fluid(&mut self, _world: &mut World) {}

    fn stats(&self) -> &SourceStats;

    fn stats_mut(&mut self) -> &mut SourceStats;
}

/// Drain a source into its material. Returns the number of particles added.
pub fn sample_all(source: &mut dyn Source, world: &mut World, rng: &mut dyn RngCore) -> usize {
    let id = source.material();
    match world.materials.get(id).kind {
        MaterialKind::Kinetic(_) => {}
        MaterialKind::Fluid => {
            source.sample_fluid(world);
            return 0;
        }
        MaterialKind::Solid => return 0,
    }

    let mut added = 0;
    let mut mass = 0.0;
    while source.has_particles() {
        let Some(part) = source.sample_particle(world, rng) else {
            continue;
        };
        let inc = part.mpw * part.mass;
        let World {
            domain, materials, ..
        } = &mut *world;
        if materials.get_mut(id).add_particle(domain, part) {
            mass += inc;
            added += 1;
        }
    }
    let stats = source.stats_mut();
    stats.mass_generated_inst = mass;
    stats.mass_generated += mass;
    stats.particles_generated += added;
    added
}

pub type SourceFactory = fn(&ConfigEntry, &World) -> HybridResult<Box<dyn Source>>;

/// Handle of a density-deficit source owned by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeficitSourceId(pub usize);

/// Owns every source and samples them once per step.
pub struct SourceModule {
    boundary_factories: BTreeMap<String, SourceFactory>,
    volume_factories: BTreeMap<String, SourceFactory>,
    boundary_sources: Vec<Box<dyn Source>>,
    volume_sources: Vec<Box<dyn Source>>,
    deficit_sources: Vec<VolumeSource>,
    list_sources: BTreeMap<MaterialId, ParticleListSource>,
}

fn maxwellian_factory(entry: &ConfigEntry, world: &World) -> HybridResult<Box<dyn Source>> {
    let cfg: MaxwellianSourceConfig = entry.parse()?;
    Ok(Box::new(MaxwellianSource::new(&cfg, world)?))
}

fn beam_factory(entry: &ConfigEntry, world: &World) -> HybridResult<Box<dyn Source>> {
    let cfg: BeamSourceConfig = entry.parse()?;
    Ok(Box::new(BeamSource::new(&cfg, BeamEmission::Normal, world)?))
}

fn cosine_factory(entry: &ConfigEntry, world: &World) -> HybridResult<Box<dyn Source>> {
    let cfg: BeamSourceConfig = entry.parse()?;
    Ok(Box::new(BeamSource::new(&cfg, BeamEmission::Cosine, world)?))
}

fn ambient_factory(entry: &ConfigEntry, world: &World) -> HybridResult<Box<dyn Source>> {
    let cfg: AmbientSourceConfig = entry.parse()?;
    Ok(Box::new(AmbientSource::from_pressure(&cfg, world)?))
}

fn ambient_density_factory(entry: &ConfigEntry, world: &World) -> HybridResult<Box<dyn Source>> {
    let cfg: AmbientDensitySourceConfig = entry.parse()?;
    Ok(Box::new(AmbientSource::from_density(&cfg, world)?))
}

fn preload_factory(entry: &ConfigEntry, world: &World) -> HybridResult<Box<dyn Source>> {
    let cfg: PreloadSourceConfig = entry.parse()?;
    Ok(Box::new(PreloadSource::new(&cfg, world)?))
}

fn volume_maxwellian_factory(entry: &ConfigEntry, world: &World) -> HybridResult<Box<dyn Source>> {
    let cfg: VolumeMaxwellianConfig = entry.parse()?;
    Ok(Box::new(VolumeMaxwellianSource::new(&cfg, world)?))
}

impl Default for SourceModule {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceModule {
    /// Module with the built-in source types registered.
    pub fn new() -> Self {
        let mut module = SourceModule {
            boundary_factories: BTreeMap::new(),
            volume_factories: BTreeMap::new(),
            boundary_sources: Vec::new(),
            volume_sources: Vec::new(),
            deficit_sources: Vec::new(),
            list_sources: BTreeMap::new(),
        };
        module.register_boundary_source("MAXWELLIAN", maxwellian_factory);
        module.register_boundary_source("UNIFORM", beam_factory);
        module.register_boundary_source("COLD_BEAM", beam_factory);
        module.register_boundary_source("COSINE", cosine_factory);
        module.register_boundary_source("AMBIENT", ambient_factory);
        module.register_boundary_source("AMBIENT_DENSITY", ambient_density_factory);
        module.register_volume_source("PRELOAD", preload_factory);
        module.register_volume_source("MAXWELLIAN", volume_maxwellian_factory);
        module
    }

    pub fn register_boundary_source(&mut self, tag: &str, factory: SourceFactory) {
        self.boundary_factories
            .insert(tag.to_ascii_uppercase(), factory);
    }

    pub fn register_volume_source(&mut self, tag: &str, factory: SourceFactory) {
        self.volume_factories.insert(tag.to_ascii_uppercase(), factory);
    }

    /// Materialize the configured sources.
    pub fn process(&mut self, config: &SimulationConfig, world: &World) -> HybridResult<()> {
        for entry in &config.boundary_sources {
            let factory = self.boundary_factories.get(&entry.key()).ok_or_else(|| {
                HybridError::UnknownTag {
                    kind: "boundary source",
                    tag: entry.tag.clone(),
                }
            })?;
            let source = factory(entry, world)?;
            self.add_boundary_source(source);
        }
        for entry in &config.volume_sources {
            let factory = self.volume_factories.get(&entry.key()).ok_or_else(|| {
                HybridError::UnknownTag {
                    kind: "volume source",
                    tag: entry.tag.clone(),
                }
            })?;
            let source = factory(entry, world)?;
            self.add_volume_source(source);
        }
        Ok(())
    }

    pub fn add_boundary_source(&mut self, source: Box<dyn Source>) {
        log::info!("Added boundary source '{}'", source.name());
        self.boundary_sources.push(source);
    }

    pub fn add_volume_source(&mut self, source: Box<dyn Source>) {
        log::info!("Added volume source '{}'", source.name());
        self.volume_sources.push(source);
    }

    /// New density-deficit source feeding `material`.
    pub fn add_deficit_source(
        &mut self,
        name: &str,
        material: MaterialId,
        world: &World,
    ) -> HybridResult<DeficitSourceId> {
        let source = VolumeSource::new(name, material, world)?;
        log::info!("Added volume source '{name}'");
        self.deficit_sources.push(source);
        Ok(DeficitSourceId(self.deficit_sources.len() - 1))
    }

    pub fn deficit_source(&self, id: DeficitSourceId) -> &VolumeSource {
        &self.deficit_sources[id.0]
    }

    pub fn deficit_source_mut(&mut self, id: DeficitSourceId) -> &mut VolumeSource {
        &mut self.deficit_sources[id.0]
    }

    /// Make sure a re-emission buffer exists for a kinetic material.
    pub fn ensure_list_source(&mut self, material: MaterialId, world: &World) -> HybridResult<()> {
        if !self.list_sources.contains_key(&material) {
            let source = ParticleListSource::new(material, world)?;
            self.list_sources.insert(material, source);
        }
        Ok(())
    }

    pub fn list_source(&self, material: MaterialId) -> Option<&ParticleListSource> {
        self.list_sources.get(&material)
    }

    pub fn list_source_mut(&mut self, material: MaterialId) -> Option<&mut ParticleListSource> {
        self.list_sources.get_mut(&material)
    }

    pub fn start(&mut self, world: &World) -> HybridResult<()> {
        for source in self
            .boundary_sources
            .iter_mut()
            .chain(self.volume_sources.iter_mut())
        {
            source.start(world)?;
        }
        Ok(())
    }

    /// Regenerate and drain every active source. Order: boundary sources,
    /// surface re-emission buffers, volume sources, deficit sources.
    pub fn sample_sources(
        &mut self,
        world: &mut World,
        ctx: &StepContext,
        rng: &mut dyn RngCore,
    ) -> usize {
        let mut added = 0;
        for source in self.boundary_sources.iter_mut() {
            added += run_source(source.as_mut(), world, ctx, rng);
        }
        for source in self.list_sources.values_mut() {
            added += run_source(source, world, ctx, rng);
        }
        for source in self.volume_sources.iter_mut() {
            added += run_source(source.as_mut(), world, ctx, rng);
        }
        for source in self.deficit_sources.iter_mut() {
            added += run_source(source, world, ctx, rng);
        }
        log::debug!("it={} sources added {added} particles", ctx.it);
        added
    }

    /// Statistics of every named source.
    pub fn stats(&self) -> Vec<(&str, SourceStats)> {
        let boxed = self
            .boundary_sources
            .iter()
            .chain(self.volume_sources.iter())
            .map(|s| (s.name(), *s.stats()));
        let deficit = self.deficit_sources.iter().map(|s| (s.name(), *s.stats()));
        let list = self.list_sources.values().map(|s| (s.name(), *s.stats()));
        boxed.chain(deficit).chain(list).collect()
    }

    /// Cumulative mass injected by all sources (kg).
    pub fn total_mass_generated(&self) -> f64 {
        self.stats().iter().map(|(_, s)| s.mass_generated).sum()
    }
}

fn run_source(
    source: &mut dyn Source,
    world: &mut World,
    ctx: &StepContext,
    rng: &mut dyn RngCore,
) -> usize {
    if !source.window().contains(ctx.it) {
        return 0;
    }
    source.update(world, ctx);
    source.regenerate(world, ctx, rng);
    sample_all(source, world, rng)
}
