// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Surface Interactions
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Particle-wall impact handlers.
//!
//! A handler resolves one boundary crossing into absorption, reflection or
//! re-emission as a different species. Species changes go through the
//! product's `ParticleListSource`; the incident particle is then removed.

use hybrid_core::material::Materials;
use hybrid_core::source::SourceModule;
use hybrid_core::world::World;
use hybrid_math::boundary::{Boundary, Segment};
use hybrid_math::sampling::{
    half_space_direction, lambertian_direction, norm3, reflect_specular,
    sample_maxwellian_speed, scale3,
};
use hybrid_types::config::SurfaceImpactConfig;
use hybrid_types::error::HybridResult;
use hybrid_types::state::{MaterialId, Particle};
use rand::{Rng, RngCore};

/// Post-impact speeds below this stick to the wall (m/s).
pub const STICK_SPEED: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceModel {
    /// Pass through unchanged.
    None,
    Absorb,
    Specular,
    /// Uniform over the inward half space.
    Diffuse,
    /// Lambertian about the wall normal.
    Cosine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactOutcome {
    Kept,
    Removed,
}

/// Surface reaction of `source` particles on `target` walls.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialInteraction {
    pub source: MaterialId,
    pub target: MaterialId,
    pub product: MaterialId,
    pub prob: f64,
    pub c_rest: f64,
    pub c_accom: f64,
    pub model: SurfaceModel,
}

impl MaterialInteraction {
    pub fn new(cfg: &SurfaceImpactConfig, model: SurfaceModel, world: &World) -> HybridResult<Self> {
        cfg.validate()?;
        let materials = &world.materials;
        let source = materials.id(&cfg.source)?;
        let target = materials.id(&cfg.target)?;
        let product = match &cfg.product {
            Some(name) => materials.id(name)?,
            None => source,
        };
        materials.get(source).require_kinetic()?;
        if product != source {
            materials.get(product).require_kinetic()?;
        }
        Ok(MaterialInteraction {
            source,
            target,
            product,
            prob: cfg.prob,
            c_rest: cfg.c_rest,
            c_accom: cfg.c_accom,
            model,
        })
    }

    pub fn converts_species(&self) -> bool {
        self.product != self.source
    }

    /// Create the product's re-emission buffer when species change.
    pub fn init(&self, world: &World, sources: &mut SourceModule) -> HybridResult<()> {
        if self.converts_species() {
            sources.ensure_list_source(self.product, world)?;
        }
        Ok(())
    }

    /// Resolve the impact of `part` at parameter `t` along `boundary`.
    ///
    /// A species-converting interaction whose `init` never ran has no
    /// buffer to queue products in: the incident particle is removed and
    /// its mass is lost with a warning.
    pub fn perform(
        &self,
        part: &mut Particle,
        boundary: &Boundary,
        t: f64,
        materials: &Materials,
        sources: &mut SourceModule,
        rng: &mut dyn RngCore,
    ) -> ImpactOutcome {
        match self.model {
            SurfaceModel::None => ImpactOutcome::Kept,
            SurfaceModel::Absorb => ImpactOutcome::Removed,
            SurfaceModel::Specular => {
                part.vel = reflect_specular(part.vel, boundary.normal(t));
                ImpactOutcome::Kept
            }
            SurfaceModel::Diffuse | SurfaceModel::Cosine => {
                self.reemit(part, boundary, t, materials, sources, rng)
            }
        }
    }

    fn reemit(
        &self,
        part: &mut Particle,
        boundary: &Boundary,
        t: f64,
        materials: &Materials,
        sources: &mut SourceModule,
        rng: &mut dyn RngCore,
    ) -> ImpactOutcome {
        let normal = boundary.normal(t);
        let tangent = boundary.tangent(t);
        let v_th = boundary.vth(materials.get(self.product).mass);
        let v_refl = norm3(part.vel) * self.c_rest;
        let (c_accom, model) = (self.c_accom, self.model);
        let draw = move |rng: &mut dyn RngCore| -> [f64; 3] {
            let v_diff = sample_maxwellian_speed(v_th, rng);
            let speed = v_refl + c_accom * (v_diff - v_refl);
            let dir = match model {
                SurfaceModel::Cosine => lambertian_direction(normal, tangent, rng),
                _ => half_space_direction(normal, rng),
            };
            scale3(dir, speed)
        };

        if self.converts_species() {
            match sources.list_source_mut(self.product) {
                Some(list) => {
                    list.spawn(part.pos, part.mpw, rng, draw);
                }
                None => log::warn!(
                    "No re-emission buffer for material {}, {:.3e} kg dropped",
                    materials.get(self.product).name,
                    part.mpw * part.mass
                ),
            }
            return ImpactOutcome::Removed;
        }

        let vel = draw(rng);
        if norm3(vel) < STICK_SPEED {
            return ImpactOutcome::Removed;
        }
        part.vel = vel;
        ImpactOutcome::Kept
    }
}

/// All surface reactions, selected per (source, target) pair.
#[derive(Debug, Clone, Default)]
pub struct SurfaceInteractions {
    list: Vec<MaterialInteraction>,
}

impl SurfaceInteractions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, interaction: MaterialInteraction) {
        self.list.push(interaction);
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MaterialInteraction> {
        self.list.iter()
    }

    pub fn for_pair(
        &self,
        source: MaterialId,
        target: MaterialId,
    ) -> impl Iterator<Item = &MaterialInteraction> {
        self.list
            .iter()
            .filter(move |mi| mi.source == source && mi.target == target)
    }

    /// Draw one reaction by cumulative probability; `None` means absorb.
    pub fn select(
        &self,
        source: MaterialId,
        target: MaterialId,
        rng: &mut dyn RngCore,
    ) -> Option<&MaterialInteraction> {
        let u = rng.gen::<f64>();
        let mut cumulative = 0.0;
        for mi in self.for_pair(source, target) {
            cumulative += mi.prob;
            if u < cumulative {
                return Some(mi);
            }
        }
        None
    }

    /// Select and perform; unmatched impacts absorb the particle.
    #[allow(clippy::too_many_arguments)]
    pub fn impact(
        &self,
        part: &mut Particle,
        source: MaterialId,
        target: MaterialId,
        boundary: &Boundary,
        t: f64,
        materials: &Materials,
        sources: &mut SourceModule,
        rng: &mut dyn RngCore,
    ) -> ImpactOutcome {
        match self.select(source, target, rng) {
            Some(mi) => mi.perform(part, boundary, t, materials, sources, rng),
            None => ImpactOutcome::Removed,
        }
    }
}
