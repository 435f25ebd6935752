// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — MCC Collisions
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Monte Carlo collisions of kinetic particles with a background species
//! described by its density, temperature and mean velocity fields.

use crate::sigma::{reduced_mass, Sigma, SigmaRegistry};
use crate::volume::{CollisionSamples, VolumeInteraction};
use hybrid_core::source::SourceModule;
use hybrid_core::world::World;
use hybrid_math::sampling::{
    isotropic_direction, norm3, sample_maxwellian_3d, scale3, thermal_velocity,
};
use hybrid_types::config::MccConfig;
use hybrid_types::error::{HybridError, HybridResult};
use hybrid_types::state::{MaterialId, StepContext};
use rand::{Rng, RngCore};

/// Upper bound of the collision probability.
pub const MAX_PROBABILITY: f64 = 1.0 - f64::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MccModel {
    /// Momentum exchange: isotropic redirection at unchanged speed.
    Mex,
    /// Charge exchange: the particle takes the target velocity.
    Cex,
}

impl MccModel {
    pub fn parse(tag: &str) -> HybridResult<Self> {
        match tag.trim().to_uppercase().as_str() {
            "MEX" => Ok(MccModel::Mex),
            "CEX" => Ok(MccModel::Cex),
            _ => Err(HybridError::UnknownTag {
                kind: "MCC model",
                tag: tag.to_string(),
            }),
        }
    }
}

/// `P = 1 - exp(-σ g dt n)`, kept in `[0, 1)`.
pub fn collision_probability(sigma: f64, g: f64, dt: f64, density: f64) -> f64 {
    let x = sigma * g * dt * density;
    if !(x > 0.0) {
        return 0.0;
    }
    (-(-x).exp_m1()).min(MAX_PROBABILITY)
}

pub struct Mcc {
    name: String,
    source: MaterialId,
    target: MaterialId,
    product: Option<MaterialId>,
    sigma: Sigma,
    model: MccModel,
    frequency: usize,
    samples: CollisionSamples,
    collisions: usize,
}

impl Mcc {
    pub fn new(
        cfg: &MccConfig,
        sigmas: &SigmaRegistry,
        instance: usize,
        world: &World,
    ) -> HybridResult<Self> {
        cfg.validate()?;
        let model = MccModel::parse(&cfg.model)?;
        let source = world.materials.id(&cfg.source)?;
        let target = world.materials.id(&cfg.target)?;
        if source == target {
            return Err(HybridError::ConfigError(format!(
                "MCC source and target must differ, got '{}' twice",
                cfg.source
            )));
        }
        world.materials.get(source).require_kinetic()?;
        let product = cfg
            .product
            .as_deref()
            .map(|name| world.materials.id(name))
            .transpose()?;
        Ok(Mcc {
            name: format!("MCC {}-{}", cfg.source, cfg.target),
            source,
            target,
            product,
            sigma: sigmas.build(&cfg.sigma)?,
            model,
            frequency: cfg.frequency,
            samples: CollisionSamples::new("mcc", instance, world),
            collisions: 0,
        })
    }

    pub fn model(&self) -> MccModel {
        self.model
    }

    /// Configured product species. Only validated: MEX and CEX keep every
    /// colliding particle in the source material.
    pub fn product(&self) -> Option<MaterialId> {
        self.product
    }

    /// Collisions accepted by the last `perform`.
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    fn collide_mesh(&mut self, world: &mut World, mesh: usize, dt: f64, rng: &mut dyn RngCore) {
        let Some((src, tgt)) = world.materials.pair_mut(self.source, self.target) else {
            return;
        };
        let mr = reduced_mass(src.mass, tgt.mass);
        let tgt_mass = tgt.mass;
        let Some(parts) = src.particles_mut(mesh) else {
            return;
        };
        for part in parts.iter_mut() {
            let n = tgt.den.field(mesh).gather(part.lc);
            if !(n > 0.0) {
                continue;
            }
            let temp = tgt.temp.field(mesh).gather(part.lc);
            let v_th = thermal_velocity(temp, tgt_mass);
            let spread = sample_maxwellian_3d(v_th, rng);
            let mean = tgt.mean_velocity(mesh, part.lc);
            let target_vel = [mean[0] + spread[0], mean[1] + spread[1], mean[2] + spread[2]];
            let g = norm3([
                part.vel[0] - target_vel[0],
                part.vel[1] - target_vel[1],
                part.vel[2] - target_vel[2],
            ]);
            if g <= 0.0 {
                continue;
            }
            let p = collision_probability(self.sigma.eval(g, mr), g, dt, n);
            if rng.gen::<f64>() >= p {
                continue;
            }
            part.vel = match self.model {
                MccModel::Mex => scale3(isotropic_direction(rng), norm3(part.vel)),
                MccModel::Cex => target_vel,
            };
            self.samples.record(mesh, part.lc, part.mpw);
            self.collisions += 1;
        }
    }
}

impl VolumeInteraction for Mcc {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, world: &mut World, _sources: &mut SourceModule) -> HybridResult<()> {
        let src = world.materials.get(self.source);
        let tgt = world.materials.get(self.target);
        self.sigma.init(src, tgt)?;
        self.samples.register(world);
        Ok(())
    }

    fn perform(
        &mut self,
        world: &mut World,
        _sources: &mut SourceModule,
        ctx: &StepContext,
        rng: &mut dyn RngCore,
    ) {
        if ctx.it % self.frequency != 0 || world.materials.get(self.source).is_frozen() {
            return;
        }
        if self.samples.enter_steady_state(ctx) {
            self.clear_samples(world);
        }
        let dt = self.frequency as f64 * ctx.dt;
        self.collisions = 0;
        self.samples.num_samples += 1;
        for mesh in 0..world.domain.num_meshes() {
            self.collide_mesh(world, mesh, dt, rng);
        }
        self.samples.publish(world, dt);
        log::debug!("{}: {} collisions", self.name, self.collisions);
    }

    fn clear_samples(&mut self, _world: &mut World) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{plasma_world, seed, XE, XE_ION};
    use hybrid_types::config::SigmaConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mcc(world: &World, model: &str, sigma: f64) -> Mcc {
        let cfg = MccConfig {
            source: "Xe+".to_string(),
            target: "Xe".to_string(),
            product: None,
            model: model.to_string(),
            sigma: SigmaConfig::new("CONST", &[sigma]),
            frequency: 1,
        };
        Mcc::new(&cfg, &SigmaRegistry::new(), 0, world).unwrap()
    }

    /// Neutral background at rest: 1e20 m⁻³, 300 K.
    fn with_background(world: &mut World) {
        let xe = world.materials.get_mut(XE);
        xe.den.fill(1e20);
        xe.temp.fill(300.0);
    }

    #[test]
    fn test_probability_bounds() {
        assert_eq!(collision_probability(0.0, 1e3, 1e-6, 1e20), 0.0);
        assert_eq!(collision_probability(-1e-18, 1e3, 1e-6, 1e20), 0.0);
        assert_eq!(collision_probability(f64::NAN, 1e3, 1e-6, 1e20), 0.0);
        assert!(collision_probability(f64::INFINITY, 1e3, 1e-6, 1e20) < 1.0);
        assert!(collision_probability(1e-10, 1e6, 1.0, 1e30) < 1.0);
        let small = collision_probability(1e-19, 1e3, 1e-9, 1e18);
        assert!((small - 1e-7).abs() < 1e-13);
    }

    #[test]
    fn test_cex_hands_ions_the_neutral_velocity() {
        let mut world = plasma_world();
        with_background(&mut world);
        seed(&mut world, XE_ION, 500, [0.05, 0.05, 0.0], [2e4, 0.0, 0.0], 2.5e8);
        let mut sources = SourceModule::new();
        // σ g dt n ≈ 1e-15·2e4·1e-6·1e20 = 2000, collisions are certain
        let mut m = mcc(&world, "CEX", 1e-15);
        m.init(&mut world, &mut sources).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        m.perform(&mut world, &mut sources, &StepContext::new(1e-6), &mut rng);
        assert_eq!(m.collisions(), 500);
        let mean_vx: f64 = world
            .materials
            .get(XE_ION)
            .particles(0)
            .iter()
            .map(|p| p.vel[0])
            .sum::<f64>()
            / 500.0;
        assert!(mean_vx.abs() < 50.0, "mean vx = {mean_vx}");
        let count = world.fields.get("mcc-count").unwrap().sum();
        assert!((count - 500.0).abs() < 1e-6);
    }

    #[test]
    fn test_mex_preserves_speed() {
        let mut world = plasma_world();
        with_background(&mut world);
        seed(&mut world, XE_ION, 100, [0.05, 0.05, 0.0], [3e3, 4e3, 0.0], 2.5e8);
        let mut sources = SourceModule::new();
        let mut m = mcc(&world, "MEX", 1e-15);
        m.init(&mut world, &mut sources).unwrap();
        let mut rng = StdRng::seed_from_u64(22);
        m.perform(&mut world, &mut sources, &StepContext::new(1e-6), &mut rng);
        for p in world.materials.get(XE_ION).particles(0) {
            assert!((p.speed() - 5e3).abs() < 1e-6);
        }
    }

    #[test]
    fn test_empty_background_never_collides() {
        let mut world = plasma_world();
        seed(&mut world, XE_ION, 100, [0.05, 0.05, 0.0], [2e4, 0.0, 0.0], 2.5e8);
        let mut sources = SourceModule::new();
        let mut m = mcc(&world, "CEX", 1e-15);
        m.init(&mut world, &mut sources).unwrap();
        let mut rng = StdRng::seed_from_u64(23);
        m.perform(&mut world, &mut sources, &StepContext::new(1e-6), &mut rng);
        assert_eq!(m.collisions(), 0);
    }

    #[test]
    fn test_same_source_and_target_rejected() {
        let world = plasma_world();
        let cfg = MccConfig {
            source: "Xe".to_string(),
            target: "Xe".to_string(),
            product: None,
            model: "MEX".to_string(),
            sigma: SigmaConfig::new("CONST", &[1e-19]),
            frequency: 1,
        };
        match Mcc::new(&cfg, &SigmaRegistry::new(), 0, &world) {
            Err(HybridError::ConfigError(msg)) => assert!(msg.contains("must differ")),
            Err(other) => panic!("Unexpected error: {other:?}"),
            Ok(_) => panic!("expected a configuration error"),
        }
    }

    #[test]
    fn test_configured_product_keeps_source_species() {
        let mut world = plasma_world();
        with_background(&mut world);
        seed(&mut world, XE_ION, 50, [0.05, 0.05, 0.0], [2e4, 0.0, 0.0], 2.5e8);
        let cfg = MccConfig {
            source: "Xe+".to_string(),
            target: "Xe".to_string(),
            product: Some("Xe".to_string()),
            model: "CEX".to_string(),
            sigma: SigmaConfig::new("CONST", &[1e-15]),
            frequency: 1,
        };
        let mut m = Mcc::new(&cfg, &SigmaRegistry::new(), 0, &world).unwrap();
        assert_eq!(m.product(), Some(XE));
        let mut sources = SourceModule::new();
        m.init(&mut world, &mut sources).unwrap();
        let mut rng = StdRng::seed_from_u64(24);
        m.perform(&mut world, &mut sources, &StepContext::new(1e-6), &mut rng);
        assert_eq!(m.collisions(), 50);
        assert_eq!(world.materials.get(XE_ION).num_particles(), 50);
        assert_eq!(world.materials.get(XE).num_particles(), 0);
    }

    #[test]
    fn test_unknown_product_rejected() {
        let world = plasma_world();
        let cfg = MccConfig {
            source: "Xe+".to_string(),
            target: "Xe".to_string(),
            product: Some("Kr".to_string()),
            model: "CEX".to_string(),
            sigma: SigmaConfig::new("CONST", &[1e-19]),
            frequency: 1,
        };
        match Mcc::new(&cfg, &SigmaRegistry::new(), 0, &world) {
            Err(HybridError::UnknownMaterial(name)) => assert_eq!(name, "Kr"),
            Err(other) => panic!("Unexpected error: {other:?}"),
            Ok(_) => panic!("expected an unknown material"),
        }
    }
}
