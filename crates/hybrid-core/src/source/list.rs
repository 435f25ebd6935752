// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Particle List Source
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Buffer of particles re-emitted by surface interactions.

use super::{Source, SourceStats};
use crate::world::World;
use hybrid_types::error::HybridResult;
use hybrid_types::state::{MaterialId, Particle, StepContext};
use rand::{Rng, RngCore};

/// LIFO buffer feeding a kinetic material; never creates particles itself.
#[derive(Debug, Clone)]
pub struct ParticleListSource {
    name: String,
    material: MaterialId,
    mass: f64,
    spwt0: f64,
    particles: Vec<Particle>,
    stats: SourceStats,
}

impl ParticleListSource {
    pub fn new(material: MaterialId, world: &World) -> HybridResult<Self> {
        let mat = world.materials.get(material);
        let spwt0 = mat.require_kinetic()?.spwt0;
        Ok(ParticleListSource {
            name: format!("{}-surface", mat.name),
            material,
            mass: mat.mass,
            spwt0,
            particles: Vec::new(),
            stats: SourceStats::default(),
        })
    }

    pub fn spwt0(&self) -> f64 {
        self.spwt0
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn push(&mut self, part: Particle) {
        self.particles.push(part);
    }

    /// Queue `floor(spwt_origin/spwt0 + U)` product particles at `pos`, so
    /// the physical particle count is preserved on average. `velocity` is
    /// drawn once per queued particle. Returns the number queued.
    pub fn spawn<F>(
        &mut self,
        pos: [f64; 3],
        spwt_origin: f64,
        rng: &mut dyn RngCore,
        mut velocity: F,
    ) -> usize
    where
        F: FnMut(&mut dyn RngCore) -> [f64; 3],
    {
        let count = (spwt_origin / self.spwt0 + rng.gen::<f64>()).floor() as usize;
        for _ in 0..count {
            let vel = velocity(&mut *rng);
            self.particles
                .push(Particle::new(pos, vel, self.spwt0, self.mass));
        }
        count
    }
}

impl Source for ParticleListSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn material(&self) -> MaterialId {
        self.material
    }

    fn regenerate(&mut self, _world: &World, _ctx: &StepContext, _rng: &mut dyn RngCore) {}

    fn has_particles(&self) -> bool {
        !self.particles.is_empty()
    }

    fn sample_particle(&mut self, _world: &World, _rng: &mut dyn RngCore) -> Option<Particle> {
        self.particles.pop()
    }

    fn stats(&self) -> &SourceStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut SourceStats {
        &mut self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::sample_all;
    use crate::source::tests::box_world;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_spawn_count_matches_weight_ratio_on_average() {
        let world = box_world();
        let mut src = ParticleListSource::new(MaterialId(0), &world).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        let trials = 20_000;
        let mut total = 0;
        for _ in 0..trials {
            // origin weight 2.5e8 into 1e8 product weight
            total += src.spawn([0.05, 0.05, 0.0], 2.5e8, &mut rng, |_| [1.0, 0.0, 0.0]);
        }
        let mean = total as f64 / trials as f64;
        assert!((mean - 2.5).abs() < 0.02, "mean count = {mean}");
        assert_eq!(src.len(), total);
    }

    #[test]
    fn test_drains_into_material_and_is_lifo() {
        let mut world = box_world();
        let mut src = ParticleListSource::new(MaterialId(0), &world).unwrap();
        src.push(Particle::new([0.01, 0.01, 0.0], [1.0, 0.0, 0.0], 1e8, 2.18e-25));
        src.push(Particle::new([0.02, 0.02, 0.0], [2.0, 0.0, 0.0], 1e8, 2.18e-25));
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(src.sample_particle(&world, &mut rng).unwrap().vel[0], 2.0);
        let added = sample_all(&mut src, &mut world, &mut rng);
        assert_eq!(added, 1);
        assert!(src.is_empty());
        assert_eq!(world.materials.get(MaterialId(0)).particles(0)[0].vel[0], 1.0);
    }

    #[test]
    fn test_fluid_product_rejected() {
        let world = box_world();
        assert!(ParticleListSource::new(MaterialId(1), &world).is_err());
    }
}
