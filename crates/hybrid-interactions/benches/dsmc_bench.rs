// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — DSMC Collision Benchmark
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use hybrid_core::material::Material;
use hybrid_core::source::SourceModule;
use hybrid_core::world::World;
use hybrid_interactions::dsmc::Dsmc;
use hybrid_interactions::sigma::SigmaRegistry;
use hybrid_interactions::volume::VolumeInteraction;
use hybrid_math::mesh::{Domain, UniformMesh};
use hybrid_math::sampling::sample_maxwellian_3d;
use hybrid_types::config::{DsmcConfig, SigmaConfig};
use hybrid_types::constants::K_BOLTZMANN;
use hybrid_types::state::{DomainType, Particle, StepContext};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

const XE_MASS: f64 = 2.18e-25;

/// Thermal xenon gas, `per_cell` macroparticles in each of `n×n` cells.
fn xenon_gas(n: usize, per_cell: usize) -> (World, Dsmc) {
    let mesh = UniformMesh::new(n + 1, n + 1, [0.0, 0.0], [0.1, 0.1], DomainType::Xy)
        .expect("valid mesh");
    let mut world = World::new(Domain::single(mesh));
    let xe = Material::new_kinetic("Xe", XE_MASS, 1e10, &world.domain)
        .expect("valid material")
        .with_collision_params(5.74e-10, 273.0, 0.85, 1.44);
    let id = world.add_material(xe).expect("unique material");

    let mut rng = StdRng::seed_from_u64(2024);
    let v_th = (2.0 * K_BOLTZMANN * 300.0 / XE_MASS).sqrt();
    let World {
        domain, materials, ..
    } = &mut world;
    let mat = materials.get_mut(id);
    for _ in 0..n * n * per_cell {
        let pos = [rng.gen::<f64>() * 0.1, rng.gen::<f64>() * 0.1, 0.0];
        let vel = sample_maxwellian_3d(v_th, &mut rng);
        mat.add_particle(domain, Particle::new(pos, vel, 1e10, XE_MASS));
    }

    let cfg = DsmcConfig {
        pair: ["Xe".to_string(), "Xe".to_string()],
        model: "ELASTIC".to_string(),
        sigma: SigmaConfig::new("BIRD463", &[]),
        frequency: 1,
    };
    let mut dsmc = Dsmc::new(&cfg, &SigmaRegistry::new(), 0, &world).expect("valid DSMC");
    dsmc.init(&mut world, &mut SourceModule::new())
        .expect("DSMC init should succeed");
    (world, dsmc)
}

fn bench_dsmc_collide(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsmc_collide");
    group.sample_size(20);

    for (n, per_cell) in [(16usize, 20usize), (32usize, 20usize)] {
        let (world, dsmc) = xenon_gas(n, per_cell);
        let ctx = StepContext::new(1e-6);
        group.bench_function(format!("{}x{}_{}ppc", n, n, per_cell), |b| {
            b.iter_batched(
                || (world.clone(), dsmc.clone(), StdRng::seed_from_u64(7)),
                |(mut w, mut d, mut rng)| {
                    d.perform(&mut w, &mut SourceModule::new(), &ctx, &mut rng);
                    black_box(d.collisions())
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dsmc_collide);
criterion_main!(benches);
