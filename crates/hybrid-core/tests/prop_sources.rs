// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Property-Based Tests (proptest) for hybrid-core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for hybrid-core sources using proptest.
//!
//! Covers: mass-flow conservation of boundary sources, deficit tracking of
//! volume sources, weight-ratio rounding of re-emission buffers.

use hybrid_core::material::Material;
use hybrid_core::source::boundary::{BeamEmission, BeamSource};
use hybrid_core::source::list::ParticleListSource;
use hybrid_core::source::volume::VolumeSource;
use hybrid_core::source::{sample_all, MacroparticleQuota, Source};
use hybrid_core::world::World;
use hybrid_math::boundary::Boundary;
use hybrid_math::mesh::{Domain, UniformMesh};
use hybrid_types::config::{ActivityWindow, BeamSourceConfig};
use hybrid_types::state::{DomainType, MaterialId, StepContext};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const MASS: f64 = 6.63e-26;

fn world(spwt0: f64) -> World {
    let mesh = UniformMesh::new(9, 9, [0.0, 0.0], [0.08, 0.08], DomainType::Xy).unwrap();
    let mut world = World::new(Domain::single(mesh));
    let ar = Material::new_kinetic("Ar", MASS, spwt0, &world.domain).unwrap();
    world.add_material(ar).unwrap();
    let inlet = Boundary::new("left", &[[0.0, 0.08], [0.0, 0.0]], 300.0, DomainType::Xy).unwrap();
    world.add_boundary(inlet);
    world
}

// ── Quota Properties ─────────────────────────────────────────────────

proptest! {
    /// Macroparticles handed out never drift from ∫mdot dt by a full
    /// macroparticle, whatever the timestep.
    #[test]
    fn quota_tracks_mass_flow(
        rate in 0.01f64..50.0,
        dt in 1e-9f64..1e-5,
        steps in 1usize..400,
    ) {
        let spwt = 1e10;
        let mdot = rate * MASS * spwt / dt;
        let mut q = MacroparticleQuota::default();
        let mut issued = 0usize;
        for _ in 0..steps {
            q.regenerate(mdot, dt, MASS, spwt);
            issued += q.num_mp;
        }
        let expected = mdot * dt * steps as f64 / (MASS * spwt);
        let err = expected - issued as f64;
        prop_assert!(err > -1e-6 && err < 1.0 + 1e-6,
            "expected {expected}, issued {issued}");
        prop_assert!(q.mp_rem >= 0.0 && q.mp_rem < 1.0);
    }
}

// ── Boundary Source Properties ───────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Mass injected by a beam converges to mdot·T within one macroparticle.
    #[test]
    fn beam_injects_requested_mass(
        per_step in 0.1f64..20.0,
        steps in 1usize..30,
        seed in 0u64..1000,
    ) {
        let spwt0 = 1e9;
        let dt = 1e-7;
        let mut w = world(spwt0);
        let mdot = per_step * spwt0 * MASS / dt;
        let cfg = BeamSourceConfig {
            name: "beam".to_string(),
            material: "Ar".to_string(),
            boundary: "left".to_string(),
            mdot,
            v_drift: 400.0,
            window: ActivityWindow::default(),
        };
        let mut src = BeamSource::new(&cfg, BeamEmission::Normal, &w).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut ctx = StepContext::new(dt);
        for _ in 0..steps {
            src.regenerate(&w, &ctx, &mut rng);
            sample_all(&mut src, &mut w, &mut rng);
            ctx.advance();
        }
        let target = mdot * dt * steps as f64;
        let injected = src.stats().mass_generated;
        let one = spwt0 * MASS;
        prop_assert!((target - injected) > -1e-9 * one && (target - injected) < one * (1.0 + 1e-9),
            "target {target}, injected {injected}");
    }
}

// ── Volume Source Properties ─────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Injected plus still-owed weight equals the requested density times
    /// volume, and no cell ever owes or overshoots a full macroparticle.
    #[test]
    fn deficit_source_conserves_request(
        den in 0.0f64..5e13,
        seed in 0u64..1000,
    ) {
        let spwt0 = 1e9;
        let mut w = world(spwt0);
        let mut src = VolumeSource::new("cr:prop", MaterialId(0), &w).unwrap();
        src.dn_mut().fill(den);
        src.temperature_mut().fill(300.0);
        let mut rng = StdRng::seed_from_u64(seed);
        src.regenerate(&w, &StepContext::new(1e-7), &mut rng);
        let added = sample_all(&mut src, &mut w, &mut rng);
        let requested = den * 0.08 * 0.08;
        let mut owed = 0.0;
        for i in 0..8 {
            for j in 0..8 {
                let d = src.deficit(0, i, j);
                prop_assert!(d > -spwt0 && d < spwt0);
                owed += d;
            }
        }
        let injected = added as f64 * spwt0;
        prop_assert!((injected + owed - requested).abs() <= 1e-9 * requested.max(spwt0));
    }

    /// Re-emission buffers round weight ratios to neighbouring integers.
    #[test]
    fn list_spawn_rounds_to_neighbours(
        ratio in 0.0f64..20.0,
        seed in 0u64..1000,
    ) {
        let spwt0 = 1e9;
        let w = world(spwt0);
        let mut src = ParticleListSource::new(MaterialId(0), &w).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let n = src.spawn([0.01, 0.01, 0.0], ratio * spwt0, &mut rng, |_| [0.0; 3]);
        prop_assert!(n as f64 >= ratio.floor() && n as f64 <= ratio.floor() + 1.0);
    }
}
