// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Property-Based Tests (proptest) for hybrid-interactions
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for hybrid-interactions using proptest.
//!
//! Covers: MCC probability bounds, NTC pair selection, elastic scatter
//! conservation, wall re-emission direction, chemistry positivity and
//! species-conversion weight bookkeeping.

use hybrid_core::material::Material;
use hybrid_core::source::SourceModule;
use hybrid_core::world::World;
use hybrid_interactions::chemistry::ChemicalReaction;
use hybrid_interactions::dsmc::{elastic_scatter, ntc_pair_count, NtcInput};
use hybrid_interactions::mcc::collision_probability;
use hybrid_interactions::sigma::SigmaRegistry;
use hybrid_interactions::surface::{ImpactOutcome, MaterialInteraction, SurfaceModel};
use hybrid_interactions::volume::VolumeInteraction;
use hybrid_math::boundary::{Boundary, Segment};
use hybrid_math::mesh::{Domain, UniformMesh};
use hybrid_math::sampling::dot3;
use hybrid_types::config::{ChemistryConfig, RateConfig, SurfaceImpactConfig};
use hybrid_types::state::{DomainType, Particle, StepContext};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const AR_MASS: f64 = 6.63e-26;
const SPWT: f64 = 1e9;

/// Box with kinetic Ar and Ar+, a solid wall and fluid O2/O.
fn world() -> World {
    let mesh = UniformMesh::new(9, 9, [0.0, 0.0], [0.08, 0.08], DomainType::Xy).unwrap();
    let mut world = World::new(Domain::single(mesh));
    let ar = Material::new_kinetic("Ar", AR_MASS, SPWT, &world.domain).unwrap();
    world.add_material(ar).unwrap();
    let ion = Material::new_kinetic("Ar+", AR_MASS, 4.0 * SPWT, &world.domain).unwrap();
    world.add_material(ion).unwrap();
    let wall = Material::new_solid("wall", 1e-25, &world.domain).unwrap();
    world.add_material(wall).unwrap();
    let o2 = Material::new_fluid("O2", 5.31e-26, &world.domain)
        .unwrap()
        .with_state(1e18, 500.0);
    world.add_material(o2).unwrap();
    let o = Material::new_fluid("O", 2.66e-26, &world.domain).unwrap();
    world.add_material(o).unwrap();
    world
}

fn surface_config(source: &str, product: &str, model: &str) -> SurfaceImpactConfig {
    SurfaceImpactConfig {
        source: source.to_string(),
        target: "wall".to_string(),
        product: Some(product.to_string()),
        model: model.to_string(),
        prob: 1.0,
        c_rest: 1.0,
        c_accom: 1.0,
    }
}

// ── Collision Probability ────────────────────────────────────────────

proptest! {
    /// Probabilities stay below one even for huge exponents.
    #[test]
    fn mcc_probability_in_unit_interval(
        log_sigma in -22.0f64..-12.0,
        g in 0.0f64..1e7,
        log_dt in -12.0f64..-3.0,
        log_n in 10.0f64..26.0,
    ) {
        let p = collision_probability(10f64.powf(log_sigma), g, 10f64.powf(log_dt), 10f64.powf(log_n));
        prop_assert!((0.0..1.0).contains(&p), "p = {p}");
    }

    /// Larger density never lowers the probability.
    #[test]
    fn mcc_probability_monotone_in_density(
        sigma in 1e-20f64..1e-18,
        g in 1.0f64..1e5,
        n in 1e14f64..1e20,
        factor in 1.0f64..10.0,
    ) {
        let lo = collision_probability(sigma, g, 1e-7, n);
        let hi = collision_probability(sigma, g, 1e-7, n * factor);
        prop_assert!(hi >= lo);
    }
}

// ── NTC Pair Selection ───────────────────────────────────────────────

proptest! {
    /// Same inputs give the same count; the remainder is a fraction
    /// unless the count was clipped to the number of distinct pairs.
    #[test]
    fn ntc_is_deterministic_with_fractional_remainder(
        n1 in 0usize..60,
        n2 in 0usize..60,
        w_ratio in 0.1f64..10.0,
        log_sig in -17.0f64..-12.0,
        rem in 0.0f64..1.0,
        same in any::<bool>(),
    ) {
        let input = NtcInput {
            n1,
            n2: if same { n1 } else { n2 },
            spwt1: 1e9,
            spwt2: 1e9 * w_ratio,
            volume: 1e-6,
            dt: 1e-6,
            sig_cr_max: 10f64.powf(log_sig),
            rem,
            same_species: same,
        };
        let a = ntc_pair_count(&input);
        let b = ntc_pair_count(&input);
        prop_assert_eq!(a, b);
        if a.capped {
            prop_assert_eq!(a.nsel, input.n1 * input.n2);
            prop_assert_eq!(a.rem, 0.0);
        } else {
            prop_assert!((0.0..1.0).contains(&a.rem) || (a.nsel == 0 && a.rem == rem));
        }
    }

    /// A lone particle never collides with itself.
    #[test]
    fn ntc_skips_single_particle_cells(rem in 0.0f64..1.0, log_sig in -16.0f64..-10.0) {
        let sel = ntc_pair_count(&NtcInput {
            n1: 1,
            n2: 1,
            spwt1: 1e9,
            spwt2: 1e9,
            volume: 1e-6,
            dt: 1e-5,
            sig_cr_max: 10f64.powf(log_sig),
            rem,
            same_species: true,
        });
        prop_assert_eq!(sel.nsel, 0);
        prop_assert_eq!(sel.rem, rem);
    }
}

// ── Elastic Scatter ──────────────────────────────────────────────────

proptest! {
    /// Equal-weight scattering conserves momentum and kinetic energy.
    #[test]
    fn elastic_scatter_conserves_momentum_and_energy(
        va in prop::array::uniform3(-2000.0f64..2000.0),
        vb in prop::array::uniform3(-2000.0f64..2000.0),
        mass_ratio in 0.05f64..20.0,
        vss_inv in 0.5f64..1.0,
        seed in 0u64..1000,
    ) {
        let mut a = Particle::new([0.0; 3], va, SPWT, AR_MASS);
        let mut b = Particle::new([0.0; 3], vb, SPWT, AR_MASS * mass_ratio);
        let mut rng = StdRng::seed_from_u64(seed);
        let (p0, e0) = (
            [0, 1, 2].map(|d| a.momentum()[d] + b.momentum()[d]),
            a.kinetic_energy_j() + b.kinetic_energy_j(),
        );
        elastic_scatter(&mut a, &mut b, vss_inv, &mut rng);
        let p_scale = SPWT * AR_MASS * 4000.0 * (1.0 + mass_ratio);
        for d in 0..3 {
            prop_assert!((a.momentum()[d] + b.momentum()[d] - p0[d]).abs() < 1e-9 * p_scale);
        }
        let e1 = a.kinetic_energy_j() + b.kinetic_energy_j();
        prop_assert!((e1 - e0).abs() <= 1e-9 * e0.max(1e-30));
    }
}

// ── Surface Re-emission ──────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Diffuse and cosine re-emission always leave the wall into the gas,
    /// whatever the wall orientation.
    #[test]
    fn reemission_points_into_gas(
        angle in 0.0f64..std::f64::consts::TAU,
        cosine in any::<bool>(),
        seed in 0u64..1000,
    ) {
        let w = world();
        let (c, s) = (angle.cos(), angle.sin());
        let wall = Boundary::new(
            "wall",
            &[[0.04 - 0.02 * c, 0.04 - 0.02 * s], [0.04 + 0.02 * c, 0.04 + 0.02 * s]],
            400.0,
            DomainType::Xy,
        ).unwrap();
        let model = if cosine { SurfaceModel::Cosine } else { SurfaceModel::Diffuse };
        let mi = MaterialInteraction::new(&surface_config("Ar", "Ar", "DIFFUSE"), model, &w).unwrap();
        let mut sources = SourceModule::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = wall.normal(0.5);
        for _ in 0..20 {
            let mut part = Particle::new([0.04, 0.04, 0.0], [-normal[0] * 500.0, -normal[1] * 500.0, 0.0], SPWT, AR_MASS);
            let outcome = mi.perform(&mut part, &wall, 0.5, &w.materials, &mut sources, &mut rng);
            if outcome == ImpactOutcome::Kept {
                prop_assert!(dot3(part.vel, normal) >= 0.0);
            }
        }
    }

    /// Converting an ion of weight w into neutrals of weight w0 queues
    /// floor(w/w0) or ceil(w/w0) particles.
    #[test]
    fn species_conversion_respects_weight_ratio(
        ratio in 0.2f64..12.0,
        seed in 0u64..1000,
    ) {
        let w = world();
        let wall = Boundary::new("wall", &[[0.08, 0.0], [0.08, 0.08]], 300.0, DomainType::Xy).unwrap();
        let mi = MaterialInteraction::new(&surface_config("Ar+", "Ar", "COSINE"), SurfaceModel::Cosine, &w).unwrap();
        let mut sources = SourceModule::new();
        mi.init(&w, &mut sources).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut ion = Particle::new([0.08, 0.04, 0.0], [300.0, 0.0, 0.0], ratio * SPWT, AR_MASS);
        let outcome = mi.perform(&mut ion, &wall, 0.5, &w.materials, &mut sources, &mut rng);
        prop_assert_eq!(outcome, ImpactOutcome::Removed);
        let ar = w.materials.id("Ar").unwrap();
        let queued = sources.list_source(ar).unwrap().len();
        prop_assert!(queued == ratio.floor() as usize || queued == ratio.ceil() as usize,
            "ratio {ratio}, queued {queued}");
    }
}

// ── Chemistry ────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Fluid reactants never go negative, however stiff the rate.
    #[test]
    fn fluid_chemistry_keeps_densities_non_negative(
        log_k in -2.0f64..14.0,
        log_dt in -9.0f64..-2.0,
    ) {
        let mut w = world();
        let mut sources = SourceModule::new();
        let cfg = ChemistryConfig {
            name: None,
            sources: vec!["O2".to_string()],
            products: vec!["2*O".to_string()],
            rate: Some(RateConfig {
                model: "CONST".to_string(),
                coeffs: vec![10f64.powf(log_k)],
                tabulated: Vec::new(),
                dep_var: "t.O2".to_string(),
                is_sigma: false,
                input_wrappers: Vec::new(),
                output_wrappers: Vec::new(),
                multiplier: None,
            }),
            energy_release: 0.0,
        };
        let mut cr = ChemicalReaction::new(&cfg, &SigmaRegistry::new(), &w).unwrap();
        cr.init(&mut w, &mut sources).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let ctx = StepContext::new(10f64.powf(log_dt));
        for _ in 0..3 {
            cr.perform(&mut w, &mut sources, &ctx, &mut rng);
        }
        let o2 = w.materials.by_name("O2").unwrap();
        for field in o2.den.fields() {
            prop_assert!(field.data().iter().all(|v| *v >= 0.0 && v.is_finite()));
        }
    }
}
