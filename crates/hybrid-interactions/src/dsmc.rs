// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — DSMC Collisions
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Direct Simulation Monte Carlo between two kinetic species.
//!
//! Pairs are selected per cell with Bird's No-Time-Counter estimator and
//! Boyd's correction for unequal macroparticle weights. Accepted pairs
//! scatter elastically with VHS or VSS deflection.

use crate::sigma::{reduced_mass, Sigma, SigmaRegistry};
use crate::volume::{publish, CollisionSamples, VolumeInteraction};
use hybrid_core::source::SourceModule;
use hybrid_core::world::World;
use hybrid_math::sampling::norm3;
use hybrid_types::config::DsmcConfig;
use hybrid_types::error::{HybridError, HybridResult};
use hybrid_types::state::{MaterialId, Particle, StepContext};
use ndarray::Array2;
use rand::{Rng, RngCore};
use std::f64::consts::PI;

/// Starting `(σ·g)max` of every cell (m³/s).
pub const INITIAL_SIG_CR_MAX: f64 = 1e-16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DsmcModel {
    Elastic,
}

impl DsmcModel {
    pub fn parse(tag: &str) -> HybridResult<Self> {
        match tag.trim().to_uppercase().as_str() {
            "ELASTIC" => Ok(DsmcModel::Elastic),
            _ => Err(HybridError::UnknownTag {
                kind: "DSMC model",
                tag: tag.to_string(),
            }),
        }
    }
}

/// Collision state of one cell. Candidate lists are rebuilt every call;
/// `sig_cr_max` and `rem` persist across timesteps.
#[derive(Debug, Clone, PartialEq)]
pub struct CellInfo {
    pub sp1: Vec<usize>,
    pub sp2: Vec<usize>,
    pub sig_cr_max: f64,
    /// Largest σ·g seen since the last sample reset.
    pub observed_max: f64,
    pub rem: f64,
    pub volume: f64,
}

impl CellInfo {
    fn new(volume: f64) -> Self {
        CellInfo {
            sp1: Vec::new(),
            sp2: Vec::new(),
            sig_cr_max: INITIAL_SIG_CR_MAX,
            observed_max: 0.0,
            rem: 0.0,
            volume,
        }
    }
}

/// Inputs of the NTC estimator for one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NtcInput {
    pub n1: usize,
    pub n2: usize,
    pub spwt1: f64,
    pub spwt2: f64,
    pub volume: f64,
    pub dt: f64,
    pub sig_cr_max: f64,
    pub rem: f64,
    pub same_species: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairSelection {
    pub nsel: usize,
    /// Fractional pair carried to the next call.
    pub rem: f64,
    /// `nsel` exceeded `n1·n2` and was clipped.
    pub capped: bool,
}

/// Number of candidate pairs to test in a cell.
///
/// `nsel = floor(rem + (n1·w1/V)·n2·dt·(σg)max / (Pab + (w2/w1)·Pba))`,
/// doubled for unlike species. Cells without enough particles select
/// nothing and keep their remainder.
pub fn ntc_pair_count(input: &NtcInput) -> PairSelection {
    let enough = if input.same_species {
        input.n1 >= 2
    } else {
        input.n1 >= 1 && input.n2 >= 1
    };
    if !enough || !(input.volume > 0.0) {
        return PairSelection {
            nsel: 0,
            rem: input.rem,
            capped: false,
        };
    }
    let ratio = input.spwt2 / input.spwt1;
    let p_ab = ratio.min(1.0);
    let p_ba = (input.spwt1 / input.spwt2).min(1.0);
    let mut expected = (input.n1 as f64 * input.spwt1 / input.volume)
        * input.n2 as f64
        * input.dt
        * input.sig_cr_max
        / (p_ab + ratio * p_ba);
    if !input.same_species {
        expected *= 2.0;
    }
    let total = expected + input.rem;
    if !total.is_finite() || total < 0.0 {
        return PairSelection {
            nsel: 0,
            rem: 0.0,
            capped: false,
        };
    }
    let nsel = total.floor();
    let max_pairs = (input.n1 * input.n2) as f64;
    if nsel > max_pairs {
        return PairSelection {
            nsel: input.n1 * input.n2,
            rem: 0.0,
            capped: true,
        };
    }
    PairSelection {
        nsel: nsel as usize,
        rem: total - nsel,
        capped: false,
    }
}

/// Post-collision relative velocity for isotropic (VHS) scattering.
fn vhs_deflection(g: f64, rng: &mut dyn RngCore) -> [f64; 3] {
    let cos_chi = 2.0 * rng.gen::<f64>() - 1.0;
    let sin_chi = (1.0 - cos_chi * cos_chi).max(0.0).sqrt();
    let eps = 2.0 * PI * rng.gen::<f64>();
    [
        cos_chi * g,
        sin_chi * eps.cos() * g,
        sin_chi * eps.sin() * g,
    ]
}

/// VSS deflection of `vr` about its own direction, Bird eq. 2.22.
fn vss_deflection(vr: [f64; 3], g: f64, vss_inv: f64, rng: &mut dyn RngCore) -> [f64; 3] {
    let cos_chi = 2.0 * rng.gen::<f64>().powf(vss_inv) - 1.0;
    let sin_chi = (1.0 - cos_chi * cos_chi).max(0.0).sqrt();
    let eps = 2.0 * PI * rng.gen::<f64>();
    let (cos_eps, sin_eps) = (eps.cos(), eps.sin());
    let d = (vr[1] * vr[1] + vr[2] * vr[2]).sqrt();
    if d > 1e-6 {
        [
            cos_chi * vr[0] + sin_chi * sin_eps * d,
            cos_chi * vr[1] + sin_chi * (g * vr[2] * cos_eps - vr[0] * vr[1] * sin_eps) / d,
            cos_chi * vr[2] - sin_chi * (g * vr[1] * cos_eps + vr[0] * vr[2] * sin_eps) / d,
        ]
    } else {
        [
            cos_chi * vr[0],
            sin_chi * cos_eps * g,
            sin_chi * sin_eps * g,
        ]
    }
}

/// Elastic scatter about the centre of mass.
///
/// `vss_inv` is the pair-averaged `1/α`; values near 1 use isotropic
/// deflection. With unequal weights each particle is updated with
/// probability `min(1, w_other/w_self)`.
pub fn elastic_scatter(a: &mut Particle, b: &mut Particle, vss_inv: f64, rng: &mut dyn RngCore) {
    let total = a.mass + b.mass;
    let (rm1, rm2) = (a.mass / total, b.mass / total);
    let mut vcm = [0.0; 3];
    let mut vr = [0.0; 3];
    for d in 0..3 {
        vcm[d] = rm1 * a.vel[d] + rm2 * b.vel[d];
        vr[d] = a.vel[d] - b.vel[d];
    }
    let g = norm3(vr);
    let vr_post = if (vss_inv - 1.0).abs() < 1e-3 {
        vhs_deflection(g, rng)
    } else {
        vss_deflection(vr, g, vss_inv, rng)
    };

    let (update_a, update_b) = if a.mpw == b.mpw {
        (true, true)
    } else {
        (
            rng.gen::<f64>() < b.mpw / a.mpw,
            rng.gen::<f64>() < a.mpw / b.mpw,
        )
    };
    if update_a {
        for d in 0..3 {
            a.vel[d] = vcm[d] + rm2 * vr_post[d];
        }
    }
    if update_b {
        for d in 0..3 {
            b.vel[d] = vcm[d] - rm1 * vr_post[d];
        }
    }
}

/// Test one candidate pair; scatters and returns true when accepted.
fn try_collide(
    a: &mut Particle,
    b: &mut Particle,
    cell: &mut CellInfo,
    sigma: &Sigma,
    vss_inv: f64,
    rng: &mut dyn RngCore,
) -> bool {
    let vr = [a.vel[0] - b.vel[0], a.vel[1] - b.vel[1], a.vel[2] - b.vel[2]];
    let g = norm3(vr);
    if g <= 0.0 {
        return false;
    }
    let sigma_cr = sigma.eval(g, reduced_mass(a.mass, b.mass)) * g;
    let p = sigma_cr / cell.sig_cr_max;
    cell.sig_cr_max = cell.sig_cr_max.max(sigma_cr);
    cell.observed_max = cell.observed_max.max(sigma_cr);
    if !(p > 0.0) || rng.gen::<f64>() >= p {
        return false;
    }
    elastic_scatter(a, b, vss_inv, rng);
    true
}

fn two_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    if a < b {
        let (lo, hi) = items.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}

fn midpoint(a: &Particle, b: &Particle) -> [f64; 2] {
    [0.5 * (a.lc[0] + b.lc[0]), 0.5 * (a.lc[1] + b.lc[1])]
}

/// Bin particle indices by owning cell; particles on the last node line
/// have no cell and are skipped.
fn sort_into_cells(parts: &[Particle], cells: &mut Array2<CellInfo>, second: bool) {
    let (nci, ncj) = cells.dim();
    for (k, p) in parts.iter().enumerate() {
        if !(p.lc[0] >= 0.0 && p.lc[1] >= 0.0) {
            continue;
        }
        let (i, j) = (p.lc[0] as usize, p.lc[1] as usize);
        if i >= nci || j >= ncj {
            continue;
        }
        let cell = &mut cells[[i, j]];
        if second {
            cell.sp2.push(k);
        } else {
            cell.sp1.push(k);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dsmc {
    name: String,
    mat1: MaterialId,
    mat2: MaterialId,
    sigma: Sigma,
    model: DsmcModel,
    frequency: usize,
    vss_inv: f64,
    cells: Vec<Array2<CellInfo>>,
    samples: CollisionSamples,
    count_sum_name: String,
    real_sum_name: String,
    collisions: usize,
}

impl Dsmc {
    pub fn new(
        cfg: &DsmcConfig,
        sigmas: &SigmaRegistry,
        instance: usize,
        world: &World,
    ) -> HybridResult<Self> {
        cfg.validate()?;
        let model = DsmcModel::parse(&cfg.model)?;
        let mat1 = world.materials.id(&cfg.pair[0])?;
        let mat2 = world.materials.id(&cfg.pair[1])?;
        world.materials.get(mat1).require_kinetic()?;
        world.materials.get(mat2).require_kinetic()?;
        let suffix = crate::volume::instance_suffix(instance);
        Ok(Dsmc {
            name: format!("DSMC {}-{}", cfg.pair[0], cfg.pair[1]),
            mat1,
            mat2,
            sigma: sigmas.build(&cfg.sigma)?,
            model,
            frequency: cfg.frequency,
            vss_inv: 1.0,
            cells: Vec::new(),
            samples: CollisionSamples::new("dsmc", instance, world),
            count_sum_name: format!("dsmc-count-sum{suffix}"),
            real_sum_name: format!("dsmc-real-sum{suffix}"),
            collisions: 0,
        })
    }

    pub fn model(&self) -> DsmcModel {
        self.model
    }

    pub fn cells(&self, mesh: usize) -> &Array2<CellInfo> {
        &self.cells[mesh]
    }

    pub fn cells_mut(&mut self, mesh: usize) -> &mut Array2<CellInfo> {
        &mut self.cells[mesh]
    }

    /// Collisions accepted by the last `perform`.
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    pub fn count_name(&self) -> &str {
        &self.samples.count_name
    }

    pub fn nu_name(&self) -> &str {
        &self.samples.nu_name
    }

    fn collide_mesh(&mut self, world: &mut World, mesh: usize, dt: f64, rng: &mut dyn RngCore) {
        let same = self.mat1 == self.mat2;
        let materials = &mut world.materials;
        let (Some(spwt1), Some(spwt2)) = (
            materials.get(self.mat1).spwt0(),
            materials.get(self.mat2).spwt0(),
        ) else {
            return;
        };

        let cells = &mut self.cells[mesh];
        for cell in cells.iter_mut() {
            cell.sp1.clear();
            cell.sp2.clear();
        }
        sort_into_cells(materials.get(self.mat1).particles(mesh), cells, false);
        if !same {
            sort_into_cells(materials.get(self.mat2).particles(mesh), cells, true);
        }

        for cell in cells.iter_mut() {
            let n1 = cell.sp1.len();
            let n2 = if same { n1 } else { cell.sp2.len() };
            let selection = ntc_pair_count(&NtcInput {
                n1,
                n2,
                spwt1,
                spwt2,
                volume: cell.volume,
                dt,
                sig_cr_max: cell.sig_cr_max,
                rem: cell.rem,
                same_species: same,
            });
            if selection.capped {
                log::warn!(
                    "{}: more collision pairs requested than {}x{} particles allow",
                    self.name,
                    n1,
                    n2
                );
            }
            cell.rem = selection.rem;

            for _ in 0..selection.nsel {
                let k1 = rng.gen_range(0..n1);
                let accepted = if same {
                    let mut k2 = rng.gen_range(0..n1 - 1);
                    if k2 >= k1 {
                        k2 += 1;
                    }
                    let (i1, i2) = (cell.sp1[k1], cell.sp1[k2]);
                    let Some(list) = materials.get_mut(self.mat1).particles_mut(mesh) else {
                        return;
                    };
                    let (a, b) = two_mut(list, i1, i2);
                    let hit = try_collide(a, b, cell, &self.sigma, self.vss_inv, rng);
                    hit.then(|| (midpoint(a, b), 0.5 * (a.mpw + b.mpw)))
                } else {
                    let i1 = cell.sp1[k1];
                    let i2 = cell.sp2[rng.gen_range(0..n2)];
                    let Some((m1, m2)) = materials.pair_mut(self.mat1, self.mat2) else {
                        return;
                    };
                    let (Some(l1), Some(l2)) = (m1.particles_mut(mesh), m2.particles_mut(mesh))
                    else {
                        return;
                    };
                    let (a, b) = (&mut l1[i1], &mut l2[i2]);
                    let hit = try_collide(a, b, cell, &self.sigma, self.vss_inv, rng);
                    hit.then(|| (midpoint(a, b), 0.5 * (a.mpw + b.mpw)))
                };
                if let Some((lc, real)) = accepted {
                    self.samples.record(mesh, lc, real);
                    self.collisions += 1;
                }
            }
        }
    }
}

impl VolumeInteraction for Dsmc {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, world: &mut World, _sources: &mut SourceModule) -> HybridResult<()> {
        let m1 = world.materials.get(self.mat1);
        let m2 = world.materials.get(self.mat2);
        self.sigma.init(m1, m2)?;
        let (k1, k2) = (m1.require_kinetic()?, m2.require_kinetic()?);
        self.vss_inv = 0.5 * (1.0 / k1.vss_alpha + 1.0 / k2.vss_alpha);
        self.cells = world
            .domain
            .meshes()
            .iter()
            .map(|mesh| {
                Array2::from_shape_fn((mesh.ni - 1, mesh.nj - 1), |(i, j)| {
                    CellInfo::new(mesh.cell_volume(i, j))
                })
            })
            .collect();
        self.samples.register(world);
        world.fields.add(&self.count_sum_name, "#", &world.domain);
        world.fields.add(&self.real_sum_name, "#", &world.domain);
        let num_cells: usize = self.cells.iter().map(|c| c.len()).sum();
        log::info!("{}: {} cells ready", self.name, num_cells);
        Ok(())
    }

    fn perform(
        &mut self,
        world: &mut World,
        _sources: &mut SourceModule,
        ctx: &StepContext,
        rng: &mut dyn RngCore,
    ) {
        if ctx.it % self.frequency != 0 {
            return;
        }
        if world.materials.get(self.mat1).is_frozen() && world.materials.get(self.mat2).is_frozen() {
            return;
        }
        if self.samples.enter_steady_state(ctx) {
            self.clear_samples(world);
        }
        let dt = self.frequency as f64 * ctx.dt;
        self.collisions = 0;
        self.samples.num_samples += 1;
        for mesh in 0..self.cells.len() {
            self.collide_mesh(world, mesh, dt, rng);
        }
        self.samples.publish(world, dt);
        publish(world, &self.count_sum_name, &self.samples.count_sum);
        publish(world, &self.real_sum_name, &self.samples.real_sum);
        log::info!("{}: {} collisions", self.name, self.collisions);
    }

    /// Reset sample sums and refresh every `(σ·g)max` with the maximum
    /// actually observed since the previous reset.
    fn clear_samples(&mut self, _world: &mut World) {
        self.samples.clear();
        for cell in self.cells.iter_mut().flat_map(|c| c.iter_mut()) {
            if cell.observed_max > 0.0 {
                cell.sig_cr_max = cell.observed_max;
            }
            cell.observed_max = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_core::material::Material;
    use hybrid_math::mesh::{Domain, UniformMesh};
    use hybrid_types::config::SigmaConfig;
    use hybrid_types::state::DomainType;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const MASS: f64 = 6.63e-26;

    /// One 1e-9 m square cell (V = 1e-18 m³) holding species A and B.
    fn tiny_world() -> World {
        let mesh = UniformMesh::new(2, 2, [0.0, 0.0], [1e-9, 1e-9], DomainType::Xy).unwrap();
        let mut world = World::new(Domain::single(mesh));
        for name in ["A", "B"] {
            let m = Material::new_kinetic(name, MASS, 1.0, &world.domain).unwrap();
            world.add_material(m).unwrap();
        }
        world
    }

    fn fill(world: &mut World, id: MaterialId, n: usize, vel: [f64; 3]) {
        let World {
            domain, materials, ..
        } = world;
        for _ in 0..n {
            let p = Particle::new([0.5e-9, 0.5e-9, 0.0], vel, 1.0, MASS);
            assert!(materials.get_mut(id).add_particle(domain, p));
        }
    }

    fn dsmc(world: &World, a: &str, b: &str) -> Dsmc {
        let cfg = DsmcConfig {
            pair: [a.to_string(), b.to_string()],
            model: "ELASTIC".to_string(),
            sigma: SigmaConfig::new("CONST", &[1e-18]),
            frequency: 1,
        };
        Dsmc::new(&cfg, &SigmaRegistry::new(), 0, world).unwrap()
    }

    fn total_momentum(world: &World) -> [f64; 3] {
        let mut p = [0.0; 3];
        for (_, m) in world.materials.iter() {
            for part in m.particles(0) {
                let mom = part.momentum();
                for d in 0..3 {
                    p[d] += mom[d];
                }
            }
        }
        p
    }

    fn total_energy(world: &World) -> f64 {
        world
            .materials
            .iter()
            .flat_map(|(_, m)| m.particles(0).iter())
            .map(|p| p.kinetic_energy_j())
            .sum()
    }

    #[test]
    fn test_hand_computed_pair_count() {
        // 100 self-colliding particles of weight 1, V=1e-18, dt=1e-6,
        // (σg)max = 1e-18·1000: nsel = 1e20·100·1e-6·1e-15/2 = 5
        let sel = ntc_pair_count(&NtcInput {
            n1: 100,
            n2: 100,
            spwt1: 1.0,
            spwt2: 1.0,
            volume: 1e-18,
            dt: 1e-6,
            sig_cr_max: 1e-18 * 1000.0,
            rem: 0.5,
            same_species: true,
        });
        assert_eq!(sel.nsel, 5);
        assert!((sel.rem - 0.5).abs() < 1e-9);
        assert!(!sel.capped);
    }

    #[test]
    fn test_unlike_species_count_is_doubled() {
        let input = NtcInput {
            n1: 100,
            n2: 100,
            spwt1: 1.0,
            spwt2: 1.0,
            volume: 1e-18,
            dt: 1e-6,
            sig_cr_max: 1e-15,
            rem: 0.5,
            same_species: false,
        };
        assert_eq!(ntc_pair_count(&input).nsel, 10);
    }

    #[test]
    fn test_pair_count_capped() {
        let sel = ntc_pair_count(&NtcInput {
            n1: 2,
            n2: 2,
            spwt1: 1.0,
            spwt2: 1.0,
            volume: 1e-18,
            dt: 1.0,
            sig_cr_max: 1e-15,
            rem: 0.3,
            same_species: true,
        });
        assert!(sel.capped);
        assert_eq!(sel.nsel, 4);
        assert_eq!(sel.rem, 0.0);
    }

    #[test]
    fn test_unequal_weights_boyd_denominator() {
        // n1·w1/V·n2·dt·(σg)max = 2.5 per unit w1, doubled for unlike species
        let light_first = NtcInput {
            n1: 50,
            n2: 50,
            spwt1: 1.0,
            spwt2: 4.0,
            volume: 1e-18,
            dt: 1e-6,
            sig_cr_max: 1e-15,
            rem: 0.25,
            same_species: false,
        };
        // Pab = 1, Pba = 0.25: 2·2.5/2 + 0.25
        let sel = ntc_pair_count(&light_first);
        assert_eq!(sel.nsel, 2);
        assert!((sel.rem - 0.75).abs() < 1e-12);

        // Pab = Pba = 1: 2·10/2 + 0.25
        let equal = NtcInput {
            spwt1: 4.0,
            ..light_first
        };
        let sel = ntc_pair_count(&equal);
        assert_eq!(sel.nsel, 10);
        assert!((sel.rem - 0.25).abs() < 1e-12);

        // Pab = 0.25, Pba = 1, denominator 0.5: 2·10/0.5 + 0.25
        let heavy_first = NtcInput {
            spwt1: 4.0,
            spwt2: 1.0,
            ..light_first
        };
        let sel = ntc_pair_count(&heavy_first);
        assert_eq!(sel.nsel, 40);
        assert!((sel.rem - 0.25).abs() < 1e-12);
        assert!(!sel.capped);
    }

    #[test]
    fn test_head_on_beams_collide_and_conserve() {
        let mut world = tiny_world();
        fill(&mut world, MaterialId(0), 100, [500.0, 0.0, 0.0]);
        fill(&mut world, MaterialId(1), 100, [-500.0, 0.0, 0.0]);
        let mut sources = SourceModule::new();
        let mut d = dsmc(&world, "A", "B");
        d.init(&mut world, &mut sources).unwrap();
        d.cells_mut(0)[[0, 0]].sig_cr_max = 1e-15;
        d.cells_mut(0)[[0, 0]].rem = 0.5;

        let p0 = total_momentum(&world);
        let e0 = total_energy(&world);
        let mut rng = StdRng::seed_from_u64(11);
        let ctx = StepContext::new(1e-6);
        d.perform(&mut world, &mut sources, &ctx, &mut rng);

        assert!(d.collisions() >= 1 && d.collisions() <= 10, "n = {}", d.collisions());
        let p1 = total_momentum(&world);
        for k in 0..3 {
            assert!((p1[k] - p0[k]).abs() < 1e-9 * MASS * 500.0 * 200.0);
        }
        assert!((total_energy(&world) - e0).abs() / e0 < 1e-9);
        let cell = &d.cells(0)[[0, 0]];
        assert!(cell.sig_cr_max >= 1e-15);
        assert!((cell.rem - 0.5).abs() < 1e-9);
        let count = world.fields.get("dsmc-count").unwrap().sum();
        assert!((count - d.collisions() as f64).abs() < 1e-9);
    }

    #[test]
    fn test_single_particle_never_self_collides() {
        let mut world = tiny_world();
        fill(&mut world, MaterialId(0), 1, [500.0, 0.0, 0.0]);
        let mut sources = SourceModule::new();
        let mut d = dsmc(&world, "A", "A");
        d.init(&mut world, &mut sources).unwrap();
        d.cells_mut(0)[[0, 0]].rem = 0.25;
        let mut rng = StdRng::seed_from_u64(12);
        d.perform(&mut world, &mut sources, &StepContext::new(1.0), &mut rng);
        assert_eq!(d.collisions(), 0);
        assert_eq!(d.cells(0)[[0, 0]].rem, 0.25);
    }

    #[test]
    fn test_frequency_gating_and_frozen_species() {
        let mut world = tiny_world();
        fill(&mut world, MaterialId(0), 20, [500.0, 0.0, 0.0]);
        fill(&mut world, MaterialId(1), 20, [-500.0, 0.0, 0.0]);
        let mut sources = SourceModule::new();
        let mut d = dsmc(&world, "A", "B");
        d.frequency = 3;
        d.init(&mut world, &mut sources).unwrap();
        let mut rng = StdRng::seed_from_u64(13);
        let mut ctx = StepContext::new(1e-6);
        ctx.it = 1;
        d.perform(&mut world, &mut sources, &ctx, &mut rng);
        assert_eq!(d.samples.num_samples, 0);
        ctx.it = 3;
        d.perform(&mut world, &mut sources, &ctx, &mut rng);
        assert_eq!(d.samples.num_samples, 1);

        for id in [MaterialId(0), MaterialId(1)] {
            if let Some(k) = world.materials.get_mut(id).kinetic_mut() {
                k.frozen = true;
            }
        }
        ctx.it = 6;
        d.perform(&mut world, &mut sources, &ctx, &mut rng);
        assert_eq!(d.samples.num_samples, 1);
    }

    #[test]
    fn test_steady_state_refreshes_sig_cr_max() {
        let mut world = tiny_world();
        fill(&mut world, MaterialId(0), 50, [100.0, 0.0, 0.0]);
        fill(&mut world, MaterialId(1), 50, [-100.0, 0.0, 0.0]);
        let mut sources = SourceModule::new();
        let mut d = dsmc(&world, "A", "B");
        d.init(&mut world, &mut sources).unwrap();
        d.cells_mut(0)[[0, 0]].sig_cr_max = 1e-12;
        d.cells_mut(0)[[0, 0]].rem = 0.999;
        let mut rng = StdRng::seed_from_u64(14);
        let mut ctx = StepContext::new(1e-6);
        d.perform(&mut world, &mut sources, &ctx, &mut rng);
        assert_eq!(d.cells(0)[[0, 0]].sig_cr_max, 1e-12);
        let observed = d.cells(0)[[0, 0]].observed_max;
        assert!((observed - 1e-18 * 200.0).abs() < 1e-25);

        ctx.advance();
        ctx.steady_state = true;
        d.perform(&mut world, &mut sources, &ctx, &mut rng);
        assert!(d.cells(0)[[0, 0]].sig_cr_max < 1e-12);
        assert_eq!(d.samples.num_samples, 1);
    }

    #[test]
    fn test_vss_scatter_conserves_pair_invariants() {
        let mut rng = StdRng::seed_from_u64(15);
        for _ in 0..100 {
            let mut a = Particle::new([0.0; 3], [300.0, -20.0, 45.0], 1e10, MASS);
            let mut b = Particle::new([0.0; 3], [-150.0, 80.0, 5.0], 1e10, 2.0 * MASS);
            let (p0, e0) = (
                [a.momentum(), b.momentum()],
                a.kinetic_energy_j() + b.kinetic_energy_j(),
            );
            elastic_scatter(&mut a, &mut b, 1.0 / 1.44, &mut rng);
            let (pa, pb) = (a.momentum(), b.momentum());
            for d in 0..3 {
                let before = p0[0][d] + p0[1][d];
                assert!((pa[d] + pb[d] - before).abs() < 1e-9 * before.abs().max(1e-12));
            }
            let e1 = a.kinetic_energy_j() + b.kinetic_energy_j();
            assert!((e1 - e0).abs() / e0 < 1e-12);
        }
    }

    #[test]
    fn test_unequal_weights_update_light_particle_rarely() {
        let mut rng = StdRng::seed_from_u64(16);
        let mut heavy_moved = 0;
        let mut light_moved = 0;
        for _ in 0..4000 {
            let mut heavy = Particle::new([0.0; 3], [100.0, 0.0, 0.0], 4.0, MASS);
            let mut light = Particle::new([0.0; 3], [-100.0, 0.0, 0.0], 1.0, MASS);
            elastic_scatter(&mut heavy, &mut light, 1.0, &mut rng);
            heavy_moved += (heavy.vel != [100.0, 0.0, 0.0]) as usize;
            light_moved += (light.vel != [-100.0, 0.0, 0.0]) as usize;
        }
        // the heavy particle moves with probability 1/4, the light one always
        assert_eq!(light_moved, 4000);
        assert!((heavy_moved as f64 / 4000.0 - 0.25).abs() < 0.03);
    }

    #[test]
    fn test_unknown_model_rejected() {
        match DsmcModel::parse("INELASTIC") {
            Err(HybridError::UnknownTag { kind, .. }) => assert_eq!(kind, "DSMC model"),
            other => panic!("Unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_vhs_deflection_keeps_relative_speed() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..50 {
            let v = vhs_deflection(250.0, &mut rng);
            assert!((norm3(v) - 250.0).abs() < 1e-9);
        }
    }
}
