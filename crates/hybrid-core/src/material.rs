// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Materials
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Fluid, kinetic and solid materials and the material registry.

use hybrid_math::field::FieldCollection2D;
use hybrid_math::mesh::Domain;
use hybrid_types::constants::K_BOLTZMANN;
use hybrid_types::error::{HybridError, HybridResult};
use hybrid_types::state::{MaterialId, Particle};

/// Collision parameters and particle storage of a kinetic species.
#[derive(Debug, Clone)]
pub struct KineticState {
    /// Base macroparticle weight.
    pub spwt0: f64,
    /// Molecular diameter (m).
    pub diam: f64,
    /// Reference temperature of the viscosity law (K).
    pub ref_temp: f64,
    /// Viscosity temperature exponent ω.
    pub visc_temp_index: f64,
    /// VSS scattering exponent, 1 for hard spheres.
    pub vss_alpha: f64,
    /// Frozen species are not collided.
    pub frozen: bool,
    particles: Vec<Vec<Particle>>,
    next_id: u64,
}

impl KineticState {
    fn new(spwt0: f64, num_meshes: usize) -> Self {
        KineticState {
            spwt0,
            diam: 0.0,
            ref_temp: 273.0,
            visc_temp_index: 0.5,
            vss_alpha: 1.0,
            frozen: false,
            particles: vec![Vec::new(); num_meshes],
            next_id: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub enum MaterialKind {
    Kinetic(KineticState),
    Fluid,
    Solid,
}

/// A species with its moment fields on every mesh.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    /// Particle mass (kg).
    pub mass: f64,
    /// Particle charge (C).
    pub charge: f64,
    pub kind: MaterialKind,
    /// Number density (#/m³).
    pub den: FieldCollection2D,
    /// Temperature (K).
    pub temp: FieldCollection2D,
    /// Mean velocity components (m/s).
    pub vel: [FieldCollection2D; 3],
    /// Volumetric energy source (W/m³).
    pub energy_source: FieldCollection2D,
}

impl Material {
    fn with_kind(name: &str, mass: f64, kind: MaterialKind, domain: &Domain) -> HybridResult<Self> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(HybridError::PhysicsViolation(format!(
                "{name}.mass must be finite and > 0"
            )));
        }
        Ok(Material {
            name: name.to_string(),
            mass,
            charge: 0.0,
            kind,
            den: FieldCollection2D::new(domain),
            temp: FieldCollection2D::new(domain),
            vel: [
                FieldCollection2D::new(domain),
                FieldCollection2D::new(domain),
                FieldCollection2D::new(domain),
            ],
            energy_source: FieldCollection2D::new(domain),
        })
    }

    pub fn new_kinetic(name: &str, mass: f64, spwt0: f64, domain: &Domain) -> HybridResult<Self> {
        if !spwt0.is_finite() || spwt0 <= 0.0 {
            return Err(HybridError::PhysicsViolation(format!(
                "{name}.spwt0 must be finite and > 0"
            )));
        }
        let state = KineticState::new(spwt0, domain.num_meshes());
        Self::with_kind(name, mass, MaterialKind::Kinetic(state), domain)
    }

    pub fn new_fluid(name: &str, mass: f64, domain: &Domain) -> HybridResult<Self> {
        Self::with_kind(name, mass, MaterialKind::Fluid, domain)
    }

    pub fn new_solid(name: &str, mass: f64, domain: &Domain) -> HybridResult<Self> {
        Self::with_kind(name, mass, MaterialKind::Solid, domain)
    }

    pub fn with_charge(mut self, charge: f64) -> Self {
        self.charge = charge;
        self
    }

    /// Uniform initial density and temperature.
    pub fn with_state(mut self, den: f64, temp: f64) -> Self {
        self.den.fill(den);
        self.temp.fill(temp);
        self
    }

    /// Set the VHS/VSS collision parameters of a kinetic species.
    pub fn with_collision_params(
        mut self,
        diam: f64,
        ref_temp: f64,
        visc_temp_index: f64,
        vss_alpha: f64,
    ) -> Self {
        if let MaterialKind::Kinetic(k) = &mut self.kind {
            k.diam = diam;
            k.ref_temp = ref_temp;
            k.visc_temp_index = visc_temp_index;
            k.vss_alpha = vss_alpha;
        }
        self
    }

    pub fn is_kinetic(&self) -> bool {
        matches!(self.kind, MaterialKind::Kinetic(_))
    }

    pub fn is_fluid(&self) -> bool {
        matches!(self.kind, MaterialKind::Fluid)
    }

    pub fn kinetic(&self) -> Option<&KineticState> {
        match &self.kind {
            MaterialKind::Kinetic(k) => Some(k),
            _ => None,
        }
    }

    pub fn kinetic_mut(&mut self) -> Option<&mut KineticState> {
        match &mut self.kind {
            MaterialKind::Kinetic(k) => Some(k),
            _ => None,
        }
    }

    /// Kinetic state or a `MaterialKind` error.
    pub fn require_kinetic(&self) -> HybridResult<&KineticState> {
        self.kinetic().ok_or_else(|| HybridError::MaterialKind {
            name: self.name.clone(),
            expected: "kinetic",
        })
    }

    pub fn spwt0(&self) -> Option<f64> {
        self.kinetic().map(|k| k.spwt0)
    }

    pub fn is_frozen(&self) -> bool {
        self.kinetic().map_or(false, |k| k.frozen)
    }

    pub fn particles(&self, mesh: usize) -> &[Particle] {
        match &self.kind {
            MaterialKind::Kinetic(k) => &k.particles[mesh],
            _ => &[],
        }
    }

    pub fn particles_mut(&mut self, mesh: usize) -> Option<&mut Vec<Particle>> {
        self.kinetic_mut().map(|k| &mut k.particles[mesh])
    }

    pub fn num_particles(&self) -> usize {
        self.kinetic()
            .map_or(0, |k| k.particles.iter().map(Vec::len).sum())
    }

    /// Total physical particles carried by all macroparticles.
    pub fn total_weight(&self) -> f64 {
        self.kinetic().map_or(0.0, |k| {
            k.particles.iter().flatten().map(|p| p.mpw).sum()
        })
    }

    /// Insert a particle; returns false when it lies outside the active
    /// domain or inside solid geometry.
    pub fn add_particle(&mut self, domain: &Domain, mut part: Particle) -> bool {
        let MaterialKind::Kinetic(k) = &mut self.kind else {
            return false;
        };
        let x = [part.pos[0], part.pos[1]];
        let Some((mesh, lc)) = domain.locate(x) else {
            return false;
        };
        if domain.mesh(mesh).is_internal(x) {
            return false;
        }
        part.lc = lc;
        part.id = k.next_id;
        k.next_id += 1;
        k.particles[mesh].push(part);
        true
    }

    /// Mean velocity at a logical coordinate.
    pub fn mean_velocity(&self, mesh: usize, lc: [f64; 2]) -> [f64; 3] {
        [
            self.vel[0].field(mesh).gather(lc),
            self.vel[1].field(mesh).gather(lc),
            self.vel[2].field(mesh).gather(lc),
        ]
    }

    /// Recompute density, mean velocity and temperature from the particles
    /// of a kinetic species. Fluid and solid moments are left untouched.
    pub fn update_moments(&mut self, domain: &Domain) {
        let MaterialKind::Kinetic(k) = &self.kind else {
            return;
        };
        for (m, mesh) in domain.meshes().iter().enumerate() {
            let mut count = hybrid_math::field::Field2D::new(mesh.ni, mesh.nj);
            let mut mom = [count.clone(), count.clone(), count.clone()];
            let mut v2 = count.clone();
            for p in &k.particles[m] {
                count.scatter(p.lc, p.mpw);
                for d in 0..3 {
                    mom[d].scatter(p.lc, p.mpw * p.vel[d]);
                }
                v2.scatter(p.lc, p.mpw * (p.vel[0].powi(2) + p.vel[1].powi(2) + p.vel[2].powi(2)));
            }
            for i in 0..mesh.ni {
                for j in 0..mesh.nj {
                    let w = count.at(i, j);
                    self.den.field_mut(m).set(i, j, w / mesh.node_volume(i, j));
                    if w <= 0.0 {
                        for d in 0..3 {
                            self.vel[d].field_mut(m).set(i, j, 0.0);
                        }
                        self.temp.field_mut(m).set(i, j, 0.0);
                        continue;
                    }
                    let u = [mom[0].at(i, j) / w, mom[1].at(i, j) / w, mom[2].at(i, j) / w];
                    for d in 0..3 {
                        self.vel[d].field_mut(m).set(i, j, u[d]);
                    }
                    let thermal = v2.at(i, j) / w - (u[0] * u[0] + u[1] * u[1] + u[2] * u[2]);
                    let t = self.mass * thermal.max(0.0) / (3.0 * K_BOLTZMANN);
                    self.temp.field_mut(m).set(i, j, t);
                }
            }
        }
    }
}

/// Ordered material registry.
#[derive(Debug, Clone, Default)]
pub struct Materials {
    list: Vec<Material>,
}

impl Materials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, material: Material) -> HybridResult<MaterialId> {
        if self.list.iter().any(|m| m.name == material.name) {
            return Err(HybridError::ConfigError(format!(
                "duplicate material '{}'",
                material.name
            )));
        }
        self.list.push(material);
        Ok(MaterialId(self.list.len() - 1))
    }

    pub fn id(&self, name: &str) -> HybridResult<MaterialId> {
        self.list
            .iter()
            .position(|m| m.name == name)
            .map(MaterialId)
            .ok_or_else(|| HybridError::UnknownMaterial(name.to_string()))
    }

    pub fn get(&self, id: MaterialId) -> &Material {
        &self.list[id.0]
    }

    pub fn get_mut(&mut self, id: MaterialId) -> &mut Material {
        &mut self.list[id.0]
    }

    pub fn by_name(&self, name: &str) -> HybridResult<&Material> {
        self.id(name).map(|id| self.get(id))
    }

    /// Two distinct materials borrowed mutably at once.
    pub fn pair_mut(&mut self, a: MaterialId, b: MaterialId) -> Option<(&mut Material, &mut Material)> {
        if a == b || a.0 >= self.list.len() || b.0 >= self.list.len() {
            return None;
        }
        if a.0 < b.0 {
            let (lo, hi) = self.list.split_at_mut(b.0);
            Some((&mut lo[a.0], &mut hi[0]))
        } else {
            let (lo, hi) = self.list.split_at_mut(a.0);
            Some((&mut hi[0], &mut lo[b.0]))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.list.iter().enumerate().map(|(i, m)| (MaterialId(i), m))
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}
