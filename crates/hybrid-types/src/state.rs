// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

/// Index of a material in the world's material registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaterialId(pub usize);

/// Geometry of the 2D computational plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DomainType {
    /// Planar x-y, unit depth along z.
    #[default]
    Xy,
    /// Axisymmetric, first coordinate is r.
    Rz,
    /// Axisymmetric, second coordinate is r.
    Zr,
}

impl DomainType {
    pub fn is_axisymmetric(self) -> bool {
        !matches!(self, DomainType::Xy)
    }
}

/// Node classification supplied by the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeType {
    #[default]
    Open,
    Solid,
}

/// Kinetic macroparticle.
///
/// `pos[2]` holds the out-of-plane coordinate (the azimuthal angle in
/// axisymmetric domains). `lc` caches the logical coordinate on the mesh the
/// particle currently lives on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub id: u64,
    pub trace: bool,
    pub pos: [f64; 3],
    pub vel: [f64; 3],
    /// Macroparticle weight, number of physical particles represented.
    pub mpw: f64,
    /// Physical particle mass (kg).
    pub mass: f64,
    pub lc: [f64; 2],
    /// Time left to integrate in the current step (s).
    pub dt: f64,
}

impl Particle {
    pub fn new(pos: [f64; 3], vel: [f64; 3], mpw: f64, mass: f64) -> Self {
        Particle {
            id: 0,
            trace: false,
            pos,
            vel,
            mpw,
            mass,
            lc: [0.0, 0.0],
            dt: 0.0,
        }
    }

    pub fn speed(&self) -> f64 {
        (self.vel[0] * self.vel[0] + self.vel[1] * self.vel[1] + self.vel[2] * self.vel[2]).sqrt()
    }

    /// Kinetic energy of the physical particles carried (J).
    pub fn kinetic_energy_j(&self) -> f64 {
        0.5 * self.mpw * self.mass * self.speed().powi(2)
    }

    /// Momentum of the physical particles carried (kg·m/s).
    pub fn momentum(&self) -> [f64; 3] {
        let m = self.mpw * self.mass;
        [m * self.vel[0], m * self.vel[1], m * self.vel[2]]
    }
}

/// Per-step values handed down by the main loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepContext {
    pub it: usize,
    /// Timestep (s).
    pub dt: f64,
    pub time: f64,
    pub steady_state: bool,
}

impl StepContext {
    pub fn new(dt: f64) -> Self {
        StepContext {
            it: 0,
            dt,
            time: 0.0,
            steady_state: false,
        }
    }

    /// Move to the next iteration.
    pub fn advance(&mut self) {
        self.it += 1;
        self.time += self.dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_energy_and_momentum() {
        let p = Particle::new([0.0; 3], [3.0, 4.0, 0.0], 2.0, 1.5);
        assert!((p.speed() - 5.0).abs() < 1e-12);
        assert!((p.kinetic_energy_j() - 0.5 * 2.0 * 1.5 * 25.0).abs() < 1e-12);
        assert_eq!(p.momentum(), [9.0, 12.0, 0.0]);
    }

    #[test]
    fn test_step_context_advance() {
        let mut ctx = StepContext::new(1e-6);
        ctx.advance();
        ctx.advance();
        assert_eq!(ctx.it, 2);
        assert!((ctx.time - 2e-6).abs() < 1e-18);
        assert!(!ctx.steady_state);
    }

    #[test]
    fn test_domain_type_serde() {
        let d: DomainType = serde_json::from_str("\"RZ\"").unwrap();
        assert_eq!(d, DomainType::Rz);
        assert!(d.is_axisymmetric());
        assert!(!DomainType::Xy.is_axisymmetric());
    }
}
