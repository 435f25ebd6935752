// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Cross Sections
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Collision cross-section models σ(g) and their tag registry.

use hybrid_core::material::Material;
use hybrid_math::table::LinearTable;
use hybrid_types::config::SigmaConfig;
use hybrid_types::constants::{K_BOLTZMANN, Q_ELECTRON};
use hybrid_types::error::{HybridError, HybridResult};
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Abscissa of a tabulated cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableVariable {
    /// Relative speed (m/s).
    Velocity,
    /// Relative kinetic energy in the centre-of-mass frame (eV).
    Energy,
}

/// Variable hard sphere cross-section, Bird (1994) eq. 4.63.
///
/// `σ = π d² (2kT_ref/(m_r g²))^(ω-1/2) / Γ(5/2-ω)`, with the pair
/// parameters averaged over both species at init.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bird463 {
    pub diam: f64,
    pub ref_temp: f64,
    pub omega: f64,
    gamma: f64,
}

impl Bird463 {
    pub fn init(&mut self, m1: &Material, m2: &Material) -> HybridResult<()> {
        let (k1, k2) = (m1.require_kinetic()?, m2.require_kinetic()?);
        self.diam = 0.5 * (k1.diam + k2.diam);
        self.ref_temp = 0.5 * (k1.ref_temp + k2.ref_temp);
        self.omega = 0.5 * (k1.visc_temp_index + k2.visc_temp_index);
        if !(self.diam > 0.0) {
            return Err(HybridError::PhysicsViolation(format!(
                "BIRD463 sigma needs a molecular diameter for {} and {}",
                m1.name, m2.name
            )));
        }
        if !(self.ref_temp > 0.0) || !(0.0..2.5).contains(&self.omega) {
            return Err(HybridError::PhysicsViolation(format!(
                "BIRD463 sigma: invalid viscosity law (T_ref={}, omega={})",
                self.ref_temp, self.omega
            )));
        }
        self.gamma = gamma(2.5 - self.omega);
        Ok(())
    }

    fn eval(&self, g: f64, reduced_mass: f64) -> f64 {
        if self.gamma <= 0.0 || g <= 0.0 || reduced_mass <= 0.0 {
            return 0.0;
        }
        let base = 2.0 * K_BOLTZMANN * self.ref_temp / (reduced_mass * g * g);
        PI * self.diam * self.diam * base.powf(self.omega - 0.5) / self.gamma
    }
}

#[derive(Debug, Clone)]
pub enum Sigma {
    /// `σ = c0`.
    Const(f64),
    /// `σ = c0 / g`.
    Inv(f64),
    Table {
        table: LinearTable,
        variable: TableVariable,
    },
    /// `σ = Σ cᵢ gⁱ`.
    Polynomial(Vec<f64>),
    Bird463(Bird463),
}

impl Sigma {
    /// Resolve pair-dependent parameters once both materials exist.
    pub fn init(&mut self, m1: &Material, m2: &Material) -> HybridResult<()> {
        match self {
            Sigma::Bird463(b) => b.init(m1, m2),
            _ => Ok(()),
        }
    }

    /// Cross-section (m²) at relative speed `g`; never negative.
    pub fn eval(&self, g: f64, reduced_mass: f64) -> f64 {
        let sigma = match self {
            Sigma::Const(c0) => *c0,
            Sigma::Inv(c0) => {
                if g <= 0.0 {
                    return 0.0;
                }
                c0 / g
            }
            Sigma::Table { table, variable } => match variable {
                TableVariable::Velocity => table.eval(g),
                TableVariable::Energy => table.eval(0.5 * reduced_mass * g * g / Q_ELECTRON),
            },
            Sigma::Polynomial(coeffs) => coeffs.iter().rev().fold(0.0, |acc, c| acc * g + c),
            Sigma::Bird463(b) => b.eval(g, reduced_mass),
        };
        if sigma.is_finite() {
            sigma.max(0.0)
        } else {
            0.0
        }
    }
}

/// Reduced mass `m1 m2 / (m1 + m2)`.
pub fn reduced_mass(m1: f64, m2: f64) -> f64 {
    m1 * m2 / (m1 + m2)
}

/// Lanczos approximation of Γ(x) for x > 0.
fn gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        return PI / ((PI * x).sin() * gamma(1.0 - x));
    }
    let x = x - 1.0;
    let mut a = COEFFS[0];
    let t = x + G + 0.5;
    for (i, c) in COEFFS.iter().enumerate().skip(1) {
        a += c / (x + i as f64);
    }
    (2.0 * PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * a
}

// ── Registry ─────────────────────────────────────────────────────────

pub type SigmaFactory = fn(&SigmaConfig) -> HybridResult<Sigma>;

/// Tag → constructor map, resolved once at configuration load.
pub struct SigmaRegistry {
    factories: BTreeMap<String, SigmaFactory>,
}

impl Default for SigmaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SigmaRegistry {
    pub fn new() -> Self {
        let mut reg = SigmaRegistry {
            factories: BTreeMap::new(),
        };
        reg.register("CONST", const_sigma);
        reg.register("INV", inv_sigma);
        reg.register("TABLE", table_sigma);
        reg.register("POLYNOMIAL", polynomial_sigma);
        reg.register("BIRD463", |_| Ok(Sigma::Bird463(Bird463::default())));
        reg
    }

    pub fn register(&mut self, tag: &str, factory: SigmaFactory) {
        self.factories.insert(tag.trim().to_uppercase(), factory);
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(&tag.trim().to_uppercase())
    }

    pub fn build(&self, cfg: &SigmaConfig) -> HybridResult<Sigma> {
        let tag = cfg.sigma.trim().to_uppercase();
        match self.factories.get(&tag) {
            Some(factory) => factory(cfg),
            None => Err(HybridError::UnknownTag {
                kind: "sigma",
                tag: cfg.sigma.clone(),
            }),
        }
    }
}

fn first_coeff(cfg: &SigmaConfig) -> HybridResult<f64> {
    match cfg.sigma_coeffs.first() {
        Some(c) if c.is_finite() => Ok(*c),
        _ => Err(HybridError::ConfigError(format!(
            "{} sigma needs one finite coefficient",
            cfg.sigma
        ))),
    }
}

fn const_sigma(cfg: &SigmaConfig) -> HybridResult<Sigma> {
    first_coeff(cfg).map(Sigma::Const)
}

fn inv_sigma(cfg: &SigmaConfig) -> HybridResult<Sigma> {
    first_coeff(cfg).map(Sigma::Inv)
}

fn polynomial_sigma(cfg: &SigmaConfig) -> HybridResult<Sigma> {
    if cfg.sigma_coeffs.is_empty() || cfg.sigma_coeffs.iter().any(|c| !c.is_finite()) {
        return Err(HybridError::ConfigError(
            "POLYNOMIAL sigma needs finite coefficients".to_string(),
        ));
    }
    Ok(Sigma::Polynomial(cfg.sigma_coeffs.clone()))
}

fn table_sigma(cfg: &SigmaConfig) -> HybridResult<Sigma> {
    let variable = match cfg.sigma_dep_var.trim().to_lowercase().as_str() {
        "velocity" => TableVariable::Velocity,
        "energy" => TableVariable::Energy,
        other => {
            return Err(HybridError::ConfigError(format!(
                "TABLE sigma: unknown dependent variable '{other}'"
            )))
        }
    };
    Ok(Sigma::Table {
        table: LinearTable::from_pairs(&cfg.sigma_tabulated)?,
        variable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_math::mesh::{Domain, UniformMesh};
    use hybrid_types::state::DomainType;

    fn domain() -> Domain {
        Domain::single(UniformMesh::new(2, 2, [0.0, 0.0], [1.0, 1.0], DomainType::Xy).unwrap())
    }

    #[test]
    fn test_gamma_known_values() {
        assert!((gamma(1.0) - 1.0).abs() < 1e-12);
        assert!((gamma(2.0) - 1.0).abs() < 1e-12);
        assert!((gamma(1.5) - PI.sqrt() / 2.0).abs() < 1e-12);
        assert!((gamma(5.0) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_const_and_inv() {
        let reg = SigmaRegistry::new();
        let c = reg.build(&SigmaConfig::new("CONST", &[1e-18])).unwrap();
        assert_eq!(c.eval(123.0, 1e-26), 1e-18);
        let inv = reg.build(&SigmaConfig::new("inv", &[1e-15])).unwrap();
        assert!((inv.eval(1000.0, 1e-26) - 1e-18).abs() < 1e-30);
        assert_eq!(inv.eval(0.0, 1e-26), 0.0);
    }

    #[test]
    fn test_polynomial_is_floored() {
        let reg = SigmaRegistry::new();
        let p = reg
            .build(&SigmaConfig::new("POLYNOMIAL", &[1e-18, -1e-21]))
            .unwrap();
        assert!((p.eval(100.0, 1.0) - 0.9e-18).abs() < 1e-30);
        assert_eq!(p.eval(1e4, 1.0), 0.0);
    }

    #[test]
    fn test_table_energy_axis() {
        let mut cfg = SigmaConfig::new("TABLE", &[]);
        cfg.sigma_tabulated = vec![[0.0, 1e-19], [10.0, 2e-19]];
        cfg.sigma_dep_var = "energy".to_string();
        let s = SigmaRegistry::new().build(&cfg).unwrap();
        // 5 eV relative energy for a unit reduced mass
        let g = (2.0 * 5.0 * Q_ELECTRON).sqrt();
        assert!((s.eval(g, 1.0) - 1.5e-19).abs() < 1e-30);
    }

    #[test]
    fn test_unknown_sigma_tag() {
        match SigmaRegistry::new().build(&SigmaConfig::new("HARD_SPHERE", &[])) {
            Err(HybridError::UnknownTag { kind, tag }) => {
                assert_eq!(kind, "sigma");
                assert_eq!(tag, "HARD_SPHERE");
            }
            other => panic!("Unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_bird463_hard_sphere_limit() {
        // omega = 0.5 reduces to the hard-sphere cross-section π d²
        let d = domain();
        let a = Material::new_kinetic("Ar", 6.63e-26, 1e10, &d)
            .unwrap()
            .with_collision_params(4.17e-10, 273.0, 0.5, 1.0);
        let mut s = SigmaRegistry::new()
            .build(&SigmaConfig::new("BIRD463", &[]))
            .unwrap();
        s.init(&a, &a).unwrap();
        let mr = reduced_mass(a.mass, a.mass);
        let expected = PI * 4.17e-10 * 4.17e-10 / gamma(2.0);
        assert!((s.eval(500.0, mr) - expected).abs() / expected < 1e-10);
    }

    #[test]
    fn test_bird463_requires_diameter() {
        let d = domain();
        let a = Material::new_kinetic("Ar", 6.63e-26, 1e10, &d).unwrap();
        let mut s = Sigma::Bird463(Bird463::default());
        match s.init(&a, &a) {
            Err(HybridError::PhysicsViolation(msg)) => assert!(msg.contains("diameter")),
            other => panic!("Unexpected result: {other:?}"),
        }
    }
}
