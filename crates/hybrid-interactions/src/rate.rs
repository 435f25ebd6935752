// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Rate Parser
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Rate coefficients evaluated from a dependent field through a sigma
//! model wrapped by unit and log-space transforms.

use crate::sigma::{Sigma, SigmaRegistry};
use hybrid_types::config::{RateConfig, SigmaConfig};
use hybrid_types::constants::{K_BOLTZMANN, K_TO_EV, Q_ELECTRON};
use hybrid_types::error::{HybridError, HybridResult};

/// Transform applied to the rate input or output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wrapper {
    Scale(f64),
    Log,
    Log10,
    /// Temperature (K) to mean thermal energy `1.5 k T` (J).
    Energy,
    JToEv,
    KToEv,
}

impl Wrapper {
    pub fn parse(tag: &str) -> HybridResult<Self> {
        let tag = tag.trim();
        if let Ok(value) = tag.parse::<f64>() {
            if !value.is_finite() {
                return Err(HybridError::ConfigError(format!(
                    "rate wrapper '{tag}' must be finite"
                )));
            }
            return Ok(Wrapper::Scale(value));
        }
        match tag.to_uppercase().as_str() {
            "LOG" => Ok(Wrapper::Log),
            "LOG10" => Ok(Wrapper::Log10),
            "ENERGY" => Ok(Wrapper::Energy),
            "JTOEV" => Ok(Wrapper::JToEv),
            "KTOEV" => Ok(Wrapper::KToEv),
            _ => Err(HybridError::UnknownTag {
                kind: "rate wrapper",
                tag: tag.to_string(),
            }),
        }
    }

    pub fn apply(self, x: f64) -> f64 {
        match self {
            Wrapper::Scale(k) => k * x,
            Wrapper::Log => x.ln(),
            Wrapper::Log10 => x.log10(),
            Wrapper::Energy => 1.5 * K_BOLTZMANN * x,
            Wrapper::JToEv => x / Q_ELECTRON,
            Wrapper::KToEv => x * K_TO_EV,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateParser {
    model: Sigma,
    dep_var: String,
    is_sigma: bool,
    input: Vec<Wrapper>,
    output: Vec<Wrapper>,
}

impl RateParser {
    pub fn new(cfg: &RateConfig, sigmas: &SigmaRegistry) -> HybridResult<Self> {
        if cfg.multiplier.is_some() {
            return Err(HybridError::ConfigError(
                "rate <multiplier> is no longer supported, use output_wrappers".to_string(),
            ));
        }
        if cfg.dep_var.trim().is_empty() {
            return Err(HybridError::ConfigError(
                "rate is missing a dep_var".to_string(),
            ));
        }
        let sigma_cfg = SigmaConfig {
            sigma: cfg.model.clone(),
            sigma_coeffs: cfg.coeffs.clone(),
            sigma_tabulated: cfg.tabulated.clone(),
            sigma_dep_var: "velocity".to_string(),
        };
        let parse_all = |tags: &[String]| -> HybridResult<Vec<Wrapper>> {
            tags.iter().map(|t| Wrapper::parse(t)).collect()
        };
        Ok(RateParser {
            model: sigmas.build(&sigma_cfg)?,
            dep_var: cfg.dep_var.trim().to_string(),
            is_sigma: cfg.is_sigma,
            input: parse_all(&cfg.input_wrappers)?,
            output: parse_all(&cfg.output_wrappers)?,
        })
    }

    pub fn dep_var(&self) -> &str {
        &self.dep_var
    }

    /// The model yields a cross-section rather than a rate coefficient.
    pub fn is_sigma(&self) -> bool {
        self.is_sigma
    }

    /// Evaluate at `x`; invalid or negative results clamp to zero.
    pub fn eval(&self, x: f64, mass: f64) -> f64 {
        let x = self.input.iter().fold(x, |acc, w| w.apply(acc));
        let y = self.model.eval(x, mass);
        let y = self.output.iter().fold(y, |acc, w| w.apply(acc));
        if y.is_finite() && y > 0.0 {
            y
        } else {
            0.0
        }
    }
}
