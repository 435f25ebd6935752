// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{HybridError, HybridResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declarative setup of interactions and sources.
///
/// Every entry carries a `type` tag that is resolved once against the
/// interaction/source registries; remaining keys are handed to the factory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub interactions: Vec<ConfigEntry>,
    #[serde(default)]
    pub boundary_sources: Vec<ConfigEntry>,
    #[serde(default)]
    pub volume_sources: Vec<ConfigEntry>,
}

impl SimulationConfig {
    /// Load from JSON file.
    pub fn from_file(path: &str) -> HybridResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> HybridResult<Self> {
        let config: Self = serde_json::from_str(contents)?;
        Ok(config)
    }
}

/// One tagged configuration block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEntry {
    #[serde(rename = "type")]
    pub tag: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl ConfigEntry {
    /// Build an entry from a tag and a JSON object of parameters.
    pub fn new(tag: &str, params: Value) -> HybridResult<Self> {
        match params {
            Value::Object(params) => Ok(ConfigEntry {
                tag: tag.to_string(),
                params,
            }),
            other => Err(HybridError::ConfigError(format!(
                "{tag} parameters must be an object, got {other}"
            ))),
        }
    }

    /// Registry lookup key.
    pub fn key(&self) -> String {
        self.tag.trim().to_ascii_uppercase()
    }

    /// Deserialize the parameters into a typed config.
    pub fn parse<T: DeserializeOwned>(&self) -> HybridResult<T> {
        serde_json::from_value(Value::Object(self.params.clone()))
            .map_err(|e| HybridError::ConfigError(format!("{}: {e}", self.tag)))
    }
}

fn default_frequency() -> usize {
    1
}
fn default_sigma_dep_var() -> String {
    "velocity".to_string()
}
fn default_probability() -> f64 {
    1.0
}
fn default_restitution() -> f64 {
    1.0
}

fn require_finite(value: f64, label: &str) -> HybridResult<()> {
    if !value.is_finite() {
        return Err(HybridError::PhysicsViolation(format!(
            "{label} must be finite"
        )));
    }
    Ok(())
}

fn require_positive(value: f64, label: &str) -> HybridResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(HybridError::PhysicsViolation(format!(
            "{label} must be finite and > 0"
        )));
    }
    Ok(())
}

fn require_unit_interval(value: f64, label: &str) -> HybridResult<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(HybridError::PhysicsViolation(format!(
            "{label} must be in [0, 1], got {value}"
        )));
    }
    Ok(())
}

// ── Cross sections and rates ─────────────────────────────────────────

/// Cross-section model selection shared by collision interactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigmaConfig {
    pub sigma: String,
    #[serde(default)]
    pub sigma_coeffs: Vec<f64>,
    /// `(x, sigma)` pairs for the TABLE model.
    #[serde(default)]
    pub sigma_tabulated: Vec<[f64; 2]>,
    /// TABLE abscissa: "velocity" (m/s) or "energy" (eV).
    #[serde(default = "default_sigma_dep_var")]
    pub sigma_dep_var: String,
}

impl SigmaConfig {
    pub fn new(sigma: &str, coeffs: &[f64]) -> Self {
        SigmaConfig {
            sigma: sigma.to_string(),
            sigma_coeffs: coeffs.to_vec(),
            sigma_tabulated: Vec::new(),
            sigma_dep_var: default_sigma_dep_var(),
        }
    }
}

/// Rate coefficient expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateConfig {
    /// Sigma tag used as the fit model.
    #[serde(rename = "type")]
    pub model: String,
    #[serde(default)]
    pub coeffs: Vec<f64>,
    #[serde(default)]
    pub tabulated: Vec<[f64; 2]>,
    /// Field the rate depends on, e.g. `t.e-`.
    pub dep_var: String,
    /// The model returns a cross-section that must be multiplied by the
    /// mean thermal speed.
    #[serde(default)]
    pub is_sigma: bool,
    #[serde(default)]
    pub input_wrappers: Vec<String>,
    #[serde(default)]
    pub output_wrappers: Vec<String>,
    /// Superseded by `output_wrappers`; rejected when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<Value>,
}

// ── Volume interactions ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DsmcConfig {
    pub pair: [String; 2],
    pub model: String,
    #[serde(flatten)]
    pub sigma: SigmaConfig,
    /// Collide every `frequency` iterations.
    #[serde(default = "default_frequency")]
    pub frequency: usize,
}

impl DsmcConfig {
    pub fn validate(&self) -> HybridResult<()> {
        if self.frequency == 0 {
            return Err(HybridError::ConfigError(
                "DSMC frequency must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MccConfig {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub product: Option<String>,
    pub model: String,
    #[serde(flatten)]
    pub sigma: SigmaConfig,
    #[serde(default = "default_frequency")]
    pub frequency: usize,
}

impl MccConfig {
    pub fn validate(&self) -> HybridResult<()> {
        if self.frequency == 0 {
            return Err(HybridError::ConfigError(
                "MCC frequency must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChemistryConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// Stoichiometric entries, `"2*O"` or `"O"`.
    pub sources: Vec<String>,
    pub products: Vec<String>,
    #[serde(default)]
    pub rate: Option<RateConfig>,
    /// Energy released per reaction (eV), negative for endothermic.
    #[serde(default)]
    pub energy_release: f64,
}

impl ChemistryConfig {
    pub fn validate(&self) -> HybridResult<()> {
        if self.sources.is_empty() {
            return Err(HybridError::ConfigError(
                "Chemical reaction needs at least one source".to_string(),
            ));
        }
        if self.rate.is_none() {
            return Err(HybridError::ConfigError(
                "Chemical reaction is missing a <rate>".to_string(),
            ));
        }
        require_finite(self.energy_release, "chemistry.energy_release")
    }

    /// Display name, derived from the stoichiometry when not given.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{}->{}", self.sources.join("+"), self.products.join("+")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyTransferConfig {
    pub sources: Vec<String>,
    pub model: String,
    #[serde(default)]
    pub line_emission_ev: Vec<f64>,
    #[serde(default)]
    pub line_emission_erg: Vec<f64>,
    #[serde(default)]
    pub multiplier: Option<f64>,
    #[serde(default)]
    pub degeneracy_ratio: Option<f64>,
    /// Ionization energy (eV).
    #[serde(default)]
    pub delta_e: Option<f64>,
}

/// Parse stoichiometric entries of the form `"coeff*material"`.
pub fn parse_stoichiometry(entries: &[String]) -> HybridResult<Vec<(f64, String)>> {
    entries
        .iter()
        .map(|entry| {
            let (coeff, name) = match entry.split_once('*') {
                Some((c, n)) => {
                    let coeff: f64 = c.trim().parse().map_err(|_| {
                        HybridError::ConfigError(format!(
                            "Malformed stoichiometric coefficient in '{entry}'"
                        ))
                    })?;
                    (coeff, n.trim())
                }
                None => (1.0, entry.trim()),
            };
            if name.is_empty() {
                return Err(HybridError::ConfigError(format!(
                    "Missing material name in '{entry}'"
                )));
            }
            require_positive(coeff, &format!("coefficient of {name}"))?;
            Ok((coeff, name.to_string()))
        })
        .collect()
}

// ── Surface interactions ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceImpactConfig {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub product: Option<String>,
    pub model: String,
    #[serde(default = "default_probability")]
    pub prob: f64,
    /// Coefficient of restitution.
    #[serde(default = "default_restitution")]
    pub c_rest: f64,
    /// Thermal accommodation coefficient.
    #[serde(default)]
    pub c_accom: f64,
}

impl SurfaceImpactConfig {
    pub fn validate(&self) -> HybridResult<()> {
        require_unit_interval(self.prob, "surface.prob")?;
        require_unit_interval(self.c_accom, "surface.c_accom")?;
        if !self.c_rest.is_finite() || self.c_rest < 0.0 {
            return Err(HybridError::PhysicsViolation(
                "surface.c_rest must be finite and >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Sources ──────────────────────────────────────────────────────────

/// Iterations during which a source injects, `stop_it` exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityWindow {
    #[serde(default)]
    pub start_it: usize,
    #[serde(default)]
    pub stop_it: Option<usize>,
}

impl ActivityWindow {
    pub fn contains(&self, it: usize) -> bool {
        it >= self.start_it && self.stop_it.map_or(true, |stop| it < stop)
    }
}

/// Thermal boundary source; exactly one of `mdot`, `current`, `den`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxwellianSourceConfig {
    pub name: String,
    pub material: String,
    pub boundary: String,
    /// Mass flow rate (kg/s).
    #[serde(default)]
    pub mdot: Option<f64>,
    /// Beam current (A).
    #[serde(default)]
    pub current: Option<f64>,
    /// Injection density (#/m³).
    #[serde(default)]
    pub den: Option<f64>,
    /// Drift speed along the boundary normal (m/s).
    #[serde(default)]
    pub v_drift: f64,
    /// Azimuthal drift (m/s).
    #[serde(default)]
    pub v_az: f64,
    /// Source temperature (K).
    pub temperature: f64,
    #[serde(flatten)]
    pub window: ActivityWindow,
}

impl MaxwellianSourceConfig {
    pub fn validate(&self) -> HybridResult<()> {
        let given = [self.mdot, self.current, self.den]
            .iter()
            .filter(|v| v.is_some())
            .count();
        if given != 1 {
            return Err(HybridError::ConfigError(format!(
                "Source {}: exactly one of mdot, current or den must be specified",
                self.name
            )));
        }
        if let Some(den) = self.den {
            require_positive(self.v_drift, &format!("{}.v_drift", self.name))?;
            require_positive(den, &format!("{}.den", self.name))?;
        }
        require_finite(self.v_drift, &format!("{}.v_drift", self.name))?;
        require_finite(self.v_az, &format!("{}.v_az", self.name))?;
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(HybridError::PhysicsViolation(format!(
                "{}.temperature must be finite and >= 0",
                self.name
            )));
        }
        Ok(())
    }
}

/// Mono-energetic boundary beam (UNIFORM, COLD_BEAM, COSINE).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeamSourceConfig {
    pub name: String,
    pub material: String,
    pub boundary: String,
    pub mdot: f64,
    pub v_drift: f64,
    #[serde(flatten)]
    pub window: ActivityWindow,
}

impl BeamSourceConfig {
    pub fn validate(&self) -> HybridResult<()> {
        if !self.mdot.is_finite() || self.mdot < 0.0 {
            return Err(HybridError::PhysicsViolation(format!(
                "{}.mdot must be finite and >= 0",
                self.name
            )));
        }
        require_finite(self.v_drift, &format!("{}.v_drift", self.name))
    }
}

/// Holds a partial pressure in the cells along a boundary (AMBIENT).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbientSourceConfig {
    pub name: String,
    pub material: String,
    pub boundary: String,
    /// Temperature of the ambient gas (K).
    pub temperature: f64,
    /// Pressure share of this material (Pa).
    pub partial_pressure: f64,
    /// Pressure of all materials combined (Pa).
    pub total_pressure: f64,
    #[serde(default)]
    pub drift_velocity: [f64; 3],
    #[serde(flatten)]
    pub window: ActivityWindow,
}

impl AmbientSourceConfig {
    pub fn validate(&self) -> HybridResult<()> {
        require_positive(self.temperature, &format!("{}.temperature", self.name))?;
        require_positive(self.partial_pressure, &format!("{}.partial_pressure", self.name))?;
        require_positive(self.total_pressure, &format!("{}.total_pressure", self.name))?;
        if self.partial_pressure > self.total_pressure {
            return Err(HybridError::ConfigError(format!(
                "Source {}: partial_pressure exceeds total_pressure",
                self.name
            )));
        }
        for (d, v) in self.drift_velocity.iter().enumerate() {
            require_finite(*v, &format!("{}.drift_velocity[{d}]", self.name))?;
        }
        Ok(())
    }
}

/// Holds a number density in the cells along a boundary (AMBIENT_DENSITY).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbientDensitySourceConfig {
    pub name: String,
    pub material: String,
    pub boundary: String,
    pub temperature: f64,
    /// Target density (#/m³).
    pub density: f64,
    #[serde(default)]
    pub drift_velocity: [f64; 3],
    #[serde(flatten)]
    pub window: ActivityWindow,
}

impl AmbientDensitySourceConfig {
    pub fn validate(&self) -> HybridResult<()> {
        require_positive(self.temperature, &format!("{}.temperature", self.name))?;
        require_positive(self.density, &format!("{}.density", self.name))?;
        for (d, v) in self.drift_velocity.iter().enumerate() {
            require_finite(*v, &format!("{}.drift_velocity[{d}]", self.name))?;
        }
        Ok(())
    }
}

/// Volume preload: fills the domain once with `den` at `temperature`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreloadSourceConfig {
    pub name: String,
    pub material: String,
    pub den: f64,
    pub temperature: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VolumeShape {
    Rect,
    Circle,
}

/// Mass-flow driven volume source over a rectangle or circle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeMaxwellianConfig {
    pub name: String,
    pub material: String,
    pub mdot: f64,
    pub temperature: f64,
    #[serde(default)]
    pub v_drift: [f64; 2],
    pub shape: VolumeShape,
    pub x0: [f64; 2],
    #[serde(default)]
    pub x1: Option<[f64; 2]>,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(flatten)]
    pub window: ActivityWindow,
}

impl VolumeMaxwellianConfig {
    pub fn validate(&self) -> HybridResult<()> {
        require_finite(self.mdot, &format!("{}.mdot", self.name))?;
        match self.shape {
            VolumeShape::Rect => match self.x1 {
                Some(x1) if x1[0] > self.x0[0] && x1[1] > self.x0[1] => Ok(()),
                _ => Err(HybridError::ConfigError(format!(
                    "Source {}: RECT shape needs x1 above and right of x0",
                    self.name
                ))),
            },
            VolumeShape::Circle => match self.radius {
                Some(r) => require_positive(r, &format!("{}.radius", self.name)),
                None => Err(HybridError::ConfigError(format!(
                    "Source {}: CIRCLE shape needs a radius",
                    self.name
                ))),
            },
        }
    }
}
