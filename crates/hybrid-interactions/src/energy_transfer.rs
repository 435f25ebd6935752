// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Energy Transfer
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Radiative and ionization energy losses charged to a material's energy
//! source field.

use crate::volume::{publish, VolumeInteraction};
use hybrid_core::source::SourceModule;
use hybrid_core::world::World;
use hybrid_math::field::FieldCollection2D;
use hybrid_math::table::LinearTable;
use hybrid_types::config::EnergyTransferConfig;
use hybrid_types::constants::{EV_TO_J, K_BOLTZMANN, K_TO_EV, M_ELECTRON, PLANCK_H};
use hybrid_types::error::{HybridError, HybridResult};
use hybrid_types::state::{MaterialId, StepContext};
use rand::RngCore;
use std::f64::consts::PI;

/// Default erg → J conversion of line-emission tables.
pub const DEFAULT_LINE_EMISSION_MULTIPLIER: f64 = 1e-7;

#[derive(Debug, Clone)]
pub enum EnergyModel {
    /// `P = L(Tₑ)·n²` with `L` tabulated against Tₑ in eV.
    LineEmission { table: LinearTable, multiplier: f64 },
    /// Energy needed to relax toward the Saha ionization balance.
    Saha {
        degeneracy_ratio: f64,
        /// Ionization energy (J).
        delta_e: f64,
        multiplier: f64,
    },
}

/// Equilibrium electron density of a singly ionized gas with `n_total`
/// heavy particles per m³ at temperature `t_k`.
pub fn saha_electron_density(n_total: f64, t_k: f64, degeneracy_ratio: f64, delta_e: f64) -> f64 {
    if !(n_total > 0.0) || !(t_k > 0.0) {
        return 0.0;
    }
    let lambda = PLANCK_H / (2.0 * PI * M_ELECTRON * K_BOLTZMANN * t_k).sqrt();
    let s = 2.0 / lambda.powi(3) * degeneracy_ratio * (-delta_e / (K_BOLTZMANN * t_k)).exp();
    if !(s > 0.0) {
        return 0.0;
    }
    // positive root of ne² + s·ne - s·n = 0, written without cancellation
    let ne = 2.0 * s * n_total / (s + (s * s + 4.0 * s * n_total).sqrt());
    if ne.is_finite() {
        ne.clamp(0.0, n_total)
    } else {
        n_total
    }
}

pub struct EnergyTransfer {
    name: String,
    sources: Vec<MaterialId>,
    model: EnergyModel,
    power: FieldCollection2D,
    power_field: String,
}

impl EnergyTransfer {
    pub fn new(cfg: &EnergyTransferConfig, world: &World) -> HybridResult<Self> {
        if cfg.sources.is_empty() {
            return Err(HybridError::ConfigError(
                "Energy transfer needs at least one source".to_string(),
            ));
        }
        let sources = cfg
            .sources
            .iter()
            .map(|name| world.materials.id(name))
            .collect::<HybridResult<Vec<_>>>()?;
        let tag = cfg.model.trim().to_uppercase();
        let model = match tag.as_str() {
            "LINE_EMISSION" => EnergyModel::LineEmission {
                table: LinearTable::from_columns(
                    cfg.line_emission_ev.clone(),
                    cfg.line_emission_erg.clone(),
                )?,
                multiplier: cfg.multiplier.unwrap_or(DEFAULT_LINE_EMISSION_MULTIPLIER),
            },
            "SAHA" => {
                let delta_e = cfg.delta_e.ok_or_else(|| {
                    HybridError::ConfigError("SAHA energy transfer needs <delta_e>".to_string())
                })?;
                EnergyModel::Saha {
                    degeneracy_ratio: cfg.degeneracy_ratio.unwrap_or(1.0),
                    delta_e: delta_e * EV_TO_J,
                    multiplier: cfg.multiplier.unwrap_or(1.0),
                }
            }
            _ => {
                return Err(HybridError::UnknownTag {
                    kind: "energy transfer model",
                    tag: cfg.model.clone(),
                })
            }
        };
        let name = format!("{tag} {}", cfg.sources.join("+"));
        Ok(EnergyTransfer {
            power_field: format!("et-power:{name}"),
            name,
            sources,
            model,
            power: FieldCollection2D::new(&world.domain),
        })
    }

    pub fn model(&self) -> &EnergyModel {
        &self.model
    }

    /// Loss rate (W/m³) at node `(i, j)`.
    fn node_power(&self, world: &World, m: usize, i: usize, j: usize, dt: f64) -> f64 {
        let first = world.materials.get(self.sources[0]);
        let n = first.den.field(m).at(i, j);
        let t = first.temp.field(m).at(i, j);
        match &self.model {
            EnergyModel::LineEmission { table, multiplier } => {
                if !(t > 0.0) || !(n > 0.0) {
                    return 0.0;
                }
                table.eval(t * K_TO_EV) * multiplier * n * n
            }
            EnergyModel::Saha {
                degeneracy_ratio,
                delta_e,
                multiplier,
            } => {
                let n_total: f64 = self
                    .sources
                    .iter()
                    .map(|id| world.materials.get(*id).den.field(m).at(i, j))
                    .sum();
                let ne = saha_electron_density(n_total, t, *degeneracy_ratio, *delta_e);
                if !(t > 0.0) {
                    return 0.0;
                }
                (ne - n) * delta_e / dt * multiplier
            }
        }
    }
}

impl VolumeInteraction for EnergyTransfer {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, world: &mut World, _sources: &mut SourceModule) -> HybridResult<()> {
        world.fields.add(&self.power_field, "W/m³", &world.domain);
        Ok(())
    }

    fn perform(
        &mut self,
        world: &mut World,
        _sources: &mut SourceModule,
        ctx: &StepContext,
        _rng: &mut dyn RngCore,
    ) {
        if !(ctx.dt > 0.0) {
            return;
        }
        for (m, mesh) in world.domain.meshes().iter().enumerate() {
            for i in 0..mesh.ni {
                for j in 0..mesh.nj {
                    let p = self.node_power(world, m, i, j, ctx.dt);
                    self.power.field_mut(m).set(i, j, p);
                }
            }
        }
        let target = &mut world.materials.get_mut(self.sources[0]).energy_source;
        for m in 0..target.num_meshes() {
            *target.field_mut(m).data_mut() -= self.power.field(m).data();
        }
        publish(world, &self.power_field, &self.power);
    }

    fn rate(&self) -> Option<&FieldCollection2D> {
        Some(&self.power)
    }
}
