// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Chemical Reactions
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Rate-law chemistry between fluid and kinetic materials.
//!
//! Each step evaluates `k` on the mesh nodes, converts it to a density
//! change `dn = k·dt·Π n_s` limited by every source, books `c·dn` into the
//! product volume sources and removes `c·dn` from the sources. Fluid
//! sources are decremented directly; kinetic sources lose macroparticle
//! weight near the node, never more than a particle carries.

use crate::rate::RateParser;
use crate::sigma::SigmaRegistry;
use crate::volume::{publish, VolumeInteraction};
use hybrid_core::material::MaterialKind;
use hybrid_core::source::{DeficitSourceId, SourceModule};
use hybrid_core::world::World;
use hybrid_math::field::FieldCollection2D;
use hybrid_types::config::{parse_stoichiometry, ChemistryConfig};
use hybrid_types::constants::{EV_TO_J, K_BOLTZMANN};
use hybrid_types::error::{HybridError, HybridResult};
use hybrid_types::state::{MaterialId, StepContext};
use rand::RngCore;
use std::f64::consts::PI;

pub struct ChemicalReaction {
    name: String,
    sources: Vec<(f64, MaterialId)>,
    products: Vec<(f64, MaterialId)>,
    rate_parser: RateParser,
    /// Energy released per reaction (J).
    energy_release: f64,
    mass_ave: f64,
    rate: FieldCollection2D,
    dn_sources: Vec<FieldCollection2D>,
    power: FieldCollection2D,
    product_sources: Vec<DeficitSourceId>,
    rate_field: String,
}

fn resolve(entries: &[String], world: &World) -> HybridResult<Vec<(f64, MaterialId)>> {
    parse_stoichiometry(entries)?
        .into_iter()
        .map(|(coeff, name)| {
            let id = world.materials.id(&name)?;
            let mat = world.materials.get(id);
            if matches!(mat.kind, MaterialKind::Solid) {
                return Err(HybridError::MaterialKind {
                    name,
                    expected: "kinetic or fluid",
                });
            }
            Ok((coeff, id))
        })
        .collect()
}

impl ChemicalReaction {
    pub fn new(cfg: &ChemistryConfig, sigmas: &SigmaRegistry, world: &World) -> HybridResult<Self> {
        cfg.validate()?;
        let rate_cfg = cfg.rate.as_ref().ok_or_else(|| {
            HybridError::ConfigError("Chemical reaction is missing a <rate>".to_string())
        })?;
        let sources = resolve(&cfg.sources, world)?;
        let products = resolve(&cfg.products, world)?;
        let total: f64 = sources.iter().map(|(c, _)| c).sum();
        let mass_ave = sources
            .iter()
            .map(|(c, id)| c * world.materials.get(*id).mass)
            .sum::<f64>()
            / total;
        let name = cfg.display_name();
        Ok(ChemicalReaction {
            rate_field: format!("cr-rate:{name}"),
            name,
            rate_parser: RateParser::new(rate_cfg, sigmas)?,
            energy_release: cfg.energy_release * EV_TO_J,
            mass_ave,
            rate: FieldCollection2D::new(&world.domain),
            dn_sources: vec![FieldCollection2D::new(&world.domain); sources.len()],
            power: FieldCollection2D::new(&world.domain),
            product_sources: Vec::new(),
            sources,
            products,
        })
    }

    pub fn product_sources(&self) -> &[DeficitSourceId] {
        &self.product_sources
    }

    fn eval_rate(&mut self, world: &World) {
        let Some(dep) = world.field_collection(self.rate_parser.dep_var()) else {
            self.rate.clear();
            return;
        };
        let weight: f64 = self.sources.iter().map(|(c, _)| c).sum();
        for (m, mesh) in world.domain.meshes().iter().enumerate() {
            let rate = self.rate.field_mut(m);
            for i in 0..mesh.ni {
                for j in 0..mesh.nj {
                    let mut k = self.rate_parser.eval(dep.field(m).at(i, j), self.mass_ave);
                    if self.rate_parser.is_sigma() {
                        let t_ave = self
                            .sources
                            .iter()
                            .map(|(c, id)| c * world.materials.get(*id).temp.field(m).at(i, j))
                            .sum::<f64>()
                            / weight;
                        k *= (8.0 * K_BOLTZMANN * t_ave.max(0.0) / (PI * self.mass_ave)).sqrt();
                    }
                    rate.set(i, j, k);
                }
            }
        }
    }

    /// Book this step's density change on sources and products; returns
    /// the summed reaction density over all nodes.
    fn update_dn(&mut self, world: &World, sources: &mut SourceModule, dt: f64) -> f64 {
        let materials = &world.materials;
        // products inherit the temperature of the heaviest reactant
        if let Some((_, heavy)) = self.sources.iter().max_by(|a, b| {
            materials.get(a.1).mass.total_cmp(&materials.get(b.1).mass)
        }) {
            let temp = &materials.get(*heavy).temp;
            for id in &self.product_sources {
                sources.deficit_source_mut(*id).temperature_mut().copy_from(temp);
            }
        }
        self.power.clear();

        let mut total = 0.0;
        for (m, mesh) in world.domain.meshes().iter().enumerate() {
            for i in 0..mesh.ni {
                for j in 0..mesh.nj {
                    let k = self.rate.field(m).at(i, j);
                    if !(k > 0.0) {
                        continue;
                    }
                    let mut dn = k * dt;
                    for (_, id) in &self.sources {
                        dn *= materials.get(*id).den.field(m).at(i, j);
                    }
                    for (c, id) in &self.sources {
                        dn = dn.min(materials.get(*id).den.field(m).at(i, j) / c);
                    }
                    if !(dn > 0.0) {
                        continue;
                    }
                    for (s, (c, _)) in self.sources.iter().enumerate() {
                        self.dn_sources[s].field_mut(m).add(i, j, -c * dn);
                    }
                    for ((c, _), id) in self.products.iter().zip(&self.product_sources) {
                        sources
                            .deficit_source_mut(*id)
                            .dn_mut()
                            .field_mut(m)
                            .add(i, j, c * dn);
                    }
                    self.power.field_mut(m).add(i, j, dn / dt * self.energy_release);
                    total += dn;
                }
            }
        }
        total
    }

    /// Apply the booked source consumption.
    fn consume(&mut self, world: &mut World) {
        let World {
            domain, materials, ..
        } = world;
        for (s, (_, id)) in self.sources.iter().enumerate() {
            let mat = materials.get_mut(*id);
            let dn = &mut self.dn_sources[s];
            match mat.kind {
                MaterialKind::Fluid => {
                    for (m, mesh) in domain.meshes().iter().enumerate() {
                        let den = mat.den.field_mut(m);
                        for i in 0..mesh.ni {
                            for j in 0..mesh.nj {
                                let value = (den.at(i, j) + dn.field(m).at(i, j)).max(0.0);
                                den.set(i, j, value);
                            }
                        }
                    }
                    dn.clear();
                }
                MaterialKind::Kinetic(_) => {
                    for (m, mesh) in domain.meshes().iter().enumerate() {
                        let Some(parts) = mat.particles_mut(m) else {
                            continue;
                        };
                        let field = dn.field_mut(m);
                        parts.retain_mut(|p| {
                            let i = ((p.lc[0] + 0.5) as usize).min(mesh.ni - 1);
                            let j = ((p.lc[1] + 0.5) as usize).min(mesh.nj - 1);
                            let volume = mesh.node_volume(i, j);
                            let owed = -field.at(i, j) * volume;
                            if !(owed > 0.0) {
                                return true;
                            }
                            if owed >= p.mpw {
                                field.add(i, j, p.mpw / volume);
                                false
                            } else {
                                p.mpw -= owed;
                                field.set(i, j, 0.0);
                                true
                            }
                        });
                    }
                }
                MaterialKind::Solid => {}
            }
        }
    }

    /// Book the reaction power `W = dn/dt·E` stoichiometrically: each
    /// reactant loses `c·W`, each product gains `c·W`.
    fn deposit_energy(&self, world: &mut World) {
        if self.energy_release == 0.0 {
            return;
        }
        let booked = self
            .sources
            .iter()
            .map(|(c, id)| (-c, id))
            .chain(self.products.iter().map(|(c, id)| (*c, id)));
        for (coeff, id) in booked {
            let target = &mut world.materials.get_mut(*id).energy_source;
            for m in 0..target.num_meshes() {
                let power = self.power.field(m).data();
                target.field_mut(m).data_mut().scaled_add(coeff, power);
            }
        }
    }
}

impl VolumeInteraction for ChemicalReaction {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, world: &mut World, sources: &mut SourceModule) -> HybridResult<()> {
        world.require_field(self.rate_parser.dep_var())?;
        self.product_sources.clear();
        for (_, id) in &self.products {
            let label = format!("cr:{}:{}", self.name, world.materials.get(*id).name);
            self.product_sources
                .push(sources.add_deficit_source(&label, *id, world)?);
        }
        world.fields.add(&self.rate_field, "m³/s", &world.domain);
        log::info!(
            "Chemical reaction {} using {}",
            self.name,
            self.rate_parser.dep_var()
        );
        Ok(())
    }

    fn perform(
        &mut self,
        world: &mut World,
        sources: &mut SourceModule,
        ctx: &StepContext,
        _rng: &mut dyn RngCore,
    ) {
        if !(ctx.dt > 0.0) {
            return;
        }
        self.eval_rate(world);
        let created = self.update_dn(world, sources, ctx.dt);
        log::debug!("{}: {:.3e} m⁻³ reacted over all nodes", self.name, created);
        self.consume(world);
        self.deposit_energy(world);
        publish(world, &self.rate_field, &self.rate);
    }

    fn rate(&self) -> Option<&FieldCollection2D> {
        Some(&self.rate)
    }

    fn dn_sources(&self) -> &[FieldCollection2D] {
        &self.dn_sources
    }
}
