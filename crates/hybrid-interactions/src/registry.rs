// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Interactions Registry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Tag → factory registry that materializes configured interactions and
//! runs them once per timestep in registration order.

use crate::chemistry::ChemicalReaction;
use crate::dsmc::Dsmc;
use crate::energy_transfer::EnergyTransfer;
use crate::mcc::Mcc;
use crate::sigma::{SigmaFactory, SigmaRegistry};
use crate::surface::{MaterialInteraction, SurfaceInteractions, SurfaceModel};
use crate::volume::VolumeInteraction;
use hybrid_core::source::SourceModule;
use hybrid_core::world::World;
use hybrid_types::config::{
    ChemistryConfig, ConfigEntry, DsmcConfig, EnergyTransferConfig, MccConfig, SimulationConfig,
    SurfaceImpactConfig,
};
use hybrid_types::error::{HybridError, HybridResult};
use hybrid_types::state::StepContext;
use rand::RngCore;
use std::collections::BTreeMap;

/// A configured interaction, either run every step or on wall impacts.
pub enum Interaction {
    Volume(Box<dyn VolumeInteraction>),
    Surface(MaterialInteraction),
}

/// Everything a factory may consult while building one interaction.
pub struct BuildContext<'a> {
    pub world: &'a World,
    pub sigmas: &'a SigmaRegistry,
    surface_models: &'a BTreeMap<String, SurfaceModel>,
    instances: &'a mut BTreeMap<String, usize>,
}

impl BuildContext<'_> {
    /// Zero-based count of earlier interactions of `kind`.
    pub fn next_instance(&mut self, kind: &str) -> usize {
        let counter = self.instances.entry(kind.to_string()).or_insert(0);
        let instance = *counter;
        *counter += 1;
        instance
    }

    pub fn surface_model(&self, tag: &str) -> HybridResult<SurfaceModel> {
        self.surface_models
            .get(&tag.trim().to_ascii_uppercase())
            .copied()
            .ok_or_else(|| HybridError::UnknownTag {
                kind: "surface model",
                tag: tag.to_string(),
            })
    }
}

pub type InteractionFactory = fn(&ConfigEntry, &mut BuildContext<'_>) -> HybridResult<Interaction>;

fn dsmc_factory(entry: &ConfigEntry, ctx: &mut BuildContext<'_>) -> HybridResult<Interaction> {
    let cfg: DsmcConfig = entry.parse()?;
    let instance = ctx.next_instance("DSMC");
    let dsmc = Dsmc::new(&cfg, ctx.sigmas, instance, ctx.world)?;
    Ok(Interaction::Volume(Box::new(dsmc)))
}

fn mcc_factory(entry: &ConfigEntry, ctx: &mut BuildContext<'_>) -> HybridResult<Interaction> {
    let cfg: MccConfig = entry.parse()?;
    let instance = ctx.next_instance("MCC");
    let mcc = Mcc::new(&cfg, ctx.sigmas, instance, ctx.world)?;
    Ok(Interaction::Volume(Box::new(mcc)))
}

fn chemistry_factory(entry: &ConfigEntry, ctx: &mut BuildContext<'_>) -> HybridResult<Interaction> {
    let cfg: ChemistryConfig = entry.parse()?;
    let reaction = ChemicalReaction::new(&cfg, ctx.sigmas, ctx.world)?;
    Ok(Interaction::Volume(Box::new(reaction)))
}

fn energy_transfer_factory(
    entry: &ConfigEntry,
    ctx: &mut BuildContext<'_>,
) -> HybridResult<Interaction> {
    let cfg: EnergyTransferConfig = entry.parse()?;
    Ok(Interaction::Volume(Box::new(EnergyTransfer::new(&cfg, ctx.world)?)))
}

fn surface_factory(entry: &ConfigEntry, ctx: &mut BuildContext<'_>) -> HybridResult<Interaction> {
    let cfg: SurfaceImpactConfig = entry.parse()?;
    let model = ctx.surface_model(&cfg.model)?;
    Ok(Interaction::Surface(MaterialInteraction::new(&cfg, model, ctx.world)?))
}

/// Owns the configured interactions.
pub struct InteractionsModule {
    factories: BTreeMap<String, InteractionFactory>,
    sigmas: SigmaRegistry,
    surface_models: BTreeMap<String, SurfaceModel>,
    instances: BTreeMap<String, usize>,
    volume: Vec<Box<dyn VolumeInteraction>>,
    surface: SurfaceInteractions,
    started: bool,
}

impl Default for InteractionsModule {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionsModule {
    /// Module with the built-in interactions, sigmas and surface models.
    pub fn new() -> Self {
        let mut module = InteractionsModule {
            factories: BTreeMap::new(),
            sigmas: SigmaRegistry::new(),
            surface_models: BTreeMap::new(),
            instances: BTreeMap::new(),
            volume: Vec::new(),
            surface: SurfaceInteractions::new(),
            started: false,
        };
        module.register_interaction("DSMC", dsmc_factory);
        module.register_interaction("MCC", mcc_factory);
        module.register_interaction("CHEMISTRY", chemistry_factory);
        module.register_interaction("ENERGY_TRANSFER", energy_transfer_factory);
        module.register_interaction("SURFACE_HIT", surface_factory);
        module.register_interaction("SURFACE_IMPACT", surface_factory);
        module.register_surface_model("NONE", SurfaceModel::None);
        module.register_surface_model("ABSORB", SurfaceModel::Absorb);
        module.register_surface_model("SPECULAR", SurfaceModel::Specular);
        module.register_surface_model("DIFFUSE", SurfaceModel::Diffuse);
        module.register_surface_model("COSINE", SurfaceModel::Cosine);
        module
    }

    pub fn register_interaction(&mut self, tag: &str, factory: InteractionFactory) {
        self.factories.insert(tag.trim().to_ascii_uppercase(), factory);
    }

    pub fn register_sigma(&mut self, tag: &str, factory: SigmaFactory) {
        self.sigmas.register(tag, factory);
    }

    pub fn register_surface_model(&mut self, tag: &str, model: SurfaceModel) {
        self.surface_models
            .insert(tag.trim().to_ascii_uppercase(), model);
    }

    pub fn sigmas(&self) -> &SigmaRegistry {
        &self.sigmas
    }

    /// Materialize the configured interactions; unknown tags are skipped
    /// with a warning. Returns the number of interactions added.
    pub fn process(&mut self, config: &SimulationConfig, world: &World) -> HybridResult<usize> {
        let mut built = Vec::new();
        let mut ctx = BuildContext {
            world,
            sigmas: &self.sigmas,
            surface_models: &self.surface_models,
            instances: &mut self.instances,
        };
        for entry in &config.interactions {
            match self.factories.get(&entry.key()) {
                Some(factory) => built.push(factory(entry, &mut ctx)?),
                None => log::warn!("Unknown interaction type '{}', skipping", entry.tag),
            }
        }
        let count = built.len();
        for interaction in built {
            self.add(interaction);
        }
        Ok(count)
    }

    pub fn add(&mut self, interaction: Interaction) {
        match interaction {
            Interaction::Volume(vi) => self.add_volume_interaction(vi),
            Interaction::Surface(mi) => self.surface.add(mi),
        }
    }

    pub fn add_volume_interaction(&mut self, interaction: Box<dyn VolumeInteraction>) {
        log::info!("Added interaction '{}'", interaction.name());
        self.volume.push(interaction);
    }

    /// Initialize every interaction; later calls are no-ops.
    pub fn start(&mut self, world: &mut World, sources: &mut SourceModule) -> HybridResult<()> {
        if self.started {
            return Ok(());
        }
        for interaction in self.volume.iter_mut() {
            interaction.init(world, sources)?;
        }
        for mi in self.surface.iter() {
            mi.init(world, sources)?;
        }
        self.started = true;
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Run every volume interaction once, in registration order.
    pub fn perform_interactions(
        &mut self,
        world: &mut World,
        sources: &mut SourceModule,
        ctx: &StepContext,
        rng: &mut dyn RngCore,
    ) {
        for interaction in self.volume.iter_mut() {
            interaction.perform(world, sources, ctx, rng);
        }
    }

    pub fn clear_samples(&mut self, world: &mut World) {
        for interaction in self.volume.iter_mut() {
            interaction.clear_samples(world);
        }
    }

    pub fn volume_interactions(&self) -> &[Box<dyn VolumeInteraction>] {
        &self.volume
    }

    pub fn surface_interactions(&self) -> &SurfaceInteractions {
        &self.surface
    }
}
