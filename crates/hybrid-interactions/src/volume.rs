// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Volume Interactions
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-timestep volume interaction contract and shared diagnostics.

use hybrid_core::source::SourceModule;
use hybrid_core::world::World;
use hybrid_math::field::FieldCollection2D;
use hybrid_types::error::HybridResult;
use hybrid_types::state::StepContext;
use rand::RngCore;

/// A pass over fields or particle populations run once per timestep.
pub trait VolumeInteraction {
    fn name(&self) -> &str;

    /// Resolve materials and register output fields. Called once, after
    /// every material and mesh exists.
    fn init(&mut self, world: &mut World, sources: &mut SourceModule) -> HybridResult<()>;

    fn perform(
        &mut self,
        world: &mut World,
        sources: &mut SourceModule,
        ctx: &StepContext,
        rng: &mut dyn RngCore,
    );

    /// Drop accumulated samples, e.g. on reaching steady state.
    fn clear_samples(&mut self, _world: &mut World) {}

    /// Rate field computed by the last `perform`, if any.
    fn rate(&self) -> Option<&FieldCollection2D> {
        None
    }

    /// Per-source density change requested by the last `perform`.
    fn dn_sources(&self) -> &[FieldCollection2D] {
        &[]
    }
}

/// `""` for the first instance of a diagnostic, `"-N"` for the N-th.
pub fn instance_suffix(instance: usize) -> String {
    if instance == 0 {
        String::new()
    } else {
        format!("-{}", instance + 1)
    }
}

/// Copy `data` into the world field `name` if it is registered.
pub(crate) fn publish(world: &mut World, name: &str, data: &FieldCollection2D) {
    if let Some(field) = world.fields.get_mut(name) {
        field.copy_from(data);
    }
}

/// Collision sample accumulators shared by DSMC and MCC.
#[derive(Debug, Clone)]
pub(crate) struct CollisionSamples {
    pub count_name: String,
    pub nu_name: String,
    pub count_sum: FieldCollection2D,
    pub real_sum: FieldCollection2D,
    pub num_samples: usize,
    pub steady_state: bool,
}

impl CollisionSamples {
    pub fn new(prefix: &str, instance: usize, world: &World) -> Self {
        let suffix = instance_suffix(instance);
        CollisionSamples {
            count_name: format!("{prefix}-count{suffix}"),
            nu_name: format!("{prefix}-nu{suffix}"),
            count_sum: FieldCollection2D::new(&world.domain),
            real_sum: FieldCollection2D::new(&world.domain),
            num_samples: 0,
            steady_state: false,
        }
    }

    pub fn register(&self, world: &mut World) {
        world.fields.add(&self.count_name, "#", &world.domain);
        world.fields.add(&self.nu_name, "#/s", &world.domain);
    }

    /// True exactly once, on the first steady-state step.
    pub fn enter_steady_state(&mut self, ctx: &StepContext) -> bool {
        if ctx.steady_state && !self.steady_state {
            self.steady_state = true;
            return true;
        }
        false
    }

    pub fn clear(&mut self) {
        self.count_sum.clear();
        self.real_sum.clear();
        self.num_samples = 0;
    }

    pub fn record(&mut self, mesh: usize, lc: [f64; 2], real: f64) {
        self.count_sum.field_mut(mesh).scatter(lc, 1.0);
        self.real_sum.field_mut(mesh).scatter(lc, real);
    }

    /// Publish `count_sum/N` and `real_sum/(N·dt_eff)`.
    pub fn publish(&self, world: &mut World, dt_eff: f64) {
        if self.num_samples == 0 {
            return;
        }
        let n = self.num_samples as f64;
        let mut count = self.count_sum.clone();
        count.scale(1.0 / n);
        publish(world, &self.count_name, &count);
        if dt_eff > 0.0 {
            let mut nu = self.real_sum.clone();
            nu.scale(1.0 / (n * dt_eff));
            publish(world, &self.nu_name, &nu);
        }
    }
}
