// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Hybrid Interactions
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Volume collisions (DSMC, MCC), chemistry, energy transfer and surface
//! impact reactions of the hybrid PIC engine.

pub mod chemistry;
pub mod dsmc;
pub mod energy_transfer;
pub mod mcc;
pub mod rate;
pub mod registry;
pub mod sigma;
pub mod surface;
pub mod volume;

#[cfg(test)]
mod test_support;
