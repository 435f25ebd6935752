// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Hybrid Core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Materials, world state and particle sources of the hybrid PIC engine.

pub mod material;
pub mod source;
pub mod world;
