// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Hybrid Math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Mesh, field and sampling primitives for the hybrid PIC engine.

pub mod boundary;
pub mod field;
pub mod mesh;
pub mod sampling;
pub mod table;
