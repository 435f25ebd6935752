// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Boltzmann constant (J/K)
pub const K_BOLTZMANN: f64 = 1.380649e-23;

/// Elementary charge (C)
pub const Q_ELECTRON: f64 = 1.602176634e-19;

/// Electron mass (kg)
pub const M_ELECTRON: f64 = 9.1093837015e-31;

/// Atomic mass unit (kg)
pub const AMU_KG: f64 = 1.66053906660e-27;

/// Planck constant (J·s)
pub const PLANCK_H: f64 = 6.62607015e-34;

/// One electron-volt in joules.
pub const EV_TO_J: f64 = Q_ELECTRON;

/// Temperature of one electron-volt (K).
pub const EV_TO_K: f64 = Q_ELECTRON / K_BOLTZMANN;

/// Kelvin to electron-volt conversion.
pub const K_TO_EV: f64 = K_BOLTZMANN / Q_ELECTRON;

/// Erg to joule.
pub const ERG_TO_J: f64 = 1e-7;
