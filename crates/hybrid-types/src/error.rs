// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Errors
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HybridError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown {kind} type '{tag}'")]
    UnknownTag { kind: &'static str, tag: String },

    #[error("Unknown material '{0}'")]
    UnknownMaterial(String),

    #[error("Material '{name}' must be {expected}")]
    MaterialKind { name: String, expected: &'static str },

    #[error("Failed to find field collection '{0}'")]
    UnknownField(String),

    #[error("Physics constraint violated: {0}")]
    PhysicsViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type HybridResult<T> = Result<T, HybridError>;
