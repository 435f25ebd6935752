// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — World
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Aggregate of geometry, shared fields and materials seen by sources and
//! interactions.

use crate::material::{Material, Materials};
use hybrid_math::boundary::Boundary;
use hybrid_math::field::{FieldCollection2D, FieldManager};
use hybrid_math::mesh::Domain;
use hybrid_types::error::{HybridError, HybridResult};
use hybrid_types::state::MaterialId;

#[derive(Debug, Clone)]
pub struct World {
    pub domain: Domain,
    pub boundaries: Vec<Boundary>,
    pub fields: FieldManager,
    pub materials: Materials,
}

impl World {
    pub fn new(domain: Domain) -> Self {
        World {
            domain,
            boundaries: Vec::new(),
            fields: FieldManager::new(),
            materials: Materials::new(),
        }
    }

    pub fn add_material(&mut self, material: Material) -> HybridResult<MaterialId> {
        self.materials.add(material)
    }

    pub fn add_boundary(&mut self, boundary: Boundary) -> usize {
        self.boundaries.push(boundary);
        self.boundaries.len() - 1
    }

    pub fn boundary_index(&self, name: &str) -> HybridResult<usize> {
        self.boundaries
            .iter()
            .position(|b| b.name == name)
            .ok_or_else(|| HybridError::ConfigError(format!("Unknown boundary '{name}'")))
    }

    /// Resolve a field by name.
    ///
    /// `"<var>.<material>"` addresses material moments (`nd`, `t`, `u`, `v`,
    /// `w`, `s` for the energy source); anything else is looked up in the
    /// field manager.
    pub fn field_collection(&self, name: &str) -> Option<&FieldCollection2D> {
        if let Some((var, mat)) = name.split_once('.') {
            if let Ok(material) = self.materials.by_name(mat) {
                return match var {
                    "nd" => Some(&material.den),
                    "t" => Some(&material.temp),
                    "u" => Some(&material.vel[0]),
                    "v" => Some(&material.vel[1]),
                    "w" => Some(&material.vel[2]),
                    "s" => Some(&material.energy_source),
                    _ => None,
                };
            }
        }
        self.fields.get(name)
    }

    pub fn require_field(&self, name: &str) -> HybridResult<&FieldCollection2D> {
        self.field_collection(name)
            .ok_or_else(|| HybridError::UnknownField(name.to_string()))
    }

    /// Refresh moments of every kinetic material from its particles.
    pub fn update_moments(&mut self) {
        let World {
            domain, materials, ..
        } = self;
        for m in 0..materials.len() {
            materials.get_mut(MaterialId(m)).update_moments(domain);
        }
    }
}
