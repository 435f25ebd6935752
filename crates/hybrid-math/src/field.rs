// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Fields
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Node-centred scalar fields over the domain meshes.
//!
//! Values live on mesh nodes, indexed `[i, j]`. Fractional access uses
//! bilinear weights, so `scatter` followed by a sum over nodes returns the
//! deposited amount exactly.

use crate::mesh::Domain;
use hybrid_types::error::{HybridError, HybridResult};
use ndarray::Array2;
use std::collections::BTreeMap;

/// Bilinear stencil `(i0, j0, ti, tj)` clamped to the node range.
fn stencil(ni: usize, nj: usize, lc: [f64; 2]) -> (usize, usize, f64, f64) {
    let i0 = (lc[0].floor() as isize).clamp(0, ni as isize - 2) as usize;
    let j0 = (lc[1].floor() as isize).clamp(0, nj as isize - 2) as usize;
    let ti = (lc[0] - i0 as f64).clamp(0.0, 1.0);
    let tj = (lc[1] - j0 as f64).clamp(0.0, 1.0);
    (i0, j0, ti, tj)
}

/// Dense scalar field on one mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Field2D {
    data: Array2<f64>,
}

impl Field2D {
    pub fn new(ni: usize, nj: usize) -> Self {
        Field2D {
            data: Array2::zeros((ni, nj)),
        }
    }

    pub fn ni(&self) -> usize {
        self.data.nrows()
    }

    pub fn nj(&self) -> usize {
        self.data.ncols()
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.data[[i, j]]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[[i, j]] = value;
    }

    pub fn add(&mut self, i: usize, j: usize, value: f64) {
        self.data[[i, j]] += value;
    }

    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    pub fn scale(&mut self, factor: f64) {
        self.data.mapv_inplace(|v| v * factor);
    }

    pub fn copy_from(&mut self, other: &Field2D) {
        self.data.assign(&other.data);
    }

    pub fn sum(&self) -> f64 {
        self.data.sum()
    }

    /// Bilinear interpolation at a logical coordinate, clamped to the mesh.
    pub fn gather(&self, lc: [f64; 2]) -> f64 {
        let (i0, j0, ti, tj) = stencil(self.ni(), self.nj(), lc);
        let v00 = self.data[[i0, j0]];
        let v10 = self.data[[i0 + 1, j0]];
        let v01 = self.data[[i0, j0 + 1]];
        let v11 = self.data[[i0 + 1, j0 + 1]];
        (1.0 - ti) * ((1.0 - tj) * v00 + tj * v01) + ti * ((1.0 - tj) * v10 + tj * v11)
    }

    /// Distribute `value` to the four surrounding nodes with bilinear weights.
    pub fn scatter(&mut self, lc: [f64; 2], value: f64) {
        let (i0, j0, ti, tj) = stencil(self.ni(), self.nj(), lc);
        self.data[[i0, j0]] += value * (1.0 - ti) * (1.0 - tj);
        self.data[[i0 + 1, j0]] += value * ti * (1.0 - tj);
        self.data[[i0, j0 + 1]] += value * (1.0 - ti) * tj;
        self.data[[i0 + 1, j0 + 1]] += value * ti * tj;
    }

    /// Value at the centre of cell `(i, j)`.
    pub fn cell_average(&self, i: usize, j: usize) -> f64 {
        self.gather([i as f64 + 0.5, j as f64 + 0.5])
    }
}

/// One field per mesh of a domain.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCollection2D {
    fields: Vec<Field2D>,
}

impl FieldCollection2D {
    pub fn new(domain: &Domain) -> Self {
        FieldCollection2D {
            fields: domain
                .meshes()
                .iter()
                .map(|mesh| Field2D::new(mesh.ni, mesh.nj))
                .collect(),
        }
    }

    /// Collection filled with a constant.
    pub fn filled(domain: &Domain, value: f64) -> Self {
        let mut collection = Self::new(domain);
        collection.fill(value);
        collection
    }

    pub fn num_meshes(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, mesh: usize) -> &Field2D {
        &self.fields[mesh]
    }

    pub fn field_mut(&mut self, mesh: usize) -> &mut Field2D {
        &mut self.fields[mesh]
    }

    pub fn fields(&self) -> &[Field2D] {
        &self.fields
    }

    pub fn clear(&mut self) {
        self.fields.iter_mut().for_each(Field2D::clear);
    }

    pub fn fill(&mut self, value: f64) {
        self.fields.iter_mut().for_each(|f| f.fill(value));
    }

    pub fn scale(&mut self, factor: f64) {
        self.fields.iter_mut().for_each(|f| f.scale(factor));
    }

    pub fn copy_from(&mut self, other: &FieldCollection2D) {
        for (dst, src) in self.fields.iter_mut().zip(&other.fields) {
            dst.copy_from(src);
        }
    }

    /// Sum over all nodes of all meshes.
    pub fn sum(&self) -> f64 {
        self.fields.iter().map(Field2D::sum).sum()
    }
}

#[derive(Debug, Clone)]
struct NamedField {
    unit: String,
    data: FieldCollection2D,
}

/// Name → field collection store shared by all modules.
#[derive(Debug, Clone, Default)]
pub struct FieldManager {
    fields: BTreeMap<String, NamedField>,
}

impl FieldManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zeroed collection; an existing entry of the same name is kept.
    pub fn add(&mut self, name: &str, unit: &str, domain: &Domain) -> &mut FieldCollection2D {
        &mut self
            .fields
            .entry(name.to_string())
            .or_insert_with(|| NamedField {
                unit: unit.to_string(),
                data: FieldCollection2D::new(domain),
            })
            .data
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldCollection2D> {
        self.fields.get(name).map(|f| &f.data)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldCollection2D> {
        self.fields.get_mut(name).map(|f| &mut f.data)
    }

    /// Lookup that fails with `UnknownField`.
    pub fn require(&self, name: &str) -> HybridResult<&FieldCollection2D> {
        self.get(name)
            .ok_or_else(|| HybridError::UnknownField(name.to_string()))
    }

    pub fn unit(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|f| f.unit.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::UniformMesh;
    use hybrid_types::state::DomainType;

    fn domain() -> Domain {
        Domain::single(UniformMesh::new(5, 5, [0.0, 0.0], [4.0, 4.0], DomainType::Xy).unwrap())
    }

    #[test]
    fn test_gather_exact_node() {
        let mut f = Field2D::new(5, 5);
        for i in 0..5 {
            for j in 0..5 {
                f.set(i, j, (i * 10 + j) as f64);
            }
        }
        let val = f.gather([2.0, 3.0]);
        assert!((val - 23.0).abs() < 1e-12, "val = {val}, expected 23");
        let mid = f.gather([2.5, 3.5]);
        assert!((mid - 28.5).abs() < 1e-12, "mid = {mid}");
    }

    #[test]
    fn test_gather_clamps_outside() {
        let mut f = Field2D::new(3, 3);
        f.fill(7.0);
        assert!((f.gather([-4.0, 10.0]) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_scatter_preserves_total() {
        let mut f = Field2D::new(5, 5);
        f.scatter([1.3, 2.7], 2.0);
        f.scatter([4.0, 4.0], 1.0);
        assert!((f.sum() - 3.0).abs() < 1e-12);
        assert!((f.at(4, 4) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_collection_operations() {
        let d = domain();
        let mut c = FieldCollection2D::filled(&d, 2.0);
        c.scale(0.5);
        assert!((c.field(0).at(1, 1) - 1.0).abs() < 1e-12);
        assert!((c.sum() - 25.0).abs() < 1e-12);
        c.clear();
        assert_eq!(c.sum(), 0.0);
    }

    #[test]
    fn test_field_manager_add_is_idempotent() {
        let d = domain();
        let mut fm = FieldManager::new();
        fm.add("nu", "#/s", &d).field_mut(0).set(1, 1, 4.0);
        let again = fm.add("nu", "ignored", &d);
        assert_eq!(again.field(0).at(1, 1), 4.0);
        assert_eq!(fm.unit("nu"), Some("#/s"));
        assert!(fm.require("missing").is_err());
        assert_eq!(fm.names().collect::<Vec<_>>(), vec!["nu"]);
    }
}
