// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Mesh
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Uniform structured meshes and the ordered mesh list of a domain.

use hybrid_types::error::{HybridError, HybridResult};
use hybrid_types::state::{DomainType, NodeType};
use ndarray::Array2;
use std::f64::consts::PI;

/// Fraction of a radial cell used as the effective radius of on-axis nodes.
const AXIS_RADIUS_FRACTION: f64 = 0.25;

/// Uniform 2D mesh with `ni × nj` nodes.
///
/// Logical coordinate `lc = (x - x0) / dh`; node `(i, j)` sits at integer `lc`.
#[derive(Debug, Clone)]
pub struct UniformMesh {
    pub ni: usize,
    pub nj: usize,
    pub x0: [f64; 2],
    pub dh: [f64; 2],
    pub domain_type: DomainType,
    node_type: Array2<NodeType>,
}

impl UniformMesh {
    /// Mesh spanning `[x0, x1]` with `ni × nj` nodes.
    pub fn new(
        ni: usize,
        nj: usize,
        x0: [f64; 2],
        x1: [f64; 2],
        domain_type: DomainType,
    ) -> HybridResult<Self> {
        if ni < 2 || nj < 2 {
            return Err(HybridError::ConfigError(format!(
                "mesh needs at least 2x2 nodes, got {ni}x{nj}"
            )));
        }
        for d in 0..2 {
            if !x0[d].is_finite() || !x1[d].is_finite() || x1[d] <= x0[d] {
                return Err(HybridError::ConfigError(format!(
                    "mesh extent must satisfy x0 < x1 along axis {d}"
                )));
            }
        }
        let dh = [
            (x1[0] - x0[0]) / (ni - 1) as f64,
            (x1[1] - x0[1]) / (nj - 1) as f64,
        ];
        Ok(UniformMesh {
            ni,
            nj,
            x0,
            dh,
            domain_type,
            node_type: Array2::from_elem((ni, nj), NodeType::Open),
        })
    }

    pub fn num_cells(&self) -> usize {
        (self.ni - 1) * (self.nj - 1)
    }

    /// Physical position of a logical coordinate.
    pub fn pos(&self, lc: [f64; 2]) -> [f64; 2] {
        [
            self.x0[0] + lc[0] * self.dh[0],
            self.x0[1] + lc[1] * self.dh[1],
        ]
    }

    /// Logical coordinate of a physical position, `None` outside the mesh.
    pub fn x_to_lc(&self, x: [f64; 2]) -> Option<[f64; 2]> {
        let lc = [
            (x[0] - self.x0[0]) / self.dh[0],
            (x[1] - self.x0[1]) / self.dh[1],
        ];
        let inside = lc[0] >= 0.0
            && lc[1] >= 0.0
            && lc[0] <= (self.ni - 1) as f64
            && lc[1] <= (self.nj - 1) as f64;
        inside.then_some(lc)
    }

    pub fn contains(&self, x: [f64; 2]) -> bool {
        self.x_to_lc(x).is_some()
    }

    fn radius(&self, x: [f64; 2]) -> f64 {
        match self.domain_type {
            DomainType::Xy => 1.0,
            DomainType::Rz => x[0],
            DomainType::Zr => x[1],
        }
    }

    fn radial_spacing(&self) -> f64 {
        match self.domain_type {
            DomainType::Zr => self.dh[1],
            _ => self.dh[0],
        }
    }

    /// Volume of cell `(i, j)` spanning nodes `i..=i+1`, `j..=j+1`.
    pub fn cell_volume(&self, i: usize, j: usize) -> f64 {
        let area = self.dh[0] * self.dh[1];
        match self.domain_type {
            DomainType::Xy => area,
            _ => {
                let rc = self.radius(self.pos([i as f64 + 0.5, j as f64 + 0.5]));
                2.0 * PI * rc * area
            }
        }
    }

    /// Control volume of node `(i, j)`; half cells on the mesh edges.
    pub fn node_volume(&self, i: usize, j: usize) -> f64 {
        let fi = if i == 0 || i == self.ni - 1 { 0.5 } else { 1.0 };
        let fj = if j == 0 || j == self.nj - 1 { 0.5 } else { 1.0 };
        let area = fi * fj * self.dh[0] * self.dh[1];
        match self.domain_type {
            DomainType::Xy => area,
            _ => {
                let r = self
                    .radius(self.pos([i as f64, j as f64]))
                    .max(AXIS_RADIUS_FRACTION * self.radial_spacing());
                2.0 * PI * r * area
            }
        }
    }

    pub fn node_type(&self, i: usize, j: usize) -> NodeType {
        self.node_type[[i, j]]
    }

    pub fn set_node_type(&mut self, i: usize, j: usize, node_type: NodeType) {
        self.node_type[[i, j]] = node_type;
    }

    /// Flag all nodes inside the box `[min, max]` as solid.
    pub fn mark_solid(&mut self, min: [f64; 2], max: [f64; 2]) {
        for i in 0..self.ni {
            for j in 0..self.nj {
                let x = self.pos([i as f64, j as f64]);
                if x[0] >= min[0] && x[0] <= max[0] && x[1] >= min[1] && x[1] <= max[1] {
                    self.node_type[[i, j]] = NodeType::Solid;
                }
            }
        }
    }

    /// Cell index containing a logical coordinate, clamped to the last cell.
    pub fn cell_of(&self, lc: [f64; 2]) -> (usize, usize) {
        let i = (lc[0].max(0.0) as usize).min(self.ni - 2);
        let j = (lc[1].max(0.0) as usize).min(self.nj - 2);
        (i, j)
    }

    /// True when the position lies in a cell whose four nodes are solid.
    pub fn is_internal(&self, x: [f64; 2]) -> bool {
        let Some(lc) = self.x_to_lc(x) else {
            return false;
        };
        let (i, j) = self.cell_of(lc);
        [(i, j), (i + 1, j), (i, j + 1), (i + 1, j + 1)]
            .iter()
            .all(|&(a, b)| self.node_type[[a, b]] == NodeType::Solid)
    }
}

/// Ordered list of meshes; the order is fixed for a run.
#[derive(Debug, Clone, Default)]
pub struct Domain {
    pub domain_type: DomainType,
    meshes: Vec<UniformMesh>,
}

impl Domain {
    pub fn new(domain_type: DomainType) -> Self {
        Domain {
            domain_type,
            meshes: Vec::new(),
        }
    }

    /// Single-mesh domain.
    pub fn single(mesh: UniformMesh) -> Self {
        Domain {
            domain_type: mesh.domain_type,
            meshes: vec![mesh],
        }
    }

    pub fn add_mesh(&mut self, mut mesh: UniformMesh) -> usize {
        mesh.domain_type = self.domain_type;
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn meshes(&self) -> &[UniformMesh] {
        &self.meshes
    }

    pub fn mesh(&self, index: usize) -> &UniformMesh {
        &self.meshes[index]
    }

    pub fn mesh_mut(&mut self, index: usize) -> &mut UniformMesh {
        &mut self.meshes[index]
    }

    pub fn num_meshes(&self) -> usize {
        self.meshes.len()
    }

    /// First mesh containing `x`, with the logical coordinate on it.
    pub fn locate(&self, x: [f64; 2]) -> Option<(usize, [f64; 2])> {
        self.meshes
            .iter()
            .enumerate()
            .find_map(|(m, mesh)| mesh.x_to_lc(x).map(|lc| (m, lc)))
    }

    /// True when `x` falls inside solid geometry of the mesh containing it.
    pub fn is_internal(&self, x: [f64; 2]) -> bool {
        self.locate(x)
            .map(|(m, _)| self.meshes[m].is_internal(x))
            .unwrap_or(false)
    }
}
