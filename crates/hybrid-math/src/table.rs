// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Lookup Tables
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use hybrid_types::error::{HybridError, HybridResult};

/// Piecewise-linear table, clamped to the end values outside its range.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearTable {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl LinearTable {
    /// Build from `(x, y)` pairs; pairs are sorted by `x`.
    pub fn from_pairs(pairs: &[[f64; 2]]) -> HybridResult<Self> {
        let mut sorted = pairs.to_vec();
        sorted.sort_by(|a, b| a[0].total_cmp(&b[0]));
        let (x, y) = sorted.iter().map(|p| (p[0], p[1])).unzip();
        Self::from_columns(x, y)
    }

    pub fn from_columns(x: Vec<f64>, y: Vec<f64>) -> HybridResult<Self> {
        if x.is_empty() || x.len() != y.len() {
            return Err(HybridError::ConfigError(format!(
                "table needs matching non-empty columns, got {} and {}",
                x.len(),
                y.len()
            )));
        }
        if x.iter().chain(&y).any(|v| !v.is_finite()) {
            return Err(HybridError::ConfigError(
                "table entries must be finite".to_string(),
            ));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(HybridError::ConfigError(
                "table abscissae must be strictly increasing".to_string(),
            ));
        }
        Ok(LinearTable { x, y })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn eval(&self, x: f64) -> f64 {
        let n = self.x.len();
        if x <= self.x[0] {
            return self.y[0];
        }
        if x >= self.x[n - 1] {
            return self.y[n - 1];
        }
        let hi = self.x.partition_point(|&xp| xp <= x);
        let lo = hi - 1;
        let t = (x - self.x[lo]) / (self.x[hi] - self.x[lo]);
        self.y[lo] + t * (self.y[hi] - self.y[lo])
    }
}
