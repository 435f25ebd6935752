// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Boundaries
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Boundary geometry: polylines parametrised by a global `t`.
//!
//! `t ∈ [0, nseg)`; the integer part selects the segment and the fractional
//! part is the position along it. Normals point into the gas, i.e. to the
//! left of the walking direction.

use crate::sampling::thermal_velocity;
use hybrid_types::error::{HybridError, HybridResult};
use hybrid_types::state::DomainType;
use rand::Rng;
use std::f64::consts::PI;

/// Parametric curve piece hit by particles and used by sources.
pub trait Segment {
    fn pos(&self, t: f64) -> [f64; 2];
    /// Unit normal pointing into the gas.
    fn normal(&self, t: f64) -> [f64; 3];
    /// Unit tangent along the walking direction.
    fn tangent(&self, t: f64) -> [f64; 3];
    fn length(&self) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearSegment {
    pub x1: [f64; 2],
    pub x2: [f64; 2],
}

impl LinearSegment {
    pub fn new(x1: [f64; 2], x2: [f64; 2]) -> HybridResult<Self> {
        let seg = LinearSegment { x1, x2 };
        if !(seg.length() > 0.0) {
            return Err(HybridError::ConfigError(format!(
                "segment {x1:?} -> {x2:?} has zero length"
            )));
        }
        Ok(seg)
    }
}

impl Segment for LinearSegment {
    fn pos(&self, t: f64) -> [f64; 2] {
        [
            self.x1[0] + t * (self.x2[0] - self.x1[0]),
            self.x1[1] + t * (self.x2[1] - self.x1[1]),
        ]
    }

    fn normal(&self, t: f64) -> [f64; 3] {
        let tan = self.tangent(t);
        [-tan[1], tan[0], 0.0]
    }

    fn tangent(&self, _t: f64) -> [f64; 3] {
        let len = self.length();
        [
            (self.x2[0] - self.x1[0]) / len,
            (self.x2[1] - self.x1[1]) / len,
            0.0,
        ]
    }

    fn length(&self) -> f64 {
        let dx = self.x2[0] - self.x1[0];
        let dy = self.x2[1] - self.x1[1];
        (dx * dx + dy * dy).sqrt()
    }
}

/// Named wall or inlet made of linear segments.
#[derive(Debug, Clone)]
pub struct Boundary {
    pub name: String,
    /// Wall temperature (K).
    pub temperature: f64,
    pub domain_type: DomainType,
    segments: Vec<LinearSegment>,
    /// Cumulative surface area at the end of each segment.
    cumulative_area: Vec<f64>,
}

impl Boundary {
    /// Polyline through `points`.
    pub fn new(
        name: &str,
        points: &[[f64; 2]],
        temperature: f64,
        domain_type: DomainType,
    ) -> HybridResult<Self> {
        if points.len() < 2 {
            return Err(HybridError::ConfigError(format!(
                "boundary {name} needs at least two points"
            )));
        }
        if !temperature.is_finite() || temperature < 0.0 {
            return Err(HybridError::PhysicsViolation(format!(
                "{name}.temperature must be finite and >= 0"
            )));
        }
        let segments = points
            .windows(2)
            .map(|w| LinearSegment::new(w[0], w[1]))
            .collect::<HybridResult<Vec<_>>>()?;
        let mut boundary = Boundary {
            name: name.to_string(),
            temperature,
            domain_type,
            segments,
            cumulative_area: Vec::new(),
        };
        let mut total = 0.0;
        boundary.cumulative_area = (0..boundary.segments.len())
            .map(|s| {
                total += boundary.segment_area(s);
                total
            })
            .collect();
        Ok(boundary)
    }

    pub fn segments(&self) -> &[LinearSegment] {
        &self.segments
    }

    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    fn radius(&self, x: [f64; 2]) -> f64 {
        match self.domain_type {
            DomainType::Xy => 1.0,
            DomainType::Rz => x[0],
            DomainType::Zr => x[1],
        }
    }

    /// Lateral area of one segment (unit depth in planar domains).
    fn segment_area(&self, s: usize) -> f64 {
        let seg = &self.segments[s];
        match self.domain_type {
            DomainType::Xy => seg.length(),
            _ => PI * (self.radius(seg.x1) + self.radius(seg.x2)) * seg.length(),
        }
    }

    /// Total surface area.
    pub fn area(&self) -> f64 {
        self.cumulative_area.last().copied().unwrap_or(0.0)
    }

    fn split(&self, t: f64) -> (usize, f64) {
        let last = self.segments.len() - 1;
        let s = (t.max(0.0).floor() as usize).min(last);
        (s, (t - s as f64).clamp(0.0, 1.0))
    }

    /// Random parameter, uniform in area across segments and in length
    /// within a segment.
    pub fn random_t<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let target = rng.gen::<f64>() * self.area();
        let s = self
            .cumulative_area
            .partition_point(|&a| a < target)
            .min(self.segments.len() - 1);
        s as f64 + rng.gen::<f64>()
    }

    /// Thermal speed of a species of `mass` equilibrated with the wall.
    pub fn vth(&self, mass: f64) -> f64 {
        thermal_velocity(self.temperature, mass)
    }
}

impl Segment for Boundary {
    fn pos(&self, t: f64) -> [f64; 2] {
        let (s, u) = self.split(t);
        self.segments[s].pos(u)
    }

    fn normal(&self, t: f64) -> [f64; 3] {
        let (s, u) = self.split(t);
        self.segments[s].normal(u)
    }

    fn tangent(&self, t: f64) -> [f64; 3] {
        let (s, u) = self.split(t);
        self.segments[s].tangent(u)
    }

    fn length(&self) -> f64 {
        self.segments.iter().map(Segment::length).sum()
    }
}
