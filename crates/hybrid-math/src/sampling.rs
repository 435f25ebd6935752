// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Velocity Sampling
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Random velocity and direction sampling.

use hybrid_types::constants::K_BOLTZMANN;
use rand::Rng;
use rand_distr::StandardNormal;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

pub fn dot3(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn norm3(a: [f64; 3]) -> f64 {
    dot3(a, a).sqrt()
}

pub fn cross3(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn scale3(a: [f64; 3], k: f64) -> [f64; 3] {
    [a[0] * k, a[1] * k, a[2] * k]
}

/// Most probable thermal speed `sqrt(2kT/m)`; negative temperatures count as 0.
pub fn thermal_velocity(temperature_k: f64, mass_kg: f64) -> f64 {
    if mass_kg <= 0.0 {
        return 0.0;
    }
    (2.0 * K_BOLTZMANN * temperature_k.max(0.0) / mass_kg).sqrt()
}

/// One Cartesian component of a Maxwellian with thermal speed `v_th`.
pub fn sample_maxwellian_1d<R: Rng + ?Sized>(v_th: f64, rng: &mut R) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    z * v_th * FRAC_1_SQRT_2
}

/// Velocity vector drawn from an isotropic Maxwellian.
pub fn sample_maxwellian_3d<R: Rng + ?Sized>(v_th: f64, rng: &mut R) -> [f64; 3] {
    [
        sample_maxwellian_1d(v_th, rng),
        sample_maxwellian_1d(v_th, rng),
        sample_maxwellian_1d(v_th, rng),
    ]
}

/// Speed drawn from the Maxwell distribution.
pub fn sample_maxwellian_speed<R: Rng + ?Sized>(v_th: f64, rng: &mut R) -> f64 {
    norm3(sample_maxwellian_3d(v_th, rng))
}

/// Unit vector uniformly distributed on the sphere.
pub fn isotropic_direction<R: Rng + ?Sized>(rng: &mut R) -> [f64; 3] {
    let cos_theta = 2.0 * rng.gen::<f64>() - 1.0;
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = 2.0 * PI * rng.gen::<f64>();
    [sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta]
}

/// Isotropic unit vector folded into the half space `dot(v, normal) >= 0`.
pub fn half_space_direction<R: Rng + ?Sized>(normal: [f64; 3], rng: &mut R) -> [f64; 3] {
    let dir = isotropic_direction(rng);
    if dot3(dir, normal) < 0.0 {
        scale3(dir, -1.0)
    } else {
        dir
    }
}

/// Cosine-law (Lambertian) unit vector about `normal`, with `tangent`
/// completing the in-plane frame.
pub fn lambertian_direction<R: Rng + ?Sized>(
    normal: [f64; 3],
    tangent: [f64; 3],
    rng: &mut R,
) -> [f64; 3] {
    let binormal = cross3(normal, tangent);
    let cos_phi = (1.0 - rng.gen::<f64>()).sqrt();
    let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();
    let theta = 2.0 * PI * rng.gen::<f64>();
    let (a, b) = (theta.cos() * sin_phi, theta.sin() * sin_phi);
    [
        a * tangent[0] + cos_phi * normal[0] + b * binormal[0],
        a * tangent[1] + cos_phi * normal[1] + b * binormal[1],
        a * tangent[2] + cos_phi * normal[2] + b * binormal[2],
    ]
}

/// Mirror reflection of `vel` about the plane with unit `normal`.
pub fn reflect_specular(vel: [f64; 3], normal: [f64; 3]) -> [f64; 3] {
    let vn = dot3(vel, normal);
    [
        vel[0] - 2.0 * vn * normal[0],
        vel[1] - 2.0 * vn * normal[1],
        vel[2] - 2.0 * vn * normal[2],
    ]
}
