// ─────────────────────────────────────────────────────────────────────
// SCPN Hybrid PIC — Test Support
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use hybrid_core::material::Material;
use hybrid_core::world::World;
use hybrid_math::boundary::Boundary;
use hybrid_math::mesh::{Domain, UniformMesh};
use hybrid_types::constants::{EV_TO_K, M_ELECTRON, Q_ELECTRON};
use hybrid_types::state::{DomainType, MaterialId, Particle};

pub(crate) const XE_MASS: f64 = 2.18e-25;
pub(crate) const XE: MaterialId = MaterialId(0);
pub(crate) const XE_ION: MaterialId = MaterialId(1);
pub(crate) const WALL: MaterialId = MaterialId(2);
pub(crate) const ELECTRONS: MaterialId = MaterialId(3);

/// 10×10 cell box: Xe, Xe+, a solid wall material, fluid electrons at
/// 1e15 m⁻³ and 2 eV, and a wall boundary on the right facing -x.
pub(crate) fn plasma_world() -> World {
    let mesh = UniformMesh::new(11, 11, [0.0, 0.0], [0.1, 0.1], DomainType::Xy).unwrap();
    let mut world = World::new(Domain::single(mesh));
    let xe = Material::new_kinetic("Xe", XE_MASS, 1e8, &world.domain)
        .unwrap()
        .with_collision_params(5.74e-10, 273.0, 0.85, 1.44);
    world.add_material(xe).unwrap();
    let ion = Material::new_kinetic("Xe+", XE_MASS, 2.5e8, &world.domain)
        .unwrap()
        .with_charge(Q_ELECTRON)
        .with_collision_params(5.74e-10, 273.0, 0.85, 1.44);
    world.add_material(ion).unwrap();
    let wall = Material::new_solid("wall", 1e-25, &world.domain).unwrap();
    world.add_material(wall).unwrap();
    let e = Material::new_fluid("e-", M_ELECTRON, &world.domain)
        .unwrap()
        .with_charge(-Q_ELECTRON)
        .with_state(1e15, 2.0 * EV_TO_K);
    world.add_material(e).unwrap();
    let wall = Boundary::new("wall", &[[0.1, 0.0], [0.1, 0.1]], 300.0, DomainType::Xy).unwrap();
    world.add_boundary(wall);
    world
}

/// Add `n` particles of weight `mpw` at `pos` moving with `vel`.
pub(crate) fn seed(world: &mut World, id: MaterialId, n: usize, pos: [f64; 3], vel: [f64; 3], mpw: f64) {
    let World {
        domain, materials, ..
    } = world;
    let mat = materials.get_mut(id);
    let mass = mat.mass;
    for _ in 0..n {
        assert!(mat.add_particle(domain, Particle::new(pos, vel, mpw, mass)));
    }
}
