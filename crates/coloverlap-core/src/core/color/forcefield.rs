use crate::core::models::atom::Element;
use crate::core::models::color::{ColorAtom, ColorType};
use crate::core::models::molecule::{Conformer, Molecule};
use crate::core::utils::geometry::centroid;
use itertools::Itertools;
use std::collections::VecDeque;

const RING_SIZES: std::ops::RangeInclusive<usize> = 5..=6;

/// Color features carried by a single atom, in type-code order.
pub fn atom_color_types(molecule: &Molecule, atom: usize) -> Vec<ColorType> {
    let a = &molecule.atoms()[atom];
    let charge = a.formal_charge;
    let mut types = Vec::new();

    // Formal charges balanced by a directly bonded counter-ion (nitro, N-oxide)
    // carry no ionic feature.
    let zwitterionic = molecule
        .neighbors(atom)
        .iter()
        .any(|(n, _)| (molecule.atoms()[*n].formal_charge as i16) * (charge as i16) < 0);

    let hydrogens = molecule.total_hydrogens(atom);
    let heavy_degree = molecule.heavy_degree(atom);

    match a.element {
        Element::N | Element::O if charge == 0 && hydrogens > 0 => {
            types.push(ColorType::Donor)
        }
        _ => {}
    }
    match a.element {
        Element::O if charge == 0 => types.push(ColorType::Acceptor),
        Element::N if charge == 0 && hydrogens == 0 && heavy_degree < 3 => {
            types.push(ColorType::Acceptor)
        }
        _ => {}
    }
    if !zwitterionic {
        if charge < 0 && matches!(a.element, Element::O | Element::S | Element::N) {
            types.push(ColorType::Anion);
        }
        if charge > 0 {
            types.push(ColorType::Cation);
        }
    }
    if is_hydrophobe(molecule, atom, hydrogens, heavy_degree) {
        types.push(ColorType::Hydrophobe);
    }
    types
}

fn is_hydrophobe(molecule: &Molecule, atom: usize, hydrogens: usize, heavy_degree: usize) -> bool {
    let a = &molecule.atoms()[atom];
    match a.element {
        Element::Cl | Element::Br | Element::I => true,
        Element::S => a.formal_charge == 0 && heavy_degree == 2 && hydrogens == 0,
        Element::C => {
            a.formal_charge == 0
                && heavy_degree == 1
                && hydrogens == 3
                && molecule
                    .neighbors(atom)
                    .iter()
                    .map(|(n, _)| molecule.atoms()[*n].element)
                    .filter(|e| !e.is_hydrogen())
                    .all(|e| e == Element::C)
        }
        _ => false,
    }
}

/// Smallest ring through the bond `from`-`to`, found by a breadth-first search
/// from `from` to `to` that may not use the bond itself.
fn smallest_ring_through(molecule: &Molecule, from: usize, to: usize, max_size: usize) -> Option<Vec<usize>> {
    let n = molecule.num_atoms();
    let mut parent: Vec<Option<usize>> = vec![None; n];
    let mut depth = vec![usize::MAX; n];
    let mut queue = VecDeque::from([from]);
    depth[from] = 1;

    while let Some(current) = queue.pop_front() {
        if depth[current] >= max_size {
            continue;
        }
        for &(next, _) in molecule.neighbors(current) {
            if current == from && next == to {
                continue;
            }
            if molecule.atoms()[next].element.is_hydrogen() || depth[next] != usize::MAX {
                continue;
            }
            depth[next] = depth[current] + 1;
            parent[next] = Some(current);
            if next == to {
                let mut ring = vec![to];
                let mut cursor = to;
                while let Some(p) = parent[cursor] {
                    ring.push(p);
                    cursor = p;
                }
                return Some(ring);
            }
            queue.push_back(next);
        }
    }
    None
}

/// Atom sets of the 5- and 6-membered smallest rings, sorted within each
/// ring and ordered by first discovery along the bond list.
pub fn small_rings(molecule: &Molecule) -> Vec<Vec<usize>> {
    let max_size = *RING_SIZES.end();
    molecule
        .bonds()
        .iter()
        .filter_map(|bond| smallest_ring_through(molecule, bond.atom1, bond.atom2, max_size))
        .filter(|ring| RING_SIZES.contains(&ring.len()))
        .map(|ring| ring.into_iter().sorted().collect::<Vec<_>>())
        .unique()
        .collect()
}

/// Perceives the color atoms of one conformer: atom-centered features in
/// atom order, followed by ring centroids.
pub fn perceive_color_atoms(molecule: &Molecule, conformer: &Conformer) -> Vec<ColorAtom> {
    let mut color_atoms: Vec<ColorAtom> = (0..molecule.num_atoms())
        .flat_map(|i| {
            atom_color_types(molecule, i)
                .into_iter()
                .map(move |t| ColorAtom::new(t, conformer.coords[i]))
        })
        .collect();

    for ring in small_rings(molecule) {
        let points: Vec<_> = ring.iter().map(|&i| conformer.coords[i]).collect();
        if let Some(center) = centroid(&points) {
            color_atoms.push(ColorAtom::new(ColorType::Ring, center));
        }
    }
    color_atoms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::molecule::{Bond, BondOrder};
    use nalgebra::Point3;

    fn chain(elements: &[(Element, i8)], bonds: &[(usize, usize, BondOrder)]) -> Molecule {
        let atoms = elements
            .iter()
            .map(|&(e, q)| Atom::with_charge(e, q))
            .collect();
        let bonds = bonds.iter().map(|&(a, b, o)| Bond::new(a, b, o)).collect();
        Molecule::new("test", atoms, bonds)
    }

    fn line_conformer(n: usize) -> Conformer {
        Conformer::new((0..n).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect())
    }

    #[test]
    fn hydroxyl_oxygen_is_donor_and_acceptor() {
        let ethanol = chain(
            &[(Element::C, 0), (Element::C, 0), (Element::O, 0)],
            &[(0, 1, BondOrder::Single), (1, 2, BondOrder::Single)],
        );
        assert_eq!(
            atom_color_types(&ethanol, 2),
            vec![ColorType::Donor, ColorType::Acceptor]
        );
        assert_eq!(atom_color_types(&ethanol, 0), vec![ColorType::Hydrophobe]);
        assert!(atom_color_types(&ethanol, 1).is_empty());
    }

    #[test]
    fn methyl_on_heteroatom_is_not_hydrophobic() {
        let methanol = chain(&[(Element::C, 0), (Element::O, 0)], &[(0, 1, BondOrder::Single)]);
        assert!(atom_color_types(&methanol, 0).is_empty());
    }

    #[test]
    fn charged_atoms_are_ions_unless_balanced_by_a_neighbor() {
        let carboxylate = chain(
            &[(Element::C, 0), (Element::O, 0), (Element::O, -1)],
            &[(0, 1, BondOrder::Double), (0, 2, BondOrder::Single)],
        );
        assert_eq!(atom_color_types(&carboxylate, 2), vec![ColorType::Anion]);

        let ammonium = chain(&[(Element::C, 0), (Element::N, 1)], &[(0, 1, BondOrder::Single)]);
        assert_eq!(atom_color_types(&ammonium, 1), vec![ColorType::Cation]);

        let nitro = chain(
            &[(Element::C, 0), (Element::N, 1), (Element::O, -1), (Element::O, 0)],
            &[
                (0, 1, BondOrder::Single),
                (1, 2, BondOrder::Single),
                (1, 3, BondOrder::Double),
            ],
        );
        assert!(atom_color_types(&nitro, 1).is_empty());
        assert!(atom_color_types(&nitro, 2).is_empty());
    }

    #[test]
    fn tertiary_amine_is_not_an_acceptor_but_pyridine_nitrogen_is() {
        let amine = chain(
            &[(Element::N, 0), (Element::C, 0), (Element::C, 0), (Element::C, 0)],
            &[
                (0, 1, BondOrder::Single),
                (0, 2, BondOrder::Single),
                (0, 3, BondOrder::Single),
            ],
        );
        assert!(atom_color_types(&amine, 0).is_empty());

        let mut elements = vec![(Element::N, 0)];
        elements.extend(std::iter::repeat_n((Element::C, 0), 5));
        let bonds: Vec<_> = (0..6).map(|i| (i, (i + 1) % 6, BondOrder::Aromatic)).collect();
        let pyridine = chain(&elements, &bonds);
        assert_eq!(atom_color_types(&pyridine, 0), vec![ColorType::Acceptor]);
    }

    #[test]
    fn fused_rings_yield_one_centroid_per_ring() {
        // Naphthalene skeleton: atoms 0-5 and 4-9 form two fused 6-rings.
        let elements = vec![(Element::C, 0); 10];
        let mut bonds: Vec<_> = (0..6).map(|i| (i, (i + 1) % 6, BondOrder::Aromatic)).collect();
        bonds.extend([
            (5, 6, BondOrder::Aromatic),
            (6, 7, BondOrder::Aromatic),
            (7, 8, BondOrder::Aromatic),
            (8, 9, BondOrder::Aromatic),
            (9, 4, BondOrder::Aromatic),
        ]);
        let naphthalene = chain(&elements, &bonds);
        let rings = small_rings(&naphthalene);
        assert_eq!(rings, vec![vec![0, 1, 2, 3, 4, 5], vec![4, 5, 6, 7, 8, 9]]);

        let colors = perceive_color_atoms(&naphthalene, &line_conformer(10));
        assert_eq!(colors.len(), 2);
        assert!(colors.iter().all(|c| c.color_type == ColorType::Ring));
        assert_eq!(colors[0].position, Point3::new(2.5, 0.0, 0.0));
    }

    #[test]
    fn larger_rings_are_ignored() {
        let elements = vec![(Element::C, 0); 7];
        let bonds: Vec<_> = (0..7).map(|i| (i, (i + 1) % 7, BondOrder::Single)).collect();
        assert!(small_rings(&chain(&elements, &bonds)).is_empty());
    }

    #[test]
    fn perception_places_atom_features_before_rings() {
        let mut elements = vec![(Element::C, 0); 6];
        elements.push((Element::Cl, 0));
        let mut bonds: Vec<_> = (0..6).map(|i| (i, (i + 1) % 6, BondOrder::Aromatic)).collect();
        bonds.push((0, 6, BondOrder::Single));
        let chlorobenzene = chain(&elements, &bonds);
        let types: Vec<_> = perceive_color_atoms(&chlorobenzene, &line_conformer(7))
            .iter()
            .map(|c| c.color_type)
            .collect();
        assert_eq!(types, vec![ColorType::Hydrophobe, ColorType::Ring]);
    }
}
