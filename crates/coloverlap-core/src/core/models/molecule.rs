use super::atom::{Atom, Element};
use nalgebra::{Isometry3, Point3};

/// Bond order as encoded in connection tables (4 is aromatic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(BondOrder::Single),
            2 => Some(BondOrder::Double),
            3 => Some(BondOrder::Triple),
            4 => Some(BondOrder::Aromatic),
            _ => None,
        }
    }

    /// Contribution to an atom's valence.
    pub fn valence(self) -> f64 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Aromatic => 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1: usize,
    pub atom2: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(atom1: usize, atom2: usize, order: BondOrder) -> Self {
        Self {
            atom1,
            atom2,
            order,
        }
    }

    pub fn other(&self, atom: usize) -> Option<usize> {
        if self.atom1 == atom {
            Some(self.atom2)
        } else if self.atom2 == atom {
            Some(self.atom1)
        } else {
            None
        }
    }
}

/// One 3-D geometry of a molecule; `coords[i]` belongs to atom `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Conformer {
    pub coords: Vec<Point3<f64>>,
}

impl Conformer {
    pub fn new(coords: Vec<Point3<f64>>) -> Self {
        Self { coords }
    }

    pub fn transformed(&self, transform: &Isometry3<f64>) -> Self {
        Self {
            coords: self.coords.iter().map(|p| transform * p).collect(),
        }
    }
}

/// A small molecule: one connection table shared by one or more conformers.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    pub title: String,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    conformers: Vec<Conformer>,
    neighbors: Vec<Vec<(usize, BondOrder)>>,
}

impl Molecule {
    /// Builds a molecule from its connection table.
    ///
    /// Bonds referencing atoms outside `atoms` and conformers whose coordinate
    /// count differs from the atom count are the caller's responsibility; the
    /// SDF reader rejects both before constructing a molecule.
    pub fn new(title: impl Into<String>, atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {
        let mut neighbors = vec![Vec::new(); atoms.len()];
        for bond in &bonds {
            neighbors[bond.atom1].push((bond.atom2, bond.order));
            neighbors[bond.atom2].push((bond.atom1, bond.order));
        }
        Self {
            title: title.into(),
            atoms,
            bonds,
            conformers: Vec::new(),
            neighbors,
        }
    }

    pub fn with_conformers(mut self, conformers: Vec<Conformer>) -> Self {
        self.conformers = conformers;
        self
    }

    pub fn add_conformer(&mut self, conformer: Conformer) {
        self.conformers.push(conformer);
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn conformers(&self) -> &[Conformer] {
        &self.conformers
    }

    pub fn conformer(&self, index: usize) -> Option<&Conformer> {
        self.conformers.get(index)
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn num_conformers(&self) -> usize {
        self.conformers.len()
    }

    pub fn neighbors(&self, atom: usize) -> &[(usize, BondOrder)] {
        &self.neighbors[atom]
    }

    /// Number of non-hydrogen neighbors.
    pub fn heavy_degree(&self, atom: usize) -> usize {
        self.neighbors[atom]
            .iter()
            .filter(|(n, _)| !self.atoms[*n].element.is_hydrogen())
            .count()
    }

    /// Explicit hydrogen neighbors plus hydrogens implied by the default valence.
    pub fn total_hydrogens(&self, atom: usize) -> usize {
        let explicit = self.neighbors[atom]
            .iter()
            .filter(|(n, _)| self.atoms[*n].element.is_hydrogen())
            .count();
        explicit + self.implicit_hydrogens(atom)
    }

    fn implicit_hydrogens(&self, atom: usize) -> usize {
        let Atom {
            element,
            formal_charge,
        } = &self.atoms[atom];
        let Some(valence) = element.default_valence() else {
            return 0;
        };
        // Charged nitrogen and oxygen gain a bond, charged carbon and boron lose one.
        let adjusted = match element {
            Element::N | Element::O | Element::P | Element::S => {
                valence as i32 + *formal_charge as i32
            }
            _ => valence as i32 - (*formal_charge as i32).abs(),
        };
        let used: f64 = self.neighbors[atom].iter().map(|(_, o)| o.valence()).sum();
        (adjusted - used.floor() as i32).max(0) as usize
    }

    /// Copy of this molecule carrying only the requested conformer.
    pub fn single_conformer(&self, index: usize) -> Option<Molecule> {
        let conformer = self.conformers.get(index)?.clone();
        let mut molecule = Molecule {
            title: self.title.clone(),
            atoms: self.atoms.clone(),
            bonds: self.bonds.clone(),
            conformers: Vec::with_capacity(1),
            neighbors: self.neighbors.clone(),
        };
        molecule.conformers.push(conformer);
        Some(molecule)
    }

    /// Applies a rigid transform to every conformer.
    pub fn transform(&mut self, transform: &Isometry3<f64>) {
        for conformer in &mut self.conformers {
            *conformer = conformer.transformed(transform);
        }
    }
}
