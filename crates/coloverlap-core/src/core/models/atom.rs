use std::fmt;
use std::str::FromStr;

/// Chemical element of an atom, restricted to what small-molecule inputs carry.
///
/// Elements outside the explicit set are kept as [`Element::Other`] so that a
/// molecule with an unusual atom can still be read and aligned; such atoms get
/// a generic van der Waals radius and never produce color features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Element {
    H,
    B,
    #[default]
    C,
    N,
    O,
    F,
    Si,
    P,
    S,
    Cl,
    Br,
    I,
    Other,
}

impl Element {
    /// Bondi van der Waals radius in Angstroms.
    pub fn vdw_radius(self) -> f64 {
        match self {
            Element::H => 1.20,
            Element::B => 1.92,
            Element::C => 1.70,
            Element::N => 1.55,
            Element::O => 1.52,
            Element::F => 1.47,
            Element::Si => 2.10,
            Element::P => 1.80,
            Element::S => 1.80,
            Element::Cl => 1.75,
            Element::Br => 1.85,
            Element::I => 1.98,
            Element::Other => 1.80,
        }
    }

    /// Neutral default valence used to infer implicit hydrogens.
    ///
    /// Returns `None` for elements whose hydrogens are never inferred.
    pub fn default_valence(self) -> Option<u8> {
        match self {
            Element::B => Some(3),
            Element::C => Some(4),
            Element::N | Element::P => Some(3),
            Element::O | Element::S => Some(2),
            Element::F | Element::Cl | Element::Br | Element::I => Some(1),
            _ => None,
        }
    }

    pub fn is_hydrogen(self) -> bool {
        self == Element::H
    }

    pub fn is_halogen(self) -> bool {
        matches!(self, Element::F | Element::Cl | Element::Br | Element::I)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Element::H => "H",
            Element::B => "B",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::Si => "Si",
            Element::P => "P",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::Br => "Br",
            Element::I => "I",
            Element::Other => "*",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Element {
    type Err = ();

    /// Parses an element symbol, case-insensitively.
    ///
    /// Deuterium and tritium map to hydrogen. Unknown but well-formed symbols
    /// (up to three letters) map to [`Element::Other`]; anything else is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbol = s.trim();
        match symbol.to_ascii_lowercase().as_str() {
            "h" | "d" | "t" => Ok(Element::H),
            "b" => Ok(Element::B),
            "c" => Ok(Element::C),
            "n" => Ok(Element::N),
            "o" => Ok(Element::O),
            "f" => Ok(Element::F),
            "si" => Ok(Element::Si),
            "p" => Ok(Element::P),
            "s" => Ok(Element::S),
            "cl" => Ok(Element::Cl),
            "br" => Ok(Element::Br),
            "i" => Ok(Element::I),
            other
                if (1..=3).contains(&other.len())
                    && other.chars().all(|c| c.is_ascii_alphabetic()) =>
            {
                Ok(Element::Other)
            }
            _ => Err(()),
        }
    }
}

/// An atom of a small molecule. Coordinates live on the molecule's conformers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Atom {
    pub element: Element,
    /// Formal charge in elementary charge units.
    pub formal_charge: i8,
}

impl Atom {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            formal_charge: 0,
        }
    }

    pub fn with_charge(element: Element, formal_charge: i8) -> Self {
        Self {
            element,
            formal_charge,
        }
    }
}
