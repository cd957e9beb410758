use crate::core::utils::geometry::GeometryTolerance;
use nalgebra::Point3;
use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pharmacophoric feature class of a color atom.
///
/// The integer codes are stable and are what gets persisted as the
/// reference color-atom types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorType {
    Donor,
    Acceptor,
    Anion,
    Cation,
    #[serde(rename = "rings", alias = "ring")]
    Ring,
    Hydrophobe,
}

static COLOR_TYPE_BY_NAME: phf::Map<&'static str, ColorType> = phf_map! {
    "donor" => ColorType::Donor,
    "acceptor" => ColorType::Acceptor,
    "anion" => ColorType::Anion,
    "cation" => ColorType::Cation,
    "rings" => ColorType::Ring,
    "ring" => ColorType::Ring,
    "hydrophobe" => ColorType::Hydrophobe,
};

impl ColorType {
    pub const ALL: [ColorType; 6] = [
        ColorType::Donor,
        ColorType::Acceptor,
        ColorType::Anion,
        ColorType::Cation,
        ColorType::Ring,
        ColorType::Hydrophobe,
    ];

    pub fn code(self) -> i32 {
        match self {
            ColorType::Donor => 1,
            ColorType::Acceptor => 2,
            ColorType::Anion => 3,
            ColorType::Cation => 4,
            ColorType::Ring => 5,
            ColorType::Hydrophobe => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorType::Donor => "donor",
            ColorType::Acceptor => "acceptor",
            ColorType::Anion => "anion",
            ColorType::Cation => "cation",
            ColorType::Ring => "rings",
            ColorType::Hydrophobe => "hydrophobe",
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

impl fmt::Display for ColorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        COLOR_TYPE_BY_NAME
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| format!("unknown color type '{}'", s))
    }
}

/// A typed feature point of a molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorAtom {
    pub color_type: ColorType,
    pub position: Point3<f64>,
}

impl ColorAtom {
    pub fn new(color_type: ColorType, position: Point3<f64>) -> Self {
        Self {
            color_type,
            position,
        }
    }
}

/// The geometric identity of a reference's color atoms: parallel sequences of
/// coordinates, type codes and type names, in perception order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorAtomMetadata {
    pub coords: Vec<[f64; 3]>,
    pub types: Vec<i32>,
    pub type_names: Vec<String>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MetadataMismatch {
    #[error("color atom count changed from {expected} to {found}")]
    Count { expected: usize, found: usize },
    #[error("color atom {index} moved from {expected:?} to {found:?}")]
    Coordinates {
        index: usize,
        expected: [f64; 3],
        found: [f64; 3],
    },
    #[error("color atom {index} type changed from {expected} to {found}")]
    Type {
        index: usize,
        expected: i32,
        found: i32,
    },
    #[error("color atom {index} type name changed from '{expected}' to '{found}'")]
    TypeName {
        index: usize,
        expected: String,
        found: String,
    },
}

impl ColorAtomMetadata {
    pub fn from_atoms(atoms: &[ColorAtom]) -> Self {
        Self {
            coords: atoms
                .iter()
                .map(|a| [a.position.x, a.position.y, a.position.z])
                .collect(),
            types: atoms.iter().map(|a| a.color_type.code()).collect(),
            type_names: atoms
                .iter()
                .map(|a| a.color_type.name().to_string())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Checks that `other` describes the same color atoms as `self`.
    ///
    /// Coordinates are compared under `tolerance`; type codes and names must
    /// be exactly equal. The first difference found is reported.
    pub fn check_consistent(
        &self,
        other: &ColorAtomMetadata,
        tolerance: &GeometryTolerance,
    ) -> Result<(), MetadataMismatch> {
        for (expected, found) in [
            (self.coords.len(), other.coords.len()),
            (self.types.len(), other.types.len()),
            (self.type_names.len(), other.type_names.len()),
        ] {
            if expected != found {
                return Err(MetadataMismatch::Count { expected, found });
            }
        }

        for (index, (a, b)) in self.coords.iter().zip(&other.coords).enumerate() {
            if !tolerance.all_close(a, b) {
                return Err(MetadataMismatch::Coordinates {
                    index,
                    expected: *a,
                    found: *b,
                });
            }
        }
        for (index, (&a, &b)) in self.types.iter().zip(&other.types).enumerate() {
            if a != b {
                return Err(MetadataMismatch::Type {
                    index,
                    expected: a,
                    found: b,
                });
            }
        }
        for (index, (a, b)) in self.type_names.iter().zip(&other.type_names).enumerate() {
            if a != b {
                return Err(MetadataMismatch::TypeName {
                    index,
                    expected: a.clone(),
                    found: b.clone(),
                });
            }
        }
        Ok(())
    }
}

/// What an overlap engine reports for one aligned candidate: one score per
/// reference color atom, plus the engine's view of those color atoms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColorAtomOverlaps {
    pub overlaps: Vec<f64>,
    pub ref_color_atoms: ColorAtomMetadata,
}
