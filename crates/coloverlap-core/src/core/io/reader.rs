use super::error::MolIoError;
use super::sdf::SdfRecords;
use crate::core::models::molecule::Molecule;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Groups consecutive records that are conformers of the same molecule.
///
/// Two records are merged when their titles are equal and non-empty and their
/// connection tables agree (same elements in the same order, same bond list).
pub struct Molecules<I> {
    records: I,
    pending: Option<Result<Molecule, MolIoError>>,
    merge_conformers: bool,
}

impl<I> Molecules<I>
where
    I: Iterator<Item = Result<Molecule, MolIoError>>,
{
    pub fn new(records: I, merge_conformers: bool) -> Self {
        Self {
            records,
            pending: None,
            merge_conformers,
        }
    }
}

fn same_connection_table(a: &Molecule, b: &Molecule) -> bool {
    !a.title.is_empty()
        && a.title == b.title
        && a.num_atoms() == b.num_atoms()
        && a.atoms()
            .iter()
            .zip(b.atoms())
            .all(|(x, y)| x.element == y.element)
        && a.bonds() == b.bonds()
}

impl<I> Iterator for Molecules<I>
where
    I: Iterator<Item = Result<Molecule, MolIoError>>,
{
    type Item = Result<Molecule, MolIoError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut molecule = match self.pending.take().or_else(|| self.records.next())? {
            Ok(molecule) => molecule,
            Err(e) => return Some(Err(e)),
        };
        if !self.merge_conformers {
            return Some(Ok(molecule));
        }

        loop {
            match self.records.next() {
                Some(Ok(next)) if same_connection_table(&molecule, &next) => {
                    for conformer in next.conformers() {
                        molecule.add_conformer(conformer.clone());
                    }
                }
                Some(other) => {
                    self.pending = Some(other);
                    break;
                }
                None => break,
            }
        }
        Some(Ok(molecule))
    }
}

/// Splits a molecule stream into consecutive batches of at most `size`
/// molecules. The first read error is yielded in place of a batch and ends
/// the stream.
pub struct Batches<I> {
    molecules: I,
    size: usize,
    failed: bool,
}

impl<I> Batches<I> {
    pub fn new(molecules: I, size: usize) -> Result<Self, MolIoError> {
        if size == 0 {
            return Err(MolIoError::InvalidBatchSize(size));
        }
        Ok(Self {
            molecules,
            size,
            failed: false,
        })
    }
}

impl<I> Iterator for Batches<I>
where
    I: Iterator<Item = Result<Molecule, MolIoError>>,
{
    type Item = Result<Vec<Molecule>, MolIoError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let mut batch = Vec::with_capacity(self.size);
        while batch.len() < self.size {
            match self.molecules.next() {
                Some(Ok(molecule)) => batch.push(molecule),
                Some(Err(e)) => {
                    self.failed = true;
                    return Some(Err(e));
                }
                None => break,
            }
        }
        if batch.is_empty() { None } else { Some(Ok(batch)) }
    }
}

pub type FileMolecules = Molecules<SdfRecords<BufReader<File>>>;

/// Reads molecules from an SD file.
///
/// Every call to [`MolReader::mols`] or [`MolReader::batches`] reopens the
/// file, so each returned sequence starts from the first record and yields
/// the same molecules in the same order.
#[derive(Debug, Clone)]
pub struct MolReader {
    path: PathBuf,
    merge_conformers: bool,
}

impl MolReader {
    /// Opens `path` once to fail early on a missing or unreadable file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MolIoError> {
        let path = path.as_ref().to_path_buf();
        File::open(&path)?;
        Ok(Self {
            path,
            merge_conformers: true,
        })
    }

    pub fn with_conformer_merging(mut self, merge: bool) -> Self {
        self.merge_conformers = merge;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mols(&self) -> Result<FileMolecules, MolIoError> {
        let file = File::open(&self.path)?;
        Ok(Self::mols_from(BufReader::new(file), self.merge_conformers))
    }

    pub fn batches(&self, size: usize) -> Result<Batches<FileMolecules>, MolIoError> {
        Batches::new(self.mols()?, size)
    }

    pub fn mols_from<R: BufRead>(reader: R, merge_conformers: bool) -> Molecules<SdfRecords<R>> {
        Molecules::new(SdfRecords::new(reader), merge_conformers)
    }
}
