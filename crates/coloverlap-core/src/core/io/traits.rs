use super::error::MolIoError;
use super::reader::{Batches, FileMolecules, MolReader};
use crate::core::models::molecule::Molecule;

/// A restartable source of candidate batches.
///
/// Each call to [`BatchSource::open_batches`] must start over from the first
/// candidate and yield the same candidates in the same order; the reducer
/// relies on every reference seeing an identical candidate axis.
pub trait BatchSource: Sync {
    /// The lazy batch sequence produced by one pass over the source.
    type Batches: Iterator<Item = Result<Vec<Molecule>, MolIoError>> + Send;

    /// Starts a fresh pass over the candidates.
    ///
    /// # Errors
    ///
    /// Returns an error if `batch_size` is zero or the source cannot be reopened.
    fn open_batches(&self, batch_size: usize) -> Result<Self::Batches, MolIoError>;
}

impl BatchSource for MolReader {
    type Batches = Batches<FileMolecules>;

    fn open_batches(&self, batch_size: usize) -> Result<Self::Batches, MolIoError> {
        self.batches(batch_size)
    }
}

/// In-memory candidates; each pass clones the molecules into new batches.
impl BatchSource for Vec<Molecule> {
    type Batches = std::vec::IntoIter<Result<Vec<Molecule>, MolIoError>>;

    fn open_batches(&self, batch_size: usize) -> Result<Self::Batches, MolIoError> {
        if batch_size == 0 {
            return Err(MolIoError::InvalidBatchSize(batch_size));
        }
        Ok(self
            .chunks(batch_size)
            .map(|chunk| Ok(chunk.to_vec()))
            .collect::<Vec<_>>()
            .into_iter())
    }
}
