use crate::core::models::color::ColorAtomMetadata;

/// Output of one worker invocation over one candidate batch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchResult {
    /// One score vector per candidate, in batch order.
    pub overlaps: Vec<Vec<f64>>,
    /// `None` for an empty batch.
    pub ref_color_atoms: Option<ColorAtomMetadata>,
    pub fit_titles: Vec<String>,
}

impl BatchResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.overlaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlaps.is_empty()
    }
}

/// Every candidate's scores against one reference, in candidate order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceResult {
    pub title: String,
    pub overlaps: Vec<Vec<f64>>,
    /// Empty when the reference saw no candidates.
    pub ref_color_atoms: ColorAtomMetadata,
    pub fit_titles: Vec<String>,
}

impl ReferenceResult {
    pub fn num_candidates(&self) -> usize {
        self.overlaps.len()
    }
}
