use ndarray::{Array2, Array3};

/// A rectangular array paired with a same-shaped mask; `true` marks an
/// absent entry whose value is only the fill.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedArray {
    pub data: Array3<f64>,
    pub mask: Array3<bool>,
}

impl MaskedArray {
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }
}

/// Unifies the ragged color-atom axis of a `[candidate][reference]` table of
/// score vectors.
///
/// The unified axis is as long as the longest cell. Cell `(i, j)` fills
/// positions `0..len` of row `[i, j, ..]` and leaves the rest at `fill`,
/// masked.
pub fn group_ref_color_atom_overlaps(cells: &Array2<Vec<f64>>, fill: f64) -> MaskedArray {
    let (rows, cols) = cells.dim();
    let width = cells.iter().map(Vec::len).max().unwrap_or(0);

    let mut data = Array3::from_elem((rows, cols, width), fill);
    let mut mask = Array3::from_elem((rows, cols, width), true);
    for ((i, j), scores) in cells.indexed_iter() {
        for (k, &score) in scores.iter().enumerate() {
            data[[i, j, k]] = score;
            mask[[i, j, k]] = false;
        }
    }
    MaskedArray { data, mask }
}
