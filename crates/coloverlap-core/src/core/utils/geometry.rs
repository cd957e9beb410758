use nalgebra::{Matrix3, Point3, Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};

/// Closeness test for floating-point geometry, `|a - b| <= atol + rtol * |b|`.
///
/// Defaults match the relative/absolute tolerances used by NumPy's `allclose`.
/// NaN is never close to anything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GeometryTolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for GeometryTolerance {
    fn default() -> Self {
        Self {
            rtol: 1e-5,
            atol: 1e-8,
        }
    }
}

impl GeometryTolerance {
    pub fn exact() -> Self {
        Self {
            rtol: 0.0,
            atol: 0.0,
        }
    }

    #[inline]
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        (a - b).abs() <= self.atol + self.rtol * b.abs()
    }

    pub fn all_close(&self, a: &[f64; 3], b: &[f64; 3]) -> bool {
        a.iter().zip(b).all(|(&x, &y)| self.is_close(x, y))
    }
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Principal axes of a point cloud about `center`, as a proper rotation whose
/// columns are the axes ordered by decreasing spread.
pub fn principal_axes(points: &[Point3<f64>], center: &Point3<f64>) -> Rotation3<f64> {
    let mut covariance = Matrix3::zeros();
    for p in points {
        let d = p - center;
        covariance += d * d.transpose();
    }

    let eigen = covariance.symmetric_eigen();
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[b]
            .partial_cmp(&eigen.eigenvalues[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut axes = Matrix3::from_columns(&[
        eigen.eigenvectors.column(order[0]).into_owned(),
        eigen.eigenvectors.column(order[1]).into_owned(),
        eigen.eigenvectors.column(order[2]).into_owned(),
    ]);
    if axes.determinant() < 0.0 {
        let flipped = -axes.column(2);
        axes.set_column(2, &flipped);
    }
    Rotation3::from_matrix(&axes)
}

/// The four proper rotations that map a principal frame onto itself up to
/// axis sign: identity and 180 degree turns about each axis.
pub fn axis_flips() -> [Rotation3<f64>; 4] {
    [
        Rotation3::identity(),
        Rotation3::from_matrix_unchecked(Matrix3::from_diagonal(&Vector3::new(1.0, -1.0, -1.0))),
        Rotation3::from_matrix_unchecked(Matrix3::from_diagonal(&Vector3::new(-1.0, 1.0, -1.0))),
        Rotation3::from_matrix_unchecked(Matrix3::from_diagonal(&Vector3::new(-1.0, -1.0, 1.0))),
    ]
}

pub fn rotation_from_axis_angle(axis: &Vector3<f64>, angle_degrees: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle_degrees.to_radians())
}
