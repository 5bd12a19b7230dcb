//! Conversions between the flattened [nalgebra] quantities and [ndarray] arrays, for callers whose
//! numerics are written against the ndarray backend.

use crate::{dof_to_vector, vector_to_dof, MultiBody, PreconditionViolation};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1};

/// Flattened per-joint velocities as a 1D array (see [crate::dof_to_vector])
pub fn dof_to_array(mb: &MultiBody, ragged: &[Vec<f64>]) -> Array1<f64> {
    Array1::from_iter(dof_to_vector(mb, ragged).iter().copied())
}

/// Inverse of [dof_to_array]
pub fn array_to_dof(mb: &MultiBody, array: &ArrayView1<f64>) -> Vec<Vec<f64>> {
    vector_to_dof(mb, &DVector::from_iterator(array.len(), array.iter().copied()))
}

pub fn s_array_to_dof(mb: &MultiBody, array: &ArrayView1<f64>) -> Result<Vec<Vec<f64>>, PreconditionViolation> {
    if array.len() != mb.nr_dof() {
        return Err(PreconditionViolation::VectorSizeMismatch {
            expected: mb.nr_dof(),
            actual: array.len(),
        });
    }
    Ok(array_to_dof(mb, array))
}

/// Copies a matrix, e.g., a CoM Jacobian, into a 2D array of the same shape.
pub fn matrix_to_array(matrix: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((matrix.nrows(), matrix.ncols()), |(row, col)| matrix[(row, col)])
}
