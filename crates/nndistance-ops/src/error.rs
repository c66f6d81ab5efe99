use nndistance_tensor::TensorError;
use thiserror::Error;

use crate::parallel::ParallelError;

/// An error type for the nearest-neighbor distance operator.
///
/// Every variant except [`NnDistanceError::Parallel`] is a violation of the calling
/// contract, detected before any output buffer is allocated.
#[derive(Error, Debug, PartialEq)]
pub enum NnDistanceError {
    /// A point set does not have rank 3.
    #[error("{name} must be of shape (batch, #points, 6), got a tensor of rank {actual}")]
    InvalidRank {
        /// Name of the offending input
        name: &'static str,
        /// Rank of the provided tensor
        actual: usize,
    },

    /// The trailing dimension of a point set is not the point dimension.
    #[error("{name} must hold {expected}-dimensional points, got {actual}")]
    InvalidPointDim {
        /// Name of the offending input
        name: &'static str,
        /// Required point dimension
        expected: usize,
        /// Trailing dimension of the provided tensor
        actual: usize,
    },

    /// The two point sets have different batch sizes.
    #[error("xyz1 and xyz2 must have the same batch size, got {0} and {1}")]
    BatchMismatch(usize, usize),

    /// An auxiliary backward input does not have the shape implied by the point sets.
    #[error("{name} must be of shape {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Name of the offending input
        name: &'static str,
        /// Shape implied by the point sets
        expected: Vec<usize>,
        /// Shape of the provided tensor
        actual: Vec<usize>,
    },

    /// A match index does not reference a point of the other set.
    #[error("{name}[{position}] = {index} is outside [0, {size})")]
    IndexOutOfBounds {
        /// Name of the offending index tensor
        name: &'static str,
        /// Flat position of the offending entry
        position: usize,
        /// The offending index value
        index: i32,
        /// Number of points in the referenced set
        size: usize,
    },

    /// A point set has more points than an `i32` index can address.
    #[error("{name} holds {num_points} points, more than an i32 index can address")]
    TooManyPoints {
        /// Name of the offending input
        name: &'static str,
        /// Number of points in the set
        num_points: usize,
    },

    /// Error with the tensor data, e.g. a buffer length not matching its shape.
    #[error("Error with the tensor: {0}")]
    Tensor(#[from] TensorError),

    /// The accelerator thread pool could not be set up.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}

impl NnDistanceError {
    /// Returns true if the error is a violation of the calling contract.
    ///
    /// Contract violations are programming errors of the caller; retrying the same call
    /// fails the same way.
    pub fn is_contract_violation(&self) -> bool {
        match self {
            Self::Tensor(e) => e.is_programming_error(),
            Self::Parallel(_) => false,
            _ => true,
        }
    }
}
