use crate::{error::NnDistanceError, points::POINT_DIM};

/// Problem dimensions derived from a validated pair of point sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemSize {
    /// Number of batches `B`.
    pub batch: usize,
    /// Number of points `N` of `xyz1`.
    pub num_points1: usize,
    /// Number of points `M` of `xyz2`.
    pub num_points2: usize,
}

impl ProblemSize {
    /// True if there is no pair of points to compare.
    ///
    /// With an empty set on either side no match exists, so the outputs keep their
    /// zero fill.
    pub fn is_empty(&self) -> bool {
        self.batch == 0 || self.num_points1 == 0 || self.num_points2 == 0
    }

    /// Shape of `dist1` / `idx1` / `grad_dist1`.
    pub fn shape1(&self) -> [usize; 2] {
        [self.batch, self.num_points1]
    }

    /// Shape of `dist2` / `idx2` / `grad_dist2`.
    pub fn shape2(&self) -> [usize; 2] {
        [self.batch, self.num_points2]
    }
}

/// Checks that `shape` describes a `[B, N, 6]` point set and returns `(B, N)`.
pub fn check_point_set(name: &'static str, shape: &[usize]) -> Result<(usize, usize), NnDistanceError> {
    let &[batch, num_points, dim] = shape else {
        return Err(NnDistanceError::InvalidRank {
            name,
            actual: shape.len(),
        });
    };
    if dim != POINT_DIM {
        return Err(NnDistanceError::InvalidPointDim {
            name,
            expected: POINT_DIM,
            actual: dim,
        });
    }
    if num_points > i32::MAX as usize {
        return Err(NnDistanceError::TooManyPoints { name, num_points });
    }
    Ok((batch, num_points))
}

/// Checks the forward preconditions on the two point set shapes.
///
/// # Errors
///
/// Fails if either input is not `[B, N, 6]` or if the batch sizes differ. Zero-length
/// dimensions are accepted.
///
/// # Example
///
/// ```
/// use nndistance_ops::{validation::check_forward, NnDistanceError};
///
/// let size = check_forward(&[2, 5, 6], &[2, 3, 6]).unwrap();
/// assert_eq!((size.batch, size.num_points1, size.num_points2), (2, 5, 3));
///
/// let err = check_forward(&[2, 5, 6], &[1, 3, 6]).unwrap_err();
/// assert_eq!(err, NnDistanceError::BatchMismatch(2, 1));
/// ```
pub fn check_forward(xyz1: &[usize], xyz2: &[usize]) -> Result<ProblemSize, NnDistanceError> {
    let (batch, num_points1) = check_point_set("xyz1", xyz1)?;
    let (batch2, num_points2) = check_point_set("xyz2", xyz2)?;
    if batch2 != batch {
        return Err(NnDistanceError::BatchMismatch(batch, batch2));
    }
    Ok(ProblemSize {
        batch,
        num_points1,
        num_points2,
    })
}

/// Checks that an auxiliary tensor has exactly the expected shape.
pub fn check_shape(
    name: &'static str,
    actual: &[usize],
    expected: &[usize],
) -> Result<(), NnDistanceError> {
    if actual != expected {
        return Err(NnDistanceError::ShapeMismatch {
            name,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        });
    }
    Ok(())
}

/// Checks the shapes of the four auxiliary backward inputs.
pub fn check_backward(
    size: &ProblemSize,
    grad_dist1: &[usize],
    idx1: &[usize],
    grad_dist2: &[usize],
    idx2: &[usize],
) -> Result<(), NnDistanceError> {
    check_shape("grad_dist1", grad_dist1, &size.shape1())?;
    check_shape("idx1", idx1, &size.shape1())?;
    check_shape("grad_dist2", grad_dist2, &size.shape2())?;
    check_shape("idx2", idx2, &size.shape2())?;
    Ok(())
}

/// Checks that every match index references a point of a set with `size` points.
pub fn check_indices(name: &'static str, idx: &[i32], size: usize) -> Result<(), NnDistanceError> {
    match idx
        .iter()
        .enumerate()
        .find(|(_, &k)| k < 0 || k as usize >= size)
    {
        Some((position, &index)) => Err(NnDistanceError::IndexOutOfBounds {
            name,
            position,
            index,
            size,
        }),
        None => Ok(()),
    }
}
