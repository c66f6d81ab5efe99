use num_traits::Zero;
use thiserror::Error;

use crate::{storage::TensorStorage, view::TensorView};

/// Error type for tensor creation and access.
#[derive(Error, Debug, PartialEq)]
pub enum TensorError {
    /// Tensor shape does not match the provided data.
    ///
    /// The product of the shape dimensions must equal the number of elements.
    #[error("Shape mismatch: expected {expected} elements for shape, but got {actual} elements in data")]
    InvalidShape {
        /// Expected number of elements based on shape
        expected: usize,
        /// Actual number of elements in the data
        actual: usize,
    },

    /// A runtime shape has a different number of dimensions than the tensor type.
    #[error("Rank mismatch: expected a tensor of rank {expected}, got rank {actual}")]
    InvalidRank {
        /// Rank required by the tensor type
        expected: usize,
        /// Rank of the provided shape
        actual: usize,
    },

    /// The strides of a view do not describe a contiguous row-major layout of its shape.
    #[error("Stride mismatch: expected row-major strides {expected:?}, got {actual:?}")]
    InvalidStrides {
        /// Row-major strides of the shape
        expected: Vec<usize>,
        /// Strides of the provided view
        actual: Vec<usize>,
    },

    /// Index exceeds tensor bounds.
    #[error("Index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index that was attempted
        index: usize,
        /// The size of the dimension being indexed
        size: usize,
    },

    /// The device name is not recognized.
    #[error("Unknown device '{0}', expected 'cpu' or 'accelerator'")]
    UnknownDevice(String),
}

impl TensorError {
    /// Creates an InvalidShape error.
    pub fn invalid_shape(expected: usize, actual: usize) -> Self {
        Self::InvalidShape { expected, actual }
    }

    /// Creates an IndexOutOfBounds error.
    pub fn index_out_of_bounds(index: usize, size: usize) -> Self {
        Self::IndexOutOfBounds { index, size }
    }

    /// Returns true if this error indicates a programming error.
    pub fn is_programming_error(&self) -> bool {
        match self {
            Self::InvalidShape { .. }
            | Self::InvalidRank { .. }
            | Self::InvalidStrides { .. }
            | Self::IndexOutOfBounds { .. } => true,
            Self::UnknownDevice(_) => false,
        }
    }
}

/// Computes the strides for a row-major (C-contiguous) tensor layout.
///
/// # Examples
///
/// ```rust
/// use nndistance_tensor::tensor::get_strides_from_shape;
///
/// let strides = get_strides_from_shape([2, 3]);
/// assert_eq!(strides, [3, 1]);
///
/// // a batch of 6D point sets
/// let strides = get_strides_from_shape([2, 5, 6]);
/// assert_eq!(strides, [30, 6, 1]);
/// ```
pub fn get_strides_from_shape<const N: usize>(shape: [usize; N]) -> [usize; N] {
    let mut strides: [usize; N] = [0; N];
    let mut stride = 1;
    for i in (0..shape.len()).rev() {
        strides[i] = stride;
        stride *= shape[i];
    }
    strides
}

/// Converts a runtime shape into a fixed-rank shape.
pub(crate) fn shape_from_dyn<const N: usize>(shape: &[usize]) -> Result<[usize; N], TensorError> {
    shape.try_into().map_err(|_| TensorError::InvalidRank {
        expected: N,
        actual: shape.len(),
    })
}

/// A multi-dimensional array with owned, contiguous, row-major data.
///
/// # Type Parameters
///
/// * `T` - The element type stored in the tensor
/// * `N` - The number of dimensions (checked at compile time)
///
/// # Examples
///
/// ```rust
/// use nndistance_tensor::Tensor2;
///
/// let t = Tensor2::<i32>::from_shape_vec([2, 2], vec![1, 2, 3, 4]).unwrap();
/// assert_eq!(t.get([1, 1]), Some(&4));
/// assert!(t.get([2, 0]).is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T, const N: usize> {
    /// The storage of the tensor.
    pub storage: TensorStorage<T>,
    /// The shape of the tensor.
    pub shape: [usize; N],
    /// The strides of the tensor data in memory.
    pub strides: [usize; N],
}

impl<T, const N: usize> Tensor<T, N> {
    /// Creates a new `Tensor` with the given shape and data.
    ///
    /// # Errors
    ///
    /// If the number of elements in the data does not match the shape of the tensor, an error is returned.
    pub fn from_shape_vec(shape: [usize; N], data: Vec<T>) -> Result<Self, TensorError> {
        let numel = shape.iter().product::<usize>();
        if numel != data.len() {
            return Err(TensorError::invalid_shape(numel, data.len()));
        }
        Ok(Self {
            storage: TensorStorage::from_vec(data),
            shape,
            strides: get_strides_from_shape(shape),
        })
    }

    /// Create a new `Tensor` with the given shape and a function to generate the data.
    ///
    /// The function `f` is called with the index of the element to generate, in
    /// row-major order.
    ///
    /// # Example
    ///
    /// ```
    /// use nndistance_tensor::Tensor2;
    ///
    /// let t = Tensor2::<usize>::from_shape_fn([2, 3], |[i, j]| i * 3 + j);
    /// assert_eq!(t.as_slice(), &[0, 1, 2, 3, 4, 5]);
    /// ```
    pub fn from_shape_fn<F>(shape: [usize; N], mut f: F) -> Self
    where
        F: FnMut([usize; N]) -> T,
    {
        let numel = shape.iter().product::<usize>();
        let data: Vec<T> = (0..numel)
            .map(|i| {
                let mut index = [0; N];
                let mut j = i;
                for k in (0..N).rev() {
                    index[k] = j % shape[k];
                    j /= shape[k];
                }
                f(index)
            })
            .collect();
        Self {
            storage: TensorStorage::from_vec(data),
            shape,
            strides: get_strides_from_shape(shape),
        }
    }

    /// Returns the number of elements in the tensor.
    #[inline]
    pub fn numel(&self) -> usize {
        self.storage.len()
    }

    /// Get the data of the tensor as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.storage.as_slice()
    }

    /// Get the data of the tensor as a mutable slice.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        self.storage.as_mut_slice()
    }

    /// Get the offset of the element at the given index.
    ///
    /// Returns `None` if any component of the index is out of bounds.
    pub fn get_iter_offset(&self, index: [usize; N]) -> Option<usize> {
        let mut offset = 0;
        for ((&idx, dim_size), stride) in index.iter().zip(self.shape).zip(self.strides) {
            if idx >= dim_size {
                return None;
            }
            offset += idx * stride;
        }
        Some(offset)
    }

    /// Get the element at the given index, checking if the index is out of bounds.
    pub fn get(&self, index: [usize; N]) -> Option<&T> {
        self.get_iter_offset(index)
            .and_then(|i| self.storage.as_slice().get(i))
    }

    /// Get a mutable reference to the element at the given index.
    pub fn get_mut(&mut self, index: [usize; N]) -> Option<&mut T> {
        let offset = self.get_iter_offset(index)?;
        self.storage.as_mut_slice().get_mut(offset)
    }

    /// Return a borrowed view of the tensor.
    pub fn view(&self) -> TensorView<'_, T, N> {
        TensorView {
            data: self.storage.as_slice(),
            shape: self.shape,
            strides: self.strides,
        }
    }

}

impl<T: Clone, const N: usize> Tensor<T, N> {
    /// Creates a new `Tensor` with the given shape and slice of data.
    ///
    /// # Errors
    ///
    /// If the number of elements in the data does not match the shape of the tensor, an error is returned.
    pub fn from_shape_slice(shape: [usize; N], data: &[T]) -> Result<Self, TensorError> {
        Self::from_shape_vec(shape, data.to_vec())
    }

    /// Creates a new `Tensor` with the given shape filled with `value`.
    ///
    /// # Example
    ///
    /// ```
    /// use nndistance_tensor::Tensor2;
    ///
    /// let t = Tensor2::<i32>::from_shape_val([2, 2], -1);
    /// assert_eq!(t.as_slice(), &[-1, -1, -1, -1]);
    /// ```
    pub fn from_shape_val(shape: [usize; N], value: T) -> Self {
        let numel = shape.iter().product::<usize>();
        Self {
            storage: TensorStorage::from_val(numel, value),
            shape,
            strides: get_strides_from_shape(shape),
        }
    }
}

impl<T: Zero + Clone, const N: usize> Tensor<T, N> {
    /// Creates a new zero-filled `Tensor` with the given shape.
    pub fn zeros(shape: [usize; N]) -> Self {
        Self::from_shape_val(shape, T::zero())
    }
}
