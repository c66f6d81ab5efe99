use crate::{
    get_strides_from_shape,
    tensor::{shape_from_dyn, TensorError},
};

/// A borrowed, row-major view over tensor data owned elsewhere.
///
/// Views are what the operators consume: they are created either from an owned
/// [`Tensor`](crate::Tensor) via [`Tensor::view`](crate::Tensor::view) or directly
/// from a flat buffer handed over by a host framework via [`TensorView::from_dyn_shape`].
#[derive(Debug, Clone, Copy)]
pub struct TensorView<'a, T, const N: usize> {
    /// Reference to the flat data.
    pub data: &'a [T],
    /// The shape of the view.
    pub shape: [usize; N],
    /// The strides of the view.
    pub strides: [usize; N],
}

impl<'a, T, const N: usize> TensorView<'a, T, N> {
    /// Creates a view over `data` with the given shape.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidShape`] if the data length does not match the shape.
    pub fn from_shape_slice(shape: [usize; N], data: &'a [T]) -> Result<Self, TensorError> {
        let numel = shape.iter().product::<usize>();
        if numel != data.len() {
            return Err(TensorError::invalid_shape(numel, data.len()));
        }
        Ok(Self {
            data,
            shape,
            strides: get_strides_from_shape(shape),
        })
    }

    /// Creates a view from a shape only known at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidRank`] if `shape.len() != N`, or
    /// [`TensorError::InvalidShape`] if the data length does not match.
    pub fn from_dyn_shape(shape: &[usize], data: &'a [T]) -> Result<Self, TensorError> {
        Self::from_shape_slice(shape_from_dyn(shape)?, data)
    }

    /// Returns the underlying data as a slice.
    #[inline]
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the number of elements in the view.
    #[inline]
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Get the offset of the element at the given index.
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

    /// Checks that the data length and strides agree with a contiguous row-major
    /// layout of `shape`.
    ///
    /// Views built through the constructors always pass; a view assembled from its
    /// public fields may not.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidShape`] if the data length does not match the shape,
    /// or [`TensorError::InvalidStrides`] if the strides are not row-major.
    pub fn check_layout(&self) -> Result<(), TensorError> {
        let numel = self.shape.iter().product::<usize>();
        if numel != self.data.len() {
            return Err(TensorError::invalid_shape(numel, self.data.len()));
        }
        let expected = get_strides_from_shape(self.shape);
        if expected != self.strides {
            return Err(TensorError::InvalidStrides {
                expected: expected.to_vec(),
                actual: self.strides.to_vec(),
            });
        }
        Ok(())
    }

    /// Get the element at the given index, checking bounds.
    pub fn get(&self, index: [usize; N]) -> Option<&'a T> {
        self.get_iter_offset(index).and_then(|i| self.data.get(i))
    }
}
