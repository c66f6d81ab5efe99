/// Contiguous, owned tensor storage.
///
/// The buffer is a single flat allocation; the tensor on top of it decides how a
/// multi-dimensional index maps to an offset. Every access goes through slice
/// indexing, so out-of-range offsets panic instead of reading foreign memory.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorStorage<T> {
    data: Vec<T>,
}

impl<T> TensorStorage<T> {
    /// Creates a new storage taking ownership of the given vector.
    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data }
    }

    /// Returns the number of elements in the storage.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the storage holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the storage data as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Returns the storage data as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Clone> TensorStorage<T> {
    /// Creates a new storage filled with `value`.
    pub fn from_val(len: usize, value: T) -> Self {
        Self {
            data: vec![value; len],
        }
    }
}
