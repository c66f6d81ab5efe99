use nndistance_tensor::TensorView;

/// Number of scalar coordinates per point.
///
/// The layout is two concatenated 3D coordinates, but the kernels treat all six
/// coordinates uniformly.
pub const POINT_DIM: usize = 6;

/// Offset of the first coordinate of point `index` of batch `batch` in a contiguous
/// `[B, num_points, POINT_DIM]` buffer.
#[inline]
pub fn point_offset(batch: usize, index: usize, num_points: usize) -> usize {
    (batch * num_points + index) * POINT_DIM
}

/// A validated, read-only `[B, N, 6]` point set.
#[derive(Debug, Clone, Copy)]
pub struct PointSetView<'a> {
    view: TensorView<'a, f32, 3>,
}

impl<'a> PointSetView<'a> {
    /// Wraps a view whose trailing dimension has already been checked.
    pub(crate) fn new(view: TensorView<'a, f32, 3>) -> Self {
        debug_assert_eq!(view.shape[2], POINT_DIM);
        Self { view }
    }

    /// Number of batches.
    #[inline]
    pub fn batch_size(&self) -> usize {
        self.view.shape[0]
    }

    /// Number of points per batch.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.view.shape[1]
    }

    /// Coordinates of point `index` in batch `batch`.
    ///
    /// # Panics
    ///
    /// Panics if the point lies outside the buffer.
    #[inline]
    pub fn point(&self, batch: usize, index: usize) -> &'a [f32] {
        let offset = batch * self.view.strides[0] + index * self.view.strides[1];
        &self.view.data[offset..offset + POINT_DIM]
    }

    /// Iterator over the points of one batch, in index order.
    #[inline]
    pub fn points(&self, batch: usize) -> std::slice::ChunksExact<'a, f32> {
        let stride = self.view.strides[0];
        self.view.data[batch * stride..(batch + 1) * stride].chunks_exact(POINT_DIM)
    }
}

/// A mutable `[B, N, 6]` gradient buffer.
pub(crate) struct PointGradMut<'a> {
    data: &'a mut [f32],
    num_points: usize,
}

impl<'a> PointGradMut<'a> {
    pub(crate) fn new(data: &'a mut [f32], num_points: usize) -> Self {
        Self { data, num_points }
    }

    #[inline]
    pub(crate) fn point_mut(&mut self, batch: usize, index: usize) -> &mut [f32] {
        let offset = point_offset(batch, index, self.num_points);
        &mut self.data[offset..offset + POINT_DIM]
    }
}
