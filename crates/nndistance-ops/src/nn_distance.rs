use nndistance_tensor::{Device, Tensor2, Tensor3, TensorView};

use crate::{
    config::NnDistanceConfig,
    error::NnDistanceError,
    executor::{Executor, NnDistanceKernel, SearchOutputs},
    points::{PointSetView, POINT_DIM},
    scatter::ScatterInputs,
    validation::{check_backward, check_forward, check_indices},
};

/// Forward outputs: the matches of both directions.
#[derive(Debug, Clone, PartialEq)]
pub struct NnDistanceOutput {
    /// Squared distance from every point of `xyz1` to its nearest neighbor in `xyz2`, `[B, N]`.
    pub dist1: Tensor2<f32>,
    /// Index in `xyz2` of that neighbor, `[B, N]`.
    pub idx1: Tensor2<i32>,
    /// Squared distance from every point of `xyz2` to its nearest neighbor in `xyz1`, `[B, M]`.
    pub dist2: Tensor2<f32>,
    /// Index in `xyz1` of that neighbor, `[B, M]`.
    pub idx2: Tensor2<i32>,
}

/// Backward outputs: gradients with respect to both point sets.
#[derive(Debug, Clone, PartialEq)]
pub struct NnDistanceGrad {
    /// Gradient with respect to `xyz1`, `[B, N, 6]`.
    pub grad_xyz1: Tensor3<f32>,
    /// Gradient with respect to `xyz2`, `[B, M, 6]`.
    pub grad_xyz2: Tensor3<f32>,
}

/// A flat row-major buffer together with its runtime shape, as a host framework hands it over.
#[derive(Debug, Clone, Copy)]
pub struct RawTensor<'a, T> {
    /// Shape of the buffer; the rank is only known at runtime.
    pub shape: &'a [usize],
    /// Row-major data.
    pub data: &'a [T],
}

impl<'a, T> RawTensor<'a, T> {
    /// Wraps a shape and its data.
    pub fn new(shape: &'a [usize], data: &'a [T]) -> Self {
        Self { shape, data }
    }
}

/// Bilateral nearest-neighbor distance between two batched 6D point sets.
///
/// The operator is stateless across calls: the forward pass returns fresh matches and
/// the backward pass consumes the matches it is given.
#[derive(Debug, Clone, Default)]
pub struct NnDistance {
    executor: Executor,
}

impl NnDistance {
    /// Creates the operator for the execution path described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`NnDistanceError::Parallel`] if the accelerator thread pool cannot be built.
    pub fn new(config: &NnDistanceConfig) -> Result<Self, NnDistanceError> {
        Ok(Self {
            executor: Executor::from_config(config)?,
        })
    }

    /// The device the operator runs on.
    pub fn device(&self) -> Device {
        self.executor.device()
    }

    /// Nearest neighbors in both directions.
    ///
    /// # Arguments
    ///
    /// * `xyz1` - First point set of shape `[B, N, 6]`.
    /// * `xyz2` - Second point set of shape `[B, M, 6]`.
    ///
    /// # Returns
    ///
    /// `dist1`/`idx1` of shape `[B, N]` and `dist2`/`idx2` of shape `[B, M]`.
    ///
    /// # Errors
    ///
    /// Fails before allocating anything if the trailing dimensions are not 6 or the batch
    /// sizes differ.
    ///
    /// If either set has no points, no match exists: the outputs are returned zero-filled,
    /// `[B, N]` and `[B, M]` as usual.
    pub fn forward(
        &self,
        xyz1: &Tensor3<f32>,
        xyz2: &Tensor3<f32>,
    ) -> Result<NnDistanceOutput, NnDistanceError> {
        self.forward_view(xyz1.view(), xyz2.view())
    }

    /// Same as [`NnDistance::forward`] on borrowed views.
    ///
    /// # Errors
    ///
    /// In addition to the [`NnDistance::forward`] errors, fails with a
    /// [`TensorError`](nndistance_tensor::TensorError) if a view's data length or strides
    /// do not match a contiguous layout of its shape.
    pub fn forward_view(
        &self,
        xyz1: TensorView<'_, f32, 3>,
        xyz2: TensorView<'_, f32, 3>,
    ) -> Result<NnDistanceOutput, NnDistanceError> {
        let size = check_forward(&xyz1.shape, &xyz2.shape)?;
        xyz1.check_layout()?;
        xyz2.check_layout()?;

        let mut out = NnDistanceOutput {
            dist1: Tensor2::zeros(size.shape1()),
            idx1: Tensor2::zeros(size.shape1()),
            dist2: Tensor2::zeros(size.shape2()),
            idx2: Tensor2::zeros(size.shape2()),
        };
        if size.is_empty() {
            return Ok(out);
        }

        let now = std::time::Instant::now();
        self.executor.search(
            PointSetView::new(xyz1),
            PointSetView::new(xyz2),
            SearchOutputs {
                dist1: out.dist1.as_slice_mut(),
                idx1: out.idx1.as_slice_mut(),
                dist2: out.dist2.as_slice_mut(),
                idx2: out.idx2.as_slice_mut(),
            },
        );
        log::debug!(
            "nn_distance forward [{}] b={} n={} m={} took {:?}",
            self.device(),
            size.batch,
            size.num_points1,
            size.num_points2,
            now.elapsed()
        );

        Ok(out)
    }

    /// Same as [`NnDistance::forward`] on framework-owned buffers with runtime shapes.
    ///
    /// # Errors
    ///
    /// In addition to the [`NnDistance::forward`] errors, fails if a point set is not of
    /// rank 3 or its data length does not match its shape.
    pub fn forward_raw(
        &self,
        xyz1: RawTensor<'_, f32>,
        xyz2: RawTensor<'_, f32>,
    ) -> Result<NnDistanceOutput, NnDistanceError> {
        check_forward(xyz1.shape, xyz2.shape)?;
        self.forward_view(
            TensorView::from_dyn_shape(xyz1.shape, xyz1.data)?,
            TensorView::from_dyn_shape(xyz2.shape, xyz2.data)?,
        )
    }

    /// Gradients of both point sets given upstream gradients of the forward distances.
    ///
    /// # Arguments
    ///
    /// * `xyz1` - First point set of shape `[B, N, 6]`.
    /// * `xyz2` - Second point set of shape `[B, M, 6]`.
    /// * `grad_dist1` - Gradient with respect to `dist1`, `[B, N]`.
    /// * `idx1` - Forward `idx1`, `[B, N]`.
    /// * `grad_dist2` - Gradient with respect to `dist2`, `[B, M]`.
    /// * `idx2` - Forward `idx2`, `[B, M]`.
    ///
    /// # Errors
    ///
    /// Fails before allocating anything on any forward precondition, on an auxiliary
    /// shape that does not match the point sets, or on an index outside the other set.
    pub fn backward(
        &self,
        xyz1: &Tensor3<f32>,
        xyz2: &Tensor3<f32>,
        grad_dist1: &Tensor2<f32>,
        idx1: &Tensor2<i32>,
        grad_dist2: &Tensor2<f32>,
        idx2: &Tensor2<i32>,
    ) -> Result<NnDistanceGrad, NnDistanceError> {
        self.backward_view(
            xyz1.view(),
            xyz2.view(),
            grad_dist1.view(),
            idx1.view(),
            grad_dist2.view(),
            idx2.view(),
        )
    }

    /// Same as [`NnDistance::backward`], taking the indices from a forward output.
    pub fn backward_from_output(
        &self,
        xyz1: &Tensor3<f32>,
        xyz2: &Tensor3<f32>,
        output: &NnDistanceOutput,
        grad_dist1: &Tensor2<f32>,
        grad_dist2: &Tensor2<f32>,
    ) -> Result<NnDistanceGrad, NnDistanceError> {
        self.backward(
            xyz1,
            xyz2,
            grad_dist1,
            &output.idx1,
            grad_dist2,
            &output.idx2,
        )
    }

    /// Same as [`NnDistance::backward`] on borrowed views.
    #[allow(clippy::too_many_arguments)]
    pub fn backward_view(
        &self,
        xyz1: TensorView<'_, f32, 3>,
        xyz2: TensorView<'_, f32, 3>,
        grad_dist1: TensorView<'_, f32, 2>,
        idx1: TensorView<'_, i32, 2>,
        grad_dist2: TensorView<'_, f32, 2>,
        idx2: TensorView<'_, i32, 2>,
    ) -> Result<NnDistanceGrad, NnDistanceError> {
        let size = check_forward(&xyz1.shape, &xyz2.shape)?;
        check_backward(
            &size,
            &grad_dist1.shape,
            &idx1.shape,
            &grad_dist2.shape,
            &idx2.shape,
        )?;
        xyz1.check_layout()?;
        xyz2.check_layout()?;
        grad_dist1.check_layout()?;
        idx1.check_layout()?;
        grad_dist2.check_layout()?;
        idx2.check_layout()?;

        // with an empty side the forward indices reference nothing
        if !size.is_empty() {
            check_indices("idx1", idx1.as_slice(), size.num_points2)?;
            check_indices("idx2", idx2.as_slice(), size.num_points1)?;
        }

        // both directions accumulate into these, so they start at zero
        let mut grads = NnDistanceGrad {
            grad_xyz1: Tensor3::zeros([size.batch, size.num_points1, POINT_DIM]),
            grad_xyz2: Tensor3::zeros([size.batch, size.num_points2, POINT_DIM]),
        };
        if size.is_empty() {
            return Ok(grads);
        }

        let inputs = ScatterInputs {
            xyz1: PointSetView::new(xyz1),
            xyz2: PointSetView::new(xyz2),
            grad_dist1: grad_dist1.as_slice(),
            idx1: idx1.as_slice(),
            grad_dist2: grad_dist2.as_slice(),
            idx2: idx2.as_slice(),
        };

        let now = std::time::Instant::now();
        self.executor.scatter(
            &inputs,
            grads.grad_xyz1.as_slice_mut(),
            grads.grad_xyz2.as_slice_mut(),
        );
        log::debug!(
            "nn_distance backward [{}] b={} n={} m={} took {:?}",
            self.device(),
            size.batch,
            size.num_points1,
            size.num_points2,
            now.elapsed()
        );

        Ok(grads)
    }

    /// Same as [`NnDistance::backward`] on framework-owned buffers with runtime shapes.
    #[allow(clippy::too_many_arguments)]
    pub fn backward_raw(
        &self,
        xyz1: RawTensor<'_, f32>,
        xyz2: RawTensor<'_, f32>,
        grad_dist1: RawTensor<'_, f32>,
        idx1: RawTensor<'_, i32>,
        grad_dist2: RawTensor<'_, f32>,
        idx2: RawTensor<'_, i32>,
    ) -> Result<NnDistanceGrad, NnDistanceError> {
        let size = check_forward(xyz1.shape, xyz2.shape)?;
        check_backward(
            &size,
            grad_dist1.shape,
            idx1.shape,
            grad_dist2.shape,
            idx2.shape,
        )?;
        self.backward_view(
            TensorView::from_dyn_shape(xyz1.shape, xyz1.data)?,
            TensorView::from_dyn_shape(xyz2.shape, xyz2.data)?,
            TensorView::from_dyn_shape(grad_dist1.shape, grad_dist1.data)?,
            TensorView::from_dyn_shape(idx1.shape, idx1.data)?,
            TensorView::from_dyn_shape(grad_dist2.shape, grad_dist2.data)?,
            TensorView::from_dyn_shape(idx2.shape, idx2.data)?,
        )
    }
}
