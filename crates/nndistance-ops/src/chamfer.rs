use nndistance_tensor::{Tensor2, Tensor3};

use crate::{
    error::NnDistanceError,
    nn_distance::{NnDistance, NnDistanceGrad, NnDistanceOutput},
};

/// How the two distance arrays are reduced to a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Reduction {
    /// Mean over the points of each direction, summed over directions, averaged over batches.
    #[default]
    Mean,
    /// Sum of every distance of both directions.
    Sum,
}

/// Result of a Chamfer forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ChamferForward {
    /// The reduced distance.
    pub loss: f32,
    /// The bilateral matches the loss was reduced from.
    pub matches: NnDistanceOutput,
}

/// Chamfer distance between two batched 6D point sets.
///
/// # Example
///
/// ```
/// use nndistance_ops::{ChamferDistance, NnDistance, NnDistanceError, Reduction};
/// use nndistance_tensor::Tensor3;
///
/// # fn main() -> Result<(), NnDistanceError> {
/// let xyz1 = Tensor3::<f32>::from_shape_vec([1, 1, 6], vec![0.0; 6])?;
/// let xyz2 = Tensor3::<f32>::from_shape_vec([1, 1, 6], vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0])?;
///
/// let chamfer = ChamferDistance::new(NnDistance::default(), Reduction::Mean);
/// let fwd = chamfer.forward(&xyz1, &xyz2)?;
/// assert_eq!(fwd.loss, 2.0);
///
/// let grads = chamfer.backward(&xyz1, &xyz2, &fwd, 1.0)?;
/// assert_eq!(grads.grad_xyz1.as_slice(), &[-4.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChamferDistance {
    op: NnDistance,
    reduction: Reduction,
}

impl ChamferDistance {
    /// Creates the reduction on top of `op`.
    pub fn new(op: NnDistance, reduction: Reduction) -> Self {
        Self { op, reduction }
    }

    /// The underlying operator.
    pub fn op(&self) -> &NnDistance {
        &self.op
    }

    /// The reduction applied to the distances.
    pub fn reduction(&self) -> Reduction {
        self.reduction
    }

    /// Runs the bilateral search and reduces both distance arrays.
    pub fn forward(
        &self,
        xyz1: &Tensor3<f32>,
        xyz2: &Tensor3<f32>,
    ) -> Result<ChamferForward, NnDistanceError> {
        let matches = self.op.forward(xyz1, xyz2)?;
        let loss = self.reduce(&matches.dist1) + self.reduce(&matches.dist2);
        log::trace!("chamfer {:?} loss: {}", self.reduction, loss);
        Ok(ChamferForward {
            loss: loss as f32,
            matches,
        })
    }

    /// Gradients of `grad_loss * loss` with respect to both point sets.
    pub fn backward(
        &self,
        xyz1: &Tensor3<f32>,
        xyz2: &Tensor3<f32>,
        forward: &ChamferForward,
        grad_loss: f32,
    ) -> Result<NnDistanceGrad, NnDistanceError> {
        let matches = &forward.matches;
        let grad_dist1 = Tensor2::from_shape_val(
            matches.dist1.shape,
            self.weight(&matches.dist1) * grad_loss,
        );
        let grad_dist2 = Tensor2::from_shape_val(
            matches.dist2.shape,
            self.weight(&matches.dist2) * grad_loss,
        );
        self.op
            .backward_from_output(xyz1, xyz2, matches, &grad_dist1, &grad_dist2)
    }

    fn reduce(&self, dist: &Tensor2<f32>) -> f64 {
        let sum = dist.as_slice().iter().map(|&d| d as f64).sum::<f64>();
        match self.reduction {
            Reduction::Sum => sum,
            Reduction::Mean if dist.numel() == 0 => 0.0,
            Reduction::Mean => sum / dist.numel() as f64,
        }
    }

    // d(loss)/d(dist) of every entry of one direction
    fn weight(&self, dist: &Tensor2<f32>) -> f32 {
        match self.reduction {
            Reduction::Sum => 1.0,
            Reduction::Mean if dist.numel() == 0 => 0.0,
            Reduction::Mean => 1.0 / dist.numel() as f32,
        }
    }
}
