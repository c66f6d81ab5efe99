#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! For two batched point sets `xyz1: [B, N, 6]` and `xyz2: [B, M, 6]` the operator finds,
//! for every point, its nearest neighbor in the other set under the squared Euclidean
//! distance over all six coordinates. The forward pass returns the distances and indices in
//! both directions; the backward pass scatters upstream gradients of those distances back
//! onto the input coordinates.
//!
//! ```rust
//! use nndistance_ops::{NnDistance, NnDistanceError};
//! use nndistance_tensor::{Tensor2, Tensor3};
//!
//! # fn main() -> Result<(), NnDistanceError> {
//! let xyz1 = Tensor3::<f32>::from_shape_vec([1, 1, 6], vec![0.0; 6])?;
//! let xyz2 = Tensor3::<f32>::from_shape_vec([1, 1, 6], vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0])?;
//!
//! let op = NnDistance::default();
//! let out = op.forward(&xyz1, &xyz2)?;
//! assert_eq!(out.dist1.as_slice(), &[1.0]);
//! assert_eq!(out.idx2.as_slice(), &[0]);
//!
//! let grad_dist1 = Tensor2::<f32>::from_shape_vec([1, 1], vec![1.0])?;
//! let grad_dist2 = Tensor2::<f32>::zeros([1, 1]);
//! let grads = op.backward_from_output(&xyz1, &xyz2, &out, &grad_dist1, &grad_dist2)?;
//! assert_eq!(grads.grad_xyz1.as_slice(), &[-2.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
//! assert_eq!(grads.grad_xyz2.as_slice(), &[2.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
//! # Ok(())
//! # }
//! ```
//!
//! The execution path is chosen at runtime through [`NnDistanceConfig`]: the `cpu` device
//! runs sequential loops, the `accelerator` device runs a data-parallel launch grid on a
//! rayon thread pool. Both honor the same contracts.

/// Chamfer reduction on top of the bilateral nearest-neighbor operator.
pub mod chamfer;

/// Runtime configuration of the operator.
pub mod config;

/// Error types for the operator.
pub mod error;

/// Execution path selection and the kernel trait both paths implement.
pub mod executor;

/// The forward/backward operator.
pub mod nn_distance;

/// Thread pool management for the accelerator path.
pub mod parallel;

/// Point set views and stride-based index helpers.
pub mod points;

/// Gradient scatter kernels.
pub mod scatter;

/// Nearest-neighbor search kernels.
pub mod search;

/// Shape and index contract checks.
pub mod validation;

pub use chamfer::{ChamferDistance, ChamferForward, Reduction};
pub use config::NnDistanceConfig;
pub use error::NnDistanceError;
pub use executor::{Executor, NnDistanceKernel};
pub use nn_distance::{NnDistance, NnDistanceGrad, NnDistanceOutput, RawTensor};
pub use points::POINT_DIM;
