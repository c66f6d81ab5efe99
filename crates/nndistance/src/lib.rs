//! Bilateral nearest-neighbor distance for batched 6D point sets.
//!
//! ```rust
//! use nndistance::ops::{ChamferDistance, NnDistance, NnDistanceConfig, Reduction};
//! use nndistance::tensor::{Device, Tensor3};
//!
//! # fn main() -> Result<(), nndistance::ops::NnDistanceError> {
//! let xyz1 = Tensor3::<f32>::zeros([2, 16, 6]);
//! let xyz2 = Tensor3::<f32>::from_shape_val([2, 8, 6], 0.5);
//!
//! let op = NnDistance::new(&NnDistanceConfig::new(Device::Accelerator))?;
//! let chamfer = ChamferDistance::new(op, Reduction::Sum);
//! let fwd = chamfer.forward(&xyz1, &xyz2)?;
//! assert_eq!(fwd.loss, 48.0 * 1.5);
//! # Ok(())
//! # }
//! ```

#[doc(inline)]
pub use nndistance_tensor as tensor;

#[doc(inline)]
pub use nndistance_ops as ops;
