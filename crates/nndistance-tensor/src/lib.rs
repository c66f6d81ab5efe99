#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `nndistance-tensor` provides the small amount of tensor machinery the nearest-neighbor
//! operators need: an owned, contiguous, row-major [`Tensor`] with compile-time rank, a
//! borrowed [`TensorView`] over buffers owned by somebody else (e.g. a host framework),
//! and the [`Device`] tag used to pick an execution path.
//!
//! # Quick Start
//!
//! ```rust
//! use nndistance_tensor::{Tensor, TensorView};
//!
//! // a batch of two 6D points
//! let data = vec![0.0f32; 12];
//! let points = Tensor::<f32, 3>::from_shape_vec([1, 2, 6], data).unwrap();
//! assert_eq!(points.shape, [1, 2, 6]);
//! assert_eq!(points.strides, [12, 6, 1]);
//!
//! // a view over borrowed data with a runtime shape
//! let raw = [1.0f32, 2.0, 3.0, 4.0];
//! let view = TensorView::<f32, 2>::from_dyn_shape(&[2, 2], &raw).unwrap();
//! assert_eq!(view.get([1, 0]), Some(&3.0));
//! ```

/// Device module containing the execution device tag.
pub mod device;

/// Storage module containing the flat buffer owned by a tensor.
pub mod storage;

/// Tensor module containing the owned tensor implementation and error types.
pub mod tensor;

/// View module containing non-owning tensor views.
pub mod view;

pub use crate::device::Device;
pub(crate) use crate::tensor::get_strides_from_shape;
pub use crate::tensor::{Tensor, TensorError};
pub use crate::view::TensorView;

/// Type alias for a 1-dimensional tensor.
pub type Tensor1<T> = Tensor<T, 1>;

/// Type alias for a 2-dimensional tensor.
pub type Tensor2<T> = Tensor<T, 2>;

/// Type alias for a 3-dimensional tensor.
pub type Tensor3<T> = Tensor<T, 3>;
