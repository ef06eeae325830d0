//! ndnumerics - numerically safe tensor primitives
//!
//! Small building blocks for gradient-based optimization whose gradients stay
//! finite where the naive formula breaks down:
//!
//! - [`safe_int32_increment`]: a step counter that saturates instead of
//!   wrapping around.
//! - [`safe_norm`]: a norm (any order, axis or axis pair) floored at
//!   `min_norm`, with a zero gradient at the zero input.
//! - [`safe_root_mean_squares`]: the same for the root-mean-square.
//! - [`abs_sq`]: `|x|^2` with a real result, specialized per element type.
//!
//! # Architecture
//!
//! ```text
//! numerics   safe primitives (eager)
//!     │
//!     ├── autodiff   tracked_* (reverse mode), dual_* (forward mode), jacfwd
//!     ├── trace      staged programs (Traced<E>, trace_fn)
//!     ▼
//! operations elementwise, reductions, norms, faer-backed SVD
//!     │
//!     ▼
//! tensor / strides / scalar   column-major dense tensors
//! ```
//!
//! # Example
//!
//! ```
//! use ndnumerics::{DenseTensor, Tensor, safe_norm};
//! use ndnumerics::operations::Axis;
//!
//! // Column-major data: columns [0, 0] and [3, 4]
//! let t: DenseTensor<f64> = Tensor::from_vec(vec![0.0, 0.0, 3.0, 4.0], &[2, 2]).unwrap();
//! let n = safe_norm(&t, 1.0, None, Some(Axis::Single(0)), false).unwrap();
//! assert_eq!(n.data(), &[1.0, 5.0]);
//! ```

#[cfg(feature = "autodiff")]
pub mod autodiff;
pub mod error;
pub mod numerics;
pub mod operations;
pub mod random;
pub mod scalar;
pub mod strides;
pub mod tensor;
#[cfg(feature = "trace")]
pub mod trace;

pub use error::TensorError;
pub use numerics::{abs_sq, safe_int32_increment, safe_norm, safe_root_mean_squares};
pub use scalar::{DType, Element, RealScalar, Scalar, c64};
pub use tensor::{DenseTensor, Tensor};
