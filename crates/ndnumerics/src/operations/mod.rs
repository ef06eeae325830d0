//! Tensor operations.
//!
//! ```text
//! elementwise  → map, apply, where_select, square, abs_sq, ...
//! reduce       → ReductionLayout, LaneReduction, sum, mean, rms
//! norm         → NormPlan (vector / matrix norms, VJP, JVP)
//! linalg       → thin SVD through faer
//! ```
//!
//! Every function returns a new tensor; inputs are never mutated.

mod elementwise;
mod linalg;
mod norm;
mod reduce;

pub use elementwise::{
    abs_sq, apply, apply_binary, conj, imag, map, real, scale, square, where_scalar, where_select,
};
pub use linalg::{MatrixSvd, singular_values, svd_thin};
pub use norm::{Axis, NormOrd, NormPlan, frobenius_norm, norm, norm_jvp, norm_vjp};
pub use reduce::{
    Axes, LaneReduction, ReductionLayout, RootMeanSquare, mean, normalize_axes, normalize_axis,
    root_mean_squares, sum,
};
