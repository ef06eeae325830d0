//! Differentiable operations.
//!
//! `tracked_*` record into the reverse-mode graph; `dual_*` push tangents
//! forward.

mod reduce;
mod safe;
mod select;

pub use reduce::{
    ReductionBackward, SumBackward, dual_norm, dual_root_mean_squares, tracked_norm,
    tracked_root_mean_squares, tracked_sum,
};
pub use safe::{
    AbsSqBackward, dual_abs_sq, dual_safe_norm, dual_safe_root_mean_squares, tracked_abs_sq,
    tracked_safe_norm, tracked_safe_root_mean_squares,
};
pub use select::{SafeSelectBackward, dual_safe_select, tracked_safe_select};
