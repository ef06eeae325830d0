//! Numerically safe primitives for gradient-based optimization.
//!
//! ```text
//! safe_int32_increment     x + 1, saturating at i32::MAX
//! safe_norm                norm floored at min_norm, zero gradient at 0
//! safe_root_mean_squares   rms floored at min_rms, zero gradient at 0
//! abs_sq                   |x|^2, real-typed, specialized per element type
//! ```
//!
//! These are the eager renditions. The differentiable ones live in
//! [`autodiff`](crate::autodiff) (`tracked_*` for reverse mode, `dual_*` for
//! forward mode) and the staged `abs_sq` in [`trace`](crate::trace).

mod increment;
mod mask;
mod safe;

pub use increment::{safe_int32_increment, safe_int32_increment_scalar};
pub use mask::{SafeSelect, safe_select};
pub use safe::{safe_norm, safe_root_mean_squares};

#[cfg(feature = "autodiff")]
pub(crate) use mask::zero_where;

/// Elementwise `|x|^2` with a real element type.
///
/// Real inputs are squared; complex inputs use `re^2 + im^2`, never the
/// complex square `x * x`.
pub use crate::operations::abs_sq;
