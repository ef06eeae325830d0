//! Staging: record a function as a typed program instead of running it.
//!
//! A [`Traced`] value stands for a tensor of known shape and element type.
//! Element-type specific behavior, such as [`abs_sq`] on real versus complex
//! inputs, is chosen by trait implementation when the program is recorded,
//! so the resulting [`Program`] never contains a branch on the type.
//!
//! ```
//! use ndnumerics::{Tensor, c64};
//! use ndnumerics::trace::{abs_sq, trace_fn};
//!
//! let z = Tensor::scalar(c64::new(3.0, 1.0));
//! let staged = trace_fn("abs_sq", &z, abs_sq);
//! let naive = trace_fn("square", &z, |z| z * z);
//! assert_ne!(staged.body(), naive.body());
//! ```

mod program;
mod tracer;

pub use program::{Instr, OpKind, Program};
pub use tracer::{AbsSq, Traced, abs_sq, trace_fn};
