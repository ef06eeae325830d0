//! Automatic differentiation of the safe primitives.
//!
//! Reverse mode records each `tracked_*` operation on a thread-local tape
//! and replays the tape backwards from a scalar loss. Forward mode carries
//! a tangent alongside each value and records nothing.
//!
//! ```text
//! TrackedTensor<f64> { tensor, node }      DualTensor<f64> { primal, tangent }
//!          │ tracked_*                              │ dual_*
//!          ▼                                        ▼
//! ComputationGraph (thread_local)          J_f(x) ẋ, one direction per pass
//!   leaf | Box<dyn GradFn>                          │
//!          │ backward / jacrev                      │ jacfwd
//!          ▼                                        ▼
//!      Gradients                             Jacobian out_shape ++ in_shape
//! ```
//!
//! The floored primitives differentiate through [`SafeSelectBackward`] and
//! [`dual_safe_select`]: lanes at or below the floor get an exactly zero
//! derivative, even where the unfloored norm has none.
//!
//! # Example
//!
//! ```
//! use ndnumerics::Tensor;
//! use ndnumerics::operations::Axis;
//! use ndnumerics::autodiff::{
//!     TrackedTensor, backward, clear_graph, tracked_safe_norm, tracked_sum,
//! };
//!
//! clear_graph();
//!
//! // columns [0, 0] and [3, 4]
//! let x = TrackedTensor::leaf(Tensor::from_vec(vec![0.0, 0.0, 3.0, 4.0], &[2, 2]).unwrap());
//! let norms = tracked_safe_norm(&x, 0.0, None, Some(Axis::Single(0)), false).unwrap();
//! let loss = tracked_sum(&norms).unwrap();
//!
//! let grads = backward(&loss).unwrap();
//! assert_eq!(grads.wrt(&x).unwrap().data(), &[0.0, 0.0, 0.6, 0.8]);
//! ```
//!
//! Only `f64` is differentiated; the eager primitives also accept complex
//! input.

mod backward;
mod dual;
mod gradients;
mod graph;
mod jacobian;
mod ops;
mod saved_tensor;
mod tensor;

pub use backward::{backward, backward_with, grad};
pub use dual::DualTensor;
pub use gradients::Gradients;
pub use graph::{ComputationGraph, GradFn, NodeId, clear_graph_f64, with_graph_f64};
pub use jacobian::{jacfwd, jacrev};
pub use ops::{
    AbsSqBackward, ReductionBackward, SafeSelectBackward, SumBackward, dual_abs_sq, dual_norm,
    dual_root_mean_squares, dual_safe_norm, dual_safe_root_mean_squares, dual_safe_select,
    tracked_abs_sq, tracked_norm, tracked_root_mean_squares, tracked_safe_norm,
    tracked_safe_root_mean_squares, tracked_safe_select, tracked_sum,
};
pub use saved_tensor::SavedTensor;
pub use tensor::{TrackedTensor, clear_graph};
