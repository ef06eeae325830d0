//! Integration tests for autodiff module.
//!
//! Checks reverse- and forward-mode gradients of the safe primitives against
//! central finite differences away from the floor.

#![cfg(feature = "autodiff")]

use approx::assert_relative_eq;
use ndnumerics::autodiff::{
    TrackedTensor, backward, clear_graph, dual_safe_norm, grad, jacfwd, jacrev, tracked_abs_sq,
    tracked_safe_norm, tracked_safe_root_mean_squares, tracked_sum,
};
use ndnumerics::operations::{Axis, NormOrd};
use ndnumerics::{DenseTensor, Tensor, safe_norm, safe_root_mean_squares};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Compute numerical gradient using central difference.
///
/// grad_i ≈ (f(x + eps*e_i) - f(x - eps*e_i)) / (2*eps)
fn numerical_gradient<F>(f: F, x: &[f64], eps: f64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut grad = vec![0.0; x.len()];
    let mut x_plus = x.to_vec();
    let mut x_minus = x.to_vec();

    for i in 0..x.len() {
        x_plus[i] = x[i] + eps;
        x_minus[i] = x[i] - eps;
        grad[i] = (f(&x_plus) - f(&x_minus)) / (2.0 * eps);
        x_plus[i] = x[i];
        x_minus[i] = x[i];
    }
    grad
}

/// Sum of `safe_norm` over its output, as a function of flat data.
fn summed_safe_norm(
    shape: &[usize],
    min_norm: f64,
    ord: Option<NormOrd>,
    axis: Option<Axis>,
) -> impl Fn(&[f64]) -> f64 {
    move |data: &[f64]| {
        let x = Tensor::from_vec(data.to_vec(), shape).unwrap();
        safe_norm(&x, min_norm, ord, axis, false)
            .unwrap()
            .data()
            .iter()
            .sum()
    }
}

#[test]
fn test_safe_norm_gradient_matches_finite_differences() {
    let shape = [3, 4];
    let x: DenseTensor<f64> = Tensor::randn_with_rng(&shape, &mut StdRng::seed_from_u64(7));

    let cases = [
        (None, None),
        (None, Some(Axis::Single(0))),
        (Some(NormOrd::P(1.0)), Some(Axis::Single(1))),
        (Some(NormOrd::P(3.0)), Some(Axis::Single(0))),
        (Some(NormOrd::P(-1.5)), Some(Axis::Single(1))),
        (Some(NormOrd::Inf), Some(Axis::Single(0))),
        (Some(NormOrd::Fro), None),
        (Some(NormOrd::Nuc), None),
        (Some(NormOrd::P(2.0)), None),
        (Some(NormOrd::P(-2.0)), None),
        (Some(NormOrd::P(1.0)), Some(Axis::Pair(1, 0))),
    ];
    for (ord, axis) in cases {
        let numerical =
            numerical_gradient(summed_safe_norm(&shape, 0.0, ord, axis), x.data(), 1e-6);
        let analytical = grad(
            |t| tracked_sum(&tracked_safe_norm(t, 0.0, ord, axis, false)?),
            &x,
        )
        .unwrap();
        for (a, n) in analytical.data().iter().zip(&numerical) {
            assert_relative_eq!(*a, *n, epsilon = 1e-5, max_relative = 1e-5);
        }
    }
}

#[test]
fn test_forward_and_reverse_agree() {
    let x: DenseTensor<f64> = Tensor::randn_with_rng(&[3, 4], &mut StdRng::seed_from_u64(11));
    for (ord, axis) in [
        (None, Some(Axis::Single(1))),
        (Some(NormOrd::Nuc), Some(Axis::Pair(0, 1))),
        (Some(NormOrd::NegInf), Some(Axis::Single(0))),
    ] {
        let fwd = jacfwd(|t| dual_safe_norm(t, 0.0, ord, axis, true), &x).unwrap();
        let rev = jacrev(|t| tracked_safe_norm(t, 0.0, ord, axis, true), &x).unwrap();
        assert_eq!(fwd.shape(), rev.shape());
        for (a, b) in fwd.data().iter().zip(rev.data()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-10);
        }
    }
}

#[test]
fn test_partially_floored_rows() {
    // rows [0, 0, 0] and [3, 4, 0]
    let x = Tensor::from_vec(vec![0.0, 3.0, 0.0, 4.0, 0.0, 0.0], &[2, 3]).unwrap();
    let g = grad(
        |t| tracked_sum(&tracked_safe_norm(t, 1.0, None, Some(Axis::Single(1)), false)?),
        &x,
    )
    .unwrap();
    let expected = [0.0, 0.6, 0.0, 0.8, 0.0, 0.0];
    for (a, e) in g.data().iter().zip(expected) {
        assert_relative_eq!(*a, e, epsilon = 1e-12);
    }
}

#[test]
fn test_safe_rms_gradient_matches_finite_differences() {
    let x: DenseTensor<f64> = Tensor::randn_with_rng(&[5], &mut StdRng::seed_from_u64(3));
    let f = |data: &[f64]| {
        let t = Tensor::from_vec(data.to_vec(), &[5]).unwrap();
        safe_root_mean_squares(&t, 1e-3).unwrap().item().unwrap()
    };
    let numerical = numerical_gradient(f, x.data(), 1e-6);
    let analytical = grad(|t| tracked_safe_root_mean_squares(t, 1e-3), &x).unwrap();
    for (a, n) in analytical.data().iter().zip(&numerical) {
        assert_relative_eq!(*a, *n, epsilon = 1e-6);
    }
}

#[test]
fn test_two_losses_on_one_leaf() {
    clear_graph();

    let x = TrackedTensor::leaf(Tensor::from_vec(vec![3.0, 4.0], &[2]).unwrap());
    let sq = tracked_sum(&tracked_abs_sq(&x).unwrap()).unwrap();
    let n = tracked_safe_norm(&x, 0.0, None, None, false).unwrap();

    let grads_sq = backward(&sq).unwrap();
    let grads_n = backward(&n).unwrap();
    assert_eq!(grads_sq.wrt(&x).unwrap().data(), &[6.0, 8.0]);
    assert_eq!(grads_n.wrt(&x).unwrap().data(), &[0.6, 0.8]);
}
