//! Random tensors for probing the safe primitives.
//!
//! Uniform and normal samples for the differentiable types, plus uniform
//! `i32` counters covering the whole range (including the saturation
//! boundary of [`safe_int32_increment`](crate::numerics::safe_int32_increment)).

use rand::Rng;
use rand::distr::StandardUniform;
use rand_distr::StandardNormal;

use crate::scalar::{Element, c64};
use crate::strides::shape_len;
use crate::tensor::Tensor;

/// Element types with a uniform distribution.
///
/// Floats sample `[0, 1)`, complex numbers sample both parts from `[0, 1)`,
/// integers sample their full range.
pub trait RandomUniform: Element {
    fn sample_uniform<R: Rng>(rng: &mut R) -> Self;
}

impl RandomUniform for i32 {
    fn sample_uniform<R: Rng>(rng: &mut R) -> Self {
        rng.sample(StandardUniform)
    }
}

impl RandomUniform for f64 {
    fn sample_uniform<R: Rng>(rng: &mut R) -> Self {
        rng.sample(StandardUniform)
    }
}

impl RandomUniform for c64 {
    fn sample_uniform<R: Rng>(rng: &mut R) -> Self {
        c64::new(rng.sample(StandardUniform), rng.sample(StandardUniform))
    }
}

/// Element types with a standard normal distribution.
pub trait RandomNormal: Element {
    fn sample_normal<R: Rng>(rng: &mut R) -> Self;
}

impl RandomNormal for f64 {
    fn sample_normal<R: Rng>(rng: &mut R) -> Self {
        rng.sample(StandardNormal)
    }
}

impl RandomNormal for c64 {
    fn sample_normal<R: Rng>(rng: &mut R) -> Self {
        // independent N(0, 1/2) parts, so E|z|^2 = 1
        let scale = std::f64::consts::FRAC_1_SQRT_2;
        c64::new(
            rng.sample::<f64, _>(StandardNormal) * scale,
            rng.sample::<f64, _>(StandardNormal) * scale,
        )
    }
}

fn sample_tensor<ElT: Element, R: Rng>(
    shape: &[usize],
    rng: &mut R,
    sample: impl Fn(&mut R) -> ElT,
) -> Tensor<ElT> {
    let data: Vec<ElT> = (0..shape_len(shape)).map(|_| sample(rng)).collect();
    Tensor::from_vec(data, shape).expect("random: data length follows shape")
}

impl<ElT: RandomUniform> Tensor<ElT> {
    /// Tensor of uniform samples from the thread RNG.
    ///
    /// ```
    /// use ndnumerics::Tensor;
    ///
    /// let t: Tensor<f64> = Tensor::random(&[2, 3]);
    /// assert!(t.data().iter().all(|v| (0.0..1.0).contains(v)));
    /// ```
    pub fn random(shape: &[usize]) -> Self {
        Self::random_with_rng(shape, &mut rand::rng())
    }

    /// Tensor of uniform samples from `rng`, for reproducible inputs.
    ///
    /// ```
    /// use ndnumerics::Tensor;
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    ///
    /// let a: Tensor<i32> = Tensor::random_with_rng(&[4], &mut StdRng::seed_from_u64(7));
    /// let b: Tensor<i32> = Tensor::random_with_rng(&[4], &mut StdRng::seed_from_u64(7));
    /// assert_eq!(a, b);
    /// ```
    pub fn random_with_rng<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
        sample_tensor(shape, rng, ElT::sample_uniform)
    }
}

impl<ElT: RandomNormal> Tensor<ElT> {
    /// Tensor of standard normal samples from the thread RNG.
    pub fn randn(shape: &[usize]) -> Self {
        Self::randn_with_rng(shape, &mut rand::rng())
    }

    /// Tensor of standard normal samples from `rng`.
    pub fn randn_with_rng<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
        sample_tensor(shape, rng, ElT::sample_normal)
    }
}
