//! Vector and matrix norms along axes.
//!
//! Follows the usual array-library conventions:
//!
//! ```text
//! axis = None, ord = None   → Frobenius norm of every element, any rank
//! axis = None, ord = Some   → rank 1: vector norm, rank 2: matrix norm
//! axis = Single(k)          → vector norm along k
//! axis = Pair(r, c)         → matrix norm, rows along r, columns along c
//! ```
//!
//! The same plan also provides the VJP and JVP of the norm, used by the
//! autodiff renditions.

use std::fmt;

use crate::error::TensorError;
use crate::operations::linalg::svd_column_major;
use crate::operations::reduce::{LaneReduction, ReductionLayout, normalize_axis};
use crate::scalar::{RealOf, RealScalar, Scalar};
use crate::tensor::DenseTensor;

/// Order of a norm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormOrd {
    /// Max absolute entry (vector) or max absolute row sum (matrix).
    Inf,
    /// Min absolute entry (vector) or min absolute row sum (matrix).
    NegInf,
    /// Frobenius norm. Matrix only.
    Fro,
    /// Nuclear norm, the sum of singular values. Matrix only.
    Nuc,
    /// Numeric order `p`.
    P(f64),
}

impl NormOrd {
    /// Whether this is one of the named matrix orders (`Fro`, `Nuc`).
    pub fn is_named(self) -> bool {
        matches!(self, NormOrd::Fro | NormOrd::Nuc)
    }

    /// Fold infinite numeric orders into `Inf` / `NegInf`.
    fn canonical(self) -> Self {
        match self {
            NormOrd::P(p) => NormOrd::from(p),
            other => other,
        }
    }
}

impl From<f64> for NormOrd {
    fn from(p: f64) -> Self {
        if p == f64::INFINITY {
            NormOrd::Inf
        } else if p == f64::NEG_INFINITY {
            NormOrd::NegInf
        } else {
            NormOrd::P(p)
        }
    }
}

impl fmt::Display for NormOrd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormOrd::Inf => f.write_str("inf"),
            NormOrd::NegInf => f.write_str("-inf"),
            NormOrd::Fro => f.write_str("fro"),
            NormOrd::Nuc => f.write_str("nuc"),
            NormOrd::P(p) => write!(f, "{p}"),
        }
    }
}

/// Axes a norm reduces over. Negative values count from the back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Single(isize),
    Pair(isize, isize),
}

impl From<isize> for Axis {
    fn from(axis: isize) -> Self {
        Axis::Single(axis)
    }
}

impl From<(isize, isize)> for Axis {
    fn from((rows, cols): (isize, isize)) -> Self {
        Axis::Pair(rows, cols)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum VectorNorm {
    Euclidean,
    MaxAbs,
    MinAbs,
    NonZero,
    AbsSum,
    Power(f64),
}

impl VectorNorm {
    fn from_ord(ord: Option<NormOrd>) -> Result<Self, TensorError> {
        Ok(match ord.map(NormOrd::canonical) {
            None => VectorNorm::Euclidean,
            Some(NormOrd::Inf) => VectorNorm::MaxAbs,
            Some(NormOrd::NegInf) => VectorNorm::MinAbs,
            Some(NormOrd::P(p)) if p == 0.0 => VectorNorm::NonZero,
            Some(NormOrd::P(p)) if p == 1.0 => VectorNorm::AbsSum,
            Some(NormOrd::P(p)) if p == 2.0 => VectorNorm::Euclidean,
            Some(NormOrd::P(p)) if !p.is_nan() => VectorNorm::Power(p),
            Some(ord) => {
                return Err(TensorError::InvalidNormOrder {
                    ord: ord.to_string(),
                    reason: "not a vector norm order",
                });
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MatrixNorm {
    Frobenius,
    Nuclear,
    MaxRowSum,
    MinRowSum,
    MaxColSum,
    MinColSum,
    LargestSingular,
    SmallestSingular,
}

impl MatrixNorm {
    fn from_ord(ord: Option<NormOrd>) -> Result<Self, TensorError> {
        Ok(match ord.map(NormOrd::canonical) {
            None | Some(NormOrd::Fro) => MatrixNorm::Frobenius,
            Some(NormOrd::Nuc) => MatrixNorm::Nuclear,
            Some(NormOrd::Inf) => MatrixNorm::MaxRowSum,
            Some(NormOrd::NegInf) => MatrixNorm::MinRowSum,
            Some(NormOrd::P(p)) if p == 1.0 => MatrixNorm::MaxColSum,
            Some(NormOrd::P(p)) if p == -1.0 => MatrixNorm::MinColSum,
            Some(NormOrd::P(p)) if p == 2.0 => MatrixNorm::LargestSingular,
            Some(NormOrd::P(p)) if p == -2.0 => MatrixNorm::SmallestSingular,
            Some(ord) => {
                return Err(TensorError::InvalidNormOrder {
                    ord: ord.to_string(),
                    reason: "not a matrix norm order",
                });
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum NormKind {
    Vector(VectorNorm),
    Matrix {
        norm: MatrixNorm,
        nrows: usize,
        ncols: usize,
    },
}

/// A resolved norm: which elements reduce together and by which rule.
#[derive(Debug, Clone)]
pub struct NormPlan {
    layout: ReductionLayout,
    kind: NormKind,
}

impl NormPlan {
    /// Resolve `ord` and `axis` against an input of `shape`.
    ///
    /// # Errors
    ///
    /// - `InvalidAxis` for out-of-range or repeated axes.
    /// - `InvalidNormOrder` when `ord` is not defined for the reduction
    ///   (named orders along a single axis, non-matrix orders over a pair,
    ///   any explicit order over all axes of a tensor of rank above 2).
    pub fn new(
        shape: &[usize],
        ord: Option<NormOrd>,
        axis: Option<Axis>,
        keepdims: bool,
    ) -> Result<Self, TensorError> {
        let ndim = shape.len();
        match (axis, ord) {
            (None, None) => Ok(Self {
                layout: ReductionLayout::all(shape, keepdims),
                kind: NormKind::Vector(VectorNorm::Euclidean),
            }),
            (None, Some(o)) => match ndim {
                1 => Self::new(shape, ord, Some(Axis::Single(0)), keepdims),
                2 => Self::new(shape, ord, Some(Axis::Pair(0, 1)), keepdims),
                _ => Err(TensorError::InvalidNormOrder {
                    ord: o.to_string(),
                    reason: "an explicit order over all axes needs a 1-D or 2-D input",
                }),
            },
            (Some(Axis::Single(a)), _) => {
                let a = normalize_axis(a, ndim)?;
                Ok(Self {
                    layout: ReductionLayout::new(shape, &[a], keepdims),
                    kind: NormKind::Vector(VectorNorm::from_ord(ord)?),
                })
            }
            (Some(Axis::Pair(r, c)), _) => {
                let rows = normalize_axis(r, ndim)?;
                let cols = normalize_axis(c, ndim)?;
                if rows == cols {
                    return Err(TensorError::InvalidAxis {
                        axis: c,
                        ndim,
                        reason: "matrix norm axes must differ",
                    });
                }
                Ok(Self {
                    layout: ReductionLayout::new(shape, &[rows, cols], keepdims),
                    kind: NormKind::Matrix {
                        norm: MatrixNorm::from_ord(ord)?,
                        nrows: shape[rows],
                        ncols: shape[cols],
                    },
                })
            }
        }
    }

    /// Output shape of the norm.
    pub fn output_shape(&self) -> &[usize] {
        self.layout.output_shape()
    }
}

fn sum_real<R: RealScalar>(values: impl Iterator<Item = R>) -> R {
    values.fold(R::zero(), |acc, v| acc + v)
}

fn extreme<R: RealScalar>(
    values: impl Iterator<Item = R>,
    largest: bool,
) -> Result<R, TensorError> {
    values
        .reduce(|a, b| if (largest && b > a) || (!largest && b < a) { b } else { a })
        .ok_or_else(|| TensorError::InvalidOperation("extreme of an empty reduction".into()))
}

fn row_sums<T: Scalar>(lane: &[T], nrows: usize, ncols: usize) -> Vec<RealOf<T>> {
    (0..nrows)
        .map(|i| sum_real((0..ncols).map(|j| lane[i + nrows * j].modulus())))
        .collect()
}

fn col_sums<T: Scalar>(lane: &[T], nrows: usize, ncols: usize) -> Vec<RealOf<T>> {
    (0..ncols)
        .map(|j| sum_real((0..nrows).map(|i| lane[i + nrows * j].modulus())))
        .collect()
}

/// Spread `1 / ties` over the positions equal to `target`.
fn tie_weights(values: &[f64], target: f64) -> Vec<f64> {
    let ties = values.iter().filter(|&&v| v == target).count() as f64;
    values
        .iter()
        .map(|&v| if v == target { 1.0 / ties } else { 0.0 })
        .collect()
}

impl LaneReduction for NormPlan {
    fn layout(&self) -> &ReductionLayout {
        &self.layout
    }

    fn reduce_lane<T: Scalar>(&self, lane: &[T]) -> Result<RealOf<T>, TensorError> {
        let abs = || lane.iter().map(|x| x.modulus());
        let euclidean = || sum_real(lane.iter().map(|&x| Scalar::abs_sq(x))).sqrt();
        match self.kind {
            NormKind::Vector(VectorNorm::Euclidean) => Ok(euclidean()),
            NormKind::Vector(VectorNorm::MaxAbs) => extreme(abs(), true),
            NormKind::Vector(VectorNorm::MinAbs) => extreme(abs(), false),
            NormKind::Vector(VectorNorm::NonZero) => Ok(RealOf::<T>::from_f64(
                lane.iter().filter(|&&x| x != T::zero()).count() as f64,
            )),
            NormKind::Vector(VectorNorm::AbsSum) => Ok(sum_real(abs())),
            NormKind::Vector(VectorNorm::Power(p)) => {
                let p = RealOf::<T>::from_f64(p);
                let one = RealOf::<T>::from_f64(1.0);
                Ok(sum_real(abs().map(|a| a.powf(p))).powf(one / p))
            }
            NormKind::Matrix { norm, nrows, ncols } => match norm {
                MatrixNorm::Frobenius => Ok(euclidean()),
                MatrixNorm::MaxRowSum => extreme(row_sums(lane, nrows, ncols).into_iter(), true),
                MatrixNorm::MinRowSum => extreme(row_sums(lane, nrows, ncols).into_iter(), false),
                MatrixNorm::MaxColSum => extreme(col_sums(lane, nrows, ncols).into_iter(), true),
                MatrixNorm::MinColSum => extreme(col_sums(lane, nrows, ncols).into_iter(), false),
                MatrixNorm::Nuclear => {
                    let svd = svd_column_major(lane, nrows, ncols)?;
                    Ok(sum_real(svd.s.data().iter().copied()))
                }
                MatrixNorm::LargestSingular => {
                    let svd = svd_column_major(lane, nrows, ncols)?;
                    extreme(svd.s.data().iter().copied(), true)
                }
                MatrixNorm::SmallestSingular => {
                    let svd = svd_column_major(lane, nrows, ncols)?;
                    extreme(svd.s.data().iter().copied(), false)
                }
            },
        }
    }

    fn lane_gradient(&self, lane: &[f64], value: f64) -> Result<Vec<f64>, TensorError> {
        let abs: Vec<f64> = lane.iter().map(|x| x.abs()).collect();
        let euclidean = || -> Vec<f64> { lane.iter().map(|&x| x / value).collect() };
        let grad: Vec<f64> = match self.kind {
            NormKind::Vector(VectorNorm::Euclidean) => euclidean(),
            NormKind::Vector(VectorNorm::MaxAbs | VectorNorm::MinAbs) => tie_weights(&abs, value)
                .into_iter()
                .zip(lane)
                .map(|(w, &x)| w * x.sign())
                .collect(),
            NormKind::Vector(VectorNorm::NonZero) => vec![0.0; lane.len()],
            NormKind::Vector(VectorNorm::AbsSum) => lane.iter().map(|&x| x.sign()).collect(),
            NormKind::Vector(VectorNorm::Power(p)) => {
                let scale = value.powf(1.0 - p);
                lane.iter()
                    .map(|&x| x.sign() * x.abs().powf(p - 1.0) * scale)
                    .collect()
            }
            NormKind::Matrix { norm, nrows, ncols } => match norm {
                MatrixNorm::Frobenius => euclidean(),
                MatrixNorm::MaxRowSum | MatrixNorm::MinRowSum => {
                    let weights = tie_weights(&row_sums(lane, nrows, ncols), value);
                    (0..lane.len())
                        .map(|k| weights[k % nrows] * lane[k].sign())
                        .collect()
                }
                MatrixNorm::MaxColSum | MatrixNorm::MinColSum => {
                    let weights = tie_weights(&col_sums(lane, nrows, ncols), value);
                    (0..lane.len())
                        .map(|k| weights[k / nrows] * lane[k].sign())
                        .collect()
                }
                MatrixNorm::Nuclear
                | MatrixNorm::LargestSingular
                | MatrixNorm::SmallestSingular => {
                    let svd = svd_column_major(lane, nrows, ncols)?;
                    let rank = svd.rank();
                    let pairs = match norm {
                        MatrixNorm::Nuclear => 0..rank,
                        MatrixNorm::LargestSingular => 0..rank.min(1),
                        _ => rank.saturating_sub(1)..rank,
                    };
                    let (u, v) = (svd.u.data(), svd.v.data());
                    let mut grad = vec![0.0; lane.len()];
                    for k in pairs {
                        for j in 0..ncols {
                            for i in 0..nrows {
                                grad[i + nrows * j] += u[i + nrows * k] * v[j + ncols * k];
                            }
                        }
                    }
                    grad
                }
            },
        };
        Ok(grad)
    }
}

/// Compute the norm of `tensor`.
///
/// # Example
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::operations::{Axis, NormOrd, norm};
///
/// let t = Tensor::from_vec(vec![3.0, 4.0, 0.0, -1.0], &[2, 2]).unwrap();
/// let fro = norm(&t, None, None, false).unwrap();
/// assert!((fro.item().unwrap() - 26.0_f64.sqrt()).abs() < 1e-12);
///
/// // max |x| down each column
/// let cols = norm(&t, Some(NormOrd::Inf), Some(Axis::Single(0)), false).unwrap();
/// assert_eq!(cols.data(), &[4.0, 1.0]);
/// ```
pub fn norm<T: Scalar>(
    tensor: &DenseTensor<T>,
    ord: Option<NormOrd>,
    axis: Option<Axis>,
    keepdims: bool,
) -> Result<DenseTensor<RealOf<T>>, TensorError> {
    NormPlan::new(tensor.shape(), ord, axis, keepdims)?.evaluate(tensor)
}

/// Pull a cotangent of the norm output back to the input.
pub fn norm_vjp(
    tensor: &DenseTensor<f64>,
    ord: Option<NormOrd>,
    axis: Option<Axis>,
    keepdims: bool,
    cotangent: &DenseTensor<f64>,
) -> Result<DenseTensor<f64>, TensorError> {
    NormPlan::new(tensor.shape(), ord, axis, keepdims)?.vjp(tensor, cotangent)
}

/// Push a tangent of the input forward through the norm.
pub fn norm_jvp(
    tensor: &DenseTensor<f64>,
    ord: Option<NormOrd>,
    axis: Option<Axis>,
    keepdims: bool,
    tangent: &DenseTensor<f64>,
) -> Result<DenseTensor<f64>, TensorError> {
    NormPlan::new(tensor.shape(), ord, axis, keepdims)?.jvp(tensor, tangent)
}

/// Compute the Frobenius norm of a tensor as a scalar.
pub fn frobenius_norm<T: Scalar>(tensor: &DenseTensor<T>) -> RealOf<T> {
    sum_real(tensor.data().iter().map(|&x| Scalar::abs_sq(x))).sqrt()
}
