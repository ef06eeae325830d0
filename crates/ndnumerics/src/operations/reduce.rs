//! Reductions over groups of axes.
//!
//! A reduction is described by a [`ReductionLayout`]: the input elements are
//! split into lanes (see [`reduction_lanes`]) and every lane reduces to one
//! output element. Reductions that are also differentiated implement
//! [`LaneReduction`], which derives evaluation, VJP and JVP from two per-lane
//! rules.

use smallvec::SmallVec;

use crate::error::TensorError;
use crate::scalar::{Element, RealOf, RealScalar, Scalar};
use crate::strides::reduction_lanes;
use crate::tensor::DenseTensor;

/// Axis list for a reduction. Norms reduce over at most two axes.
pub type Axes = SmallVec<[usize; 2]>;

/// Resolve a possibly negative axis against `ndim`.
pub fn normalize_axis(axis: isize, ndim: usize) -> Result<usize, TensorError> {
    let resolved = if axis < 0 {
        axis + ndim as isize
    } else {
        axis
    };
    if resolved < 0 || resolved >= ndim as isize {
        return Err(TensorError::InvalidAxis {
            axis,
            ndim,
            reason: "out of range",
        });
    }
    Ok(resolved as usize)
}

/// Resolve a list of axes, rejecting repeats.
pub fn normalize_axes(axes: &[isize], ndim: usize) -> Result<Axes, TensorError> {
    let mut resolved = Axes::with_capacity(axes.len());
    for &axis in axes {
        let a = normalize_axis(axis, ndim)?;
        if resolved.contains(&a) {
            return Err(TensorError::InvalidAxis {
                axis,
                ndim,
                reason: "repeated axis",
            });
        }
        resolved.push(a);
    }
    Ok(resolved)
}

/// Which input elements feed each output element of a reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReductionLayout {
    input_shape: Vec<usize>,
    axes: Axes,
    lanes: Vec<Vec<usize>>,
    output_shape: Vec<usize>,
}

impl ReductionLayout {
    /// Layout reducing `input_shape` over `axes` (already resolved and
    /// distinct). With `keepdims` the reduced axes stay with extent 1.
    pub fn new(input_shape: &[usize], axes: &[usize], keepdims: bool) -> Self {
        let output_shape = input_shape
            .iter()
            .enumerate()
            .filter_map(|(d, &extent)| match (axes.contains(&d), keepdims) {
                (false, _) => Some(extent),
                (true, true) => Some(1),
                (true, false) => None,
            })
            .collect();
        Self {
            input_shape: input_shape.to_vec(),
            axes: axes.iter().copied().collect(),
            lanes: reduction_lanes(input_shape, axes),
            output_shape,
        }
    }

    /// Layout reducing over every axis.
    pub fn all(input_shape: &[usize], keepdims: bool) -> Self {
        let axes: Axes = (0..input_shape.len()).collect();
        Self::new(input_shape, &axes, keepdims)
    }

    pub fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    pub fn axes(&self) -> &[usize] {
        &self.axes
    }

    pub fn lanes(&self) -> &[Vec<usize>] {
        &self.lanes
    }

    pub fn output_shape(&self) -> &[usize] {
        &self.output_shape
    }

    /// Number of input elements per lane.
    pub fn lane_len(&self) -> usize {
        self.axes.iter().map(|&d| self.input_shape[d]).product()
    }

    /// Extent of each reduced axis, in the order the axes were given.
    pub fn lane_shape(&self) -> Vec<usize> {
        self.axes.iter().map(|&d| self.input_shape[d]).collect()
    }

    pub(crate) fn check_input<E: Element>(&self, x: &DenseTensor<E>) -> Result<(), TensorError> {
        if x.shape() != self.input_shape.as_slice() {
            return Err(TensorError::IncompatibleShapes {
                left: self.input_shape.clone(),
                right: x.shape().to_vec(),
            });
        }
        Ok(())
    }

    pub(crate) fn check_output<E: Element>(&self, y: &DenseTensor<E>) -> Result<(), TensorError> {
        if y.len() != self.lanes.len() {
            return Err(TensorError::ShapeMismatch {
                expected: self.lanes.len(),
                actual: y.len(),
            });
        }
        Ok(())
    }

    /// Copy every output element back over the input positions of its lane.
    ///
    /// Accepts the reduced tensor with or without kept dimensions.
    pub fn broadcast<E: Element>(
        &self,
        reduced: &DenseTensor<E>,
    ) -> Result<DenseTensor<E>, TensorError> {
        self.check_output(reduced)?;
        let mut out = DenseTensor::zeros(&self.input_shape);
        let data = out.data_mut();
        for (lane, &value) in self.lanes.iter().zip(reduced.data()) {
            for &i in lane {
                data[i] = value;
            }
        }
        Ok(out)
    }

    fn gather<E: Element>(&self, x: &DenseTensor<E>, lane: &[usize]) -> Vec<E> {
        let data = x.data();
        lane.iter().map(|&i| data[i]).collect()
    }
}

/// A reduction defined lane by lane.
///
/// Implementors supply the lane value and its gradient; evaluation and both
/// differentiation modes follow. Gradients are real (`f64`), matching the
/// autodiff graph.
pub trait LaneReduction {
    fn layout(&self) -> &ReductionLayout;

    /// Reduce one lane to its (real) value.
    fn reduce_lane<T: Scalar>(&self, lane: &[T]) -> Result<RealOf<T>, TensorError>;

    /// Gradient of the lane value with respect to each lane element.
    ///
    /// `value` is `reduce_lane(lane)`. Singular points produce non-finite
    /// entries.
    fn lane_gradient(&self, lane: &[f64], value: f64) -> Result<Vec<f64>, TensorError>;

    /// Apply the reduction to `x`.
    fn evaluate<T: Scalar>(
        &self,
        x: &DenseTensor<T>,
    ) -> Result<DenseTensor<RealOf<T>>, TensorError> {
        let layout = self.layout();
        layout.check_input(x)?;
        let values = layout
            .lanes()
            .iter()
            .map(|lane| self.reduce_lane(&layout.gather(x, lane)))
            .collect::<Result<Vec<_>, _>>()?;
        DenseTensor::from_vec(values, layout.output_shape())
    }

    /// Pull `cotangent` (one entry per lane) back to the shape of `x`.
    fn vjp(
        &self,
        x: &DenseTensor<f64>,
        cotangent: &DenseTensor<f64>,
    ) -> Result<DenseTensor<f64>, TensorError> {
        let layout = self.layout();
        layout.check_input(x)?;
        layout.check_output(cotangent)?;
        let mut grad = DenseTensor::zeros(layout.input_shape());
        for (lane, &g) in layout.lanes().iter().zip(cotangent.data()) {
            let values = layout.gather(x, lane);
            let value = self.reduce_lane(&values)?;
            let dlane = self.lane_gradient(&values, value)?;
            let data = grad.data_mut();
            for (&i, d) in lane.iter().zip(dlane) {
                data[i] += g * d;
            }
        }
        Ok(grad)
    }

    /// Push `tangent` (shape of `x`) forward to the output.
    fn jvp(
        &self,
        x: &DenseTensor<f64>,
        tangent: &DenseTensor<f64>,
    ) -> Result<DenseTensor<f64>, TensorError> {
        let layout = self.layout();
        layout.check_input(x)?;
        layout.check_input(tangent)?;
        let t = tangent.data();
        let out = layout
            .lanes()
            .iter()
            .map(|lane| {
                let values = layout.gather(x, lane);
                let value = self.reduce_lane(&values)?;
                let dlane = self.lane_gradient(&values, value)?;
                Ok(lane
                    .iter()
                    .zip(dlane)
                    .map(|(&i, d)| d * t[i])
                    .sum::<f64>())
            })
            .collect::<Result<Vec<f64>, TensorError>>()?;
        DenseTensor::from_vec(out, layout.output_shape())
    }
}

/// Root-mean-square over all elements: `sqrt(mean(|x|^2))`.
#[derive(Debug, Clone)]
pub struct RootMeanSquare {
    layout: ReductionLayout,
}

impl RootMeanSquare {
    /// Plan a root-mean-square over every element of a tensor of `shape`.
    ///
    /// The result is rank 0.
    pub fn new(shape: &[usize]) -> Self {
        Self {
            layout: ReductionLayout::all(shape, false),
        }
    }
}

impl LaneReduction for RootMeanSquare {
    fn layout(&self) -> &ReductionLayout {
        &self.layout
    }

    fn reduce_lane<T: Scalar>(&self, lane: &[T]) -> Result<RealOf<T>, TensorError> {
        if lane.is_empty() {
            return Err(TensorError::InvalidOperation(
                "root mean square of an empty tensor".into(),
            ));
        }
        let sum = lane
            .iter()
            .fold(RealOf::<T>::zero(), |acc, &x| acc + Scalar::abs_sq(x));
        let count = RealOf::<T>::from_f64(lane.len() as f64);
        Ok((sum / count).sqrt())
    }

    fn lane_gradient(&self, lane: &[f64], value: f64) -> Result<Vec<f64>, TensorError> {
        let scale = lane.len() as f64 * value;
        Ok(lane.iter().map(|&x| x / scale).collect())
    }
}

/// Root-mean-square of all elements, as a rank-0 tensor.
///
/// # Example
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::operations::root_mean_squares;
///
/// let t = Tensor::from_vec(vec![3.0, -3.0, 3.0, -3.0], &[2, 2]).unwrap();
/// assert_eq!(root_mean_squares(&t).unwrap().item(), Some(3.0));
/// ```
pub fn root_mean_squares<T: Scalar>(
    x: &DenseTensor<T>,
) -> Result<DenseTensor<RealOf<T>>, TensorError> {
    RootMeanSquare::new(x.shape()).evaluate(x)
}

/// Sum over `axes` (all axes when empty).
///
/// # Example
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::operations::sum;
///
/// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
/// assert_eq!(sum(&t, &[0], false).unwrap().data(), &[3.0, 7.0, 11.0]);
/// assert_eq!(sum(&t, &[], false).unwrap().item(), Some(21.0));
/// ```
pub fn sum<T: Scalar>(
    x: &DenseTensor<T>,
    axes: &[isize],
    keepdims: bool,
) -> Result<DenseTensor<T>, TensorError> {
    let layout = reduce_layout(x.shape(), axes, keepdims)?;
    let values: Vec<T> = layout
        .lanes()
        .iter()
        .map(|lane| lane.iter().fold(T::zero(), |acc, &i| acc + x.data()[i]))
        .collect();
    DenseTensor::from_vec(values, layout.output_shape())
}

/// Mean over `axes` (all axes when empty).
///
/// # Errors
///
/// Returns `TensorError::InvalidOperation` when the reduced axes are empty.
pub fn mean<T: Scalar>(
    x: &DenseTensor<T>,
    axes: &[isize],
    keepdims: bool,
) -> Result<DenseTensor<T>, TensorError> {
    let layout = reduce_layout(x.shape(), axes, keepdims)?;
    let count = layout.lane_len();
    if count == 0 {
        return Err(TensorError::InvalidOperation("mean over an empty axis".into()));
    }
    let scale = T::from_real(RealOf::<T>::from_f64(1.0 / count as f64));
    let total = sum(x, axes, keepdims)?;
    Ok(super::scale(&total, scale))
}

fn reduce_layout(
    shape: &[usize],
    axes: &[isize],
    keepdims: bool,
) -> Result<ReductionLayout, TensorError> {
    if axes.is_empty() {
        return Ok(ReductionLayout::all(shape, keepdims));
    }
    let resolved = normalize_axes(axes, shape.len())?;
    Ok(ReductionLayout::new(shape, &resolved, keepdims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::c64;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_axis() {
        assert_eq!(normalize_axis(-1, 3).unwrap(), 2);
        assert_eq!(normalize_axis(0, 3).unwrap(), 0);
        assert!(matches!(
            normalize_axis(3, 3),
            Err(TensorError::InvalidAxis { axis: 3, ndim: 3, .. })
        ));
        assert!(normalize_axis(-4, 3).is_err());
    }

    #[test]
    fn test_normalize_axes_repeated() {
        assert!(normalize_axes(&[0, -2], 2).is_err());
        assert_eq!(normalize_axes(&[1, 0], 2).unwrap().as_slice(), &[1, 0]);
    }

    #[test]
    fn test_layout_shapes() {
        let layout = ReductionLayout::new(&[3, 4], &[1], false);
        assert_eq!(layout.output_shape(), &[3]);
        assert_eq!(layout.lane_len(), 4);

        let kept = ReductionLayout::new(&[3, 4], &[1], true);
        assert_eq!(kept.output_shape(), &[3, 1]);

        let all = ReductionLayout::all(&[3, 4], false);
        assert_eq!(all.output_shape(), &[] as &[usize]);
        assert_eq!(all.lanes().len(), 1);
        assert_eq!(all.lane_shape(), vec![3, 4]);
    }

    #[test]
    fn test_broadcast() {
        let layout = ReductionLayout::new(&[2, 3], &[0], true);
        let reduced = DenseTensor::from_vec(vec![true, false, true], &[1, 3]).unwrap();
        let expanded = layout.broadcast(&reduced).unwrap();
        assert_eq!(expanded.shape(), &[2, 3]);
        assert_eq!(expanded.data(), &[true, true, false, false, true, true]);

        let wrong = DenseTensor::from_vec(vec![true, false], &[2]).unwrap();
        assert!(layout.broadcast(&wrong).is_err());
    }

    #[test]
    fn test_sum_and_mean() {
        let t = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        let s = sum(&t, &[1], true).unwrap();
        assert_eq!(s.shape(), &[2, 1]);
        assert_eq!(s.data(), &[9.0, 12.0]);

        let m = mean(&t, &[-1], false).unwrap();
        assert_relative_eq!(m.data()[0], 3.0);
        assert_relative_eq!(m.data()[1], 4.0);
    }

    #[test]
    fn test_mean_empty_axis() {
        let t: DenseTensor<f64> = DenseTensor::zeros(&[0, 2]);
        assert!(mean(&t, &[0], false).is_err());
    }

    #[test]
    fn test_rms_complex() {
        let t = DenseTensor::from_vec(vec![c64::new(3.0, 4.0), c64::new(0.0, 5.0)], &[2]).unwrap();
        assert_relative_eq!(root_mean_squares(&t).unwrap().item().unwrap(), 5.0);
    }

    #[test]
    fn test_rms_empty_is_error() {
        let t: DenseTensor<f64> = DenseTensor::zeros(&[0]);
        assert!(matches!(
            root_mean_squares(&t),
            Err(TensorError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_rms_vjp_jvp() {
        let x = DenseTensor::from_vec(vec![1.0, 2.0, 2.0], &[3]).unwrap();
        let plan = RootMeanSquare::new(x.shape());
        // rms = sqrt(9 / 3) = sqrt(3); d/dx_i = x_i / (3 sqrt(3))
        let g = plan.vjp(&x, &DenseTensor::scalar(1.0)).unwrap();
        let s = 3.0 * 3.0_f64.sqrt();
        assert_relative_eq!(g.data()[0], 1.0 / s, epsilon = 1e-12);
        assert_relative_eq!(g.data()[1], 2.0 / s, epsilon = 1e-12);

        let tangent = DenseTensor::from_vec(vec![1.0, 0.0, 0.0], &[3]).unwrap();
        let dy = plan.jvp(&x, &tangent).unwrap();
        assert_relative_eq!(dy.item().unwrap(), 1.0 / s, epsilon = 1e-12);
    }

    #[test]
    fn test_rms_gradient_at_zero_is_nan() {
        let x = DenseTensor::scalar(0.0);
        let g = RootMeanSquare::new(&[])
            .vjp(&x, &DenseTensor::scalar(1.0))
            .unwrap();
        assert!(g.data()[0].is_nan());
    }
}
