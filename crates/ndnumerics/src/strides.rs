//! Column-major index arithmetic.
//!
//! Layout is Fortran order, which is also faer's native layout: the first
//! axis varies fastest.

/// Strides of a contiguous column-major tensor: `[1, d0, d0*d1, ...]`.
///
/// ```
/// use ndnumerics::strides::compute_strides;
///
/// assert_eq!(compute_strides(&[3, 4, 5]), vec![1, 3, 12]);
/// assert!(compute_strides(&[]).is_empty());
/// ```
pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
    shape
        .iter()
        .scan(1, |next, &dim| {
            let stride = *next;
            *next *= dim;
            Some(stride)
        })
        .collect()
}

/// Number of elements held by a tensor of the given shape.
///
/// The empty shape is a rank-0 scalar and holds one element.
///
/// ```
/// use ndnumerics::strides::shape_len;
///
/// assert_eq!(shape_len(&[]), 1);
/// assert_eq!(shape_len(&[3, 4]), 12);
/// assert_eq!(shape_len(&[3, 0]), 0);
/// ```
#[inline]
pub fn shape_len(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Flat offset of a multi-index. Bounds are the caller's business.
#[inline]
pub fn cartesian_to_linear(indices: &[usize], strides: &[usize]) -> usize {
    indices.iter().zip(strides).map(|(&i, &s)| i * s).sum()
}

/// Flat offsets of every point of the sub-grid `extents` (with the given
/// strides into the full tensor), in column-major order of the sub-grid.
fn grid_offsets(extents: &[usize], strides: &[usize]) -> Vec<usize> {
    let count = shape_len(extents);
    let mut offsets = Vec::with_capacity(count);
    let mut index = vec![0; extents.len()];
    let mut offset = 0;
    for _ in 0..count {
        offsets.push(offset);
        // odometer step: bump the fastest axis, carry into slower ones
        for (axis, i) in index.iter_mut().enumerate() {
            *i += 1;
            offset += strides[axis];
            if *i < extents[axis] {
                break;
            }
            offset -= *i * strides[axis];
            *i = 0;
        }
    }
    offsets
}

/// Group the flat indices of a tensor into reduction lanes.
///
/// Every lane collects the elements that reduce into one output position.
/// Lanes are ordered by the column-major position of the kept axes; inside a
/// lane, elements follow the column-major order of `axes` as given, so a lane
/// over `[r, c]` is a column-major `shape[r] x shape[c]` matrix.
///
/// `axes` must be distinct and in range.
///
/// ```
/// use ndnumerics::strides::reduction_lanes;
///
/// // 2x3 matrix, reduce along rows: one lane per column
/// assert_eq!(reduction_lanes(&[2, 3], &[0]), vec![vec![0, 1], vec![2, 3], vec![4, 5]]);
/// // reduce along columns: one lane per row
/// assert_eq!(reduction_lanes(&[2, 3], &[1]), vec![vec![0, 2, 4], vec![1, 3, 5]]);
/// ```
pub fn reduction_lanes(shape: &[usize], axes: &[usize]) -> Vec<Vec<usize>> {
    let strides = compute_strides(shape);
    let (kept_extents, kept_strides): (Vec<usize>, Vec<usize>) = (0..shape.len())
        .filter(|d| !axes.contains(d))
        .map(|d| (shape[d], strides[d]))
        .unzip();
    let lane_extents: Vec<usize> = axes.iter().map(|&d| shape[d]).collect();
    let lane_strides: Vec<usize> = axes.iter().map(|&d| strides[d]).collect();

    let within = grid_offsets(&lane_extents, &lane_strides);
    grid_offsets(&kept_extents, &kept_strides)
        .into_iter()
        .map(|base| within.iter().map(|&o| base + o).collect())
        .collect()
}
