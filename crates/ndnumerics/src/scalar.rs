//! Element and scalar traits for tensor element types.
//!
//! Two layers:
//!
//! ```text
//! Element   - anything a tensor can store (i32, f32, f64, c64, bool),
//!             tagged with a static DType
//! Scalar    - numeric element types supported by the faer backend (f64, c64)
//! RealScalar - the real field of a Scalar (f64)
//! ```
//!
//! Everything that must behave differently for real and complex inputs is a
//! trait method implemented per type, so the choice is made at
//! monomorphization time and never by a runtime branch.

use faer_traits::ComplexField;
use std::fmt::{self, Debug, Display};
use std::ops::{Add, Div, Mul, Neg, Sub};

pub use faer::c64;

/// Static element type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// Boolean predicate (masks).
    Pred,
    /// 32-bit signed integer.
    S32,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// Complex with 64-bit float parts.
    C64,
}

impl DType {
    /// Whether values of this type carry an imaginary part.
    pub fn is_complex(self) -> bool {
        matches!(self, DType::C64)
    }
}

impl Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::Pred => "pred",
            DType::S32 => "s32",
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::C64 => "c64",
        };
        f.write_str(name)
    }
}

/// Trait for anything a tensor can hold.
pub trait Element: Copy + Debug + Default + PartialEq + 'static {
    /// Static type tag.
    const DTYPE: DType;

    /// Element type of `|x|` and of the real/imaginary parts.
    type RealPart: Element;

    /// Returns the additive identity (zero).
    fn zero() -> Self {
        Self::default()
    }

    /// Returns the multiplicative identity (one).
    fn one() -> Self;
}

impl Element for bool {
    const DTYPE: DType = DType::Pred;
    type RealPart = bool;

    fn one() -> Self {
        true
    }
}

impl Element for i32 {
    const DTYPE: DType = DType::S32;
    type RealPart = i32;

    fn one() -> Self {
        1
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;
    type RealPart = f32;

    fn one() -> Self {
        1.0
    }
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;
    type RealPart = f64;

    fn one() -> Self {
        1.0
    }
}

impl Element for c64 {
    const DTYPE: DType = DType::C64;
    type RealPart = f64;

    fn one() -> Self {
        c64::new(1.0, 0.0)
    }
}

/// Trait for numeric scalar types supported by ndnumerics.
///
/// This wraps faer's `ComplexField` (needed for the SVD-based matrix norms)
/// with the arithmetic and real/complex accessors the numerics need.
pub trait Scalar:
    Element
    + ComplexField
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
{
    /// The real type associated with this scalar.
    type Real: RealScalar;

    /// Embed a real value.
    fn from_real(re: <Self as Scalar>::Real) -> Self;

    /// Real part.
    fn real_part(self) -> <Self as Scalar>::Real;

    /// Imaginary part (zero for real types).
    fn imag_part(self) -> <Self as Scalar>::Real;

    /// Complex conjugate (identity for real types).
    fn conjugate(self) -> Self;

    /// Squared magnitude `|x|^2`.
    ///
    /// Real types square directly; complex types use `re^2 + im^2` rather
    /// than the complex square `x * x`.
    fn abs_sq(self) -> <Self as Scalar>::Real;

    /// Magnitude `|x|`.
    fn modulus(self) -> <Self as Scalar>::Real;
}

/// Shorthand for the real type of a [`Scalar`].
///
/// `ComplexField` has its own `Real`, so the bare `T::Real` is ambiguous.
pub type RealOf<T> = <T as Scalar>::Real;

/// Real field of a [`Scalar`].
pub trait RealScalar: Scalar<Real = Self> + PartialOrd + Div<Output = Self> {
    /// Convert from `f64`.
    fn from_f64(value: f64) -> Self;

    /// Convert to `f64`.
    fn to_f64(self) -> f64;

    /// Square root.
    fn sqrt(self) -> Self;

    /// Real power.
    fn powf(self, exponent: Self) -> Self;

    /// Sign with `sign(0) == 0`.
    fn sign(self) -> Self;
}

impl Scalar for f64 {
    type Real = f64;

    fn from_real(re: f64) -> Self {
        re
    }

    fn real_part(self) -> f64 {
        self
    }

    fn imag_part(self) -> f64 {
        0.0
    }

    fn conjugate(self) -> Self {
        self
    }

    fn abs_sq(self) -> f64 {
        self * self
    }

    fn modulus(self) -> f64 {
        f64::abs(self)
    }
}

impl Scalar for c64 {
    type Real = f64;

    fn from_real(re: f64) -> Self {
        c64::new(re, 0.0)
    }

    fn real_part(self) -> f64 {
        self.re
    }

    fn imag_part(self) -> f64 {
        self.im
    }

    fn conjugate(self) -> Self {
        c64::new(self.re, -self.im)
    }

    fn abs_sq(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    fn modulus(self) -> f64 {
        self.re.hypot(self.im)
    }
}

impl RealScalar for f64 {
    fn from_f64(value: f64) -> Self {
        value
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn powf(self, exponent: Self) -> Self {
        f64::powf(self, exponent)
    }

    fn sign(self) -> Self {
        if self > 0.0 {
            1.0
        } else if self < 0.0 {
            -1.0
        } else {
            0.0
        }
    }
}
