//! Staging tracer: run a function on symbolic values and record what it does.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::ops::{Add, Mul, Neg, Sub};
use std::rc::Rc;

use log::debug;
use smallvec::SmallVec;

use super::program::{Instr, OpKind, Program};
use crate::scalar::{DType, Element, c64};
use crate::tensor::DenseTensor;

type Builder = Rc<RefCell<Vec<Instr>>>;

/// A symbolic tensor of element type `E` inside a trace.
///
/// Operations on `Traced` values append instructions to the trace they
/// belong to instead of computing anything. Mixing values from two traces,
/// or elementwise operands of different shapes, is a programming error and
/// panics.
#[derive(Debug, Clone)]
pub struct Traced<E: Element> {
    index: usize,
    shape: Vec<usize>,
    builder: Builder,
    _marker: PhantomData<E>,
}

impl<E: Element> Traced<E> {
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        E::DTYPE
    }

    /// Position of the instruction defining this value.
    pub fn index(&self) -> usize {
        self.index
    }

    fn push<R: Element>(
        builder: &Builder,
        op: OpKind,
        operands: &[usize],
        shape: &[usize],
    ) -> Traced<R> {
        let mut instrs = builder.borrow_mut();
        instrs.push(Instr {
            op,
            operands: SmallVec::from_slice(operands),
            dtype: R::DTYPE,
            shape: shape.to_vec(),
        });
        Traced {
            index: instrs.len() - 1,
            shape: shape.to_vec(),
            builder: Rc::clone(builder),
            _marker: PhantomData,
        }
    }

    fn unary<R: Element>(&self, op: OpKind) -> Traced<R> {
        Self::push(&self.builder, op, &[self.index], &self.shape)
    }

    fn binary(&self, op: OpKind, rhs: &Traced<E>) -> Traced<E> {
        assert!(
            Rc::ptr_eq(&self.builder, &rhs.builder),
            "{op}: operands belong to different traces"
        );
        assert_eq!(self.shape, rhs.shape, "{op}: operand shapes differ");
        Self::push(&self.builder, op, &[self.index, rhs.index], &self.shape)
    }

    /// `x * x`.
    pub fn square(&self) -> Traced<E> {
        self.binary(OpKind::Multiply, self)
    }

    /// Integer power by repeated squaring; `powi(2)` records one multiply.
    pub fn powi(&self, n: u32) -> Traced<E> {
        if n == 0 {
            return Self::push(&self.builder, OpKind::Ones, &[], &self.shape);
        }
        let mut acc: Option<Traced<E>> = None;
        let mut base = self.clone();
        let mut n = n;
        while n > 0 {
            if n & 1 == 1 {
                acc = Some(match acc {
                    None => base.clone(),
                    Some(a) => a.binary(OpKind::Multiply, &base),
                });
            }
            n >>= 1;
            if n > 0 {
                base = base.square();
            }
        }
        acc.unwrap_or(base)
    }

    /// Real part, typed as the real element type.
    pub fn real(&self) -> Traced<E::RealPart> {
        self.unary(OpKind::Real)
    }

    /// Imaginary part, typed as the real element type.
    pub fn imag(&self) -> Traced<E::RealPart> {
        self.unary(OpKind::Imag)
    }
}

impl<E: Element> Mul for &Traced<E> {
    type Output = Traced<E>;

    fn mul(self, rhs: &Traced<E>) -> Traced<E> {
        self.binary(OpKind::Multiply, rhs)
    }
}

impl<E: Element> Mul for Traced<E> {
    type Output = Traced<E>;

    fn mul(self, rhs: Traced<E>) -> Traced<E> {
        &self * &rhs
    }
}

impl<E: Element> Add for &Traced<E> {
    type Output = Traced<E>;

    fn add(self, rhs: &Traced<E>) -> Traced<E> {
        self.binary(OpKind::Add, rhs)
    }
}

impl<E: Element> Add for Traced<E> {
    type Output = Traced<E>;

    fn add(self, rhs: Traced<E>) -> Traced<E> {
        &self + &rhs
    }
}

impl<E: Element> Sub for &Traced<E> {
    type Output = Traced<E>;

    fn sub(self, rhs: &Traced<E>) -> Traced<E> {
        self.binary(OpKind::Subtract, rhs)
    }
}

impl<E: Element> Sub for Traced<E> {
    type Output = Traced<E>;

    fn sub(self, rhs: Traced<E>) -> Traced<E> {
        &self - &rhs
    }
}

impl<E: Element> Neg for &Traced<E> {
    type Output = Traced<E>;

    fn neg(self) -> Traced<E> {
        self.unary(OpKind::Negate)
    }
}

impl<E: Element> Neg for Traced<E> {
    type Output = Traced<E>;

    fn neg(self) -> Traced<E> {
        -&self
    }
}

/// Squared magnitude, specialized per element type.
///
/// For real types the recorded graph is the squaring primitive itself, so it
/// is indistinguishable from `x * x`. Complex types go through the real and
/// imaginary parts and return a real-typed value.
pub trait AbsSq: Element {
    type Output: Element;

    fn trace_abs_sq(x: &Traced<Self>) -> Traced<Self::Output>;
}

macro_rules! impl_real_abs_sq {
    ($($t:ty),*) => {
        $(
            impl AbsSq for $t {
                type Output = $t;

                fn trace_abs_sq(x: &Traced<$t>) -> Traced<$t> {
                    x.square()
                }
            }
        )*
    };
}

impl_real_abs_sq!(i32, f32, f64);

impl AbsSq for c64 {
    type Output = f64;

    fn trace_abs_sq(x: &Traced<c64>) -> Traced<f64> {
        let re = x.real();
        let im = x.imag();
        &(&re * &re) + &(&im * &im)
    }
}

/// Staged `|x|^2`.
pub fn abs_sq<E: AbsSq>(x: &Traced<E>) -> Traced<E::Output> {
    E::trace_abs_sq(x)
}

/// Trace `f` on a symbolic input shaped and typed like `example`.
///
/// Only the shape and element type of `example` are used.
///
/// ```
/// use ndnumerics::Tensor;
/// use ndnumerics::trace::{abs_sq, trace_fn};
///
/// let x = Tensor::from_vec(vec![4.0, 5.2], &[2]).unwrap();
/// let staged = trace_fn("abs_sq", &x, abs_sq);
/// let plain = trace_fn("mul", &x, |x| x * x);
/// assert_eq!(staged.body(), plain.body());
/// ```
pub fn trace_fn<E, R, F>(name: &str, example: &DenseTensor<E>, f: F) -> Program
where
    E: Element,
    R: Element,
    F: FnOnce(&Traced<E>) -> Traced<R>,
{
    let builder: Builder = Rc::new(RefCell::new(Vec::new()));
    let input: Traced<E> = Traced::<E>::push(&builder, OpKind::Parameter(0), &[], example.shape());
    let output = f(&input);
    assert!(
        Rc::ptr_eq(&builder, &output.builder),
        "trace_fn: output belongs to a different trace"
    );
    let instrs = builder.borrow().clone();
    debug!(
        "trace: lowered {} on {}{:?} to {} instructions",
        name,
        example.dtype(),
        example.shape(),
        instrs.len()
    );
    Program::new(name, instrs, output.index)
}
