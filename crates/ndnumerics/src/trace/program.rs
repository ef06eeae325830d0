//! Staged programs: a flat list of typed instructions in SSA form.
//!
//! Rendered as HLO-like text:
//!
//! ```text
//! HloModule jit_abs_sq
//!
//! ENTRY main.abs_sq {
//!   %0 = c64[2] parameter(0)
//!   %1 = f64[2] real(%0)
//!   %2 = f64[2] imag(%0)
//!   %3 = f64[2] multiply(%1, %1)
//!   %4 = f64[2] multiply(%2, %2)
//!   ROOT %5 = f64[2] add(%3, %4)
//! }
//! ```
//!
//! Two programs compute the same graph exactly when their [`Program::body`]
//! strings are equal; module and entry names are excluded from the body.

use std::fmt::{self, Display};

use smallvec::SmallVec;

use crate::scalar::DType;

/// Primitive operation of one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// The `n`-th program input.
    Parameter(usize),
    /// A tensor of ones of the instruction's shape.
    Ones,
    Add,
    Subtract,
    Multiply,
    Negate,
    /// Real part (the identity on real types).
    Real,
    /// Imaginary part (zero on real types).
    Imag,
}

impl Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpKind::Parameter(n) => write!(f, "parameter({n})"),
            OpKind::Ones => f.write_str("constant(1)"),
            OpKind::Add => f.write_str("add"),
            OpKind::Subtract => f.write_str("subtract"),
            OpKind::Multiply => f.write_str("multiply"),
            OpKind::Negate => f.write_str("negate"),
            OpKind::Real => f.write_str("real"),
            OpKind::Imag => f.write_str("imag"),
        }
    }
}

/// One SSA instruction. Its value is named by its position in the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instr {
    pub op: OpKind,
    /// Positions of the operand instructions.
    pub operands: SmallVec<[usize; 2]>,
    pub dtype: DType,
    pub shape: Vec<usize>,
}

impl Instr {
    fn type_string(&self) -> String {
        let dims: Vec<String> = self.shape.iter().map(usize::to_string).collect();
        format!("{}[{}]", self.dtype, dims.join(","))
    }
}

/// A traced function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    name: String,
    instrs: Vec<Instr>,
    root: usize,
}

impl Program {
    pub(crate) fn new(name: impl Into<String>, instrs: Vec<Instr>, root: usize) -> Self {
        Self {
            name: name.into(),
            instrs,
            root,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    /// The instruction whose value the program returns.
    pub fn root(&self) -> &Instr {
        &self.instrs[self.root]
    }

    /// Number of instructions of the given kind.
    pub fn count(&self, op: OpKind) -> usize {
        self.instrs.iter().filter(|i| i.op == op).count()
    }

    /// Instruction listing without module or entry names.
    pub fn body(&self) -> String {
        let mut out = String::new();
        for (n, instr) in self.instrs.iter().enumerate() {
            let prefix = if n == self.root { "ROOT " } else { "" };
            let operands: Vec<String> = instr.operands.iter().map(|o| format!("%{o}")).collect();
            let args = match instr.op {
                OpKind::Parameter(_) | OpKind::Ones => instr.op.to_string(),
                op => format!("{op}({})", operands.join(", ")),
            };
            out.push_str(&format!("  {prefix}%{n} = {} {args}\n", instr.type_string()));
        }
        out
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "HloModule jit_{}", self.name)?;
        writeln!(f)?;
        writeln!(f, "ENTRY main.{} {{", self.name)?;
        f.write_str(&self.body())?;
        writeln!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn square_program(name: &str) -> Program {
        let instrs = vec![
            Instr {
                op: OpKind::Parameter(0),
                operands: SmallVec::new(),
                dtype: DType::F64,
                shape: vec![2],
            },
            Instr {
                op: OpKind::Multiply,
                operands: smallvec![0, 0],
                dtype: DType::F64,
                shape: vec![2],
            },
        ];
        Program::new(name, instrs, 1)
    }

    #[test]
    fn test_display() {
        let text = square_program("square").to_string();
        assert_eq!(
            text,
            concat!(
                "HloModule jit_square\n\n",
                "ENTRY main.square {\n",
                "  %0 = f64[2] parameter(0)\n",
                "  ROOT %1 = f64[2] multiply(%0, %0)\n",
                "}\n",
            )
        );
    }

    #[test]
    fn test_body_ignores_names() {
        let a = square_program("square");
        let b = square_program("abs_sq");
        assert_ne!(a.to_string(), b.to_string());
        assert_eq!(a.body(), b.body());
        assert_eq!(a.count(OpKind::Multiply), 1);
        assert_eq!(a.root().dtype, DType::F64);
    }

    #[test]
    fn test_scalar_shape() {
        let instr = Instr {
            op: OpKind::Ones,
            operands: SmallVec::new(),
            dtype: DType::S32,
            shape: vec![],
        };
        assert_eq!(instr.type_string(), "s32[]");
        assert_eq!(OpKind::Ones.to_string(), "constant(1)");
    }
}
