//! Expression IR.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

mod reduce;

/// Unary operations.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// Binary operations.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Lt,
}

impl BinaryOp {
    /// Operator token used when printing.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Lt => "<",
        }
    }
}

/// Memory dereference: `len` bytes read at `pointer`.
///
/// `origin` is the address of the instruction performing the access. It is
/// informational only and ignored by equality, ordering and hashing.
#[derive(Clone, Debug)]
pub struct Indirection {
    pub pointer: Box<Expr>,
    pub len: u8,
    pub origin: Option<u64>,
}

impl Indirection {
    #[must_use]
    pub fn new(pointer: Expr, len: u8, origin: Option<u64>) -> Self {
        Self {
            pointer: Box::new(pointer),
            len,
            origin,
        }
    }
}

impl PartialEq for Indirection {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.pointer == other.pointer
    }
}

impl Eq for Indirection {}

impl Hash for Indirection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pointer.hash(state);
        self.len.hash(state);
    }
}

impl PartialOrd for Indirection {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Indirection {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pointer
            .cmp(&other.pointer)
            .then(self.len.cmp(&other.len))
    }
}

/// Expression tree node.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Expr {
    Int(i64),
    Sym(String),
    /// Value that cannot be determined. Absorbs every operation it takes part in.
    Unknown,
    Deref(Indirection),
    Unary {
        op: UnaryOp,
        expr: Box<Self>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Self>,
        right: Box<Self>,
    },
}

// These are factory methods, not trait implementations
#[allow(clippy::should_implement_trait)]
impl Expr {
    /// Create an integer expression.
    #[must_use]
    pub const fn int(val: i64) -> Self {
        Self::Int(val)
    }

    /// Create a symbol reference.
    #[must_use]
    pub fn sym(name: &str) -> Self {
        Self::Sym(name.to_string())
    }

    #[must_use]
    pub const fn unknown() -> Self {
        Self::Unknown
    }

    /// Create a memory dereference of `len` bytes at `pointer`.
    #[must_use]
    pub fn deref(pointer: Self, len: u8, origin: Option<u64>) -> Self {
        Self::Deref(Indirection::new(pointer, len, origin))
    }

    pub(crate) fn unary(op: UnaryOp, expr: Self) -> Self {
        Self::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    pub(crate) fn binary(op: BinaryOp, left: Self, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn add(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Add, left, right)
    }

    #[must_use]
    pub fn sub(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Sub, left, right)
    }

    #[must_use]
    pub fn mul(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Mul, left, right)
    }

    #[must_use]
    pub fn div(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Div, left, right)
    }

    #[must_use]
    pub fn rem(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Rem, left, right)
    }

    #[must_use]
    pub fn and(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::And, left, right)
    }

    #[must_use]
    pub fn or(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Or, left, right)
    }

    #[must_use]
    pub fn xor(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Xor, left, right)
    }

    #[must_use]
    pub fn shl(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Shl, left, right)
    }

    /// Arithmetic right shift.
    #[must_use]
    pub fn shr(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Shr, left, right)
    }

    /// Signed comparison, evaluates to 0 or 1.
    #[must_use]
    pub fn lt(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Lt, left, right)
    }

    /// Bitwise NOT.
    #[must_use]
    pub fn not(val: Self) -> Self {
        Self::unary(UnaryOp::Not, val)
    }

    #[must_use]
    pub fn neg(val: Self) -> Self {
        Self::unary(UnaryOp::Neg, val)
    }

    // ===== Accessors =====

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_sym(&self) -> Option<&str> {
        match self {
            Self::Sym(name) => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    const fn is_leaf(&self) -> bool {
        matches!(
            self,
            Self::Int(_) | Self::Sym(_) | Self::Unknown | Self::Deref(_)
        )
    }
}

impl From<i64> for Expr {
    fn from(val: i64) -> Self {
        Self::Int(val)
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Self::sym(name)
    }
}

struct Operand<'a>(&'a Expr);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_leaf() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "({})", self.0)
        }
    }
}

impl fmt::Display for Indirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = match self.len {
            1 => "byte",
            2 => "word",
            4 => "dword",
            8 => "qword",
            _ => return write!(f, "mem{}[{}]", self.len, self.pointer),
        };
        write!(f, "{size} ptr [{}]", self.pointer)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) if (-9..=9).contains(v) => write!(f, "{v}"),
            Self::Int(v) if *v < 0 => write!(f, "-{:#x}", v.unsigned_abs()),
            Self::Int(v) => write!(f, "{v:#x}"),
            Self::Sym(name) => f.write_str(name),
            Self::Unknown => f.write_str("unknown"),
            Self::Deref(ind) => write!(f, "{ind}"),
            Self::Unary { op, expr } => {
                let token = match op {
                    UnaryOp::Not => "~",
                    UnaryOp::Neg => "-",
                };
                write!(f, "{token}{}", Operand(expr))
            }
            Self::Binary { op, left, right } => {
                write!(f, "{} {} {}", Operand(left), op.token(), Operand(right))
            }
        }
    }
}

#[cfg(test)]
mod tests;
