//! Canonicalization, substitution and free-symbol queries.

use std::cmp::Ordering;

use rustc_hash::FxHashSet;

use super::{BinaryOp, Expr, Indirection, UnaryOp};
use crate::{Binding, Location};

impl Expr {
    /// Reduce to canonical form.
    ///
    /// Folds constants, applies algebraic identities and normalizes sums so
    /// that `(x + a) + b` becomes `x + (a + b)` and `(x + a) - x` becomes `a`.
    /// Sum terms and the operands of `*`, `&`, `|` and `^` are put in a fixed
    /// order, with constants last, so operand order does not matter.
    /// Reduction is idempotent.
    #[must_use]
    pub fn reduce(&self) -> Self {
        match self {
            Self::Int(_) | Self::Sym(_) | Self::Unknown => self.clone(),
            Self::Deref(ind) => Self::Deref(Indirection {
                pointer: Box::new(ind.pointer.reduce()),
                len: ind.len,
                origin: ind.origin,
            }),
            Self::Unary { op, expr } => reduce_unary(*op, expr.reduce()),
            Self::Binary { op, left, right } => reduce_binary(*op, left.reduce(), right.reduce()),
        }
    }

    /// Substitute every bound location by its value.
    ///
    /// Substitution is simultaneous: the values themselves are not rebound,
    /// which matches how an instruction's effect reads the pre-state.
    #[must_use]
    pub fn bind(&self, binding: &Binding) -> Self {
        if binding.is_empty() {
            return self.clone();
        }
        match self {
            Self::Int(_) | Self::Unknown => self.clone(),
            Self::Sym(name) => binding
                .get(&Location::Sym(name.clone()))
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Self::Deref(ind) => {
                if let Some(value) = binding.get(&Location::Mem(ind.clone())) {
                    return value.clone();
                }
                Self::Deref(Indirection {
                    pointer: Box::new(ind.pointer.bind(binding)),
                    len: ind.len,
                    origin: ind.origin,
                })
            }
            Self::Unary { op, expr } => Self::unary(*op, expr.bind(binding)),
            Self::Binary { op, left, right } => {
                Self::binary(*op, left.bind(binding), right.bind(binding))
            }
        }
    }

    /// Replace every subtree equal to `old` with `new`.
    #[must_use]
    pub fn substitute(&self, old: &Self, new: &Self) -> Self {
        if self == old {
            return new.clone();
        }
        match self {
            Self::Int(_) | Self::Sym(_) | Self::Unknown => self.clone(),
            Self::Deref(ind) => Self::Deref(Indirection {
                pointer: Box::new(ind.pointer.substitute(old, new)),
                len: ind.len,
                origin: ind.origin,
            }),
            Self::Unary { op, expr } => Self::unary(*op, expr.substitute(old, new)),
            Self::Binary { op, left, right } => Self::binary(
                *op,
                left.substitute(old, new),
                right.substitute(old, new),
            ),
        }
    }

    /// Free symbols referenced by the expression, including inside dereferences.
    #[must_use]
    pub fn externals(&self) -> FxHashSet<&str> {
        let mut out = FxHashSet::default();
        self.collect_externals(&mut out);
        out
    }

    fn collect_externals<'a>(&'a self, out: &mut FxHashSet<&'a str>) {
        match self {
            Self::Int(_) | Self::Unknown => {}
            Self::Sym(name) => {
                out.insert(name.as_str());
            }
            Self::Deref(ind) => ind.pointer.collect_externals(out),
            Self::Unary { expr, .. } => expr.collect_externals(out),
            Self::Binary { left, right, .. } => {
                left.collect_externals(out);
                right.collect_externals(out);
            }
        }
    }
}

fn reduce_unary(op: UnaryOp, val: Expr) -> Expr {
    match (op, val) {
        (_, Expr::Unknown) => Expr::Unknown,
        (UnaryOp::Not, Expr::Int(v)) => Expr::Int(!v),
        (UnaryOp::Neg, Expr::Int(v)) => Expr::Int(v.wrapping_neg()),
        (
            UnaryOp::Not,
            Expr::Unary {
                op: UnaryOp::Not,
                expr,
            },
        )
        | (
            UnaryOp::Neg,
            Expr::Unary {
                op: UnaryOp::Neg,
                expr,
            },
        ) => *expr,
        (op, val) => Expr::unary(op, val),
    }
}

fn reduce_binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    if left.is_unknown() || right.is_unknown() {
        return Expr::Unknown;
    }
    if matches!(op, BinaryOp::Add | BinaryOp::Sub) {
        return reduce_linear(op, left, right);
    }
    if let (Expr::Int(l), Expr::Int(r)) = (&left, &right) {
        if let Some(v) = fold(op, *l, *r) {
            return Expr::Int(v);
        }
    }
    let (left, right) = if is_commutative(op) && operand_order(&left, &right).is_gt() {
        (right, left)
    } else {
        (left, right)
    };
    simplify(op, &left, &right).unwrap_or_else(|| Expr::binary(op, left, right))
}

const fn is_commutative(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Mul | BinaryOp::And | BinaryOp::Or | BinaryOp::Xor
    )
}

/// Order of operands and sum terms: constants last, the rest by `Ord`.
fn operand_order(a: &Expr, b: &Expr) -> Ordering {
    match (a, b) {
        (Expr::Int(_), Expr::Int(_)) => a.cmp(b),
        (Expr::Int(_), _) => Ordering::Greater,
        (_, Expr::Int(_)) => Ordering::Less,
        _ => a.cmp(b),
    }
}

fn fold(op: BinaryOp, l: i64, r: i64) -> Option<i64> {
    let shift = || u32::try_from(r).ok().filter(|s| *s < 64);
    match op {
        BinaryOp::Add => Some(l.wrapping_add(r)),
        BinaryOp::Sub => Some(l.wrapping_sub(r)),
        BinaryOp::Mul => Some(l.wrapping_mul(r)),
        BinaryOp::Div => l.checked_div(r),
        BinaryOp::Rem => l.checked_rem(r),
        BinaryOp::And => Some(l & r),
        BinaryOp::Or => Some(l | r),
        BinaryOp::Xor => Some(l ^ r),
        BinaryOp::Shl => shift().map(|s| l << s),
        BinaryOp::Shr => shift().map(|s| l >> s),
        BinaryOp::Lt => Some(i64::from(l < r)),
    }
}

fn simplify(op: BinaryOp, left: &Expr, right: &Expr) -> Option<Expr> {
    let zero = Expr::Int(0);
    let one = Expr::Int(1);
    match op {
        BinaryOp::Mul | BinaryOp::And if *left == zero || *right == zero => Some(zero),
        BinaryOp::Mul if *right == one => Some(left.clone()),
        BinaryOp::Mul if *left == one => Some(right.clone()),
        BinaryOp::Div if *right == one => Some(left.clone()),
        BinaryOp::Or | BinaryOp::Xor if *right == zero => Some(left.clone()),
        BinaryOp::Or | BinaryOp::Xor if *left == zero => Some(right.clone()),
        BinaryOp::Shl | BinaryOp::Shr if *right == zero => Some(left.clone()),
        BinaryOp::And | BinaryOp::Or if left == right => Some(left.clone()),
        BinaryOp::Xor if left == right => Some(zero),
        _ => None,
    }
}

/// Flatten a sum into `(term, coefficient)` pairs plus a constant, cancel
/// equal terms, and rebuild it with the constant last.
fn reduce_linear(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let mut terms = Vec::new();
    let mut constant = 0i64;
    collect_linear(left, 1, &mut terms, &mut constant);
    let sign = if op == BinaryOp::Sub { -1 } else { 1 };
    collect_linear(right, sign, &mut terms, &mut constant);
    rebuild_linear(terms, constant)
}

fn collect_linear(expr: Expr, sign: i64, terms: &mut Vec<(Expr, i64)>, constant: &mut i64) {
    match expr {
        Expr::Int(v) => *constant = constant.wrapping_add(sign.wrapping_mul(v)),
        Expr::Binary {
            op: BinaryOp::Add,
            left,
            right,
        } => {
            collect_linear(*left, sign, terms, constant);
            collect_linear(*right, sign, terms, constant);
        }
        Expr::Binary {
            op: BinaryOp::Sub,
            left,
            right,
        } => {
            collect_linear(*left, sign, terms, constant);
            collect_linear(*right, -sign, terms, constant);
        }
        Expr::Unary {
            op: UnaryOp::Neg,
            expr,
        } => collect_linear(*expr, -sign, terms, constant),
        Expr::Binary {
            op: BinaryOp::Mul,
            left,
            right,
        } => match (*left, *right) {
            (term, Expr::Int(c)) | (Expr::Int(c), term) => {
                add_term(terms, term, sign.wrapping_mul(c));
            }
            (left, right) => add_term(terms, Expr::mul(left, right), sign),
        },
        other => add_term(terms, other, sign),
    }
}

fn add_term(terms: &mut Vec<(Expr, i64)>, term: Expr, coeff: i64) {
    if let Some(entry) = terms.iter_mut().find(|(t, _)| *t == term) {
        entry.1 = entry.1.wrapping_add(coeff);
    } else {
        terms.push((term, coeff));
    }
}

fn rebuild_linear(mut terms: Vec<(Expr, i64)>, constant: i64) -> Expr {
    terms.sort_by(|(a, _), (b, _)| operand_order(a, b));
    let mut acc: Option<Expr> = None;
    for (term, coeff) in terms {
        if coeff == 0 {
            continue;
        }
        acc = Some(match (acc, coeff) {
            (None, 1) => term,
            (None, -1) => Expr::neg(term),
            (None, c) => Expr::mul(term, Expr::Int(c)),
            (Some(sum), 1) => Expr::add(sum, term),
            (Some(sum), -1) => Expr::sub(sum, term),
            (Some(sum), c) => Expr::add(sum, Expr::mul(term, Expr::Int(c))),
        });
    }
    match acc {
        None => Expr::Int(constant),
        Some(sum) if constant == 0 => sum,
        Some(sum) => Expr::add(sum, Expr::Int(constant)),
    }
}
