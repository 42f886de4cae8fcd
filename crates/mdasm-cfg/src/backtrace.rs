//! Interface to the driver's backward symbolic evaluator.

use mdasm_ir::Expr;

/// Options for one backtrace request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BacktraceOptions {
    /// Apply the effect of the instruction at the start address too.
    pub include_start: bool,
    /// Stop walking once this address has been processed.
    pub snapshot_addr: Option<u64>,
    /// Address the request originates from, for the driver's bookkeeping.
    pub origin: Option<u64>,
}

/// Backward symbolic evaluation, supplied by the disassembler driver.
///
/// Implementations walk the decoded program backwards from `start`, binding
/// `expr` through each instruction's effect, and return every value the
/// expression may hold on entry to the walk. The backend never walks code
/// itself.
pub trait Backtracker {
    fn backtrace(&self, expr: &Expr, start: u64, options: &BacktraceOptions) -> Vec<Expr>;

    /// Address of the last instruction of the block containing `address`,
    /// delay slot included.
    fn block_end(&self, address: u64) -> Option<u64>;

    /// Canonical form of an address expression.
    fn normalize(&self, expr: &Expr) -> Expr {
        expr.reduce()
    }
}

/// What a recorded trace is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Read,
    Write,
    /// The value is a code address that will be executed.
    Exec,
}

/// Where a recorded trace was requested from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TraceOrigin {
    /// Requested by a default summary rather than a concrete address.
    Default,
    Address(u64),
}

/// Pending backtrace request attached to a function summary.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BacktraceTrace {
    pub expr: Expr,
    pub origin: TraceOrigin,
    pub orig_expr: Expr,
    pub kind: AccessKind,
}

impl BacktraceTrace {
    #[must_use]
    pub fn new(expr: Expr, origin: TraceOrigin, kind: AccessKind) -> Self {
        Self {
            orig_expr: expr.clone(),
            expr,
            origin,
            kind,
        }
    }
}
