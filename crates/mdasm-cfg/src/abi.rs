//! o32 calling-convention predicates and call-site context.

use mdasm_ir::{Binding, Expr, Location};
use mdasm_isa::{Instruction, Mnemonic, Operand, REG_RA, REG_SP, REG_T9, Reg, reg_name};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::backtrace::Backtracker;

/// Known register values at function entries, keyed by the normalized entry
/// address expression.
pub type AddressBindings = FxHashMap<Expr, Binding>;

/// Whether a backtraced code address is the caller's return address.
#[must_use]
pub fn is_function_return(expr: &Expr) -> bool {
    expr.reduce().as_sym() == Some(reg_name(REG_RA))
}

/// Whether `expr` is computed from the stack pointer.
#[must_use]
pub fn is_stack_address(expr: &Expr) -> bool {
    expr.externals().contains(reg_name(REG_SP))
}

/// Record that `jalr $t9` enters `target` with `$t9` holding `target`.
///
/// PIC code computes `$gp` from `$t9` in the callee prologue, so the callee
/// needs this value at its entry. An existing `$t9` entry is kept. Returns
/// whether a binding was added.
pub fn propagate_call_context<B: Backtracker + ?Sized>(
    tracer: &B,
    call: &Instruction,
    target: &Expr,
    bindings: &mut AddressBindings,
) -> bool {
    if call.mnemonic != Mnemonic::Jalr || call.operands != [Operand::Register(Reg::T9)] {
        return false;
    }
    let target = tracer.normalize(target);
    let entry = bindings.entry(target.clone()).or_default();
    let t9 = Location::sym(reg_name(REG_T9));
    if entry.contains_key(&t9) {
        return false;
    }
    trace!(call = call.address, %target, "binding $t9 at callee entry");
    entry.insert(t9, target);
    true
}
