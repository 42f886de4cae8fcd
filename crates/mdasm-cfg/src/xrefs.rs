//! Control-transfer cross-references.

use mdasm_ir::Expr;
use mdasm_isa::{Instruction, Operand};

/// Candidate targets of a control transfer, as expressions.
///
/// Empty unless the instruction sets the instruction pointer. The last
/// operand is the target: a resolved immediate passes through, a register
/// becomes its symbol and a memory operand its dereference. Traps yield
/// nothing since their immediate is not an address.
#[must_use]
pub fn possible_targets(instr: &Instruction) -> std::option::IntoIter<Expr> {
    let target = if instr.props.sets_ip() && !instr.mnemonic.is_trap() {
        instr.last_operand().map(|operand| match operand {
            Operand::Register(reg) => Expr::sym(reg.name()),
            other => other.symbolic(instr.address),
        })
    } else {
        None
    };
    target.into_iter()
}
