//! Symbolic effect of each instruction, for the backtracker.
//!
//! An effect is a [`Binding`]: destination locations mapped to expressions
//! over the state *before* the instruction executed. Register operands
//! abstract to symbols (`$zero` to the constant 0), memory operands to
//! word-sized dereferences.

use mdasm_ir::{Binding, Expr, Location};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::decode::Instruction;
use crate::mips::Mips;
use crate::opcodes::Mnemonic;
use crate::table::OpcodeTable;
use crate::types::{REG_RA, SYM_HI, SYM_LO, reg_name};

/// Access width of a load or store. Sub-word accesses are still modeled as
/// the full memory operand, without sign or zero extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemWidth {
    Byte,
    Half,
    Word,
}

/// Transfer function shared by a group of mnemonics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transfer {
    /// No data effect (jumps, plain branches, traps, hints).
    NoEffect,
    /// `rt = imm << 16`
    LoadUpper,
    /// `d = a + b`
    Add,
    /// `d = a - b`
    Sub,
    /// `d = a < b`
    ///
    /// `sltu`/`sltiu` share this transfer, so their comparison is modeled
    /// as signed and folds differently from the hardware when an operand
    /// has the top bit set.
    SetLessThan,
    And,
    Or,
    Xor,
    /// `d = ~(a | b)`
    Nor,
    /// `sll`/`sllv`, recorded as `d = a >> b`.
    ///
    /// Left and right are swapped relative to the mnemonic to match the bit
    /// order the expression algebra uses. Do not "fix" one direction alone.
    ShiftLeft,
    /// `srl`/`sra`/`srlv`/`srav`, recorded as `d = a << b`.
    ShiftRight,
    /// `rt = mem`
    Load(MemWidth),
    /// `mem = rt`
    Store(MemWidth),
    MoveFromHi,
    MoveFromLo,
    MoveToHi,
    MoveToLo,
    /// `hi = (a * b) >> 32`, `lo = (a * b) & 0xffffffff`
    Multiply,
    /// `d = (a * b) & 0xffffffff`; `hi` and `lo` become unknown.
    MultiplyLow,
    /// `hi = a % b`, `lo = a / b`
    Divide,
    /// Link register receives the address after the delay slot.
    Link,
    /// `d = s` (`li`, `move`)
    Move,
}

impl Transfer {
    /// Transfer function for `mnemonic`, or `None` if it has no symbolic
    /// model.
    #[must_use]
    pub const fn for_mnemonic(mnemonic: Mnemonic) -> Option<Self> {
        use Mnemonic as M;
        Some(match mnemonic {
            M::Nop | M::Ssnop | M::Ehb | M::Sync | M::Pref | M::Cache => Self::NoEffect,
            M::J | M::Jr => Self::NoEffect,
            M::Beq
            | M::Bne
            | M::Blez
            | M::Bgtz
            | M::Beql
            | M::Bnel
            | M::Blezl
            | M::Bgtzl
            | M::Bltz
            | M::Bgez
            | M::Bltzl
            | M::Bgezl => Self::NoEffect,
            M::Tge
            | M::Tgeu
            | M::Tlt
            | M::Tltu
            | M::Teq
            | M::Tne
            | M::Tgei
            | M::Tgeiu
            | M::Tlti
            | M::Tltiu
            | M::Teqi
            | M::Tnei => Self::NoEffect,
            M::Lui => Self::LoadUpper,
            M::Add | M::Addu | M::Addi | M::Addiu => Self::Add,
            M::Sub | M::Subu => Self::Sub,
            M::Slt | M::Sltu | M::Slti | M::Sltiu => Self::SetLessThan,
            M::And | M::Andi => Self::And,
            M::Or | M::Ori => Self::Or,
            M::Xor | M::Xori => Self::Xor,
            M::Nor => Self::Nor,
            M::Sll | M::Sllv => Self::ShiftLeft,
            M::Srl | M::Sra | M::Srlv | M::Srav => Self::ShiftRight,
            M::Lw | M::Ll | M::Lwc1 => Self::Load(MemWidth::Word),
            M::Lh | M::Lhu => Self::Load(MemWidth::Half),
            M::Lb | M::Lbu => Self::Load(MemWidth::Byte),
            M::Sw | M::Swc1 => Self::Store(MemWidth::Word),
            M::Sh => Self::Store(MemWidth::Half),
            M::Sb => Self::Store(MemWidth::Byte),
            M::Mfhi => Self::MoveFromHi,
            M::Mflo => Self::MoveFromLo,
            M::Mthi => Self::MoveToHi,
            M::Mtlo => Self::MoveToLo,
            M::Mult | M::Multu => Self::Multiply,
            M::Mul => Self::MultiplyLow,
            M::Div | M::Divu => Self::Divide,
            M::Jal | M::Jalr | M::Bltzal | M::Bgezal | M::Bltzall | M::Bgezall => Self::Link,
            M::Li | M::Move => Self::Move,
            M::Syscall
            | M::Break
            | M::Sdbbp
            | M::Eret
            | M::Wait
            | M::Movz
            | M::Movn
            | M::Madd
            | M::Maddu
            | M::Msub
            | M::Msubu
            | M::Clz
            | M::Clo
            | M::Ext
            | M::Ins
            | M::Mfc0
            | M::Mtc0
            | M::Lwl
            | M::Lwr
            | M::Swl
            | M::Swr
            | M::Sc
            | M::Ldc1
            | M::Sdc1 => return None,
        })
    }

    /// Apply to abstracted operands. Operand counts that do not fit the
    /// transfer produce an empty binding.
    #[must_use]
    pub fn apply(self, instr: &Instruction, args: &[Expr]) -> Binding {
        let mut out = Binding::default();
        match (self, args) {
            (Self::NoEffect, _) => {}
            (Self::LoadUpper, [d, imm]) => {
                assign(&mut out, d, Expr::shl(imm.clone(), Expr::int(16)));
            }
            (Self::Add, [d, a, b]) => assign(&mut out, d, Expr::add(a.clone(), b.clone())),
            (Self::Sub, [d, a, b]) => assign(&mut out, d, Expr::sub(a.clone(), b.clone())),
            (Self::SetLessThan, [d, a, b]) => assign(&mut out, d, Expr::lt(a.clone(), b.clone())),
            (Self::And, [d, a, b]) => assign(&mut out, d, Expr::and(a.clone(), b.clone())),
            (Self::Or, [d, a, b]) => assign(&mut out, d, Expr::or(a.clone(), b.clone())),
            (Self::Xor, [d, a, b]) => assign(&mut out, d, Expr::xor(a.clone(), b.clone())),
            (Self::Nor, [d, a, b]) => {
                assign(&mut out, d, Expr::not(Expr::or(a.clone(), b.clone())));
            }
            (Self::ShiftLeft, [d, a, b]) => assign(&mut out, d, Expr::shr(a.clone(), b.clone())),
            (Self::ShiftRight, [d, a, b]) => assign(&mut out, d, Expr::shl(a.clone(), b.clone())),
            (Self::Load(_), [d, mem]) => assign(&mut out, d, mem.clone()),
            (Self::Store(_), [src, mem]) => assign(&mut out, mem, src.clone()),
            (Self::MoveFromHi, [d]) => assign(&mut out, d, Expr::sym(SYM_HI)),
            (Self::MoveFromLo, [d]) => assign(&mut out, d, Expr::sym(SYM_LO)),
            (Self::MoveToHi, [s]) => {
                out.insert(Location::sym(SYM_HI), s.clone());
            }
            (Self::MoveToLo, [s]) => {
                out.insert(Location::sym(SYM_LO), s.clone());
            }
            (Self::Multiply, [a, b]) => {
                let product = Expr::mul(a.clone(), b.clone());
                out.insert(Location::sym(SYM_HI), Expr::shr(product.clone(), Expr::int(32)));
                out.insert(Location::sym(SYM_LO), Expr::and(product, Expr::int(0xffff_ffff)));
            }
            (Self::MultiplyLow, [d, a, b]) => {
                let product = Expr::mul(a.clone(), b.clone());
                assign(&mut out, d, Expr::and(product, Expr::int(0xffff_ffff)));
                out.insert(Location::sym(SYM_HI), Expr::Unknown);
                out.insert(Location::sym(SYM_LO), Expr::Unknown);
            }
            (Self::Divide, [a, b]) => {
                out.insert(Location::sym(SYM_HI), Expr::rem(a.clone(), b.clone()));
                out.insert(Location::sym(SYM_LO), Expr::div(a.clone(), b.clone()));
            }
            (Self::Link, args) => {
                // Execution resumes after the delay slot.
                let return_address = instr.next_address().wrapping_add(u64::from(instr.size));
                let value = Expr::int(return_address.cast_signed());
                match (instr.mnemonic, args) {
                    (Mnemonic::Jalr, [rd, _]) => assign(&mut out, rd, value),
                    _ => {
                        out.insert(Location::sym(reg_name(REG_RA)), value);
                    }
                }
            }
            (Self::Move, [d, s]) => assign(&mut out, d, s.clone()),
            (transfer, args) => {
                trace!(?transfer, arity = args.len(), "operands do not fit transfer function");
            }
        }
        out
    }
}

fn assign(out: &mut Binding, dest: &Expr, value: Expr) {
    match Location::from_expr(dest) {
        Some(loc) => {
            out.insert(loc, value);
        }
        None => trace!(%dest, "destination is not assignable"),
    }
}

/// Transfer functions for every mnemonic of an opcode table.
#[derive(Clone, Debug, Default)]
pub struct BindingTable {
    entries: FxHashMap<Mnemonic, Transfer>,
}

impl BindingTable {
    #[must_use]
    pub fn build(table: &OpcodeTable) -> Self {
        let mut entries = FxHashMap::default();
        for op in table.iter() {
            if let Some(transfer) = Transfer::for_mnemonic(op.mnemonic) {
                entries.insert(op.mnemonic, transfer);
            }
        }
        debug!(mnemonics = entries.len(), "binding table built");
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, mnemonic: Mnemonic) -> Option<Transfer> {
        self.entries.get(&mnemonic).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Mips {
    /// Symbolic effect of `instr`.
    ///
    /// Writes to `$zero` are dropped. Instructions without a transfer
    /// function have no effect; a diagnostic is emitted unless the
    /// instruction is a conditional branch.
    #[must_use]
    pub fn get_effect(&self, instr: &Instruction) -> Binding {
        let args: Vec<Expr> = instr
            .operands
            .iter()
            .map(|op| op.symbolic(instr.address))
            .collect();
        let mut binding = match self.bindings().get(instr.mnemonic) {
            Some(transfer) => transfer.apply(instr, &args),
            None => {
                if !(instr.mnemonic.is_branch() && instr.props.sets_ip()) {
                    debug!(
                        address = instr.address,
                        instr = %instr,
                        "unknown instruction effect"
                    );
                }
                Binding::default()
            }
        };
        binding.remove(&Location::Zero);
        binding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ByteStream, MipsConfig};

    fn effect_at(word: u32, address: u64) -> Binding {
        let mips = Mips::new(MipsConfig::default()).unwrap();
        let code = word.to_be_bytes();
        let instr = mips.decode(&mut ByteStream::new(&code, address)).unwrap();
        mips.get_effect(&instr)
    }

    fn sym(name: &str) -> Expr {
        Expr::sym(name)
    }

    #[test]
    fn test_load_word() {
        // lw $v1, 4($at)
        let effect = effect_at(0x8C23_0004, 0x1000);
        assert_eq!(effect.len(), 1);
        assert_eq!(
            effect[&Location::sym("$v1")],
            Expr::deref(Expr::add(sym("$at"), Expr::int(4)), 4, Some(0x1000))
        );
    }

    #[test]
    fn test_store_word() {
        // sw $ra, 12($sp)
        let effect = effect_at(0xAFBF_000C, 0x1004);
        let cell = Location::from_expr(&Expr::deref(
            Expr::add(sym("$sp"), Expr::int(12)),
            4,
            None,
        ))
        .unwrap();
        assert_eq!(effect[&cell], sym("$ra"));
    }

    #[test]
    fn test_jal_links_past_delay_slot() {
        // jal with target field 0x10
        let effect = effect_at(0x0C00_0010, 0x2000);
        assert_eq!(effect.len(), 1);
        assert_eq!(effect[&Location::sym("$ra")], Expr::int(0x2008));
    }

    #[test]
    fn test_jalr_links_named_register() {
        // jalr $a0, $t0
        let effect = effect_at(0x0100_2009, 0x2000);
        assert_eq!(effect[&Location::sym("$a0")], Expr::int(0x2008));
        assert!(!effect.contains_key(&Location::sym("$ra")));

        // jalr $t9
        let effect = effect_at(0x0320_F809, 0x2000);
        assert_eq!(effect[&Location::sym("$ra")], Expr::int(0x2008));
    }

    #[test]
    fn test_write_to_zero_is_dropped() {
        // addu $zero, $a0, $a1
        assert!(effect_at(0x0085_0021, 0).is_empty());
    }

    #[test]
    fn test_shift_directions_are_swapped() {
        // sll $t0, $t1, 4
        let effect = effect_at(0x0009_4100, 0);
        assert_eq!(
            effect[&Location::sym("$t0")],
            Expr::shr(sym("$t1"), Expr::int(4))
        );
        // srl $t0, $t1, 4
        let effect = effect_at(0x0009_4102, 0);
        assert_eq!(
            effect[&Location::sym("$t0")],
            Expr::shl(sym("$t1"), Expr::int(4))
        );
    }

    #[test]
    fn test_multiply_and_divide() {
        // mult $a0, $a1
        let effect = effect_at(0x0085_0018, 0);
        let product = Expr::mul(sym("$a0"), sym("$a1"));
        assert_eq!(
            effect[&Location::sym("hi")],
            Expr::shr(product.clone(), Expr::int(32))
        );
        assert_eq!(
            effect[&Location::sym("lo")],
            Expr::and(product, Expr::int(0xffff_ffff))
        );

        // div $a0, $a1
        let effect = effect_at(0x0085_001A, 0);
        assert_eq!(effect[&Location::sym("hi")], Expr::rem(sym("$a0"), sym("$a1")));
        assert_eq!(effect[&Location::sym("lo")], Expr::div(sym("$a0"), sym("$a1")));
    }

    #[test]
    fn test_mul_clobbers_accumulators() {
        // mul $v0, $a0, $a1
        let effect = effect_at(0x7085_1002, 0);
        assert_eq!(
            effect[&Location::sym("$v0")],
            Expr::and(Expr::mul(sym("$a0"), sym("$a1")), Expr::int(0xffff_ffff))
        );
        assert_eq!(effect[&Location::sym("hi")], Expr::Unknown);
        assert_eq!(effect[&Location::sym("lo")], Expr::Unknown);
    }

    #[test]
    fn test_unsigned_compare_is_modeled_signed() {
        // sltiu $v0, $zero, -1
        let effect = effect_at(0x2C02_FFFF, 0);
        let value = &effect[&Location::sym("$v0")];
        assert_eq!(*value, Expr::lt(Expr::int(0), Expr::int(-1)));
        assert_eq!(value.reduce(), Expr::int(0));
    }

    #[test]
    fn test_lui_and_nor() {
        // lui $t0, 0x1234
        let effect = effect_at(0x3C08_1234, 0);
        assert_eq!(effect[&Location::sym("$t0")].reduce(), Expr::int(0x1234_0000));

        // nor $v0, $a0, $a1
        let effect = effect_at(0x0085_1027, 0);
        assert_eq!(
            effect[&Location::sym("$v0")],
            Expr::not(Expr::or(sym("$a0"), sym("$a1")))
        );
    }

    #[test]
    fn test_li_reads_zero_as_constant() {
        // li $v0, 7
        let effect = effect_at(0x2402_0007, 0);
        assert_eq!(effect[&Location::sym("$v0")], Expr::int(7));
    }

    #[test]
    fn test_unmodeled_and_control_instructions() {
        // syscall
        assert!(effect_at(0x0000_000C, 0).is_empty());
        // beq $a0, $a1, -1
        assert!(effect_at(0x1085_FFFF, 0x1000).is_empty());
        // jr $ra
        assert!(effect_at(0x03E0_0008, 0).is_empty());
    }

    #[test]
    fn test_every_table_mnemonic_is_classified() {
        let mips = Mips::new(MipsConfig::default()).unwrap();
        let modeled = mips
            .table()
            .iter()
            .filter(|op| Transfer::for_mnemonic(op.mnemonic).is_some())
            .map(|op| op.mnemonic)
            .collect::<rustc_hash::FxHashSet<_>>();
        assert_eq!(mips.bindings().len(), modeled.len());
        assert_eq!(mips.bindings().get(Mnemonic::Lw), Some(Transfer::Load(MemWidth::Word)));
        assert_eq!(mips.bindings().get(Mnemonic::Syscall), None);
    }
}
