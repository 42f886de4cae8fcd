//! Decoded instructions and branch-target resolution.

use std::fmt;
use std::marker::PhantomData;

use mdasm_ir::Expr;

use crate::fields::{Field, OperandRole, decode_reg};
use crate::opcodes::{Mnemonic, Props};
use crate::table::OpId;
use crate::types::{FpReg, Memref, Reg};

/// Decoded operand.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    Register(Reg),
    FloatRegister(FpReg),
    Immediate(Expr),
    Memory(Memref),
    /// Field that is decoded but carries no modeled value.
    Unsupported,
}

impl Operand {
    /// Decode one field of `word` in the given role.
    #[must_use]
    pub fn decode(field: Field, role: OperandRole, word: u32) -> Self {
        match role {
            OperandRole::Register => Self::Register(Reg(decode_reg(field, word))),
            OperandRole::FloatRegister => Self::FloatRegister(FpReg(decode_reg(field, word))),
            OperandRole::Immediate => Self::Immediate(Expr::int(field.value(word))),
            OperandRole::Memory => Self::Memory(Memref::new(
                Reg(decode_reg(Field::Rs, word)),
                Expr::int(Field::I16.value(word)),
            )),
            OperandRole::Unsupported => Self::Unsupported,
        }
    }

    /// Expression the binding engine sees for this operand.
    ///
    /// `address` tags memory operands with the accessing instruction.
    #[must_use]
    pub fn symbolic(&self, address: u64) -> Expr {
        match self {
            Self::Register(reg) => reg.symbolic(),
            Self::FloatRegister(reg) => reg.symbolic(),
            Self::Immediate(expr) => expr.clone(),
            Self::Memory(mem) => mem.symbolic(address),
            Self::Unsupported => Expr::Unknown,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(reg) => write!(f, "{reg}"),
            Self::FloatRegister(reg) => write!(f, "{reg}"),
            Self::Immediate(expr) => write!(f, "{expr}"),
            Self::Memory(mem) => write!(f, "{mem}"),
            Self::Unsupported => f.write_str("unsupported"),
        }
    }
}

/// Marker: the PC-relative immediate of a control transfer is still a raw
/// displacement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Unresolved;

/// Marker: the control-transfer immediate holds an absolute target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Resolved;

/// Decoded instruction in resolution state `S`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedInstruction<S = Resolved> {
    /// Address of the first byte of the instruction.
    pub address: u64,
    pub opid: OpId,
    pub mnemonic: Mnemonic,
    pub props: Props,
    pub operands: Vec<Operand>,
    /// Encoded size in bytes.
    pub size: u8,
    /// Raw instruction word.
    pub raw: u32,
    state: PhantomData<S>,
}

/// Instruction ready for analysis.
pub type Instruction = DecodedInstruction<Resolved>;

impl<S> DecodedInstruction<S> {
    /// Last operand, which carries the target of control transfers.
    #[must_use]
    pub fn last_operand(&self) -> Option<&Operand> {
        self.operands.last()
    }

    /// Address of the instruction following this one.
    #[must_use]
    pub fn next_address(&self) -> u64 {
        self.address.wrapping_add(u64::from(self.size))
    }

    /// `jr $ra`.
    #[must_use]
    pub fn is_return_via_link(&self) -> bool {
        self.mnemonic == Mnemonic::Jr && self.operands == [Operand::Register(Reg::RA)]
    }

    /// Substitute `old` by `new` inside immediates and memory offsets.
    /// Returns how many operands changed.
    pub fn replace_immediate(&mut self, old: &Expr, new: &Expr) -> usize {
        let mut replaced = 0;
        for operand in &mut self.operands {
            let slot = match operand {
                Operand::Immediate(expr) => expr,
                Operand::Memory(mem) => &mut mem.offset,
                _ => continue,
            };
            let updated = slot.substitute(old, new);
            if updated != *slot {
                *slot = updated;
                replaced += 1;
            }
        }
        replaced
    }
}

impl DecodedInstruction<Unresolved> {
    pub(crate) const fn new(
        address: u64,
        opid: OpId,
        mnemonic: Mnemonic,
        props: Props,
        operands: Vec<Operand>,
        size: u8,
        raw: u32,
    ) -> Self {
        Self {
            address,
            opid,
            mnemonic,
            props,
            operands,
            size,
            raw,
            state: PhantomData,
        }
    }

    /// Bind the instruction to `address` and turn a PC-relative branch
    /// displacement into an absolute target.
    ///
    /// Applies when the opcode sets the instruction pointer and its last
    /// operand is an immediate `d`: the operand becomes
    /// `address + size + (d << 2)`. Traps are left alone since their
    /// immediate is a comparison operand. Consuming `self` means the
    /// rewrite happens at most once.
    #[must_use]
    pub fn resolve_target(self, address: u64) -> Instruction {
        let Self {
            opid,
            mnemonic,
            props,
            mut operands,
            size,
            raw,
            ..
        } = self;
        if props.sets_ip() && !mnemonic.is_trap() {
            if let Some(Operand::Immediate(offset)) = operands.last_mut() {
                let displacement = Expr::shl(offset.clone(), Expr::int(2));
                let next = Expr::int(address.wrapping_add(u64::from(size)).cast_signed());
                *offset = Expr::add(next, displacement).reduce();
            }
        }
        DecodedInstruction {
            address,
            opid,
            mnemonic,
            props,
            operands,
            size,
            raw,
            state: PhantomData,
        }
    }
}

impl<S> fmt::Display for DecodedInstruction<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic.as_str())?;
        for (i, operand) in self.operands.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{operand}")?;
        }
        Ok(())
    }
}

/// Number of delay-slot instructions executed after `instr`.
///
/// Branch-likely forms report 0 because their slot is annulled on the
/// fall-through path. Everything else, including an unknown instruction,
/// reports 1.
#[must_use]
pub fn delay_slot(instr: Option<&Instruction>) -> u8 {
    match instr {
        Some(instr) if instr.mnemonic.is_likely_branch() => 0,
        _ => 1,
    }
}
