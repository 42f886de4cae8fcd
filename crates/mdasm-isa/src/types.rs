//! Core types for the MIPS32 ISA.

use std::fmt;

use mdasm_ir::{Expr, Indirection};

/// Byte order used to assemble instruction words.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Endianness {
    #[default]
    Big,
    Little,
}

impl Endianness {
    /// Assemble a 32-bit word from four bytes in this byte order.
    #[must_use]
    pub const fn word(self, bytes: [u8; 4]) -> u32 {
        match self {
            Self::Big => u32::from_be_bytes(bytes),
            Self::Little => u32::from_le_bytes(bytes),
        }
    }
}

/// Size of every MIPS32 instruction and of a word-sized memory access.
pub const WORD_BYTES: u8 = 4;

// Register ABI names (o32)
pub const REG_ZERO: u8 = 0;
pub const REG_AT: u8 = 1;
pub const REG_V0: u8 = 2;
pub const REG_V1: u8 = 3;
pub const REG_A0: u8 = 4;
pub const REG_A1: u8 = 5;
pub const REG_A2: u8 = 6;
pub const REG_A3: u8 = 7;
pub const REG_T0: u8 = 8;
pub const REG_T1: u8 = 9;
pub const REG_T2: u8 = 10;
pub const REG_T3: u8 = 11;
pub const REG_T4: u8 = 12;
pub const REG_T5: u8 = 13;
pub const REG_T6: u8 = 14;
pub const REG_T7: u8 = 15;
pub const REG_S0: u8 = 16;
pub const REG_S1: u8 = 17;
pub const REG_S2: u8 = 18;
pub const REG_S3: u8 = 19;
pub const REG_S4: u8 = 20;
pub const REG_S5: u8 = 21;
pub const REG_S6: u8 = 22;
pub const REG_S7: u8 = 23;
pub const REG_T8: u8 = 24;
pub const REG_T9: u8 = 25;
pub const REG_K0: u8 = 26;
pub const REG_K1: u8 = 27;
pub const REG_GP: u8 = 28;
pub const REG_SP: u8 = 29;
pub const REG_FP: u8 = 30;
pub const REG_RA: u8 = 31;

/// Symbolic names of the multiply/divide accumulators.
pub const SYM_HI: &str = "hi";
pub const SYM_LO: &str = "lo";

/// Registers a callee may clobber under the o32 calling convention.
pub const VOLATILE_REGS: [u8; 19] = [
    REG_V0, REG_V1, REG_A0, REG_A1, REG_A2, REG_A3, REG_T0, REG_T1, REG_T2, REG_T3, REG_T4,
    REG_T5, REG_T6, REG_T7, REG_T8, REG_T9, REG_AT, REG_K0, REG_K1,
];

/// Get register ABI name, including the `$` sigil.
#[must_use]
pub const fn reg_name(reg: u8) -> &'static str {
    match reg {
        0 => "$zero",
        1 => "$at",
        2 => "$v0",
        3 => "$v1",
        4 => "$a0",
        5 => "$a1",
        6 => "$a2",
        7 => "$a3",
        8 => "$t0",
        9 => "$t1",
        10 => "$t2",
        11 => "$t3",
        12 => "$t4",
        13 => "$t5",
        14 => "$t6",
        15 => "$t7",
        16 => "$s0",
        17 => "$s1",
        18 => "$s2",
        19 => "$s3",
        20 => "$s4",
        21 => "$s5",
        22 => "$s6",
        23 => "$s7",
        24 => "$t8",
        25 => "$t9",
        26 => "$k0",
        27 => "$k1",
        28 => "$gp",
        29 => "$sp",
        30 => "$fp",
        31 => "$ra",
        _ => "$??",
    }
}

/// General-purpose register operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reg(pub u8);

impl Reg {
    pub const ZERO: Self = Self(REG_ZERO);
    pub const SP: Self = Self(REG_SP);
    pub const T9: Self = Self(REG_T9);
    pub const RA: Self = Self(REG_RA);

    #[must_use]
    pub const fn name(self) -> &'static str {
        reg_name(self.0)
    }

    /// Symbolic value of the register. `$zero` always reads as the constant 0.
    #[must_use]
    pub fn symbolic(self) -> Expr {
        if self.0 == REG_ZERO {
            Expr::int(0)
        } else {
            Expr::sym(self.name())
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coprocessor 1 register operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FpReg(pub u8);

impl FpReg {
    #[must_use]
    pub fn symbolic(self) -> Expr {
        Expr::Sym(self.to_string())
    }
}

impl fmt::Display for FpReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$f{}", self.0)
    }
}

/// Base register plus signed displacement, as in `4($at)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Memref {
    pub base: Reg,
    pub offset: Expr,
}

impl Memref {
    #[must_use]
    pub const fn new(base: Reg, offset: Expr) -> Self {
        Self { base, offset }
    }

    /// Word-sized dereference of `base + offset`, tagged with the address of
    /// the accessing instruction.
    #[must_use]
    pub fn symbolic(&self, address: u64) -> Expr {
        let pointer = Expr::add(self.base.symbolic(), self.offset.clone()).reduce();
        Expr::Deref(Indirection::new(pointer, WORD_BYTES, Some(address)))
    }
}

impl fmt::Display for Memref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.offset, self.base)
    }
}
