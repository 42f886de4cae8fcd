//! MIPS32 mnemonics and the static opcode description table.

use std::fmt;
use std::ops::BitOr;

use crate::fields::Field;
use crate::fields::Field::{Ft, I16, I20, I26, Idb, Idm1, It, Rd, Rs, RsI16, Rt, Sa};
use self::Mnemonic as M;

/// Instruction mnemonic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mnemonic {
    // Jumps and branches
    J,
    Jal,
    Jr,
    Jalr,
    Beq,
    Bne,
    Blez,
    Bgtz,
    Beql,
    Bnel,
    Blezl,
    Bgtzl,
    Bltz,
    Bgez,
    Bltzl,
    Bgezl,
    Bltzal,
    Bgezal,
    Bltzall,
    Bgezall,
    // Immediate arithmetic
    Li,
    Addi,
    Addiu,
    Slti,
    Sltiu,
    Andi,
    Ori,
    Xori,
    Lui,
    // Loads and stores
    Lb,
    Lh,
    Lwl,
    Lw,
    Lbu,
    Lhu,
    Lwr,
    Sb,
    Sh,
    Swl,
    Sw,
    Swr,
    Ll,
    Sc,
    Lwc1,
    Swc1,
    Ldc1,
    Sdc1,
    Pref,
    Cache,
    // SPECIAL
    Nop,
    Ssnop,
    Ehb,
    Sll,
    Srl,
    Sra,
    Sllv,
    Srlv,
    Srav,
    Movz,
    Movn,
    Syscall,
    Break,
    Sync,
    Mfhi,
    Mthi,
    Mflo,
    Mtlo,
    Mult,
    Multu,
    Div,
    Divu,
    Move,
    Add,
    Addu,
    Sub,
    Subu,
    And,
    Or,
    Xor,
    Nor,
    Slt,
    Sltu,
    // Traps
    Tge,
    Tgeu,
    Tlt,
    Tltu,
    Teq,
    Tne,
    Tgei,
    Tgeiu,
    Tlti,
    Tltiu,
    Teqi,
    Tnei,
    // SPECIAL2
    Madd,
    Maddu,
    Mul,
    Msub,
    Msubu,
    Clz,
    Clo,
    Sdbbp,
    // SPECIAL3
    Ext,
    Ins,
    // COP0
    Mfc0,
    Mtc0,
    Eret,
    Wait,
}

impl Mnemonic {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::J => "j",
            Self::Jal => "jal",
            Self::Jr => "jr",
            Self::Jalr => "jalr",
            Self::Beq => "beq",
            Self::Bne => "bne",
            Self::Blez => "blez",
            Self::Bgtz => "bgtz",
            Self::Beql => "beql",
            Self::Bnel => "bnel",
            Self::Blezl => "blezl",
            Self::Bgtzl => "bgtzl",
            Self::Bltz => "bltz",
            Self::Bgez => "bgez",
            Self::Bltzl => "bltzl",
            Self::Bgezl => "bgezl",
            Self::Bltzal => "bltzal",
            Self::Bgezal => "bgezal",
            Self::Bltzall => "bltzall",
            Self::Bgezall => "bgezall",
            Self::Li => "li",
            Self::Addi => "addi",
            Self::Addiu => "addiu",
            Self::Slti => "slti",
            Self::Sltiu => "sltiu",
            Self::Andi => "andi",
            Self::Ori => "ori",
            Self::Xori => "xori",
            Self::Lui => "lui",
            Self::Lb => "lb",
            Self::Lh => "lh",
            Self::Lwl => "lwl",
            Self::Lw => "lw",
            Self::Lbu => "lbu",
            Self::Lhu => "lhu",
            Self::Lwr => "lwr",
            Self::Sb => "sb",
            Self::Sh => "sh",
            Self::Swl => "swl",
            Self::Sw => "sw",
            Self::Swr => "swr",
            Self::Ll => "ll",
            Self::Sc => "sc",
            Self::Lwc1 => "lwc1",
            Self::Swc1 => "swc1",
            Self::Ldc1 => "ldc1",
            Self::Sdc1 => "sdc1",
            Self::Pref => "pref",
            Self::Cache => "cache",
            Self::Nop => "nop",
            Self::Ssnop => "ssnop",
            Self::Ehb => "ehb",
            Self::Sll => "sll",
            Self::Srl => "srl",
            Self::Sra => "sra",
            Self::Sllv => "sllv",
            Self::Srlv => "srlv",
            Self::Srav => "srav",
            Self::Movz => "movz",
            Self::Movn => "movn",
            Self::Syscall => "syscall",
            Self::Break => "break",
            Self::Sync => "sync",
            Self::Mfhi => "mfhi",
            Self::Mthi => "mthi",
            Self::Mflo => "mflo",
            Self::Mtlo => "mtlo",
            Self::Mult => "mult",
            Self::Multu => "multu",
            Self::Div => "div",
            Self::Divu => "divu",
            Self::Move => "move",
            Self::Add => "add",
            Self::Addu => "addu",
            Self::Sub => "sub",
            Self::Subu => "subu",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Nor => "nor",
            Self::Slt => "slt",
            Self::Sltu => "sltu",
            Self::Tge => "tge",
            Self::Tgeu => "tgeu",
            Self::Tlt => "tlt",
            Self::Tltu => "tltu",
            Self::Teq => "teq",
            Self::Tne => "tne",
            Self::Tgei => "tgei",
            Self::Tgeiu => "tgeiu",
            Self::Tlti => "tlti",
            Self::Tltiu => "tltiu",
            Self::Teqi => "teqi",
            Self::Tnei => "tnei",
            Self::Madd => "madd",
            Self::Maddu => "maddu",
            Self::Mul => "mul",
            Self::Msub => "msub",
            Self::Msubu => "msubu",
            Self::Clz => "clz",
            Self::Clo => "clo",
            Self::Sdbbp => "sdbbp",
            Self::Ext => "ext",
            Self::Ins => "ins",
            Self::Mfc0 => "mfc0",
            Self::Mtc0 => "mtc0",
            Self::Eret => "eret",
            Self::Wait => "wait",
        }
    }

    /// PC-relative conditional branch (`b*` family).
    #[must_use]
    pub const fn is_branch(self) -> bool {
        matches!(
            self,
            Self::Beq
                | Self::Bne
                | Self::Blez
                | Self::Bgtz
                | Self::Beql
                | Self::Bnel
                | Self::Blezl
                | Self::Bgtzl
                | Self::Bltz
                | Self::Bgez
                | Self::Bltzl
                | Self::Bgezl
                | Self::Bltzal
                | Self::Bgezal
                | Self::Bltzall
                | Self::Bgezall
        )
    }

    /// Branch-likely: the delay slot is annulled when the branch is not taken.
    #[must_use]
    pub const fn is_likely_branch(self) -> bool {
        matches!(
            self,
            Self::Beql
                | Self::Bnel
                | Self::Blezl
                | Self::Bgtzl
                | Self::Bltzl
                | Self::Bgezl
                | Self::Bltzall
                | Self::Bgezall
        )
    }

    /// Conditional trap. Trap immediates are comparison operands, not targets.
    #[must_use]
    pub const fn is_trap(self) -> bool {
        matches!(
            self,
            Self::Tge
                | Self::Tgeu
                | Self::Tlt
                | Self::Tltu
                | Self::Teq
                | Self::Tne
                | Self::Tgei
                | Self::Tgeiu
                | Self::Tlti
                | Self::Tltiu
                | Self::Teqi
                | Self::Tnei
        )
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control-flow properties of an opcode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Props(u8);

impl Props {
    pub const NONE: Self = Self(0);
    /// May change the program counter.
    pub const SETS_IP: Self = Self(1);
    /// Writes a return address.
    pub const SAVES_IP: Self = Self(1 << 1);
    /// Execution never falls through past the delay slot.
    pub const STOPS_EXEC: Self = Self(1 << 2);

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn sets_ip(self) -> bool {
        self.contains(Self::SETS_IP)
    }

    #[must_use]
    pub const fn saves_ip(self) -> bool {
        self.contains(Self::SAVES_IP)
    }

    #[must_use]
    pub const fn stops_exec(self) -> bool {
        self.contains(Self::STOPS_EXEC)
    }
}

impl BitOr for Props {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Static description of one opcode: fixed bit pattern plus operand fields.
///
/// Bits covered by `args` must be zero in `bin`.
#[derive(Clone, Copy, Debug)]
pub struct OpcodeSpec {
    pub mnemonic: Mnemonic,
    pub bin: u32,
    pub args: &'static [Field],
    pub props: Props,
}

const fn op(mnemonic: Mnemonic, bin: u32, args: &'static [Field], props: Props) -> OpcodeSpec {
    OpcodeSpec {
        mnemonic,
        bin,
        args,
        props,
    }
}

const BRANCH: Props = Props::SETS_IP;
const JUMP: Props = Props::SETS_IP.union(Props::STOPS_EXEC);
const CALL: Props = JUMP.union(Props::SAVES_IP);
const LINK_BRANCH: Props = Props::SETS_IP.union(Props::SAVES_IP);
const TRAP: Props = Props::SETS_IP;
const HALT: Props = Props::STOPS_EXEC;
const NONE: Props = Props::NONE;

const fn primary(opcode: u32) -> u32 {
    opcode << 26
}

const fn special(funct: u32) -> u32 {
    funct
}

const fn regimm(rt: u32) -> u32 {
    (1 << 26) | (rt << 16)
}

const fn special2(funct: u32) -> u32 {
    (0x1c << 26) | funct
}

const fn special3(funct: u32) -> u32 {
    (0x1f << 26) | funct
}

const fn cop0(rs: u32) -> u32 {
    (0x10 << 26) | (rs << 21)
}

/// The MIPS32 opcode table, in declaration order.
///
/// Order decides ties between overlapping patterns: the aliases `nop`,
/// `li` and `move` precede the general forms they specialize, as does the
/// one-operand `jalr` (link register fixed to `$ra`).
pub static MIPS32_OPCODES: &[OpcodeSpec] = &[
    // SPECIAL: aliases first
    op(M::Nop, 0, &[], NONE),
    op(M::Ssnop, 1 << 6, &[], NONE),
    op(M::Ehb, 3 << 6, &[], NONE),
    op(M::Sll, special(0x00), &[Rd, Rt, Sa], NONE),
    op(M::Srl, special(0x02), &[Rd, Rt, Sa], NONE),
    op(M::Sra, special(0x03), &[Rd, Rt, Sa], NONE),
    op(M::Sllv, special(0x04), &[Rd, Rt, Rs], NONE),
    op(M::Srlv, special(0x06), &[Rd, Rt, Rs], NONE),
    op(M::Srav, special(0x07), &[Rd, Rt, Rs], NONE),
    op(M::Jr, special(0x08), &[Rs], JUMP),
    op(M::Jalr, special(0x09) | (31 << 11), &[Rs], CALL),
    op(M::Jalr, special(0x09), &[Rd, Rs], CALL),
    op(M::Movz, special(0x0a), &[Rd, Rs, Rt], NONE),
    op(M::Movn, special(0x0b), &[Rd, Rs, Rt], NONE),
    op(M::Syscall, special(0x0c), &[I20], NONE),
    op(M::Break, special(0x0d), &[I20], HALT),
    op(M::Sync, special(0x0f), &[], NONE),
    op(M::Sync, special(0x0f), &[Sa], NONE),
    op(M::Mfhi, special(0x10), &[Rd], NONE),
    op(M::Mthi, special(0x11), &[Rs], NONE),
    op(M::Mflo, special(0x12), &[Rd], NONE),
    op(M::Mtlo, special(0x13), &[Rs], NONE),
    op(M::Mult, special(0x18), &[Rs, Rt], NONE),
    op(M::Multu, special(0x19), &[Rs, Rt], NONE),
    op(M::Div, special(0x1a), &[Rs, Rt], NONE),
    op(M::Divu, special(0x1b), &[Rs, Rt], NONE),
    op(M::Add, special(0x20), &[Rd, Rs, Rt], NONE),
    op(M::Move, special(0x21), &[Rd, Rs], NONE),
    op(M::Addu, special(0x21), &[Rd, Rs, Rt], NONE),
    op(M::Sub, special(0x22), &[Rd, Rs, Rt], NONE),
    op(M::Subu, special(0x23), &[Rd, Rs, Rt], NONE),
    op(M::And, special(0x24), &[Rd, Rs, Rt], NONE),
    op(M::Or, special(0x25), &[Rd, Rs, Rt], NONE),
    op(M::Xor, special(0x26), &[Rd, Rs, Rt], NONE),
    op(M::Nor, special(0x27), &[Rd, Rs, Rt], NONE),
    op(M::Slt, special(0x2a), &[Rd, Rs, Rt], NONE),
    op(M::Sltu, special(0x2b), &[Rd, Rs, Rt], NONE),
    op(M::Tge, special(0x30), &[Rs, Rt], TRAP),
    op(M::Tgeu, special(0x31), &[Rs, Rt], TRAP),
    op(M::Tlt, special(0x32), &[Rs, Rt], TRAP),
    op(M::Tltu, special(0x33), &[Rs, Rt], TRAP),
    op(M::Teq, special(0x34), &[Rs, Rt], TRAP),
    op(M::Tne, special(0x36), &[Rs, Rt], TRAP),
    // REGIMM
    op(M::Bltz, regimm(0x00), &[Rs, I16], BRANCH),
    op(M::Bgez, regimm(0x01), &[Rs, I16], BRANCH),
    op(M::Bltzl, regimm(0x02), &[Rs, I16], BRANCH),
    op(M::Bgezl, regimm(0x03), &[Rs, I16], BRANCH),
    op(M::Tgei, regimm(0x08), &[Rs, I16], TRAP),
    op(M::Tgeiu, regimm(0x09), &[Rs, I16], TRAP),
    op(M::Tlti, regimm(0x0a), &[Rs, I16], TRAP),
    op(M::Tltiu, regimm(0x0b), &[Rs, I16], TRAP),
    op(M::Teqi, regimm(0x0c), &[Rs, I16], TRAP),
    op(M::Tnei, regimm(0x0e), &[Rs, I16], TRAP),
    op(M::Bltzal, regimm(0x10), &[Rs, I16], LINK_BRANCH),
    op(M::Bgezal, regimm(0x11), &[Rs, I16], LINK_BRANCH),
    op(M::Bltzall, regimm(0x12), &[Rs, I16], LINK_BRANCH),
    op(M::Bgezall, regimm(0x13), &[Rs, I16], LINK_BRANCH),
    // Primary opcodes
    op(M::J, primary(0x02), &[I26], JUMP),
    op(M::Jal, primary(0x03), &[I26], CALL),
    op(M::Beq, primary(0x04), &[Rs, Rt, I16], BRANCH),
    op(M::Bne, primary(0x05), &[Rs, Rt, I16], BRANCH),
    op(M::Blez, primary(0x06), &[Rs, I16], BRANCH),
    op(M::Bgtz, primary(0x07), &[Rs, I16], BRANCH),
    op(M::Addi, primary(0x08), &[Rt, Rs, I16], NONE),
    op(M::Li, primary(0x09), &[Rt, I16], NONE),
    op(M::Addiu, primary(0x09), &[Rt, Rs, I16], NONE),
    op(M::Slti, primary(0x0a), &[Rt, Rs, I16], NONE),
    op(M::Sltiu, primary(0x0b), &[Rt, Rs, I16], NONE),
    op(M::Andi, primary(0x0c), &[Rt, Rs, I16], NONE),
    op(M::Ori, primary(0x0d), &[Rt, Rs, I16], NONE),
    op(M::Xori, primary(0x0e), &[Rt, Rs, I16], NONE),
    op(M::Lui, primary(0x0f), &[Rt, I16], NONE),
    op(M::Beql, primary(0x14), &[Rs, Rt, I16], BRANCH),
    op(M::Bnel, primary(0x15), &[Rs, Rt, I16], BRANCH),
    op(M::Blezl, primary(0x16), &[Rs, I16], BRANCH),
    op(M::Bgtzl, primary(0x17), &[Rs, I16], BRANCH),
    op(M::Lb, primary(0x20), &[Rt, RsI16], NONE),
    op(M::Lh, primary(0x21), &[Rt, RsI16], NONE),
    op(M::Lwl, primary(0x22), &[Rt, RsI16], NONE),
    op(M::Lw, primary(0x23), &[Rt, RsI16], NONE),
    op(M::Lbu, primary(0x24), &[Rt, RsI16], NONE),
    op(M::Lhu, primary(0x25), &[Rt, RsI16], NONE),
    op(M::Lwr, primary(0x26), &[Rt, RsI16], NONE),
    op(M::Sb, primary(0x28), &[Rt, RsI16], NONE),
    op(M::Sh, primary(0x29), &[Rt, RsI16], NONE),
    op(M::Swl, primary(0x2a), &[Rt, RsI16], NONE),
    op(M::Sw, primary(0x2b), &[Rt, RsI16], NONE),
    op(M::Swr, primary(0x2e), &[Rt, RsI16], NONE),
    op(M::Cache, primary(0x2f), &[It, RsI16], NONE),
    op(M::Ll, primary(0x30), &[Rt, RsI16], NONE),
    op(M::Lwc1, primary(0x31), &[Ft, RsI16], NONE),
    op(M::Pref, primary(0x33), &[It, RsI16], NONE),
    op(M::Ldc1, primary(0x35), &[Ft, RsI16], NONE),
    op(M::Sc, primary(0x38), &[Rt, RsI16], NONE),
    op(M::Swc1, primary(0x39), &[Ft, RsI16], NONE),
    op(M::Sdc1, primary(0x3d), &[Ft, RsI16], NONE),
    // SPECIAL2
    op(M::Madd, special2(0x00), &[Rs, Rt], NONE),
    op(M::Maddu, special2(0x01), &[Rs, Rt], NONE),
    op(M::Mul, special2(0x02), &[Rd, Rs, Rt], NONE),
    op(M::Msub, special2(0x04), &[Rs, Rt], NONE),
    op(M::Msubu, special2(0x05), &[Rs, Rt], NONE),
    op(M::Clz, special2(0x20), &[Rd, Rs, Rt], NONE),
    op(M::Clo, special2(0x21), &[Rd, Rs, Rt], NONE),
    op(M::Sdbbp, special2(0x3f), &[I20], HALT),
    // SPECIAL3
    op(M::Ext, special3(0x00), &[Rt, Rs, Sa, Idm1], NONE),
    op(M::Ins, special3(0x04), &[Rt, Rs, Sa, Idb], NONE),
    // COP0
    op(M::Mfc0, cop0(0x00), &[Rt, Rd], NONE),
    op(M::Mtc0, cop0(0x04), &[Rt, Rd], NONE),
    op(M::Eret, cop0(0x10) | 0x18, &[], JUMP),
    op(M::Wait, cop0(0x10) | 0x20, &[], NONE),
];
