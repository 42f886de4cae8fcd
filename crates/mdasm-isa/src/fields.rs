//! Instruction word fields and immediate sign extension.

use std::fmt;

/// Named bit range inside an instruction word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Rs,
    Rt,
    Rd,
    Sa,
    I16,
    I20,
    I26,
    /// Base register and 16-bit displacement of a load or store.
    RsI16,
    /// Cache/prefetch operation selector.
    It,
    Ft,
    /// `ext` field size minus one.
    Idm1,
    /// `ins` field bound.
    Idb,
    /// Coprocessor register select.
    Sel,
    /// Floating-point condition code.
    Cc,
}

/// Placement of a field: `(word >> shift) & mask`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub mask: u32,
    pub shift: u8,
    /// Width to sign-extend from, for signed immediates.
    pub sign_width: Option<u8>,
}

impl FieldSpec {
    const fn unsigned(mask: u32, shift: u8) -> Self {
        Self {
            mask,
            shift,
            sign_width: None,
        }
    }

    const fn signed(mask: u32, shift: u8, width: u8) -> Self {
        Self {
            mask,
            shift,
            sign_width: Some(width),
        }
    }

    /// Bits this field occupies within the word.
    #[must_use]
    pub const fn placed_mask(self) -> u32 {
        self.mask << self.shift
    }
}

/// How a decoded field is presented as an operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperandRole {
    Register,
    FloatRegister,
    Immediate,
    Memory,
    /// Decoded but not modeled; the operand carries no value.
    Unsupported,
}

impl Field {
    #[must_use]
    pub const fn spec(self) -> FieldSpec {
        match self {
            Self::Rs => FieldSpec::unsigned(0x1f, 21),
            Self::Rt => FieldSpec::unsigned(0x1f, 16),
            Self::Rd => FieldSpec::unsigned(0x1f, 11),
            Self::Sa => FieldSpec::signed(0x1f, 6, 16),
            Self::I16 => FieldSpec::signed(0xffff, 0, 16),
            Self::I20 => FieldSpec::signed(0xf_ffff, 6, 20),
            Self::I26 => FieldSpec::signed(0x3ff_ffff, 0, 26),
            Self::RsI16 => FieldSpec::unsigned(0x3e0_ffff, 0),
            Self::It => FieldSpec::signed(0x1f, 16, 16),
            Self::Ft => FieldSpec::unsigned(0x1f, 16),
            Self::Idm1 | Self::Idb => FieldSpec::unsigned(0x1f, 11),
            Self::Sel => FieldSpec::unsigned(0x7, 0),
            Self::Cc => FieldSpec::unsigned(0x7, 18),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rs => "rs",
            Self::Rt => "rt",
            Self::Rd => "rd",
            Self::Sa => "sa",
            Self::I16 => "i16",
            Self::I20 => "i20",
            Self::I26 => "i26",
            Self::RsI16 => "rs_i16",
            Self::It => "it",
            Self::Ft => "ft",
            Self::Idm1 => "idm1",
            Self::Idb => "idb",
            Self::Sel => "sel",
            Self::Cc => "cc",
        }
    }

    /// Operand role, or `None` for fields the decoder cannot present.
    #[must_use]
    pub const fn role(self) -> Option<OperandRole> {
        match self {
            Self::Rs | Self::Rt | Self::Rd => Some(OperandRole::Register),
            Self::Sa | Self::I16 | Self::I20 | Self::I26 | Self::It => {
                Some(OperandRole::Immediate)
            }
            Self::RsI16 => Some(OperandRole::Memory),
            Self::Ft => Some(OperandRole::FloatRegister),
            Self::Idm1 | Self::Idb => Some(OperandRole::Unsupported),
            Self::Sel | Self::Cc => None,
        }
    }

    /// Raw field bits.
    #[inline]
    #[must_use]
    pub const fn extract(self, word: u32) -> u32 {
        let spec = self.spec();
        (word >> spec.shift) & spec.mask
    }

    /// Field value, sign-extended when the field is a signed immediate.
    #[inline]
    #[must_use]
    pub const fn value(self, word: u32) -> i64 {
        let raw = self.extract(word);
        match self.spec().sign_width {
            Some(width) => sign_extend(raw, width),
            None => raw as i64,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sign-extend the low `width` bits of `value`.
#[inline]
#[must_use]
pub const fn sign_extend(value: u32, width: u8) -> i64 {
    let shift = 64 - width as u32;
    ((value as i64) << shift) >> shift
}

/// Extract the register number of `field`.
#[inline]
#[must_use]
pub const fn decode_reg(field: Field, word: u32) -> u8 {
    field.extract(word).to_le_bytes()[0] & 0x1f
}
