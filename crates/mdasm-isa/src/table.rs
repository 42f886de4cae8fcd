//! Compiled opcode table and the first-byte lookaside index.

use std::fmt;

use tracing::debug;

use crate::fields::{Field, OperandRole};
use crate::opcodes::{Mnemonic, OpcodeSpec, Props};
use crate::{Result, TableError};

/// Index of an opcode in its [`OpcodeTable`], in declaration order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct OpId(pub u16);

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpId({})", self.0)
    }
}

/// Opcode with its derived fixed-bit mask and operand roles.
#[derive(Clone, Debug)]
pub struct OpcodeDef {
    pub id: OpId,
    pub mnemonic: Mnemonic,
    pub bin: u32,
    pub args: &'static [Field],
    pub roles: Box<[OperandRole]>,
    pub props: Props,
    /// Bit set where the opcode's pattern is fixed.
    pub bin_mask: u32,
}

impl OpcodeDef {
    /// Whether `word` agrees with the fixed bits of this opcode.
    #[inline]
    #[must_use]
    pub const fn matches(&self, word: u32) -> bool {
        (self.bin & self.bin_mask) == (word & self.bin_mask)
    }
}

/// Complement of the union of the bits covered by `args`.
#[must_use]
pub const fn compute_bin_mask(args: &[Field]) -> u32 {
    let mut covered = 0;
    let mut i = 0;
    while i < args.len() {
        covered |= args[i].spec().placed_mask();
        i += 1;
    }
    !covered
}

/// 256 buckets keyed by the high byte of an instruction word.
///
/// Bucket `b` lists, in declaration order, every opcode whose fixed bits in
/// the high byte agree with `b`.
#[derive(Clone, Debug)]
pub struct Lookaside {
    buckets: Vec<Vec<OpId>>,
}

impl Lookaside {
    /// Build the index for `opcodes`.
    #[must_use]
    pub fn build(opcodes: &[OpcodeDef]) -> Self {
        let mut buckets = vec![Vec::new(); 256];
        for op in opcodes {
            let fixed = op.bin_mask >> 24;
            let base = (op.bin >> 24) & fixed;
            // Every byte agreeing with `base` on `fixed` lies in base..=base|!fixed.
            for byte in base..=(base | (0xff ^ fixed)) {
                if byte & fixed == base {
                    buckets[byte as usize].push(op.id);
                }
            }
        }
        Self { buckets }
    }

    /// Candidates for a word whose high byte is `byte`.
    #[must_use]
    pub fn bucket(&self, byte: u8) -> &[OpId] {
        &self.buckets[usize::from(byte)]
    }

    /// Number of (bucket, opcode) entries.
    #[must_use]
    pub fn entries(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}

/// Validated opcode table with its lookaside index.
#[derive(Clone, Debug)]
pub struct OpcodeTable {
    opcodes: Vec<OpcodeDef>,
    lookaside: Lookaside,
}

impl OpcodeTable {
    /// Compile `specs`, rejecting fields the decoder cannot present and
    /// patterns that set bits belonging to a variable field.
    pub fn new(specs: &'static [OpcodeSpec]) -> Result<Self> {
        let opcodes = specs
            .iter()
            .enumerate()
            .map(|(idx, spec)| compile(idx, spec))
            .collect::<Result<Vec<_>>>()?;
        let lookaside = Lookaside::build(&opcodes);
        debug!(
            opcodes = opcodes.len(),
            entries = lookaside.entries(),
            "opcode table built"
        );
        Ok(Self { opcodes, lookaside })
    }

    #[must_use]
    pub fn get(&self, id: OpId) -> Option<&OpcodeDef> {
        self.opcodes.get(usize::from(id.0))
    }

    pub fn iter(&self) -> impl Iterator<Item = &OpcodeDef> {
        self.opcodes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }

    #[must_use]
    pub const fn lookaside(&self) -> &Lookaside {
        &self.lookaside
    }

    /// First opcode in declaration order matching `word`.
    #[must_use]
    pub fn find(&self, word: u32) -> Option<&OpcodeDef> {
        let [high, ..] = word.to_be_bytes();
        self.lookaside
            .bucket(high)
            .iter()
            .filter_map(|id| self.get(*id))
            .find(|op| op.matches(word))
    }
}

fn compile(idx: usize, spec: &OpcodeSpec) -> Result<OpcodeDef> {
    let id = u16::try_from(idx)
        .map(OpId)
        .map_err(|_| TableError::TooManyOpcodes(idx))?;
    let roles = spec
        .args
        .iter()
        .map(|&field| {
            field.role().ok_or(TableError::UnsupportedArgument {
                mnemonic: spec.mnemonic,
                field,
            })
        })
        .collect::<Result<Box<[_]>>>()?;
    let bin_mask = compute_bin_mask(spec.args);
    let overlap = spec.bin & !bin_mask;
    if overlap != 0 {
        return Err(TableError::PatternOverlapsField {
            mnemonic: spec.mnemonic,
            bin: spec.bin,
            overlap,
        });
    }
    Ok(OpcodeDef {
        id,
        mnemonic: spec.mnemonic,
        bin: spec.bin,
        args: spec.args,
        roles,
        props: spec.props,
        bin_mask,
    })
}
