//! The MIPS32 backend instance: opcode lookup and operand decoding.

use std::sync::OnceLock;

use tracing::trace;

use crate::config::MipsConfig;
use crate::decode::{DecodedInstruction, Instruction, Operand, Unresolved};
use crate::opcodes::{MIPS32_OPCODES, OpcodeSpec};
use crate::semantics::BindingTable;
use crate::stream::WordStream;
use crate::table::{OpcodeDef, OpcodeTable};
use crate::types::WORD_BYTES;
use crate::Result;

/// Opcode matched at a stream position, before its operands are decoded.
#[derive(Clone, Copy, Debug)]
pub struct OpcodeMatch<'a> {
    pub opcode: &'a OpcodeDef,
    pub word: u32,
}

/// MIPS32 backend.
///
/// Owns the compiled opcode table and, lazily, the per-mnemonic transfer
/// functions. Shareable across threads once built.
#[derive(Debug)]
pub struct Mips {
    config: MipsConfig,
    table: OpcodeTable,
    bindings: OnceLock<BindingTable>,
}

impl Mips {
    /// Backend over the standard MIPS32 opcode table.
    pub fn new(config: MipsConfig) -> Result<Self> {
        Self::with_opcodes(config, MIPS32_OPCODES)
    }

    /// Backend over a custom opcode table.
    pub fn with_opcodes(config: MipsConfig, specs: &'static [OpcodeSpec]) -> Result<Self> {
        Ok(Self {
            config,
            table: OpcodeTable::new(specs)?,
            bindings: OnceLock::new(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &MipsConfig {
        &self.config
    }

    #[must_use]
    pub const fn table(&self) -> &OpcodeTable {
        &self.table
    }

    /// Transfer functions keyed by mnemonic, built on first use.
    pub fn bindings(&self) -> &BindingTable {
        self.bindings.get_or_init(|| BindingTable::build(&self.table))
    }

    /// Identify the opcode of the word at the stream cursor.
    ///
    /// Does not consume input. Returns `None` when fewer than four bytes
    /// remain or no opcode matches.
    pub fn find_opcode<'a, W: WordStream + ?Sized>(
        &'a self,
        stream: &W,
    ) -> Option<OpcodeMatch<'a>> {
        let word = stream.peek_u32(self.config.endianness)?;
        let opcode = self.table.find(word);
        if opcode.is_none() {
            trace!(address = stream.address(), word, "no opcode matches");
        }
        opcode.map(|opcode| OpcodeMatch { opcode, word })
    }

    /// Consume the word at the cursor and decode the operands of `found`.
    ///
    /// Immediate operands are sign-extended per field; branch displacements
    /// are left raw until [`DecodedInstruction::resolve_target`].
    pub fn decode_operands<W: WordStream + ?Sized>(
        &self,
        stream: &mut W,
        found: OpcodeMatch<'_>,
    ) -> Option<DecodedInstruction<Unresolved>> {
        let address = stream.address();
        let word = stream.read_u32(self.config.endianness)?;
        let op = found.opcode;
        let operands = op
            .args
            .iter()
            .zip(op.roles.iter())
            .map(|(&field, &role)| Operand::decode(field, role, word))
            .collect();
        Some(DecodedInstruction::new(
            address,
            op.id,
            op.mnemonic,
            op.props,
            operands,
            WORD_BYTES,
            word,
        ))
    }

    /// Decode and resolve the instruction at the stream cursor.
    pub fn decode<W: WordStream + ?Sized>(&self, stream: &mut W) -> Option<Instruction> {
        let address = stream.address();
        let found = self.find_opcode(stream)?;
        let instr = self.decode_operands(stream, found)?;
        Some(instr.resolve_target(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::Mnemonic;
    use crate::stream::ByteStream;
    use crate::types::{Memref, Reg, REG_AT, REG_V1};
    use mdasm_ir::Expr;

    fn mips() -> Mips {
        Mips::new(MipsConfig::default()).unwrap()
    }

    #[test]
    fn test_find_opcode_peeks() {
        let mips = mips();
        let code = 0x8C23_0004u32.to_be_bytes();
        let stream = ByteStream::new(&code, 0x1000);
        let found = mips.find_opcode(&stream).unwrap();
        assert_eq!(found.opcode.mnemonic, Mnemonic::Lw);
        assert_eq!(found.word, 0x8C23_0004);
        assert_eq!(stream.position(), 0);
    }

    #[test]
    fn test_find_opcode_short_or_unknown() {
        let mips = mips();
        let short = [0x8C, 0x23, 0x00];
        assert!(mips.find_opcode(&ByteStream::new(&short, 0)).is_none());
        let unknown = 0xFC00_0000u32.to_be_bytes();
        assert!(mips.find_opcode(&ByteStream::new(&unknown, 0)).is_none());
    }

    #[test]
    fn test_decode_operands() {
        let mips = mips();
        let code = 0x8C23_0004u32.to_be_bytes();
        let mut stream = ByteStream::new(&code, 0x1000);
        let found = mips.find_opcode(&stream).unwrap();
        let instr = mips.decode_operands(&mut stream, found).unwrap();
        assert_eq!(stream.position(), 4);
        assert_eq!(instr.size, 4);
        assert_eq!(
            instr.operands,
            vec![
                Operand::Register(Reg(REG_V1)),
                Operand::Memory(Memref::new(Reg(REG_AT), Expr::int(4))),
            ]
        );
    }

    #[test]
    fn test_little_endian() {
        let mips = Mips::new(MipsConfig::little_endian()).unwrap();
        let code = 0x8C23_0004u32.to_le_bytes();
        let instr = mips.decode(&mut ByteStream::new(&code, 0)).unwrap();
        assert_eq!(instr.mnemonic, Mnemonic::Lw);
    }

    #[test]
    fn test_decode_resolves_jump() {
        let mips = mips();
        // j with target field 0x100
        let code = 0x0800_0100u32.to_be_bytes();
        let instr = mips.decode(&mut ByteStream::new(&code, 0x3000)).unwrap();
        assert_eq!(instr.mnemonic, Mnemonic::J);
        assert_eq!(instr.operands, vec![Operand::Immediate(Expr::int(0x3404))]);
    }

    #[test]
    fn test_bindings_are_cached() {
        let mips = mips();
        let first: *const BindingTable = mips.bindings();
        let second: *const BindingTable = mips.bindings();
        assert_eq!(first, second);
    }
}
