//! Instruction table for decoded instructions.
//!
//! Linear sweep of a code buffer into one slot per instruction word.

use mdasm_isa::{ByteStream, Instruction, Mips, WORD_BYTES, delay_slot};
use rayon::prelude::*;
use tracing::debug;

/// Table of decoded instructions, one 4-byte slot per address.
#[derive(Debug)]
pub struct InstructionTable {
    slots: Vec<Option<Instruction>>,
    base_address: u64,
    end_address: u64,
}

impl InstructionTable {
    /// Slot size in bytes.
    pub const SLOT_SIZE: usize = WORD_BYTES as usize;

    /// Decode every whole word of `code`, mapped at `base_address`.
    ///
    /// Words that do not decode leave an empty slot. A trailing partial word
    /// is ignored.
    #[must_use]
    pub fn from_bytes(code: &[u8], base_address: u64, mips: &Mips) -> Self {
        let slots: Vec<Option<Instruction>> = code
            .par_chunks_exact(Self::SLOT_SIZE)
            .enumerate()
            .map(|(index, word)| {
                let pc = base_address + (index * Self::SLOT_SIZE) as u64;
                mips.decode(&mut ByteStream::new(word, pc))
            })
            .collect();
        let end_address = base_address + (slots.len() * Self::SLOT_SIZE) as u64;

        let valid = slots.iter().filter(|slot| slot.is_some()).count();
        debug!(
            base = base_address,
            slots = slots.len(),
            valid,
            "instruction table decoded"
        );

        Self {
            slots,
            base_address,
            end_address,
        }
    }

    // ============= Accessors =============

    /// Get base address.
    #[must_use]
    pub const fn base_address(&self) -> u64 {
        self.base_address
    }

    /// Get end address (exclusive).
    #[must_use]
    pub const fn end_address(&self) -> u64 {
        self.end_address
    }

    /// Get total number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Convert PC to slot index.
    #[must_use]
    pub fn pc_to_index(&self, pc: u64) -> Option<usize> {
        if pc < self.base_address || pc >= self.end_address {
            return None;
        }
        let offset = usize::try_from(pc - self.base_address).ok()?;
        if !offset.is_multiple_of(Self::SLOT_SIZE) {
            return None;
        }
        Some(offset / Self::SLOT_SIZE)
    }

    /// Convert slot index to PC.
    #[must_use]
    pub const fn index_to_pc(&self, index: usize) -> u64 {
        self.base_address + (index * Self::SLOT_SIZE) as u64
    }

    /// Get instruction at slot index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Get instruction at PC.
    #[must_use]
    pub fn get_at_pc(&self, pc: u64) -> Option<&Instruction> {
        self.pc_to_index(pc).and_then(|idx| self.get(idx))
    }

    /// Check if PC points to a decoded instruction.
    #[must_use]
    pub fn is_valid_pc(&self, pc: u64) -> bool {
        self.get_at_pc(pc).is_some()
    }

    /// Address of the last instruction executed with the one at `pc`:
    /// the delay slot of a control transfer, else `pc` itself.
    #[must_use]
    pub fn delay_slot_end(&self, pc: u64) -> Option<u64> {
        let instr = self.get_at_pc(pc)?;
        if !instr.props.sets_ip() {
            return Some(pc);
        }
        let slots = u64::from(delay_slot(Some(instr)));
        Some(pc + slots * Self::SLOT_SIZE as u64)
    }

    /// Iterate over all decoded instructions with their PCs.
    pub fn valid_instructions(&self) -> impl Iterator<Item = (u64, &Instruction)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|instr| (self.index_to_pc(idx), instr)))
    }
}
