//! Byte sources the decoder reads instruction words from.

use crate::types::{Endianness, WORD_BYTES};

/// Cursor over code bytes mapped at a virtual address.
pub trait WordStream {
    /// Offset of the cursor from the start of the stream.
    fn position(&self) -> usize;

    /// Total length in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Virtual address of the cursor.
    fn address(&self) -> u64;

    /// Read the word at the cursor without consuming it.
    fn peek_u32(&self, endianness: Endianness) -> Option<u32>;

    /// Read the word at the cursor and advance past it.
    fn read_u32(&mut self, endianness: Endianness) -> Option<u32>;

    /// Whether fewer than four bytes remain.
    fn is_exhausted(&self) -> bool {
        self.len().saturating_sub(self.position()) < usize::from(WORD_BYTES)
    }
}

/// [`WordStream`] over a borrowed byte slice.
#[derive(Clone, Debug)]
pub struct ByteStream<'a> {
    data: &'a [u8],
    base_address: u64,
    pos: usize,
}

impl<'a> ByteStream<'a> {
    #[must_use]
    pub const fn new(data: &'a [u8], base_address: u64) -> Self {
        Self {
            data,
            base_address,
            pos: 0,
        }
    }

    fn word_bytes(&self) -> Option<[u8; 4]> {
        let end = self.pos.checked_add(usize::from(WORD_BYTES))?;
        self.data.get(self.pos..end)?.try_into().ok()
    }
}

impl WordStream for ByteStream<'_> {
    fn position(&self) -> usize {
        self.pos
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn address(&self) -> u64 {
        self.base_address.wrapping_add(self.pos as u64)
    }

    fn peek_u32(&self, endianness: Endianness) -> Option<u32> {
        self.word_bytes().map(|bytes| endianness.word(bytes))
    }

    fn read_u32(&mut self, endianness: Endianness) -> Option<u32> {
        let word = self.peek_u32(endianness)?;
        self.pos += usize::from(WORD_BYTES);
        Some(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_does_not_consume() {
        let code = [0x8C, 0x23, 0x00, 0x04];
        let mut stream = ByteStream::new(&code, 0x1000);
        assert_eq!(stream.peek_u32(Endianness::Big), Some(0x8C23_0004));
        assert_eq!(stream.position(), 0);
        assert_eq!(stream.read_u32(Endianness::Big), Some(0x8C23_0004));
        assert_eq!(stream.position(), 4);
        assert_eq!(stream.address(), 0x1004);
        assert!(stream.is_exhausted());
        assert_eq!(stream.peek_u32(Endianness::Big), None);
    }

    #[test]
    fn test_short_tail_is_exhausted() {
        let code = [0u8; 6];
        let mut stream = ByteStream::new(&code, 0);
        assert!(stream.read_u32(Endianness::Little).is_some());
        assert!(stream.is_exhausted());
        assert_eq!(stream.read_u32(Endianness::Little), None);
        assert_eq!(stream.position(), 4);
    }
}
