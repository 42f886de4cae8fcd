//! Backend configuration.

use crate::types::Endianness;

/// Configuration for a [`Mips`](crate::Mips) backend instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MipsConfig {
    /// Byte order of instruction words. Defaults to big-endian.
    pub endianness: Endianness,
}

impl MipsConfig {
    #[must_use]
    pub const fn little_endian() -> Self {
        Self {
            endianness: Endianness::Little,
        }
    }
}
