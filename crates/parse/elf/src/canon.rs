//! Header canonicalization.
//!
//! ELF headers come in four physical layouts (see [`Layout`]). Both the file
//! header and every section header are decoded through [`Canonical::decode`]
//! into one fixed-width, native-endian structure, so the rest of the crate
//! never looks at raw bytes again.
//!
//! Field extraction is safe slicing plus `from_le_bytes` / `from_be_bytes`.

use crate::ident::{ElfData, Layout};

/// A header type with a canonical, layout-independent representation.
pub trait Canonical: Sized {
    /// Size of the raw header in `layout`.
    fn raw_size(layout: Layout) -> usize;

    /// Decodes a raw header stored in `layout`.
    ///
    /// 32-bit fields are widened to the canonical width and every field is
    /// converted to native byte order.
    ///
    /// # Panics
    ///
    /// Panics if `raw.len() < Self::raw_size(layout)`. Callers must
    /// bounds-check first.
    fn decode(layout: Layout, raw: &[u8]) -> Self;
}

/// Reads fixed-offset fields in one byte order.
#[derive(Clone, Copy)]
pub(crate) struct FieldReader<'a> {
    raw: &'a [u8],
    order: ElfData,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(raw: &'a [u8], order: ElfData) -> Self {
        Self { raw, order }
    }

    fn bytes<const N: usize>(self, off: usize) -> [u8; N] {
        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.raw[off..off + N]);
        buf
    }

    pub(crate) fn u16(self, off: usize) -> u16 {
        let b = self.bytes(off);
        match self.order {
            ElfData::Lsb => u16::from_le_bytes(b),
            ElfData::Msb => u16::from_be_bytes(b),
        }
    }

    pub(crate) fn u32(self, off: usize) -> u32 {
        let b = self.bytes(off);
        match self.order {
            ElfData::Lsb => u32::from_le_bytes(b),
            ElfData::Msb => u32::from_be_bytes(b),
        }
    }

    pub(crate) fn u64(self, off: usize) -> u64 {
        let b = self.bytes(off);
        match self.order {
            ElfData::Lsb => u64::from_le_bytes(b),
            ElfData::Msb => u64::from_be_bytes(b),
        }
    }

    /// Reads a 32-bit address, offset or size widened to 64 bits.
    pub(crate) fn u32_wide(self, off: usize) -> u64 {
        u64::from(self.u32(off))
    }
}
