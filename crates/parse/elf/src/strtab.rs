//! NUL-terminated string tables.

use crate::error::{ElfError, Result};

/// A zero-copy view over the payload of a `SHT_STRTAB` section.
///
/// Strings are addressed by byte offset from the start of the section and
/// run up to the next NUL. Offset 0 conventionally holds the empty string.
/// The view does no caching of its own.
#[derive(Debug, Clone, Copy)]
pub struct StringTable<'a> {
    data: &'a [u8],
}

impl<'a> StringTable<'a> {
    /// Creates a string table over raw section data.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Returns the bytes of the string at `offset`, terminator excluded.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::StringOffsetOutOfRange`] if `offset` is at or past
    /// the end of the table, and [`ElfError::UnterminatedString`] if no NUL
    /// follows before the end.
    pub fn get_bytes(&self, offset: u64) -> Result<&'a [u8]> {
        let remaining = usize::try_from(offset)
            .ok()
            .and_then(|start| self.data.get(start..))
            .filter(|rest| !rest.is_empty())
            .ok_or(ElfError::StringOffsetOutOfRange {
                offset,
                size: self.data.len(),
            })?;
        let nul_pos = remaining
            .iter()
            .position(|&b| b == 0)
            .ok_or(ElfError::UnterminatedString { offset })?;
        Ok(&remaining[..nul_pos])
    }

    /// Returns the string at `offset`. Its length is the slice length.
    ///
    /// # Errors
    ///
    /// Same as [`get_bytes`](Self::get_bytes), plus
    /// [`ElfError::InvalidUtf8`] if the bytes are not UTF-8.
    pub fn get(&self, offset: u64) -> Result<&'a str> {
        let bytes = self.get_bytes(offset)?;
        core::str::from_utf8(bytes).map_err(|_| ElfError::InvalidUtf8 { offset })
    }

    /// Returns an owned copy of the string at `offset`.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn get_owned(&self, offset: u64) -> Result<String> {
        self.get(offset).map(str::to_owned)
    }

    /// Returns the raw table bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the table size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the table holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
