//! Error types for ELF parsing.
//!
//! Every failure is an [`ElfError`]. Callers that only care about the broad
//! category (malformed input, wrong section type, out-of-range offset, or a
//! loader failure) can branch on [`ElfError::kind`].

use thiserror::Error;

use crate::loader::LoadError;
use crate::section::SectionType;

/// Broad category of an [`ElfError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input bytes violate the ELF format's structural invariants.
    Format,
    /// A type-specific view was requested on a section of another type.
    TypeMismatch,
    /// A requested offset lies outside the addressed buffer.
    Range,
    /// The byte source failed to supply a requested range.
    Load,
}

/// Errors that can occur when reading an ELF image.
#[derive(Debug, Error)]
pub enum ElfError {
    /// The image does not start with `\x7fELF`.
    #[error("bad ELF magic number")]
    BadMagic,
    /// The identification version byte (`EI_VERSION`) is not 1.
    #[error("unknown ELF identification version {0}")]
    BadIdentVersion(u8),
    /// The class byte (`EI_CLASS`) is neither 32-bit nor 64-bit.
    #[error("bad ELF class {0}")]
    BadClass(u8),
    /// The data encoding byte (`EI_DATA`) is neither LSB nor MSB.
    #[error("bad ELF data encoding {0}")]
    BadDataEncoding(u8),
    /// The file header's `e_version` is not 1.
    #[error("bad ELF version {0}")]
    BadVersion(u32),
    /// The section name string table index does not name a section.
    #[error("bad section name string table index {index} ({count} sections)")]
    BadStringTableIndex {
        /// Resolved `e_shstrndx`.
        index: u64,
        /// Resolved section count.
        count: u64,
    },
    /// Section header entries are too small to hold a section header.
    #[error("section header entry size {found} is smaller than {required}")]
    BadSectionEntrySize {
        /// `e_shentsize` from the file header.
        found: u16,
        /// Raw section header size for the file's layout.
        required: usize,
    },
    /// The section count exceeds the configured limit.
    #[error("{count} sections exceeds the limit of {limit}")]
    TooManySections {
        /// Resolved section count.
        count: u64,
        /// [`ElfOptions::max_sections`](crate::ElfOptions::max_sections).
        limit: u64,
    },
    /// `e_shentsize * count` does not fit in 64 bits.
    #[error("section header table size overflows")]
    SectionTableOverflow,
    /// A string runs to the end of its table without a NUL terminator.
    #[error("unterminated string at offset {offset}")]
    UnterminatedString {
        /// Offset of the string's first byte.
        offset: u64,
    },
    /// A string is not valid UTF-8.
    #[error("string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 {
        /// Offset of the string's first byte.
        offset: u64,
    },
    /// A section was used as a type it is not.
    #[error("section {index} has type {found}, expected {expected}")]
    TypeMismatch {
        /// Index of the offending section.
        index: usize,
        /// Type the caller asked for.
        expected: SectionType,
        /// Type recorded in the section header.
        found: SectionType,
    },
    /// A string offset points at or past the end of its table.
    #[error("string offset {offset} exceeds section size {size}")]
    StringOffsetOutOfRange {
        /// Requested offset.
        offset: u64,
        /// Size of the string table in bytes.
        size: usize,
    },
    /// The loader could not supply a byte range.
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl ElfError {
    /// Returns the broad category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadMagic
            | Self::BadIdentVersion(_)
            | Self::BadClass(_)
            | Self::BadDataEncoding(_)
            | Self::BadVersion(_)
            | Self::BadStringTableIndex { .. }
            | Self::BadSectionEntrySize { .. }
            | Self::TooManySections { .. }
            | Self::SectionTableOverflow
            | Self::UnterminatedString { .. }
            | Self::InvalidUtf8 { .. } => ErrorKind::Format,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::StringOffsetOutOfRange { .. } => ErrorKind::Range,
            Self::Load(_) => ErrorKind::Load,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = ElfError> = core::result::Result<T, E>;
