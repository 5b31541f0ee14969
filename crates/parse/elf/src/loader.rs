//! Byte sources for ELF images.
//!
//! The object model never touches a file directly. It asks a [`Loader`] for
//! `(offset, len)` ranges and receives [`Region`]s: owned, reference-counted
//! views that keep their backing storage alive. Because a region owns a
//! share of its storage, the model can cache regions next to the headers
//! they were loaded for without borrowing from the loader.
//!
//! Two loaders ship with the crate: [`MemoryLoader`] over an in-memory
//! buffer and, with the `mmap` feature, [`MmapLoader`] over a memory-mapped
//! file.

use std::fmt;
use std::ops::{Deref, Range};
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

/// Errors a [`Loader`] can report.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The requested range is not inside the image.
    #[error("range {offset:#x}+{len:#x} is outside the {size}-byte image")]
    OutOfBounds {
        /// Requested start offset.
        offset: u64,
        /// Requested length.
        len: u64,
        /// Size of the addressed storage.
        size: u64,
    },
    /// Reading the backing store failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supplies byte ranges of an ELF image.
///
/// Implementations must return exactly `len` bytes starting at `offset`, or
/// an error. A returned [`Region`] stays valid for as long as it is held.
pub trait Loader: Send + Sync {
    /// Loads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the range cannot be supplied.
    fn load(&self, offset: u64, len: u64) -> Result<Region, LoadError>;
}

/// Contiguous storage a [`Region`] can view.
pub trait Storage: Send + Sync + 'static {
    /// Returns the stored bytes.
    fn as_bytes(&self) -> &[u8];
}

impl Storage for Vec<u8> {
    fn as_bytes(&self) -> &[u8] {
        self
    }
}

impl Storage for Box<[u8]> {
    fn as_bytes(&self) -> &[u8] {
        self
    }
}

impl Storage for &'static [u8] {
    fn as_bytes(&self) -> &[u8] {
        self
    }
}

#[cfg(feature = "mmap")]
impl Storage for memmap2::Mmap {
    fn as_bytes(&self) -> &[u8] {
        self
    }
}

/// A shared, read-only view of a loaded byte range.
///
/// Cloning is cheap: clones share the same storage.
#[derive(Clone)]
pub struct Region {
    storage: Arc<dyn Storage>,
    range: Range<usize>,
}

impl Region {
    /// Creates a region covering all of `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let len = storage.as_bytes().len();
        Self {
            storage,
            range: 0..len,
        }
    }

    /// Returns the sub-region `[offset, offset + len)` of this region.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::OutOfBounds`] if the range does not fit.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "offset and end are bounded by the region length"
    )]
    pub fn slice(&self, offset: u64, len: u64) -> Result<Self, LoadError> {
        let size = self.len() as u64;
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= size)
            .ok_or(LoadError::OutOfBounds { offset, len, size })?;
        let start = self.range.start + offset as usize;
        Ok(Self {
            storage: Arc::clone(&self.storage),
            range: start..self.range.start + end as usize,
        })
    }

    /// Returns the viewed bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage.as_bytes()[self.range.clone()]
    }
}

impl Deref for Region {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for Region {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

/// A loader over an image held in memory.
#[derive(Clone, Debug)]
pub struct MemoryLoader {
    image: Region,
}

impl MemoryLoader {
    /// Creates a loader that owns `bytes`.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            image: Region::new(Arc::new(bytes.into())),
        }
    }

    /// Creates a loader over a static buffer without copying it.
    #[must_use]
    pub fn from_static(bytes: &'static [u8]) -> Self {
        Self {
            image: Region::new(Arc::new(bytes)),
        }
    }

    /// Reads the whole file at `path` into memory.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] if the file cannot be read.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Ok(Self::new(std::fs::read(path)?))
    }

    /// Returns the image size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.image.len()
    }

    /// Returns `true` if the image is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }
}

impl Loader for MemoryLoader {
    fn load(&self, offset: u64, len: u64) -> Result<Region, LoadError> {
        self.image.slice(offset, len)
    }
}

/// A loader over a memory-mapped file.
#[cfg(feature = "mmap")]
#[derive(Clone, Debug)]
pub struct MmapLoader {
    image: Region,
}

#[cfg(feature = "mmap")]
impl MmapLoader {
    /// Maps the file at `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] if the file cannot be opened or mapped.
    #[allow(unsafe_code)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let file = std::fs::File::open(path)?;
        // SAFETY: the mapping is read-only and never handed out mutably.
        // Truncating the file underneath a live mapping is outside what this
        // crate can guard against, as with any mmap-backed reader.
        let map = unsafe { memmap2::Mmap::map(&file)? };
        Ok(Self {
            image: Region::new(Arc::new(map)),
        })
    }

    /// Returns the mapped size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.image.len()
    }

    /// Returns `true` if the mapped file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }
}

#[cfg(feature = "mmap")]
impl Loader for MmapLoader {
    fn load(&self, offset: u64, len: u64) -> Result<Region, LoadError> {
        self.image.slice(offset, len)
    }
}
