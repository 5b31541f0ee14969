//! Options controlling how a [`File`](crate::File) is opened.

/// Default upper bound on the number of section headers accepted at open.
pub const DEFAULT_MAX_SECTIONS: u64 = 1 << 20;

/// Options for [`File::open_with`](crate::File::open_with).
///
/// With the `serde` feature the options deserialize from any serde format;
/// missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct ElfOptions {
    /// Resolve every section name and load every payload while opening.
    ///
    /// Any failure then fails the open instead of a later accessor call.
    pub eager: bool,
    /// Reject files declaring more section headers than this.
    pub max_sections: u64,
}

impl Default for ElfOptions {
    fn default() -> Self {
        Self {
            eager: false,
            max_sections: DEFAULT_MAX_SECTIONS,
        }
    }
}
