//! Limits applied while parsing format strings.

/// Bounds enforced when a format string is parsed.
///
/// Formats are normally static declarations, so these exist mainly to keep
/// formats assembled at runtime (or fuzzed) from describing absurd layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatLimits {
    /// Maximum `N` in an `N<scalar>` repetition.
    pub max_repeat: usize,
    /// Maximum total bits in one bitfield group.
    pub max_group_bits: usize,
    /// Maximum number of top-level tokens.
    pub max_ops: usize,
}

impl Default for FormatLimits {
    fn default() -> Self {
        Self {
            max_repeat: 64 * 1024,
            max_group_bits: 512,
            max_ops: 1024,
        }
    }
}

impl FormatLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_repeat: 64,
            max_group_bits: 64,
            max_ops: 32,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_repeat: usize::MAX,
            max_group_bits: usize::MAX,
            max_ops: usize::MAX,
        }
    }
}
