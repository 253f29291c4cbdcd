//! Entropy-coding contexts derived alongside the candidate stack.

/// State of the zero-MV context. Only the first decision taken during the
/// temporal scan sticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ZeroMvContext {
    /// Temporal scanning ran but never reached a decision.
    #[default]
    Unset,
    /// Temporal candidates are disabled for the frame.
    Disabled,
    /// The block's first temporal sample position held no projection.
    TemporalUnavailable,
    /// Set by the first projected temporal candidate.
    Measured { large_deviation: bool },
}

impl ZeroMvContext {
    pub fn is_unset(self) -> bool {
        self == ZeroMvContext::Unset
    }

    /// The context index, once one has been decided.
    pub fn value(self) -> Option<u8> {
        match self {
            ZeroMvContext::Unset => None,
            ZeroMvContext::Disabled => Some(0),
            ZeroMvContext::TemporalUnavailable => Some(1),
            ZeroMvContext::Measured { large_deviation } => Some(large_deviation as u8),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MvContexts {
    pub new_mv: u8,
    pub reference_mv: u8,
    pub zero_mv: ZeroMvContext,
}

/// New-MV and reference-MV contexts from the scan outcome.
///
/// `nearest_matches` counts which of the adjacent row and column scans found
/// a match (0..=2); `total_matches` does the same over every spatial scan.
pub fn compute_contexts(found_new_mv: bool, nearest_matches: u8, total_matches: u8) -> (u8, u8) {
    debug_assert!(nearest_matches <= 2 && total_matches <= 2);
    match nearest_matches {
        0 => (total_matches.min(1), total_matches),
        1 => (3 - found_new_mv as u8, 2 + total_matches),
        _ => (5 - found_new_mv as u8, 5),
    }
}
