//! Debug-only rehash epoch.
//!
//! Every rehash replaces the bucket array, which invalidates all cursors.
//! In debug builds the table counts its rehashes and stamps each cursor
//! with the count current at creation; using a cursor with an older stamp
//! panics. In release builds both types are zero-sized and the checks
//! compile away.

/// Per-table rehash counter. Embed in the table and call `advance` after
/// each bucket-array swap.
#[derive(Clone, Debug)]
pub(crate) struct DebugEpoch {
    #[cfg(debug_assertions)]
    current: u32,
}

impl DebugEpoch {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            current: 0,
        }
    }

    #[inline]
    pub(crate) fn stamp(&self) -> Stamp {
        Stamp {
            #[cfg(debug_assertions)]
            epoch: self.current,
        }
    }

    #[inline]
    pub(crate) fn advance(&mut self) {
        #[cfg(debug_assertions)]
        {
            self.current = self.current.wrapping_add(1);
        }
    }

    /// Panics in debug builds when `stamp` predates the last rehash.
    #[inline]
    pub(crate) fn check(&self, stamp: Stamp) {
        #[cfg(debug_assertions)]
        assert!(
            stamp.epoch == self.current,
            "cursor used after a rehash invalidated it"
        );
        #[cfg(not(debug_assertions))]
        let _ = stamp;
    }
}

impl Default for DebugEpoch {
    fn default() -> Self {
        Self::new()
    }
}

/// Epoch captured by a cursor.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Stamp {
    #[cfg(debug_assertions)]
    epoch: u32,
}
