//! Error types surfaced by fallible constructors and growth operations.
//!
//! Lookups never fail: a missing key is an end cursor, `None`, or a zero
//! count. The only runtime failure is the allocator refusing a new bucket
//! array, reported as [`TryReserveError`] with the table left untouched.

pub use hashbrown::TryReserveError;

/// Rejected [`TableConfig`](crate::TableConfig) values.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The maximum load factor must be finite and strictly positive.
    #[error("max load factor must be finite and greater than zero, got {0}")]
    InvalidLoadFactor(f32),
    /// The growth factor must be finite and strictly greater than one,
    /// otherwise automatic growth could stall.
    #[error("growth factor must be finite and greater than one, got {0}")]
    InvalidGrowthFactor(f32),
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("bucket array allocation failed: {0:?}")]
    Alloc(TryReserveError),
}

impl From<TryReserveError> for Error {
    fn from(e: TryReserveError) -> Self {
        Error::Alloc(e)
    }
}

/// Converts a growth failure into the abort/panic behaviour of the
/// standard collections, for the infallible entry points.
pub(crate) fn infallible<T>(res: Result<T, TryReserveError>) -> T {
    match res {
        Ok(v) => v,
        Err(TryReserveError::CapacityOverflow) => panic!("hash table capacity overflow"),
        Err(TryReserveError::AllocError { layout }) => std::alloc::handle_alloc_error(layout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_messages() {
        let e = ConfigError::InvalidLoadFactor(0.0);
        assert_eq!(
            e.to_string(),
            "max load factor must be finite and greater than zero, got 0"
        );
        let e: Error = ConfigError::InvalidGrowthFactor(1.0).into();
        assert_eq!(
            e.to_string(),
            "growth factor must be finite and greater than one, got 1"
        );
    }

    #[test]
    fn alloc_error_wraps_reserve_error() {
        let e: Error = TryReserveError::CapacityOverflow.into();
        assert_eq!(e, Error::Alloc(TryReserveError::CapacityOverflow));
        assert!(e.to_string().contains("CapacityOverflow"));
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn infallible_panics_on_overflow() {
        let _: () = infallible(Err(TryReserveError::CapacityOverflow));
    }
}
