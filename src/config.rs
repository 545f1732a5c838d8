//! TableConfig: construction parameters shared by the table and adapters.

use crate::error::ConfigError;
use crate::policy::PrimeRehashPolicy;

pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 1.0;
pub const DEFAULT_GROWTH_FACTOR: f32 = 2.0;

/// Construction parameters for a [`HashTable`](crate::HashTable).
///
/// `bucket_hint` is rounded up to the prime progression (hints of 0 and 1
/// give the one-bucket minimum). Values are checked by [`validate`] when
/// passed to a `with_config` constructor.
///
/// [`validate`]: TableConfig::validate
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TableConfig {
    pub bucket_hint: usize,
    pub max_load_factor: f32,
    pub growth_factor: f32,
}

impl TableConfig {
    pub const fn new() -> Self {
        Self {
            bucket_hint: 0,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }

    pub const fn with_bucket_hint(mut self, bucket_hint: usize) -> Self {
        self.bucket_hint = bucket_hint;
        self
    }

    pub const fn with_max_load_factor(mut self, max_load_factor: f32) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    pub const fn with_growth_factor(mut self, growth_factor: f32) -> Self {
        self.growth_factor = growth_factor;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_load_factor(self.max_load_factor)?;
        if !self.growth_factor.is_finite() || self.growth_factor <= 1.0 {
            return Err(ConfigError::InvalidGrowthFactor(self.growth_factor));
        }
        Ok(())
    }

    pub(crate) fn policy(&self) -> PrimeRehashPolicy {
        PrimeRehashPolicy::new(self.max_load_factor).with_growth_factor(self.growth_factor)
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn validate_load_factor(max_load_factor: f32) -> Result<(), ConfigError> {
    if max_load_factor.is_finite() && max_load_factor > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidLoadFactor(max_load_factor))
    }
}
