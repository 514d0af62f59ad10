//! JWT validation options and configuration.

use chrono::Duration;

/// JWT validation options.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Leeway for time-based claims.
    pub leeway: Duration,
    /// Validate not-before.
    pub validate_nbf: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            leeway: Duration::zero(),
            validate_nbf: true,
        }
    }
}

impl ValidationOptions {
    /// Set the time leeway for validation.
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Set whether to validate not-before.
    #[must_use]
    pub fn validate_not_before(mut self, validate: bool) -> Self {
        self.validate_nbf = validate;
        self
    }

    /// Leeway in whole seconds, never negative.
    pub(crate) fn leeway_seconds(&self) -> i64 {
        self.leeway.num_seconds().max(0)
    }
}
