//! Handler configuration.
//!
//! Mirrors the settings the identity service reads at startup: where the
//! server private key lives, how its id is derived from the file name, and
//! how much clock skew verification tolerates.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::KeyLoadResult;
use crate::key_id::{key_id_from_path, KeyId, DEFAULT_PRIVATE_KEY_FILENAME_PATTERN};
use crate::keys::new_jwt_handler_with_options;
use crate::traits::Handler;
use crate::validation::ValidationOptions;

fn default_filename_pattern() -> String {
    DEFAULT_PRIVATE_KEY_FILENAME_PATTERN.to_owned()
}

/// Settings for building one handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// PEM file holding the server private key
    pub private_key_path: PathBuf,
    /// Regex applied to the key file name; the first capture is the key id
    #[serde(default = "default_filename_pattern")]
    pub private_key_filename_pattern: String,
    /// Clock skew tolerated on `exp` and `nbf`
    #[serde(default)]
    pub leeway_seconds: u64,
}

impl HandlerConfig {
    /// Config for the key at `path` with default pattern and no leeway
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            private_key_path: path.into(),
            private_key_filename_pattern: default_filename_pattern(),
            leeway_seconds: 0,
        }
    }

    /// Override the key file name pattern
    #[must_use]
    pub fn with_filename_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.private_key_filename_pattern = pattern.into();
        self
    }

    /// Override the verification leeway
    #[must_use]
    pub fn with_leeway_seconds(mut self, seconds: u64) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    /// Key file path
    pub fn private_key_path(&self) -> &Path {
        &self.private_key_path
    }

    /// Validation options implied by this config
    pub fn validation_options(&self) -> ValidationOptions {
        let leeway = i64::try_from(self.leeway_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or_else(TimeDelta::max_value);
        ValidationOptions::default().with_leeway(leeway)
    }

    /// Key id the configured file name resolves to
    pub fn key_id(&self) -> KeyId {
        key_id_from_path(self.private_key_path(), &self.private_key_filename_pattern)
    }

    /// Load the key and build its handler
    pub fn build(&self) -> KeyLoadResult<Arc<dyn Handler>> {
        new_jwt_handler_with_options(
            self.private_key_path(),
            &self.private_key_filename_pattern,
            self.validation_options(),
        )
    }
}
