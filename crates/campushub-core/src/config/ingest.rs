//! Bulk upload pipeline configuration.

use serde::{Deserialize, Serialize};

/// Settings for the row ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Largest accepted upload, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: usize,
    /// Attempts per row when the store reports a transient failure.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    /// Delay before the first retry; doubles on each further attempt.
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
    /// Consecutive rows failing with storage errors before the job aborts.
    #[serde(default = "default_systemic_failure_threshold")]
    pub systemic_failure_threshold: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay(),
            systemic_failure_threshold: default_systemic_failure_threshold(),
        }
    }
}

fn default_max_file_size() -> usize {
    10 * 1024 * 1024
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay() -> u64 {
    100
}

fn default_systemic_failure_threshold() -> u32 {
    5
}
