//! Export options and configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of write attempts.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default pause between write attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Options for exporting a draft.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// How often and how patiently to retry the destination write
    pub retry: RetryPolicy,

    /// How the destination file is replaced
    pub write_strategy: WriteStrategy,

    /// Whether to draw the "Form Data:" block on page one
    pub text_overlay: TextOverlayMode,
}

impl ExportOptions {
    /// Create new export options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the write strategy.
    pub fn with_write_strategy(mut self, strategy: WriteStrategy) -> Self {
        self.write_strategy = strategy;
        self
    }

    /// Write to a temporary sibling and rename it over the destination.
    pub fn atomic(mut self) -> Self {
        self.write_strategy = WriteStrategy::AtomicRename;
        self
    }

    /// Enable or disable the text overlay.
    pub fn with_text_overlay(mut self, enabled: bool) -> Self {
        self.text_overlay = if enabled {
            TextOverlayMode::Draw
        } else {
            TextOverlayMode::Skip
        };
        self
    }

    /// Whether the text overlay will be drawn.
    pub fn draws_text_overlay(&self) -> bool {
        self.text_overlay == TextOverlayMode::Draw
    }
}

/// Whether the answer dump is stamped on page one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextOverlayMode {
    /// Draw every answer (default)
    #[default]
    Draw,
    /// Leave page one as filled
    Skip,
}

/// How the destination file is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStrategy {
    /// Delete any existing file, then write the new bytes (default)
    #[default]
    ReplaceInPlace,
    /// Write a temporary sibling file, then rename it over the destination
    AtomicRename,
}

/// Bounded retry of the destination write.
///
/// Serialized as `{ "maxRetries": 5, "delayMs": 100 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Total number of attempts; zero still makes one attempt
    pub max_retries: u32,

    /// Pause between attempts
    #[serde(rename = "delayMs", with = "millis")]
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create a retry policy.
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Number of attempts actually made.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(delay.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
