//! Configuration records passed explicitly into constructors.
//!
//! There are no process-wide mutable defaults: the executor and the envelope
//! codec each take their configuration by value, so two archives in the same
//! process can run with different padding or KDF settings.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Minimum PBKDF2 round count accepted when sealing an envelope.
///
/// Lower values in an [`EnvelopeConfig`] are clamped up to this floor.
/// Envelopes sealed elsewhere with fewer rounds still open.
pub const MIN_KDF_ROUNDS: u32 = 250_000;

/// Default number of history lines above which a save will flatten first.
pub const DEFAULT_FLATTEN_THRESHOLD: usize = 1_000;

/// Configuration for the command executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Insert one `pad` line after every `padding_cadence` executed commands
    /// to obscure the correlation between payload size and operation count.
    /// `None` disables padding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_cadence: Option<NonZeroU32>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            padding_cadence: NonZeroU32::new(1),
        }
    }
}

impl ExecutorConfig {
    /// Configuration with padding disabled. Useful for tests and for hosts
    /// that compact aggressively anyway.
    pub fn without_padding() -> Self {
        Self {
            padding_cadence: None,
        }
    }
}

/// Configuration for envelope sealing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    /// PBKDF2-HMAC-SHA256 round count. Clamped to [`MIN_KDF_ROUNDS`] when
    /// sealing.
    pub kdf_rounds: u32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            kdf_rounds: MIN_KDF_ROUNDS,
        }
    }
}

impl EnvelopeConfig {
    /// Effective round count after applying the floor.
    pub fn effective_rounds(&self) -> u32 {
        self.kdf_rounds.max(MIN_KDF_ROUNDS)
    }
}
