//! Message size and shape limits.

use serde::{Deserialize, Serialize};

/// Limits applied while reading one response message.
///
/// Handed to the tokenizer when a message is opened and enforced again by
/// the reader for the structure it assembles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageQuotas {
    /// Upper bound for a raw value body, in bytes.
    pub max_received_message_size: u64,
    /// Deepest allowed entry/feed nesting.
    pub max_nesting_depth: usize,
    /// Top-level parts in a batch; a changeset counts as one part.
    pub max_parts_per_batch: usize,
    pub max_operations_per_changeset: usize,
}

impl Default for MessageQuotas {
    fn default() -> Self {
        Self {
            // Services routinely return large feeds; match the widest limit
            // a 32-bit length prefix allows.
            max_received_message_size: i32::MAX.unsigned_abs().into(),
            max_nesting_depth: 100,
            max_parts_per_batch: 100,
            max_operations_per_changeset: 1000,
        }
    }
}
