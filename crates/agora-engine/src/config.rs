//! Engine configuration.
//!
//! Deserialized from the `engine` section of `agora-config.yaml`. Every
//! field has a default so an absent section yields a working engine.

use std::time::Duration;

use serde::Deserialize;

use crate::ids::IdProviderKind;
use crate::karma::VoteAckPolicy;

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Bounded capacity of the engine mailbox.
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    /// How long callers wait for the readiness acknowledgment.
    #[serde(default = "default_readiness_timeout_ms")]
    pub readiness_timeout_ms: u64,

    /// Number of success responses sent per vote.
    #[serde(default)]
    pub vote_ack: VoteAckPolicy,

    /// Identifier provider used for posts and comments.
    #[serde(default)]
    pub id_provider: IdProviderKind,

    /// High 64 bits of sequential identifiers.
    #[serde(default = "default_node_tag")]
    pub node_tag: u64,
}

impl EngineConfig {
    /// Readiness wait as a [`Duration`].
    pub const fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: default_mailbox_capacity(),
            readiness_timeout_ms: default_readiness_timeout_ms(),
            vote_ack: VoteAckPolicy::default(),
            id_provider: IdProviderKind::default(),
            node_tag: default_node_tag(),
        }
    }
}

const fn default_mailbox_capacity() -> usize {
    1024
}

const fn default_readiness_timeout_ms() -> u64 {
    5000
}

const fn default_node_tag() -> u64 {
    1
}
