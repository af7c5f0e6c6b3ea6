//! Configuration for the ledger and the proof station.

use serde::Deserialize;

/// How long a challenge may be answered, in seconds.
pub const DEFAULT_PROOF_WINDOW_SECS: u64 = 300;

/// Tag appended to every challenge message.
pub const DEFAULT_DOMAIN_TAG: &str = "starRegistry";

/// Body text of the genesis block.
pub const DEFAULT_GENESIS_BODY: &str = "Genesis block";

/// Configuration shared by the ledger, the proof station and the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Validity window of a challenge.
    pub proof_window_secs: u64,
    /// Domain tag embedded in challenge messages.
    pub domain_tag: String,
    /// Body of the genesis block written on first initialization.
    pub genesis_body: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            proof_window_secs: DEFAULT_PROOF_WINDOW_SECS,
            domain_tag: DEFAULT_DOMAIN_TAG.to_string(),
            genesis_body: DEFAULT_GENESIS_BODY.to_string(),
        }
    }
}

impl LedgerConfig {
    /// The proof window in milliseconds.
    pub fn proof_window_millis(&self) -> i64 {
        i64::try_from(self.proof_window_secs)
            .unwrap_or(i64::MAX / 1000)
            .saturating_mul(1000)
    }
}
