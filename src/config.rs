use core::time::Duration;

const COMMAND_TIMEOUT_MS: u64 = 5_000;
const DELIVERY_TIMEOUT_MS: u64 = 60_000;
const RESET_TIMEOUT_MS: u64 = 5_000;
const SCAN_SETTLE_MS: u64 = 250;

/// Engine configuration
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// How long a command waits for its response frame
    pub command_timeout: Duration,
    /// How long a confirmed transmit waits for the delivery status frame
    pub delivery_timeout: Duration,
    /// How long `init` waits for the module to come out of a hardware reset
    pub reset_timeout: Duration,
    /// Pause between the network reset and the active scan request
    pub scan_settle: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_millis(COMMAND_TIMEOUT_MS),
            delivery_timeout: Duration::from_millis(DELIVERY_TIMEOUT_MS),
            reset_timeout: Duration::from_millis(RESET_TIMEOUT_MS),
            scan_settle: Duration::from_millis(SCAN_SETTLE_MS),
        }
    }
}
