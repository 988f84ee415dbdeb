use crate::platform::{MediaConstraints, OfferOptions, RtcConfig};
use std::time::Duration;

/// Settings shared by the loopback call and the signaling router.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub rtc: RtcConfig,
    pub offer_options: OfferOptions,
    pub media: MediaConstraints,
    /// Upper bound for any single negotiation step.
    pub negotiation_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rtc: RtcConfig::default(),
            offer_options: OfferOptions::default(),
            media: MediaConstraints::default(),
            negotiation_timeout: Duration::from_secs(10),
        }
    }
}
