use crate::risk::{Factor, FactorMetadata};
use crate::state::TabState;

pub const HIGH_TRANSFER_BYTES: u64 = 10_000_000;
pub const ELEVATED_TRANSFER_BYTES: u64 = 5_000_000;

/// Data transferred: 20 points above 10 MB sent+received, 10 above 5 MB.
pub struct TransferFactor;

impl Factor for TransferFactor {
    fn metadata(&self) -> FactorMetadata {
        FactorMetadata {
            id: "TRANSFER".into(),
            name: "Data transferred".into(),
            description: "Bytes sent plus received above 5,000,000 / 10,000,000".into(),
            cap: 20.0,
        }
    }

    fn contribution(&self, state: &TabState) -> f64 {
        let total = state.data_transferred();
        if total > HIGH_TRANSFER_BYTES {
            20.0
        } else if total > ELEVATED_TRANSFER_BYTES {
            10.0
        } else {
            0.0
        }
    }
}
