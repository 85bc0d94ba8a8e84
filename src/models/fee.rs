use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which rate of a fee schedule applies to an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeSlot {
    /// Earlier order of a match
    Maker,
    /// Later order of a match
    Taker,
}

impl FeeSlot {
    pub fn for_maker(maker: bool) -> Self {
        if maker {
            FeeSlot::Maker
        } else {
            FeeSlot::Taker
        }
    }
}

/// Maker/taker rates of one schedule row for one pair
///
/// Rates are percentages: `0.1` means 0.1%. A missing rate on a custom row
/// falls back to the default schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeRates {
    pub maker: Option<Decimal>,
    pub taker: Option<Decimal>,
}

impl FeeRates {
    pub fn new(maker: Decimal, taker: Decimal) -> Self {
        Self {
            maker: Some(maker),
            taker: Some(taker),
        }
    }

    pub fn rate(&self, slot: FeeSlot) -> Option<Decimal> {
        match slot {
            FeeSlot::Maker => self.maker,
            FeeSlot::Taker => self.taker,
        }
    }
}
