use serde::Deserialize;
use serde::Serialize;

use crate::core::types::Balance;
use crate::core::types::TimeSlot;

/// Cross-chain supply figures as delivered by the fetch job.
///
/// Missing top 100 totals are taken from the matching snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSupply {
    pub date: time::Date,
    pub time_slot: TimeSlot,
    #[serde(with = "time::serde::rfc3339")]
    pub fetched_at: time::OffsetDateTime,
    #[serde(default)]
    pub mainchain_top100: Option<Balance>,
    #[serde(default)]
    pub bridge_balance: Option<Balance>,
    #[serde(default)]
    pub esc_total_supply: Option<Balance>,
    #[serde(default)]
    pub esc_top100: Option<Balance>,
    #[serde(default)]
    pub eth_bridged_supply: Option<Balance>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupplyRecord {
    pub date: time::Date,
    pub time_slot: TimeSlot,
    pub mainchain_top100: Option<Balance>,
    pub bridge_balance: Option<Balance>,
    pub esc_total_supply: Option<Balance>,
    pub esc_top100: Option<Balance>,
    pub eth_bridged_supply: Option<Balance>,
    pub fetched_at: time::OffsetDateTime,
}

impl SupplyRecord {
    /// Record from raw figures, with fallbacks for the top 100 totals.
    pub fn new(raw: &RawSupply, mainchain_total: Option<Balance>, esc_total: Option<Balance>) -> Self {
        Self {
            date: raw.date,
            time_slot: raw.time_slot.clone(),
            mainchain_top100: raw.mainchain_top100.or(mainchain_total),
            bridge_balance: raw.bridge_balance,
            esc_total_supply: raw.esc_total_supply,
            esc_top100: raw.esc_top100.or(esc_total),
            eth_bridged_supply: raw.eth_bridged_supply,
            fetched_at: raw.fetched_at,
        }
    }
}
