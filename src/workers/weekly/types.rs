use crate::core::types::Address;
use crate::core::types::Balance;
use crate::core::types::SnapshotID;
use crate::workers::snapshots::types::AddressChange;

/// Stored data of the roll-up chain needed to summarize one week.
#[derive(Debug, Default)]
pub struct WeekData {
    /// Snapshots within the week, oldest first
    pub snapshots: Vec<WeekSnapshot>,
    /// Addresses of the last snapshot before the week, if any
    pub before: Option<Vec<Address>>,
}

#[derive(Debug, Clone)]
pub struct WeekSnapshot {
    pub id: SnapshotID,
    pub total_balance: Balance,
    pub gini: f64,
    pub net_flow: Option<Balance>,
    pub whale_activity_index: f64,
    pub entries: Vec<WeekEntry>,
}

#[derive(Debug, Clone)]
pub struct WeekEntry {
    pub address: Address,
    pub balance_change: Option<Balance>,
    pub rank_volatility: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklySummaryRecord {
    pub week_start: time::Date,
    pub week_end: time::Date,
    pub gini_start: f64,
    pub gini_end: f64,
    pub gini_change: f64,
    pub total_balance_start: Balance,
    pub total_balance_end: Balance,
    pub net_flow: Balance,
    pub avg_whale_activity: f64,
    pub new_entries: i32,
    pub dropouts: i32,
    pub top_accumulator: Option<AddressChange>,
    pub top_distributor: Option<AddressChange>,
    pub avg_rank_volatility: Option<f64>,
    pub snapshot_count: i32,
}
