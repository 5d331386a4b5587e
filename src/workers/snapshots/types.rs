use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;

use crate::core::types::Address;
use crate::core::types::Balance;
use crate::core::types::Chain;
use crate::core::types::Rank;
use crate::core::types::SnapshotID;
use crate::core::types::SnapshotKey;
use crate::core::types::TimeSlot;
use crate::core::types::Trend;

/// Top-N holder list as delivered by the fetch job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSnapshot {
    pub date: time::Date,
    pub time_slot: TimeSlot,
    #[serde(default)]
    pub chain: Chain,
    #[serde(with = "time::serde::rfc3339")]
    pub fetched_at: time::OffsetDateTime,
    pub holders: Vec<RawHolder>,
}

impl RawSnapshot {
    pub fn key(&self) -> SnapshotKey {
        SnapshotKey::new(self.date, self.time_slot.clone(), self.chain)
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.holders.iter().map(|h| h.address.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHolder {
    pub address: Address,
    pub balance: Balance,
}

impl RawHolder {
    pub fn new(address: &str, balance: Balance) -> Self {
        Self {
            address: address.to_owned(),
            balance,
        }
    }
}

/// Result of an ingestion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// New snapshot stored with given id
    Ingested(SnapshotID),
    /// A snapshot for the same date, time slot and chain exists already
    Skipped,
}

/// A holder with its position in the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedHolder {
    pub rank: Rank,
    pub address: Address,
    pub balance: Balance,
}

/// An earlier entry of an address, as needed to annotate its next entry.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPoint {
    pub rank: Rank,
    pub balance: Balance,
    pub rank_streak: Option<i32>,
    pub balance_streak: Option<i32>,
}

impl HistoryPoint {
    pub fn new(rank: Rank, balance: Balance) -> Self {
        Self {
            rank,
            balance,
            rank_streak: None,
            balance_streak: None,
        }
    }
}

impl From<&EntryRecord> for HistoryPoint {
    fn from(entry: &EntryRecord) -> Self {
        Self {
            rank: entry.rank,
            balance: entry.balance,
            rank_streak: entry.rank_streak,
            balance_streak: entry.balance_streak,
        }
    }
}

/// Balances of an earlier snapshot, used as comparison baseline.
#[derive(Debug, Clone)]
pub struct SnapshotView {
    pub id: SnapshotID,
    pub total_balance: Balance,
    pub balances: HashMap<Address, Balance>,
}

pub struct Batch {
    pub snapshot: SnapshotRecord,
    pub entries: Vec<EntryRecord>,
    pub metrics: MetricsRecord,
    /// Only for snapshots of the roll-up chain
    pub daily_summary: Option<DailySummaryRecord>,
}

#[derive(Debug, Clone)]
pub struct SnapshotRecord {
    pub key: SnapshotKey,
    pub fetched_at: time::OffsetDateTime,
    pub total_balance: Balance,
    pub entry_count: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryRecord {
    pub rank: Rank,
    pub address: Address,
    pub balance: Balance,
    /// Share of snapshot total, in percent
    pub percentage: f64,
    pub prev_rank: Option<Rank>,
    /// Previous rank minus current rank, positive when moving up
    pub rank_change: Option<i32>,
    pub balance_change: Option<Balance>,
    pub rank_volatility: Option<f64>,
    pub balance_trend: Trend,
    pub rank_streak: Option<i32>,
    pub balance_streak: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRecord {
    pub gini: f64,
    pub hhi: f64,
    pub top10_pct: f64,
    pub top20_pct: f64,
    pub top50_pct: f64,
    pub net_flow: Option<Balance>,
    pub total_inflow: Balance,
    pub total_outflow: Balance,
    pub whale_activity_index: f64,
    pub active_wallets: i32,
    pub avg_rank_change: Option<f64>,
    pub avg_balance_change_pct: Option<f64>,
    pub new_entry_count: i32,
    pub dropout_count: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddressChange {
    pub address: Address,
    pub change: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailySummaryRecord {
    pub date: time::Date,
    pub new_entries: i32,
    pub dropouts: i32,
    pub biggest_gainer: Option<AddressChange>,
    pub biggest_loser: Option<AddressChange>,
}
