use std::collections::HashMap;
use std::collections::VecDeque;

use super::types::Batch;
use super::types::EntryRecord;
use super::types::HistoryPoint;
use super::types::MetricsRecord;
use super::types::RawSnapshot;
use super::types::SnapshotRecord;
use super::types::SnapshotView;
use crate::constants::HISTORY_WINDOW;
use crate::constants::ROLLUP_CHAIN;
use crate::constants::TOP_N;
use crate::core::types::Address;
use crate::core::types::Balance;
use crate::core::types::SnapshotID;
use crate::error::Result;
use crate::utils::to_f64;

mod churn;
mod concentration;
mod flows;
mod ranks;
mod trends;

pub struct Parser {
    cache: ParserCache,
}

/// Prior state a snapshot is compared against.
#[derive(Debug, Default)]
pub struct ParserCache {
    /// Immediately preceding snapshot of the same chain
    pub previous: Option<SnapshotView>,
    /// Latest snapshot of the same chain dated before the snapshot's date
    pub day_baseline: Option<SnapshotView>,
    /// Prior entries of the snapshot's addresses, oldest first
    pub histories: HashMap<Address, Vec<HistoryPoint>>,
}

impl Parser {
    pub fn new(cache: ParserCache) -> Self {
        Self { cache }
    }

    /// Create a batch from a raw snapshot.
    pub fn extract_batch(&self, raw: &RawSnapshot) -> Result<Batch> {
        let ranked = ranks::rank(&raw.holders)?;
        let total: Balance = ranked.iter().map(|h| h.balance).sum();

        let entries: Vec<EntryRecord> = ranked
            .iter()
            .map(|h| {
                let history = self
                    .cache
                    .histories
                    .get(&h.address)
                    .map(|v| v.as_slice())
                    .unwrap_or(&[]);
                trends::annotate(h, &total, history)
            })
            .collect();

        let metrics = self.derive_metrics(&entries, &total);

        let daily_summary = if raw.chain == ROLLUP_CHAIN {
            Some(churn::daily_summary(
                raw.date,
                &entries,
                self.cache.day_baseline.as_ref(),
            ))
        } else {
            None
        };

        Ok(Batch {
            snapshot: SnapshotRecord {
                key: raw.key(),
                fetched_at: raw.fetched_at,
                total_balance: total,
                entry_count: entries.len() as i32,
            },
            entries,
            metrics,
            daily_summary,
        })
    }

    fn derive_metrics(&self, entries: &[EntryRecord], total: &Balance) -> MetricsRecord {
        let previous = self.cache.previous.as_ref();
        let balances: Vec<f64> = entries.iter().map(|e| to_f64(&e.balance)).collect();
        let [top10, top20, top50] = TOP_N.map(|k| concentration::top_share_pct(&balances, k));
        let flows = flows::derive(entries, total, previous);
        let (new_entry_count, dropout_count) = churn::churn(entries, previous);
        let whale_activity_index = flows::whale_activity_index(
            flows.net_flow.as_ref(),
            previous.map(|p| &p.total_balance),
            flows.active_wallets,
            entries.len(),
            flows.avg_rank_change,
        );
        MetricsRecord {
            gini: concentration::gini(&balances),
            hhi: concentration::hhi(&balances),
            top10_pct: top10,
            top20_pct: top20,
            top50_pct: top50,
            net_flow: flows.net_flow,
            total_inflow: flows.total_inflow,
            total_outflow: flows.total_outflow,
            whale_activity_index,
            active_wallets: flows.active_wallets,
            avg_rank_change: flows.avg_rank_change,
            avg_balance_change_pct: flows.avg_balance_change_pct,
            new_entry_count,
            dropout_count,
        }
    }
}

/// In-memory state for replaying the snapshots of one chain in order.
///
/// Mirrors what the store would return for each snapshot, without
/// querying it between snapshots.
#[derive(Debug, Default)]
pub struct Replay {
    histories: HashMap<Address, VecDeque<HistoryPoint>>,
    previous: Option<SnapshotView>,
    day_baseline: Option<SnapshotView>,
    current_date: Option<time::Date>,
}

impl Replay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser cache for the next snapshot.
    ///
    /// Snapshots must be passed in (date, time_slot) order.
    pub fn cache_for(&mut self, raw: &RawSnapshot) -> ParserCache {
        if self.current_date != Some(raw.date) {
            self.day_baseline = self.previous.clone();
            self.current_date = Some(raw.date);
        }
        let histories = raw
            .holders
            .iter()
            .filter_map(|h| {
                self.histories
                    .get(&h.address)
                    .map(|points| (h.address.clone(), points.iter().cloned().collect()))
            })
            .collect();
        ParserCache {
            previous: self.previous.clone(),
            day_baseline: self.day_baseline.clone(),
            histories,
        }
    }

    /// Record a parsed snapshot so it becomes history for the next ones.
    pub fn push(&mut self, id: SnapshotID, batch: &Batch) {
        for entry in &batch.entries {
            let points = self.histories.entry(entry.address.clone()).or_default();
            points.push_back(HistoryPoint::from(entry));
            while points.len() > HISTORY_WINDOW - 1 {
                points.pop_front();
            }
        }
        self.previous = Some(SnapshotView {
            id,
            total_balance: batch.snapshot.total_balance,
            balances: batch
                .entries
                .iter()
                .map(|e| (e.address.clone(), e.balance))
                .collect(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::AddressChange;
    use super::super::types::RawHolder;
    use super::*;
    use crate::core::types::Chain;
    use crate::core::types::TimeSlot;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use time::macros::date;
    use time::macros::datetime;

    fn raw(date: time::Date, slot: &str, chain: Chain, holders: Vec<RawHolder>) -> RawSnapshot {
        RawSnapshot {
            date,
            time_slot: TimeSlot::try_from(slot.to_owned()).unwrap(),
            chain,
            fetched_at: datetime!(2024-03-01 08:00 UTC),
            holders,
        }
    }

    fn entry<'a>(batch: &'a Batch, address: &str) -> &'a EntryRecord {
        batch
            .entries
            .iter()
            .find(|e| e.address == address)
            .unwrap()
    }

    fn replay(snapshots: &[RawSnapshot]) -> Vec<Batch> {
        let mut replay = Replay::new();
        snapshots
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let parser = Parser::new(replay.cache_for(raw));
                let batch = parser.extract_batch(raw).unwrap();
                replay.push(i as SnapshotID + 1, &batch);
                batch
            })
            .collect()
    }

    #[test]
    fn test_first_snapshot() {
        let snapshot = raw(
            date!(2024 - 03 - 01),
            "08:00",
            Chain::Mainchain,
            vec![
                RawHolder::new("b", dec!(25)),
                RawHolder::new("a", dec!(75)),
            ],
        );
        let batch = Parser::new(ParserCache::default())
            .extract_batch(&snapshot)
            .unwrap();
        assert_eq!(batch.snapshot.total_balance, dec!(100));
        assert_eq!(batch.snapshot.entry_count, 2);
        assert_eq!(batch.entries[0].address, "a");
        assert_eq!(batch.entries[0].percentage, 75.0);
        assert_eq!(batch.metrics.net_flow, None);
        assert_eq!(batch.metrics.new_entry_count, 0);
        assert_eq!(batch.metrics.dropout_count, 0);
        assert_eq!(batch.metrics.top10_pct, 100.0);
        assert_eq!(batch.metrics.whale_activity_index, 0.0);
        let summary = batch.daily_summary.unwrap();
        assert_eq!(summary.new_entries, 0);
        assert_eq!(summary.biggest_gainer, None);
    }

    #[test]
    fn test_invalid_snapshot_is_rejected() {
        let snapshot = raw(date!(2024 - 03 - 01), "08:00", Chain::Mainchain, vec![]);
        let res = Parser::new(ParserCache::default()).extract_batch(&snapshot);
        assert!(matches!(res, Err(Error::InvalidSnapshot(_))));
    }

    #[test]
    fn test_side_chain_has_no_daily_summary() {
        let snapshot = raw(
            date!(2024 - 03 - 01),
            "08:00",
            Chain::Esc,
            vec![RawHolder::new("0xabc", dec!(10))],
        );
        let batch = Parser::new(ParserCache::default())
            .extract_batch(&snapshot)
            .unwrap();
        assert!(batch.daily_summary.is_none());
    }

    #[test]
    fn test_replay() {
        let snapshots = vec![
            raw(
                date!(2024 - 03 - 01),
                "08:00",
                Chain::Mainchain,
                vec![
                    RawHolder::new("a", dec!(100)),
                    RawHolder::new("b", dec!(50)),
                    RawHolder::new("c", dec!(10)),
                ],
            ),
            raw(
                date!(2024 - 03 - 01),
                "20:00",
                Chain::Mainchain,
                vec![
                    RawHolder::new("a", dec!(100)),
                    RawHolder::new("b", dec!(120)),
                    RawHolder::new("d", dec!(30)),
                ],
            ),
            raw(
                date!(2024 - 03 - 02),
                "08:00",
                Chain::Mainchain,
                vec![
                    RawHolder::new("a", dec!(90)),
                    RawHolder::new("b", dec!(130)),
                    RawHolder::new("c", dec!(5)),
                    RawHolder::new("d", dec!(30)),
                ],
            ),
        ];
        let batches = replay(&snapshots);

        // Second snapshot, same day
        let second = &batches[1];
        let b = entry(second, "b");
        assert_eq!(b.rank, 1);
        assert_eq!(b.prev_rank, Some(2));
        assert_eq!(b.rank_change, Some(1));
        assert_eq!(b.balance_change, Some(dec!(70)));
        assert_eq!(b.rank_streak, Some(1));
        assert_eq!(b.balance_streak, Some(1));
        let a = entry(second, "a");
        assert_eq!(a.rank_change, Some(-1));
        assert_eq!(a.balance_streak, Some(0));
        assert_eq!(entry(second, "d").prev_rank, None);
        assert_eq!(second.metrics.net_flow, Some(dec!(90)));
        assert_eq!(second.metrics.new_entry_count, 1);
        assert_eq!(second.metrics.dropout_count, 1);
        // No snapshot from an earlier day yet
        let summary = second.daily_summary.as_ref().unwrap();
        assert_eq!(summary.new_entries, 0);
        assert_eq!(summary.dropouts, 0);

        // Third snapshot, next day
        let third = &batches[2];
        let c = entry(third, "c");
        assert_eq!(c.rank, 4);
        assert_eq!(c.prev_rank, Some(3));
        assert_eq!(c.balance_change, Some(dec!(-5)));
        let b = entry(third, "b");
        assert_eq!(b.rank_streak, Some(0));
        assert_eq!(b.balance_streak, Some(2));
        assert_eq!(third.metrics.net_flow, Some(dec!(5)));
        assert_eq!(third.metrics.new_entry_count, 1);
        assert_eq!(third.metrics.dropout_count, 0);
        let summary = third.daily_summary.as_ref().unwrap();
        assert_eq!(summary.date, date!(2024 - 03 - 02));
        assert_eq!(summary.new_entries, 1);
        assert_eq!(summary.dropouts, 0);
        assert_eq!(
            summary.biggest_gainer,
            Some(AddressChange {
                address: "b".to_owned(),
                change: dec!(10)
            })
        );
        assert_eq!(
            summary.biggest_loser,
            Some(AddressChange {
                address: "a".to_owned(),
                change: dec!(-10)
            })
        );
    }

    #[test]
    fn test_replay_history_is_capped() {
        let snapshots: Vec<RawSnapshot> = (0..HISTORY_WINDOW as i64 + 5)
            .map(|day| {
                raw(
                    date!(2024 - 01 - 01) + time::Duration::days(day),
                    "08:00",
                    Chain::Mainchain,
                    vec![RawHolder::new("a", dec!(10))],
                )
            })
            .collect();
        let mut replay = Replay::new();
        for (i, snapshot) in snapshots.iter().enumerate() {
            let batch = Parser::new(replay.cache_for(snapshot))
                .extract_batch(snapshot)
                .unwrap();
            replay.push(i as SnapshotID, &batch);
        }
        assert_eq!(replay.histories["a"].len(), HISTORY_WINDOW - 1);
    }
}
