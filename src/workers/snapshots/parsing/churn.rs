use rust_decimal::Decimal;
use std::collections::HashSet;

use super::super::types::AddressChange;
use super::super::types::DailySummaryRecord;
use super::super::types::EntryRecord;
use super::super::types::SnapshotView;

/// Count of (new entries, dropouts) relative to an earlier snapshot.
///
/// Both are 0 when there is no earlier snapshot.
pub(super) fn churn(entries: &[EntryRecord], earlier: Option<&SnapshotView>) -> (i32, i32) {
    let earlier = match earlier {
        Some(view) => view,
        None => return (0, 0),
    };
    let current: HashSet<&str> = entries.iter().map(|e| e.address.as_str()).collect();
    let new_entries = entries
        .iter()
        .filter(|e| !earlier.balances.contains_key(&e.address))
        .count();
    let dropouts = earlier
        .balances
        .keys()
        .filter(|a| !current.contains(a.as_str()))
        .count();
    (new_entries as i32, dropouts as i32)
}

/// Summarize a snapshot against the day baseline.
///
/// Gainer and loser are limited to addresses present in both snapshots.
/// Equal changes go to the better ranked address.
pub(super) fn daily_summary(
    date: time::Date,
    entries: &[EntryRecord],
    baseline: Option<&SnapshotView>,
) -> DailySummaryRecord {
    let (new_entries, dropouts) = churn(entries, baseline);
    let mut biggest_gainer: Option<AddressChange> = None;
    let mut biggest_loser: Option<AddressChange> = None;

    if let Some(baseline) = baseline {
        for entry in entries {
            let before = match baseline.balances.get(&entry.address) {
                Some(b) => b,
                None => continue,
            };
            let change = entry.balance - before;
            let mover = AddressChange {
                address: entry.address.clone(),
                change,
            };
            if change > Decimal::ZERO && biggest_gainer.as_ref().map_or(true, |g| change > g.change) {
                biggest_gainer = Some(mover);
            } else if change < Decimal::ZERO
                && biggest_loser.as_ref().map_or(true, |l| change < l.change)
            {
                biggest_loser = Some(mover);
            }
        }
    }

    DailySummaryRecord {
        date,
        new_entries,
        dropouts,
        biggest_gainer,
        biggest_loser,
    }
}
