use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::collections::HashSet;

use super::types::WeekData;
use super::types::WeeklySummaryRecord;
use crate::core::types::Address;
use crate::utils::mean;
use crate::utils::week_end;
use crate::workers::snapshots::types::AddressChange;

/// Summarize a week of snapshots.
///
/// Returns None if the week has no snapshots.
pub(super) fn summarize(week_start: time::Date, data: &WeekData) -> Option<WeeklySummaryRecord> {
    let first = data.snapshots.first()?;
    let last = data.snapshots.last()?;

    let (new_entries, dropouts) = churn(data);
    let (top_accumulator, top_distributor) = top_movers(data);

    let volatilities: Vec<f64> = data
        .snapshots
        .iter()
        .flat_map(|s| s.entries.iter().filter_map(|e| e.rank_volatility))
        .collect();
    let activity: Vec<f64> = data
        .snapshots
        .iter()
        .map(|s| s.whale_activity_index)
        .collect();

    Some(WeeklySummaryRecord {
        week_start,
        week_end: week_end(&week_start),
        gini_start: first.gini,
        gini_end: last.gini,
        gini_change: last.gini - first.gini,
        total_balance_start: first.total_balance,
        total_balance_end: last.total_balance,
        net_flow: data.snapshots.iter().filter_map(|s| s.net_flow).sum(),
        avg_whale_activity: mean(&activity).unwrap_or(0.0),
        new_entries,
        dropouts,
        top_accumulator,
        top_distributor,
        avg_rank_volatility: mean(&volatilities),
        snapshot_count: data.snapshots.len() as i32,
    })
}

/// Distinct addresses entering and leaving the top list over the week.
///
/// Each snapshot is compared to its predecessor, the first one to the last
/// snapshot before the week. Without such a snapshot the first one does not
/// contribute.
fn churn(data: &WeekData) -> (i32, i32) {
    let mut entered: HashSet<&str> = HashSet::new();
    let mut left: HashSet<&str> = HashSet::new();

    let mut previous: Option<HashSet<&str>> = data
        .before
        .as_ref()
        .map(|addresses| addresses.iter().map(|a| a.as_str()).collect());

    for snapshot in &data.snapshots {
        let current: HashSet<&str> = snapshot.entries.iter().map(|e| e.address.as_str()).collect();
        if let Some(prev) = &previous {
            entered.extend(current.difference(prev));
            left.extend(prev.difference(&current));
        }
        previous = Some(current);
    }
    (entered.len() as i32, left.len() as i32)
}

/// Addresses with the largest cumulative balance gain and loss over the week.
fn top_movers(data: &WeekData) -> (Option<AddressChange>, Option<AddressChange>) {
    let mut cumulative: BTreeMap<&Address, Decimal> = BTreeMap::new();
    for entry in data.snapshots.iter().flat_map(|s| &s.entries) {
        if let Some(change) = entry.balance_change {
            *cumulative.entry(&entry.address).or_insert(Decimal::ZERO) += change;
        }
    }

    // Ties go to the lowest address
    let mut accumulator: Option<(&Address, Decimal)> = None;
    let mut distributor: Option<(&Address, Decimal)> = None;
    for (address, change) in cumulative {
        if change > Decimal::ZERO && accumulator.map_or(true, |(_, c)| change > c) {
            accumulator = Some((address, change));
        }
        if change < Decimal::ZERO && distributor.map_or(true, |(_, c)| change < c) {
            distributor = Some((address, change));
        }
    }

    let to_record = |(address, change): (&Address, Decimal)| AddressChange {
        address: address.clone(),
        change,
    };
    (accumulator.map(to_record), distributor.map(to_record))
}
