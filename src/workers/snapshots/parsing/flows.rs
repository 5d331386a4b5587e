use rust_decimal::Decimal;

use super::super::types::EntryRecord;
use super::super::types::SnapshotView;
use crate::constants::activity;
use crate::core::types::Balance;
use crate::utils::mean;
use crate::utils::to_f64;

#[derive(Debug, PartialEq)]
pub(super) struct Flows {
    pub net_flow: Option<Balance>,
    pub total_inflow: Balance,
    pub total_outflow: Balance,
    pub active_wallets: i32,
    pub avg_rank_change: Option<f64>,
    pub avg_balance_change_pct: Option<f64>,
}

/// Derive flow metrics from annotated entries.
///
/// * `entries`: annotated entries of the snapshot
/// * `total`: total balance of the snapshot
/// * `previous`: immediately preceding snapshot of the same chain, if any
pub(super) fn derive(entries: &[EntryRecord], total: &Balance, previous: Option<&SnapshotView>) -> Flows {
    let mut total_inflow = Decimal::ZERO;
    let mut total_outflow = Decimal::ZERO;
    let mut active_wallets = 0;
    let mut rank_changes: Vec<f64> = vec![];
    let mut change_pcts: Vec<f64> = vec![];

    for entry in entries {
        if let Some(rc) = entry.rank_change {
            rank_changes.push(rc.abs() as f64);
        }
        let change = match entry.balance_change {
            Some(c) => c,
            None => continue,
        };
        if change > Decimal::ZERO {
            total_inflow += change;
        } else if change < Decimal::ZERO {
            total_outflow += change.abs();
        }
        if !change.is_zero() {
            active_wallets += 1;
        }
        let prev_balance = entry.balance - change;
        if !prev_balance.is_zero() {
            change_pcts.push(to_f64(&change) / to_f64(&prev_balance) * 100.0);
        }
    }

    Flows {
        net_flow: previous.map(|p| *total - p.total_balance),
        total_inflow,
        total_outflow,
        active_wallets,
        avg_rank_change: mean(&rank_changes),
        avg_balance_change_pct: mean(&change_pcts),
    }
}

/// Composite whale activity score, from 0 to 100.
///
/// Weighted sum of the net flow relative to the previous total, the share
/// of active wallets and the mean absolute rank change, each scaled to
/// [0, 1] and capped. Missing inputs count as no activity.
pub(super) fn whale_activity_index(
    net_flow: Option<&Balance>,
    prev_total: Option<&Balance>,
    active_wallets: i32,
    n_entries: usize,
    avg_rank_change: Option<f64>,
) -> f64 {
    let flow = match (net_flow, prev_total) {
        (Some(nf), Some(pt)) if !pt.is_zero() => {
            (to_f64(nf).abs() / to_f64(pt) / activity::FLOW_SATURATION).min(1.0)
        }
        _ => 0.0,
    };
    let active = if n_entries == 0 {
        0.0
    } else {
        (active_wallets as f64 / n_entries as f64).min(1.0)
    };
    let rank = (avg_rank_change.unwrap_or(0.0) / activity::RANK_SATURATION).min(1.0);
    100.0
        * (activity::FLOW_WEIGHT * flow
            + activity::ACTIVE_WEIGHT * active
            + activity::RANK_WEIGHT * rank)
}
