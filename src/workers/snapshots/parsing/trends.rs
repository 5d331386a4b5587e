use rust_decimal::Decimal;

use super::super::types::EntryRecord;
use super::super::types::HistoryPoint;
use super::super::types::RankedHolder;
use crate::constants::trend;
use crate::constants::HISTORY_WINDOW;
use crate::core::types::Balance;
use crate::core::types::Trend;
use crate::utils::sample_std_dev;
use crate::utils::to_f64;

/// Derive an entry from a ranked holder and its prior entries.
///
/// * `holder`: the ranked holder
/// * `total`: total balance of the snapshot
/// * `history`: prior entries of the same address and chain, oldest first
pub(super) fn annotate(holder: &RankedHolder, total: &Balance, history: &[HistoryPoint]) -> EntryRecord {
    let percentage = if total.is_zero() {
        0.0
    } else {
        to_f64(&holder.balance) / to_f64(total) * 100.0
    };

    let mut entry = EntryRecord {
        rank: holder.rank,
        address: holder.address.clone(),
        balance: holder.balance,
        percentage,
        prev_rank: None,
        rank_change: None,
        balance_change: None,
        rank_volatility: None,
        balance_trend: Trend::Holding,
        rank_streak: None,
        balance_streak: None,
    };

    let prev = match history.last() {
        Some(p) => p,
        None => return entry,
    };

    let rank_change = prev.rank - holder.rank;
    let balance_change = holder.balance - prev.balance;

    // Window of points, current one included
    let start = history.len().saturating_sub(HISTORY_WINDOW - 1);
    let window = &history[start..];
    let ranks: Vec<f64> = window
        .iter()
        .map(|p| p.rank as f64)
        .chain(std::iter::once(holder.rank as f64))
        .collect();
    let balances: Vec<f64> = window
        .iter()
        .map(|p| to_f64(&p.balance))
        .chain(std::iter::once(to_f64(&holder.balance)))
        .collect();

    entry.prev_rank = Some(prev.rank);
    entry.rank_change = Some(rank_change);
    entry.balance_change = Some(balance_change);
    entry.rank_volatility = sample_std_dev(&ranks);
    entry.balance_trend = classify(&balances);
    entry.rank_streak = Some(next_streak(prev.rank_streak, rank_change.signum()));
    entry.balance_streak = Some(next_streak(
        prev.balance_streak,
        balance_change.cmp(&Decimal::ZERO) as i32,
    ));
    entry
}

/// Signed count of consecutive moves in the same direction.
///
/// * `prev`: previous streak, None counts as 0
/// * `direction`: sign of the latest move
pub(super) fn next_streak(prev: Option<i32>, direction: i32) -> i32 {
    let prev = prev.unwrap_or(0);
    match direction {
        0 => 0,
        d if d > 0 => {
            if prev > 0 {
                prev + 1
            } else {
                1
            }
        }
        _ => {
            if prev < 0 {
                prev - 1
            } else {
                -1
            }
        }
    }
}

/// Classify a balance series, oldest first, current balance last.
///
/// See `constants::trend` for thresholds.
pub(super) fn classify(balances: &[f64]) -> Trend {
    let start = balances.len().saturating_sub(trend::WINDOW + 1);
    let window = &balances[start..];
    if window.len() < 2 {
        return Trend::Holding;
    }
    let first = window[0];
    let last = window[window.len() - 1];
    let base = if first > 0.0 { first } else { last };
    if base <= 0.0 {
        return Trend::Holding;
    }

    let deltas: Vec<f64> = window.windows(2).map(|w| w[1] - w[0]).collect();
    let noise = base * trend::NOISE_PCT / 100.0;
    let moves: Vec<f64> = deltas
        .iter()
        .cloned()
        .filter(|d| *d != 0.0 && d.abs() >= noise)
        .collect();
    if moves.is_empty() {
        return Trend::Holding;
    }

    let reversals = moves
        .windows(2)
        .filter(|w| w[0].signum() != w[1].signum())
        .count();
    if moves.len() >= trend::ERRATIC_MIN_MOVES
        && reversals as f64 / (moves.len() - 1) as f64 >= trend::ERRATIC_REVERSAL_RATIO
    {
        return Trend::Erratic;
    }

    let net = last - first;
    if net.abs() / base * 100.0 < trend::HOLDING_NET_PCT {
        return Trend::Holding;
    }

    let gross: f64 = deltas.iter().map(|d| d.abs()).sum();
    if net.abs() / gross < trend::ERRATIC_MIN_EFFICIENCY {
        return Trend::Erratic;
    }

    if net > 0.0 {
        Trend::Accumulating
    } else {
        Trend::Distributing
    }
}
