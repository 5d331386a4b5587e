use itertools::Itertools;

use super::types::BalanceSeries;
use super::types::CorrelationRecord;
use crate::constants::MAX_CORRELATION_PERIOD;
use crate::constants::MIN_CORRELATION_OVERLAP;
use crate::core::types::SnapshotID;
use crate::error::Error;
use crate::error::Result;
use crate::utils::pearson;
use crate::utils::to_f64;

/// First date of a trailing period of `days` ending at `latest`.
pub(super) fn window_start(latest: time::Date, days: i32) -> Result<time::Date> {
    if days <= 0 || days > MAX_CORRELATION_PERIOD {
        return Err(Error::InvalidInput(format!(
            "period must be 1 to {MAX_CORRELATION_PERIOD} days, got {days}"
        )));
    }
    latest
        .checked_sub(time::Duration::days(days as i64))
        .ok_or_else(|| Error::InvalidInput(format!("{days} day period is out of date range")))
}

/// Pearson correlation of the balances of every pair of addresses.
///
/// Pairs with too few common snapshots or a constant series are left out.
pub(super) fn correlate(series: &BalanceSeries) -> Vec<CorrelationRecord> {
    series
        .iter()
        .tuple_combinations()
        .filter_map(|((address_a, a), (address_b, b))| {
            let common: Vec<SnapshotID> = a
                .keys()
                .filter(|id| b.contains_key(*id))
                .cloned()
                .sorted()
                .collect();
            if common.len() < MIN_CORRELATION_OVERLAP {
                return None;
            }
            let xs: Vec<f64> = common.iter().map(|id| to_f64(&a[id])).collect();
            let ys: Vec<f64> = common.iter().map(|id| to_f64(&b[id])).collect();
            let correlation = pearson(&xs, &ys)?;
            Some(CorrelationRecord {
                address_a: address_a.clone(),
                address_b: address_b.clone(),
                correlation,
                data_points: common.len() as i32,
            })
        })
        .collect()
}
