use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::core::types::Address;
use crate::core::types::Balance;
use crate::core::types::SnapshotID;

/// Balances per snapshot, by address.
///
/// Ordered by address so pairs come out in canonical order.
pub type BalanceSeries = BTreeMap<Address, HashMap<SnapshotID, Balance>>;

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationRecord {
    /// Lowest address of the pair
    pub address_a: Address,
    pub address_b: Address,
    pub correlation: f64,
    pub data_points: i32,
}

/// Label of a trailing period of given number of days, e.g. `30d`.
pub fn period_label(days: i32) -> String {
    format!("{days}d")
}
