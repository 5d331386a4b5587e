#![allow(dead_code)] // not used by all tests
use rust_decimal::Decimal;

use ela_whales::core::types::Chain;
use ela_whales::core::types::TimeSlot;
use ela_whales::workers::snapshots::RawHolder;
use ela_whales::workers::snapshots::RawSnapshot;

/// Raw snapshot with whole-unit balances.
pub fn snapshot(date: time::Date, slot: &str, chain: Chain, holders: &[(&str, i64)]) -> RawSnapshot {
    RawSnapshot {
        date,
        time_slot: slot.parse::<TimeSlot>().unwrap(),
        chain,
        fetched_at: date.with_hms(0, 0, 0).unwrap().assume_utc(),
        holders: holders
            .iter()
            .map(|(address, balance)| RawHolder::new(address, Decimal::from(*balance)))
            .collect(),
    }
}

pub fn set_tracing_subscriber(set: bool) -> Option<tracing::dispatcher::DefaultGuard> {
    if !set {
        return None;
    }
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_env_filter("ela_whales=trace")
        .finish();
    Some(tracing::subscriber::set_default(subscriber))
}
