use postgres_types::FromSql;
use postgres_types::ToSql;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub type Address = String;
pub type Balance = Decimal;
pub type Rank = i32;
pub type SnapshotID = i64;

/// Chains holder snapshots are taken on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// ELA main chain
    #[default]
    Mainchain,
    /// Elastos Smart Chain
    Esc,
    /// Elastos Identity chain
    Eid,
    /// Bridged ELA on Ethereum
    Ethereum,
}

impl Chain {
    pub const ALL: [Chain; 4] = [Chain::Mainchain, Chain::Esc, Chain::Eid, Chain::Ethereum];

    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Mainchain => "mainchain",
            Chain::Esc => "esc",
            Chain::Eid => "eid",
            Chain::Ethereum => "ethereum",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chain::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown chain `{s}`")))
    }
}

/// Intraday slot a snapshot was taken in, formatted as `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot(String);

impl TimeSlot {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TimeSlot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidInput(format!("invalid time slot `{s}`, expected HH:MM"));
        let (h, m) = s.split_once(':').ok_or_else(invalid)?;
        let digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(h) || !digits(m) {
            return Err(invalid());
        }
        let h: u8 = h.parse().map_err(|_| invalid())?;
        let m: u8 = m.parse().map_err(|_| invalid())?;
        if h > 23 || m > 59 {
            return Err(invalid());
        }
        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeSlot> for String {
    fn from(value: TimeSlot) -> Self {
        value.0
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Balance trend of an address over its recent history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ToSql, FromSql)]
#[postgres(name = "balance_trend")]
pub enum Trend {
    #[postgres(name = "accumulating")]
    Accumulating,
    #[postgres(name = "distributing")]
    Distributing,
    #[default]
    #[postgres(name = "holding")]
    Holding,
    #[postgres(name = "erratic")]
    Erratic,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Accumulating => "accumulating",
            Trend::Distributing => "distributing",
            Trend::Holding => "holding",
            Trend::Erratic => "erratic",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies a snapshot: one capture per chain and time slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    pub date: time::Date,
    pub time_slot: TimeSlot,
    pub chain: Chain,
}

impl SnapshotKey {
    pub fn new(date: time::Date, time_slot: TimeSlot, chain: Chain) -> Self {
        Self {
            date,
            time_slot,
            chain,
        }
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.chain, self.date, self.time_slot)
    }
}
