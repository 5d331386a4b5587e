use crate::core::types::Chain;

/// Chain the daily summary, weekly roll-up and correlation scans run on.
pub const ROLLUP_CHAIN: Chain = Chain::Mainchain;

/// Number of snapshots (current one included) an entry's history spans.
pub const HISTORY_WINDOW: usize = 30;

/// Balance trend policy.
///
/// Thresholds are percentages of the balance at the start of the trend window.
pub mod trend {
    /// Number of trailing balance deltas considered.
    pub const WINDOW: usize = 7;
    /// Deltas smaller than this are treated as no change.
    pub const NOISE_PCT: f64 = 0.1;
    /// Net change below this is holding.
    pub const HOLDING_NET_PCT: f64 = 1.0;
    /// Minimum number of moves before reversals can flag a series as erratic.
    pub const ERRATIC_MIN_MOVES: usize = 3;
    /// Share of direction changes between consecutive moves flagging erratic series.
    pub const ERRATIC_REVERSAL_RATIO: f64 = 0.5;
    /// Net over gross change below which a series is erratic.
    pub const ERRATIC_MIN_EFFICIENCY: f64 = 0.3;
}

/// Whale activity index weights and saturation points.
///
/// Each component is scaled to [0, 1] and capped, so the index is
/// monotonic in each input and lies within [0, 100].
pub mod activity {
    pub const FLOW_WEIGHT: f64 = 0.4;
    pub const ACTIVE_WEIGHT: f64 = 0.3;
    pub const RANK_WEIGHT: f64 = 0.3;
    /// Net flow, as a fraction of the previous total, at which the flow component saturates.
    pub const FLOW_SATURATION: f64 = 0.05;
    /// Mean absolute rank change at which the rank component saturates.
    pub const RANK_SATURATION: f64 = 5.0;
}

/// Minimum number of overlapping data points for a correlation to be kept.
pub const MIN_CORRELATION_OVERLAP: usize = 5;

/// Longest trailing correlation period, in days.
pub const MAX_CORRELATION_PERIOD: i32 = 3650;

/// Ranks covered by the top-N shares.
pub const TOP_N: [usize; 3] = [10, 20, 50];
