pub mod correlations;
pub mod labels;
pub mod snapshots;
pub mod supply;
pub mod weekly;
