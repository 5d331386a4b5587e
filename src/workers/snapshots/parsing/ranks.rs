use rust_decimal::Decimal;
use std::collections::HashSet;

use super::super::types::RankedHolder;
use super::super::types::RawHolder;
use crate::error::Error;
use crate::error::Result;

/// Validates holders and assigns dense ranks 1..N.
///
/// Holders are ordered by balance, largest first. Equal balances are
/// ordered by address so ranking is deterministic.
pub(super) fn rank(holders: &[RawHolder]) -> Result<Vec<RankedHolder>> {
    if holders.is_empty() {
        return Err(Error::InvalidSnapshot("no holders".to_owned()));
    }
    let mut seen: HashSet<&str> = HashSet::with_capacity(holders.len());
    for h in holders {
        if h.address.is_empty() {
            return Err(Error::InvalidSnapshot("empty address".to_owned()));
        }
        if h.balance < Decimal::ZERO {
            return Err(Error::InvalidSnapshot(format!(
                "negative balance for {}",
                h.address
            )));
        }
        if !seen.insert(h.address.as_str()) {
            return Err(Error::InvalidSnapshot(format!(
                "duplicate address {}",
                h.address
            )));
        }
    }

    let mut sorted: Vec<&RawHolder> = holders.iter().collect();
    sorted.sort_by(|a, b| {
        b.balance
            .cmp(&a.balance)
            .then_with(|| a.address.cmp(&b.address))
    });

    Ok(sorted
        .into_iter()
        .enumerate()
        .map(|(i, h)| RankedHolder {
            rank: i as i32 + 1,
            address: h.address.clone(),
            balance: h.balance,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_dense_ranks() {
        let holders = vec![
            RawHolder::new("b", dec!(10)),
            RawHolder::new("a", dec!(30)),
            RawHolder::new("c", dec!(20)),
        ];
        let ranked = rank(&holders).unwrap();
        let ranks: Vec<i32> = ranked.iter().map(|h| h.rank).collect();
        let addresses: Vec<&str> = ranked.iter().map(|h| h.address.as_str()).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(addresses, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_ties_ordered_by_address() {
        let holders = vec![
            RawHolder::new("z", dec!(5)),
            RawHolder::new("m", dec!(5)),
            RawHolder::new("a", dec!(5)),
        ];
        let ranked = rank(&holders).unwrap();
        let addresses: Vec<&str> = ranked.iter().map(|h| h.address.as_str()).collect();
        assert_eq!(addresses, vec!["a", "m", "z"]);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn test_rejects_duplicates() {
        let holders = vec![RawHolder::new("a", dec!(5)), RawHolder::new("a", dec!(6))];
        assert!(matches!(rank(&holders), Err(Error::InvalidSnapshot(_))));
    }

    #[test]
    fn test_rejects_negative_balance() {
        let holders = vec![RawHolder::new("a", dec!(-1))];
        assert!(matches!(rank(&holders), Err(Error::InvalidSnapshot(_))));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(rank(&[]), Err(Error::InvalidSnapshot(_))));
    }
}
