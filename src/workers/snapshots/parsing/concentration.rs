/// Gini coefficient of a balance distribution.
///
/// Order of `balances` does not matter. Yields 0 for less than 2
/// balances or a zero total.
pub(super) fn gini(balances: &[f64]) -> f64 {
    let n = balances.len();
    let total: f64 = balances.iter().sum();
    if n < 2 || total <= 0.0 {
        return 0.0;
    }
    let mut sorted = balances.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, x)| (i + 1) as f64 * x)
        .sum();
    let n = n as f64;
    let g = 2.0 * weighted / (n * total) - (n + 1.0) / n;
    g.clamp(0.0, 1.0)
}

/// Herfindahl-Hirschman index, from 0 to 10000.
pub(super) fn hhi(balances: &[f64]) -> f64 {
    let total: f64 = balances.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    balances.iter().map(|b| (b / total).powi(2)).sum::<f64>() * 10000.0
}

/// Share, in percent, of the `k` largest balances in the total.
///
/// Expects `ranked` to be ordered by rank (largest first).
pub(super) fn top_share_pct(ranked: &[f64], k: usize) -> f64 {
    let total: f64 = ranked.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    ranked.iter().take(k).sum::<f64>() / total * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_equal_balances() {
        let balances = [100.0, 100.0, 100.0, 100.0];
        assert_close(gini(&balances), 0.0);
        assert_close(hhi(&balances), 2500.0);
    }

    #[test]
    fn test_hhi_equal_shares_is_10000_over_n() {
        for n in [1, 3, 7, 100] {
            let balances = vec![42.0; n];
            assert_close(hhi(&balances), 10000.0 / n as f64);
        }
    }

    #[test]
    fn test_single_entry() {
        assert_close(gini(&[500.0]), 0.0);
        assert_close(hhi(&[500.0]), 10000.0);
    }

    #[test]
    fn test_zero_total() {
        assert_close(gini(&[0.0, 0.0]), 0.0);
        assert_close(hhi(&[0.0, 0.0]), 0.0);
        assert_close(top_share_pct(&[0.0, 0.0], 1), 0.0);
    }

    #[test]
    fn test_maximal_concentration() {
        // Everything on one address: (n - 1) / n
        let balances = [0.0, 0.0, 0.0, 1000.0];
        assert_close(gini(&balances), 0.75);
        assert_close(hhi(&balances), 10000.0);
    }

    #[test]
    fn test_gini_known_value() {
        // Mean absolute difference based: 1, 2, 3 -> 2/9
        assert_close(gini(&[1.0, 2.0, 3.0]), 2.0 / 9.0);
    }

    #[test]
    fn test_gini_permutation_invariant() {
        let mut rng = rand::thread_rng();
        let mut balances: Vec<f64> = (1..=60).map(|i| (i * i) as f64 * 1.5).collect();
        let reference = gini(&balances);
        for _ in 0..20 {
            balances.shuffle(&mut rng);
            assert_close(gini(&balances), reference);
        }
    }

    #[test]
    fn test_top_share_additivity() {
        let ranked: Vec<f64> = (1..=30).rev().map(|i| i as f64 * 10.0).collect();
        let top10 = top_share_pct(&ranked, 10);
        let top20 = top_share_pct(&ranked, 20);
        let total: f64 = ranked.iter().sum();
        let ranks_11_to_20: f64 = ranked[10..20].iter().sum::<f64>() / total * 100.0;
        assert_close(top10 + ranks_11_to_20, top20);
    }

    #[test]
    fn test_top_share_caps_at_n() {
        let ranked = [60.0, 40.0];
        assert_close(top_share_pct(&ranked, 50), 100.0);
        assert_close(top_share_pct(&ranked, 1), 60.0);
    }
}
