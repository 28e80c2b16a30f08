//! k-card combination enumeration.
//!
//! A battle with m distinct cards holds C(m, k) k-subsets, so every caller
//! passes an explicit per-battle cap. Enumeration is lexicographic over the
//! ascending id list, which makes truncation deterministic: the cap keeps
//! the first N subsets a recursive choose-without-replacement would emit.

use crate::models::{normalize_ids, CardId, ComboSignature};

/// Smallest supported combo size.
pub const MIN_COMBO_SIZE: usize = 2;

/// Largest supported combo size (a full deck).
pub const MAX_COMBO_SIZE: usize = 8;

/// Enumerate up to `cap` k-subsets of `ids`.
///
/// `ids` must be ascending and free of duplicates (see
/// [`combos_from_cards`] for unsorted input). Returns nothing when
/// `k == 0`, `k > ids.len()` or `cap == 0`.
pub fn enumerate_combos(ids: &[CardId], k: usize, cap: usize) -> Vec<ComboSignature> {
    let m = ids.len();
    if k == 0 || k > m || cap == 0 {
        return Vec::new();
    }

    let expected = binomial(m, k).min(cap as u64) as usize;
    let mut combos = Vec::with_capacity(expected);
    let mut idx: Vec<usize> = (0..k).collect();

    loop {
        combos.push(ComboSignature::from_sorted(
            idx.iter().map(|&i| ids[i]).collect(),
        ));
        if combos.len() >= cap {
            break;
        }

        // Rightmost position that can still advance.
        let Some(pos) = (0..k).rev().find(|&i| idx[i] != i + m - k) else {
            break;
        };
        idx[pos] += 1;
        for j in pos + 1..k {
            idx[j] = idx[j - 1] + 1;
        }
    }

    combos
}

/// Normalize arbitrary card ids, then enumerate.
pub fn combos_from_cards(
    ids: impl IntoIterator<Item = CardId>,
    k: usize,
    cap: usize,
) -> Vec<ComboSignature> {
    enumerate_combos(&normalize_ids(ids), k, cap)
}

/// C(n, k), saturating at `u64::MAX`.
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        result = result * (n - i) as u128 / (i + 1) as u128;
        if result > u64::MAX as u128 {
            return u64::MAX;
        }
    }
    result as u64
}
