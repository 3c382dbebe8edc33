//! Prime capacity schedule for the slot table.
//!
//! Capacities are always prime so that the double-hash stride picked in
//! `probe` is coprime with the table length and every probe path is a
//! full cycle.
//! The fixed schedule roughly doubles at each step; past its end, growth
//! continues with the smallest prime above twice the current capacity.

/// Fixed ascending capacity schedule. Each member is prime.
pub(crate) const CAPACITIES: [usize; 19] = [
    3, 7, 17, 37, 79, 163, 331, 673, 1361, 2729, 5471, 10949, 21911, 43853, 87719, 175447, 350899,
    701819, 1403641,
];

/// Table size used by a fresh map.
pub(crate) const INITIAL_CAPACITY: usize = CAPACITIES[0];

/// Smallest schedule member above `current`, or the smallest prime above
/// `2 * current` once the schedule is exhausted.
pub(crate) fn next_capacity(current: usize) -> usize {
    match CAPACITIES.iter().find(|&&c| c > current) {
        Some(&c) => c,
        None => next_prime_above(2 * current),
    }
}

/// Smallest prime strictly greater than `n`.
fn next_prime_above(n: usize) -> usize {
    let mut candidate = n + 1;
    if candidate <= 2 {
        return 2;
    }
    if candidate % 2 == 0 {
        candidate += 1;
    }
    while !is_prime(candidate) {
        candidate += 2;
    }
    candidate
}

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}
