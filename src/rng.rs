//! Random number source used by every randomized decision
//!
//! Role shuffling and card draws go through the [`RandomSource`] trait so
//! that production code can use an entropy-seeded generator while tests
//! replay a fixed seed and get the exact same session every time.

/// A source of uniformly distributed indices
pub trait RandomSource {
    /// Returns an integer drawn uniformly from `[0, upper]` (inclusive)
    fn index_inclusive(&mut self, upper: usize) -> usize;

    /// Returns an integer drawn uniformly from `[0, len)`
    ///
    /// `len` must be at least 1.
    fn index(&mut self, len: usize) -> usize {
        self.index_inclusive(len.saturating_sub(1))
    }
}

impl RandomSource for fastrand::Rng {
    fn index_inclusive(&mut self, upper: usize) -> usize {
        self.usize(0..=upper)
    }
}

/// Creates a deterministic generator for reproducible sessions
pub fn seeded(seed: u64) -> fastrand::Rng {
    fastrand::Rng::with_seed(seed)
}

/// Creates a generator seeded from system entropy
pub fn from_entropy() -> fastrand::Rng {
    fastrand::Rng::new()
}

/// Shuffles `items` in place with the Fisher–Yates algorithm
///
/// For each index `i` from the last one down to 1, an index `j` is drawn
/// uniformly in `[0, i]` and positions `i` and `j` are swapped. Every
/// permutation of the input is equally likely.
pub fn shuffle<T, R: RandomSource + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.index_inclusive(i);
        items.swap(i, j);
    }
}

/// Picks one element of `items` uniformly at random
///
/// Returns `None` when `items` is empty.
pub fn choose<'a, T, R: RandomSource + ?Sized>(items: &'a [T], rng: &mut R) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        items.get(rng.index(items.len()))
    }
}

/// Replays a fixed list of draws, used by tests to force specific outcomes
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct Scripted {
    draws: std::collections::VecDeque<usize>,
}

#[cfg(test)]
impl Scripted {
    pub(crate) fn new(draws: impl IntoIterator<Item = usize>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
        }
    }
}

#[cfg(test)]
impl RandomSource for Scripted {
    fn index_inclusive(&mut self, upper: usize) -> usize {
        // exhausted scripts fall back to "no swap" so shuffles stay stable
        self.draws.pop_front().map_or(upper, |draw| draw.min(upper))
    }
}
