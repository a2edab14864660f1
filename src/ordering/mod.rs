//! Probe orderings.
//!
//! Placement fills a region with probes in the order of the id list it is
//! given, so sorting similar probes next to each other before placement
//! lowers the cost the QAP solver starts from. Two orderings are provided:
//!
//! - [`EmbeddingOrdering`]: lexicographic order of the embedding bit vectors
//! - [`SequenceOrdering`]: numeric rank of the probe sequences
//!
//! Both sort a sub-slice of the id list in place with [`quick_sort`].

use std::cmp::Ordering;

use crate::core::chip::Chip;
use crate::core::error::{LayoutError, Result};
use crate::core::types::{OrderingKind, ProbeId};

pub mod embeddings;
pub mod sequences;

pub use embeddings::EmbeddingOrdering;
pub use sequences::SequenceOrdering;

/// Below this many elements the sort falls back to insertion sort
const INSERTION_SORT_THRESHOLD: isize = 7;

/// From this many elements the pivot is a pseudo-median of nine
const NINTHER_THRESHOLD: isize = 40;

/// An ordering of probe ids
pub trait ProbeOrdering: Send + Sync {
    /// Name used in logs and reports
    fn name(&self) -> &'static str;

    /// Sort `ids[start..=end]` in place; ids outside the range are untouched.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `end` is outside `ids` or an id is not a
    /// probe of the chip.
    fn order_probes(
        &self,
        chip: &Chip,
        ids: &mut [ProbeId],
        start: usize,
        end: usize,
    ) -> Result<()>;
}

/// Strategy object for a configured ordering, `None` keeps the given order
#[must_use]
pub fn ordering_for(kind: OrderingKind) -> Option<Box<dyn ProbeOrdering>> {
    match kind {
        OrderingKind::None => None,
        OrderingKind::Embeddings => Some(Box::new(EmbeddingOrdering)),
        OrderingKind::Sequences => Some(Box::new(SequenceOrdering)),
    }
}

/// A random-access collection the partition sort can rearrange.
///
/// The pivot is copied out by [`IndexedCollection::set_pivot`] since the
/// element it came from moves while partitioning.
pub trait IndexedCollection {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn compare(&self, i: usize, j: usize) -> Ordering;

    fn swap(&mut self, i: usize, j: usize);

    fn set_pivot(&mut self, i: usize);

    fn compare_to_pivot(&self, i: usize) -> Ordering;
}

/// Sort `collection[start..end]` with a three-way partitioning quicksort.
///
/// Insertion sort for fewer than 7 elements, median of three for mid sizes,
/// pseudo-median of nine for more than 40 elements. Not stable.
#[allow(clippy::cast_possible_wrap)]
pub fn quick_sort<C: IndexedCollection + ?Sized>(collection: &mut C, start: usize, end: usize) {
    let end = end.min(collection.len());
    if start < end {
        sort_range(collection, start as isize, (end - start) as isize);
    }
}

#[allow(clippy::cast_sign_loss)]
fn sort_range<C: IndexedCollection + ?Sized>(x: &mut C, off: isize, len: isize) {
    let cmp = |x: &C, i: isize, j: isize| x.compare(i as usize, j as usize);
    let swap = |x: &mut C, i: isize, j: isize| x.swap(i as usize, j as usize);

    if len < INSERTION_SORT_THRESHOLD {
        for i in off..off + len {
            let mut j = i;
            while j > off && cmp(x, j - 1, j) == Ordering::Greater {
                swap(x, j, j - 1);
                j -= 1;
            }
        }
        return;
    }

    let mut m = off + len / 2;
    if len > INSERTION_SORT_THRESHOLD {
        let mut l = off;
        let mut n = off + len - 1;
        if len > NINTHER_THRESHOLD {
            let s = len / 8;
            l = median_of_three(x, l, l + s, l + 2 * s);
            m = median_of_three(x, m - s, m, m + s);
            n = median_of_three(x, n - 2 * s, n - s, n);
        }
        m = median_of_three(x, l, m, n);
    }
    x.set_pivot(m as usize);

    let pivot = |x: &C, i: isize| x.compare_to_pivot(i as usize);
    let (mut a, mut b) = (off, off);
    let (mut c, mut d) = (off + len - 1, off + len - 1);
    loop {
        while b <= c && pivot(x, b) != Ordering::Greater {
            if pivot(x, b) == Ordering::Equal {
                swap(x, a, b);
                a += 1;
            }
            b += 1;
        }
        while c >= b && pivot(x, c) != Ordering::Less {
            if pivot(x, c) == Ordering::Equal {
                swap(x, c, d);
                d -= 1;
            }
            c -= 1;
        }
        if b > c {
            break;
        }
        swap(x, b, c);
        b += 1;
        c -= 1;
    }

    // move the runs equal to the pivot into the middle
    let n = off + len;
    let s = (a - off).min(b - a);
    swap_runs(x, off, b - s, s);
    let s = (d - c).min(n - d - 1);
    swap_runs(x, b, n - s, s);

    let s = b - a;
    if s > 1 {
        sort_range(x, off, s);
    }
    let s = d - c;
    if s > 1 {
        sort_range(x, n - s, s);
    }
}

#[allow(clippy::cast_sign_loss)]
fn median_of_three<C: IndexedCollection + ?Sized>(x: &C, a: isize, b: isize, c: isize) -> isize {
    let less = |i: isize, j: isize| x.compare(i as usize, j as usize) == Ordering::Less;
    if less(a, b) {
        if less(b, c) {
            b
        } else if less(a, c) {
            c
        } else {
            a
        }
    } else if less(c, b) {
        b
    } else if less(c, a) {
        c
    } else {
        a
    }
}

#[allow(clippy::cast_sign_loss)]
fn swap_runs<C: IndexedCollection + ?Sized>(x: &mut C, a: isize, b: isize, n: isize) {
    for i in 0..n {
        x.swap((a + i) as usize, (b + i) as usize);
    }
}

/// Probe ids sorted by a key computed once per id
pub(crate) struct KeyedIds<'a, K> {
    ids: &'a mut [ProbeId],
    keys: Vec<K>,
    pivot: Option<K>,
}

impl<'a, K: Ord + Clone> KeyedIds<'a, K> {
    pub(crate) fn new(ids: &'a mut [ProbeId], keys: Vec<K>) -> Self {
        debug_assert_eq!(ids.len(), keys.len());
        Self {
            ids,
            keys,
            pivot: None,
        }
    }
}

impl<K: Ord + Clone> IndexedCollection for KeyedIds<'_, K> {
    fn len(&self) -> usize {
        self.ids.len()
    }

    fn compare(&self, i: usize, j: usize) -> Ordering {
        self.keys[i].cmp(&self.keys[j])
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.ids.swap(i, j);
        self.keys.swap(i, j);
    }

    fn set_pivot(&mut self, i: usize) {
        self.pivot = Some(self.keys[i].clone());
    }

    fn compare_to_pivot(&self, i: usize) -> Ordering {
        match &self.pivot {
            Some(pivot) => self.keys[i].cmp(pivot),
            None => Ordering::Equal,
        }
    }
}

/// `ids[start..=end]` as a mutable slice, empty when `start > end`
pub(crate) fn checked_range_mut(
    ids: &mut [ProbeId],
    start: usize,
    end: usize,
) -> Result<&mut [ProbeId]> {
    if start > end {
        return Ok(&mut []);
    }
    if end >= ids.len() {
        return Err(LayoutError::out_of_range(end, ids.len()));
    }
    Ok(&mut ids[start..=end])
}
