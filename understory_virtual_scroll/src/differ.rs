// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identity diffing between two ordered sequences.
//!
//! [`IterableDiffer`] remembers the identities it saw last and turns the
//! next sequence into a list of [`DiffOp`]s. Applying the operations in
//! order to a container that mirrors the previous sequence yields the next
//! one:
//!
//! 1. all removals, from the back so earlier indices stay valid;
//! 2. then, for each position of the new sequence from the front, either a
//!    `Keep` (the right view is already there), a `Move` from a later
//!    position, or an `Insert`.
//!
//! Duplicate identities are matched in order of appearance.
//!
//! ```
//! use understory_virtual_scroll::{DiffOp, IterableDiffer};
//!
//! let mut differ = IterableDiffer::new();
//! differ.diff(vec!['a', 'b', 'c']);
//! let ops = differ.diff(vec!['c', 'a', 'b']).unwrap();
//! assert_eq!(
//!     ops,
//!     [
//!         DiffOp::Move { from: 2, to: 0 },
//!         DiffOp::Keep { index: 1 },
//!         DiffOp::Keep { index: 2 },
//!     ]
//! );
//! assert!(differ.diff(vec!['c', 'a', 'b']).is_none());
//! ```

use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashMap;

/// One step of a patch produced by [`IterableDiffer::diff`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DiffOp {
    /// Remove the entry at `index`.
    Remove {
        /// Position in the container before this step.
        index: usize,
    },
    /// Insert a new entry at `index`.
    Insert {
        /// Position of the new entry, also its position in the new sequence.
        index: usize,
    },
    /// Move the entry at `from` to `to` (`to < from`).
    Move {
        /// Position before this step.
        from: usize,
        /// Position after this step, also its position in the new sequence.
        to: usize,
    },
    /// The entry at `index` stays in place; its item may need rebinding.
    Keep {
        /// Position in the new sequence.
        index: usize,
    },
}

/// Computes patches between successive identity sequences.
#[derive(Clone, Debug)]
pub struct IterableDiffer<K> {
    previous: Vec<K>,
}

impl<K> Default for IterableDiffer<K> {
    fn default() -> Self {
        Self {
            previous: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> IterableDiffer<K> {
    /// Creates a differ whose previous sequence is empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the identities seen by the last call to [`diff`](Self::diff).
    #[must_use]
    pub fn previous(&self) -> &[K] {
        &self.previous
    }

    /// Forgets the previous sequence.
    pub fn reset(&mut self) {
        self.previous.clear();
    }

    /// Diffs `next` against the previous sequence and remembers it.
    ///
    /// Returns `None` when the sequences are identical.
    pub fn diff(&mut self, next: Vec<K>) -> Option<Vec<DiffOp>> {
        if self.previous == next {
            return None;
        }
        let ops = diff_identities(&self.previous, &next);
        self.previous = next;
        Some(ops)
    }
}

/// Computes the operations turning `previous` into `next`.
pub fn diff_identities<K: Eq + Hash + Clone>(previous: &[K], next: &[K]) -> Vec<DiffOp> {
    let mut wanted: HashMap<&K, usize> = HashMap::new();
    for id in next {
        *wanted.entry(id).or_default() += 1;
    }

    let mut kept = Vec::with_capacity(previous.len());
    let mut removed = Vec::new();
    for (index, id) in previous.iter().enumerate() {
        match wanted.get_mut(id) {
            Some(count) if *count > 0 => {
                *count -= 1;
                kept.push(id);
            }
            _ => removed.push(index),
        }
    }

    let mut ops: Vec<DiffOp> = removed
        .into_iter()
        .rev()
        .map(|index| DiffOp::Remove { index })
        .collect();

    // How many kept entries of each identity have not been placed yet.
    let mut unplaced: HashMap<&K, usize> = HashMap::new();
    for id in &kept {
        *unplaced.entry(*id).or_default() += 1;
    }

    let mut work = kept;
    for (index, id) in next.iter().enumerate() {
        let available = unplaced.get_mut(id).filter(|count| **count > 0);
        match available {
            Some(count) => {
                *count -= 1;
                if work.get(index) == Some(&id) {
                    ops.push(DiffOp::Keep { index });
                } else {
                    let from = work[index..]
                        .iter()
                        .position(|candidate| *candidate == id)
                        .map(|offset| offset + index);
                    if let Some(from) = from {
                        let moved = work.remove(from);
                        work.insert(index, moved);
                        ops.push(DiffOp::Move { from, to: index });
                    }
                }
            }
            None => {
                work.insert(index, id);
                ops.push(DiffOp::Insert { index });
            }
        }
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    /// Applies `ops` to `previous`, taking inserted values from `next`.
    fn apply<K: Clone>(previous: &[K], next: &[K], ops: &[DiffOp]) -> Vec<K> {
        let mut out = previous.to_vec();
        for op in ops {
            match *op {
                DiffOp::Remove { index } => {
                    out.remove(index);
                }
                DiffOp::Insert { index } => out.insert(index, next[index].clone()),
                DiffOp::Move { from, to } => {
                    let item = out.remove(from);
                    out.insert(to, item);
                }
                DiffOp::Keep { .. } => {}
            }
        }
        out
    }

    fn check(previous: &[u32], next: &[u32]) -> Vec<DiffOp> {
        let ops = diff_identities(previous, next);
        assert_eq!(apply(previous, next, &ops), next, "{previous:?} -> {next:?}");
        ops
    }

    #[test]
    fn scrolling_window_inserts_and_removes_at_the_edges() {
        let ops = check(&[0, 1, 2, 3, 4], &[2, 3, 4, 5, 6]);
        assert_eq!(
            ops,
            vec![
                DiffOp::Remove { index: 1 },
                DiffOp::Remove { index: 0 },
                DiffOp::Keep { index: 0 },
                DiffOp::Keep { index: 1 },
                DiffOp::Keep { index: 2 },
                DiffOp::Insert { index: 3 },
                DiffOp::Insert { index: 4 },
            ]
        );
    }

    #[test]
    fn reorders_only_move() {
        let ops = check(&[1, 2, 3, 4], &[4, 3, 2, 1]);
        assert!(
            ops.iter()
                .all(|op| matches!(op, DiffOp::Move { .. } | DiffOp::Keep { .. }))
        );
    }

    #[test]
    fn duplicates_are_matched_in_order() {
        check(&[7, 7, 8], &[8, 7]);
        check(&[7, 8], &[7, 7, 8, 7]);
        check(&[1, 1, 1], &[1]);
    }

    #[test]
    fn mixed_edits_apply_cleanly() {
        check(&[], &[1, 2, 3]);
        check(&[1, 2, 3], &[]);
        check(&[1, 2, 3, 4, 5], &[5, 9, 3, 1, 8]);
        check(&[10, 20, 30, 40], &[40, 30, 50, 10, 20]);
    }

    #[test]
    fn differ_reports_no_changes_for_equal_sequences() {
        let mut differ = IterableDiffer::new();
        assert!(differ.diff(vec![1, 2]).is_some());
        assert!(differ.diff(vec![1, 2]).is_none());
        assert_eq!(differ.previous(), &[1, 2]);
        differ.reset();
        assert!(differ.diff(vec![1, 2]).is_some());
    }
}
