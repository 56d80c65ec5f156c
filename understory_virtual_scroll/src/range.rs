// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Half-open index ranges describing which items are materialized.

use core::fmt;

/// A half-open interval `[start, end)` of item indices.
///
/// `ListRange` is the unit of communication between a scroll strategy, the
/// viewport, and the repeater: the strategy decides which indices should be
/// rendered, the viewport publishes the decision, and the repeater turns it
/// into view instances.
///
/// Ranges are compared structurally; two ranges with the same bounds are the
/// same range.
///
/// # Example
///
/// ```
/// use understory_virtual_scroll::ListRange;
///
/// let rendered = ListRange::new(10, 20);
/// assert_eq!(rendered.len(), 10);
/// assert!(rendered.contains(10));
/// assert!(!rendered.contains(20));
/// assert!(rendered.contains_range(ListRange::new(12, 15)));
/// assert!(!rendered.contains_range(ListRange::new(5, 8)));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ListRange {
    /// First index in the range (inclusive).
    pub start: usize,
    /// One past the last index in the range (exclusive).
    pub end: usize,
}

impl ListRange {
    /// The empty range at index zero.
    pub const EMPTY: Self = Self { start: 0, end: 0 };

    /// Creates a new range.
    ///
    /// If `end < start`, the range is normalized to the empty range at `start`.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        if end < start {
            Self { start, end: start }
        } else {
            Self { start, end }
        }
    }

    /// Returns the number of indices in the range.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the range contains no indices.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns `true` if `index` lies within `[start, end)`.
    #[must_use]
    pub const fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }

    /// Returns `true` if every index of `other` lies within `self`.
    ///
    /// Empty ranges are contained in every range.
    #[must_use]
    pub const fn contains_range(&self, other: Self) -> bool {
        other.is_empty() || (other.start >= self.start && other.end <= self.end)
    }

    /// Clamps the range so that `start <= end <= len`.
    #[must_use]
    pub fn clamp_to_len(self, len: usize) -> Self {
        let end = self.end.min(len);
        Self {
            start: self.start.min(end),
            end,
        }
    }

    /// Converts the range into a [`core::ops::Range`].
    #[must_use]
    pub const fn as_range(&self) -> core::ops::Range<usize> {
        self.start..self.end
    }
}

impl From<core::ops::Range<usize>> for ListRange {
    fn from(range: core::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl fmt::Display for ListRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
