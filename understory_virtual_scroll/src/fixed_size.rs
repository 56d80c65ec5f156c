// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Virtual scrolling for uniformly sized items.
//!
//! With a fixed item extent, every index maps to a pixel offset by a single
//! multiplication, so the rendered range can be derived from the scroll
//! offset alone.
//!
//! The range is recomputed with two buffer thresholds. The window only grows
//! when the rendered buffer on one side drops below `min_buffer_px`, and when
//! it grows it grows far enough to reach `max_buffer_px`. A small scroll
//! therefore does not re-render, and a fast fling does not over-render.
//!
//! ```
//! use understory_virtual_scroll::{FixedSizeConfig, ListRange};
//!
//! // 1000 items of 50px in a 500px viewport.
//! let config = FixedSizeConfig::new(50.0, 100.0, 200.0);
//! let initial = config.next_range(ListRange::EMPTY, 0.0, 500.0, 1000);
//! assert_eq!(initial, ListRange::new(0, 14));
//!
//! let scrolled = config.next_range(initial, 2500.0, 500.0, 1000);
//! assert!(scrolled.start * 50 <= 2500 && scrolled.end * 50 >= 3000);
//! ```

use core::cell::{Cell, RefCell};
use core::fmt;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _; // for `floor` and `ceil`

use crate::error::{InvalidConfiguration, VirtualScrollError};
use crate::observable::{Observable, Subject};
use crate::range::ListRange;
use crate::scrollable::ScrollBehavior;
use crate::strategy::VirtualScrollStrategy;
use crate::viewport::{ContentAnchor, VirtualScrollViewport, WeakVirtualScrollViewport};

/// Item size and buffer thresholds for [`FixedSizeVirtualScrollStrategy`].
///
/// All values are in pixels along the scroll axis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FixedSizeConfig {
    /// Extent of every item.
    pub item_size: f64,
    /// Rendered buffer below which more items are rendered.
    pub min_buffer_px: f64,
    /// Buffer to reach when more items are rendered.
    pub max_buffer_px: f64,
}

impl Default for FixedSizeConfig {
    fn default() -> Self {
        Self {
            item_size: 20.0,
            min_buffer_px: 100.0,
            max_buffer_px: 200.0,
        }
    }
}

impl FixedSizeConfig {
    /// Creates a configuration. Call [`validate`](Self::validate) before use,
    /// or pass it to [`FixedSizeVirtualScrollStrategy::new`], which does.
    #[must_use]
    pub const fn new(item_size: f64, min_buffer_px: f64, max_buffer_px: f64) -> Self {
        Self {
            item_size,
            min_buffer_px,
            max_buffer_px,
        }
    }

    /// Checks that the item size is positive and the buffers are ordered.
    pub fn validate(&self) -> Result<(), InvalidConfiguration> {
        if !(self.item_size.is_finite() && self.item_size > 0.0) {
            return Err(InvalidConfiguration::NonPositiveItemSize(self.item_size));
        }
        for buffer in [self.min_buffer_px, self.max_buffer_px] {
            if !(buffer.is_finite() && buffer >= 0.0) {
                return Err(InvalidConfiguration::InvalidBufferSize(buffer));
            }
        }
        if self.max_buffer_px < self.min_buffer_px {
            return Err(InvalidConfiguration::BufferInverted {
                min_buffer_px: self.min_buffer_px,
                max_buffer_px: self.max_buffer_px,
            });
        }
        Ok(())
    }

    /// Returns the total content extent for `data_length` items.
    #[must_use]
    pub fn total_content_size(&self, data_length: usize) -> f64 {
        data_length as f64 * self.item_size
    }

    /// Returns the fractional index of the first visible item.
    ///
    /// The offset is clamped to the scrollable extent first.
    #[must_use]
    pub fn first_visible_index(
        &self,
        scroll_offset: f64,
        viewport_size: f64,
        data_length: usize,
    ) -> f64 {
        self.clamp_offset(scroll_offset, viewport_size, data_length) / self.item_size
    }

    fn clamp_offset(&self, scroll_offset: f64, viewport_size: f64, data_length: usize) -> f64 {
        let max_offset = (self.total_content_size(data_length) - viewport_size).max(0.0);
        if scroll_offset.is_nan() {
            return 0.0;
        }
        scroll_offset.clamp(0.0, max_offset)
    }

    /// Computes the next rendered range from the `current` one.
    ///
    /// Only one side is expanded per call, and the start side is checked
    /// first. A scroll that starves both sides at once settles over two
    /// calls. The result always satisfies `start <= end <= data_length`.
    #[must_use]
    pub fn next_range(
        &self,
        current: ListRange,
        scroll_offset: f64,
        viewport_size: f64,
        data_length: usize,
    ) -> ListRange {
        let item_size = self.item_size;
        let scroll_offset = self.clamp_offset(scroll_offset, viewport_size, data_length);
        let first_visible = scroll_offset / item_size;
        let mut range = current;

        let start_buffer = scroll_offset - range.start as f64 * item_size;
        if start_buffer < self.min_buffer_px && range.start != 0 {
            let expand_start = to_index(((self.max_buffer_px - start_buffer) / item_size).ceil());
            range.start = range.start.saturating_sub(expand_start);
            range.end = data_length.min(to_index(
                (first_visible + (viewport_size + self.min_buffer_px) / item_size).ceil(),
            ));
        } else {
            let end_buffer = range.end as f64 * item_size - (scroll_offset + viewport_size);
            if end_buffer < self.min_buffer_px && range.end != data_length {
                let expand_end = ((self.max_buffer_px - end_buffer) / item_size).ceil();
                if expand_end > 0.0 {
                    range.end = data_length.min(range.end.saturating_add(to_index(expand_end)));
                    range.start =
                        to_index((first_visible - self.min_buffer_px / item_size).floor());
                }
            }
        }

        ListRange::new(range.start, range.end).clamp_to_len(data_length)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "inputs are rounded and clamped to be non-negative; `as` saturates"
)]
fn to_index(value: f64) -> usize {
    value.max(0.0) as usize
}

/// A [`VirtualScrollStrategy`] for items that all have the same extent.
pub struct FixedSizeVirtualScrollStrategy {
    config: Cell<FixedSizeConfig>,
    viewport: RefCell<Option<WeakVirtualScrollViewport>>,
    scrolled_index: RefCell<Subject<usize>>,
}

impl fmt::Debug for FixedSizeVirtualScrollStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedSizeVirtualScrollStrategy")
            .field("config", &self.config.get())
            .field("attached", &self.is_attached())
            .field("scrolled_index", &self.scrolled_index.borrow())
            .finish_non_exhaustive()
    }
}

impl FixedSizeVirtualScrollStrategy {
    /// Creates a detached strategy after validating `config`.
    pub fn new(config: FixedSizeConfig) -> Result<Self, VirtualScrollError> {
        config.validate()?;
        Ok(Self {
            config: Cell::new(config),
            viewport: RefCell::new(None),
            scrolled_index: RefCell::new(Subject::distinct().replaying()),
        })
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn config(&self) -> FixedSizeConfig {
        self.config.get()
    }

    /// Replaces the item size and buffer thresholds, then recomputes the
    /// total content size and the rendered range.
    ///
    /// Fails with [`InvalidConfiguration`] and leaves the previous
    /// configuration in place when the new values are invalid.
    pub fn update_item_and_buffer_size(
        &self,
        item_size: f64,
        min_buffer_px: f64,
        max_buffer_px: f64,
    ) -> Result<(), VirtualScrollError> {
        let config = FixedSizeConfig::new(item_size, min_buffer_px, max_buffer_px);
        config.validate()?;
        self.config.set(config);
        self.update_total_content_size();
        self.update_rendered_range();
        Ok(())
    }

    fn viewport(&self) -> Option<VirtualScrollViewport> {
        self.viewport.borrow().as_ref().and_then(WeakVirtualScrollViewport::upgrade)
    }

    fn update_total_content_size(&self) {
        let Some(viewport) = self.viewport() else {
            return;
        };
        let total = self.config.get().total_content_size(viewport.data_length());
        viewport.set_total_content_size(total);
    }

    fn update_rendered_range(&self) {
        let Some(viewport) = self.viewport() else {
            return;
        };
        let config = self.config.get();
        let scroll_offset = viewport.measure_scroll_offset(None);
        let viewport_size = viewport.viewport_size();
        let data_length = viewport.data_length();
        let current = viewport.rendered_range();

        let range = config.next_range(current, scroll_offset, viewport_size, data_length);
        if range != current {
            log::debug!(
                "fixed-size strategy: rendered range {current} -> {range} (offset {scroll_offset}, viewport {viewport_size}, {data_length} items)"
            );
        }
        viewport.set_rendered_range(range);
        viewport.set_rendered_content_offset(
            config.item_size * range.start as f64,
            ContentAnchor::ToStart,
        );

        let first_visible = config.first_visible_index(scroll_offset, viewport_size, data_length);
        let subject = self.scrolled_index.borrow().clone();
        subject.next(to_index(first_visible.floor()));
    }
}

impl VirtualScrollStrategy for FixedSizeVirtualScrollStrategy {
    fn scrolled_index_change(&self) -> Observable<usize> {
        self.scrolled_index.borrow().observable()
    }

    fn attach(&self, viewport: &VirtualScrollViewport) -> Result<(), VirtualScrollError> {
        if self.is_attached() {
            return Err(VirtualScrollError::StrategyAlreadyAttached);
        }
        {
            let mut subject = self.scrolled_index.borrow_mut();
            if subject.is_completed() {
                *subject = Subject::distinct().replaying();
            }
        }
        *self.viewport.borrow_mut() = Some(viewport.downgrade());
        log::debug!("fixed-size strategy attached ({:?})", self.config.get());
        self.update_total_content_size();
        self.update_rendered_range();
        Ok(())
    }

    fn detach(&self) {
        let subject = self.scrolled_index.borrow().clone();
        subject.complete();
        if self.viewport.borrow_mut().take().is_some() {
            log::debug!("fixed-size strategy detached");
        }
    }

    fn is_attached(&self) -> bool {
        self.viewport().is_some()
    }

    fn on_content_scrolled(&self) {
        self.update_rendered_range();
    }

    fn on_data_length_changed(&self) {
        self.update_total_content_size();
        self.update_rendered_range();
    }

    fn on_content_rendered(&self) {}

    fn on_rendered_offset_changed(&self) {}

    fn scroll_to_index(&self, index: usize, behavior: ScrollBehavior) {
        if let Some(viewport) = self.viewport() {
            viewport.scroll_to_offset(index as f64 * self.config.get().item_size, behavior);
        }
    }
}
