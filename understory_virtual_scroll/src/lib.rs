// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_virtual_scroll --heading-base-level=0

//! Understory Virtual Scroll: a virtual scrolling viewport and repeater.
//!
//! This crate renders only the slice of a long list that is near the visible
//! area of a scrollable viewport, while keeping the scrollbar sized as if
//! every item were present. It is split into three cooperating parts:
//!
//! - A [`VirtualScrollStrategy`] decides which [`ListRange`] of items to
//!   render given the scroll offset, the viewport size, and the data length.
//!   [`FixedSizeVirtualScrollStrategy`] handles items of uniform size with a
//!   minimum and maximum buffer beyond the visible area.
//! - The [`VirtualScrollViewport`] owns the scroll container. It measures the
//!   viewport, sizes a spacer to the total content size, positions the
//!   rendered items with a [`ContentTransform`], and batches all of its DOM-like
//!   writes into one change-detection pass per burst of updates.
//! - The repeater, [`VirtualForOf`], turns data snapshots and rendered ranges
//!   into view operations on a host [`ViewContainer`], diffing item identities
//!   and recycling detached views through a bounded cache.
//!
//! The crate does not know about any particular UI framework. Hosts provide:
//!
//! - A [`ViewportElement`] and a [`Scrollable`] for the scroll container.
//! - A [`HostScheduler`] to run microtasks and animation frames, and to run
//!   [`VirtualForOf::do_check`] when asked through
//!   [`HostScheduler::mark_for_check`].
//! - A [`ViewContainer`] that creates, moves, and measures item views.
//!
//! Everything is single-threaded and shares state through `Rc`. Callbacks
//! hold weak handles, so dropping or destroying a component silences them.
//!
//! ## Minimal example
//!
//! Driving the range computation directly:
//!
//! ```rust
//! use understory_virtual_scroll::{FixedSizeConfig, ListRange};
//!
//! // 50px items, at least 100px and up to 200px of buffer.
//! let config = FixedSizeConfig::new(50.0, 100.0, 200.0);
//! config.validate().unwrap();
//!
//! // A 500px viewport over 1000 items, scrolled to the top.
//! let range = config.next_range(ListRange::EMPTY, 0.0, 500.0, 1000);
//! assert_eq!(range, ListRange::new(0, 14));
//!
//! // Jumping far ahead re-centers the range around the new offset.
//! let range = config.next_range(range, 2500.0, 500.0, 1000);
//! assert!(range.contains(50) && range.contains(59));
//! ```
//!
//! See the crate's integration tests for a complete host wiring a viewport,
//! a strategy, and a repeater together with a [`TaskQueue`].
//!
//! This crate is `no_std` and uses `alloc`. Enable the `libm` feature when
//! building without `std`.

#![no_std]

extern crate alloc;

mod data_source;
mod differ;
mod error;
mod fixed_size;
mod observable;
mod range;
mod repeater;
mod scheduler;
mod scrollable;
mod strategy;
mod viewport;

pub use data_source::{ArrayDataSource, DataSource, VirtualForInput};
pub use differ::{DiffOp, IterableDiffer, diff_identities};
pub use error::{InvalidConfiguration, VirtualScrollError};
pub use fixed_size::{FixedSizeConfig, FixedSizeVirtualScrollStrategy};
pub use observable::{Observable, Subject, Subscription, SubscriptionBag};
pub use range::ListRange;
pub use repeater::{RepeaterConfig, RepeaterStats, ViewContainer, ViewContext, VirtualForOf};
pub use scheduler::{ChangeBatch, FrameAudit, HostScheduler, Task, TaskQueue};
pub use scrollable::{
    Direction, Directionality, ElementScrollable, RtlScrollAxisType, ScrollBehavior, ScrollEdge,
    ScrollElement, ScrollToOptions, Scrollable, ViewportRuler,
};
pub use strategy::VirtualScrollStrategy;
pub use viewport::{
    ContentAnchor, ContentTransform, Orientation, SpacerSize, ViewportElement, ViewportHost,
    VirtualScrollRepeater, VirtualScrollViewport, WeakVirtualScrollViewport,
};
