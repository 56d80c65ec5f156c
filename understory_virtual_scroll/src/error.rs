// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration errors raised by the virtual scroll subsystem.
//!
//! Every error here indicates an integration bug in how the host wired or
//! configured the subsystem. Errors are returned synchronously from the call
//! that misused the API.
//!
//! Invalid runtime *states*, such as a scroll offset past the end of the
//! content, are clamped instead of reported.

use crate::ListRange;

/// Errors returned by the virtual scroll subsystem.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum VirtualScrollError {
    /// A strategy parameter is out of its valid domain.
    #[error(transparent)]
    InvalidConfiguration(#[from] InvalidConfiguration),
    /// A viewport was created without a scroll strategy.
    #[error("virtual scroll viewport requires a scroll strategy (for example a fixed item size)")]
    MissingStrategy,
    /// A repeater tried to attach to a viewport that already has one.
    #[error("virtual scroll viewport is already attached to a repeater")]
    ViewportAlreadyAttached,
    /// A strategy was attached while it is still bound to a viewport.
    #[error("scroll strategy is already attached to a viewport")]
    StrategyAlreadyAttached,
    /// A measurement was requested for items that are not rendered.
    #[error("attempted to measure items {requested} outside of the rendered range {rendered}")]
    RangeNotRendered {
        /// The range whose size was requested.
        requested: ListRange,
        /// The range rendered at the time of the request.
        rendered: ListRange,
    },
}

/// Parameter errors for scroll strategies.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum InvalidConfiguration {
    /// `max_buffer_px` is smaller than `min_buffer_px`.
    #[error(
        "maxBufferPx ({max_buffer_px}) must be greater than or equal to minBufferPx ({min_buffer_px})"
    )]
    BufferInverted {
        /// The requested minimum buffer.
        min_buffer_px: f64,
        /// The requested maximum buffer.
        max_buffer_px: f64,
    },
    /// The item size is zero, negative, or not finite.
    #[error("item size must be a positive, finite number of pixels (got {0})")]
    NonPositiveItemSize(f64),
    /// A buffer size is negative or not finite.
    #[error("buffer sizes must be non-negative, finite numbers of pixels (got {0})")]
    InvalidBufferSize(f64),
}
