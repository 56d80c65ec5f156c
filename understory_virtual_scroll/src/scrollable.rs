// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll-container capabilities consumed by the viewport.
//!
//! The viewport never touches a host element's raw scroll metrics. It talks
//! to a [`Scrollable`], which already resolves the logical edges
//! (`Start`/`End`) against the current [`Direction`] and hides the
//! browser-style RTL scroll-axis quirks.
//!
//! [`ElementScrollable`] is a ready-made [`Scrollable`] over any
//! [`ScrollElement`] that exposes raw metrics (`scroll_left`, `scroll_width`,
//! and so on). Hosts whose scroll containers are already normalized can
//! implement [`Scrollable`] directly instead.

use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt;

use kurbo::Size;

use crate::observable::{Observable, Subject};

/// Text direction of the surrounding layout.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Left to right.
    #[default]
    Ltr,
    /// Right to left.
    Rtl,
}

/// A readable source of the current [`Direction`].
pub trait Directionality {
    /// Returns the current direction.
    fn value(&self) -> Direction;
}

impl Directionality for Direction {
    fn value(&self) -> Direction {
        *self
    }
}

impl Directionality for Cell<Direction> {
    fn value(&self) -> Direction {
        self.get()
    }
}

/// How a programmatic scroll should animate.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScrollBehavior {
    /// Let the host decide.
    #[default]
    Auto,
    /// Animate smoothly.
    Smooth,
    /// Jump immediately.
    Instant,
}

/// One of the six edges a scroll offset can be measured from.
///
/// `Start` and `End` are logical: they resolve to `Left`/`Right` in LTR and
/// `Right`/`Left` in RTL.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScrollEdge {
    /// Physical top edge.
    Top,
    /// Physical bottom edge.
    Bottom,
    /// Physical left edge.
    Left,
    /// Physical right edge.
    Right,
    /// Logical inline-start edge.
    Start,
    /// Logical inline-end edge.
    End,
}

/// A normalized scroll request. Each offset is measured from its own edge.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ScrollToOptions {
    /// Offset from the top edge.
    pub top: Option<f64>,
    /// Offset from the bottom edge.
    pub bottom: Option<f64>,
    /// Offset from the left edge.
    pub left: Option<f64>,
    /// Offset from the right edge.
    pub right: Option<f64>,
    /// Offset from the logical start edge.
    pub start: Option<f64>,
    /// Offset from the logical end edge.
    pub end: Option<f64>,
    /// Scroll animation behavior.
    pub behavior: ScrollBehavior,
}

impl ScrollToOptions {
    /// Creates an empty request with the given behavior.
    #[must_use]
    pub fn new(behavior: ScrollBehavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    /// Sets the offset from the top edge.
    #[must_use]
    pub fn top(mut self, offset: f64) -> Self {
        self.top = Some(offset);
        self
    }

    /// Sets the offset from the logical start edge.
    #[must_use]
    pub fn start(mut self, offset: f64) -> Self {
        self.start = Some(offset);
        self
    }
}

/// The normalized scroll-container capability.
pub trait Scrollable {
    /// Emits once per scroll event on the container.
    fn element_scrolled(&self) -> Observable<()>;

    /// Returns the scroll offset measured from `edge`.
    fn measure_scroll_offset(&self, edge: ScrollEdge) -> f64;

    /// Scrolls the container. Logical edges are resolved by the implementation.
    fn scroll_to(&self, options: ScrollToOptions);
}

/// Window-level geometry service: fires on resize or orientation change.
pub trait ViewportRuler {
    /// Emits whenever the host viewport changes size.
    fn change(&self) -> Observable<()>;

    /// Returns the current host viewport size.
    fn viewport_size(&self) -> Size;
}

/// How a host reports `scroll_left` for RTL scroll containers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RtlScrollAxisType {
    /// `scroll_left` is `0` at the far left and grows to the right.
    #[default]
    Normal,
    /// `scroll_left` is `0` at the far right and decreases to the left.
    Negated,
    /// `scroll_left` is `0` at the far right and grows to the left.
    Inverted,
}

/// Raw scroll metrics of a host element.
pub trait ScrollElement {
    /// Current vertical scroll position.
    fn scroll_top(&self) -> f64;
    /// Current horizontal scroll position, in the host's RTL convention.
    fn scroll_left(&self) -> f64;
    /// Total scrollable content width.
    fn scroll_width(&self) -> f64;
    /// Total scrollable content height.
    fn scroll_height(&self) -> f64;
    /// Visible width.
    fn client_width(&self) -> f64;
    /// Visible height.
    fn client_height(&self) -> f64;
    /// Moves the scroll position. `None` leaves an axis untouched.
    fn set_scroll_position(&self, top: Option<f64>, left: Option<f64>, behavior: ScrollBehavior);
}

/// A [`Scrollable`] over raw [`ScrollElement`] metrics.
///
/// The host feeds scroll events in through [`notify_scrolled`](Self::notify_scrolled).
pub struct ElementScrollable<E> {
    element: E,
    dir: Option<Rc<dyn Directionality>>,
    rtl_axis: RtlScrollAxisType,
    scrolled: Subject<()>,
}

impl<E: fmt::Debug> fmt::Debug for ElementScrollable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementScrollable")
            .field("element", &self.element)
            .field("direction", &self.dir.as_ref().map(|d| d.value()))
            .field("rtl_axis", &self.rtl_axis)
            .finish_non_exhaustive()
    }
}

impl<E: ScrollElement> ElementScrollable<E> {
    /// Wraps `element`, assuming LTR layout.
    pub fn new(element: E) -> Self {
        Self {
            element,
            dir: None,
            rtl_axis: RtlScrollAxisType::Normal,
            scrolled: Subject::new(),
        }
    }

    /// Reads the layout direction from `dir`.
    #[must_use]
    pub fn with_direction(mut self, dir: Rc<dyn Directionality>) -> Self {
        self.dir = Some(dir);
        self
    }

    /// Sets how the host reports `scroll_left` in RTL layouts.
    #[must_use]
    pub fn with_rtl_scroll_axis(mut self, rtl_axis: RtlScrollAxisType) -> Self {
        self.rtl_axis = rtl_axis;
        self
    }

    /// Returns the wrapped element.
    pub fn element(&self) -> &E {
        &self.element
    }

    /// Forwards a host scroll event to [`Scrollable::element_scrolled`] subscribers.
    pub fn notify_scrolled(&self) {
        self.scrolled.next(());
    }

    fn is_rtl(&self) -> bool {
        self.dir.as_ref().is_some_and(|d| d.value() == Direction::Rtl)
    }

    fn max_scroll_left(&self) -> f64 {
        self.element.scroll_width() - self.element.client_width()
    }
}

impl<E: ScrollElement> Scrollable for ElementScrollable<E> {
    fn element_scrolled(&self) -> Observable<()> {
        self.scrolled.observable()
    }

    fn measure_scroll_offset(&self, edge: ScrollEdge) -> f64 {
        let el = &self.element;
        let rtl = self.is_rtl();
        let from_left = match edge {
            ScrollEdge::Top => return el.scroll_top(),
            ScrollEdge::Bottom => return el.scroll_height() - el.client_height() - el.scroll_top(),
            ScrollEdge::Left => true,
            ScrollEdge::Right => false,
            ScrollEdge::Start => !rtl,
            ScrollEdge::End => rtl,
        };
        let max = self.max_scroll_left();
        let left = el.scroll_left();
        match (rtl, self.rtl_axis, from_left) {
            (true, RtlScrollAxisType::Inverted, true) => max - left,
            (true, RtlScrollAxisType::Inverted, false) => left,
            (true, RtlScrollAxisType::Negated, true) => left + max,
            (true, RtlScrollAxisType::Negated, false) => -left,
            (_, _, true) => left,
            (_, _, false) => max - left,
        }
    }

    fn scroll_to(&self, mut options: ScrollToOptions) {
        let el = &self.element;
        let rtl = self.is_rtl();

        // Logical edges become physical ones.
        if options.left.is_none() {
            options.left = if rtl { options.end } else { options.start };
        }
        if options.right.is_none() {
            options.right = if rtl { options.start } else { options.end };
        }

        if let Some(bottom) = options.bottom {
            options.top = Some(el.scroll_height() - el.client_height() - bottom);
        }

        if rtl && self.rtl_axis != RtlScrollAxisType::Normal {
            if let Some(left) = options.left {
                options.right = Some(self.max_scroll_left() - left);
            }
            match self.rtl_axis {
                RtlScrollAxisType::Inverted => options.left = options.right,
                RtlScrollAxisType::Negated => options.left = options.right.map(|r| -r),
                RtlScrollAxisType::Normal => {}
            }
        } else if let Some(right) = options.right {
            options.left = Some(self.max_scroll_left() - right);
        }

        el.set_scroll_position(options.top, options.left, options.behavior);
    }
}
