// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The viewport controller: layout bookkeeping for a virtually scrolled list.
//!
//! [`VirtualScrollViewport`] owns the rendered range, the total content
//! size (which drives the spacer), and the offset of the rendered block. It
//! delegates every range decision to its [`VirtualScrollStrategy`] and every
//! view decision to the attached repeater.
//!
//! ## Batching
//!
//! Setters never write to the host directly. They record the new value,
//! mark the viewport dirty, and optionally queue a continuation. The first
//! mark schedules one microtask; when it runs, the viewport applies the
//! content transform and spacer size, requests exactly one host detection
//! pass, and then runs the queued continuations in order. Any number of
//! synchronous setter calls collapse into a single pass.
//!
//! ## End anchoring
//!
//! [`set_rendered_content_offset`](VirtualScrollViewport::set_rendered_content_offset)
//! accepts [`ContentAnchor::ToEnd`]: the offset names where the *end* of the
//! rendered block should sit. The viewport cannot know the block's size until
//! it is laid out, so it applies a `-100%` translation first and, after the
//! pass, measures the block and rewrites the offset as a start offset. Until
//! then [`offset_to_rendered_content_start`](VirtualScrollViewport::offset_to_rendered_content_start)
//! returns `None`.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};
use core::fmt;

use kurbo::Size;

use crate::error::VirtualScrollError;
use crate::observable::{Observable, Subject, Subscription, SubscriptionBag};
use crate::range::ListRange;
use crate::scheduler::{ChangeBatch, FrameAudit, HostScheduler, Task};
use crate::scrollable::{
    Direction, Directionality, ScrollBehavior, ScrollEdge, ScrollToOptions, Scrollable,
    ViewportRuler,
};
use crate::strategy::VirtualScrollStrategy;

/// The axis a viewport scrolls along.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Items stack top to bottom.
    #[default]
    Vertical,
    /// Items stack along the inline axis.
    Horizontal,
}

impl Orientation {
    /// Returns `true` for [`Orientation::Horizontal`].
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Horizontal)
    }

    /// Returns the extent of `size` along this axis.
    #[must_use]
    pub fn extent(self, size: Size) -> f64 {
        match self {
            Self::Vertical => size.height,
            Self::Horizontal => size.width,
        }
    }
}

/// Which edge of the rendered block an offset refers to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContentAnchor {
    /// The offset positions the start of the block.
    #[default]
    ToStart,
    /// The offset positions the end of the block.
    ToEnd,
}

/// The translation applied to the rendered block.
///
/// `offset` already carries the direction sign: it is negated for
/// horizontal RTL viewports. [`Display`](fmt::Display) renders the CSS
/// transform, for example `translateY(50px)` or
/// `translateX(-50px) translateX(-100%)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContentTransform {
    /// Axis of the translation.
    pub orientation: Orientation,
    /// Signed translation in pixels.
    pub offset: f64,
    /// Whether the block is additionally shifted back by its own extent.
    pub to_end: bool,
}

impl fmt::Display for ContentTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = if self.orientation.is_horizontal() { 'X' } else { 'Y' };
        write!(f, "translate{axis}({}px)", self.offset)?;
        if self.to_end {
            write!(f, " translate{axis}(-100%)")?;
        }
        Ok(())
    }
}

/// Size of the spacer that stretches the scroll container to the full
/// virtual extent. Exactly one axis is set.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SpacerSize {
    /// Width in pixels, for horizontal viewports.
    pub width: Option<f64>,
    /// Height in pixels, for vertical viewports.
    pub height: Option<f64>,
}

impl SpacerSize {
    fn for_content(orientation: Orientation, total: f64) -> Self {
        match orientation {
            Orientation::Vertical => Self {
                width: None,
                height: Some(total),
            },
            Orientation::Horizontal => Self {
                width: Some(total),
                height: None,
            },
        }
    }
}

/// The host element behind a viewport.
pub trait ViewportElement {
    /// Visible size of the scroll container.
    fn client_size(&self) -> Size;

    /// Laid-out size of the wrapper around the rendered items.
    fn content_wrapper_size(&self) -> Size;

    /// Writes the rendered block's transform.
    fn apply_content_transform(&self, transform: &ContentTransform);

    /// Writes the spacer's size.
    fn apply_spacer_size(&self, spacer: SpacerSize);
}

/// What a viewport needs from the repeater attached to it.
pub trait VirtualScrollRepeater {
    /// Emits the length of every data snapshot. Replays the latest length.
    fn data_lengths(&self) -> Observable<usize>;

    /// Sums the extent of the rendered views for `range`.
    fn measure_range_size(
        &self,
        range: ListRange,
        orientation: Orientation,
    ) -> Result<f64, VirtualScrollError>;
}

/// Host collaborators of a [`VirtualScrollViewport`].
pub struct ViewportHost {
    element: Rc<dyn ViewportElement>,
    scrollable: Rc<dyn Scrollable>,
    scheduler: Rc<dyn HostScheduler>,
    dir: Option<Rc<dyn Directionality>>,
    ruler: Option<Rc<dyn ViewportRuler>>,
}

impl fmt::Debug for ViewportHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportHost")
            .field("direction", &self.dir.as_ref().map(|d| d.value()))
            .field("ruler", &self.ruler.is_some())
            .finish_non_exhaustive()
    }
}

impl ViewportHost {
    /// Bundles the required collaborators.
    pub fn new(
        element: Rc<dyn ViewportElement>,
        scrollable: Rc<dyn Scrollable>,
        scheduler: Rc<dyn HostScheduler>,
    ) -> Self {
        Self {
            element,
            scrollable,
            scheduler,
            dir: None,
            ruler: None,
        }
    }

    /// Adds a directionality source. Without one the viewport assumes LTR.
    #[must_use]
    pub fn with_direction(mut self, dir: Rc<dyn Directionality>) -> Self {
        self.dir = Some(dir);
        self
    }

    /// Adds a viewport ruler whose changes trigger a size re-check.
    #[must_use]
    pub fn with_ruler(mut self, ruler: Rc<dyn ViewportRuler>) -> Self {
        self.ruler = Some(ruler);
        self
    }

    fn is_rtl(&self) -> bool {
        self.dir.as_ref().is_some_and(|d| d.value() == Direction::Rtl)
    }
}

#[derive(Debug, Default)]
struct ViewportState {
    orientation: Orientation,
    initialized: bool,
    data_length: usize,
    viewport_size: f64,
    total_content_size: f64,
    spacer: SpacerSize,
    rendered_range: ListRange,
    rendered_content_offset: f64,
    offset_needs_rewrite: bool,
    transform: Option<ContentTransform>,
    applied_transform: Option<ContentTransform>,
    applied_spacer: Option<SpacerSize>,
}

struct RepeaterLink {
    repeater: Weak<dyn VirtualScrollRepeater>,
    lengths: Subscription,
}

struct ViewportInner {
    host: ViewportHost,
    strategy: Rc<dyn VirtualScrollStrategy>,
    state: RefCell<ViewportState>,
    batch: RefCell<ChangeBatch>,
    rendered_range: Subject<ListRange>,
    scrolled_index: Subject<usize>,
    subscriptions: RefCell<SubscriptionBag>,
    repeater: RefCell<Option<RepeaterLink>>,
    scroll_audit: FrameAudit,
    resize_audit: FrameAudit,
    destroyed: Cell<bool>,
}

/// A virtually scrolled viewport.
///
/// `VirtualScrollViewport` is a cheap-to-clone handle; clones control the
/// same viewport. Strategies and repeaters keep only weak references to it
/// (see [`downgrade`](Self::downgrade)), and every callback it registers with
/// the host becomes a no-op once the viewport is destroyed or dropped.
#[derive(Clone)]
pub struct VirtualScrollViewport {
    inner: Rc<ViewportInner>,
}

impl fmt::Debug for VirtualScrollViewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualScrollViewport")
            .field("state", &self.inner.state.borrow())
            .field("batch", &self.inner.batch.borrow())
            .field("destroyed", &self.inner.destroyed.get())
            .finish_non_exhaustive()
    }
}

/// A weak handle to a [`VirtualScrollViewport`].
#[derive(Clone, Debug)]
pub struct WeakVirtualScrollViewport {
    inner: Weak<ViewportInner>,
}

impl WeakVirtualScrollViewport {
    /// Returns the viewport if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<VirtualScrollViewport> {
        self.inner.upgrade().map(|inner| VirtualScrollViewport { inner })
    }
}

impl VirtualScrollViewport {
    /// Creates a viewport over `host`, driven by `strategy`.
    ///
    /// Fails with [`VirtualScrollError::MissingStrategy`] when no strategy
    /// is given. The viewport does nothing until [`init`](Self::init).
    pub fn new(
        host: ViewportHost,
        strategy: Option<Rc<dyn VirtualScrollStrategy>>,
        orientation: Orientation,
    ) -> Result<Self, VirtualScrollError> {
        let strategy = strategy.ok_or(VirtualScrollError::MissingStrategy)?;
        let state = ViewportState {
            orientation,
            spacer: SpacerSize::for_content(orientation, 0.0),
            ..ViewportState::default()
        };
        Ok(Self {
            inner: Rc::new(ViewportInner {
                host,
                strategy,
                state: RefCell::new(state),
                batch: RefCell::new(ChangeBatch::new()),
                rendered_range: Subject::new().replaying(),
                scrolled_index: Subject::distinct().replaying(),
                subscriptions: RefCell::new(SubscriptionBag::new()),
                repeater: RefCell::new(None),
                scroll_audit: FrameAudit::new(),
                resize_audit: FrameAudit::new(),
                destroyed: Cell::new(false),
            }),
        })
    }

    /// Returns a weak handle to this viewport.
    #[must_use]
    pub fn downgrade(&self) -> WeakVirtualScrollViewport {
        WeakVirtualScrollViewport {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Measures the viewport, attaches the strategy, and starts listening to
    /// scroll and resize events.
    ///
    /// Call once the host element is laid out. A synthetic scroll check is
    /// scheduled for the next frame so the initial position is picked up.
    /// Calling `init` again is a no-op.
    pub fn init(&self) -> Result<(), VirtualScrollError> {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.initialized || self.inner.destroyed.get() {
                return Ok(());
            }
            state.initialized = true;
        }
        self.measure_viewport_size();
        if let Err(err) = self.inner.strategy.attach(self) {
            self.inner.state.borrow_mut().initialized = false;
            return Err(err);
        }

        let mut bag = SubscriptionBag::new();

        let weak = self.downgrade();
        bag.add(self.inner.strategy.scrolled_index_change().subscribe(move |&index| {
            let Some(viewport) = weak.upgrade() else {
                return;
            };
            let weak = viewport.downgrade();
            viewport.inner.host.scheduler.schedule_microtask(Box::new(move || {
                if let Some(viewport) = weak.upgrade() {
                    viewport.inner.scrolled_index.next(index);
                }
            }));
        }));

        let weak = self.downgrade();
        bag.add(self.inner.host.scrollable.element_scrolled().subscribe(move |_| {
            if let Some(viewport) = weak.upgrade() {
                viewport.schedule_scroll_check();
            }
        }));
        self.schedule_scroll_check();

        if let Some(ruler) = &self.inner.host.ruler {
            let weak = self.downgrade();
            bag.add(ruler.change().subscribe(move |_| {
                if let Some(viewport) = weak.upgrade() {
                    viewport.schedule_resize_check();
                }
            }));
        }

        self.inner.subscriptions.borrow_mut().append(bag);
        log::debug!(
            "virtual scroll viewport initialized ({:?}, {}px)",
            self.orientation(),
            self.viewport_size()
        );
        self.mark_change_detection_needed(None);
        Ok(())
    }

    /// Detaches the repeater and the strategy, completes the viewport's
    /// streams, and drops every host subscription. Idempotent.
    ///
    /// The strategy is only detached when [`init`](Self::init) attached it to
    /// this viewport; a strategy bound to another viewport is left alone.
    pub fn destroy(&self) {
        if self.inner.destroyed.replace(true) {
            return;
        }
        self.detach();
        if self.inner.state.borrow().initialized {
            self.inner.strategy.detach();
        }
        self.inner.rendered_range.complete();
        self.inner.scrolled_index.complete();
        let mut subscriptions = core::mem::take(&mut *self.inner.subscriptions.borrow_mut());
        subscriptions.unsubscribe_all();
        self.inner.batch.borrow_mut().clear();
        log::debug!("virtual scroll viewport destroyed");
    }

    /// Returns `true` after [`destroy`](Self::destroy).
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// Attaches the repeater that renders this viewport's items.
    ///
    /// The viewport follows the repeater's data lengths: a new length is
    /// forwarded to the strategy, and every snapshot triggers an immediate
    /// layout pass. Fails with [`VirtualScrollError::ViewportAlreadyAttached`]
    /// while another live repeater is attached.
    ///
    /// A `repeater` that has already been dropped binds nothing; the call
    /// still returns `Ok(())`.
    pub fn attach(
        &self,
        repeater: Weak<dyn VirtualScrollRepeater>,
    ) -> Result<(), VirtualScrollError> {
        let live = self
            .inner
            .repeater
            .borrow()
            .as_ref()
            .is_some_and(|link| link.repeater.strong_count() > 0);
        if live {
            return Err(VirtualScrollError::ViewportAlreadyAttached);
        }
        let Some(strong) = repeater.upgrade() else {
            log::debug!("virtual scroll viewport: ignoring attach of a dropped repeater");
            return Ok(());
        };
        // Replace a stale link before subscribing: the replayed length
        // arrives synchronously.
        self.detach();
        *self.inner.repeater.borrow_mut() = Some(RepeaterLink {
            repeater,
            lengths: Subscription::empty(),
        });
        let weak = self.downgrade();
        let lengths = strong.data_lengths().subscribe(move |&length| {
            if let Some(viewport) = weak.upgrade() {
                viewport.on_data_length(length);
            }
        });
        match self.inner.repeater.borrow_mut().as_mut() {
            Some(link) => link.lengths = lengths,
            None => {
                let mut lengths = lengths;
                lengths.unsubscribe();
            }
        }
        log::debug!("repeater attached to virtual scroll viewport");
        Ok(())
    }

    /// Releases the attached repeater, if any.
    pub fn detach(&self) {
        let link = self.inner.repeater.borrow_mut().take();
        if let Some(mut link) = link {
            link.lengths.unsubscribe();
            log::debug!("repeater detached from virtual scroll viewport");
        }
    }

    fn on_data_length(&self, length: usize) {
        if self.is_destroyed() {
            return;
        }
        let changed = {
            let mut state = self.inner.state.borrow_mut();
            let changed = state.data_length != length;
            state.data_length = length;
            changed
        };
        if changed {
            self.inner.strategy.on_data_length_changed();
        }
        self.do_change_detection();
    }

    /// Returns the orientation.
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.inner.state.borrow().orientation
    }

    /// Changes the orientation and recomputes the spacer.
    pub fn set_orientation(&self, orientation: Orientation) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.orientation == orientation {
                return;
            }
            state.orientation = orientation;
            state.spacer = SpacerSize::for_content(orientation, state.total_content_size);
        }
        self.mark_change_detection_needed(None);
    }

    /// Returns the number of items in the attached data.
    #[must_use]
    pub fn data_length(&self) -> usize {
        self.inner.state.borrow().data_length
    }

    /// Returns the cached viewport extent along the scroll axis.
    #[must_use]
    pub fn viewport_size(&self) -> f64 {
        self.inner.state.borrow().viewport_size
    }

    /// Returns the currently rendered range.
    #[must_use]
    pub fn rendered_range(&self) -> ListRange {
        self.inner.state.borrow().rendered_range
    }

    /// Returns the total virtual content extent.
    #[must_use]
    pub fn total_content_size(&self) -> f64 {
        self.inner.state.borrow().total_content_size
    }

    /// Returns the spacer size the next pass will apply.
    #[must_use]
    pub fn spacer_size(&self) -> SpacerSize {
        self.inner.state.borrow().spacer
    }

    /// Returns the transform the next pass will apply, once an offset was set.
    #[must_use]
    pub fn content_transform(&self) -> Option<ContentTransform> {
        self.inner.state.borrow().transform
    }

    /// Emits every new rendered range. Replays the current range.
    #[must_use]
    pub fn rendered_range_stream(&self) -> Observable<ListRange> {
        self.inner.rendered_range.observable()
    }

    /// Emits the index of the first visible item, one microtask after the
    /// strategy reports it. Replays the latest index.
    #[must_use]
    pub fn scrolled_index_change(&self) -> Observable<usize> {
        self.inner.scrolled_index.observable()
    }

    /// Sets the total virtual content extent, resizing the spacer.
    pub fn set_total_content_size(&self, size: f64) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.total_content_size == size {
                return;
            }
            state.total_content_size = size;
            state.spacer = SpacerSize::for_content(state.orientation, size);
        }
        self.mark_change_detection_needed(None);
    }

    /// Sets the rendered range.
    ///
    /// A structurally equal range is ignored. Otherwise the range is
    /// published and the strategy is told once the next pass has run.
    pub fn set_rendered_range(&self, range: ListRange) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.rendered_range == range {
                return;
            }
            state.rendered_range = range;
        }
        self.inner.rendered_range.next(range);
        let weak = self.downgrade();
        self.mark_change_detection_needed(Some(Box::new(move || {
            if let Some(viewport) = weak.upgrade() {
                viewport.inner.strategy.on_content_rendered();
            }
        })));
    }

    /// Returns the offset of the rendered block from the content start, or
    /// `None` while an end-anchored offset is waiting to be rewritten.
    #[must_use]
    pub fn offset_to_rendered_content_start(&self) -> Option<f64> {
        let state = self.inner.state.borrow();
        (!state.offset_needs_rewrite).then_some(state.rendered_content_offset)
    }

    /// Positions the rendered block at `offset` pixels along the scroll axis.
    ///
    /// With [`ContentAnchor::ToEnd`] the offset names the block's end edge
    /// and is rewritten as a start offset after the next pass.
    pub fn set_rendered_content_offset(&self, offset: f64, anchor: ContentAnchor) {
        let changed = {
            let mut state = self.inner.state.borrow_mut();
            let orientation = state.orientation;
            let sign = if orientation.is_horizontal() && self.inner.host.is_rtl() {
                -1.0
            } else {
                1.0
            };
            let transform = ContentTransform {
                orientation,
                offset: positive_zero(sign * offset),
                to_end: anchor == ContentAnchor::ToEnd,
            };
            state.rendered_content_offset = offset;
            if transform.to_end {
                state.offset_needs_rewrite = true;
            }
            if state.transform == Some(transform) {
                false
            } else {
                state.transform = Some(transform);
                true
            }
        };
        if changed {
            let weak = self.downgrade();
            self.mark_change_detection_needed(Some(Box::new(move || {
                if let Some(viewport) = weak.upgrade() {
                    viewport.after_offset_applied();
                }
            })));
        }
    }

    fn after_offset_applied(&self) {
        if self.inner.state.borrow().offset_needs_rewrite {
            let measured = self.measure_rendered_content_size();
            let offset = {
                let mut state = self.inner.state.borrow_mut();
                state.rendered_content_offset -= measured;
                state.offset_needs_rewrite = false;
                state.rendered_content_offset
            };
            log::trace!("rewrote end-anchored content offset as {offset}px from start");
            self.set_rendered_content_offset(offset, ContentAnchor::ToStart);
        } else {
            self.inner.strategy.on_rendered_offset_changed();
        }
    }

    /// Scrolls to `offset` pixels from the start of the content.
    pub fn scroll_to_offset(&self, offset: f64, behavior: ScrollBehavior) {
        let options = ScrollToOptions::new(behavior);
        let options = if self.orientation().is_horizontal() {
            options.start(offset)
        } else {
            options.top(offset)
        };
        self.inner.host.scrollable.scroll_to(options);
    }

    /// Scrolls so that item `index` is at the start of the viewport.
    pub fn scroll_to_index(&self, index: usize, behavior: ScrollBehavior) {
        self.inner.strategy.scroll_to_index(index, behavior);
    }

    /// Returns the scroll offset from `edge`, or from the start of the
    /// scroll axis (`Start` when horizontal, `Top` when vertical).
    #[must_use]
    pub fn measure_scroll_offset(&self, edge: Option<ScrollEdge>) -> f64 {
        let edge = edge.unwrap_or(if self.orientation().is_horizontal() {
            ScrollEdge::Start
        } else {
            ScrollEdge::Top
        });
        self.inner.host.scrollable.measure_scroll_offset(edge)
    }

    /// Returns the laid-out extent of the rendered block.
    #[must_use]
    pub fn measure_rendered_content_size(&self) -> f64 {
        self.orientation()
            .extent(self.inner.host.element.content_wrapper_size())
    }

    /// Returns the combined extent of the rendered items in `range`.
    ///
    /// Fails with [`VirtualScrollError::RangeNotRendered`] unless `range`
    /// lies within the rendered range. Returns `0.0` without a repeater.
    pub fn measure_range_size(&self, range: ListRange) -> Result<f64, VirtualScrollError> {
        let rendered = self.rendered_range();
        if !rendered.contains_range(range) {
            return Err(VirtualScrollError::RangeNotRendered {
                requested: range,
                rendered,
            });
        }
        let repeater = self
            .inner
            .repeater
            .borrow()
            .as_ref()
            .and_then(|link| link.repeater.upgrade());
        match repeater {
            Some(repeater) => repeater.measure_range_size(range, self.orientation()),
            None => Ok(0.0),
        }
    }

    /// Re-measures the viewport and lets the strategy recompute.
    pub fn check_viewport_size(&self) {
        self.measure_viewport_size();
        self.inner.strategy.on_data_length_changed();
    }

    fn measure_viewport_size(&self) {
        let size = self.inner.host.element.client_size();
        let mut state = self.inner.state.borrow_mut();
        state.viewport_size = state.orientation.extent(size);
    }

    fn schedule_scroll_check(&self) {
        let weak = self.downgrade();
        self.inner
            .scroll_audit
            .notify(&*self.inner.host.scheduler, move || {
                if let Some(viewport) = weak.upgrade() {
                    if !viewport.is_destroyed() {
                        viewport.inner.strategy.on_content_scrolled();
                    }
                }
            });
    }

    fn schedule_resize_check(&self) {
        let weak = self.downgrade();
        self.inner
            .resize_audit
            .notify(&*self.inner.host.scheduler, move || {
                if let Some(viewport) = weak.upgrade() {
                    if !viewport.is_destroyed() {
                        viewport.check_viewport_size();
                    }
                }
            });
    }

    fn mark_change_detection_needed(&self, continuation: Option<Task>) {
        if self.is_destroyed() {
            return;
        }
        let schedule = self.inner.batch.borrow_mut().mark(continuation);
        if schedule {
            let weak = self.downgrade();
            self.inner.host.scheduler.schedule_microtask(Box::new(move || {
                if let Some(viewport) = weak.upgrade() {
                    if viewport.inner.batch.borrow().is_pending() {
                        viewport.do_change_detection();
                    }
                }
            }));
        }
    }

    fn do_change_detection(&self) {
        if self.is_destroyed() {
            return;
        }
        let continuations = self.inner.batch.borrow_mut().take();
        let (transform, spacer) = {
            let mut state = self.inner.state.borrow_mut();
            let transform = state.transform.filter(|t| state.applied_transform != Some(*t));
            let spacer = Some(state.spacer).filter(|s| state.applied_spacer != Some(*s));
            if transform.is_some() {
                state.applied_transform = transform;
            }
            if spacer.is_some() {
                state.applied_spacer = spacer;
            }
            (transform, spacer)
        };
        let element = &self.inner.host.element;
        if let Some(transform) = transform {
            element.apply_content_transform(&transform);
        }
        if let Some(spacer) = spacer {
            element.apply_spacer_size(spacer);
        }
        log::trace!(
            "viewport pass: transform {}, spacer {}, {} continuation(s)",
            transform.is_some(),
            spacer.is_some(),
            continuations.len()
        );
        self.inner.host.scheduler.mark_for_check();
        for continuation in continuations {
            continuation();
        }
    }
}

fn positive_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}
