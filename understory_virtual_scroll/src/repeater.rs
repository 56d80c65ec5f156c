// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The repeater: maps the rendered window of a data snapshot onto views.
//!
//! [`VirtualForOf`] listens to two inputs, the data snapshots of its
//! [`DataSource`] and the viewport's rendered range. Either one re-slices
//! the window and flags a patch pass. The pass itself runs in
//! [`VirtualForOf::do_check`], which the host calls from its detection
//! cycle (the viewport requests one through
//! [`HostScheduler::mark_for_check`](crate::HostScheduler::mark_for_check)).
//!
//! A patch pass diffs the identities of the previous and the new window:
//!
//! - new identities get a view from the recycle cache, or a freshly created one;
//! - removed identities have their view detached and cached, or destroyed
//!   once the cache holds [`RepeaterConfig::template_cache_size`] views;
//! - moved identities keep their view, which is relocated;
//! - finally every attached view's [`ViewContext`] is recomputed.
//!
//! Views are owned exclusively by the repeater. The [`ViewContainer`] is
//! told where views go but never holds them.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::hash::Hash;

use kurbo::Rect;
use smallvec::SmallVec;

use crate::data_source::{DataSource, VirtualForInput};
use crate::differ::{DiffOp, IterableDiffer};
use crate::error::VirtualScrollError;
use crate::observable::{Observable, Subject, Subscription, SubscriptionBag};
use crate::range::ListRange;
use crate::viewport::{Orientation, VirtualScrollRepeater, VirtualScrollViewport};

/// Template context bound to each rendered view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewContext<T> {
    /// The item rendered by the view.
    pub implicit: T,
    /// Absolute index of the item in the data.
    pub index: usize,
    /// Number of items in the data.
    pub count: usize,
    /// `index == 0`.
    pub first: bool,
    /// `index == count - 1`.
    pub last: bool,
    /// `index` is even.
    pub even: bool,
    /// `index` is odd.
    pub odd: bool,
}

impl<T> ViewContext<T> {
    /// Builds the context of item `index` out of `count`.
    #[must_use]
    pub fn new(implicit: T, index: usize, count: usize) -> Self {
        let even = index % 2 == 0;
        Self {
            implicit,
            index,
            count,
            first: index == 0,
            last: index + 1 == count,
            even,
            odd: !even,
        }
    }
}

/// The host's view-container capability.
///
/// Positions are indices into the container's list of attached views.
/// Implementations must not call back into the repeater.
pub trait ViewContainer<T> {
    /// A host view instance.
    type View;

    /// Instantiates the template with `context` and attaches it at `index`.
    fn create_embedded_view(&self, context: &ViewContext<T>, index: usize) -> Self::View;

    /// Re-attaches a detached view at `index`.
    fn insert(&self, view: &mut Self::View, index: usize);

    /// Moves an attached view from `from` to `to`.
    fn move_view(&self, view: &mut Self::View, from: usize, to: usize);

    /// Detaches the view at `index` without destroying it.
    fn detach(&self, view: &mut Self::View, index: usize);

    /// Destroys a detached view.
    fn destroy(&self, view: Self::View);

    /// Rebinds a view's template context.
    fn update_context(&self, view: &mut Self::View, context: &ViewContext<T>);

    /// Returns the laid-out bounds of the view's root nodes.
    fn root_node_bounds(&self, view: &Self::View) -> SmallVec<[Rect; 1]>;
}

/// Repeater settings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RepeaterConfig {
    /// Maximum number of detached views kept for reuse.
    pub template_cache_size: usize,
}

impl Default for RepeaterConfig {
    fn default() -> Self {
        Self {
            template_cache_size: 20,
        }
    }
}

impl RepeaterConfig {
    /// Creates a configuration with the given recycle cache capacity.
    #[must_use]
    pub const fn new(template_cache_size: usize) -> Self {
        Self {
            template_cache_size,
        }
    }
}

/// View pool counters of a [`VirtualForOf`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RepeaterStats {
    /// Views currently attached.
    pub attached: usize,
    /// Detached views waiting in the recycle cache.
    pub cached: usize,
    /// Views created so far.
    pub created: usize,
    /// Views taken from the cache so far.
    pub reused: usize,
    /// Views destroyed so far.
    pub destroyed: usize,
}

type TrackBy<T, K> = Rc<dyn Fn(usize, &T) -> K>;

struct SourceLink<T: 'static> {
    source: Rc<dyn DataSource<T>>,
    snapshots: Subscription,
}

struct RepeaterState<T, V, K> {
    data: Option<Rc<[T]>>,
    rendered_range: Option<ListRange>,
    needs_update: bool,
    differ: IterableDiffer<K>,
    attached: Vec<V>,
    cache: Vec<V>,
    created: usize,
    reused: usize,
    destroyed: usize,
}

/// A virtualizing repeater.
///
/// `K` is the identity produced by the track-by function. [`VirtualForOf::new`]
/// uses the items themselves (`K = T`); [`VirtualForOf::with_track_by`]
/// accepts any key. The track-by function receives the *absolute* index of
/// the item in the data, not its position in the rendered window.
pub struct VirtualForOf<T: 'static, C: ViewContainer<T> + 'static, K: 'static = T> {
    this: Weak<Self>,
    viewport: VirtualScrollViewport,
    container: C,
    track_by: RefCell<TrackBy<T, K>>,
    config: Cell<RepeaterConfig>,
    state: RefCell<RepeaterState<T, C::View, K>>,
    source: RefCell<Option<SourceLink<T>>>,
    data: Subject<Rc<[T]>>,
    lengths: Subject<usize>,
    view_change: Subject<ListRange>,
    subscriptions: RefCell<SubscriptionBag>,
    destroyed: Cell<bool>,
}

impl<T, C, K> fmt::Debug for VirtualForOf<T, C, K>
where
    T: 'static,
    C: ViewContainer<T> + 'static,
    K: 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("VirtualForOf")
            .field("rendered_range", &state.rendered_range)
            .field("data_len", &state.data.as_ref().map(|d| d.len()))
            .field("needs_update", &state.needs_update)
            .field("config", &self.config.get())
            .field("destroyed", &self.destroyed.get())
            .finish_non_exhaustive()
    }
}

impl<T, C> VirtualForOf<T, C, T>
where
    T: Clone + Eq + Hash + 'static,
    C: ViewContainer<T> + 'static,
{
    /// Creates a repeater that identifies items by value and attaches it to
    /// `viewport`.
    pub fn new(
        viewport: &VirtualScrollViewport,
        container: C,
        config: RepeaterConfig,
    ) -> Result<Rc<Self>, VirtualScrollError> {
        Self::with_track_by(viewport, container, config, |_, item: &T| item.clone())
    }
}

impl<T, C, K> VirtualForOf<T, C, K>
where
    T: Clone + 'static,
    C: ViewContainer<T> + 'static,
    K: Eq + Hash + Clone + 'static,
{
    /// Creates a repeater with a custom identity and attaches it to `viewport`.
    ///
    /// Fails with [`VirtualScrollError::ViewportAlreadyAttached`] if the
    /// viewport already renders through another repeater.
    pub fn with_track_by(
        viewport: &VirtualScrollViewport,
        container: C,
        config: RepeaterConfig,
        track_by: impl Fn(usize, &T) -> K + 'static,
    ) -> Result<Rc<Self>, VirtualScrollError> {
        let repeater = Rc::new_cyclic(|this| Self {
            this: this.clone(),
            viewport: viewport.clone(),
            container,
            track_by: RefCell::new(Rc::new(track_by)),
            config: Cell::new(config),
            state: RefCell::new(RepeaterState {
                data: None,
                rendered_range: None,
                needs_update: false,
                differ: IterableDiffer::new(),
                attached: Vec::new(),
                cache: Vec::new(),
                created: 0,
                reused: 0,
                destroyed: 0,
            }),
            source: RefCell::new(None),
            data: Subject::new().replaying(),
            lengths: Subject::new().replaying(),
            view_change: Subject::new(),
            subscriptions: RefCell::new(SubscriptionBag::new()),
            destroyed: Cell::new(false),
        });

        let mut bag = SubscriptionBag::new();
        let weak = Rc::downgrade(&repeater);
        bag.add(repeater.data.subscribe(move |items| {
            if let Some(repeater) = weak.upgrade() {
                repeater.on_data(items.clone());
            }
        }));
        let weak = Rc::downgrade(&repeater);
        bag.add(viewport.rendered_range_stream().subscribe(move |&range| {
            if let Some(repeater) = weak.upgrade() {
                repeater.on_rendered_range(range);
            }
        }));

        let weak_self = Rc::downgrade(&repeater);
        let as_repeater: Weak<dyn VirtualScrollRepeater> = weak_self;
        if let Err(err) = viewport.attach(as_repeater) {
            bag.unsubscribe_all();
            return Err(err);
        }
        repeater.subscriptions.borrow_mut().append(bag);
        log::debug!("virtual repeater created ({:?})", config);
        Ok(repeater)
    }

    /// Renders from `input`, disconnecting the previous data source.
    ///
    /// Raw items and streams are wrapped in an
    /// [`ArrayDataSource`](crate::ArrayDataSource).
    pub fn set_data_source(&self, input: impl Into<VirtualForInput<T>>) {
        if self.destroyed.get() {
            return;
        }
        self.disconnect_source();
        self.state.borrow_mut().needs_update = true;

        let input: VirtualForInput<T> = input.into();
        let source = input.into_data_source();
        let stream = source.connect(self.view_change.observable());
        *self.source.borrow_mut() = Some(SourceLink {
            source,
            snapshots: Subscription::empty(),
        });
        let weak = self.this.clone();
        let snapshots = stream.subscribe(move |items| {
            if let Some(repeater) = weak.upgrade() {
                repeater.data.next(items.clone());
            }
        });
        let mut slot = self.source.borrow_mut();
        match slot.as_mut() {
            Some(link) => link.snapshots = snapshots,
            None => {
                let mut snapshots = snapshots;
                snapshots.unsubscribe();
            }
        }
    }

    fn disconnect_source(&self) {
        let link = self.source.borrow_mut().take();
        if let Some(mut link) = link {
            link.snapshots.unsubscribe();
            link.source.disconnect();
        }
    }

    /// Replaces the track-by function and flags a patch pass.
    pub fn set_track_by(&self, track_by: impl Fn(usize, &T) -> K + 'static) {
        *self.track_by.borrow_mut() = Rc::new(track_by);
        self.state.borrow_mut().needs_update = true;
    }

    /// Changes the recycle cache capacity, destroying cached views beyond it.
    pub fn set_template_cache_size(&self, template_cache_size: usize) {
        self.config.set(RepeaterConfig::new(template_cache_size));
        let overflow = {
            let mut state = self.state.borrow_mut();
            let keep = state.cache.len().min(template_cache_size);
            let overflow: Vec<_> = state.cache.drain(keep..).collect();
            state.destroyed += overflow.len();
            overflow
        };
        for view in overflow {
            self.container.destroy(view);
        }
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn config(&self) -> RepeaterConfig {
        self.config.get()
    }

    /// Emits every data snapshot. Replays the latest one.
    #[must_use]
    pub fn data_stream(&self) -> Observable<Rc<[T]>> {
        self.data.observable()
    }

    /// Emits the rendered range whenever it changes.
    #[must_use]
    pub fn view_change(&self) -> Observable<ListRange> {
        self.view_change.observable()
    }

    /// Returns the range this repeater renders, once the viewport set one.
    #[must_use]
    pub fn rendered_range(&self) -> Option<ListRange> {
        self.state.borrow().rendered_range
    }

    /// Returns `true` if the next [`do_check`](Self::do_check) will patch.
    #[must_use]
    pub fn needs_update(&self) -> bool {
        self.state.borrow().needs_update
    }

    /// Returns the view pool counters.
    #[must_use]
    pub fn stats(&self) -> RepeaterStats {
        let state = self.state.borrow();
        RepeaterStats {
            attached: state.attached.len(),
            cached: state.cache.len(),
            created: state.created,
            reused: state.reused,
            destroyed: state.destroyed,
        }
    }

    /// Calls `f` with each attached view and its position, in order.
    pub fn for_each_view(&self, mut f: impl FnMut(usize, &C::View)) {
        for (position, view) in self.state.borrow().attached.iter().enumerate() {
            f(position, view);
        }
    }

    fn on_data(&self, items: Rc<[T]>) {
        let length = items.len();
        {
            let mut state = self.state.borrow_mut();
            state.data = Some(items);
            state.needs_update = true;
        }
        self.lengths.next(length);
    }

    fn on_rendered_range(&self, range: ListRange) {
        {
            let mut state = self.state.borrow_mut();
            state.rendered_range = Some(range);
            state.needs_update = true;
        }
        self.view_change.next(range);
    }

    /// Runs the pending patch pass, if any.
    ///
    /// Call once per host detection cycle. Does nothing until both a data
    /// snapshot and a rendered range are known.
    pub fn do_check(&self) {
        if self.destroyed.get() {
            return;
        }
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if !state.needs_update {
            return;
        }
        let (Some(data), Some(range)) = (state.data.clone(), state.rendered_range) else {
            return;
        };
        state.needs_update = false;

        let range = range.clamp_to_len(data.len());
        let items = &data[range.as_range()];
        let track_by = self.track_by.borrow().clone();
        let ids: Vec<K> = items
            .iter()
            .enumerate()
            .map(|(offset, item)| track_by(range.start + offset, item))
            .collect();

        let count = data.len();
        let cache_size = self.config.get().template_cache_size;
        let mut patch = PatchCounts::default();
        if let Some(ops) = state.differ.diff(ids) {
            for op in ops {
                match op {
                    DiffOp::Insert { index } => {
                        let view = if let Some(mut view) = state.cache.pop() {
                            self.container.insert(&mut view, index);
                            state.reused += 1;
                            patch.reused += 1;
                            view
                        } else {
                            let absolute = range.start + index;
                            let context = ViewContext::new(items[index].clone(), absolute, count);
                            state.created += 1;
                            patch.created += 1;
                            self.container.create_embedded_view(&context, index)
                        };
                        state.attached.insert(index, view);
                    }
                    DiffOp::Remove { index } => {
                        let mut view = state.attached.remove(index);
                        self.container.detach(&mut view, index);
                        patch.removed += 1;
                        if state.cache.len() < cache_size {
                            state.cache.push(view);
                        } else {
                            self.container.destroy(view);
                            state.destroyed += 1;
                            patch.destroyed += 1;
                        }
                    }
                    DiffOp::Move { from, to } => {
                        let mut view = state.attached.remove(from);
                        self.container.move_view(&mut view, from, to);
                        state.attached.insert(to, view);
                        patch.moved += 1;
                    }
                    DiffOp::Keep { .. } => {}
                }
            }
        }

        for (position, view) in state.attached.iter_mut().enumerate() {
            let absolute = range.start + position;
            let context = ViewContext::new(items[position].clone(), absolute, count);
            self.container.update_context(view, &context);
        }
        log::trace!(
            "repeater patch {range}: {} created, {} reused, {} moved, {} removed, {} destroyed",
            patch.created,
            patch.reused,
            patch.moved,
            patch.removed,
            patch.destroyed
        );
    }

    /// Sums the extent of the rendered views for `range` along `orientation`.
    ///
    /// An empty range measures `0.0`. Fails with
    /// [`VirtualScrollError::RangeNotRendered`] if any index of `range` is
    /// outside the rendered range.
    pub fn measure_range_size(
        &self,
        range: ListRange,
        orientation: Orientation,
    ) -> Result<f64, VirtualScrollError> {
        if range.is_empty() {
            return Ok(0.0);
        }
        let state = self.state.borrow();
        let rendered = state.rendered_range.unwrap_or_default();
        if !rendered.contains_range(range) {
            return Err(VirtualScrollError::RangeNotRendered {
                requested: range,
                rendered,
            });
        }
        let first = range.start - rendered.start;
        Ok(state
            .attached
            .iter()
            .skip(first)
            .take(range.len())
            .flat_map(|view| self.container.root_node_bounds(view))
            .map(|bounds| orientation.extent(bounds.size()))
            .sum())
    }

    /// Detaches from the viewport, disconnects the data source, completes
    /// the streams, and destroys every view. Idempotent.
    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.viewport.detach();
        self.disconnect_source();
        self.data.complete();
        self.lengths.complete();
        self.view_change.complete();
        let mut subscriptions = core::mem::take(&mut *self.subscriptions.borrow_mut());
        subscriptions.unsubscribe_all();

        let (attached, cache) = {
            let mut state = self.state.borrow_mut();
            let attached = core::mem::take(&mut state.attached);
            let cache = core::mem::take(&mut state.cache);
            state.destroyed += attached.len() + cache.len();
            (attached, cache)
        };
        for (index, mut view) in attached.into_iter().enumerate().rev() {
            self.container.detach(&mut view, index);
            self.container.destroy(view);
        }
        for view in cache {
            self.container.destroy(view);
        }
        log::debug!("virtual repeater destroyed");
    }
}

#[derive(Default)]
struct PatchCounts {
    created: usize,
    reused: usize,
    moved: usize,
    removed: usize,
    destroyed: usize,
}

impl<T, C, K> VirtualScrollRepeater for VirtualForOf<T, C, K>
where
    T: Clone + 'static,
    C: ViewContainer<T> + 'static,
    K: Eq + Hash + Clone + 'static,
{
    fn data_lengths(&self) -> Observable<usize> {
        self.lengths.observable()
    }

    fn measure_range_size(
        &self,
        range: ListRange,
        orientation: Orientation,
    ) -> Result<f64, VirtualScrollError> {
        Self::measure_range_size(self, range, orientation)
    }
}
