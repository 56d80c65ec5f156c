// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A headless host for driving a viewport, a strategy, and a repeater.

#![allow(
    missing_docs,
    dead_code,
    reason = "Integration-test helper module; not every test uses every helper."
)]

use std::cell::{Cell, RefCell};
use std::hash::Hash;
use std::rc::Rc;

use kurbo::{Rect, Size};
use smallvec::{SmallVec, smallvec};
use understory_virtual_scroll::{
    ContentTransform, Direction, ElementScrollable, FixedSizeConfig,
    FixedSizeVirtualScrollStrategy, Observable, Orientation, ScrollBehavior, ScrollElement,
    SpacerSize, Subject, TaskQueue, ViewContainer, ViewContext, ViewportElement, ViewportHost,
    ViewportRuler, VirtualForOf, VirtualScrollStrategy, VirtualScrollViewport,
};

/// The scroll container's raw metrics.
#[derive(Debug)]
pub(crate) struct FakeScrollElement {
    pub(crate) top: Cell<f64>,
    pub(crate) left: Cell<f64>,
    pub(crate) client: Size,
}

impl FakeScrollElement {
    pub(crate) fn new(client: Size) -> Self {
        Self {
            top: Cell::new(0.0),
            left: Cell::new(0.0),
            client,
        }
    }
}

impl ScrollElement for FakeScrollElement {
    fn scroll_top(&self) -> f64 {
        self.top.get()
    }
    fn scroll_left(&self) -> f64 {
        self.left.get()
    }
    // Content the size of the client: RTL normalization stays at zero.
    fn scroll_width(&self) -> f64 {
        self.client.width
    }
    fn scroll_height(&self) -> f64 {
        self.client.height
    }
    fn client_width(&self) -> f64 {
        self.client.width
    }
    fn client_height(&self) -> f64 {
        self.client.height
    }
    fn set_scroll_position(&self, top: Option<f64>, left: Option<f64>, _: ScrollBehavior) {
        if let Some(top) = top {
            self.top.set(top);
        }
        if let Some(left) = left {
            self.left.set(left);
        }
    }
}

/// Records every write the viewport makes to its element.
#[derive(Debug)]
pub(crate) struct FakeViewportElement {
    pub(crate) client: Cell<Size>,
    /// How many times the viewport measured the client size.
    pub(crate) client_reads: Cell<usize>,
    pub(crate) wrapper: Cell<Size>,
    pub(crate) transforms: RefCell<Vec<String>>,
    pub(crate) spacers: RefCell<Vec<SpacerSize>>,
}

impl ViewportElement for FakeViewportElement {
    fn client_size(&self) -> Size {
        self.client_reads.set(self.client_reads.get() + 1);
        self.client.get()
    }
    fn content_wrapper_size(&self) -> Size {
        self.wrapper.get()
    }
    fn apply_content_transform(&self, transform: &ContentTransform) {
        self.transforms.borrow_mut().push(transform.to_string());
    }
    fn apply_spacer_size(&self, spacer: SpacerSize) {
        self.spacers.borrow_mut().push(spacer);
    }
}

impl FakeViewportElement {
    pub(crate) fn new(client: Size) -> Self {
        Self {
            client: Cell::new(client),
            client_reads: Cell::new(0),
            wrapper: Cell::new(Size::ZERO),
            transforms: RefCell::new(Vec::new()),
            spacers: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn last_transform(&self) -> Option<String> {
        self.transforms.borrow().last().cloned()
    }

    pub(crate) fn last_spacer(&self) -> Option<SpacerSize> {
        self.spacers.borrow().last().copied()
    }
}

/// Reports the viewport element's client size and emits on demand.
#[derive(Debug)]
pub(crate) struct FakeRuler {
    pub(crate) element: Rc<FakeViewportElement>,
    pub(crate) changed: Subject<()>,
}

impl FakeRuler {
    /// Resizes the element and emits one change.
    pub(crate) fn resize(&self, size: Size) {
        self.element.client.set(size);
        self.changed.next(());
    }
}

impl ViewportRuler for FakeRuler {
    fn change(&self) -> Observable<()> {
        self.changed.observable()
    }
    fn viewport_size(&self) -> Size {
        self.element.client.get()
    }
}

pub(crate) struct Harness {
    pub(crate) queue: Rc<TaskQueue>,
    pub(crate) element: Rc<FakeViewportElement>,
    pub(crate) ruler: Rc<FakeRuler>,
    pub(crate) scrollable: Rc<ElementScrollable<FakeScrollElement>>,
    pub(crate) strategy: Rc<FixedSizeVirtualScrollStrategy>,
    pub(crate) viewport: VirtualScrollViewport,
}

/// Visible size of every fake scroll container.
pub(crate) const CLIENT: Size = Size::new(500.0, 500.0);

/// 50px items with 100px/200px buffers.
pub(crate) const CONFIG: FixedSizeConfig = FixedSizeConfig::new(50.0, 100.0, 200.0);

impl Harness {
    /// A vertical, LTR, 500px tall viewport, already initialized.
    pub(crate) fn new() -> Self {
        Self::with(Orientation::Vertical, Direction::Ltr)
    }

    pub(crate) fn with(orientation: Orientation, direction: Direction) -> Self {
        let strategy = Rc::new(FixedSizeVirtualScrollStrategy::new(CONFIG).unwrap());
        Self::with_strategy(strategy, orientation, direction)
    }

    pub(crate) fn with_strategy(
        strategy: Rc<FixedSizeVirtualScrollStrategy>,
        orientation: Orientation,
        direction: Direction,
    ) -> Self {
        let harness = Self::uninitialized(strategy, orientation, direction);
        harness.viewport.init().unwrap();
        harness
    }

    /// Builds the host and the viewport without calling
    /// [`VirtualScrollViewport::init`].
    pub(crate) fn uninitialized(
        strategy: Rc<FixedSizeVirtualScrollStrategy>,
        orientation: Orientation,
        direction: Direction,
    ) -> Self {
        let queue = Rc::new(TaskQueue::new());
        let element = Rc::new(FakeViewportElement::new(CLIENT));
        let dir = Rc::new(direction);
        let scrollable = Rc::new(
            ElementScrollable::new(FakeScrollElement::new(CLIENT)).with_direction(dir.clone()),
        );
        let ruler = Rc::new(FakeRuler {
            element: element.clone(),
            changed: Subject::new(),
        });
        let host = ViewportHost::new(element.clone(), scrollable.clone(), queue.clone())
            .with_direction(dir)
            .with_ruler(ruler.clone());
        let dyn_strategy: Rc<dyn VirtualScrollStrategy> = strategy.clone();
        let viewport = VirtualScrollViewport::new(host, Some(dyn_strategy), orientation).unwrap();
        Self {
            queue,
            element,
            ruler,
            scrollable,
            strategy,
            viewport,
        }
    }

    /// Simulates the user scrolling the container to `offset` from the top.
    pub(crate) fn scroll_to(&self, offset: f64) {
        self.scrollable.element().top.set(offset);
        self.scrollable.notify_scrolled();
    }

    /// Runs all queued host work, then the repeater's detection pass, until
    /// nothing is left.
    pub(crate) fn settle<T, C, K>(&self, repeater: &VirtualForOf<T, C, K>)
    where
        T: Clone + 'static,
        C: ViewContainer<T> + 'static,
        K: Eq + Hash + Clone + 'static,
    {
        loop {
            self.queue.flush();
            repeater.do_check();
            if !self.queue.has_pending() {
                break;
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ViewEvent {
    Created { serial: usize, index: usize },
    Inserted { serial: usize, index: usize },
    Moved { serial: usize, from: usize, to: usize },
    Detached { serial: usize, index: usize },
    Destroyed { serial: usize },
}

#[derive(Debug, Default)]
pub(crate) struct ContainerLog {
    pub(crate) events: RefCell<Vec<ViewEvent>>,
    /// Serials of the attached views, in container order.
    pub(crate) order: RefCell<Vec<usize>>,
    pub(crate) context_updates: Cell<usize>,
    next_serial: Cell<usize>,
}

impl ContainerLog {
    pub(crate) fn events_since(&self, start: usize) -> Vec<ViewEvent> {
        self.events.borrow()[start..].to_vec()
    }

    pub(crate) fn len(&self) -> usize {
        self.events.borrow().len()
    }
}

#[derive(Debug)]
pub(crate) struct FakeView<T> {
    pub(crate) serial: usize,
    pub(crate) context: ViewContext<T>,
}

/// A view container whose views are all 50px tall.
#[derive(Debug, Default)]
pub(crate) struct FakeContainer {
    pub(crate) log: Rc<ContainerLog>,
}

impl FakeContainer {
    pub(crate) fn new() -> (Self, Rc<ContainerLog>) {
        let container = Self::default();
        let log = container.log.clone();
        (container, log)
    }
}

impl<T: Clone> ViewContainer<T> for FakeContainer {
    type View = FakeView<T>;

    fn create_embedded_view(&self, context: &ViewContext<T>, index: usize) -> FakeView<T> {
        let serial = self.log.next_serial.get();
        self.log.next_serial.set(serial + 1);
        self.log.order.borrow_mut().insert(index, serial);
        self.log
            .events
            .borrow_mut()
            .push(ViewEvent::Created { serial, index });
        FakeView {
            serial,
            context: context.clone(),
        }
    }

    fn insert(&self, view: &mut FakeView<T>, index: usize) {
        self.log.order.borrow_mut().insert(index, view.serial);
        self.log.events.borrow_mut().push(ViewEvent::Inserted {
            serial: view.serial,
            index,
        });
    }

    fn move_view(&self, view: &mut FakeView<T>, from: usize, to: usize) {
        let mut order = self.log.order.borrow_mut();
        let serial = order.remove(from);
        assert_eq!(serial, view.serial, "moved view must sit at `from`");
        order.insert(to, serial);
        self.log.events.borrow_mut().push(ViewEvent::Moved {
            serial: view.serial,
            from,
            to,
        });
    }

    fn detach(&self, view: &mut FakeView<T>, index: usize) {
        let serial = self.log.order.borrow_mut().remove(index);
        assert_eq!(serial, view.serial, "detached view must sit at `index`");
        self.log.events.borrow_mut().push(ViewEvent::Detached {
            serial: view.serial,
            index,
        });
    }

    fn destroy(&self, view: FakeView<T>) {
        self.log.events.borrow_mut().push(ViewEvent::Destroyed {
            serial: view.serial,
        });
    }

    fn update_context(&self, view: &mut FakeView<T>, context: &ViewContext<T>) {
        view.context = context.clone();
        self.log.context_updates.set(self.log.context_updates.get() + 1);
    }

    fn root_node_bounds(&self, _view: &FakeView<T>) -> SmallVec<[Rect; 1]> {
        smallvec![Rect::new(0.0, 0.0, 500.0, 50.0)]
    }
}

/// Collects the contexts of the attached views, in order.
pub(crate) fn contexts<T, K>(repeater: &VirtualForOf<T, FakeContainer, K>) -> Vec<ViewContext<T>>
where
    T: Clone + 'static,
    K: Eq + Hash + Clone + 'static,
{
    let mut out = Vec::new();
    repeater.for_each_view(|_, view| out.push(view.context.clone()));
    out
}
