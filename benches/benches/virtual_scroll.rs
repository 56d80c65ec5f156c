// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::Cell;
use std::rc::Rc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use kurbo::{Rect, Size};
use smallvec::{SmallVec, smallvec};
use understory_virtual_scroll::{
    ContentTransform, FixedSizeConfig, FixedSizeVirtualScrollStrategy, ListRange, Observable,
    Orientation, RepeaterConfig, ScrollEdge, ScrollToOptions, Scrollable, SpacerSize, Subject,
    TaskQueue, ViewContainer, ViewContext, ViewportElement, ViewportHost, VirtualForOf,
    VirtualScrollStrategy, VirtualScrollViewport, diff_identities,
};

const CONFIG: FixedSizeConfig = FixedSizeConfig::new(50.0, 100.0, 200.0);

struct Element;

impl ViewportElement for Element {
    fn client_size(&self) -> Size {
        Size::new(500.0, 500.0)
    }
    fn content_wrapper_size(&self) -> Size {
        Size::ZERO
    }
    fn apply_content_transform(&self, transform: &ContentTransform) {
        black_box(transform);
    }
    fn apply_spacer_size(&self, spacer: SpacerSize) {
        black_box(spacer);
    }
}

struct Scroller {
    offset: Cell<f64>,
    scrolled: Subject<()>,
}

impl Scrollable for Scroller {
    fn element_scrolled(&self) -> Observable<()> {
        self.scrolled.observable()
    }
    fn measure_scroll_offset(&self, _edge: ScrollEdge) -> f64 {
        self.offset.get()
    }
    fn scroll_to(&self, options: ScrollToOptions) {
        if let Some(top) = options.top {
            self.offset.set(top);
        }
    }
}

/// Views are plain integers; the container only counts operations.
#[derive(Default)]
struct Counter {
    ops: Cell<usize>,
}

impl Counter {
    fn bump(&self) {
        self.ops.set(self.ops.get() + 1);
    }
}

impl ViewContainer<u32> for Counter {
    type View = u32;

    fn create_embedded_view(&self, context: &ViewContext<u32>, _index: usize) -> u32 {
        self.bump();
        context.implicit
    }
    fn insert(&self, _view: &mut u32, _index: usize) {
        self.bump();
    }
    fn move_view(&self, _view: &mut u32, _from: usize, _to: usize) {
        self.bump();
    }
    fn detach(&self, _view: &mut u32, _index: usize) {
        self.bump();
    }
    fn destroy(&self, _view: u32) {
        self.bump();
    }
    fn update_context(&self, view: &mut u32, context: &ViewContext<u32>) {
        *view = context.implicit;
    }
    fn root_node_bounds(&self, _view: &u32) -> SmallVec<[Rect; 1]> {
        smallvec![Rect::new(0.0, 0.0, 500.0, 50.0)]
    }
}

struct Host {
    queue: Rc<TaskQueue>,
    scroller: Rc<Scroller>,
    viewport: VirtualScrollViewport,
    repeater: Rc<VirtualForOf<u32, Counter>>,
}

impl Host {
    fn new(len: u32) -> Self {
        let queue = Rc::new(TaskQueue::new());
        let scroller = Rc::new(Scroller {
            offset: Cell::new(0.0),
            scrolled: Subject::new(),
        });
        let strategy: Rc<dyn VirtualScrollStrategy> =
            Rc::new(FixedSizeVirtualScrollStrategy::new(CONFIG).expect("valid configuration"));
        let host = ViewportHost::new(Rc::new(Element), scroller.clone(), queue.clone());
        let viewport = VirtualScrollViewport::new(host, Some(strategy), Orientation::Vertical)
            .expect("strategy is present");
        viewport.init().expect("strategy is detached");
        let repeater = VirtualForOf::new(&viewport, Counter::default(), RepeaterConfig::default())
            .expect("viewport has no repeater");
        repeater.set_data_source((0..len).collect::<Vec<_>>());
        let host = Self {
            queue,
            scroller,
            viewport,
            repeater,
        };
        host.settle();
        host
    }

    fn scroll_to(&self, offset: f64) {
        self.scroller.offset.set(offset);
        self.scroller.scrolled.next(());
        self.settle();
    }

    fn settle(&self) {
        loop {
            self.queue.flush();
            self.repeater.do_check();
            if !self.queue.has_pending() {
                break;
            }
        }
    }
}

fn bench_next_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixed_size");

    for &len in &[1_000_usize, 100_000_usize] {
        group.bench_function(format!("next_range_sweep(len={len})"), |b| {
            let end = CONFIG.total_content_size(len);
            b.iter(|| {
                let mut range = ListRange::EMPTY;
                let mut offset = 0.0;
                while offset < end {
                    range = CONFIG.next_range(range, black_box(offset), 500.0, len);
                    offset += 173.0;
                }
                black_box(range)
            });
        });
    }

    group.finish();
}

fn bench_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("differ");

    let previous: Vec<u32> = (0..64).collect();
    let shifted: Vec<u32> = (8..72).collect();
    let reversed: Vec<u32> = (0..64).rev().collect();
    group.bench_function("sliding_window(64)", |b| {
        b.iter(|| diff_identities(black_box(&previous), black_box(&shifted)));
    });
    group.bench_function("reverse(64)", |b| {
        b.iter(|| diff_identities(black_box(&previous), black_box(&reversed)));
    });

    group.finish();
}

fn bench_scroll(c: &mut Criterion) {
    let mut group = c.benchmark_group("viewport");
    group.sample_size(50);

    group.bench_function("scroll_sweep(len=10000)", |b| {
        b.iter_batched(
            || Host::new(10_000),
            |host| {
                let mut offset = 0.0;
                while offset < 20_000.0 {
                    host.scroll_to(offset);
                    offset += 120.0;
                }
                black_box(host.viewport.rendered_range());
                black_box(host.repeater.stats());
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("jump(len=10000)", |b| {
        b.iter_batched(
            || Host::new(10_000),
            |host| {
                host.scroll_to(250_000.0);
                host.scroll_to(0.0);
                black_box(host.repeater.stats());
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_next_range, bench_diff, bench_scroll);
criterion_main!(benches);
