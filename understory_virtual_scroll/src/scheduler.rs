// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host scheduling capability and the batching primitives built on it.
//!
//! The virtual scroll subsystem never blocks. Every "wait" is expressed as a
//! task handed to the host:
//!
//! - a **microtask** runs after the current synchronous work, outside the
//!   host's own reactivity, and is where batched layout writes happen;
//! - an **animation-frame task** runs before the next paint, and is where
//!   bursts of scroll/resize events are coalesced;
//! - [`HostScheduler::mark_for_check`] asks the host for exactly one
//!   detection pass after a batch of writes.
//!
//! [`TaskQueue`] is a deterministic implementation for headless hosts and
//! tests. [`ChangeBatch`] is the dirty flag plus FIFO continuation list
//! behind the viewport's batching, and [`FrameAudit`] coalesces events into
//! one callback per frame.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use understory_virtual_scroll::{FrameAudit, TaskQueue};
//!
//! let queue = TaskQueue::new();
//! let audit = FrameAudit::new();
//! let runs = Rc::new(Cell::new(0));
//!
//! for _ in 0..5 {
//!     let runs = runs.clone();
//!     audit.notify(&queue, move || runs.set(runs.get() + 1));
//! }
//! queue.run_frame();
//! assert_eq!(runs.get(), 1);
//! ```

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use smallvec::SmallVec;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// The scheduling capability consumed from the host framework.
pub trait HostScheduler {
    /// Runs `task` after the current synchronous work completes, outside the
    /// host's reactivity tracking.
    fn schedule_microtask(&self, task: Task);

    /// Runs `task` before the next paint.
    fn request_animation_frame(&self, task: Task);

    /// Requests one host detection pass (re-check of bindings and repeaters).
    fn mark_for_check(&self);
}

/// A deterministic, manually pumped [`HostScheduler`].
///
/// Nothing runs until the owner calls [`run_microtasks`](Self::run_microtasks),
/// [`run_frame`](Self::run_frame), or [`flush`](Self::flush).
#[derive(Default)]
pub struct TaskQueue {
    microtasks: RefCell<VecDeque<Task>>,
    frame_tasks: RefCell<Vec<Task>>,
    check_requests: Cell<usize>,
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("microtasks", &self.microtasks.borrow().len())
            .field("frame_tasks", &self.frame_tasks.borrow().len())
            .field("check_requests", &self.check_requests.get())
            .finish()
    }
}

impl TaskQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs microtasks until the queue is empty, including microtasks queued
    /// by the tasks themselves. Returns the number of tasks run.
    pub fn run_microtasks(&self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.pop_microtask() {
            task();
            ran += 1;
        }
        ran
    }

    fn pop_microtask(&self) -> Option<Task> {
        self.microtasks.borrow_mut().pop_front()
    }

    /// Runs the animation-frame tasks queued before this call, then drains
    /// microtasks. Frame tasks queued while running wait for the next frame.
    /// Returns the number of tasks run.
    pub fn run_frame(&self) -> usize {
        let mut ran = self.run_microtasks();
        let frame = core::mem::take(&mut *self.frame_tasks.borrow_mut());
        for task in frame {
            task();
            ran += 1;
            ran += self.run_microtasks();
        }
        ran
    }

    /// Runs frames until no work is pending.
    pub fn flush(&self) -> usize {
        let mut ran = 0;
        while self.has_pending() {
            ran += self.run_frame();
        }
        ran
    }

    /// Returns `true` if any microtask or frame task is queued.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.microtasks.borrow().is_empty() || !self.frame_tasks.borrow().is_empty()
    }

    /// Returns the number of queued microtasks.
    #[must_use]
    pub fn pending_microtasks(&self) -> usize {
        self.microtasks.borrow().len()
    }

    /// Returns the number of queued animation-frame tasks.
    #[must_use]
    pub fn pending_frame_tasks(&self) -> usize {
        self.frame_tasks.borrow().len()
    }

    /// Returns how many times [`HostScheduler::mark_for_check`] was called.
    #[must_use]
    pub fn check_requests(&self) -> usize {
        self.check_requests.get()
    }
}

impl HostScheduler for TaskQueue {
    fn schedule_microtask(&self, task: Task) {
        self.microtasks.borrow_mut().push_back(task);
    }

    fn request_animation_frame(&self, task: Task) {
        self.frame_tasks.borrow_mut().push(task);
    }

    fn mark_for_check(&self) {
        self.check_requests.set(self.check_requests.get() + 1);
    }
}

impl<S: HostScheduler + ?Sized> HostScheduler for Rc<S> {
    fn schedule_microtask(&self, task: Task) {
        (**self).schedule_microtask(task);
    }

    fn request_animation_frame(&self, task: Task) {
        (**self).request_animation_frame(task);
    }

    fn mark_for_check(&self) {
        (**self).mark_for_check();
    }
}

/// Coalesces a burst of notifications into one callback per animation frame.
///
/// The first notification in a frame schedules the callback; later ones in
/// the same frame are dropped. Callbacks should read live state when they
/// run, so the result always reflects the latest notification.
#[derive(Clone, Debug, Default)]
pub struct FrameAudit {
    pending: Rc<Cell<bool>>,
}

impl FrameAudit {
    /// Creates an idle audit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a notification. Returns `true` if this call scheduled a frame.
    pub fn notify(&self, scheduler: &dyn HostScheduler, callback: impl FnOnce() + 'static) -> bool {
        if self.pending.replace(true) {
            return false;
        }
        let pending = self.pending.clone();
        scheduler.request_animation_frame(Box::new(move || {
            pending.set(false);
            callback();
        }));
        true
    }

    /// Returns `true` while a frame callback is scheduled but has not run.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }
}

/// Dirty flag plus FIFO continuation list for batched layout passes.
///
/// Any number of [`mark`](Self::mark) calls between two passes yield a
/// single `true` (schedule a pass) and queue their continuations in order.
#[derive(Default)]
pub struct ChangeBatch {
    pending: bool,
    continuations: SmallVec<[Task; 4]>,
}

impl fmt::Debug for ChangeBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeBatch")
            .field("pending", &self.pending)
            .field("continuations", &self.continuations.len())
            .finish()
    }
}

impl ChangeBatch {
    /// Creates a clean batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the batch dirty and queues an optional continuation.
    ///
    /// Returns `true` if the batch was clean, meaning the caller must
    /// schedule a pass.
    pub fn mark(&mut self, continuation: Option<Task>) -> bool {
        if let Some(continuation) = continuation {
            self.continuations.push(continuation);
        }
        !core::mem::replace(&mut self.pending, true)
    }

    /// Clears the dirty flag and returns the queued continuations in FIFO order.
    pub fn take(&mut self) -> SmallVec<[Task; 4]> {
        self.pending = false;
        core::mem::take(&mut self.continuations)
    }

    /// Returns `true` if a pass is scheduled but has not run.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Drops queued continuations and clears the dirty flag.
    pub fn clear(&mut self) {
        self.pending = false;
        self.continuations.clear();
    }
}
