// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-threaded publish/subscribe channels.
//!
//! The virtual scroll subsystem communicates through a handful of streams:
//! the strategy's scrolled index, the viewport's rendered range, the
//! repeater's data snapshots, and the scroll/resize notifications fed in by
//! the host. [`Subject`] is the channel behind all of them.
//!
//! Two behaviors can be composed at construction time:
//!
//! - [`Subject::distinct`]: drop values equal to the previous emission.
//! - [`Subject::replaying`]: deliver the most recent value to late subscribers.
//!
//! Subscriptions are explicit: [`Subscription::unsubscribe`] tears one down,
//! and dropping a [`Subscription`] leaves it active. Completing a subject
//! notifies every subscriber once and releases them.
//!
//! ## Minimal example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use understory_virtual_scroll::Subject;
//!
//! let index = Subject::<usize>::distinct();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//!
//! let mut sub = index.subscribe({
//!     let seen = seen.clone();
//!     move |i| seen.borrow_mut().push(*i)
//! });
//!
//! index.next(0);
//! index.next(0);
//! index.next(3);
//! assert_eq!(*seen.borrow(), vec![0, 3]);
//!
//! sub.unsubscribe();
//! index.next(4);
//! assert_eq!(*seen.borrow(), vec![0, 3]);
//! ```

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use smallvec::SmallVec;

type NextFn<T> = Rc<dyn Fn(&T)>;

struct Listener<T> {
    id: u64,
    closed: Rc<Cell<bool>>,
    next: NextFn<T>,
    complete: Option<Box<dyn FnOnce()>>,
}

struct SubjectState<T> {
    listeners: Vec<Listener<T>>,
    next_id: u64,
    completed: bool,
    last: Option<T>,
    replay: bool,
    distinct: Option<fn(&T, &T) -> bool>,
}

/// A multicast channel: every value passed to [`Subject::next`] is delivered
/// to all current subscribers, in subscription order.
///
/// `Subject` is a cheap-to-clone handle; clones share the same subscribers.
/// Dispatch never holds an internal borrow while a subscriber runs, so a
/// subscriber may emit, subscribe, or unsubscribe re-entrantly. A subscriber
/// that is unsubscribed during a dispatch is not called for the remainder of
/// that dispatch.
pub struct Subject<T: 'static> {
    state: Rc<RefCell<SubjectState<T>>>,
}

impl<T: 'static> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: Clone + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Subject")
            .field("subscribers", &state.listeners.len())
            .field("completed", &state.completed)
            .field("replay", &state.replay)
            .field("distinct", &state.distinct.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> Subject<T> {
    /// Creates a plain subject: no replay, no de-duplication.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SubjectState {
                listeners: Vec::new(),
                next_id: 0,
                completed: false,
                last: None,
                replay: false,
                distinct: None,
            })),
        }
    }

    /// Creates a subject that drops values equal to the previous emission.
    #[must_use]
    pub fn distinct() -> Self
    where
        T: PartialEq,
    {
        let subject = Self::new();
        subject.state.borrow_mut().distinct = Some(<T as PartialEq>::eq);
        subject
    }

    /// Makes this subject replay its most recent value to new subscribers.
    #[must_use]
    pub fn replaying(self) -> Self {
        self.state.borrow_mut().replay = true;
        self
    }

    /// Emits `value` to every subscriber.
    ///
    /// Ignored after [`Subject::complete`]. For a [`distinct`](Self::distinct)
    /// subject, a value equal to the previous emission is dropped.
    pub fn next(&self, value: T) {
        let targets: SmallVec<[(Rc<Cell<bool>>, NextFn<T>); 4]> = {
            let mut state = self.state.borrow_mut();
            if state.completed {
                return;
            }
            if let (Some(eq), Some(last)) = (state.distinct, state.last.as_ref()) {
                if eq(last, &value) {
                    return;
                }
            }
            if state.replay || state.distinct.is_some() {
                state.last = Some(value.clone());
            }
            state
                .listeners
                .iter()
                .map(|l| (l.closed.clone(), l.next.clone()))
                .collect()
        };
        for (closed, next) in targets {
            if !closed.get() {
                next(&value);
            }
        }
    }

    /// Returns the most recently emitted value, if this subject keeps one.
    ///
    /// Only replaying and distinct subjects remember their last value.
    #[must_use]
    pub fn last_value(&self) -> Option<T> {
        self.state.borrow().last.clone()
    }

    /// Subscribes to values.
    pub fn subscribe(&self, next: impl Fn(&T) + 'static) -> Subscription {
        self.attach(Rc::new(next), None)
    }

    /// Subscribes to values and to completion.
    ///
    /// If the subject is already completed, `complete` runs immediately and
    /// the returned subscription is closed.
    pub fn subscribe_with(
        &self,
        next: impl Fn(&T) + 'static,
        complete: impl FnOnce() + 'static,
    ) -> Subscription {
        self.attach(Rc::new(next), Some(Box::new(complete)))
    }

    fn attach(&self, next: NextFn<T>, complete: Option<Box<dyn FnOnce()>>) -> Subscription {
        let closed = Rc::new(Cell::new(false));
        let (id, replay) = {
            let mut state = self.state.borrow_mut();
            if state.completed {
                drop(state);
                if let Some(complete) = complete {
                    complete();
                }
                return Subscription::empty();
            }
            let id = state.next_id;
            state.next_id += 1;
            state.listeners.push(Listener {
                id,
                closed: closed.clone(),
                next: next.clone(),
                complete,
            });
            let replay = if state.replay {
                state.last.clone()
            } else {
                None
            };
            (id, replay)
        };
        if let Some(value) = replay {
            next(&value);
        }
        let weak: Weak<RefCell<SubjectState<T>>> = Rc::downgrade(&self.state);
        Subscription::with_flag(closed, move || {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().listeners.retain(|l| l.id != id);
            }
        })
    }
}

impl<T: 'static> Subject<T> {
    /// Completes the subject.
    ///
    /// Every active subscriber's completion callback runs once, then all
    /// subscribers are released. Idempotent.
    pub fn complete(&self) {
        let listeners = {
            let mut state = self.state.borrow_mut();
            if state.completed {
                return;
            }
            state.completed = true;
            core::mem::take(&mut state.listeners)
        };
        for listener in listeners {
            if listener.closed.replace(true) {
                continue;
            }
            if let Some(complete) = listener.complete {
                complete();
            }
        }
    }

    /// Returns `true` once [`Subject::complete`] has been called.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state.borrow().completed
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    /// Returns a subscribe-only view of this subject.
    #[must_use]
    pub fn observable(&self) -> Observable<T> {
        Observable {
            subject: self.clone(),
        }
    }
}

/// A subscribe-only handle to a [`Subject`].
///
/// Components hand out `Observable`s so consumers can listen without being
/// able to emit.
pub struct Observable<T: 'static> {
    subject: Subject<T>,
}

impl<T: 'static> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            subject: self.subject.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Observable").field(&self.subject).finish()
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Subscribes to values.
    pub fn subscribe(&self, next: impl Fn(&T) + 'static) -> Subscription {
        self.subject.subscribe(next)
    }

    /// Subscribes to values and to completion.
    pub fn subscribe_with(
        &self,
        next: impl Fn(&T) + 'static,
        complete: impl FnOnce() + 'static,
    ) -> Subscription {
        self.subject.subscribe_with(next, complete)
    }

    /// Returns `true` once the underlying subject has completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.subject.is_completed()
    }
}

impl<T: 'static> From<Subject<T>> for Observable<T> {
    fn from(subject: Subject<T>) -> Self {
        Self { subject }
    }
}

/// Handle to an active subscription.
///
/// Dropping a `Subscription` does **not** unsubscribe; call
/// [`Subscription::unsubscribe`] (or keep it in a [`SubscriptionBag`]).
#[must_use = "a subscription that is never unsubscribed stays active until its source completes"]
pub struct Subscription {
    closed: Rc<Cell<bool>>,
    teardown: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// A subscription that is already closed.
    pub fn empty() -> Self {
        Self {
            closed: Rc::new(Cell::new(true)),
            teardown: None,
        }
    }

    /// Wraps an arbitrary teardown function.
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self::with_flag(Rc::new(Cell::new(false)), teardown)
    }

    fn with_flag(closed: Rc<Cell<bool>>, teardown: impl FnOnce() + 'static) -> Self {
        Self {
            closed,
            teardown: Some(Box::new(teardown)),
        }
    }

    /// Stops delivery and releases the subscriber. Idempotent.
    pub fn unsubscribe(&mut self) {
        self.closed.set(true);
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }

    /// Returns `true` after [`unsubscribe`](Self::unsubscribe) or once the
    /// source has completed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.closed.get())
            .finish_non_exhaustive()
    }
}

/// A collection of subscriptions torn down together.
#[derive(Debug, Default)]
pub struct SubscriptionBag {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscription to the bag.
    pub fn add(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Moves every subscription of `other` into this bag.
    pub fn append(&mut self, mut other: Self) {
        self.subscriptions.append(&mut other.subscriptions);
    }

    /// Unsubscribes everything in the bag and empties it.
    pub fn unsubscribe_all(&mut self) {
        for mut subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }

    /// Returns the number of subscriptions held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns `true` if the bag holds no subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
