// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Data sources feeding a repeater.
//!
//! A [`DataSource`] produces whole snapshots of the collection; each
//! emission replaces the previous one. Diffing happens in the repeater, not
//! in the source.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use crate::observable::{Observable, Subject};
use crate::range::ListRange;

/// A producer of collection snapshots.
pub trait DataSource<T: 'static> {
    /// Starts producing snapshots.
    ///
    /// `view_change` emits the range the viewer currently renders, so that
    /// sources can page data in lazily.
    fn connect(&self, view_change: Observable<ListRange>) -> Observable<Rc<[T]>>;

    /// Stops producing snapshots for the viewer that connected.
    fn disconnect(&self);
}

enum ArraySource<T: 'static> {
    Snapshot(Rc<[T]>),
    Stream(Observable<Rc<[T]>>),
}

/// A [`DataSource`] over a fixed snapshot or a stream of snapshots.
pub struct ArrayDataSource<T: 'static> {
    source: ArraySource<T>,
}

impl<T: 'static> fmt::Debug for ArrayDataSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            ArraySource::Snapshot(items) => f
                .debug_struct("ArrayDataSource")
                .field("len", &items.len())
                .finish_non_exhaustive(),
            ArraySource::Stream(stream) => f
                .debug_struct("ArrayDataSource")
                .field("stream", stream)
                .finish_non_exhaustive(),
        }
    }
}

impl<T: 'static> ArrayDataSource<T> {
    /// A source that emits `items` once.
    pub fn new(items: impl Into<Rc<[T]>>) -> Self {
        Self {
            source: ArraySource::Snapshot(items.into()),
        }
    }

    /// A source that forwards every snapshot of `stream`.
    pub fn from_stream(stream: Observable<Rc<[T]>>) -> Self {
        Self {
            source: ArraySource::Stream(stream),
        }
    }
}

impl<T: 'static> DataSource<T> for ArrayDataSource<T> {
    fn connect(&self, _view_change: Observable<ListRange>) -> Observable<Rc<[T]>> {
        match &self.source {
            ArraySource::Snapshot(items) => {
                let subject = Subject::new().replaying();
                subject.next(items.clone());
                subject.observable()
            }
            ArraySource::Stream(stream) => stream.clone(),
        }
    }

    fn disconnect(&self) {}
}

/// Anything a repeater can render from.
pub enum VirtualForInput<T: 'static> {
    /// A fixed snapshot.
    Items(Rc<[T]>),
    /// A stream of snapshots.
    Stream(Observable<Rc<[T]>>),
    /// An explicit data source.
    Source(Rc<dyn DataSource<T>>),
}

impl<T: 'static> fmt::Debug for VirtualForInput<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Items(items) => f.debug_tuple("Items").field(&items.len()).finish(),
            Self::Stream(stream) => f.debug_tuple("Stream").field(stream).finish(),
            Self::Source(_) => f.debug_tuple("Source").finish_non_exhaustive(),
        }
    }
}

impl<T: 'static> VirtualForInput<T> {
    /// Resolves the input to a data source, wrapping raw inputs in an
    /// [`ArrayDataSource`].
    pub fn into_data_source(self) -> Rc<dyn DataSource<T>> {
        match self {
            Self::Items(items) => Rc::new(ArrayDataSource::new(items)),
            Self::Stream(stream) => Rc::new(ArrayDataSource::from_stream(stream)),
            Self::Source(source) => source,
        }
    }
}

impl<T: 'static> From<Vec<T>> for VirtualForInput<T> {
    fn from(items: Vec<T>) -> Self {
        Self::Items(items.into())
    }
}

impl<T: Clone + 'static> From<&[T]> for VirtualForInput<T> {
    fn from(items: &[T]) -> Self {
        Self::Items(items.into())
    }
}

impl<T: 'static> From<Rc<[T]>> for VirtualForInput<T> {
    fn from(items: Rc<[T]>) -> Self {
        Self::Items(items)
    }
}

impl<T: 'static> From<Observable<Rc<[T]>>> for VirtualForInput<T> {
    fn from(stream: Observable<Rc<[T]>>) -> Self {
        Self::Stream(stream)
    }
}

impl<T: 'static> From<Rc<dyn DataSource<T>>> for VirtualForInput<T> {
    fn from(source: Rc<dyn DataSource<T>>) -> Self {
        Self::Source(source)
    }
}
