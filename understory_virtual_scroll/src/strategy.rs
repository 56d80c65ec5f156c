// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The extension point that decides which items a viewport renders.

use crate::error::VirtualScrollError;
use crate::observable::Observable;
use crate::scrollable::ScrollBehavior;
use crate::viewport::VirtualScrollViewport;

/// Decides the rendered range of a [`VirtualScrollViewport`].
///
/// A strategy is bound to at most one viewport at a time. It observes the
/// viewport (scroll offset, viewport size, data length) and *requests*
/// changes through the viewport's setters; it never measures or mutates
/// host elements itself.
///
/// Strategies are shared as `Rc<dyn VirtualScrollStrategy>` and keep their
/// state behind interior mutability, so every method takes `&self`. They
/// must hold only a weak reference to the viewport they are attached to.
///
/// [`FixedSizeVirtualScrollStrategy`](crate::FixedSizeVirtualScrollStrategy)
/// is the implementation for uniformly sized items.
pub trait VirtualScrollStrategy {
    /// Emits the index of the first visible item whenever it changes.
    ///
    /// The stream completes on [`detach`](Self::detach). After a re-attach
    /// this returns a fresh stream.
    fn scrolled_index_change(&self) -> Observable<usize>;

    /// Binds the strategy to `viewport` and computes its initial state.
    ///
    /// Fails with [`VirtualScrollError::StrategyAlreadyAttached`] while
    /// the strategy is bound to a viewport.
    fn attach(&self, viewport: &VirtualScrollViewport) -> Result<(), VirtualScrollError>;

    /// Completes the scrolled-index stream and releases the viewport. Idempotent.
    fn detach(&self);

    /// Returns `true` while bound to a viewport.
    fn is_attached(&self) -> bool;

    /// Called after the viewport's content has been scrolled.
    fn on_content_scrolled(&self);

    /// Called when the number of items or the viewport size changed.
    fn on_data_length_changed(&self);

    /// Called after a new rendered range has been laid out.
    fn on_content_rendered(&self);

    /// Called after the rendered content offset has been applied.
    fn on_rendered_offset_changed(&self);

    /// Scrolls the viewport so that `index` is at its start.
    fn scroll_to_index(&self, index: usize, behavior: ScrollBehavior);
}
