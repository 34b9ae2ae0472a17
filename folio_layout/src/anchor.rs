// Copyright 2025 the Folio Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stacking direction and scroll anchors.

use folio_model::{ElementId, ElementLocation};

/// Which way content conceptually grows in the scroll axis.
///
/// The direction changes how scroll position is preserved across batch
/// updates, bounds changes, and self-sizing: a typical feed keeps whatever
/// sits near the top of the viewport fixed, while a chat-style thread keeps
/// whatever sits near the bottom fixed.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum StackingDirection {
    /// New content grows downward; the top of the viewport is the visual
    /// anchor edge.
    #[default]
    TopToBottom,
    /// New content grows upward (reverse-chronological threads); the bottom
    /// of the viewport is the visual anchor edge.
    BottomToTop,
}

/// The element (or absolute edge) held visually fixed while offsets are
/// recomputed across a mutation, bounds change, or height resolution.
///
/// Anchors are captured from the pre-mutation layout and resolved against
/// the post-mutation layout via [`crate::LayoutState::y_offset`]. Item
/// anchors resolve by identifier, not index, so they survive structural
/// reordering; distances are recomputed at resolve time so the anchored
/// element lands at the same visual distance from its edge.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ContentOffsetAnchor {
    /// Pinned to the absolute top of the content.
    Top {
        /// How far past the minimum offset the viewport was rubber-banded.
        overscroll: f64,
    },
    /// Pinned to the absolute bottom of the content.
    Bottom {
        /// How far past the maximum offset the viewport was rubber-banded.
        overscroll: f64,
    },
    /// Pinned to an item near the top of the viewport.
    TopItem {
        /// Identity of the anchored item.
        id: ElementId,
        /// Location of the item when the anchor was captured.
        location: ElementLocation,
        /// Distance from the inset-adjusted top edge to the item's top.
        distance_from_top: f64,
    },
    /// Pinned to an item near the bottom of the viewport.
    BottomItem {
        /// Identity of the anchored item.
        id: ElementId,
        /// Location of the item when the anchor was captured.
        location: ElementLocation,
        /// Distance from the inset-adjusted bottom edge to the item's
        /// bottom.
        distance_from_bottom: f64,
    },
}
