// Copyright 2025 the Folio Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Folio Layout: viewport-aware layout state and scroll anchoring for the
//! Folio layout engine.
//!
//! [`LayoutState`] wraps a [`folio_model::ModelState`] together with the
//! hosting viewport (bounds, content insets, pixel scale, and
//! [`StackingDirection`]) and derives everything the host needs to drive a
//! scroller:
//!
//! - content size and the minimum/maximum scroll offsets;
//! - the scroll anchor ([`ContentOffsetAnchor`]) that keeps the visible
//!   window visually stable across structural batches, bounds changes, and
//!   asynchronous height resolution;
//! - translation of raw host update notifications into the normalized
//!   operation list the model consumes (see [`translate_updates`]).
//!
//! ## Anchoring protocol
//!
//! Scroll preservation is two-phase and trigger-agnostic: capture an anchor
//! from the pre-mutation state, mutate, then resolve the anchor against the
//! post-mutation state.
//!
//! ```rust
//! use folio_layout::{LayoutState, StackingDirection};
//! use folio_model::{
//!     IdGenerator, ItemHeightMode, ItemModel, ItemSizeMode, ModelState, SectionMetrics,
//!     SectionModel, WidthMode,
//! };
//! use kurbo::{Insets, Rect};
//!
//! let mut ids = IdGenerator::new();
//! let items = (0..8)
//!     .map(|_| {
//!         ItemModel::new(
//!             &mut ids,
//!             ItemSizeMode {
//!                 width_mode: WidthMode::full(),
//!                 height_mode: ItemHeightMode::Static(100.0),
//!             },
//!         )
//!     })
//!     .collect();
//! let section = SectionModel::new(
//!     &mut ids,
//!     items,
//!     None,
//!     None,
//!     None,
//!     SectionMetrics::with_viewport_width(300.0, 1.0),
//! );
//! let mut model = ModelState::new();
//! model.set_sections(vec![section]);
//!
//! let mut layout = LayoutState::new(
//!     model,
//!     Rect::new(0.0, -50.0, 300.0, 350.0),
//!     Insets::new(0.0, 50.0, 0.0, 30.0),
//!     1.0,
//!     StackingDirection::TopToBottom,
//! );
//!
//! // Scrolled to the very top: the anchor is the absolute top edge, and
//! // resolving it restores the original offset.
//! let anchor = layout.target_content_offset_anchor();
//! assert_eq!(layout.y_offset(anchor), -50.0);
//! ```
//!
//! The snapshot for the "before" phase comes from [`LayoutState::clone`];
//! the clone owns an independent copy of the model, so the pre-update
//! layout stays queryable while the live one mutates.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod anchor;
mod translate;

use alloc::vec::Vec;

use kurbo::{Insets, Point, Rect, Size};

use folio_model::{ElementLocation, ModelState, aligned_to_pixel};

pub use anchor::{ContentOffsetAnchor, StackingDirection};
pub use translate::{ModelProvider, RawPath, RawUpdate, RawUpdateAction, translate_updates};

/// Where the viewport sits relative to the scrollable extent.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Position {
    AtTop,
    InMiddle,
    AtBottom,
}

/// The layout engine's viewport-aware state: a model plus the bounds,
/// insets, pixel scale, and stacking direction of the hosting scroller.
///
/// All geometry queries take `&mut self` because they are served from the
/// model's lazily maintained caches.
#[derive(Clone, Debug)]
pub struct LayoutState {
    model: ModelState,
    bounds: Rect,
    content_insets: Insets,
    scale: f64,
    direction: StackingDirection,
    width_epsilon: f64,
}

impl LayoutState {
    /// Creates a layout state over `model` for the given viewport.
    #[must_use]
    pub fn new(
        model: ModelState,
        bounds: Rect,
        content_insets: Insets,
        scale: f64,
        direction: StackingDirection,
    ) -> Self {
        let mut state = Self {
            model,
            bounds,
            content_insets,
            scale,
            direction,
            width_epsilon: 0.0,
        };
        state.sync_visible_bounds();
        state
    }

    /// Returns a shared reference to the underlying model.
    #[must_use]
    pub fn model(&self) -> &ModelState {
        &self.model
    }

    /// Returns a mutable reference to the underlying model.
    pub fn model_mut(&mut self) -> &mut ModelState {
        &mut self.model
    }

    /// Current viewport bounds, in content coordinates. The origin is the
    /// scroll offset.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Current content insets.
    #[must_use]
    pub const fn content_insets(&self) -> Insets {
        self.content_insets
    }

    /// Current pixel scale.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Current stacking direction.
    #[must_use]
    pub const fn direction(&self) -> StackingDirection {
        self.direction
    }

    /// Updates the viewport. Call whenever bounds, insets, scale, or
    /// direction change on the host side.
    pub fn set_viewport(
        &mut self,
        bounds: Rect,
        content_insets: Insets,
        scale: f64,
        direction: StackingDirection,
    ) {
        self.bounds = bounds;
        self.content_insets = content_insets;
        self.scale = scale;
        self.direction = direction;
        self.sync_visible_bounds();
    }

    /// Configures the width shrink applied to [`LayoutState::content_size`].
    ///
    /// Defaults to zero. Some scroller implementations under-query the last
    /// row after batched edits unless the reported content width is a hair
    /// narrower than the viewport; hosts that observe that symptom can set a
    /// small epsilon here.
    pub fn set_width_epsilon(&mut self, epsilon: f64) {
        self.width_epsilon = epsilon.max(0.0);
    }

    /// Size of the scrollable content: the inset viewport width by the
    /// cumulative height of all sections.
    pub fn content_size(&mut self) -> Size {
        let width = self.bounds.width()
            - self.content_insets.x0
            - self.content_insets.x1
            - self.width_epsilon;
        let section_count = self.model.section_count();
        let height = if section_count == 0 {
            0.0
        } else {
            self.model.section_max_y(section_count - 1)
        };
        Size::new(width, height)
    }

    /// The smallest reachable content offset.
    #[must_use]
    pub fn min_content_offset(&self) -> Point {
        Point::new(-self.content_insets.x0, -self.content_insets.y0)
    }

    /// The largest reachable content offset, never less than
    /// [`LayoutState::min_content_offset`] (content smaller than the
    /// viewport degenerates to the minimum).
    pub fn max_content_offset(&mut self) -> Point {
        let content_size = self.content_size();
        let min = self.min_content_offset();
        let x = content_size.width - self.bounds.width() + self.content_insets.x1;
        let y = content_size.height - self.bounds.height() + self.content_insets.y1;
        Point::new(x.max(min.x), y.max(min.y))
    }

    /// Selects the anchor that keeps the visible window visually stable
    /// across an upcoming mutation.
    ///
    /// Fully visible items are preferred, and among them the first/last with
    /// a settled height (anchoring to an unmeasured estimate would make the
    /// restored offset jump once the measurement lands). When nothing is
    /// fully visible, as with a single element taller than the viewport, the
    /// partially visible items serve as candidates instead of snapping to an
    /// edge. With no candidates at all the anchor degrades to the edge
    /// sentinel for the active stacking direction.
    pub fn target_content_offset_anchor(&mut self) -> ContentOffsetAnchor {
        let bounds = self.bounds;
        let pairs = self.model.item_location_frame_pairs(bounds);

        let mut candidates: Vec<(ElementLocation, Rect)> = pairs
            .iter()
            .copied()
            .filter(|(_, frame)| rect_contains(bounds, *frame))
            .collect();
        if candidates.is_empty() {
            candidates = pairs;
        }
        candidates.sort_unstable_by_key(|(location, _)| *location);

        let min_y = aligned_to_pixel(self.min_content_offset().y, self.scale);
        let max_y = aligned_to_pixel(self.max_content_offset().y, self.scale);

        let first = candidates
            .iter()
            .find(|(location, _)| self.model.is_item_height_settled(*location))
            .or_else(|| candidates.first())
            .copied();
        let last = candidates
            .iter()
            .rev()
            .find(|(location, _)| self.model.is_item_height_settled(*location))
            .or_else(|| candidates.last())
            .copied();

        let (Some((first_location, first_frame)), Some((last_location, last_frame))) =
            (first, last)
        else {
            return self.edge_anchor(min_y, max_y);
        };
        let (Some(first_id), Some(last_id)) = (
            self.model.id_for_item(first_location),
            self.model.id_for_item(last_location),
        ) else {
            return self.edge_anchor(min_y, max_y);
        };

        let is_at_top = bounds.y0 <= min_y;
        let is_at_bottom = bounds.y0 >= max_y;
        let position = match (is_at_top, is_at_bottom) {
            (true, true) => match self.direction {
                StackingDirection::TopToBottom => Position::AtTop,
                StackingDirection::BottomToTop => Position::AtBottom,
            },
            (true, false) => Position::AtTop,
            (false, true) => Position::AtBottom,
            (false, false) => Position::InMiddle,
        };

        match self.direction {
            StackingDirection::TopToBottom => match position {
                Position::AtTop => ContentOffsetAnchor::Top {
                    overscroll: (min_y - bounds.y0).max(0.0),
                },
                Position::InMiddle | Position::AtBottom => {
                    let top = bounds.y0 + self.content_insets.y0;
                    ContentOffsetAnchor::TopItem {
                        id: first_id,
                        location: first_location,
                        distance_from_top: aligned_to_pixel(first_frame.y0 - top, self.scale),
                    }
                }
            },
            StackingDirection::BottomToTop => match position {
                Position::AtBottom => ContentOffsetAnchor::Bottom {
                    overscroll: (bounds.y0 - max_y).max(0.0),
                },
                Position::AtTop | Position::InMiddle => {
                    let bottom = bounds.y1 - self.content_insets.y1;
                    ContentOffsetAnchor::BottomItem {
                        id: last_id,
                        location: last_location,
                        distance_from_bottom: aligned_to_pixel(last_frame.y1 - bottom, self.scale),
                    }
                }
            },
        }
    }

    /// Resolves an anchor into a concrete scroll offset against the current
    /// state.
    ///
    /// Item anchors are re-located by identifier so they survive structural
    /// reordering; an anchor whose item no longer exists falls back to the
    /// current offset. Results are clamped into the reachable offset range,
    /// except for edge anchors, which restore any rubber-banded overscroll
    /// verbatim.
    pub fn y_offset(&mut self, anchor: ContentOffsetAnchor) -> f64 {
        match anchor {
            ContentOffsetAnchor::Top { overscroll } => self.min_content_offset().y - overscroll,
            ContentOffsetAnchor::Bottom { overscroll } => self.max_content_offset().y + overscroll,
            ContentOffsetAnchor::TopItem {
                id,
                distance_from_top,
                ..
            } => {
                let Some(location) = self.model.location_for_item_id(id) else {
                    return self.bounds.y0;
                };
                let frame = self.model.frame_for_item(location);
                let proposed = frame.y0 - self.content_insets.y0 - distance_from_top;
                let min = self.min_content_offset().y;
                let max = self.max_content_offset().y;
                proposed.max(min).min(max)
            }
            ContentOffsetAnchor::BottomItem {
                id,
                distance_from_bottom,
                ..
            } => {
                let Some(location) = self.model.location_for_item_id(id) else {
                    return self.bounds.y0;
                };
                let frame = self.model.frame_for_item(location);
                let proposed = frame.y1 - self.bounds.height() + self.content_insets.y1
                    - distance_from_bottom;
                let min = self.min_content_offset().y;
                let max = self.max_content_offset().y;
                proposed.max(min).min(max)
            }
        }
    }

    /// Offset adjustment to apply when the content insets change.
    ///
    /// Top-to-bottom layouts let the host handle inset changes natively.
    /// Bottom-to-top layouts stay pinned to the bottom, so growth at either
    /// edge shifts the offset by the total delta.
    #[must_use]
    pub fn content_offset_adjustment_for_inset_change(&self, previous_insets: Insets) -> f64 {
        match self.direction {
            StackingDirection::TopToBottom => 0.0,
            StackingDirection::BottomToTop => {
                (self.content_insets.y0 - previous_insets.y0)
                    + (self.content_insets.y1 - previous_insets.y1)
            }
        }
    }

    fn edge_anchor(&self, min_y: f64, max_y: f64) -> ContentOffsetAnchor {
        match self.direction {
            StackingDirection::TopToBottom => ContentOffsetAnchor::Top {
                overscroll: (min_y - self.bounds.y0).max(0.0),
            },
            StackingDirection::BottomToTop => ContentOffsetAnchor::Bottom {
                overscroll: (self.bounds.y0 - max_y).max(0.0),
            },
        }
    }

    /// Pushes the inset-adjusted visible region down to the model, which
    /// needs it for pinned headers and footers.
    fn sync_visible_bounds(&mut self) {
        let visible = Rect::new(
            self.bounds.x0 + self.content_insets.x0,
            self.bounds.y0 + self.content_insets.y0,
            self.bounds.x1 - self.content_insets.x1,
            self.bounds.y1 - self.content_insets.y1,
        );
        self.model.set_visible_bounds(visible);
    }
}

/// Inclusive rect containment.
fn rect_contains(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 && inner.x1 <= outer.x1 && inner.y0 >= outer.y0 && inner.y1 <= outer.y1
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::rect_contains;

    #[test]
    fn rect_containment_is_inclusive() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(rect_contains(outer, outer));
        assert!(rect_contains(outer, Rect::new(10.0, 10.0, 90.0, 90.0)));
        assert!(!rect_contains(outer, Rect::new(10.0, 10.0, 90.0, 101.0)));
        assert!(!rect_contains(outer, Rect::new(-1.0, 10.0, 90.0, 90.0)));
    }
}
