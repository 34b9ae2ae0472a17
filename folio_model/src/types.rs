// Copyright 2025 the Folio Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the structural model: locations, size modes, element
//! models, and section metrics.

use core::num::NonZeroUsize;

use kurbo::Insets;

use crate::id::{ElementId, IdGenerator};

/// A structural position: a section index plus an element index within it.
///
/// Headers, footers, and backgrounds always use element index `0` since a
/// section holds at most one of each.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ElementLocation {
    /// Index of the containing section.
    pub section_index: usize,
    /// Index of the element within the section.
    pub element_index: usize,
}

impl ElementLocation {
    /// Creates a new location.
    #[must_use]
    pub const fn new(section_index: usize, element_index: usize) -> Self {
        Self {
            section_index,
            element_index,
        }
    }
}

/// Horizontal extent rule for an item.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WidthMode {
    /// The item spans the full available width.
    FullWidth {
        /// Whether section and item horizontal insets shrink the item. When
        /// `false` the item spans the entire content width, edge to edge.
        respects_horizontal_insets: bool,
    },
    /// The item spans `1/N` of the available width.
    Fractional(NonZeroUsize),
}

impl WidthMode {
    /// Full width, respecting horizontal insets.
    #[must_use]
    pub const fn full() -> Self {
        Self::FullWidth {
            respects_horizontal_insets: true,
        }
    }

    /// Half of the available width.
    #[must_use]
    pub const fn half() -> Self {
        Self::Fractional(NonZeroUsize::new(2).unwrap())
    }

    /// A third of the available width.
    #[must_use]
    pub const fn third() -> Self {
        Self::Fractional(NonZeroUsize::new(3).unwrap())
    }

    /// The fraction of a row this mode occupies (full width counts as one).
    #[must_use]
    pub fn row_fraction(self) -> f64 {
        match self {
            Self::FullWidth { .. } => 1.0,
            Self::Fractional(divisor) => 1.0 / divisor.get() as f64,
        }
    }
}

/// Vertical sizing rule for an item.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ItemHeightMode {
    /// Fixed height, known up front.
    Static(f64),
    /// Self-sized; the payload is the estimate used until a measurement
    /// arrives.
    Dynamic(f64),
    /// Self-sized, then stretched to match the tallest item in its row.
    DynamicAndStretchToTallestItemInRow(f64),
}

impl ItemHeightMode {
    /// The height assumed before any measurement arrives.
    #[must_use]
    pub const fn initial_height(self) -> f64 {
        match self {
            Self::Static(height)
            | Self::Dynamic(height)
            | Self::DynamicAndStretchToTallestItemInRow(height) => height,
        }
    }

    /// Returns `true` for [`ItemHeightMode::Static`].
    #[must_use]
    pub const fn is_static(self) -> bool {
        matches!(self, Self::Static(_))
    }
}

/// Vertical sizing rule for a header or footer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum HeightMode {
    /// Fixed height, known up front.
    Static(f64),
    /// Self-sized; the payload is the estimate used until a measurement
    /// arrives.
    Dynamic(f64),
}

impl HeightMode {
    /// The height assumed before any measurement arrives.
    #[must_use]
    pub const fn initial_height(self) -> f64 {
        match self {
            Self::Static(height) | Self::Dynamic(height) => height,
        }
    }

    /// Returns `true` for [`HeightMode::Static`].
    #[must_use]
    pub const fn is_static(self) -> bool {
        matches!(self, Self::Static(_))
    }
}

/// Combined sizing rule for an item.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ItemSizeMode {
    /// Horizontal extent rule.
    pub width_mode: WidthMode,
    /// Vertical sizing rule.
    pub height_mode: ItemHeightMode,
}

/// An item in a section.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemModel {
    /// Stable identity of this item.
    pub id: ElementId,
    /// Sizing rule.
    pub size_mode: ItemSizeMode,
    /// Assumed height: the estimate until a measurement arrives.
    pub height: f64,
    /// Settled measured height, once recorded.
    pub preferred_height: Option<f64>,
}

impl ItemModel {
    /// Creates an item with a fresh identifier and no measurement yet.
    pub fn new(ids: &mut IdGenerator, size_mode: ItemSizeMode) -> Self {
        Self {
            id: ids.next_id(),
            size_mode,
            height: size_mode.height_mode.initial_height(),
            preferred_height: None,
        }
    }

    /// Height used for layout: the settled measurement if present, the
    /// assumed height otherwise.
    #[must_use]
    pub fn effective_height(&self) -> f64 {
        self.preferred_height.unwrap_or(self.height)
    }

    /// A height is settled iff the mode is static or a measurement has been
    /// recorded.
    #[must_use]
    pub fn is_height_settled(&self) -> bool {
        self.size_mode.height_mode.is_static() || self.preferred_height.is_some()
    }
}

/// A section header.
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderModel {
    /// Stable identity of this header.
    pub id: ElementId,
    /// Vertical sizing rule.
    pub height_mode: HeightMode,
    /// Assumed height: the estimate until a measurement arrives.
    pub height: f64,
    /// Settled measured height, once recorded.
    pub preferred_height: Option<f64>,
    /// Whether the header stays inside the visible bounds while its section
    /// is on screen.
    pub pinned: bool,
}

impl HeaderModel {
    /// Creates a header with a fresh identifier and no measurement yet.
    pub fn new(ids: &mut IdGenerator, height_mode: HeightMode, pinned: bool) -> Self {
        Self {
            id: ids.next_id(),
            height_mode,
            height: height_mode.initial_height(),
            preferred_height: None,
            pinned,
        }
    }

    /// Height used for layout.
    #[must_use]
    pub fn effective_height(&self) -> f64 {
        self.preferred_height.unwrap_or(self.height)
    }

    /// A height is settled iff the mode is static or a measurement has been
    /// recorded.
    #[must_use]
    pub fn is_height_settled(&self) -> bool {
        self.height_mode.is_static() || self.preferred_height.is_some()
    }
}

/// A section footer.
#[derive(Clone, Debug, PartialEq)]
pub struct FooterModel {
    /// Stable identity of this footer.
    pub id: ElementId,
    /// Vertical sizing rule.
    pub height_mode: HeightMode,
    /// Assumed height: the estimate until a measurement arrives.
    pub height: f64,
    /// Settled measured height, once recorded.
    pub preferred_height: Option<f64>,
    /// Whether the footer stays inside the visible bounds while its section
    /// is on screen.
    pub pinned: bool,
}

impl FooterModel {
    /// Creates a footer with a fresh identifier and no measurement yet.
    pub fn new(ids: &mut IdGenerator, height_mode: HeightMode, pinned: bool) -> Self {
        Self {
            id: ids.next_id(),
            height_mode,
            height: height_mode.initial_height(),
            preferred_height: None,
            pinned,
        }
    }

    /// Height used for layout.
    #[must_use]
    pub fn effective_height(&self) -> f64 {
        self.preferred_height.unwrap_or(self.height)
    }

    /// A height is settled iff the mode is static or a measurement has been
    /// recorded.
    #[must_use]
    pub fn is_height_settled(&self) -> bool {
        self.height_mode.is_static() || self.preferred_height.is_some()
    }
}

/// A section background decoration. Backgrounds have no sizing rule; they
/// always span their entire section.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BackgroundModel {
    /// Stable identity of this background.
    pub id: ElementId,
}

impl BackgroundModel {
    /// Creates a background with a fresh identifier.
    pub fn new(ids: &mut IdGenerator) -> Self {
        Self { id: ids.next_id() }
    }
}

/// Layout metrics shared by every element in a section.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SectionMetrics {
    /// Width of the hosting viewport.
    pub viewport_width: f64,
    /// Content insets of the hosting viewport.
    pub viewport_insets: Insets,
    /// Vertical spacing between item rows.
    pub vertical_spacing: f64,
    /// Horizontal spacing between items in a row.
    pub horizontal_spacing: f64,
    /// Insets around the whole section.
    pub section_insets: Insets,
    /// Insets around the item block.
    pub item_insets: Insets,
    /// Device pixel scale used to align computed widths to the pixel grid.
    pub scale: f64,
}

impl SectionMetrics {
    /// Metrics for a viewport of the given width with no insets or spacing.
    #[must_use]
    pub const fn with_viewport_width(viewport_width: f64, scale: f64) -> Self {
        Self {
            viewport_width,
            viewport_insets: Insets::ZERO,
            vertical_spacing: 0.0,
            horizontal_spacing: 0.0,
            section_insets: Insets::ZERO,
            item_insets: Insets::ZERO,
            scale,
        }
    }

    /// Width of the content coordinate space for this section: the viewport
    /// width minus its horizontal insets.
    #[must_use]
    pub fn content_width(&self) -> f64 {
        (self.viewport_width - self.viewport_insets.x0 - self.viewport_insets.x1).max(0.0)
    }
}

/// Aligns `value` to the device pixel grid for the given scale, rounding
/// half away from zero.
///
/// A non-positive scale leaves the value untouched.
#[must_use]
pub fn aligned_to_pixel(value: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return value;
    }
    let scaled = value * scale;
    // `round` needs `std` or `libm`; truncation-based rounding is exact for
    // the coordinate magnitudes involved here.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "Coordinates are far below i64 range; truncation implements the rounding."
    )]
    let rounded = if scaled.is_sign_negative() {
        (scaled - 0.5) as i64
    } else {
        (scaled + 0.5) as i64
    };
    rounded as f64 / scale
}

#[cfg(test)]
mod tests {
    use super::{ItemHeightMode, ItemModel, ItemSizeMode, WidthMode, aligned_to_pixel};
    use crate::id::IdGenerator;

    #[test]
    fn pixel_alignment_rounds_half_away_from_zero() {
        assert_eq!(aligned_to_pixel(10.4, 1.0), 10.0);
        assert_eq!(aligned_to_pixel(10.5, 1.0), 11.0);
        assert_eq!(aligned_to_pixel(-10.5, 1.0), -11.0);
        // Two-pixels-per-point screens align to halves.
        assert_eq!(aligned_to_pixel(10.3, 2.0), 10.5);
        // A degenerate scale is a no-op.
        assert_eq!(aligned_to_pixel(10.3, 0.0), 10.3);
    }

    #[test]
    fn settledness_follows_mode_and_measurement() {
        let mut ids = IdGenerator::new();
        let fixed = ItemModel::new(
            &mut ids,
            ItemSizeMode {
                width_mode: WidthMode::full(),
                height_mode: ItemHeightMode::Static(40.0),
            },
        );
        assert!(fixed.is_height_settled());
        assert_eq!(fixed.effective_height(), 40.0);

        let mut sized = ItemModel::new(
            &mut ids,
            ItemSizeMode {
                width_mode: WidthMode::full(),
                height_mode: ItemHeightMode::Dynamic(100.0),
            },
        );
        assert!(!sized.is_height_settled());
        assert_eq!(sized.effective_height(), 100.0);

        sized.preferred_height = Some(64.0);
        assert!(sized.is_height_settled());
        assert_eq!(sized.effective_height(), 64.0);
    }

    #[test]
    fn width_fractions() {
        assert_eq!(WidthMode::full().row_fraction(), 1.0);
        assert_eq!(WidthMode::half().row_fraction(), 0.5);
        assert_eq!(WidthMode::third().row_fraction(), 1.0 / 3.0);
    }
}
