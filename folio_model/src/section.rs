// Copyright 2025 the Folio Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Section models and the memoized row-packing pass.

use alloc::vec::Vec;

use kurbo::Rect;
use smallvec::SmallVec;

use crate::id::{ElementId, IdGenerator};
use crate::types::{
    BackgroundModel, FooterModel, HeaderModel, ItemHeightMode, ItemModel, ItemSizeMode,
    SectionMetrics, WidthMode, aligned_to_pixel,
};

/// Tolerance when summing row width fractions. Widths are rounded to the
/// pixel grid, so fit decisions use exact fractions instead of pixel sums.
const ROW_FRACTION_EPSILON: f64 = 1e-9;

/// Memoized output of the row-packing pass, in section-local coordinates.
#[derive(Clone, Debug)]
struct SectionLayout {
    item_frames: Vec<Rect>,
    /// Resting (unpinned) header frame.
    header_frame: Option<Rect>,
    /// Resting (unpinned) footer frame.
    footer_frame: Option<Rect>,
    height: f64,
}

static EMPTY_LAYOUT: SectionLayout = SectionLayout {
    item_frames: Vec::new(),
    header_frame: None,
    footer_frame: None,
    height: 0.0,
};

/// One section: an ordered run of items plus optional header, footer, and
/// background decorations.
///
/// Frames are computed by a row-packing pass over the items: items pack left
/// to right, wrapping to a new row when the next item's width fraction no
/// longer fits, with full-width items always occupying a row of their own.
/// The pass is memoized and recomputed only after a mutation invalidates it;
/// all frames are in section-local coordinates (the section's own origin),
/// and [`crate::ModelState`] offsets them by the cumulative height of prior
/// sections.
#[derive(Clone, Debug)]
pub struct SectionModel {
    id: ElementId,
    items: Vec<ItemModel>,
    header: Option<HeaderModel>,
    footer: Option<FooterModel>,
    background: Option<BackgroundModel>,
    metrics: SectionMetrics,
    layout: Option<SectionLayout>,
}

impl SectionModel {
    /// Creates a section with a fresh identifier.
    pub fn new(
        ids: &mut IdGenerator,
        items: Vec<ItemModel>,
        header: Option<HeaderModel>,
        footer: Option<FooterModel>,
        background: Option<BackgroundModel>,
        metrics: SectionMetrics,
    ) -> Self {
        Self {
            id: ids.next_id(),
            items,
            header,
            footer,
            background,
            metrics,
            layout: None,
        }
    }

    /// Stable identity of this section.
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }

    /// Number of items in this section.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the item at `index`, if it exists.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<&ItemModel> {
        self.items.get(index)
    }

    /// Returns the identifier of the item at `index`, if it exists.
    #[must_use]
    pub fn id_for_item(&self, index: usize) -> Option<ElementId> {
        self.items.get(index).map(|item| item.id)
    }

    /// Returns the index of the item with `id`, if present.
    #[must_use]
    pub fn index_of_item(&self, id: ElementId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Returns the header, if any.
    #[must_use]
    pub fn header(&self) -> Option<&HeaderModel> {
        self.header.as_ref()
    }

    /// Returns the footer, if any.
    #[must_use]
    pub fn footer(&self) -> Option<&FooterModel> {
        self.footer.as_ref()
    }

    /// Returns the background, if any.
    #[must_use]
    pub fn background(&self) -> Option<&BackgroundModel> {
        self.background.as_ref()
    }

    /// Returns the section metrics.
    #[must_use]
    pub const fn metrics(&self) -> &SectionMetrics {
        &self.metrics
    }

    /// Replaces the section metrics.
    pub fn set_metrics(&mut self, metrics: SectionMetrics) {
        self.metrics = metrics;
        self.layout = None;
    }

    /// Records a settled measured height for the item at `index`.
    ///
    /// Returns `false` if `index` is out of bounds.
    pub fn update_item_height(&mut self, index: usize, preferred_height: f64) -> bool {
        let Some(item) = self.items.get_mut(index) else {
            return false;
        };
        item.preferred_height = Some(preferred_height);
        self.layout = None;
        true
    }

    /// Replaces the sizing rule of the item at `index`, resetting its
    /// assumed height to the new rule's initial height.
    ///
    /// Returns `false` if `index` is out of bounds.
    pub fn update_item_size_mode(&mut self, index: usize, size_mode: ItemSizeMode) -> bool {
        let Some(item) = self.items.get_mut(index) else {
            return false;
        };
        item.size_mode = size_mode;
        item.height = size_mode.height_mode.initial_height();
        self.layout = None;
        true
    }

    /// Records a settled measured height for the header.
    ///
    /// Returns `false` if the section has no header.
    pub fn update_header_height(&mut self, preferred_height: f64) -> bool {
        let Some(header) = self.header.as_mut() else {
            return false;
        };
        header.preferred_height = Some(preferred_height);
        self.layout = None;
        true
    }

    /// Records a settled measured height for the footer.
    ///
    /// Returns `false` if the section has no footer.
    pub fn update_footer_height(&mut self, preferred_height: f64) -> bool {
        let Some(footer) = self.footer.as_mut() else {
            return false;
        };
        footer.preferred_height = Some(preferred_height);
        self.layout = None;
        true
    }

    /// Sets or replaces the header.
    pub fn set_header(&mut self, header: HeaderModel) {
        self.header = Some(header);
        self.layout = None;
    }

    /// Removes the header. Returns `true` if one was present.
    pub fn remove_header(&mut self) -> bool {
        let removed = self.header.take().is_some();
        if removed {
            self.layout = None;
        }
        removed
    }

    /// Sets or replaces the footer.
    pub fn set_footer(&mut self, footer: FooterModel) {
        self.footer = Some(footer);
        self.layout = None;
    }

    /// Removes the footer. Returns `true` if one was present.
    pub fn remove_footer(&mut self) -> bool {
        let removed = self.footer.take().is_some();
        if removed {
            self.layout = None;
        }
        removed
    }

    /// Sets or replaces the background. Backgrounds do not affect heights,
    /// so this never invalidates the row layout.
    pub fn set_background(&mut self, background: BackgroundModel) {
        self.background = Some(background);
    }

    /// Removes the background. Returns `true` if one was present.
    pub fn remove_background(&mut self) -> bool {
        self.background.take().is_some()
    }

    /// Inserts an item at `index`.
    ///
    /// Returns `false` if `index` is past the end.
    pub fn insert_item(&mut self, index: usize, item: ItemModel) -> bool {
        if index > self.items.len() {
            return false;
        }
        self.items.insert(index, item);
        self.layout = None;
        true
    }

    /// Removes and returns the item at `index`, if it exists.
    pub fn remove_item(&mut self, index: usize) -> Option<ItemModel> {
        if index >= self.items.len() {
            return None;
        }
        self.layout = None;
        Some(self.items.remove(index))
    }

    /// Replaces the item at `index`.
    ///
    /// Returns `false` if `index` is out of bounds.
    pub fn replace_item(&mut self, index: usize, item: ItemModel) -> bool {
        let Some(slot) = self.items.get_mut(index) else {
            return false;
        };
        *slot = item;
        self.layout = None;
        true
    }

    /// Total height of the section: insets, header, item rows, and footer.
    pub fn height(&mut self) -> f64 {
        self.ensure_layout().height
    }

    /// Frame of the item at `index`, in section-local coordinates.
    ///
    /// Out-of-range indices are a contract violation and yield a zero rect.
    pub fn frame_for_item(&mut self, index: usize) -> Rect {
        let layout = self.ensure_layout();
        debug_assert!(
            index < layout.item_frames.len(),
            "item index {index} is out of bounds of the item frames"
        );
        layout.item_frames.get(index).copied().unwrap_or(Rect::ZERO)
    }

    /// Frame of the header, in section-local coordinates.
    ///
    /// `visible_bounds` is the currently visible region translated into
    /// section-local coordinates; pinned headers are clamped so they stay
    /// inside it while the section is on screen.
    pub fn frame_for_header(&mut self, visible_bounds: Rect) -> Option<Rect> {
        let pinned = self.header.as_ref()?.pinned;
        let section_insets = self.metrics.section_insets;
        let layout = self.ensure_layout();
        let frame = layout.header_frame?;
        if !pinned {
            return Some(frame);
        }
        let footer_height = layout.footer_frame.map_or(0.0, |frame| frame.height());
        let max_y0 =
            (layout.height - section_insets.y1 - footer_height - frame.height()).max(frame.y0);
        let y0 = visible_bounds.y0.max(frame.y0).min(max_y0);
        Some(frame.with_origin((frame.x0, y0)))
    }

    /// Frame of the footer, in section-local coordinates.
    ///
    /// `visible_bounds` is the currently visible region translated into
    /// section-local coordinates; pinned footers are clamped so they stay
    /// inside it while the section is on screen.
    pub fn frame_for_footer(&mut self, visible_bounds: Rect) -> Option<Rect> {
        let pinned = self.footer.as_ref()?.pinned;
        let section_insets = self.metrics.section_insets;
        let header_height = self
            .header
            .as_ref()
            .map_or(0.0, HeaderModel::effective_height);
        let layout = self.ensure_layout();
        let frame = layout.footer_frame?;
        if !pinned {
            return Some(frame);
        }
        let min_y0 = section_insets.y0 + header_height;
        let y0 = (visible_bounds.y1 - frame.height()).max(min_y0).min(frame.y0);
        Some(frame.with_origin((frame.x0, y0)))
    }

    /// Frame of the background, spanning the whole section.
    pub fn frame_for_background(&mut self) -> Option<Rect> {
        self.background?;
        let content_width = self.metrics.content_width();
        let height = self.ensure_layout().height;
        Some(Rect::new(0.0, 0.0, content_width, height))
    }

    fn ensure_layout(&mut self) -> &SectionLayout {
        if self.layout.is_none() {
            self.layout = Some(self.compute_layout());
        }
        self.layout.as_ref().unwrap_or(&EMPTY_LAYOUT)
    }

    fn compute_layout(&self) -> SectionLayout {
        let metrics = self.metrics;
        let content_width = metrics.content_width();
        let inset_width =
            (content_width - metrics.section_insets.x0 - metrics.section_insets.x1).max(0.0);
        let item_area_width =
            (inset_width - metrics.item_insets.x0 - metrics.item_insets.x1).max(0.0);
        let item_area_x = metrics.section_insets.x0 + metrics.item_insets.x0;

        let mut y = metrics.section_insets.y0;

        let header_frame = self.header.as_ref().map(|header| {
            Rect::new(
                metrics.section_insets.x0,
                y,
                metrics.section_insets.x0 + inset_width,
                y + header.effective_height(),
            )
        });
        if let Some(frame) = header_frame {
            y = frame.y1;
        }

        let mut item_frames = Vec::with_capacity(self.items.len());
        if !self.items.is_empty() {
            y += metrics.item_insets.y0;

            // Indices of the items in the row currently being packed.
            let mut row: SmallVec<[usize; 8]> = SmallVec::new();
            let mut row_fraction = 0.0_f64;
            let mut row_x = 0.0_f64;
            let mut row_y = y;

            for (index, item) in self.items.iter().enumerate() {
                let fraction = item.size_mode.width_mode.row_fraction();
                if !row.is_empty() && row_fraction + fraction > 1.0 + ROW_FRACTION_EPSILON {
                    let row_max_y = Self::close_row(&mut item_frames, &row, &self.items);
                    row.clear();
                    row_fraction = 0.0;
                    row_x = 0.0;
                    row_y = row_max_y + metrics.vertical_spacing;
                }

                let width = Self::width_for_mode(
                    item.size_mode.width_mode,
                    &metrics,
                    item_area_width,
                    content_width,
                );
                let x = match item.size_mode.width_mode {
                    WidthMode::FullWidth {
                        respects_horizontal_insets: false,
                    } => 0.0,
                    WidthMode::FullWidth { .. } => item_area_x,
                    WidthMode::Fractional(_) => item_area_x + row_x,
                };
                item_frames.push(Rect::new(
                    x,
                    row_y,
                    x + width,
                    row_y + item.effective_height(),
                ));
                row.push(index);
                row_fraction += fraction;
                row_x += width + metrics.horizontal_spacing;
            }

            y = Self::close_row(&mut item_frames, &row, &self.items);
            y += metrics.item_insets.y1;
        }

        let footer_frame = self.footer.as_ref().map(|footer| {
            Rect::new(
                metrics.section_insets.x0,
                y,
                metrics.section_insets.x0 + inset_width,
                y + footer.effective_height(),
            )
        });
        if let Some(frame) = footer_frame {
            y = frame.y1;
        }

        SectionLayout {
            item_frames,
            header_frame,
            footer_frame,
            height: y + metrics.section_insets.y1,
        }
    }

    /// Applies row stretching to a completed row and returns its bottom edge.
    fn close_row(frames: &mut [Rect], row: &[usize], items: &[ItemModel]) -> f64 {
        // Stretch rows grow to the tallest settled row-mate; when nothing in
        // the row is settled yet, the tallest estimate wins so a row never
        // collapses below its own content.
        let mut tallest = 0.0_f64;
        let mut tallest_settled = 0.0_f64;
        let mut any_settled = false;
        for &index in row {
            let height = items[index].effective_height();
            tallest = tallest.max(height);
            if items[index].is_height_settled() {
                tallest_settled = tallest_settled.max(height);
                any_settled = true;
            }
        }
        let stretch_height = if any_settled { tallest_settled } else { tallest };

        let mut max_y = 0.0_f64;
        for &index in row {
            if matches!(
                items[index].size_mode.height_mode,
                ItemHeightMode::DynamicAndStretchToTallestItemInRow(_)
            ) {
                let frame = frames[index];
                frames[index] = Rect::new(frame.x0, frame.y0, frame.x1, frame.y0 + stretch_height);
            }
            max_y = max_y.max(frames[index].y1);
        }
        max_y
    }

    fn width_for_mode(
        mode: WidthMode,
        metrics: &SectionMetrics,
        item_area_width: f64,
        content_width: f64,
    ) -> f64 {
        match mode {
            WidthMode::FullWidth {
                respects_horizontal_insets: true,
            } => item_area_width,
            WidthMode::FullWidth {
                respects_horizontal_insets: false,
            } => content_width,
            WidthMode::Fractional(divisor) => {
                let n = divisor.get() as f64;
                let spacing = metrics.horizontal_spacing * (n - 1.0);
                aligned_to_pixel(((item_area_width - spacing) / n).max(0.0), metrics.scale)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use kurbo::{Insets, Rect};

    use super::SectionModel;
    use crate::id::IdGenerator;
    use crate::types::{
        BackgroundModel, HeaderModel, HeightMode, ItemHeightMode, ItemModel, ItemSizeMode,
        SectionMetrics, WidthMode,
    };

    fn item(ids: &mut IdGenerator, width_mode: WidthMode, height: f64) -> ItemModel {
        ItemModel::new(
            ids,
            ItemSizeMode {
                width_mode,
                height_mode: ItemHeightMode::Static(height),
            },
        )
    }

    #[test]
    fn half_width_items_pack_two_per_row() {
        let mut ids = IdGenerator::new();
        let items: Vec<_> = (0..4)
            .map(|_| item(&mut ids, WidthMode::half(), 40.0))
            .collect();
        let mut section = SectionModel::new(
            &mut ids,
            items,
            None,
            None,
            None,
            SectionMetrics::with_viewport_width(300.0, 1.0),
        );

        assert_eq!(section.frame_for_item(0), Rect::new(0.0, 0.0, 150.0, 40.0));
        assert_eq!(
            section.frame_for_item(1),
            Rect::new(150.0, 0.0, 300.0, 40.0)
        );
        assert_eq!(
            section.frame_for_item(2),
            Rect::new(0.0, 40.0, 150.0, 80.0)
        );
        assert_eq!(section.height(), 80.0);
    }

    #[test]
    fn rows_advance_past_the_tallest_item() {
        let mut ids = IdGenerator::new();
        let items = vec![
            item(&mut ids, WidthMode::half(), 90.0),
            item(&mut ids, WidthMode::half(), 40.0),
            item(&mut ids, WidthMode::full(), 20.0),
        ];
        let mut section = SectionModel::new(
            &mut ids,
            items,
            None,
            None,
            None,
            SectionMetrics::with_viewport_width(300.0, 1.0),
        );

        // The full-width item starts below the taller of the two row-mates.
        assert_eq!(
            section.frame_for_item(2),
            Rect::new(0.0, 90.0, 300.0, 110.0)
        );
        assert_eq!(section.height(), 110.0);
    }

    #[test]
    fn full_width_items_occupy_their_own_row() {
        let mut ids = IdGenerator::new();
        let items = vec![
            item(&mut ids, WidthMode::half(), 40.0),
            item(&mut ids, WidthMode::full(), 40.0),
            item(&mut ids, WidthMode::half(), 40.0),
        ];
        let mut section = SectionModel::new(
            &mut ids,
            items,
            None,
            None,
            None,
            SectionMetrics::with_viewport_width(300.0, 1.0),
        );

        assert_eq!(section.frame_for_item(0).y0, 0.0);
        assert_eq!(section.frame_for_item(1).y0, 40.0);
        assert_eq!(section.frame_for_item(2).y0, 80.0);
    }

    #[test]
    fn stretch_items_match_the_tallest_settled_row_mate() {
        let mut ids = IdGenerator::new();
        let stretchy = ItemModel::new(
            &mut ids,
            ItemSizeMode {
                width_mode: WidthMode::half(),
                height_mode: ItemHeightMode::DynamicAndStretchToTallestItemInRow(30.0),
            },
        );
        let items = vec![stretchy, item(&mut ids, WidthMode::half(), 75.0)];
        let mut section = SectionModel::new(
            &mut ids,
            items,
            None,
            None,
            None,
            SectionMetrics::with_viewport_width(300.0, 1.0),
        );

        assert_eq!(section.frame_for_item(0).height(), 75.0);
        assert_eq!(section.height(), 75.0);
    }

    #[test]
    fn spacing_and_insets_shape_the_section() {
        let mut ids = IdGenerator::new();
        let items = vec![
            item(&mut ids, WidthMode::half(), 40.0),
            item(&mut ids, WidthMode::half(), 40.0),
            item(&mut ids, WidthMode::half(), 40.0),
        ];
        let metrics = SectionMetrics {
            vertical_spacing: 10.0,
            horizontal_spacing: 20.0,
            section_insets: Insets::new(5.0, 7.0, 5.0, 7.0),
            item_insets: Insets::new(3.0, 2.0, 3.0, 2.0),
            ..SectionMetrics::with_viewport_width(300.0, 1.0)
        };
        let mut section = SectionModel::new(&mut ids, items, None, None, None, metrics);

        // Item area: 300 - 10 (section) - 6 (item) = 284; halves are
        // (284 - 20) / 2 = 132 wide.
        assert_eq!(
            section.frame_for_item(0),
            Rect::new(8.0, 9.0, 140.0, 49.0)
        );
        assert_eq!(
            section.frame_for_item(1),
            Rect::new(160.0, 9.0, 292.0, 49.0)
        );
        // The third item wraps, one vertical-spacing below the first row.
        assert_eq!(
            section.frame_for_item(2),
            Rect::new(8.0, 59.0, 140.0, 99.0)
        );
        // Height: 7 + 2 + 90 + 2 + 7.
        assert_eq!(section.height(), 108.0);
    }

    #[test]
    fn pinned_header_follows_the_visible_bounds_within_its_section() {
        let mut ids = IdGenerator::new();
        let header = HeaderModel::new(&mut ids, HeightMode::Static(20.0), true);
        let items: Vec<_> = (0..4)
            .map(|_| item(&mut ids, WidthMode::full(), 100.0))
            .collect();
        let mut section = SectionModel::new(
            &mut ids,
            items,
            Some(header),
            None,
            None,
            SectionMetrics::with_viewport_width(300.0, 1.0),
        );

        // Resting position at the top of the section.
        let resting = section
            .frame_for_header(Rect::new(0.0, 0.0, 300.0, 200.0))
            .unwrap();
        assert_eq!(resting.y0, 0.0);

        // Scrolled into the section: the header rides the visible top edge.
        let pinned = section
            .frame_for_header(Rect::new(0.0, 150.0, 300.0, 350.0))
            .unwrap();
        assert_eq!(pinned.y0, 150.0);

        // Never escapes the bottom of its own section.
        let clamped = section
            .frame_for_header(Rect::new(0.0, 1000.0, 300.0, 1200.0))
            .unwrap();
        assert_eq!(clamped.y0, 400.0);
    }

    #[test]
    fn background_spans_the_whole_section() {
        let mut ids = IdGenerator::new();
        let background = BackgroundModel::new(&mut ids);
        let items = vec![item(&mut ids, WidthMode::full(), 50.0)];
        let mut section = SectionModel::new(
            &mut ids,
            items,
            None,
            None,
            Some(background),
            SectionMetrics::with_viewport_width(300.0, 1.0),
        );

        assert_eq!(
            section.frame_for_background(),
            Some(Rect::new(0.0, 0.0, 300.0, 50.0))
        );
    }
}
