// Copyright 2025 the Folio Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The mutable section collection: structural mutation, cumulative offset
//! caching, flattened indices, and range queries.

use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};
use kurbo::Rect;

use crate::id::ElementId;
use crate::section::SectionModel;
use crate::types::{
    BackgroundModel, ElementLocation, FooterModel, HeaderModel, HeightMode, ItemHeightMode,
    ItemModel, ItemSizeMode, SectionMetrics,
};
use crate::update::Update;

/// Which flattened index a query runs over.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ElementKind {
    Header,
    Footer,
    Background,
    Item,
}

/// Manages the state of section and element models.
///
/// `ModelState` owns the ordered section list and everything needed to answer
/// position queries incrementally:
///
/// - a per-section cumulative max-Y cache, invalidated from a given section
///   to the end whenever anything at or before it changes height or
///   structure, and refilled lazily from the nearest cached prefix;
/// - flattened per-kind index maps (dense index → structural location) that
///   let range queries binary search over "all items across all sections"
///   without re-walking sections;
/// - identifier lookup tables used to re-locate entities after structural
///   mutations shift their indices;
/// - transient bookkeeping for the in-flight batch update, answering "is
///   this position part of the current transition".
///
/// Cloning a `ModelState` duplicates the section list and all caches; the
/// clone shares nothing with the original. Hosts clone before applying a
/// batch so the pre-update state stays queryable during the transition.
#[derive(Clone, Debug, Default)]
pub struct ModelState {
    sections: Vec<SectionModel>,

    /// `section_max_ys[i]` is either unset or exactly the cumulative height
    /// of sections `0..=i`.
    section_max_ys: Vec<Option<f64>>,

    header_locations: Vec<ElementLocation>,
    footer_locations: Vec<ElementLocation>,
    background_locations: Vec<ElementLocation>,
    item_locations: Vec<ElementLocation>,

    section_indices_by_id: HashMap<ElementId, usize>,
    item_locations_by_id: HashMap<ElementId, ElementLocation>,

    sections_to_insert: HashSet<usize>,
    sections_to_delete: HashSet<usize>,
    items_to_insert: HashSet<ElementLocation>,
    items_to_delete: HashSet<ElementLocation>,

    /// Visible region in content coordinates; consulted only for pinned
    /// header and footer frames.
    visible_bounds: Rect,
}

impl ModelState {
    /// Creates an empty model state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // MARK: structure queries

    /// Number of sections.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Number of items in the section at `section_index`, or zero when the
    /// index is out of range.
    #[must_use]
    pub fn item_count(&self, section_index: usize) -> usize {
        self.sections
            .get(section_index)
            .map_or(0, SectionModel::item_count)
    }

    /// Returns the section at `section_index`, if it exists.
    #[must_use]
    pub fn section(&self, section_index: usize) -> Option<&SectionModel> {
        self.sections.get(section_index)
    }

    /// Returns the item at `location`, if it exists.
    #[must_use]
    pub fn item(&self, location: ElementLocation) -> Option<&ItemModel> {
        self.sections
            .get(location.section_index)?
            .item(location.element_index)
    }

    /// Identifier of the section at `section_index`.
    ///
    /// Returns `None` when out of range, which legitimately happens while a
    /// host resolves positions for transition animations.
    #[must_use]
    pub fn id_for_section(&self, section_index: usize) -> Option<ElementId> {
        self.sections.get(section_index).map(SectionModel::id)
    }

    /// Current index of the section with `id`, if present.
    #[must_use]
    pub fn index_for_section_id(&self, id: ElementId) -> Option<usize> {
        self.section_indices_by_id.get(&id).copied()
    }

    /// Identifier of the item at `location`.
    ///
    /// Returns `None` when out of range, which legitimately happens while a
    /// host resolves positions for transition animations.
    #[must_use]
    pub fn id_for_item(&self, location: ElementLocation) -> Option<ElementId> {
        self.sections
            .get(location.section_index)?
            .id_for_item(location.element_index)
    }

    /// Current location of the item with `id`, if present.
    #[must_use]
    pub fn location_for_item_id(&self, id: ElementId) -> Option<ElementLocation> {
        self.item_locations_by_id.get(&id).copied()
    }

    /// Whether the item at `location` has a settled height: a static height
    /// mode, or a recorded measurement.
    #[must_use]
    pub fn is_item_height_settled(&self, location: ElementLocation) -> bool {
        self.item(location)
            .is_some_and(ItemModel::is_height_settled)
    }

    /// Height mode of the item at `location`.
    #[must_use]
    pub fn item_height_mode(&self, location: ElementLocation) -> Option<ItemHeightMode> {
        debug_assert!(
            self.contains_item(location),
            "height mode queried for out-of-bounds item {location:?}"
        );
        self.item(location).map(|item| item.size_mode.height_mode)
    }

    /// Settled measured height of the item at `location`, if recorded.
    #[must_use]
    pub fn item_preferred_height(&self, location: ElementLocation) -> Option<f64> {
        debug_assert!(
            self.contains_item(location),
            "preferred height queried for out-of-bounds item {location:?}"
        );
        self.item(location)?.preferred_height
    }

    /// Height mode of the header in the section at `section_index`.
    #[must_use]
    pub fn header_height_mode(&self, section_index: usize) -> Option<HeightMode> {
        debug_assert!(
            section_index < self.sections.len(),
            "header height mode queried for out-of-bounds section {section_index}"
        );
        Some(self.sections.get(section_index)?.header()?.height_mode)
    }

    /// Height mode of the footer in the section at `section_index`.
    #[must_use]
    pub fn footer_height_mode(&self, section_index: usize) -> Option<HeightMode> {
        debug_assert!(
            section_index < self.sections.len(),
            "footer height mode queried for out-of-bounds section {section_index}"
        );
        Some(self.sections.get(section_index)?.footer()?.height_mode)
    }

    // MARK: in-flight batch bookkeeping

    /// Section indices inserted by the in-flight batch update.
    #[must_use]
    pub fn section_indices_to_insert(&self) -> &HashSet<usize> {
        &self.sections_to_insert
    }

    /// Section indices deleted by the in-flight batch update.
    #[must_use]
    pub fn section_indices_to_delete(&self) -> &HashSet<usize> {
        &self.sections_to_delete
    }

    /// Item locations inserted by the in-flight batch update.
    #[must_use]
    pub fn item_locations_to_insert(&self) -> &HashSet<ElementLocation> {
        &self.items_to_insert
    }

    /// Item locations deleted by the in-flight batch update.
    #[must_use]
    pub fn item_locations_to_delete(&self) -> &HashSet<ElementLocation> {
        &self.items_to_delete
    }

    /// Clears the in-flight batch bookkeeping once the host has finished the
    /// transition.
    pub fn clear_in_progress_batch_state(&mut self) {
        self.sections_to_insert.clear();
        self.sections_to_delete.clear();
        self.items_to_insert.clear();
        self.items_to_delete.clear();
    }

    // MARK: visible bounds

    /// Sets the visible region, in content coordinates. Only pinned headers
    /// and footers depend on it.
    pub fn set_visible_bounds(&mut self, bounds: Rect) {
        self.visible_bounds = bounds;
    }

    /// The visible region last supplied by the host.
    #[must_use]
    pub const fn visible_bounds(&self) -> Rect {
        self.visible_bounds
    }

    // MARK: cumulative offsets and frames

    /// Cumulative height of sections `0..=section_index`.
    ///
    /// Served from the max-Y cache when possible. On a miss the computation
    /// resumes from the nearest cached prefix and caches every entry it
    /// touches, so repeated queries during a scroll session amortize to one
    /// pass over the sections.
    pub fn section_max_y(&mut self, section_index: usize) -> f64 {
        debug_assert!(
            section_index < self.sections.len(),
            "cumulative height queried for out-of-bounds section {section_index}"
        );
        if section_index >= self.sections.len() {
            return 0.0;
        }
        if let Some(Some(max_y)) = self.section_max_ys.get(section_index) {
            return *max_y;
        }

        let mut start = section_index;
        while start > 0 && self.section_max_ys[start - 1].is_none() {
            start -= 1;
        }
        let mut max_y = if start == 0 {
            0.0
        } else {
            self.section_max_ys[start - 1].unwrap_or(0.0)
        };
        for index in start..=section_index {
            max_y += self.sections[index].height();
            self.section_max_ys[index] = Some(max_y);
        }
        max_y
    }

    /// Frame of the item at `location`, in content coordinates.
    ///
    /// Out-of-range locations are a contract violation and yield a zero
    /// rect.
    pub fn frame_for_item(&mut self, location: ElementLocation) -> Rect {
        debug_assert!(
            self.contains_item(location),
            "frame queried for out-of-bounds item {location:?}"
        );
        if !self.contains_item(location) {
            return Rect::ZERO;
        }
        let min_y = self.section_min_y(location.section_index);
        let frame = self.sections[location.section_index].frame_for_item(location.element_index);
        Rect::new(frame.x0, frame.y0 + min_y, frame.x1, frame.y1 + min_y)
    }

    /// Frame of the header in the section at `section_index`, in content
    /// coordinates. `None` when the section has no header.
    pub fn frame_for_header(&mut self, section_index: usize) -> Option<Rect> {
        if section_index >= self.sections.len() {
            return None;
        }
        let min_y = self.section_min_y(section_index);
        let visible = self.visible_bounds;
        let local_visible = Rect::new(
            visible.x0,
            visible.y0 - min_y,
            visible.x1,
            visible.y1 - min_y,
        );
        let frame = self.sections[section_index].frame_for_header(local_visible)?;
        Some(Rect::new(
            frame.x0,
            frame.y0 + min_y,
            frame.x1,
            frame.y1 + min_y,
        ))
    }

    /// Frame of the footer in the section at `section_index`, in content
    /// coordinates. `None` when the section has no footer.
    pub fn frame_for_footer(&mut self, section_index: usize) -> Option<Rect> {
        if section_index >= self.sections.len() {
            return None;
        }
        let min_y = self.section_min_y(section_index);
        let visible = self.visible_bounds;
        let local_visible = Rect::new(
            visible.x0,
            visible.y0 - min_y,
            visible.x1,
            visible.y1 - min_y,
        );
        let frame = self.sections[section_index].frame_for_footer(local_visible)?;
        Some(Rect::new(
            frame.x0,
            frame.y0 + min_y,
            frame.x1,
            frame.y1 + min_y,
        ))
    }

    /// Frame of the background in the section at `section_index`, in content
    /// coordinates. `None` when the section has no background.
    pub fn frame_for_background(&mut self, section_index: usize) -> Option<Rect> {
        if section_index >= self.sections.len() {
            return None;
        }
        let min_y = self.section_min_y(section_index);
        let frame = self.sections[section_index].frame_for_background()?;
        Some(Rect::new(
            frame.x0,
            frame.y0 + min_y,
            frame.x1,
            frame.y1 + min_y,
        ))
    }

    // MARK: range queries

    /// Every item whose frame intersects `rect`, with its frame in content
    /// coordinates. Order is unspecified.
    pub fn item_location_frame_pairs(&mut self, rect: Rect) -> Vec<(ElementLocation, Rect)> {
        self.location_frame_pairs(ElementKind::Item, rect)
    }

    /// Every header whose frame intersects `rect`. Order is unspecified.
    pub fn header_location_frame_pairs(&mut self, rect: Rect) -> Vec<(ElementLocation, Rect)> {
        self.location_frame_pairs(ElementKind::Header, rect)
    }

    /// Every footer whose frame intersects `rect`. Order is unspecified.
    pub fn footer_location_frame_pairs(&mut self, rect: Rect) -> Vec<(ElementLocation, Rect)> {
        self.location_frame_pairs(ElementKind::Footer, rect)
    }

    /// Every background whose frame intersects `rect`. Order is unspecified.
    pub fn background_location_frame_pairs(&mut self, rect: Rect) -> Vec<(ElementLocation, Rect)> {
        self.location_frame_pairs(ElementKind::Background, rect)
    }

    // MARK: height updates

    /// Records a settled measured height for the item at `location` and
    /// invalidates cumulative offsets from its section onward.
    pub fn update_item_height(&mut self, location: ElementLocation, preferred_height: f64) {
        debug_assert!(
            self.contains_item(location),
            "height update for out-of-bounds item {location:?}"
        );
        let Some(section) = self.sections.get_mut(location.section_index) else {
            return;
        };
        if section.update_item_height(location.element_index, preferred_height) {
            self.invalidate_section_max_ys_from(location.section_index);
        }
    }

    /// Records a settled measured height for the header in the section at
    /// `section_index` and invalidates cumulative offsets from there onward.
    pub fn update_header_height(&mut self, section_index: usize, preferred_height: f64) {
        debug_assert!(
            section_index < self.sections.len(),
            "height update for header in out-of-bounds section {section_index}"
        );
        let Some(section) = self.sections.get_mut(section_index) else {
            return;
        };
        if section.update_header_height(preferred_height) {
            self.invalidate_section_max_ys_from(section_index);
        }
    }

    /// Records a settled measured height for the footer in the section at
    /// `section_index` and invalidates cumulative offsets from there onward.
    pub fn update_footer_height(&mut self, section_index: usize, preferred_height: f64) {
        debug_assert!(
            section_index < self.sections.len(),
            "height update for footer in out-of-bounds section {section_index}"
        );
        let Some(section) = self.sections.get_mut(section_index) else {
            return;
        };
        if section.update_footer_height(preferred_height) {
            self.invalidate_section_max_ys_from(section_index);
        }
    }

    // MARK: section configuration

    /// Replaces the metrics of the section at `section_index`.
    pub fn update_metrics(&mut self, section_index: usize, metrics: SectionMetrics) {
        let Some(section) = self.sections.get_mut(section_index) else {
            return;
        };
        section.set_metrics(metrics);
        self.invalidate_section_max_ys_from(section_index);
    }

    /// Replaces the sizing rule of the item at `location`.
    pub fn update_item_size_mode(&mut self, location: ElementLocation, size_mode: ItemSizeMode) {
        let Some(section) = self.sections.get_mut(location.section_index) else {
            return;
        };
        if section.update_item_size_mode(location.element_index, size_mode) {
            self.invalidate_section_max_ys_from(location.section_index);
        }
    }

    /// Sets or replaces the header of the section at `section_index`.
    pub fn set_header(&mut self, section_index: usize, header: HeaderModel) {
        let Some(section) = self.sections.get_mut(section_index) else {
            return;
        };
        section.set_header(header);
        self.invalidate_section_max_ys_from(section_index);
        self.rebuild_flattened_indices();
    }

    /// Removes the header of the section at `section_index`.
    pub fn remove_header(&mut self, section_index: usize) {
        let Some(section) = self.sections.get_mut(section_index) else {
            return;
        };
        if section.remove_header() {
            self.invalidate_section_max_ys_from(section_index);
            self.rebuild_flattened_indices();
        }
    }

    /// Sets or replaces the footer of the section at `section_index`.
    pub fn set_footer(&mut self, section_index: usize, footer: FooterModel) {
        let Some(section) = self.sections.get_mut(section_index) else {
            return;
        };
        section.set_footer(footer);
        self.invalidate_section_max_ys_from(section_index);
        self.rebuild_flattened_indices();
    }

    /// Removes the footer of the section at `section_index`.
    pub fn remove_footer(&mut self, section_index: usize) {
        let Some(section) = self.sections.get_mut(section_index) else {
            return;
        };
        if section.remove_footer() {
            self.invalidate_section_max_ys_from(section_index);
            self.rebuild_flattened_indices();
        }
    }

    /// Sets or replaces the background of the section at `section_index`.
    pub fn set_background(&mut self, section_index: usize, background: BackgroundModel) {
        let Some(section) = self.sections.get_mut(section_index) else {
            return;
        };
        section.set_background(background);
        self.rebuild_flattened_indices();
    }

    /// Removes the background of the section at `section_index`.
    pub fn remove_background(&mut self, section_index: usize) {
        let Some(section) = self.sections.get_mut(section_index) else {
            return;
        };
        if section.remove_background() {
            self.rebuild_flattened_indices();
        }
    }

    // MARK: structural mutation

    /// Replaces the entire section list. Used for the initial layout and for
    /// full invalidations.
    pub fn set_sections(&mut self, sections: Vec<SectionModel>) {
        self.sections = sections;
        self.section_max_ys.clear();
        self.section_max_ys.resize(self.sections.len(), None);
        self.rebuild_flattened_indices();
    }

    /// Applies a batch of structural updates against `before`, the snapshot
    /// of this state taken before the batch began.
    ///
    /// The operation list may arrive in any order; internally it is applied
    /// in a fixed phase order (item reloads, section reloads, item deletes,
    /// section deletes descending, section inserts, item inserts ascending)
    /// so positions stay coherent regardless of input order.
    /// Moves decompose into a delete at the source, resolved against
    /// `before`, plus an insert at the destination. An item insert whose
    /// destination already holds an item with the same identifier is
    /// skipped: diffing data sources emit redundant item moves for the items
    /// of a moved section, and replaying them would duplicate the items.
    pub fn apply_updates(&mut self, updates: Vec<Update>, before: &Self) {
        self.invalidate_section_max_ys_from(0);

        let mut section_reloads: Vec<(usize, SectionModel)> = Vec::new();
        let mut item_reloads: Vec<(ElementLocation, ItemModel)> = Vec::new();
        let mut section_deletes: Vec<usize> = Vec::new();
        let mut item_deletes: Vec<ElementLocation> = Vec::new();
        let mut section_inserts: Vec<(usize, SectionModel)> = Vec::new();
        let mut item_inserts: Vec<(ElementLocation, ItemModel)> = Vec::new();

        for update in updates {
            match update {
                Update::SectionReload {
                    section_index,
                    new_section,
                } => section_reloads.push((section_index, new_section)),
                Update::ItemReload { location, new_item } => {
                    item_reloads.push((location, new_item));
                }
                Update::SectionDelete { section_index } => {
                    section_deletes.push(section_index);
                    self.sections_to_delete.insert(section_index);
                }
                Update::ItemDelete { location } => {
                    item_deletes.push(location);
                    self.items_to_delete.insert(location);
                }
                Update::SectionMove {
                    from_section_index,
                    to_section_index,
                } => {
                    section_deletes.push(from_section_index);
                    match before.sections.get(from_section_index) {
                        Some(section) => {
                            section_inserts.push((to_section_index, section.clone()));
                        }
                        None => debug_assert!(
                            false,
                            "section move source {from_section_index} is out of bounds of the snapshot"
                        ),
                    }
                }
                Update::ItemMove { from, to } => {
                    item_deletes.push(from);
                    let moved = before
                        .sections
                        .get(from.section_index)
                        .and_then(|section| section.item(from.element_index));
                    match moved {
                        Some(item) => item_inserts.push((to, item.clone())),
                        None => debug_assert!(
                            false,
                            "item move source {from:?} is out of bounds of the snapshot"
                        ),
                    }
                }
                Update::SectionInsert {
                    section_index,
                    new_section,
                } => {
                    section_inserts.push((section_index, new_section));
                    self.sections_to_insert.insert(section_index);
                }
                Update::ItemInsert { location, new_item } => {
                    item_inserts.push((location, new_item));
                    self.items_to_insert.insert(location);
                }
            }
        }

        for (location, item) in item_reloads {
            let replaced = self
                .sections
                .get_mut(location.section_index)
                .is_some_and(|section| section.replace_item(location.element_index, item));
            debug_assert!(replaced, "item reload at {location:?} is out of bounds");
        }
        for (section_index, section) in section_reloads {
            match self.sections.get_mut(section_index) {
                Some(slot) => *slot = section,
                None => debug_assert!(
                    false,
                    "section reload at {section_index} is out of bounds"
                ),
            }
        }

        // Deletes run in descending order so earlier removals cannot shift
        // the positions of later ones.
        item_deletes.sort_unstable_by(|a, b| b.cmp(a));
        for location in item_deletes {
            let removed = self
                .sections
                .get_mut(location.section_index)
                .and_then(|section| section.remove_item(location.element_index));
            debug_assert!(
                removed.is_some(),
                "item delete at {location:?} is out of bounds"
            );
        }
        section_deletes.sort_unstable_by(|a, b| b.cmp(a));
        for section_index in section_deletes {
            if section_index < self.sections.len() {
                self.sections.remove(section_index);
            } else {
                debug_assert!(false, "section delete at {section_index} is out of bounds");
            }
        }

        // Inserts run in ascending order for the same reason.
        section_inserts.sort_by_key(|(section_index, _)| *section_index);
        for (section_index, section) in section_inserts {
            if section_index <= self.sections.len() {
                self.sections.insert(section_index, section);
            } else {
                debug_assert!(false, "section insert at {section_index} is out of bounds");
            }
        }
        item_inserts.sort_by_key(|(location, _)| *location);
        for (location, item) in item_inserts {
            let Some(section) = self.sections.get_mut(location.section_index) else {
                debug_assert!(false, "item insert at {location:?} is out of bounds");
                continue;
            };
            if location.element_index < section.item_count()
                && section.id_for_item(location.element_index) == Some(item.id)
            {
                // The destination already holds this item; this is the
                // redundant move a diffing data source emits alongside a
                // section move.
                continue;
            }
            let inserted = section.insert_item(location.element_index, item);
            debug_assert!(inserted, "item insert at {location:?} is out of bounds");
        }

        self.section_max_ys.clear();
        self.section_max_ys.resize(self.sections.len(), None);
        self.rebuild_flattened_indices();
    }

    // MARK: internals

    fn contains_item(&self, location: ElementLocation) -> bool {
        location.section_index < self.sections.len()
            && location.element_index < self.sections[location.section_index].item_count()
    }

    fn section_min_y(&mut self, section_index: usize) -> f64 {
        if section_index == 0 {
            0.0
        } else {
            self.section_max_y(section_index - 1)
        }
    }

    fn invalidate_section_max_ys_from(&mut self, section_index: usize) {
        if self.section_max_ys.is_empty() {
            return;
        }
        debug_assert!(
            section_index < self.section_max_ys.len(),
            "cache invalidation starting at out-of-bounds section {section_index}"
        );
        for entry in self.section_max_ys.iter_mut().skip(section_index) {
            *entry = None;
        }
    }

    fn rebuild_flattened_indices(&mut self) {
        self.header_locations.clear();
        self.footer_locations.clear();
        self.background_locations.clear();
        self.item_locations.clear();
        self.section_indices_by_id.clear();
        self.item_locations_by_id.clear();

        for (section_index, section) in self.sections.iter().enumerate() {
            self.section_indices_by_id.insert(section.id(), section_index);
            if section.header().is_some() {
                self.header_locations
                    .push(ElementLocation::new(section_index, 0));
            }
            if section.footer().is_some() {
                self.footer_locations
                    .push(ElementLocation::new(section_index, 0));
            }
            if section.background().is_some() {
                self.background_locations
                    .push(ElementLocation::new(section_index, 0));
            }
            for element_index in 0..section.item_count() {
                let location = ElementLocation::new(section_index, element_index);
                self.item_locations.push(location);
                if let Some(id) = section.id_for_item(element_index) {
                    self.item_locations_by_id.insert(id, location);
                }
            }
        }
    }

    fn locations(&self, kind: ElementKind) -> &[ElementLocation] {
        match kind {
            ElementKind::Header => &self.header_locations,
            ElementKind::Footer => &self.footer_locations,
            ElementKind::Background => &self.background_locations,
            ElementKind::Item => &self.item_locations,
        }
    }

    /// Looks up a flattened index. The flattened maps are a complete
    /// bijection from `0..count` to structural positions; a missing index is
    /// a contract violation.
    fn location_at(&self, kind: ElementKind, index: usize) -> ElementLocation {
        let locations = self.locations(kind);
        debug_assert!(
            index < locations.len(),
            "flattened index {index} has no location"
        );
        locations
            .get(index)
            .copied()
            .unwrap_or(ElementLocation::new(0, 0))
    }

    fn frame_for_kind(&mut self, kind: ElementKind, location: ElementLocation) -> Rect {
        let frame = match kind {
            ElementKind::Item => Some(self.frame_for_item(location)),
            ElementKind::Header => self.frame_for_header(location.section_index),
            ElementKind::Footer => self.frame_for_footer(location.section_index),
            ElementKind::Background => self.frame_for_background(location.section_index),
        };
        debug_assert!(
            frame.is_some(),
            "flattened {kind:?} index points at a section without that element"
        );
        frame.unwrap_or(Rect::ZERO)
    }

    fn location_frame_pairs(
        &mut self,
        kind: ElementKind,
        rect: Rect,
    ) -> Vec<(ElementLocation, Rect)> {
        let mut pairs = Vec::new();
        let Some(first_found) = self.index_of_first_intersecting(kind, rect) else {
            return pairs;
        };

        // Scan backward. A non-intersecting element does not end the scan on
        // its own: row-mates share a top edge but not a bottom edge, so an
        // earlier element in scan order can still intersect. Track the min-Y
        // of the first non-intersecting element seen and stop only once an
        // element from a previous row shows up.
        let mut min_y_of_non_intersecting: Option<f64> = None;
        for index in (0..first_found).rev() {
            let location = self.location_at(kind, index);
            let frame = self.frame_for_kind(kind, location);
            if frame.y1 <= rect.y0 {
                match min_y_of_non_intersecting {
                    Some(min_y) if frame.y0 < min_y => break,
                    _ => {
                        min_y_of_non_intersecting = Some(frame.y0);
                        continue;
                    }
                }
            }
            pairs.push((location, frame));
        }

        // Scan forward until the first element fully below the rect.
        for index in first_found..self.locations(kind).len() {
            let location = self.location_at(kind, index);
            let frame = self.frame_for_kind(kind, location);
            if frame.y0 >= rect.y1 {
                break;
            }
            pairs.push((location, frame));
        }

        pairs
    }

    /// Binary searches the flattened index for any element intersecting
    /// `rect`. Frames are ordered by row along the flattened index, which is
    /// what makes the midpoint comparisons sound.
    fn index_of_first_intersecting(&mut self, kind: ElementKind, rect: Rect) -> Option<usize> {
        let mut low = 0;
        let mut high = self.locations(kind).len();
        while low < high {
            let mid = low + (high - low) / 2;
            let frame = self.frame_for_kind(kind, self.location_at(kind, mid));
            if frame.y1 <= rect.y0 {
                low = mid + 1;
            } else if frame.y0 >= rect.y1 {
                high = mid;
            } else {
                return Some(mid);
            }
        }
        None
    }
}
