// Copyright 2025 the Folio Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Translation of raw host update notifications into the normalized
//! operation list the model consumes.
//!
//! Hosts tend to deliver structural edits as loosely tagged records (an
//! action plus a position in the before or after index space depending on
//! the action) and may express the same position redundantly. The
//! translator normalizes that stream so every structural position is touched
//! by exactly one operation kind, which is what
//! [`folio_model::ModelState::apply_updates`] assumes.

use alloc::vec::Vec;

use hashbrown::HashSet;

use folio_model::{ElementLocation, ItemModel, SectionModel, Update};

/// Kind of a raw host notification.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RawUpdateAction {
    /// Re-derive the named section or item from the data source.
    Reload,
    /// Remove the named section or item.
    Delete,
    /// Add a section or item at the named position.
    Insert,
    /// Relocate a section or item.
    Move,
}

/// A raw structural path: a section plus an optional item index. An absent
/// item index addresses the whole section.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RawPath {
    /// Section index.
    pub section: usize,
    /// Item index within the section, or `None` for the section itself.
    pub item: Option<usize>,
}

impl RawPath {
    /// Path addressing a whole section.
    #[must_use]
    pub const fn section(section: usize) -> Self {
        Self {
            section,
            item: None,
        }
    }

    /// Path addressing one item.
    #[must_use]
    pub const fn item(section: usize, item: usize) -> Self {
        Self {
            section,
            item: Some(item),
        }
    }
}

/// One raw notification as delivered by a host.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RawUpdate {
    /// What happened.
    pub action: RawUpdateAction,
    /// Position in the pre-update index space. Required for reloads,
    /// deletes, and moves.
    pub before: Option<RawPath>,
    /// Position in the post-update index space. Required for inserts and
    /// moves.
    pub after: Option<RawPath>,
}

/// Supplies fresh models for reload and insert destinations.
///
/// The translator never invents content; reloaded and inserted entities are
/// pulled from the host's data source through this seam, addressed in the
/// post-update index space.
pub trait ModelProvider {
    /// Returns a new section model for `section_index`.
    fn section_model(&mut self, section_index: usize) -> SectionModel;

    /// Returns a new item model for `location`.
    fn item_model(&mut self, location: ElementLocation) -> ItemModel;
}

/// Translates raw notifications into the ordered, deduplicated operation
/// list consumed by [`folio_model::ModelState::apply_updates`].
///
/// Dedup rules: exact duplicates collapse to their first occurrence, and a
/// reload whose position is also deleted (or is a move source) is dropped in
/// favor of the stronger operation. Notifications missing a required path
/// are contract violations; they assert in debug builds and are skipped in
/// release builds.
pub fn translate_updates<P: ModelProvider>(
    raw_updates: &[RawUpdate],
    provider: &mut P,
) -> Vec<Update> {
    // Positions claimed by deletes and move sources win over reloads.
    let mut claimed_sections: HashSet<usize> = HashSet::new();
    let mut claimed_items: HashSet<ElementLocation> = HashSet::new();
    for update in raw_updates {
        if matches!(
            update.action,
            RawUpdateAction::Delete | RawUpdateAction::Move
        ) && let Some(path) = update.before
        {
            match path.item {
                None => {
                    claimed_sections.insert(path.section);
                }
                Some(item) => {
                    claimed_items.insert(ElementLocation::new(path.section, item));
                }
            }
        }
    }

    let mut seen_section_reloads: HashSet<usize> = HashSet::new();
    let mut seen_item_reloads: HashSet<ElementLocation> = HashSet::new();
    let mut seen_section_deletes: HashSet<usize> = HashSet::new();
    let mut seen_item_deletes: HashSet<ElementLocation> = HashSet::new();
    let mut seen_section_inserts: HashSet<usize> = HashSet::new();
    let mut seen_item_inserts: HashSet<ElementLocation> = HashSet::new();

    let mut updates = Vec::with_capacity(raw_updates.len());
    for update in raw_updates {
        match update.action {
            RawUpdateAction::Reload => {
                let Some(path) = update.before else {
                    debug_assert!(false, "a reload must name a position in the before space");
                    continue;
                };
                match path.item {
                    None => {
                        if claimed_sections.contains(&path.section)
                            || !seen_section_reloads.insert(path.section)
                        {
                            continue;
                        }
                        updates.push(Update::SectionReload {
                            section_index: path.section,
                            new_section: provider.section_model(path.section),
                        });
                    }
                    Some(item) => {
                        let location = ElementLocation::new(path.section, item);
                        if claimed_items.contains(&location)
                            || claimed_sections.contains(&path.section)
                            || !seen_item_reloads.insert(location)
                        {
                            continue;
                        }
                        updates.push(Update::ItemReload {
                            location,
                            new_item: provider.item_model(location),
                        });
                    }
                }
            }
            RawUpdateAction::Delete => {
                let Some(path) = update.before else {
                    debug_assert!(false, "a delete must name a position in the before space");
                    continue;
                };
                match path.item {
                    None => {
                        if !seen_section_deletes.insert(path.section) {
                            continue;
                        }
                        updates.push(Update::SectionDelete {
                            section_index: path.section,
                        });
                    }
                    Some(item) => {
                        let location = ElementLocation::new(path.section, item);
                        if !seen_item_deletes.insert(location) {
                            continue;
                        }
                        updates.push(Update::ItemDelete { location });
                    }
                }
            }
            RawUpdateAction::Insert => {
                let Some(path) = update.after else {
                    debug_assert!(false, "an insert must name a position in the after space");
                    continue;
                };
                match path.item {
                    None => {
                        if !seen_section_inserts.insert(path.section) {
                            continue;
                        }
                        updates.push(Update::SectionInsert {
                            section_index: path.section,
                            new_section: provider.section_model(path.section),
                        });
                    }
                    Some(item) => {
                        let location = ElementLocation::new(path.section, item);
                        if !seen_item_inserts.insert(location) {
                            continue;
                        }
                        updates.push(Update::ItemInsert {
                            location,
                            new_item: provider.item_model(location),
                        });
                    }
                }
            }
            RawUpdateAction::Move => {
                let (Some(before), Some(after)) = (update.before, update.after) else {
                    debug_assert!(
                        false,
                        "a move must name positions in both the before and after spaces"
                    );
                    continue;
                };
                match (before.item, after.item) {
                    (None, None) => updates.push(Update::SectionMove {
                        from_section_index: before.section,
                        to_section_index: after.section,
                    }),
                    (Some(from_item), Some(to_item)) => updates.push(Update::ItemMove {
                        from: ElementLocation::new(before.section, from_item),
                        to: ElementLocation::new(after.section, to_item),
                    }),
                    _ => {
                        debug_assert!(
                            false,
                            "a move must name either two sections or two items"
                        );
                    }
                }
            }
        }
    }

    updates
}
