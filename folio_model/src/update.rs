// Copyright 2025 the Folio Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The normalized structural-update operations consumed by
//! [`crate::ModelState::apply_updates`].

use crate::section::SectionModel;
use crate::types::{ElementLocation, ItemModel};

/// One structural operation in a batch update.
///
/// Reloads, deletes, and move sources address the *before* index space (the
/// snapshot taken when the batch began); inserts and move destinations
/// address the *after* index space. The batch as a whole may list operations
/// in any order; [`crate::ModelState::apply_updates`] sequences them.
#[derive(Clone, Debug)]
pub enum Update {
    /// Replace the section at `section_index` with `new_section`.
    SectionReload {
        /// Position in the before space.
        section_index: usize,
        /// Replacement section.
        new_section: SectionModel,
    },
    /// Replace the item at `location` with `new_item`.
    ItemReload {
        /// Position in the before space.
        location: ElementLocation,
        /// Replacement item.
        new_item: ItemModel,
    },
    /// Delete the section at `section_index`.
    SectionDelete {
        /// Position in the before space.
        section_index: usize,
    },
    /// Delete the item at `location`.
    ItemDelete {
        /// Position in the before space.
        location: ElementLocation,
    },
    /// Move a section, preserving its identity and contents.
    SectionMove {
        /// Position in the before space.
        from_section_index: usize,
        /// Position in the after space.
        to_section_index: usize,
    },
    /// Move an item, preserving its identity.
    ItemMove {
        /// Position in the before space.
        from: ElementLocation,
        /// Position in the after space.
        to: ElementLocation,
    },
    /// Insert `new_section` at `section_index`.
    SectionInsert {
        /// Position in the after space.
        section_index: usize,
        /// Section to insert.
        new_section: SectionModel,
    },
    /// Insert `new_item` at `location`.
    ItemInsert {
        /// Position in the after space.
        location: ElementLocation,
        /// Item to insert.
        new_item: ItemModel,
    },
}
