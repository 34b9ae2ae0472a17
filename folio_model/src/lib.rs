// Copyright 2025 the Folio Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Folio Model: structural model and incremental position cache for a
//! vertically scrolling, magazine-style layout.
//!
//! This crate is the mutable core of the Folio layout engine. It models an
//! ordered list of sections, each holding an ordered run of items plus
//! optional header, footer, and background decorations, and answers frame
//! queries for all of them without ever rendering anything.
//!
//! The core concepts are:
//!
//! - [`ElementId`] / [`IdGenerator`]: stable 64-bit identity for every
//!   structural entity. Indices shift when sections and items are inserted,
//!   deleted, or moved; identifiers do not.
//! - [`SectionModel`]: one section, including the memoized row-packing pass
//!   that turns width modes (full, half, third, 1/N) and per-item heights
//!   into frames in section-local coordinates.
//! - [`ModelState`]: the ordered section list plus the caches that make
//!   incremental relayout cheap: a cumulative max-Y cache with suffix
//!   invalidation, flattened per-kind index maps for binary-search range
//!   queries, and identifier lookup tables.
//! - [`Update`]: the normalized operation list consumed by
//!   [`ModelState::apply_updates`] when the host performs a batch of
//!   structural edits.
//!
//! Heights may be unknown until content is measured ("self-sizing"): items,
//! headers, and footers carry an estimate until the host records a settled
//! measurement through [`ModelState::update_item_height`] and friends.
//!
//! ## Minimal example
//!
//! ```rust
//! use folio_model::{
//!     IdGenerator, ItemHeightMode, ItemModel, ItemSizeMode, ModelState, SectionMetrics,
//!     SectionModel, WidthMode,
//! };
//!
//! let mut ids = IdGenerator::new();
//! let metrics = SectionMetrics::with_viewport_width(300.0, 1.0);
//! let items = (0..4)
//!     .map(|_| {
//!         ItemModel::new(
//!             &mut ids,
//!             ItemSizeMode {
//!                 width_mode: WidthMode::half(),
//!                 height_mode: ItemHeightMode::Static(100.0),
//!             },
//!         )
//!     })
//!     .collect();
//! let section = SectionModel::new(&mut ids, items, None, None, None, metrics);
//!
//! let mut state = ModelState::new();
//! state.set_sections(vec![section]);
//!
//! // Four half-width items pack into two rows of two.
//! assert_eq!(state.section_max_y(0), 200.0);
//! ```
//!
//! All coordinates live in a single content coordinate space (typically
//! logical pixels), growing downward. The crate has no internal threads and
//! performs no I/O; callers serialize all access on one logical thread.
//! Methods that consult lazily maintained caches take `&mut self`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod id;
mod section;
mod state;
mod types;
mod update;

pub use id::{ElementId, IdGenerator};
pub use section::SectionModel;
pub use state::ModelState;
pub use types::{
    BackgroundModel, ElementLocation, FooterModel, HeaderModel, HeightMode, ItemHeightMode,
    ItemModel, ItemSizeMode, SectionMetrics, WidthMode, aligned_to_pixel,
};
pub use update::Update;
