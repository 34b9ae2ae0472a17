// Copyright 2025 the Folio Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Anchor selection and offset resolution over a mixed-width fixture, for
//! both stacking directions.
//!
//! The fixture is one section of fourteen self-sizing items (half, full,
//! and third width) in a 300x400 viewport with a 50pt top and 30pt bottom
//! content inset. Row packing yields a 1060pt tall layout, so the reachable
//! offsets span -50 (top) to 690 (bottom).

use folio_layout::{ContentOffsetAnchor, LayoutState, StackingDirection};
use folio_model::{
    ElementId, ElementLocation, IdGenerator, ItemHeightMode, ItemModel, ItemSizeMode, ModelState,
    SectionMetrics, SectionModel, WidthMode,
};
use kurbo::{Insets, Rect};

fn sized_item(ids: &mut IdGenerator, width_mode: WidthMode, preferred: Option<f64>) -> ItemModel {
    let mut item = ItemModel::new(
        ids,
        ItemSizeMode {
            width_mode,
            height_mode: ItemHeightMode::Dynamic(150.0),
        },
    );
    item.preferred_height = preferred;
    item
}

fn fixture_model() -> ModelState {
    let mut ids = IdGenerator::new();
    let half = WidthMode::half();
    let full = WidthMode::full();
    let third = WidthMode::third();
    let items = vec![
        sized_item(&mut ids, half, None),
        sized_item(&mut ids, half, Some(70.0)),
        sized_item(&mut ids, half, Some(90.0)),
        sized_item(&mut ids, half, Some(80.0)),
        sized_item(&mut ids, full, None),
        sized_item(&mut ids, full, Some(135.0)),
        sized_item(&mut ids, full, Some(135.0)),
        sized_item(&mut ids, half, Some(55.0)),
        sized_item(&mut ids, half, Some(105.0)),
        sized_item(&mut ids, half, Some(80.0)),
        sized_item(&mut ids, half, Some(95.0)),
        sized_item(&mut ids, third, Some(200.0)),
        sized_item(&mut ids, third, Some(200.0)),
        sized_item(&mut ids, third, None),
    ];
    let section = SectionModel::new(
        &mut ids,
        items,
        None,
        None,
        None,
        SectionMetrics::with_viewport_width(300.0, 1.0),
    );
    let mut model = ModelState::new();
    model.set_sections(vec![section]);
    model
}

fn tall_items_model() -> ModelState {
    let mut ids = IdGenerator::new();
    let items = (0..3)
        .map(|_| sized_item(&mut ids, WidthMode::full(), Some(500.0)))
        .collect();
    let section = SectionModel::new(
        &mut ids,
        items,
        None,
        None,
        None,
        SectionMetrics::with_viewport_width(300.0, 1.0),
    );
    let mut model = ModelState::new();
    model.set_sections(vec![section]);
    model
}

fn layout_at(y: f64, direction: StackingDirection) -> LayoutState {
    LayoutState::new(
        fixture_model(),
        Rect::new(0.0, y, 300.0, y + 400.0),
        Insets::new(0.0, 50.0, 0.0, 30.0),
        1.0,
        direction,
    )
}

fn item_id(layout: &LayoutState, element_index: usize) -> ElementId {
    layout
        .model()
        .id_for_item(ElementLocation::new(0, element_index))
        .unwrap()
}

// MARK: top-to-bottom anchors

#[test]
fn top_to_bottom_scrolled_to_top_anchors_to_the_top_edge() {
    let mut layout = layout_at(-50.0, StackingDirection::TopToBottom);
    assert_eq!(
        layout.target_content_offset_anchor(),
        ContentOffsetAnchor::Top { overscroll: 0.0 }
    );
}

#[test]
fn top_to_bottom_scrolled_to_middle_anchors_to_the_first_settled_item() {
    let mut layout = layout_at(500.0, StackingDirection::TopToBottom);
    // Item 6 (full width, 525..660) is the first fully visible settled item.
    let expected_id = item_id(&layout, 6);
    assert_eq!(
        layout.target_content_offset_anchor(),
        ContentOffsetAnchor::TopItem {
            id: expected_id,
            location: ElementLocation::new(0, 6),
            distance_from_top: -25.0,
        }
    );
}

#[test]
fn top_to_bottom_scrolled_to_bottom_still_anchors_to_a_top_item() {
    let mut layout = layout_at(0.0, StackingDirection::TopToBottom);
    let max_y = layout.max_content_offset().y;
    assert_eq!(max_y, 690.0);

    let mut layout = layout_at(max_y, StackingDirection::TopToBottom);
    let expected_id = item_id(&layout, 9);
    assert_eq!(
        layout.target_content_offset_anchor(),
        ContentOffsetAnchor::TopItem {
            id: expected_id,
            location: ElementLocation::new(0, 9),
            distance_from_top: 25.0,
        }
    );
}

#[test]
fn top_to_bottom_with_nothing_fully_visible_falls_back_to_a_partial_item() {
    let mut layout = LayoutState::new(
        tall_items_model(),
        Rect::new(0.0, 250.0, 300.0, 650.0),
        Insets::new(0.0, 50.0, 0.0, 30.0),
        1.0,
        StackingDirection::TopToBottom,
    );
    // 500-tall items never fit a 400-tall viewport; the first partially
    // visible item anchors instead of an edge sentinel.
    let expected_id = layout
        .model()
        .id_for_item(ElementLocation::new(0, 0))
        .unwrap();
    assert_eq!(
        layout.target_content_offset_anchor(),
        ContentOffsetAnchor::TopItem {
            id: expected_id,
            location: ElementLocation::new(0, 0),
            distance_from_top: -300.0,
        }
    );
}

// MARK: bottom-to-top anchors

#[test]
fn bottom_to_top_scrolled_to_top_anchors_to_the_last_settled_item() {
    let mut layout = layout_at(-50.0, StackingDirection::BottomToTop);
    // Items 0..=3 are fully visible; item 3 is the last with a settled
    // height (item 0 is still an estimate).
    let expected_id = item_id(&layout, 3);
    assert_eq!(
        layout.target_content_offset_anchor(),
        ContentOffsetAnchor::BottomItem {
            id: expected_id,
            location: ElementLocation::new(0, 3),
            distance_from_bottom: -90.0,
        }
    );
}

#[test]
fn bottom_to_top_scrolled_to_middle_anchors_to_the_last_settled_item() {
    let mut layout = layout_at(500.0, StackingDirection::BottomToTop);
    let expected_id = item_id(&layout, 10);
    assert_eq!(
        layout.target_content_offset_anchor(),
        ContentOffsetAnchor::BottomItem {
            id: expected_id,
            location: ElementLocation::new(0, 10),
            distance_from_bottom: -10.0,
        }
    );
}

#[test]
fn bottom_to_top_scrolled_to_bottom_anchors_to_the_bottom_edge() {
    let mut layout = layout_at(690.0, StackingDirection::BottomToTop);
    assert_eq!(
        layout.target_content_offset_anchor(),
        ContentOffsetAnchor::Bottom { overscroll: 0.0 }
    );
}

// MARK: offset resolution

#[test]
fn top_to_bottom_offsets_round_trip() {
    for y in [-50.0, 500.0, 690.0] {
        let mut layout = layout_at(y, StackingDirection::TopToBottom);
        let anchor = layout.target_content_offset_anchor();
        assert_eq!(
            layout.y_offset(anchor),
            y,
            "capturing and resolving at {y} must be a fixed point"
        );
    }
}

#[test]
fn bottom_to_top_offsets_round_trip() {
    for y in [-50.0, 500.0, 690.0] {
        let mut layout = layout_at(y, StackingDirection::BottomToTop);
        let anchor = layout.target_content_offset_anchor();
        assert_eq!(
            layout.y_offset(anchor),
            y,
            "capturing and resolving at {y} must be a fixed point"
        );
    }
}

#[test]
fn rubber_banding_past_the_top_is_preserved() {
    // 30pt past the minimum offset of -50.
    let mut layout = layout_at(-80.0, StackingDirection::TopToBottom);
    let anchor = layout.target_content_offset_anchor();
    assert_eq!(anchor, ContentOffsetAnchor::Top { overscroll: 30.0 });
    assert_eq!(layout.y_offset(anchor), -80.0);
}

#[test]
fn rubber_banding_past_the_bottom_is_preserved() {
    // 25pt past the maximum offset of 690.
    let mut layout = layout_at(715.0, StackingDirection::BottomToTop);
    let anchor = layout.target_content_offset_anchor();
    assert_eq!(anchor, ContentOffsetAnchor::Bottom { overscroll: 25.0 });
    assert_eq!(layout.y_offset(anchor), 715.0);
}

#[test]
fn anchors_round_trip_across_a_neutral_batch() {
    for direction in [StackingDirection::TopToBottom, StackingDirection::BottomToTop] {
        let mut layout = layout_at(500.0, direction);
        let before = layout.clone();
        let anchor = before.clone().target_content_offset_anchor();
        layout
            .model_mut()
            .apply_updates(Vec::new(), before.model());
        assert_eq!(
            layout.y_offset(anchor),
            500.0,
            "a no-op batch must not move the viewport"
        );
    }
}

#[test]
fn anchors_survive_structural_reordering() {
    use folio_model::Update;

    let mut layout = layout_at(500.0, StackingDirection::TopToBottom);
    let before = layout.clone();
    let anchor = before.clone().target_content_offset_anchor();
    let anchored_id = match anchor {
        ContentOffsetAnchor::TopItem { id, .. } => id,
        other => panic!("expected an item anchor, got {other:?}"),
    };

    // Delete the two leading rows' worth of half-width items above the
    // anchored element; everything below shifts up.
    layout.model_mut().apply_updates(
        vec![
            Update::ItemDelete {
                location: ElementLocation::new(0, 0),
            },
            Update::ItemDelete {
                location: ElementLocation::new(0, 1),
            },
        ],
        before.model(),
    );

    let new_location = layout.model().location_for_item_id(anchored_id).unwrap();
    assert_eq!(new_location, ElementLocation::new(0, 4));
    // The anchored item moved up by its old row offset (150); the resolved
    // offset follows it exactly.
    assert_eq!(layout.y_offset(anchor), 350.0);
}

// MARK: content metrics

#[test]
fn content_metrics_match_the_fixture() {
    let mut layout = layout_at(0.0, StackingDirection::TopToBottom);
    let size = layout.content_size();
    assert_eq!(size.width, 300.0);
    assert_eq!(size.height, 1060.0);
    assert_eq!(layout.min_content_offset().y, -50.0);
    assert_eq!(layout.max_content_offset().y, 690.0);
}

#[test]
fn max_offset_degenerates_to_min_when_content_fits() {
    let mut ids = IdGenerator::new();
    let items = vec![sized_item(&mut ids, WidthMode::full(), Some(100.0))];
    let section = SectionModel::new(
        &mut ids,
        items,
        None,
        None,
        None,
        SectionMetrics::with_viewport_width(300.0, 1.0),
    );
    let mut model = ModelState::new();
    model.set_sections(vec![section]);
    let mut layout = LayoutState::new(
        model,
        Rect::new(0.0, 0.0, 300.0, 400.0),
        Insets::new(0.0, 50.0, 0.0, 30.0),
        1.0,
        StackingDirection::TopToBottom,
    );
    assert_eq!(layout.max_content_offset().y, layout.min_content_offset().y);
}

#[test]
fn empty_layout_has_zero_content_height() {
    let mut layout = LayoutState::new(
        ModelState::new(),
        Rect::new(0.0, 0.0, 300.0, 400.0),
        Insets::ZERO,
        1.0,
        StackingDirection::TopToBottom,
    );
    assert_eq!(layout.content_size().height, 0.0);
}

#[test]
fn width_epsilon_is_opt_in() {
    let mut layout = layout_at(0.0, StackingDirection::TopToBottom);
    assert_eq!(layout.content_size().width, 300.0);

    layout.set_width_epsilon(0.0001);
    assert_eq!(layout.content_size().width, 300.0 - 0.0001);
}

// MARK: inset changes

#[test]
fn top_to_bottom_ignores_inset_changes() {
    let mut layout = layout_at(0.0, StackingDirection::TopToBottom);
    let previous = layout.content_insets();
    layout.set_viewport(
        layout.bounds(),
        Insets::new(0.0, 100.0, 0.0, 80.0),
        1.0,
        StackingDirection::TopToBottom,
    );
    assert_eq!(layout.content_offset_adjustment_for_inset_change(previous), 0.0);
}

#[test]
fn bottom_to_top_compensates_for_inset_growth() {
    let cases = [
        (Insets::new(0.0, 100.0, 0.0, 30.0), 50.0),
        (Insets::new(0.0, 50.0, 0.0, 105.0), 75.0),
        (Insets::new(0.0, 150.0, 0.0, 130.0), 200.0),
    ];
    for (new_insets, expected) in cases {
        let mut layout = layout_at(0.0, StackingDirection::BottomToTop);
        let previous = layout.content_insets();
        layout.set_viewport(layout.bounds(), new_insets, 1.0, StackingDirection::BottomToTop);
        assert_eq!(
            layout.content_offset_adjustment_for_inset_change(previous),
            expected
        );
    }
}
