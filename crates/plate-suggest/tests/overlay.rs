use std::sync::Arc;

use futures::FutureExt as _;
use futures::executor::block_on;
use futures::future;
use gpui_plate_suggest::{
    BlockKind, Candidate, EditOp, FetchError, FnSource, MemoryDocument, MentionUser,
    OverlayController, OverlayKey, OverlayPhase, StaticBlockMenu, SuggestConfig, TextRange,
    TriggerKind, UserDirectory,
};
use pretty_assertions::assert_eq;

fn default_controller() -> OverlayController {
    OverlayController::with_default_sources(SuggestConfig::default())
}

fn controller_with_mentions(users: Vec<MentionUser>) -> OverlayController {
    OverlayController::new(
        SuggestConfig::default(),
        Arc::new(StaticBlockMenu::default()),
        Arc::new(UserDirectory::new(users)),
    )
}

fn ops(doc: &MemoryDocument) -> Vec<EditOp> {
    doc.journal().iter().map(|r| r.op.clone()).collect()
}

fn open_with(controller: &mut OverlayController, doc: &mut MemoryDocument) {
    let request = controller
        .on_selection_change(doc)
        .unwrap()
        .expect("trigger should open the overlay");
    assert_eq!(controller.phase(), OverlayPhase::Opening);
    assert!(controller.apply_response(block_on(request.run())));
    assert_eq!(controller.phase(), OverlayPhase::Open);
}

#[test]
fn block_menu_opens_after_marker_is_removed() {
    let mut controller = default_controller();
    let mut doc = MemoryDocument::paragraph("");
    doc.type_text("/");

    let request = controller.on_selection_change(&mut doc).unwrap().unwrap();
    assert_eq!(request.kind, TriggerKind::BlockMenu);
    assert_eq!(doc.text(), "");
    assert_eq!(controller.view().anchor_range, TextRange::empty(0));
    assert!(controller.view().is_loading());

    assert!(controller.apply_response(block_on(request.run())));
    let view = controller.view();
    assert_eq!(view.phase, OverlayPhase::Open);
    assert_eq!(view.items.len(), StaticBlockMenu::default().items().len());
    assert_eq!(view.selected_index, 0);
    assert!(!view.is_loading());
}

#[test]
fn keyboard_navigation_wraps_around() {
    let mut controller = controller_with_mentions(vec![
        MentionUser::new("1", "Ann", "ann@example.com"),
        MentionUser::new("2", "Andy", "andy@example.com"),
        MentionUser::new("3", "Anya", "anya@example.com"),
    ]);
    let mut doc = MemoryDocument::paragraph("@an");
    open_with(&mut controller, &mut doc);
    assert_eq!(controller.view().items.len(), 3);

    assert!(controller.on_key_down(OverlayKey::Next, &mut doc));
    assert!(controller.on_key_down(OverlayKey::Next, &mut doc));
    assert_eq!(controller.view().selected_index, 2);
    assert!(controller.on_key_down(OverlayKey::Next, &mut doc));
    assert_eq!(controller.view().selected_index, 0);

    assert!(controller.on_key_down(OverlayKey::Previous, &mut doc));
    assert_eq!(controller.view().selected_index, 2);
    assert_eq!(controller.view().selected().map(Candidate::id), Some("3"));
    assert!(ops(&doc).is_empty());
}

#[test]
fn unrelated_keys_are_not_handled() {
    let mut controller = default_controller();
    let mut doc = MemoryDocument::paragraph("@j");
    open_with(&mut controller, &mut doc);

    assert!(!controller.on_key_down(OverlayKey::Other, &mut doc));
    assert!(controller.is_open());
}

#[test]
fn typing_extends_query_and_resets_selection() {
    let mut controller = default_controller();
    let mut doc = MemoryDocument::paragraph("@");
    open_with(&mut controller, &mut doc);
    assert_eq!(controller.view().items.len(), 3);
    controller.on_key_down(OverlayKey::Next, &mut doc);
    assert_eq!(controller.view().selected_index, 1);

    doc.type_text("jo");
    let request = controller.on_selection_change(&mut doc).unwrap().unwrap();
    assert_eq!(request.query, "jo");
    assert_eq!(controller.view().selected_index, 0);
    assert_eq!(controller.view().anchor_range, TextRange::new(0, 3));

    assert!(controller.apply_response(block_on(request.run())));
    let labels: Vec<&str> = controller.view().items.iter().map(Candidate::label).collect();
    assert_eq!(labels, vec!["John Doe", "Bob Johnson"]);
}

#[test]
fn unchanged_query_does_not_refetch() {
    let mut controller = default_controller();
    let mut doc = MemoryDocument::paragraph("@jo");
    open_with(&mut controller, &mut doc);

    assert!(controller.on_selection_change(&mut doc).unwrap().is_none());
    assert!(controller.is_open());
}

#[test]
fn backspacing_the_marker_closes_the_overlay() {
    let mut controller = default_controller();
    let mut doc = MemoryDocument::paragraph("hi @");
    open_with(&mut controller, &mut doc);

    doc.backspace();
    assert!(controller.on_selection_change(&mut doc).unwrap().is_none());
    assert_eq!(controller.phase(), OverlayPhase::Closed);
}

#[test]
fn empty_results_open_with_no_items() {
    let mut controller = default_controller();
    let mut doc = MemoryDocument::paragraph("@zzz");
    open_with(&mut controller, &mut doc);

    let view = controller.view();
    assert_eq!(view.items.len(), 0);
    assert!(view.is_empty());

    assert!(controller.on_key_down(OverlayKey::Confirm, &mut doc));
    assert!(controller.on_key_down(OverlayKey::Next, &mut doc));
    assert_eq!(controller.phase(), OverlayPhase::Open);
    assert!(ops(&doc).is_empty());
    assert_eq!(doc.text(), "@zzz");
}

#[test]
fn failing_source_degrades_to_no_results() {
    let failing = FnSource::new(|_query: String| {
        future::ready(Err::<Vec<Candidate>, _>(FetchError::failed("directory offline"))).boxed()
    });
    let mut controller = OverlayController::new(
        SuggestConfig::default(),
        Arc::new(StaticBlockMenu::default()),
        Arc::new(failing),
    );
    let mut doc = MemoryDocument::paragraph("@jo");
    open_with(&mut controller, &mut doc);

    assert!(controller.view().is_empty());
    assert!(ops(&doc).is_empty());
}

#[test]
fn consecutive_empty_results_close_when_configured() {
    let config = SuggestConfig {
        close_after_empty_results: Some(2),
        ..SuggestConfig::default()
    };
    let mut controller = OverlayController::with_default_sources(config);
    let mut doc = MemoryDocument::paragraph("@x");
    open_with(&mut controller, &mut doc);
    assert!(controller.view().is_empty());

    doc.type_text("y");
    let request = controller.on_selection_change(&mut doc).unwrap().unwrap();
    assert!(controller.apply_response(block_on(request.run())));
    assert_eq!(controller.phase(), OverlayPhase::Closed);
}

#[test]
fn results_are_capped_by_max_items() {
    let users = (0..20)
        .map(|i| MentionUser::new(i.to_string(), format!("User {i}"), "u@example.com"))
        .collect();
    let config = SuggestConfig {
        max_items: 5,
        ..SuggestConfig::default()
    };
    let mut controller = OverlayController::new(
        config,
        Arc::new(StaticBlockMenu::default()),
        Arc::new(UserDirectory::new(users).max_items(50)),
    );
    let mut doc = MemoryDocument::paragraph("@user");
    open_with(&mut controller, &mut doc);
    assert_eq!(controller.view().items.len(), 5);
}

#[test]
fn cancel_closes_without_editing() {
    let mut controller = default_controller();
    let mut doc = MemoryDocument::paragraph("@jo");
    open_with(&mut controller, &mut doc);

    assert!(controller.on_key_down(OverlayKey::Cancel, &mut doc));
    assert_eq!(controller.phase(), OverlayPhase::Closed);
    assert_eq!(doc.text(), "@jo");
    assert!(ops(&doc).is_empty());
    assert!(!controller.on_key_down(OverlayKey::Confirm, &mut doc));
}

#[test]
fn block_menu_closes_when_typing_continues() {
    let mut controller = default_controller();
    let mut doc = MemoryDocument::paragraph("");
    doc.type_text("/");
    open_with(&mut controller, &mut doc);

    doc.type_text("x");
    assert!(controller.on_selection_change(&mut doc).unwrap().is_none());
    assert_eq!(controller.phase(), OverlayPhase::Closed);
    assert_eq!(doc.text(), "x");
    assert_eq!(doc.blocks()[0].kind, BlockKind::Paragraph);
}

#[test]
fn block_menu_lists_ai_items_when_enabled() {
    let config = SuggestConfig {
        enable_ai_items: true,
        ..SuggestConfig::default()
    };
    let mut controller = OverlayController::with_default_sources(config);
    let mut doc = MemoryDocument::paragraph("");
    doc.type_text("/");
    open_with(&mut controller, &mut doc);

    let ids: Vec<&str> = controller.view().items.iter().map(Candidate::id).collect();
    assert!(ids.len() > controller.config().max_items);
    assert_eq!(
        &ids[ids.len() - 5..],
        &[
            "ai_text_completion",
            "ai_grammar_check",
            "ai_style_suggestions",
            "ai_content_summary",
            "ai_code_suggestions",
        ]
    );
}

#[test]
fn dismissed_mention_stays_closed_while_typing_on() {
    let mut controller = default_controller();
    let mut doc = MemoryDocument::paragraph("@bo");
    open_with(&mut controller, &mut doc);
    assert!(controller.on_key_down(OverlayKey::Cancel, &mut doc));

    doc.type_text("x");
    assert!(controller.on_selection_change(&mut doc).unwrap().is_none());
    assert_eq!(controller.phase(), OverlayPhase::Closed);

    doc.type_text(" @j");
    let request = controller.on_selection_change(&mut doc).unwrap().unwrap();
    assert_eq!(request.query, "j");
    assert_eq!(controller.view().anchor_range, TextRange::new(5, 7));
}

#[test]
fn dismissal_clears_once_the_marker_is_gone() {
    let mut controller = default_controller();
    let mut doc = MemoryDocument::paragraph("@");
    open_with(&mut controller, &mut doc);
    assert!(controller.on_key_down(OverlayKey::Cancel, &mut doc));

    doc.backspace();
    assert!(controller.on_selection_change(&mut doc).unwrap().is_none());
    doc.type_text("@");
    assert!(controller.on_selection_change(&mut doc).unwrap().is_some());
    assert_eq!(controller.phase(), OverlayPhase::Opening);
}
