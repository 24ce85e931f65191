use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::FutureExt as _;
use futures::channel::oneshot;
use futures::executor::block_on;
use futures::future;
use futures::stream::{FuturesUnordered, StreamExt as _};
use gpui_plate_suggest::{
    Candidate, FetchError, FetchResult, FnSource, MemoryDocument, MentionUser, OverlayController,
    OverlayPhase, StaticBlockMenu, SuggestConfig,
};
use pretty_assertions::assert_eq;

/// Every lookup returns a single user whose id echoes the query.
fn echo_controller() -> OverlayController {
    let echo = FnSource::new(|query: String| {
        let user = MentionUser::new(query.clone(), format!("match for {query}"), "x@example.com");
        future::ready(Ok::<_, FetchError>(vec![Candidate::Mention(user)])).boxed()
    });
    OverlayController::new(
        SuggestConfig::default(),
        Arc::new(StaticBlockMenu::default()),
        Arc::new(echo),
    )
}

fn item_ids(controller: &OverlayController) -> Vec<String> {
    controller
        .view()
        .items
        .iter()
        .map(|c| c.id().to_string())
        .collect()
}

#[test]
fn older_response_arriving_late_is_discarded() {
    let mut controller = echo_controller();
    let mut doc = MemoryDocument::paragraph("@jo");

    let request_a = controller.on_selection_change(&mut doc).unwrap().unwrap();
    doc.type_text("h");
    let request_b = controller.on_selection_change(&mut doc).unwrap().unwrap();
    assert!(request_b.generation > request_a.generation);

    let response_b = block_on(request_b.run());
    let response_a = block_on(request_a.run());

    assert!(controller.apply_response(response_b));
    assert!(!controller.apply_response(response_a));
    assert_eq!(item_ids(&controller), vec!["joh"]);
    assert_eq!(controller.view().query, "joh");
}

#[test]
fn older_response_arriving_first_is_also_discarded() {
    let mut controller = echo_controller();
    let mut doc = MemoryDocument::paragraph("@jo");

    let request_a = controller.on_selection_change(&mut doc).unwrap().unwrap();
    doc.type_text("h");
    let request_b = controller.on_selection_change(&mut doc).unwrap().unwrap();

    assert!(!controller.apply_response(block_on(request_a.run())));
    assert_eq!(controller.phase(), OverlayPhase::Opening);
    assert!(controller.view().is_loading());

    assert!(controller.apply_response(block_on(request_b.run())));
    assert_eq!(item_ids(&controller), vec!["joh"]);
}

#[test]
fn closing_invalidates_in_flight_lookups() {
    let mut controller = echo_controller();
    let mut doc = MemoryDocument::paragraph("@jo");

    let request = controller.on_selection_change(&mut doc).unwrap().unwrap();
    controller.close();

    assert!(!controller.apply_response(block_on(request.run())));
    assert_eq!(controller.phase(), OverlayPhase::Closed);
    assert!(controller.view().items.is_empty());
}

#[test]
fn reopening_at_the_same_spot_ignores_the_previous_session() {
    let mut controller = echo_controller();
    let mut doc = MemoryDocument::paragraph("@jo");

    let first = controller.on_selection_change(&mut doc).unwrap().unwrap();
    controller.close();
    let second = controller.on_selection_change(&mut doc).unwrap().unwrap();
    assert_eq!(first.query, second.query);

    assert!(!controller.apply_response(block_on(first.run())));
    assert!(controller.apply_response(block_on(second.run())));
    assert_eq!(item_ids(&controller), vec!["jo"]);
}

#[test]
fn concurrent_lookups_resolve_out_of_order() {
    let senders: Arc<Mutex<HashMap<String, oneshot::Sender<FetchResult>>>> =
        Arc::new(Mutex::new(HashMap::new()));
    let registry = senders.clone();
    let deferred = FnSource::new(move |query: String| {
        let (tx, rx) = oneshot::channel();
        registry.lock().unwrap().insert(query, tx);
        rx.map(|res| res.unwrap_or(Err(FetchError::Cancelled)))
            .boxed()
    });
    let mut controller = OverlayController::new(
        SuggestConfig::default(),
        Arc::new(StaticBlockMenu::default()),
        Arc::new(deferred),
    );
    let mut doc = MemoryDocument::paragraph("@jo");

    let mut in_flight = FuturesUnordered::new();
    in_flight.push(
        controller
            .on_selection_change(&mut doc)
            .unwrap()
            .unwrap()
            .run(),
    );
    doc.type_text("h");
    in_flight.push(
        controller
            .on_selection_change(&mut doc)
            .unwrap()
            .unwrap()
            .run(),
    );

    let respond = |query: &str| {
        let tx = senders.lock().unwrap().remove(query).unwrap();
        let user = MentionUser::new(query, query, "x@example.com");
        tx.send(Ok(vec![Candidate::Mention(user)])).unwrap();
    };
    respond("joh");
    respond("jo");

    let mut applied = Vec::new();
    block_on(async {
        while let Some(response) = in_flight.next().await {
            let query = response.query.clone();
            applied.push((query, controller.apply_response(response)));
        }
    });
    applied.sort();

    assert_eq!(
        applied,
        vec![("jo".to_string(), false), ("joh".to_string(), true)]
    );
    assert_eq!(item_ids(&controller), vec!["joh"]);
}
