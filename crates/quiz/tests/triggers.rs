use answer_store::{LocalStorage, PersistedAnswerRecord};
use bus::{Notice, TriggerEvent};
use core_types::LifecycleState;
use html::dom_utils::text_content;
use html::traverse::{find_descendant, find_node_by_id, find_node_by_id_mut, replace_node};
use html::{Node, parse_document, parse_fragment};
use quiz::{QuizConfig, QuizSession, markup};
use quiz_test_support::{
    APPENDED_BLOCK, CHOICE_ID, DUPLICATE_ID_PAGE, FailingStore, LOCATION, MIXED_PAGE,
    MISSING_LIST_PAGE, ManualClock, OTHER_LOCATION, OTHER_PAGE, PRERENDERED_PAGE, SHORT_ID, key,
};

const RECAP_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Recap</title></head><body>
<div class="admonition exercise" id="recap"><p class="admonition-title">Exercise</p><p>Review the chapter.</p></div>
</body></html>
"#;

const WARM_UP_BLOCK: &str = r#"<div class="admonition exercise" id="recap"><p class="admonition-title">Exercise</p><p>Warm up first.</p></div>"#;

fn session_at(html: &str, location: &str) -> (QuizSession<LocalStorage, ManualClock>, ManualClock) {
    let clock = ManualClock::new(0);
    let session = QuizSession::new(
        QuizConfig::default(),
        LocalStorage::new(),
        clock.clone(),
        location,
        html,
    );
    (session, clock)
}

#[test]
fn nothing_is_bound_before_a_trigger() {
    let (session, _clock) = session_at(MIXED_PAGE, LOCATION);
    assert!(session.identities().is_empty());
    assert!(!session.html().contains(markup::FORM));
}

#[test]
fn link_activation_reinitializes_after_delay() {
    let (mut session, clock) = session_at(MIXED_PAGE, LOCATION);
    session.handle(TriggerEvent::LinkActivated {
        href: "/guide/loops/#q2".to_string(),
    });

    clock.advance(299);
    assert_eq!(session.run_due_timers(), 0);
    assert!(session.identities().is_empty());

    clock.advance(1);
    assert_eq!(session.run_due_timers(), 1);
    assert_eq!(session.identities().len(), 4);
}

fn title_of(session: &QuizSession<LocalStorage, ManualClock>, identity: &str) -> String {
    let block = session.block(identity).unwrap();
    let container = find_node_by_id(session.document(), block.container).unwrap();
    text_content(find_descendant(container, &markup::is_title).unwrap())
}

fn stored_choice(session: &mut QuizSession<LocalStorage, ManualClock>, at: &str) -> Option<i64> {
    let raw = session.store_mut().get(at)?;
    PersistedAnswerRecord::parse(&raw).ok()?.selected_alternative_index
}

#[test]
fn link_to_another_page_rebinds_under_its_path() {
    let (mut session, clock) = session_at(MIXED_PAGE, LOCATION);
    session.handle(TriggerEvent::DocumentReady);
    session.select_alternative(CHOICE_ID, 2).unwrap();
    session.submit(CHOICE_ID).unwrap();

    // The host mounts the linked page in place before the delayed pass runs.
    session.handle(TriggerEvent::LinkActivated {
        href: "../functions/".to_string(),
    });
    *session.document_mut() = parse_document(OTHER_PAGE);
    clock.advance(300);
    session.run_due_timers();

    assert_eq!(session.page().as_str(), "/guide/functions");
    assert_eq!(session.identities(), vec![CHOICE_ID]);
    assert_eq!(session.block(CHOICE_ID).unwrap().key, "/guide/functions::choice_1");
    assert_eq!(session.lifecycle(CHOICE_ID), Some(LifecycleState::Unanswered));
    assert!(title_of(&session, CHOICE_ID).starts_with("Question 1"));
    assert_eq!(stored_choice(&mut session, &key(CHOICE_ID)), Some(2));
}

#[test]
fn in_page_anchor_link_keeps_bindings() {
    let (mut session, clock) = session_at(MIXED_PAGE, LOCATION);
    session.handle(TriggerEvent::DocumentReady);
    session.select_alternative(CHOICE_ID, 1).unwrap();

    session.handle(TriggerEvent::LinkActivated {
        href: "#short_1".to_string(),
    });
    clock.advance(300);
    session.run_due_timers();

    assert_eq!(session.page().as_str(), "/guide/loops");
    let block = session.block(CHOICE_ID).unwrap();
    let chosen = find_node_by_id(session.document(), block.alternatives[1]).unwrap();
    assert!(chosen.has_class(markup::SELECTED));
}

#[test]
fn polling_detects_a_reported_location_change() {
    let (mut session, clock) = session_at(MIXED_PAGE, LOCATION);
    session.handle(TriggerEvent::DocumentReady);
    session.input_text(SHORT_ID, "break").unwrap();
    session.submit(SHORT_ID).unwrap();
    session.drain_notices();

    // History navigation to a page with the same number of blocks.
    *session.document_mut() = parse_document(MIXED_PAGE);
    session.report_location("https://docs.example.org/guide/while/");
    clock.advance(1000);
    session.run_due_timers();

    assert!(matches!(
        session.drain_notices().as_slice(),
        [Notice::Reinitialized { newly_bound: 4, .. }]
    ));
    assert_eq!(session.page().as_str(), "/guide/while");
    assert_eq!(session.block(SHORT_ID).unwrap().key, "/guide/while::short_1");
    assert_eq!(session.lifecycle(SHORT_ID), Some(LifecycleState::Unanswered));
    let raw = session.store_mut().get(&key(SHORT_ID)).unwrap();
    assert!(PersistedAnswerRecord::parse(&raw).unwrap().submitted);
}

#[test]
fn bus_delivers_triggers_from_host_callbacks() {
    let (mut session, _clock) = session_at(MIXED_PAGE, LOCATION);
    let tx = session.trigger_sender();
    tx.send(TriggerEvent::DocumentReady).unwrap();
    tx.send(TriggerEvent::DocumentReady).unwrap();

    session.process_triggers();

    assert_eq!(
        session.drain_notices(),
        vec![
            Notice::Reinitialized {
                at: 0,
                blocks: 4,
                newly_bound: 4,
            },
            Notice::Reinitialized {
                at: 0,
                blocks: 4,
                newly_bound: 0,
            },
        ]
    );
}

#[test]
fn polling_picks_up_appended_blocks() {
    let (mut session, clock) = session_at(MIXED_PAGE, LOCATION);
    session.handle(TriggerEvent::DocumentReady);
    session.drain_notices();

    clock.advance(1000);
    assert_eq!(session.run_due_timers(), 1);
    assert!(session.drain_notices().is_empty(), "unchanged content must not re-run the pass");

    session.append_content(APPENDED_BLOCK);
    clock.advance(1000);
    session.run_due_timers();

    assert_eq!(
        session.identities(),
        vec!["choice_1", "short_1", "long_1", "self_progress_1", "choice_2"]
    );
    let block = session.block("choice_2").unwrap();
    let container = find_node_by_id(session.document(), block.container).unwrap();
    let title = find_descendant(container, &markup::is_title).unwrap();
    assert!(text_content(title).starts_with("Question 5"));
    assert_eq!(session.timers().next_due(), Some(3000));
}

#[test]
fn stale_autosave_writes_to_captured_key_after_swap() {
    let (mut session, clock) = session_at(MIXED_PAGE, LOCATION);
    session.handle(TriggerEvent::DocumentReady);
    session.input_text(SHORT_ID, "draft").unwrap();

    clock.advance(100);
    session.swap_content(OTHER_LOCATION, OTHER_PAGE);
    assert!(session.block(SHORT_ID).is_none());

    clock.advance(400);
    session.run_due_timers();

    let raw = session.store_mut().get(&key(SHORT_ID)).unwrap();
    let record = PersistedAnswerRecord::parse(&raw).unwrap();
    assert_eq!(record.answer_text.as_deref(), Some("draft"));
    assert!(!record.submitted);
    assert!(session.store_mut().get("/guide/functions::short_1").is_none());
}

#[test]
fn pipeline_rendered_form_is_bound_in_place() {
    let (mut session, _clock) = session_at(PRERENDERED_PAGE, "/geography/");
    let report = session.reinitialize();
    assert_eq!(report.newly_bound, 1);
    assert_eq!(report.materialized, 0);
    assert_eq!(session.identities(), vec!["capital"]);

    let block = session.block("capital").unwrap().clone();
    assert_eq!(block.correct_index, 1);
    let container = find_node_by_id(session.document(), block.container).unwrap();
    assert_eq!(container.attr("id"), Some("capital"));
    assert!(!container.has_class("id_capital"));

    session.select_alternative("capital", 1).unwrap();
    session.submit("capital").unwrap();
    let chosen = find_node_by_id(session.document(), block.alternatives[1]).unwrap();
    assert!(chosen.has_class(markup::CORRECT));
    assert!(session.store_mut().get("/geography::capital").is_some());
}

#[test]
fn broken_block_is_abandoned_alone() {
    let (mut session, _clock) = session_at(MISSING_LIST_PAGE, LOCATION);
    let report = session.reinitialize();
    assert_eq!(report.blocks, 2);
    assert_eq!(report.abandoned, 1);
    assert_eq!(report.newly_bound, 1);
    assert_eq!(session.identities(), vec![SHORT_ID]);

    let again = session.reinitialize();
    assert_eq!(again.abandoned, 1);
    assert_eq!(again.newly_bound, 0);
    assert!(!session.html().contains(markup::ALTERNATIVE_SET));
}

#[test]
fn duplicate_ids_are_disambiguated_stably() {
    let (mut session, _clock) = session_at(DUPLICATE_ID_PAGE, LOCATION);
    session.reinitialize();
    assert_eq!(session.identities(), vec!["recap", "recap-2"]);

    session.submit("recap-2").unwrap();
    session.swap_content(LOCATION, DUPLICATE_ID_PAGE);

    assert_eq!(session.identities(), vec!["recap", "recap-2"]);
    assert_eq!(session.lifecycle("recap"), Some(LifecycleState::Unanswered));
    assert_eq!(session.lifecycle("recap-2"), Some(LifecycleState::Submitted));
}

#[test]
fn earlier_block_with_same_id_does_not_take_over_bound_identity() {
    let (mut session, _clock) = session_at(RECAP_PAGE, LOCATION);
    session.reinitialize();
    session.submit("recap").unwrap();
    let original = session.block("recap").unwrap().container;

    let body = find_descendant(session.document(), &|n| n.is_element("body")).unwrap().id();
    let mut mounted = parse_fragment(WARM_UP_BLOCK);
    let children = find_node_by_id_mut(session.document_mut(), body)
        .and_then(Node::children_mut)
        .unwrap();
    children.insert(0, mounted.remove(0));
    let report = session.reinitialize();

    assert_eq!(report.newly_bound, 1);
    assert_eq!(session.identities(), vec!["recap", "recap-1"]);
    let bound = session.block("recap").unwrap();
    assert_eq!(bound.container, original);
    assert_eq!(bound.lifecycle, LifecycleState::Submitted);
    assert_eq!(session.lifecycle("recap-1"), Some(LifecycleState::Unanswered));
    assert_ne!(session.block("recap").unwrap().key, session.block("recap-1").unwrap().key);
}

#[test]
fn removed_blocks_are_forgotten() {
    let (mut session, _clock) = session_at(MIXED_PAGE, LOCATION);
    session.handle(TriggerEvent::DocumentReady);
    let handlers = session.controller().handlers().total();
    let container = session.block(SHORT_ID).unwrap().container;

    replace_node(session.document_mut(), container, Node::text("")).unwrap();
    let report = session.reinitialize();

    assert_eq!(report.blocks, 3);
    assert_eq!(report.newly_bound, 0);
    assert_eq!(session.identities(), vec![CHOICE_ID, "long_1", "self_progress_1"]);
    assert!(session.block(SHORT_ID).is_none());
    // Text field, form and edit button of the removed block.
    assert_eq!(session.controller().handlers().total(), handlers - 3);
    session.select_alternative(CHOICE_ID, 0).unwrap();
    session.input_text("long_1", "still bound").unwrap();
}

#[test]
fn reload_in_new_session_restores_from_shared_storage() {
    let storage = LocalStorage::new();
    let clock = ManualClock::new(0);
    {
        let mut first = QuizSession::new(
            QuizConfig::default(),
            storage.clone(),
            clock.clone(),
            LOCATION,
            MIXED_PAGE,
        );
        first.handle(TriggerEvent::DocumentReady);
        first.input_text("long_1", "  servers  ").unwrap();
        first.submit("long_1").unwrap();
    }
    assert_eq!(storage.len(), 1);

    let mut second = QuizSession::new(
        QuizConfig::default(),
        storage.clone(),
        clock,
        "/guide/loops/",
        MIXED_PAGE,
    );
    second.handle(TriggerEvent::DocumentReady);

    assert_eq!(second.lifecycle("long_1"), Some(LifecycleState::Submitted));
    let record = second.record("long_1").unwrap();
    assert_eq!(record.answer_text.as_deref(), Some("servers"));
}

#[test]
fn unparseable_records_are_purged_once_per_page() {
    let storage = LocalStorage::new();
    let mut session = QuizSession::new(
        QuizConfig::default(),
        storage.clone(),
        ManualClock::new(0),
        LOCATION,
        MIXED_PAGE,
    );
    session.store_mut().set(&key("gone_1"), "{not json");
    session.store_mut().set("/elsewhere::x", "{not json");

    session.reinitialize();

    assert_eq!(storage.raw(&key("gone_1")), None);
    assert_eq!(storage.raw("/elsewhere::x").as_deref(), Some("{not json"));
}

#[test]
fn disabled_fallback_drops_writes() {
    let config = QuizConfig::from_toml_str("fallback_storage = false\nauto_save = false\n").unwrap();
    let clock = ManualClock::new(0);
    let mut session = QuizSession::new(config, FailingStore::new(), clock, LOCATION, MIXED_PAGE);
    session.handle(TriggerEvent::DocumentReady);

    session.input_text(SHORT_ID, "break").unwrap();
    // Only the poll timer: autosave is off.
    assert_eq!(session.timers().len(), 1);
    session.submit(SHORT_ID).unwrap();

    assert_eq!(session.lifecycle(SHORT_ID), Some(LifecycleState::Submitted));
    assert_eq!(session.store().stats().writes(), 0);
    assert!(session.record(SHORT_ID).is_none());
}

#[test]
fn debug_mode_pass_still_reports() {
    let config = QuizConfig::from_toml_str("debug_mode = true\n").unwrap();
    let clock = ManualClock::new(0);
    let mut session = QuizSession::new(config, LocalStorage::new(), clock, LOCATION, MIXED_PAGE);
    let report = session.reinitialize();
    assert_eq!(report.newly_bound, 4);
}
