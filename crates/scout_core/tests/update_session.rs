use pretty_assertions::assert_eq;
use scout_core::{
    update, ActorInfo, AppState, Effect, Msg, ProgressPhase, RawItemRecord, SessionPhase,
};

fn init_logging() {
    scout_logging::initialize_for_tests();
}

fn ready_actor(id: &str) -> ActorInfo {
    ActorInfo {
        id: id.to_string(),
        label: format!("account {id}"),
        ready: true,
    }
}

fn record(title: &str, handle: Option<&str>) -> RawItemRecord {
    RawItemRecord {
        handle: handle.map(ToOwned::to_owned),
        title: title.to_string(),
        member_count: Some(10),
        ..Default::default()
    }
}

/// Actors + channels + query, then submit at `now_ms`.
fn submitted(query: &str, channels: &[&str], actors: Vec<ActorInfo>, now_ms: u64) -> (AppState, Vec<Effect>) {
    let state = AppState::new();
    let (state, _) = update(state, Msg::ActorsUpdated { actors, now_ms: 0 });
    let (state, _) = update(
        state,
        Msg::ChannelsChanged(channels.iter().map(ToString::to_string).collect()),
    );
    let (state, _) = update(state, Msg::QueryChanged(query.to_string()));
    update(state, Msg::SearchSubmitted { now_ms })
}

#[test]
fn submit_rejects_empty_query() {
    init_logging();
    let (state, effects) = submitted("   ", &["global"], vec![ready_actor("a1")], 1_000);
    assert_eq!(state.phase(), SessionPhase::Idle);
    assert!(effects.is_empty());
    assert!(state.notice().is_some());
}

#[test]
fn submit_rejects_missing_channels() {
    init_logging();
    let (state, effects) = submitted("alpha", &[], vec![ready_actor("a1")], 1_000);
    assert_eq!(state.phase(), SessionPhase::Idle);
    assert!(effects.is_empty());
}

#[test]
fn submit_rejects_when_no_actor_is_ready() {
    init_logging();
    let mut actor = ready_actor("a1");
    actor.ready = false;
    let (state, effects) = submitted("alpha", &["global"], vec![actor], 1_000);
    assert_eq!(state.phase(), SessionPhase::Idle);
    assert!(effects.is_empty());
    assert!(state.notice().is_some());
}

#[test]
fn submit_arms_watchdog_and_sends_start_search() {
    init_logging();
    let (state, effects) = submitted("alpha", &["global", "local"], vec![ready_actor("a1")], 1_000);
    assert_eq!(state.phase(), SessionPhase::Armed);
    assert_eq!(
        effects,
        vec![
            Effect::ArmWatchdog,
            Effect::StartSearch {
                query: "alpha".to_string(),
                channels: vec!["global".to_string(), "local".to_string()],
                actor: "a1".to_string(),
                limit: 100,
            },
            Effect::PersistRecentQueries(vec!["alpha".to_string()]),
        ]
    );
}

#[test]
fn first_event_moves_armed_to_streaming_and_progress_alternates_phases() {
    init_logging();
    let (state, _) = submitted("alpha", &["global"], vec![ready_actor("a1")], 1_000);

    let (state, _) = update(
        state,
        Msg::BatchReceived {
            records: vec![record("one", None)],
            source_label: "global".to_string(),
            status: Some("searching".to_string()),
            now_ms: 2_000,
        },
    );
    assert_eq!(state.phase(), SessionPhase::Streaming);
    assert_eq!(state.session().status_line.as_deref(), Some("searching"));

    let (state, _) = update(
        state,
        Msg::ProgressReceived {
            phase: ProgressPhase::Details,
            status: Some("fetching details".to_string()),
            now_ms: 3_000,
        },
    );
    assert_eq!(state.phase(), SessionPhase::Enriching);

    let (state, _) = update(
        state,
        Msg::ProgressReceived {
            phase: ProgressPhase::Basic,
            status: None,
            now_ms: 4_000,
        },
    );
    assert_eq!(state.phase(), SessionPhase::Streaming);
}

#[test]
fn error_event_fails_session_and_keeps_items() {
    init_logging();
    let (state, _) = submitted("alpha", &["global"], vec![ready_actor("a1")], 1_000);
    let (state, _) = update(
        state,
        Msg::BatchReceived {
            records: vec![record("one", None), record("two", None)],
            source_label: "global".to_string(),
            status: None,
            now_ms: 2_000,
        },
    );

    let (state, effects) = update(
        state,
        Msg::ErrorReceived {
            message: "backend exploded".to_string(),
            now_ms: 3_000,
        },
    );
    assert_eq!(state.phase(), SessionPhase::Failed);
    assert_eq!(effects, vec![Effect::DisarmWatchdog]);
    assert_eq!(state.items().len(), 2);
    assert_eq!(
        state.session().error.as_deref(),
        Some("backend exploded")
    );
    assert_eq!(state.session().status_line, None);
}

#[test]
fn terminal_session_ignores_further_search_events() {
    init_logging();
    let (state, _) = submitted("alpha", &["global"], vec![ready_actor("a1")], 1_000);
    let (state, _) = update(
        state,
        Msg::ResultReceived {
            records: vec![record("one", None)],
            new_count: 1,
            known_count: 0,
            now_ms: 2_000,
        },
    );
    assert_eq!(state.phase(), SessionPhase::Completed);
    let before = state.view();

    let (state, effects) = update(
        state,
        Msg::BatchReceived {
            records: vec![record("late", None)],
            source_label: "global".to_string(),
            status: None,
            now_ms: 3_000,
        },
    );
    assert!(effects.is_empty());
    let (state, effects) = update(
        state,
        Msg::ErrorReceived {
            message: "too late".to_string(),
            now_ms: 4_000,
        },
    );
    assert!(effects.is_empty());
    let (state, effects) = update(
        state,
        Msg::ResultReceived {
            records: vec![],
            new_count: 9,
            known_count: 9,
            now_ms: 5_000,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view(), before);
}

#[test]
fn terminal_session_rearms_on_fresh_submit() {
    init_logging();
    let (state, _) = submitted("alpha", &["global"], vec![ready_actor("a1")], 1_000);
    let (state, _) = update(
        state,
        Msg::ResultReceived {
            records: vec![record("one", None)],
            new_count: 1,
            known_count: 0,
            now_ms: 2_000,
        },
    );

    let (state, _) = update(state, Msg::QueryChanged("beta".to_string()));
    let (state, effects) = update(state, Msg::SearchSubmitted { now_ms: 3_000 });
    assert_eq!(state.phase(), SessionPhase::Armed);
    assert!(state.items().is_empty());
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, Effect::StartSearch { query, .. } if query == "beta")));
}

/// The end-to-end scenario: batch of 3, then a result of 2 with counters,
/// and a snapshot carrying exactly those 2 items.
#[test]
fn alpha_search_batch_then_result() {
    init_logging();
    let (state, effects) = submitted("alpha", &["global", "local"], vec![ready_actor("a1")], 1_000);
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, Effect::StartSearch { .. })));

    let (state, _) = update(
        state,
        Msg::BatchReceived {
            records: vec![
                record("one", None),
                record("two", None),
                record("three", None),
            ],
            source_label: "global".to_string(),
            status: None,
            now_ms: 2_000,
        },
    );
    assert_eq!(state.view().rows.len(), 3);

    let (state, effects) = update(
        state,
        Msg::ResultReceived {
            records: vec![record("one", Some("one")), record("four", Some("four"))],
            new_count: 1,
            known_count: 1,
            now_ms: 3_000,
        },
    );
    let view = state.view();
    assert_eq!(state.phase(), SessionPhase::Completed);
    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.new_count, 1);
    assert_eq!(view.known_count, 1);

    assert_eq!(effects.len(), 2);
    assert_eq!(effects[0], Effect::DisarmWatchdog);
    let Effect::PersistSnapshot(snapshot) = &effects[1] else {
        panic!("expected snapshot effect, got {:?}", effects[1]);
    };
    assert_eq!(snapshot.query, "alpha");
    assert_eq!(snapshot.items.len(), 2);
    assert_eq!(snapshot.new_count, 1);
    assert_eq!(snapshot.known_count, 1);
    assert_eq!(snapshot.saved_at_ms, 3_000);
}
