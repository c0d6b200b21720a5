use pretty_assertions::assert_eq;
use scout_core::{
    update, ActorInfo, AppState, CoreConfig, Effect, Msg, RawItemRecord, SessionPhase,
    SessionSnapshot,
};

const TTL_MS: u64 = 30 * 60 * 1000;

fn init_logging() {
    scout_logging::initialize_for_tests();
}

fn completed_state() -> (AppState, SessionSnapshot) {
    let state = AppState::new();
    let (state, _) = update(
        state,
        Msg::ActorsUpdated {
            actors: vec![ActorInfo {
                id: "a1".to_string(),
                label: "account".to_string(),
                ready: true,
            }],
            now_ms: 0,
        },
    );
    let (state, _) = update(state, Msg::ChannelsChanged(vec!["global".to_string()]));
    let (state, _) = update(state, Msg::QueryChanged("alpha".to_string()));
    let (state, _) = update(state, Msg::SearchSubmitted { now_ms: 1_000 });
    let (state, effects) = update(
        state,
        Msg::ResultReceived {
            records: vec![
                RawItemRecord {
                    title: "one".to_string(),
                    handle: Some("one".to_string()),
                    member_count: Some(5),
                    ..Default::default()
                },
                RawItemRecord {
                    title: "two".to_string(),
                    handle: Some("two".to_string()),
                    member_count: Some(6),
                    ..Default::default()
                },
            ],
            new_count: 1,
            known_count: 1,
            now_ms: 2_000,
        },
    );
    let snapshot = effects
        .into_iter()
        .find_map(|effect| match effect {
            Effect::PersistSnapshot(snapshot) => Some(snapshot),
            _ => None,
        })
        .expect("snapshot effect");
    (state, snapshot)
}

#[test]
fn completion_snapshot_carries_the_result_store() {
    init_logging();
    let (state, snapshot) = completed_state();
    assert_eq!(snapshot.query, "alpha");
    assert_eq!(snapshot.items, state.items().to_vec());
    assert_eq!(snapshot.new_count, 1);
    assert_eq!(snapshot.known_count, 1);
    assert_eq!(snapshot.saved_at_ms, 2_000);
}

#[test]
fn fresh_snapshot_hydrates_the_store_at_startup() {
    init_logging();
    let (_, snapshot) = completed_state();

    let state = AppState::new();
    let (state, effects) = update(
        state,
        Msg::SnapshotLoaded {
            snapshot: snapshot.clone(),
            now_ms: snapshot.saved_at_ms + TTL_MS,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), SessionPhase::Completed);
    assert_eq!(state.session().query, "alpha");
    assert_eq!(state.items().len(), 2);
    assert_eq!(state.session().new_count, 1);
    assert_eq!(state.session().known_count, 1);

    // The restored query is submittable as-is.
    assert_eq!(state.query_input(), "alpha");
}

#[test]
fn stale_snapshot_is_discarded() {
    init_logging();
    let (_, snapshot) = completed_state();

    let state = AppState::new();
    let (state, effects) = update(
        state,
        Msg::SnapshotLoaded {
            snapshot: snapshot.clone(),
            now_ms: snapshot.saved_at_ms + TTL_MS + 1,
        },
    );
    assert_eq!(effects, vec![Effect::ClearSnapshot]);
    assert_eq!(state.phase(), SessionPhase::Idle);
    assert!(state.items().is_empty());
}

#[test]
fn snapshot_is_ignored_once_a_session_has_started() {
    init_logging();
    let (state, snapshot) = completed_state();
    let before = state.view();
    let (state, effects) = update(
        state,
        Msg::SnapshotLoaded {
            snapshot,
            now_ms: 2_500,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view(), before);
}

#[test]
fn sequence_numbers_continue_past_restored_items() {
    init_logging();
    let (_, snapshot) = completed_state();
    let max_seq = snapshot.items.iter().map(|i| i.seq).max().unwrap();

    let state = AppState::new();
    let (state, _) = update(
        state,
        Msg::SnapshotLoaded {
            snapshot,
            now_ms: 2_500,
        },
    );
    let (state, _) = update(
        state,
        Msg::ActorsUpdated {
            actors: vec![ActorInfo {
                id: "a1".to_string(),
                label: "account".to_string(),
                ready: true,
            }],
            now_ms: 2_600,
        },
    );
    let (state, _) = update(state, Msg::ChannelsChanged(vec!["global".to_string()]));
    let (state, _) = update(state, Msg::SearchSubmitted { now_ms: 3_000 });
    let (state, _) = update(
        state,
        Msg::BatchReceived {
            records: vec![RawItemRecord {
                title: "next".to_string(),
                ..Default::default()
            }],
            source_label: "global".to_string(),
            status: None,
            now_ms: 4_000,
        },
    );
    assert!(state.items()[0].seq > max_seq);
}

#[test]
fn recent_queries_dedupe_and_stay_most_recent_first() {
    init_logging();
    let state = AppState::new();
    let (state, _) = update(
        state,
        Msg::ActorsUpdated {
            actors: vec![ActorInfo {
                id: "a1".to_string(),
                label: "account".to_string(),
                ready: true,
            }],
            now_ms: 0,
        },
    );
    let (state, _) = update(state, Msg::ChannelsChanged(vec!["global".to_string()]));

    let mut state = state;
    for (query, now) in [("alpha", 1_000), ("beta", 2_000), ("alpha", 3_000)] {
        let (next, _) = update(state, Msg::QueryChanged(query.to_string()));
        let (next, effects) = update(next, Msg::SearchSubmitted { now_ms: now });
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::PersistRecentQueries(_))));
        state = next;
    }
    assert_eq!(
        state.recent_queries(),
        &["alpha".to_string(), "beta".to_string()]
    );
}

#[test]
fn recent_query_list_is_capped() {
    init_logging();
    let state = AppState::with_config(CoreConfig {
        recent_queries_cap: 2,
        ..CoreConfig::default()
    });
    let (state, _) = update(
        state,
        Msg::ActorsUpdated {
            actors: vec![ActorInfo {
                id: "a1".to_string(),
                label: "account".to_string(),
                ready: true,
            }],
            now_ms: 0,
        },
    );
    let (state, _) = update(state, Msg::ChannelsChanged(vec!["global".to_string()]));

    let mut state = state;
    for (query, now) in [("one", 1_000), ("two", 2_000), ("three", 3_000)] {
        let (next, _) = update(state, Msg::QueryChanged(query.to_string()));
        let (next, _) = update(next, Msg::SearchSubmitted { now_ms: now });
        state = next;
    }
    assert_eq!(
        state.recent_queries(),
        &["three".to_string(), "two".to_string()]
    );
}

#[test]
fn loaded_recent_queries_replace_the_list() {
    init_logging();
    let state = AppState::new();
    let (state, effects) = update(
        state,
        Msg::RecentQueriesLoaded(vec!["old".to_string(), "older".to_string()]),
    );
    assert!(effects.is_empty());
    assert_eq!(
        state.recent_queries(),
        &["old".to_string(), "older".to_string()]
    );
}
