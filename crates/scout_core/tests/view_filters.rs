use pretty_assertions::assert_eq;
use scout_core::{
    update, ActorInfo, AppState, GroupKind, ItemFilter, MembershipBucket, MembershipState, Msg,
    RawItemRecord,
};

fn init_logging() {
    scout_logging::initialize_for_tests();
}

fn record(title: &str, kind: GroupKind, members: u64, source: &str) -> RawItemRecord {
    RawItemRecord {
        title: title.to_string(),
        kind,
        member_count: Some(members),
        source: Some(source.to_string()),
        handle: Some(title.to_string()),
        ..Default::default()
    }
}

fn state_with(records: Vec<RawItemRecord>) -> AppState {
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
    let (state, _) = update(
        state,
        Msg::BatchReceived {
            records,
            source_label: "global".to_string(),
            status: None,
            now_ms: 2_000,
        },
    );
    state
}

fn sample_state() -> AppState {
    state_with(vec![
        record("small-group", GroupKind::Group, 50, "global"),
        record("big-group", GroupKind::Group, 5_000, "global"),
        record("small-channel", GroupKind::Channel, 80, "local"),
        record("big-channel", GroupKind::Channel, 9_000, "local"),
    ])
}

fn visible_titles(state: &AppState) -> Vec<String> {
    state.view().rows.iter().map(|r| r.title.clone()).collect()
}

#[test]
fn filters_compose_by_logical_and() {
    init_logging();
    let state = sample_state();
    let (state, _) = update(
        state,
        Msg::FiltersChanged(ItemFilter {
            kind: Some(GroupKind::Channel),
            min_members: Some(100),
            ..Default::default()
        }),
    );
    assert_eq!(visible_titles(&state), vec!["big-channel".to_string()]);
}

#[test]
fn zero_bounds_are_ignored() {
    init_logging();
    let state = sample_state();
    let (state, _) = update(
        state,
        Msg::FiltersChanged(ItemFilter {
            min_members: Some(0),
            max_members: Some(0),
            ..Default::default()
        }),
    );
    assert_eq!(state.view().filtered_count, 4);
}

#[test]
fn member_range_bounds_are_inclusive() {
    init_logging();
    let state = sample_state();
    let (state, _) = update(
        state,
        Msg::FiltersChanged(ItemFilter {
            min_members: Some(80),
            max_members: Some(5_000),
            ..Default::default()
        }),
    );
    assert_eq!(
        visible_titles(&state),
        vec!["big-group".to_string(), "small-channel".to_string()]
    );
}

#[test]
fn source_and_external_id_predicates() {
    init_logging();
    let mut records = vec![
        record("with-id", GroupKind::Group, 10, "global"),
        record("without-id", GroupKind::Group, 10, "global"),
        record("elsewhere", GroupKind::Group, 10, "local"),
    ];
    records[0].external_id = Some("g-1".to_string());
    let state = state_with(records);

    let (state, _) = update(
        state,
        Msg::FiltersChanged(ItemFilter {
            source: Some("global".to_string()),
            only_with_external_id: true,
            ..Default::default()
        }),
    );
    assert_eq!(visible_titles(&state), vec!["with-id".to_string()]);
}

#[test]
fn membership_buckets_split_joined_and_monitoring_from_the_rest() {
    init_logging();
    let mut records = vec![
        record("joined", GroupKind::Group, 10, "global"),
        record("monitored", GroupKind::Group, 10, "global"),
        record("outside", GroupKind::Group, 10, "global"),
    ];
    records[0].membership = Some(MembershipState::Joined);
    records[1].membership = Some(MembershipState::Monitoring);
    let state = state_with(records);

    let (state, _) = update(
        state,
        Msg::FiltersChanged(ItemFilter {
            membership: Some(MembershipBucket::Joined),
            ..Default::default()
        }),
    );
    assert_eq!(
        visible_titles(&state),
        vec!["joined".to_string(), "monitored".to_string()]
    );

    let (state, _) = update(
        state,
        Msg::FiltersChanged(ItemFilter {
            membership: Some(MembershipBucket::NotJoined),
            ..Default::default()
        }),
    );
    assert_eq!(visible_titles(&state), vec!["outside".to_string()]);
}

#[test]
fn pagination_bounds_for_137_items_at_page_size_50() {
    init_logging();
    let records = (0..137)
        .map(|i| record(&format!("item-{i}"), GroupKind::Group, 10, "global"))
        .collect();
    let state = state_with(records);
    let (state, _) = update(state, Msg::PageSizeChanged(50));
    assert_eq!(state.view().total_pages, 3);

    // Out-of-range requests leave the page unchanged.
    let (state, _) = update(state, Msg::PageRequested(0));
    assert_eq!(state.page(), 1);
    let (state, _) = update(state, Msg::PageRequested(4));
    assert_eq!(state.page(), 1);

    let (state, _) = update(state, Msg::PageRequested(3));
    assert_eq!(state.page(), 3);
    assert_eq!(state.view().rows.len(), 37);
}

#[test]
fn changing_page_size_resets_to_page_one() {
    init_logging();
    let records = (0..60)
        .map(|i| record(&format!("item-{i}"), GroupKind::Group, 10, "global"))
        .collect();
    let state = state_with(records);
    let (state, _) = update(state, Msg::PageSizeChanged(10));
    let (state, _) = update(state, Msg::PageRequested(5));
    assert_eq!(state.page(), 5);

    let (state, _) = update(state, Msg::PageSizeChanged(25));
    assert_eq!(state.page(), 1);
    assert_eq!(state.page_size(), 25);
}

#[test]
fn unsupported_page_size_is_rejected() {
    init_logging();
    let state = sample_state();
    let (state, _) = update(state, Msg::PageSizeChanged(33));
    assert_eq!(state.page_size(), 25);
    assert!(state.notice().is_some());
}

#[test]
fn narrowing_a_filter_clamps_the_current_page() {
    init_logging();
    let records = (0..60)
        .map(|i| record(&format!("item-{i}"), GroupKind::Group, 10, "global"))
        .collect();
    let state = state_with(records);
    let (state, _) = update(state, Msg::PageSizeChanged(10));
    let (state, _) = update(state, Msg::PageRequested(6));
    assert_eq!(state.page(), 6);

    let (state, _) = update(
        state,
        Msg::FiltersChanged(ItemFilter {
            kind: Some(GroupKind::Channel),
            ..Default::default()
        }),
    );
    assert_eq!(state.page(), 1);
}

/// Selection persistence: select X, filter X out, filter back, X is still
/// selected.
#[test]
fn selection_survives_a_filter_round_trip() {
    init_logging();
    let state = sample_state();
    let channel_seq = state
        .items()
        .iter()
        .find(|item| item.title == "small-channel")
        .unwrap()
        .seq;

    let (state, _) = update(state, Msg::SelectionToggled { seq: channel_seq });
    assert!(state.selection().contains(&channel_seq));

    // A filter that excludes the selected channel.
    let (state, _) = update(
        state,
        Msg::FiltersChanged(ItemFilter {
            kind: Some(GroupKind::Group),
            ..Default::default()
        }),
    );
    assert!(!visible_titles(&state).contains(&"small-channel".to_string()));
    assert!(state.selection().contains(&channel_seq));

    // Widen it again: the row comes back still selected.
    let (state, _) = update(state, Msg::FiltersChanged(ItemFilter::default()));
    let row = state
        .view()
        .rows
        .iter()
        .find(|row| row.seq == channel_seq)
        .cloned()
        .unwrap();
    assert!(row.selected);
}

#[test]
fn selection_algebra_operates_on_the_filtered_view_only() {
    init_logging();
    let state = sample_state();
    // Filter down to groups, select all visible.
    let (state, _) = update(
        state,
        Msg::FiltersChanged(ItemFilter {
            kind: Some(GroupKind::Group),
            ..Default::default()
        }),
    );
    let (state, _) = update(state, Msg::SelectAllVisible);
    assert_eq!(state.selection().len(), 2);

    // Inverting within the filtered view empties it; channels outside the
    // filter are untouched.
    let (state, _) = update(state, Msg::InvertSelection);
    assert_eq!(state.selection().len(), 0);

    let (state, _) = update(state, Msg::SelectAllVisible);
    let (state, _) = update(state, Msg::FiltersChanged(ItemFilter::default()));
    let (state, _) = update(state, Msg::InvertSelection);
    // The two groups were deselected, the two channels selected.
    let selected_titles: Vec<String> = state
        .view()
        .rows
        .iter()
        .filter(|row| row.selected)
        .map(|row| row.title.clone())
        .collect();
    assert_eq!(
        selected_titles,
        vec!["small-channel".to_string(), "big-channel".to_string()]
    );

    let (state, _) = update(state, Msg::ClearSelection);
    assert_eq!(state.selection().len(), 0);
}

#[test]
fn new_search_clears_items_and_selection() {
    init_logging();
    let state = sample_state();
    let (state, _) = update(state, Msg::SelectAllVisible);
    assert_eq!(state.selection().len(), 4);

    let (state, _) = update(
        state,
        Msg::ResultReceived {
            records: vec![],
            new_count: 0,
            known_count: 0,
            now_ms: 3_000,
        },
    );
    let (state, _) = update(state, Msg::QueryChanged("beta".to_string()));
    let (state, _) = update(state, Msg::SearchSubmitted { now_ms: 4_000 });
    assert!(state.items().is_empty());
    assert_eq!(state.selection().len(), 0);
    assert_eq!(state.page(), 1);
}
