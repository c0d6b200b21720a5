use crate::effect::Effect;
use crate::item::{ItemSeq, MembershipState};
use crate::merge::{map_records, RawItemRecord};
use crate::msg::{ActionOutcome, Msg, ProgressPhase};
use crate::state::{AccountPicker, AppState, PendingAction, SessionPhase};

/// Pure update function: applies a message to state and returns any effects.
///
/// All wall-clock input arrives inside messages as epoch milliseconds; the
/// function itself never reads a clock, which is what makes the watchdog and
/// snapshot-freshness rules testable.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::QueryChanged(text) => {
            state.set_query_input(text);
            Vec::new()
        }
        Msg::ChannelsChanged(channels) => {
            state.set_channels(channels);
            Vec::new()
        }
        Msg::SearchSubmitted { now_ms } => submit_search(&mut state, now_ms),
        Msg::ActorsUpdated { actors, now_ms } => {
            state.touch_progress(now_ms);
            state.set_actors(actors);
            Vec::new()
        }
        Msg::BatchReceived {
            records,
            source_label,
            status,
            now_ms,
        } => apply_batch(&mut state, records, source_label, status, now_ms),
        Msg::ProgressReceived {
            phase,
            status,
            now_ms,
        } => apply_progress(&mut state, phase, status, now_ms),
        Msg::ResultReceived {
            records,
            new_count,
            known_count,
            now_ms,
        } => apply_result(&mut state, records, new_count, known_count, now_ms),
        Msg::ErrorReceived { message, now_ms } => apply_error(&mut state, message, now_ms),
        Msg::WatchdogTick { now_ms } => watchdog_tick(&mut state, now_ms),
        Msg::JoinRequested { seq } => join_requested(&mut state, seq),
        Msg::ActorPicked { actor } => actor_picked(&mut state, actor),
        Msg::PickerCancelled => {
            state.take_picker();
            Vec::new()
        }
        Msg::ActionCompleted { outcome, now_ms } => action_completed(&mut state, outcome, now_ms),
        Msg::SaveToggled { seq } => {
            if let Some(item) = state.item_by_seq_mut(seq) {
                item.saved = !item.saved;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::FiltersChanged(filter) => {
            state.set_filter(filter);
            Vec::new()
        }
        Msg::PageRequested(page) => {
            // Out-of-range requests leave the page unchanged.
            state.request_page(page);
            Vec::new()
        }
        Msg::PageSizeChanged(size) => {
            if !state.set_page_size(size) {
                state.set_notice(format!("unsupported page size {size}"));
            }
            Vec::new()
        }
        Msg::SelectionToggled { seq } => {
            state.toggle_selection(seq);
            Vec::new()
        }
        Msg::SelectAllVisible => {
            state.select_all_visible();
            Vec::new()
        }
        Msg::ClearSelection => {
            state.clear_selection();
            Vec::new()
        }
        Msg::InvertSelection => {
            state.invert_selection();
            Vec::new()
        }
        Msg::ExportRequested => vec![Effect::ExportView],
        Msg::SnapshotLoaded { snapshot, now_ms } => {
            if state.phase() != SessionPhase::Idle {
                Vec::new()
            } else if snapshot.is_fresh(now_ms, state.config().snapshot_ttl_ms) {
                state.hydrate_snapshot(snapshot);
                Vec::new()
            } else {
                vec![Effect::ClearSnapshot]
            }
        }
        Msg::RecentQueriesLoaded(list) => {
            state.set_recent(list);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Validate and arm a fresh search. Rejections surface a notice and leave
/// the session untouched.
fn submit_search(state: &mut AppState, now_ms: u64) -> Vec<Effect> {
    let query = state.query_input().trim().to_string();
    if query.is_empty() {
        state.set_notice("enter a search query first");
        return Vec::new();
    }
    if state.selected_channels().is_empty() {
        state.set_notice("select at least one discovery channel");
        return Vec::new();
    }
    let Some(actor) = state.first_ready_actor() else {
        state.set_notice("no account is ready to search");
        return Vec::new();
    };
    let actor = actor.id.clone();

    state.begin_session(query.clone(), now_ms);
    state.clear_notice();
    state.push_recent(&query);

    vec![
        Effect::ArmWatchdog,
        Effect::StartSearch {
            query,
            channels: state.selected_channels().to_vec(),
            actor,
            limit: state.config().search_limit,
        },
        Effect::PersistRecentQueries(state.recent_queries().to_vec()),
    ]
}

/// Events arriving after a terminal transition belong to an abandoned
/// search; they are dropped wholesale.
fn accepts_search_events(state: &AppState) -> bool {
    state.phase().is_active()
}

fn apply_batch(
    state: &mut AppState,
    records: Vec<RawItemRecord>,
    source_label: String,
    status: Option<String>,
    now_ms: u64,
) -> Vec<Effect> {
    if !accepts_search_events(state) {
        return Vec::new();
    }
    state.touch_progress(now_ms);
    state.set_phase(SessionPhase::Streaming);

    let query = state.session().query.clone();
    let mut next_seq = *state.next_seq_mut();
    let items = map_records(records, state.items(), &mut next_seq, &source_label, &query);
    *state.next_seq_mut() = next_seq;
    // A batch is cumulative backend state, not a delta: last batch wins.
    state.replace_items(items);
    if status.is_some() {
        state.set_status(status);
    }
    Vec::new()
}

fn apply_progress(
    state: &mut AppState,
    phase: ProgressPhase,
    status: Option<String>,
    now_ms: u64,
) -> Vec<Effect> {
    if !accepts_search_events(state) {
        return Vec::new();
    }
    state.touch_progress(now_ms);
    state.set_phase(match phase {
        ProgressPhase::Basic => SessionPhase::Streaming,
        ProgressPhase::Details => SessionPhase::Enriching,
    });
    state.set_status(status);
    Vec::new()
}

fn apply_result(
    state: &mut AppState,
    records: Vec<RawItemRecord>,
    new_count: u64,
    known_count: u64,
    now_ms: u64,
) -> Vec<Effect> {
    if !accepts_search_events(state) {
        return Vec::new();
    }
    state.touch_progress(now_ms);

    let query = state.session().query.clone();
    let mut next_seq = *state.next_seq_mut();
    let items = map_records(records, state.items(), &mut next_seq, "", &query);
    *state.next_seq_mut() = next_seq;
    let count = items.len();
    state.replace_items(items);
    state.set_counts(new_count, known_count);
    state.set_error(None);
    state.set_status(None);
    state.set_phase(SessionPhase::Completed);
    state.set_notice(format!(
        "search complete: {count} found ({new_count} new, {known_count} known)"
    ));

    vec![
        Effect::DisarmWatchdog,
        Effect::PersistSnapshot(state.make_snapshot(now_ms)),
    ]
}

fn apply_error(state: &mut AppState, message: String, now_ms: u64) -> Vec<Effect> {
    if !accepts_search_events(state) {
        return Vec::new();
    }
    state.touch_progress(now_ms);
    // Items are retained from the last good listing.
    state.set_status(None);
    state.set_phase(SessionPhase::Failed);
    state.set_error(Some(message.clone()));
    state.set_notice(format!("search failed: {message}"));

    vec![Effect::DisarmWatchdog]
}

/// The recurring check: fail the session only when the sliding idle window
/// has elapsed with no inbound event. Total search duration is never capped.
fn watchdog_tick(state: &mut AppState, now_ms: u64) -> Vec<Effect> {
    if !state.phase().is_active() {
        return Vec::new();
    }
    let idle = now_ms.saturating_sub(state.session().last_progress_ms);
    if idle < state.config().idle_timeout_ms {
        return Vec::new();
    }
    state.set_status(None);
    state.set_phase(SessionPhase::TimedOut);
    state.set_notice("search timed out: backend stopped responding");

    vec![Effect::DisarmWatchdog]
}

fn join_requested(state: &mut AppState, seq: ItemSeq) -> Vec<Effect> {
    let Some(item) = state.item_by_seq(seq) else {
        state.set_notice("no such item");
        return Vec::new();
    };
    let title = item.title.clone();
    let actionable = item.actionable();
    let already_member = item.membership.is_member();
    let conflict = state.pending_conflict(item);

    if !actionable {
        state.set_notice("item has no joinable identity yet");
        return Vec::new();
    }
    if already_member {
        state.set_notice(format!("already joined {title}"));
        return Vec::new();
    }
    if conflict {
        state.set_notice(format!("join already in progress for {title}"));
        return Vec::new();
    }

    let eligible = state.ready_actors();
    match eligible.as_slice() {
        [] => {
            state.set_notice("no account is ready to join");
            Vec::new()
        }
        [only] => {
            let only = only.clone();
            execute_join(state, seq, only)
        }
        _ => {
            state.open_picker(AccountPicker {
                seq,
                candidates: eligible,
            });
            Vec::new()
        }
    }
}

fn actor_picked(state: &mut AppState, actor: String) -> Vec<Effect> {
    let Some(picker) = state.take_picker() else {
        return Vec::new();
    };
    if !picker.candidates.contains(&actor) || !state.actor_is_ready(&actor) {
        state.set_notice(format!("account {actor} is no longer available"));
        return Vec::new();
    }
    // The world may have moved while the picker was open.
    let still_valid = state
        .item_by_seq(picker.seq)
        .map(|item| !state.pending_conflict(item))
        .unwrap_or(false);
    if !still_valid {
        return Vec::new();
    }
    execute_join(state, picker.seq, actor)
}

/// Dispatch the join command and optimistically mark the item Joining.
fn execute_join(state: &mut AppState, seq: ItemSeq, actor: String) -> Vec<Effect> {
    let Some(item) = state.item_by_seq(seq) else {
        return Vec::new();
    };
    let external_id = item.external_id.clone();
    let handle = item.handle.clone();

    state.insert_pending(PendingAction {
        seq,
        external_id: external_id.clone(),
        handle: handle.clone(),
        actor: actor.clone(),
    });
    if let Some(item) = state.item_by_seq_mut(seq) {
        if item.membership == MembershipState::NotJoined {
            item.membership = MembershipState::Joining;
        }
    }

    vec![Effect::StartAction {
        seq,
        external_id,
        handle,
        actor,
    }]
}

/// Completion callbacks are matched by identity, not list position, and may
/// legitimately refer to an item that is no longer displayed.
fn action_completed(state: &mut AppState, outcome: ActionOutcome, now_ms: u64) -> Vec<Effect> {
    state.touch_progress(now_ms);
    let pending = state.remove_pending_for_outcome(&outcome);

    let Some(item) = state.item_for_outcome_mut(&outcome) else {
        // A miss is not an error: the operator may have re-searched since.
        return Vec::new();
    };

    if outcome.success {
        // Monitoring already implies membership; never downgrade it.
        if item.membership != MembershipState::Monitoring {
            item.membership = MembershipState::Joined;
        }
        item.joined_via = outcome.actor.clone().or_else(|| pending.map(|p| p.actor));
        if let Some(count) = outcome.member_count {
            item.member_count = count;
        }
        let title = item.title.clone();
        state.set_notice(format!("joined {title}"));
    } else {
        // The item must not get stuck at Joining.
        if item.membership == MembershipState::Joining {
            item.membership = MembershipState::NotJoined;
        }
        let title = item.title.clone();
        let detail = outcome.message.as_deref().unwrap_or("backend rejected it");
        state.set_notice(format!("could not join {title}: {detail}"));
    }
    state.mark_dirty();
    Vec::new()
}
