use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::filter::{filtered_items, page_slice, total_pages, ItemFilter, PAGE_SIZES};
use crate::item::{ActorId, DiscoveredItem, ItemSeq, SourceId};
use crate::msg::ActionOutcome;
use crate::snapshot::{push_recent_query, SessionSnapshot};
use crate::view_model::{ActorRowView, ItemRowView, PickerView, SessionViewModel};

/// Tunables of the core. The defaults match production behavior; tests
/// shrink the timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Idle window after which a silent backend fails the session.
    pub idle_timeout_ms: u64,
    /// Result limit sent with the start-search command.
    pub search_limit: u32,
    /// Freshness window for restoring a persisted snapshot.
    pub snapshot_ttl_ms: u64,
    /// Maximum length of the recent-query list.
    pub recent_queries_cap: usize,
    /// Initial page size; must be one of [`PAGE_SIZES`].
    pub page_size: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 90_000,
            search_limit: 100,
            snapshot_ttl_ms: 30 * 60 * 1000,
            recent_queries_cap: 20,
            page_size: 25,
        }
    }
}

/// Lifecycle of one search operation. Monotonic except for the
/// operator-triggered restart (terminal -> Armed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Armed,
    Streaming,
    Enriching,
    Completed,
    Failed,
    TimedOut,
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionPhase::Completed | SessionPhase::Failed | SessionPhase::TimedOut
        )
    }

    /// A search is in flight and the watchdog window applies.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionPhase::Armed | SessionPhase::Streaming | SessionPhase::Enriching
        )
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Armed => "armed",
            SessionPhase::Streaming => "streaming",
            SessionPhase::Enriching => "enriching",
            SessionPhase::Completed => "completed",
            SessionPhase::Failed => "failed",
            SessionPhase::TimedOut => "timed out",
        };
        write!(f, "{label}")
    }
}

/// The active or last-completed search operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchSession {
    pub query: String,
    pub channels: Vec<SourceId>,
    pub phase: SessionPhase,
    pub items: Vec<DiscoveredItem>,
    pub new_count: u64,
    pub known_count: u64,
    /// Refreshed by every inbound event; never decreases.
    pub last_progress_ms: u64,
    pub error: Option<String>,
    pub status_line: Option<String>,
}

/// An in-flight join, keyed by item sequence number. At most one per item.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAction {
    pub seq: ItemSeq,
    pub external_id: Option<String>,
    pub handle: Option<String>,
    pub actor: ActorId,
}

/// Read-only mirror of one actor-directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorInfo {
    pub id: ActorId,
    pub label: String,
    pub ready: bool,
}

/// The held account-selection sub-flow.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountPicker {
    pub seq: ItemSeq,
    pub candidates: Vec<ActorId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    config: CoreConfig,
    session: SearchSession,
    query_input: String,
    selected_channels: Vec<SourceId>,
    actors: Vec<ActorInfo>,
    pending: BTreeMap<ItemSeq, PendingAction>,
    picker: Option<AccountPicker>,
    filter: ItemFilter,
    page: usize,
    page_size: usize,
    selection: BTreeSet<ItemSeq>,
    recent_queries: Vec<String>,
    notice: Option<String>,
    next_seq: ItemSeq,
    session_seq: u64,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(CoreConfig::default())
    }

    pub fn with_config(config: CoreConfig) -> Self {
        let page_size = if PAGE_SIZES.contains(&config.page_size) {
            config.page_size
        } else {
            PAGE_SIZES[1]
        };
        Self {
            config,
            session: SearchSession::default(),
            query_input: String::new(),
            selected_channels: Vec::new(),
            actors: Vec::new(),
            pending: BTreeMap::new(),
            picker: None,
            filter: ItemFilter::default(),
            page: 1,
            page_size,
            selection: BTreeSet::new(),
            recent_queries: Vec::new(),
            notice: None,
            next_seq: 1,
            session_seq: 0,
            dirty: false,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase
    }

    pub fn query_input(&self) -> &str {
        &self.query_input
    }

    pub fn selected_channels(&self) -> &[SourceId] {
        &self.selected_channels
    }

    pub fn actors(&self) -> &[ActorInfo] {
        &self.actors
    }

    pub fn picker(&self) -> Option<&AccountPicker> {
        self.picker.as_ref()
    }

    pub fn pending_actions(&self) -> impl Iterator<Item = &PendingAction> {
        self.pending.values()
    }

    pub fn has_pending(&self, seq: ItemSeq) -> bool {
        self.pending.contains_key(&seq)
    }

    pub fn selection(&self) -> &BTreeSet<ItemSeq> {
        &self.selection
    }

    pub fn recent_queries(&self) -> &[String] {
        &self.recent_queries
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Monotonic counter of submitted searches, used for log correlation.
    pub fn session_seq(&self) -> u64 {
        self.session_seq
    }

    pub fn consume_dirty(&mut self) -> bool {
        let was = self.dirty;
        self.dirty = false;
        was
    }

    // --- mutators used by the update function -------------------------------

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_query_input(&mut self, text: String) {
        self.query_input = text;
    }

    pub(crate) fn set_channels(&mut self, channels: Vec<SourceId>) {
        self.selected_channels = channels;
        self.mark_dirty();
    }

    pub(crate) fn set_actors(&mut self, actors: Vec<ActorInfo>) {
        self.actors = actors;
        self.mark_dirty();
    }

    pub fn first_ready_actor(&self) -> Option<&ActorInfo> {
        self.actors.iter().find(|actor| actor.ready)
    }

    pub fn ready_actors(&self) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|actor| actor.ready)
            .map(|actor| actor.id.clone())
            .collect()
    }

    pub(crate) fn actor_is_ready(&self, id: &str) -> bool {
        self.actors.iter().any(|actor| actor.id == id && actor.ready)
    }

    /// Reset the result store for a fresh submit and enter Armed.
    pub(crate) fn begin_session(&mut self, query: String, now_ms: u64) {
        self.session.query = query;
        self.session.channels = self.selected_channels.clone();
        self.session.phase = SessionPhase::Armed;
        self.session.items.clear();
        self.session.new_count = 0;
        self.session.known_count = 0;
        self.session.error = None;
        self.session.status_line = None;
        self.session.last_progress_ms = self.session.last_progress_ms.max(now_ms);
        self.page = 1;
        self.selection.clear();
        self.picker = None;
        self.session_seq += 1;
        self.mark_dirty();
    }

    pub(crate) fn touch_progress(&mut self, now_ms: u64) {
        if now_ms > self.session.last_progress_ms {
            self.session.last_progress_ms = now_ms;
        }
    }

    pub(crate) fn set_phase(&mut self, phase: SessionPhase) {
        if self.session.phase != phase {
            self.session.phase = phase;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_status(&mut self, status: Option<String>) {
        if self.session.status_line != status {
            self.session.status_line = status;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_error(&mut self, error: Option<String>) {
        self.session.error = error;
        self.mark_dirty();
    }

    pub(crate) fn set_counts(&mut self, new_count: u64, known_count: u64) {
        self.session.new_count = new_count;
        self.session.known_count = known_count;
        self.mark_dirty();
    }

    pub(crate) fn set_notice(&mut self, text: impl Into<String>) {
        self.notice = Some(text.into());
        self.mark_dirty();
    }

    pub(crate) fn clear_notice(&mut self) {
        if self.notice.take().is_some() {
            self.mark_dirty();
        }
    }

    /// Replace the whole result store (batch supersede / terminal result).
    /// Selection keys whose items no longer exist are pruned.
    pub(crate) fn replace_items(&mut self, items: Vec<DiscoveredItem>) {
        self.session.items = items;
        let live: BTreeSet<ItemSeq> = self.session.items.iter().map(|item| item.seq).collect();
        self.selection.retain(|seq| live.contains(seq));
        self.clamp_page();
        self.mark_dirty();
    }

    pub fn items(&self) -> &[DiscoveredItem] {
        &self.session.items
    }

    pub(crate) fn next_seq_mut(&mut self) -> &mut ItemSeq {
        &mut self.next_seq
    }

    pub fn item_by_seq(&self, seq: ItemSeq) -> Option<&DiscoveredItem> {
        self.session.items.iter().find(|item| item.seq == seq)
    }

    pub(crate) fn item_by_seq_mut(&mut self, seq: ItemSeq) -> Option<&mut DiscoveredItem> {
        self.session.items.iter_mut().find(|item| item.seq == seq)
    }

    /// Locate the item a completion callback refers to: by sequence number,
    /// else external id, else handle.
    pub(crate) fn item_for_outcome_mut(
        &mut self,
        outcome: &ActionOutcome,
    ) -> Option<&mut DiscoveredItem> {
        let idx = self.session.items.iter().position(|item| {
            if let Some(seq) = outcome.seq {
                if item.seq == seq {
                    return true;
                }
            }
            false
        });
        let idx = idx
            .or_else(|| {
                outcome.external_id.as_ref().and_then(|id| {
                    self.session
                        .items
                        .iter()
                        .position(|item| item.external_id.as_ref() == Some(id))
                })
            })
            .or_else(|| {
                outcome.handle.as_ref().and_then(|handle| {
                    self.session
                        .items
                        .iter()
                        .position(|item| item.handle.as_ref() == Some(handle))
                })
            });
        idx.map(|i| &mut self.session.items[i])
    }

    /// Whether a pending action already covers this item's identity. Guards
    /// against duplicate dispatch even across a result remap that assigned
    /// a fresh sequence number.
    pub(crate) fn pending_conflict(&self, item: &DiscoveredItem) -> bool {
        self.pending.values().any(|pending| {
            pending.seq == item.seq
                || (item.external_id.is_some() && pending.external_id == item.external_id)
                || (item.handle.is_some() && pending.handle == item.handle)
        })
    }

    pub(crate) fn insert_pending(&mut self, pending: PendingAction) {
        self.pending.insert(pending.seq, pending);
        self.mark_dirty();
    }

    /// Remove and return the pending action a completion callback refers
    /// to: by sequence number, else external id, else handle.
    pub(crate) fn remove_pending_for_outcome(
        &mut self,
        outcome: &ActionOutcome,
    ) -> Option<PendingAction> {
        let key = outcome
            .seq
            .filter(|seq| self.pending.contains_key(seq))
            .or_else(|| {
                outcome.external_id.as_ref().and_then(|id| {
                    self.pending
                        .values()
                        .find(|p| p.external_id.as_ref() == Some(id))
                        .map(|p| p.seq)
                })
            })
            .or_else(|| {
                outcome.handle.as_ref().and_then(|handle| {
                    self.pending
                        .values()
                        .find(|p| p.handle.as_ref() == Some(handle))
                        .map(|p| p.seq)
                })
            })?;
        let removed = self.pending.remove(&key);
        if removed.is_some() {
            self.mark_dirty();
        }
        removed
    }

    pub(crate) fn open_picker(&mut self, picker: AccountPicker) {
        self.picker = Some(picker);
        self.mark_dirty();
    }

    pub(crate) fn take_picker(&mut self) -> Option<AccountPicker> {
        let taken = self.picker.take();
        if taken.is_some() {
            self.mark_dirty();
        }
        taken
    }

    pub(crate) fn push_recent(&mut self, query: &str) -> bool {
        let changed = push_recent_query(
            &mut self.recent_queries,
            query,
            self.config.recent_queries_cap,
        );
        if changed {
            self.mark_dirty();
        }
        changed
    }

    pub(crate) fn set_recent(&mut self, mut list: Vec<String>) {
        list.truncate(self.config.recent_queries_cap);
        self.recent_queries = list;
        self.mark_dirty();
    }

    pub(crate) fn make_snapshot(&self, saved_at_ms: u64) -> SessionSnapshot {
        SessionSnapshot {
            query: self.session.query.clone(),
            items: self.session.items.clone(),
            new_count: self.session.new_count,
            known_count: self.session.known_count,
            saved_at_ms,
        }
    }

    /// Hydrate the result store from a fresh snapshot (startup only).
    pub(crate) fn hydrate_snapshot(&mut self, snapshot: SessionSnapshot) {
        self.session.query = snapshot.query.clone();
        self.query_input = snapshot.query;
        self.session.items = snapshot.items;
        self.session.new_count = snapshot.new_count;
        self.session.known_count = snapshot.known_count;
        self.session.phase = SessionPhase::Completed;
        self.next_seq = self
            .session
            .items
            .iter()
            .map(|item| item.seq + 1)
            .max()
            .unwrap_or(self.next_seq)
            .max(self.next_seq);
        self.mark_dirty();
    }

    // --- filter / pagination / selection ------------------------------------

    pub fn filter(&self) -> &ItemFilter {
        &self.filter
    }

    pub(crate) fn set_filter(&mut self, filter: ItemFilter) {
        self.filter = filter;
        self.clamp_page();
        self.mark_dirty();
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn filtered_count(&self) -> usize {
        filtered_items(&self.session.items, &self.filter).len()
    }

    fn clamp_page(&mut self) {
        let pages = total_pages(self.filtered_count(), self.page_size);
        if self.page > pages {
            self.page = pages;
        }
    }

    /// Request a 1-indexed page; out-of-range requests leave the page
    /// unchanged and return false.
    pub(crate) fn request_page(&mut self, page: usize) -> bool {
        let pages = total_pages(self.filtered_count(), self.page_size);
        if page == 0 || page > pages {
            return false;
        }
        self.page = page;
        self.mark_dirty();
        true
    }

    /// Change the page size; resets the page to 1. Sizes outside
    /// [`PAGE_SIZES`] are rejected.
    pub(crate) fn set_page_size(&mut self, size: usize) -> bool {
        if !PAGE_SIZES.contains(&size) {
            return false;
        }
        self.page_size = size;
        self.page = 1;
        self.mark_dirty();
        true
    }

    fn filtered_seqs(&self) -> Vec<ItemSeq> {
        filtered_items(&self.session.items, &self.filter)
            .iter()
            .map(|item| item.seq)
            .collect()
    }

    pub(crate) fn toggle_selection(&mut self, seq: ItemSeq) -> bool {
        if self.item_by_seq(seq).is_none() {
            return false;
        }
        if !self.selection.remove(&seq) {
            self.selection.insert(seq);
        }
        self.mark_dirty();
        true
    }

    pub(crate) fn select_all_visible(&mut self) {
        for seq in self.filtered_seqs() {
            self.selection.insert(seq);
        }
        self.mark_dirty();
    }

    pub(crate) fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.mark_dirty();
        }
    }

    /// Invert within the filtered view: (filtered keys) minus (current
    /// selection). Keys outside the filter are untouched.
    pub(crate) fn invert_selection(&mut self) {
        for seq in self.filtered_seqs() {
            if !self.selection.remove(&seq) {
                self.selection.insert(seq);
            }
        }
        self.mark_dirty();
    }

    // --- view derivation ----------------------------------------------------

    pub fn view(&self) -> SessionViewModel {
        let filtered = filtered_items(&self.session.items, &self.filter);
        let pages = total_pages(filtered.len(), self.page_size);
        let page = self.page.min(pages);
        let rows = page_slice(&filtered, page, self.page_size)
            .iter()
            .map(|item| ItemRowView {
                seq: item.seq,
                external_id: item.external_id.clone(),
                handle: item.handle.clone(),
                title: item.title.clone(),
                description: item.description.clone(),
                kind: item.kind,
                member_count: item.member_count,
                member_delta: item.member_delta,
                relevance: item.relevance,
                membership: item.membership,
                joined_via: item.joined_via.clone(),
                source: item.source.clone(),
                novelty: item.novelty,
                saved: item.saved,
                selected: self.selection.contains(&item.seq),
                pending: self.pending.contains_key(&item.seq),
            })
            .collect();

        let picker = self.picker.as_ref().map(|picker| PickerView {
            seq: picker.seq,
            title: self
                .item_by_seq(picker.seq)
                .map(|item| item.title.clone())
                .unwrap_or_default(),
            candidates: picker.candidates.clone(),
        });

        SessionViewModel {
            phase: self.session.phase,
            query: self.session.query.clone(),
            channels: self.session.channels.clone(),
            status_line: self.session.status_line.clone(),
            error: self.session.error.clone(),
            notice: self.notice.clone(),
            rows,
            total_count: self.session.items.len(),
            filtered_count: filtered.len(),
            page,
            page_size: self.page_size,
            total_pages: pages,
            new_count: self.session.new_count,
            known_count: self.session.known_count,
            selected_count: self.selection.len(),
            picker,
            actors: self
                .actors
                .iter()
                .map(|actor| ActorRowView {
                    id: actor.id.clone(),
                    label: actor.label.clone(),
                    ready: actor.ready,
                })
                .collect(),
            recent_queries: self.recent_queries.clone(),
            dirty: self.dirty,
        }
    }
}
