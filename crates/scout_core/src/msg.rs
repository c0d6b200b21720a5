use crate::filter::ItemFilter;
use crate::item::{ActorId, ItemSeq, SourceId};
use crate::merge::RawItemRecord;
use crate::snapshot::SessionSnapshot;
use crate::state::ActorInfo;

/// Backend progress phase hint: basic result listing vs. detail enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Basic,
    Details,
}

/// Completion callback payload of one join action. Identity fields are
/// whatever the backend echoes back; matching prefers `seq`, then
/// `external_id`, then `handle`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActionOutcome {
    pub seq: Option<ItemSeq>,
    pub external_id: Option<String>,
    pub handle: Option<String>,
    pub success: bool,
    pub actor: Option<ActorId>,
    /// Fresher member count, when the backend supplies one.
    pub member_count: Option<u64>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Operator edited the query input.
    QueryChanged(String),
    /// Operator changed the set of discovery channels to search.
    ChannelsChanged(Vec<SourceId>),
    /// Operator submitted the current query.
    SearchSubmitted { now_ms: u64 },
    /// The actor directory pushed a fresh account list.
    ActorsUpdated { actors: Vec<ActorInfo>, now_ms: u64 },
    /// Early cumulative listing; supersedes any previous batch.
    BatchReceived {
        records: Vec<RawItemRecord>,
        source_label: String,
        status: Option<String>,
        now_ms: u64,
    },
    /// Backend phase/status signal.
    ProgressReceived {
        phase: ProgressPhase,
        status: Option<String>,
        now_ms: u64,
    },
    /// Terminal result listing.
    ResultReceived {
        records: Vec<RawItemRecord>,
        new_count: u64,
        known_count: u64,
        now_ms: u64,
    },
    /// Terminal backend failure.
    ErrorReceived { message: String, now_ms: u64 },
    /// Recurring watchdog poll while a search is armed.
    WatchdogTick { now_ms: u64 },
    /// Operator asked to join a discovered item.
    JoinRequested { seq: ItemSeq },
    /// Operator picked an account in the selection sub-flow.
    ActorPicked { actor: ActorId },
    /// Operator dismissed the selection sub-flow.
    PickerCancelled,
    /// Join completion callback from the backend.
    ActionCompleted { outcome: ActionOutcome, now_ms: u64 },
    /// Operator toggled the saved flag on an item.
    SaveToggled { seq: ItemSeq },
    /// Operator replaced the filter set.
    FiltersChanged(ItemFilter),
    /// Operator requested a 1-indexed page of the filtered view.
    PageRequested(usize),
    /// Operator changed the page size.
    PageSizeChanged(usize),
    /// Operator toggled one row in the selection set.
    SelectionToggled { seq: ItemSeq },
    /// Select every row of the filtered view.
    SelectAllVisible,
    /// Empty the selection set.
    ClearSelection,
    /// Invert the selection within the filtered view.
    InvertSelection,
    /// Operator asked for an export of the current filtered view.
    ExportRequested,
    /// Snapshot read from the session store at startup.
    SnapshotLoaded {
        snapshot: SessionSnapshot,
        now_ms: u64,
    },
    /// Recent-query list read from the store at startup.
    RecentQueriesLoaded(Vec<String>),
    /// Fallback for placeholder wiring.
    NoOp,
}
