use crate::item::{ActorId, GroupKind, ItemSeq, MembershipState, NoveltyFlag, SourceId};
use crate::state::SessionPhase;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionViewModel {
    pub phase: SessionPhase,
    pub query: String,
    pub channels: Vec<SourceId>,
    pub status_line: Option<String>,
    pub error: Option<String>,
    pub notice: Option<String>,
    /// Rows of the current page of the filtered view.
    pub rows: Vec<ItemRowView>,
    pub total_count: usize,
    pub filtered_count: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub new_count: u64,
    pub known_count: u64,
    pub selected_count: usize,
    pub picker: Option<PickerView>,
    pub actors: Vec<ActorRowView>,
    pub recent_queries: Vec<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemRowView {
    pub seq: ItemSeq,
    pub external_id: Option<String>,
    pub handle: Option<String>,
    pub title: String,
    pub description: String,
    pub kind: GroupKind,
    pub member_count: u64,
    pub member_delta: Option<i64>,
    pub relevance: Option<f32>,
    pub membership: MembershipState,
    pub joined_via: Option<ActorId>,
    pub source: SourceId,
    pub novelty: NoveltyFlag,
    pub saved: bool,
    pub selected: bool,
    /// A join is currently in flight for this item.
    pub pending: bool,
}

/// The account-selection sub-flow, while open.
#[derive(Debug, Clone, PartialEq)]
pub struct PickerView {
    pub seq: ItemSeq,
    pub title: String,
    pub candidates: Vec<ActorId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActorRowView {
    pub id: ActorId,
    pub label: String,
    pub ready: bool,
}
