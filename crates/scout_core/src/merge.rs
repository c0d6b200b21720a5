//! Mapping of raw backend records into [`DiscoveredItem`]s, including the
//! carry-forward rules applied when a batch or result listing replaces the
//! current store.

use std::collections::BTreeMap;

use crate::item::{
    DiscoveredItem, GroupKind, ItemSeq, MembershipState, NoveltyFlag, SourceId, TrackKey,
};

/// One record as reported by the backend, before merge rules are applied.
/// Optional fields are exactly the ones the backend may omit.
#[derive(Debug, Clone, PartialEq)]
pub struct RawItemRecord {
    pub external_id: Option<String>,
    pub handle: Option<String>,
    pub title: String,
    pub description: String,
    pub kind: GroupKind,
    /// Primary member-count field.
    pub member_count: Option<u64>,
    /// Legacy participant-count field, consulted when the primary is absent.
    pub participant_count: Option<u64>,
    pub relevance: Option<f32>,
    /// Membership as asserted by the backend; `None` means "not reported".
    pub membership: Option<MembershipState>,
    /// Explicit novelty indicator; `None` means "not asserted".
    pub is_new: Option<bool>,
    /// Per-record discovery channel, when the backend includes one.
    pub source: Option<SourceId>,
}

impl Default for RawItemRecord {
    fn default() -> Self {
        Self {
            external_id: None,
            handle: None,
            title: String::new(),
            description: String::new(),
            kind: GroupKind::Group,
            member_count: None,
            participant_count: None,
            relevance: None,
            membership: None,
            is_new: None,
            source: None,
        }
    }
}

/// Map a full listing into discovered items, assigning fresh sequence
/// numbers in arrival order and carrying forward per-item state from the
/// superseded listing by track key: the saved flag, the member-count delta
/// against the last known value, locally-won membership (a join confirmed
/// this session never regresses because a re-mapped record omitted it),
/// and an earlier novelty assertion.
pub fn map_records(
    records: Vec<RawItemRecord>,
    previous: &[DiscoveredItem],
    next_seq: &mut ItemSeq,
    fallback_source: &str,
    query: &str,
) -> Vec<DiscoveredItem> {
    let prior: BTreeMap<TrackKey, &DiscoveredItem> =
        previous.iter().map(|item| (item.track_key(), item)).collect();

    records
        .into_iter()
        .map(|record| {
            let seq = *next_seq;
            *next_seq += 1;
            let mut item = map_record(record, seq, fallback_source, query);
            if let Some(prev) = prior.get(&item.track_key()) {
                carry_forward(&mut item, prev);
            }
            item
        })
        .collect()
}

fn map_record(record: RawItemRecord, seq: ItemSeq, fallback_source: &str, query: &str) -> DiscoveredItem {
    let member_count = record
        .member_count
        .or(record.participant_count)
        .unwrap_or(0);
    let novelty = match record.is_new {
        Some(true) => NoveltyFlag::New,
        Some(false) => NoveltyFlag::AlreadyKnown,
        None => NoveltyFlag::Unknown,
    };
    DiscoveredItem {
        seq,
        external_id: record.external_id,
        handle: record.handle,
        title: record.title,
        description: record.description,
        kind: record.kind,
        member_count,
        member_delta: None,
        relevance: record.relevance,
        membership: record.membership.unwrap_or(MembershipState::NotJoined),
        joined_via: None,
        source: record.source.unwrap_or_else(|| fallback_source.to_string()),
        query: query.to_string(),
        novelty,
        saved: false,
    }
}

fn carry_forward(item: &mut DiscoveredItem, prev: &DiscoveredItem) {
    item.saved = prev.saved;
    if item.member_count != prev.member_count {
        item.member_delta = Some(item.member_count as i64 - prev.member_count as i64);
    }
    // Membership won locally outranks an unreported or weaker backend value.
    if item.membership == MembershipState::NotJoined
        && prev.membership != MembershipState::NotJoined
    {
        item.membership = prev.membership;
        item.joined_via = prev.joined_via.clone();
    }
    if item.novelty == NoveltyFlag::Unknown {
        item.novelty = prev.novelty;
    }
}
