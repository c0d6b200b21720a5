use std::fmt;

/// Session-local sequence number for a discovered item. Unique within a
/// session and stable for its lifetime; the merge/track key of last resort.
pub type ItemSeq = u64;

/// Identifier of an account able to perform joins.
pub type ActorId = String;

/// Identifier of a discovery channel (search source).
pub type SourceId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Group,
    Channel,
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKind::Group => write!(f, "group"),
            GroupKind::Channel => write!(f, "channel"),
        }
    }
}

/// Join lifecycle of one item. Only ever advances
/// NotJoined -> Joining -> {Joined | NotJoined}; never regresses from Joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipState {
    NotJoined,
    Joining,
    Joined,
    Monitoring,
}

impl MembershipState {
    /// Whether this state counts as "joined" for filtering purposes.
    pub fn is_member(self) -> bool {
        matches!(self, MembershipState::Joined | MembershipState::Monitoring)
    }
}

/// Backend-asserted "new vs. already known" classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoveltyFlag {
    New,
    AlreadyKnown,
    Unknown,
}

/// One discovered group or channel.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredItem {
    pub seq: ItemSeq,
    /// Durable identity once the backend has resolved one; may arrive later
    /// than `seq`.
    pub external_id: Option<String>,
    /// Public alias/username, when the item has one.
    pub handle: Option<String>,
    pub title: String,
    pub description: String,
    pub kind: GroupKind,
    pub member_count: u64,
    /// Signed change vs. the last known count for the same track key.
    pub member_delta: Option<i64>,
    /// Backend relevance score in [0, 1].
    pub relevance: Option<f32>,
    pub membership: MembershipState,
    /// Account that performed the join, once confirmed.
    pub joined_via: Option<ActorId>,
    /// Discovery channel that produced this item.
    pub source: SourceId,
    /// Query string that produced this item.
    pub query: String,
    pub novelty: NoveltyFlag,
    /// Operator "saved" flag; survives merges and snapshots.
    pub saved: bool,
}

/// Preferred stable identity of an item: external id over handle over the
/// session-local sequence number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrackKey {
    External(String),
    Handle(String),
    Seq(ItemSeq),
}

impl DiscoveredItem {
    pub fn track_key(&self) -> TrackKey {
        if let Some(id) = &self.external_id {
            TrackKey::External(id.clone())
        } else if let Some(handle) = &self.handle {
            TrackKey::Handle(handle.clone())
        } else {
            TrackKey::Seq(self.seq)
        }
    }

    /// An item with neither external id nor handle has nothing to act on.
    pub fn actionable(&self) -> bool {
        self.external_id.is_some() || self.handle.is_some()
    }
}
