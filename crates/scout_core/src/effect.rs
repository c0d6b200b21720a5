use crate::item::{ActorId, ItemSeq, SourceId};
use crate::snapshot::SessionSnapshot;

/// Side effects requested by the update function; the platform layer
/// executes them.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send the start-search command on the event channel.
    StartSearch {
        query: String,
        channels: Vec<SourceId>,
        actor: ActorId,
        limit: u32,
    },
    /// Send a join command for one item on the event channel.
    StartAction {
        seq: ItemSeq,
        external_id: Option<String>,
        handle: Option<String>,
        actor: ActorId,
    },
    /// Begin the recurring watchdog check.
    ArmWatchdog,
    /// Cancel the recurring watchdog check outright.
    DisarmWatchdog,
    /// Write the completed-session snapshot to the session store.
    PersistSnapshot(SessionSnapshot),
    /// Delete a stale snapshot from the session store.
    ClearSnapshot,
    /// Write the recent-query list to the session store.
    PersistRecentQueries(Vec<String>),
    /// Export the currently filtered view.
    ExportView,
}
