use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands sent to the backend over the event channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientCommand {
    StartSearch {
        query: String,
        channels: Vec<String>,
        actor_id: String,
        limit: u32,
    },
    StartAction {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_id: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        external_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        handle: Option<String>,
        actor_id: String,
    },
}

/// Progress phase hint: basic listing vs. detail enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WirePhase {
    Basic,
    Details,
}

/// Events streamed by the backend. Every inbound event counts as a
/// heartbeat regardless of type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BackendEvent {
    /// Early cumulative listing; supersedes any previous batch.
    Batch {
        items: Vec<WireGroup>,
        source_label: String,
        #[serde(default)]
        status_message: Option<String>,
    },
    Progress {
        phase: WirePhase,
        #[serde(default)]
        status_message: Option<String>,
    },
    /// Terminal success.
    Result {
        items: Vec<WireGroup>,
        new_count: u64,
        known_count: u64,
    },
    /// Terminal failure.
    Error { message: String },
    /// Completion callback of one join action.
    ActionComplete {
        #[serde(default)]
        item_id: Option<u64>,
        #[serde(default)]
        external_id: Option<String>,
        #[serde(default)]
        handle: Option<String>,
        success: bool,
        #[serde(default)]
        actor_id: Option<String>,
        #[serde(default)]
        member_count: Option<u64>,
        #[serde(default)]
        message: Option<String>,
    },
    /// Reactive actor-directory push.
    Actors { actors: Vec<WireActor> },
}

/// One discovered group/channel as the backend reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireGroup {
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub kind: WireKind,
    /// Primary member-count field.
    #[serde(default)]
    pub member_count: Option<u64>,
    /// Legacy field still emitted by older backends.
    #[serde(default)]
    pub participants_count: Option<u64>,
    #[serde(default)]
    pub relevance: Option<f32>,
    /// "joined" or "monitoring" when the backend asserts membership.
    #[serde(default)]
    pub membership: Option<String>,
    #[serde(default)]
    pub is_new: Option<bool>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WireKind {
    #[default]
    Group,
    Channel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireActor {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub ready: bool,
}

/// Events the engine surfaces to the app.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Backend(BackendEvent),
    /// Recurring watchdog poll, emitted only while armed.
    WatchdogTick { now_ms: u64 },
    /// A command could not be delivered to the backend.
    CommandFailed {
        command: ClientCommand,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timeout")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed event: {0}")]
    Decode(String),
}
