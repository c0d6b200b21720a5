//! Scout engine: the asynchronous side of the orchestrator. Owns the event
//! channel to the backend, the watchdog ticker, the persistence port, and
//! the export writer.
mod bridge;
mod engine;
mod export;
mod storage;
mod types;

pub use bridge::{
    run_event_pump, Bridge, BridgeSettings, ChannelEventSink, EventSink, HttpBridge,
};
pub use engine::{epoch_ms, EngineConfig, EngineHandle};
pub use export::{write_table, ExportError, ExportOptions, ExportRow, ExportSummary};
pub use storage::{ensure_state_dir, AtomicFileWriter, FileStore, SessionStore, StoreError};
pub use types::{
    BackendEvent, BridgeError, ClientCommand, EngineEvent, WireActor, WireGroup, WireKind,
    WirePhase,
};
