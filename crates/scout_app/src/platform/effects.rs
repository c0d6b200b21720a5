use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use scout_core::{
    ActionOutcome, ActorInfo, AppState, Effect, GroupKind, MembershipState, Msg, ProgressPhase,
    RawItemRecord,
};
use scout_engine::{
    epoch_ms, BackendEvent, BridgeError, ClientCommand, EngineConfig, EngineEvent, EngineHandle,
    SessionStore, WireGroup, WireKind, WirePhase,
};
use scout_logging::{scout_error, scout_info};

use super::app::AppMsg;

/// Executes core effects against the engine and store, and translates
/// engine events back into core messages.
pub struct EffectRunner {
    engine: Arc<EngineHandle>,
    store: Box<dyn SessionStore>,
    export_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(
        config: EngineConfig,
        store: Box<dyn SessionStore>,
        export_dir: PathBuf,
        msg_tx: mpsc::Sender<AppMsg>,
    ) -> Result<Self, BridgeError> {
        let engine = Arc::new(EngineHandle::new(config)?);
        spawn_event_loop(engine.clone(), msg_tx);
        Ok(Self {
            engine,
            store,
            export_dir,
        })
    }

    /// Feed persisted state into the dispatch loop at startup.
    pub fn load_startup(&self, msg_tx: &mpsc::Sender<AppMsg>) {
        if let Some(snapshot) = self.store.load_snapshot() {
            let _ = msg_tx.send(AppMsg::Core(Msg::SnapshotLoaded {
                snapshot,
                now_ms: epoch_ms(),
            }));
        }
        let recent = self.store.load_recent_queries();
        if !recent.is_empty() {
            let _ = msg_tx.send(AppMsg::Core(Msg::RecentQueriesLoaded(recent)));
        }
    }

    pub fn run(&self, effects: Vec<Effect>, state: &AppState) {
        for effect in effects {
            match effect {
                Effect::StartSearch {
                    query,
                    channels,
                    actor,
                    limit,
                } => {
                    scout_info!("start-search: query={:?} channels={:?}", query, channels);
                    self.engine.send(ClientCommand::StartSearch {
                        query,
                        channels,
                        actor_id: actor,
                        limit,
                    });
                }
                Effect::StartAction {
                    seq,
                    external_id,
                    handle,
                    actor,
                } => {
                    scout_info!("start-action: seq={} actor={}", seq, actor);
                    self.engine.send(ClientCommand::StartAction {
                        item_id: Some(seq),
                        external_id,
                        handle,
                        actor_id: actor,
                    });
                }
                Effect::ArmWatchdog => self.engine.arm_watchdog(),
                Effect::DisarmWatchdog => self.engine.disarm_watchdog(),
                Effect::PersistSnapshot(snapshot) => self.store.save_snapshot(&snapshot),
                Effect::ClearSnapshot => self.store.clear_snapshot(),
                Effect::PersistRecentQueries(list) => self.store.save_recent_queries(&list),
                Effect::ExportView => self.export_view(state),
            }
        }
    }

    fn export_view(&self, state: &AppState) {
        let rows: Vec<scout_engine::ExportRow> =
            scout_core::filtered_items(state.items(), state.filter())
                .into_iter()
                .map(|item| scout_engine::ExportRow {
                    seq: item.seq,
                    external_id: item.external_id.clone(),
                    title: item.title.clone(),
                    handle: item.handle.clone(),
                    kind: item.kind.to_string(),
                    member_count: item.member_count,
                    description: item.description.clone(),
                    source: item.source.clone(),
                })
                .collect();
        let options = scout_engine::ExportOptions {
            generated_at: Utc::now().to_rfc3339(),
            ..Default::default()
        };
        match scout_engine::write_table(&self.export_dir, &rows, &options) {
            Ok(summary) => {
                scout_info!("export written: {:?}", summary.output_path);
                println!(
                    "exported {} rows to {}",
                    summary.row_count,
                    summary.output_path.display()
                );
            }
            Err(err) => {
                scout_error!("export failed: {}", err);
                println!("export failed: {err}");
            }
        }
    }
}

fn spawn_event_loop(engine: Arc<EngineHandle>, msg_tx: mpsc::Sender<AppMsg>) {
    thread::spawn(move || loop {
        if let Some(event) = engine.try_recv() {
            if msg_tx.send(AppMsg::Core(map_event(event))).is_err() {
                break;
            }
        } else {
            thread::sleep(Duration::from_millis(20));
        }
    });
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::WatchdogTick { now_ms } => Msg::WatchdogTick { now_ms },
        EngineEvent::Backend(event) => map_backend(event),
        EngineEvent::CommandFailed { command, message } => match command {
            ClientCommand::StartSearch { .. } => Msg::ErrorReceived {
                message: format!("could not reach backend: {message}"),
                now_ms: epoch_ms(),
            },
            ClientCommand::StartAction {
                item_id,
                external_id,
                handle,
                actor_id,
            } => Msg::ActionCompleted {
                outcome: ActionOutcome {
                    seq: item_id,
                    external_id,
                    handle,
                    success: false,
                    actor: Some(actor_id),
                    member_count: None,
                    message: Some(message),
                },
                now_ms: epoch_ms(),
            },
        },
    }
}

fn map_backend(event: BackendEvent) -> Msg {
    let now_ms = epoch_ms();
    match event {
        BackendEvent::Batch {
            items,
            source_label,
            status_message,
        } => Msg::BatchReceived {
            records: items.into_iter().map(map_group).collect(),
            source_label,
            status: status_message,
            now_ms,
        },
        BackendEvent::Progress {
            phase,
            status_message,
        } => Msg::ProgressReceived {
            phase: match phase {
                WirePhase::Basic => ProgressPhase::Basic,
                WirePhase::Details => ProgressPhase::Details,
            },
            status: status_message,
            now_ms,
        },
        BackendEvent::Result {
            items,
            new_count,
            known_count,
        } => Msg::ResultReceived {
            records: items.into_iter().map(map_group).collect(),
            new_count,
            known_count,
            now_ms,
        },
        BackendEvent::Error { message } => Msg::ErrorReceived { message, now_ms },
        BackendEvent::ActionComplete {
            item_id,
            external_id,
            handle,
            success,
            actor_id,
            member_count,
            message,
        } => Msg::ActionCompleted {
            outcome: ActionOutcome {
                seq: item_id,
                external_id,
                handle,
                success,
                actor: actor_id,
                member_count,
                message,
            },
            now_ms,
        },
        BackendEvent::Actors { actors } => Msg::ActorsUpdated {
            actors: actors
                .into_iter()
                .map(|actor| ActorInfo {
                    id: actor.id,
                    label: actor.label,
                    ready: actor.ready,
                })
                .collect(),
            now_ms,
        },
    }
}

fn map_group(group: WireGroup) -> RawItemRecord {
    RawItemRecord {
        external_id: group.external_id,
        handle: group.handle,
        title: group.title,
        description: group.description,
        kind: match group.kind {
            WireKind::Group => GroupKind::Group,
            WireKind::Channel => GroupKind::Channel,
        },
        member_count: group.member_count,
        participant_count: group.participants_count,
        relevance: group.relevance,
        membership: group.membership.as_deref().map(|value| match value {
            "joined" => MembershipState::Joined,
            "monitoring" => MembershipState::Monitoring,
            _ => MembershipState::NotJoined,
        }),
        is_new: group.is_new,
        source: group.source,
    }
}
