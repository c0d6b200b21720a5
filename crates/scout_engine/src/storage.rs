//! The persistence port: one snapshot key, one recent-queries key, RON on
//! disk behind atomic writes. Failures here are logged and swallowed; they
//! never block the search flow.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use scout_logging::{scout_info, scout_warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use scout_core::{
    DiscoveredItem, GroupKind, MembershipState, NoveltyFlag, SessionSnapshot,
};

const SNAPSHOT_FILENAME: &str = ".scout_session.ron";
const RECENT_FILENAME: &str = ".scout_queries.ron";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state directory missing or not writable: {0}")]
    StateDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("encode error: {0}")]
    Encode(String),
}

/// Ensure the state directory exists; create if missing.
pub fn ensure_state_dir(dir: &Path) -> Result<(), StoreError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| StoreError::StateDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(StoreError::StateDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| StoreError::StateDir(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| StoreError::StateDir(e.to_string()))?;
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file
/// then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, StoreError> {
        ensure_state_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // Replace existing file if present to keep determinism.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| StoreError::Io(e.error))?;
        Ok(target)
    }
}

/// Durable session-scoped storage, injected into the app rather than
/// accessed as an ambient global.
pub trait SessionStore: Send {
    fn load_snapshot(&self) -> Option<SessionSnapshot>;
    fn save_snapshot(&self, snapshot: &SessionSnapshot);
    fn clear_snapshot(&self);
    fn load_recent_queries(&self) -> Vec<String>;
    fn save_recent_queries(&self, queries: &[String]);
}

// On-disk mirrors of the core types, kept separate so the core crate stays
// serialization-free.

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedItem {
    seq: u64,
    external_id: Option<String>,
    handle: Option<String>,
    title: String,
    description: String,
    kind: String,
    member_count: u64,
    member_delta: Option<i64>,
    relevance: Option<f32>,
    membership: String,
    joined_via: Option<String>,
    source: String,
    query: String,
    novelty: String,
    saved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSnapshot {
    query: String,
    items: Vec<PersistedItem>,
    new_count: u64,
    known_count: u64,
    saved_at_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedQueries {
    queries: Vec<String>,
}

fn encode_item(item: &DiscoveredItem) -> PersistedItem {
    PersistedItem {
        seq: item.seq,
        external_id: item.external_id.clone(),
        handle: item.handle.clone(),
        title: item.title.clone(),
        description: item.description.clone(),
        kind: item.kind.to_string(),
        member_count: item.member_count,
        member_delta: item.member_delta,
        relevance: item.relevance,
        membership: match item.membership {
            MembershipState::NotJoined => "not-joined",
            MembershipState::Joining => "joining",
            MembershipState::Joined => "joined",
            MembershipState::Monitoring => "monitoring",
        }
        .to_string(),
        joined_via: item.joined_via.clone(),
        source: item.source.clone(),
        query: item.query.clone(),
        novelty: match item.novelty {
            NoveltyFlag::New => "new",
            NoveltyFlag::AlreadyKnown => "known",
            NoveltyFlag::Unknown => "unknown",
        }
        .to_string(),
        saved: item.saved,
    }
}

fn decode_item(item: PersistedItem) -> DiscoveredItem {
    DiscoveredItem {
        seq: item.seq,
        external_id: item.external_id,
        handle: item.handle,
        title: item.title,
        description: item.description,
        kind: match item.kind.as_str() {
            "channel" => GroupKind::Channel,
            _ => GroupKind::Group,
        },
        member_count: item.member_count,
        member_delta: item.member_delta,
        relevance: item.relevance,
        membership: match item.membership.as_str() {
            "joined" => MembershipState::Joined,
            "monitoring" => MembershipState::Monitoring,
            // An in-flight join does not survive a restart.
            _ => MembershipState::NotJoined,
        },
        joined_via: item.joined_via,
        source: item.source,
        query: item.query,
        novelty: match item.novelty.as_str() {
            "new" => NoveltyFlag::New,
            "known" => NoveltyFlag::AlreadyKnown,
            _ => NoveltyFlag::Unknown,
        },
        saved: item.saved,
    }
}

/// RON-file implementation of [`SessionStore`].
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn read_file(&self, filename: &str) -> Option<String> {
        let path = self.dir.join(filename);
        match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                scout_warn!("failed to read {:?}: {}", path, err);
                None
            }
        }
    }

    fn write_file(&self, filename: &str, value: &impl Serialize) {
        let pretty = ron::ser::PrettyConfig::new();
        let content = match ron::ser::to_string_pretty(value, pretty) {
            Ok(text) => text,
            Err(err) => {
                scout_warn!("failed to serialize {}: {}", filename, err);
                return;
            }
        };
        let writer = AtomicFileWriter::new(self.dir.clone());
        if let Err(err) = writer.write(filename, &content) {
            scout_warn!("failed to write {:?}: {}", self.dir.join(filename), err);
        }
    }
}

impl SessionStore for FileStore {
    fn load_snapshot(&self) -> Option<SessionSnapshot> {
        let content = self.read_file(SNAPSHOT_FILENAME)?;
        let persisted: PersistedSnapshot = match ron::from_str(&content) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                scout_warn!("failed to parse persisted snapshot: {}", err);
                return None;
            }
        };
        Some(SessionSnapshot {
            query: persisted.query,
            items: persisted.items.into_iter().map(decode_item).collect(),
            new_count: persisted.new_count,
            known_count: persisted.known_count,
            saved_at_ms: persisted.saved_at_ms,
        })
    }

    fn save_snapshot(&self, snapshot: &SessionSnapshot) {
        let persisted = PersistedSnapshot {
            query: snapshot.query.clone(),
            items: snapshot.items.iter().map(encode_item).collect(),
            new_count: snapshot.new_count,
            known_count: snapshot.known_count,
            saved_at_ms: snapshot.saved_at_ms,
        };
        self.write_file(SNAPSHOT_FILENAME, &persisted);
        scout_info!(
            "snapshot saved: {} items for query {:?}",
            snapshot.items.len(),
            snapshot.query
        );
    }

    fn clear_snapshot(&self) {
        let path = self.dir.join(SNAPSHOT_FILENAME);
        match fs::remove_file(&path) {
            Ok(()) => scout_info!("stale snapshot deleted"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => scout_warn!("failed to delete snapshot {:?}: {}", path, err),
        }
    }

    fn load_recent_queries(&self) -> Vec<String> {
        let Some(content) = self.read_file(RECENT_FILENAME) else {
            return Vec::new();
        };
        match ron::from_str::<PersistedQueries>(&content) {
            Ok(persisted) => persisted.queries,
            Err(err) => {
                scout_warn!("failed to parse recent queries: {}", err);
                Vec::new()
            }
        }
    }

    fn save_recent_queries(&self, queries: &[String]) {
        self.write_file(
            RECENT_FILENAME,
            &PersistedQueries {
                queries: queries.to_vec(),
            },
        );
    }
}
