//! Scout core: pure search-session state machine and view derivation.
//!
//! Everything in this crate is deterministic and free of I/O; clocks arrive
//! inside messages, side effects leave as [`Effect`] values for the platform
//! layer to execute.
mod effect;
mod filter;
mod item;
mod merge;
mod msg;
mod snapshot;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use filter::{filtered_items, page_slice, total_pages, ItemFilter, MembershipBucket, PAGE_SIZES};
pub use item::{
    ActorId, DiscoveredItem, GroupKind, ItemSeq, MembershipState, NoveltyFlag, SourceId, TrackKey,
};
pub use merge::{map_records, RawItemRecord};
pub use msg::{ActionOutcome, Msg, ProgressPhase};
pub use snapshot::{push_recent_query, SessionSnapshot};
pub use state::{
    AccountPicker, ActorInfo, AppState, CoreConfig, PendingAction, SearchSession, SessionPhase,
};
pub use update::update;
pub use view_model::{ActorRowView, ItemRowView, PickerView, SessionViewModel};
