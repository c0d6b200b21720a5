//! Line-based operator console: command parsing and plain-text rendering.
//! Parsing is pure; rendering carries no orchestration logic.

use scout_core::{
    GroupKind, ItemFilter, MembershipBucket, MembershipState, Msg, NoveltyFlag, SessionViewModel,
};

/// One parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Core messages to dispatch, in order.
    Msgs(Vec<Msg>),
    /// Re-print the full view including actors and recent queries.
    Show,
    Help,
    Quit,
    Unknown(String),
}

/// Parse one operator line. `now_ms` stamps messages that carry a clock.
pub fn parse(line: &str, now_ms: u64) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Msgs(Vec::new());
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word {
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "status" | "actors" | "queries" => Command::Show,
        "search" => {
            if rest.is_empty() {
                // An empty submit still goes through so validation surfaces
                // its notice.
                Command::Msgs(vec![Msg::SearchSubmitted { now_ms }])
            } else {
                Command::Msgs(vec![
                    Msg::QueryChanged(rest.to_string()),
                    Msg::SearchSubmitted { now_ms },
                ])
            }
        }
        "channels" => {
            let channels: Vec<String> = rest
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(ToOwned::to_owned)
                .collect();
            Command::Msgs(vec![Msg::ChannelsChanged(channels)])
        }
        "join" => parse_seq(rest).map_or_else(
            || Command::Unknown(line.to_string()),
            |seq| Command::Msgs(vec![Msg::JoinRequested { seq }]),
        ),
        "pick" => {
            if rest.is_empty() {
                Command::Unknown(line.to_string())
            } else {
                Command::Msgs(vec![Msg::ActorPicked {
                    actor: rest.to_string(),
                }])
            }
        }
        "back" => Command::Msgs(vec![Msg::PickerCancelled]),
        "save" => parse_seq(rest).map_or_else(
            || Command::Unknown(line.to_string()),
            |seq| Command::Msgs(vec![Msg::SaveToggled { seq }]),
        ),
        "filter" => parse_filter(rest).map_or_else(
            || Command::Unknown(line.to_string()),
            |filter| Command::Msgs(vec![Msg::FiltersChanged(filter)]),
        ),
        "page" => parse_seq(rest).map_or_else(
            || Command::Unknown(line.to_string()),
            |page| Command::Msgs(vec![Msg::PageRequested(page as usize)]),
        ),
        "pagesize" => parse_seq(rest).map_or_else(
            || Command::Unknown(line.to_string()),
            |size| Command::Msgs(vec![Msg::PageSizeChanged(size as usize)]),
        ),
        "sel" => parse_seq(rest).map_or_else(
            || Command::Unknown(line.to_string()),
            |seq| Command::Msgs(vec![Msg::SelectionToggled { seq }]),
        ),
        "selall" => Command::Msgs(vec![Msg::SelectAllVisible]),
        "selnone" => Command::Msgs(vec![Msg::ClearSelection]),
        "selinv" => Command::Msgs(vec![Msg::InvertSelection]),
        "export" => Command::Msgs(vec![Msg::ExportRequested]),
        _ => Command::Unknown(line.to_string()),
    }
}

fn parse_seq(text: &str) -> Option<u64> {
    text.parse().ok()
}

/// `filter clear` resets; otherwise space-separated `key=value` pairs
/// (kind, min, max, source, membership) plus the bare `hasid` toggle
/// replace the filter set.
fn parse_filter(rest: &str) -> Option<ItemFilter> {
    if rest == "clear" || rest.is_empty() {
        return Some(ItemFilter::default());
    }
    let mut filter = ItemFilter::default();
    for token in rest.split_whitespace() {
        if token == "hasid" {
            filter.only_with_external_id = true;
            continue;
        }
        let (key, value) = token.split_once('=')?;
        match key {
            "kind" => {
                filter.kind = Some(match value {
                    "group" => GroupKind::Group,
                    "channel" => GroupKind::Channel,
                    _ => return None,
                });
            }
            "min" => filter.min_members = Some(value.parse().ok()?),
            "max" => filter.max_members = Some(value.parse().ok()?),
            "source" => filter.source = Some(value.to_string()),
            "membership" => {
                filter.membership = Some(match value {
                    "joined" => MembershipBucket::Joined,
                    "not_joined" => MembershipBucket::NotJoined,
                    _ => return None,
                });
            }
            _ => return None,
        }
    }
    Some(filter)
}

pub const HELP: &str = "\
commands:
  search <query>        submit a search over the selected channels
  channels <a,b,...>    set the discovery channels
  join <seq>            join a discovered item
  pick <actor>          choose an account in the selection sub-flow
  back                  dismiss the selection sub-flow
  filter k=v ...        kind=, min=, max=, source=, membership=, hasid; 'filter clear'
  page <n> / pagesize <n>
  sel <seq> / selall / selnone / selinv
  save <seq>            toggle the saved flag
  export                write the filtered view to a table
  status                print the full view
  quit";

/// Print the regular view: summary line, notices, rows, picker prompt.
pub fn render(view: &SessionViewModel) {
    println!(
        "[{}] {:?}  {} shown / {} total  page {}/{}  selected {}  new {} / known {}",
        view.phase,
        view.query,
        view.filtered_count,
        view.total_count,
        view.page,
        view.total_pages,
        view.selected_count,
        view.new_count,
        view.known_count,
    );
    if let Some(status) = &view.status_line {
        println!("  status: {status}");
    }
    if let Some(error) = &view.error {
        println!("  error: {error}");
    }
    if let Some(notice) = &view.notice {
        println!("  {notice}");
    }
    for row in &view.rows {
        println!("  {}", format_row(row));
    }
    if let Some(picker) = &view.picker {
        println!(
            "  choose an account to join {:?}: {}  (pick <actor> / back)",
            picker.title,
            picker.candidates.join(", ")
        );
    }
}

/// Print everything `render` shows plus actors and recent queries.
pub fn render_full(view: &SessionViewModel) {
    render(view);
    println!("  actors:");
    for actor in &view.actors {
        let state = if actor.ready { "ready" } else { "not ready" };
        println!("    {} ({}) - {}", actor.id, actor.label, state);
    }
    if !view.recent_queries.is_empty() {
        println!("  recent queries: {}", view.recent_queries.join(", "));
    }
}

fn format_row(row: &scout_core::ItemRowView) -> String {
    let sel = if row.selected { "*" } else { " " };
    let saved = if row.saved { "s" } else { " " };
    let membership = match row.membership {
        MembershipState::NotJoined => "",
        MembershipState::Joining => " [joining]",
        MembershipState::Joined => " [joined]",
        MembershipState::Monitoring => " [monitoring]",
    };
    let pending = if row.pending { " [pending]" } else { "" };
    let novelty = match row.novelty {
        NoveltyFlag::New => " NEW",
        NoveltyFlag::AlreadyKnown => "",
        NoveltyFlag::Unknown => "",
    };
    let delta = row
        .member_delta
        .map(|d| format!(" ({d:+})"))
        .unwrap_or_default();
    let handle = row
        .handle
        .as_deref()
        .map(|h| format!(" @{h}"))
        .unwrap_or_default();
    format!(
        "{:>4} {}{} {:<8} {}{} {} members{}{}{}{}  [{}]",
        row.seq,
        sel,
        saved,
        row.kind.to_string(),
        row.title,
        handle,
        row.member_count,
        delta,
        membership,
        pending,
        novelty,
        row.source,
    )
}
