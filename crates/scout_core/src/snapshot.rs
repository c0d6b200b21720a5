use crate::item::DiscoveredItem;

/// Persisted image of a completed session. Written on every natural
/// completion, overwriting the previous one; hydrated at startup while
/// still fresh.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub query: String,
    pub items: Vec<DiscoveredItem>,
    pub new_count: u64,
    pub known_count: u64,
    pub saved_at_ms: u64,
}

impl SessionSnapshot {
    pub fn is_fresh(&self, now_ms: u64, ttl_ms: u64) -> bool {
        now_ms.saturating_sub(self.saved_at_ms) <= ttl_ms
    }
}

/// Record a query in the bounded recent-query list: most-recent-first,
/// de-duplicated by exact string match. Returns true when the list changed.
pub fn push_recent_query(list: &mut Vec<String>, query: &str, cap: usize) -> bool {
    if list.first().map(String::as_str) == Some(query) {
        return false;
    }
    list.retain(|q| q != query);
    list.insert(0, query.to_string());
    list.truncate(cap);
    true
}
