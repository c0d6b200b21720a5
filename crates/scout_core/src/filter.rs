//! Filter composition and pagination over the result store. Pure: never
//! mutates, only derives.

use crate::item::{DiscoveredItem, GroupKind, SourceId};

/// Page sizes the view accepts.
pub const PAGE_SIZES: [usize; 4] = [10, 25, 50, 100];

/// Membership bucket for filtering: `Joined` covers Joined and Monitoring,
/// `NotJoined` covers everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipBucket {
    Joined,
    NotJoined,
}

/// Filter predicates, AND-composed. `None` (or a zero bound) means the
/// predicate is not applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemFilter {
    pub kind: Option<GroupKind>,
    pub min_members: Option<u64>,
    pub max_members: Option<u64>,
    pub source: Option<SourceId>,
    pub membership: Option<MembershipBucket>,
    pub only_with_external_id: bool,
}

impl ItemFilter {
    pub fn matches(&self, item: &DiscoveredItem) -> bool {
        if let Some(kind) = self.kind {
            if item.kind != kind {
                return false;
            }
        }
        if let Some(min) = self.min_members {
            if min > 0 && item.member_count < min {
                return false;
            }
        }
        if let Some(max) = self.max_members {
            if max > 0 && item.member_count > max {
                return false;
            }
        }
        if let Some(source) = &self.source {
            if &item.source != source {
                return false;
            }
        }
        if let Some(bucket) = self.membership {
            let joined = item.membership.is_member();
            match bucket {
                MembershipBucket::Joined if !joined => return false,
                MembershipBucket::NotJoined if joined => return false,
                _ => {}
            }
        }
        if self.only_with_external_id && item.external_id.is_none() {
            return false;
        }
        true
    }
}

pub fn filtered_items<'a>(items: &'a [DiscoveredItem], filter: &ItemFilter) -> Vec<&'a DiscoveredItem> {
    items.iter().filter(|item| filter.matches(item)).collect()
}

/// `max(1, ceil(filtered / page_size))`. A page size of zero never occurs
/// (sizes come from [`PAGE_SIZES`]).
pub fn total_pages(filtered_count: usize, page_size: usize) -> usize {
    filtered_count.div_ceil(page_size).max(1)
}

/// Slice of the filtered view for a 1-indexed page.
pub fn page_slice<'a, 'b>(
    filtered: &'b [&'a DiscoveredItem],
    page: usize,
    page_size: usize,
) -> &'b [&'a DiscoveredItem] {
    let start = (page - 1) * page_size;
    if start >= filtered.len() {
        return &[];
    }
    let end = (start + page_size).min(filtered.len());
    &filtered[start..end]
}
