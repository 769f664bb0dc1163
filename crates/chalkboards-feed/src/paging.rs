//! "Top 5" plus a growable list over the ranked groups.
//!
//! Paging only ever slices an already ordered list, so asking for a longer
//! prefix never reorders what was returned before.

use serde::Serialize;

/// Number of groups in the highlighted "top" strip.
pub const TOP_COUNT: usize = 5;

/// Split `groups` into the top strip and everything after it.
#[must_use]
pub fn split_top<T>(groups: &[T], top: usize) -> (&[T], &[T]) {
    groups.split_at(top.min(groups.len()))
}

/// A window over an ordered list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub next_offset: Option<usize>,
}

/// Items `offset..offset + limit`, with the offset of the next page if any.
#[must_use]
pub fn page<T: Clone>(items: &[T], offset: usize, limit: usize) -> Page<T> {
    let total = items.len();
    let start = offset.min(total);
    let end = start.saturating_add(limit).min(total);
    Page {
        items: items[start..end].to_vec(),
        total,
        next_offset: (end < total).then_some(end),
    }
}

/// Restartable "show more" state: the first `page_size` items, then
/// `page_size` more on each call to [`Pager::more`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
    shown: usize,
}

impl Pager {
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_size,
            shown: page_size,
        }
    }

    /// Back to the first page, e.g. after a filter changes.
    pub fn reset(&mut self) {
        self.shown = self.page_size;
    }

    pub fn more(&mut self) {
        self.shown = self.shown.saturating_add(self.page_size);
    }

    #[must_use]
    pub fn visible<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..self.shown.min(items.len())]
    }

    #[must_use]
    pub fn has_more<T>(&self, items: &[T]) -> bool {
        items.len() > self.shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_top_handles_short_lists() {
        let items: Vec<u32> = (0..8).collect();
        let (top, rest) = split_top(&items, TOP_COUNT);
        assert_eq!(top, &[0, 1, 2, 3, 4]);
        assert_eq!(rest, &[5, 6, 7]);

        let (top, rest) = split_top(&items[..3], TOP_COUNT);
        assert_eq!(top.len(), 3);
        assert!(rest.is_empty());
    }

    #[test]
    fn pager_prefix_is_stable() {
        let items: Vec<u32> = (0..25).collect();
        let mut pager = Pager::new(10);
        let first = pager.visible(&items).to_vec();
        assert_eq!(first.len(), 10);
        assert!(pager.has_more(&items));

        pager.more();
        let second = pager.visible(&items);
        assert_eq!(second.len(), 20);
        assert_eq!(&second[..10], first.as_slice());

        pager.more();
        assert_eq!(pager.visible(&items).len(), 25);
        assert!(!pager.has_more(&items));

        pager.reset();
        assert_eq!(pager.visible(&items), first.as_slice());
    }

    #[test]
    fn page_reports_next_offset() {
        let items: Vec<u32> = (0..12).collect();
        let p = page(&items, 0, 10);
        assert_eq!(p.items.len(), 10);
        assert_eq!(p.total, 12);
        assert_eq!(p.next_offset, Some(10));

        let p = page(&items, 10, 10);
        assert_eq!(p.items, vec![10, 11]);
        assert_eq!(p.next_offset, None);

        let p = page(&items, 50, 10);
        assert!(p.items.is_empty());
        assert_eq!(p.next_offset, None);
    }
}
