//! Page slicing

use ztable_core::PageMeta;

/// Number of pages needed for `total` items at `limit` per page
pub fn total_pages(total: u64, limit: u64) -> u64 {
    total.div_ceil(limit.max(1))
}

/// Slice one page out of an already filtered and sorted collection.
///
/// `page` and `limit` are clamped to at least 1. Pages past the end are empty.
pub fn paginate<T: Clone>(items: &[T], page: u64, limit: u64) -> (Vec<T>, PageMeta) {
    let page = page.max(1);
    let limit = limit.max(1);
    let total = items.len() as u64;
    let offset = (page - 1).saturating_mul(limit);

    let slice = usize::try_from(offset)
        .ok()
        .and_then(|start| items.get(start..))
        .map(|rest| rest.iter().take(limit as usize).cloned().collect())
        .unwrap_or_default();

    let meta = PageMeta {
        total,
        page,
        limit,
        total_pages: total_pages(total, limit),
    };
    (slice, meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_ceil() {
        assert_eq!(total_pages(23, 10), 3);
        assert_eq!(total_pages(20, 10), 2);
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(5, 0), 5);
    }

    #[test]
    fn test_pages_cover_everything_once() {
        let items: Vec<u32> = (0..23).collect();
        let (_, meta) = paginate(&items, 1, 10);
        let mut rebuilt = Vec::new();
        for page in 1..=meta.total_pages {
            let (slice, _) = paginate(&items, page, 10);
            rebuilt.extend(slice);
        }
        assert_eq!(rebuilt, items);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let items: Vec<u32> = (0..5).collect();
        let (slice, meta) = paginate(&items, 4, 10);
        assert!(slice.is_empty());
        assert_eq!(meta.total, 5);
        assert_eq!(meta.page, 4);
    }
}
