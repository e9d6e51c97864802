use serde::Serialize;

/// Default page size for the data and analyze endpoints.
pub const DATA_PAGE_LIMIT: usize = 100;
/// Default page size for table views.
pub const TABLE_PAGE_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: usize,
    pub limit: usize,
}

impl PageParams {
    /// Parses raw query values. Anything missing, non-numeric or below 1
    /// falls back to page 1 / `default_limit`.
    pub fn from_query(page: Option<&str>, limit: Option<&str>, default_limit: usize) -> Self {
        Self {
            page: parse_positive(page).unwrap_or(1),
            limit: parse_positive(limit).unwrap_or(default_limit.max(1)),
        }
    }
}

fn parse_positive(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|v| v.trim().parse::<usize>().ok()).filter(|v| *v >= 1)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

/// Slices `items` into the requested page. Bounds clamp to the collection, so
/// a page past the end is empty rather than an error.
pub fn paginate<T: Clone>(items: &[T], params: PageParams) -> Page<T> {
    let page = params.page.max(1);
    let limit = params.limit.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(limit);

    let start = page.saturating_sub(1).saturating_mul(limit).min(total_items);
    let end = start.saturating_add(limit).min(total_items);

    Page {
        items: items[start..end].to_vec(),
        page,
        limit,
        total_items,
        total_pages,
        has_next_page: end < total_items,
        has_prev_page: page > 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn third_page_of_twenty_five() {
        let items: Vec<u32> = (0..25).collect();
        let page = paginate(&items, PageParams { page: 3, limit: 10 });

        assert_eq!(page.items, (20..25).collect::<Vec<_>>());
        assert_eq!(page.total_items, 25);
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_next_page);
        assert!(page.has_prev_page);
    }

    #[test]
    fn first_page_has_next_but_no_prev() {
        let items: Vec<u32> = (0..25).collect();
        let page = paginate(&items, PageParams { page: 1, limit: 10 });
        assert_eq!(page.items.len(), 10);
        assert!(page.has_next_page);
        assert!(!page.has_prev_page);
    }

    #[test]
    fn empty_collection_has_zero_pages() {
        let items: Vec<u32> = Vec::new();
        let page = paginate(&items, PageParams { page: 1, limit: 10 });
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next_page);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let items: Vec<u32> = (0..5).collect();
        let page = paginate(&items, PageParams { page: 9, limit: 10 });
        assert!(page.items.is_empty());
        assert!(!page.has_next_page);
        assert!(page.has_prev_page);
    }

    #[test]
    fn pages_reconstruct_the_sequence_exactly_once() {
        for total in [0usize, 1, 9, 10, 11, 37] {
            for limit in [1usize, 3, 10, 50] {
                let items: Vec<usize> = (0..total).collect();
                let first = paginate(&items, PageParams { page: 1, limit });
                let mut rebuilt = Vec::new();
                for page in 1..=first.total_pages.max(1) {
                    rebuilt.extend(paginate(&items, PageParams { page, limit }).items);
                }
                assert_eq!(rebuilt, items, "total={} limit={}", total, limit);
            }
        }
    }

    #[test]
    fn query_defaults_apply_to_bad_input() {
        assert_eq!(PageParams::from_query(None, None, DATA_PAGE_LIMIT), PageParams { page: 1, limit: 100 });
        assert_eq!(
            PageParams::from_query(Some("0"), Some("-5"), TABLE_PAGE_LIMIT),
            PageParams { page: 1, limit: 10 }
        );
        assert_eq!(
            PageParams::from_query(Some("abc"), Some("2.5"), TABLE_PAGE_LIMIT),
            PageParams { page: 1, limit: 10 }
        );
        assert_eq!(PageParams::from_query(Some("4"), Some("25"), 10), PageParams { page: 4, limit: 25 });
    }
}
