use serde::Serialize;

/// Number of page links the listing pages try to show at once.
const WINDOW_LEN: i64 = 5;
/// How far the window reaches on each side of the current page.
const WINDOW_REACH: i64 = 2;

/// Everything a listing template needs to render its page links.
///
/// `previous_page` and `next_page` are not clamped: they can be `0` or
/// `total_pages + 1`, so templates must check `has_previous`/`has_next`
/// before linking to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub has_other_pages: bool,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page: i64,
    pub next_page: i64,
    pub current_page: i64,
    pub total_pages: i64,
    pub page_range: Vec<i64>,
}

/// Computes the page window for a listing.
///
/// Out-of-range pages are clamped instead of rejected. When there are at
/// least five pages the window is widened to five entries near either end;
/// with fewer pages it is left as computed.
pub fn paginate(current_page: i64, total_items: u64, page_size: u64) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = total_items.div_ceil(page_size) as i64;

    let current_page = clamp_page(current_page, total_pages);

    let mut start = (current_page - WINDOW_REACH).max(1);
    let mut end = (current_page + WINDOW_REACH).min(total_pages);

    if end - start + 1 < WINDOW_LEN && total_pages >= WINDOW_LEN {
        if start == 1 {
            end = WINDOW_LEN;
        } else if end == total_pages {
            start = total_pages - (WINDOW_LEN - 1);
        }
    }

    Pagination {
        has_other_pages: total_pages > 1,
        has_previous: current_page > 1,
        has_next: current_page < total_pages,
        previous_page: current_page - 1,
        next_page: current_page + 1,
        current_page,
        total_pages,
        page_range: (start..=end).collect(),
    }
}

/// Row offset for `page`, after the same lower-bound clamp `paginate` applies.
pub fn offset_for(page: i64, page_size: u64) -> u64 {
    (page.max(1) as u64 - 1) * page_size
}

// An empty listing still renders page 1, so the upper bound never drops below it.
fn clamp_page(page: i64, total_pages: i64) -> i64 {
    page.clamp(1, total_pages.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_listing_has_no_pages() {
        let p = paginate(1, 0, 3);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.current_page, 1);
        assert!(!p.has_other_pages);
        assert!(!p.has_previous);
        assert!(!p.has_next);
        assert!(p.page_range.is_empty());
    }

    #[test]
    fn test_window_widens_at_the_start() {
        let p = paginate(3, 100, 10);
        assert_eq!(p.total_pages, 10);
        assert_eq!(p.page_range, vec![1, 2, 3, 4, 5]);
        assert!(p.has_previous);
        assert!(p.has_next);
        assert_eq!(p.previous_page, 2);
        assert_eq!(p.next_page, 4);

        let p = paginate(1, 100, 10);
        assert_eq!(p.page_range, vec![1, 2, 3, 4, 5]);
        assert!(!p.has_previous);
        assert_eq!(p.previous_page, 0);
    }

    #[test]
    fn test_window_widens_at_the_end() {
        let p = paginate(10, 100, 10);
        assert_eq!(p.page_range, vec![6, 7, 8, 9, 10]);
        assert!(!p.has_next);
        assert_eq!(p.next_page, 11);

        let p = paginate(9, 100, 10);
        assert_eq!(p.page_range, vec![6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_window_in_the_middle() {
        let p = paginate(6, 100, 10);
        assert_eq!(p.page_range, vec![4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_small_page_counts_are_not_widened() {
        let p = paginate(1, 10, 3);
        assert_eq!(p.total_pages, 4);
        assert_eq!(p.page_range, vec![1, 2, 3]);

        let p = paginate(4, 10, 3);
        assert_eq!(p.page_range, vec![2, 3, 4]);

        let p = paginate(1, 2, 3);
        assert_eq!(p.total_pages, 1);
        assert_eq!(p.page_range, vec![1]);
        assert!(!p.has_other_pages);
    }

    #[test]
    fn test_out_of_range_pages_are_clamped() {
        let p = paginate(-4, 30, 10);
        assert_eq!(p.current_page, 1);

        let p = paginate(99, 30, 10);
        assert_eq!(p.current_page, 3);
        assert!(!p.has_next);

        let p = paginate(7, 0, 10);
        assert_eq!(p.current_page, 1);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next);
    }

    #[test]
    fn test_current_page_always_in_bounds() {
        for total_items in 0..60u64 {
            for page_size in 1..8u64 {
                for page in -3..20i64 {
                    let p = paginate(page, total_items, page_size);
                    let upper = p.total_pages.max(1);
                    assert!(
                        (1..=upper).contains(&p.current_page),
                        "page {page} items {total_items} size {page_size} -> {}",
                        p.current_page
                    );
                    assert!(p.page_range.iter().all(|n| (1..=p.total_pages).contains(n)));
                }
            }
        }
    }

    #[test]
    fn test_zero_page_size_is_treated_as_one() {
        let p = paginate(2, 3, 0);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.current_page, 2);
    }

    #[test]
    fn test_offset_for() {
        assert_eq!(offset_for(1, 3), 0);
        assert_eq!(offset_for(3, 3), 6);
        assert_eq!(offset_for(0, 3), 0);
        assert_eq!(offset_for(-2, 10), 0);
    }
}
