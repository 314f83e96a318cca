//! Page arithmetic shared by store-side and in-memory pagination.

/// Number of pages needed to show `total` items, `limit` per page.
pub fn total_pages(total: usize, limit: usize) -> usize {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit)
}

/// Slices the requested page out of an already ordered sequence.
/// Pages are 1-based; page `0` is treated as the first page.
pub fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> Vec<T> {
    let skip = page.max(1).saturating_sub(1).saturating_mul(limit);
    items.into_iter().skip(skip).take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(45, 20), 3);
        assert_eq!(total_pages(40, 20), 2);
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn paginate_slices_requested_page() {
        let items: Vec<u32> = (1..=45).collect();
        assert_eq!(paginate(items.clone(), 1, 20).len(), 20);
        assert_eq!(paginate(items.clone(), 3, 20), (41..=45).collect::<Vec<_>>());
        assert!(paginate(items.clone(), 4, 20).is_empty());
        assert_eq!(paginate(items, 0, 2), vec![1, 2]);
    }
}
