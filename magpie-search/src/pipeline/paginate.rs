//! Page slicing over the ordered result list.

/// Slice one page out of `items`.
///
/// Pages are 1-based; `page = 0` is treated as the first page. A page
/// beyond the end yields an empty vec — never a panic, for any `page`.
/// Pure: the input is left untouched.
#[must_use]
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Vec<T> {
    if per_page == 0 {
        return Vec::new();
    }
    let start = page.saturating_sub(1).saturating_mul(per_page);
    if start >= items.len() {
        return Vec::new();
    }
    let end = start.saturating_add(per_page).min(items.len());
    items[start..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page() {
        let items: Vec<u32> = (0..25).collect();
        assert_eq!(paginate(&items, 1, 10), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn middle_page() {
        let items: Vec<u32> = (0..25).collect();
        assert_eq!(paginate(&items, 2, 10), (10..20).collect::<Vec<_>>());
    }

    #[test]
    fn short_final_page() {
        let items: Vec<u32> = (0..25).collect();
        assert_eq!(paginate(&items, 3, 10), (20..25).collect::<Vec<_>>());
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let items: Vec<u32> = (0..25).collect();
        assert!(paginate(&items, 4, 10).is_empty());
        assert!(paginate(&items, 1000, 10).is_empty());
    }

    #[test]
    fn boundary_start_exactly_at_len_is_empty() {
        let items: Vec<u32> = (0..20).collect();
        assert!(paginate(&items, 3, 10).is_empty());
    }

    #[test]
    fn page_zero_clamped_to_first() {
        let items: Vec<u32> = (0..5).collect();
        assert_eq!(paginate(&items, 0, 3), vec![0, 1, 2]);
    }

    #[test]
    fn empty_input_is_empty_for_any_page() {
        let items: Vec<u32> = Vec::new();
        assert!(paginate(&items, 1, 10).is_empty());
        assert!(paginate(&items, 7, 10).is_empty());
    }

    #[test]
    fn zero_per_page_is_empty() {
        let items: Vec<u32> = (0..5).collect();
        assert!(paginate(&items, 1, 0).is_empty());
    }

    #[test]
    fn huge_page_number_does_not_overflow() {
        let items: Vec<u32> = (0..5).collect();
        assert!(paginate(&items, usize::MAX, usize::MAX).is_empty());
    }

    #[test]
    fn input_not_mutated() {
        let items: Vec<u32> = (0..5).collect();
        let _ = paginate(&items, 1, 2);
        assert_eq!(items, (0..5).collect::<Vec<_>>());
    }
}
