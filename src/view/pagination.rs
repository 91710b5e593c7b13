//! Fixed-size pages over the ordered view

use serde::Serialize;
use std::str::FromStr;

/// Number of page buttons shown around the current page
const PAGE_WINDOW: u32 = 7;

/// `ceil(count / per_page)`; 0 for an empty set
pub fn total_pages(count: usize, per_page: usize) -> u32 {
    if per_page == 0 {
        return 1;
    }
    count.div_ceil(per_page) as u32
}

/// Clamp a requested page into `[1, total_pages]` (1 when there are none)
pub fn clamp_page(page: u32, total_pages: u32) -> u32 {
    page.clamp(1, total_pages.max(1))
}

/// One page of an ordered view
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<'a, T> {
    /// Items on this page
    pub items: &'a [T],
    /// Total number of items across all pages
    pub total: usize,
    /// Current page number (1-based, already clamped)
    pub page: u32,
    pub per_page: usize,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<'a, T> Paginated<'a, T> {
    /// Slice `[(page-1)*per_page, page*per_page)` after clamping `page`
    pub fn new(all: &'a [T], page: u32, per_page: usize) -> Self {
        let total_pages = total_pages(all.len(), per_page);
        let page = clamp_page(page, total_pages);

        let start = ((page - 1) as usize).saturating_mul(per_page).min(all.len());
        let end = start.saturating_add(per_page).min(all.len());

        Self {
            items: &all[start..end],
            total: all.len(),
            page,
            per_page,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }

    /// Controls to show, `None` when everything fits on one page
    pub fn controls(&self) -> Option<PageControls> {
        PageControls::new(self.page, self.total_pages)
    }
}

/// State of the pagination bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageControls {
    pub current: u32,
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
    /// Page numbers to offer as direct links, centred on `current`
    pub window: Vec<u32>,
}

impl PageControls {
    pub fn new(current: u32, total_pages: u32) -> Option<Self> {
        if total_pages <= 1 {
            return None;
        }
        let current = clamp_page(current, total_pages);

        let span = PAGE_WINDOW.min(total_pages);
        let first = current
            .saturating_sub(span / 2)
            .max(1)
            .min(total_pages - span + 1);

        Some(Self {
            current,
            total_pages,
            has_previous: current > 1,
            has_next: current < total_pages,
            window: (first..first + span).collect(),
        })
    }
}

/// A page-navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    Goto(u32),
    Next,
    Previous,
    First,
    Last,
}

impl PageAction {
    /// Target page, clamped to the available range
    pub fn resolve(self, current: u32, total_pages: u32) -> u32 {
        let target = match self {
            Self::Goto(page) => page,
            Self::Next => current.saturating_add(1),
            Self::Previous => current.saturating_sub(1),
            Self::First => 1,
            Self::Last => total_pages,
        };
        clamp_page(target, total_pages)
    }
}

impl FromStr for PageAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "next" | "n" => Ok(Self::Next),
            "prev" | "previous" | "p" => Ok(Self::Previous),
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            other => other
                .parse::<u32>()
                .map(Self::Goto)
                .map_err(|_| format!("Invalid page: '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(45, 20), 3);
    }

    #[test]
    fn test_page_slices() {
        let items: Vec<usize> = (0..45).collect();

        for k in 1..=3u32 {
            let page = Paginated::new(&items, k, 20);
            let start = (k as usize - 1) * 20;
            let end = (k as usize * 20).min(45);
            assert_eq!(page.items, &items[start..end]);
            assert_eq!(page.total_pages, 3);
        }
    }

    #[test]
    fn test_out_of_range_pages_clamp() {
        let items: Vec<usize> = (0..45).collect();

        let page = Paginated::new(&items, 0, 20);
        assert_eq!(page.page, 1);
        assert_eq!(page.items.first(), Some(&0));

        let page = Paginated::new(&items, 99, 20);
        assert_eq!(page.page, 3);
        assert_eq!(page.items, &items[40..45]);
        assert!(!page.has_next);
        assert!(page.has_previous);
    }

    #[test]
    fn test_empty_set() {
        let items: Vec<usize> = Vec::new();
        let page = Paginated::new(&items, 4, 20);
        assert_eq!(page.page, 1);
        assert!(page.items.is_empty());
        assert!(page.controls().is_none());
    }

    #[test]
    fn test_controls_only_when_needed() {
        let items: Vec<usize> = (0..20).collect();
        assert!(Paginated::new(&items, 1, 20).controls().is_none());

        let items: Vec<usize> = (0..21).collect();
        let controls = Paginated::new(&items, 2, 20).controls().unwrap();
        assert_eq!(controls.window, vec![1, 2]);
        assert!(controls.has_previous);
        assert!(!controls.has_next);
    }

    #[test]
    fn test_controls_window_centred() {
        assert_eq!(PageControls::new(1, 20).unwrap().window, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(PageControls::new(10, 20).unwrap().window, vec![7, 8, 9, 10, 11, 12, 13]);
        assert_eq!(
            PageControls::new(20, 20).unwrap().window,
            vec![14, 15, 16, 17, 18, 19, 20]
        );
    }

    #[test]
    fn test_page_actions() {
        assert_eq!(PageAction::Next.resolve(3, 3), 3);
        assert_eq!(PageAction::Previous.resolve(1, 3), 1);
        assert_eq!(PageAction::Goto(7).resolve(1, 3), 3);
        assert_eq!(PageAction::Last.resolve(1, 3), 3);
        assert_eq!(PageAction::Last.resolve(1, 0), 1);
        assert_eq!("next".parse::<PageAction>().unwrap(), PageAction::Next);
        assert_eq!("4".parse::<PageAction>().unwrap(), PageAction::Goto(4));
        assert!("x".parse::<PageAction>().is_err());
    }
}
