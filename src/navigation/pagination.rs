//! Pagination engine
//!
//! Derives the list navigation controls from a page index, the page size,
//! the total matching count and how many items the page actually returned.

/// Page-jump buttons per keyboard row
pub const JUMP_ROW_WIDTH: usize = 4;

/// Highest page index accepted from a control payload
pub const MAX_PAGE_INDEX: u64 = u32::MAX as u64;

/// Page buttons on one jump keyboard. Telegram allows 100 buttons and one
/// row is taken by "back".
pub const MAX_JUMP_PAGES: u64 = 96;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageControls {
    pub show_prev: bool,
    pub show_next: bool,
    /// 1-based "current/total" label
    pub page_label: String,
    pub total_pages: u64,
}

/// Number of pages for `total_count` items, never less than 1
pub fn total_pages(total_count: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 1;
    }
    total_count.div_ceil(page_size).max(1)
}

/// Page index from a payload argument; 0 when unparsable or above [`MAX_PAGE_INDEX`]
pub fn parse_page(raw: &str) -> u64 {
    raw.parse::<u64>()
        .ok()
        .filter(|page| *page <= MAX_PAGE_INDEX)
        .unwrap_or(0)
}

/// Controls for one rendered page.
///
/// Next is offered on page 0 when more than one page exists, and on later
/// pages only when the current page came back full. A full last page therefore
/// still shows Next; following it yields an empty page, which renders as such.
pub fn build_controls(page: u64, page_size: u64, total_count: u64, returned: u64) -> PageControls {
    let total_pages = total_pages(total_count, page_size);
    let show_next = if page == 0 {
        total_count > page_size
    } else {
        page_size > 0 && returned == page_size
    };

    PageControls {
        show_prev: page > 0,
        show_next,
        page_label: format!("{}/{}", page.saturating_add(1), total_pages),
        total_pages,
    }
}

/// Page indices chunked into rows of [`JUMP_ROW_WIDTH`], at most [`MAX_JUMP_PAGES`]
pub fn jump_rows(total_pages: u64) -> Vec<Vec<u64>> {
    let pages: Vec<u64> = (0..total_pages.min(MAX_JUMP_PAGES)).collect();
    pages.chunks(JUMP_ROW_WIDTH).map(|row| row.to_vec()).collect()
}
