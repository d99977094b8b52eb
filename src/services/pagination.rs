//! Page/page-size normalization shared by every list endpoint.

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// A normalized page request. `page >= 1`, `1 <= page_size <= 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        normalize(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

/// Clamp `page` to at least 1 and reset an out-of-range `page_size` to the default.
///
/// The offset saturates instead of overflowing for absurdly large pages.
pub fn normalize(page: i64, page_size: i64) -> Pagination {
    let page = page.max(1);
    let page_size = if (1..=MAX_PAGE_SIZE).contains(&page_size) {
        page_size
    } else {
        DEFAULT_PAGE_SIZE
    };

    Pagination {
        page,
        page_size,
        offset: (page - 1).saturating_mul(page_size),
    }
}

impl Pagination {
    /// Normalize raw query-string values. Anything that is not an integer counts as absent.
    pub fn from_raw(page: Option<&str>, page_size: Option<&str>) -> Self {
        let parse = |raw: Option<&str>, default: i64| {
            raw.and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(default)
        };
        normalize(
            parse(page, DEFAULT_PAGE),
            parse(page_size, DEFAULT_PAGE_SIZE),
        )
    }
}
