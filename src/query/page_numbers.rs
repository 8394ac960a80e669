//! Truncated page-number sequences for pagination controls.

use std::fmt;

use serde::{Serialize, Serializer};

/// One slot in a pagination control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    Page(u32),
    Ellipsis,
}

/// Pages serialize as numbers, gaps as the string `"ellipsis"`
impl Serialize for PageMarker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageMarker::Page(n) => serializer.serialize_u32(*n),
            PageMarker::Ellipsis => serializer.serialize_str("ellipsis"),
        }
    }
}

impl fmt::Display for PageMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageMarker::Page(n) => write!(f, "{n}"),
            PageMarker::Ellipsis => write!(f, "…"),
        }
    }
}

/// Number of pages shown without truncation
const MAX_UNTRUNCATED: u32 = 5;

/// Page numbers to render for `current` out of `total` pages.
///
/// The first and last page are always present. Near the start the first four
/// pages are shown, near the end the last four, otherwise the current page
/// with one neighbour on each side.
pub fn page_numbers(current: u32, total: u32) -> Vec<PageMarker> {
    use PageMarker::{Ellipsis, Page};

    if total <= MAX_UNTRUNCATED {
        return (1..=total).map(Page).collect();
    }

    if current <= 3 {
        vec![Page(1), Page(2), Page(3), Page(4), Ellipsis, Page(total)]
    } else if current >= total - 2 {
        vec![
            Page(1),
            Ellipsis,
            Page(total - 3),
            Page(total - 2),
            Page(total - 1),
            Page(total),
        ]
    } else {
        vec![
            Page(1),
            Ellipsis,
            Page(current - 1),
            Page(current),
            Page(current + 1),
            Ellipsis,
            Page(total),
        ]
    }
}

/// Render a marker sequence as `1 2 3 … 10`
pub fn render(markers: &[PageMarker]) -> String {
    markers
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
