use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::error::{DarshanError, Result};
use crate::query::page_numbers;
use crate::query::page_numbers::render;

/// Print the page-number bar for `current` out of `total` pages
pub fn cmd_pages(current: u32, total: u32, output: OutputOptions) -> Result<()> {
    if total > 0 && !(1..=total).contains(&current) {
        return Err(DarshanError::InvalidArgument(format!(
            "current page {current} is outside 1..={total}"
        )));
    }

    let markers = page_numbers(current, total);
    let text = if markers.is_empty() {
        "no pages".dimmed().to_string()
    } else {
        render(&markers)
    };

    CommandOutput::new(json!({
        "current": current,
        "total": total,
        "pages": serde_json::to_value(&markers)?,
    }))
    .with_text(text)
    .print(output)
}
