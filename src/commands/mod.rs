mod config;
mod ls;
mod pages;
mod service;

pub use config::{cmd_config_get, cmd_config_set, cmd_config_show};
pub use ls::{LsOptions, cmd_ls};
pub use pages::cmd_pages;
pub use service::{ServiceCommand, cmd_service};

use owo_colors::OwoColorize;
use serde_json::json;

use crate::cli::OutputOptions;
use crate::error::{DarshanError, Result};
use crate::query::{Page, PageMarker, page_numbers};
use crate::sync::RemoteCollectionState;

/// Result of a command, rendered as JSON or text depending on the output options.
pub struct CommandOutput {
    json: serde_json::Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: serde_json::Value) -> Self {
        Self { json, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn print(self, output: OutputOptions) -> Result<()> {
        match self.text {
            Some(text) if !output.json => {
                println!("{text}");
                Ok(())
            }
            _ => print_json(&self.json),
        }
    }
}

/// Print a JSON value to stdout
pub fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Turn a failed sync state into an error carrying its classified message
pub(crate) fn sync_failure<T>(state: &RemoteCollectionState<T>) -> DarshanError {
    DarshanError::SyncFailed(
        state
            .error
            .clone()
            .unwrap_or_else(|| "request was not applied".to_string()),
    )
}

/// Pagination footer: the page-number bar with the current page highlighted
pub(crate) fn format_page_bar<T>(page: &Page<T>) -> String {
    let state = &page.pagination;
    let bar = page_numbers(state.current_page, state.total_pages)
        .into_iter()
        .map(|marker| match marker {
            PageMarker::Page(n) if n == state.current_page => {
                format!("[{n}]").bold().to_string()
            }
            PageMarker::Page(n) => n.to_string(),
            PageMarker::Ellipsis => marker.to_string().dimmed().to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ");

    let direction = match (state.has_previous, state.has_next) {
        (true, true) => "‹ prev · next ›",
        (true, false) => "‹ prev",
        (false, true) => "next ›",
        (false, false) => "",
    };

    format!(
        "{bar}  {}  {}",
        format!(
            "page {} of {}, {} item(s)",
            state.current_page,
            state.total_pages.max(1),
            state.total_items
        )
        .dimmed(),
        direction.dimmed()
    )
    .trim_end()
    .to_string()
}

/// JSON for a page: items, pagination metadata and page-number markers
pub(crate) fn page_json<T: serde::Serialize>(page: &Page<T>) -> Result<serde_json::Value> {
    let state = &page.pagination;
    Ok(json!({
        "items": serde_json::to_value(&page.items)?,
        "pagination": serde_json::to_value(state)?,
        "page_numbers": serde_json::to_value(page_numbers(state.current_page, state.total_pages))?,
    }))
}
