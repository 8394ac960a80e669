//! Service mutations: `service create`, `service update`, `service delete`.
//!
//! Each mutation goes through a sync controller, which re-fetches the current
//! page afterwards; the command prints that re-synced page.

use owo_colors::OwoColorize;
use serde_json::json;

use super::ls::render_page;
use super::{CommandOutput, page_json, sync_failure};
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::dataset;
use crate::error::{DarshanError, Result};
use crate::query::SortKey;
use crate::remote::{HttpApi, ListParams, MemoryApi, RemoteApi};
use crate::sync::SyncController;
use crate::types::{Collection, ItemId, PujaService, PujaServiceDraft, PujaServicePatch};

/// A service mutation requested on the command line
#[derive(Debug, Clone)]
pub enum ServiceCommand {
    Create(PujaServiceDraft),
    Update(ItemId, PujaServicePatch),
    Delete(ItemId),
}

/// Apply a service mutation against the bundled dataset or the configured backend
pub async fn cmd_service(command: ServiceCommand, remote: bool, output: OutputOptions) -> Result<()> {
    if let ServiceCommand::Update(_, patch) = &command
        && patch.is_empty()
    {
        return Err(DarshanError::InvalidArgument(
            "nothing to update: pass at least one field".to_string(),
        ));
    }

    let config = Config::load()?;
    if remote {
        let sync = SyncController::new(HttpApi::<PujaService>::from_config(&config)?);
        run(&sync, command, &config, output).await
    } else {
        let sync = SyncController::new(MemoryApi::new(dataset::puja_services()));
        run(&sync, command, &config, output).await
    }
}

async fn run<A: RemoteApi<PujaService>>(
    sync: &SyncController<PujaService, A>,
    command: ServiceCommand,
    config: &Config,
    output: OutputOptions,
) -> Result<()> {
    // Newest first so a created service shows up on the first page
    let params = ListParams::default()
        .ordering(SortKey::Newest)
        .page_size(config.listing.page_size);
    if !sync.list(params).await.is_applied() {
        return Err(sync_failure(&sync.state()));
    }

    let (action, id, message) = match command {
        ServiceCommand::Create(draft) => {
            let created = sync.create(&draft).await?;
            let message = format!("Created service {} ({})", created.id.cyan(), created.title);
            ("service_create", created.id, message)
        }
        ServiceCommand::Update(id, patch) => {
            let updated = sync.update(id, &patch).await?;
            let message = format!("Updated service {} ({})", id.cyan(), updated.title);
            ("service_update", id, message)
        }
        ServiceCommand::Delete(id) => {
            sync.delete(id).await?;
            ("service_delete", id, format!("Deleted service {}", id.cyan()))
        }
    };

    let state = sync.state();
    let page = state.to_page()?;
    let mut text = message;
    // The mutation succeeded even if the follow-up fetch did not
    if let Some(error) = &state.error {
        text.push_str(&format!("\n{}", error.yellow()));
    }
    text.push_str("\n\n");
    text.push_str(&render_page(&page, config.listing.view_mode, Collection::Services));

    let mut json_output = json!({
        "action": action,
        "id": id,
        "success": true,
        "sync_error": state.error,
    });
    json_output["page"] = page_json(&page)?;

    CommandOutput::new(json_output).with_text(text).print(output)
}
