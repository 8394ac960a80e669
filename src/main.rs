use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use darshan::cli::{Cli, Commands, ConfigAction, FilterArgs, ServiceAction};
use darshan::commands::{
    LsOptions, ServiceCommand, cmd_config_get, cmd_config_set, cmd_config_show, cmd_ls,
    cmd_pages, cmd_service,
};
use darshan::query::FilterSpec;
use darshan::types::{PujaServiceDraft, PujaServicePatch};

fn filter_spec(args: FilterArgs) -> FilterSpec {
    FilterSpec {
        search: args.search,
        category: args.category,
        tag: args.tag,
        author: args.author,
        kind: args.kind,
        featured: args.featured.then_some(true),
        is_active: args.active,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ls {
            collection,
            filter,
            sort,
            page,
            page_size,
            view,
            remote,
            output,
        } => {
            cmd_ls(
                LsOptions {
                    collection,
                    filter: filter_spec(filter),
                    sort,
                    page,
                    page_size,
                    view,
                    remote,
                },
                output,
            )
            .await
        }

        Commands::Pages {
            current,
            total,
            output,
        } => cmd_pages(current, total, output),

        Commands::Service { action } => match action {
            ServiceAction::Create {
                title,
                category,
                kind,
                price,
                description,
                duration,
                inactive,
                target,
            } => {
                let draft = PujaServiceDraft {
                    title,
                    description,
                    category,
                    service_type: kind,
                    price,
                    duration,
                    is_active: !inactive,
                };
                cmd_service(ServiceCommand::Create(draft), target.remote, target.output).await
            }
            ServiceAction::Update {
                id,
                title,
                description,
                category,
                kind,
                price,
                duration,
                active,
                target,
            } => {
                let patch = PujaServicePatch {
                    title,
                    description,
                    category,
                    service_type: kind,
                    price,
                    duration,
                    is_active: active,
                };
                cmd_service(ServiceCommand::Update(id, patch), target.remote, target.output).await
            }
            ServiceAction::Delete { id, target } => {
                cmd_service(ServiceCommand::Delete(id), target.remote, target.output).await
            }
        },

        Commands::Config { action } => match action {
            ConfigAction::Show { output } => cmd_config_show(output),
            ConfigAction::Set { key, value, output } => cmd_config_set(&key, &value, output),
            ConfigAction::Get { key, output } => cmd_config_get(&key, output),
        },
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
