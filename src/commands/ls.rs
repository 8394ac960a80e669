use owo_colors::OwoColorize;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::{CommandOutput, format_page_bar, page_json, sync_failure};
use crate::cli::OutputOptions;
use crate::config::{Config, ViewMode};
use crate::dataset;
use crate::error::Result;
use crate::query::{CollectionQuery, FilterSpec, Page, SortSpec};
use crate::remote::{HttpApi, ListParams, MemoryApi, RemoteApi, ServerModel};
use crate::sync::SyncController;
use crate::types::{BlogPost, Category, Collection, PujaService, Record, Resource};

/// Options for `darshan ls`
#[derive(Debug, Clone, Default)]
pub struct LsOptions {
    pub collection: Collection,
    pub filter: FilterSpec,
    pub sort: Option<SortSpec>,
    pub page: u32,
    pub page_size: Option<u32>,
    pub view: Option<ViewMode>,
    pub remote: bool,
}

/// How a record type is drawn in listings.
pub(crate) trait Listing: ServerModel {
    type Row: Tabled;

    fn bundled() -> Vec<Self>;

    fn to_row(&self) -> Self::Row;

    /// One-line summary for list view
    fn to_line(&self) -> String;
}

fn date(record: &impl Record) -> String {
    record.effective_timestamp().strftime("%Y-%m-%d").to_string()
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

#[derive(Tabled)]
pub(crate) struct PostRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "Views")]
    views: u64,
    #[tabled(rename = "Likes")]
    likes: u64,
    #[tabled(rename = "Date")]
    date: String,
}

impl Listing for BlogPost {
    type Row = PostRow;

    fn bundled() -> Vec<Self> {
        dataset::blog_posts()
    }

    fn to_row(&self) -> PostRow {
        PostRow {
            id: self.id.to_string(),
            title: if self.featured {
                format!("★ {}", self.title)
            } else {
                self.title.clone()
            },
            author: self.author.name.clone(),
            category: self.category.clone(),
            tags: if self.tags.is_empty() {
                "-".to_string()
            } else {
                self.tags.join(", ")
            },
            views: self.views,
            likes: self.likes,
            date: date(self),
        }
    }

    fn to_line(&self) -> String {
        let star = if self.featured {
            " ★".yellow().to_string()
        } else {
            String::new()
        };
        format!(
            "{} {}{} - {} {}",
            format!("{:>4}", self.id).cyan(),
            self.title.bold(),
            star,
            self.author.name,
            format!("({}, {} views)", date(self), self.views).dimmed()
        )
    }
}

#[derive(Tabled)]
pub(crate) struct ServiceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Active")]
    active: &'static str,
}

fn service_category(service: &PujaService) -> String {
    if service.category_name.is_empty() {
        format!("#{}", service.category)
    } else {
        service.category_name.clone()
    }
}

impl Listing for PujaService {
    type Row = ServiceRow;

    fn bundled() -> Vec<Self> {
        dataset::puja_services()
    }

    fn to_row(&self) -> ServiceRow {
        ServiceRow {
            id: self.id.to_string(),
            title: self.title.clone(),
            category: service_category(self),
            kind: self.service_type.clone(),
            price: format!("₹{:.0}", self.price),
            duration: format!("{} min", self.duration),
            active: yes_no(self.is_active),
        }
    }

    fn to_line(&self) -> String {
        let title = if self.is_active {
            self.title.bold().to_string()
        } else {
            self.title.dimmed().to_string()
        };
        format!(
            "{} {} - {} {}",
            format!("{:>4}", self.id).cyan(),
            title,
            format!("₹{:.0}", self.price).green(),
            format!("({}, {}, {} min)", service_category(self), self.service_type, self.duration)
                .dimmed()
        )
    }
}

#[derive(Tabled)]
pub(crate) struct CategoryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Active")]
    active: &'static str,
}

impl Listing for Category {
    type Row = CategoryRow;

    fn bundled() -> Vec<Self> {
        dataset::categories()
    }

    fn to_row(&self) -> CategoryRow {
        CategoryRow {
            id: self.id.to_string(),
            name: self.name.clone(),
            slug: self.slug.clone(),
            active: yes_no(self.is_active),
        }
    }

    fn to_line(&self) -> String {
        format!("{} {} {}", format!("{:>4}", self.id).cyan(), self.name.bold(), self.slug.dimmed())
    }
}

/// List a collection from the bundled dataset or the configured backend
pub async fn cmd_ls(options: LsOptions, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    match options.collection {
        Collection::Posts => list::<BlogPost>(&options, &config, output).await,
        Collection::Services => list::<PujaService>(&options, &config, output).await,
        Collection::Categories => list::<Category>(&options, &config, output).await,
    }
}

fn list_params(options: &LsOptions, config: &Config) -> ListParams {
    let query = CollectionQuery::new(options.filter.clone())
        .sort(options.sort.unwrap_or_default())
        .page(options.page.max(1))
        .page_size(options.page_size.unwrap_or(config.listing.page_size));
    ListParams::from(&query)
}

/// Fetch one page through a sync controller
pub(crate) async fn fetch_page<T: Resource, A: RemoteApi<T>>(
    sync: &SyncController<T, A>,
    params: ListParams,
) -> Result<Page<T>> {
    if !sync.list(params).await.is_applied() {
        return Err(sync_failure(&sync.state()));
    }
    sync.state().to_page()
}

async fn list<T: Listing>(options: &LsOptions, config: &Config, output: OutputOptions) -> Result<()> {
    let params = list_params(options, config);
    let page = if options.remote {
        let sync = SyncController::new(HttpApi::<T>::from_config(config)?);
        fetch_page(&sync, params).await?
    } else {
        let sync = SyncController::new(MemoryApi::new(T::bundled()));
        fetch_page(&sync, params).await?
    };

    let view = options.view.unwrap_or(config.listing.view_mode);
    let mut json_output = page_json(&page)?;
    json_output["collection"] = json!(options.collection.to_string());

    CommandOutput::new(json_output)
        .with_text(render_page(&page, view, options.collection))
        .print(output)
}

pub(crate) fn render_page<T: Listing>(page: &Page<T>, view: ViewMode, collection: Collection) -> String {
    if page.is_empty() {
        let message = if page.pagination.total_items == 0 {
            format!("No {collection} found.")
        } else {
            format!("No {collection} on page {}.", page.pagination.current_page)
        };
        return format!("{}\n{}", message.dimmed(), format_page_bar(page));
    }

    let body = match view {
        ViewMode::Grid => {
            let mut table = Table::new(page.items.iter().map(|item| item.to_row()));
            table.with(Style::rounded());
            table.to_string()
        }
        ViewMode::List => page
            .items
            .iter()
            .map(|item| item.to_line())
            .collect::<Vec<_>>()
            .join("\n"),
    };
    format!("{body}\n\n{}", format_page_bar(page))
}
